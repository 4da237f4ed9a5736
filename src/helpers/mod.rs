//! Low-level helpers: package readers, ZIP parts, XML events, timing.
pub(crate) mod reader;
pub mod timing;
pub(crate) mod xml;
pub(crate) mod zip;
