//! ZIP archive helpers for the OOXML package
//! Provides lookup of package parts and XML readers over them

use crate::error::SheetSieveError;
use crate::helpers::xml::XmlReader;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::io::Write;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipArchive;
use zip::ZipWriter;

/// Helper trait for reading parts out of a ZIP archive
pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// Gets a file from the ZIP archive by name (case-insensitive, path separator agnostic)
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, SheetSieveError>;

    /// Creates an XML reader for a file within the ZIP archive
    fn xml_reader(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, SheetSieveError>;
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, SheetSieveError> {
        let pattern = name.replace('\\', "/");
        let path = self.file_names()
            .find(|file_name| pattern.eq_ignore_ascii_case(file_name))
            .map(|file_name| file_name.to_owned());
        match path.map(|file_name| self.by_name(&file_name)).transpose() {
            Ok(Some(file)) => Ok(Some(file)),
            Ok(None) | Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn xml_reader(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, SheetSieveError> {
        let reader = self
            .file(name)?
            .map(|file| XmlReader::new(BufReader::new(file)));
        Ok(reader)
    }
}

/// Helper trait for writing package parts into a ZIP archive
pub(crate) trait ZipWriterHelper {
    /// Adds a deflated part with the given content
    fn add_part(&mut self, name: &str, content: &[u8]) -> Result<(), SheetSieveError>;
}

impl<W: Write + Seek> ZipWriterHelper for ZipWriter<W> {
    fn add_part(&mut self, name: &str, content: &[u8]) -> Result<(), SheetSieveError> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.start_file(name, options)?;
        self.write_all(content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parts_round_trip_with_case_insensitive_lookup() -> Result<(), SheetSieveError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.add_part("xl/workbook.xml", b"<workbook/>")?;
        let bytes = writer.finish()?.into_inner();

        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut content = String::new();
        archive
            .file("XL\\Workbook.xml")?
            .expect("part exists")
            .read_to_string(&mut content)?;
        assert_eq!(content, "<workbook/>");
        assert!(archive.file("xl/missing.xml")?.is_none());
        Ok(())
    }
}
