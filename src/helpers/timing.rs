//! Timing of long-running operations through `tracing`.

use std::time::Instant;
use tracing::error;
use tracing::info;

/// Runs `operation`, logging when it starts, how long it took, and whether it failed.
pub fn timed<T, E, F>(label: &str, operation: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnOnce() -> Result<T, E>,
{
    info!("{label}: started");
    let started = Instant::now();
    let result = operation();
    let elapsed = started.elapsed();
    match &result {
        Ok(_) => info!("{label}: finished in {:.2}s", elapsed.as_secs_f64()),
        Err(error) => error!("{label}: failed after {:.2}s: {error}", elapsed.as_secs_f64()),
    }
    result
}
