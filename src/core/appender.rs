//! Appender trait for log output destinations

use super::error::Result;

/// A single write destination.
///
/// Appenders receive fully encoded lines; each call to `append` carries one
/// complete record including its line ending and must write it as a unit.
pub trait Appender: Send + Sync {
    fn append(&mut self, line: &str) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
