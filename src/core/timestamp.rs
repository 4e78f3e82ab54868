//! Timestamp encoding for log records
//!
//! The default display is a prefixed strftime layout
//! (`<prefix>%Y/%m/%d - %H:%M:%S%.3f`); the fixed machine formats are kept
//! for JSON pipelines that expect them.

use super::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, SecondsFormat};
use serde::{Deserialize, Serialize};

/// Default time layout: `2024/01/08 - 10:30:45.123`
pub const DEFAULT_TIME_FORMAT: &str = "%Y/%m/%d - %H:%M:%S%.3f";

/// How the time element of a record is rendered
///
/// # Examples
///
/// ```
/// use rust_logger_facade::core::TimeEncoder;
/// use chrono::{Local, TimeZone};
///
/// let encoder = TimeEncoder::layout("app ", "%Y-%m-%d").unwrap();
/// let t = Local.with_ymd_and_hms(2024, 1, 8, 10, 30, 45).unwrap();
/// assert_eq!(encoder.format(&t), "app 2024-01-08");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeEncoder {
    /// Validated strftime layout, prefix already folded in
    Layout(String),

    /// ISO 8601 with milliseconds and offset: `2024-01-08T10:30:45.123+01:00`
    Iso8601,

    /// RFC 3339 with seconds: `2024-01-08T10:30:45+01:00`
    Rfc3339,

    /// Milliseconds since the Unix epoch
    EpochMillis,
}

impl Default for TimeEncoder {
    fn default() -> Self {
        TimeEncoder::Layout(DEFAULT_TIME_FORMAT.to_string())
    }
}

impl TimeEncoder {
    /// Build a layout encoder rendering `prefix` literally followed by `format`.
    ///
    /// # Errors
    ///
    /// Returns a formatter error if `format` contains an invalid strftime item.
    pub fn layout(prefix: &str, format: &str) -> Result<Self> {
        validate_time_format(format)?;
        Ok(TimeEncoder::Layout(format!("{}{}", escape_prefix(prefix), format)))
    }

    #[must_use]
    pub fn format(&self, datetime: &DateTime<Local>) -> String {
        match self {
            TimeEncoder::Layout(layout) => datetime.format(layout).to_string(),
            TimeEncoder::Iso8601 => datetime.to_rfc3339_opts(SecondsFormat::Millis, false),
            TimeEncoder::Rfc3339 => datetime.to_rfc3339_opts(SecondsFormat::Secs, false),
            TimeEncoder::EpochMillis => datetime.timestamp_millis().to_string(),
        }
    }

    /// Whether JSON output should carry the time as a number
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, TimeEncoder::EpochMillis)
    }
}

/// Reject layouts chrono cannot render.
///
/// Rendering an invalid layout through `Display` fails at write time, so
/// layouts are checked once when they are configured.
pub fn validate_time_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(LoggerError::formatter(
            "time",
            format!("invalid strftime layout '{}'", format),
        ));
    }
    Ok(())
}

pub(crate) fn escape_prefix(prefix: &str) -> String {
    prefix.replace('%', "%%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_datetime() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::milliseconds(123)
    }

    #[test]
    fn test_default_layout() {
        let result = TimeEncoder::default().format(&fixed_datetime());
        assert_eq!(result, "2025/01/08 - 10:30:45.123");
    }

    #[test]
    fn test_prefixed_layout() {
        let encoder = TimeEncoder::layout("svc ", "%H:%M").expect("valid layout");
        assert_eq!(encoder.format(&fixed_datetime()), "svc 10:30");
    }

    #[test]
    fn test_prefix_percent_is_literal() {
        let encoder = TimeEncoder::layout("100%Y ", "%Y").expect("valid layout");
        assert_eq!(encoder.format(&fixed_datetime()), "100%Y 2025");
    }

    #[test]
    fn test_invalid_layout_rejected() {
        let err = TimeEncoder::layout("", "%Y-%Q").unwrap_err();
        assert!(matches!(err, LoggerError::FormatterError { .. }));
    }

    #[test]
    fn test_machine_formats() {
        let t = fixed_datetime();
        assert!(TimeEncoder::Iso8601.format(&t).starts_with("2025-01-08T10:30:45.123"));
        assert!(TimeEncoder::Rfc3339.format(&t).starts_with("2025-01-08T10:30:45"));
        let millis: i64 = TimeEncoder::EpochMillis.format(&t).parse().expect("numeric");
        assert_eq!(millis, t.timestamp_millis());
        assert!(TimeEncoder::EpochMillis.is_numeric());
        assert!(!TimeEncoder::default().is_numeric());
    }
}
