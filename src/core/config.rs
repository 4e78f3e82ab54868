//! User-facing logger configuration and its normalized form

use super::error::Result;
use super::log_level::LogLevel;
use super::output_format::OutputStyle;
use super::timestamp::{escape_prefix, validate_time_format, DEFAULT_TIME_FORMAT};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Retention used when `max_age_days` is zero or negative
pub const DEFAULT_MAX_AGE_DAYS: i64 = 7;
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Logger configuration as supplied by the application.
///
/// Every field has a permissive default, so partial JSON documents and the
/// builder methods can be mixed freely. Nothing is validated here; see
/// [`LoggerConfig::normalize`].
///
/// # Examples
///
/// ```
/// use rust_logger_facade::core::{LoggerConfig, OutputStyle};
///
/// let config = LoggerConfig::new("logs")
///     .with_level("debug")
///     .with_prefix("api")
///     .with_color(false)
///     .with_output_style(OutputStyle::Json);
/// assert_eq!(config.level, "debug");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// One of debug/info/warn/error/dpanic/panic/fatal; anything else is info
    pub level: String,
    /// Directory receiving one `<YYYY-MM-DD>.log` file per day
    pub dir: PathBuf,
    /// Printed before the timestamp of every record
    pub prefix: String,
    /// strftime layout; blank or invalid falls back to the default
    pub time_format: String,
    /// Days a daily file is retained; `<= 0` means 7
    pub max_age_days: i64,
    pub color: bool,
    /// Annotate records with the caller's file and line
    pub show_line: bool,
    /// Minimum level that captures a stack trace; empty never captures
    pub stacktrace_level: String,
    pub format: OutputStyle,
    /// Echo records to stdout as well as the daily file
    pub console: bool,
    /// Gzip the previous day's file when rotating
    pub compress: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: PathBuf::from("logs"),
            prefix: String::new(),
            time_format: String::new(),
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            color: true,
            show_line: false,
            stacktrace_level: "error".to_string(),
            format: OutputStyle::Console,
            console: true,
            compress: false,
        }
    }
}

impl LoggerConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_time_format(mut self, format: impl Into<String>) -> Self {
        self.time_format = format.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age_days(mut self, days: i64) -> Self {
        self.max_age_days = days;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_color(mut self, enabled: bool) -> Self {
        self.color = enabled;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_show_line(mut self, enabled: bool) -> Self {
        self.show_line = enabled;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_stacktrace_level(mut self, level: impl Into<String>) -> Self {
        self.stacktrace_level = level.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_output_style(mut self, style: OutputStyle) -> Self {
        self.format = style;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    /// Resolve defaults and parse the string-typed fields.
    ///
    /// Misconfiguration is never an error: unknown levels become `Info`, a
    /// blank or invalid time format becomes the default layout, and a
    /// non-positive retention becomes seven days.
    pub fn normalize(&self) -> NormalizedConfig {
        let prefix = if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{} ", self.prefix)
        };

        let time_format = self.time_format.trim();
        let time_format = if time_format.is_empty() {
            DEFAULT_TIME_FORMAT.to_string()
        } else if let Err(e) = validate_time_format(time_format) {
            eprintln!("[LOGGER WARNING] {}; using default time format", e);
            DEFAULT_TIME_FORMAT.to_string()
        } else {
            time_format.to_string()
        };

        let stacktrace_level = match self.stacktrace_level.trim() {
            "" => None,
            level => Some(LogLevel::parse_lenient(level)),
        };

        let max_age_days = if self.max_age_days <= 0 {
            DEFAULT_MAX_AGE_DAYS
        } else {
            self.max_age_days
        };

        NormalizedConfig {
            level: LogLevel::parse_lenient(&self.level),
            dir: self.dir.clone(),
            time_layout: format!("{}{}", escape_prefix(&prefix), time_format),
            prefix,
            time_format,
            max_age: retention(max_age_days),
            color: self.color,
            show_line: self.show_line,
            stacktrace_level,
            style: self.format,
            console: self.console,
            compress: self.compress,
        }
    }
}

/// Days to a retention window; saturates instead of overflowing so a huge
/// value keeps files forever rather than wrapping to zero.
fn retention(days: i64) -> Duration {
    u64::try_from(days)
        .ok()
        .and_then(|d| d.checked_mul(SECONDS_PER_DAY))
        .map(Duration::from_secs)
        .unwrap_or(Duration::MAX)
}

/// Validated configuration the logger is actually built from
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedConfig {
    pub level: LogLevel,
    pub dir: PathBuf,
    /// Prefix with its trailing separator space, or empty
    pub prefix: String,
    pub time_format: String,
    /// `prefix` (escaped) followed by `time_format`
    pub time_layout: String,
    pub max_age: Duration,
    pub color: bool,
    pub show_line: bool,
    pub stacktrace_level: Option<LogLevel>,
    pub style: OutputStyle,
    pub console: bool,
    pub compress: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.console);
        assert!(config.color);
        assert_eq!(config.stacktrace_level, "error");
        assert_eq!(config.format, OutputStyle::Console);
    }

    #[test]
    fn test_normalize_fills_defaults() {
        let normalized = LoggerConfig::new("/tmp/x")
            .with_level("loud")
            .with_max_age_days(0)
            .normalize();

        assert_eq!(normalized.level, LogLevel::Info);
        assert_eq!(normalized.max_age, Duration::from_secs(7 * 24 * 3600));
        assert_eq!(normalized.time_format, DEFAULT_TIME_FORMAT);
        assert_eq!(normalized.prefix, "");
        assert_eq!(normalized.stacktrace_level, Some(LogLevel::Error));
    }

    #[test]
    fn test_normalize_prefix_and_negative_age() {
        let normalized = LoggerConfig::new("logs")
            .with_prefix("test")
            .with_max_age_days(-3)
            .with_time_format("%H:%M")
            .normalize();

        assert_eq!(normalized.prefix, "test ");
        assert_eq!(normalized.time_layout, "test %H:%M");
        assert_eq!(normalized.max_age, Duration::from_secs(7 * 24 * 3600));
    }

    #[test]
    fn test_huge_max_age_saturates() {
        let normalized = LoggerConfig::new("logs")
            .with_max_age_days(1i64 << 57)
            .normalize();
        assert_eq!(normalized.max_age, Duration::MAX);

        let normalized = LoggerConfig::new("logs").with_max_age_days(i64::MAX).normalize();
        assert_eq!(normalized.max_age, Duration::MAX);

        let normalized = LoggerConfig::new("logs").with_max_age_days(30).normalize();
        assert_eq!(normalized.max_age, Duration::from_secs(30 * 86_400));
    }

    #[test]
    fn test_normalize_invalid_time_format_falls_back() {
        let normalized = LoggerConfig::new("logs").with_time_format("%Q").normalize();
        assert_eq!(normalized.time_format, DEFAULT_TIME_FORMAT);
    }

    #[test]
    fn test_empty_stacktrace_level_disables_capture() {
        let normalized = LoggerConfig::new("logs").with_stacktrace_level("").normalize();
        assert_eq!(normalized.stacktrace_level, None);
    }

    #[test]
    fn test_from_json_partial() {
        let config = LoggerConfig::from_json(
            r#"{"level":"warn","dir":"/var/log/app","format":"json","color":false}"#,
        )
        .expect("valid config");

        assert_eq!(config.level, "warn");
        assert_eq!(config.dir, PathBuf::from("/var/log/app"));
        assert_eq!(config.format, OutputStyle::Json);
        assert!(!config.color);
        assert!(config.console);
        assert_eq!(config.max_age_days, DEFAULT_MAX_AGE_DAYS);
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        assert!(LoggerConfig::from_json("{not json").is_err());
    }
}
