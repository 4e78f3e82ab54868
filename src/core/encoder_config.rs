//! Encoder configuration: which keys a record carries and how each element
//! is rendered.
//!
//! An `EncoderConfig` is plain data. Reconfiguration never edits the live
//! value; it takes a copy through one of the `with_*`/`without_*` helpers and
//! rebuilds the core from that copy.

use super::config::NormalizedConfig;
use super::duration::format_duration;
use super::log_entry::Caller;
use super::log_level::LogLevel;
use super::timestamp::TimeEncoder;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the level element is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelEncoder {
    /// `INFO` wrapped in ANSI color
    CapitalColor,
    /// `INFO`
    Capital,
    /// `info` wrapped in ANSI color
    LowercaseColor,
    /// `info`
    Lowercase,
}

impl LevelEncoder {
    pub fn encode(&self, level: LogLevel) -> String {
        match self {
            LevelEncoder::CapitalColor => level.to_str().color(level.color_code()).to_string(),
            LevelEncoder::Capital => level.to_str().to_string(),
            LevelEncoder::LowercaseColor => level
                .to_lowercase_str()
                .color(level.color_code())
                .to_string(),
            LevelEncoder::Lowercase => level.to_lowercase_str().to_string(),
        }
    }

    /// Same casing without color
    pub fn plain(&self) -> Self {
        match self {
            LevelEncoder::CapitalColor | LevelEncoder::Capital => LevelEncoder::Capital,
            LevelEncoder::LowercaseColor | LevelEncoder::Lowercase => LevelEncoder::Lowercase,
        }
    }

    pub fn is_colored(&self) -> bool {
        matches!(self, LevelEncoder::CapitalColor | LevelEncoder::LowercaseColor)
    }
}

/// How duration-valued fields are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DurationEncoder {
    /// Floating-point seconds
    #[default]
    Seconds,
    /// Integer milliseconds
    Millis,
    /// Integer nanoseconds
    Nanos,
    /// Compact unit string (`1.5s`)
    String,
}

impl DurationEncoder {
    pub fn encode(&self, d: Duration) -> serde_json::Value {
        match self {
            DurationEncoder::Seconds => serde_json::Number::from_f64(d.as_secs_f64())
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            DurationEncoder::Millis => serde_json::Value::from(d.as_millis() as u64),
            DurationEncoder::Nanos => serde_json::Value::from(d.as_nanos() as u64),
            DurationEncoder::String => serde_json::Value::String(format_duration(d)),
        }
    }
}

/// How the caller element is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CallerEncoder {
    /// Source path as the compiler recorded it, and line. Files of the
    /// crate being built are relative to its root (`src/app/server.rs:42`);
    /// dependencies usually carry an absolute registry path.
    #[default]
    Full,
    /// Last directory and file name: `app/server.rs:42`
    Short,
}

impl CallerEncoder {
    pub fn encode(&self, caller: &Caller) -> String {
        match self {
            CallerEncoder::Full => format!("{}:{}", caller.file, caller.line),
            CallerEncoder::Short => format!("{}:{}", trimmed_path(&caller.file), caller.line),
        }
    }
}

fn trimmed_path(file: &str) -> &str {
    let mut separators = file.rmatch_indices(['/', '\\']);
    match (separators.next(), separators.next()) {
        (Some(_), Some((idx, _))) => &file[idx + 1..],
        _ => file,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub message_key: String,
    pub level_key: String,
    pub time_key: String,
    pub name_key: String,
    pub caller_key: String,
    pub function_key: String,
    /// Empty disables the stack trace element entirely
    pub stacktrace_key: String,
    pub line_ending: String,
    pub level_encoder: LevelEncoder,
    pub time_encoder: TimeEncoder,
    pub duration_encoder: DurationEncoder,
    pub caller_encoder: CallerEncoder,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            message_key: "message".to_string(),
            level_key: "level".to_string(),
            time_key: "time".to_string(),
            name_key: "logger".to_string(),
            caller_key: "caller".to_string(),
            function_key: "function".to_string(),
            stacktrace_key: "stacktrace".to_string(),
            line_ending: "\n".to_string(),
            level_encoder: LevelEncoder::CapitalColor,
            time_encoder: TimeEncoder::default(),
            duration_encoder: DurationEncoder::Seconds,
            caller_encoder: CallerEncoder::Full,
        }
    }
}

impl EncoderConfig {
    /// Derive the encoder configuration for a normalized logger config.
    pub fn from_config(config: &NormalizedConfig) -> Self {
        let mut encoder = Self {
            time_encoder: TimeEncoder::Layout(config.time_layout.clone()),
            ..Self::default()
        };
        if !config.color {
            encoder.level_encoder = encoder.level_encoder.plain();
        }
        if config.stacktrace_level.is_none() {
            encoder.stacktrace_key.clear();
        }
        encoder
    }

    /// Whether `key` is taken by a record element such as the message or
    /// level. Disabled (empty) keys reserve nothing.
    pub fn is_reserved_key(&self, key: &str) -> bool {
        !key.is_empty()
            && [
                &self.message_key,
                &self.level_key,
                &self.time_key,
                &self.name_key,
                &self.caller_key,
                &self.function_key,
                &self.stacktrace_key,
            ]
            .iter()
            .any(|reserved| reserved.as_str() == key)
    }

    #[must_use]
    pub fn without_stacktrace(&self) -> Self {
        let mut copy = self.clone();
        copy.stacktrace_key.clear();
        copy
    }

    #[must_use]
    pub fn with_time_encoder(&self, time_encoder: TimeEncoder) -> Self {
        let mut copy = self.clone();
        copy.time_encoder = time_encoder;
        copy
    }

    #[must_use]
    pub fn with_plain_levels(&self) -> Self {
        let mut copy = self.clone();
        copy.level_encoder = copy.level_encoder.plain();
        copy
    }

    pub fn stacktrace_enabled(&self) -> bool {
        !self.stacktrace_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::LoggerConfig;

    #[test]
    fn test_defaults_match_documented_keys() {
        let config = EncoderConfig::default();
        assert_eq!(config.message_key, "message");
        assert_eq!(config.name_key, "logger");
        assert_eq!(config.stacktrace_key, "stacktrace");
        assert_eq!(config.level_encoder, LevelEncoder::CapitalColor);
        assert_eq!(config.caller_encoder, CallerEncoder::Full);
    }

    #[test]
    fn test_from_config_color_and_stacktrace() {
        let normalized = LoggerConfig::new("logs")
            .with_color(false)
            .with_stacktrace_level("")
            .normalize();
        let config = EncoderConfig::from_config(&normalized);

        assert_eq!(config.level_encoder, LevelEncoder::Capital);
        assert!(!config.stacktrace_enabled());
    }

    #[test]
    fn test_from_config_prefix_in_time_layout() {
        let normalized = LoggerConfig::new("logs").with_prefix("api").normalize();
        let config = EncoderConfig::from_config(&normalized);

        match &config.time_encoder {
            TimeEncoder::Layout(layout) => assert!(layout.starts_with("api ")),
            other => panic!("unexpected time encoder {:?}", other),
        }
    }

    #[test]
    fn test_copy_helpers_leave_original_untouched() {
        let original = EncoderConfig::default();
        let plain = original.with_plain_levels();
        let no_trace = original.without_stacktrace();

        assert!(original.level_encoder.is_colored());
        assert!(!plain.level_encoder.is_colored());
        assert!(original.stacktrace_enabled());
        assert!(!no_trace.stacktrace_enabled());
    }

    #[test]
    fn test_plain_levels_is_idempotent() {
        let once = EncoderConfig::default().with_plain_levels();
        let twice = once.with_plain_levels();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_caller_encoders() {
        let caller = Caller {
            file: "/home/dev/app/src/server.rs".to_string(),
            line: 42,
            function: None,
        };
        assert_eq!(CallerEncoder::Full.encode(&caller), "/home/dev/app/src/server.rs:42");
        assert_eq!(CallerEncoder::Short.encode(&caller), "src/server.rs:42");

        let bare = Caller {
            file: "main.rs".to_string(),
            line: 1,
            function: None,
        };
        assert_eq!(CallerEncoder::Short.encode(&bare), "main.rs:1");
    }

    #[test]
    fn test_duration_encoders() {
        let d = Duration::from_millis(1500);
        assert_eq!(DurationEncoder::Seconds.encode(d), serde_json::json!(1.5));
        assert_eq!(DurationEncoder::Millis.encode(d), serde_json::json!(1500));
        assert_eq!(DurationEncoder::Nanos.encode(d), serde_json::json!(1_500_000_000u64));
        assert_eq!(DurationEncoder::String.encode(d), serde_json::json!("1.5s"));
    }

    #[test]
    fn test_plain_level_encoding_has_no_escape_codes() {
        let encoded = LevelEncoder::Capital.encode(LogLevel::Error);
        assert_eq!(encoded, "ERROR");
        assert!(!encoded.contains('\u{1b}'));
    }
}
