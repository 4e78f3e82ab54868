//! Record encoders
//!
//! Provides the two output styles a core can be built with:
//! - Console: tab-separated, human-readable line
//! - Json: one JSON object per line

use super::encoder_config::{DurationEncoder, EncoderConfig};
use super::log_context::{FieldValue, LogContext};
use super::log_entry::LogEntry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output style of a logger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// Example: `2025/01/08 - 10:30:45.123	INFO	Request processed	{"status":200}`
    #[default]
    Console,

    /// Example: `{"level":"INFO","time":"2025/01/08 - 10:30:45.123","message":"Request processed"}`
    Json,
}

impl OutputStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputStyle::Console => "console",
            OutputStyle::Json => "json",
        }
    }
}

impl fmt::Display for OutputStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputStyle {
    type Err = std::convert::Infallible;

    /// `"json"` selects JSON; every other value is console.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("json") {
            Ok(OutputStyle::Json)
        } else {
            Ok(OutputStyle::Console)
        }
    }
}

/// Serializer selected by output style, bound to one encoder configuration
#[derive(Debug, Clone)]
pub enum Encoder {
    Console(EncoderConfig),
    Json(EncoderConfig),
}

impl Encoder {
    pub fn new(style: OutputStyle, config: EncoderConfig) -> Self {
        match style {
            OutputStyle::Console => Encoder::Console(config),
            OutputStyle::Json => Encoder::Json(config),
        }
    }

    pub fn style(&self) -> OutputStyle {
        match self {
            Encoder::Console(_) => OutputStyle::Console,
            Encoder::Json(_) => OutputStyle::Json,
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        match self {
            Encoder::Console(config) | Encoder::Json(config) => config,
        }
    }

    /// Encode one record into a complete line, line ending included.
    pub fn encode(&self, entry: &LogEntry) -> String {
        match self {
            Encoder::Console(config) => encode_console(config, entry),
            Encoder::Json(config) => encode_json(config, entry),
        }
    }
}

/// Replace line breaks and tabs so one record stays on one line.
fn sanitize_message(message: &str) -> String {
    message
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

fn encode_console(config: &EncoderConfig, entry: &LogEntry) -> String {
    let mut elements: Vec<String> = Vec::with_capacity(6);

    if !config.time_key.is_empty() {
        elements.push(config.time_encoder.format(&entry.timestamp));
    }
    if !config.level_key.is_empty() {
        elements.push(config.level_encoder.encode(entry.level));
    }
    if let (false, Some(name)) = (config.name_key.is_empty(), entry.logger_name.as_ref()) {
        elements.push(name.clone());
    }
    if let (false, Some(caller)) = (config.caller_key.is_empty(), entry.caller.as_ref()) {
        elements.push(config.caller_encoder.encode(caller));
        if let (false, Some(function)) = (config.function_key.is_empty(), caller.function.as_ref()) {
            elements.push(function.clone());
        }
    }
    if !config.message_key.is_empty() {
        elements.push(sanitize_message(&entry.message));
    }
    if !entry.context.is_empty() {
        let fields = context_to_json(&entry.context, &config.duration_encoder);
        elements.push(serde_json::Value::Object(fields).to_string());
    }

    let mut line = elements.join("\t");
    if let (true, Some(stacktrace)) = (config.stacktrace_enabled(), entry.stacktrace.as_ref()) {
        line.push('\n');
        line.push_str(stacktrace.trim_end());
    }
    line.push_str(&config.line_ending);
    line
}

const FIELD_KEY_PREFIX: &str = "fields.";

fn encode_json(config: &EncoderConfig, entry: &LogEntry) -> String {
    use serde_json::Value;

    let mut obj = serde_json::Map::new();

    if !config.level_key.is_empty() {
        // Color codes have no place inside a JSON string
        let level = config.level_encoder.plain().encode(entry.level);
        obj.insert(config.level_key.clone(), Value::String(level));
    }
    if !config.time_key.is_empty() {
        let time = config.time_encoder.format(&entry.timestamp);
        let value = if config.time_encoder.is_numeric() {
            Value::Number(entry.timestamp.timestamp_millis().into())
        } else {
            Value::String(time)
        };
        obj.insert(config.time_key.clone(), value);
    }
    if let (false, Some(name)) = (config.name_key.is_empty(), entry.logger_name.as_ref()) {
        obj.insert(config.name_key.clone(), Value::String(name.clone()));
    }
    if let (false, Some(caller)) = (config.caller_key.is_empty(), entry.caller.as_ref()) {
        obj.insert(
            config.caller_key.clone(),
            Value::String(config.caller_encoder.encode(caller)),
        );
        if let (false, Some(function)) = (config.function_key.is_empty(), caller.function.as_ref()) {
            obj.insert(config.function_key.clone(), Value::String(function.clone()));
        }
    }
    if !config.message_key.is_empty() {
        obj.insert(config.message_key.clone(), Value::String(entry.message.clone()));
    }
    // A field never replaces a record element; colliding names move aside.
    for (key, value) in context_to_json(&entry.context, &config.duration_encoder) {
        let key = if config.is_reserved_key(&key) {
            format!("{}{}", FIELD_KEY_PREFIX, key)
        } else {
            key
        };
        obj.insert(key, value);
    }
    if let (true, Some(stacktrace)) = (config.stacktrace_enabled(), entry.stacktrace.as_ref()) {
        obj.insert(
            config.stacktrace_key.clone(),
            Value::String(stacktrace.trim_end().to_string()),
        );
    }

    let mut line = Value::Object(obj).to_string();
    line.push_str(&config.line_ending);
    line
}

fn context_to_json(
    context: &LogContext,
    durations: &DurationEncoder,
) -> serde_json::Map<String, serde_json::Value> {
    context
        .fields()
        .iter()
        .map(|(key, value)| (key.clone(), field_to_json(value, durations)))
        .collect()
}

fn field_to_json(value: &FieldValue, durations: &DurationEncoder) -> serde_json::Value {
    use serde_json::Value;

    match value {
        FieldValue::String(s) => Value::String(s.clone()),
        FieldValue::Int(i) => Value::Number((*i).into()),
        FieldValue::UInt(u) => Value::Number((*u).into()),
        FieldValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::Duration(d) => durations.encode(*d),
        FieldValue::Null => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::encoder_config::LevelEncoder;
    use crate::core::log_entry::Caller;
    use crate::core::log_level::LogLevel;
    use crate::core::timestamp::TimeEncoder;
    use chrono::{Local, TimeZone};
    use std::time::Duration;

    fn plain_config() -> EncoderConfig {
        EncoderConfig {
            level_encoder: LevelEncoder::Capital,
            time_encoder: TimeEncoder::Layout("%Y-%m-%d %H:%M:%S".to_string()),
            ..EncoderConfig::default()
        }
    }

    fn sample_entry() -> LogEntry {
        let ts = Local
            .with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime");
        LogEntry::new(LogLevel::Warn, "disk almost full")
            .with_timestamp(ts)
            .with_context(
                LogContext::new()
                    .with_field("used_pct", 93)
                    .with_field("mount", "/var"),
            )
    }

    #[test]
    fn test_console_layout() {
        let line = Encoder::new(OutputStyle::Console, plain_config()).encode(&sample_entry());
        assert_eq!(
            line,
            "2025-01-08 10:30:45\tWARN\tdisk almost full\t{\"used_pct\":93,\"mount\":\"/var\"}\n"
        );
    }

    #[test]
    fn test_console_name_caller_and_function() {
        let entry = sample_entry()
            .with_name(Some("http".to_string()))
            .with_caller(Caller {
                file: "src/server.rs".to_string(),
                line: 12,
                function: Some("app::server".to_string()),
            })
            .with_context(LogContext::new());
        let line = Encoder::new(OutputStyle::Console, plain_config()).encode(&entry);
        assert_eq!(
            line,
            "2025-01-08 10:30:45\tWARN\thttp\tsrc/server.rs:12\tapp::server\tdisk almost full\n"
        );
    }

    #[test]
    fn test_console_escapes_newlines_in_message() {
        let entry = LogEntry::new(LogLevel::Info, "line one\nERROR forged");
        let line = Encoder::new(OutputStyle::Console, plain_config()).encode(&entry);
        assert_eq!(line.lines().count(), 1);
        assert!(line.contains("line one\\nERROR forged"));
    }

    #[test]
    fn test_stacktrace_only_with_key() {
        let entry = sample_entry().with_stacktrace("frame 0\nframe 1\n".to_string());

        let with_key = Encoder::new(OutputStyle::Console, plain_config()).encode(&entry);
        assert!(with_key.ends_with("\nframe 0\nframe 1\n"));

        let without_key =
            Encoder::new(OutputStyle::Console, plain_config().without_stacktrace()).encode(&entry);
        assert!(!without_key.contains("frame 0"));
        assert_eq!(without_key.lines().count(), 1);

        let json = Encoder::new(OutputStyle::Json, plain_config().without_stacktrace()).encode(&entry);
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert!(parsed.get("stacktrace").is_none());
    }

    #[test]
    fn test_json_layout_and_key_order() {
        let entry = sample_entry().with_caller(Caller {
            file: "src/disk.rs".to_string(),
            line: 7,
            function: None,
        });
        let line = Encoder::new(OutputStyle::Json, plain_config()).encode(&entry);
        assert!(line.ends_with('\n'));

        let parsed: serde_json::Value = serde_json::from_str(line.trim_end()).expect("valid json");
        assert_eq!(parsed["level"], "WARN");
        assert_eq!(parsed["time"], "2025-01-08 10:30:45");
        assert_eq!(parsed["caller"], "src/disk.rs:7");
        assert_eq!(parsed["message"], "disk almost full");
        assert_eq!(parsed["used_pct"], 93);

        let keys: Vec<&String> = parsed.as_object().expect("object").keys().collect();
        assert_eq!(keys, vec!["level", "time", "caller", "message", "used_pct", "mount"]);
    }

    #[test]
    fn test_json_fields_cannot_forge_record_elements() {
        let entry = sample_entry().with_context(
            LogContext::new()
                .with_field("message", "forged")
                .with_field("level", "DEBUG")
                .with_field("time", 0)
                .with_field("user", "alice"),
        );
        let line = Encoder::new(OutputStyle::Json, plain_config()).encode(&entry);
        let parsed: serde_json::Value = serde_json::from_str(line.trim_end()).expect("valid json");

        assert_eq!(parsed["message"], "disk almost full");
        assert_eq!(parsed["level"], "WARN");
        assert_eq!(parsed["time"], "2025-01-08 10:30:45");
        assert_eq!(parsed["fields.message"], "forged");
        assert_eq!(parsed["fields.level"], "DEBUG");
        assert_eq!(parsed["fields.time"], 0);
        assert_eq!(parsed["user"], "alice");
    }

    #[test]
    fn test_disabled_key_frees_the_name() {
        let mut config = plain_config();
        config.message_key.clear();
        assert!(!config.is_reserved_key("message"));
        assert!(!config.is_reserved_key(""));
        assert!(config.is_reserved_key("caller"));

        let entry = sample_entry().with_context(LogContext::new().with_field("message", "kept"));
        let line = Encoder::new(OutputStyle::Json, config).encode(&entry);
        let parsed: serde_json::Value = serde_json::from_str(line.trim_end()).expect("valid json");
        assert_eq!(parsed["message"], "kept");
    }

    #[test]
    fn test_json_levels_never_colored() {
        let config = EncoderConfig {
            level_encoder: LevelEncoder::CapitalColor,
            ..plain_config()
        };
        let line = Encoder::new(OutputStyle::Json, config).encode(&sample_entry());
        assert!(!line.contains('\u{1b}'));
    }

    #[test]
    fn test_json_durations_and_numeric_time() {
        let config = EncoderConfig {
            time_encoder: TimeEncoder::EpochMillis,
            ..plain_config()
        };
        let entry = sample_entry()
            .with_context(LogContext::new().with_field("elapsed", Duration::from_millis(250)));
        let line = Encoder::new(OutputStyle::Json, config).encode(&entry);
        let parsed: serde_json::Value = serde_json::from_str(&line).expect("valid json");

        assert!(parsed["time"].is_i64());
        assert_eq!(parsed["elapsed"], serde_json::json!(0.25));
    }

    #[test]
    fn test_style_parsing() {
        assert_eq!("json".parse::<OutputStyle>(), Ok(OutputStyle::Json));
        assert_eq!("JSON".parse::<OutputStyle>(), Ok(OutputStyle::Json));
        assert_eq!("console".parse::<OutputStyle>(), Ok(OutputStyle::Console));
        assert_eq!("pretty".parse::<OutputStyle>(), Ok(OutputStyle::Console));
    }
}
