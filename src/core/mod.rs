//! Core logger types and traits

pub mod appender;
pub mod config;
pub mod duration;
pub mod encoder_config;
pub mod error;
pub mod log_context;
pub mod log_core;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod output_format;
pub mod sink;
pub mod timestamp;

pub use appender::Appender;
pub use config::{LoggerConfig, NormalizedConfig, DEFAULT_MAX_AGE_DAYS};
pub use encoder_config::{CallerEncoder, DurationEncoder, EncoderConfig, LevelEncoder};
pub use error::{LoggerError, Result};
pub use log_context::{FieldValue, LogContext};
pub use log_core::{build_core, LogCore};
pub use log_entry::{Caller, LogEntry};
pub use log_level::LogLevel;
pub use logger::Logger;
pub use metrics::LoggerMetrics;
pub use output_format::{Encoder, OutputStyle};
pub use sink::Sink;
pub use timestamp::{TimeEncoder, DEFAULT_TIME_FORMAT};
