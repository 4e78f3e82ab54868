//! # Rust Logger Facade
//!
//! A configurable logging facade with console or JSON output, optional
//! color, caller annotation, stack-trace capture above a threshold, custom
//! timestamp layouts and a daily rotating log file.
//!
//! ## Features
//!
//! - **Runtime reconfiguration**: style, color, caller annotation, stack
//!   traces, time format and level can be changed on a live logger
//! - **Daily files**: one `YYYY-MM-DD.log` per day with age-based retention
//! - **Thread Safe**: lines from concurrent callers never interleave
//! - **Access logs**: fixed-width HTTP request lines through the same logger
//!
//! ## Example
//!
//! ```no_run
//! use rust_logger_facade::prelude::*;
//!
//! let logger = Logger::new(LoggerConfig::new("logs").with_level("debug").with_prefix("app"))?;
//! logger.debug("hello world!");
//! logger.show_line().close_color();
//! logger.error_with_context("payment failed", LogContext::new().with_field("order", 42));
//! # Ok::<(), LoggerError>(())
//! ```

pub mod access_log;
pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::access_log::{AccessLog, AccessLogWriter, AccessRecord, ColorMode};
    pub use crate::appenders::{ConsoleAppender, DailyFileAppender};
    pub use crate::core::{
        Appender, FieldValue, LogContext, LogLevel, Logger, LoggerConfig, LoggerError,
        LoggerMetrics, OutputStyle, Result, Sink,
    };
}

pub use access_log::{format_access_line, AccessLog, AccessLogWriter, AccessRecord, ColorMode};
pub use appenders::{ConsoleAppender, DailyFileAppender};
pub use core::{
    build_core, Appender, EncoderConfig, FieldValue, LogContext, LogCore, LogEntry, LogLevel,
    Logger, LoggerConfig, LoggerError, LoggerMetrics, OutputStyle, Result, Sink, TimeEncoder,
};
