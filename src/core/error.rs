//! Error types for the logger facade
//!
//! Errors only surface while building a logger or from an appender; a failed
//! write during logging is reported on stderr and counted as dropped.

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Filesystem step of the daily file appender that failed outright, such
    /// as creating the log directory or reading a day's file for compression
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Console stream write or flush
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed `LoggerConfig` JSON
    #[error("Invalid logger configuration JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Opening, writing or flushing a dated log file
    #[error("Log file error for '{path}': {message}")]
    FileAppenderError { path: String, message: String },

    /// Opening the next day's file when the date changes
    #[error("Daily rotation failed in '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// Destination unusable, or an appender panicked inside the sink
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Rejected encoder setting; `element` names the part of the record
    /// (currently only `time` layouts are validated)
    #[error("Invalid {element} format: {message}")]
    FormatterError { element: String, message: String },
}

impl LoggerError {
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    pub fn file_appender(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileAppenderError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn file_rotation(dir: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: dir.into(),
            message: message.into(),
        }
    }

    /// Reject a setting of one record element, e.g. `formatter("time", ...)`
    pub fn formatter(element: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatterError {
            element: element.into(),
            message: message.into(),
        }
    }

    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }
}
