//! HTTP access-log adapter
//!
//! Turns request-completion records from an HTTP framework into single
//! fixed-width lines and logs them at info level through a [`Logger`].
//! Frameworks that only accept an output stream get an [`AccessLogWriter`].

use crate::core::duration::{format_duration, truncate_to_seconds};
use crate::core::{LogLevel, Logger};
use chrono::{DateTime, Local};
use colored::Color;
use std::io;
use std::panic::Location;
use std::time::Duration;

const RESET: &str = "\x1b[0m";

/// Whether access lines carry ANSI color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Color when writing to a terminal
    #[default]
    Auto,
    Force,
    Disable,
}

/// One completed request as reported by the HTTP framework.
#[derive(Debug, Clone)]
pub struct AccessRecord {
    pub timestamp: DateTime<Local>,
    pub status: u16,
    pub latency: Duration,
    pub client_ip: String,
    pub method: String,
    pub path: String,
    /// Empty when the request produced no error
    pub error_message: String,
    pub is_terminal: bool,
    pub color_mode: ColorMode,
}

impl AccessRecord {
    pub fn new(
        status: u16,
        latency: Duration,
        client_ip: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            status,
            latency,
            client_ip: client_ip.into(),
            method: method.into(),
            path: path.into(),
            error_message: String::new(),
            is_terminal: false,
            color_mode: ColorMode::Auto,
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_terminal(mut self, is_terminal: bool) -> Self {
        self.is_terminal = is_terminal;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_color_mode(mut self, mode: ColorMode) -> Self {
        self.color_mode = mode;
        self
    }

    pub fn is_output_color(&self) -> bool {
        match self.color_mode {
            ColorMode::Force => true,
            ColorMode::Auto => self.is_terminal,
            ColorMode::Disable => false,
        }
    }

    /// Foreground and background for the status segment
    fn status_colors(&self) -> (Color, Color) {
        match self.status {
            200..=299 => (Color::BrightWhite, Color::Green),
            300..=399 => (Color::BrightBlack, Color::White),
            400..=499 => (Color::BrightBlack, Color::Yellow),
            _ => (Color::BrightWhite, Color::Red),
        }
    }

    fn method_colors(&self) -> Option<(Color, Color)> {
        let bg = match self.method.as_str() {
            "GET" => Color::Blue,
            "POST" => Color::Cyan,
            "PUT" => Color::Yellow,
            "DELETE" => Color::Red,
            "PATCH" => Color::Green,
            "HEAD" => Color::Magenta,
            "OPTIONS" => Color::White,
            _ => return None,
        };
        let fg = if bg == Color::White || bg == Color::Yellow {
            Color::BrightBlack
        } else {
            Color::BrightWhite
        };
        Some((fg, bg))
    }
}

/// Escape sequence for a colored segment.
///
/// Built from the palette directly: whether to color is decided by the
/// record, not by the process's terminal detection.
fn ansi(colors: Option<(Color, Color)>) -> String {
    match colors {
        Some((fg, bg)) => format!("\x1b[{};{}m", fg.to_fg_str(), bg.to_bg_str()),
        None => RESET.to_string(),
    }
}

/// Render one access line.
///
/// Layout: `|<status>| <latency> | <client ip> |<method> "<path>"`, with the
/// error message on a following line when present. Latency above one minute
/// drops its sub-second part.
///
/// # Example
///
/// ```
/// use rust_logger_facade::access_log::{format_access_line, AccessRecord};
/// use std::time::Duration;
///
/// let record = AccessRecord::new(200, Duration::from_millis(1500), "127.0.0.1", "GET", "/ping");
/// let line = format_access_line(&record);
/// assert_eq!(line, "| 200 |          1.5s |       127.0.0.1 | GET      \"/ping\"");
/// ```
pub fn format_access_line(record: &AccessRecord) -> String {
    let latency = if record.latency > Duration::from_secs(60) {
        truncate_to_seconds(record.latency)
    } else {
        record.latency
    };

    let (status_color, method_color, reset) = if record.is_output_color() {
        (
            ansi(Some(record.status_colors())),
            ansi(record.method_colors()),
            RESET,
        )
    } else {
        (String::new(), String::new(), "")
    };

    let mut line = format!(
        "|{} {:3} {}| {:>13} | {:>15} |{} {:<7} {} {:?}",
        status_color,
        record.status,
        reset,
        format_duration(latency),
        record.client_ip,
        method_color,
        record.method,
        reset,
        record.path,
    );
    if !record.error_message.is_empty() {
        line.push('\n');
        line.push_str(&record.error_message);
    }
    line
}

/// Logs formatted access records, attributing each line to its caller.
#[derive(Debug, Clone)]
pub struct AccessLog {
    logger: Logger,
}

impl AccessLog {
    pub fn new(logger: &Logger) -> Self {
        Self {
            logger: logger.clone(),
        }
    }

    #[track_caller]
    pub fn log_request(&self, record: &AccessRecord) {
        self.logger
            .log_at(LogLevel::Info, format_access_line(record), Location::caller());
    }

    /// Stream adapter attributed to the caller of this method.
    #[track_caller]
    pub fn writer(&self) -> AccessLogWriter {
        AccessLogWriter::at(self.logger.clone(), Location::caller())
    }
}

/// Pending bytes above this are logged even without a trailing newline.
const MAX_PENDING: usize = 64 * 1024;

/// `io::Write` adapter for frameworks that print access lines to a stream.
///
/// Bytes are buffered until a write leaves the buffer ending in a newline;
/// the buffered text is then trimmed and logged at info level as one record.
/// A line assembled from several writes (as `writeln!` does) therefore stays
/// one record, and so does an access line followed by its error line.
/// Whatever is still buffered is logged on `flush` and on drop.
///
/// Caller annotation points at the place the writer was created, usually
/// where the access-log middleware is installed.
///
/// # Example
///
/// ```
/// use rust_logger_facade::access_log::AccessLogWriter;
/// use rust_logger_facade::{Logger, LoggerConfig, Sink};
/// use std::io::Write;
///
/// let logger = Logger::with_sink(LoggerConfig::default(), Sink::new());
/// let mut writer = AccessLogWriter::new(&logger);
/// assert_eq!(writer.write(b"  | 200 | GET \"/ping\"\n").unwrap(), 22);
/// writeln!(writer, "|{:3}| {} | {}", 404, "10.0.0.2", "/missing")?;
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct AccessLogWriter {
    logger: Logger,
    location: &'static Location<'static>,
    pending: Vec<u8>,
}

impl AccessLogWriter {
    #[track_caller]
    pub fn new(logger: &Logger) -> Self {
        Self::at(logger.clone(), Location::caller())
    }

    fn at(logger: Logger, location: &'static Location<'static>) -> Self {
        Self {
            logger,
            location,
            pending: Vec::new(),
        }
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Log the buffered text as one record, skipping it when blank.
    fn emit_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        let text = String::from_utf8_lossy(&pending);
        let line = text.trim();
        if !line.is_empty() {
            self.logger.log_at(LogLevel::Info, line, self.location);
        }
    }
}

impl io::Write for AccessLogWriter {
    /// Always reports the whole buffer as written.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        if self.pending.ends_with(b"\n") || self.pending.len() > MAX_PENDING {
            self.emit_pending();
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit_pending();
        self.logger.flush().map_err(io::Error::other)
    }
}

impl Drop for AccessLogWriter {
    fn drop(&mut self) {
        self.emit_pending();
    }
}
