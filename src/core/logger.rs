//! Logger facade
//!
//! A [`Logger`] is a cheap handle onto an atomically swappable snapshot of
//! its configuration. Log calls load the snapshot once and use it for the
//! whole record; reconfiguration calls copy the snapshot, change one thing,
//! rebuild the core and swap the result in.

use super::{
    appender::Appender,
    config::{LoggerConfig, NormalizedConfig},
    encoder_config::EncoderConfig,
    error::Result,
    log_context::LogContext,
    log_core::{build_core, LogCore},
    log_entry::{Caller, LogEntry},
    log_level::LogLevel,
    metrics::LoggerMetrics,
    output_format::OutputStyle,
    sink::Sink,
    timestamp::TimeEncoder,
};
use crate::appenders::{ConsoleAppender, DailyFileAppender};
use arc_swap::ArcSwap;
use std::backtrace::Backtrace;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Everything one record needs, swapped as a unit
#[derive(Debug, Clone)]
struct LoggerState {
    core: LogCore,
    /// Kept so time-format changes keep the configured prefix
    prefix: String,
    annotate_caller: bool,
    stacktrace_level: Option<LogLevel>,
    name: Option<String>,
    fields: LogContext,
}

impl LoggerState {
    fn captures_stacktrace(&self, level: LogLevel) -> bool {
        self.core.encoder_config().stacktrace_enabled()
            && self.stacktrace_level.is_some_and(|threshold| level >= threshold)
    }
}

/// Long-lived logging handle.
///
/// Clones share configuration: a reconfiguration through any clone is seen
/// by all of them. [`Logger::named`] and [`Logger::with_fields`] create
/// derived handles that start from the current configuration and are
/// reconfigured independently afterwards.
///
/// # Example
///
/// ```no_run
/// use rust_logger_facade::prelude::*;
///
/// let logger = Logger::new(LoggerConfig::new("logs").with_level("debug"))?;
/// logger.info("server started");
///
/// logger.show_line().close_color();
/// logger.warn_with_context(
///     "slow request",
///     LogContext::new().with_field("path", "/ping"),
/// );
/// # Ok::<(), rust_logger_facade::LoggerError>(())
/// ```
#[derive(Clone)]
pub struct Logger {
    state: Arc<ArcSwap<LoggerState>>,
    metrics: Arc<LoggerMetrics>,
}

impl Logger {
    /// Build a logger writing to a daily rotating file in `config.dir`,
    /// echoed to stdout when `config.console` is set.
    ///
    /// # Errors
    ///
    /// Fails when the log directory cannot be created or today's file cannot
    /// be opened.
    pub fn new(config: LoggerConfig) -> Result<Self> {
        let normalized = config.normalize();

        let file = DailyFileAppender::new(&normalized.dir, normalized.max_age)?
            .with_compression(normalized.compress);

        let mut sink = Sink::new();
        if normalized.console {
            sink.push(Box::new(ConsoleAppender::stdout()));
        }
        sink.push(Box::new(file));

        Ok(Self::from_normalized(&normalized, sink))
    }

    /// Build a logger over caller-supplied destinations.
    ///
    /// `config.dir`, `config.console` and `config.compress` are ignored; the
    /// sink decides where lines go.
    pub fn with_sink(config: LoggerConfig, sink: Sink) -> Self {
        Self::from_normalized(&config.normalize(), sink)
    }

    /// Convenience for a single custom destination.
    pub fn with_appender<A: Appender + 'static>(config: LoggerConfig, appender: A) -> Self {
        Self::with_sink(config, Sink::new().with_appender(appender))
    }

    fn from_normalized(config: &NormalizedConfig, sink: Sink) -> Self {
        let core = build_core(
            EncoderConfig::from_config(config),
            config.style,
            Arc::new(sink),
            config.level,
        );

        let state = LoggerState {
            core,
            prefix: config.prefix.clone(),
            annotate_caller: config.show_line,
            stacktrace_level: config.stacktrace_level,
            name: None,
            fields: LogContext::new(),
        };

        Self {
            state: Arc::new(ArcSwap::from_pointee(state)),
            metrics: Arc::new(LoggerMetrics::new()),
        }
    }

    /// Read-copy-update the shared snapshot.
    ///
    /// `f` may run more than once if another reconfiguration races with this
    /// one; it always sees the latest snapshot, so neither change is lost.
    fn reconfigure<F>(&self, f: F) -> Logger
    where
        F: Fn(&LoggerState) -> LoggerState,
    {
        self.state.rcu(|current| f(&**current));
        self.metrics.record_reconfiguration();
        self.clone()
    }

    /// Derived handle with its own snapshot.
    fn derive(&self, state: LoggerState) -> Logger {
        Logger {
            state: Arc::new(ArcSwap::from_pointee(state)),
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Annotate records with the caller's file and line.
    pub fn show_line(&self) -> Logger {
        self.reconfigure(|s| LoggerState {
            annotate_caller: true,
            ..s.clone()
        })
    }

    /// Capture a stack trace for records at or above `level`; `None` never
    /// captures.
    ///
    /// Has no visible effect while the stack trace key is cleared (see
    /// [`Logger::close_stacktrace`]).
    pub fn set_stacktrace_level(&self, level: impl Into<Option<LogLevel>>) -> Logger {
        let level = level.into();
        self.reconfigure(|s| LoggerState {
            stacktrace_level: level,
            ..s.clone()
        })
    }

    /// Stop emitting stack traces, whatever the capture threshold.
    pub fn close_stacktrace(&self) -> Logger {
        self.reconfigure(|s| LoggerState {
            core: s.core.with_encoder_config(s.core.encoder_config().without_stacktrace()),
            ..s.clone()
        })
    }

    /// Render timestamps as the configured prefix followed by `format`.
    ///
    /// A blank format is ignored; an invalid one is reported on stderr and
    /// ignored. Neither counts as a reconfiguration.
    pub fn set_time_format(&self, format: &str) -> Logger {
        if format.trim().is_empty() {
            return self.clone();
        }

        // The prefix is fixed at construction, so the layout can be checked
        // once outside the update.
        let time_encoder = match TimeEncoder::layout(&self.state.load().prefix, format) {
            Ok(time_encoder) => time_encoder,
            Err(e) => {
                eprintln!("[LOGGER WARNING] {}; keeping current time format", e);
                return self.clone();
            }
        };

        self.reconfigure(|s| LoggerState {
            core: s
                .core
                .with_encoder_config(s.core.encoder_config().with_time_encoder(time_encoder.clone())),
            ..s.clone()
        })
    }

    /// Render levels without ANSI color.
    pub fn close_color(&self) -> Logger {
        self.reconfigure(|s| LoggerState {
            core: s.core.with_encoder_config(s.core.encoder_config().with_plain_levels()),
            ..s.clone()
        })
    }

    pub fn set_json_style(&self) -> Logger {
        self.set_output_style(OutputStyle::Json)
    }

    pub fn set_console_style(&self) -> Logger {
        self.set_output_style(OutputStyle::Console)
    }

    pub fn set_output_style(&self, style: OutputStyle) -> Logger {
        self.reconfigure(|s| LoggerState {
            core: s.core.with_style(style),
            ..s.clone()
        })
    }

    pub fn set_level(&self, level: LogLevel) -> Logger {
        self.reconfigure(|s| LoggerState {
            core: s.core.with_min_level(level),
            ..s.clone()
        })
    }

    /// Derived handle whose name is this logger's name plus `name`,
    /// dot-separated.
    pub fn named(&self, name: &str) -> Logger {
        let current = self.state.load_full();
        let name = match (&current.name, name.is_empty()) {
            (_, true) => current.name.clone(),
            (Some(parent), false) => Some(format!("{}.{}", parent, name)),
            (None, false) => Some(name.to_string()),
        };
        self.derive(LoggerState {
            name,
            ..current.as_ref().clone()
        })
    }

    /// Derived handle that adds `fields` to every record.
    pub fn with_fields(&self, fields: LogContext) -> Logger {
        let current = self.state.load_full();
        self.derive(LoggerState {
            fields: fields.merged_over(&current.fields),
            ..current.as_ref().clone()
        })
    }

    pub fn encoder_config(&self) -> EncoderConfig {
        self.state.load().core.encoder_config().clone()
    }

    pub fn output_style(&self) -> OutputStyle {
        self.state.load().core.style()
    }

    pub fn level(&self) -> LogLevel {
        self.state.load().core.min_level()
    }

    pub fn stacktrace_level(&self) -> Option<LogLevel> {
        self.state.load().stacktrace_level
    }

    pub fn shows_line(&self) -> bool {
        self.state.load().annotate_caller
    }

    pub fn name(&self) -> Option<String> {
        self.state.load().name.clone()
    }

    /// Whether a record at `level` would be written
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.state.load().core.enabled(level)
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    pub fn dropped_count(&self) -> u64 {
        self.metrics.dropped_count()
    }

    pub fn flush(&self) -> Result<()> {
        self.state.load().core.flush()
    }

    fn emit(
        &self,
        level: LogLevel,
        message: String,
        context: LogContext,
        location: &Location<'_>,
        function: Option<&str>,
    ) {
        let state = self.state.load_full();
        if !state.core.enabled(level) {
            self.metrics.record_filtered();
            return;
        }

        let context = if state.fields.is_empty() {
            context
        } else {
            context.merged_over(&state.fields)
        };

        let mut entry = LogEntry::new(level, message)
            .with_name(state.name.clone())
            .with_context(context);

        if state.annotate_caller {
            let mut caller = Caller::from_location(location);
            if let Some(function) = function {
                caller = caller.with_function(function);
            }
            entry = entry.with_caller(caller);
        }

        if state.captures_stacktrace(level) {
            entry = entry.with_stacktrace(Backtrace::force_capture().to_string());
        }

        match state.core.write(&entry) {
            Ok(()) => {
                self.metrics.record_logged();
            }
            Err(e) => {
                eprintln!("[LOGGER ERROR] Failed to write log record: {}", e);
                self.metrics.record_dropped();
            }
        }
    }

    /// Log at an explicit source location.
    pub(crate) fn log_at(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        location: &Location<'_>,
    ) {
        self.emit(level, message.into(), LogContext::new(), location, None);
    }

    /// Entry point for the logging macros, which also pass the path of the
    /// enclosing function.
    #[doc(hidden)]
    #[track_caller]
    pub fn log_in_function(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        context: LogContext,
        function: &'static str,
    ) {
        self.emit(
            level,
            message.into(),
            context,
            Location::caller(),
            Some(function),
        );
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(level, message.into(), LogContext::new(), Location::caller(), None);
    }

    /// Log with structured context fields
    #[track_caller]
    pub fn log_with_context(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        context: LogContext,
    ) {
        self.emit(level, message.into(), context, Location::caller(), None);
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    /// Logged at `DPanic`; never panics.
    #[inline]
    #[track_caller]
    pub fn dpanic(&self, message: impl Into<String>) {
        self.log(LogLevel::DPanic, message);
    }

    /// Log at `Panic`, then panic with the same message.
    #[track_caller]
    pub fn panic(&self, message: impl Into<String>) -> ! {
        let message = message.into();
        self.log(LogLevel::Panic, message.clone());
        panic!("{}", message);
    }

    /// Log at `Fatal`, flush, then exit the process with status 1.
    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>) -> ! {
        self.log(LogLevel::Fatal, message);
        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush before exit: {}", e);
        }
        std::process::exit(1);
    }

    #[track_caller]
    pub fn debug_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Debug, message, context);
    }

    #[track_caller]
    pub fn info_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Info, message, context);
    }

    #[track_caller]
    pub fn warn_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Warn, message, context);
    }

    #[track_caller]
    pub fn error_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Error, message, context);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.load();
        f.debug_struct("Logger")
            .field("name", &state.name)
            .field("level", &state.core.min_level())
            .field("style", &state.core.style())
            .field("show_line", &state.annotate_caller)
            .field("stacktrace_level", &state.stacktrace_level)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::encoder_config::LevelEncoder;
    use crate::core::error::LoggerError;
    use parking_lot::Mutex;

    #[derive(Clone, Default)]
    struct Capture {
        lines: Arc<Mutex<Vec<String>>>,
    }

    impl Capture {
        fn lines(&self) -> Vec<String> {
            self.lines.lock().clone()
        }
    }

    impl Appender for Capture {
        fn append(&mut self, line: &str) -> Result<()> {
            self.lines.lock().push(line.to_string());
            Ok(())
        }
        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
        fn name(&self) -> &str {
            "capture"
        }
    }

    fn plain_config() -> LoggerConfig {
        LoggerConfig::default()
            .with_level("debug")
            .with_color(false)
            .with_stacktrace_level("")
            .with_console(false)
    }

    fn capture_logger(config: LoggerConfig) -> (Logger, Capture) {
        let capture = Capture::default();
        (Logger::with_appender(config, capture.clone()), capture)
    }

    #[test]
    fn test_level_filtering() {
        let (logger, capture) = capture_logger(plain_config().with_level("warn"));

        logger.info("hidden");
        logger.error("shown");

        let lines = capture.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("ERROR\tshown"));
        assert_eq!(logger.metrics().filtered_count(), 1);
        assert_eq!(logger.metrics().total_logged(), 1);
    }

    #[test]
    fn test_show_line_records_call_site() {
        let (logger, capture) = capture_logger(plain_config());

        logger.info("no caller");
        logger.show_line();
        let line_no = line!() + 1;
        logger.info("with caller");

        let lines = capture.lines();
        assert!(!lines[0].contains("logger.rs:"));
        assert!(lines[1].contains(&format!("{}:{}", file!(), line_no)));
    }

    #[test]
    fn test_toggles_are_durable_and_shared_by_clones() {
        let (logger, capture) = capture_logger(plain_config());
        let clone = logger.clone();

        logger.set_json_style();
        clone.info("as json");

        assert_eq!(logger.output_style(), OutputStyle::Json);
        let parsed: serde_json::Value =
            serde_json::from_str(&capture.lines()[0]).expect("json line");
        assert_eq!(parsed["message"], "as json");
    }

    #[test]
    fn test_toggles_compose() {
        let (logger, _capture) = capture_logger(plain_config().with_color(true));

        logger.close_color().close_stacktrace().set_json_style();
        let config = logger.encoder_config();

        assert_eq!(config.level_encoder, LevelEncoder::Capital);
        assert!(!config.stacktrace_enabled());
        assert_eq!(logger.output_style(), OutputStyle::Json);
        assert_eq!(logger.metrics().reconfigurations(), 3);
    }

    #[test]
    fn test_set_time_format_keeps_prefix() {
        let (logger, capture) = capture_logger(plain_config().with_prefix("svc"));

        logger.set_time_format("[fixed]");
        logger.info("hello");

        assert!(capture.lines()[0].starts_with("svc [fixed]\tINFO\thello"));
    }

    #[test]
    fn test_set_time_format_ignores_blank_and_invalid() {
        let (logger, _capture) = capture_logger(plain_config());
        let before = logger.encoder_config();

        logger.set_time_format("   ");
        logger.set_time_format("%Q");

        assert_eq!(logger.encoder_config(), before);
        assert_eq!(logger.metrics().reconfigurations(), 0);

        logger.set_time_format("%H:%M");
        assert_eq!(logger.metrics().reconfigurations(), 1);
    }

    #[test]
    fn test_stacktrace_threshold() {
        let (logger, capture) =
            capture_logger(plain_config().with_stacktrace_level("error"));

        logger.warn("below threshold");
        logger.error("at threshold");

        let lines = capture.lines();
        assert_eq!(lines[0].lines().count(), 1);
        assert!(lines[1].lines().count() > 1);

        logger.set_stacktrace_level(None);
        logger.error("no threshold");
        assert_eq!(capture.lines()[2].lines().count(), 1);

        logger.set_stacktrace_level(LogLevel::Warn);
        logger.close_stacktrace();
        logger.error("closed");
        assert_eq!(capture.lines()[3].lines().count(), 1);
    }

    #[test]
    fn test_set_stacktrace_level_without_key_emits_nothing() {
        let (logger, capture) = capture_logger(plain_config());

        logger.set_stacktrace_level(LogLevel::Debug);
        logger.error("no trace");

        assert_eq!(logger.stacktrace_level(), Some(LogLevel::Debug));
        assert_eq!(capture.lines()[0].lines().count(), 1);
    }

    #[test]
    fn test_named_and_fields_are_derived() {
        let (logger, capture) = capture_logger(plain_config());

        let http = logger
            .named("http")
            .named("access")
            .with_fields(LogContext::new().with_field("service", "api"));
        http.info_with_context("request", LogContext::new().with_field("status", 200));
        logger.info("root");

        let lines = capture.lines();
        assert!(lines[0].contains("\thttp.access\trequest\t{\"service\":\"api\",\"status\":200}"));
        assert!(!lines[1].contains("http"));

        http.set_json_style();
        assert_eq!(logger.output_style(), OutputStyle::Console);
    }

    #[test]
    fn test_set_level() {
        let (logger, capture) = capture_logger(plain_config());

        logger.set_level(LogLevel::Error);
        logger.warn("dropped by filter");
        assert!(capture.lines().is_empty());
        assert!(!logger.enabled(LogLevel::Warn));
        assert_eq!(logger.level(), LogLevel::Error);
    }

    #[test]
    fn test_write_failure_is_counted() {
        struct Broken;
        impl Appender for Broken {
            fn append(&mut self, _line: &str) -> Result<()> {
                Err(LoggerError::writer("permission revoked"))
            }
            fn flush(&mut self) -> Result<()> {
                Ok(())
            }
            fn name(&self) -> &str {
                "broken"
            }
        }

        let logger = Logger::with_appender(plain_config(), Broken);
        logger.info("lost");
        logger.info("lost again");

        assert_eq!(logger.dropped_count(), 2);
        assert_eq!(logger.metrics().total_logged(), 0);
        assert_eq!(logger.metrics().drop_rate(), 100.0);
    }

    #[test]
    #[should_panic(expected = "unrecoverable")]
    fn test_panic_logs_then_panics() {
        let (logger, _capture) = capture_logger(plain_config());
        logger.panic("unrecoverable");
    }
}
