//! Basic logger usage example
//!
//! Walks through the reconfiguration calls on a live logger: caller lines,
//! stack traces, color and JSON output.
//!
//! Run with: cargo run --example basic_usage

use rust_logger_facade::prelude::*;

fn main() -> Result<()> {
    let logger = Logger::new(
        LoggerConfig::new("logs")
            .with_level("debug")
            .with_prefix("demo"),
    )?;

    logger.debug("hello world!");
    logger.info("today is a holiday!");

    // Show the calling file and line
    logger.show_line();
    logger.info("visiting the old summer palace");

    // Errors carry a stack trace by default
    logger.error_with_context(
        "but I did not bring cash",
        LogContext::new().with_error(&"wallet not found"),
    );

    logger.close_color();

    // Capture stack traces from debug upwards
    logger.set_stacktrace_level(LogLevel::Debug);
    logger.info("a message arrived on my phone");

    logger.close_stacktrace();
    logger.warn_with_context(
        "it is going to rain in the afternoon",
        LogContext::new()
            .with_field("start_from", "14:00")
            .with_field("probability", "60%"),
    );

    logger.set_json_style();
    logger.set_time_format("%H:%M:%S");
    logger.info_with_context(
        "and I forgot my umbrella",
        LogContext::new().with_field("umbrella", FieldValue::Null),
    );

    logger.flush()?;
    let metrics = logger.metrics();
    println!(
        "\nlogged {} records, {} dropped ({:.1}%)",
        metrics.total_logged(),
        metrics.dropped_count(),
        metrics.drop_rate()
    );
    Ok(())
}
