//! Access-log example
//!
//! Feeds a few request-completion records through the logger, once directly
//! and once through the `io::Write` adapter an HTTP framework would print to.
//!
//! Run with: cargo run --example access_log

use rust_logger_facade::access_log::format_access_line;
use rust_logger_facade::prelude::*;
use std::io::Write;
use std::time::Duration;

fn main() -> Result<()> {
    let logger = Logger::new(LoggerConfig::new("logs").with_show_line(true))?;
    let access = AccessLog::new(&logger.named("http"));

    let requests = [
        AccessRecord::new(200, Duration::from_millis(1500), "127.0.0.1", "GET", "/ping"),
        AccessRecord::new(201, Duration::from_micros(830), "10.0.0.12", "POST", "/users"),
        AccessRecord::new(404, Duration::from_millis(3), "10.0.0.7", "GET", "/missing"),
        AccessRecord::new(502, Duration::from_millis(61_250), "10.0.0.9", "PUT", "/upload")
            .with_error("upstream closed connection"),
    ];

    for record in &requests {
        access.log_request(record);
    }

    // Frameworks that only know how to print get a writer; caller lines
    // point here, where it was installed.
    let mut writer = access.writer();
    for record in &requests {
        let line = format_access_line(&record.clone().with_color_mode(ColorMode::Force));
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;

    Ok(())
}
