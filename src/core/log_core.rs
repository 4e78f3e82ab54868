//! Logging core: an encoder bound to a sink behind a minimum-level filter

use super::encoder_config::EncoderConfig;
use super::error::Result;
use super::log_entry::LogEntry;
use super::log_level::LogLevel;
use super::output_format::{Encoder, OutputStyle};
use super::sink::Sink;
use std::sync::Arc;

/// The object that decides whether a record is emitted and how.
///
/// Cores are immutable; changing any aspect of the output means building a
/// new core with [`build_core`].
#[derive(Debug, Clone)]
pub struct LogCore {
    encoder: Encoder,
    sink: Arc<Sink>,
    min_level: LogLevel,
}

/// Build a core that encodes with `encoder_config` in the given style.
///
/// Deterministic and side-effect free; the sink is shared, not copied.
pub fn build_core(
    encoder_config: EncoderConfig,
    style: OutputStyle,
    sink: Arc<Sink>,
    min_level: LogLevel,
) -> LogCore {
    LogCore {
        encoder: Encoder::new(style, encoder_config),
        sink,
        min_level,
    }
}

impl LogCore {
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    /// Encode `entry` and hand the complete line to the sink.
    pub fn write(&self, entry: &LogEntry) -> Result<()> {
        let line = self.encoder.encode(entry);
        self.sink.write(&line)
    }

    pub fn flush(&self) -> Result<()> {
        self.sink.flush()
    }

    pub fn encoder_config(&self) -> &EncoderConfig {
        self.encoder.config()
    }

    pub fn style(&self) -> OutputStyle {
        self.encoder.style()
    }

    pub fn sink(&self) -> &Arc<Sink> {
        &self.sink
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// Rebuild this core with a different encoder configuration.
    pub fn with_encoder_config(&self, encoder_config: EncoderConfig) -> LogCore {
        build_core(encoder_config, self.style(), Arc::clone(&self.sink), self.min_level)
    }

    /// Rebuild this core with a different output style.
    pub fn with_style(&self, style: OutputStyle) -> LogCore {
        build_core(
            self.encoder_config().clone(),
            style,
            Arc::clone(&self.sink),
            self.min_level,
        )
    }

    /// Rebuild this core with a different minimum level.
    pub fn with_min_level(&self, min_level: LogLevel) -> LogCore {
        build_core(
            self.encoder_config().clone(),
            self.style(),
            Arc::clone(&self.sink),
            min_level,
        )
    }
}
