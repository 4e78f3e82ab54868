//! Daily rotating file appender
//!
//! Lines go to `<dir>/<YYYY-MM-DD>.log` for the current local date. When the
//! date changes the next line opens a new file, the previous one is
//! optionally gzipped, and files older than the retention period are purged.

use crate::core::appender::Appender;
use crate::core::error::{LoggerError, Result};
use chrono::{DateTime, Local, NaiveDate};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const DATE_FORMAT: &str = "%Y-%m-%d";
const MAX_DELETION_FAILURES: usize = 5;

/// File appender that starts a new file every local day.
///
/// # Examples
///
/// ```no_run
/// use rust_logger_facade::appenders::DailyFileAppender;
/// use std::time::Duration;
///
/// let appender = DailyFileAppender::new("/var/log/app", Duration::from_secs(7 * 24 * 3600))?
///     .with_compression(true);
/// # Ok::<(), rust_logger_facade::LoggerError>(())
/// ```
pub struct DailyFileAppender {
    dir: PathBuf,
    max_age: Duration,
    compress: bool,
    writer: Option<File>,
    current_date: NaiveDate,
    /// Consecutive purge passes that failed to delete something
    deletion_failure_count: usize,
}

impl DailyFileAppender {
    /// Create the directory if needed and open today's file.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or the file cannot
    /// be opened.
    pub fn new<P: AsRef<Path>>(dir: P, max_age: Duration) -> Result<Self> {
        Self::open_at(dir.as_ref(), max_age, Local::now())
    }

    fn open_at(dir: &Path, max_age: Duration, now: DateTime<Local>) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| {
            LoggerError::io_operation(
                "create log directory",
                format!("Failed to create directory '{}'", dir.display()),
                e,
            )
        })?;

        let current_date = now.date_naive();
        let file = open_append(&file_path(dir, current_date))?;

        let mut appender = Self {
            dir: dir.to_path_buf(),
            max_age,
            compress: false,
            writer: Some(file),
            current_date,
            deletion_failure_count: 0,
        };
        appender.purge_expired(SystemTime::from(now));
        Ok(appender)
    }

    /// Gzip the previous day's file on rotation
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Path of the file currently written to
    #[must_use]
    pub fn current_path(&self) -> PathBuf {
        file_path(&self.dir, self.current_date)
    }

    fn append_at(&mut self, line: &str, now: DateTime<Local>) -> Result<()> {
        let date = now.date_naive();
        if date != self.current_date || self.writer.is_none() {
            self.rotate(date, SystemTime::from(now))?;
        }

        let path = self.current_path();
        match self.writer {
            Some(ref mut file) => file.write_all(line.as_bytes()).map_err(|e| {
                LoggerError::file_appender(
                    path.display().to_string(),
                    format!("Failed to write log entry: {}", e),
                )
            }),
            None => Err(LoggerError::writer("Writer not initialized")),
        }
    }

    fn rotate(&mut self, date: NaiveDate, now: SystemTime) -> Result<()> {
        let previous = self.current_path();
        if let Some(mut file) = self.writer.take() {
            let _ = file.flush();
        }

        let file = open_append(&file_path(&self.dir, date)).map_err(|e| {
            LoggerError::file_rotation(
                self.dir.display().to_string(),
                format!("Failed to open log file for {}: {}", date, e),
            )
        })?;
        self.writer = Some(file);
        let rotated = date != self.current_date;
        self.current_date = date;

        if rotated && self.compress && previous.exists() {
            if let Err(e) = compress_file(&previous) {
                eprintln!("[WARN] Failed to compress {}: {}", previous.display(), e);
            }
        }

        self.purge_expired(now);
        Ok(())
    }

    /// Delete dated log files whose modification time is older than
    /// `max_age`. Failures are reported on stderr and never stop logging.
    fn purge_expired(&mut self, now: SystemTime) {
        let Some(cutoff) = now.checked_sub(self.max_age) else {
            return;
        };
        let current = self.current_path();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("[WARN] Failed to scan {} for old logs: {}", self.dir.display(), e);
                return;
            }
        };

        let mut deletion_failed = false;
        for entry in entries.flatten() {
            let path = entry.path();
            if path == current || !is_dated_log(&path) {
                continue;
            }
            let expired = entry
                .metadata()
                .and_then(|m| m.modified())
                .map(|modified| modified < cutoff)
                .unwrap_or(false);
            if !expired {
                continue;
            }
            if let Err(e) = fs::remove_file(&path) {
                deletion_failed = true;
                eprintln!(
                    "[WARN] Failed to remove expired log {}: {} (failure #{}/{})",
                    path.display(),
                    e,
                    self.deletion_failure_count + 1,
                    MAX_DELETION_FAILURES
                );
            }
        }

        if deletion_failed {
            self.deletion_failure_count += 1;
            if self.deletion_failure_count == MAX_DELETION_FAILURES {
                eprintln!(
                    "[LOGGER WARNING] Expired logs in {} could not be removed {} times in a row; \
                     check permissions and disk space",
                    self.dir.display(),
                    self.deletion_failure_count
                );
            }
        } else {
            self.deletion_failure_count = 0;
        }
    }
}

fn file_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}.log", date.format(DATE_FORMAT)))
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            LoggerError::file_appender(path.display().to_string(), format!("Failed to open: {}", e))
        })
}

/// `YYYY-MM-DD.log` or `YYYY-MM-DD.log.gz`
fn is_dated_log(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let stem = name
        .strip_suffix(".log.gz")
        .or_else(|| name.strip_suffix(".log"));
    stem.is_some_and(|stem| NaiveDate::parse_from_str(stem, DATE_FORMAT).is_ok())
}

/// Gzip `path` to `path.gz`, removing the original only once the compressed
/// file is complete.
fn compress_file(path: &Path) -> Result<()> {
    let gz_path = path.with_extension("log.gz");
    let temp_gz_path = path.with_extension("log.gz.tmp");

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", path.display()),
            e,
        )
    })?;
    let output = File::create(&temp_gz_path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create temporary compressed file: {}", temp_gz_path.display()),
            e,
        )
    })?;

    let mut reader = BufReader::with_capacity(64 * 1024, input);
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(64 * 1024, output),
        flate2::Compression::default(),
    );

    let streamed = std::io::copy(&mut reader, &mut encoder)
        .and_then(|_| encoder.finish())
        .and_then(|mut out| out.flush());
    if let Err(e) = streamed {
        let _ = fs::remove_file(&temp_gz_path);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress {}", path.display()),
            e,
        ));
    }

    fs::rename(&temp_gz_path, &gz_path).map_err(|e| {
        let _ = fs::remove_file(&temp_gz_path);
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to rename compressed file to: {}", gz_path.display()),
            e,
        )
    })?;

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[WARN] Compression succeeded but failed to remove original file {}: {}",
            path.display(),
            e
        );
    }
    Ok(())
}

impl Appender for DailyFileAppender {
    fn append(&mut self, line: &str) -> Result<()> {
        self.append_at(line, Local::now())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut file) = self.writer {
            file.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.dir.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "daily_file"
    }
}

impl Drop for DailyFileAppender {
    fn drop(&mut self) {
        if let Some(mut file) = self.writer.take() {
            let _ = file.flush();
        }
    }
}
