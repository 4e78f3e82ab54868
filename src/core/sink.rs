//! Output sink: a fixed, ordered set of destinations receiving every line

use super::appender::Appender;
use super::error::{LoggerError, Result};
use parking_lot::Mutex;
use std::fmt;

/// Fan-out over one or more appenders.
///
/// Each destination sits behind its own mutex, so a line is written to a
/// destination in one piece while other destinations stay available to other
/// writers. The set of destinations is fixed once the sink is shared.
///
/// # Example
///
/// ```
/// use rust_logger_facade::appenders::ConsoleAppender;
/// use rust_logger_facade::core::Sink;
///
/// let sink = Sink::new().with_appender(ConsoleAppender::stdout());
/// assert_eq!(sink.len(), 1);
/// ```
#[derive(Default)]
pub struct Sink {
    destinations: Vec<Mutex<Box<dyn Appender>>>,
}

impl Sink {
    pub fn new() -> Self {
        Self {
            destinations: Vec::new(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.push(Box::new(appender));
        self
    }

    pub fn push(&mut self, appender: Box<dyn Appender>) {
        self.destinations.push(Mutex::new(appender));
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.destinations
            .iter()
            .map(|d| d.lock().name().to_string())
            .collect()
    }

    /// Write one encoded line to every destination.
    ///
    /// All destinations are attempted even when an earlier one fails; the
    /// first failure is returned. A panicking appender is reported as a
    /// writer error and does not stop the others.
    pub fn write(&self, line: &str) -> Result<()> {
        let mut first_error = None;

        for destination in &self.destinations {
            let mut appender = destination.lock();
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                appender.append(line)
            }));

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(panic_info) => Err(LoggerError::writer(format!(
                    "appender '{}' panicked: {}",
                    appender.name(),
                    panic_message(panic_info.as_ref())
                ))),
            };

            if let Err(e) = outcome {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn flush(&self) -> Result<()> {
        let mut first_error = None;
        for destination in &self.destinations {
            if let Err(e) = destination.lock().flush() {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("destinations", &self.names())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Collect {
        lines: Arc<Mutex<Vec<String>>>,
    }

    impl Appender for Collect {
        fn append(&mut self, line: &str) -> Result<()> {
            self.lines.lock().push(line.to_string());
            Ok(())
        }
        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
        fn name(&self) -> &str {
            "collect"
        }
    }

    struct Failing;

    impl Appender for Failing {
        fn append(&mut self, _line: &str) -> Result<()> {
            Err(LoggerError::writer("disk full"))
        }
        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
        fn name(&self) -> &str {
            "failing"
        }
    }

    struct Panicking;

    impl Appender for Panicking {
        fn append(&mut self, _line: &str) -> Result<()> {
            panic!("boom");
        }
        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
        fn name(&self) -> &str {
            "panicking"
        }
    }

    #[test]
    fn test_fan_out_to_all_destinations() {
        let a = Arc::new(Mutex::new(Vec::new()));
        let b = Arc::new(Mutex::new(Vec::new()));
        let sink = Sink::new()
            .with_appender(Collect { lines: Arc::clone(&a) })
            .with_appender(Collect { lines: Arc::clone(&b) });

        sink.write("hello\n").expect("write");
        assert_eq!(*a.lock(), vec!["hello\n".to_string()]);
        assert_eq!(*b.lock(), vec!["hello\n".to_string()]);
    }

    #[test]
    fn test_failure_does_not_skip_later_destinations() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Sink::new()
            .with_appender(Failing)
            .with_appender(Panicking)
            .with_appender(Collect { lines: Arc::clone(&lines) });

        let err = sink.write("x\n").unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert_eq!(lines.lock().len(), 1);
        assert_eq!(sink.names(), vec!["failing", "panicking", "collect"]);
    }
}
