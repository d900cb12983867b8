//! Logger that keeps every message in memory.

use crate::log::{LogLevel, Logger};
use std::fmt::Arguments;
use std::sync::Mutex;

/// A logger that records messages for later inspection.
///
/// Used by tests that assert on what a component reported.
///
/// # Example
///
/// ```
/// use hydromosaic::log::{CaptureLogger, LogLevel, Logger};
/// use hydromosaic::log_warn;
///
/// let logger = CaptureLogger::new();
/// log_warn!(logger, "tile {} failed", 3);
/// assert_eq!(logger.messages_at(LogLevel::Warn), vec!["tile 3 failed"]);
/// ```
#[derive(Debug, Default)]
pub struct CaptureLogger {
    records: Mutex<Vec<(LogLevel, String)>>,
}

impl CaptureLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record so far, oldest first.
    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.records.lock().unwrap().clone()
    }

    /// Messages logged at exactly `level`.
    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Whether any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.records
            .lock()
            .unwrap()
            .iter()
            .any(|(_, m)| m.contains(needle))
    }
}

impl Logger for CaptureLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        self.records.lock().unwrap().push((level, args.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{log_debug, log_info};
    use std::sync::Arc;

    #[test]
    fn test_records_in_order() {
        let logger = CaptureLogger::new();
        log_info!(logger, "Compute Grid");
        log_debug!(logger, "{} tiles", 4);

        assert_eq!(
            logger.records(),
            vec![
                (LogLevel::Info, "Compute Grid".to_string()),
                (LogLevel::Debug, "4 tiles".to_string()),
            ]
        );
        assert!(logger.contains("tiles"));
    }

    #[test]
    fn test_shared_across_threads() {
        let logger = Arc::new(CaptureLogger::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let logger = Arc::clone(&logger);
                std::thread::spawn(move || log_info!(logger, "worker {}", i))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(logger.messages_at(LogLevel::Info).len(), 4);
    }
}
