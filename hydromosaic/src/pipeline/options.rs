//! Run options shared by every stage.

use crate::config::{num_cpus, ConfigFile};
use crate::edge::DEFAULT_POLL_INTERVAL;
use crate::grid::DEFAULT_ROUND_DECIMALS;
use std::time::Duration;

/// Tunables of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Worker threads per stage; 1 makes the edge loop serial
    pub workers: usize,
    /// Decimals used to cluster tile corners into grid rows and columns
    pub round_decimals: u32,
    /// Longest single wait for an edge correction
    pub poll_interval: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            workers: num_cpus(),
            round_decimals: DEFAULT_ROUND_DECIMALS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PipelineOptions {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_round_decimals(mut self, decimals: u32) -> Self {
        self.round_decimals = decimals;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl From<&ConfigFile> for PipelineOptions {
    fn from(config: &ConfigFile) -> Self {
        Self {
            workers: config.workers.count.max(1),
            round_decimals: config.grid.round_decimals,
            poll_interval: Duration::from_millis(config.scheduler.poll_interval_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let mut config = ConfigFile::default();
        config.workers.count = 3;
        config.grid.round_decimals = 4;
        config.scheduler.poll_interval_ms = 120;

        let options = PipelineOptions::from(&config);
        assert_eq!(options.workers, 3);
        assert_eq!(options.round_decimals, 4);
        assert_eq!(options.poll_interval, Duration::from_millis(120));
    }

    #[test]
    fn test_workers_never_zero() {
        assert_eq!(PipelineOptions::default().with_workers(0).workers, 1);
    }
}
