//! Runtime settings for the proctoring core.

use std::time::Duration;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct ProctorConfig {
    /// Delay before a leader write becomes visible to eventual reads
    pub replica_lag: Duration,

    /// Probability in `[0, 1]` that the simulated primary rejects a request
    pub primary_failure_ratio: f64,

    /// Interval between keep-alive comments on idle monitor streams
    pub keep_alive: Duration,
}

impl Default for ProctorConfig {
    fn default() -> Self {
        Self {
            replica_lag: DEFAULT_REPLICA_LAG,
            primary_failure_ratio: DEFAULT_PRIMARY_FAILURE_RATIO,
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }
}

/// Default replication lag of the consistency store.
pub const DEFAULT_REPLICA_LAG: Duration = Duration::from_secs(2);

/// Default failure probability of the simulated primary.
///
/// Half of all dispatches exercise the backup path.
pub const DEFAULT_PRIMARY_FAILURE_RATIO: f64 = 0.5;

/// Default keep-alive interval for monitor streams.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

#[derive(Debug)]
pub struct ConfigBuilder {
    config: ProctorConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ProctorConfig::default(),
        }
    }

    pub fn replica_lag(mut self, lag: Duration) -> Self {
        self.config.replica_lag = lag;
        self
    }

    pub fn primary_failure_ratio(mut self, ratio: f64) -> Self {
        self.config.primary_failure_ratio = ratio;
        self
    }

    pub fn keep_alive(mut self, interval: Duration) -> Self {
        self.config.keep_alive = interval;
        self
    }

    pub fn build(self) -> Result<ProctorConfig> {
        let ratio = self.config.primary_failure_ratio;

        if !(0.0..=1.0).contains(&ratio) {
            return Err(Error::InvalidInput(format!(
                "primary failure ratio {ratio} is outside [0, 1]"
            )));
        }

        if self.config.keep_alive.is_zero() {
            return Err(Error::InvalidInput("keep alive must be positive".to_owned()));
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
