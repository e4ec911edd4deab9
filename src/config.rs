use std::net::IpAddr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::ports::{self, PortSelection};

/// Concurrent probe slots used when none is given.
pub const DEFAULT_WORKERS: usize = 100;
/// Per-connection timeout, in seconds, used when none is given.
pub const DEFAULT_TIMEOUT_SECS: f64 = 1.0;

/// Immutable parameters of one scan run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    target: IpAddr,
    ports: Vec<u16>,
    workers: usize,
    connect_timeout: Duration,
}

impl ScanConfig {
    /// Validate the parameters and build the port set.
    pub fn new(
        target: IpAddr,
        selection: &PortSelection,
        workers: usize,
        timeout_secs: f64,
    ) -> Result<Self, ConfigError> {
        if workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        let connect_timeout = timeout_from_secs(timeout_secs)?;
        let ports = ports::build(selection)?;
        Ok(Self {
            target,
            ports,
            workers,
            connect_timeout,
        })
    }

    pub fn target(&self) -> IpAddr {
        self.target
    }

    /// Deduplicated ports, in selection order.
    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

fn timeout_from_secs(secs: f64) -> Result<Duration, ConfigError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ConfigError::InvalidTimeout(secs));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidTimeout(secs))
}
