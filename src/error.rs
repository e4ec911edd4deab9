use thiserror::Error;

/// Problems with the requested scan parameters. Always raised before any probe runs.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid port range {start}-{end} (start > end)")]
    InvalidRange { start: u32, end: u32 },
    #[error("port out of range: {0} (expected 1-65535)")]
    PortOutOfRange(u32),
    #[error("invalid port value `{0}`")]
    InvalidPort(String),
    #[error("worker count must be at least 1")]
    ZeroWorkers,
    #[error("timeout must be a positive number of seconds, got {0}")]
    InvalidTimeout(f64),
    #[error("no ports to scan")]
    EmptyPortSet,
}

/// Failures that abort a run. Per-port network errors are never reported here.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("could not resolve target `{target}`: {source}")]
    Resolve {
        target: String,
        #[source]
        source: std::io::Error,
    },
    #[error("resolver returned no address for `{0}`")]
    NoAddress(String),
}
