use std::net::IpAddr;
use std::time::Duration;

/// One port that accepted a TCP connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPort {
    pub port: u16,
    pub service: String,
    /// Text the service sent right after connecting; empty if it sent nothing.
    pub banner: String,
}

/// Outcome of a whole scan run. `open` is in completion order, not port order.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub target: IpAddr,
    pub total_ports: u64,
    pub completed: u64,
    pub open: Vec<OpenPort>,
    pub elapsed: Duration,
}

impl ScanReport {
    pub fn open_count(&self) -> usize {
        self.open.len()
    }
}
