use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::ScanConfig;
use crate::probe;
use crate::types::{OpenPort, ScanReport};

/// Notifications emitted by the coordinator while a scan is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEvent<'a> {
    /// Sent after every finished probe, open or not.
    Progress { completed: u64, total: u64 },
    /// Sent once for each port found open, right after its progress event.
    Open(&'a OpenPort),
}

impl ScanEvent<'_> {
    /// Percentage of finished probes for a progress event.
    pub fn percent(&self) -> Option<f64> {
        match *self {
            ScanEvent::Progress { completed, total } if total > 0 => {
                Some(completed as f64 / total as f64 * 100.0)
            }
            ScanEvent::Progress { .. } => Some(100.0),
            ScanEvent::Open(_) => None,
        }
    }
}

/// Scan every configured port with [`probe::probe_port`].
///
/// - Limits in-flight probes to `config.workers()` using a `Semaphore`.
/// - Collects outcomes in completion order from a single loop, so the result
///   list and the completed counter are never shared between tasks.
/// - Returns only after every dispatched probe has finished.
pub async fn run<F>(config: &ScanConfig, on_event: F) -> Result<ScanReport>
where
    F: FnMut(ScanEvent<'_>),
{
    run_with(config, probe::probe_port, on_event).await
}

/// Same as [`run`], with a caller-supplied probe function.
pub async fn run_with<P, Fut, F>(config: &ScanConfig, probe: P, on_event: F) -> Result<ScanReport>
where
    P: Fn(IpAddr, u16, Duration) -> Fut,
    Fut: Future<Output = Option<OpenPort>> + Send + 'static,
    F: FnMut(ScanEvent<'_>),
{
    let target = config.target();
    let ports = config.ports();
    let timeout = config.connect_timeout();
    let started = Instant::now();

    info!(
        %target,
        ports = ports.len(),
        workers = config.workers(),
        timeout_ms = timeout.as_millis() as u64,
        "scan started"
    );

    let slots = config
        .workers()
        .min(ports.len().max(1))
        .min(Semaphore::MAX_PERMITS);
    let sem = Arc::new(Semaphore::new(slots));
    let mut set = JoinSet::new();
    let mut collector = Collector::new(ports.len() as u64, on_event);

    for &port in ports {
        while let Some(joined) = set.try_join_next() {
            collector.absorb(joined);
        }

        // Wait for a free slot, absorbing finished probes meanwhile.
        let permit = loop {
            if let Ok(permit) = sem.clone().try_acquire_owned() {
                break permit;
            }
            match set.join_next().await {
                Some(joined) => collector.absorb(joined),
                None => {
                    break sem
                        .clone()
                        .acquire_owned()
                        .await
                        .context("worker pool closed")?
                }
            }
        };

        let fut = probe(target, port, timeout);
        set.spawn(async move {
            let _permit = permit; // released when the probe finishes
            fut.await
        });
    }

    while let Some(joined) = set.join_next().await {
        collector.absorb(joined);
    }

    let elapsed = started.elapsed();
    let report = ScanReport {
        target,
        total_ports: collector.total,
        completed: collector.completed,
        open: collector.open,
        elapsed,
    };
    info!(
        %target,
        open = report.open_count(),
        elapsed_ms = elapsed.as_millis() as u64,
        "scan finished"
    );
    Ok(report)
}

/// Owns the running tally; fed by the coordinator loop only.
struct Collector<F> {
    total: u64,
    completed: u64,
    open: Vec<OpenPort>,
    on_event: F,
}

impl<F> Collector<F>
where
    F: FnMut(ScanEvent<'_>),
{
    fn new(total: u64, on_event: F) -> Self {
        Self {
            total,
            completed: 0,
            open: Vec::new(),
            on_event,
        }
    }

    fn absorb(&mut self, joined: Result<Option<OpenPort>, JoinError>) {
        self.completed += 1;
        (self.on_event)(ScanEvent::Progress {
            completed: self.completed,
            total: self.total,
        });

        match joined {
            Ok(Some(open)) => {
                (self.on_event)(ScanEvent::Open(&open));
                self.open.push(open);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "probe task failed"),
        }
    }
}
