use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use portprobe::config::ScanConfig;
use portprobe::ports::PortSelection;
use portprobe::probe::probe_port;
use portprobe::scanner::{self, ScanEvent};
use portprobe::services;
use portprobe::types::OpenPort;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::time::{self, Instant};

const LOCAL: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Listener on an ephemeral port that greets every client with `banner`.
async fn greeting_listener(banner: &'static [u8]) -> u16 {
    let listener = TcpListener::bind((LOCAL, 0)).await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            let _ = sock.write_all(banner).await;
        }
    });
    port
}

/// An ephemeral port that was bound and released, so nothing listens on it.
async fn closed_port() -> u16 {
    let listener = TcpListener::bind((LOCAL, 0)).await.expect("bind");
    listener.local_addr().expect("addr").port()
}

#[tokio::test]
async fn only_the_ssh_listener_is_reported() {
    // Scan 20-25 where "22" is backed by a real greeting listener and the
    // other ports by closed sockets.
    let ssh = greeting_listener(b"SSH-2.0-Test\n").await;
    let mut backing = Vec::new();
    for port in 20u16..=25 {
        let real = if port == 22 { ssh } else { closed_port().await };
        backing.push((port, real));
    }
    let backing = Arc::new(backing);

    let cfg = ScanConfig::new(LOCAL, &PortSelection::Range { start: 20, end: 25 }, 4, 0.5)
        .expect("config");
    let report = scanner::run_with(
        &cfg,
        move |ip, port, timeout| {
            let real = backing
                .iter()
                .find(|(p, _)| *p == port)
                .map(|(_, r)| *r)
                .unwrap_or(port);
            async move { probe_port(ip, real, timeout).await.map(|o| OpenPort { port, ..o }) }
        },
        |_| {},
    )
    .await
    .expect("scan");

    assert_eq!(report.completed, 6);
    assert_eq!(report.open.len(), 1);
    let open = &report.open[0];
    assert_eq!(open.port, 22);
    assert_eq!(open.banner, "SSH-2.0-Test");
    // The label is looked up from the port actually connected to, which is
    // the ephemeral listener port here, not 22.
    assert_eq!(open.service, services::lookup(ssh));
    assert_eq!(open.service, services::UNKNOWN_SERVICE);
    assert_eq!(services::lookup(22), "SSH");
}

#[tokio::test]
async fn real_probe_finds_listeners_once_per_port() {
    let a = greeting_listener(b"hello\r\n").await;
    let b = greeting_listener(b"").await;
    let c = closed_port().await;
    let d = closed_port().await;

    let cfg = ScanConfig::new(LOCAL, &PortSelection::List(vec![a, c, b, d, a]), 8, 0.5)
        .expect("config");

    let mut runs = Vec::new();
    for _ in 0..2 {
        let report = scanner::run(&cfg, |_| {}).await.expect("scan");
        assert_eq!(report.completed, 4);
        let ports: Vec<u16> = report.open.iter().map(|o| o.port).collect();
        let unique: BTreeSet<u16> = ports.iter().copied().collect();
        assert!(report
            .open
            .iter()
            .all(|o| o.service == services::UNKNOWN_SERVICE));
        assert_eq!(unique.len(), ports.len(), "duplicate port in {ports:?}");
        runs.push(unique);
    }

    let expected: BTreeSet<u16> = [a, b].into_iter().collect();
    assert_eq!(runs[0], expected);
    assert_eq!(runs[1], expected);
}

#[tokio::test]
async fn in_flight_probes_never_exceed_worker_count() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let workers = 4;

    let cfg = ScanConfig::new(LOCAL, &PortSelection::Range { start: 1, end: 40 }, workers, 1.0)
        .expect("config");
    let (fl, pk) = (in_flight.clone(), peak.clone());
    let report = scanner::run_with(
        &cfg,
        move |_, port, _| {
            let (fl, pk) = (fl.clone(), pk.clone());
            async move {
                let now = fl.fetch_add(1, Ordering::SeqCst) + 1;
                pk.fetch_max(now, Ordering::SeqCst);
                time::sleep(Duration::from_millis(10 + u64::from(port % 3) * 5)).await;
                fl.fetch_sub(1, Ordering::SeqCst);
                (port % 10 == 0).then(|| OpenPort {
                    port,
                    service: services::lookup(port).to_string(),
                    banner: String::new(),
                })
            }
        },
        |_| {},
    )
    .await
    .expect("scan");

    assert_eq!(report.completed, 40);
    assert_eq!(report.open.len(), 4);
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    let peak = peak.load(Ordering::SeqCst);
    assert!(peak <= workers, "peak {peak} exceeded {workers}");
    assert!(peak > 1, "probes never overlapped");
}

#[tokio::test]
async fn silent_target_completes_within_bound() {
    let cfg = ScanConfig::new(LOCAL, &PortSelection::Range { start: 1, end: 50 }, 10, 0.1)
        .expect("config");
    let mut last = None;
    let started = Instant::now();
    let report = scanner::run_with(
        &cfg,
        |_, _, timeout| async move {
            time::sleep(timeout).await;
            None
        },
        |ev| {
            if let ScanEvent::Progress { .. } = ev {
                last = ev.percent();
            }
        },
    )
    .await
    .expect("scan");

    assert!(report.open.is_empty());
    assert_eq!(report.completed, 50);
    assert_eq!(last, Some(100.0));
    // ceil(50 / 10) * 0.1s, with generous slack for slow machines.
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn closed_port_reported_within_timeout() {
    let port = closed_port().await;
    let timeout = Duration::from_millis(300);
    let started = Instant::now();
    assert!(probe_port(LOCAL, port, timeout).await.is_none());
    assert!(started.elapsed() < timeout + Duration::from_millis(500));
}

#[tokio::test]
async fn overrunning_workers_are_joined() {
    // Each worker overruns its deadline; the scan still joins all of them.
    let cfg = ScanConfig::new(LOCAL, &PortSelection::Range { start: 1, end: 8 }, 8, 0.05)
        .expect("config");
    let started = Instant::now();
    let report = scanner::run_with(
        &cfg,
        |_, _, timeout| async move {
            time::sleep(timeout * 2).await;
            None
        },
        |_| {},
    )
    .await
    .expect("scan");

    assert_eq!(report.completed, 8);
    assert!(report.open.is_empty());
    assert!(started.elapsed() >= Duration::from_millis(100));
}
