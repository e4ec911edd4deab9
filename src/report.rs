//! Console output for a scan: header, live progress, and the final summary.
use std::io::{self, Write};

use crate::config::ScanConfig;
use crate::scanner::ScanEvent;
use crate::types::ScanReport;

const BANNER_COL_MAX: usize = 60;

pub fn print_header(cfg: &ScanConfig) {
    println!("\nScanning target: {}", cfg.target());
    println!("Total ports: {}", cfg.ports().len());
    println!("Threads: {}", cfg.workers());
    println!("{}", "-".repeat(50));
}

/// Handle one coordinator event: rewrite the progress line or announce an open port.
pub fn print_event(ev: ScanEvent<'_>) {
    match ev {
        ScanEvent::Progress { .. } => {
            if let Some(pct) = ev.percent() {
                print!("\rProgress: {pct:.1}%");
                let _ = io::stdout().flush();
            }
        }
        ScanEvent::Open(open) => {
            println!("\nPort {} OPEN | Service: {}", open.port, open.service);
            if !open.banner.is_empty() {
                println!("   Banner: {}", one_line(&open.banner));
            }
        }
    }
}

pub fn print_summary(report: &ScanReport) {
    println!("\nScan complete.");
    print!("{}", format_table(report));
    println!("\n=== Scan Summary ===");
    println!("Target: {}", report.target);
    println!("Open ports: {}", report.open_count());
    println!("Scan time: {:.2} seconds", report.elapsed.as_secs_f64());
}

/// Render open ports as an aligned table, sorted by port number.
pub fn format_table(report: &ScanReport) -> String {
    if report.open.is_empty() {
        return String::from("No open ports found.\n");
    }

    let mut rows: Vec<_> = report.open.iter().collect();
    rows.sort_by_key(|o| o.port);

    let port_w = "port".len().max(5);
    let mut service_w = "service".len();
    let mut banner_w = "banner".len();
    let banners: Vec<String> = rows.iter().map(|o| snippet(&o.banner)).collect();
    for (o, b) in rows.iter().zip(&banners) {
        service_w = service_w.max(o.service.len());
        banner_w = banner_w.max(b.chars().count());
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:>port_w$}  {:<service_w$}  {:<banner_w$}\n",
        "port", "service", "banner"
    ));
    out.push_str(&format!(
        "{:->port_w$}  {:-<service_w$}  {:-<banner_w$}\n",
        "", "", ""
    ));
    for (o, b) in rows.iter().zip(&banners) {
        let line = format!("{:>port_w$}  {:<service_w$}  {:<banner_w$}", o.port, o.service, b);
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn one_line(s: &str) -> String {
    s.replace('\n', "\\n").replace('\r', "\\r")
}

fn snippet(banner: &str) -> String {
    one_line(banner).chars().take(BANNER_COL_MAX).collect()
}
