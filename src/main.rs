use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use portprobe::config::{ScanConfig, DEFAULT_TIMEOUT_SECS, DEFAULT_WORKERS};
use portprobe::ports::{self, PortSelection, DEFAULT_RANGE_END, DEFAULT_RANGE_START};
use portprobe::{export, report, resolver, scanner};

/// portprobe: concurrent TCP connect scanner with banner grabbing.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "portprobe",
    version,
    about = "Concurrent TCP connect scanner with banner grabbing and CSV/JSON export.",
    long_about = None
)]
struct Cli {
    /// Target IP address or hostname.
    target: String,

    /// First port of the range to scan (default 1).
    #[arg(long, conflicts_with_all = ["top_ports", "ports"])]
    start: Option<u32>,

    /// Last port of the range to scan, inclusive (default 1024).
    #[arg(long, conflicts_with_all = ["top_ports", "ports"])]
    end: Option<u32>,

    /// Explicit ports, e.g. "22,80,8000-8010".
    #[arg(long, conflicts_with = "top_ports")]
    ports: Option<String>,

    /// Scan the curated list of common ports only.
    #[arg(long = "top-ports", default_value_t = false)]
    top_ports: bool,

    /// Max concurrent TCP connect attempts.
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    threads: usize,

    /// Socket connect timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: f64,

    /// Also write a JSON report next to the CSV one.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Directory receiving the CSV/JSON reports.
    #[arg(long = "output-dir", default_value = "results")]
    output_dir: PathBuf,

    /// Skip writing report files.
    #[arg(long = "no-export", default_value_t = false)]
    no_export: bool,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn selection(&self) -> Result<PortSelection> {
        if self.top_ports {
            return Ok(PortSelection::Preset);
        }
        if let Some(expr) = self.ports.as_deref() {
            return Ok(PortSelection::List(ports::parse_ports_str(expr)?));
        }
        Ok(PortSelection::Range {
            start: self.start.unwrap_or(DEFAULT_RANGE_START),
            end: self.end.unwrap_or(DEFAULT_RANGE_END),
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let selection = cli.selection()?;

    let target_ip = resolver::resolve(&cli.target).await?;
    println!("Resolved {} -> {}", cli.target, target_ip);

    let cfg = ScanConfig::new(target_ip, &selection, cli.threads, cli.timeout)?;

    report::print_header(&cfg);
    let results = scanner::run(&cfg, report::print_event).await?;
    report::print_summary(&results);

    if !cli.no_export {
        let paths = export::export_results(&cli.output_dir, &results, cli.json)?;
        println!("\nCSV saved to {}", paths.csv.display());
        if let Some(json) = paths.json {
            println!("JSON saved to {}", json.display());
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact()
        .init();
}
