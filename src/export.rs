use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use time::{format_description, format_description::well_known, OffsetDateTime};

use crate::types::ScanReport;

/// Column names of the CSV export.
pub const CSV_HEADER: [&str; 5] = ["Target", "Port", "Service", "Banner", "Timestamp"];

/// Files written by [`export_results`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub csv: PathBuf,
    pub json: Option<PathBuf>,
}

/// One exported row; shared by the CSV and JSON writers.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ExportRecord<'a> {
    pub target: String,
    pub port: u16,
    pub service: &'a str,
    pub banner: &'a str,
    pub timestamp: String,
}

/// Build export rows for every open port, stamped with the current UTC time.
pub fn records(report: &ScanReport) -> Vec<ExportRecord<'_>> {
    let target = report.target.to_string();
    let timestamp = now_rfc3339();
    report
        .open
        .iter()
        .map(|o| ExportRecord {
            target: target.clone(),
            port: o.port,
            service: &o.service,
            banner: &o.banner,
            timestamp: timestamp.clone(),
        })
        .collect()
}

/// Write `scan_<target>_<stamp>.csv` (and optionally `.json`) into `dir`, creating it if needed.
pub fn export_results(dir: &Path, report: &ScanReport, with_json: bool) -> Result<ExportPaths> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory: {}", dir.display()))?;

    let stem = format!(
        "scan_{}_{}",
        report.target.to_string().replace(':', "_"),
        file_stamp()?
    );
    let rows = records(report);

    let csv_path = dir.join(format!("{stem}.csv"));
    let file = File::create(&csv_path)
        .with_context(|| format!("failed to create {}", csv_path.display()))?;
    write_csv(BufWriter::new(file), &rows)
        .with_context(|| format!("failed to write {}", csv_path.display()))?;

    let json = if with_json {
        let json_path = dir.join(format!("{stem}.json"));
        let file = File::create(&json_path)
            .with_context(|| format!("failed to create {}", json_path.display()))?;
        write_json(BufWriter::new(file), &rows)
            .with_context(|| format!("failed to write {}", json_path.display()))?;
        Some(json_path)
    } else {
        None
    };

    Ok(ExportPaths {
        csv: csv_path,
        json,
    })
}

/// CSV with a [`CSV_HEADER`] row followed by one row per record.
pub fn write_csv<W: Write>(w: W, rows: &[ExportRecord<'_>]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(w);
    wtr.write_record(CSV_HEADER)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Pretty-printed JSON array of records.
pub fn write_json<W: Write>(mut w: W, rows: &[ExportRecord<'_>]) -> Result<()> {
    serde_json::to_writer_pretty(&mut w, rows)?;
    w.flush()?;
    Ok(())
}

fn file_stamp() -> Result<String> {
    let fmt = format_description::parse("[year][month][day]_[hour][minute][second]")
        .context("invalid timestamp format")?;
    OffsetDateTime::now_utc()
        .format(&fmt)
        .context("failed to format timestamp")
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row<'a>(port: u16, service: &'a str, banner: &'a str) -> ExportRecord<'a> {
        ExportRecord {
            target: "10.0.0.5".into(),
            port,
            service,
            banner,
            timestamp: "2024-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn csv_has_header_and_quotes_commas() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[row(22, "SSH", "SSH-2.0, hello")]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Target,Port,Service,Banner,Timestamp");
        assert_eq!(
            lines[1],
            "10.0.0.5,22,SSH,\"SSH-2.0, hello\",2024-01-01T00:00:00Z"
        );
    }

    #[test]
    fn csv_without_rows_is_header_only() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[]).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Target,Port,Service,Banner,Timestamp\n"
        );
    }

    #[test]
    fn json_fields_are_lowercase() {
        let mut buf = Vec::new();
        write_json(&mut buf, &[row(80, "HTTP", "")]).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v[0]["target"], "10.0.0.5");
        assert_eq!(v[0]["port"], 80);
        assert_eq!(v[0]["service"], "HTTP");
        assert_eq!(v[0]["banner"], "");
    }
}
