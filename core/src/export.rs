//! Result persistence in CSV or JSON.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use sweepr_common::config::OutputFormat;
use tracing::debug;

use crate::aggregate::ScanResult;

const CSV_HEADER: [&str; 5] = ["IP", "Port", "Status", "Service", "Version"];

/// Writes `results` to `dir/portResult-<YYYYMMDD_HHMM>.<ext>`, creating `dir` if needed.
pub fn write_results(results: &[ScanResult], dir: &Path, format: OutputFormat) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let path: PathBuf = dir.join(file_name(format));
    let data: String = match format {
        OutputFormat::Csv => to_csv(results)?,
        OutputFormat::Json => to_json(results)?,
    };

    fs::write(&path, data).with_context(|| format!("failed to write {}", path.display()))?;
    debug!("Wrote {} rows to {}", results.len(), path.display());

    Ok(path)
}

pub fn file_name(format: OutputFormat) -> String {
    format!(
        "portResult-{}.{}",
        Local::now().format("%Y%m%d_%H%M"),
        format.extension()
    )
}

pub fn to_csv(results: &[ScanResult]) -> Result<String> {
    let mut writer = Writer::from_writer(vec![]);
    writer.write_record(CSV_HEADER)?;

    for result in results {
        writer.write_record([
            result.ip.to_string(),
            result.port.to_string(),
            result.status.clone(),
            result.service.clone(),
            result.version.clone(),
        ])?;
    }

    let csv_data = String::from_utf8(writer.into_inner()?)?;
    Ok(csv_data)
}

pub fn to_json(results: &[ScanResult]) -> Result<String> {
    Ok(serde_json::to_string_pretty(results)?)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn rows() -> Vec<ScanResult> {
        let host = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10));
        vec![
            ScanResult::bare(host, 22),
            ScanResult {
                ip: host,
                port: 80,
                status: "open".to_string(),
                service: "http".to_string(),
                version: "Apache httpd 2.4.58".to_string(),
            },
        ]
    }

    #[test]
    fn csv_has_header_and_rows() {
        let csv = to_csv(&rows()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "IP,Port,Status,Service,Version");
        assert_eq!(lines[1], "192.168.1.10,22,open,,");
        assert_eq!(lines[2], "192.168.1.10,80,open,http,Apache httpd 2.4.58");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn csv_of_nothing_is_just_the_header() {
        assert_eq!(to_csv(&[]).unwrap().trim_end(), "IP,Port,Status,Service,Version");
    }

    #[test]
    fn json_uses_column_names() {
        let json = to_json(&rows()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[1]["IP"], "192.168.1.10");
        assert_eq!(value[1]["Port"], 80);
        assert_eq!(value[1]["Service"], "http");
        assert_eq!(value[0]["Version"], "");
    }

    #[test]
    fn write_results_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("result");

        let path = write_results(&rows(), &dir, OutputFormat::Json).unwrap();

        assert!(path.starts_with(&dir));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("portResult-"));
        assert!(name.ends_with(".json"));
        assert_eq!(name.len(), "portResult-YYYYMMDD_HHMM.json".len());
        assert!(fs::read_to_string(&path).unwrap().contains("Apache httpd"));
    }

    #[test]
    fn write_results_fails_when_dir_is_a_file() {
        let file = tempfile::NamedTempFile::new().unwrap();

        assert!(write_results(&rows(), file.path(), OutputFormat::Csv).is_err());
    }
}
