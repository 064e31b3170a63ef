use std::collections::BTreeSet;
use std::env;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use sweepr_common::config::FINGERPRINT_TIMEOUT;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::{FingerprintError, Fingerprinter, ServiceRecord};

#[cfg(windows)]
const DEFAULT_BINARY: &str = "nmap.exe";
#[cfg(not(windows))]
const DEFAULT_BINARY: &str = "nmap";

/// Runs `nmap -sV -Pn` against one host at a time and reads its XML report.
#[derive(Debug, Clone)]
pub struct NmapFingerprinter {
    binary: PathBuf,
    timeout: Duration,
}

impl NmapFingerprinter {
    /// Locates the engine, either at `binary` or as `nmap` on `PATH`.
    pub fn new(binary: Option<PathBuf>) -> Result<Self, FingerprintError> {
        let wanted: PathBuf = binary.unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY));
        let binary: PathBuf =
            locate(&wanted).ok_or_else(|| FingerprintError::BinaryNotFound(wanted.clone()))?;

        debug!("Using fingerprinting engine at {}", binary.display());
        Ok(Self {
            binary,
            timeout: FINGERPRINT_TIMEOUT,
        })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl Fingerprinter for NmapFingerprinter {
    async fn fingerprint(
        &self,
        host: IpAddr,
        ports: &BTreeSet<u16>,
    ) -> anyhow::Result<Vec<ServiceRecord>> {
        let port_list: Vec<String> = ports.iter().map(u16::to_string).collect();

        let mut cmd = Command::new(&self.binary);
        cmd.args(["-sV", "-Pn", "-oX", "-", "-p"])
            .arg(port_list.join(","))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if host.is_ipv6() {
            cmd.arg("-6");
        }
        cmd.arg(host.to_string());

        let output = timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| FingerprintError::Timeout {
                host,
                secs: self.timeout.as_secs(),
            })?
            .map_err(FingerprintError::Io)?;

        if !output.status.success() {
            return Err(FingerprintError::EngineFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        let report = String::from_utf8_lossy(&output.stdout);
        Ok(parse_report(&report)?)
    }
}

fn locate(binary: &Path) -> Option<PathBuf> {
    if binary.components().count() > 1 {
        return binary.is_file().then(|| binary.to_path_buf());
    }

    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

/// Extracts service records from an nmap XML report.
pub fn parse_report(xml: &str) -> Result<Vec<ServiceRecord>, FingerprintError> {
    let run: NmapRun = quick_xml::de::from_str(xml)?;

    let records = run
        .hosts
        .into_iter()
        .filter_map(|host| host.ports)
        .flat_map(|ports| ports.ports)
        .map(ServiceRecord::from)
        .collect();

    Ok(records)
}

impl From<Port> for ServiceRecord {
    fn from(port: Port) -> Self {
        let (name, version) = match port.service {
            Some(service) => {
                let version = [service.product, service.version]
                    .into_iter()
                    .flatten()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<String>>()
                    .join(" ");
                (service.name, version)
            }
            None => (String::new(), String::new()),
        };

        ServiceRecord {
            port: port.portid,
            protocol: port.protocol,
            state: port.state.state,
            name,
            version,
        }
    }
}

// Only the parts of the report that end up in a ServiceRecord.

#[derive(Debug, Deserialize)]
struct NmapRun {
    #[serde(rename = "host", default)]
    hosts: Vec<Host>,
}

#[derive(Debug, Deserialize)]
struct Host {
    #[serde(default)]
    ports: Option<Ports>,
}

#[derive(Debug, Deserialize)]
struct Ports {
    #[serde(rename = "port", default)]
    ports: Vec<Port>,
}

#[derive(Debug, Deserialize)]
struct Port {
    #[serde(rename = "@portid")]
    portid: u16,
    #[serde(rename = "@protocol")]
    protocol: String,
    state: PortState,
    service: Option<Service>,
}

#[derive(Debug, Deserialize)]
struct PortState {
    #[serde(rename = "@state")]
    state: String,
}

#[derive(Debug, Deserialize)]
struct Service {
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(rename = "@product")]
    product: Option<String>,
    #[serde(rename = "@version")]
    version: Option<String>,
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
