//! Flattening of the open-port map into exportable result rows.

use std::net::IpAddr;

use serde::Serialize;
use tracing::{debug, warn};

use crate::fingerprint::{Fingerprinter, ServiceRecord};
use crate::scanner::{OpenPortMap, StopSignal};

pub const STATUS_OPEN: &str = "open";

/// One exported row: a host, a port and whatever is known about its service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScanResult {
    #[serde(rename = "IP")]
    pub ip: IpAddr,
    pub port: u16,
    pub status: String,
    pub service: String,
    pub version: String,
}

impl ScanResult {
    /// A row for an open port with no service information.
    pub fn bare(ip: IpAddr, port: u16) -> Self {
        Self {
            ip,
            port,
            status: STATUS_OPEN.to_string(),
            service: String::new(),
            version: String::new(),
        }
    }

    fn from_record(ip: IpAddr, record: ServiceRecord) -> Self {
        Self {
            ip,
            port: record.port,
            status: record.state,
            service: record.name,
            version: record.version,
        }
    }
}

/// Rows for every open port, ordered by host then port, with empty service fields.
pub fn flatten(open_ports: &OpenPortMap) -> Vec<ScanResult> {
    let mut results: Vec<ScanResult> = Vec::new();
    for host in sorted_hosts(open_ports) {
        results.extend(
            open_ports[&host]
                .iter()
                .map(|&port| ScanResult::bare(host, port)),
        );
    }
    results
}

/// Builds the result rows, asking `fingerprinter` about each host's open ports.
///
/// Hosts are submitted one at a time. A host whose fingerprinting fails keeps
/// bare rows, and so does any open port the engine did not report on.
///
/// Once `stop` trips, the run in progress is abandoned and no further host is
/// submitted; every remaining open port still gets a bare row.
pub async fn aggregate(
    open_ports: &OpenPortMap,
    fingerprinter: Option<&dyn Fingerprinter>,
    stop: &StopSignal,
) -> Vec<ScanResult> {
    let Some(fingerprinter) = fingerprinter else {
        return flatten(open_ports);
    };

    let mut results: Vec<ScanResult> = Vec::new();

    for host in sorted_hosts(open_ports) {
        let ports = &open_ports[&host];
        if ports.is_empty() {
            continue;
        }

        let outcome = match stop.is_stopped() {
            true => None,
            false => tokio::select! {
                result = fingerprinter.fingerprint(host, ports) => Some(result),
                _ = stop.stopped() => {
                    warn!("Fingerprinting interrupted, remaining hosts are exported without services");
                    None
                }
            },
        };

        let mut records: Vec<ServiceRecord> = match outcome {
            Some(Ok(records)) => records,
            Some(Err(e)) => {
                warn!("Fingerprinting {host} failed: {e:#}");
                Vec::new()
            }
            None => Vec::new(),
        };
        records.retain(|record| ports.contains(&record.port));
        records.sort_by_key(|record| record.port);
        records.dedup_by_key(|record| record.port);
        debug!("{} service records for {host}", records.len());

        let mut identified = records.into_iter().peekable();
        for &port in ports {
            match identified.next_if(|record| record.port == port) {
                Some(record) => results.push(ScanResult::from_record(host, record)),
                None => results.push(ScanResult::bare(host, port)),
            }
        }
    }

    results
}

fn sorted_hosts(open_ports: &OpenPortMap) -> Vec<IpAddr> {
    let mut hosts: Vec<IpAddr> = open_ports.keys().copied().collect();
    hosts.sort();
    hosts
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
