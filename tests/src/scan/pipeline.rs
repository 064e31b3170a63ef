use std::fs;
use std::sync::Arc;

use sweepr_common::config::{OutputFormat, ParseMode};
use sweepr_common::network::ports::{self, PortSet};
use sweepr_common::network::target::{self, HostSet};
use sweepr_core::aggregate::{self, ScanResult};
use sweepr_core::export;
use sweepr_core::fingerprint::Fingerprinter;
use sweepr_core::network::tcp::TcpConnector;
use sweepr_core::scanner::{PortScanner, StopSignal};

use crate::util::{self, LOCALHOST, StaticFingerprinter};

async fn scan_loopback(ports: &PortSet) -> sweepr_core::scanner::OpenPortMap {
    let hosts: HostSet = target::expand("127.0.0.0/30", ParseMode::Lenient).unwrap();
    assert_eq!(hosts.len(), 2);

    PortScanner::new(Arc::new(TcpConnector), 16)
        .unwrap()
        .scan(&hosts, ports)
        .await
}

/// Parse, scan, fingerprint and export to CSV, then read the file back.
#[tokio::test]
async fn scan_fingerprint_and_export_csv() {
    let open = util::open_port().await;
    let closed = util::closed_port().await;
    let ports: PortSet = ports::expand(&format!("{},{}", open.port, closed)).unwrap();

    let open_ports = scan_loopback(&ports).await;
    let engine = StaticFingerprinter;
    let results: Vec<ScanResult> =
        aggregate::aggregate(&open_ports, Some(&engine as &dyn Fingerprinter), &StopSignal::new()).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].ip, LOCALHOST);
    assert_eq!(results[0].port, open.port);
    assert_eq!(results[0].service, "echo");

    let dir = tempfile::tempdir().unwrap();
    let path = export::write_results(&results, &dir.path().join("result"), OutputFormat::Csv).unwrap();
    let csv = fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "IP,Port,Status,Service,Version");
    assert_eq!(lines[1], format!("127.0.0.1,{},open,echo,test 1.0", open.port));
}

/// Without a fingerprinting engine every open port still gets a row.
#[tokio::test]
async fn scan_without_fingerprinting_exports_json() {
    let open = util::open_port().await;
    let ports: PortSet = [open.port].into_iter().collect();

    let open_ports = scan_loopback(&ports).await;
    let results = aggregate::aggregate(&open_ports, None, &StopSignal::new()).await;

    assert_eq!(results, vec![ScanResult::bare(LOCALHOST, open.port)]);

    let dir = tempfile::tempdir().unwrap();
    let path = export::write_results(&results, dir.path(), OutputFormat::Json).unwrap();
    let json = fs::read_to_string(path).unwrap();

    assert!(json.contains(&format!("\"Port\": {}", open.port)));
    assert!(json.contains("\"Service\": \"\""));
}
