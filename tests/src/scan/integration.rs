use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use sweepr_common::config::ParseMode;
use sweepr_common::network::ports::{self, PortSet};
use sweepr_common::network::target::{self, HostSet};
use sweepr_core::liveness::{Liveness, LivenessProber};
use sweepr_core::network::tcp::TcpConnector;
use sweepr_core::scanner::{OpenPortMap, PortScanner, StopSignal};

use crate::util::{self, LOCALHOST, SilentPinger};

const SHORT: Duration = Duration::from_millis(500);

fn scanner(concurrency: usize) -> PortScanner<TcpConnector> {
    PortScanner::new(Arc::new(TcpConnector), concurrency)
        .unwrap()
        .with_timeout(SHORT)
}

/// One listening and one closed port on the same host: only the listener is reported.
#[tokio::test]
async fn open_and_closed_port_on_loopback() {
    let open = util::open_port().await;
    let closed = util::closed_port().await;

    let hosts: HostSet = target::expand("127.0.0.1", ParseMode::Strict).unwrap();
    let ports: PortSet = ports::expand(&format!("{},{}", open.port, closed)).unwrap();

    let result: OpenPortMap = scanner(4).scan(&hosts, &ports).await;

    assert_eq!(result.len(), 1);
    assert_eq!(result[&LOCALHOST], BTreeSet::from([open.port]));
}

#[tokio::test]
async fn repeated_scans_agree() {
    let open = util::open_port().await;
    let closed = util::closed_port().await;

    let hosts: HostSet = target::expand("127.0.0.1", ParseMode::Strict).unwrap();
    let ports: PortSet = [open.port, closed].into_iter().collect();
    let scanner = scanner(2);

    let first = scanner.scan(&hosts, &ports).await;
    let second = scanner.scan(&hosts, &ports).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn port_range_around_a_listener() {
    let open = util::open_port().await;
    let start = open.port.saturating_sub(2).max(1);
    let end = open.port.saturating_add(2);

    let hosts: HostSet = target::expand("127.0.0.1", ParseMode::Strict).unwrap();
    let ports: PortSet = ports::expand(&format!("{start}-{end}")).unwrap();

    let result = scanner(8).scan(&hosts, &ports).await;

    assert!(result[&LOCALHOST].contains(&open.port));
}

#[tokio::test]
async fn stopped_scan_probes_nothing() {
    let open = util::open_port().await;
    let stop = StopSignal::new();
    stop.stop();

    let hosts: HostSet = target::expand("127.0.0.1", ParseMode::Strict).unwrap();
    let ports: PortSet = [open.port].into_iter().collect();

    let result = scanner(1).with_stop_signal(stop).scan(&hosts, &ports).await;

    assert!(result.is_empty());
}

/// ICMP is filtered, so the host is confirmed by the first fallback port that connects.
#[tokio::test]
async fn liveness_falls_back_to_port_probe() {
    let open = util::open_port().await;
    let closed = util::closed_port().await;

    let hosts: HostSet = target::expand("127.0.0.1", ParseMode::Strict).unwrap();
    let prober = LivenessProber::new(Arc::new(SilentPinger), Arc::new(TcpConnector), 4)
        .unwrap()
        .with_fallback_ports(&[closed, open.port])
        .with_timeouts(SHORT, SHORT);

    let report = prober.probe(&hosts).await;

    assert_eq!(report.get(&LOCALHOST), Some(Liveness::AliveByPortProbe(open.port)));
    assert_eq!(report.alive_hosts().as_slice(), &[LOCALHOST]);
}

#[tokio::test]
async fn liveness_leaves_silent_host_unconfirmed() {
    let closed = util::closed_port().await;

    let hosts: HostSet = target::expand("127.0.0.1", ParseMode::Strict).unwrap();
    let prober = LivenessProber::new(Arc::new(SilentPinger), Arc::new(TcpConnector), 1)
        .unwrap()
        .with_fallback_ports(&[closed])
        .with_timeouts(SHORT, SHORT);

    let report = prober.probe(&hosts).await;

    assert_eq!(report.get(&LOCALHOST), Some(Liveness::Unconfirmed));
    assert_eq!(report.alive_count(), 0);
}

#[tokio::test]
async fn targets_from_a_file() {
    let open = util::open_port().await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# loopback only").unwrap();
    writeln!(file, "127.0.0.1").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "  127.0.0.1  ").unwrap();
    writeln!(file, "not-an-address").unwrap();

    let hosts = HostSet::from_file(file.path(), ParseMode::Lenient).unwrap();
    assert_eq!(hosts.as_slice(), &[LOCALHOST]);
    assert!(HostSet::from_file(file.path(), ParseMode::Strict).is_err());

    let ports: PortSet = [open.port].into_iter().collect();
    let result = scanner(1).scan(&hosts, &ports).await;

    assert_eq!(result[&LOCALHOST], BTreeSet::from([open.port]));
}
