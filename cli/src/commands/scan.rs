use std::collections::BTreeSet;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::bail;
use colored::*;
use sweepr_common::config::Config;
use sweepr_common::network::ports::PortSet;
use sweepr_common::network::target::HostSet;
use sweepr_common::success;
use sweepr_core::aggregate::{self, ScanResult};
use sweepr_core::export;
use sweepr_core::fingerprint::Fingerprinter;
use sweepr_core::fingerprint::nmap::NmapFingerprinter;
use sweepr_core::liveness::{LivenessProber, LivenessReport};
use sweepr_core::network::icmp::IcmpPinger;
use sweepr_core::network::tcp::TcpConnector;
use sweepr_core::scanner::{OpenPortMap, PortScanner, StopSignal};
use tokio::task::JoinHandle;
use tracing::{Instrument, info, warn};

use crate::commands::TargetArgs;
use crate::sprint;
use crate::terminal::{colors, format, input::InputHandle, print, progress};

const INTERRUPTED_EXIT_CODE: i32 = 130;

pub async fn scan(target: &TargetArgs, cfg: &Config) -> anyhow::Result<()> {
    let (hosts, ports) = target.resolve(cfg.address_mode)?;
    if ports.is_empty() {
        bail!("port specification '{}' expands to no ports", target.ports);
    }

    let fingerprinter: Option<NmapFingerprinter> = match cfg.fingerprint {
        true => Some(NmapFingerprinter::new(cfg.nmap_path.clone())?),
        false => None,
    };

    print_settings(&hosts, &ports, cfg, fingerprinter.as_ref());

    let stop = StopSignal::new();
    let interrupts = Interrupts::start(&stop, cfg);

    let start_time: Instant = Instant::now();
    let connector = Arc::new(TcpConnector);

    let hosts: HostSet = match cfg.alive_check {
        true => filter_alive(&hosts, connector.clone(), &stop, cfg).await?,
        false => hosts,
    };

    if hosts.is_empty() {
        drop(interrupts);
        no_hosts_found(cfg);
        return Ok(());
    }

    let open_ports: OpenPortMap = scan_ports(&hosts, &ports, connector, &stop, cfg).await?;

    if open_ports.is_empty() {
        drop(interrupts);
        no_ports_found(cfg);
        return Ok(());
    }

    let results: Vec<ScanResult> = identify(&open_ports, fingerprinter.as_ref(), &stop).await;
    let path: PathBuf = export::write_results(&results, &cfg.output_dir, cfg.format)?;
    drop(interrupts);

    scan_ends(&results, start_time.elapsed(), cfg);
    success!("Results saved to {}", path.display());
    Ok(())
}

/// Everything that may trip the stop signal until results are on disk:
/// the keyboard, Ctrl-C and the optional deadline. Dropping it releases the
/// terminal before results are printed.
struct Interrupts {
    _input: Option<InputHandle>,
    watchers: Vec<JoinHandle<()>>,
}

impl Interrupts {
    fn start(stop: &StopSignal, cfg: &Config) -> Self {
        let input: Option<InputHandle> =
            (!cfg.disable_input).then(|| InputHandle::start(stop.clone()));
        let mut watchers: Vec<JoinHandle<()>> = Vec::new();

        let on_interrupt = stop.clone();
        watchers.push(tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if on_interrupt.is_stopped() {
                    warn!("Interrupted again, exiting without saving results");
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
                warn!("Interrupted, finishing work in flight (Ctrl-C again to quit)");
                on_interrupt.stop();
            }
        }));

        if let Some(deadline) = cfg.deadline {
            let on_deadline = stop.clone();
            watchers.push(tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                warn!("Deadline of {}s reached, no further probes will be scheduled", deadline.as_secs());
                on_deadline.stop();
            }));
        }

        Self {
            _input: input,
            watchers,
        }
    }
}

impl Drop for Interrupts {
    fn drop(&mut self) {
        for watcher in &self.watchers {
            watcher.abort();
        }
    }
}

async fn filter_alive(
    hosts: &HostSet,
    connector: Arc<TcpConnector>,
    stop: &StopSignal,
    cfg: &Config,
) -> anyhow::Result<HostSet> {
    print::section("liveness check", cfg.quiet);

    let pinger = Arc::new(IcmpPinger::new());
    if !pinger.is_available() {
        match is_root::is_root() {
            true => warn!("ICMP sockets are unavailable, relying on port probes"),
            false => warn!("ICMP sockets are unavailable without root, relying on port probes"),
        }
    }

    let (span, hook) = progress::liveness_span(hosts.len());
    let prober = LivenessProber::new(pinger, connector, cfg.liveness_pool)?
        .with_stop_signal(stop.clone())
        .with_event_hook(hook);

    let report: LivenessReport = prober.probe(hosts).instrument(span).await;

    let alive: HostSet = report.alive_hosts();
    info!(
        "{} of {} hosts are alive",
        report.alive_count().to_string().green().bold(),
        hosts.len()
    );
    if cfg.quiet == 0 {
        for host in alive.iter() {
            if let Some(liveness) = report.get(host) {
                print::alive_host(host, &format::liveness_to_str(&liveness));
            }
        }
    }

    Ok(alive)
}

async fn scan_ports(
    hosts: &HostSet,
    ports: &PortSet,
    connector: Arc<TcpConnector>,
    stop: &StopSignal,
    cfg: &Config,
) -> anyhow::Result<OpenPortMap> {
    print::section("port scan", cfg.quiet);

    let total: u64 = hosts.len() as u64 * ports.len() as u64;
    let (span, hook) = progress::scan_span(total);
    let scanner = PortScanner::new(connector, cfg.threads)?
        .with_stop_signal(stop.clone())
        .with_event_hook(hook);

    let open_ports: OpenPortMap = scanner.scan(hosts, ports).instrument(span).await;

    if stop.is_stopped() {
        warn!("Scan stopped early, results are partial");
    }
    Ok(open_ports)
}

async fn identify(
    open_ports: &OpenPortMap,
    engine: Option<&NmapFingerprinter>,
    stop: &StopSignal,
) -> Vec<ScanResult> {
    let Some(engine) = engine else {
        return aggregate::flatten(open_ports);
    };

    let span = progress::fingerprint_span(open_ports.len());
    let results: Vec<ScanResult> =
        aggregate::aggregate(open_ports, Some(engine as &dyn Fingerprinter), stop)
            .instrument(span)
            .await;

    if stop.is_stopped() {
        warn!("Fingerprinting stopped early, unidentified ports are saved without service details");
    }
    results
}

fn print_settings(hosts: &HostSet, ports: &PortSet, cfg: &Config, engine: Option<&NmapFingerprinter>) {
    if cfg.quiet > 0 {
        return;
    }

    print::setting("Targets", format!("{} hosts", hosts.len()));
    print::setting("Ports", format!("{} ports", ports.len()));
    print::setting("Threads", cfg.threads);
    if cfg.alive_check {
        print::setting("Alive pool", cfg.liveness_pool);
    }
    let fingerprint: String = match engine {
        Some(engine) => engine.binary().display().to_string(),
        None => "disabled".to_string(),
    };
    print::setting("Fingerprint", fingerprint);
    print::setting("Output", format!("{} ({})", cfg.output_dir.display(), cfg.format));
    if !cfg.disable_input {
        print::hint("Press 'q' to stop early");
    }
}

fn scan_ends(results: &[ScanResult], total_time: Duration, cfg: &Config) {
    let hosts: BTreeSet<IpAddr> = results.iter().map(|r| r.ip).collect();

    if cfg.quiet < 2 {
        if cfg.quiet > 0 {
            sprint!();
        }
        print::section("open ports", cfg.quiet);
        print_hosts(results, &hosts);
    }

    print_summary(hosts.len(), results.len(), total_time, cfg);
}

fn print_hosts(results: &[ScanResult], hosts: &BTreeSet<IpAddr>) {
    for (idx, host) in hosts.iter().enumerate() {
        let rows: Vec<format::Detail> = results
            .iter()
            .filter(|r| r.ip == *host)
            .map(format::result_to_detail)
            .collect();
        print::host_ports(idx, host, &rows);

        if idx + 1 != hosts.len() {
            sprint!();
        }
    }
}

fn print_summary(hosts_len: usize, ports_len: usize, total_time: Duration, cfg: &Config) {
    let hosts: ColoredString = format!("{hosts_len} hosts").bold().green();
    let ports: ColoredString = format!("{ports_len} open ports").bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: ColoredString = format!("Scan Complete: {ports} on {hosts} in {total_time}")
        .color(colors::TEXT_DEFAULT);

    match cfg.quiet {
        0 => print::summary(&output.to_string()),
        _ => success!("{}", output),
    }
}

fn no_hosts_found(cfg: &Config) {
    print::section("liveness result", cfg.quiet);
    print::nothing_found("no hosts alive", "nothing answered ICMP echo or the fallback ports");
}

fn no_ports_found(cfg: &Config) {
    print::section("scan result", cfg.quiet);
    print::nothing_found("no open ports", "every requested port refused or timed out");
}
