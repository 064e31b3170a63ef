//! # Liveness Prober
//!
//! Decides which hosts are reachable before the port scan.
//!
//! 1. **ICMP phase**: every host receives an echo sequence; one reply marks it alive.
//! 2. **TCP fallback**: silent hosts are probed against a fixed, ordered port
//!    list. Ports are tried one after another and the first successful connect
//!    marks the host alive; the remaining ports are skipped.
//!
//! Both phases share one pool of permits sized independently of the scanner.
//! Workers return their verdicts through the join handles; nothing is
//! appended to shared state from inside a worker.

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use sweepr_common::config::{CONNECT_TIMEOUT, PING_COUNT, PING_TIMEOUT};
use sweepr_common::error::SpecError;
use sweepr_common::network::ports::LIVENESS_PORTS;
use sweepr_common::network::target::HostSet;
use sweepr_common::success;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::network::icmp::Pinger;
use crate::network::tcp::Connector;
use crate::scanner::{EventHook, ScanEvent, StopSignal, emit};

/// Verdict for a single host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    AliveByPing,
    /// Alive because a connect to this port succeeded.
    AliveByPortProbe(u16),
    Unconfirmed,
}

impl Liveness {
    pub fn is_alive(&self) -> bool {
        !matches!(self, Liveness::Unconfirmed)
    }
}

/// Verdicts in the order the hosts were supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivenessReport {
    records: Vec<(IpAddr, Liveness)>,
}

impl LivenessReport {
    pub fn get(&self, host: &IpAddr) -> Option<Liveness> {
        self.records
            .iter()
            .find(|(addr, _)| addr == host)
            .map(|(_, liveness)| *liveness)
    }

    pub fn alive_hosts(&self) -> HostSet {
        self.records
            .iter()
            .filter(|(_, liveness)| liveness.is_alive())
            .map(|(addr, _)| *addr)
            .collect()
    }

    pub fn alive_count(&self) -> usize {
        self.records.iter().filter(|(_, liveness)| liveness.is_alive()).count()
    }
}

pub struct LivenessProber<P, C> {
    pinger: Arc<P>,
    connector: Arc<C>,
    pool_size: usize,
    ping_count: u16,
    ping_timeout: Duration,
    connect_timeout: Duration,
    fallback_ports: Arc<[u16]>,
    stop: StopSignal,
    hook: Option<EventHook>,
}

impl<P: Pinger + 'static, C: Connector + 'static> LivenessProber<P, C> {
    /// Fails with [`SpecError::InvalidConcurrency`] when `pool_size` is zero.
    pub fn new(pinger: Arc<P>, connector: Arc<C>, pool_size: usize) -> Result<Self, SpecError> {
        if pool_size == 0 {
            return Err(SpecError::InvalidConcurrency);
        }
        Ok(Self {
            pinger,
            connector,
            pool_size: pool_size.min(Semaphore::MAX_PERMITS),
            ping_count: PING_COUNT,
            ping_timeout: PING_TIMEOUT,
            connect_timeout: CONNECT_TIMEOUT,
            fallback_ports: Arc::from(LIVENESS_PORTS),
            stop: StopSignal::new(),
            hook: None,
        })
    }

    pub fn with_fallback_ports(mut self, ports: &[u16]) -> Self {
        self.fallback_ports = Arc::from(ports);
        self
    }

    pub fn with_timeouts(mut self, ping_timeout: Duration, connect_timeout: Duration) -> Self {
        self.ping_timeout = ping_timeout;
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_event_hook(mut self, hook: EventHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Runs both phases and blocks until every scheduled probe has finished.
    ///
    /// Hosts that were never probed because of a stop request are `Unconfirmed`.
    pub async fn probe(&self, hosts: &HostSet) -> LivenessReport {
        let semaphore = Arc::new(Semaphore::new(self.pool_size));
        let mut verdicts: HashMap<IpAddr, Liveness> = HashMap::with_capacity(hosts.len());

        let silent: Vec<IpAddr> = self.ping_phase(hosts, &semaphore, &mut verdicts).await;

        if !silent.is_empty() && !self.fallback_ports.is_empty() {
            info!("{} hosts ignored ICMP echo, probing common ports", silent.len());
            self.port_phase(&silent, &semaphore, &mut verdicts).await;
        }

        let records: Vec<(IpAddr, Liveness)> = hosts
            .iter()
            .map(|host| (*host, verdicts.remove(host).unwrap_or(Liveness::Unconfirmed)))
            .collect();

        LivenessReport { records }
    }

    /// Returns the hosts that produced no echo reply, in input order.
    async fn ping_phase(
        &self,
        hosts: &HostSet,
        semaphore: &Arc<Semaphore>,
        verdicts: &mut HashMap<IpAddr, Liveness>,
    ) -> Vec<IpAddr> {
        let mut tasks: JoinSet<(IpAddr, bool)> = JoinSet::new();

        for &host in hosts.iter() {
            if self.stop.is_stopped() {
                break;
            }
            let Ok(permit) = Arc::clone(semaphore).acquire_owned().await else {
                break;
            };

            let pinger = Arc::clone(&self.pinger);
            let (count, limit) = (self.ping_count, self.ping_timeout);

            tasks.spawn(async move {
                let _permit = permit;
                let answered = match pinger.echo(host, count, limit).await {
                    Ok(stats) => stats.answered(),
                    Err(e) => {
                        debug!("ICMP probe of {host} not possible: {e:#}");
                        false
                    }
                };
                (host, answered)
            });
        }

        let mut silent: HashSet<IpAddr> = HashSet::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((host, true)) => self.mark_alive(host, Liveness::AliveByPing, verdicts),
                Ok((host, false)) => {
                    silent.insert(host);
                }
                Err(e) => warn!("Ping task failed: {e}"),
            }
        }

        hosts.iter().copied().filter(|host| silent.contains(host)).collect()
    }

    async fn port_phase(
        &self,
        silent: &[IpAddr],
        semaphore: &Arc<Semaphore>,
        verdicts: &mut HashMap<IpAddr, Liveness>,
    ) {
        let mut tasks: JoinSet<(IpAddr, Option<u16>)> = JoinSet::new();

        for &host in silent {
            if self.stop.is_stopped() {
                break;
            }
            let Ok(permit) = Arc::clone(semaphore).acquire_owned().await else {
                break;
            };

            let connector = Arc::clone(&self.connector);
            let ports = Arc::clone(&self.fallback_ports);
            let stop = self.stop.clone();
            let limit = self.connect_timeout;

            tasks.spawn(async move {
                let _permit = permit;
                for &port in ports.iter() {
                    if stop.is_stopped() {
                        break;
                    }
                    if connector.connect(SocketAddr::new(host, port), limit).await {
                        return (host, Some(port));
                    }
                }
                (host, None)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((host, Some(port))) => {
                    self.mark_alive(host, Liveness::AliveByPortProbe(port), verdicts)
                }
                Ok((_, None)) => {}
                Err(e) => warn!("Port probe task failed: {e}"),
            }
        }
    }

    fn mark_alive(&self, host: IpAddr, liveness: Liveness, verdicts: &mut HashMap<IpAddr, Liveness>) {
        match liveness {
            Liveness::AliveByPortProbe(port) => success!("{host} is alive (port {port} answered)"),
            _ => success!("{host} is alive (ICMP echo)"),
        }
        emit(&self.hook, ScanEvent::Alive(host, liveness));
        verdicts.insert(host, liveness);
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
