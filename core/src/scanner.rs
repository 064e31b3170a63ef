//! # Port Scanner
//!
//! Runs one TCP-connect attempt for every (host, port) pair and records the
//! ones that complete.
//!
//! At most `concurrency` attempts are in flight at any instant: a semaphore
//! permit is taken **before** a unit is spawned, so a /16 swept with
//! `top1000` never materializes millions of pending tasks. A single attempt is
//! authoritative; there are no retries.

use std::collections::{BTreeSet, HashMap};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use sweepr_common::config::CONNECT_TIMEOUT;
use sweepr_common::error::SpecError;
use sweepr_common::network::ports::PortSet;
use sweepr_common::network::target::HostSet;
use sweepr_common::success;
use tokio::sync::{Mutex, Notify, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};

use crate::liveness::Liveness;
use crate::network::tcp::Connector;

/// Open ports per host. Iteration order carries no meaning.
pub type OpenPortMap = HashMap<IpAddr, BTreeSet<u16>>;

/// Progress notifications emitted by the probing stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEvent {
    /// A connect attempt finished, whatever its verdict.
    Attempted(SocketAddr),
    Open(SocketAddr),
    Alive(IpAddr, Liveness),
}

pub type EventHook = Arc<dyn Fn(ScanEvent) + Send + Sync>;

/// Shared flag that stops the scheduling of further probes.
///
/// Probes already in flight are left to finish or time out.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<StopState>);

#[derive(Debug, Default)]
struct StopState {
    stopped: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.stopped.store(true, Ordering::SeqCst);
        self.0.notify.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.0.stopped.load(Ordering::SeqCst)
    }

    /// Resolves once [`StopSignal::stop`] has been called.
    pub async fn stopped(&self) {
        let notified = self.0.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.is_stopped() {
            return;
        }
        notified.await;
    }
}

pub(crate) fn emit(hook: &Option<EventHook>, event: ScanEvent) {
    if let Some(hook) = hook {
        hook(event);
    }
}

pub(crate) fn log_join_error(result: Result<(), JoinError>) {
    if let Err(e) = result {
        warn!("Probe task failed: {e}");
    }
}

pub struct PortScanner<C> {
    connector: Arc<C>,
    concurrency: usize,
    connect_timeout: Duration,
    stop: StopSignal,
    hook: Option<EventHook>,
}

impl<C: Connector + 'static> PortScanner<C> {
    /// Fails with [`SpecError::InvalidConcurrency`] when `concurrency` is zero.
    pub fn new(connector: Arc<C>, concurrency: usize) -> Result<Self, SpecError> {
        if concurrency == 0 {
            return Err(SpecError::InvalidConcurrency);
        }

        Ok(Self {
            connector,
            concurrency: concurrency.min(Semaphore::MAX_PERMITS),
            connect_timeout: CONNECT_TIMEOUT,
            stop: StopSignal::new(),
            hook: None,
        })
    }

    pub fn with_timeout(mut self, connect_timeout: Duration) -> Self {
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

    /// Probes every pair of `hosts` × `ports` and returns once all attempts have joined.
    ///
    /// Ports form the outer loop so consecutive attempts spread across hosts.
    pub async fn scan(&self, hosts: &HostSet, ports: &PortSet) -> OpenPortMap {
        let open_ports: Arc<Mutex<OpenPortMap>> = Arc::default();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<()> = JoinSet::new();

        'schedule: for &port in ports.iter() {
            for &host in hosts.iter() {
                if self.stop.is_stopped() {
                    info!("Stop requested, no further ports will be probed");
                    break 'schedule;
                }

                let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                    break 'schedule;
                };
                if self.stop.is_stopped() {
                    info!("Stop requested, no further ports will be probed");
                    break 'schedule;
                }

                while let Some(finished) = tasks.try_join_next() {
                    log_join_error(finished);
                }

                let connector = Arc::clone(&self.connector);
                let open_ports = Arc::clone(&open_ports);
                let hook = self.hook.clone();
                let limit = self.connect_timeout;

                tasks.spawn(async move {
                    let _permit = permit;
                    let addr = SocketAddr::new(host, port);

                    if connector.connect(addr, limit).await {
                        open_ports.lock().await.entry(host).or_default().insert(port);
                        success!("{addr} is open");
                        emit(&hook, ScanEvent::Open(addr));
                    }
                    emit(&hook, ScanEvent::Attempted(addr));
                });
            }
        }

        while let Some(finished) = tasks.join_next().await {
            log_join_error(finished);
        }

        match Arc::try_unwrap(open_ports) {
            Ok(open_ports) => open_ports.into_inner(),
            Err(shared) => shared.lock().await.clone(),
        }
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
