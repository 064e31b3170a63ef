//! ICMP echo transport for the liveness stage.
//!
//! Raw ICMP sockets usually need elevated privileges. When a socket cannot be
//! opened, [`IcmpPinger::echo`] fails for that address family and the liveness
//! stage treats the host as silent.

use std::net::IpAddr;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence};
use tracing::{debug, trace};

const PAYLOAD: [u8; 56] = [0; 56];

/// Outcome of one echo sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EchoStats {
    pub sent: u16,
    pub received: u16,
}

impl EchoStats {
    pub fn answered(&self) -> bool {
        self.received > 0
    }
}

#[async_trait]
pub trait Pinger: Send + Sync {
    /// Sends `count` echo requests to `addr`, spending at most `limit` in total.
    ///
    /// Errors mean the exchange could not be attempted at all.
    async fn echo(&self, addr: IpAddr, count: u16, limit: Duration) -> anyhow::Result<EchoStats>;
}

pub struct IcmpPinger {
    v4: Option<Client>,
    v6: Option<Client>,
}

impl IcmpPinger {
    /// Opens one ICMP socket per address family. Must run inside a Tokio runtime.
    pub fn new() -> Self {
        let v4 = Client::new(&Config::default())
            .map_err(|e| debug!("ICMPv4 socket unavailable: {e}"))
            .ok();
        let v6 = Client::new(&Config::builder().kind(ICMP::V6).build())
            .map_err(|e| debug!("ICMPv6 socket unavailable: {e}"))
            .ok();

        Self { v4, v6 }
    }

    /// Whether at least one address family can send echo requests.
    pub fn is_available(&self) -> bool {
        self.v4.is_some() || self.v6.is_some()
    }
}

impl Default for IcmpPinger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Pinger for IcmpPinger {
    async fn echo(&self, addr: IpAddr, count: u16, limit: Duration) -> anyhow::Result<EchoStats> {
        let client = match addr {
            IpAddr::V4(_) => self.v4.as_ref(),
            IpAddr::V6(_) => self.v6.as_ref(),
        }
        .context("no ICMP socket for this address family")?;

        let mut pinger = client.pinger(addr, PingIdentifier(rand::random())).await;
        pinger.timeout(limit / u32::from(count.max(1)));

        let mut stats = EchoStats::default();
        for seq in 0..count {
            stats.sent += 1;
            match pinger.ping(PingSequence(seq), &PAYLOAD).await {
                Ok((_packet, rtt)) => {
                    trace!("Echo reply from {addr} in {rtt:?}");
                    stats.received += 1;
                }
                Err(e) => trace!("No echo reply from {addr}: {e}"),
            }
        }

        Ok(stats)
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
