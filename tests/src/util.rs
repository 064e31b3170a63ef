use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use sweepr_core::fingerprint::{Fingerprinter, ServiceRecord};
use sweepr_core::network::icmp::{EchoStats, Pinger};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// A loopback port that accepts connections until the handle is dropped.
pub struct OpenPort {
    pub port: u16,
    accept_loop: JoinHandle<()>,
}

impl Drop for OpenPort {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

pub async fn open_port() -> OpenPort {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let accept_loop = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            drop(stream);
        }
    });
    OpenPort { port, accept_loop }
}

/// A loopback port nothing listens on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);
    addr.port()
}

/// ICMP that never gets an answer, as on a network filtering echo requests.
pub struct SilentPinger;

#[async_trait]
impl Pinger for SilentPinger {
    async fn echo(&self, _addr: IpAddr, count: u16, _limit: Duration) -> anyhow::Result<EchoStats> {
        Ok(EchoStats {
            sent: count,
            received: 0,
        })
    }
}

/// Names every port "echo" with a fixed version string.
pub struct StaticFingerprinter;

#[async_trait]
impl Fingerprinter for StaticFingerprinter {
    async fn fingerprint(
        &self,
        _host: IpAddr,
        ports: &BTreeSet<u16>,
    ) -> anyhow::Result<Vec<ServiceRecord>> {
        Ok(ports
            .iter()
            .map(|&port| ServiceRecord {
                port,
                protocol: "tcp".to_string(),
                state: "open".to_string(),
                name: "echo".to_string(),
                version: "test 1.0".to_string(),
            })
            .collect())
    }
}
