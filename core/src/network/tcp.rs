use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// Opens TCP connections on behalf of the scanner and the liveness fallback.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Returns `true` when a handshake with `addr` completes within `limit`.
    ///
    /// Refusals, timeouts and unreachable networks are all `false`.
    async fn connect(&self, addr: SocketAddr, limit: Duration) -> bool;
}

/// Plain TCP-connect prober. The connection is closed as soon as it is established.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, addr: SocketAddr, limit: Duration) -> bool {
        match timeout(limit, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                true
            }
            Ok(Err(e)) => {
                trace!("{addr} refused: {e}");
                false
            }
            Err(_elapsed) => false,
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
