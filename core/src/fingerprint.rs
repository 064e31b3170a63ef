//! Service fingerprinting of ports already known to be open.
//!
//! The identification itself is delegated to an external engine behind the
//! [`Fingerprinter`] trait; [`nmap::NmapFingerprinter`] drives an `nmap` binary.

use std::collections::BTreeSet;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitStatus;

use async_trait::async_trait;
use thiserror::Error;

pub mod nmap;

/// One service line reported by the engine for a host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceRecord {
    pub port: u16,
    pub protocol: String,
    pub state: String,
    pub name: String,
    pub version: String,
}

#[async_trait]
pub trait Fingerprinter: Send + Sync {
    /// Identifies the services behind `ports` on `host`.
    async fn fingerprint(
        &self,
        host: IpAddr,
        ports: &BTreeSet<u16>,
    ) -> anyhow::Result<Vec<ServiceRecord>>;
}

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("fingerprinting engine '{}' was not found", .0.display())]
    BinaryNotFound(PathBuf),

    #[error("fingerprinting {host} timed out after {secs}s")]
    Timeout { host: IpAddr, secs: u64 },

    #[error("fingerprinting engine exited with {status}: {stderr}")]
    EngineFailed { status: ExitStatus, stderr: String },

    #[error("failed to run fingerprinting engine: {0}")]
    Io(#[from] std::io::Error),

    #[error("unreadable engine report: {0}")]
    Report(#[from] quick_xml::DeError),
}
