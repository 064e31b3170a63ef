use std::net::IpAddr;

use crate::terminal::colors;
use colored::*;
use sweepr_core::aggregate::{STATUS_OPEN, ScanResult};
use sweepr_core::liveness::Liveness;

pub type Detail = (String, ColoredString);

pub fn ip_to_colored(ip: &IpAddr) -> ColoredString {
    match ip {
        IpAddr::V4(ipv4_addr) => ipv4_addr.to_string().color(colors::IPV4_ADDR),
        IpAddr::V6(ipv6_addr) => ipv6_addr.to_string().color(colors::IPV6_ADDR),
    }
}

/// `port: state service version`, skipping whatever the fingerprint left empty.
pub fn result_to_detail(result: &ScanResult) -> Detail {
    let status: ColoredString = match result.status.as_str() {
        STATUS_OPEN => result.status.green(),
        _ => result.status.yellow(),
    };

    let mut value: String = status.to_string();
    if !result.service.is_empty() {
        value.push_str(&format!(" {}", result.service.color(colors::SERVICE)));
    }
    if !result.version.is_empty() {
        value.push_str(&format!(" {}", result.version.color(colors::TEXT_DEFAULT)));
    }

    (result.port.to_string(), value.normal())
}

pub fn liveness_to_str(liveness: &Liveness) -> String {
    match liveness {
        Liveness::AliveByPing => "ICMP echo".to_string(),
        Liveness::AliveByPortProbe(port) => format!("port {port}"),
        Liveness::Unconfirmed => "unconfirmed".to_string(),
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
