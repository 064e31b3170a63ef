use sweepr_common::network::ports::PortSet;
use sweepr_common::network::target::HostSet;

use crate::commands::TargetArgs;
use crate::terminal::{format, print};

const PREVIEW_LEN: usize = 8;

/// Prints what the target and port specifications resolve to without touching the network.
pub fn expand(target: &TargetArgs, quiet: u8) -> anyhow::Result<()> {
    let (hosts, ports) = target.resolve(target.mode())?;

    print::setting("Hosts", hosts.len());
    print::setting("Ports", ports.len());
    print::setting("Pairs", hosts.len() as u64 * ports.len() as u64);

    if quiet == 0 {
        print::setting("First hosts", host_preview(&hosts));
        print::setting("First ports", port_preview(&ports));
    }
    Ok(())
}

fn host_preview(hosts: &HostSet) -> String {
    let shown: Vec<String> = hosts
        .iter()
        .take(PREVIEW_LEN)
        .map(|host| format::ip_to_colored(host).to_string())
        .collect();
    with_ellipsis(shown, hosts.len())
}

fn port_preview(ports: &PortSet) -> String {
    let shown: Vec<String> = ports.iter().take(PREVIEW_LEN).map(u16::to_string).collect();
    with_ellipsis(shown, ports.len())
}

fn with_ellipsis(shown: Vec<String>, total: usize) -> String {
    match total > shown.len() {
        true => format!("{}, ... (+{})", shown.join(", "), total - shown.len()),
        false => shown.join(", "),
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
