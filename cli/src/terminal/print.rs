use std::fmt::Display;
use std::net::IpAddr;

use crate::terminal::format::{self, Detail};
use crate::terminal::{banner, colors};
use colored::*;
use sweepr_common::logging::PRINT_TARGET;
use tracing::info;
use unicode_width::UnicodeWidthStr;

pub const TOTAL_WIDTH: usize = 64;
const SETTING_WIDTH: usize = 12;
const PORT_WIDTH: usize = 6;

#[macro_export]
macro_rules! sprint {
    () => {
        $crate::terminal::print::print("");
    };
    ($msg:expr) => {
        $crate::terminal::print::print($msg);
    };
}

/// Emits a line that the formatter writes verbatim, without a level prefix.
pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, raw_msg = msg);
}

pub fn banner(no_banner: bool, q_level: u8) {
    if no_banner || q_level > 0 {
        return;
    }
    banner::print();
    print(&title_rule(&format!("sweepr v{}", env!("CARGO_PKG_VERSION"))));
}

/// Opens a phase of the run (`liveness check`, `port scan`, ...).
pub fn section(title: &str, q_level: u8) {
    if q_level > 0 {
        return;
    }
    print(&title_rule(title));
}

pub fn rule() {
    print(&"═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR).to_string());
}

/// One `key ....: value` row of the settings block.
pub fn setting(key: &str, value: impl Display) {
    print(&setting_line(key, &value.to_string()));
}

pub fn hint(msg: &str) {
    print(&format!("{} {}", "»".color(colors::SEPARATOR), msg.italic().color(colors::TEXT_DEFAULT)));
}

/// A host confirmed alive and how it was confirmed.
pub fn alive_host(ip: &IpAddr, how: &str) {
    print(&format!(
        "  {} {} {}",
        "+".green().bold(),
        format::ip_to_colored(ip),
        format!("({how})").color(colors::SEPARATOR)
    ));
}

/// A host followed by one branch per open port.
pub fn host_ports(idx: usize, ip: &IpAddr, rows: &[Detail]) {
    print(&format!(
        "{}{}{} {}",
        "[".color(colors::SEPARATOR),
        (idx + 1).to_string().color(colors::ACCENT),
        "]".color(colors::SEPARATOR),
        format::ip_to_colored(ip)
    ));
    for (i, (port, value)) in rows.iter().enumerate() {
        let last: bool = i + 1 == rows.len();
        print(&port_row(port, &value.to_string(), last));
    }
}

pub fn summary(line: &str) {
    rule();
    let pad: String = " ".repeat(TOTAL_WIDTH.saturating_sub(console::measure_text_width(line)) / 2);
    print(&format!("{pad}{line}"));
    rule();
}

/// Boxed notice shown when a phase leaves nothing to report.
pub fn nothing_found(what: &str, hint: &str) {
    for line in notice_box(what, hint) {
        print(&line.red().to_string());
    }
}

fn title_rule(title: &str) -> String {
    let label: String = format!("[ {} ]", title.to_uppercase());
    let fill: usize = TOTAL_WIDTH.saturating_sub(console::measure_text_width(&label));
    let left: usize = fill / 2;
    format!(
        "{}{}{}",
        "─".repeat(left).color(colors::SEPARATOR),
        label.bright_green(),
        "─".repeat(fill - left).color(colors::SEPARATOR)
    )
}

fn setting_line(key: &str, value: &str) -> String {
    let dots: String = ".".repeat(SETTING_WIDTH.saturating_sub(key.len()) + 1);
    format!(
        "{}{}{} {}",
        key.color(colors::PRIMARY),
        dots.color(colors::SEPARATOR),
        ":".color(colors::SEPARATOR),
        value.color(colors::TEXT_DEFAULT)
    )
}

fn port_row(port: &str, value: &str, last: bool) -> String {
    let branch: &str = if last { "└─" } else { "├─" };
    format!(
        "  {} {}/tcp {}",
        branch.color(colors::SEPARATOR),
        format!("{port:>PORT_WIDTH$}").color(colors::ACCENT),
        value
    )
}

fn notice_box(what: &str, hint: &str) -> Vec<String> {
    let inner: usize = what.width().max(hint.width()) + 4;
    let centered = |text: &str| {
        let left: usize = (inner - text.width()) / 2;
        format!("│{}{}{}│", " ".repeat(left), text, " ".repeat(inner - text.width() - left))
    };
    vec![
        format!("┌{}┐", "─".repeat(inner)),
        centered(&what.to_uppercase()),
        centered(hint),
        format!("└{}┘", "─".repeat(inner)),
    ]
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
