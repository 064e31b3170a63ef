//! # Scan Target Model
//!
//! Parses address specifications and expands them into a [`HostSet`].
//!
//! A specification can be:
//! * A single IP address (e.g. `10.0.0.5`, `::1`).
//! * A CIDR block (e.g. `192.168.1.0/24`), without its network and broadcast addresses.
//! * A last-octet range (e.g. `192.168.1.10-20`), from the left literal's last octet up to the bound.
//! * A comma-separated list of any of the above.
//!
//! Line-oriented files holding one specification per line are read with [`HostSet::from_lines`].

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use pnet::ipnetwork::IpNetwork;
use tracing::debug;

use crate::config::{MAX_HOSTS, ParseMode};
use crate::error::SpecError;
use crate::network::range::{self, Ipv4Range};
use crate::success;

/// An ordered sequence of distinct host addresses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostSet {
    hosts: Vec<IpAddr>,
}

impl HostSet {
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &IpAddr> + Clone {
        self.hosts.iter()
    }

    pub fn as_slice(&self) -> &[IpAddr] {
        &self.hosts
    }

    /// Reads one specification per line. Blank lines and `#` comments are skipped.
    pub fn from_lines<R: BufRead>(reader: R, mode: ParseMode) -> anyhow::Result<HostSet> {
        let mut targets: Vec<Target> = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", idx + 1))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            targets.push(Target::parse(line, mode)?);
        }

        Ok(Target::Multi { targets }.to_host_set("<line source>")?)
    }

    pub fn from_file(path: &Path, mode: ParseMode) -> anyhow::Result<HostSet> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open target list {}", path.display()))?;
        Self::from_lines(BufReader::new(file), mode)
            .with_context(|| format!("Failed to load targets from {}", path.display()))
    }
}

/// Collects addresses, keeping the first occurrence of each.
impl FromIterator<IpAddr> for HostSet {
    fn from_iter<I: IntoIterator<Item = IpAddr>>(iter: I) -> Self {
        let mut seen: HashSet<IpAddr> = HashSet::new();
        let hosts: Vec<IpAddr> = iter.into_iter().filter(|addr| seen.insert(*addr)).collect();
        Self { hosts }
    }
}

/// Represents a parsed, not yet expanded, address specification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// A single host.
    Host { target_addr: IpAddr },
    /// A CIDR block; expansion strips the network and broadcast addresses.
    Block { ipv4_range: Ipv4Range },
    /// A last-octet range; every address is kept.
    Range { ipv4_range: Ipv4Range },
    /// Holds a list of different targets.
    Multi { targets: Vec<Target> },
}

impl FromStr for Target {
    type Err = SpecError;

    /// Parses in [`ParseMode::Strict`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::parse(s, ParseMode::Strict)
    }
}

impl Target {
    /// Parses a specification. In lenient mode invalid elements are dropped.
    pub fn parse(s: &str, mode: ParseMode) -> Result<Target, SpecError> {
        let s = s.trim();

        if !s.contains(',') {
            return match parse_single(s) {
                Err(e) if droppable(&e, mode) => {
                    debug!("Dropping target '{s}': {e}");
                    Ok(Target::Multi { targets: Vec::new() })
                }
                other => other,
            };
        }

        let mut targets = Vec::new();
        for part in s.split(',').map(str::trim) {
            if part.is_empty() {
                match mode {
                    ParseMode::Strict => return Err(SpecError::InvalidAddress(s.to_string())),
                    ParseMode::Lenient => continue,
                }
            }
            match parse_single(part) {
                Ok(target) => targets.push(target),
                Err(e) if droppable(&e, mode) => debug!("Dropping target '{part}': {e}"),
                Err(e) => return Err(e),
            }
        }

        Ok(Target::Multi { targets })
    }

    /// Number of addresses this target expands to, duplicates included.
    pub fn len(&self) -> u64 {
        match self {
            Target::Host { .. } => 1,
            Target::Block { ipv4_range } => {
                let len = ipv4_range.len();
                if len > 2 { len - 2 } else { len }
            }
            Target::Range { ipv4_range } => ipv4_range.len(),
            Target::Multi { targets } => targets.iter().map(Target::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expands into a [`HostSet`]. `spec` names the source in diagnostics.
    pub fn to_host_set(&self, spec: &str) -> Result<HostSet, SpecError> {
        let count = self.len();
        if count > MAX_HOSTS as u64 {
            return Err(SpecError::TooManyHosts {
                spec: spec.to_string(),
                count,
                limit: MAX_HOSTS,
            });
        }

        let mut addrs: Vec<IpAddr> = Vec::with_capacity(count as usize);
        self.collect_into(&mut addrs);
        let hosts: HostSet = addrs.into_iter().collect();

        if hosts.is_empty() {
            return Err(SpecError::NoTargets(spec.to_string()));
        }

        let len: usize = hosts.len();
        let unit: &str = if len == 1 { "IP address has been" } else { "IP addresses have been" };
        success!("{len} {unit} parsed successfully");

        Ok(hosts)
    }

    fn collect_into(&self, addrs: &mut Vec<IpAddr>) {
        match self {
            Target::Host { target_addr } => addrs.push(*target_addr),
            Target::Block { ipv4_range } => addrs.extend(ipv4_range.usable_hosts()),
            Target::Range { ipv4_range } => addrs.extend(ipv4_range.to_iter()),
            Target::Multi { targets } => {
                for target in targets {
                    target.collect_into(addrs);
                }
            }
        }
    }
}

/// Parses and expands an address specification in one step.
///
/// Fails with [`SpecError::NoTargets`] when nothing valid remains.
pub fn expand(spec: &str, mode: ParseMode) -> Result<HostSet, SpecError> {
    Target::parse(spec, mode)?.to_host_set(spec.trim())
}

fn droppable(e: &SpecError, mode: ParseMode) -> bool {
    mode == ParseMode::Lenient && e.is_droppable()
}

/// Single literal first, then CIDR, then last-octet range.
fn parse_single(s: &str) -> Result<Target, SpecError> {
    if let Ok(target_addr) = s.parse::<IpAddr>() {
        return Ok(Target::Host { target_addr });
    }

    if s.contains('/') {
        return parse_cidr(s);
    }

    if s.contains('-') {
        return parse_octet_range(s);
    }

    Err(SpecError::InvalidAddress(s.to_string()))
}

/// Parses CIDR notation like "192.168.1.0/24".
fn parse_cidr(s: &str) -> Result<Target, SpecError> {
    let network: IpNetwork = s
        .parse()
        .map_err(|_| SpecError::InvalidAddress(s.to_string()))?;

    match network {
        IpNetwork::V4(net) => {
            let ipv4_range = range::cidr_range(net.ip(), net.prefix())
                .map_err(|_| SpecError::InvalidAddress(s.to_string()))?;
            Ok(Target::Block { ipv4_range })
        }
        IpNetwork::V6(_) => Err(SpecError::UnsupportedAddress {
            spec: s.to_string(),
            reason: "IPv6 blocks cannot be enumerated",
        }),
    }
}

/// Parses ranges like "192.168.1.10-20": the left literal supplies the prefix
/// and the start octet, the right side is the inclusive end octet.
fn parse_octet_range(s: &str) -> Result<Target, SpecError> {
    let invalid = || SpecError::InvalidAddress(s.to_string());

    let (start_str, end_str) = s.split_once('-').ok_or_else(invalid)?;
    let start_addr: Ipv4Addr = start_str.trim().parse().map_err(|_| invalid())?;

    let end_str = end_str.trim();
    if end_str.is_empty() || !end_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let end_octet: u8 = end_str.parse().map_err(|_| invalid())?;

    let [a, b, c, start_octet] = start_addr.octets();
    if start_octet > end_octet {
        return Err(SpecError::EmptyRange(s.to_string()));
    }

    let ipv4_range = Ipv4Range::new(start_addr, Ipv4Addr::new(a, b, c, end_octet));
    Ok(Target::Range { ipv4_range })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::net::Ipv6Addr;

    fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    fn lenient(spec: &str) -> Result<HostSet, SpecError> {
        expand(spec, ParseMode::Lenient)
    }

    #[test]
    fn single_literal() {
        assert_eq!(lenient("127.0.0.1").unwrap().as_slice(), &[v4(127, 0, 0, 1)]);
        assert_eq!(
            lenient("::1").unwrap().as_slice(),
            &[IpAddr::V6(Ipv6Addr::LOCALHOST)]
        );
    }

    #[test]
    fn cidr_strips_network_and_broadcast() {
        let hosts = lenient("10.0.0.0/30").unwrap();
        assert_eq!(hosts.as_slice(), &[v4(10, 0, 0, 1), v4(10, 0, 0, 2)]);

        let hosts = lenient("192.168.7.77/24").unwrap();
        assert_eq!(hosts.len(), 254);
        assert_eq!(hosts.as_slice()[0], v4(192, 168, 7, 1));
        assert_eq!(hosts.as_slice()[253], v4(192, 168, 7, 254));
    }

    #[test]
    fn cidr_cardinality() {
        for prefix in 20..=30u32 {
            let hosts = lenient(&format!("172.16.0.0/{prefix}")).unwrap();
            assert_eq!(hosts.len(), (1usize << (32 - prefix)) - 2);
        }
    }

    #[test]
    fn tiny_cidr_blocks_keep_every_address() {
        assert_eq!(
            lenient("10.0.0.0/31").unwrap().as_slice(),
            &[v4(10, 0, 0, 0), v4(10, 0, 0, 1)]
        );
        assert_eq!(lenient("10.0.0.9/32").unwrap().as_slice(), &[v4(10, 0, 0, 9)]);
    }

    #[test]
    fn octet_range_starts_at_left_literal() {
        let hosts = lenient("10.1.1.3-6").unwrap();
        assert_eq!(
            hosts.as_slice(),
            &[v4(10, 1, 1, 3), v4(10, 1, 1, 4), v4(10, 1, 1, 5), v4(10, 1, 1, 6)]
        );
    }

    #[test]
    fn reversed_octet_range() {
        assert_eq!(
            expand("10.1.1.9-3", ParseMode::Strict),
            Err(SpecError::EmptyRange("10.1.1.9-3".to_string()))
        );
        assert_eq!(
            lenient("10.1.1.9-3"),
            Err(SpecError::NoTargets("10.1.1.9-3".to_string()))
        );
    }

    #[test]
    fn octet_range_rejects_bad_bounds() {
        for spec in ["10.1.1.1-256", "10.1.1.1-", "10.1.1-5", "10.1.1.1-10.1.1.9"] {
            assert!(expand(spec, ParseMode::Strict).is_err(), "'{spec}' should fail");
        }
    }

    #[test]
    fn list_keeps_valid_elements_in_order() {
        let hosts = lenient("10.0.0.3, bogus,10.0.0.1,10.0.0.3").unwrap();
        assert_eq!(hosts.as_slice(), &[v4(10, 0, 0, 3), v4(10, 0, 0, 1)]);
    }

    #[test]
    fn list_elements_may_be_ranges_and_blocks() {
        let hosts = lenient("10.0.0.1,10.0.1.0/30,10.0.2.5-6").unwrap();
        assert_eq!(
            hosts.as_slice(),
            &[
                v4(10, 0, 0, 1),
                v4(10, 0, 1, 1),
                v4(10, 0, 1, 2),
                v4(10, 0, 2, 5),
                v4(10, 0, 2, 6),
            ]
        );
    }

    #[test]
    fn strict_mode_rejects_invalid_elements() {
        assert_eq!(
            expand("10.0.0.1,10.0.0.999", ParseMode::Strict),
            Err(SpecError::InvalidAddress("10.0.0.999".to_string()))
        );
    }

    #[test]
    fn empty_list_elements() {
        for spec in ["10.0.0.1,,10.0.0.2", "10.0.0.1,", ",10.0.0.2"] {
            assert_eq!(
                expand(spec, ParseMode::Strict),
                Err(SpecError::InvalidAddress(spec.to_string())),
                "'{spec}' should fail in strict mode"
            );
        }
        assert_eq!(
            lenient("10.0.0.1,,10.0.0.2").unwrap().as_slice(),
            &[v4(10, 0, 0, 1), v4(10, 0, 0, 2)]
        );
    }

    #[test]
    fn nothing_valid_means_no_targets() {
        assert_eq!(
            lenient("not-an-ip"),
            Err(SpecError::NoTargets("not-an-ip".to_string()))
        );
        assert!(matches!(lenient(""), Err(SpecError::NoTargets(_))));
    }

    #[test]
    fn ipv6_blocks_are_unsupported() {
        assert!(matches!(
            expand("fe80::/64", ParseMode::Strict),
            Err(SpecError::UnsupportedAddress { .. })
        ));
    }

    #[test]
    fn oversized_blocks_are_refused() {
        assert!(matches!(
            lenient("10.0.0.0/4"),
            Err(SpecError::TooManyHosts { .. })
        ));
    }

    #[test]
    fn target_from_str_is_strict() {
        assert!(matches!("10.0.0.0/24".parse::<Target>(), Ok(Target::Block { .. })));
        assert!(matches!("10.0.0.1-9".parse::<Target>(), Ok(Target::Range { .. })));
        assert!("10.0.0.0/33".parse::<Target>().is_err());
    }

    #[test]
    fn line_source() {
        let input = "# lab hosts\n10.0.0.1\n\n  10.0.0.2  \nnonsense\n10.0.0.1\n";
        let hosts = HostSet::from_lines(Cursor::new(input), ParseMode::Lenient).unwrap();
        assert_eq!(hosts.as_slice(), &[v4(10, 0, 0, 1), v4(10, 0, 0, 2)]);

        assert!(HostSet::from_lines(Cursor::new(input), ParseMode::Strict).is_err());
        assert!(HostSet::from_lines(Cursor::new("\n# empty\n"), ParseMode::Lenient).is_err());
    }

    #[test]
    fn file_source() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "192.168.50.1").unwrap();
        writeln!(file, "192.168.50.2").unwrap();

        let hosts = HostSet::from_file(file.path(), ParseMode::Strict).unwrap();
        assert_eq!(hosts.len(), 2);
        assert!(HostSet::from_file(Path::new("/definitely/missing"), ParseMode::Lenient).is_err());
    }
}
