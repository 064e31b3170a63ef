//! # IPv4 Range Model
//!
//! Continuous, inclusive ranges of IPv4 addresses, used to enumerate CIDR blocks
//! and last-octet ranges such as `192.168.1.10-20`.

use std::net::{IpAddr, Ipv4Addr};

use pnet::ipnetwork::Ipv4Network;

/// An inclusive range of IPv4 addresses. A range whose start lies after its end is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    /// Number of addresses covered.
    pub fn len(&self) -> u64 {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        if start > end {
            0
        } else {
            u64::from(end - start) + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Ipv4Addr> + Clone {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        (start..=end).map(Ipv4Addr::from)
    }

    pub fn to_iter(&self) -> impl Iterator<Item = IpAddr> {
        self.iter().map(IpAddr::V4)
    }

    /// Addresses usable as hosts: the first (network) and last (broadcast)
    /// addresses are left out whenever the range holds more than two.
    pub fn usable_hosts(&self) -> impl Iterator<Item = IpAddr> {
        let mut iter = self.iter();
        if self.len() > 2 {
            iter.next();
            iter.next_back();
        }
        iter.map(IpAddr::V4)
    }
}

/// Creates the range covering the whole network block of `ip/prefix`.
pub fn cidr_range(ip: Ipv4Addr, prefix: u8) -> anyhow::Result<Ipv4Range> {
    let network = Ipv4Network::new(ip, prefix)?;
    Ok(Ipv4Range::new(network.network(), network.broadcast()))
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

    #[test]
    fn test_ipv4range_iter() {
        let range = Ipv4Range::new(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 3));

        let mut iter = range.iter();
        assert_eq!(iter.next(), Some(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(iter.next(), Some(Ipv4Addr::new(10, 0, 0, 2)));
        assert_eq!(iter.next(), Some(Ipv4Addr::new(10, 0, 0, 3)));
        assert_eq!(iter.next(), None);
        assert_eq!(range.len(), 3);
    }

    #[test]
    fn test_ipv4range_empty() {
        // Start > End
        let range = Ipv4Range::new(Ipv4Addr::new(10, 0, 0, 5), Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(range.iter().count(), 0);
        assert_eq!(range.len(), 0);
        assert!(range.is_empty());
        assert_eq!(range.usable_hosts().count(), 0);
    }

    #[test]
    fn test_ipv4range_carries_into_higher_octets() {
        let range = Ipv4Range::new(Ipv4Addr::new(10, 0, 0, 254), Ipv4Addr::new(10, 0, 1, 1));
        let addrs: Vec<Ipv4Addr> = range.iter().collect();
        assert_eq!(
            addrs,
            vec![
                Ipv4Addr::new(10, 0, 0, 254),
                Ipv4Addr::new(10, 0, 0, 255),
                Ipv4Addr::new(10, 0, 1, 0),
                Ipv4Addr::new(10, 0, 1, 1),
            ]
        );
    }

    #[test]
    fn test_cidr_range() {
        let range = cidr_range(Ipv4Addr::new(192, 168, 1, 100), 24).unwrap();
        assert_eq!(range.start_addr, Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(range.end_addr, Ipv4Addr::new(192, 168, 1, 255));
    }

    #[test]
    fn test_cidr_range_32_prefix() {
        let ip = Ipv4Addr::new(172, 16, 0, 1);
        let range = cidr_range(ip, 32).unwrap();
        assert_eq!(range.start_addr, ip);
        assert_eq!(range.end_addr, ip);
    }

    #[test]
    fn test_cidr_range_invalid_prefix() {
        assert!(cidr_range(Ipv4Addr::new(192, 168, 1, 1), 33).is_err());
    }

    #[test]
    fn test_usable_hosts_strip_network_and_broadcast() {
        for prefix in 16..=30u8 {
            let range = cidr_range(Ipv4Addr::new(10, 1, 0, 0), prefix).unwrap();
            let hosts: Vec<IpAddr> = range.usable_hosts().collect();
            assert_eq!(hosts.len() as u64, (1u64 << (32 - prefix)) - 2);
            assert!(!hosts.contains(&IpAddr::V4(range.start_addr)));
            assert!(!hosts.contains(&IpAddr::V4(range.end_addr)));
        }
    }

    #[test]
    fn test_usable_hosts_keep_tiny_blocks() {
        let slash31 = cidr_range(Ipv4Addr::new(10, 0, 0, 0), 31).unwrap();
        assert_eq!(slash31.usable_hosts().count(), 2);

        let slash32 = cidr_range(Ipv4Addr::new(10, 0, 0, 7), 32).unwrap();
        assert_eq!(slash32.usable_hosts().count(), 1);
    }
}
