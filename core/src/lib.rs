//! # Sweepr Core
//!
//! The probing engine. Given expanded targets and ports it
//! 1. optionally filters the hosts through the [`liveness`] prober,
//! 2. runs bounded-concurrency TCP connects through the [`scanner`],
//! 3. hands open ports to a [`fingerprint`] engine and flattens everything in [`aggregate`],
//! 4. persists the flattened rows through [`export`].
//!
//! Network access sits behind the [`network::tcp::Connector`] and
//! [`network::icmp::Pinger`] traits so the stages can run against fakes.

pub mod aggregate;
pub mod export;
pub mod fingerprint;
pub mod liveness;
pub mod network;
pub mod scanner;
