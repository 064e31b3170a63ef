//! # Sweepr Common
//!
//! Shared data model for the sweeper: target and port specifications, their
//! expanded forms, runtime configuration and the error types reported before
//! any probe leaves the machine.
//!
//! Nothing in this crate performs network I/O.

pub mod config;
pub mod error;
pub mod logging;
pub mod network;
