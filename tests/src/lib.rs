//! End-to-end checks of the scanning pipeline against loopback listeners.

#[cfg(test)]
mod scan;
#[cfg(test)]
mod util;
