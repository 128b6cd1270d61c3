//! Shared utilities for nicctl.

pub mod addr;
pub mod ifname;

pub use addr::{format_mac, parse_mac};
