//! NIC configuration over the kernel's ethtool interfaces.
//!
//! Requests reach the driver either through the generic netlink `ethtool`
//! family or through the older `SIOCETHTOOL` ioctl. The crate parses
//! command-line options into typed request records, picks a transport
//! per command and decodes the replies into [`types`].
//!
//! # Modules
//!
//! - [`params`] - option tables and request records
//! - [`command`] - the static verb table
//! - [`negotiate`] - per-device transport selection
//! - [`netlink`] - generic netlink framing and the `ethtool` family
//! - [`ioctl`] - legacy records and the control socket
//! - [`types`] - decoded device state, serializable for JSON output
//!
//! # Example
//!
//! ```rust,no_run
//! use nicctl::command;
//! use nicctl::negotiate::DeviceHandle;
//! use nicctl::params::{parse_options, records::PauseRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tokens: Vec<String> = ["rx", "on"].iter().map(|s| s.to_string()).collect();
//! let mut req = PauseRequest::default();
//! parse_options(&tokens, &PauseRequest::options(), &mut req)?;
//!
//! let handle = DeviceHandle::open(Some("eth0"), false).await?;
//! let desc = command::lookup("-A").unwrap();
//! handle.route(desc)?.set_pause(&req).await?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod error;
pub mod ioctl;
pub mod negotiate;
pub mod netlink;
pub mod params;
pub mod types;
pub mod util;

pub use error::{Error, Result};
