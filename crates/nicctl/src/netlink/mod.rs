//! Generic netlink transport for the `ethtool` family.
//!
//! The kernel's ethtool netlink interface carries most device settings
//! as one GET/SET message pair per parameter family. This module holds
//! the framing (`attr`, `builder`, `message`), the async socket, family
//! resolution and the typed `Connection<Ethtool>` with its requests.
//!
//! # Example
//!
//! ```rust,no_run
//! use nicctl::netlink::{Connection, Ethtool};
//!
//! # async fn example() -> nicctl::Result<()> {
//! let conn = Connection::<Ethtool>::new_async().await?;
//! let pause = conn.get_pause("eth0").await?;
//! println!("rx pause: {:?}", pause.rx);
//! # Ok(())
//! # }
//! ```

pub mod attr;
pub mod builder;
pub mod connection;
pub mod genl;
pub mod message;
pub mod protocol;
pub mod socket;

pub use connection::Connection;
pub use genl::ethtool::{EthtoolCmd, EthtoolEvent, EthtoolEvents, EventKind, StringSetId};
pub use protocol::{Ethtool, ProtocolState};
