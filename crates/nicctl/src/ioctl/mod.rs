//! Legacy `SIOCETHTOOL` transport.
//!
//! Every request is one `ioctl(fd, SIOCETHTOOL, &ifreq)` on a datagram
//! socket, with `ifreq.ifr_data` pointing at an encoded record from
//! [`wire`]. Calls are plain blocking syscalls.
//!
//! # Example
//!
//! ```rust,no_run
//! use nicctl::ioctl::IoctlSocket;
//!
//! # fn example() -> nicctl::Result<()> {
//! let sock = IoctlSocket::open("eth0")?;
//! let info = sock.get_driver_info()?;
//! println!("driver: {}", info.driver);
//! # Ok(())
//! # }
//! ```

pub mod ops;
pub mod sized;
pub mod wire;

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use crate::error::{Error, Result};
use crate::util::ifname::{IFNAMSIZ, to_ifr_name};
use wire::LegacyRecord;

/// `SIOCETHTOOL` from `<linux/sockios.h>`.
pub const SIOCETHTOOL: libc::c_ulong = 0x8946;

/// Pre-2.4 value of `SIOCETHTOOL`: `SIOCDEVPRIVATE + 0x0f`.
pub const SIOCETHTOOL_22: libc::c_ulong = 0x89f0 + 0x0f;

/// One legacy operation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyOp {
    /// Kernel name, used in error messages.
    pub name: &'static str,
    pub cmd: u32,
    /// Whether the operation changes device state.
    pub write: bool,
}

macro_rules! legacy_ops {
    ($($(#[$doc:meta])* $name:ident = $code:literal, $write:literal;)*) => {
        $(
            $(#[$doc])*
            pub const $name: LegacyOp = LegacyOp {
                name: concat!("ETHTOOL_", stringify!($name)),
                cmd: $code,
                write: $write,
            };
        )*
    };
}

/// Operation codes from `<linux/ethtool.h>`.
pub mod op {
    use super::LegacyOp;

    legacy_ops! {
        GSET = 0x01, false;
        SSET = 0x02, true;
        GDRVINFO = 0x03, false;
        GREGS = 0x04, false;
        GWOL = 0x05, false;
        SWOL = 0x06, true;
        GMSGLVL = 0x07, false;
        SMSGLVL = 0x08, true;
        NWAY_RST = 0x09, true;
        GLINK = 0x0a, false;
        GEEPROM = 0x0b, false;
        SEEPROM = 0x0c, true;
        GCOALESCE = 0x0e, false;
        SCOALESCE = 0x0f, true;
        GRINGPARAM = 0x10, false;
        SRINGPARAM = 0x11, true;
        GPAUSEPARAM = 0x12, false;
        SPAUSEPARAM = 0x13, true;
        GRXCSUM = 0x14, false;
        SRXCSUM = 0x15, true;
        GTXCSUM = 0x16, false;
        STXCSUM = 0x17, true;
        GSG = 0x18, false;
        SSG = 0x19, true;
        /// Run the self-test. Writes because offline tests take the link down.
        TEST = 0x1a, true;
        GSTRINGS = 0x1b, false;
        /// Blink the port LED.
        PHYS_ID = 0x1c, true;
        GSTATS = 0x1d, false;
        GTSO = 0x1e, false;
        STSO = 0x1f, true;
        GPERMADDR = 0x20, false;
        GUFO = 0x21, false;
        SUFO = 0x22, true;
        GGSO = 0x23, false;
        SGSO = 0x24, true;
        GFLAGS = 0x25, false;
        SFLAGS = 0x26, true;
        GRXFH = 0x29, false;
        SRXFH = 0x2a, true;
        GGRO = 0x2b, false;
        SGRO = 0x2c, true;
        GRXRINGS = 0x2d, false;
        GRXCLSRLCNT = 0x2e, false;
        GRXCLSRULE = 0x2f, false;
        GRXCLSRLALL = 0x30, false;
        SRXCLSRLDEL = 0x31, true;
        SRXCLSRLINS = 0x32, true;
        FLASHDEV = 0x33, true;
        GSSET_INFO = 0x37, false;
        GCHANNELS = 0x3c, false;
        SCHANNELS = 0x3d, true;
        GFECPARAM = 0x50, false;
        SFECPARAM = 0x51, true;
    }
}

/// A control socket bound to one interface name.
///
/// The file descriptor is closed when the socket is dropped.
#[derive(Debug)]
pub struct IoctlSocket {
    fd: OwnedFd,
    ifname: String,
    ifr_name: [libc::c_char; IFNAMSIZ],
}

impl IoctlSocket {
    /// Open an `AF_INET` datagram socket for requests about `ifname`.
    pub fn open(ifname: &str) -> Result<Self> {
        let ifr_name = to_ifr_name(ifname).map_err(|_| Error::InterfaceNotFound {
            name: ifname.to_string(),
        })?;

        let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_DGRAM | libc::SOCK_CLOEXEC, 0) };
        if fd < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }
        // SAFETY: `fd` was just returned by socket(2) and is owned by nobody else.
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };

        tracing::trace!(ifname, "opened control socket");
        Ok(Self {
            fd,
            ifname: ifname.to_string(),
            ifr_name,
        })
    }

    /// Interface the socket talks about.
    pub fn ifname(&self) -> &str {
        &self.ifname
    }

    /// Issue `SIOCETHTOOL` with `buf` as `ifr_data`.
    ///
    /// The kernel reads the request from `buf` and writes the reply back
    /// into it.
    pub fn request(&self, op: LegacyOp, buf: &mut [u8]) -> Result<()> {
        self.raw_request(SIOCETHTOOL, op, buf)
    }

    /// Issue the pre-2.4 `SIOCETHTOOL_22` request.
    pub(crate) fn request_compat(&self, op: LegacyOp, buf: &mut [u8]) -> Result<()> {
        self.raw_request(SIOCETHTOOL_22, op, buf)
    }

    fn raw_request(&self, request: libc::c_ulong, op: LegacyOp, buf: &mut [u8]) -> Result<()> {
        let mut ifr: libc::ifreq = unsafe { std::mem::zeroed() };
        ifr.ifr_name = self.ifr_name;
        ifr.ifr_ifru.ifru_data = buf.as_mut_ptr() as *mut libc::c_char;

        tracing::trace!(op = op.name, len = buf.len(), ifname = %self.ifname, "ioctl");
        let ret = unsafe { libc::ioctl(self.fd.as_raw_fd(), request as _, &mut ifr) };
        if ret < 0 {
            return Err(Error::ioctl(op.name, io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Fetch a record: encode its default with `op`, send, decode the reply.
    pub fn get<R: LegacyRecord + Default>(&self, op: LegacyOp) -> Result<R> {
        self.exchange(op, &R::default())
    }

    /// Send `record` with `op` and decode what the kernel wrote back.
    pub fn exchange<R: LegacyRecord>(&self, op: LegacyOp, record: &R) -> Result<R> {
        let mut buf = record.to_bytes(op.cmd);
        self.request(op, &mut buf)?;
        R::decode(&buf)
    }

    /// Write a record.
    pub fn set<R: LegacyRecord>(&self, op: LegacyOp, record: &R) -> Result<()> {
        let mut buf = record.to_bytes(op.cmd);
        self.request(op, &mut buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_names_and_directions() {
        assert_eq!(op::GSET.name, "ETHTOOL_GSET");
        assert_eq!(op::GSSET_INFO.name, "ETHTOOL_GSSET_INFO");
        assert_eq!(op::SFECPARAM.cmd, 0x51);
        assert!(!op::GRXCLSRLALL.write);
        assert!(op::NWAY_RST.write);
    }

    #[test]
    fn compat_request_code() {
        assert_eq!(SIOCETHTOOL_22, 0x89ff);
    }

    #[test]
    fn open_rejects_bad_names() {
        let err = IoctlSocket::open("this-name-is-too-long").unwrap_err();
        assert!(err.is_not_found());
    }
}
