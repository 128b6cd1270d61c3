//! Exit statuses and the failure type command handlers return.

use nicctl::Error;
use nicctl::ioctl::ops::ChangeError;
use nicctl::params::ParseError;

pub const USAGE: i32 = 1;
pub const SOCKET: i32 = 70;
pub const GET: i32 = 71;
pub const SET: i32 = 72;
pub const WOL_GET: i32 = 73;
pub const WOL_SET: i32 = 74;
pub const NO_DATA: i32 = 75;
pub const MSGLVL_GET: i32 = 76;
pub const MSGLVL_SET: i32 = 77;
pub const PAUSE_GET: i32 = 78;
pub const PAUSE_SET: i32 = 79;
pub const RING_GET: i32 = 80;
pub const RING_SET: i32 = 81;
pub const COALESCE_GET: i32 = 82;
pub const FEC_SET: i32 = 83;
pub const COALESCE_SET: i32 = 84;
pub const FEC_GET: i32 = 85;
pub const CHANNELS_GET: i32 = 86;
pub const CHANNELS_SET: i32 = 87;
pub const FEATURES_GET: i32 = 88;
pub const FEATURES_SET: i32 = 89;
pub const NWAY: i32 = 90;
pub const IDENTIFY: i32 = 91;
pub const REGDUMP: i32 = 92;
pub const EEPROM_DUMP: i32 = 93;
pub const EEPROM_CHANGE: i32 = 94;
pub const TEST: i32 = 95;
pub const STATS: i32 = 96;
pub const NFC_GET: i32 = 97;
pub const NFC_SET: i32 = 98;
pub const FLASH: i32 = 99;
pub const PERMADDR: i32 = 100;
pub const MONITOR: i32 = 101;
pub const ALLOC: i32 = 102;

/// A command that did not complete.
#[derive(Debug)]
pub struct Failure {
    pub code: i32,
    pub message: String,
}

impl Failure {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(err: &ParseError) -> Self {
        Self::new(USAGE, format!("ethtool: {err}"))
    }

    /// A transport error while doing `what`. Allocation failures keep
    /// their own status whatever the command.
    pub fn from_error(code: i32, what: &str, err: &Error) -> Self {
        let code = if matches!(err, Error::Alloc { .. }) {
            ALLOC
        } else {
            code
        };
        Self::new(code, format!("{what}: {}", describe(err)))
    }

    /// A read-modify-write failure: `get` if the read failed, `set` if
    /// the write did.
    pub fn from_change(get: i32, set: i32, what: &str, err: &ChangeError) -> Self {
        match err {
            ChangeError::Read(e) => Self::from_error(get, &format!("Cannot get current {what}"), e),
            ChangeError::Write(e) => Self::from_error(set, &format!("Cannot update new {what}"), e),
        }
    }
}

/// Map an error to a failure with `code` and a `what` prefix.
pub fn fail(code: i32, what: &'static str) -> impl Fn(Error) -> Failure {
    move |err| Failure::from_error(code, what, &err)
}

/// The OS message for kernel errors, the full error otherwise.
fn describe(err: &Error) -> String {
    match err.errno() {
        Some(errno) => std::io::Error::from_raw_os_error(errno).to_string(),
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_overrides_code() {
        let err = Error::Alloc {
            what: "ETHTOOL_GREGS",
            requested: 1 << 30,
        };
        let f = Failure::from_error(REGDUMP, "Cannot get register dump", &err);
        assert_eq!(f.code, ALLOC);
    }

    #[test]
    fn change_errors_pick_direction() {
        let read = ChangeError::Read(Error::from_errno(-libc::EOPNOTSUPP));
        let write = ChangeError::Write(Error::from_errno(-libc::EINVAL));
        assert_eq!(Failure::from_change(RING_GET, RING_SET, "ring parameters", &read).code, RING_GET);
        let f = Failure::from_change(RING_GET, RING_SET, "ring parameters", &write);
        assert_eq!(f.code, RING_SET);
        assert!(f.message.starts_with("Cannot update new ring parameters: "));
    }

    #[test]
    fn kernel_errors_use_os_text() {
        let f = Failure::from_error(GET, "Cannot get driver information", &Error::from_errno(-libc::ENODEV));
        assert_eq!(f.message, "Cannot get driver information: No such device (os error 19)");
    }
}
