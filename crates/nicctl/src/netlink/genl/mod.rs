//! Generic Netlink (GENL) support.
//!
//! Generic Netlink families get their message type (family id) assigned
//! at run time. The control family resolves a name into a [`FamilyInfo`]
//! that also lists the family's multicast groups and the command ids the
//! running kernel implements, which is what capability negotiation keys on.

mod family;
mod header;

pub mod ethtool;

pub use family::{FamilyInfo, resolve_family};
pub use header::{GENL_HDRLEN, GenlMsgHdr};

/// Control family id (fixed, not dynamically assigned).
pub const GENL_ID_CTRL: u16 = 0x10;

/// Control family commands
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlCmd {
    Unspec = 0,
    NewFamily = 1,
    DelFamily = 2,
    GetFamily = 3,
}

/// Control family attributes
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlAttr {
    Unspec = 0,
    FamilyId = 1,
    FamilyName = 2,
    Version = 3,
    HdrSize = 4,
    MaxAttr = 5,
    Ops = 6,
    McastGroups = 7,
}

/// Attributes of one entry in `CTRL_ATTR_OPS`
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlAttrOp {
    Unspec = 0,
    Id = 1,
    Flags = 2,
}

/// Control family multicast group attributes
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlAttrMcastGrp {
    Unspec = 0,
    Name = 1,
    Id = 2,
}
