//! Ethtool configuration via Generic Netlink.
//!
//! The kernel's ethtool netlink interface (Linux 5.6+) exposes one
//! GET/SET message pair per parameter family. Every request starts with
//! a nested header naming the device; the remaining attributes are
//! family specific. Named flag sets (link modes, message classes, WoL
//! modes, features, FEC encodings) travel as bitsets whose bit names come
//! from kernel string sets.
//!
//! # Example
//!
//! ```rust,no_run
//! use nicctl::netlink::{Connection, Ethtool};
//!
//! # async fn example() -> nicctl::Result<()> {
//! let conn = Connection::<Ethtool>::new_async().await?;
//!
//! let rings = conn.get_rings("eth0").await?;
//! println!("RX ring: {:?}", rings.rx);
//! # Ok(())
//! # }
//! ```

mod bitset;
mod connection;
mod monitor;
mod strset;

pub use bitset::{BitsetForm, EthtoolBitset};
pub use monitor::{EthtoolEvent, EthtoolEvents, EventKind};
pub use strset::StringSet;

/// Ethtool Generic Netlink family name.
pub const ETHTOOL_GENL_NAME: &str = "ethtool";

/// Ethtool Generic Netlink version.
pub const ETHTOOL_GENL_VERSION: u8 = 1;

/// Ethtool multicast group for monitoring.
pub const ETHTOOL_MCGRP_MONITOR: &str = "monitor";

/// Nested header attribute number, the same for every message.
pub const ETHTOOL_A_HEADER: u16 = 1;

// =============================================================================
// Commands
// =============================================================================

/// Ethtool netlink requests (userspace to kernel).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EthtoolCmd {
    StrsetGet = 1,
    LinkinfoGet = 2,
    LinkinfoSet = 3,
    LinkmodesGet = 4,
    LinkmodesSet = 5,
    LinkstateGet = 6,
    DebugGet = 7,
    DebugSet = 8,
    WolGet = 9,
    WolSet = 10,
    FeaturesGet = 11,
    FeaturesSet = 12,
    PrivflagsGet = 13,
    PrivflagsSet = 14,
    RingsGet = 15,
    RingsSet = 16,
    ChannelsGet = 17,
    ChannelsSet = 18,
    CoalesceGet = 19,
    CoalesceSet = 20,
    PauseGet = 21,
    PauseSet = 22,
    EeeGet = 23,
    EeeSet = 24,
    TsinfoGet = 25,
    FecGet = 29,
    FecSet = 30,
}

impl EthtoolCmd {
    /// Whether this request only reads device state.
    pub fn is_get(self) -> bool {
        matches!(
            self,
            Self::StrsetGet
                | Self::LinkinfoGet
                | Self::LinkmodesGet
                | Self::LinkstateGet
                | Self::DebugGet
                | Self::WolGet
                | Self::FeaturesGet
                | Self::PrivflagsGet
                | Self::RingsGet
                | Self::ChannelsGet
                | Self::CoalesceGet
                | Self::PauseGet
                | Self::EeeGet
                | Self::TsinfoGet
                | Self::FecGet
        )
    }
}

/// Ethtool netlink replies and notifications (kernel to userspace).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthtoolMsg {
    StrsetGetReply = 1,
    LinkinfoGetReply = 2,
    LinkinfoNtf = 3,
    LinkmodesGetReply = 4,
    LinkmodesNtf = 5,
    LinkstateGetReply = 6,
    DebugGetReply = 7,
    DebugNtf = 8,
    WolGetReply = 9,
    WolNtf = 10,
    FeaturesGetReply = 11,
    FeaturesSetReply = 12,
    FeaturesNtf = 13,
    PrivflagsGetReply = 14,
    PrivflagsNtf = 15,
    RingsGetReply = 16,
    RingsNtf = 17,
    ChannelsGetReply = 18,
    ChannelsNtf = 19,
    CoalesceGetReply = 20,
    CoalesceNtf = 21,
    PauseGetReply = 22,
    PauseNtf = 23,
    EeeGetReply = 24,
    EeeNtf = 25,
    TsinfoGetReply = 26,
    FecGetReply = 30,
    FecNtf = 31,
}

impl EthtoolMsg {
    /// Map a genl command byte from the kernel.
    pub fn from_u8(v: u8) -> Option<Self> {
        use EthtoolMsg::*;
        Some(match v {
            1 => StrsetGetReply,
            2 => LinkinfoGetReply,
            3 => LinkinfoNtf,
            4 => LinkmodesGetReply,
            5 => LinkmodesNtf,
            6 => LinkstateGetReply,
            7 => DebugGetReply,
            8 => DebugNtf,
            9 => WolGetReply,
            10 => WolNtf,
            11 => FeaturesGetReply,
            12 => FeaturesSetReply,
            13 => FeaturesNtf,
            14 => PrivflagsGetReply,
            15 => PrivflagsNtf,
            16 => RingsGetReply,
            17 => RingsNtf,
            18 => ChannelsGetReply,
            19 => ChannelsNtf,
            20 => CoalesceGetReply,
            21 => CoalesceNtf,
            22 => PauseGetReply,
            23 => PauseNtf,
            24 => EeeGetReply,
            25 => EeeNtf,
            26 => TsinfoGetReply,
            30 => FecGetReply,
            31 => FecNtf,
            _ => return None,
        })
    }
}

// =============================================================================
// Header and bitsets
// =============================================================================

/// Request/reply header attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthtoolHeaderAttr {
    Unspec = 0,
    DevIndex = 1,
    DevName = 2,
    Flags = 3,
}

/// Header flags.
pub mod header_flags {
    /// Request compact bitsets in the reply.
    pub const COMPACT_BITSETS: u32 = 1 << 0;
    /// Suppress the reply to a SET request.
    pub const OMIT_REPLY: u32 = 1 << 1;
    /// Include statistics.
    pub const STATS: u32 = 1 << 2;
}

/// Bitset attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthtoolBitsetAttr {
    Unspec = 0,
    Nomask = 1,
    Size = 2,
    Bits = 3,
    Value = 4,
    Mask = 5,
}

/// Single bit in the verbose bitset form (inside `BITS`).
pub const ETHTOOL_A_BITSET_BITS_BIT: u16 = 1;

/// Attributes of one bit in the verbose bitset form.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthtoolBitsetBitAttr {
    Unspec = 0,
    Index = 1,
    Name = 2,
    Value = 3,
}

// =============================================================================
// String sets
// =============================================================================

/// STRSET_GET request/reply attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthtoolStrsetAttr {
    Unspec = 0,
    Header = 1,
    Stringsets = 2,
    CountsOnly = 3,
}

/// Element of `STRINGSETS` and of `STRINGS`.
pub const ETHTOOL_A_STRINGSETS_STRINGSET: u16 = 1;
pub const ETHTOOL_A_STRINGS_STRING: u16 = 1;

/// Attributes of one string set.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthtoolStringsetAttr {
    Unspec = 0,
    Id = 1,
    Count = 2,
    Strings = 3,
}

/// Attributes of one string.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthtoolStringAttr {
    Unspec = 0,
    Index = 1,
    Value = 2,
}

/// String set ids (`ETH_SS_*`), shared with the legacy `GSTRINGS` request.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringSetId {
    Test = 0,
    Stats = 1,
    PrivFlags = 2,
    NtupleFilters = 3,
    Features = 4,
    RssHashFuncs = 5,
    Tunables = 6,
    PhyStats = 7,
    PhyTunables = 8,
    LinkModes = 9,
    MsgClasses = 10,
    WolModes = 11,
}

impl StringSetId {
    /// Whether the set is the same for every device.
    pub fn is_global(self) -> bool {
        matches!(
            self,
            Self::Features
                | Self::RssHashFuncs
                | Self::Tunables
                | Self::PhyTunables
                | Self::LinkModes
                | Self::MsgClasses
                | Self::WolModes
        )
    }
}

// =============================================================================
// Per-family attributes
// =============================================================================

/// LINKINFO attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthtoolLinkinfoAttr {
    Unspec = 0,
    Header = 1,
    Port = 2,
    Phyaddr = 3,
    TpMdix = 4,
    TpMdixCtrl = 5,
    Transceiver = 6,
}

/// LINKMODES attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthtoolLinkmodesAttr {
    Unspec = 0,
    Header = 1,
    Autoneg = 2,
    /// Our modes: value is advertised, mask is supported.
    Ours = 3,
    Peer = 4,
    Speed = 5,
    Duplex = 6,
    MasterSlaveCfg = 7,
    MasterSlaveState = 8,
    Lanes = 9,
}

/// LINKSTATE attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthtoolLinkstateAttr {
    Unspec = 0,
    Header = 1,
    Link = 2,
    Sqi = 3,
    SqiMax = 4,
    ExtState = 5,
    ExtSubstate = 6,
}

/// DEBUG attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthtoolDebugAttr {
    Unspec = 0,
    Header = 1,
    Msgmask = 2,
}

/// WOL attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthtoolWolAttr {
    Unspec = 0,
    Header = 1,
    Modes = 2,
    Sopass = 3,
}

/// FEATURES attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthtoolFeaturesAttr {
    Unspec = 0,
    Header = 1,
    Hw = 2,
    Wanted = 3,
    Active = 4,
    NoChange = 5,
}

/// RINGS attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthtoolRingsAttr {
    Unspec = 0,
    Header = 1,
    RxMax = 2,
    RxMiniMax = 3,
    RxJumboMax = 4,
    TxMax = 5,
    Rx = 6,
    RxMini = 7,
    RxJumbo = 8,
    Tx = 9,
}

/// CHANNELS attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthtoolChannelsAttr {
    Unspec = 0,
    Header = 1,
    RxMax = 2,
    TxMax = 3,
    OtherMax = 4,
    CombinedMax = 5,
    RxCount = 6,
    TxCount = 7,
    OtherCount = 8,
    CombinedCount = 9,
}

/// COALESCE attributes. The numbering follows `struct ethtool_coalesce`
/// field order, offset by the header.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthtoolCoalesceAttr {
    Unspec = 0,
    Header = 1,
    RxUsecs = 2,
    RxMaxFrames = 3,
    RxUsecsIrq = 4,
    RxMaxFramesIrq = 5,
    TxUsecs = 6,
    TxMaxFrames = 7,
    TxUsecsIrq = 8,
    TxMaxFramesIrq = 9,
    StatsBlockUsecs = 10,
    UseAdaptiveRx = 11,
    UseAdaptiveTx = 12,
    PktRateLow = 13,
    RxUsecsLow = 14,
    RxMaxFramesLow = 15,
    TxUsecsLow = 16,
    TxMaxFramesLow = 17,
    PktRateHigh = 18,
    RxUsecsHigh = 19,
    RxMaxFramesHigh = 20,
    TxUsecsHigh = 21,
    TxMaxFramesHigh = 22,
    RateSampleInterval = 23,
}

/// PAUSE attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthtoolPauseAttr {
    Unspec = 0,
    Header = 1,
    Autoneg = 2,
    Rx = 3,
    Tx = 4,
}

/// FEC attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthtoolFecAttr {
    Unspec = 0,
    Header = 1,
    /// Link-mode bitset of configured encodings.
    Modes = 2,
    Auto = 3,
    /// Link-mode bit index of the active encoding.
    Active = 4,
}

/// Link-mode bit of "no FEC".
pub const LINK_MODE_FEC_NONE_BIT: u32 = 49;
/// Link-mode bit of Reed-Solomon FEC.
pub const LINK_MODE_FEC_RS_BIT: u32 = 50;
/// Link-mode bit of BASE-R FEC.
pub const LINK_MODE_FEC_BASER_BIT: u32 = 51;
/// Link-mode bit of low-latency RS FEC.
pub const LINK_MODE_FEC_LLRS_BIT: u32 = 74;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_and_set_codes_are_disjoint() {
        let all = [
            EthtoolCmd::StrsetGet,
            EthtoolCmd::LinkinfoGet,
            EthtoolCmd::LinkinfoSet,
            EthtoolCmd::LinkmodesGet,
            EthtoolCmd::LinkmodesSet,
            EthtoolCmd::DebugGet,
            EthtoolCmd::DebugSet,
            EthtoolCmd::FecGet,
            EthtoolCmd::FecSet,
        ];
        for cmd in all {
            assert_eq!(cmd.is_get(), format!("{:?}", cmd).ends_with("Get"));
        }
    }

    #[test]
    fn notification_ids() {
        assert_eq!(EthtoolMsg::from_u8(17), Some(EthtoolMsg::RingsNtf));
        assert_eq!(EthtoolMsg::from_u8(31), Some(EthtoolMsg::FecNtf));
        assert_eq!(EthtoolMsg::from_u8(200), None);
    }

    #[test]
    fn global_string_sets() {
        assert!(StringSetId::LinkModes.is_global());
        assert!(!StringSetId::Stats.is_global());
        assert!(!StringSetId::PrivFlags.is_global());
    }
}
