//! Decoded device state.
//!
//! These types are what both transports decode into. A value fetched over
//! netlink and the same value fetched with the legacy ioctl compare equal,
//! so callers never need to know which transport answered.

use std::fmt;

use serde::Serialize;

// =============================================================================
// Common Types
// =============================================================================

/// Duplex mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Duplex {
    /// Half duplex.
    Half,
    /// Full duplex.
    Full,
    /// Unknown duplex.
    #[default]
    Unknown,
}

impl Duplex {
    /// Parse from kernel value.
    pub fn from_u8(v: u8) -> Self {
        match v {
            0x00 => Duplex::Half,
            0x01 => Duplex::Full,
            _ => Duplex::Unknown,
        }
    }

    /// Convert to kernel value.
    pub fn to_u8(self) -> u8 {
        match self {
            Duplex::Half => 0x00,
            Duplex::Full => 0x01,
            Duplex::Unknown => 0xff,
        }
    }
}

impl fmt::Display for Duplex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Duplex::Half => "Half",
            Duplex::Full => "Full",
            Duplex::Unknown => "Unknown!",
        })
    }
}

/// Port type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Port {
    /// Twisted pair (RJ45).
    Tp,
    /// Attachment Unit Interface.
    Aui,
    /// Media Independent Interface.
    Mii,
    /// Fiber optic.
    Fibre,
    /// BNC connector.
    Bnc,
    /// Direct attach copper.
    Da,
    /// No port.
    None,
    /// Other port type.
    #[default]
    Other,
}

impl Port {
    /// Parse from kernel value.
    pub fn from_u8(v: u8) -> Self {
        match v {
            0x00 => Port::Tp,
            0x01 => Port::Aui,
            0x02 => Port::Mii,
            0x03 => Port::Fibre,
            0x04 => Port::Bnc,
            0x05 => Port::Da,
            0xef => Port::None,
            _ => Port::Other,
        }
    }

    /// Convert to kernel value.
    pub fn to_u8(self) -> u8 {
        match self {
            Port::Tp => 0x00,
            Port::Aui => 0x01,
            Port::Mii => 0x02,
            Port::Fibre => 0x03,
            Port::Bnc => 0x04,
            Port::Da => 0x05,
            Port::None => 0xef,
            Port::Other => 0xff,
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Port::Tp => "Twisted Pair",
            Port::Aui => "AUI",
            Port::Mii => "MII",
            Port::Fibre => "FIBRE",
            Port::Bnc => "BNC",
            Port::Da => "Direct Attach Copper",
            Port::None => "None",
            Port::Other => "Other",
        })
    }
}

/// Transceiver type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transceiver {
    /// Internal transceiver.
    Internal,
    /// External transceiver.
    External,
    /// Unknown transceiver.
    #[default]
    Unknown,
}

impl Transceiver {
    /// Parse from kernel value.
    pub fn from_u8(v: u8) -> Self {
        match v {
            0x00 => Transceiver::Internal,
            0x01 => Transceiver::External,
            _ => Transceiver::Unknown,
        }
    }

    /// Convert to kernel value.
    pub fn to_u8(self) -> u8 {
        match self {
            Transceiver::Internal => 0x00,
            Transceiver::External => 0x01,
            Transceiver::Unknown => 0xff,
        }
    }
}

impl fmt::Display for Transceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Transceiver::Internal => "internal",
            Transceiver::External => "external",
            Transceiver::Unknown => "Unknown!",
        })
    }
}

/// Twisted-pair MDI-X status or control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MdiX {
    /// Not reported by the driver.
    #[default]
    Unknown,
    /// MDI (straight-through).
    Mdi,
    /// MDI-X (crossover).
    MdiX,
    /// Auto MDI-X.
    Auto,
}

impl MdiX {
    /// Parse from kernel value (`ETH_TP_MDI_*`).
    pub fn from_u8(v: u8) -> Self {
        match v {
            0x01 => MdiX::Mdi,
            0x02 => MdiX::MdiX,
            0x03 => MdiX::Auto,
            _ => MdiX::Unknown,
        }
    }

    /// Convert to kernel value.
    pub fn to_u8(self) -> u8 {
        match self {
            MdiX::Unknown => 0x00,
            MdiX::Mdi => 0x01,
            MdiX::MdiX => 0x02,
            MdiX::Auto => 0x03,
        }
    }
}

impl fmt::Display for MdiX {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MdiX::Unknown => "Unknown",
            MdiX::Mdi => "off",
            MdiX::MdiX => "on",
            MdiX::Auto => "auto",
        })
    }
}

// =============================================================================
// Link settings
// =============================================================================

/// Link-mode names of the 32-bit legacy `supported`/`advertising` masks,
/// by bit index. The netlink link-mode string set starts with the same
/// names in the same order.
pub const LEGACY_LINK_MODES: [&str; 31] = [
    "10baseT/Half",
    "10baseT/Full",
    "100baseT/Half",
    "100baseT/Full",
    "1000baseT/Half",
    "1000baseT/Full",
    "Autoneg",
    "TP",
    "AUI",
    "MII",
    "FIBRE",
    "BNC",
    "10000baseT/Full",
    "Pause",
    "Asym_Pause",
    "2500baseX/Full",
    "Backplane",
    "1000baseKX/Full",
    "10000baseKX4/Full",
    "10000baseKR/Full",
    "10000baseR_FEC",
    "20000baseMLD2/Full",
    "20000baseKR2/Full",
    "40000baseKR4/Full",
    "40000baseCR4/Full",
    "40000baseSR4/Full",
    "40000baseLR4/Full",
    "56000baseKR4/Full",
    "56000baseCR4/Full",
    "56000baseSR4/Full",
    "56000baseLR4/Full",
];

/// Names of the bits set in a legacy link-mode mask.
pub fn legacy_mode_names(mask: u32) -> Vec<String> {
    LEGACY_LINK_MODES
        .iter()
        .enumerate()
        .filter(|(bit, _)| mask & (1 << bit) != 0)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Legacy mask for a list of link-mode names. Names past bit 30 are ignored.
pub fn legacy_mode_mask<S: AsRef<str>>(names: &[S]) -> u32 {
    names
        .iter()
        .filter_map(|n| LEGACY_LINK_MODES.iter().position(|m| *m == n.as_ref()))
        .fold(0, |acc, bit| acc | (1 << bit))
}

/// Port names as they appear among link modes.
pub const PORT_MODE_NAMES: [&str; 6] = ["TP", "AUI", "MII", "FIBRE", "BNC", "Backplane"];

/// Physical link settings: link modes plus link info.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkSettings {
    /// Supported link modes, ports and capabilities by name.
    pub supported: Vec<String>,
    /// Advertised link modes by name.
    pub advertised: Vec<String>,
    /// Link modes advertised by the link partner.
    pub peer_advertised: Vec<String>,
    /// Speed in Mb/s, `None` when unknown.
    pub speed: Option<u32>,
    pub duplex: Duplex,
    pub port: Port,
    pub phyad: Option<u8>,
    pub transceiver: Option<Transceiver>,
    pub autoneg: bool,
    /// Current MDI-X status.
    pub mdix: Option<MdiX>,
    /// MDI-X control setting.
    pub mdix_ctrl: Option<MdiX>,
    pub lanes: Option<u32>,
}

impl LinkSettings {
    /// Supported ports, in mask order.
    pub fn supported_ports(&self) -> Vec<&str> {
        PORT_MODE_NAMES
            .iter()
            .copied()
            .filter(|p| self.supported.iter().any(|s| s == p))
            .collect()
    }

    /// Whether auto-negotiation is supported.
    pub fn supports_autoneg(&self) -> bool {
        self.supported.iter().any(|s| s == "Autoneg")
    }
}

/// Whether a link-mode name denotes a speed/duplex mode rather than a
/// port or capability bit.
pub fn is_speed_mode(name: &str) -> bool {
    name.contains("base")
}

/// Link detection and signal quality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkState {
    pub link: bool,
    /// Signal Quality Index, when the PHY reports one.
    pub sqi: Option<u32>,
    pub sqi_max: Option<u32>,
    /// Extended state (reason for link down).
    pub ext_state: Option<u8>,
    pub ext_substate: Option<u8>,
}

// =============================================================================
// Wake-on-LAN and message level
// =============================================================================

/// Wake-on-LAN mode bits (`WAKE_*`).
pub mod wake {
    pub const PHY: u32 = 1 << 0;
    pub const UCAST: u32 = 1 << 1;
    pub const MCAST: u32 = 1 << 2;
    pub const BCAST: u32 = 1 << 3;
    pub const ARP: u32 = 1 << 4;
    pub const MAGIC: u32 = 1 << 5;
    pub const MAGICSECURE: u32 = 1 << 6;
    pub const FILTER: u32 = 1 << 7;

    /// Letters used on the command line, by bit.
    pub const LETTERS: [(char, u32); 8] = [
        ('p', PHY),
        ('u', UCAST),
        ('m', MCAST),
        ('b', BCAST),
        ('a', ARP),
        ('g', MAGIC),
        ('s', MAGICSECURE),
        ('f', FILTER),
    ];

    /// Number of WoL mode bits.
    pub const COUNT: u32 = 8;
}

/// SecureOn password length.
pub const SOPASS_MAX: usize = 6;

/// Render a WoL mask as letters, `d` when empty.
pub fn wol_letters(mask: u32) -> String {
    if mask == 0 {
        return "d".to_string();
    }
    wake::LETTERS
        .iter()
        .filter(|(_, bit)| mask & bit != 0)
        .map(|(c, _)| *c)
        .collect()
}

/// Wake-on-LAN configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WolInfo {
    pub supported: u32,
    pub wolopts: u32,
    /// SecureOn password, present when the device supports it.
    pub sopass: Option<[u8; SOPASS_MAX]>,
}

/// Message class names (`NETIF_MSG_*`), by bit.
pub const MSG_CLASSES: [&str; 15] = [
    "drv",
    "probe",
    "link",
    "timer",
    "ifdown",
    "ifup",
    "rx_err",
    "tx_err",
    "tx_queued",
    "intr",
    "tx_done",
    "rx_status",
    "pktdata",
    "hw",
    "wol",
];

/// Driver message level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MsgLevel {
    pub value: u32,
}

impl MsgLevel {
    /// Names of the enabled message classes.
    pub fn names(&self) -> Vec<&'static str> {
        MSG_CLASSES
            .iter()
            .enumerate()
            .filter(|(bit, _)| self.value & (1 << bit) != 0)
            .map(|(_, n)| *n)
            .collect()
    }
}

// =============================================================================
// Driver information
// =============================================================================

/// Driver identification and dump sizes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriverInfo {
    pub driver: String,
    pub version: String,
    pub fw_version: String,
    pub bus_info: String,
    pub erom_version: String,
    pub n_priv_flags: u32,
    pub n_stats: u32,
    pub testinfo_len: u32,
    pub eedump_len: u32,
    pub regdump_len: u32,
}

// =============================================================================
// Rings, channels, coalescing, pause
// =============================================================================

/// Ring buffer sizes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Rings {
    pub rx_max: Option<u32>,
    pub rx_mini_max: Option<u32>,
    pub rx_jumbo_max: Option<u32>,
    pub tx_max: Option<u32>,
    pub rx: Option<u32>,
    pub rx_mini: Option<u32>,
    pub rx_jumbo: Option<u32>,
    pub tx: Option<u32>,
}

/// Channel counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Channels {
    pub rx_max: Option<u32>,
    pub tx_max: Option<u32>,
    pub other_max: Option<u32>,
    pub combined_max: Option<u32>,
    pub rx_count: Option<u32>,
    pub tx_count: Option<u32>,
    pub other_count: Option<u32>,
    pub combined_count: Option<u32>,
}

/// Interrupt coalescing parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Coalesce {
    pub rx_usecs: Option<u32>,
    pub rx_frames: Option<u32>,
    pub rx_usecs_irq: Option<u32>,
    pub rx_frames_irq: Option<u32>,
    pub tx_usecs: Option<u32>,
    pub tx_frames: Option<u32>,
    pub tx_usecs_irq: Option<u32>,
    pub tx_frames_irq: Option<u32>,
    pub stats_block_usecs: Option<u32>,
    pub adaptive_rx: Option<bool>,
    pub adaptive_tx: Option<bool>,
    pub pkt_rate_low: Option<u32>,
    pub rx_usecs_low: Option<u32>,
    pub rx_frames_low: Option<u32>,
    pub tx_usecs_low: Option<u32>,
    pub tx_frames_low: Option<u32>,
    pub pkt_rate_high: Option<u32>,
    pub rx_usecs_high: Option<u32>,
    pub rx_frames_high: Option<u32>,
    pub tx_usecs_high: Option<u32>,
    pub tx_frames_high: Option<u32>,
    pub rate_sample_interval: Option<u32>,
}

/// Pause frame settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pause {
    pub autoneg: Option<bool>,
    pub rx: Option<bool>,
    pub tx: Option<bool>,
}

// =============================================================================
// Features
// =============================================================================

/// One offload feature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Feature {
    pub name: String,
    pub active: bool,
    /// The driver does not allow changing it.
    pub fixed: bool,
    /// What the user last asked for.
    pub requested: bool,
}

/// Offload features, in kernel order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Features {
    pub entries: Vec<Feature>,
}

impl Features {
    /// Look up a feature by name.
    pub fn get(&self, name: &str) -> Option<&Feature> {
        self.entries.iter().find(|f| f.name == name)
    }

    /// State of a legacy offload name: on when any of its kernel
    /// features is active, `None` when the device has none of them.
    pub fn legacy_state(&self, legacy: &str) -> Option<bool> {
        let kernel = legacy_feature(legacy)?;
        let present: Vec<&Feature> = kernel.iter().filter_map(|n| self.get(n)).collect();
        if present.is_empty() {
            return None;
        }
        Some(present.iter().any(|f| f.active))
    }
}

/// Legacy offload names and the kernel features each one stands for.
pub const LEGACY_FEATURES: [(&str, &[&str]); 12] = [
    ("rx", &["rx-checksum"]),
    (
        "tx",
        &[
            "tx-checksum-ipv4",
            "tx-checksum-ip-generic",
            "tx-checksum-ipv6",
            "tx-checksum-fcoe-crc",
            "tx-checksum-sctp",
        ],
    ),
    ("sg", &["tx-scatter-gather", "tx-scatter-gather-fraglist"]),
    (
        "tso",
        &[
            "tx-tcp-segmentation",
            "tx-tcp-ecn-segmentation",
            "tx-tcp-mangleid-segmentation",
            "tx-tcp6-segmentation",
        ],
    ),
    ("ufo", &["tx-udp-fragmentation"]),
    ("gso", &["tx-generic-segmentation"]),
    ("gro", &["rx-gro"]),
    ("lro", &["rx-lro"]),
    ("rxvlan", &["rx-vlan-hw-parse"]),
    ("txvlan", &["tx-vlan-hw-insert"]),
    ("ntuple", &["rx-ntuple-filter"]),
    ("rxhash", &["rx-hashing"]),
];

/// Kernel feature names behind a legacy offload name.
pub fn legacy_feature(name: &str) -> Option<&'static [&'static str]> {
    LEGACY_FEATURES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, kernel)| *kernel)
}

// =============================================================================
// FEC
// =============================================================================

/// Legacy FEC mode bits (`ETHTOOL_FEC_*`).
pub mod fec {
    pub const NONE: u32 = 1 << 0;
    pub const AUTO: u32 = 1 << 1;
    pub const OFF: u32 = 1 << 2;
    pub const RS: u32 = 1 << 3;
    pub const BASER: u32 = 1 << 4;
    pub const LLRS: u32 = 1 << 5;

    /// Display names by bit.
    pub const NAMES: [(u32, &str); 6] = [
        (NONE, "None"),
        (AUTO, "Auto"),
        (OFF, "Off"),
        (RS, "RS"),
        (BASER, "BaseR"),
        (LLRS, "LLRS"),
    ];

    /// Bit for a user-supplied encoding name, case-insensitive.
    pub fn bit_for_name(name: &str) -> Option<u32> {
        NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(bit, _)| *bit)
    }
}

/// Display name of a kernel FEC link-mode name.
pub fn fec_display_name(kernel_name: &str) -> &str {
    match kernel_name {
        "None" => "Off",
        "BASER" => "BaseR",
        other => other,
    }
}

/// FEC configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FecParams {
    /// Configured encodings, display names.
    pub configured: Vec<String>,
    /// Automatic selection is enabled.
    pub auto: bool,
    /// Active encoding, `None` when no link.
    pub active: Option<String>,
}

// =============================================================================
// Flow classification
// =============================================================================

/// Flow types for hashing and classification rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    Tcp4,
    Udp4,
    Sctp4,
    AhEsp4,
    Tcp6,
    Udp6,
    Sctp6,
    Ether,
}

impl FlowType {
    /// All flow types with their command-line names.
    pub const NAMES: [(&'static str, FlowType); 9] = [
        ("tcp4", FlowType::Tcp4),
        ("udp4", FlowType::Udp4),
        ("sctp4", FlowType::Sctp4),
        ("ah4", FlowType::AhEsp4),
        ("esp4", FlowType::AhEsp4),
        ("tcp6", FlowType::Tcp6),
        ("udp6", FlowType::Udp6),
        ("sctp6", FlowType::Sctp6),
        ("ether", FlowType::Ether),
    ];

    /// Parse a command-line flow type name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, t)| *t)
    }

    /// Kernel flow type value.
    pub fn to_u32(self) -> u32 {
        match self {
            FlowType::Tcp4 => 0x01,
            FlowType::Udp4 => 0x02,
            FlowType::Sctp4 => 0x03,
            FlowType::AhEsp4 => 0x04,
            FlowType::Tcp6 => 0x05,
            FlowType::Udp6 => 0x06,
            FlowType::Sctp6 => 0x07,
            FlowType::Ether => 0x12,
        }
    }

    /// Parse a kernel flow type value.
    pub fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            0x01 => FlowType::Tcp4,
            0x02 => FlowType::Udp4,
            0x03 => FlowType::Sctp4,
            0x04 => FlowType::AhEsp4,
            0x05 => FlowType::Tcp6,
            0x06 => FlowType::Udp6,
            0x07 => FlowType::Sctp6,
            0x12 => FlowType::Ether,
            _ => return None,
        })
    }

    /// Whether this is one of the IPv4 layer-4 flow types.
    pub fn is_ipv4(self) -> bool {
        matches!(
            self,
            FlowType::Tcp4 | FlowType::Udp4 | FlowType::Sctp4 | FlowType::AhEsp4
        )
    }
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FlowType::Tcp4 => "TCP over IPV4",
            FlowType::Udp4 => "UDP over IPV4",
            FlowType::Sctp4 => "SCTP over IPV4",
            FlowType::AhEsp4 => "IPSEC AH/ESP over IPV4",
            FlowType::Tcp6 => "TCP over IPV6",
            FlowType::Udp6 => "UDP over IPV6",
            FlowType::Sctp6 => "SCTP over IPV6",
            FlowType::Ether => "Ethernet",
        })
    }
}

/// Rx flow hash field bits (`RXH_*`).
pub mod rxh {
    pub const L2DA: u64 = 1 << 1;
    pub const VLAN: u64 = 1 << 2;
    pub const L3_PROTO: u64 = 1 << 3;
    pub const IP_SRC: u64 = 1 << 4;
    pub const IP_DST: u64 = 1 << 5;
    pub const L4_B_0_1: u64 = 1 << 6;
    pub const L4_B_2_3: u64 = 1 << 7;
    pub const DISCARD: u64 = 1 << 31;

    /// Command-line letters with their bits and display text.
    pub const FIELDS: [(char, u64, &str); 8] = [
        ('m', L2DA, "L2DA"),
        ('v', VLAN, "VLAN tag"),
        ('t', L3_PROTO, "L3 proto"),
        ('s', IP_SRC, "IP SA"),
        ('d', IP_DST, "IP DA"),
        ('f', L4_B_0_1, "L4 bytes 0 & 1 [TCP/UDP src port]"),
        ('n', L4_B_2_3, "L4 bytes 2 & 3 [TCP/UDP dst port]"),
        ('r', DISCARD, "Discard"),
    ];
}

/// Fields hashed for one flow type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RxFlowHash {
    pub flow_type: FlowType,
    pub fields: u64,
}

/// Matched header values of an n-tuple rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NtupleMatch {
    pub src_ip: u32,
    pub dst_ip: u32,
    pub src_port: u16,
    pub dst_port: u16,
    pub tos: u8,
    pub src_mac: [u8; 6],
    pub dst_mac: [u8; 6],
    pub proto: u16,
}

/// One rx classification rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NtupleRule {
    pub flow_type: FlowType,
    /// Header values.
    pub value: NtupleMatch,
    /// Compare mask, a set bit means the field bit is compared.
    pub mask: NtupleMatch,
    /// Destination queue, `None` to drop.
    pub action: Option<u64>,
    pub location: u32,
}

/// Rule table of a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleList {
    pub rx_rings: u64,
    pub total: u32,
    pub rules: Vec<NtupleRule>,
}

// =============================================================================
// Dumps, tests and statistics
// =============================================================================

/// Register dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegDump {
    pub version: u32,
    pub data: Vec<u8>,
}

/// EEPROM contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EepromDump {
    pub offset: u32,
    pub data: Vec<u8>,
}

/// Self-test flag bits (`ETH_TEST_FL_*`).
pub mod test_flags {
    pub const OFFLINE: u32 = 1 << 0;
    pub const FAILED: u32 = 1 << 1;
    pub const EXTERNAL_LB: u32 = 1 << 2;
    pub const EXTERNAL_LB_DONE: u32 = 1 << 3;
}

/// Self-test outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelfTest {
    pub passed: bool,
    pub external_lb_done: bool,
    /// Per-test result codes, zero meaning pass.
    pub results: Vec<(String, u64)>,
}

/// Named NIC statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub entries: Vec<(String, u64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_mode_names_follow_bits() {
        let names = legacy_mode_names((1 << 3) | (1 << 5) | (1 << 6) | (1 << 7));
        assert_eq!(names, ["100baseT/Full", "1000baseT/Full", "Autoneg", "TP"]);
        assert_eq!(legacy_mode_mask(&names), 0b1110_1000);
    }

    #[test]
    fn wol_letters_render() {
        assert_eq!(wol_letters(0), "d");
        assert_eq!(wol_letters(wake::MAGIC | wake::PHY), "pg");
        assert_eq!(wol_letters(wake::MAGICSECURE | wake::FILTER), "sf");
    }

    #[test]
    fn msglevel_names() {
        let lvl = MsgLevel { value: 0x7 };
        assert_eq!(lvl.names(), ["drv", "probe", "link"]);
    }

    #[test]
    fn link_settings_ports() {
        let s = LinkSettings {
            supported: vec!["10baseT/Half".into(), "TP".into(), "MII".into(), "Autoneg".into()],
            ..Default::default()
        };
        assert_eq!(s.supported_ports(), ["TP", "MII"]);
        assert!(s.supports_autoneg());
        assert!(is_speed_mode("10baseT/Half"));
        assert!(!is_speed_mode("Pause"));
    }

    #[test]
    fn fec_names() {
        assert_eq!(fec::bit_for_name("rs"), Some(fec::RS));
        assert_eq!(fec::bit_for_name("BASER"), Some(fec::BASER));
        assert_eq!(fec::bit_for_name("bogus"), None);
        assert_eq!(fec_display_name("None"), "Off");
        assert_eq!(fec_display_name("BASER"), "BaseR");
        assert_eq!(fec_display_name("RS"), "RS");
    }

    #[test]
    fn flow_type_codes() {
        for (name, ft) in FlowType::NAMES {
            assert_eq!(FlowType::from_u32(ft.to_u32()), Some(ft), "{name}");
        }
        assert_eq!(FlowType::from_name("esp4"), Some(FlowType::AhEsp4));
        assert_eq!(FlowType::from_name("ipv4"), None);
    }

    #[test]
    fn legacy_feature_state() {
        let features = Features {
            entries: vec![
                Feature {
                    name: "tx-tcp-segmentation".into(),
                    active: false,
                    ..Default::default()
                },
                Feature {
                    name: "tx-tcp6-segmentation".into(),
                    active: true,
                    ..Default::default()
                },
            ],
        };
        assert_eq!(features.legacy_state("tso"), Some(true));
        assert_eq!(features.legacy_state("gro"), None);
        assert_eq!(features.legacy_state("bogus"), None);
        assert_eq!(legacy_feature("rx"), Some(&["rx-checksum"][..]));
    }

    #[test]
    fn mdix_values_match_kernel() {
        assert_eq!(MdiX::from_u8(1), MdiX::Mdi);
        assert_eq!(MdiX::from_u8(3), MdiX::Auto);
        assert_eq!(MdiX::Auto.to_u8(), 3);
        assert_eq!(MdiX::from_u8(0), MdiX::Unknown);
    }
}
