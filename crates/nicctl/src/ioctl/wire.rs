//! Fixed-layout `SIOCETHTOOL` records.
//!
//! Every record starts with the 32-bit operation code. Fields are written
//! at explicit offsets in native byte order and read back with `winnow`
//! parsers; nothing is transmuted. Offsets follow `<linux/ethtool.h>`.
//! The only record whose layout depends on the target is `ethtool_rxnfc`,
//! which embeds a `u64` and is laid out from `std::mem::align_of::<u64>()`.

use winnow::binary::{Endianness, u8 as ne_u8, u16 as ne_u16, u32 as ne_u32, u64 as ne_u64};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take;

use crate::error::{Error, Result};
use crate::types::{DriverInfo, FlowType, NtupleMatch, NtupleRule, SOPASS_MAX};

/// Result type for the record parsers.
pub type PResult<T> = core::result::Result<T, ErrMode<ContextError>>;

/// Length of one entry of a `GSTRINGS` table.
pub const ETH_GSTRING_LEN: usize = 32;

/// Length of the driver-info strings.
const DRVINFO_STRLEN: usize = 32;

/// Room for a hardware address in `ethtool_perm_addr`.
pub const MAX_ADDR_LEN: usize = 32;

/// Length of the firmware file name in `ethtool_flash`.
pub const ETHTOOL_FLASH_MAX_FILENAME: usize = 128;

/// A record exchanged through `ifreq.ifr_data`.
///
/// Get and set share one record type; the direction is the `cmd` passed
/// to [`encode`](Self::encode).
pub trait LegacyRecord: Sized {
    /// Size of the record in bytes.
    const SIZE: usize;

    /// Write the record, operation code first, into `buf[..SIZE]`.
    fn encode(&self, cmd: u32, buf: &mut [u8]);

    /// Parse the record, operation code included.
    fn parse(input: &mut &[u8]) -> PResult<Self>;

    /// Decode a reply buffer.
    fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(Error::Truncated {
                expected: Self::SIZE,
                actual: buf.len(),
            });
        }
        Self::parse(&mut &buf[..Self::SIZE])
            .map_err(|e| Error::InvalidMessage(format!("legacy record: {e}")))
    }

    /// A zeroed buffer holding the encoded record.
    fn to_bytes(&self, cmd: u32) -> Vec<u8> {
        let mut buf = vec![0u8; Self::SIZE];
        self.encode(cmd, &mut buf);
        buf
    }
}

// =============================================================================
// Primitives
// =============================================================================

pub(crate) fn put_u8(buf: &mut [u8], off: usize, v: u8) {
    buf[off] = v;
}

pub(crate) fn put_u16(buf: &mut [u8], off: usize, v: u16) {
    buf[off..off + 2].copy_from_slice(&v.to_ne_bytes());
}

pub(crate) fn put_u32(buf: &mut [u8], off: usize, v: u32) {
    buf[off..off + 4].copy_from_slice(&v.to_ne_bytes());
}

pub(crate) fn put_u64(buf: &mut [u8], off: usize, v: u64) {
    buf[off..off + 8].copy_from_slice(&v.to_ne_bytes());
}

pub(crate) fn u8_at(input: &mut &[u8]) -> PResult<u8> {
    ne_u8.parse_next(input)
}

pub(crate) fn u16_at(input: &mut &[u8]) -> PResult<u16> {
    ne_u16(Endianness::Native).parse_next(input)
}

pub(crate) fn u32_at(input: &mut &[u8]) -> PResult<u32> {
    ne_u32(Endianness::Native).parse_next(input)
}

pub(crate) fn u64_at(input: &mut &[u8]) -> PResult<u64> {
    ne_u64(Endianness::Native).parse_next(input)
}

/// Network-order 16-bit field.
fn be16_at(input: &mut &[u8]) -> PResult<u16> {
    ne_u16(Endianness::Big).parse_next(input)
}

/// Network-order 32-bit field.
fn be32_at(input: &mut &[u8]) -> PResult<u32> {
    ne_u32(Endianness::Big).parse_next(input)
}

fn skip(input: &mut &[u8], n: usize) -> PResult<()> {
    take(n).void().parse_next(input)
}

fn bytes6(input: &mut &[u8]) -> PResult<[u8; 6]> {
    let b: &[u8] = take(6usize).parse_next(input)?;
    let mut out = [0u8; 6];
    out.copy_from_slice(b);
    Ok(out)
}

/// A NUL-padded fixed-width string field.
pub(crate) fn cstr(input: &mut &[u8], width: usize) -> PResult<String> {
    let b: &[u8] = take(width).parse_next(input)?;
    let end = b.iter().position(|c| *c == 0).unwrap_or(b.len());
    Ok(String::from_utf8_lossy(&b[..end]).into_owned())
}

const fn align_up(off: usize, align: usize) -> usize {
    (off + align - 1) & !(align - 1)
}

// =============================================================================
// ethtool_cmd
// =============================================================================

/// `struct ethtool_cmd`, the 32-bit link settings record of `GSET`/`SSET`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkCmd {
    pub supported: u32,
    pub advertising: u32,
    /// Combined `speed` and `speed_hi`.
    pub speed: u32,
    pub duplex: u8,
    pub port: u8,
    pub phy_address: u8,
    pub transceiver: u8,
    pub autoneg: u8,
    pub mdio_support: u8,
    pub maxtxpkt: u32,
    pub maxrxpkt: u32,
    pub eth_tp_mdix: u8,
    pub eth_tp_mdix_ctrl: u8,
    pub lp_advertising: u32,
}

impl LegacyRecord for LinkCmd {
    const SIZE: usize = 44;

    fn encode(&self, cmd: u32, buf: &mut [u8]) {
        put_u32(buf, 0, cmd);
        put_u32(buf, 4, self.supported);
        put_u32(buf, 8, self.advertising);
        put_u16(buf, 12, self.speed as u16);
        put_u8(buf, 14, self.duplex);
        put_u8(buf, 15, self.port);
        put_u8(buf, 16, self.phy_address);
        put_u8(buf, 17, self.transceiver);
        put_u8(buf, 18, self.autoneg);
        put_u8(buf, 19, self.mdio_support);
        put_u32(buf, 20, self.maxtxpkt);
        put_u32(buf, 24, self.maxrxpkt);
        put_u16(buf, 28, (self.speed >> 16) as u16);
        put_u8(buf, 30, self.eth_tp_mdix);
        put_u8(buf, 31, self.eth_tp_mdix_ctrl);
        put_u32(buf, 32, self.lp_advertising);
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let _cmd = u32_at(input)?;
        let supported = u32_at(input)?;
        let advertising = u32_at(input)?;
        let speed_lo = u16_at(input)?;
        let duplex = u8_at(input)?;
        let port = u8_at(input)?;
        let phy_address = u8_at(input)?;
        let transceiver = u8_at(input)?;
        let autoneg = u8_at(input)?;
        let mdio_support = u8_at(input)?;
        let maxtxpkt = u32_at(input)?;
        let maxrxpkt = u32_at(input)?;
        let speed_hi = u16_at(input)?;
        let eth_tp_mdix = u8_at(input)?;
        let eth_tp_mdix_ctrl = u8_at(input)?;
        let lp_advertising = u32_at(input)?;
        skip(input, 8)?;
        Ok(Self {
            supported,
            advertising,
            speed: (u32::from(speed_hi) << 16) | u32::from(speed_lo),
            duplex,
            port,
            phy_address,
            transceiver,
            autoneg,
            mdio_support,
            maxtxpkt,
            maxrxpkt,
            eth_tp_mdix,
            eth_tp_mdix_ctrl,
            lp_advertising,
        })
    }
}

/// `struct ethtool_cmd_22`, the pre-2.4 layout used with `SIOCETHTOOL_22`.
///
/// It only carries the fields below; everything else in [`LinkCmd`]
/// is lost on the way through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkCmd22 {
    pub supported: u32,
    pub speed: u16,
    pub duplex: u8,
    pub port: u8,
    pub phy_address: u8,
    pub transceiver: u8,
    pub autoneg: u8,
}

impl LegacyRecord for LinkCmd22 {
    const SIZE: usize = 16;

    fn encode(&self, cmd: u32, buf: &mut [u8]) {
        put_u32(buf, 0, cmd);
        put_u32(buf, 4, self.supported);
        put_u16(buf, 8, self.speed);
        put_u8(buf, 10, self.duplex);
        put_u8(buf, 11, self.port);
        put_u8(buf, 12, self.phy_address);
        put_u8(buf, 13, self.transceiver);
        put_u8(buf, 14, self.autoneg);
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let _cmd = u32_at(input)?;
        let supported = u32_at(input)?;
        let speed = u16_at(input)?;
        let duplex = u8_at(input)?;
        let port = u8_at(input)?;
        let phy_address = u8_at(input)?;
        let transceiver = u8_at(input)?;
        let autoneg = u8_at(input)?;
        skip(input, 1)?;
        Ok(Self {
            supported,
            speed,
            duplex,
            port,
            phy_address,
            transceiver,
            autoneg,
        })
    }
}

impl From<&LinkCmd> for LinkCmd22 {
    fn from(c: &LinkCmd) -> Self {
        Self {
            supported: c.supported,
            speed: c.speed as u16,
            duplex: c.duplex,
            port: c.port,
            phy_address: c.phy_address,
            transceiver: c.transceiver,
            autoneg: c.autoneg,
        }
    }
}

impl From<&LinkCmd22> for LinkCmd {
    fn from(c: &LinkCmd22) -> Self {
        Self {
            supported: c.supported,
            speed: u32::from(c.speed),
            duplex: c.duplex,
            port: c.port,
            phy_address: c.phy_address,
            transceiver: c.transceiver,
            autoneg: c.autoneg,
            ..Default::default()
        }
    }
}

// =============================================================================
// Driver info, WoL, single values
// =============================================================================

/// `struct ethtool_drvinfo`, decoded straight into [`DriverInfo`].
impl LegacyRecord for DriverInfo {
    const SIZE: usize = 196;

    fn encode(&self, cmd: u32, buf: &mut [u8]) {
        put_u32(buf, 0, cmd);
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let _cmd = u32_at(input)?;
        let driver = cstr(input, DRVINFO_STRLEN)?;
        let version = cstr(input, DRVINFO_STRLEN)?;
        let fw_version = cstr(input, DRVINFO_STRLEN)?;
        let bus_info = cstr(input, DRVINFO_STRLEN)?;
        let erom_version = cstr(input, DRVINFO_STRLEN)?;
        skip(input, 12)?;
        Ok(Self {
            driver,
            version,
            fw_version,
            bus_info,
            erom_version,
            n_priv_flags: u32_at(input)?,
            n_stats: u32_at(input)?,
            testinfo_len: u32_at(input)?,
            eedump_len: u32_at(input)?,
            regdump_len: u32_at(input)?,
        })
    }
}

/// `struct ethtool_wolinfo`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WolRecord {
    pub supported: u32,
    pub wolopts: u32,
    pub sopass: [u8; SOPASS_MAX],
}

impl LegacyRecord for WolRecord {
    const SIZE: usize = 20;

    fn encode(&self, cmd: u32, buf: &mut [u8]) {
        put_u32(buf, 0, cmd);
        put_u32(buf, 4, self.supported);
        put_u32(buf, 8, self.wolopts);
        buf[12..12 + SOPASS_MAX].copy_from_slice(&self.sopass);
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let _cmd = u32_at(input)?;
        let supported = u32_at(input)?;
        let wolopts = u32_at(input)?;
        let sopass = bytes6(input)?;
        skip(input, 2)?;
        Ok(Self {
            supported,
            wolopts,
            sopass,
        })
    }
}

/// `struct ethtool_value`: one 32-bit value (message level, link, flags,
/// per-offload toggles, LED blink seconds).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueRecord {
    pub data: u32,
}

impl LegacyRecord for ValueRecord {
    const SIZE: usize = 8;

    fn encode(&self, cmd: u32, buf: &mut [u8]) {
        put_u32(buf, 0, cmd);
        put_u32(buf, 4, self.data);
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let _cmd = u32_at(input)?;
        Ok(Self {
            data: u32_at(input)?,
        })
    }
}

// =============================================================================
// Rings, channels, pause, coalescing, FEC
// =============================================================================

/// `struct ethtool_ringparam`: maxima first, then current sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RingRecord {
    pub rx_max: u32,
    pub rx_mini_max: u32,
    pub rx_jumbo_max: u32,
    pub tx_max: u32,
    pub rx: u32,
    pub rx_mini: u32,
    pub rx_jumbo: u32,
    pub tx: u32,
}

impl LegacyRecord for RingRecord {
    const SIZE: usize = 36;

    fn encode(&self, cmd: u32, buf: &mut [u8]) {
        put_u32(buf, 0, cmd);
        let fields = [
            self.rx_max,
            self.rx_mini_max,
            self.rx_jumbo_max,
            self.tx_max,
            self.rx,
            self.rx_mini,
            self.rx_jumbo,
            self.tx,
        ];
        for (i, v) in fields.into_iter().enumerate() {
            put_u32(buf, 4 + 4 * i, v);
        }
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let _cmd = u32_at(input)?;
        Ok(Self {
            rx_max: u32_at(input)?,
            rx_mini_max: u32_at(input)?,
            rx_jumbo_max: u32_at(input)?,
            tx_max: u32_at(input)?,
            rx: u32_at(input)?,
            rx_mini: u32_at(input)?,
            rx_jumbo: u32_at(input)?,
            tx: u32_at(input)?,
        })
    }
}

/// `struct ethtool_channels`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelRecord {
    pub max_rx: u32,
    pub max_tx: u32,
    pub max_other: u32,
    pub max_combined: u32,
    pub rx_count: u32,
    pub tx_count: u32,
    pub other_count: u32,
    pub combined_count: u32,
}

impl LegacyRecord for ChannelRecord {
    const SIZE: usize = 36;

    fn encode(&self, cmd: u32, buf: &mut [u8]) {
        put_u32(buf, 0, cmd);
        let fields = [
            self.max_rx,
            self.max_tx,
            self.max_other,
            self.max_combined,
            self.rx_count,
            self.tx_count,
            self.other_count,
            self.combined_count,
        ];
        for (i, v) in fields.into_iter().enumerate() {
            put_u32(buf, 4 + 4 * i, v);
        }
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let _cmd = u32_at(input)?;
        Ok(Self {
            max_rx: u32_at(input)?,
            max_tx: u32_at(input)?,
            max_other: u32_at(input)?,
            max_combined: u32_at(input)?,
            rx_count: u32_at(input)?,
            tx_count: u32_at(input)?,
            other_count: u32_at(input)?,
            combined_count: u32_at(input)?,
        })
    }
}

/// `struct ethtool_pauseparam`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PauseRecord {
    pub autoneg: u32,
    pub rx_pause: u32,
    pub tx_pause: u32,
}

impl LegacyRecord for PauseRecord {
    const SIZE: usize = 16;

    fn encode(&self, cmd: u32, buf: &mut [u8]) {
        put_u32(buf, 0, cmd);
        put_u32(buf, 4, self.autoneg);
        put_u32(buf, 8, self.rx_pause);
        put_u32(buf, 12, self.tx_pause);
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let _cmd = u32_at(input)?;
        Ok(Self {
            autoneg: u32_at(input)?,
            rx_pause: u32_at(input)?,
            tx_pause: u32_at(input)?,
        })
    }
}

/// Number of u32 fields after `cmd` in `struct ethtool_coalesce`.
pub const COALESCE_FIELDS: usize = 22;

/// Position of `use_adaptive_rx_coalesce`.
pub const COALESCE_ADAPTIVE_RX: usize = 9;

/// Position of `use_adaptive_tx_coalesce`.
pub const COALESCE_ADAPTIVE_TX: usize = 10;

/// `struct ethtool_coalesce`, kept as its 22 fields in declaration order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoalesceRecord {
    pub fields: [u32; COALESCE_FIELDS],
}

impl LegacyRecord for CoalesceRecord {
    const SIZE: usize = 4 + 4 * COALESCE_FIELDS;

    fn encode(&self, cmd: u32, buf: &mut [u8]) {
        put_u32(buf, 0, cmd);
        for (i, v) in self.fields.iter().enumerate() {
            put_u32(buf, 4 + 4 * i, *v);
        }
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let _cmd = u32_at(input)?;
        let mut fields = [0u32; COALESCE_FIELDS];
        for f in &mut fields {
            *f = u32_at(input)?;
        }
        Ok(Self { fields })
    }
}

/// `struct ethtool_fecparam`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FecRecord {
    pub active_fec: u32,
    pub fec: u32,
}

impl LegacyRecord for FecRecord {
    const SIZE: usize = 16;

    fn encode(&self, cmd: u32, buf: &mut [u8]) {
        put_u32(buf, 0, cmd);
        put_u32(buf, 4, self.active_fec);
        put_u32(buf, 8, self.fec);
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let _cmd = u32_at(input)?;
        let active_fec = u32_at(input)?;
        let fec = u32_at(input)?;
        skip(input, 4)?;
        Ok(Self { active_fec, fec })
    }
}

// =============================================================================
// Rx flow classification
// =============================================================================

/// Size of `union ethtool_flow_union`.
const FLOW_UNION_LEN: usize = 52;
/// Size of `struct ethtool_flow_ext`.
const FLOW_EXT_LEN: usize = 20;

/// `FLOW_EXT` / `FLOW_MAC_EXT` bits live above the flow type.
const FLOW_TYPE_MASK: u32 = 0x00ff_ffff;

/// Drop action in `ring_cookie`.
pub const RX_CLS_FLOW_DISC: u64 = u64::MAX;

/// Offsets inside `struct ethtool_rx_flow_spec`.
const FS_H_U: usize = 4;
const FS_M_U: usize = FS_H_U + FLOW_UNION_LEN + FLOW_EXT_LEN;
const FS_RING_COOKIE: usize = align_up(FS_M_U + FLOW_UNION_LEN + FLOW_EXT_LEN, std::mem::align_of::<u64>());
const FS_LOCATION: usize = FS_RING_COOKIE + 8;
/// `sizeof(struct ethtool_rx_flow_spec)`.
pub const FLOW_SPEC_LEN: usize = align_up(FS_LOCATION + 4, std::mem::align_of::<u64>());

/// Offsets inside `struct ethtool_rxnfc`.
const NFC_DATA: usize = 8;
const NFC_FS: usize = align_up(NFC_DATA + 8, std::mem::align_of::<u64>());
const NFC_RULE_CNT: usize = NFC_FS + FLOW_SPEC_LEN;
/// Offset of the `rule_locs` flexible array.
pub const NFC_RULE_LOCS: usize = NFC_RULE_CNT + 4;

/// `struct ethtool_rxnfc` with its flow spec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RxNfc {
    pub flow_type: u32,
    /// Hash fields, ring count or rule table size, depending on `cmd`.
    pub data: u64,
    pub fs: FlowSpec,
    pub rule_cnt: u32,
}

/// `struct ethtool_rx_flow_spec`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowSpec {
    pub flow_type: u32,
    pub value: NtupleMatch,
    pub mask: NtupleMatch,
    pub ring_cookie: u64,
    pub location: u32,
}

impl RxNfc {
    /// A request carrying only a flow type and data word.
    pub fn new(flow_type: u32, data: u64) -> Self {
        Self {
            flow_type,
            data,
            fs: FlowSpec::default(),
            rule_cnt: 0,
        }
    }

    /// A request carrying a flow spec.
    pub fn with_spec(fs: FlowSpec) -> Self {
        Self {
            flow_type: 0,
            data: 0,
            fs,
            rule_cnt: 0,
        }
    }
}

impl LegacyRecord for RxNfc {
    const SIZE: usize = align_up(NFC_RULE_LOCS, std::mem::align_of::<u64>());

    fn encode(&self, cmd: u32, buf: &mut [u8]) {
        put_u32(buf, 0, cmd);
        put_u32(buf, 4, self.flow_type);
        put_u64(buf, NFC_DATA, self.data);
        self.fs.encode(&mut buf[NFC_FS..NFC_FS + FLOW_SPEC_LEN]);
        put_u32(buf, NFC_RULE_CNT, self.rule_cnt);
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let _cmd = u32_at(input)?;
        let flow_type = u32_at(input)?;
        let data = u64_at(input)?;
        skip(input, NFC_FS - NFC_DATA - 8)?;
        let fs = FlowSpec::parse(input)?;
        let rule_cnt = u32_at(input)?;
        Ok(Self {
            flow_type,
            data,
            fs,
            rule_cnt,
        })
    }
}

impl FlowSpec {
    /// The spec the kernel expects for a rule.
    pub fn from_rule(rule: &NtupleRule) -> Self {
        Self {
            flow_type: rule.flow_type.to_u32(),
            value: rule.value,
            mask: rule.mask,
            ring_cookie: rule.action.unwrap_or(RX_CLS_FLOW_DISC),
            location: rule.location,
        }
    }

    /// The rule this spec describes, `None` for flow types we do not model.
    pub fn to_rule(&self) -> Option<NtupleRule> {
        let flow_type = FlowType::from_u32(self.flow_type & FLOW_TYPE_MASK)?;
        Some(NtupleRule {
            flow_type,
            value: self.value,
            mask: self.mask,
            action: (self.ring_cookie != RX_CLS_FLOW_DISC).then_some(self.ring_cookie),
            location: self.location,
        })
    }

    fn encode(&self, buf: &mut [u8]) {
        put_u32(buf, 0, self.flow_type);
        let ether = self.flow_type & FLOW_TYPE_MASK == FlowType::Ether.to_u32();
        encode_flow_union(&mut buf[FS_H_U..FS_H_U + FLOW_UNION_LEN], &self.value, ether);
        encode_flow_union(&mut buf[FS_M_U..FS_M_U + FLOW_UNION_LEN], &self.mask, ether);
        put_u64(buf, FS_RING_COOKIE, self.ring_cookie);
        put_u32(buf, FS_LOCATION, self.location);
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let flow_type = u32_at(input)?;
        let ether = flow_type & FLOW_TYPE_MASK == FlowType::Ether.to_u32();
        let value = parse_flow_union(input, ether)?;
        skip(input, FLOW_EXT_LEN)?;
        let mask = parse_flow_union(input, ether)?;
        skip(input, FLOW_EXT_LEN)?;
        skip(input, FS_RING_COOKIE - (FS_M_U + FLOW_UNION_LEN + FLOW_EXT_LEN))?;
        let ring_cookie = u64_at(input)?;
        let location = u32_at(input)?;
        skip(input, FLOW_SPEC_LEN - FS_LOCATION - 4)?;
        Ok(Self {
            flow_type,
            value,
            mask,
            ring_cookie,
            location,
        })
    }
}

/// `ethtool_tcpip4_spec` / `ethtool_ah_espip4_spec` or `ethhdr`.
///
/// Addresses, ports and the ethertype travel in network order.
fn encode_flow_union(buf: &mut [u8], m: &NtupleMatch, ether: bool) {
    if ether {
        buf[0..6].copy_from_slice(&m.dst_mac);
        buf[6..12].copy_from_slice(&m.src_mac);
        buf[12..14].copy_from_slice(&m.proto.to_be_bytes());
    } else {
        buf[0..4].copy_from_slice(&m.src_ip.to_be_bytes());
        buf[4..8].copy_from_slice(&m.dst_ip.to_be_bytes());
        buf[8..10].copy_from_slice(&m.src_port.to_be_bytes());
        buf[10..12].copy_from_slice(&m.dst_port.to_be_bytes());
        buf[12] = m.tos;
    }
}

fn parse_flow_union(input: &mut &[u8], ether: bool) -> PResult<NtupleMatch> {
    let mut m = NtupleMatch::default();
    if ether {
        m.dst_mac = bytes6(input)?;
        m.src_mac = bytes6(input)?;
        m.proto = be16_at(input)?;
        skip(input, FLOW_UNION_LEN - 14)?;
    } else {
        m.src_ip = be32_at(input)?;
        m.dst_ip = be32_at(input)?;
        m.src_port = be16_at(input)?;
        m.dst_port = be16_at(input)?;
        m.tos = u8_at(input)?;
        skip(input, FLOW_UNION_LEN - 13)?;
    }
    Ok(m)
}

// =============================================================================
// Flash, permanent address
// =============================================================================

/// `struct ethtool_flash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashRecord {
    pub region: u32,
    pub file: String,
}

impl LegacyRecord for FlashRecord {
    const SIZE: usize = 8 + ETHTOOL_FLASH_MAX_FILENAME;

    fn encode(&self, cmd: u32, buf: &mut [u8]) {
        put_u32(buf, 0, cmd);
        put_u32(buf, 4, self.region);
        let name = self.file.as_bytes();
        let n = name.len().min(ETHTOOL_FLASH_MAX_FILENAME - 1);
        buf[8..8 + n].copy_from_slice(&name[..n]);
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let _cmd = u32_at(input)?;
        let region = u32_at(input)?;
        let file = cstr(input, ETHTOOL_FLASH_MAX_FILENAME)?;
        Ok(Self { region, file })
    }
}

/// `struct ethtool_perm_addr` with room for [`MAX_ADDR_LEN`] bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermAddrRecord {
    pub addr: Vec<u8>,
}

impl LegacyRecord for PermAddrRecord {
    const SIZE: usize = 8 + MAX_ADDR_LEN;

    fn encode(&self, cmd: u32, buf: &mut [u8]) {
        put_u32(buf, 0, cmd);
        put_u32(buf, 4, MAX_ADDR_LEN as u32);
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let _cmd = u32_at(input)?;
        let size = (u32_at(input)? as usize).min(MAX_ADDR_LEN);
        let data: &[u8] = take(MAX_ADDR_LEN).parse_next(input)?;
        Ok(Self {
            addr: data[..size].to_vec(),
        })
    }
}

// =============================================================================
// Variable-length records
// =============================================================================

/// Headers of the records that end in a kernel-sized array.
///
/// Each header is followed by `len` elements of `elem_size` bytes; the
/// two-phase fetch in [`super::sized`] allocates header plus payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizedHeader {
    /// `struct ethtool_regs`: `cmd, version, len, data[len]`.
    Regs,
    /// `struct ethtool_eeprom`: `cmd, magic, offset, len, data[len]`.
    Eeprom { magic: u32, offset: u32 },
    /// `struct ethtool_gstrings`: `cmd, string_set, len, data[len * 32]`.
    Strings { string_set: u32 },
    /// `struct ethtool_stats`: `cmd, n_stats, data[n_stats] (u64)`.
    Stats,
    /// `struct ethtool_test`: `cmd, flags, reserved, len, data[len] (u64)`.
    Test { flags: u32 },
}

impl SizedHeader {
    /// Bytes before the array.
    pub fn header_len(self) -> usize {
        match self {
            SizedHeader::Regs | SizedHeader::Strings { .. } => 12,
            SizedHeader::Eeprom { .. } | SizedHeader::Test { .. } => 16,
            SizedHeader::Stats => 8,
        }
    }

    /// Bytes per array element.
    pub fn elem_size(self) -> usize {
        match self {
            SizedHeader::Regs | SizedHeader::Eeprom { .. } => 1,
            SizedHeader::Strings { .. } => ETH_GSTRING_LEN,
            SizedHeader::Stats | SizedHeader::Test { .. } => 8,
        }
    }

    /// Offset of the element-count field.
    fn len_offset(self) -> usize {
        match self {
            SizedHeader::Regs | SizedHeader::Strings { .. } => 8,
            SizedHeader::Eeprom { .. } | SizedHeader::Test { .. } => 12,
            SizedHeader::Stats => 4,
        }
    }

    /// Write the header asking for `len` elements.
    pub fn encode(self, cmd: u32, len: u32, buf: &mut [u8]) {
        put_u32(buf, 0, cmd);
        match self {
            SizedHeader::Eeprom { magic, offset } => {
                put_u32(buf, 4, magic);
                put_u32(buf, 8, offset);
            }
            SizedHeader::Strings { string_set } => put_u32(buf, 4, string_set),
            SizedHeader::Test { flags } => put_u32(buf, 4, flags),
            SizedHeader::Regs | SizedHeader::Stats => {}
        }
        put_u32(buf, self.len_offset(), len);
    }

    /// The second header word (`version` of a register dump, `flags` of a
    /// self-test, `offset` of an EEPROM read).
    pub fn word(buf: &[u8], off: usize) -> Result<u32> {
        let mut input = buf.get(off..).ok_or(Error::Truncated {
            expected: off + 4,
            actual: buf.len(),
        })?;
        u32_at(&mut input).map_err(|_| Error::Truncated {
            expected: off + 4,
            actual: buf.len(),
        })
    }

    /// Element count the kernel wrote back.
    pub fn returned_len(self, buf: &[u8]) -> Result<u32> {
        Self::word(buf, self.len_offset())
    }
}

/// `struct ethtool_sset_info` asking about one string set.
pub struct SsetInfo;

impl SsetInfo {
    /// Header plus one u32 of payload.
    pub const SIZE: usize = 16 + 4;

    pub fn encode(cmd: u32, string_set: u32, buf: &mut [u8]) {
        put_u32(buf, 0, cmd);
        put_u64(buf, 8, 1u64 << string_set);
    }

    /// Length of the set, `None` when the kernel cleared its mask bit.
    pub fn decode(buf: &[u8], string_set: u32) -> Result<Option<u32>> {
        let parse = |input: &mut &[u8]| -> PResult<(u64, u32)> {
            let _cmd = u32_at(input)?;
            let _reserved = u32_at(input)?;
            let mask = u64_at(input)?;
            let len = u32_at(input)?;
            Ok((mask, len))
        };
        let (mask, len) = parse(&mut &buf[..]).map_err(|_| Error::Truncated {
            expected: Self::SIZE,
            actual: buf.len(),
        })?;
        Ok((mask & (1u64 << string_set) != 0).then_some(len))
    }
}

/// Split a `GSTRINGS` payload into names.
pub fn parse_strings(data: &[u8], count: usize) -> Result<Vec<String>> {
    let mut input = data;
    (0..count)
        .map(|_| {
            cstr(&mut input, ETH_GSTRING_LEN).map_err(|_| Error::Truncated {
                expected: count * ETH_GSTRING_LEN,
                actual: data.len(),
            })
        })
        .collect()
}

/// Split a payload of native-order u64 values.
pub fn parse_u64s(data: &[u8], count: usize) -> Result<Vec<u64>> {
    let mut input = data;
    (0..count)
        .map(|_| {
            u64_at(&mut input).map_err(|_| Error::Truncated {
                expected: count * 8,
                actual: data.len(),
            })
        })
        .collect()
}

/// Split a payload of native-order u32 values.
pub fn parse_u32s(data: &[u8], count: usize) -> Result<Vec<u32>> {
    let mut input = data;
    (0..count)
        .map(|_| {
            u32_at(&mut input).map_err(|_| Error::Truncated {
                expected: count * 4,
                actual: data.len(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_cmd_layout() {
        let cmd = LinkCmd {
            supported: 0x2ef,
            advertising: 0x2f,
            speed: 100_000,
            duplex: 1,
            port: 3,
            phy_address: 7,
            autoneg: 1,
            eth_tp_mdix_ctrl: 3,
            lp_advertising: 0x0c,
            ..Default::default()
        };
        let buf = cmd.to_bytes(0x2);
        assert_eq!(buf.len(), 44);
        assert_eq!(&buf[0..4], &2u32.to_ne_bytes());
        assert_eq!(&buf[12..14], &(100_000u32 as u16).to_ne_bytes());
        assert_eq!(&buf[28..30], &((100_000u32 >> 16) as u16).to_ne_bytes());
        assert_eq!(buf[14], 1);
        assert_eq!(buf[16], 7);
        assert_eq!(buf[31], 3);
        assert_eq!(LinkCmd::decode(&buf).unwrap(), cmd);
    }

    #[test]
    fn compat_record_keeps_core_fields() {
        let cmd = LinkCmd {
            supported: 0x0f,
            speed: 100,
            duplex: 1,
            autoneg: 1,
            maxtxpkt: 9,
            ..Default::default()
        };
        let old = LinkCmd22::from(&cmd);
        let buf = old.to_bytes(0x1);
        assert_eq!(buf.len(), 16);
        assert_eq!(&buf[8..10], &100u16.to_ne_bytes());
        assert_eq!(buf[14], 1);

        let back = LinkCmd::from(&LinkCmd22::decode(&buf).unwrap());
        assert_eq!(back.speed, 100);
        assert_eq!(back.maxtxpkt, 0);
    }

    #[test]
    fn drvinfo_strings_and_lengths() {
        let mut buf = vec![0u8; DriverInfo::SIZE];
        put_u32(&mut buf, 0, 0x3);
        buf[4..9].copy_from_slice(b"e1000");
        buf[100..112].copy_from_slice(b"0000:00:19.0");
        put_u32(&mut buf, 180, 42);
        put_u32(&mut buf, 188, 128);
        put_u32(&mut buf, 192, 4096);

        let info = DriverInfo::decode(&buf).unwrap();
        assert_eq!(info.driver, "e1000");
        assert_eq!(info.bus_info, "0000:00:19.0");
        assert_eq!(info.n_stats, 42);
        assert_eq!(info.eedump_len, 128);
        assert_eq!(info.regdump_len, 4096);
    }

    #[test]
    fn truncated_reply() {
        let err = RingRecord::decode(&[0u8; 20]).unwrap_err();
        assert!(matches!(
            err,
            Error::Truncated {
                expected: 36,
                actual: 20
            }
        ));
    }

    #[test]
    fn wol_sopass_offset() {
        let wol = WolRecord {
            supported: 0x21,
            wolopts: 0x20,
            sopass: [1, 2, 3, 4, 5, 6],
        };
        let buf = wol.to_bytes(0x6);
        assert_eq!(&buf[12..18], &[1, 2, 3, 4, 5, 6]);
        assert_eq!(WolRecord::decode(&buf).unwrap(), wol);
    }

    #[test]
    fn coalesce_field_positions() {
        let mut rec = CoalesceRecord::default();
        rec.fields[0] = 50;
        rec.fields[COALESCE_ADAPTIVE_TX] = 1;
        rec.fields[21] = 7;
        let buf = rec.to_bytes(0xf);
        assert_eq!(buf.len(), 92);
        assert_eq!(&buf[4..8], &50u32.to_ne_bytes());
        assert_eq!(&buf[44..48], &1u32.to_ne_bytes());
        assert_eq!(&buf[88..92], &7u32.to_ne_bytes());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn rxnfc_layout_matches_kernel() {
        assert_eq!(FLOW_SPEC_LEN, 168);
        assert_eq!(RxNfc::SIZE, 192);
        assert_eq!(NFC_RULE_LOCS, 188);
    }

    #[test]
    fn default_rxnfc_is_an_empty_request() {
        let nfc = RxNfc::default();
        assert_eq!(nfc, RxNfc::new(0, 0));
        assert!(nfc.to_bytes(0x2e)[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn flow_spec_network_order() {
        let rule = NtupleRule {
            flow_type: FlowType::Tcp4,
            value: NtupleMatch {
                src_ip: u32::from_be_bytes([192, 168, 0, 1]),
                dst_port: 80,
                ..Default::default()
            },
            mask: NtupleMatch {
                src_ip: u32::MAX,
                dst_port: u16::MAX,
                ..Default::default()
            },
            action: Some(3),
            location: 5,
        };
        let nfc = RxNfc::with_spec(FlowSpec::from_rule(&rule));
        let buf = nfc.to_bytes(0x32);
        let fs = &buf[NFC_FS..];
        assert_eq!(&fs[4..8], &[192, 168, 0, 1]);
        assert_eq!(&fs[14..16], &80u16.to_be_bytes());

        let back = RxNfc::decode(&buf).unwrap();
        assert_eq!(back.fs.to_rule(), Some(rule));
    }

    #[test]
    fn drop_action_uses_disc_cookie() {
        let rule = NtupleRule {
            flow_type: FlowType::Ether,
            value: NtupleMatch {
                dst_mac: [0, 1, 2, 3, 4, 5],
                proto: 0x0800,
                ..Default::default()
            },
            mask: NtupleMatch::default(),
            action: None,
            location: 1,
        };
        let fs = FlowSpec::from_rule(&rule);
        assert_eq!(fs.ring_cookie, RX_CLS_FLOW_DISC);
        let buf = RxNfc::with_spec(fs).to_bytes(0x32);
        assert_eq!(&buf[NFC_FS + 4..NFC_FS + 10], &[0, 1, 2, 3, 4, 5]);
        assert_eq!(&buf[NFC_FS + 16..NFC_FS + 18], &[0x08, 0x00]);
    }

    #[test]
    fn sized_headers() {
        let mut buf = vec![0u8; 16];
        SizedHeader::Eeprom {
            magic: 0xdead,
            offset: 0x10,
        }
        .encode(0xb, 64, &mut buf);
        assert_eq!(SizedHeader::word(&buf, 4).unwrap(), 0xdead);
        assert_eq!(SizedHeader::word(&buf, 8).unwrap(), 0x10);
        assert_eq!(
            SizedHeader::Eeprom { magic: 0, offset: 0 }
                .returned_len(&buf)
                .unwrap(),
            64
        );

        let mut buf = vec![0u8; 12];
        SizedHeader::Strings { string_set: 1 }.encode(0x1b, 3, &mut buf);
        assert_eq!(SizedHeader::word(&buf, 4).unwrap(), 1);
        assert_eq!(SizedHeader::Stats.header_len(), 8);
        assert_eq!(SizedHeader::Test { flags: 0 }.elem_size(), 8);
    }

    #[test]
    fn sset_info_mask() {
        let mut buf = vec![0u8; SsetInfo::SIZE];
        SsetInfo::encode(0x37, 1, &mut buf);
        assert_eq!(&buf[8..16], &2u64.to_ne_bytes());
        put_u32(&mut buf, 16, 57);
        assert_eq!(SsetInfo::decode(&buf, 1).unwrap(), Some(57));
        put_u64(&mut buf, 8, 0);
        assert_eq!(SsetInfo::decode(&buf, 1).unwrap(), None);
    }

    #[test]
    fn string_table() {
        let mut data = vec![0u8; 2 * ETH_GSTRING_LEN];
        data[..8].copy_from_slice(b"rx_bytes");
        data[32..40].copy_from_slice(b"tx_bytes");
        assert_eq!(parse_strings(&data, 2).unwrap(), ["rx_bytes", "tx_bytes"]);
        assert!(parse_strings(&data, 3).is_err());
    }
}
