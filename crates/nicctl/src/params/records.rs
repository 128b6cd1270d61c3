//! Request records, one per command family, with their option tables.

use std::net::Ipv4Addr;

use super::value::parse_hex_u64;
use super::{FlagSet, OptKind, OptSpec, ParseError, Radix, Wanted, parse_bool, parse_int};
use crate::types::{
    Duplex, FlowType, MSG_CLASSES, MdiX, NtupleMatch, NtupleRule, Port, SOPASS_MAX, Transceiver,
    rxh, test_flags, wake,
};

/// `RX_CLS_LOC_ANY`: let the driver choose the rule slot.
pub const RX_CLS_LOC_ANY: u32 = 0xffff_ffff;

macro_rules! u32_opt {
    ($name:literal, $field:ident) => {
        OptSpec::new(
            $name,
            OptKind::Int {
                min: 0,
                max: u32::MAX as i64,
                radix: Radix::Dec,
                store: |r: &mut Self, v| r.$field = Wanted::Value(v as u32),
            },
        )
    };
}

macro_rules! bool_opt {
    ($name:literal, $field:ident) => {
        OptSpec::new(
            $name,
            OptKind::Bool(|r: &mut Self, on| {
                r.$field = if on { Wanted::Value(true) } else { Wanted::Off }
            }),
        )
    };
}

// =============================================================================
// Link settings (-s)
// =============================================================================

/// `-s`: link settings, Wake-on-LAN and message level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRequest {
    pub speed: Wanted<u32>,
    pub lanes: Wanted<u32>,
    pub duplex: Wanted<Duplex>,
    pub port: Wanted<Port>,
    pub mdix: Wanted<MdiX>,
    pub autoneg: Wanted<bool>,
    /// Advertised link-mode mask.
    pub advertise: Wanted<u64>,
    pub phyad: Wanted<u8>,
    pub xcvr: Wanted<Transceiver>,
    pub wol: Wanted<u32>,
    pub sopass: Wanted<[u8; SOPASS_MAX]>,
    /// `msglvl N`.
    pub msglvl: Wanted<u32>,
    /// `msglvl TYPE on|off ...`.
    pub msglvl_flags: FlagSet,
}

impl LinkRequest {
    pub fn options() -> Vec<OptSpec<Self>> {
        vec![
            u32_opt!("speed", speed),
            OptSpec::new(
                "lanes",
                OptKind::Int {
                    min: 1,
                    max: 8,
                    radix: Radix::Dec,
                    store: |r, v| r.lanes = Wanted::Value(v as u32),
                },
            ),
            OptSpec::new(
                "duplex",
                OptKind::Choice(&[("half", 0), ("full", 1)], |r, v| {
                    r.duplex = Wanted::Value(Duplex::from_u8(v as u8))
                }),
            ),
            OptSpec::new(
                "port",
                OptKind::Choice(
                    &[("tp", 0), ("aui", 1), ("mii", 2), ("fibre", 3), ("bnc", 4), ("da", 5)],
                    |r, v| r.port = Wanted::Value(Port::from_u8(v as u8)),
                ),
            ),
            OptSpec::new(
                "mdix",
                OptKind::Choice(&[("off", 1), ("on", 2), ("auto", 3)], |r, v| {
                    r.mdix = Wanted::Value(MdiX::from_u8(v as u8))
                }),
            ),
            bool_opt!("autoneg", autoneg),
            OptSpec::new("advertise", OptKind::Custom(parse_advertise)),
            OptSpec::new(
                "phyad",
                OptKind::Int {
                    min: 0,
                    max: 255,
                    radix: Radix::Dec,
                    store: |r, v| r.phyad = Wanted::Value(v as u8),
                },
            ),
            OptSpec::new(
                "xcvr",
                OptKind::Choice(&[("internal", 0), ("external", 1)], |r, v| {
                    r.xcvr = Wanted::Value(Transceiver::from_u8(v as u8))
                }),
            ),
            OptSpec::new("wol", OptKind::Custom(parse_wol)),
            OptSpec::new("sopass", OptKind::Custom(parse_sopass)),
            OptSpec::new(
                "msglvl",
                OptKind::Nested {
                    numeric: |r, v| r.msglvl = Wanted::Value(v),
                    table: msglvl_options,
                },
            ),
        ]
    }

    /// Any of the link-mode or link-info fields was given.
    pub fn link_changed(&self) -> bool {
        self.speed.is_set()
            || self.lanes.is_set()
            || self.duplex.is_set()
            || self.port.is_set()
            || self.mdix.is_set()
            || self.autoneg.is_set()
            || self.advertise.is_set()
            || self.phyad.is_set()
            || self.xcvr.is_set()
    }

    pub fn wol_changed(&self) -> bool {
        self.wol.is_set() || self.sopass.is_set()
    }

    pub fn msglvl_changed(&self) -> bool {
        self.msglvl.is_set() || !self.msglvl_flags.is_empty()
    }

    /// The transceiver can only be written through the legacy interface.
    pub fn needs_legacy(&self) -> bool {
        self.xcvr.is_set()
    }

    /// Message level after merging onto `current`.
    pub fn merged_msglvl(&self, current: u32) -> u32 {
        match self.msglvl.value() {
            Some(v) => *v,
            None => self.msglvl_flags.merge(current),
        }
    }
}

fn msglvl_flags(r: &mut LinkRequest) -> &mut FlagSet {
    &mut r.msglvl_flags
}

fn msglvl_options() -> Vec<OptSpec<LinkRequest>> {
    MSG_CLASSES
        .iter()
        .enumerate()
        .map(|(bit, name)| {
            OptSpec::new(
                *name,
                OptKind::Flag {
                    bit: 1 << bit,
                    flags: msglvl_flags,
                },
            )
        })
        .collect()
}

fn parse_advertise(r: &mut LinkRequest, s: &str) -> Result<(), ParseError> {
    let mask = parse_hex_u64(s).map_err(|_| ParseError::invalid("advertise", s, "expected a hex mask"))?;
    r.advertise = Wanted::Value(mask);
    Ok(())
}

/// Parse `wol` letters. `d` clears everything given so far.
pub fn parse_wol(r: &mut LinkRequest, s: &str) -> Result<(), ParseError> {
    let mut mask = 0u32;
    for c in s.chars() {
        if c == 'd' {
            mask = 0;
            continue;
        }
        let bit = wake::LETTERS
            .iter()
            .find(|(letter, _)| *letter == c)
            .map(|(_, bit)| *bit)
            .ok_or_else(|| ParseError::invalid("wol", s, format!("unknown mode '{c}'")))?;
        mask |= bit;
    }
    if s.is_empty() {
        return Err(ParseError::invalid("wol", s, "no modes given"));
    }
    r.wol = if mask == 0 {
        Wanted::Off
    } else {
        Wanted::Value(mask)
    };
    Ok(())
}

fn parse_sopass(r: &mut LinkRequest, s: &str) -> Result<(), ParseError> {
    let bytes = crate::util::addr::parse_mac(s)
        .map_err(|_| ParseError::invalid("sopass", s, "expected xx:xx:xx:xx:xx:xx"))?;
    r.sopass = Wanted::Value(bytes);
    Ok(())
}

// =============================================================================
// Pause, rings, channels, coalescing
// =============================================================================

/// `-A`: pause frame settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PauseRequest {
    pub autoneg: Wanted<bool>,
    pub rx: Wanted<bool>,
    pub tx: Wanted<bool>,
}

impl PauseRequest {
    pub fn options() -> Vec<OptSpec<Self>> {
        vec![
            bool_opt!("autoneg", autoneg),
            bool_opt!("rx", rx),
            bool_opt!("tx", tx),
        ]
    }

    pub fn is_empty(&self) -> bool {
        !(self.autoneg.is_set() || self.rx.is_set() || self.tx.is_set())
    }
}

/// `-G`: ring sizes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RingRequest {
    pub rx: Wanted<u32>,
    pub rx_mini: Wanted<u32>,
    pub rx_jumbo: Wanted<u32>,
    pub tx: Wanted<u32>,
}

impl RingRequest {
    pub fn options() -> Vec<OptSpec<Self>> {
        vec![
            u32_opt!("rx", rx),
            u32_opt!("rx-mini", rx_mini),
            u32_opt!("rx-jumbo", rx_jumbo),
            u32_opt!("tx", tx),
        ]
    }

    pub fn is_empty(&self) -> bool {
        !(self.rx.is_set() || self.rx_mini.is_set() || self.rx_jumbo.is_set() || self.tx.is_set())
    }
}

/// `-L`: channel counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelRequest {
    pub rx: Wanted<u32>,
    pub tx: Wanted<u32>,
    pub other: Wanted<u32>,
    pub combined: Wanted<u32>,
}

impl ChannelRequest {
    pub fn options() -> Vec<OptSpec<Self>> {
        vec![
            u32_opt!("rx", rx),
            u32_opt!("tx", tx),
            u32_opt!("other", other),
            u32_opt!("combined", combined),
        ]
    }

    pub fn is_empty(&self) -> bool {
        !(self.rx.is_set() || self.tx.is_set() || self.other.is_set() || self.combined.is_set())
    }
}

/// `-C`: interrupt coalescing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoalesceRequest {
    pub adaptive_rx: Wanted<bool>,
    pub adaptive_tx: Wanted<bool>,
    pub rx_usecs: Wanted<u32>,
    pub rx_frames: Wanted<u32>,
    pub rx_usecs_irq: Wanted<u32>,
    pub rx_frames_irq: Wanted<u32>,
    pub tx_usecs: Wanted<u32>,
    pub tx_frames: Wanted<u32>,
    pub tx_usecs_irq: Wanted<u32>,
    pub tx_frames_irq: Wanted<u32>,
    pub stats_block_usecs: Wanted<u32>,
    pub pkt_rate_low: Wanted<u32>,
    pub rx_usecs_low: Wanted<u32>,
    pub rx_frames_low: Wanted<u32>,
    pub tx_usecs_low: Wanted<u32>,
    pub tx_frames_low: Wanted<u32>,
    pub pkt_rate_high: Wanted<u32>,
    pub rx_usecs_high: Wanted<u32>,
    pub rx_frames_high: Wanted<u32>,
    pub tx_usecs_high: Wanted<u32>,
    pub tx_frames_high: Wanted<u32>,
    pub rate_sample_interval: Wanted<u32>,
}

impl CoalesceRequest {
    pub fn options() -> Vec<OptSpec<Self>> {
        vec![
            bool_opt!("adaptive-rx", adaptive_rx),
            bool_opt!("adaptive-tx", adaptive_tx),
            u32_opt!("sample-interval", rate_sample_interval),
            u32_opt!("stats-block-usecs", stats_block_usecs),
            u32_opt!("pkt-rate-low", pkt_rate_low),
            u32_opt!("pkt-rate-high", pkt_rate_high),
            u32_opt!("rx-usecs", rx_usecs),
            u32_opt!("rx-frames", rx_frames),
            u32_opt!("rx-usecs-irq", rx_usecs_irq),
            u32_opt!("rx-frames-irq", rx_frames_irq),
            u32_opt!("tx-usecs", tx_usecs),
            u32_opt!("tx-frames", tx_frames),
            u32_opt!("tx-usecs-irq", tx_usecs_irq),
            u32_opt!("tx-frames-irq", tx_frames_irq),
            u32_opt!("rx-usecs-low", rx_usecs_low),
            u32_opt!("rx-frames-low", rx_frames_low),
            u32_opt!("tx-usecs-low", tx_usecs_low),
            u32_opt!("tx-frames-low", tx_frames_low),
            u32_opt!("rx-usecs-high", rx_usecs_high),
            u32_opt!("rx-frames-high", rx_frames_high),
            u32_opt!("tx-usecs-high", tx_usecs_high),
            u32_opt!("tx-frames-high", tx_frames_high),
        ]
    }

    /// The u32 fields in `struct ethtool_coalesce` order, after `cmd`.
    ///
    /// The adaptive flags sit at positions 9 and 10 and are handled by
    /// the caller.
    pub fn u32_fields(&self) -> [(usize, &Wanted<u32>); 20] {
        [
            (0, &self.rx_usecs),
            (1, &self.rx_frames),
            (2, &self.rx_usecs_irq),
            (3, &self.rx_frames_irq),
            (4, &self.tx_usecs),
            (5, &self.tx_frames),
            (6, &self.tx_usecs_irq),
            (7, &self.tx_frames_irq),
            (8, &self.stats_block_usecs),
            (11, &self.pkt_rate_low),
            (12, &self.rx_usecs_low),
            (13, &self.rx_frames_low),
            (14, &self.tx_usecs_low),
            (15, &self.tx_frames_low),
            (16, &self.pkt_rate_high),
            (17, &self.rx_usecs_high),
            (18, &self.rx_frames_high),
            (19, &self.tx_usecs_high),
            (20, &self.tx_frames_high),
            (21, &self.rate_sample_interval),
        ]
    }

    pub fn is_empty(&self) -> bool {
        !self.adaptive_rx.is_set()
            && !self.adaptive_tx.is_set()
            && self.u32_fields().iter().all(|(_, w)| !w.is_set())
    }
}

// =============================================================================
// Features (-K)
// =============================================================================

/// `-K`: feature changes in command-line order, one entry per name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureRequest {
    pub changes: Vec<(String, bool)>,
}

impl FeatureRequest {
    /// Parse `NAME on|off` pairs. Names are checked by the transport,
    /// since the set of features is only known to the kernel.
    pub fn parse(tokens: &[String]) -> Result<Self, ParseError> {
        let mut req = Self::default();
        let mut iter = tokens.iter();
        while let Some(name) = iter.next() {
            let value = iter
                .next()
                .ok_or_else(|| ParseError::MissingValue(name.clone()))?;
            let on = parse_bool(value)
                .ok_or_else(|| ParseError::invalid(name, value, "expected on or off"))?;
            match req.changes.iter_mut().find(|(n, _)| n == name) {
                Some(entry) => entry.1 = on,
                None => req.changes.push((name.clone(), on)),
            }
        }
        if req.changes.is_empty() {
            return Err(ParseError::Usage("no offload settings changed".into()));
        }
        Ok(req)
    }
}

// =============================================================================
// Rx flow classification (-n / -N)
// =============================================================================

/// `-n`: what to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NfcQuery {
    FlowHash(FlowType),
    Rules,
    Rule(u32),
}

impl NfcQuery {
    pub fn parse(tokens: &[String]) -> Result<Self, ParseError> {
        match tokens {
            [] => Ok(NfcQuery::Rules),
            [opt, flow] if opt == "rx-flow-hash" => Ok(NfcQuery::FlowHash(parse_flow_type(flow)?)),
            [opt, loc] if opt == "rule" => {
                let loc = parse_int(loc, Radix::Auto)
                    .ok()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| ParseError::invalid("rule", loc, "expected a rule location"))?;
                Ok(NfcQuery::Rule(loc))
            }
            [opt, ..] if opt == "rx-flow-hash" || opt == "rule" => {
                Err(ParseError::MissingValue(opt.clone()))
            }
            [opt, ..] => Err(ParseError::UnknownOption(opt.clone())),
        }
    }
}

/// `-N`: what to change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NfcRequest {
    FlowHash { flow: FlowType, fields: u64 },
    Insert(RuleRequest),
    Delete(u32),
}

impl NfcRequest {
    pub fn parse(tokens: &[String]) -> Result<Self, ParseError> {
        match tokens {
            [opt, flow, fields] if opt == "rx-flow-hash" => Ok(NfcRequest::FlowHash {
                flow: parse_flow_type(flow)?,
                fields: parse_rxh_fields(fields)?,
            }),
            [opt, loc] if opt == "delete" => {
                let loc = parse_int(loc, Radix::Auto)
                    .ok()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| ParseError::invalid("delete", loc, "expected a rule location"))?;
                Ok(NfcRequest::Delete(loc))
            }
            [opt, flow, rest @ ..] if opt == "flow-type" => {
                let mut rule = RuleRequest::new(parse_flow_type(flow)?);
                super::parse_options(rest, &RuleRequest::options(), &mut rule)?;
                rule.validate()?;
                Ok(NfcRequest::Insert(rule))
            }
            [opt, ..] if opt == "rx-flow-hash" || opt == "delete" || opt == "flow-type" => {
                Err(ParseError::MissingValue(opt.clone()))
            }
            [opt, ..] => Err(ParseError::UnknownOption(opt.clone())),
            [] => Err(ParseError::Usage("no flow classification change given".into())),
        }
    }
}

fn parse_flow_type(s: &str) -> Result<FlowType, ParseError> {
    FlowType::from_name(s).ok_or_else(|| ParseError::invalid("flow type", s, "unknown flow type"))
}

/// Parse hash field letters (`m v t s d f n r`).
pub fn parse_rxh_fields(s: &str) -> Result<u64, ParseError> {
    if s.is_empty() {
        return Err(ParseError::invalid("rx-flow-hash", s, "no fields given"));
    }
    s.chars().try_fold(0u64, |acc, c| {
        rxh::FIELDS
            .iter()
            .find(|(letter, _, _)| *letter == c)
            .map(|(_, bit, _)| acc | bit)
            .ok_or_else(|| ParseError::invalid("rx-flow-hash", s, format!("unknown field '{c}'")))
    })
}

/// Rule fields a following `m MASK` applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleField {
    SrcIp,
    DstIp,
    SrcPort,
    DstPort,
    Tos,
    SrcMac,
    DstMac,
    Proto,
}

impl RuleField {
    fn option(self) -> &'static str {
        match self {
            RuleField::SrcIp => "src-ip",
            RuleField::DstIp => "dst-ip",
            RuleField::SrcPort => "src-port",
            RuleField::DstPort => "dst-port",
            RuleField::Tos => "tos",
            RuleField::SrcMac => "src",
            RuleField::DstMac => "dst",
            RuleField::Proto => "proto",
        }
    }
}

/// A classification rule being built from `flow-type` options.
///
/// `mask` bits set mean "compare". A field given without `m` is compared
/// in full; `m MASK` names the bits to ignore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRequest {
    pub flow: FlowType,
    pub value: NtupleMatch,
    pub mask: NtupleMatch,
    pub action: Wanted<i64>,
    pub loc: Wanted<u32>,
    last: Option<RuleField>,
    fields: Vec<RuleField>,
}

impl RuleRequest {
    pub fn new(flow: FlowType) -> Self {
        Self {
            flow,
            value: NtupleMatch::default(),
            mask: NtupleMatch::default(),
            action: Wanted::Unset,
            loc: Wanted::Unset,
            last: None,
            fields: Vec::new(),
        }
    }

    fn touch(&mut self, field: RuleField) {
        self.last = Some(field);
        if !self.fields.contains(&field) {
            self.fields.push(field);
        }
    }

    pub fn options() -> Vec<OptSpec<Self>> {
        vec![
            OptSpec::new(
                "src-ip",
                OptKind::Ipv4(|r, a| {
                    r.value.src_ip = a.to_bits();
                    r.mask.src_ip = u32::MAX;
                    r.touch(RuleField::SrcIp);
                }),
            ),
            OptSpec::new(
                "dst-ip",
                OptKind::Ipv4(|r, a| {
                    r.value.dst_ip = a.to_bits();
                    r.mask.dst_ip = u32::MAX;
                    r.touch(RuleField::DstIp);
                }),
            ),
            OptSpec::new(
                "src-port",
                OptKind::Be16(|r, v| {
                    r.value.src_port = v;
                    r.mask.src_port = u16::MAX;
                    r.touch(RuleField::SrcPort);
                }),
            ),
            OptSpec::new(
                "dst-port",
                OptKind::Be16(|r, v| {
                    r.value.dst_port = v;
                    r.mask.dst_port = u16::MAX;
                    r.touch(RuleField::DstPort);
                }),
            ),
            OptSpec::new(
                "tos",
                OptKind::Int {
                    min: 0,
                    max: 255,
                    radix: Radix::Auto,
                    store: |r, v| {
                        r.value.tos = v as u8;
                        r.mask.tos = u8::MAX;
                        r.touch(RuleField::Tos);
                    },
                },
            ),
            OptSpec::new(
                "src",
                OptKind::Mac(|r, m| {
                    r.value.src_mac = m;
                    r.mask.src_mac = [0xff; 6];
                    r.touch(RuleField::SrcMac);
                }),
            ),
            OptSpec::new(
                "dst",
                OptKind::Mac(|r, m| {
                    r.value.dst_mac = m;
                    r.mask.dst_mac = [0xff; 6];
                    r.touch(RuleField::DstMac);
                }),
            ),
            OptSpec::new(
                "proto",
                OptKind::Be16(|r, v| {
                    r.value.proto = v;
                    r.mask.proto = u16::MAX;
                    r.touch(RuleField::Proto);
                }),
            ),
            OptSpec::new("m", OptKind::Custom(parse_rule_mask)),
            OptSpec::new(
                "action",
                OptKind::Int {
                    min: -1,
                    max: i64::MAX,
                    radix: Radix::Dec,
                    store: |r, v| r.action = Wanted::Value(v),
                },
            ),
            OptSpec::new(
                "loc",
                OptKind::Int {
                    min: 0,
                    max: u32::MAX as i64,
                    radix: Radix::Dec,
                    store: |r, v| r.loc = Wanted::Value(v as u32),
                },
            ),
        ]
    }

    /// Check field/flow-type combinations and the mandatory action.
    pub fn validate(&self) -> Result<(), ParseError> {
        for field in &self.fields {
            let ok = match field {
                RuleField::SrcIp | RuleField::DstIp | RuleField::Tos => self.flow.is_ipv4(),
                RuleField::SrcPort | RuleField::DstPort => matches!(
                    self.flow,
                    FlowType::Tcp4 | FlowType::Udp4 | FlowType::Sctp4
                ),
                RuleField::SrcMac | RuleField::DstMac | RuleField::Proto => {
                    self.flow == FlowType::Ether
                }
            };
            if !ok {
                return Err(ParseError::Usage(format!(
                    "{} does not apply to flow type {}",
                    field.option(),
                    self.flow
                )));
            }
        }
        if !self.action.is_set() {
            return Err(ParseError::MissingValue("action".into()));
        }
        Ok(())
    }

    /// The rule as the kernel stores it.
    pub fn to_rule(&self) -> NtupleRule {
        NtupleRule {
            flow_type: self.flow,
            value: self.value,
            mask: self.mask,
            action: match self.action.value() {
                Some(q) if *q >= 0 => Some(*q as u64),
                _ => None,
            },
            location: self.loc.value().copied().unwrap_or(RX_CLS_LOC_ANY),
        }
    }
}

fn parse_rule_mask(r: &mut RuleRequest, s: &str) -> Result<(), ParseError> {
    let field = r
        .last
        .ok_or_else(|| ParseError::Usage("mask given before any field".into()))?;
    let bad = |reason: &str| ParseError::invalid("m", s, reason);
    match field {
        RuleField::SrcIp | RuleField::DstIp => {
            let ignore: Ipv4Addr = crate::util::addr::parse_ipv4(s).map_err(|_| bad("expected an IPv4 mask"))?;
            let compare = !ignore.to_bits();
            if field == RuleField::SrcIp {
                r.mask.src_ip = compare;
            } else {
                r.mask.dst_ip = compare;
            }
        }
        RuleField::SrcPort | RuleField::DstPort | RuleField::Proto => {
            let ignore = parse_int(s, Radix::Auto)
                .ok()
                .and_then(|v| u16::try_from(v).ok())
                .ok_or_else(|| bad("expected a 16-bit mask"))?;
            match field {
                RuleField::SrcPort => r.mask.src_port = !ignore,
                RuleField::DstPort => r.mask.dst_port = !ignore,
                _ => r.mask.proto = !ignore,
            }
        }
        RuleField::Tos => {
            let ignore = parse_int(s, Radix::Auto)
                .ok()
                .and_then(|v| u8::try_from(v).ok())
                .ok_or_else(|| bad("expected an 8-bit mask"))?;
            r.mask.tos = !ignore;
        }
        RuleField::SrcMac | RuleField::DstMac => {
            let ignore = crate::util::addr::parse_mac(s).map_err(|_| bad("expected a MAC mask"))?;
            let compare = ignore.map(|b| !b);
            if field == RuleField::SrcMac {
                r.mask.src_mac = compare;
            } else {
                r.mask.dst_mac = compare;
            }
        }
    }
    Ok(())
}

// =============================================================================
// FEC (--set-fec)
// =============================================================================

/// `--set-fec`: encodings as typed, plus whether `auto` was among them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FecRequest {
    pub auto: bool,
    pub encodings: Vec<String>,
}

impl FecRequest {
    pub fn options() -> Vec<OptSpec<Self>> {
        vec![OptSpec::new("encoding", OptKind::Rest(parse_encodings))]
    }

    /// Kernel link-mode names for the netlink request: `off` becomes
    /// `None`, everything else is uppercased.
    pub fn kernel_names(&self) -> Vec<String> {
        self.encodings
            .iter()
            .map(|e| {
                if e.eq_ignore_ascii_case("off") {
                    "None".to_string()
                } else {
                    e.to_ascii_uppercase()
                }
            })
            .collect()
    }
}

fn parse_encodings(r: &mut FecRequest, tokens: &[String]) -> Result<usize, ParseError> {
    let mut used = 0;
    for tok in tokens {
        used += 1;
        if tok == "--" {
            break;
        }
        if tok.eq_ignore_ascii_case("auto") {
            r.auto = true;
        } else {
            r.encodings.push(tok.clone());
        }
    }
    if !r.auto && r.encodings.is_empty() {
        return Err(ParseError::MissingValue("encoding".into()));
    }
    Ok(used)
}

// =============================================================================
// Dumps, EEPROM, self-test, identify, flash
// =============================================================================

/// `-d`: register dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegDumpRequest {
    pub raw: Wanted<bool>,
    pub hex: Wanted<bool>,
}

impl RegDumpRequest {
    pub fn options() -> Vec<OptSpec<Self>> {
        vec![bool_opt!("raw", raw), bool_opt!("hex", hex)]
    }
}

/// `-e`: EEPROM dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EepromDumpRequest {
    pub raw: Wanted<bool>,
    pub offset: Wanted<u32>,
    pub length: Wanted<u32>,
}

impl EepromDumpRequest {
    pub fn options() -> Vec<OptSpec<Self>> {
        vec![
            bool_opt!("raw", raw),
            OptSpec::new(
                "offset",
                OptKind::Int {
                    min: 0,
                    max: u32::MAX as i64,
                    radix: Radix::Auto,
                    store: |r, v| r.offset = Wanted::Value(v as u32),
                },
            ),
            OptSpec::new(
                "length",
                OptKind::Int {
                    min: 0,
                    max: u32::MAX as i64,
                    radix: Radix::Auto,
                    store: |r, v| r.length = Wanted::Value(v as u32),
                },
            ),
        ]
    }
}

/// `-E`: write one EEPROM byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EepromChangeRequest {
    pub magic: Wanted<u32>,
    pub offset: Wanted<u32>,
    pub value: Wanted<u8>,
}

impl EepromChangeRequest {
    pub fn options() -> Vec<OptSpec<Self>> {
        vec![
            OptSpec::new(
                "magic",
                OptKind::Int {
                    min: 0,
                    max: u32::MAX as i64,
                    radix: Radix::Auto,
                    store: |r, v| r.magic = Wanted::Value(v as u32),
                },
            ),
            OptSpec::new(
                "offset",
                OptKind::Int {
                    min: 0,
                    max: u32::MAX as i64,
                    radix: Radix::Auto,
                    store: |r, v| r.offset = Wanted::Value(v as u32),
                },
            ),
            OptSpec::new(
                "value",
                OptKind::Int {
                    min: 0,
                    max: 255,
                    radix: Radix::Auto,
                    store: |r, v| r.value = Wanted::Value(v as u8),
                },
            ),
        ]
    }

    pub fn validate(&self) -> Result<(), ParseError> {
        for (name, set) in [
            ("magic", self.magic.is_set()),
            ("offset", self.offset.is_set()),
            ("value", self.value.is_set()),
        ] {
            if !set {
                return Err(ParseError::MissingValue(name.into()));
            }
        }
        Ok(())
    }
}

/// `-t`: self-test mode, as `ETH_TEST_FL_*` flags.
pub fn parse_test_mode(tokens: &[String]) -> Result<u32, ParseError> {
    match tokens {
        [] => Ok(test_flags::OFFLINE),
        [mode] => match mode.as_str() {
            "offline" => Ok(test_flags::OFFLINE),
            "online" => Ok(0),
            "external_lb" => Ok(test_flags::OFFLINE | test_flags::EXTERNAL_LB),
            other => Err(ParseError::invalid(
                "test mode",
                other,
                "expected offline, online or external_lb",
            )),
        },
        [_, extra, ..] => Err(ParseError::UnknownOption(extra.clone())),
    }
}

/// `-p`: blink duration in seconds, zero meaning until interrupted.
pub fn parse_identify(tokens: &[String]) -> Result<u32, ParseError> {
    match tokens {
        [] => Ok(0),
        [secs] => parse_int(secs, Radix::Dec)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| ParseError::invalid("identify", secs, "expected seconds")),
        [_, extra, ..] => Err(ParseError::UnknownOption(extra.clone())),
    }
}

/// Flash every region.
pub const ETHTOOL_FLASH_ALL_REGIONS: u32 = 0;

/// `-f`: firmware file and region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashRequest {
    pub file: String,
    pub region: u32,
}

impl FlashRequest {
    pub fn parse(tokens: &[String]) -> Result<Self, ParseError> {
        let (file, region) = match tokens {
            [file] => (file, ETHTOOL_FLASH_ALL_REGIONS),
            [file, region] => {
                let region = parse_int(region, Radix::Dec)
                    .ok()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| ParseError::invalid("region", region, "expected a number"))?;
                (file, region)
            }
            [] => return Err(ParseError::MissingValue("FILE".into())),
            [_, _, extra, ..] => return Err(ParseError::UnknownOption(extra.clone())),
        };
        // The driver reads the file through the firmware loader, which
        // takes a name of at most 127 bytes.
        if file.is_empty() || file.len() >= 128 {
            return Err(ParseError::invalid("flash", file, "file name must be 1-127 bytes"));
        }
        Ok(Self {
            file: file.clone(),
            region,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::parse_options;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    fn link(s: &str) -> Result<LinkRequest, ParseError> {
        let mut req = LinkRequest::default();
        parse_options(&toks(s), &LinkRequest::options(), &mut req)?;
        Ok(req)
    }

    #[test]
    fn speed_and_duplex_only() {
        let req = link("speed 100 duplex full").unwrap();
        assert_eq!(req.speed, Wanted::Value(100));
        assert_eq!(req.duplex, Wanted::Value(Duplex::Full));
        assert_eq!(
            req,
            LinkRequest {
                speed: Wanted::Value(100),
                duplex: Wanted::Value(Duplex::Full),
                ..Default::default()
            }
        );
        assert!(req.link_changed());
        assert!(!req.wol_changed());
        assert!(!req.msglvl_changed());
    }

    #[test]
    fn bogus_duplex_is_rejected() {
        assert!(matches!(
            link("speed 100 duplex bogus"),
            Err(ParseError::InvalidValue { .. })
        ));
    }

    #[test]
    fn wol_letters() {
        assert_eq!(link("wol pg").unwrap().wol, Wanted::Value(wake::PHY | wake::MAGIC));
        assert_eq!(link("wol d").unwrap().wol, Wanted::Off);
        assert_eq!(link("wol pd").unwrap().wol, Wanted::Off);
        assert_eq!(link("wol dg").unwrap().wol, Wanted::Value(wake::MAGIC));
        assert!(link("wol x").is_err());
    }

    #[test]
    fn sopass_and_xcvr() {
        let req = link("sopass 01:02:03:04:05:06 xcvr external").unwrap();
        assert_eq!(req.sopass, Wanted::Value([1, 2, 3, 4, 5, 6]));
        assert!(req.wol_changed());
        assert!(req.needs_legacy());
        assert!(link("sopass 01:02:03").is_err());
    }

    #[test]
    fn msglvl_forms() {
        let req = link("msglvl 0x7").unwrap();
        assert_eq!(req.merged_msglvl(0xff00), 0x7);

        let req = link("msglvl link on drv off speed 10").unwrap();
        assert_eq!(req.msglvl_flags, FlagSet { value: 0b100, mask: 0b101 });
        assert_eq!(req.merged_msglvl(0b011), 0b110);
        assert_eq!(req.speed, Wanted::Value(10));
    }

    #[test]
    fn advertise_is_hex() {
        assert_eq!(link("advertise 0x2f").unwrap().advertise, Wanted::Value(0x2f));
        assert_eq!(link("advertise 2f").unwrap().advertise, Wanted::Value(0x2f));
        assert!(link("advertise xyz").is_err());
    }

    #[test]
    fn coalesce_field_positions() {
        let mut req = CoalesceRequest::default();
        parse_options(
            &toks("rx-usecs 5 sample-interval 9 adaptive-rx on"),
            &CoalesceRequest::options(),
            &mut req,
        )
        .unwrap();
        let set: Vec<usize> = req
            .u32_fields()
            .iter()
            .filter(|(_, w)| w.is_set())
            .map(|(i, _)| *i)
            .collect();
        assert_eq!(set, [0, 21]);
        assert_eq!(req.adaptive_rx, Wanted::Value(true));
        assert!(!req.is_empty());
        assert!(CoalesceRequest::default().is_empty());
    }

    #[test]
    fn feature_pairs_last_wins() {
        let req = FeatureRequest::parse(&toks("tso off gro on tso on")).unwrap();
        assert_eq!(req.changes, [("tso".to_string(), true), ("gro".to_string(), true)]);
        assert!(FeatureRequest::parse(&toks("tso")).is_err());
        assert!(FeatureRequest::parse(&toks("tso maybe")).is_err());
        assert!(FeatureRequest::parse(&[]).is_err());
    }

    #[test]
    fn nfc_flow_hash() {
        let req = NfcRequest::parse(&toks("rx-flow-hash tcp4 sdfn")).unwrap();
        assert_eq!(
            req,
            NfcRequest::FlowHash {
                flow: FlowType::Tcp4,
                fields: rxh::IP_SRC | rxh::IP_DST | rxh::L4_B_0_1 | rxh::L4_B_2_3,
            }
        );
        assert!(NfcRequest::parse(&toks("rx-flow-hash tcp4 sdx")).is_err());
        assert!(NfcRequest::parse(&toks("rx-flow-hash bogus sd")).is_err());
        assert_eq!(
            NfcQuery::parse(&toks("rx-flow-hash udp6")).unwrap(),
            NfcQuery::FlowHash(FlowType::Udp6)
        );
        assert_eq!(NfcQuery::parse(&[]).unwrap(), NfcQuery::Rules);
    }

    #[test]
    fn nfc_rule_with_mask() {
        let req = NfcRequest::parse(&toks(
            "flow-type tcp4 src-ip 10.0.0.0 m 0.0.0.255 dst-port 80 action 3 loc 5",
        ))
        .unwrap();
        let NfcRequest::Insert(rule) = req else {
            panic!("expected a rule");
        };
        let rule = rule.to_rule();
        assert_eq!(rule.value.src_ip, u32::from(Ipv4Addr::new(10, 0, 0, 0)));
        assert_eq!(rule.mask.src_ip, 0xffff_ff00);
        assert_eq!(rule.value.dst_port, 80);
        assert_eq!(rule.mask.dst_port, 0xffff);
        assert_eq!(rule.mask.src_port, 0);
        assert_eq!(rule.action, Some(3));
        assert_eq!(rule.location, 5);
    }

    #[test]
    fn nfc_rule_checks() {
        // Drop action, driver-chosen slot.
        let NfcRequest::Insert(rule) =
            NfcRequest::parse(&toks("flow-type ether proto 0x88f7 action -1")).unwrap()
        else {
            panic!("expected a rule");
        };
        let rule = rule.to_rule();
        assert_eq!(rule.action, None);
        assert_eq!(rule.location, RX_CLS_LOC_ANY);

        assert!(NfcRequest::parse(&toks("flow-type ether src-ip 1.2.3.4 action 1")).is_err());
        assert!(NfcRequest::parse(&toks("flow-type tcp4 dst-port 80")).is_err());
        assert!(NfcRequest::parse(&toks("flow-type tcp4 m 1 action 1")).is_err());
        assert_eq!(
            NfcRequest::parse(&toks("delete 7")).unwrap(),
            NfcRequest::Delete(7)
        );
    }

    #[test]
    fn fec_encodings() {
        let mut req = FecRequest::default();
        parse_options(&toks("encoding off rs Baser"), &FecRequest::options(), &mut req).unwrap();
        assert!(!req.auto);
        assert_eq!(req.kernel_names(), ["None", "RS", "BASER"]);

        let mut req = FecRequest::default();
        parse_options(&toks("encoding auto"), &FecRequest::options(), &mut req).unwrap();
        assert!(req.auto);
        assert!(req.encodings.is_empty());

        // Unknown names pass through for the kernel to judge.
        let mut req = FecRequest::default();
        parse_options(&toks("encoding bogus"), &FecRequest::options(), &mut req).unwrap();
        assert_eq!(req.kernel_names(), ["BOGUS"]);

        let mut req = FecRequest::default();
        assert!(parse_options(&toks("encoding"), &FecRequest::options(), &mut req).is_err());
    }

    #[test]
    fn positional_forms() {
        assert_eq!(parse_test_mode(&[]).unwrap(), test_flags::OFFLINE);
        assert_eq!(parse_test_mode(&toks("online")).unwrap(), 0);
        assert!(parse_test_mode(&toks("sideways")).is_err());
        assert_eq!(parse_identify(&toks("5")).unwrap(), 5);
        assert!(parse_identify(&toks("-5")).is_err());
        let flash = FlashRequest::parse(&toks("fw.bin 2")).unwrap();
        assert_eq!((flash.file.as_str(), flash.region), ("fw.bin", 2));
        assert!(FlashRequest::parse(&[]).is_err());
    }

    #[test]
    fn eeprom_change_needs_all_fields() {
        let mut req = EepromChangeRequest::default();
        parse_options(&toks("magic 0x1234 offset 4"), &EepromChangeRequest::options(), &mut req)
            .unwrap();
        assert!(req.validate().is_err());
        parse_options(&toks("value 0xab"), &EepromChangeRequest::options(), &mut req).unwrap();
        assert!(req.validate().is_ok());
    }
}
