//! Typed legacy operations.
//!
//! Changes are read-modify-write: the current record is fetched, the
//! request's [`Wanted`](crate::params::Wanted) fields are merged in and
//! the record is written back. [`ChangeError`] tells which half failed.

use super::sized::{DrvLen, ETH_SS_STATS, ETH_SS_TEST, MAX_SIZED_BUFFER, SizeSource, SizedRequest};
use super::wire::{
    COALESCE_ADAPTIVE_RX, COALESCE_ADAPTIVE_TX, ChannelRecord, CoalesceRecord, FecRecord,
    FlashRecord, FlowSpec, LegacyRecord, LinkCmd, LinkCmd22, NFC_RULE_LOCS, PauseRecord,
    PermAddrRecord, RingRecord, RxNfc, SizedHeader, ValueRecord, WolRecord, parse_strings,
    parse_u32s, parse_u64s,
};
use super::{IoctlSocket, LegacyOp, op};
use crate::error::{Error, Result};
use crate::params::records::{
    ChannelRequest, CoalesceRequest, FecRequest, FlashRequest, LinkRequest, PauseRequest,
    RingRequest,
};
use crate::types::{
    Channels, Coalesce, DriverInfo, Duplex, EepromDump, Feature, Features, FecParams, FlowType,
    LEGACY_FEATURES, LinkSettings, LinkState, MdiX, MsgLevel, NtupleRule, Pause, Port, RegDump,
    RuleList, Rings, RxFlowHash, SelfTest, Stats, Transceiver, WolInfo, fec, fec_display_name,
    legacy_mode_names, test_flags, wake,
};

/// A change that failed, and where.
#[derive(Debug, thiserror::Error)]
pub enum ChangeError {
    /// Fetching the current state failed; nothing was written.
    #[error("cannot get current settings: {0}")]
    Read(#[source] Error),
    /// The write itself, or building it, failed.
    #[error("cannot update settings: {0}")]
    Write(#[source] Error),
}

impl ChangeError {
    /// The underlying error.
    pub fn error(&self) -> &Error {
        match self {
            ChangeError::Read(e) | ChangeError::Write(e) => e,
        }
    }
}

/// `ETH_FLAG_*` bits carried by `GFLAGS`/`SFLAGS`.
pub mod eth_flag {
    pub const TXVLAN: u32 = 1 << 7;
    pub const RXVLAN: u32 = 1 << 8;
    pub const LRO: u32 = 1 << 15;
    pub const NTUPLE: u32 = 1 << 27;
    pub const RXHASH: u32 = 1 << 28;
}

/// How a legacy offload name is read and written.
#[derive(Debug, Clone, Copy)]
enum Toggle {
    /// Its own get/set pair of `ethtool_value` requests.
    Value { get: LegacyOp, set: LegacyOp },
    /// One bit of the `GFLAGS`/`SFLAGS` word.
    Flag(u32),
}

fn toggle(name: &str) -> Option<Toggle> {
    let t = match name {
        "rx" => Toggle::Value {
            get: op::GRXCSUM,
            set: op::SRXCSUM,
        },
        "tx" => Toggle::Value {
            get: op::GTXCSUM,
            set: op::STXCSUM,
        },
        "sg" => Toggle::Value {
            get: op::GSG,
            set: op::SSG,
        },
        "tso" => Toggle::Value {
            get: op::GTSO,
            set: op::STSO,
        },
        "ufo" => Toggle::Value {
            get: op::GUFO,
            set: op::SUFO,
        },
        "gso" => Toggle::Value {
            get: op::GGSO,
            set: op::SGSO,
        },
        "gro" => Toggle::Value {
            get: op::GGRO,
            set: op::SGRO,
        },
        "lro" => Toggle::Flag(eth_flag::LRO),
        "rxvlan" => Toggle::Flag(eth_flag::RXVLAN),
        "txvlan" => Toggle::Flag(eth_flag::TXVLAN),
        "ntuple" => Toggle::Flag(eth_flag::NTUPLE),
        "rxhash" => Toggle::Flag(eth_flag::RXHASH),
        _ => return None,
    };
    Some(t)
}

impl IoctlSocket {
    /// `GDRVINFO`.
    pub fn get_driver_info(&self) -> Result<DriverInfo> {
        self.get(op::GDRVINFO)
    }

    // =========================================================================
    // Link settings
    // =========================================================================

    /// `GSET`, retried once through `SIOCETHTOOL_22` on `EOPNOTSUPP`.
    fn get_cmd(&self) -> Result<LinkCmd> {
        match self.get::<LinkCmd>(op::GSET) {
            Err(e) if e.is_not_supported() => {
                tracing::debug!(ifname = self.ifname(), "GSET not supported, trying pre-2.4 request");
                let mut buf = LinkCmd22::default().to_bytes(op::GSET.cmd);
                self.request_compat(op::GSET, &mut buf).map_err(|_| e)?;
                Ok(LinkCmd::from(&LinkCmd22::decode(&buf)?))
            }
            other => other,
        }
    }

    /// `SSET`, retried once through `SIOCETHTOOL_22` on `EOPNOTSUPP`.
    fn set_cmd(&self, cmd: &LinkCmd) -> Result<()> {
        match self.set(op::SSET, cmd) {
            Err(e) if e.is_not_supported() => {
                tracing::debug!(ifname = self.ifname(), "SSET not supported, trying pre-2.4 request");
                let mut buf = LinkCmd22::from(cmd).to_bytes(op::SSET.cmd);
                self.request_compat(op::SSET, &mut buf).map_err(|_| e)
            }
            other => other,
        }
    }

    pub fn get_link_settings(&self) -> Result<LinkSettings> {
        Ok(link_settings(&self.get_cmd()?))
    }

    /// Merge the link fields of `req` onto the current settings.
    pub fn set_link(&self, req: &LinkRequest) -> std::result::Result<(), ChangeError> {
        let mut cmd = self.get_cmd().map_err(ChangeError::Read)?;
        merge_link(&mut cmd, req).map_err(ChangeError::Write)?;
        self.set_cmd(&cmd).map_err(ChangeError::Write)
    }

    /// `GLINK`.
    pub fn get_link_state(&self) -> Result<LinkState> {
        let v: ValueRecord = self.get(op::GLINK)?;
        Ok(LinkState {
            link: v.data != 0,
            ..Default::default()
        })
    }

    // =========================================================================
    // Wake-on-LAN, message level
    // =========================================================================

    pub fn get_wol(&self) -> Result<WolInfo> {
        let rec: WolRecord = self.get(op::GWOL)?;
        Ok(WolInfo {
            supported: rec.supported,
            wolopts: rec.wolopts,
            sopass: (rec.supported & wake::MAGICSECURE != 0).then_some(rec.sopass),
        })
    }

    pub fn set_wol(&self, req: &LinkRequest) -> std::result::Result<(), ChangeError> {
        self.modify(op::GWOL, op::SWOL, |rec: &mut WolRecord| {
            req.wol.apply(&mut rec.wolopts);
            if let Some(pass) = req.sopass.value() {
                rec.sopass = *pass;
            }
            Ok(())
        })
    }

    pub fn get_msglvl(&self) -> Result<MsgLevel> {
        let v: ValueRecord = self.get(op::GMSGLVL)?;
        Ok(MsgLevel { value: v.data })
    }

    pub fn set_msglvl(&self, req: &LinkRequest) -> std::result::Result<(), ChangeError> {
        self.modify(op::GMSGLVL, op::SMSGLVL, |v: &mut ValueRecord| {
            v.data = req.merged_msglvl(v.data);
            Ok(())
        })
    }

    // =========================================================================
    // Rings, channels, coalescing, pause
    // =========================================================================

    pub fn get_rings(&self) -> Result<Rings> {
        let r: RingRecord = self.get(op::GRINGPARAM)?;
        Ok(Rings {
            rx_max: Some(r.rx_max),
            rx_mini_max: Some(r.rx_mini_max),
            rx_jumbo_max: Some(r.rx_jumbo_max),
            tx_max: Some(r.tx_max),
            rx: Some(r.rx),
            rx_mini: Some(r.rx_mini),
            rx_jumbo: Some(r.rx_jumbo),
            tx: Some(r.tx),
        })
    }

    pub fn set_rings(&self, req: &RingRequest) -> std::result::Result<(), ChangeError> {
        self.modify(op::GRINGPARAM, op::SRINGPARAM, |r: &mut RingRecord| {
            req.rx.apply(&mut r.rx);
            req.rx_mini.apply(&mut r.rx_mini);
            req.rx_jumbo.apply(&mut r.rx_jumbo);
            req.tx.apply(&mut r.tx);
            Ok(())
        })
    }

    pub fn get_channels(&self) -> Result<Channels> {
        let c: ChannelRecord = self.get(op::GCHANNELS)?;
        Ok(Channels {
            rx_max: Some(c.max_rx),
            tx_max: Some(c.max_tx),
            other_max: Some(c.max_other),
            combined_max: Some(c.max_combined),
            rx_count: Some(c.rx_count),
            tx_count: Some(c.tx_count),
            other_count: Some(c.other_count),
            combined_count: Some(c.combined_count),
        })
    }

    pub fn set_channels(&self, req: &ChannelRequest) -> std::result::Result<(), ChangeError> {
        self.modify(op::GCHANNELS, op::SCHANNELS, |c: &mut ChannelRecord| {
            req.rx.apply(&mut c.rx_count);
            req.tx.apply(&mut c.tx_count);
            req.other.apply(&mut c.other_count);
            req.combined.apply(&mut c.combined_count);
            Ok(())
        })
    }

    pub fn get_coalesce(&self) -> Result<Coalesce> {
        let rec: CoalesceRecord = self.get(op::GCOALESCE)?;
        Ok(coalesce_from_record(&rec))
    }

    pub fn set_coalesce(&self, req: &CoalesceRequest) -> std::result::Result<(), ChangeError> {
        self.modify(op::GCOALESCE, op::SCOALESCE, |rec: &mut CoalesceRecord| {
            merge_coalesce(rec, req);
            Ok(())
        })
    }

    pub fn get_pause(&self) -> Result<Pause> {
        let p: PauseRecord = self.get(op::GPAUSEPARAM)?;
        Ok(Pause {
            autoneg: Some(p.autoneg != 0),
            rx: Some(p.rx_pause != 0),
            tx: Some(p.tx_pause != 0),
        })
    }

    pub fn set_pause(&self, req: &PauseRequest) -> std::result::Result<(), ChangeError> {
        self.modify(op::GPAUSEPARAM, op::SPAUSEPARAM, |p: &mut PauseRecord| {
            apply_bool(&req.autoneg, &mut p.autoneg);
            apply_bool(&req.rx, &mut p.rx_pause);
            apply_bool(&req.tx, &mut p.tx_pause);
            Ok(())
        })
    }

    /// Fetch with `get`, merge, write with `set`.
    fn modify<R>(
        &self,
        get: LegacyOp,
        set: LegacyOp,
        merge: impl FnOnce(&mut R) -> Result<()>,
    ) -> std::result::Result<(), ChangeError>
    where
        R: LegacyRecord + Default,
    {
        let mut rec = self.get::<R>(get).map_err(ChangeError::Read)?;
        merge(&mut rec).map_err(ChangeError::Write)?;
        self.set(set, &rec).map_err(ChangeError::Write)
    }

    // =========================================================================
    // Offload features
    // =========================================================================

    /// Offload state through the per-offload requests and `GFLAGS`.
    ///
    /// Each legacy offload is reported under the kernel feature names it
    /// stands for. Offloads the driver cannot report are left out.
    pub fn get_features(&self) -> Result<Features> {
        let mut last_err = None;
        let flags = match self.get::<ValueRecord>(op::GFLAGS) {
            Ok(v) => Some(v.data),
            Err(e) => {
                tracing::debug!(error = %e, "cannot read offload flags");
                last_err = Some(e);
                None
            }
        };

        let mut entries = Vec::new();
        for (legacy, kernel) in LEGACY_FEATURES {
            let active = match toggle(legacy) {
                Some(Toggle::Value { get, .. }) => match self.get::<ValueRecord>(get) {
                    Ok(v) => v.data != 0,
                    Err(e) => {
                        tracing::debug!(offload = legacy, error = %e, "cannot read offload");
                        last_err = Some(e);
                        continue;
                    }
                },
                Some(Toggle::Flag(bit)) => match flags {
                    Some(word) => word & bit != 0,
                    None => continue,
                },
                None => continue,
            };
            entries.extend(kernel.iter().map(|name| Feature {
                name: name.to_string(),
                active,
                fixed: false,
                requested: active,
            }));
        }

        match last_err {
            Some(e) if entries.is_empty() => Err(e),
            _ => Ok(Features { entries }),
        }
    }

    /// Apply legacy offload changes. Flag-word offloads are written with
    /// one `SFLAGS` after the per-offload requests.
    pub fn set_features(&self, changes: &[(String, bool)]) -> std::result::Result<(), ChangeError> {
        let mut toggles = Vec::with_capacity(changes.len());
        for (name, on) in changes {
            let t = toggle(name).ok_or_else(|| {
                ChangeError::Write(Error::InvalidAttribute(format!(
                    "{name}: only legacy offload names can be changed without netlink"
                )))
            })?;
            toggles.push((t, *on));
        }

        let mut flag_value = 0u32;
        let mut flag_mask = 0u32;
        for (t, on) in toggles {
            match t {
                Toggle::Value { set, .. } => {
                    self.set(set, &ValueRecord { data: u32::from(on) })
                        .map_err(ChangeError::Write)?;
                }
                Toggle::Flag(bit) => {
                    flag_mask |= bit;
                    if on {
                        flag_value |= bit;
                    } else {
                        flag_value &= !bit;
                    }
                }
            }
        }

        if flag_mask != 0 {
            self.modify(op::GFLAGS, op::SFLAGS, |v: &mut ValueRecord| {
                v.data = (v.data & !flag_mask) | (flag_value & flag_mask);
                Ok(())
            })?;
        }
        Ok(())
    }

    // =========================================================================
    // FEC
    // =========================================================================

    pub fn get_fec(&self) -> Result<FecParams> {
        let rec: FecRecord = self.get(op::GFECPARAM)?;
        Ok(fec_from_record(&rec))
    }

    /// `SFECPARAM`. Every encoding must name an `ETHTOOL_FEC_*` bit.
    pub fn set_fec(&self, req: &FecRequest) -> std::result::Result<(), ChangeError> {
        let bits = fec_bits(req).map_err(ChangeError::Write)?;
        let rec = FecRecord {
            active_fec: 0,
            fec: bits,
        };
        self.set(op::SFECPARAM, &rec).map_err(ChangeError::Write)
    }

    // =========================================================================
    // Rx flow classification
    // =========================================================================

    pub fn get_rx_flow_hash(&self, flow: FlowType) -> Result<RxFlowHash> {
        let nfc = self.exchange(op::GRXFH, &RxNfc::new(flow.to_u32(), 0))?;
        Ok(RxFlowHash {
            flow_type: flow,
            fields: nfc.data,
        })
    }

    pub fn set_rx_flow_hash(&self, flow: FlowType, fields: u64) -> Result<()> {
        self.set(op::SRXFH, &RxNfc::new(flow.to_u32(), fields))
    }

    /// Number of rx rings.
    pub fn get_rx_rings(&self) -> Result<u64> {
        Ok(self.get::<RxNfc>(op::GRXRINGS)?.data)
    }

    /// Every classification rule.
    pub fn get_rules(&self) -> Result<RuleList> {
        let rx_rings = self.get_rx_rings()?;
        let count = self.get::<RxNfc>(op::GRXCLSRLCNT)?.rule_cnt;
        let locations = self.rule_locations(count)?;

        let mut rules = Vec::with_capacity(locations.len());
        for loc in locations {
            match self.get_rule(loc) {
                Ok(rule) => rules.push(rule),
                Err(e) => tracing::warn!(loc, error = %e, "skipping unreadable rule"),
            }
        }

        Ok(RuleList {
            rx_rings,
            total: count,
            rules,
        })
    }

    fn rule_locations(&self, count: u32) -> Result<Vec<u32>> {
        let total = (count as usize)
            .checked_mul(4)
            .map(|n| (NFC_RULE_LOCS + n).max(RxNfc::SIZE))
            .filter(|n| *n <= MAX_SIZED_BUFFER)
            .ok_or(Error::Alloc {
                what: op::GRXCLSRLALL.name,
                requested: count as usize * 4,
            })?;
        let mut buf = Vec::new();
        buf.try_reserve_exact(total).map_err(|_| Error::Alloc {
            what: op::GRXCLSRLALL.name,
            requested: total,
        })?;
        buf.resize(total, 0);

        let mut req = RxNfc::new(0, 0);
        req.rule_cnt = count;
        req.encode(op::GRXCLSRLALL.cmd, &mut buf);
        self.request(op::GRXCLSRLALL, &mut buf)?;

        let returned = RxNfc::decode(&buf)?.rule_cnt.min(count);
        parse_u32s(&buf[NFC_RULE_LOCS..], returned as usize)
    }

    /// The rule at `loc`.
    pub fn get_rule(&self, loc: u32) -> Result<NtupleRule> {
        let req = RxNfc::with_spec(FlowSpec {
            location: loc,
            ..Default::default()
        });
        let nfc = self.exchange(op::GRXCLSRULE, &req)?;
        nfc.fs.to_rule().ok_or_else(|| {
            Error::InvalidMessage(format!("rule {loc}: unknown flow type {:#x}", nfc.fs.flow_type))
        })
    }

    /// Insert a rule and return the location the driver stored it at.
    pub fn insert_rule(&self, rule: &NtupleRule) -> Result<u32> {
        let nfc = self.exchange(op::SRXCLSRLINS, &RxNfc::with_spec(FlowSpec::from_rule(rule)))?;
        Ok(nfc.fs.location)
    }

    pub fn delete_rule(&self, loc: u32) -> Result<()> {
        let req = RxNfc::with_spec(FlowSpec {
            location: loc,
            ..Default::default()
        });
        self.set(op::SRXCLSRLDEL, &req)
    }

    // =========================================================================
    // Dumps
    // =========================================================================

    pub fn get_regs(&self) -> Result<RegDump> {
        let reply = self.fetch_sized(&SizedRequest {
            op: op::GREGS,
            header: SizedHeader::Regs,
            size: SizeSource::DrvInfo(DrvLen::RegDump),
            limit: None,
        })?;
        Ok(RegDump {
            version: reply.word(4)?,
            data: reply.payload().to_vec(),
        })
    }

    /// Read EEPROM bytes from `offset`, at most `length` of them.
    pub fn get_eeprom(&self, offset: u32, length: Option<u32>) -> Result<EepromDump> {
        let reply = self.fetch_sized(&SizedRequest {
            op: op::GEEPROM,
            header: SizedHeader::Eeprom { magic: 0, offset },
            size: SizeSource::DrvInfo(DrvLen::Eeprom),
            limit: length,
        })?;
        Ok(EepromDump {
            offset: reply.word(8)?,
            data: reply.payload().to_vec(),
        })
    }

    /// Write one EEPROM byte.
    pub fn set_eeprom_byte(&self, magic: u32, offset: u32, value: u8) -> Result<()> {
        let header = SizedHeader::Eeprom { magic, offset };
        let mut buf = vec![0u8; header.header_len() + 1];
        header.encode(op::SEEPROM.cmd, 1, &mut buf);
        buf[header.header_len()] = value;
        self.request(op::SEEPROM, &mut buf)
    }

    /// Names of a string set.
    fn get_strings(&self, set: u32, fallback: DrvLen) -> Result<Vec<String>> {
        let reply = self.fetch_sized(&SizedRequest {
            op: op::GSTRINGS,
            header: SizedHeader::Strings { string_set: set },
            size: SizeSource::StringSet { set, fallback },
            limit: None,
        })?;
        parse_strings(reply.payload(), reply.len as usize)
    }

    /// Run the self-test with `ETH_TEST_FL_*` `flags`.
    pub fn run_self_test(&self, flags: u32) -> Result<SelfTest> {
        let names = self.get_strings(ETH_SS_TEST, DrvLen::TestInfo)?;
        let reply = self.fetch_sized(&SizedRequest {
            op: op::TEST,
            header: SizedHeader::Test { flags },
            size: SizeSource::StringSet {
                set: ETH_SS_TEST,
                fallback: DrvLen::TestInfo,
            },
            limit: None,
        })?;
        let result = reply.word(4)?;
        let values = parse_u64s(reply.payload(), reply.len as usize)?;
        Ok(SelfTest {
            passed: result & test_flags::FAILED == 0,
            external_lb_done: result & test_flags::EXTERNAL_LB_DONE != 0,
            results: label(names, values),
        })
    }

    pub fn get_stats(&self) -> Result<Stats> {
        let names = self.get_strings(ETH_SS_STATS, DrvLen::Stats)?;
        if names.is_empty() {
            return Err(Error::NotSupported("no statistics available".into()));
        }
        let reply = self.fetch_sized(&SizedRequest {
            op: op::GSTATS,
            header: SizedHeader::Stats,
            size: SizeSource::StringSet {
                set: ETH_SS_STATS,
                fallback: DrvLen::Stats,
            },
            limit: Some(names.len() as u32),
        })?;
        let values = parse_u64s(reply.payload(), reply.len as usize)?;
        Ok(Stats {
            entries: label(names, values),
        })
    }

    // =========================================================================
    // Device actions
    // =========================================================================

    /// Restart auto-negotiation.
    pub fn nway_reset(&self) -> Result<()> {
        self.set(op::NWAY_RST, &ValueRecord::default())
    }

    /// Blink the port LED for `seconds`, zero meaning until interrupted.
    /// Blocks for as long as the LED blinks.
    pub fn identify(&self, seconds: u32) -> Result<()> {
        self.set(op::PHYS_ID, &ValueRecord { data: seconds })
    }

    pub fn flash(&self, req: &FlashRequest) -> Result<()> {
        let rec = FlashRecord {
            region: req.region,
            file: req.file.clone(),
        };
        self.set(op::FLASHDEV, &rec)
    }

    pub fn get_perm_addr(&self) -> Result<Vec<u8>> {
        Ok(self.get::<PermAddrRecord>(op::GPERMADDR)?.addr)
    }
}

// =============================================================================
// Record conversions
// =============================================================================

fn link_settings(cmd: &LinkCmd) -> LinkSettings {
    let mdix = |v: u8| (v != 0).then(|| MdiX::from_u8(v));
    LinkSettings {
        supported: legacy_mode_names(cmd.supported),
        advertised: legacy_mode_names(cmd.advertising),
        peer_advertised: legacy_mode_names(cmd.lp_advertising),
        speed: (cmd.speed != 0 && cmd.speed != u32::MAX).then_some(cmd.speed),
        duplex: Duplex::from_u8(cmd.duplex),
        port: Port::from_u8(cmd.port),
        phyad: Some(cmd.phy_address),
        transceiver: Some(Transceiver::from_u8(cmd.transceiver)),
        autoneg: cmd.autoneg != 0,
        mdix: mdix(cmd.eth_tp_mdix),
        mdix_ctrl: mdix(cmd.eth_tp_mdix_ctrl),
        lanes: None,
    }
}

fn merge_link(cmd: &mut LinkCmd, req: &LinkRequest) -> Result<()> {
    if req.lanes.is_set() {
        return Err(Error::InvalidAttribute(
            "lanes can only be set over netlink".into(),
        ));
    }
    req.speed.apply(&mut cmd.speed);
    if let Some(d) = req.duplex.value() {
        cmd.duplex = d.to_u8();
    }
    if let Some(p) = req.port.value() {
        cmd.port = p.to_u8();
    }
    if let Some(m) = req.mdix.value() {
        cmd.eth_tp_mdix_ctrl = m.to_u8();
    }
    if let Some(on) = req.autoneg.resolve() {
        cmd.autoneg = u8::from(on);
    }
    if let Some(mask) = req.advertise.resolve() {
        cmd.advertising = u32::try_from(mask).map_err(|_| {
            Error::InvalidAttribute(format!(
                "advertise {mask:#x}: legacy settings carry only 32 link-mode bits"
            ))
        })?;
    }
    req.phyad.apply(&mut cmd.phy_address);
    if let Some(x) = req.xcvr.value() {
        cmd.transceiver = x.to_u8();
    }
    Ok(())
}

fn apply_bool(wanted: &crate::params::Wanted<bool>, dst: &mut u32) {
    if let Some(on) = wanted.resolve() {
        *dst = u32::from(on);
    }
}

fn coalesce_from_record(rec: &CoalesceRecord) -> Coalesce {
    let f = |i: usize| Some(rec.fields[i]);
    Coalesce {
        rx_usecs: f(0),
        rx_frames: f(1),
        rx_usecs_irq: f(2),
        rx_frames_irq: f(3),
        tx_usecs: f(4),
        tx_frames: f(5),
        tx_usecs_irq: f(6),
        tx_frames_irq: f(7),
        stats_block_usecs: f(8),
        adaptive_rx: Some(rec.fields[COALESCE_ADAPTIVE_RX] != 0),
        adaptive_tx: Some(rec.fields[COALESCE_ADAPTIVE_TX] != 0),
        pkt_rate_low: f(11),
        rx_usecs_low: f(12),
        rx_frames_low: f(13),
        tx_usecs_low: f(14),
        tx_frames_low: f(15),
        pkt_rate_high: f(16),
        rx_usecs_high: f(17),
        rx_frames_high: f(18),
        tx_usecs_high: f(19),
        tx_frames_high: f(20),
        rate_sample_interval: f(21),
    }
}

fn merge_coalesce(rec: &mut CoalesceRecord, req: &CoalesceRequest) {
    for (pos, wanted) in req.u32_fields() {
        wanted.apply(&mut rec.fields[pos]);
    }
    apply_bool(&req.adaptive_rx, &mut rec.fields[COALESCE_ADAPTIVE_RX]);
    apply_bool(&req.adaptive_tx, &mut rec.fields[COALESCE_ADAPTIVE_TX]);
}

fn fec_from_record(rec: &FecRecord) -> FecParams {
    let names = |mask: u32| -> Vec<String> {
        fec::NAMES
            .iter()
            .filter(|(bit, _)| *bit != fec::AUTO && mask & bit != 0)
            .map(|(_, name)| fec_display_name(name).to_string())
            .collect()
    };
    FecParams {
        configured: names(rec.fec),
        auto: rec.fec & fec::AUTO != 0,
        active: names(rec.active_fec).into_iter().next(),
    }
}

fn fec_bits(req: &FecRequest) -> Result<u32> {
    let mut bits = if req.auto { fec::AUTO } else { 0 };
    for name in &req.encodings {
        bits |= fec::bit_for_name(name)
            .ok_or_else(|| Error::InvalidAttribute(format!("unknown FEC encoding \"{name}\"")))?;
    }
    Ok(bits)
}

/// Pair names with values, stopping at the shorter list.
fn label(names: Vec<String>, values: Vec<u64>) -> Vec<(String, u64)> {
    if names.len() != values.len() {
        tracing::warn!(
            names = names.len(),
            values = values.len(),
            "string table and values differ in length"
        );
    }
    names.into_iter().zip(values).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{Wanted, parse_options};

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn link_merge_only_touches_given_fields() {
        let mut cmd = LinkCmd {
            supported: 0x2ff,
            advertising: 0x2ff,
            speed: 1000,
            duplex: 1,
            port: 0,
            autoneg: 1,
            phy_address: 1,
            ..Default::default()
        };
        let mut req = LinkRequest::default();
        parse_options(&tokens("speed 100 duplex half"), &LinkRequest::options(), &mut req).unwrap();
        merge_link(&mut cmd, &req).unwrap();
        assert_eq!(cmd.speed, 100);
        assert_eq!(cmd.duplex, 0);
        assert_eq!(cmd.autoneg, 1);
        assert_eq!(cmd.advertising, 0x2ff);
        assert_eq!(cmd.phy_address, 1);
    }

    #[test]
    fn link_merge_rejects_wide_advertise() {
        let mut cmd = LinkCmd::default();
        let req = LinkRequest {
            advertise: Wanted::Value(1 << 40),
            ..Default::default()
        };
        assert!(matches!(
            merge_link(&mut cmd, &req),
            Err(Error::InvalidAttribute(_))
        ));
        let req = LinkRequest {
            lanes: Wanted::Value(2),
            ..Default::default()
        };
        assert!(merge_link(&mut cmd, &req).is_err());
    }

    #[test]
    fn settings_from_record() {
        let cmd = LinkCmd {
            supported: 0b1100_1111,
            advertising: 0b0000_1000,
            speed: u32::MAX,
            duplex: 0xff,
            autoneg: 1,
            eth_tp_mdix: 2,
            ..Default::default()
        };
        let s = link_settings(&cmd);
        assert_eq!(s.speed, None);
        assert_eq!(s.duplex, Duplex::Unknown);
        assert_eq!(s.advertised, ["100baseT/Full"]);
        assert!(s.supports_autoneg());
        assert_eq!(s.mdix, Some(MdiX::MdiX));
        assert_eq!(s.mdix_ctrl, None);
    }

    #[test]
    fn coalesce_merge() {
        let mut rec = CoalesceRecord::default();
        rec.fields[1] = 64;
        let mut req = CoalesceRequest::default();
        parse_options(
            &tokens("rx-usecs 30 adaptive-rx on tx-frames-high 9"),
            &CoalesceRequest::options(),
            &mut req,
        )
        .unwrap();
        merge_coalesce(&mut rec, &req);
        assert_eq!(rec.fields[0], 30);
        assert_eq!(rec.fields[1], 64);
        assert_eq!(rec.fields[COALESCE_ADAPTIVE_RX], 1);
        assert_eq!(rec.fields[20], 9);

        let c = coalesce_from_record(&rec);
        assert_eq!(c.rx_usecs, Some(30));
        assert_eq!(c.adaptive_rx, Some(true));
        assert_eq!(c.adaptive_tx, Some(false));
    }

    #[test]
    fn fec_bits_need_known_names() {
        let req = FecRequest {
            auto: true,
            encodings: vec!["rs".into(), "off".into()],
        };
        assert_eq!(fec_bits(&req).unwrap(), fec::AUTO | fec::RS | fec::OFF);

        let req = FecRequest {
            auto: false,
            encodings: vec!["llrs".into(), "bogus".into()],
        };
        assert!(matches!(fec_bits(&req), Err(Error::InvalidAttribute(_))));
    }

    #[test]
    fn fec_display() {
        let params = fec_from_record(&FecRecord {
            active_fec: fec::BASER,
            fec: fec::AUTO | fec::NONE | fec::RS,
        });
        assert!(params.auto);
        assert_eq!(params.configured, ["Off", "RS"]);
        assert_eq!(params.active.as_deref(), Some("BaseR"));
    }

    #[test]
    fn legacy_toggles_cover_every_alias() {
        for (name, _) in LEGACY_FEATURES {
            assert!(toggle(name).is_some(), "{name}");
        }
        assert!(toggle("rx-gro-hw").is_none());
    }

    #[test]
    fn labels_stop_at_shorter_list() {
        let out = label(vec!["a".into(), "b".into()], vec![1]);
        assert_eq!(out, [("a".to_string(), 1)]);
    }

    #[test]
    fn change_error_keeps_stage() {
        let e = ChangeError::Read(Error::ioctl(
            op::GWOL.name,
            std::io::Error::from_raw_os_error(libc::EOPNOTSUPP),
        ));
        assert!(e.error().is_not_supported());
        assert!(e.to_string().starts_with("cannot get current settings"));
    }
}
