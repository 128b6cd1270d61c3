//! Ethtool requests on `Connection<Ethtool>`.
//!
//! Every method maps to one GET or SET message pair. Gets ask for compact
//! bitsets and resolve bit names through the string sets cached in the
//! connection state; sets only emit the attributes the caller asked to
//! change, so the kernel keeps everything else.

use super::bitset::{EthtoolBitset, write_compact, write_compact_u32, write_named};
use super::strset::{StringSet, parse_strset_reply};
use super::{
    ETHTOOL_A_HEADER, ETHTOOL_A_STRINGSETS_STRINGSET, ETHTOOL_GENL_NAME, ETHTOOL_GENL_VERSION,
    ETHTOOL_MCGRP_MONITOR, EthtoolChannelsAttr, EthtoolCmd, EthtoolCoalesceAttr,
    EthtoolDebugAttr, EthtoolFeaturesAttr, EthtoolFecAttr, EthtoolHeaderAttr,
    EthtoolLinkinfoAttr, EthtoolLinkmodesAttr, EthtoolLinkstateAttr, EthtoolPauseAttr,
    EthtoolRingsAttr, EthtoolStringsetAttr, EthtoolStrsetAttr, EthtoolWolAttr, StringSetId,
    header_flags,
};
use crate::error::{Error, Result};
use crate::netlink::attr::{AttrIter, check_attrs, get};
use crate::netlink::builder::MessageBuilder;
use crate::netlink::connection::Connection;
use crate::netlink::genl::{GENL_HDRLEN, GenlMsgHdr, resolve_family};
use crate::netlink::message::{NLM_F_ACK, NLM_F_REQUEST};
use crate::netlink::protocol::Ethtool;
use crate::netlink::socket::NetlinkSocket;
use crate::params::records::{
    ChannelRequest, CoalesceRequest, FecRequest, LinkRequest, PauseRequest, RingRequest,
};
use crate::types::{
    Channels, Coalesce, Duplex, Feature, Features, FecParams, LinkSettings, LinkState, MSG_CLASSES,
    MdiX, MsgLevel, Pause, Port, Rings, SOPASS_MAX, Transceiver, WolInfo, fec_display_name,
    legacy_feature, wake,
};

/// Speed value the kernel reports while the link is down.
const SPEED_UNKNOWN: u32 = u32::MAX;

impl Connection<Ethtool> {
    /// Open a generic netlink socket and resolve the ethtool family.
    ///
    /// Fails with [`Error::FamilyNotFound`] on kernels without ethtool
    /// netlink support.
    pub async fn new_async() -> Result<Self> {
        let socket = NetlinkSocket::generic()?;
        let family = resolve_family(&socket, ETHTOOL_GENL_NAME).await?;
        Ok(Self::from_parts(socket, Ethtool::new(family)))
    }

    /// Whether the running kernel implements `cmd`.
    pub fn supports(&self, cmd: EthtoolCmd) -> bool {
        self.state().family.supports(cmd as u8)
    }

    /// Join the `monitor` multicast group.
    ///
    /// Notifications are then read with [`events`](Self::events).
    pub fn subscribe(&mut self) -> Result<()> {
        let group = self
            .state()
            .family
            .mcast_groups
            .get(ETHTOOL_MCGRP_MONITOR)
            .copied()
            .ok_or_else(|| Error::NotSupported("ethtool monitor group not available".into()))?;
        self.socket_mut().add_membership(group)?;
        tracing::debug!(group, "subscribed to ethtool notifications");
        Ok(())
    }

    // =========================================================================
    // Link settings
    // =========================================================================

    /// Link modes and link info.
    pub async fn get_link_settings(&self, ifname: &str) -> Result<LinkSettings> {
        let modes = self.get(EthtoolCmd::LinkmodesGet, ifname).await?;
        let info = self.get(EthtoolCmd::LinkinfoGet, ifname).await?;
        let link_modes = self.get_string_set(None, StringSetId::LinkModes).await?;

        let mut settings = LinkSettings::default();
        for (kind, payload) in AttrIter::new(&modes) {
            match kind {
                t if t == EthtoolLinkmodesAttr::Autoneg as u16 => {
                    settings.autoneg = get::bool(payload)?;
                }
                t if t == EthtoolLinkmodesAttr::Ours as u16 => {
                    let mut ours = EthtoolBitset::parse(payload)?;
                    ours.resolve_names(&link_modes);
                    settings.advertised = ours.value_names();
                    settings.supported = ours.mask_names();
                }
                t if t == EthtoolLinkmodesAttr::Peer as u16 => {
                    let mut peer = EthtoolBitset::parse(payload)?;
                    peer.resolve_names(&link_modes);
                    settings.peer_advertised = peer.value_names();
                }
                t if t == EthtoolLinkmodesAttr::Speed as u16 => {
                    let speed = get::u32_ne(payload)?;
                    settings.speed = (speed != SPEED_UNKNOWN && speed != 0).then_some(speed);
                }
                t if t == EthtoolLinkmodesAttr::Duplex as u16 => {
                    settings.duplex = Duplex::from_u8(get::u8(payload)?);
                }
                t if t == EthtoolLinkmodesAttr::Lanes as u16 => {
                    settings.lanes = Some(get::u32_ne(payload)?);
                }
                _ => {}
            }
        }

        for (kind, payload) in AttrIter::new(&info) {
            match kind {
                t if t == EthtoolLinkinfoAttr::Port as u16 => {
                    settings.port = Port::from_u8(get::u8(payload)?);
                }
                t if t == EthtoolLinkinfoAttr::Phyaddr as u16 => {
                    settings.phyad = Some(get::u8(payload)?);
                }
                t if t == EthtoolLinkinfoAttr::TpMdix as u16 => {
                    settings.mdix = Some(MdiX::from_u8(get::u8(payload)?));
                }
                t if t == EthtoolLinkinfoAttr::TpMdixCtrl as u16 => {
                    settings.mdix_ctrl = Some(MdiX::from_u8(get::u8(payload)?));
                }
                t if t == EthtoolLinkinfoAttr::Transceiver as u16 => {
                    settings.transceiver = Some(Transceiver::from_u8(get::u8(payload)?));
                }
                _ => {}
            }
        }

        Ok(settings)
    }

    /// Apply the link-mode and link-info fields of `req`.
    ///
    /// The transceiver has no writable netlink attribute, so a request
    /// naming it is refused with [`Error::NotSupported`] and goes to the
    /// legacy transport instead.
    pub async fn set_link(&self, ifname: &str, req: &LinkRequest) -> Result<()> {
        if req.needs_legacy() {
            return Err(Error::NotSupported("transceiver cannot be set over netlink".into()));
        }

        let modes_changed = req.speed.is_set()
            || req.lanes.is_set()
            || req.duplex.is_set()
            || req.autoneg.is_set()
            || req.advertise.is_set();
        if modes_changed {
            self.set(EthtoolCmd::LinkmodesSet, ifname, |b| {
                if let Some(on) = req.autoneg.resolve() {
                    b.append_attr_u8(EthtoolLinkmodesAttr::Autoneg as u16, on.into());
                }
                if let Some(speed) = req.speed.resolve() {
                    b.append_attr_u32(EthtoolLinkmodesAttr::Speed as u16, speed);
                }
                if let Some(lanes) = req.lanes.resolve() {
                    b.append_attr_u32(EthtoolLinkmodesAttr::Lanes as u16, lanes);
                }
                if let Some(duplex) = req.duplex.value() {
                    b.append_attr_u8(EthtoolLinkmodesAttr::Duplex as u16, duplex.to_u8());
                }
                if let Some(mask) = req.advertise.value() {
                    let bits: Vec<u32> = (0u32..64).filter(|bit| *mask & (1u64 << bit) != 0).collect();
                    write_compact(b, EthtoolLinkmodesAttr::Ours as u16, 64, &bits, None);
                }
            })
            .await?;
        }

        let info_changed = req.port.is_set() || req.phyad.is_set() || req.mdix.is_set();
        if info_changed {
            self.set(EthtoolCmd::LinkinfoSet, ifname, |b| {
                if let Some(port) = req.port.value() {
                    b.append_attr_u8(EthtoolLinkinfoAttr::Port as u16, port.to_u8());
                }
                if let Some(phyad) = req.phyad.resolve() {
                    b.append_attr_u8(EthtoolLinkinfoAttr::Phyaddr as u16, phyad);
                }
                if let Some(mdix) = req.mdix.value() {
                    b.append_attr_u8(EthtoolLinkinfoAttr::TpMdixCtrl as u16, mdix.to_u8());
                }
            })
            .await?;
        }

        Ok(())
    }

    /// Link detection and signal quality.
    pub async fn get_link_state(&self, ifname: &str) -> Result<LinkState> {
        let data = self.get(EthtoolCmd::LinkstateGet, ifname).await?;
        parse_link_state(&data)
    }

    // =========================================================================
    // Message level and Wake-on-LAN
    // =========================================================================

    pub async fn get_msglvl(&self, ifname: &str) -> Result<MsgLevel> {
        let data = self.get(EthtoolCmd::DebugGet, ifname).await?;
        parse_msglvl(&data)
    }

    /// Change the bits of the message level selected by `mask`.
    pub async fn set_msglvl(&self, ifname: &str, value: u32, mask: u32) -> Result<()> {
        let size = MSG_CLASSES.len() as u32;
        self.set(EthtoolCmd::DebugSet, ifname, |b| {
            write_compact_u32(b, EthtoolDebugAttr::Msgmask as u16, size, value, Some(mask));
        })
        .await
    }

    pub async fn get_wol(&self, ifname: &str) -> Result<WolInfo> {
        let data = self.get(EthtoolCmd::WolGet, ifname).await?;
        let mut wol = WolInfo::default();
        for (kind, payload) in AttrIter::new(&data) {
            match kind {
                t if t == EthtoolWolAttr::Modes as u16 => {
                    let modes = EthtoolBitset::parse(payload)?;
                    wol.wolopts = modes.value_u32();
                    wol.supported = modes.mask_u32();
                }
                t if t == EthtoolWolAttr::Sopass as u16 => {
                    let bytes: [u8; SOPASS_MAX] = payload
                        .get(..SOPASS_MAX)
                        .and_then(|s| s.try_into().ok())
                        .ok_or_else(|| Error::InvalidAttribute("short SecureOn password".into()))?;
                    wol.sopass = Some(bytes);
                }
                _ => {}
            }
        }
        Ok(wol)
    }

    /// Replace the enabled WoL modes and/or the SecureOn password.
    pub async fn set_wol(
        &self,
        ifname: &str,
        wolopts: Option<u32>,
        sopass: Option<[u8; SOPASS_MAX]>,
    ) -> Result<()> {
        let all = (1u32 << wake::COUNT) - 1;
        self.set(EthtoolCmd::WolSet, ifname, |b| {
            if let Some(modes) = wolopts {
                write_compact_u32(b, EthtoolWolAttr::Modes as u16, wake::COUNT, modes, Some(all));
            }
            if let Some(pass) = sopass {
                b.append_attr(EthtoolWolAttr::Sopass as u16, &pass);
            }
        })
        .await
    }

    // =========================================================================
    // Features
    // =========================================================================

    pub async fn get_features(&self, ifname: &str) -> Result<Features> {
        let data = self.get(EthtoolCmd::FeaturesGet, ifname).await?;
        let names = self.get_string_set(None, StringSetId::Features).await?;

        let mut hw = EthtoolBitset::new();
        let mut wanted = EthtoolBitset::new();
        let mut active = EthtoolBitset::new();
        let mut nochange = EthtoolBitset::new();
        for (kind, payload) in AttrIter::new(&data) {
            match kind {
                t if t == EthtoolFeaturesAttr::Hw as u16 => hw = EthtoolBitset::parse(payload)?,
                t if t == EthtoolFeaturesAttr::Wanted as u16 => {
                    wanted = EthtoolBitset::parse(payload)?
                }
                t if t == EthtoolFeaturesAttr::Active as u16 => {
                    active = EthtoolBitset::parse(payload)?
                }
                t if t == EthtoolFeaturesAttr::NoChange as u16 => {
                    nochange = EthtoolBitset::parse(payload)?
                }
                _ => {}
            }
        }

        let entries = names
            .strings()
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(idx, name)| {
                let idx = idx as u32;
                Feature {
                    name: name.clone(),
                    active: active.is_set(idx),
                    fixed: !hw.is_set(idx) || nochange.is_set(idx),
                    requested: wanted.is_set(idx),
                }
            })
            .collect();
        Ok(Features { entries })
    }

    /// Request feature changes by name.
    ///
    /// Legacy offload names (`tso`, `gro`, ...) expand to the kernel
    /// features behind them that this kernel knows. Any other name must
    /// be a kernel feature name.
    pub async fn set_features(&self, ifname: &str, changes: &[(String, bool)]) -> Result<()> {
        let names = self.get_string_set(None, StringSetId::Features).await?;
        let bits = expand_feature_changes(&names, changes)?;
        let bits: Vec<(&str, bool)> = bits.iter().map(|(n, v)| (n.as_str(), *v)).collect();

        self.request(
            EthtoolCmd::FeaturesSet,
            Some(ifname),
            header_flags::OMIT_REPLY,
            |b| write_named(b, EthtoolFeaturesAttr::Wanted as u16, &bits, false),
        )
        .await?;
        Ok(())
    }

    // =========================================================================
    // Rings, channels, coalescing, pause
    // =========================================================================

    pub async fn get_rings(&self, ifname: &str) -> Result<Rings> {
        let data = self.get(EthtoolCmd::RingsGet, ifname).await?;
        parse_rings(&data)
    }

    pub async fn set_rings(&self, ifname: &str, req: &RingRequest) -> Result<()> {
        self.set(EthtoolCmd::RingsSet, ifname, |b| {
            for (attr, wanted) in [
                (EthtoolRingsAttr::Rx, &req.rx),
                (EthtoolRingsAttr::RxMini, &req.rx_mini),
                (EthtoolRingsAttr::RxJumbo, &req.rx_jumbo),
                (EthtoolRingsAttr::Tx, &req.tx),
            ] {
                if let Some(v) = wanted.resolve() {
                    b.append_attr_u32(attr as u16, v);
                }
            }
        })
        .await
    }

    pub async fn get_channels(&self, ifname: &str) -> Result<Channels> {
        let data = self.get(EthtoolCmd::ChannelsGet, ifname).await?;
        parse_channels(&data)
    }

    pub async fn set_channels(&self, ifname: &str, req: &ChannelRequest) -> Result<()> {
        self.set(EthtoolCmd::ChannelsSet, ifname, |b| {
            for (attr, wanted) in [
                (EthtoolChannelsAttr::RxCount, &req.rx),
                (EthtoolChannelsAttr::TxCount, &req.tx),
                (EthtoolChannelsAttr::OtherCount, &req.other),
                (EthtoolChannelsAttr::CombinedCount, &req.combined),
            ] {
                if let Some(v) = wanted.resolve() {
                    b.append_attr_u32(attr as u16, v);
                }
            }
        })
        .await
    }

    pub async fn get_coalesce(&self, ifname: &str) -> Result<Coalesce> {
        let data = self.get(EthtoolCmd::CoalesceGet, ifname).await?;
        parse_coalesce(&data)
    }

    /// Coalescing attributes are numbered in `struct ethtool_coalesce`
    /// order, two past the field position.
    pub async fn set_coalesce(&self, ifname: &str, req: &CoalesceRequest) -> Result<()> {
        self.set(EthtoolCmd::CoalesceSet, ifname, |b| {
            for (pos, wanted) in req.u32_fields() {
                if let Some(v) = wanted.resolve() {
                    b.append_attr_u32(pos as u16 + 2, v);
                }
            }
            if let Some(on) = req.adaptive_rx.resolve() {
                b.append_attr_u8(EthtoolCoalesceAttr::UseAdaptiveRx as u16, on.into());
            }
            if let Some(on) = req.adaptive_tx.resolve() {
                b.append_attr_u8(EthtoolCoalesceAttr::UseAdaptiveTx as u16, on.into());
            }
        })
        .await
    }

    pub async fn get_pause(&self, ifname: &str) -> Result<Pause> {
        let data = self.get(EthtoolCmd::PauseGet, ifname).await?;
        parse_pause(&data)
    }

    pub async fn set_pause(&self, ifname: &str, req: &PauseRequest) -> Result<()> {
        self.set(EthtoolCmd::PauseSet, ifname, |b| {
            for (attr, wanted) in [
                (EthtoolPauseAttr::Autoneg, &req.autoneg),
                (EthtoolPauseAttr::Rx, &req.rx),
                (EthtoolPauseAttr::Tx, &req.tx),
            ] {
                if let Some(on) = wanted.resolve() {
                    b.append_attr_u8(attr as u16, on.into());
                }
            }
        })
        .await
    }

    // =========================================================================
    // FEC
    // =========================================================================

    pub async fn get_fec(&self, ifname: &str) -> Result<FecParams> {
        let data = self.get(EthtoolCmd::FecGet, ifname).await?;
        let link_modes = self.get_string_set(None, StringSetId::LinkModes).await?;

        let mut fec = FecParams::default();
        for (kind, payload) in AttrIter::new(&data) {
            match kind {
                t if t == EthtoolFecAttr::Modes as u16 => {
                    let mut modes = EthtoolBitset::parse(payload)?;
                    modes.resolve_names(&link_modes);
                    fec.configured = modes
                        .value_names()
                        .iter()
                        .map(|n| fec_display_name(n).to_string())
                        .collect();
                }
                t if t == EthtoolFecAttr::Auto as u16 => fec.auto = get::bool(payload)?,
                t if t == EthtoolFecAttr::Active as u16 => {
                    let bit = get::u32_ne(payload)?;
                    fec.active = link_modes.get(bit).map(|n| fec_display_name(n).to_string());
                }
                _ => {}
            }
        }
        Ok(fec)
    }

    /// Configure FEC encodings. Names are passed through for the kernel
    /// to validate.
    pub async fn set_fec(&self, ifname: &str, req: &FecRequest) -> Result<()> {
        let names = req.kernel_names();
        let bits: Vec<(&str, bool)> = names.iter().map(|n| (n.as_str(), true)).collect();
        self.set(EthtoolCmd::FecSet, ifname, |b| {
            write_named(b, EthtoolFecAttr::Modes as u16, &bits, true);
            b.append_attr_u8(EthtoolFecAttr::Auto as u16, req.auto.into());
        })
        .await
    }

    // =========================================================================
    // String sets
    // =========================================================================

    /// Fetch a string set, caching it for the life of the connection.
    ///
    /// Global sets are requested without a device; per-device sets
    /// (statistics, private flags) need `dev`.
    pub async fn get_string_set(&self, dev: Option<&str>, id: StringSetId) -> Result<StringSet> {
        let dev = if id.is_global() { None } else { dev };
        let key = (dev.map(str::to_string), id as u32);

        if let Ok(cache) = self.state().strsets.lock() {
            if let Some(set) = cache.get(&key) {
                return Ok(set.clone());
            }
        }

        let mut builder = self.builder(EthtoolCmd::StrsetGet);
        if let Some(dev) = dev {
            let hdr = builder.nest_start(EthtoolStrsetAttr::Header as u16);
            builder.append_attr_str(EthtoolHeaderAttr::DevName as u16, dev);
            builder.nest_end(hdr);
        }
        let sets = builder.nest_start(EthtoolStrsetAttr::Stringsets as u16);
        let set = builder.nest_start(ETHTOOL_A_STRINGSETS_STRINGSET);
        builder.append_attr_u32(EthtoolStringsetAttr::Id as u16, id as u32);
        builder.nest_end(set);
        builder.nest_end(sets);

        let replies = self.transact(builder).await?;
        let reply = replies
            .first()
            .ok_or_else(|| Error::InvalidMessage("empty string set reply".into()))?;
        let parsed = parse_strset_reply(attrs_of(reply)?, id as u32)?;
        tracing::debug!(set = ?id, len = parsed.len(), "fetched string set");

        if let Ok(mut cache) = self.state().strsets.lock() {
            cache.insert(key, parsed.clone());
        }
        Ok(parsed)
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    fn builder(&self, cmd: EthtoolCmd) -> MessageBuilder {
        let mut builder = MessageBuilder::new(self.state().family.id, NLM_F_REQUEST | NLM_F_ACK);
        builder.append_bytes(GenlMsgHdr::new(cmd as u8, ETHTOOL_GENL_VERSION).as_bytes());
        builder
    }

    /// Send `cmd` for `ifname` and return each reply's attributes.
    async fn request(
        &self,
        cmd: EthtoolCmd,
        ifname: Option<&str>,
        flags: u32,
        build: impl FnOnce(&mut MessageBuilder),
    ) -> Result<Vec<Vec<u8>>> {
        let mut builder = self.builder(cmd);
        let hdr = builder.nest_start(ETHTOOL_A_HEADER);
        if let Some(name) = ifname {
            builder.append_attr_str(EthtoolHeaderAttr::DevName as u16, name);
        }
        if flags != 0 {
            builder.append_attr_u32(EthtoolHeaderAttr::Flags as u16, flags);
        }
        builder.nest_end(hdr);
        build(&mut builder);

        tracing::debug!(?cmd, dev = ifname, "ethtool netlink request");
        let replies = self.transact(builder).await?;
        replies
            .iter()
            .map(|reply| attrs_of(reply).map(<[u8]>::to_vec))
            .collect()
    }

    async fn get(&self, cmd: EthtoolCmd, ifname: &str) -> Result<Vec<u8>> {
        let replies = self
            .request(cmd, Some(ifname), header_flags::COMPACT_BITSETS, |_| {})
            .await?;
        replies
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidMessage(format!("no reply to {cmd:?}")))
    }

    async fn set(
        &self,
        cmd: EthtoolCmd,
        ifname: &str,
        build: impl FnOnce(&mut MessageBuilder),
    ) -> Result<()> {
        self.request(cmd, Some(ifname), 0, build).await?;
        Ok(())
    }
}

/// Attributes of one genl reply, length-checked.
fn attrs_of(reply: &[u8]) -> Result<&[u8]> {
    let data = reply
        .get(GENL_HDRLEN..)
        .ok_or_else(|| Error::InvalidMessage("GENL header too short".into()))?;
    check_attrs(data)?;
    Ok(data)
}

/// Resolve feature changes to kernel names, legacy aliases expanded.
fn expand_feature_changes(names: &StringSet, changes: &[(String, bool)]) -> Result<Vec<(String, bool)>> {
    let mut bits: Vec<(String, bool)> = Vec::new();
    for (name, on) in changes {
        let targets: Vec<&str> = match legacy_feature(name) {
            Some(kernel) => kernel
                .iter()
                .copied()
                .filter(|k| names.index_of(k).is_some())
                .collect(),
            None if names.index_of(name).is_some() => vec![name.as_str()],
            None => {
                return Err(Error::InvalidAttribute(format!("unknown feature \"{name}\"")));
            }
        };
        if targets.is_empty() {
            return Err(Error::NotSupported(format!(
                "no kernel feature behind \"{name}\""
            )));
        }
        for target in targets {
            match bits.iter_mut().find(|(n, _)| n == target) {
                Some(entry) => entry.1 = *on,
                None => bits.push((target.to_string(), *on)),
            }
        }
    }
    Ok(bits)
}

/// Name of the device in a reply or notification header.
pub(super) fn header_dev_name(data: &[u8]) -> Result<Option<String>> {
    check_attrs(data)?;
    for (kind, payload) in AttrIter::new(data) {
        if kind == EthtoolHeaderAttr::DevName as u16 {
            return Ok(Some(get::string(payload)?.to_string()));
        }
    }
    Ok(None)
}

pub(super) fn parse_link_state(data: &[u8]) -> Result<LinkState> {
    let mut state = LinkState::default();
    for (kind, payload) in AttrIter::new(data) {
        match kind {
            t if t == EthtoolLinkstateAttr::Link as u16 => state.link = get::bool(payload)?,
            t if t == EthtoolLinkstateAttr::Sqi as u16 => state.sqi = Some(get::u32_ne(payload)?),
            t if t == EthtoolLinkstateAttr::SqiMax as u16 => {
                state.sqi_max = Some(get::u32_ne(payload)?)
            }
            t if t == EthtoolLinkstateAttr::ExtState as u16 => {
                state.ext_state = Some(get::u8(payload)?)
            }
            t if t == EthtoolLinkstateAttr::ExtSubstate as u16 => {
                state.ext_substate = Some(get::u8(payload)?)
            }
            _ => {}
        }
    }
    Ok(state)
}

pub(super) fn parse_msglvl(data: &[u8]) -> Result<MsgLevel> {
    for (kind, payload) in AttrIter::new(data) {
        if kind == EthtoolDebugAttr::Msgmask as u16 {
            let mask = EthtoolBitset::parse(payload)?;
            return Ok(MsgLevel {
                value: mask.value_u32(),
            });
        }
    }
    Err(Error::InvalidMessage("debug reply without message mask".into()))
}

pub(super) fn parse_rings(data: &[u8]) -> Result<Rings> {
    let mut rings = Rings::default();
    for (kind, payload) in AttrIter::new(data) {
        let slot = match kind {
            t if t == EthtoolRingsAttr::RxMax as u16 => &mut rings.rx_max,
            t if t == EthtoolRingsAttr::RxMiniMax as u16 => &mut rings.rx_mini_max,
            t if t == EthtoolRingsAttr::RxJumboMax as u16 => &mut rings.rx_jumbo_max,
            t if t == EthtoolRingsAttr::TxMax as u16 => &mut rings.tx_max,
            t if t == EthtoolRingsAttr::Rx as u16 => &mut rings.rx,
            t if t == EthtoolRingsAttr::RxMini as u16 => &mut rings.rx_mini,
            t if t == EthtoolRingsAttr::RxJumbo as u16 => &mut rings.rx_jumbo,
            t if t == EthtoolRingsAttr::Tx as u16 => &mut rings.tx,
            _ => continue,
        };
        *slot = Some(get::u32_ne(payload)?);
    }
    Ok(rings)
}

pub(super) fn parse_channels(data: &[u8]) -> Result<Channels> {
    let mut ch = Channels::default();
    for (kind, payload) in AttrIter::new(data) {
        let slot = match kind {
            t if t == EthtoolChannelsAttr::RxMax as u16 => &mut ch.rx_max,
            t if t == EthtoolChannelsAttr::TxMax as u16 => &mut ch.tx_max,
            t if t == EthtoolChannelsAttr::OtherMax as u16 => &mut ch.other_max,
            t if t == EthtoolChannelsAttr::CombinedMax as u16 => &mut ch.combined_max,
            t if t == EthtoolChannelsAttr::RxCount as u16 => &mut ch.rx_count,
            t if t == EthtoolChannelsAttr::TxCount as u16 => &mut ch.tx_count,
            t if t == EthtoolChannelsAttr::OtherCount as u16 => &mut ch.other_count,
            t if t == EthtoolChannelsAttr::CombinedCount as u16 => &mut ch.combined_count,
            _ => continue,
        };
        *slot = Some(get::u32_ne(payload)?);
    }
    Ok(ch)
}

pub(super) fn parse_coalesce(data: &[u8]) -> Result<Coalesce> {
    use EthtoolCoalesceAttr as A;

    let mut c = Coalesce::default();
    for (kind, payload) in AttrIter::new(data) {
        match kind {
            t if t == A::UseAdaptiveRx as u16 => c.adaptive_rx = Some(get::bool(payload)?),
            t if t == A::UseAdaptiveTx as u16 => c.adaptive_tx = Some(get::bool(payload)?),
            _ => {
                let slot = match kind {
                    t if t == A::RxUsecs as u16 => &mut c.rx_usecs,
                    t if t == A::RxMaxFrames as u16 => &mut c.rx_frames,
                    t if t == A::RxUsecsIrq as u16 => &mut c.rx_usecs_irq,
                    t if t == A::RxMaxFramesIrq as u16 => &mut c.rx_frames_irq,
                    t if t == A::TxUsecs as u16 => &mut c.tx_usecs,
                    t if t == A::TxMaxFrames as u16 => &mut c.tx_frames,
                    t if t == A::TxUsecsIrq as u16 => &mut c.tx_usecs_irq,
                    t if t == A::TxMaxFramesIrq as u16 => &mut c.tx_frames_irq,
                    t if t == A::StatsBlockUsecs as u16 => &mut c.stats_block_usecs,
                    t if t == A::PktRateLow as u16 => &mut c.pkt_rate_low,
                    t if t == A::RxUsecsLow as u16 => &mut c.rx_usecs_low,
                    t if t == A::RxMaxFramesLow as u16 => &mut c.rx_frames_low,
                    t if t == A::TxUsecsLow as u16 => &mut c.tx_usecs_low,
                    t if t == A::TxMaxFramesLow as u16 => &mut c.tx_frames_low,
                    t if t == A::PktRateHigh as u16 => &mut c.pkt_rate_high,
                    t if t == A::RxUsecsHigh as u16 => &mut c.rx_usecs_high,
                    t if t == A::RxMaxFramesHigh as u16 => &mut c.rx_frames_high,
                    t if t == A::TxUsecsHigh as u16 => &mut c.tx_usecs_high,
                    t if t == A::TxMaxFramesHigh as u16 => &mut c.tx_frames_high,
                    t if t == A::RateSampleInterval as u16 => &mut c.rate_sample_interval,
                    _ => continue,
                };
                *slot = Some(get::u32_ne(payload)?);
            }
        }
    }
    Ok(c)
}

pub(super) fn parse_pause(data: &[u8]) -> Result<Pause> {
    let mut pause = Pause::default();
    for (kind, payload) in AttrIter::new(data) {
        let slot = match kind {
            t if t == EthtoolPauseAttr::Autoneg as u16 => &mut pause.autoneg,
            t if t == EthtoolPauseAttr::Rx as u16 => &mut pause.rx,
            t if t == EthtoolPauseAttr::Tx as u16 => &mut pause.tx,
            _ => continue,
        };
        *slot = Some(get::bool(payload)?);
    }
    Ok(pause)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rings_reply() {
        let mut b = MessageBuilder::new(0x20, 0);
        let hdr = b.nest_start(ETHTOOL_A_HEADER);
        b.append_attr_str(EthtoolHeaderAttr::DevName as u16, "eth0");
        b.nest_end(hdr);
        b.append_attr_u32(EthtoolRingsAttr::RxMax as u16, 4096);
        b.append_attr_u32(EthtoolRingsAttr::Rx as u16, 512);
        b.append_attr_u32(EthtoolRingsAttr::Tx as u16, 256);

        let rings = parse_rings(b.payload()).unwrap();
        assert_eq!(rings.rx_max, Some(4096));
        assert_eq!(rings.rx, Some(512));
        assert_eq!(rings.tx, Some(256));
        assert_eq!(rings.rx_mini, None);
    }

    #[test]
    fn truncated_value_is_an_error() {
        let mut b = MessageBuilder::new(0x20, 0);
        b.append_attr(EthtoolChannelsAttr::CombinedCount as u16, &[1, 0]);
        assert!(parse_channels(b.payload()).is_err());
    }

    #[test]
    fn coalesce_reply() {
        let mut b = MessageBuilder::new(0x20, 0);
        b.append_attr_u32(EthtoolCoalesceAttr::RxUsecs as u16, 50);
        b.append_attr_u8(EthtoolCoalesceAttr::UseAdaptiveRx as u16, 1);
        b.append_attr_u32(EthtoolCoalesceAttr::RateSampleInterval as u16, 3);
        let c = parse_coalesce(b.payload()).unwrap();
        assert_eq!(c.rx_usecs, Some(50));
        assert_eq!(c.adaptive_rx, Some(true));
        assert_eq!(c.adaptive_tx, None);
        assert_eq!(c.rate_sample_interval, Some(3));
    }

    #[test]
    fn coalesce_attrs_follow_field_positions() {
        assert_eq!(EthtoolCoalesceAttr::RxUsecs as u16, 2);
        assert_eq!(EthtoolCoalesceAttr::StatsBlockUsecs as u16, 8 + 2);
        assert_eq!(EthtoolCoalesceAttr::PktRateLow as u16, 11 + 2);
        assert_eq!(EthtoolCoalesceAttr::RateSampleInterval as u16, 21 + 2);
    }

    #[test]
    fn pause_and_header() {
        let mut b = MessageBuilder::new(0x20, 0);
        let hdr = b.nest_start(ETHTOOL_A_HEADER);
        b.append_attr_str(EthtoolHeaderAttr::DevName as u16, "enp3s0");
        b.nest_end(hdr);
        b.append_attr_u8(EthtoolPauseAttr::Rx as u16, 1);
        b.append_attr_u8(EthtoolPauseAttr::Tx as u16, 0);
        let pause = parse_pause(b.payload()).unwrap();
        assert_eq!(pause.rx, Some(true));
        assert_eq!(pause.tx, Some(false));
        assert_eq!(pause.autoneg, None);

        let (_, header) = AttrIter::new(b.payload()).next().unwrap();
        assert_eq!(header_dev_name(header).unwrap().as_deref(), Some("enp3s0"));
    }

    #[test]
    fn msglvl_from_compact_bitset() {
        let mut b = MessageBuilder::new(0x20, 0);
        write_compact_u32(&mut b, EthtoolDebugAttr::Msgmask as u16, 15, 0x7, None);
        assert_eq!(parse_msglvl(b.payload()).unwrap().value, 0x7);
    }

    #[test]
    fn feature_aliases_expand() {
        let names = StringSet::new(
            StringSetId::Features as u32,
            ["tx-scatter-gather", "tx-tcp-segmentation", "tx-tcp6-segmentation", "rx-gro"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        let changes = vec![
            ("tso".to_string(), false),
            ("rx-gro".to_string(), true),
            ("tx-tcp6-segmentation".to_string(), true),
        ];
        let bits = expand_feature_changes(&names, &changes).unwrap();
        assert_eq!(
            bits,
            [
                ("tx-tcp-segmentation".to_string(), false),
                ("tx-tcp6-segmentation".to_string(), true),
                ("rx-gro".to_string(), true),
            ]
        );

        let bogus = vec![("bogus".to_string(), true)];
        assert!(expand_feature_changes(&names, &bogus).is_err());
        let absent = vec![("lro".to_string(), true)];
        assert!(expand_feature_changes(&names, &absent).is_err());
    }
}
