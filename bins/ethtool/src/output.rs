//! Text and JSON rendering of decoded device state.

use std::io::{self, Write};
use std::net::Ipv4Addr;

use serde::Serialize;

use nicctl::command::{COMMANDS, CommandKind, DeviceArg};
use nicctl::netlink::{EthtoolEvent, EventKind};
use nicctl::types::{
    Channels, Coalesce, DriverInfo, EepromDump, Features, FecParams, FlowType, LinkSettings,
    LinkState, MsgLevel, NtupleRule, Pause, RegDump, Rings, RuleList, RxFlowHash, SelfTest, Stats,
    WolInfo, is_speed_mode, rxh, wake, wol_letters,
};
use nicctl::util::format_mac;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Something a command prints.
pub trait Printable: Serialize {
    /// Print as text for device `dev`.
    fn print_text<W: Write>(&self, w: &mut W, dev: &str) -> io::Result<()>;

    fn print<W: Write>(&self, w: &mut W, format: OutputFormat, dev: &str) -> io::Result<()> {
        match format {
            OutputFormat::Text => self.print_text(w, dev),
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, self)?;
                writeln!(w)
            }
        }
    }
}

fn on_off(v: bool) -> &'static str {
    if v { "on" } else { "off" }
}

fn opt_u32(v: Option<u32>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

fn opt_on_off(v: Option<bool>) -> &'static str {
    v.map_or("n/a", on_off)
}

// =============================================================================
// Settings
// =============================================================================

/// Everything the bare `ethtool DEVICE` form shows. Parts the device
/// could not report are left out.
#[derive(Debug, Default, Serialize)]
pub struct DeviceSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wol: Option<WolInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msglvl: Option<MsgLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<LinkState>,
}

impl DeviceSettings {
    pub fn is_empty(&self) -> bool {
        self.link.is_none() && self.wol.is_none() && self.msglvl.is_none() && self.state.is_none()
    }
}

/// Modes wrap after this many per line.
const MODES_PER_LINE: usize = 3;

fn write_modes<W: Write>(w: &mut W, label: &str, modes: &[&str]) -> io::Result<()> {
    write!(w, "\t{label:<24}")?;
    if modes.is_empty() {
        return writeln!(w, "Not reported");
    }
    for (i, chunk) in modes.chunks(MODES_PER_LINE).enumerate() {
        if i > 0 {
            write!(w, "\t{:<24}", "")?;
        }
        writeln!(w, "{}", chunk.join(" "))?;
    }
    Ok(())
}

fn pause_use(modes: &[String]) -> &'static str {
    let pause = modes.iter().any(|m| m == "Pause");
    let asym = modes.iter().any(|m| m == "Asym_Pause");
    match (pause, asym) {
        (false, false) => "No",
        (true, false) => "Symmetric",
        (false, true) => "Transmit-only",
        (true, true) => "Symmetric Receive-only",
    }
}

fn write_link<W: Write>(w: &mut W, link: &LinkSettings) -> io::Result<()> {
    writeln!(w, "\tSupported ports: [ {} ]", link.supported_ports().join(" "))?;
    let supported: Vec<&str> = link
        .supported
        .iter()
        .map(String::as_str)
        .filter(|m| is_speed_mode(m))
        .collect();
    write_modes(w, "Supported link modes:", &supported)?;
    writeln!(w, "\tSupported pause frame use: {}", pause_use(&link.supported))?;
    writeln!(
        w,
        "\tSupports auto-negotiation: {}",
        if link.supports_autoneg() { "Yes" } else { "No" }
    )?;
    let advertised: Vec<&str> = link
        .advertised
        .iter()
        .map(String::as_str)
        .filter(|m| is_speed_mode(m))
        .collect();
    write_modes(w, "Advertised link modes:", &advertised)?;
    writeln!(w, "\tAdvertised pause frame use: {}", pause_use(&link.advertised))?;
    if !link.peer_advertised.is_empty() {
        let peer: Vec<&str> = link
            .peer_advertised
            .iter()
            .map(String::as_str)
            .filter(|m| is_speed_mode(m))
            .collect();
        write_modes(w, "Link partner advertised link modes:", &peer)?;
    }

    match link.speed {
        Some(speed) => writeln!(w, "\tSpeed: {speed}Mb/s")?,
        None => writeln!(w, "\tSpeed: Unknown!")?,
    }
    if let Some(lanes) = link.lanes {
        writeln!(w, "\tLanes: {lanes}")?;
    }
    writeln!(w, "\tDuplex: {}", link.duplex)?;
    writeln!(w, "\tPort: {}", link.port)?;
    if let Some(phyad) = link.phyad {
        writeln!(w, "\tPHYAD: {phyad}")?;
    }
    if let Some(xcvr) = link.transceiver {
        writeln!(w, "\tTransceiver: {xcvr}")?;
    }
    writeln!(w, "\tAuto-negotiation: {}", on_off(link.autoneg))?;
    if let Some(mdix) = link.mdix {
        match link.mdix_ctrl {
            Some(ctrl) if ctrl == nicctl::types::MdiX::Auto => {
                writeln!(w, "\tMDI-X: {mdix} (auto)")?
            }
            Some(_) => writeln!(w, "\tMDI-X: {mdix} (forced)")?,
            None => writeln!(w, "\tMDI-X: {mdix}")?,
        }
    }
    Ok(())
}

fn write_wol<W: Write>(w: &mut W, wol: &WolInfo) -> io::Result<()> {
    writeln!(w, "\tSupports Wake-on: {}", wol_letters(wol.supported))?;
    writeln!(w, "\tWake-on: {}", wol_letters(wol.wolopts))?;
    if wol.supported & wake::MAGICSECURE != 0
        && let Some(pass) = &wol.sopass
    {
        writeln!(w, "\tSecureOn password: {}", format_mac(pass))?;
    }
    Ok(())
}

impl Printable for DeviceSettings {
    fn print_text<W: Write>(&self, w: &mut W, dev: &str) -> io::Result<()> {
        writeln!(w, "Settings for {dev}:")?;
        if let Some(link) = &self.link {
            write_link(w, link)?;
        }
        if let Some(wol) = &self.wol {
            write_wol(w, wol)?;
        }
        if let Some(lvl) = &self.msglvl {
            writeln!(w, "\tCurrent message level: 0x{:08x} ({})", lvl.value, lvl.value)?;
            writeln!(w, "\t\t\t       {}", lvl.names().join(" "))?;
        }
        if let Some(state) = &self.state {
            writeln!(w, "\tLink detected: {}", if state.link { "yes" } else { "no" })?;
            if let (Some(sqi), Some(max)) = (state.sqi, state.sqi_max) {
                writeln!(w, "\tSQI: {sqi}/{max}")?;
            }
        }
        Ok(())
    }
}

impl Printable for DriverInfo {
    fn print_text<W: Write>(&self, w: &mut W, _dev: &str) -> io::Result<()> {
        let yes_no = |v: u32| if v != 0 { "yes" } else { "no" };
        writeln!(w, "driver: {}", self.driver)?;
        writeln!(w, "version: {}", self.version)?;
        writeln!(w, "firmware-version: {}", self.fw_version)?;
        writeln!(w, "expansion-rom-version: {}", self.erom_version)?;
        writeln!(w, "bus-info: {}", self.bus_info)?;
        writeln!(w, "supports-statistics: {}", yes_no(self.n_stats))?;
        writeln!(w, "supports-test: {}", yes_no(self.testinfo_len))?;
        writeln!(w, "supports-eeprom-access: {}", yes_no(self.eedump_len))?;
        writeln!(w, "supports-register-dump: {}", yes_no(self.regdump_len))?;
        writeln!(w, "supports-priv-flags: {}", yes_no(self.n_priv_flags))
    }
}

/// Permanent hardware address.
#[derive(Debug, Serialize)]
pub struct PermAddr {
    pub address: String,
}

impl PermAddr {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            address: format_mac(bytes),
        }
    }
}

impl Printable for PermAddr {
    fn print_text<W: Write>(&self, w: &mut W, _dev: &str) -> io::Result<()> {
        writeln!(w, "Permanent address: {}", self.address)
    }
}

// =============================================================================
// Parameter families
// =============================================================================

impl Printable for Pause {
    fn print_text<W: Write>(&self, w: &mut W, dev: &str) -> io::Result<()> {
        writeln!(w, "Pause parameters for {dev}:")?;
        writeln!(w, "Autonegotiate:\t{}", opt_on_off(self.autoneg))?;
        writeln!(w, "RX:\t\t{}", opt_on_off(self.rx))?;
        writeln!(w, "TX:\t\t{}", opt_on_off(self.tx))
    }
}

impl Printable for Rings {
    fn print_text<W: Write>(&self, w: &mut W, dev: &str) -> io::Result<()> {
        writeln!(w, "Ring parameters for {dev}:")?;
        writeln!(w, "Pre-set maximums:")?;
        writeln!(w, "RX:\t\t{}", opt_u32(self.rx_max))?;
        writeln!(w, "RX Mini:\t{}", opt_u32(self.rx_mini_max))?;
        writeln!(w, "RX Jumbo:\t{}", opt_u32(self.rx_jumbo_max))?;
        writeln!(w, "TX:\t\t{}", opt_u32(self.tx_max))?;
        writeln!(w, "Current hardware settings:")?;
        writeln!(w, "RX:\t\t{}", opt_u32(self.rx))?;
        writeln!(w, "RX Mini:\t{}", opt_u32(self.rx_mini))?;
        writeln!(w, "RX Jumbo:\t{}", opt_u32(self.rx_jumbo))?;
        writeln!(w, "TX:\t\t{}", opt_u32(self.tx))
    }
}

impl Printable for Channels {
    fn print_text<W: Write>(&self, w: &mut W, dev: &str) -> io::Result<()> {
        writeln!(w, "Channel parameters for {dev}:")?;
        writeln!(w, "Pre-set maximums:")?;
        writeln!(w, "RX:\t\t{}", opt_u32(self.rx_max))?;
        writeln!(w, "TX:\t\t{}", opt_u32(self.tx_max))?;
        writeln!(w, "Other:\t\t{}", opt_u32(self.other_max))?;
        writeln!(w, "Combined:\t{}", opt_u32(self.combined_max))?;
        writeln!(w, "Current hardware settings:")?;
        writeln!(w, "RX:\t\t{}", opt_u32(self.rx_count))?;
        writeln!(w, "TX:\t\t{}", opt_u32(self.tx_count))?;
        writeln!(w, "Other:\t\t{}", opt_u32(self.other_count))?;
        writeln!(w, "Combined:\t{}", opt_u32(self.combined_count))
    }
}

impl Printable for Coalesce {
    fn print_text<W: Write>(&self, w: &mut W, dev: &str) -> io::Result<()> {
        writeln!(w, "Coalesce parameters for {dev}:")?;
        writeln!(
            w,
            "Adaptive RX: {}  TX: {}",
            opt_on_off(self.adaptive_rx),
            opt_on_off(self.adaptive_tx)
        )?;
        let groups: [&[(&str, Option<u32>)]; 5] = [
            &[
                ("stats-block-usecs", self.stats_block_usecs),
                ("sample-interval", self.rate_sample_interval),
                ("pkt-rate-low", self.pkt_rate_low),
                ("pkt-rate-high", self.pkt_rate_high),
            ],
            &[
                ("rx-usecs", self.rx_usecs),
                ("rx-frames", self.rx_frames),
                ("rx-usecs-irq", self.rx_usecs_irq),
                ("rx-frames-irq", self.rx_frames_irq),
            ],
            &[
                ("tx-usecs", self.tx_usecs),
                ("tx-frames", self.tx_frames),
                ("tx-usecs-irq", self.tx_usecs_irq),
                ("tx-frames-irq", self.tx_frames_irq),
            ],
            &[
                ("rx-usecs-low", self.rx_usecs_low),
                ("rx-frames-low", self.rx_frames_low),
                ("tx-usecs-low", self.tx_usecs_low),
                ("tx-frames-low", self.tx_frames_low),
            ],
            &[
                ("rx-usecs-high", self.rx_usecs_high),
                ("rx-frames-high", self.rx_frames_high),
                ("tx-usecs-high", self.tx_usecs_high),
                ("tx-frames-high", self.tx_frames_high),
            ],
        ];
        for group in groups {
            writeln!(w)?;
            for (name, value) in group {
                writeln!(w, "{name}: {}", opt_u32(*value))?;
            }
        }
        Ok(())
    }
}

impl Printable for Features {
    fn print_text<W: Write>(&self, w: &mut W, dev: &str) -> io::Result<()> {
        writeln!(w, "Features for {dev}:")?;
        for f in &self.entries {
            write!(w, "{}: {}", f.name, on_off(f.active))?;
            if f.fixed {
                write!(w, " [fixed]")?;
            } else if f.requested != f.active {
                write!(w, " [requested {}]", on_off(f.requested))?;
            }
            writeln!(w)?;
        }
        Ok(())
    }
}

impl Printable for FecParams {
    fn print_text<W: Write>(&self, w: &mut W, dev: &str) -> io::Result<()> {
        writeln!(w, "FEC parameters for {dev}:")?;
        let mut configured: Vec<&str> = Vec::new();
        if self.auto {
            configured.push("Auto");
        }
        configured.extend(self.configured.iter().map(String::as_str));
        if configured.is_empty() {
            configured.push("None");
        }
        writeln!(w, "Supported/Configured FEC encodings: {}", configured.join(" "))?;
        writeln!(
            w,
            "Active FEC encoding: {}",
            self.active.as_deref().unwrap_or("None")
        )
    }
}

// =============================================================================
// Flow classification
// =============================================================================

impl Printable for RxFlowHash {
    fn print_text<W: Write>(&self, w: &mut W, _dev: &str) -> io::Result<()> {
        if self.fields == 0 {
            return writeln!(w, "No data available");
        }
        if self.fields & rxh::DISCARD != 0 {
            return writeln!(w, "All matching {} flows are discarded", self.flow_type);
        }
        writeln!(
            w,
            "{} flows use these fields for computing Hash flow key:",
            self.flow_type
        )?;
        for (_, bit, text) in rxh::FIELDS {
            if self.fields & bit != 0 {
                writeln!(w, "{text}")?;
            }
        }
        Ok(())
    }
}

fn write_rule<W: Write>(w: &mut W, rule: &NtupleRule) -> io::Result<()> {
    let (v, m) = (&rule.value, &rule.mask);
    writeln!(w, "Filter: {}", rule.location)?;
    writeln!(w, "\tRule Type: {}", rule.flow_type)?;
    if rule.flow_type == FlowType::Ether {
        writeln!(w, "\tSrc MAC addr: {} mask: {}", format_mac(&v.src_mac), format_mac(&m.src_mac))?;
        writeln!(w, "\tDest MAC addr: {} mask: {}", format_mac(&v.dst_mac), format_mac(&m.dst_mac))?;
        writeln!(w, "\tEthertype: 0x{:x} mask: 0x{:x}", v.proto, m.proto)?;
    } else {
        if rule.flow_type.is_ipv4() {
            writeln!(
                w,
                "\tSrc IP addr: {} mask: {}",
                Ipv4Addr::from_bits(v.src_ip),
                Ipv4Addr::from_bits(m.src_ip)
            )?;
            writeln!(
                w,
                "\tDest IP addr: {} mask: {}",
                Ipv4Addr::from_bits(v.dst_ip),
                Ipv4Addr::from_bits(m.dst_ip)
            )?;
        }
        writeln!(w, "\tTOS: 0x{:x} mask: 0x{:x}", v.tos, m.tos)?;
        writeln!(w, "\tSrc port: {} mask: 0x{:x}", v.src_port, m.src_port)?;
        writeln!(w, "\tDest port: {} mask: 0x{:x}", v.dst_port, m.dst_port)?;
    }
    match rule.action {
        Some(queue) => writeln!(w, "\tAction: Direct to queue {queue}"),
        None => writeln!(w, "\tAction: Drop"),
    }
}

impl Printable for NtupleRule {
    fn print_text<W: Write>(&self, w: &mut W, _dev: &str) -> io::Result<()> {
        write_rule(w, self)
    }
}

impl Printable for RuleList {
    fn print_text<W: Write>(&self, w: &mut W, _dev: &str) -> io::Result<()> {
        writeln!(w, "{} RX rings available", self.rx_rings)?;
        writeln!(w, "Total {} rules", self.total)?;
        for rule in &self.rules {
            writeln!(w)?;
            write_rule(w, rule)?;
        }
        Ok(())
    }
}

// =============================================================================
// Dumps, tests and statistics
// =============================================================================

/// Hex dump, 16 bytes per row, addresses starting at `base`.
pub fn hex_dump<W: Write>(w: &mut W, base: u32, data: &[u8]) -> io::Result<()> {
    writeln!(w, "Offset\t\tValues")?;
    writeln!(w, "------\t\t------")?;
    for (row, chunk) in data.chunks(16).enumerate() {
        write!(w, "0x{:04x}:\t", base as usize + row * 16)?;
        let bytes: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        writeln!(w, "\t{}", bytes.join(" "))?;
    }
    Ok(())
}

impl Printable for RegDump {
    fn print_text<W: Write>(&self, w: &mut W, _dev: &str) -> io::Result<()> {
        hex_dump(w, 0, &self.data)
    }
}

impl Printable for EepromDump {
    fn print_text<W: Write>(&self, w: &mut W, _dev: &str) -> io::Result<()> {
        hex_dump(w, self.offset, &self.data)
    }
}

impl Printable for SelfTest {
    fn print_text<W: Write>(&self, w: &mut W, _dev: &str) -> io::Result<()> {
        writeln!(
            w,
            "The test result is {}",
            if self.passed { "PASS" } else { "FAIL" }
        )?;
        if self.external_lb_done {
            writeln!(w, "External loopback test was executed")?;
        }
        if !self.results.is_empty() {
            writeln!(w, "The test extra info:")?;
            for (name, value) in &self.results {
                writeln!(w, "{name}\t {value}")?;
            }
        }
        Ok(())
    }
}

impl Printable for Stats {
    fn print_text<W: Write>(&self, w: &mut W, _dev: &str) -> io::Result<()> {
        writeln!(w, "NIC statistics:")?;
        for (name, value) in &self.entries {
            writeln!(w, "     {name}: {value}")?;
        }
        Ok(())
    }
}

// =============================================================================
// Notifications and help
// =============================================================================

/// One line per notification.
pub fn print_event<W: Write>(w: &mut W, event: &EthtoolEvent, format: OutputFormat) -> io::Result<()> {
    if format == OutputFormat::Json {
        serde_json::to_writer(&mut *w, event)?;
        return writeln!(w);
    }

    let dev = event.ifname.as_deref().unwrap_or("?");
    match &event.change {
        EventKind::LinkModes {
            speed,
            duplex,
            autoneg,
        } => {
            let speed = speed.map_or_else(|| "Unknown!".to_string(), |s| format!("{s}Mb/s"));
            let duplex = duplex.map_or_else(|| "Unknown!".to_string(), |d| d.to_string());
            write!(w, "[{dev}] link modes: {speed} {duplex}")?;
            if let Some(an) = autoneg {
                write!(w, " autoneg {}", on_off(*an))?;
            }
            writeln!(w)
        }
        EventKind::MsgLevel(lvl) => {
            writeln!(w, "[{dev}] message level: 0x{:08x} ({})", lvl.value, lvl.names().join(" "))
        }
        EventKind::Rings(r) => writeln!(
            w,
            "[{dev}] rings: rx {} tx {}",
            opt_u32(r.rx),
            opt_u32(r.tx)
        ),
        EventKind::Channels(c) => writeln!(
            w,
            "[{dev}] channels: rx {} tx {} other {} combined {}",
            opt_u32(c.rx_count),
            opt_u32(c.tx_count),
            opt_u32(c.other_count),
            opt_u32(c.combined_count)
        ),
        EventKind::Coalesce(c) => writeln!(
            w,
            "[{dev}] coalesce: rx-usecs {} tx-usecs {}",
            opt_u32(c.rx_usecs),
            opt_u32(c.tx_usecs)
        ),
        EventKind::Pause(p) => writeln!(
            w,
            "[{dev}] pause: autoneg {} rx {} tx {}",
            opt_on_off(p.autoneg),
            opt_on_off(p.rx),
            opt_on_off(p.tx)
        ),
        EventKind::LinkInfo => writeln!(w, "[{dev}] link info changed"),
        EventKind::Wol => writeln!(w, "[{dev}] wake-on-lan settings changed"),
        EventKind::Features => writeln!(w, "[{dev}] features changed"),
        EventKind::PrivFlags => writeln!(w, "[{dev}] private flags changed"),
        EventKind::Eee => writeln!(w, "[{dev}] EEE settings changed"),
        EventKind::Fec => writeln!(w, "[{dev}] FEC settings changed"),
        EventKind::Other { cmd } => writeln!(w, "[{dev}] notification {cmd}"),
    }
}

/// The verb table.
pub fn print_help<W: Write>(w: &mut W) -> io::Result<()> {
    writeln!(w, "ethtool version {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(w, "Usage:")?;
    writeln!(w, "        ethtool [ --json ] [ --disable-netlink ] [ --debug N ] DEVNAME")?;
    for desc in COMMANDS.iter().filter(|d| d.kind != CommandKind::ShowSettings) {
        let forms: Vec<&str> = desc.short.iter().chain(desc.long).copied().collect();
        let dev = match desc.device {
            DeviceArg::Required => " DEVNAME",
            DeviceArg::Optional => " [ DEVNAME ]",
            DeviceArg::None => "",
        };
        writeln!(w, "        ethtool {}{dev}\t{}", forms.join("|"), desc.help)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nicctl::types::{Duplex, Feature, NtupleMatch, Port};

    fn text<P: Printable>(p: &P) -> String {
        let mut out = Vec::new();
        p.print_text(&mut out, "eth0").unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn hex_rows_of_sixteen() {
        let mut out = Vec::new();
        let data: Vec<u8> = (0u8..20).collect();
        hex_dump(&mut out, 0x10, &data).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("0x0010:"));
        assert!(lines[2].ends_with("0e 0f"));
        assert!(lines[3].starts_with("0x0020:"));
        assert!(lines[3].ends_with("10 11 12 13"));
    }

    #[test]
    fn settings_text() {
        let settings = DeviceSettings {
            link: Some(LinkSettings {
                supported: vec![
                    "10baseT/Half".into(),
                    "100baseT/Full".into(),
                    "Autoneg".into(),
                    "TP".into(),
                ],
                advertised: vec!["100baseT/Full".into()],
                speed: Some(100),
                duplex: Duplex::Full,
                port: Port::Tp,
                phyad: Some(1),
                autoneg: true,
                ..Default::default()
            }),
            wol: Some(WolInfo {
                supported: wake::MAGIC | wake::PHY,
                wolopts: wake::MAGIC,
                sopass: None,
            }),
            msglvl: Some(MsgLevel { value: 0x7 }),
            state: Some(LinkState {
                link: true,
                ..Default::default()
            }),
        };
        let out = text(&settings);
        assert!(out.starts_with("Settings for eth0:\n"));
        assert!(out.contains("\tSupported ports: [ TP ]\n"));
        assert!(out.contains("Speed: 100Mb/s"));
        assert!(out.contains("Duplex: Full"));
        assert!(out.contains("Port: Twisted Pair"));
        assert!(out.contains("Supports Wake-on: pg"));
        assert!(out.contains("Wake-on: g"));
        assert!(out.contains("0x00000007 (7)"));
        assert!(out.contains("drv probe link"));
        assert!(out.contains("Link detected: yes"));
    }

    #[test]
    fn partial_settings_skip_missing_parts() {
        let settings = DeviceSettings {
            state: Some(LinkState::default()),
            ..Default::default()
        };
        let out = text(&settings);
        assert!(!out.contains("Wake-on"));
        assert!(out.contains("Link detected: no"));
        assert!(!settings.is_empty());
        assert!(DeviceSettings::default().is_empty());
    }

    #[test]
    fn settings_json_omits_missing_parts() {
        let settings = DeviceSettings {
            msglvl: Some(MsgLevel { value: 1 }),
            ..Default::default()
        };
        let mut out = Vec::new();
        settings.print(&mut out, OutputFormat::Json, "eth0").unwrap();
        let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(v["msglvl"]["value"], 1);
        assert!(v.get("wol").is_none());
    }

    #[test]
    fn features_annotations() {
        let features = Features {
            entries: vec![
                Feature {
                    name: "rx-checksum".into(),
                    active: true,
                    fixed: true,
                    requested: true,
                },
                Feature {
                    name: "rx-gro".into(),
                    active: false,
                    fixed: false,
                    requested: true,
                },
            ],
        };
        let out = text(&features);
        assert!(out.contains("rx-checksum: on [fixed]\n"));
        assert!(out.contains("rx-gro: off [requested on]\n"));
    }

    #[test]
    fn fec_text() {
        let fec = FecParams {
            configured: vec!["RS".into()],
            auto: true,
            active: Some("RS".into()),
        };
        let out = text(&fec);
        assert!(out.contains("Supported/Configured FEC encodings: Auto RS"));
        assert!(out.contains("Active FEC encoding: RS"));
    }

    #[test]
    fn flow_hash_fields() {
        let hash = RxFlowHash {
            flow_type: FlowType::Tcp4,
            fields: rxh::IP_SRC | rxh::IP_DST,
        };
        let out = text(&hash);
        assert!(out.starts_with("TCP over IPV4 flows use"));
        assert!(out.contains("IP SA\nIP DA\n"));
    }

    #[test]
    fn rule_text() {
        let rule = NtupleRule {
            flow_type: FlowType::Udp4,
            value: NtupleMatch {
                dst_ip: Ipv4Addr::new(10, 0, 0, 1).to_bits(),
                dst_port: 53,
                ..Default::default()
            },
            mask: NtupleMatch {
                dst_ip: u32::MAX,
                dst_port: u16::MAX,
                ..Default::default()
            },
            action: None,
            location: 4,
        };
        let out = text(&rule);
        assert!(out.contains("Filter: 4"));
        assert!(out.contains("Dest IP addr: 10.0.0.1 mask: 255.255.255.255"));
        assert!(out.contains("Dest port: 53 mask: 0xffff"));
        assert!(out.contains("Action: Drop"));
    }

    #[test]
    fn help_lists_every_verb() {
        let mut out = Vec::new();
        print_help(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        for verb in ["-s|--change", "--show-fec", "-n|-u|--show-nfc|--show-ntuple", "--monitor"] {
            assert!(out.contains(verb), "{verb}");
        }
    }
}
