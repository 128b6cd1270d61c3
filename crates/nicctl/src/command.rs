//! The static command table.
//!
//! One [`CommandDesc`] per verb, listing the operation codes the command
//! may issue on each transport. The table is only read; dispatch goes
//! through [`CommandKind`].

use crate::ioctl::{LegacyOp, op};
use crate::netlink::EthtoolCmd;
use crate::params::ParseError;
use crate::util::ifname;

/// Dispatch tag for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    ShowSettings,
    ChangeSettings,
    DriverInfo,
    PermAddr,
    ShowPause,
    SetPause,
    ShowRing,
    SetRing,
    ShowChannels,
    SetChannels,
    ShowCoalesce,
    SetCoalesce,
    ShowFeatures,
    SetFeatures,
    NwayReset,
    Identify,
    RegDump,
    EepromDump,
    EepromChange,
    Flash,
    SelfTest,
    Stats,
    ShowNfc,
    ConfigNfc,
    ShowFec,
    SetFec,
    Monitor,
    Help,
}

/// Whether a command changes device state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Whether the verb is followed by a device name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceArg {
    Required,
    Optional,
    None,
}

/// Operation codes a command may issue on one transport.
#[derive(Debug, Clone, Copy)]
pub struct Ops<T: 'static> {
    pub reads: &'static [T],
    pub writes: &'static [T],
}

impl<T: 'static> Ops<T> {
    const NONE: Self = Self {
        reads: &[],
        writes: &[],
    };

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty() && self.writes.is_empty()
    }

    pub fn all(&self) -> impl Iterator<Item = &T> {
        self.reads.iter().chain(self.writes)
    }
}

/// One entry of [`COMMANDS`].
#[derive(Debug)]
pub struct CommandDesc {
    pub short: &'static [&'static str],
    pub long: &'static [&'static str],
    pub kind: CommandKind,
    pub netlink: Ops<EthtoolCmd>,
    pub legacy: Ops<LegacyOp>,
    pub access: Access,
    /// Accepted number of tokens after the device, inclusive.
    pub min_args: usize,
    pub max_args: Option<usize>,
    pub device: DeviceArg,
    /// Fails instead of falling back when netlink is unavailable.
    pub netlink_only: bool,
    pub help: &'static str,
}

impl CommandDesc {
    /// First long form, used in messages.
    pub fn name(&self) -> &'static str {
        self.long
            .first()
            .or_else(|| self.short.first())
            .copied()
            .unwrap_or("(show)")
    }

    fn matches(&self, verb: &str) -> bool {
        self.short.contains(&verb) || self.long.contains(&verb)
    }
}

macro_rules! nl {
    ([$($r:ident),*], [$($w:ident),*]) => {
        Ops {
            reads: &[$(EthtoolCmd::$r),*],
            writes: &[$(EthtoolCmd::$w),*],
        }
    };
}

macro_rules! legacy {
    ([$($r:ident),*], [$($w:ident),*]) => {
        Ops {
            reads: &[$(op::$r),*],
            writes: &[$(op::$w),*],
        }
    };
}

/// Every command, in help order.
pub static COMMANDS: &[CommandDesc] = &[
    CommandDesc {
        short: &[],
        long: &[],
        kind: CommandKind::ShowSettings,
        netlink: nl!([LinkmodesGet, LinkinfoGet, WolGet, DebugGet, LinkstateGet], []),
        legacy: legacy!([GSET, GWOL, GMSGLVL, GLINK], []),
        access: Access::Read,
        min_args: 0,
        max_args: Some(0),
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Display standard information about device",
    },
    CommandDesc {
        short: &["-s"],
        long: &["--change"],
        kind: CommandKind::ChangeSettings,
        netlink: nl!([], [LinkmodesSet, LinkinfoSet, WolSet, DebugSet]),
        legacy: legacy!([GSET, GWOL, GMSGLVL], [SSET, SWOL, SMSGLVL]),
        access: Access::Write,
        min_args: 1,
        max_args: None,
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Change generic options",
    },
    CommandDesc {
        short: &["-i"],
        long: &["--driver"],
        kind: CommandKind::DriverInfo,
        netlink: Ops::NONE,
        legacy: legacy!([GDRVINFO], []),
        access: Access::Read,
        min_args: 0,
        max_args: Some(0),
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Show driver information",
    },
    CommandDesc {
        short: &["-P"],
        long: &["--show-permaddr"],
        kind: CommandKind::PermAddr,
        netlink: Ops::NONE,
        legacy: legacy!([GPERMADDR], []),
        access: Access::Read,
        min_args: 0,
        max_args: Some(0),
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Show permanent hardware address",
    },
    CommandDesc {
        short: &["-a"],
        long: &["--show-pause"],
        kind: CommandKind::ShowPause,
        netlink: nl!([PauseGet], []),
        legacy: legacy!([GPAUSEPARAM], []),
        access: Access::Read,
        min_args: 0,
        max_args: Some(0),
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Show pause options",
    },
    CommandDesc {
        short: &["-A"],
        long: &["--pause"],
        kind: CommandKind::SetPause,
        netlink: nl!([], [PauseSet]),
        legacy: legacy!([GPAUSEPARAM], [SPAUSEPARAM]),
        access: Access::Write,
        min_args: 2,
        max_args: None,
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Set pause options",
    },
    CommandDesc {
        short: &["-g"],
        long: &["--show-ring"],
        kind: CommandKind::ShowRing,
        netlink: nl!([RingsGet], []),
        legacy: legacy!([GRINGPARAM], []),
        access: Access::Read,
        min_args: 0,
        max_args: Some(0),
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Query RX/TX ring parameters",
    },
    CommandDesc {
        short: &["-G"],
        long: &["--set-ring"],
        kind: CommandKind::SetRing,
        netlink: nl!([], [RingsSet]),
        legacy: legacy!([GRINGPARAM], [SRINGPARAM]),
        access: Access::Write,
        min_args: 2,
        max_args: None,
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Set RX/TX ring parameters",
    },
    CommandDesc {
        short: &["-l"],
        long: &["--show-channels"],
        kind: CommandKind::ShowChannels,
        netlink: nl!([ChannelsGet], []),
        legacy: legacy!([GCHANNELS], []),
        access: Access::Read,
        min_args: 0,
        max_args: Some(0),
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Query Channels",
    },
    CommandDesc {
        short: &["-L"],
        long: &["--set-channels"],
        kind: CommandKind::SetChannels,
        netlink: nl!([], [ChannelsSet]),
        legacy: legacy!([GCHANNELS], [SCHANNELS]),
        access: Access::Write,
        min_args: 2,
        max_args: None,
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Set Channels",
    },
    CommandDesc {
        short: &["-c"],
        long: &["--show-coalesce"],
        kind: CommandKind::ShowCoalesce,
        netlink: nl!([CoalesceGet], []),
        legacy: legacy!([GCOALESCE], []),
        access: Access::Read,
        min_args: 0,
        max_args: Some(0),
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Show coalesce options",
    },
    CommandDesc {
        short: &["-C"],
        long: &["--coalesce"],
        kind: CommandKind::SetCoalesce,
        netlink: nl!([], [CoalesceSet]),
        legacy: legacy!([GCOALESCE], [SCOALESCE]),
        access: Access::Write,
        min_args: 2,
        max_args: None,
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Set coalesce options",
    },
    CommandDesc {
        short: &["-k"],
        long: &["--show-features", "--show-offload"],
        kind: CommandKind::ShowFeatures,
        netlink: nl!([FeaturesGet, StrsetGet], []),
        legacy: legacy!([GRXCSUM, GTXCSUM, GSG, GTSO, GUFO, GGSO, GGRO, GFLAGS], []),
        access: Access::Read,
        min_args: 0,
        max_args: Some(0),
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Get state of protocol offload and other features",
    },
    CommandDesc {
        short: &["-K"],
        long: &["--features", "--offload"],
        kind: CommandKind::SetFeatures,
        netlink: nl!([StrsetGet], [FeaturesSet]),
        legacy: legacy!(
            [GFLAGS],
            [SRXCSUM, STXCSUM, SSG, STSO, SUFO, SGSO, SGRO, SFLAGS]
        ),
        access: Access::Write,
        min_args: 2,
        max_args: None,
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Set protocol offload and other features",
    },
    CommandDesc {
        short: &["-r"],
        long: &["--negotiate"],
        kind: CommandKind::NwayReset,
        netlink: Ops::NONE,
        legacy: legacy!([], [NWAY_RST]),
        access: Access::Write,
        min_args: 0,
        max_args: Some(0),
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Restart N-WAY negotiation",
    },
    CommandDesc {
        short: &["-p"],
        long: &["--identify"],
        kind: CommandKind::Identify,
        netlink: Ops::NONE,
        legacy: legacy!([], [PHYS_ID]),
        access: Access::Write,
        min_args: 0,
        max_args: Some(1),
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Show visible port identification (e.g. blinking)",
    },
    CommandDesc {
        short: &["-d"],
        long: &["--register-dump"],
        kind: CommandKind::RegDump,
        netlink: Ops::NONE,
        legacy: legacy!([GDRVINFO, GREGS], []),
        access: Access::Read,
        min_args: 0,
        max_args: Some(4),
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Do a register dump",
    },
    CommandDesc {
        short: &["-e"],
        long: &["--eeprom-dump"],
        kind: CommandKind::EepromDump,
        netlink: Ops::NONE,
        legacy: legacy!([GDRVINFO, GEEPROM], []),
        access: Access::Read,
        min_args: 0,
        max_args: Some(6),
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Do a EEPROM dump",
    },
    CommandDesc {
        short: &["-E"],
        long: &["--change-eeprom"],
        kind: CommandKind::EepromChange,
        netlink: Ops::NONE,
        legacy: legacy!([], [SEEPROM]),
        access: Access::Write,
        min_args: 6,
        max_args: Some(6),
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Change bytes in device EEPROM",
    },
    CommandDesc {
        short: &["-f"],
        long: &["--flash"],
        kind: CommandKind::Flash,
        netlink: Ops::NONE,
        legacy: legacy!([], [FLASHDEV]),
        access: Access::Write,
        min_args: 1,
        max_args: Some(2),
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Flash firmware image from the specified file to a region on the device",
    },
    CommandDesc {
        short: &["-t"],
        long: &["--test"],
        kind: CommandKind::SelfTest,
        netlink: Ops::NONE,
        legacy: legacy!([GDRVINFO, GSSET_INFO, GSTRINGS], [TEST]),
        access: Access::Write,
        min_args: 0,
        max_args: Some(1),
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Execute adapter self test",
    },
    CommandDesc {
        short: &["-S"],
        long: &["--statistics"],
        kind: CommandKind::Stats,
        netlink: Ops::NONE,
        legacy: legacy!([GDRVINFO, GSSET_INFO, GSTRINGS, GSTATS], []),
        access: Access::Read,
        min_args: 0,
        max_args: Some(0),
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Show adapter statistics",
    },
    CommandDesc {
        short: &["-n", "-u"],
        long: &["--show-nfc", "--show-ntuple"],
        kind: CommandKind::ShowNfc,
        netlink: Ops::NONE,
        legacy: legacy!([GRXFH, GRXRINGS, GRXCLSRLCNT, GRXCLSRLALL, GRXCLSRULE], []),
        access: Access::Read,
        min_args: 0,
        max_args: Some(2),
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Show Rx network flow classification options or rules",
    },
    CommandDesc {
        short: &["-N", "-U"],
        long: &["--config-nfc", "--config-ntuple"],
        kind: CommandKind::ConfigNfc,
        netlink: Ops::NONE,
        legacy: legacy!([], [SRXFH, SRXCLSRLINS, SRXCLSRLDEL]),
        access: Access::Write,
        min_args: 2,
        max_args: None,
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Configure Rx network flow classification options or rules",
    },
    CommandDesc {
        short: &[],
        long: &["--show-fec"],
        kind: CommandKind::ShowFec,
        netlink: nl!([FecGet], []),
        legacy: legacy!([GFECPARAM], []),
        access: Access::Read,
        min_args: 0,
        max_args: Some(0),
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Show FEC settings",
    },
    CommandDesc {
        short: &[],
        long: &["--set-fec"],
        kind: CommandKind::SetFec,
        netlink: nl!([], [FecSet]),
        legacy: legacy!([], [SFECPARAM]),
        access: Access::Write,
        min_args: 2,
        max_args: None,
        device: DeviceArg::Required,
        netlink_only: false,
        help: "Set FEC settings",
    },
    CommandDesc {
        short: &[],
        long: &["--monitor"],
        kind: CommandKind::Monitor,
        netlink: Ops::NONE,
        legacy: Ops::NONE,
        access: Access::Read,
        min_args: 0,
        max_args: Some(0),
        device: DeviceArg::Optional,
        netlink_only: true,
        help: "Show kernel notifications",
    },
    CommandDesc {
        short: &["-h"],
        long: &["--help"],
        kind: CommandKind::Help,
        netlink: Ops::NONE,
        legacy: Ops::NONE,
        access: Access::Read,
        min_args: 0,
        max_args: Some(0),
        device: DeviceArg::None,
        netlink_only: false,
        help: "Show this help",
    },
];

/// Find the command for a verb. Exact match on short and long forms.
pub fn lookup(verb: &str) -> Option<&'static CommandDesc> {
    COMMANDS.iter().find(|desc| desc.matches(verb))
}

/// The command run when the first token is a device name.
pub fn show_settings() -> &'static CommandDesc {
    &COMMANDS[0]
}

/// Check the number of tokens after the device.
pub fn validate_args(desc: &CommandDesc, n: usize) -> Result<(), ParseError> {
    let within = n >= desc.min_args && desc.max_args.is_none_or(|max| n <= max);
    if within {
        return Ok(());
    }
    let expected = match desc.max_args {
        Some(max) if max == desc.min_args => format!("{max}"),
        Some(max) => format!("{} to {max}", desc.min_args),
        None => format!("at least {}", desc.min_args),
    };
    Err(ParseError::Usage(format!(
        "{} takes {expected} arguments after the device, got {n}",
        desc.name()
    )))
}

/// A parsed command line.
#[derive(Debug)]
pub struct Invocation {
    pub desc: &'static CommandDesc,
    pub device: Option<String>,
    /// Tokens after the device.
    pub args: Vec<String>,
}

/// Split `VERB DEVICE ARGS...` (or `DEVICE`) into an [`Invocation`].
pub fn parse_invocation(tokens: &[String]) -> Result<Invocation, ParseError> {
    let Some(first) = tokens.first() else {
        return Err(ParseError::Usage("no device given".into()));
    };

    let (desc, rest) = match lookup(first) {
        Some(desc) => (desc, &tokens[1..]),
        None if first.starts_with('-') => return Err(ParseError::UnknownOption(first.clone())),
        None => (show_settings(), tokens),
    };

    let (device, args) = match desc.device {
        DeviceArg::None => (None, rest),
        DeviceArg::Required => match rest.split_first() {
            Some((dev, args)) => (Some(device_name(desc, dev)?), args),
            None => {
                return Err(ParseError::Usage(format!("{} requires a device", desc.name())));
            }
        },
        DeviceArg::Optional => match rest.split_first() {
            Some((dev, args)) => (Some(device_name(desc, dev)?), args),
            None => (None, rest),
        },
    };

    validate_args(desc, args.len())?;
    Ok(Invocation {
        desc,
        device,
        args: args.to_vec(),
    })
}

fn device_name(desc: &CommandDesc, token: &str) -> Result<String, ParseError> {
    if lookup(token).is_some() || token.starts_with('-') {
        return Err(ParseError::Usage(format!(
            "{} expects a device name, got \"{token}\"",
            desc.name()
        )));
    }
    ifname::validate(token).map_err(|e| ParseError::invalid("device", token, e.to_string()))?;
    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn read_and_write_codes_are_separated() {
        for desc in COMMANDS {
            for cmd in desc.netlink.reads {
                assert!(cmd.is_get(), "{}: {cmd:?} listed as read", desc.name());
            }
            for cmd in desc.netlink.writes {
                assert!(!cmd.is_get(), "{}: {cmd:?} listed as write", desc.name());
            }
            for op in desc.legacy.reads {
                assert!(!op.write, "{}: {} listed as read", desc.name(), op.name);
            }
            for op in desc.legacy.writes {
                assert!(op.write, "{}: {} listed as write", desc.name(), op.name);
            }
        }
    }

    #[test]
    fn read_only_commands_never_write() {
        for desc in COMMANDS.iter().filter(|d| d.access == Access::Read) {
            assert!(desc.netlink.writes.is_empty(), "{}", desc.name());
            assert!(desc.legacy.writes.is_empty(), "{}", desc.name());
        }
        for desc in COMMANDS.iter().filter(|d| d.access == Access::Write) {
            assert!(
                !desc.netlink.writes.is_empty() || !desc.legacy.writes.is_empty(),
                "{}",
                desc.name()
            );
        }
    }

    #[test]
    fn verbs_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for desc in COMMANDS {
            for verb in desc.short.iter().chain(desc.long) {
                assert!(seen.insert(*verb), "duplicate verb {verb}");
            }
        }
    }

    #[test]
    fn lookup_matches_both_forms() {
        assert_eq!(lookup("-g").map(|d| d.kind), Some(CommandKind::ShowRing));
        assert_eq!(lookup("--show-ring").map(|d| d.kind), Some(CommandKind::ShowRing));
        assert_eq!(lookup("-u").map(|d| d.kind), Some(CommandKind::ShowNfc));
        assert_eq!(lookup("--offload").map(|d| d.kind), Some(CommandKind::SetFeatures));
        assert!(lookup("--show").is_none());
        assert!(lookup("eth0").is_none());
    }

    #[test]
    fn bare_device_shows_settings() {
        let inv = parse_invocation(&args(&["eth0"])).unwrap();
        assert_eq!(inv.desc.kind, CommandKind::ShowSettings);
        assert_eq!(inv.device.as_deref(), Some("eth0"));
        assert!(inv.args.is_empty());
    }

    #[test]
    fn verb_device_and_options() {
        let inv = parse_invocation(&args(&["-s", "eth0", "speed", "100", "duplex", "full"])).unwrap();
        assert_eq!(inv.desc.kind, CommandKind::ChangeSettings);
        assert_eq!(inv.device.as_deref(), Some("eth0"));
        assert_eq!(inv.args, args(&["speed", "100", "duplex", "full"]));
    }

    #[test]
    fn usage_errors() {
        assert!(parse_invocation(&[]).is_err());
        assert!(matches!(
            parse_invocation(&args(&["--bogus", "eth0"])),
            Err(ParseError::UnknownOption(_))
        ));
        assert!(matches!(parse_invocation(&args(&["-g"])), Err(ParseError::Usage(_))));
        assert!(matches!(
            parse_invocation(&args(&["-g", "-k"])),
            Err(ParseError::Usage(_))
        ));
        assert!(matches!(
            parse_invocation(&args(&["-i", "eth0", "extra"])),
            Err(ParseError::Usage(_))
        ));
        assert!(matches!(
            parse_invocation(&args(&["eth0", "extra"])),
            Err(ParseError::Usage(_))
        ));
        assert!(parse_invocation(&args(&["-i", "a-very-long-device-name"])).is_err());
    }

    #[test]
    fn arg_counts() {
        let set_ring = lookup("-G").unwrap();
        assert!(validate_args(set_ring, 0).is_err());
        assert!(validate_args(set_ring, 2).is_ok());
        let identify = lookup("-p").unwrap();
        assert!(validate_args(identify, 1).is_ok());
        assert!(validate_args(identify, 2).is_err());
    }

    #[test]
    fn help_and_monitor_devices() {
        let help = parse_invocation(&args(&["-h"])).unwrap();
        assert_eq!(help.desc.kind, CommandKind::Help);
        assert!(help.device.is_none());

        let mon = parse_invocation(&args(&["--monitor"])).unwrap();
        assert_eq!(mon.desc.kind, CommandKind::Monitor);
        assert!(mon.device.is_none());
        assert!(mon.desc.netlink_only);

        let mon = parse_invocation(&args(&["--monitor", "eth1"])).unwrap();
        assert_eq!(mon.device.as_deref(), Some("eth1"));
    }
}
