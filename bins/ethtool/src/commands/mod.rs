//! Command implementations.
//!
//! An invocation is first turned into a [`Plan`], which parses every
//! option into its request record. Only then is the device opened and
//! the plan run, so a malformed command line never touches the device.

mod dump;
mod monitor;
mod nfc;
mod params;
mod settings;

use std::io::{self, Write};

use nicctl::command::{CommandDesc, CommandKind, Invocation};
use nicctl::negotiate::{DeviceHandle, Route};
use nicctl::params::records::{
    ChannelRequest, CoalesceRequest, EepromChangeRequest, EepromDumpRequest, FeatureRequest,
    FecRequest, FlashRequest, LinkRequest, NfcQuery, NfcRequest, PauseRequest, RegDumpRequest,
    RingRequest, parse_identify, parse_test_mode,
};
use nicctl::params::{OptSpec, ParseError, parse_options};

use crate::exit::{self, Failure};
use crate::output::{OutputFormat, Printable};

/// A fully parsed command, ready to run.
#[derive(Debug)]
pub enum Plan {
    ShowSettings,
    ChangeSettings(LinkRequest),
    DriverInfo,
    PermAddr,
    ShowPause,
    SetPause(PauseRequest),
    ShowRing,
    SetRing(RingRequest),
    ShowChannels,
    SetChannels(ChannelRequest),
    ShowCoalesce,
    SetCoalesce(CoalesceRequest),
    ShowFeatures,
    SetFeatures(FeatureRequest),
    NwayReset,
    Identify(u32),
    RegDump(RegDumpRequest),
    EepromDump(EepromDumpRequest),
    EepromChange(EepromChangeRequest),
    Flash(FlashRequest),
    SelfTest(u32),
    Stats,
    ShowNfc(NfcQuery),
    ConfigNfc(NfcRequest),
    ShowFec,
    SetFec(FecRequest),
    Monitor,
    Help,
}

fn record<R: Default>(args: &[String], table: Vec<OptSpec<R>>) -> Result<R, ParseError> {
    let mut rec = R::default();
    parse_options(args, &table, &mut rec)?;
    Ok(rec)
}

impl Plan {
    pub fn parse(inv: &Invocation) -> Result<Self, ParseError> {
        let args = inv.args.as_slice();
        Ok(match inv.desc.kind {
            CommandKind::ShowSettings => Plan::ShowSettings,
            CommandKind::ChangeSettings => {
                Plan::ChangeSettings(record(args, LinkRequest::options())?)
            }
            CommandKind::DriverInfo => Plan::DriverInfo,
            CommandKind::PermAddr => Plan::PermAddr,
            CommandKind::ShowPause => Plan::ShowPause,
            CommandKind::SetPause => Plan::SetPause(record(args, PauseRequest::options())?),
            CommandKind::ShowRing => Plan::ShowRing,
            CommandKind::SetRing => Plan::SetRing(record(args, RingRequest::options())?),
            CommandKind::ShowChannels => Plan::ShowChannels,
            CommandKind::SetChannels => {
                Plan::SetChannels(record(args, ChannelRequest::options())?)
            }
            CommandKind::ShowCoalesce => Plan::ShowCoalesce,
            CommandKind::SetCoalesce => {
                Plan::SetCoalesce(record(args, CoalesceRequest::options())?)
            }
            CommandKind::ShowFeatures => Plan::ShowFeatures,
            CommandKind::SetFeatures => Plan::SetFeatures(FeatureRequest::parse(args)?),
            CommandKind::NwayReset => Plan::NwayReset,
            CommandKind::Identify => Plan::Identify(parse_identify(args)?),
            CommandKind::RegDump => Plan::RegDump(record(args, RegDumpRequest::options())?),
            CommandKind::EepromDump => {
                Plan::EepromDump(record(args, EepromDumpRequest::options())?)
            }
            CommandKind::EepromChange => {
                let req: EepromChangeRequest = record(args, EepromChangeRequest::options())?;
                req.validate()?;
                Plan::EepromChange(req)
            }
            CommandKind::Flash => Plan::Flash(FlashRequest::parse(args)?),
            CommandKind::SelfTest => Plan::SelfTest(parse_test_mode(args)?),
            CommandKind::Stats => Plan::Stats,
            CommandKind::ShowNfc => Plan::ShowNfc(NfcQuery::parse(args)?),
            CommandKind::ConfigNfc => Plan::ConfigNfc(NfcRequest::parse(args)?),
            CommandKind::ShowFec => Plan::ShowFec,
            CommandKind::SetFec => Plan::SetFec(record(args, FecRequest::options())?),
            CommandKind::Monitor => Plan::Monitor,
            CommandKind::Help => Plan::Help,
        })
    }
}

/// What every handler gets.
pub struct Ctx<'a> {
    pub handle: &'a DeviceHandle,
    pub desc: &'static CommandDesc,
    pub dev: &'a str,
    pub format: OutputFormat,
}

impl Ctx<'_> {
    /// The transport for this command.
    pub fn route(&self) -> Result<Route<'_>, Failure> {
        self.handle
            .route(self.desc)
            .map_err(|e| Failure::from_error(exit::SOCKET, "Cannot get control socket", &e))
    }

    pub fn legacy(&self) -> Result<&nicctl::ioctl::IoctlSocket, Failure> {
        self.handle
            .legacy()
            .map_err(|e| Failure::from_error(exit::SOCKET, "Cannot get control socket", &e))
    }

    /// Print `value`; a write error fails with `code`.
    pub fn emit<P: Printable>(&self, code: i32, value: &P) -> Result<(), Failure> {
        let mut out = io::stdout().lock();
        value
            .print(&mut out, self.format, self.dev)
            .and_then(|()| out.flush())
            .map_err(|e| Failure::new(code, format!("Cannot write output: {e}")))
    }
}

/// Run `plan` against the open handle.
pub async fn run(
    plan: Plan,
    handle: &mut DeviceHandle,
    desc: &'static CommandDesc,
    format: OutputFormat,
) -> Result<(), Failure> {
    if let Plan::Monitor = plan {
        return monitor::run(handle, desc, format).await;
    }

    let dev = handle.ifname().unwrap_or_default().to_string();
    let ctx = Ctx {
        handle,
        desc,
        dev: &dev,
        format,
    };

    match plan {
        Plan::ShowSettings => settings::show(&ctx).await,
        Plan::ChangeSettings(req) => settings::change(&ctx, &req).await,
        Plan::DriverInfo => settings::driver_info(&ctx),
        Plan::PermAddr => settings::perm_addr(&ctx),
        Plan::NwayReset => settings::nway_reset(&ctx),
        Plan::Identify(secs) => settings::identify(&ctx, secs),
        Plan::ShowPause => params::show_pause(&ctx).await,
        Plan::SetPause(req) => params::set_pause(&ctx, &req).await,
        Plan::ShowRing => params::show_rings(&ctx).await,
        Plan::SetRing(req) => params::set_rings(&ctx, &req).await,
        Plan::ShowChannels => params::show_channels(&ctx).await,
        Plan::SetChannels(req) => params::set_channels(&ctx, &req).await,
        Plan::ShowCoalesce => params::show_coalesce(&ctx).await,
        Plan::SetCoalesce(req) => params::set_coalesce(&ctx, &req).await,
        Plan::ShowFeatures => params::show_features(&ctx).await,
        Plan::SetFeatures(req) => params::set_features(&ctx, &req).await,
        Plan::ShowFec => params::show_fec(&ctx).await,
        Plan::SetFec(req) => params::set_fec(&ctx, &req).await,
        Plan::RegDump(req) => dump::regs(&ctx, &req),
        Plan::EepromDump(req) => dump::eeprom(&ctx, &req),
        Plan::EepromChange(req) => dump::change_eeprom(&ctx, &req),
        Plan::Flash(req) => dump::flash(&ctx, &req),
        Plan::SelfTest(flags) => dump::self_test(&ctx, flags),
        Plan::Stats => dump::stats(&ctx),
        Plan::ShowNfc(query) => nfc::show(&ctx, query),
        Plan::ConfigNfc(req) => nfc::config(&ctx, &req),
        Plan::Monitor | Plan::Help => Ok(()),
    }
}

/// Write `data` verbatim to stdout.
fn write_raw(data: &[u8], code: i32) -> Result<(), Failure> {
    let mut out = io::stdout().lock();
    out.write_all(data)
        .and_then(|()| out.flush())
        .map_err(|e| Failure::new(code, format!("Cannot write output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nicctl::command::parse_invocation;
    use nicctl::params::Wanted;
    use nicctl::types::Duplex;

    fn plan(tokens: &[&str]) -> Result<Plan, ParseError> {
        let tokens: Vec<String> = tokens.iter().map(|s| s.to_string()).collect();
        Plan::parse(&parse_invocation(&tokens)?)
    }

    #[test]
    fn change_speed_and_duplex() {
        let Ok(Plan::ChangeSettings(req)) = plan(&["-s", "eth0", "speed", "100", "duplex", "full"])
        else {
            panic!("expected change settings");
        };
        assert_eq!(req.speed, Wanted::Value(100));
        assert_eq!(req.duplex, Wanted::Value(Duplex::Full));
        assert_eq!(req.autoneg, Wanted::Unset);
        assert!(req.link_changed());
        assert!(!req.wol_changed());
        assert!(!req.msglvl_changed());
    }

    #[test]
    fn bad_values_are_usage_errors() {
        assert!(plan(&["-s", "eth0", "speed", "100", "duplex", "bogus"]).is_err());
        assert!(plan(&["-A", "eth0", "rx", "maybe"]).is_err());
        assert!(plan(&["-G", "eth0", "rx", "-1"]).is_err());
        assert!(plan(&["-E", "eth0", "magic", "1", "offset", "2", "speed", "3"]).is_err());
    }

    #[test]
    fn shows_take_no_options() {
        assert!(matches!(plan(&["-g", "eth0"]), Ok(Plan::ShowRing)));
        assert!(matches!(plan(&["eth0"]), Ok(Plan::ShowSettings)));
        assert!(matches!(plan(&["--show-fec", "eth0"]), Ok(Plan::ShowFec)));
    }

    #[test]
    fn fec_encodings() {
        let Ok(Plan::SetFec(req)) = plan(&["--set-fec", "eth0", "encoding", "auto", "rs"]) else {
            panic!("expected set fec");
        };
        assert!(req.auto);
        assert_eq!(req.kernel_names(), ["RS"]);
    }

    #[test]
    fn optional_arguments() {
        assert!(matches!(plan(&["-p", "eth0"]), Ok(Plan::Identify(0))));
        assert!(matches!(plan(&["-p", "eth0", "5"]), Ok(Plan::Identify(5))));
        assert!(matches!(plan(&["-t", "eth0"]), Ok(Plan::SelfTest(_))));
        assert!(matches!(plan(&["-n", "eth0"]), Ok(Plan::ShowNfc(NfcQuery::Rules))));
    }
}
