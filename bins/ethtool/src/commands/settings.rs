//! Link settings, driver information and device actions.

use nicctl::params::records::LinkRequest;

use super::Ctx;
use crate::exit::{self, Failure, fail};
use crate::output::{DeviceSettings, PermAddr};

/// The consolidated show. Each part is optional; the command fails only
/// when none of them could be read.
pub async fn show(ctx: &Ctx<'_>) -> Result<(), Failure> {
    let route = ctx.route()?;
    let mut settings = DeviceSettings::default();

    let report = |what: &str, e: &nicctl::Error| {
        eprintln!("{}", Failure::from_error(exit::GET, what, e).message);
    };

    match route.get_link_settings().await {
        Ok(link) => settings.link = Some(link),
        Err(e) => report("Cannot get device settings", &e),
    }
    match route.get_wol().await {
        Ok(wol) => settings.wol = Some(wol),
        Err(e) if e.is_not_supported() => tracing::debug!("wake-on-lan not supported"),
        Err(e) => report("Cannot get wake-on-lan settings", &e),
    }
    match route.get_msglvl().await {
        Ok(lvl) => settings.msglvl = Some(lvl),
        Err(e) if e.is_not_supported() => tracing::debug!("message level not supported"),
        Err(e) => report("Cannot get message level", &e),
    }
    match route.get_link_state().await {
        Ok(state) => settings.state = Some(state),
        Err(e) => report("Cannot get link status", &e),
    }

    if settings.is_empty() {
        return Err(Failure::new(exit::NO_DATA, "No data available"));
    }
    ctx.emit(exit::GET, &settings)
}

/// `-s`. Link settings, WoL and message level are changed one after the
/// other; a failing group does not stop the others. The first failure
/// decides the exit status.
pub async fn change(ctx: &Ctx<'_>, req: &LinkRequest) -> Result<(), Failure> {
    let mut failures = Vec::new();

    if req.link_changed() {
        let route = if req.needs_legacy() {
            ctx.handle.legacy_route()
        } else {
            ctx.handle.route(ctx.desc)
        };
        let result = match route {
            Ok(route) => route
                .set_link(req)
                .await
                .map_err(|e| Failure::from_change(exit::GET, exit::SET, "settings", &e)),
            Err(e) => Err(Failure::from_error(exit::SOCKET, "Cannot get control socket", &e)),
        };
        failures.extend(result.err());
    }

    if req.wol_changed() {
        let result = match ctx.route() {
            Ok(route) => route.set_wol(req).await.map_err(|e| {
                Failure::from_change(exit::WOL_GET, exit::WOL_SET, "wake-on-lan settings", &e)
            }),
            Err(f) => Err(f),
        };
        failures.extend(result.err());
    }

    if req.msglvl_changed() {
        let result = match ctx.route() {
            Ok(route) => route.set_msglvl(req).await.map_err(|e| {
                Failure::from_change(exit::MSGLVL_GET, exit::MSGLVL_SET, "message level", &e)
            }),
            Err(f) => Err(f),
        };
        failures.extend(result.err());
    }

    report_all(failures)
}

/// Print every failure; the first one decides the exit status.
fn report_all(failures: Vec<Failure>) -> Result<(), Failure> {
    let Some(code) = failures.first().map(|f| f.code) else {
        return Ok(());
    };
    for f in &failures {
        eprintln!("{}", f.message);
    }
    Err(Failure::new(code, ""))
}

pub fn driver_info(ctx: &Ctx<'_>) -> Result<(), Failure> {
    let info = ctx
        .legacy()?
        .get_driver_info()
        .map_err(fail(exit::GET, "Cannot get driver information"))?;
    ctx.emit(exit::GET, &info)
}

pub fn perm_addr(ctx: &Ctx<'_>) -> Result<(), Failure> {
    let addr = ctx
        .legacy()?
        .get_perm_addr()
        .map_err(fail(exit::PERMADDR, "Cannot read permanent address"))?;
    ctx.emit(exit::PERMADDR, &PermAddr::new(&addr))
}

pub fn nway_reset(ctx: &Ctx<'_>) -> Result<(), Failure> {
    ctx.legacy()?
        .nway_reset()
        .map_err(fail(exit::NWAY, "Cannot restart autonegotiation"))
}

pub fn identify(ctx: &Ctx<'_>, seconds: u32) -> Result<(), Failure> {
    ctx.legacy()?
        .identify(seconds)
        .map_err(fail(exit::IDENTIFY, "Cannot identify NIC"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_failure_decides_status() {
        let failures = vec![
            Failure::new(exit::SET, "Cannot update new settings: Invalid argument"),
            Failure::new(exit::SOCKET, "Cannot get control socket: no control socket"),
            Failure::new(exit::MSGLVL_SET, "Cannot update new message level: Invalid argument"),
        ];
        let err = report_all(failures).unwrap_err();
        assert_eq!(err.code, exit::SET);
        assert!(err.message.is_empty());
    }

    #[test]
    fn no_failures_is_success() {
        assert!(report_all(Vec::new()).is_ok());
    }
}
