//! Register and EEPROM access, firmware flashing, self-test and statistics.
//! These exist only on the ioctl transport.

use nicctl::params::Wanted;
use nicctl::params::records::{
    EepromChangeRequest, EepromDumpRequest, FlashRequest, RegDumpRequest,
};

use super::{Ctx, write_raw};
use crate::exit::{self, Failure, fail};

fn is_on(w: &Wanted<bool>) -> bool {
    matches!(w, Wanted::Value(true))
}

pub fn regs(ctx: &Ctx<'_>, req: &RegDumpRequest) -> Result<(), Failure> {
    let dump = ctx
        .legacy()?
        .get_regs()
        .map_err(fail(exit::REGDUMP, "Cannot get register dump"))?;
    if is_on(&req.raw) && !is_on(&req.hex) {
        return write_raw(&dump.data, exit::REGDUMP);
    }
    ctx.emit(exit::REGDUMP, &dump)
}

pub fn eeprom(ctx: &Ctx<'_>, req: &EepromDumpRequest) -> Result<(), Failure> {
    let offset = req.offset.value().copied().unwrap_or(0);
    let length = req.length.value().copied();
    let dump = ctx
        .legacy()?
        .get_eeprom(offset, length)
        .map_err(fail(exit::EEPROM_DUMP, "Cannot get EEPROM data"))?;
    if is_on(&req.raw) {
        return write_raw(&dump.data, exit::EEPROM_DUMP);
    }
    ctx.emit(exit::EEPROM_DUMP, &dump)
}

pub fn change_eeprom(ctx: &Ctx<'_>, req: &EepromChangeRequest) -> Result<(), Failure> {
    let (Some(&magic), Some(&offset), Some(&value)) =
        (req.magic.value(), req.offset.value(), req.value.value())
    else {
        return Err(Failure::new(exit::USAGE, "magic, offset and value are required"));
    };
    ctx.legacy()?
        .set_eeprom_byte(magic, offset, value)
        .map_err(fail(exit::EEPROM_CHANGE, "Cannot set EEPROM data"))
}

pub fn flash(ctx: &Ctx<'_>, req: &FlashRequest) -> Result<(), Failure> {
    tracing::info!(file = %req.file, region = req.region, "flashing firmware");
    ctx.legacy()?
        .flash(req)
        .map_err(fail(exit::FLASH, "Flashing failed"))
}

/// A test run that reports FAIL also exits non-zero, with the results
/// already printed.
pub fn self_test(ctx: &Ctx<'_>, flags: u32) -> Result<(), Failure> {
    let result = ctx
        .legacy()?
        .run_self_test(flags)
        .map_err(fail(exit::TEST, "Cannot test"))?;
    ctx.emit(exit::TEST, &result)?;
    if result.passed {
        Ok(())
    } else {
        Err(Failure::new(exit::TEST, ""))
    }
}

pub fn stats(ctx: &Ctx<'_>) -> Result<(), Failure> {
    let stats = ctx
        .legacy()?
        .get_stats()
        .map_err(fail(exit::STATS, "Cannot get stats information"))?;
    ctx.emit(exit::STATS, &stats)
}
