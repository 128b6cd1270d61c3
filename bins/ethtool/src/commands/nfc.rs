//! Receive flow hashing and n-tuple classification rules.

use nicctl::params::records::{NfcQuery, NfcRequest};

use super::Ctx;
use crate::exit::{self, Failure, fail};

pub fn show(ctx: &Ctx<'_>, query: NfcQuery) -> Result<(), Failure> {
    let sock = ctx.legacy()?;
    match query {
        NfcQuery::FlowHash(flow) => {
            let hash = sock
                .get_rx_flow_hash(flow)
                .map_err(fail(exit::NFC_GET, "Cannot get RX network flow hashing options"))?;
            ctx.emit(exit::NFC_GET, &hash)
        }
        NfcQuery::Rules => {
            let rules = sock
                .get_rules()
                .map_err(fail(exit::NFC_GET, "Cannot get RX classification rules"))?;
            ctx.emit(exit::NFC_GET, &rules)
        }
        NfcQuery::Rule(loc) => {
            let rule = sock
                .get_rule(loc)
                .map_err(fail(exit::NFC_GET, "Cannot get RX classification rule"))?;
            ctx.emit(exit::NFC_GET, &rule)
        }
    }
}

pub fn config(ctx: &Ctx<'_>, req: &NfcRequest) -> Result<(), Failure> {
    let sock = ctx.legacy()?;
    match req {
        NfcRequest::FlowHash { flow, fields } => sock
            .set_rx_flow_hash(*flow, *fields)
            .map_err(fail(exit::NFC_SET, "Cannot change RX network flow hashing options")),
        NfcRequest::Insert(rule) => {
            let loc = sock
                .insert_rule(&rule.to_rule())
                .map_err(fail(exit::NFC_SET, "Cannot insert classification rule"))?;
            println!("Added rule with ID {loc}");
            Ok(())
        }
        NfcRequest::Delete(loc) => sock
            .delete_rule(*loc)
            .map_err(fail(exit::NFC_SET, "Cannot delete classification rule")),
    }
}
