//! Generic Netlink family resolution.

use std::collections::{BTreeSet, HashMap};

use super::header::{GENL_HDRLEN, GenlMsgHdr};
use super::{CtrlAttr, CtrlAttrMcastGrp, CtrlAttrOp, CtrlCmd, GENL_ID_CTRL};
use crate::error::{Error, Result};
use crate::netlink::attr::{AttrIter, get};
use crate::netlink::builder::MessageBuilder;
use crate::netlink::connection::transact;
use crate::netlink::message::{NLM_F_ACK, NLM_F_REQUEST};
use crate::netlink::socket::NetlinkSocket;

/// Information about a Generic Netlink family.
#[derive(Debug, Clone, Default)]
pub struct FamilyInfo {
    /// Dynamically assigned family ID (used as nlmsg_type).
    pub id: u16,
    /// Family version.
    pub version: u8,
    /// Maximum attribute number.
    pub max_attr: u32,
    /// Multicast groups: name -> group ID.
    pub mcast_groups: HashMap<String, u32>,
    /// Command ids the kernel implements for this family.
    pub ops: BTreeSet<u32>,
}

impl FamilyInfo {
    /// Whether the kernel advertised `cmd` for this family.
    pub fn supports(&self, cmd: u8) -> bool {
        self.ops.contains(&u32::from(cmd))
    }
}

/// Query the control family for `name`.
///
/// Returns [`Error::FamilyNotFound`] when the kernel does not know the
/// family (module not loaded, or a kernel that predates it).
pub async fn resolve_family(socket: &NetlinkSocket, name: &str) -> Result<FamilyInfo> {
    let mut builder = MessageBuilder::new(GENL_ID_CTRL, NLM_F_REQUEST | NLM_F_ACK);
    builder.append_bytes(GenlMsgHdr::new(CtrlCmd::GetFamily as u8, 1).as_bytes());
    builder.append_attr_str(CtrlAttr::FamilyName as u16, name);

    let replies = match transact(socket, builder).await {
        Ok(replies) => replies,
        Err(e) if e.errno() == Some(libc::ENOENT) => {
            return Err(Error::FamilyNotFound {
                name: name.to_string(),
            });
        }
        Err(e) => return Err(e),
    };

    let payload = replies.first().ok_or_else(|| Error::FamilyNotFound {
        name: name.to_string(),
    })?;
    if payload.len() < GENL_HDRLEN {
        return Err(Error::InvalidMessage("GENL header too short".into()));
    }

    let info = parse_family_attrs(&payload[GENL_HDRLEN..])?;
    tracing::debug!(
        family = name,
        id = info.id,
        ops = info.ops.len(),
        "resolved generic netlink family"
    );
    Ok(info)
}

/// Parse family attributes from a CTRL_CMD_GETFAMILY response.
fn parse_family_attrs(data: &[u8]) -> Result<FamilyInfo> {
    let mut id: Option<u16> = None;
    let mut info = FamilyInfo::default();

    for (attr_type, payload) in AttrIter::new(data) {
        match attr_type {
            t if t == CtrlAttr::FamilyId as u16 => {
                id = Some(get::u16_ne(payload)?);
            }
            t if t == CtrlAttr::Version as u16 => {
                info.version = get::u32_ne(payload)? as u8;
            }
            t if t == CtrlAttr::MaxAttr as u16 => {
                info.max_attr = get::u32_ne(payload)?;
            }
            t if t == CtrlAttr::Ops as u16 => {
                info.ops = parse_ops(payload)?;
            }
            t if t == CtrlAttr::McastGroups as u16 => {
                info.mcast_groups = parse_mcast_groups(payload)?;
            }
            _ => {}
        }
    }

    info.id = id.ok_or_else(|| Error::InvalidMessage("missing family ID".into()))?;
    Ok(info)
}

/// Parse the nested array in CTRL_ATTR_OPS.
fn parse_ops(data: &[u8]) -> Result<BTreeSet<u32>> {
    let mut ops = BTreeSet::new();
    for (_idx, op_payload) in AttrIter::new(data) {
        for (attr_type, payload) in AttrIter::new(op_payload) {
            if attr_type == CtrlAttrOp::Id as u16 {
                ops.insert(get::u32_ne(payload)?);
            }
        }
    }
    Ok(ops)
}

/// Parse multicast groups from CTRL_ATTR_MCAST_GROUPS.
fn parse_mcast_groups(data: &[u8]) -> Result<HashMap<String, u32>> {
    let mut groups = HashMap::new();

    for (_group_idx, group_payload) in AttrIter::new(data) {
        let mut name: Option<String> = None;
        let mut grp_id: Option<u32> = None;

        for (attr_type, payload) in AttrIter::new(group_payload) {
            match attr_type {
                t if t == CtrlAttrMcastGrp::Name as u16 => {
                    name = Some(get::string(payload)?.to_string());
                }
                t if t == CtrlAttrMcastGrp::Id as u16 => {
                    grp_id = Some(get::u32_ne(payload)?);
                }
                _ => {}
            }
        }

        if let (Some(name), Some(id)) = (name, grp_id) {
            groups.insert(name, id);
        }
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::builder::MessageBuilder;

    fn family_reply() -> Vec<u8> {
        let mut b = MessageBuilder::new(GENL_ID_CTRL, 0);
        b.append_attr(CtrlAttr::FamilyId as u16, &21u16.to_ne_bytes());
        b.append_attr_str(CtrlAttr::FamilyName as u16, "ethtool");
        b.append_attr_u32(CtrlAttr::Version as u16, 1);

        let ops = b.nest_start(CtrlAttr::Ops as u16);
        for (i, cmd) in [1u32, 2, 29].iter().enumerate() {
            let op = b.nest_start(i as u16 + 1);
            b.append_attr_u32(CtrlAttrOp::Id as u16, *cmd);
            b.append_attr_u32(CtrlAttrOp::Flags as u16, 0x0a);
            b.nest_end(op);
        }
        b.nest_end(ops);

        let groups = b.nest_start(CtrlAttr::McastGroups as u16);
        let grp = b.nest_start(1);
        b.append_attr_str(CtrlAttrMcastGrp::Name as u16, "monitor");
        b.append_attr_u32(CtrlAttrMcastGrp::Id as u16, 7);
        b.nest_end(grp);
        b.nest_end(groups);

        b.payload().to_vec()
    }

    #[test]
    fn test_parse_family_attrs() {
        let info = parse_family_attrs(&family_reply()).unwrap();
        assert_eq!(info.id, 21);
        assert_eq!(info.version, 1);
        assert_eq!(info.mcast_groups.get("monitor"), Some(&7));
        assert!(info.supports(1));
        assert!(info.supports(29));
        assert!(!info.supports(30));
    }

    #[test]
    fn test_parse_family_attrs_requires_id() {
        let mut b = MessageBuilder::new(GENL_ID_CTRL, 0);
        b.append_attr_str(CtrlAttr::FamilyName as u16, "ethtool");
        assert!(parse_family_attrs(b.payload()).is_err());
    }
}
