//! Kernel string sets.
//!
//! A string set maps bit or counter indices to names. Global sets (link
//! modes, message classes, WoL modes, features) are fetched without a
//! device; per-device sets (statistics, private flags) need one.

use super::{
    ETHTOOL_A_STRINGS_STRING, ETHTOOL_A_STRINGSETS_STRINGSET, EthtoolStrsetAttr,
    EthtoolStringAttr, EthtoolStringsetAttr,
};
use crate::error::{Error, Result};
use crate::netlink::attr::{AttrIter, check_attrs, get};

/// Upper bound on entries in one set.
const MAX_STRINGS: u32 = 1 << 16;

/// An ordered list of kernel-provided names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringSet {
    id: u32,
    strings: Vec<String>,
}

impl StringSet {
    /// Create a set from its id and names in index order.
    pub fn new(id: u32, strings: Vec<String>) -> Self {
        Self { id, strings }
    }

    /// The `ETH_SS_*` id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Name at `index`.
    pub fn get(&self, index: u32) -> Option<&str> {
        self.strings.get(index as usize).map(|s| s.as_str())
    }

    /// Index of `name`.
    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.strings.iter().position(|s| s == name).map(|i| i as u32)
    }

    /// All names in index order.
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if the set has no entries.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Parse the attributes of a STRSET_GET reply and return the set `id`.
pub(super) fn parse_strset_reply(data: &[u8], id: u32) -> Result<StringSet> {
    check_attrs(data)?;
    for (kind, sets) in AttrIter::new(data) {
        if kind != EthtoolStrsetAttr::Stringsets as u16 {
            continue;
        }
        check_attrs(sets)?;
        for (kind, set) in AttrIter::new(sets) {
            if kind != ETHTOOL_A_STRINGSETS_STRINGSET {
                continue;
            }
            let parsed = parse_stringset(set)?;
            if parsed.id == id {
                return Ok(parsed);
            }
        }
    }
    Err(Error::InvalidMessage(format!("string set {id} missing from reply")))
}

fn parse_stringset(data: &[u8]) -> Result<StringSet> {
    check_attrs(data)?;

    let mut id = None;
    let mut count = 0u32;
    let mut entries: Vec<(u32, String)> = Vec::new();

    for (kind, payload) in AttrIter::new(data) {
        match kind {
            t if t == EthtoolStringsetAttr::Id as u16 => id = Some(get::u32_ne(payload)?),
            t if t == EthtoolStringsetAttr::Count as u16 => count = get::u32_ne(payload)?,
            t if t == EthtoolStringsetAttr::Strings as u16 => {
                check_attrs(payload)?;
                for (kind, string) in AttrIter::new(payload) {
                    if kind != ETHTOOL_A_STRINGS_STRING {
                        continue;
                    }
                    entries.push(parse_string(string)?);
                }
            }
            _ => {}
        }
    }

    let id = id.ok_or_else(|| Error::InvalidAttribute("string set without id".into()))?;
    let len = entries
        .iter()
        .map(|(idx, _)| idx.saturating_add(1))
        .max()
        .unwrap_or(0)
        .max(count);
    if len > MAX_STRINGS {
        return Err(Error::InvalidAttribute(format!(
            "string set {id} claims {len} entries"
        )));
    }
    let len = len as usize;
    let mut strings = vec![String::new(); len];
    for (idx, value) in entries {
        if let Some(slot) = strings.get_mut(idx as usize) {
            *slot = value;
        }
    }
    Ok(StringSet::new(id, strings))
}

fn parse_string(data: &[u8]) -> Result<(u32, String)> {
    check_attrs(data)?;
    let mut index = None;
    let mut value = String::new();
    for (kind, payload) in AttrIter::new(data) {
        match kind {
            t if t == EthtoolStringAttr::Index as u16 => index = Some(get::u32_ne(payload)?),
            t if t == EthtoolStringAttr::Value as u16 => value = get::string(payload)?.to_string(),
            _ => {}
        }
    }
    let index = index.ok_or_else(|| Error::InvalidAttribute("string without index".into()))?;
    Ok((index, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::builder::MessageBuilder;

    fn reply(id: u32, names: &[(u32, &str)]) -> Vec<u8> {
        let mut b = MessageBuilder::new(0x20, 0);
        let sets = b.nest_start(EthtoolStrsetAttr::Stringsets as u16);
        let set = b.nest_start(ETHTOOL_A_STRINGSETS_STRINGSET);
        b.append_attr_u32(EthtoolStringsetAttr::Id as u16, id);
        b.append_attr_u32(EthtoolStringsetAttr::Count as u16, names.len() as u32);
        let strings = b.nest_start(EthtoolStringsetAttr::Strings as u16);
        for (idx, name) in names {
            let s = b.nest_start(ETHTOOL_A_STRINGS_STRING);
            b.append_attr_u32(EthtoolStringAttr::Index as u16, *idx);
            b.append_attr_str(EthtoolStringAttr::Value as u16, name);
            b.nest_end(s);
        }
        b.nest_end(strings);
        b.nest_end(set);
        b.nest_end(sets);
        b.payload().to_vec()
    }

    #[test]
    fn parses_message_classes() {
        let data = reply(10, &[(0, "drv"), (1, "probe"), (2, "link")]);
        let set = parse_strset_reply(&data, 10).unwrap();
        assert_eq!(set.id(), 10);
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(1), Some("probe"));
        assert_eq!(set.index_of("link"), Some(2));
        assert_eq!(set.get(3), None);
    }

    #[test]
    fn sparse_indices_leave_gaps() {
        let data = reply(1, &[(0, "rx_packets"), (3, "tx_packets")]);
        let set = parse_strset_reply(&data, 1).unwrap();
        assert_eq!(set.len(), 4);
        assert_eq!(set.get(2), Some(""));
        assert_eq!(set.get(3), Some("tx_packets"));
    }

    #[test]
    fn missing_set_is_an_error() {
        let data = reply(10, &[(0, "drv")]);
        assert!(parse_strset_reply(&data, 9).is_err());
    }

    #[test]
    fn huge_index_is_rejected() {
        let data = reply(1, &[(0, "rx_packets"), (u32::MAX, "bogus")]);
        assert!(parse_strset_reply(&data, 1).is_err());
    }
}
