//! Ethtool bitset parsing and building.
//!
//! Ethtool uses a special bitset format for named flag sets (link modes,
//! message classes, WoL modes, features). There are two encodings:
//!
//! 1. **Compact**: `SIZE` plus `VALUE` and `MASK` arrays of 32-bit words
//! 2. **Verbose**: a nested list of (index, name, value) tuples
//!
//! Either can carry `NOMASK`, meaning the value is complete and every bit
//! not listed is zero. Without `NOMASK` only bits in the mask are
//! meaningful, which is how SET requests leave the other bits alone.

use std::collections::{BTreeMap, BTreeSet};

use super::strset::StringSet;
use super::{ETHTOOL_A_BITSET_BITS_BIT, EthtoolBitsetAttr, EthtoolBitsetBitAttr};
use crate::error::{Error, Result};
use crate::netlink::attr::{AttrIter, check_attrs, get};
use crate::netlink::builder::MessageBuilder;

/// Which encoding a parsed bitset arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitsetForm {
    #[default]
    Compact,
    Verbose,
}

/// An ethtool bitset.
///
/// Holds the set bits, the mask bits and whatever names the kernel sent
/// (verbose form) or a string set supplied (compact form).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EthtoolBitset {
    size: u32,
    nomask: bool,
    form: BitsetForm,
    value: BTreeSet<u32>,
    mask: BTreeSet<u32>,
    names: BTreeMap<u32, String>,
}

impl EthtoolBitset {
    /// Create an empty bitset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a bitset nest.
    ///
    /// Handles both compact and verbose formats. Lengths are checked so a
    /// malformed nest is an error rather than a silently shorter set.
    /// Every verbose bit must carry an index; use [`parse_with`](Self::parse_with)
    /// for bits identified by name only.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_inner(data, None)
    }

    /// Parse a bitset nest whose verbose bits may name a bit instead of
    /// indexing it. Names are looked up in `strset`.
    pub fn parse_with(data: &[u8], strset: &StringSet) -> Result<Self> {
        let mut bitset = Self::parse_inner(data, Some(strset))?;
        bitset.resolve_names(strset);
        Ok(bitset)
    }

    fn parse_inner(data: &[u8], strset: Option<&StringSet>) -> Result<Self> {
        check_attrs(data)?;

        let mut bitset = Self::new();
        let mut compact_value: Option<&[u8]> = None;
        let mut compact_mask: Option<&[u8]> = None;

        for (attr_type, payload) in AttrIter::new(data) {
            match attr_type {
                t if t == EthtoolBitsetAttr::Nomask as u16 => {
                    bitset.nomask = true;
                }
                t if t == EthtoolBitsetAttr::Size as u16 => {
                    bitset.size = get::u32_ne(payload)?;
                }
                t if t == EthtoolBitsetAttr::Value as u16 => {
                    compact_value = Some(payload);
                }
                t if t == EthtoolBitsetAttr::Mask as u16 => {
                    compact_mask = Some(payload);
                }
                t if t == EthtoolBitsetAttr::Bits as u16 => {
                    bitset.form = BitsetForm::Verbose;
                    bitset.parse_bits(payload, strset)?;
                }
                _ => {}
            }
        }

        if let Some(value) = compact_value {
            bitset.form = BitsetForm::Compact;
            bitset.value = words_to_bits(value, bitset.size)?;
            bitset.mask = match compact_mask {
                Some(mask) if !bitset.nomask => words_to_bits(mask, bitset.size)?,
                _ => bitset.value.clone(),
            };
        }

        Ok(bitset)
    }

    fn parse_bits(&mut self, data: &[u8], strset: Option<&StringSet>) -> Result<()> {
        check_attrs(data)?;
        for (kind, bit_data) in AttrIter::new(data) {
            if kind != ETHTOOL_A_BITSET_BITS_BIT {
                continue;
            }
            check_attrs(bit_data)?;

            let mut index: Option<u32> = None;
            let mut name: Option<String> = None;
            let mut value = false;

            for (attr_type, payload) in AttrIter::new(bit_data) {
                match attr_type {
                    t if t == EthtoolBitsetBitAttr::Index as u16 => {
                        index = Some(get::u32_ne(payload)?);
                    }
                    t if t == EthtoolBitsetBitAttr::Name as u16 => {
                        name = Some(get::string(payload)?.to_string());
                    }
                    t if t == EthtoolBitsetBitAttr::Value as u16 => {
                        // Flag attribute, presence means set.
                        value = true;
                    }
                    _ => {}
                }
            }

            let idx = match (index, &name) {
                (Some(idx), _) => idx,
                (None, Some(n)) => strset.and_then(|s| s.index_of(n)).ok_or_else(|| {
                    Error::InvalidAttribute(format!("bitset bit \"{n}\" has no index"))
                })?,
                (None, None) => {
                    return Err(Error::InvalidAttribute("bitset bit without index or name".into()));
                }
            };
            let end = idx.checked_add(1).ok_or_else(|| {
                Error::InvalidAttribute(format!("bitset bit index {idx} out of range"))
            })?;
            // With NOMASK only set bits are listed.
            if value || self.nomask {
                self.value.insert(idx);
            }
            self.mask.insert(idx);
            if let Some(n) = name {
                self.names.insert(idx, n);
            }
            self.size = self.size.max(end);
        }
        Ok(())
    }

    /// Fill in missing names from a string set.
    pub fn resolve_names(&mut self, strset: &StringSet) {
        for idx in self.mask.iter().chain(self.value.iter()) {
            if self.names.contains_key(idx) {
                continue;
            }
            if let Some(name) = strset.get(*idx) {
                self.names.insert(*idx, name.to_string());
            }
        }
    }

    /// Encoding the bitset arrived in.
    pub fn form(&self) -> BitsetForm {
        self.form
    }

    /// Whether the kernel marked the set as complete.
    pub fn is_nomask(&self) -> bool {
        self.nomask
    }

    /// Number of bits the kernel declared.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Check if a bit is set by index.
    pub fn is_set(&self, index: u32) -> bool {
        self.value.contains(&index)
    }

    /// Check if a bit is within the mask.
    pub fn in_mask(&self, index: u32) -> bool {
        self.mask.contains(&index)
    }

    /// Check if a bit is set by name.
    pub fn is_set_by_name(&self, name: &str) -> bool {
        self.index(name).is_some_and(|idx| self.is_set(idx))
    }

    /// Get the name of a bit by index.
    pub fn name(&self, index: u32) -> Option<&str> {
        self.names.get(&index).map(|s| s.as_str())
    }

    /// Get the index of a bit by name.
    pub fn index(&self, name: &str) -> Option<u32> {
        self.names
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(idx, _)| *idx)
    }

    /// Indices of set bits, ascending.
    pub fn value_bits(&self) -> impl Iterator<Item = u32> + '_ {
        self.value.iter().copied()
    }

    /// Indices of mask bits, ascending.
    pub fn mask_bits(&self) -> impl Iterator<Item = u32> + '_ {
        self.mask.iter().copied()
    }

    /// Names of set bits, in index order. Unnamed bits are skipped.
    pub fn value_names(&self) -> Vec<String> {
        self.value
            .iter()
            .filter_map(|idx| self.names.get(idx).cloned())
            .collect()
    }

    /// Names of mask bits, in index order. Unnamed bits are skipped.
    pub fn mask_names(&self) -> Vec<String> {
        self.mask
            .iter()
            .filter_map(|idx| self.names.get(idx).cloned())
            .collect()
    }

    /// The low 32 bits of the value.
    pub fn value_u32(&self) -> u32 {
        low_word(&self.value)
    }

    /// The low 32 bits of the mask.
    pub fn mask_u32(&self) -> u32 {
        low_word(&self.mask)
    }

    /// Set or clear a bit, adding it to the mask.
    pub fn set(&mut self, index: u32, value: bool) {
        if value {
            self.value.insert(index);
        } else {
            self.value.remove(&index);
        }
        self.mask.insert(index);
        self.size = self.size.max(index.saturating_add(1));
    }
}

fn low_word(bits: &BTreeSet<u32>) -> u32 {
    bits.range(..32).fold(0, |acc, bit| acc | (1 << bit))
}

fn words_to_bits(data: &[u8], size: u32) -> Result<BTreeSet<u32>> {
    if data.len() % 4 != 0 {
        return Err(Error::InvalidAttribute(format!(
            "bitset array of {} bytes is not a whole number of words",
            data.len()
        )));
    }
    let mut bits = BTreeSet::new();
    for (word_idx, chunk) in data.chunks_exact(4).enumerate() {
        let word = get::u32_ne(chunk)?;
        for bit in 0..32 {
            let idx = word_idx as u32 * 32 + bit;
            if idx >= size {
                break;
            }
            if word & (1 << bit) != 0 {
                bits.insert(idx);
            }
        }
    }
    Ok(bits)
}

fn bits_to_words(bits: impl Iterator<Item = u32>, size: u32) -> Vec<u8> {
    let mut words = vec![0u32; size.div_ceil(32) as usize];
    for bit in bits {
        if let Some(word) = words.get_mut((bit / 32) as usize) {
            *word |= 1 << (bit % 32);
        }
    }
    words.iter().flat_map(|w| w.to_ne_bytes()).collect()
}

/// Append a compact bitset.
///
/// `mask` of `None` emits `NOMASK`, so every bit below `size` is written.
pub fn write_compact(
    builder: &mut MessageBuilder,
    attr: u16,
    size: u32,
    value: &[u32],
    mask: Option<&[u32]>,
) {
    let nest = builder.nest_start(attr);
    if mask.is_none() {
        builder.append_attr_empty(EthtoolBitsetAttr::Nomask as u16);
    }
    builder.append_attr_u32(EthtoolBitsetAttr::Size as u16, size);
    builder.append_attr(
        EthtoolBitsetAttr::Value as u16,
        &bits_to_words(value.iter().copied(), size),
    );
    if let Some(mask) = mask {
        builder.append_attr(
            EthtoolBitsetAttr::Mask as u16,
            &bits_to_words(mask.iter().copied(), size),
        );
    }
    builder.nest_end(nest);
}

/// Append a compact bitset for a set of at most 32 bits.
pub fn write_compact_u32(
    builder: &mut MessageBuilder,
    attr: u16,
    size: u32,
    value: u32,
    mask: Option<u32>,
) {
    let ones = |w: u32| (0..32).filter(move |b| w & (1 << b) != 0).collect::<Vec<_>>();
    let mask_bits = mask.map(ones);
    write_compact(builder, attr, size, &ones(value), mask_bits.as_deref());
}

/// Append a verbose bitset naming each bit.
///
/// Each entry is written as one `BIT` with its `VALUE` flag when set.
/// With `nomask` the list is the complete new value; otherwise only the
/// listed bits change.
pub fn write_named(builder: &mut MessageBuilder, attr: u16, bits: &[(&str, bool)], nomask: bool) {
    let nest = builder.nest_start(attr);
    if nomask {
        builder.append_attr_empty(EthtoolBitsetAttr::Nomask as u16);
    }
    let list = builder.nest_start(EthtoolBitsetAttr::Bits as u16);
    for (name, value) in bits {
        let bit = builder.nest_start(ETHTOOL_A_BITSET_BITS_BIT);
        builder.append_attr_str(EthtoolBitsetBitAttr::Name as u16, name);
        if *value {
            builder.append_attr_empty(EthtoolBitsetBitAttr::Value as u16);
        }
        builder.nest_end(bit);
    }
    builder.nest_end(list);
    builder.nest_end(nest);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link_modes() -> StringSet {
        StringSet::new(
            9,
            [
                "10baseT/Half",
                "10baseT/Full",
                "100baseT/Half",
                "100baseT/Full",
                "1000baseT/Half",
                "1000baseT/Full",
                "Autoneg",
                "TP",
                "AUI",
                "MII",
                "FIBRE",
                "BNC",
                "10000baseT/Full",
                "Pause",
                "Asym_Pause",
                "2500baseX/Full",
                "Backplane",
                "1000baseKX/Full",
                "10000baseKX4/Full",
                "10000baseKR/Full",
                "10000baseR_FEC",
                "20000baseMLD2/Full",
                "20000baseKR2/Full",
                "40000baseKR4/Full",
                "40000baseCR4/Full",
                "40000baseSR4/Full",
                "40000baseLR4/Full",
                "56000baseKR4/Full",
                "56000baseCR4/Full",
                "56000baseSR4/Full",
                "56000baseLR4/Full",
                "25000baseCR/Full",
                "25000baseKR/Full",
                "25000baseSR/Full",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )
    }

    /// Nest payload of the first attribute a builder produced.
    fn nest_payload(b: &MessageBuilder) -> Vec<u8> {
        AttrIter::new(b.payload()).next().unwrap().1.to_vec()
    }

    fn compact_roundtrip(names: &[&str], strset: &StringSet) -> Vec<String> {
        let value: Vec<u32> = names.iter().map(|n| strset.index_of(n).unwrap()).collect();
        let mut b = MessageBuilder::new(0x20, 0);
        write_compact(&mut b, 3, strset.len() as u32, &value, None);
        let mut parsed = EthtoolBitset::parse(&nest_payload(&b)).unwrap();
        parsed.resolve_names(strset);
        parsed.value_names()
    }

    fn verbose_roundtrip(names: &[&str], strset: &StringSet) -> Vec<String> {
        let bits: Vec<(&str, bool)> = names.iter().map(|n| (*n, true)).collect();
        let mut b = MessageBuilder::new(0x20, 0);
        write_named(&mut b, 3, &bits, true);
        let parsed = EthtoolBitset::parse_with(&nest_payload(&b), strset).unwrap();
        assert_eq!(parsed.form(), BitsetForm::Verbose);
        parsed.value_names()
    }

    /// Subsets of `all` picked by the bits of each seed.
    fn seeded_subsets(all: &[String]) -> Vec<(u64, Vec<&str>)> {
        [0u64, 1, 0b1010_0110, 0x1_8000_0001, 0x3_ffff_ffff, 0x2_4924_9249]
            .into_iter()
            .map(|seed| {
                let subset = all
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| seed & (1 << i) != 0)
                    .map(|(_, n)| n.as_str())
                    .collect();
                (seed, subset)
            })
            .collect()
    }

    #[test]
    fn compact_roundtrip_over_subsets() {
        let strset = link_modes();
        // Includes subsets crossing the word boundary.
        for (seed, subset) in seeded_subsets(strset.strings()) {
            assert_eq!(compact_roundtrip(&subset, &strset), subset, "seed {seed:#x}");
        }
    }

    #[test]
    fn verbose_roundtrip_over_subsets() {
        let strset = link_modes();
        for (seed, subset) in seeded_subsets(strset.strings()) {
            assert_eq!(verbose_roundtrip(&subset, &strset), subset, "seed {seed:#x}");
        }
    }

    #[test]
    fn verbose_names_outside_string_set_are_rejected() {
        let mut b = MessageBuilder::new(0x20, 0);
        write_named(&mut b, 3, &[("rx-gro", true)], true);
        assert!(EthtoolBitset::parse_with(&nest_payload(&b), &link_modes()).is_err());
    }

    #[test]
    fn verbose_mask_only_change_by_name() {
        let strset = link_modes();
        let mut b = MessageBuilder::new(0x20, 0);
        write_named(&mut b, 3, &[("Pause", true), ("Asym_Pause", false)], false);
        let bs = EthtoolBitset::parse_with(&nest_payload(&b), &strset).unwrap();
        assert!(!bs.is_nomask());
        assert_eq!(bs.value_names(), ["Pause"]);
        assert_eq!(bs.mask_names(), ["Pause", "Asym_Pause"]);
    }

    #[test]
    fn bit_index_at_u32_max_is_rejected() {
        let mut b = MessageBuilder::new(0x20, 0);
        let nest = b.nest_start(2);
        let list = b.nest_start(EthtoolBitsetAttr::Bits as u16);
        let bit = b.nest_start(ETHTOOL_A_BITSET_BITS_BIT);
        b.append_attr_u32(EthtoolBitsetBitAttr::Index as u16, u32::MAX);
        b.append_attr_empty(EthtoolBitsetBitAttr::Value as u16);
        b.nest_end(bit);
        b.nest_end(list);
        b.nest_end(nest);
        assert!(EthtoolBitset::parse(&nest_payload(&b)).is_err());
    }

    #[test]
    fn parse_verbose_reply_with_mask() {
        let mut b = MessageBuilder::new(0x20, 0);
        let nest = b.nest_start(2);
        b.append_attr_u32(EthtoolBitsetAttr::Size as u16, 8);
        let list = b.nest_start(EthtoolBitsetAttr::Bits as u16);
        for (idx, name, on) in [(0u32, "drv", true), (2, "link", false), (5, "ifup", true)] {
            let bit = b.nest_start(ETHTOOL_A_BITSET_BITS_BIT);
            b.append_attr_u32(EthtoolBitsetBitAttr::Index as u16, idx);
            b.append_attr_str(EthtoolBitsetBitAttr::Name as u16, name);
            if on {
                b.append_attr_empty(EthtoolBitsetBitAttr::Value as u16);
            }
            b.nest_end(bit);
        }
        b.nest_end(list);
        b.nest_end(nest);

        let bs = EthtoolBitset::parse(&nest_payload(&b)).unwrap();
        assert_eq!(bs.form(), BitsetForm::Verbose);
        assert_eq!(bs.value_names(), ["drv", "ifup"]);
        assert_eq!(bs.mask_names(), ["drv", "link", "ifup"]);
        assert!(bs.is_set_by_name("ifup"));
        assert!(!bs.is_set_by_name("link"));
        assert_eq!(bs.value_u32(), 0b10_0001);
    }

    #[test]
    fn compact_mask_only_change() {
        let mut b = MessageBuilder::new(0x20, 0);
        // Clear bit 1, set bit 4, leave the rest alone.
        write_compact_u32(&mut b, 2, 15, 1 << 4, Some((1 << 1) | (1 << 4)));
        let bs = EthtoolBitset::parse(&nest_payload(&b)).unwrap();
        assert!(!bs.is_nomask());
        assert_eq!(bs.mask_u32(), 0b1_0010);
        assert_eq!(bs.value_u32(), 0b1_0000);
        assert!(bs.in_mask(1));
        assert!(!bs.in_mask(0));
    }

    #[test]
    fn compact_value_bits_beyond_size_are_dropped() {
        let mut b = MessageBuilder::new(0x20, 0);
        let nest = b.nest_start(2);
        b.append_attr_u32(EthtoolBitsetAttr::Size as u16, 3);
        b.append_attr(EthtoolBitsetAttr::Value as u16, &0xffu32.to_ne_bytes());
        b.nest_end(nest);
        let bs = EthtoolBitset::parse(&nest_payload(&b)).unwrap();
        assert_eq!(bs.value_bits().collect::<Vec<_>>(), [0, 1, 2]);
    }

    #[test]
    fn malformed_value_array_is_rejected() {
        let mut b = MessageBuilder::new(0x20, 0);
        let nest = b.nest_start(2);
        b.append_attr_u32(EthtoolBitsetAttr::Size as u16, 8);
        b.append_attr(EthtoolBitsetAttr::Value as u16, &[1, 2, 3]);
        b.nest_end(nest);
        assert!(EthtoolBitset::parse(&nest_payload(&b)).is_err());
    }

    #[test]
    fn bit_without_index_is_rejected() {
        let mut b = MessageBuilder::new(0x20, 0);
        let nest = b.nest_start(2);
        let list = b.nest_start(EthtoolBitsetAttr::Bits as u16);
        let bit = b.nest_start(ETHTOOL_A_BITSET_BITS_BIT);
        b.append_attr_str(EthtoolBitsetBitAttr::Name as u16, "drv");
        b.nest_end(bit);
        b.nest_end(list);
        b.nest_end(nest);
        assert!(EthtoolBitset::parse(&nest_payload(&b)).is_err());
    }
}
