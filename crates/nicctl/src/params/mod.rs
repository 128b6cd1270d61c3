//! Command-line option parsing into typed request records.
//!
//! Each command family has a request record whose fields are
//! [`Wanted`] values, and a table of [`OptSpec`] entries describing the
//! `name value` pairs it accepts. [`parse_options`] walks the tokens left
//! to right and fills the record; nothing is looked up in global state.
//!
//! # Example
//!
//! ```
//! use nicctl::params::{parse_options, records::RingRequest, Wanted};
//!
//! let tokens: Vec<String> = ["rx", "4096", "tx", "1024"].iter().map(|s| s.to_string()).collect();
//! let mut req = RingRequest::default();
//! parse_options(&tokens, &RingRequest::options(), &mut req).unwrap();
//! assert_eq!(req.rx, Wanted::Value(4096));
//! assert_eq!(req.rx_mini, Wanted::Unset);
//! ```

pub mod records;
mod value;

use std::net::Ipv4Addr;

pub use value::{IntError, Radix, parse_bool, parse_int};

/// Errors raised while parsing command-line options.
///
/// Every variant is a usage error: it is detected before the device is
/// touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown option \"{0}\"")]
    UnknownOption(String),

    #[error("option \"{0}\" requires a value")]
    MissingValue(String),

    #[error("invalid value \"{value}\" for {option}: {reason}")]
    InvalidValue {
        option: String,
        value: String,
        reason: String,
    },

    #[error("value {value} for {option} is out of range [{min}, {max}]")]
    OutOfRange {
        option: String,
        value: String,
        min: i64,
        max: i64,
    },

    #[error("{0}")]
    Usage(String),
}

impl ParseError {
    pub(crate) fn invalid(option: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            option: option.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// A field's requested change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Wanted<T> {
    /// Not mentioned; never written.
    #[default]
    Unset,
    /// Write this value.
    Value(T),
    /// Write the type's disabled representation.
    Off,
}

impl<T> Wanted<T> {
    /// Whether the field will be written.
    pub fn is_set(&self) -> bool {
        !matches!(self, Wanted::Unset)
    }

    /// The explicit value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Wanted::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: OffValue + Clone> Wanted<T> {
    /// The value to write, resolving `Off`.
    pub fn resolve(&self) -> Option<T> {
        match self {
            Wanted::Unset => None,
            Wanted::Value(v) => Some(v.clone()),
            Wanted::Off => Some(T::off()),
        }
    }

    /// Merge into a fetched value. Returns whether `dst` changed.
    pub fn apply(&self, dst: &mut T) -> bool
    where
        T: PartialEq,
    {
        match self.resolve() {
            Some(v) if *dst != v => {
                *dst = v;
                true
            }
            _ => false,
        }
    }
}

/// The "disabled" value of a field type.
pub trait OffValue {
    fn off() -> Self;
}

impl OffValue for bool {
    fn off() -> Self {
        false
    }
}

macro_rules! impl_off_zero {
    ($($t:ty),*) => {
        $(impl OffValue for $t {
            fn off() -> Self {
                0
            }
        })*
    };
}

impl_off_zero!(u8, u16, u32, u64);

impl OffValue for FlagSet {
    fn off() -> Self {
        FlagSet::default()
    }
}

/// Flag options accumulated so far.
///
/// Each occurrence of a flag option sets its bit in `mask`; the last
/// occurrence decides the bit in `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagSet {
    pub value: u32,
    pub mask: u32,
}

impl FlagSet {
    /// Record one flag option.
    pub fn set(&mut self, bit: u32, on: bool) {
        self.mask |= bit;
        if on {
            self.value |= bit;
        } else {
            self.value &= !bit;
        }
    }

    /// Whether any flag was mentioned.
    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }

    /// Apply the touched bits to a current value.
    pub fn merge(&self, current: u32) -> u32 {
        (current & !self.mask) | (self.value & self.mask)
    }
}

/// How an option's value token is converted and stored.
pub enum OptKind<R> {
    /// `on` or `off`.
    Bool(fn(&mut R, bool)),
    /// Integer in `[min, max]`.
    Int {
        min: i64,
        max: i64,
        radix: Radix,
        store: fn(&mut R, i64),
    },
    /// 16-bit value, stored in host order and written big-endian.
    Be16(fn(&mut R, u16)),
    /// Dotted-quad IPv4 address.
    Ipv4(fn(&mut R, Ipv4Addr)),
    /// Colon-separated MAC address.
    Mac(fn(&mut R, [u8; 6])),
    /// Raw string.
    Str(fn(&mut R, &str)),
    /// One of a fixed set of names.
    Choice(&'static [(&'static str, u32)], fn(&mut R, u32)),
    /// One bit of a flag set, `on` or `off`.
    Flag {
        bit: u32,
        flags: fn(&mut R) -> &mut FlagSet,
    },
    /// Option-specific grammar for one token.
    Custom(fn(&mut R, &str) -> Result<(), ParseError>),
    /// Consumes a run of tokens, possibly all that remain, and returns
    /// how many it used.
    Rest(fn(&mut R, &[String]) -> Result<usize, ParseError>),
    /// Either a number, or `name on|off` pairs from a sub-table. The
    /// sub-table stops at the first name it does not know.
    Nested {
        numeric: fn(&mut R, u32),
        table: fn() -> Vec<OptSpec<R>>,
    },
}

/// One named option.
pub struct OptSpec<R> {
    pub name: &'static str,
    pub kind: OptKind<R>,
}

impl<R> OptSpec<R> {
    pub fn new(name: &'static str, kind: OptKind<R>) -> Self {
        Self { name, kind }
    }
}

/// Parse `tokens` as option pairs into `record`.
pub fn parse_options<R>(
    tokens: &[String],
    table: &[OptSpec<R>],
    record: &mut R,
) -> Result<(), ParseError> {
    let mut pos = 0;
    parse_table(tokens, &mut pos, table, record, false)?;
    match tokens.get(pos) {
        Some(extra) => Err(ParseError::UnknownOption(extra.clone())),
        None => Ok(()),
    }
}

fn parse_table<R>(
    tokens: &[String],
    pos: &mut usize,
    table: &[OptSpec<R>],
    record: &mut R,
    nested: bool,
) -> Result<(), ParseError> {
    while let Some(name) = tokens.get(*pos) {
        let Some(spec) = table.iter().find(|s| s.name == name) else {
            if nested {
                return Ok(());
            }
            return Err(ParseError::UnknownOption(name.clone()));
        };
        *pos += 1;

        let value = tokens
            .get(*pos)
            .ok_or_else(|| ParseError::MissingValue(spec.name.to_string()))?;

        match &spec.kind {
            OptKind::Rest(store) => {
                let used = store(record, &tokens[*pos..])?;
                if used == 0 {
                    return Err(ParseError::MissingValue(spec.name.to_string()));
                }
                *pos += used;
            }
            OptKind::Nested { numeric, table } => {
                if let Ok(v) = parse_int(value, Radix::Auto) {
                    let v = u32::try_from(v).map_err(|_| ParseError::OutOfRange {
                        option: spec.name.to_string(),
                        value: value.clone(),
                        min: 0,
                        max: u32::MAX.into(),
                    })?;
                    numeric(record, v);
                    *pos += 1;
                } else {
                    let start = *pos;
                    parse_table(tokens, pos, &table(), record, true)?;
                    if *pos == start {
                        return Err(ParseError::invalid(spec.name, value, "unknown name"));
                    }
                }
            }
            kind => {
                store_value(spec.name, kind, value, record)?;
                *pos += 1;
            }
        }
    }
    Ok(())
}

fn store_value<R>(
    name: &str,
    kind: &OptKind<R>,
    value: &str,
    record: &mut R,
) -> Result<(), ParseError> {
    match kind {
        OptKind::Bool(store) => {
            let on = parse_bool(value)
                .ok_or_else(|| ParseError::invalid(name, value, "expected on or off"))?;
            store(record, on);
        }
        OptKind::Int {
            min,
            max,
            radix,
            store,
        } => {
            let v = parse_int(value, *radix)
                .map_err(|_| ParseError::invalid(name, value, "not a number"))?;
            if v < *min || v > *max {
                return Err(ParseError::OutOfRange {
                    option: name.to_string(),
                    value: value.to_string(),
                    min: *min,
                    max: *max,
                });
            }
            store(record, v);
        }
        OptKind::Be16(store) => {
            let v = parse_int(value, Radix::Auto)
                .ok()
                .and_then(|v| u16::try_from(v).ok())
                .ok_or_else(|| ParseError::invalid(name, value, "expected a 16-bit number"))?;
            store(record, v);
        }
        OptKind::Ipv4(store) => {
            let addr = crate::util::addr::parse_ipv4(value)
                .map_err(|e| ParseError::invalid(name, value, e.to_string()))?;
            store(record, addr);
        }
        OptKind::Mac(store) => {
            let mac = crate::util::addr::parse_mac(value)
                .map_err(|e| ParseError::invalid(name, value, e.to_string()))?;
            store(record, mac);
        }
        OptKind::Str(store) => store(record, value),
        OptKind::Choice(choices, store) => {
            let v = choices
                .iter()
                .find(|(n, _)| *n == value)
                .map(|(_, v)| *v)
                .ok_or_else(|| {
                    let names: Vec<&str> = choices.iter().map(|(n, _)| *n).collect();
                    ParseError::invalid(name, value, format!("expected one of {}", names.join(", ")))
                })?;
            store(record, v);
        }
        OptKind::Flag { bit, flags } => {
            let on = parse_bool(value)
                .ok_or_else(|| ParseError::invalid(name, value, "expected on or off"))?;
            flags(record).set(*bit, on);
        }
        OptKind::Custom(parse) => parse(record, value)?,
        OptKind::Rest(_) | OptKind::Nested { .. } => {
            return Err(ParseError::Usage(format!(
                "option \"{name}\" takes more than one token"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Rec {
        enabled: Wanted<bool>,
        count: Wanted<u32>,
        port: Wanted<u16>,
        mode: Wanted<u32>,
        flags: FlagSet,
        level: Wanted<u32>,
        rest: Vec<String>,
    }

    fn rec_flags(r: &mut Rec) -> &mut FlagSet {
        &mut r.flags
    }

    fn flag_table() -> Vec<OptSpec<Rec>> {
        vec![
            OptSpec::new("a", OptKind::Flag { bit: 1, flags: rec_flags }),
            OptSpec::new("b", OptKind::Flag { bit: 2, flags: rec_flags }),
        ]
    }

    fn table() -> Vec<OptSpec<Rec>> {
        vec![
            OptSpec::new(
                "enabled",
                OptKind::Bool(|r, v| r.enabled = if v { Wanted::Value(true) } else { Wanted::Off }),
            ),
            OptSpec::new(
                "count",
                OptKind::Int {
                    min: 0,
                    max: 100,
                    radix: Radix::Dec,
                    store: |r, v| r.count = Wanted::Value(v as u32),
                },
            ),
            OptSpec::new("port", OptKind::Be16(|r, v| r.port = Wanted::Value(v))),
            OptSpec::new(
                "mode",
                OptKind::Choice(&[("slow", 1), ("fast", 2)], |r, v| r.mode = Wanted::Value(v)),
            ),
            OptSpec::new(
                "level",
                OptKind::Nested {
                    numeric: |r, v| r.level = Wanted::Value(v),
                    table: flag_table,
                },
            ),
            OptSpec::new(
                "list",
                OptKind::Rest(|r, toks| {
                    r.rest = toks.to_vec();
                    Ok(toks.len())
                }),
            ),
        ]
    }

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    fn parse(s: &str) -> Result<Rec, ParseError> {
        let mut rec = Rec::default();
        parse_options(&toks(s), &table(), &mut rec)?;
        Ok(rec)
    }

    #[test]
    fn booleans_accept_only_on_and_off() {
        assert_eq!(parse("enabled on").unwrap().enabled, Wanted::Value(true));
        assert_eq!(parse("enabled off").unwrap().enabled, Wanted::Off);
        for bad in ["yes", "no", "1", "0", "ON", "true", ""] {
            let input = format!("enabled {bad}");
            assert!(parse(&input).is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn unset_fields_stay_unset() {
        let rec = parse("count 5").unwrap();
        assert_eq!(rec.count, Wanted::Value(5));
        assert_eq!(rec.enabled, Wanted::Unset);
        assert_eq!(rec.mode, Wanted::Unset);
        assert!(rec.flags.is_empty());
    }

    #[test]
    fn range_and_format_are_checked() {
        assert!(matches!(parse("count 101"), Err(ParseError::OutOfRange { .. })));
        assert!(matches!(parse("count -1"), Err(ParseError::OutOfRange { .. })));
        assert!(matches!(parse("count 0x10"), Err(ParseError::InvalidValue { .. })));
        assert!(matches!(parse("count"), Err(ParseError::MissingValue(_))));
        assert!(matches!(parse("bogus 1"), Err(ParseError::UnknownOption(_))));
        assert!(matches!(parse("port 70000"), Err(ParseError::InvalidValue { .. })));
        assert!(matches!(parse("mode medium"), Err(ParseError::InvalidValue { .. })));
    }

    #[test]
    fn later_occurrence_overwrites() {
        let rec = parse("count 5 mode slow count 7 mode fast").unwrap();
        assert_eq!(rec.count, Wanted::Value(7));
        assert_eq!(rec.mode, Wanted::Value(2));
    }

    #[test]
    fn flag_repetition_keeps_last_value_and_mask() {
        let rec = parse("level a on b on a off").unwrap();
        assert_eq!(rec.flags.mask, 0b11);
        assert_eq!(rec.flags.value, 0b10);

        let rec = parse("level a off level a on").unwrap();
        assert_eq!(rec.flags, FlagSet { value: 1, mask: 1 });
    }

    #[test]
    fn nested_table_hands_back_to_outer() {
        let rec = parse("level a on count 3").unwrap();
        assert_eq!(rec.flags, FlagSet { value: 1, mask: 1 });
        assert_eq!(rec.count, Wanted::Value(3));

        let rec = parse("level 0x12").unwrap();
        assert_eq!(rec.level, Wanted::Value(0x12));
        assert!(rec.flags.is_empty());

        assert!(parse("level c on").is_err());
        assert!(parse("level a maybe").is_err());
    }

    #[test]
    fn rest_consumes_remaining_tokens() {
        let rec = parse("count 1 list x y z").unwrap();
        assert_eq!(rec.rest, ["x", "y", "z"]);
        assert!(parse("list").is_err());
    }

    #[test]
    fn wanted_apply_merges() {
        let mut cur = 10u32;
        assert!(!Wanted::<u32>::Unset.apply(&mut cur));
        assert_eq!(cur, 10);
        assert!(Wanted::Value(20).apply(&mut cur));
        assert_eq!(cur, 20);
        assert!(Wanted::<u32>::Off.apply(&mut cur));
        assert_eq!(cur, 0);
        assert!(!Wanted::Value(0).apply(&mut cur));
    }

    #[test]
    fn flagset_merge_preserves_untouched_bits() {
        let mut f = FlagSet::default();
        f.set(1 << 2, true);
        f.set(1 << 0, false);
        assert_eq!(f.merge(0b1011), 0b1110);
    }
}
