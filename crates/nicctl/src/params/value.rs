//! Token converters.

use std::num::ParseIntError;

/// Numeric base of an integer option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Dec,
    /// Hex digits with an optional `0x` prefix.
    Hex,
    /// Hex with a `0x` prefix, decimal otherwise.
    Auto,
}

/// `on` → true, `off` → false, anything else → `None`.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}

/// A token that is not an integer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntError {
    /// Something other than digits after the optional sign and prefix.
    #[error("malformed number \"{0}\"")]
    Malformed(String),
    #[error(transparent)]
    Parse(#[from] ParseIntError),
}

/// Parse a signed integer in the given base. At most one leading `-`
/// is accepted; `+` is not.
pub fn parse_int(s: &str, radix: Radix) -> Result<i64, IntError> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (base, body) = match (radix, strip_hex_prefix(digits)) {
        (Radix::Dec, _) => (10, digits),
        (Radix::Hex, Some(h)) | (Radix::Auto, Some(h)) => (16, h),
        (Radix::Hex, None) => (16, digits),
        (Radix::Auto, None) => (10, digits),
    };
    if !starts_with_digit(body, base) {
        return Err(IntError::Malformed(s.to_string()));
    }
    let magnitude = i64::from_str_radix(body, base)?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Parse an unsigned hex value with an optional `0x` prefix, up to 64 bits.
pub(crate) fn parse_hex_u64(s: &str) -> Result<u64, IntError> {
    let body = strip_hex_prefix(s).unwrap_or(s);
    if !starts_with_digit(body, 16) {
        return Err(IntError::Malformed(s.to_string()));
    }
    Ok(u64::from_str_radix(body, 16)?)
}

/// `from_str_radix` takes a leading sign; tokens here must not.
fn starts_with_digit(s: &str, base: u32) -> bool {
    s.chars().next().is_some_and(|c| c.is_digit(base))
}

fn strip_hex_prefix(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_radix() {
        assert_eq!(parse_int("42", Radix::Dec).unwrap(), 42);
        assert!(parse_int("0x2a", Radix::Dec).is_err());
        assert_eq!(parse_int("2a", Radix::Hex).unwrap(), 42);
        assert_eq!(parse_int("0x2a", Radix::Hex).unwrap(), 42);
        assert_eq!(parse_int("0x2a", Radix::Auto).unwrap(), 42);
        assert_eq!(parse_int("42", Radix::Auto).unwrap(), 42);
        assert_eq!(parse_int("-5", Radix::Dec).unwrap(), -5);
        assert!(parse_int("", Radix::Dec).is_err());
        assert!(parse_int("12k", Radix::Auto).is_err());
    }

    #[test]
    fn test_parse_hex_u64() {
        assert_eq!(parse_hex_u64("0x8000000000000000").unwrap(), 1 << 63);
        assert_eq!(parse_hex_u64("ff").unwrap(), 255);
        assert!(parse_hex_u64("0x").is_err());
        assert!(parse_hex_u64("+ff").is_err());
    }

    #[test]
    fn test_parse_int_sign() {
        assert!(parse_int("--5", Radix::Auto).is_err());
        assert!(parse_int("--5", Radix::Dec).is_err());
        assert!(parse_int("+5", Radix::Dec).is_err());
        assert!(parse_int("-+5", Radix::Auto).is_err());
        assert!(parse_int("0x-5", Radix::Auto).is_err());
        assert!(parse_int("-", Radix::Dec).is_err());
        assert_eq!(parse_int("-0x10", Radix::Auto).unwrap(), -16);
        assert!(matches!(
            parse_int("--5", Radix::Auto),
            Err(IntError::Malformed(_))
        ));
    }
}
