//! Address parsing and formatting utilities.

use std::net::Ipv4Addr;

/// Error type for address parsing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddrError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid MAC address: {0}")]
    InvalidMac(String),
}

pub type Result<T> = std::result::Result<T, AddrError>;

/// Parse a dotted-quad IPv4 address.
pub fn parse_ipv4(s: &str) -> Result<Ipv4Addr> {
    s.parse()
        .map_err(|_| AddrError::InvalidAddress(s.to_string()))
}

/// Parse a MAC address from string.
///
/// Each of the six colon-separated groups is one or two hex digits.
pub fn parse_mac(s: &str) -> Result<[u8; 6]> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 6 {
        return Err(AddrError::InvalidMac(s.to_string()));
    }

    let mut mac = [0u8; 6];
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() || part.len() > 2 {
            return Err(AddrError::InvalidMac(s.to_string()));
        }
        mac[i] = u8::from_str_radix(part, 16).map_err(|_| AddrError::InvalidMac(s.to_string()))?;
    }

    Ok(mac)
}

/// Format a MAC address.
pub fn format_mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mac() {
        assert_eq!(
            parse_mac("00:1b:21:0a:ff:3").unwrap(),
            [0x00, 0x1b, 0x21, 0x0a, 0xff, 0x03]
        );
        assert!(parse_mac("00:1b:21:0a:ff").is_err());
        assert!(parse_mac("00:1b:21:0a:ff:100").is_err());
        assert!(parse_mac("00:1b:21:0a:ff:zz").is_err());
        assert!(parse_mac("00:1b:21::ff:01").is_err());
    }

    #[test]
    fn test_format_mac() {
        assert_eq!(format_mac(&[0, 0x1b, 0x21, 0x0a, 0xff, 3]), "00:1b:21:0a:ff:03");
        assert_eq!(format_mac(&[0xde, 0xad]), "de:ad");
    }

    #[test]
    fn test_parse_ipv4() {
        assert_eq!(parse_ipv4("192.168.0.1").unwrap(), Ipv4Addr::new(192, 168, 0, 1));
        assert!(parse_ipv4("192.168.0").is_err());
    }
}
