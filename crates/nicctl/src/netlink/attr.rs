//! Netlink attribute (nlattr) handling.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{Error, Result};

/// Netlink attribute alignment.
pub const NLA_ALIGNTO: usize = 4;

/// Align a length to NLA_ALIGNTO boundary.
#[inline]
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Size of the attribute header.
pub const NLA_HDRLEN: usize = 4;

/// Netlink attribute header (mirrors struct nlattr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    /// Length including header.
    pub nla_len: u16,
    /// Attribute type.
    pub nla_type: u16,
}

/// Attribute type flags.
pub const NLA_F_NESTED: u16 = 1 << 15;
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

impl NlAttr {
    /// Create a new attribute header.
    pub fn new(attr_type: u16, data_len: usize) -> Self {
        Self {
            nla_len: (NLA_HDRLEN + data_len) as u16,
            nla_type: attr_type,
        }
    }

    /// Get the attribute type without flags.
    pub fn kind(&self) -> u16 {
        self.nla_type & NLA_TYPE_MASK
    }

    /// Convert to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Parse from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| Error::Truncated {
                expected: std::mem::size_of::<Self>(),
                actual: data.len(),
            })
    }
}

/// Iterator over netlink attributes in a buffer.
///
/// Iteration stops at the first malformed header. Use [`check_attrs`]
/// first when a malformed stream must be reported instead of truncated.
pub struct AttrIter<'a> {
    data: &'a [u8],
}

impl<'a> AttrIter<'a> {
    /// Create a new attribute iterator.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Check if there are no more attributes.
    pub fn is_empty(&self) -> bool {
        self.data.len() < NLA_HDRLEN
    }
}

impl<'a> Iterator for AttrIter<'a> {
    /// Returns (attribute type, payload data).
    type Item = (u16, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() < NLA_HDRLEN {
            return None;
        }

        let attr = NlAttr::from_bytes(self.data).ok()?;

        let len = attr.nla_len as usize;
        if len < NLA_HDRLEN || len > self.data.len() {
            return None;
        }

        let payload = &self.data[NLA_HDRLEN..len];
        let aligned_len = nla_align(len);

        if aligned_len >= self.data.len() {
            self.data = &[];
        } else {
            self.data = &self.data[aligned_len..];
        }

        Some((attr.kind(), payload))
    }
}

/// Walk an attribute stream and fail on the first bad length.
///
/// Nested payloads are not descended into; callers check those when
/// they parse them.
pub fn check_attrs(mut data: &[u8]) -> Result<()> {
    while !data.is_empty() {
        if data.len() < NLA_HDRLEN {
            return Err(Error::InvalidAttribute(format!(
                "{} trailing bytes after last attribute",
                data.len()
            )));
        }
        let attr = NlAttr::from_bytes(data)?;
        let len = attr.nla_len as usize;
        if len < NLA_HDRLEN || len > data.len() {
            return Err(Error::InvalidAttribute(format!(
                "attribute {} claims {} bytes, {} available",
                attr.kind(),
                len,
                data.len()
            )));
        }
        data = data.get(nla_align(len)..).unwrap_or(&[]);
    }
    Ok(())
}

/// Helper functions for extracting typed values from attribute payloads.
pub mod get {
    use super::*;

    /// Extract a u8 value.
    pub fn u8(data: &[u8]) -> Result<u8> {
        data.first()
            .copied()
            .ok_or_else(|| Error::InvalidAttribute("empty u8 attribute".into()))
    }

    /// Extract a u8 value interpreted as a boolean.
    pub fn bool(data: &[u8]) -> Result<bool> {
        Ok(u8(data)? != 0)
    }

    /// Extract a u16 value (native endian).
    pub fn u16_ne(data: &[u8]) -> Result<u16> {
        match data {
            [a, b, ..] => Ok(u16::from_ne_bytes([*a, *b])),
            _ => Err(Error::InvalidAttribute("truncated u16 attribute".into())),
        }
    }

    /// Extract a u32 value (native endian).
    pub fn u32_ne(data: &[u8]) -> Result<u32> {
        match data {
            [a, b, c, d, ..] => Ok(u32::from_ne_bytes([*a, *b, *c, *d])),
            _ => Err(Error::InvalidAttribute("truncated u32 attribute".into())),
        }
    }

    /// Extract a null-terminated string.
    pub fn string(data: &[u8]) -> Result<&str> {
        let len = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        std::str::from_utf8(&data[..len])
            .map_err(|e| Error::InvalidAttribute(format!("invalid UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(kind: u16, payload: &[u8]) -> Vec<u8> {
        let mut buf = NlAttr::new(kind, payload.len()).as_bytes().to_vec();
        buf.extend_from_slice(payload);
        buf.resize(nla_align(buf.len()), 0);
        buf
    }

    #[test]
    fn test_iter_aligned() {
        let mut buf = attr(1, &[7]);
        buf.extend(attr(2, &42u32.to_ne_bytes()));

        let attrs: Vec<_> = AttrIter::new(&buf).collect();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0], (1, &[7u8][..]));
        assert_eq!(get::u32_ne(attrs[1].1).unwrap(), 42);
    }

    #[test]
    fn test_iter_strips_nested_flag() {
        let buf = attr(3 | NLA_F_NESTED, &[]);
        let (kind, payload) = AttrIter::new(&buf).next().unwrap();
        assert_eq!(kind, 3);
        assert!(payload.is_empty());
    }

    #[test]
    fn test_check_attrs_rejects_overlong() {
        let mut buf = attr(1, &[1, 2, 3, 4]);
        buf[0] = 64;
        assert!(check_attrs(&buf).is_err());
        assert_eq!(AttrIter::new(&buf).count(), 0);
    }

    #[test]
    fn test_check_attrs_rejects_trailing_bytes() {
        let mut buf = attr(1, &[1, 2, 3, 4]);
        buf.extend_from_slice(&[0, 0]);
        assert!(check_attrs(&buf).is_err());
        assert!(check_attrs(&buf[..8]).is_ok());
    }

    #[test]
    fn test_get_truncated() {
        assert!(get::u32_ne(&[1, 2]).is_err());
        assert!(get::u8(&[]).is_err());
        assert_eq!(get::string(b"eth0\0\0").unwrap(), "eth0");
    }
}
