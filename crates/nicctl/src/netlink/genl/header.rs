//! The 4-byte `genlmsghdr` that follows `nlmsghdr` in every generic
//! netlink message, ahead of the attributes.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Generic netlink header: command, family version, padding.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct GenlMsgHdr {
    pub cmd: u8,
    pub version: u8,
    pub reserved: u16,
}

/// Size of the header in bytes.
pub const GENL_HDRLEN: usize = std::mem::size_of::<GenlMsgHdr>();

impl GenlMsgHdr {
    pub const fn new(cmd: u8, version: u8) -> Self {
        Self {
            cmd,
            version,
            reserved: 0,
        }
    }

    /// Split a message payload into its header and attributes.
    ///
    /// The header is copied out, so `payload` needs no alignment.
    pub fn split(payload: &[u8]) -> Option<(Self, &[u8])> {
        Self::read_from_prefix(payload).ok()
    }

    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_four_bytes() {
        assert_eq!(GENL_HDRLEN, 4);
    }

    #[test]
    fn split_reads_unaligned_payload() {
        // Offset by one byte so the header starts on an odd address.
        let buf = [0xee, 0x03, 0x01, 0x00, 0x00, 0xaa, 0xbb];
        let (hdr, rest) = GenlMsgHdr::split(&buf[1..]).unwrap();
        assert_eq!(hdr, GenlMsgHdr::new(3, 1));
        assert_eq!(rest, [0xaa, 0xbb]);
    }

    #[test]
    fn split_rejects_short_payload() {
        assert!(GenlMsgHdr::split(&[0x03, 0x01, 0x00]).is_none());
    }

    #[test]
    fn encoded_header_splits_back() {
        let hdr = GenlMsgHdr::new(5, 2);
        let (parsed, rest) = GenlMsgHdr::split(hdr.as_bytes()).unwrap();
        assert_eq!(parsed, hdr);
        assert!(rest.is_empty());
    }
}
