//! Two-phase fetch of kernel-sized records.
//!
//! Register dumps, EEPROM reads, string tables, statistics and self-test
//! results end in an array whose length only the kernel knows. The length
//! is queried first (`GDRVINFO` or `GSSET_INFO`), then a buffer of header
//! plus payload is allocated and the real request is issued.
//! [`IoctlSocket::fetch_sized`] is the only entry point, so the query
//! step cannot be skipped.

use super::wire::{SizedHeader, SsetInfo};
use super::{IoctlSocket, LegacyOp, op};
use crate::error::{Error, Result};
use crate::types::DriverInfo;

/// Largest buffer a sized fetch will allocate.
pub const MAX_SIZED_BUFFER: usize = 16 * 1024 * 1024;

/// String set ids for `GSTRINGS` / `GSSET_INFO`.
pub const ETH_SS_TEST: u32 = 0;
pub const ETH_SS_STATS: u32 = 1;

/// Driver-info field that reports an array length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrvLen {
    RegDump,
    Eeprom,
    TestInfo,
    Stats,
}

impl DrvLen {
    fn of(self, info: &DriverInfo) -> u32 {
        match self {
            DrvLen::RegDump => info.regdump_len,
            DrvLen::Eeprom => info.eedump_len,
            DrvLen::TestInfo => info.testinfo_len,
            DrvLen::Stats => info.n_stats,
        }
    }
}

/// Where the array length comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeSource {
    /// A `GDRVINFO` field.
    DrvInfo(DrvLen),
    /// `GSSET_INFO` for a string set, falling back to a `GDRVINFO` field
    /// on drivers without it.
    StringSet { set: u32, fallback: DrvLen },
}

/// A sized request.
#[derive(Debug, Clone, Copy)]
pub struct SizedRequest {
    pub op: LegacyOp,
    pub header: SizedHeader,
    pub size: SizeSource,
    /// Caller's element limit; the kernel length still caps it.
    pub limit: Option<u32>,
}

/// Reply of a sized request.
#[derive(Debug)]
pub struct SizedReply {
    pub header: SizedHeader,
    /// Header followed by the payload.
    pub buf: Vec<u8>,
    /// Element count the kernel reported back.
    pub len: u32,
}

impl SizedReply {
    /// The array after the header, trimmed to the returned length.
    pub fn payload(&self) -> &[u8] {
        let start = self.header.header_len();
        let end = (start + self.len as usize * self.header.elem_size()).min(self.buf.len());
        &self.buf[start..end]
    }

    /// A header word, see [`SizedHeader::word`].
    pub fn word(&self, off: usize) -> Result<u32> {
        SizedHeader::word(&self.buf, off)
    }
}

impl IoctlSocket {
    /// Query the array length for `req`, then fetch it.
    pub fn fetch_sized(&self, req: &SizedRequest) -> Result<SizedReply> {
        let kernel_len = self.query_size(req.size)?;
        let len = match (req.header, req.limit) {
            // An EEPROM read never runs past the end of the EEPROM.
            (SizedHeader::Eeprom { offset, .. }, limit) => {
                let room = kernel_len.saturating_sub(offset);
                limit.map_or(room, |l| l.min(room))
            }
            (_, Some(limit)) => limit.min(kernel_len),
            (_, None) => kernel_len,
        };
        tracing::debug!(op = req.op.name, len, "sized fetch");
        self.fetch(req, len)
    }

    fn query_size(&self, source: SizeSource) -> Result<u32> {
        match source {
            SizeSource::DrvInfo(field) => Ok(field.of(&self.get_driver_info()?)),
            SizeSource::StringSet { set, fallback } => match self.string_set_len(set) {
                Ok(Some(len)) => Ok(len),
                Ok(None) => Ok(0),
                Err(e) if e.is_not_supported() => {
                    tracing::debug!(set, "GSSET_INFO not supported, using driver info");
                    Ok(fallback.of(&self.get_driver_info()?))
                }
                Err(e) => Err(e),
            },
        }
    }

    fn string_set_len(&self, set: u32) -> Result<Option<u32>> {
        let mut buf = vec![0u8; SsetInfo::SIZE];
        SsetInfo::encode(op::GSSET_INFO.cmd, set, &mut buf);
        self.request(op::GSSET_INFO, &mut buf)?;
        SsetInfo::decode(&buf, set)
    }

    fn fetch(&self, req: &SizedRequest, len: u32) -> Result<SizedReply> {
        let total = buffer_len(req.op, req.header, len)?;
        let mut buf = Vec::new();
        buf.try_reserve_exact(total).map_err(|_| Error::Alloc {
            what: req.op.name,
            requested: total,
        })?;
        buf.resize(total, 0);

        req.header.encode(req.op.cmd, len, &mut buf);
        self.request(req.op, &mut buf)?;
        let len = req.header.returned_len(&buf)?.min(len);

        Ok(SizedReply {
            header: req.header,
            buf,
            len,
        })
    }
}

/// Header plus `len` elements, refused above [`MAX_SIZED_BUFFER`].
fn buffer_len(op: LegacyOp, header: SizedHeader, len: u32) -> Result<usize> {
    (len as usize)
        .checked_mul(header.elem_size())
        .and_then(|n| n.checked_add(header.header_len()))
        .filter(|n| *n <= MAX_SIZED_BUFFER)
        .ok_or(Error::Alloc {
            what: op.name,
            requested: (len as usize).saturating_mul(header.elem_size()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_trimmed_to_returned_len() {
        let header = SizedHeader::Regs;
        let mut buf = vec![0u8; 12 + 8];
        header.encode(op::GREGS.cmd, 8, &mut buf);
        buf[12..20].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let reply = SizedReply {
            header,
            buf,
            len: 5,
        };
        assert_eq!(reply.payload(), &[1, 2, 3, 4, 5]);
        assert_eq!(reply.word(8).unwrap(), 8);
    }

    #[test]
    fn oversized_lengths_are_refused() {
        assert_eq!(buffer_len(op::GSTATS, SizedHeader::Stats, 4).unwrap(), 8 + 32);
        let err = buffer_len(op::GSTATS, SizedHeader::Stats, 4 * 1024 * 1024).unwrap_err();
        assert!(matches!(
            err,
            Error::Alloc {
                what: "ETHTOOL_GSTATS",
                ..
            }
        ));
        assert!(buffer_len(op::GREGS, SizedHeader::Regs, u32::MAX).is_err());
    }

    #[test]
    fn drvinfo_fields() {
        let info = DriverInfo {
            n_stats: 3,
            testinfo_len: 4,
            eedump_len: 256,
            regdump_len: 1024,
            ..Default::default()
        };
        assert_eq!(DrvLen::RegDump.of(&info), 1024);
        assert_eq!(DrvLen::Eeprom.of(&info), 256);
        assert_eq!(DrvLen::TestInfo.of(&info), 4);
        assert_eq!(DrvLen::Stats.of(&info), 3);
    }
}
