//! Error types shared by both transports.

use std::io;

/// Result type for nicctl operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the kernel.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Kernel returned an error code over netlink.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Kernel error with operation context.
    #[error("{operation}: {message} (errno {errno})")]
    KernelWithContext {
        /// The operation that failed.
        operation: String,
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// A legacy `SIOCETHTOOL` request failed.
    #[error("{op}: {source}")]
    Ioctl {
        /// Name of the legacy operation (e.g. `ETHTOOL_GSET`).
        op: &'static str,
        /// The OS error reported by `ioctl(2)`.
        #[source]
        source: io::Error,
    },

    /// Message was truncated.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected message length.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// Invalid message format.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid attribute format.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Sequence number mismatch.
    #[error("sequence mismatch: expected {expected}, got {actual}")]
    SequenceMismatch {
        /// Expected sequence number.
        expected: u32,
        /// Actual sequence number received.
        actual: u32,
    },

    /// The selected transport cannot carry this operation.
    ///
    /// This is the soft signal the negotiator uses to fall back to the
    /// legacy transport; it never means the driver lacks the feature.
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// Generic netlink family is not registered.
    #[error("generic netlink family not found: {name}")]
    FamilyNotFound {
        /// Family name that was looked up.
        name: String,
    },

    /// Interface not found.
    #[error("interface not found: {name}")]
    InterfaceNotFound {
        /// The interface name that was not found.
        name: String,
    },

    /// A kernel-reported length cannot be allocated.
    #[error("cannot allocate {requested} bytes for {what}")]
    Alloc {
        /// What the buffer was meant to hold.
        what: &'static str,
        /// Requested size in bytes.
        requested: usize,
    },
}

impl Error {
    /// Create a kernel error from a (negative) netlink errno value.
    pub fn from_errno(errno: i32) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::Kernel {
            errno: -errno,
            message,
        }
    }

    /// Create a legacy transport error from the last OS error.
    pub fn ioctl(op: &'static str, source: io::Error) -> Self {
        Self::Ioctl { op, source }
    }

    /// Add context to this error.
    ///
    /// Wraps kernel errors with operation context. Other errors are returned unchanged.
    pub fn with_context(self, operation: impl Into<String>) -> Self {
        match self {
            Self::Kernel { errno, message } => Self::KernelWithContext {
                operation: operation.into(),
                errno,
                message,
            },
            other => other,
        }
    }

    /// Get the errno value if the kernel rejected the request.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => Some(*errno),
            Self::Ioctl { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }

    /// Check whether the driver or kernel reported `EOPNOTSUPP`.
    pub fn is_not_supported(&self) -> bool {
        self.errno() == Some(libc::EOPNOTSUPP)
    }

    /// Check whether this is the soft "transport cannot do it" signal.
    pub fn is_soft_unsupported(&self) -> bool {
        matches!(self, Self::NotSupported(_) | Self::FamilyNotFound { .. })
    }

    /// Check if this is a "not found" error (ENOENT, ENODEV, etc.).
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::InterfaceNotFound { .. } => true,
            other => matches!(other.errno(), Some(libc::ENOENT) | Some(libc::ENODEV)),
        }
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.errno(), Some(libc::EPERM) | Some(libc::EACCES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_errno() {
        let err = Error::from_errno(-libc::EPERM);
        assert!(err.is_permission_denied());
        assert_eq!(err.errno(), Some(1));
    }

    #[test]
    fn test_with_context() {
        let err = Error::from_errno(-libc::EACCES).with_context("setting rings on eth0");
        assert!(err.is_permission_denied());
        assert!(err.to_string().contains("setting rings on eth0"));
    }

    #[test]
    fn test_ioctl_not_supported() {
        let err = Error::ioctl(
            "ETHTOOL_GWOL",
            io::Error::from_raw_os_error(libc::EOPNOTSUPP),
        );
        assert!(err.is_not_supported());
        assert!(!err.is_soft_unsupported());
        assert!(err.to_string().starts_with("ETHTOOL_GWOL: "));
    }

    #[test]
    fn test_soft_unsupported() {
        assert!(Error::NotSupported("netlink disabled".into()).is_soft_unsupported());
        assert!(
            Error::FamilyNotFound {
                name: "ethtool".into()
            }
            .is_soft_unsupported()
        );
        assert!(!Error::from_errno(-libc::EOPNOTSUPP).is_soft_unsupported());
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::from_errno(-libc::ENODEV).is_not_found());
        assert!(
            Error::InterfaceNotFound {
                name: "eth9".into()
            }
            .is_not_found()
        );
        assert!(!Error::from_errno(-libc::EBUSY).is_not_found());
    }
}
