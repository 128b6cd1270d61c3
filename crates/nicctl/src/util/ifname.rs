//! Interface name utilities.

/// Maximum interface name length (including null terminator).
pub const IFNAMSIZ: usize = 16;

/// Error type for interface names.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IfError {
    #[error("invalid interface name: {0}")]
    InvalidName(String),
}

pub type Result<T> = std::result::Result<T, IfError>;

/// Validate an interface name.
pub fn validate(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(IfError::InvalidName("empty name".to_string()));
    }

    if name.len() >= IFNAMSIZ {
        return Err(IfError::InvalidName(format!(
            "name too long (max {} chars)",
            IFNAMSIZ - 1
        )));
    }

    if name.contains('/') || name.contains('\0') {
        return Err(IfError::InvalidName(
            "name contains invalid characters".to_string(),
        ));
    }

    if name.chars().any(|c| c.is_whitespace()) {
        return Err(IfError::InvalidName("name contains whitespace".to_string()));
    }

    Ok(())
}

/// Copy a validated name into a NUL-terminated `ifr_name` buffer.
pub fn to_ifr_name(name: &str) -> Result<[libc::c_char; IFNAMSIZ]> {
    validate(name)?;
    let mut buf = [0 as libc::c_char; IFNAMSIZ];
    for (dst, src) in buf.iter_mut().zip(name.bytes()) {
        *dst = src as libc::c_char;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(validate("eth0").is_ok());
        assert!(validate("enp3s0f1").is_ok());
        assert!(validate("").is_err());
        assert!(validate("a-very-long-ifname").is_err());
        assert!(validate("eth/0").is_err());
        assert!(validate("eth 0").is_err());
    }

    #[test]
    fn test_to_ifr_name() {
        let buf = to_ifr_name("eth0").unwrap();
        assert_eq!(buf[..5].iter().map(|c| *c as u8).collect::<Vec<_>>(), b"eth0\0");
        assert!(to_ifr_name("-s").is_ok());
    }
}
