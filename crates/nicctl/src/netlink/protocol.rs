//! Protocol state types for strongly-typed connections.
//!
//! Each generic netlink family that the crate speaks gets a state type
//! carrying what was learned while resolving it. [`Connection`] is
//! parameterised over that state so family-specific methods only exist
//! on connections that resolved the family.
//!
//! The [`ProtocolState`] trait is sealed to prevent external implementations.
//!
//! [`Connection`]: super::connection::Connection

use std::collections::HashMap;
use std::sync::Mutex;

use super::genl::FamilyInfo;
use super::genl::ethtool::StringSet;

/// Sealed trait module to prevent external implementations.
mod private {
    pub trait Sealed {}
}

/// Protocol state trait for typed connections.
///
/// This trait is sealed and cannot be implemented outside this crate.
pub trait ProtocolState: private::Sealed {
    /// Generic netlink family name this state was resolved from.
    const FAMILY: &'static str;

    /// The resolved family.
    fn family(&self) -> &FamilyInfo;
}

/// Cache key for string sets: optional device scope plus set id.
pub(crate) type StrsetKey = (Option<String>, u32);

/// Ethtool generic netlink state.
///
/// Holds the resolved family (id, multicast groups, advertised
/// operations) and the string sets fetched during this invocation.
pub struct Ethtool {
    pub(crate) family: FamilyInfo,
    pub(crate) strsets: Mutex<HashMap<StrsetKey, StringSet>>,
}

impl Ethtool {
    pub(crate) fn new(family: FamilyInfo) -> Self {
        Self {
            family,
            strsets: Mutex::new(HashMap::new()),
        }
    }
}

impl std::fmt::Debug for Ethtool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ethtool")
            .field("family", &self.family)
            .field(
                "cached_strsets",
                &self.strsets.lock().map(|c| c.len()).unwrap_or(0),
            )
            .finish()
    }
}

impl private::Sealed for Ethtool {}

impl ProtocolState for Ethtool {
    const FAMILY: &'static str = super::genl::ethtool::ETHTOOL_GENL_NAME;

    fn family(&self) -> &FamilyInfo {
        &self.family
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ethtool_state_starts_with_empty_cache() {
        let state = Ethtool::new(FamilyInfo {
            id: 21,
            ..FamilyInfo::default()
        });
        assert!(state.strsets.lock().unwrap().is_empty());
        assert_eq!(state.family().id, 21);
        assert_eq!(Ethtool::FAMILY, "ethtool");
    }
}
