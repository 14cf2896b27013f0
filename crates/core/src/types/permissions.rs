//! Per-capability permission overrides for back-office accounts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A sparse map of capability name to grant flag.
///
/// Permissions are layered on top of [`crate::Role`] for finer-grained
/// back-office access (e.g. `orders`, `pos`). They are persisted as
/// serialized JSON text; corrupted or missing text degrades to an empty
/// map rather than failing the lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(BTreeMap<String, bool>);

impl Permissions {
    /// An empty permission set (nothing granted beyond the role default).
    #[must_use]
    pub const fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// A permission set granting every listed capability.
    #[must_use]
    pub fn all_granted(capabilities: &[&str]) -> Self {
        Self(
            capabilities
                .iter()
                .map(|c| ((*c).to_owned(), true))
                .collect(),
        )
    }

    /// Parse from serialized text, degrading to empty on any parse failure.
    #[must_use]
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        raw.and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default()
    }

    /// Whether a capability is explicitly granted.
    #[must_use]
    pub fn is_granted(&self, capability: &str) -> bool {
        self.0.get(capability).copied().unwrap_or(false)
    }

    /// Set a capability flag.
    pub fn set(&mut self, capability: impl Into<String>, granted: bool) {
        self.0.insert(capability.into(), granted);
    }

    /// Serialize for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn to_stored(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    /// Whether no capabilities are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lenient_valid() {
        let perms = Permissions::parse_lenient(Some(r#"{"orders":true,"pos":false}"#));
        assert!(perms.is_granted("orders"));
        assert!(!perms.is_granted("pos"));
        assert!(!perms.is_granted("unknown"));
    }

    #[test]
    fn test_parse_lenient_corrupt_degrades_to_empty() {
        assert!(Permissions::parse_lenient(Some("not json")).is_empty());
        assert!(Permissions::parse_lenient(Some("[1,2,3]")).is_empty());
        assert!(Permissions::parse_lenient(None).is_empty());
    }

    #[test]
    fn test_all_granted() {
        let perms = Permissions::all_granted(&["orders", "pos"]);
        assert!(perms.is_granted("orders"));
        assert!(perms.is_granted("pos"));
    }

    #[test]
    fn test_stored_round_trip() {
        let mut perms = Permissions::empty();
        perms.set("orders", true);
        let stored = perms.to_stored().unwrap();
        assert_eq!(Permissions::parse_lenient(Some(&stored)), perms);
    }
}
