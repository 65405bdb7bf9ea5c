//! Configuration fingerprint value object
//!
//! A SHA-256 digest of a declaration's declared configuration. Recorded in
//! the deployment state so a re-run can tell whether the declaration changed
//! since it last converged.

use std::fmt;

use sha2::{Digest, Sha256};

/// Fingerprint of declared configuration
///
/// Wraps a SHA-256 hex string with the `sha256:` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Prefix for SHA-256 fingerprints
    pub const PREFIX: &'static str = "sha256:";

    /// Wrap an existing fingerprint string (with or without prefix)
    pub fn new(raw: &str) -> Self {
        if raw.starts_with(Self::PREFIX) {
            Self(raw.to_string())
        } else {
            Self(format!("{}{}", Self::PREFIX, raw))
        }
    }

    /// Compute the fingerprint of a canonical byte rendering
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        Self(format!("{}{:x}", Self::PREFIX, digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Just the hex part without prefix
    pub fn hex(&self) -> &str {
        self.0.strip_prefix(Self::PREFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Format the first 16 bytes of a SHA-256 digest of `parts` as a GUID.
///
/// Parts are joined with `|` so that `("ab", "c")` and `("a", "bc")` differ.
pub fn deterministic_guid(parts: &[&str]) -> String {
    let digest = Sha256::digest(parts.join("|").as_bytes());
    let hex = format!("{:x}", digest);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_adds_prefix_if_missing() {
        assert_eq!(Fingerprint::new("abc123").as_str(), "sha256:abc123");
        assert_eq!(Fingerprint::new("sha256:abc123").as_str(), "sha256:abc123");
    }

    #[test]
    fn from_bytes_computes_sha256() {
        let fp = Fingerprint::from_bytes(b"hello");
        assert_eq!(
            fp.hex(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn guid_is_stable_and_shaped() {
        let a = deterministic_guid(&["scope", "principal", "role"]);
        let b = deterministic_guid(&["scope", "principal", "role"]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 36);
        assert_eq!(a.matches('-').count(), 4);
    }

    #[test]
    fn guid_separator_prevents_ambiguity() {
        assert_ne!(
            deterministic_guid(&["ab", "c"]),
            deterministic_guid(&["a", "bc"])
        );
    }
}
