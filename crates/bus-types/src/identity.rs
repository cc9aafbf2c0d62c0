//! # Identity
//!
//! Process-unique identifiers for bus instances and per-publish tokens.
//!
//! Both are short base36 strings. A `BusId` carries the namespace as a
//! prefix (`SmartComposition.k3j9...`) so foreign broadcasts are easy to
//! tell apart when inspecting a shared transport.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of random base36 characters in generated ids and tokens.
pub const RANDOM_SUFFIX_LEN: usize = 17;

/// Generate `len` random base36 characters (`0-9a-z`).
#[must_use]
pub fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .filter_map(|_| std::char::from_digit(rng.gen_range(0..36), 36))
        .collect()
}

/// Identifier of one bus instance, stable for the instance's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusId(String);

impl BusId {
    /// Generate a fresh id under `namespace`.
    #[must_use]
    pub fn generate(namespace: &str) -> Self {
        Self(format!("{namespace}.{}", random_base36(RANDOM_SUFFIX_LEN)))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace portion (everything before the last `.`).
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.0.rsplit_once('.').map(|(ns, _)| ns)
    }
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BusId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BusId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Random per-publish identifier used for duplicate and loop suppression.
///
/// Tokens are not correlation ids: a publisher only reuses one when it
/// deliberately rebroadcasts a message it already sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Generate a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(random_base36(RANDOM_SUFFIX_LEN))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty tokens are treated the same as a missing token.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_base36_alphabet() {
        let s = random_base36(64);
        assert_eq!(s.len(), 64);
        assert!(s.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_bus_id_has_namespace_prefix() {
        let id = BusId::generate("SmartComposition");
        assert!(id.as_str().starts_with("SmartComposition."));
        assert_eq!(id.as_str().len(), "SmartComposition.".len() + RANDOM_SUFFIX_LEN);
        assert_eq!(id.namespace(), Some("SmartComposition"));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = BusId::generate("ns");
        let b = BusId::generate("ns");
        assert_ne!(a, b);
        assert_ne!(Token::generate(), Token::generate());
    }

    #[test]
    fn test_token_serializes_as_plain_string() {
        let token = Token::from("abc123");
        assert_eq!(serde_json::to_value(&token).unwrap(), serde_json::json!("abc123"));
    }
}
