//! Canonical hex identifier implementation.

use crate::{UuidError, UuidResult};
use std::{fmt, str::FromStr};

use ::uuid::Uuid;

/// Canonical record identifier (32 lowercase hex characters, no hyphens).
///
/// Once constructed the contained UUID is guaranteed to render in canonical form, so the value
/// can be compared, hashed and embedded in principals without normalisation.
///
/// # Construction
/// - [`HexId::new`] generates a fresh random identifier (record ids, owner tokens).
/// - [`HexId::parse`] validates an externally supplied identifier and lowercases it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexId(Uuid);

impl Default for HexId {
    fn default() -> Self {
        Self::new()
    }
}

impl HexId {
    /// Generates a new random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a 32 character hex identifier in either case.
    ///
    /// Uppercase digits are accepted and rendered back in canonical lowercase. Hyphenated
    /// spellings are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not 32 hex characters.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if input.len() != 32 || !input.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(UuidError::InvalidInput(format!(
                "Hash value is wrong length or contains non hex characters: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(format!("{input}: {e}")))
    }

    /// Returns true if `input` is exactly 32 lowercase hex characters.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl fmt::Display for HexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for HexId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HexId::parse(s)
    }
}

impl PartialEq<str> for HexId {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for HexId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for HexId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        HexId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_canonical_id() {
        let id = HexId::new();
        let rendered = id.to_string();

        assert_eq!(rendered.len(), 32);
        assert!(HexId::is_canonical(&rendered));
    }

    #[test]
    fn test_new_ids_differ() {
        assert_ne!(HexId::new(), HexId::new());
    }

    #[test]
    fn test_parse_valid_canonical_id() {
        let canonical = "550e8400e29b41d4a716446655440000";
        let id = HexId::parse(canonical).expect("canonical id parses");

        assert_eq!(id.to_string(), canonical);
        assert!(id == *canonical);
    }

    #[test]
    fn test_parse_rejects_non_canonical_forms() {
        let cases = [
            "550e8400-e29b-41d4-a716-446655440000",
            "550e8400e29b41d4a71644665544000",
            "550e8400e29b41d4a7164466554400000",
            "550e8400e29b41d4a716446655440zzz",
            "",
        ];
        for case in cases {
            match HexId::parse(case) {
                Err(UuidError::InvalidInput(msg)) => {
                    assert!(msg.contains("wrong length or contains non hex"))
                }
                other => panic!("expected InvalidInput for {case:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_lowercases_uppercase_ids() {
        let upper = "C6C6E8ED4B1542E4BF13D3F98EC5AB59";
        assert!(!HexId::is_canonical(upper));

        let id = HexId::parse(upper).expect("uppercase hex parses");
        assert_eq!(id.to_string(), "c6c6e8ed4b1542e4bf13d3f98ec5ab59");
        assert_eq!(id, HexId::parse(&upper.to_lowercase()).unwrap());
    }

    #[test]
    fn test_from_str_matches_parse() {
        let id: HexId = "00000000000000000000000000000001".parse().expect("parse");
        assert_eq!(id, HexId::parse("00000000000000000000000000000001").unwrap());
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let id = HexId::parse("ffffffffffffffffffffffffffffffff").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"ffffffffffffffffffffffffffffffff\"");

        let err = serde_json::from_str::<HexId>("\"not-hex\"").expect_err("rejects");
        assert!(err.to_string().contains("non hex characters"));
    }
}
