//! Validated text primitives shared by the contracting crates.
//!
//! These wrappers are checked once, at construction or deserialisation time, so that record
//! types can carry them without re-validating on every use.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty.
    #[error("String value is too short.")]
    Empty,

    /// The input is not shaped like `local@domain`.
    #[error("Not a well formed email address.")]
    MalformedEmail,
}

/// A string of at least one character.
///
/// The text is kept exactly as supplied; whitespace counts towards the length.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText`.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if `input` is empty.
    pub fn new(input: impl Into<String>) -> Result<Self, TextError> {
        let text = input.into();
        if text.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for NonEmptyText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NonEmptyText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(s).map_err(serde::de::Error::custom)
    }
}

/// A contact email address.
///
/// The check is structural only: exactly one `@`, a non-empty local part, and a domain that
/// contains a dot which is neither its first nor its last character. No whitespace is allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parses an email address.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::MalformedEmail`] when the address is not shaped like
    /// `local@domain.tld`.
    pub fn parse(input: &str) -> Result<Self, TextError> {
        if input.chars().any(char::is_whitespace) {
            return Err(TextError::MalformedEmail);
        }

        let (local, domain) = input.split_once('@').ok_or(TextError::MalformedEmail)?;
        if local.is_empty() || domain.contains('@') {
            return Err(TextError::MalformedEmail);
        }

        let dotted = domain
            .find('.')
            .is_some_and(|idx| idx > 0 && !domain.ends_with('.'));
        if !dotted {
            return Err(TextError::MalformedEmail);
        }

        Ok(Self(input.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for EmailAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EmailAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        EmailAddress::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_keeps_original_spacing() {
        let text = NonEmptyText::new("  price went down ").expect("valid text");
        assert_eq!(text.as_str(), "  price went down ");
    }

    #[test]
    fn non_empty_text_rejects_only_empty_input() {
        assert_eq!(NonEmptyText::new(""), Err(TextError::Empty));
        assert_eq!(NonEmptyText::new(" ").map(|t| t.into_inner()), Ok(" ".to_owned()));
        assert!(NonEmptyText::new(" \t ").is_ok());
    }

    #[test]
    fn non_empty_text_deserialize_reports_short_string() {
        let err = serde_json::from_str::<NonEmptyText>("\"\"").expect_err("blank rejected");
        assert!(err.to_string().contains("String value is too short."));
    }

    #[test]
    fn email_accepts_common_addresses() {
        assert!(EmailAddress::parse("aa@aa.com").is_ok());
        assert!(EmailAddress::parse("first.last+tag@mail.example.org").is_ok());
    }

    #[test]
    fn email_rejects_malformed_addresses() {
        for bad in ["", "plain", "@example.com", "a@b", "a@.com", "a@b.", "a b@c.com", "a@b@c.com"] {
            assert_eq!(
                EmailAddress::parse(bad),
                Err(TextError::MalformedEmail),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn email_round_trips_through_json() {
        let email: EmailAddress = serde_json::from_str("\"aa@aa.com\"").expect("parse");
        assert_eq!(serde_json::to_string(&email).expect("render"), "\"aa@aa.com\"");
    }
}
