//! Identifier utilities.
//!
//! Contract records, change records and documents are addressed by a *canonical* identifier:
//! **32 lowercase hexadecimal characters** (a v4 UUID without hyphens). Access tokens handed
//! out to owners use the same shape.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! [`HexId::parse`] also accepts uppercase digits and normalises them. Hyphenated, wrong
//! length and non-hex values are rejected.

mod id;

pub use id::HexId;

/// Error type for identifier operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
