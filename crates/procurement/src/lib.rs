//! Shared procurement API primitives.
//!
//! This crate holds the building blocks that every procurement resource (tenders, contracts,
//! plans) is assembled from:
//! - common value types (`Value`, `Period`, `Address`, `Identifier`, ...)
//! - role tables and the projection that filters a serialised record per requester role
//! - the validation error collection and strict wire parsing with field paths
//! - data-patch merging and the revision diff used for audit history
//!
//! Resource-specific models and lifecycle rules live in the resource crates (for example
//! `contracting-core`).

pub mod data_types;
pub mod patch;
pub mod roles;
pub mod validation;

pub use data_types::{
    Address, Classification, Coordinate, Identifier, Location, Period, Unit, Value,
    DEFAULT_CURRENCY,
};
pub use patch::{apply_data_patch, apply_patch_ops, make_patch, PatchOp, Revision};
pub use roles::{FieldFilter, ModelSchema, Role};
pub use validation::{from_document, ErrorEntry, FieldPath, Validate, ValidationErrors};

/// Errors returned by the `procurement` crate.
#[derive(Debug, thiserror::Error)]
pub enum ProcurementError {
    #[error("role '{role}' is not defined for {model}")]
    RoleNotDefined { model: &'static str, role: Role },

    #[error("unknown role: {0}")]
    InvalidRole(String),

    #[error("cannot apply patch: {0}")]
    InvalidPatch(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Results that can fail with a [`ProcurementError`].
pub type ProcurementResult<T> = Result<T, ProcurementError>;
