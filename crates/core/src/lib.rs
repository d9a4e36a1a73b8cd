//! # Contracting Core
//!
//! Core business logic for procurement contracts.
//!
//! This crate contains the contract record tree and the rules around it:
//! - models for contracts, changes, documents, items and parties, with field-level validation
//! - role tables deciding which fields each requester sees and may write
//! - local roles and ACLs deciding which operations a requester may run
//! - the lifecycle service that creates contracts and applies updates with revision history
//!
//! **No transport concerns**: routing, persistence, authentication and attachment storage
//! belong to the hosting framework. Operations take a parsed [`Requester`] and a [`Contract`]
//! value and hand back the updated value.

pub mod access;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod roles;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use access::{AclEntry, AuthenticatedRole, LocalRole, Permission, Requester};
pub use config::CoreConfig;
pub use error::{ContractingError, ContractingResult};
pub use models::{Change, Contract, ContractStatus, Document};
pub use service::{AccessGrant, ContractService, Credentials};

pub use procurement::Role;
