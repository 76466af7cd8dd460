#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Data Access SDK
//!
//! This crate provides the host-facing contracts for data-access providers:
//!
//! - [`AttributeDataAccessProvider`] - Looks up the attributes of a subject
//! - [`CredentialDataAccessProvider`] - Verifies and updates passwords
//! - [`Attributes`], [`SubjectAttributes`], [`AttributeTable`] - Attribute models
//! - [`AuthenticationAttributes`], [`AccountAttributes`] - Credential flow models
//! - [`DataAccessError`] - Error types
//!
//! ## Usage
//!
//! Hosts obtain providers from a plugin and call them per request:
//!
//! ```ignore
//! use data_access_sdk::{AttributeDataAccessProvider, CredentialDataAccessProvider};
//!
//! let table = attributes.get_attributes("alice").await?;
//!
//! let password = SecretString::from("secret".to_owned());
//! if let Some(auth) = credentials.verify_password("alice", &password).await? {
//!     // authenticated
//! }
//! ```

pub mod api;
pub mod error;
pub mod models;

// Re-export main types at crate root
pub use api::{AttributeDataAccessProvider, CredentialDataAccessProvider};
pub use error::DataAccessError;
pub use models::{
    AccountAttributes, AttributeTable, Attributes, AuthenticationAttributes, SubjectAttributes,
};
