//! Provider traits implemented by data-access plugins.
//!
//! A host delegates attribute lookups and password operations to these
//! traits. Implementations hold only immutable configuration and may be
//! shared across concurrent callers.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::DataAccessError;
use crate::models::{AccountAttributes, AttributeTable, AuthenticationAttributes, SubjectAttributes};

/// Looks up the attributes of a subject.
///
/// "Not found" and unusable backend responses are not errors: they yield an
/// empty [`AttributeTable`].
#[async_trait]
pub trait AttributeDataAccessProvider: Send + Sync {
    /// Fetch the attributes of a bare subject, without any known attributes.
    ///
    /// # Errors
    ///
    /// - `Transport` if the backend could not be reached
    /// - `Internal` for unexpected errors
    async fn get_attributes(&self, subject: &str) -> Result<AttributeTable, DataAccessError>;

    /// Fetch the attributes of a subject, using its known attributes to
    /// resolve outgoing parameter mappings.
    ///
    /// # Errors
    ///
    /// - `Transport` if the backend could not be reached
    /// - `Internal` for unexpected errors
    async fn get_attributes_for(
        &self,
        subject_attributes: &SubjectAttributes,
    ) -> Result<AttributeTable, DataAccessError>;
}

/// Verifies and updates subject passwords.
#[async_trait]
pub trait CredentialDataAccessProvider: Send + Sync {
    /// Verify a username/password pair.
    ///
    /// Returns `None` when the backend rejects the credentials or its answer
    /// cannot be interpreted. The host treats both as a failed authentication.
    ///
    /// # Errors
    ///
    /// - `Transport` if the backend could not be reached
    /// - `Internal` for unexpected errors
    async fn verify_password(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Option<AuthenticationAttributes>, DataAccessError>;

    /// Store a new password for the account.
    ///
    /// The outcome reported by the backend is only observable through
    /// diagnostics. An account without a password is ignored.
    ///
    /// # Errors
    ///
    /// - `Transport` if the backend could not be reached
    /// - `Internal` for unexpected errors
    async fn update_password(&self, account: &AccountAttributes) -> Result<(), DataAccessError>;

    /// Whether the backend checks the password itself.
    ///
    /// When `false`, the host must compare the returned password attribute on
    /// its own.
    fn custom_query_verifies_password(&self) -> bool;
}
