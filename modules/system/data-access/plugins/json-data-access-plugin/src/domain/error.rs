//! Domain errors for the JSON data-access plugin.

use data_access_sdk::DataAccessError;
use thiserror::Error;

use super::request::RequestBuildError;
use crate::transport::TransportError;

/// Internal domain errors. Only request construction and transport failures
/// exist here; backend content problems are absorbed into empty results.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    RequestBuild(#[from] RequestBuildError),
}

impl From<DomainError> for DataAccessError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Transport(e) => Self::Transport(e.to_string()),
            DomainError::RequestBuild(e) => Self::Internal(e.to_string()),
        }
    }
}
