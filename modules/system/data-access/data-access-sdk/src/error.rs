//! Error types for data-access providers.

use thiserror::Error;

/// Errors that can cross the provider boundary.
///
/// Backend content problems (error statuses, empty or malformed bodies) are
/// not represented here; providers degrade them to empty results.
#[derive(Debug, Error)]
pub enum DataAccessError {
    /// The backend could not be reached or did not answer in time.
    #[error("transport error: {0}")]
    Transport(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}
