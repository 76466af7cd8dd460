//! Outbound HTTP transport.
//!
//! The domain builds a [`RequestDescriptor`] and hands it to an
//! [`HttpTransport`]. Timeouts, TLS and connection reuse live here.

mod http_client;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::request::{RequestDescriptor, TargetError};
use crate::domain::response::ResponseOutcome;

pub use http_client::HyperTransport;

/// Transport failures. The backend never answered, so there is no
/// [`ResponseOutcome`] to interpret.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request target: {0}")]
    InvalidTarget(#[from] TargetError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("backend did not answer within {}", humantime::format_duration(*.0))]
    Timeout(Duration),
}

/// Sends one request and returns the raw reply.
///
/// Any HTTP status is a successful send; only failures to obtain a reply are
/// errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &RequestDescriptor) -> Result<ResponseOutcome, TransportError>;
}
