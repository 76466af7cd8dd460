//! Diagnostics emitted while building requests and reading responses.
//!
//! Components never log directly; they report a [`Diagnostic`] to the
//! [`DiagnosticsSink`] they were constructed with. Production wiring uses
//! [`TracingDiagnostics`], tests use [`RecordingDiagnostics`].

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

/// Why an attribute lookup mapping produced no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The subject has no attribute of that name.
    AttributeNotFound,
    /// The attribute value is not a JSON primitive.
    NotPrimitive,
}

/// Something worth reporting about a single backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// An attribute lookup mapping resolved to a value.
    ParameterMapped { parameter: String },
    /// An attribute lookup mapping was omitted from the request.
    ParameterSkipped {
        parameter: String,
        attribute: String,
        reason: SkipReason,
    },
    /// The backend answered with a status code.
    ResponseStatus { status: u16 },
    /// The response had no `Content-Type`; parsing is attempted anyway.
    MissingContentType,
    /// The response `Content-Type` is not JSON; parsing is attempted anyway.
    UnexpectedContentType { content_types: String },
    /// Non-2xx response; the body is kept for troubleshooting only.
    UnsuccessfulResponse { status: u16, body: Option<String> },
    /// 2xx response without a body.
    EmptySuccessBody,
    /// 2xx response whose body is not a JSON object.
    MalformedJson { error: String, body: String },
    /// Password update requested for an account without a password.
    PasswordUpdateSkipped { username: String },
    /// Backend reported a successful password update.
    PasswordUpdated { username: String },
    /// Backend reported a failed password update.
    PasswordUpdateFailed {
        username: String,
        status: u16,
        body: Option<String>,
    },
    /// The credential path template substitutes `:password` although the
    /// password is withheld from the request parameters.
    PasswordInPathWithheld { url_path: String },
}

/// Receiver of diagnostics. Implementations must be cheap and non-blocking.
pub trait DiagnosticsSink: Send + Sync {
    /// Report one diagnostic. Never fails.
    fn record(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn record(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::ParameterMapped { parameter } => {
                debug!(parameter = %parameter, "Mapped parameter from subject attribute");
            }
            Diagnostic::ParameterSkipped {
                parameter,
                attribute,
                reason,
            } => {
                debug!(
                    parameter = %parameter,
                    attribute = %attribute,
                    reason = ?reason,
                    "Could not map attribute, parameter omitted"
                );
            }
            Diagnostic::ResponseStatus { status } => {
                debug!(status, "JSON data-source responded");
            }
            Diagnostic::MissingContentType => {
                debug!(
                    "JSON data-source did not provide a Content-Type header, \
                     will attempt to parse the response as JSON"
                );
            }
            Diagnostic::UnexpectedContentType { content_types } => {
                debug!(
                    content_type = %content_types,
                    "JSON data-source provided an unexpected Content-Type, \
                     will attempt to parse the response as JSON"
                );
            }
            Diagnostic::UnsuccessfulResponse { status, body } => match body {
                Some(body) => debug!(status, body = %body, "Unsuccessful response from JSON data-source"),
                None => debug!(status, "No response body from JSON data-source"),
            },
            Diagnostic::EmptySuccessBody => {
                warn!(
                    "Received successful JSON response without response body, \
                     the JSON data-source answer is inconsistent"
                );
            }
            Diagnostic::MalformedJson { error, body } => {
                warn!(error = %error, body = %body, "Could not parse JSON response from data-source");
            }
            Diagnostic::PasswordUpdateSkipped { username } => {
                warn!(username = %username, "Cannot update account password, missing password value");
            }
            Diagnostic::PasswordUpdated { username } => {
                debug!(username = %username, "Update password request reported success");
            }
            Diagnostic::PasswordUpdateFailed {
                username,
                status,
                body,
            } => {
                info!(username = %username, status, "Update password request reported failure");
                match body {
                    Some(body) => trace!(body = %body, "Message returned in response body"),
                    None => trace!("No message returned in response body"),
                }
            }
            Diagnostic::PasswordInPathWithheld { url_path } => {
                warn!(
                    url_path = %url_path,
                    "Credential url_path contains :password while backend_verifies_password \
                     is false; the password will still be substituted into the request path"
                );
            }
        }
    }
}

/// Keeps diagnostics in memory.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<Diagnostic> {
        self.events.lock().clone()
    }

    /// Drain recorded diagnostics.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.events.lock())
    }

    #[must_use]
    pub fn contains(&self, diagnostic: &Diagnostic) -> bool {
        self.events.lock().contains(diagnostic)
    }
}

impl DiagnosticsSink for RecordingDiagnostics {
    fn record(&self, diagnostic: Diagnostic) {
        self.events.lock().push(diagnostic);
    }
}
