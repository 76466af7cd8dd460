pub mod attributes;
pub mod client;
pub mod credentials;
pub mod diagnostics;
pub mod error;
pub mod mapping;
pub mod request;
pub mod response;

pub use attributes::JsonAttributeProvider;
pub use credentials::JsonCredentialProvider;
pub use diagnostics::{Diagnostic, DiagnosticsSink, RecordingDiagnostics, TracingDiagnostics};
pub use error::DomainError;
