//! Attribute lookup against the JSON backend.

use std::sync::Arc;

use data_access_sdk::{AttributeTable, SubjectAttributes};
use tracing::instrument;

use super::diagnostics::DiagnosticsSink;
use super::error::DomainError;
use super::mapping::{ParameterResolver, RequestParameters, encode_for};
use super::request::{RequestDescriptor, attribute_lookup_request, substitute};
use super::response::attributes_from;
use crate::config::{AttributesConfig, ProvideAs, ProvideSubject, SUBJECT_PLACEHOLDER};
use crate::transport::HttpTransport;

/// Looks up subject attributes with a GET request.
///
/// Holds only immutable configuration; safe to share between callers.
pub struct JsonAttributeProvider {
    provide_subject: ProvideSubject,
    resolver: ParameterResolver,
    transport: Arc<dyn HttpTransport>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl JsonAttributeProvider {
    #[must_use]
    pub fn new(
        config: &AttributesConfig,
        transport: Arc<dyn HttpTransport>,
        diagnostics: Arc<dyn DiagnosticsSink>,
    ) -> Self {
        Self {
            provide_subject: config.provide_subject.clone(),
            resolver: ParameterResolver::from_config(&config.parameter_mappings),
            transport,
            diagnostics,
        }
    }

    /// Path of the lookup request.
    ///
    /// With url-path provisioning every `:subject` is replaced by the
    /// url-encoded subject. With parameter provisioning the configured path
    /// is used unchanged.
    #[must_use]
    pub fn create_request_path(&self, subject: &str) -> String {
        match &self.provide_subject {
            ProvideSubject::UrlPath(template) => substitute(template, SUBJECT_PLACEHOLDER, subject),
            ProvideSubject::Parameter(param) => param.url_path.clone(),
        }
    }

    #[must_use]
    pub fn create_query_parameters(&self, subject: &SubjectAttributes) -> RequestParameters {
        self.create_parameters(subject, ProvideAs::QueryParameter)
    }

    #[must_use]
    pub fn create_header_parameters(&self, subject: &SubjectAttributes) -> RequestParameters {
        self.create_parameters(subject, ProvideAs::HeaderParameter)
    }

    /// Subject parameter followed by the mapped parameters, when parameter
    /// provisioning is configured for `placement`. Empty otherwise, so each
    /// parameter lands in exactly one place.
    fn create_parameters(
        &self,
        subject: &SubjectAttributes,
        placement: ProvideAs,
    ) -> RequestParameters {
        let mut params = RequestParameters::new();

        let ProvideSubject::Parameter(param) = &self.provide_subject else {
            return params;
        };
        if param.provide_as != placement {
            return params;
        }

        params.insert(
            param.username_parameter.as_str(),
            encode_for(placement, subject.subject()),
        );
        self.resolver
            .resolve_into(&mut params, subject, placement, self.diagnostics.as_ref());
        params
    }

    #[must_use]
    pub fn build_request(&self, subject: &SubjectAttributes) -> RequestDescriptor {
        attribute_lookup_request(
            self.create_request_path(subject.subject()),
            self.create_query_parameters(subject),
            self.create_header_parameters(subject),
        )
    }

    /// Fetch the attributes of a subject.
    ///
    /// Returns an empty table when the backend reports an error status or
    /// its body yields no attributes.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Transport`] if the request could not be sent.
    #[instrument(skip_all, fields(subject = %subject.subject()))]
    pub async fn get_attributes(
        &self,
        subject: &SubjectAttributes,
    ) -> Result<AttributeTable, DomainError> {
        let request = self.build_request(subject);
        let response = self.transport.send(&request).await?;

        Ok(attributes_from(&response, self.diagnostics.as_ref())
            .map_or_else(AttributeTable::empty, AttributeTable::single))
    }
}
