//! Password verification and update against the JSON backend.

use std::sync::Arc;

use data_access_sdk::{AccountAttributes, Attributes, AuthenticationAttributes, SubjectAttributes};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use super::diagnostics::{Diagnostic, DiagnosticsSink};
use super::error::DomainError;
use super::mapping::RequestParameters;
use super::request::{
    RequestDescriptor, substitute, update_password_request, verify_password_request,
};
use super::response::{attributes_from, has_success_status};
use crate::config::{CredentialAccessConfig, PASSWORD_PLACEHOLDER, SUBJECT_PLACEHOLDER};
use crate::transport::HttpTransport;

/// Verifies and updates passwords.
///
/// When `backend_verifies_password` is off the password is withheld from the
/// request parameters, but a `:password` placeholder in the path template is
/// still substituted. That case is reported once at construction.
pub struct JsonCredentialProvider {
    config: CredentialAccessConfig,
    transport: Arc<dyn HttpTransport>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl JsonCredentialProvider {
    #[must_use]
    pub fn new(
        config: &CredentialAccessConfig,
        transport: Arc<dyn HttpTransport>,
        diagnostics: Arc<dyn DiagnosticsSink>,
    ) -> Self {
        if !config.backend_verifies_password && config.url_path.contains(PASSWORD_PLACEHOLDER) {
            diagnostics.record(Diagnostic::PasswordInPathWithheld {
                url_path: config.url_path.clone(),
            });
        }
        Self {
            config: config.clone(),
            transport,
            diagnostics,
        }
    }

    /// Credential path with `:subject` and `:password` substituted.
    ///
    /// The result may contain the password and must not be logged.
    #[must_use]
    pub fn create_request_path(&self, subject: &str, password: &SecretString) -> String {
        let path = substitute(&self.config.url_path, SUBJECT_PLACEHOLDER, subject);
        substitute(&path, PASSWORD_PLACEHOLDER, password.expose_secret())
    }

    /// Username, then the password when the backend verifies it.
    #[must_use]
    pub fn create_verify_parameters(
        &self,
        username: &str,
        password: &SecretString,
    ) -> RequestParameters {
        let mut params = RequestParameters::new();
        params.insert(self.config.username_parameter.as_str(), username);
        if self.config.backend_verifies_password {
            params.insert(
                self.config.password_parameter.as_str(),
                password.expose_secret(),
            );
        }
        params
    }

    /// # Errors
    ///
    /// Returns [`DomainError::RequestBuild`] if the parameters cannot be
    /// encoded for the configured submission mode.
    pub fn build_verify_request(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<RequestDescriptor, DomainError> {
        let path = self.create_request_path(username, password);
        let params = self.create_verify_parameters(username, password);
        Ok(verify_password_request(
            self.config.submit_as,
            path,
            &params,
        )?)
    }

    /// Verify a password, returning the subject's attributes on success.
    ///
    /// `None` means the backend did not confirm the credentials, or its reply
    /// carried no usable attributes.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] if the request could not be built or sent.
    #[instrument(skip_all, fields(username = %username, submit_as = ?self.config.submit_as))]
    pub async fn verify_password(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Option<AuthenticationAttributes>, DomainError> {
        let request = self.build_verify_request(username, password)?;
        let response = self.transport.send(&request).await?;
        self.diagnostics.record(Diagnostic::ResponseStatus {
            status: response.status,
        });

        Ok(attributes_from(&response, self.diagnostics.as_ref()).map(|attrs| {
            AuthenticationAttributes::new(
                SubjectAttributes::new(username, attrs),
                Attributes::empty(),
            )
        }))
    }

    /// Build the update request, or `None` when the account has no password.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::RequestBuild`] if the body cannot be encoded.
    pub fn build_update_request(
        &self,
        account: &AccountAttributes,
    ) -> Result<Option<RequestDescriptor>, DomainError> {
        let Some(password) = account.password() else {
            return Ok(None);
        };

        let mut params = RequestParameters::new();
        params.insert(self.config.username_parameter.as_str(), account.username());
        params.insert(
            self.config.password_parameter.as_str(),
            password.expose_secret(),
        );

        let path = self.create_request_path(account.username(), password);
        Ok(Some(update_password_request(path, &params)?))
    }

    /// Store a new password. The outcome is only reported as a diagnostic.
    ///
    /// An account without a password is skipped without contacting the
    /// backend.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] if the request could not be built or sent.
    #[instrument(skip_all, fields(username = %account.username()))]
    pub async fn update_password(&self, account: &AccountAttributes) -> Result<(), DomainError> {
        let Some(request) = self.build_update_request(account)? else {
            self.diagnostics.record(Diagnostic::PasswordUpdateSkipped {
                username: account.username().to_owned(),
            });
            return Ok(());
        };

        let response = self.transport.send(&request).await?;
        let username = account.username().to_owned();
        if has_success_status(response.status) {
            self.diagnostics
                .record(Diagnostic::PasswordUpdated { username });
        } else {
            let body = response.body_text();
            self.diagnostics.record(Diagnostic::PasswordUpdateFailed {
                username,
                status: response.status,
                body: (!body.is_empty()).then(|| body.into_owned()),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn custom_query_verifies_password(&self) -> bool {
        self.config.backend_verifies_password
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use http::Method;
    use serde_json::json;

    use super::*;
    use crate::config::SubmitAs;
    use crate::domain::diagnostics::RecordingDiagnostics;
    use crate::domain::request::{APPLICATION_FORM_URLENCODED, APPLICATION_JSON};
    use crate::domain::response::ResponseOutcome;
    use crate::test_support::StubTransport;

    fn config(submit_as: SubmitAs, backend_verifies_password: bool) -> CredentialAccessConfig {
        CredentialAccessConfig {
            backend_verifies_password,
            submit_as,
            username_parameter: "user".to_owned(),
            password_parameter: "pass".to_owned(),
            url_path: "/verify".to_owned(),
        }
    }

    fn provider(
        config: &CredentialAccessConfig,
        transport: &Arc<StubTransport>,
    ) -> (JsonCredentialProvider, Arc<RecordingDiagnostics>) {
        let diag = Arc::new(RecordingDiagnostics::new());
        let provider = JsonCredentialProvider::new(config, transport.clone(), diag.clone());
        (provider, diag)
    }

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_owned())
    }

    #[test]
    fn query_get_carries_both_credentials() {
        let transport = Arc::new(StubTransport::ok_json("{}"));
        let (provider, _) = provider(&config(SubmitAs::GetAsQueryString, true), &transport);

        let request = provider
            .build_verify_request("alice", &secret("secret"))
            .unwrap();

        assert_eq!(request.method, Method::GET);
        assert_eq!(
            request.query,
            vec![
                ("user".to_owned(), "alice".to_owned()),
                ("pass".to_owned(), "secret".to_owned()),
            ]
        );
        assert!(request.body.is_none());
    }

    #[test]
    fn json_post_withholds_password_when_backend_does_not_verify() {
        let transport = Arc::new(StubTransport::ok_json("{}"));
        let (provider, _) = provider(&config(SubmitAs::PostAsJson, false), &transport);

        let request = provider
            .build_verify_request("alice", &secret("secret"))
            .unwrap();

        assert_eq!(request.method, Method::POST);
        let body = request.body.unwrap();
        assert_eq!(body.content_type, APPLICATION_JSON);
        assert_eq!(&body.bytes[..], br#"{"user":"alice"}"#);
    }

    #[test]
    fn form_post_encodes_credentials() {
        let transport = Arc::new(StubTransport::ok_json("{}"));
        let (provider, _) = provider(&config(SubmitAs::PostAsUrlencodedFormData, true), &transport);

        let request = provider
            .build_verify_request("alice", &secret("p w&d"))
            .unwrap();

        let body = request.body.unwrap();
        assert_eq!(body.content_type, APPLICATION_FORM_URLENCODED);
        assert_eq!(&body.bytes[..], b"user=alice&pass=p+w%26d");
    }

    #[test]
    fn path_substitutes_subject_and_password() {
        let transport = Arc::new(StubTransport::ok_json("{}"));
        let mut cfg = config(SubmitAs::PostAsJson, true);
        cfg.url_path = "/auth/:subject/:password".to_owned();
        let (provider, diag) = provider(&cfg, &transport);

        assert_eq!(
            provider.create_request_path("a b", &secret("x/y")),
            "/auth/a+b/x%2Fy"
        );
        assert!(diag.events().is_empty());
    }

    #[test]
    fn withheld_password_in_path_is_still_substituted_and_flagged() {
        let transport = Arc::new(StubTransport::ok_json("{}"));
        let mut cfg = config(SubmitAs::PostAsJson, false);
        cfg.url_path = "/auth/:subject/:password".to_owned();
        let (provider, diag) = provider(&cfg, &transport);

        assert_eq!(
            diag.take(),
            vec![Diagnostic::PasswordInPathWithheld {
                url_path: "/auth/:subject/:password".to_owned()
            }]
        );
        let request = provider
            .build_verify_request("alice", &secret("secret"))
            .unwrap();
        assert_eq!(request.path, "/auth/alice/secret");
        assert_eq!(&request.body.unwrap().bytes[..], br#"{"user":"alice"}"#);
    }

    #[tokio::test]
    async fn successful_verification_returns_tagged_attributes() {
        let transport = Arc::new(StubTransport::ok_json(r#"{"role":"admin","mfa":true}"#));
        let (provider, diag) = provider(&config(SubmitAs::PostAsJson, true), &transport);

        let auth = provider
            .verify_password("alice", &secret("secret"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(auth.subject(), "alice");
        assert_eq!(auth.subject_attributes().get("role"), Some(&json!("admin")));
        assert!(auth.context_attributes().is_empty());
        assert!(diag.contains(&Diagnostic::ResponseStatus { status: 200 }));
    }

    #[tokio::test]
    async fn rejected_verification_is_absent() {
        let transport = Arc::new(StubTransport::responding(ResponseOutcome::new(
            404,
            vec![("Content-Type".to_owned(), "application/json".to_owned())],
            r#"{"error":"not found"}"#,
        )));
        let (provider, _) = provider(&config(SubmitAs::PostAsJson, true), &transport);

        let result = provider
            .verify_password("alice", &secret("wrong"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn update_without_password_sends_nothing() {
        let transport = Arc::new(StubTransport::ok_json("{}"));
        let (provider, diag) = provider(&config(SubmitAs::GetAsQueryString, true), &transport);

        provider
            .update_password(&AccountAttributes::new("alice"))
            .await
            .unwrap();

        assert!(transport.requests().is_empty());
        assert_eq!(
            diag.take(),
            vec![Diagnostic::PasswordUpdateSkipped {
                username: "alice".to_owned()
            }]
        );
    }

    #[tokio::test]
    async fn update_is_json_put_regardless_of_submission_mode() {
        let transport = Arc::new(StubTransport::responding(ResponseOutcome::new(
            204,
            Vec::new(),
            "",
        )));
        let mut cfg = config(SubmitAs::GetAsQueryString, false);
        cfg.url_path = "/users/:subject".to_owned();
        let (provider, diag) = provider(&cfg, &transport);

        provider
            .update_password(&AccountAttributes::new("alice").with_password("n3w".to_owned()))
            .await
            .unwrap();

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::PUT);
        assert_eq!(sent[0].path, "/users/alice");
        let body = sent[0].body.as_ref().unwrap();
        assert_eq!(body.content_type, APPLICATION_JSON);
        assert_eq!(&body.bytes[..], br#"{"user":"alice","pass":"n3w"}"#);
        assert!(diag.contains(&Diagnostic::PasswordUpdated {
            username: "alice".to_owned()
        }));
    }

    #[tokio::test]
    async fn failed_update_is_reported_not_returned() {
        let transport = Arc::new(StubTransport::responding(ResponseOutcome::new(
            409,
            Vec::new(),
            "conflict",
        )));
        let (provider, diag) = provider(&config(SubmitAs::PostAsJson, true), &transport);

        provider
            .update_password(&AccountAttributes::new("alice").with_password("n3w".to_owned()))
            .await
            .unwrap();

        assert!(diag.contains(&Diagnostic::PasswordUpdateFailed {
            username: "alice".to_owned(),
            status: 409,
            body: Some("conflict".to_owned()),
        }));
    }

    #[test]
    fn verifies_password_flag_is_exposed() {
        let transport = Arc::new(StubTransport::ok_json("{}"));
        let (on, _) = provider(&config(SubmitAs::PostAsJson, true), &transport);
        let (off, _) = provider(&config(SubmitAs::PostAsJson, false), &transport);

        assert!(on.custom_query_verifies_password());
        assert!(!off.custom_query_verifies_password());
    }
}
