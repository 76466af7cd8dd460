//! Configuration for the JSON data-access plugin.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use figment::Figment;
use http::HeaderName;
use figment::providers::{Env, Format, Yaml};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use url::Url;

/// Prefix of environment variables that override file configuration.
///
/// Nesting levels are separated by `__`, e.g.
/// `JSON_DAP__CREDENTIAL_ACCESS__SUBMIT_AS=get_as_query_string`.
pub const ENV_PREFIX: &str = "JSON_DAP__";

pub const SUBJECT_PLACEHOLDER: &str = ":subject";
pub const PASSWORD_PLACEHOLDER: &str = ":password";

/// Plugin configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonDataAccessPluginConfig {
    /// Web service context that every configured url path is relative to.
    pub base_url: String,

    /// Upper bound for a single backend round trip.
    #[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,

    /// Password verification and update settings.
    #[serde(default)]
    pub credential_access: CredentialAccessConfig,

    /// Attribute lookup settings.
    #[serde(default)]
    pub attributes: AttributesConfig,
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

/// How username and password reach the backend during verification.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialAccessConfig {
    /// When `true` the backend checks the password and answers with a
    /// success status. When `false` the password is not sent as a parameter
    /// and the backend returns the stored credentials for the host to check.
    pub backend_verifies_password: bool,

    /// HTTP method and encoding of the verification parameters.
    pub submit_as: SubmitAs,

    /// Name of the parameter carrying the username.
    pub username_parameter: String,

    /// Name of the parameter carrying the password.
    pub password_parameter: String,

    /// Request path; may contain `:subject` and `:password` placeholders.
    pub url_path: String,
}

impl Default for CredentialAccessConfig {
    fn default() -> Self {
        Self {
            backend_verifies_password: false,
            submit_as: SubmitAs::PostAsJson,
            username_parameter: "username".to_owned(),
            password_parameter: "password".to_owned(),
            url_path: "/".to_owned(),
        }
    }
}

/// Submission mode for password verification.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmitAs {
    /// POST the parameters as an `application/json` object.
    #[default]
    PostAsJson,
    /// POST the parameters as `application/x-www-form-urlencoded` data.
    PostAsUrlencodedFormData,
    /// GET with the parameters in the query string.
    GetAsQueryString,
}

/// Attribute lookup configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttributesConfig {
    /// Extra parameters sent along with the subject.
    pub parameter_mappings: Vec<ParameterMappingConfig>,

    /// How the subject reaches the backend.
    pub provide_subject: ProvideSubject,
}

/// One-of: the subject is substituted into the url path, or sent as a
/// separate parameter.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProvideSubject {
    /// Path template; `:subject` is replaced with the url-encoded subject.
    UrlPath(String),
    /// Send the subject as a query or header parameter.
    Parameter(SubjectParameterConfig),
}

impl Default for ProvideSubject {
    fn default() -> Self {
        Self::UrlPath("/users/:subject".to_owned())
    }
}

/// Subject provisioning through a parameter.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SubjectParameterConfig {
    /// Request path, used as-is.
    #[serde(default = "default_parameter_url_path")]
    pub url_path: String,

    /// Name of the parameter carrying the subject.
    pub username_parameter: String,

    /// Where the parameters are placed.
    #[serde(default)]
    pub provide_as: ProvideAs,
}

fn default_parameter_url_path() -> String {
    "/users".to_owned()
}

/// Placement of attribute lookup parameters.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProvideAs {
    /// Query string parameter, sent as raw text.
    QueryParameter,
    /// Request header, value UTF-8/base64 encoded.
    #[default]
    HeaderParameter,
}

/// Parameter mapping as written in configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ParameterMappingConfig {
    /// Name of the outgoing parameter.
    pub parameter_name: String,

    /// Where the value comes from. When absent, the attribute named like
    /// the parameter is used.
    #[serde(default)]
    pub value: Option<MappingValue>,
}

/// One-of: attribute lookup or static value.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MappingValue {
    /// Send the value of this subject attribute.
    UseValueOfAttribute(String),
    /// Send this literal value.
    StaticValue(String),
}

/// Configuration resolution errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(Box<figment::Error>),

    #[error("invalid base_url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("{field} must start with '/', got '{path}'")]
    InvalidUrlPath { field: &'static str, path: String },

    #[error("{field} must not be empty")]
    EmptyParameterName { field: &'static str },

    #[error("{field} '{name}' is not a valid HTTP header name")]
    InvalidHeaderName { field: &'static str, name: String },

    #[error("parameter '{name}' is configured more than once in {section}")]
    DuplicateParameter { name: String, section: &'static str },
}

impl JsonDataAccessPluginConfig {
    /// Load configuration from a YAML file, overridden by `JSON_DAP__*`
    /// environment variables, and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, does not match the
    /// configuration schema (including one-of violations and unknown enum
    /// values), or fails [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let cfg: Self = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: "must not contain a query or fragment".to_owned(),
            });
        }

        let creds = &self.credential_access;
        check_url_path("credential_access.url_path", &creds.url_path)?;
        check_parameter_name(
            "credential_access.username_parameter",
            &creds.username_parameter,
        )?;
        check_parameter_name(
            "credential_access.password_parameter",
            &creds.password_parameter,
        )?;
        if creds.username_parameter == creds.password_parameter {
            return Err(ConfigError::DuplicateParameter {
                name: creds.username_parameter.clone(),
                section: "credential_access",
            });
        }

        let mut seen = HashSet::new();
        let mut in_headers = false;
        match &self.attributes.provide_subject {
            ProvideSubject::UrlPath(path) => {
                check_url_path("attributes.provide_subject.url_path", path)?;
            }
            ProvideSubject::Parameter(param) => {
                check_url_path("attributes.provide_subject.parameter.url_path", &param.url_path)?;
                check_parameter_name(
                    "attributes.provide_subject.parameter.username_parameter",
                    &param.username_parameter,
                )?;
                in_headers = param.provide_as == ProvideAs::HeaderParameter;
                if in_headers {
                    check_header_name(
                        "attributes.provide_subject.parameter.username_parameter",
                        &param.username_parameter,
                    )?;
                }
                seen.insert(param.username_parameter.as_str());
            }
        }
        for mapping in &self.attributes.parameter_mappings {
            check_parameter_name(
                "attributes.parameter_mappings.parameter_name",
                &mapping.parameter_name,
            )?;
            if in_headers {
                check_header_name(
                    "attributes.parameter_mappings.parameter_name",
                    &mapping.parameter_name,
                )?;
            }
            if !seen.insert(mapping.parameter_name.as_str()) {
                return Err(ConfigError::DuplicateParameter {
                    name: mapping.parameter_name.clone(),
                    section: "attributes",
                });
            }
        }

        Ok(())
    }

    /// True when the credential path carries `:password` although the
    /// password is withheld from the request parameters.
    #[must_use]
    pub fn password_in_path_while_withheld(&self) -> bool {
        !self.credential_access.backend_verifies_password
            && self
                .credential_access
                .url_path
                .contains(PASSWORD_PLACEHOLDER)
    }

    /// True when parameter mappings are configured but the subject is sent
    /// in the url path, so the mappings are never used.
    #[must_use]
    pub fn has_unused_parameter_mappings(&self) -> bool {
        matches!(
            self.attributes.provide_subject,
            ProvideSubject::UrlPath(_)
        ) && !self.attributes.parameter_mappings.is_empty()
    }
}

fn check_url_path(field: &'static str, path: &str) -> Result<(), ConfigError> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrlPath {
            field,
            path: path.to_owned(),
        })
    }
}

fn check_parameter_name(field: &'static str, name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        Err(ConfigError::EmptyParameterName { field })
    } else {
        Ok(())
    }
}

fn check_header_name(field: &'static str, name: &str) -> Result<(), ConfigError> {
    HeaderName::from_bytes(name.as_bytes())
        .map(|_| ())
        .map_err(|_| ConfigError::InvalidHeaderName {
            field,
            name: name.to_owned(),
        })
}
