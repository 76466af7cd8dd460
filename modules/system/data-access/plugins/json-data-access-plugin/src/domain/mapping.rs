//! Parameter mapping resolution.
//!
//! Turns the configured parameter mappings into concrete name/value pairs
//! for one subject, encoded for the placement they are sent in.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use data_access_sdk::SubjectAttributes;
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::diagnostics::{Diagnostic, DiagnosticsSink, SkipReason};
use crate::config::{MappingValue, ParameterMappingConfig, ProvideAs};

/// How a single outgoing parameter gets its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterMapping {
    /// Read a subject attribute at call time.
    AttributeLookup { parameter: String, attribute: String },
    /// Always send the same value.
    Static { parameter: String, value: String },
}

impl From<&ParameterMappingConfig> for ParameterMapping {
    fn from(cfg: &ParameterMappingConfig) -> Self {
        let parameter = cfg.parameter_name.clone();
        match &cfg.value {
            None => Self::AttributeLookup {
                attribute: parameter.clone(),
                parameter,
            },
            Some(MappingValue::UseValueOfAttribute(attribute)) => Self::AttributeLookup {
                parameter,
                attribute: attribute.clone(),
            },
            Some(MappingValue::StaticValue(value)) => Self::Static {
                parameter,
                value: value.clone(),
            },
        }
    }
}

impl ParameterMapping {
    /// Name of the outgoing query or header parameter.
    #[must_use]
    pub fn parameter_name(&self) -> &str {
        match self {
            Self::AttributeLookup { parameter, .. } | Self::Static { parameter, .. } => parameter,
        }
    }

    /// Raw (unencoded) value of the parameter for this subject, or `None`
    /// when the attribute is missing or not primitive.
    pub fn resolve(
        &self,
        subject: &SubjectAttributes,
        diagnostics: &dyn DiagnosticsSink,
    ) -> Option<String> {
        let (parameter, attribute) = match self {
            Self::Static { value, .. } => return Some(value.clone()),
            Self::AttributeLookup {
                parameter,
                attribute,
            } => (parameter, attribute),
        };

        let skipped = |reason| Diagnostic::ParameterSkipped {
            parameter: parameter.clone(),
            attribute: attribute.clone(),
            reason,
        };

        let Some(value) = subject.get(attribute) else {
            diagnostics.record(skipped(SkipReason::AttributeNotFound));
            return None;
        };

        if let Some(text) = primitive_to_string(value) {
            diagnostics.record(Diagnostic::ParameterMapped {
                parameter: parameter.clone(),
            });
            Some(text)
        } else {
            diagnostics.record(skipped(SkipReason::NotPrimitive));
            None
        }
    }
}

/// String form of a primitive JSON value. Null, arrays and objects are not
/// primitive.
fn primitive_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Encode a value for its placement.
///
/// Header values are UTF-8/base64 encoded to stay header-safe. Query values
/// are left as raw text; percent-encoding happens when the request target
/// is assembled.
#[must_use]
pub fn encode_for(placement: ProvideAs, value: &str) -> String {
    match placement {
        ProvideAs::HeaderParameter => STANDARD.encode(value.as_bytes()),
        ProvideAs::QueryParameter => value.to_owned(),
    }
}

/// Ordered parameter set with unique names.
///
/// Serializes as a JSON object in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParameters(Vec<(String, String)>);

impl RequestParameters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parameter, replacing the value of an existing one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.0.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.0.push((name, value));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.0
    }
}

impl Serialize for RequestParameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Resolves every configured mapping for one subject and placement.
#[derive(Debug, Clone, Default)]
pub struct ParameterResolver {
    mappings: Vec<ParameterMapping>,
}

impl ParameterResolver {
    #[must_use]
    pub fn new(mappings: Vec<ParameterMapping>) -> Self {
        Self { mappings }
    }

    #[must_use]
    pub fn from_config(configs: &[ParameterMappingConfig]) -> Self {
        Self::new(configs.iter().map(ParameterMapping::from).collect())
    }

    #[must_use]
    pub fn mappings(&self) -> &[ParameterMapping] {
        &self.mappings
    }

    /// Resolve all mappings into `target`. Mappings without a value are
    /// omitted, never sent as empty strings.
    pub fn resolve_into(
        &self,
        target: &mut RequestParameters,
        subject: &SubjectAttributes,
        placement: ProvideAs,
        diagnostics: &dyn DiagnosticsSink,
    ) {
        for mapping in &self.mappings {
            if let Some(value) = mapping.resolve(subject, diagnostics) {
                target.insert(mapping.parameter_name(), encode_for(placement, &value));
            }
        }
    }

    #[must_use]
    pub fn resolve(
        &self,
        subject: &SubjectAttributes,
        placement: ProvideAs,
        diagnostics: &dyn DiagnosticsSink,
    ) -> RequestParameters {
        let mut out = RequestParameters::new();
        self.resolve_into(&mut out, subject, placement, diagnostics);
        out
    }
}
