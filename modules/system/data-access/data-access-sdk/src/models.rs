//! Domain models shared between hosts and data-access plugins.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named attributes of a subject.
///
/// Values are either primitive (string, number, boolean) or structured
/// (objects and arrays are kept as-is, never flattened).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(Map<String, Value>);

impl Attributes {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap a JSON object, keeping every top-level entry as an attribute.
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Add or replace an attribute.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A subject together with the attributes already known about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectAttributes {
    subject: String,
    #[serde(default)]
    attributes: Attributes,
}

impl SubjectAttributes {
    #[must_use]
    pub fn new(subject: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            subject: subject.into(),
            attributes,
        }
    }

    /// A subject with no known attributes.
    #[must_use]
    pub fn of_subject(subject: impl Into<String>) -> Self {
        Self::new(subject, Attributes::empty())
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// Result of an attribute lookup: zero or more attribute rows.
///
/// JSON-backed providers produce at most one row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttributeTable {
    rows: Vec<Attributes>,
}

impl AttributeTable {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single(row: Attributes) -> Self {
        Self { rows: vec![row] }
    }

    #[must_use]
    pub fn rows(&self) -> &[Attributes] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Result of a successful password verification.
///
/// Every attribute returned by the backend is categorized as a subject
/// attribute of the verified username.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthenticationAttributes {
    subject: SubjectAttributes,
    context: Attributes,
}

impl AuthenticationAttributes {
    #[must_use]
    pub fn new(subject: SubjectAttributes, context: Attributes) -> Self {
        Self { subject, context }
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.subject()
    }

    #[must_use]
    pub fn subject_attributes(&self) -> &SubjectAttributes {
        &self.subject
    }

    #[must_use]
    pub fn context_attributes(&self) -> &Attributes {
        &self.context
    }
}

/// An account whose password is being changed.
///
/// The password is wrapped in `SecretString` so `Debug` redacts it.
#[derive(Debug, Clone)]
pub struct AccountAttributes {
    username: String,
    password: Option<SecretString>,
    attributes: Attributes,
}

impl AccountAttributes {
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
            attributes: Attributes::empty(),
        }
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<SecretString>) -> Self {
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> Option<&SecretString> {
        self.password.as_ref()
    }

    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}
