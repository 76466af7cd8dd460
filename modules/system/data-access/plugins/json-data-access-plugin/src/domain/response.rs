//! Response validation and translation into attributes.
//!
//! Backend content problems never fail a call: they are reported as
//! diagnostics and yield no attributes.

use std::borrow::Cow;

use bytes::Bytes;
use data_access_sdk::Attributes;
use serde_json::Value;

use super::diagnostics::{Diagnostic, DiagnosticsSink};
use super::request::APPLICATION_JSON;

/// Read-only view of the backend reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseOutcome {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ResponseOutcome {
    #[must_use]
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// All values of a header, case-insensitive.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body decoded as UTF-8, invalid sequences replaced.
    #[must_use]
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// True if any comma-separated media type, stripped of parameters, is
/// exactly `application/json`.
#[must_use]
pub fn is_json_content_type(value: &str) -> bool {
    value
        .split(',')
        .filter_map(|part| part.split(';').next())
        .map(str::trim)
        .any(|media_type| media_type == APPLICATION_JSON)
}

#[must_use]
pub fn has_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Accept/reject decision for JSON parsing.
///
/// The `Content-Type` is only inspected for diagnostics; the decision is
/// made on the status code alone.
pub fn is_successful_json_response(
    response: &ResponseOutcome,
    diagnostics: &dyn DiagnosticsSink,
) -> bool {
    let content_types: Vec<&str> = response.header_values("content-type").collect();

    if content_types.is_empty() {
        diagnostics.record(Diagnostic::MissingContentType);
    } else if !content_types.iter().any(|ct| is_json_content_type(ct)) {
        diagnostics.record(Diagnostic::UnexpectedContentType {
            content_types: content_types.join(", "),
        });
    }

    has_success_status(response.status)
}

/// Attributes carried by a response, if any.
///
/// Each top-level key of the JSON object becomes an attribute; nested values
/// are kept structured. Returns `None` for non-2xx statuses, empty bodies and
/// bodies that are not a JSON object.
pub fn attributes_from(
    response: &ResponseOutcome,
    diagnostics: &dyn DiagnosticsSink,
) -> Option<Attributes> {
    let body = response.body_text();

    if !is_successful_json_response(response, diagnostics) {
        diagnostics.record(Diagnostic::UnsuccessfulResponse {
            status: response.status,
            body: (!body.is_empty()).then(|| body.to_string()),
        });
        return None;
    }

    if body.is_empty() {
        diagnostics.record(Diagnostic::EmptySuccessBody);
        return None;
    }

    match serde_json::from_str::<Value>(&body) {
        Ok(Value::Object(map)) => Some(Attributes::from_map(map)),
        Ok(other) => {
            diagnostics.record(Diagnostic::MalformedJson {
                error: format!("expected a JSON object, got {}", json_kind(&other)),
                body: body.into_owned(),
            });
            None
        }
        Err(e) => {
            diagnostics.record(Diagnostic::MalformedJson {
                error: e.to_string(),
                body: body.into_owned(),
            });
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::diagnostics::RecordingDiagnostics;

    fn response(status: u16, content_type: Option<&str>, body: &'static str) -> ResponseOutcome {
        let headers = content_type
            .map(|ct| vec![("Content-Type".to_owned(), ct.to_owned())])
            .unwrap_or_default();
        ResponseOutcome::new(status, headers, body)
    }

    #[test]
    fn json_content_type_detection() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("text/plain, application/json;q=0.9"));
        assert!(is_json_content_type("  application/json  "));
        assert!(!is_json_content_type("application/jsonp"));
        assert!(!is_json_content_type("application/problem+json"));
        assert!(!is_json_content_type("text/plain"));
    }

    #[test]
    fn status_alone_decides() {
        let diag = RecordingDiagnostics::new();
        assert!(is_successful_json_response(&response(200, Some("text/plain"), ""), &diag));
        assert!(is_successful_json_response(&response(299, None, ""), &diag));
        assert!(!is_successful_json_response(&response(300, Some("application/json"), ""), &diag));
        assert!(!is_successful_json_response(&response(199, Some("application/json"), ""), &diag));
    }

    #[test]
    fn content_type_headers_are_case_insensitive_and_multi_valued() {
        let diag = RecordingDiagnostics::new();
        let resp = ResponseOutcome::new(
            200,
            vec![
                ("content-type".to_owned(), "text/plain".to_owned()),
                ("CONTENT-TYPE".to_owned(), "application/json".to_owned()),
            ],
            "{}",
        );

        assert!(is_successful_json_response(&resp, &diag));
        assert!(diag.events().is_empty());
    }

    #[test]
    fn missing_content_type_is_noted() {
        let diag = RecordingDiagnostics::new();
        let attrs = attributes_from(&response(200, None, r#"{"a":1}"#), &diag);

        assert_eq!(attrs, Some(Attributes::empty().with("a", 1)));
        assert_eq!(diag.take(), vec![Diagnostic::MissingContentType]);
    }

    #[test]
    fn unexpected_content_type_still_parses() {
        let diag = RecordingDiagnostics::new();
        let attrs = attributes_from(&response(200, Some("text/plain"), r#"{"role":"admin"}"#), &diag);

        assert_eq!(attrs, Some(Attributes::empty().with("role", "admin")));
        assert_eq!(
            diag.take(),
            vec![Diagnostic::UnexpectedContentType {
                content_types: "text/plain".to_owned()
            }]
        );
    }

    #[test]
    fn nested_values_stay_structured() {
        let diag = RecordingDiagnostics::new();
        let attrs = attributes_from(
            &response(
                200,
                Some("application/json"),
                r#"{"name":{"given":"Alice"},"emails":["a@x","b@x"],"age":30}"#,
            ),
            &diag,
        )
        .unwrap();

        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs.get("name"), Some(&json!({ "given": "Alice" })));
        assert_eq!(attrs.get("emails"), Some(&json!(["a@x", "b@x"])));
    }

    #[test]
    fn error_status_yields_nothing() {
        let diag = RecordingDiagnostics::new();
        let attrs = attributes_from(
            &response(404, Some("application/json"), r#"{"error":"not found"}"#),
            &diag,
        );

        assert_eq!(attrs, None);
        assert_eq!(
            diag.take(),
            vec![Diagnostic::UnsuccessfulResponse {
                status: 404,
                body: Some(r#"{"error":"not found"}"#.to_owned()),
            }]
        );
    }

    #[test]
    fn error_status_without_body() {
        let diag = RecordingDiagnostics::new();
        assert_eq!(attributes_from(&response(500, Some("application/json"), ""), &diag), None);
        assert!(diag.contains(&Diagnostic::UnsuccessfulResponse {
            status: 500,
            body: None
        }));
    }

    #[test]
    fn empty_success_body_is_inconsistent() {
        let diag = RecordingDiagnostics::new();
        assert_eq!(attributes_from(&response(200, Some("application/json"), ""), &diag), None);
        assert_eq!(diag.take(), vec![Diagnostic::EmptySuccessBody]);
    }

    #[test]
    fn whitespace_body_is_malformed_not_empty() {
        let diag = RecordingDiagnostics::new();
        assert_eq!(
            attributes_from(&response(200, Some("application/json"), "  \n"), &diag),
            None
        );
        assert!(matches!(
            diag.take().as_slice(),
            [Diagnostic::MalformedJson { body, .. }] if body == "  \n"
        ));
    }

    #[test]
    fn malformed_json_is_absorbed() {
        let diag = RecordingDiagnostics::new();
        assert_eq!(
            attributes_from(&response(200, Some("application/json"), "{not json"), &diag),
            None
        );
        assert!(matches!(
            diag.take().as_slice(),
            [Diagnostic::MalformedJson { body, .. }] if body == "{not json"
        ));
    }

    #[test]
    fn non_object_json_is_absorbed() {
        let diag = RecordingDiagnostics::new();
        assert_eq!(
            attributes_from(&response(200, Some("application/json"), "[1,2]"), &diag),
            None
        );
        assert!(matches!(
            diag.take().as_slice(),
            [Diagnostic::MalformedJson { error, .. }] if error.contains("an array")
        ));
    }
}
