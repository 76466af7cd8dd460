//! Request construction.
//!
//! Builds the [`RequestDescriptor`] handed to the transport: path template
//! substitution, method and body encoding per submission mode.

use std::fmt;

use bytes::Bytes;
use http::Method;
use thiserror::Error;
use url::Url;
use url::form_urlencoded::byte_serialize;

use super::mapping::RequestParameters;
use crate::config::SubmitAs;

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Error)]
pub enum RequestBuildError {
    #[error("failed to encode JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode form body: {0}")]
    Form(#[from] serde_urlencoded::ser::Error),
}

/// Why a [`RequestDescriptor`] has no usable absolute target.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error(transparent)]
    Parse(#[from] url::ParseError),

    /// URL parsing would resolve the segment and address another resource.
    #[error("request path contains a dot segment")]
    DotSegment,
}

/// Encoded request body.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestBody {
    pub content_type: &'static str,
    pub bytes: Bytes,
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBody")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// Fully specified outbound request, relative to the web service context.
///
/// `Debug` omits the path and all values since they may carry a password.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub accept: &'static str,
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query: Vec<&str> = self.query.iter().map(|(n, _)| n.as_str()).collect();
        let headers: Vec<&str> = self.headers.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("query", &query)
            .field("headers", &headers)
            .field("body", &self.body)
            .field("accept", &self.accept)
            .finish_non_exhaustive()
    }
}

impl RequestDescriptor {
    fn new(method: Method, path: String) -> Self {
        Self {
            method,
            path,
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            accept: APPLICATION_JSON,
        }
    }

    /// Query value by name.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Header value by name, case-insensitive.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Absolute request target: `base` joined with the path, followed by the
    /// percent-encoded query.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::DotSegment`] if a path segment is `.` or `..`
    /// (including their `%2e` spellings), and [`TargetError::Parse`] if the
    /// joined string is not a valid URL.
    pub fn target(&self, base: &Url) -> Result<Url, TargetError> {
        if has_dot_segment(&self.path) {
            return Err(TargetError::DotSegment);
        }
        let mut joined = base.as_str().trim_end_matches('/').to_owned();
        joined.push_str(&self.path);
        let mut url = Url::parse(&joined)?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }
}

fn has_dot_segment(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').any(|segment| {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        decoded == "." || decoded == ".."
    })
}

/// Form-style percent-encoding (space becomes `+`).
#[must_use]
pub fn url_encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

/// Replace every occurrence of `placeholder` with the url-encoded `value`.
#[must_use]
pub fn substitute(template: &str, placeholder: &str, value: &str) -> String {
    template.replace(placeholder, &url_encode(value))
}

/// GET used for attribute lookups. Query and header parameters are already
/// resolved and encoded for their placement.
#[must_use]
pub fn attribute_lookup_request(
    path: String,
    query: RequestParameters,
    headers: RequestParameters,
) -> RequestDescriptor {
    let mut request = RequestDescriptor::new(Method::GET, path);
    request.query = query.into_pairs();
    request.headers = headers.into_pairs();
    request
}

/// Password verification request for the configured submission mode.
///
/// # Errors
///
/// Returns an error if the parameters cannot be encoded.
pub fn verify_password_request(
    submit_as: SubmitAs,
    path: String,
    params: &RequestParameters,
) -> Result<RequestDescriptor, RequestBuildError> {
    let request = match submit_as {
        SubmitAs::PostAsJson => {
            let mut request = RequestDescriptor::new(Method::POST, path);
            request.body = Some(json_body(params)?);
            request
        }
        SubmitAs::PostAsUrlencodedFormData => {
            let mut request = RequestDescriptor::new(Method::POST, path);
            let encoded = serde_urlencoded::to_string(params)?;
            request.body = Some(RequestBody {
                content_type: APPLICATION_FORM_URLENCODED,
                bytes: Bytes::from(encoded),
            });
            request
        }
        SubmitAs::GetAsQueryString => {
            let mut request = RequestDescriptor::new(Method::GET, path);
            request.query = params.clone().into_pairs();
            request
        }
    };
    Ok(request)
}

/// Password update request. Always a PUT with a JSON body, regardless of the
/// verification submission mode.
///
/// # Errors
///
/// Returns an error if the parameters cannot be encoded.
pub fn update_password_request(
    path: String,
    params: &RequestParameters,
) -> Result<RequestDescriptor, RequestBuildError> {
    let mut request = RequestDescriptor::new(Method::PUT, path);
    request.body = Some(json_body(params)?);
    Ok(request)
}

fn json_body(params: &RequestParameters) -> Result<RequestBody, RequestBuildError> {
    Ok(RequestBody {
        content_type: APPLICATION_JSON,
        bytes: Bytes::from(serde_json::to_vec(params)?),
    })
}
