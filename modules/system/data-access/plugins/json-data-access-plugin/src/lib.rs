#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! JSON Data Access Plugin
//!
//! Delegates password verification and attribute lookups to an external
//! REST/JSON backend.
//!
//! ## Flows
//!
//! - **Attribute lookup**: `GET` against a path template (`/users/:subject`)
//!   or a fixed path with the subject sent as a query or header parameter.
//!   Extra parameters are resolved from the subject's known attributes or
//!   static values. Header values are base64 encoded.
//!
//! - **Password verification**: JSON `POST`, form `POST` or query-string
//!   `GET`, depending on `submit_as`. The password is only sent when
//!   `backend_verifies_password` is set.
//!
//! - **Password update**: always a JSON `PUT`.
//!
//! Backend error statuses, empty bodies and malformed JSON never fail a call;
//! they yield no attributes and are reported as diagnostics.
//!
//! ## Configuration
//!
//! ```yaml
//! base_url: "https://idp-backend.example.com/api"
//! timeout: 10s
//! credential_access:
//!   backend_verifies_password: true
//!   submit_as: post_as_json
//!   username_parameter: "user"
//!   password_parameter: "pass"
//!   url_path: "/authenticate"
//! attributes:
//!   provide_subject:
//!     parameter:
//!       url_path: "/users"
//!       username_parameter: "user"
//!       provide_as: query_parameter
//!   parameter_mappings:
//!     - parameter_name: "tenant"
//!       value:
//!         use_value_of_attribute: "org"
//!     - parameter_name: "client"
//!       value:
//!         static_value: "portal"
//! ```
//!
//! Every key can be overridden from the environment with the `JSON_DAP__`
//! prefix, e.g. `JSON_DAP__CREDENTIAL_ACCESS__SUBMIT_AS=get_as_query_string`.

pub mod config;
pub mod domain;
pub mod module;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use module::JsonDataAccessPlugin;
