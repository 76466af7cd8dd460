use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use rustls::{ClientConfig, RootCertStore};
use tracing::{debug, warn};
use url::Url;

use super::{HttpTransport, TransportError};
use crate::domain::request::RequestDescriptor;
use crate::domain::response::ResponseOutcome;

/// HTTP/1.1 client over hyper with rustls (native roots).
///
/// Cheap to share; the connection pool is reused across requests.
pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    base_url: Url,
    timeout: Duration,
}

impl HyperTransport {
    /// # Errors
    ///
    /// Returns [`TransportError::Tls`] if no TLS configuration can be built.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, TransportError> {
        let https = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config()?)
            .https_or_http()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(https);

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn to_http_request(
        &self,
        request: &RequestDescriptor,
    ) -> Result<http::Request<Full<Bytes>>, TransportError> {
        let target = request.target(&self.base_url)?;

        let mut builder = http::Request::builder()
            .method(request.method.clone())
            .uri(target.as_str())
            .header(ACCEPT, request.accept);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let body = match &request.body {
            Some(body) => {
                builder = builder.header(CONTENT_TYPE, body.content_type);
                Full::new(body.bytes.clone())
            }
            None => Full::new(Bytes::new()),
        };

        builder
            .body(body)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))
    }

    async fn exchange(
        &self,
        request: http::Request<Full<Bytes>>,
    ) -> Result<ResponseOutcome, TransportError> {
        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_owned(), v.to_owned()))
            })
            .collect();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?
            .to_bytes();

        Ok(ResponseOutcome::new(status, headers, body))
    }
}

#[async_trait]
impl HttpTransport for HyperTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<ResponseOutcome, TransportError> {
        let http_request = self.to_http_request(request)?;

        // The path may carry a password, log the method only
        debug!(method = %request.method, host = ?self.base_url.host_str(), "Sending backend request");

        match tokio::time::timeout(self.timeout, self.exchange(http_request)).await {
            Ok(Ok(outcome)) => {
                debug!(status = outcome.status, len = outcome.body.len(), "Backend replied");
                Ok(outcome)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Backend request failed");
                Err(e)
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "Backend request timed out");
                Err(TransportError::Timeout(self.timeout))
            }
        }
    }
}

fn tls_config() -> Result<ClientConfig, TransportError> {
    let native = rustls_native_certs::load_native_certs();
    for error in &native.errors {
        warn!(error = %error, "Failed to load a native root certificate");
    }

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    debug!(added, ignored, "Loaded native root certificates");

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    Ok(ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| TransportError::Tls(e.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth())
}
