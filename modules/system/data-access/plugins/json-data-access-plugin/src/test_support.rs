//! In-process transport for unit tests.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::request::RequestDescriptor;
use crate::domain::response::ResponseOutcome;
use crate::transport::{HttpTransport, TransportError};

/// Records every request and answers with a fixed reply.
pub struct StubTransport {
    reply: Option<ResponseOutcome>,
    requests: Mutex<Vec<RequestDescriptor>>,
}

impl StubTransport {
    pub fn responding(reply: ResponseOutcome) -> Self {
        Self {
            reply: Some(reply),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 200 with `Content-Type: application/json`.
    pub fn ok_json(body: &'static str) -> Self {
        Self::responding(ResponseOutcome::new(
            200,
            vec![("Content-Type".to_owned(), "application/json".to_owned())],
            body,
        ))
    }

    /// Every send times out.
    pub fn failing() -> Self {
        Self {
            reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<ResponseOutcome, TransportError> {
        self.requests.lock().push(request.clone());
        self.reply
            .clone()
            .ok_or(TransportError::Timeout(Duration::from_secs(1)))
    }
}
