use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use serde::Serialize;

use crate::Result;

/// A transport-agnostic request: endpoint path (relative to the versioned
/// base URL, query string included), verb, and optional JSON body.
#[derive(Default, Debug)]
pub struct HttpRequest {
    pub url: String,
    pub verb: HttpVerb,
    pub body: Option<serde_json::Value>,
}

#[derive(Default, Debug)]
pub enum HttpVerb {
    #[default]
    GET,
    POST,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn get(mut self) -> Self {
        self.verb = HttpVerb::GET;
        self
    }

    pub fn post(mut self) -> Self {
        self.verb = HttpVerb::POST;
        self
    }

    pub fn body<T: Serialize>(mut self, body: T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

/// A fully buffered response. The status is handed back untouched so the
/// client can route non-200 responses through the error mapper.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Option<Bytes>,
}

impl HttpResponse {
    pub fn ok(body: Bytes) -> Self {
        Self {
            status: 200,
            body: Some(body),
        }
    }

    pub fn with_status(status: u16, body: Bytes) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }
}

/// Raw bytes of a chunked response body, delivered as they arrive.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// A streaming response: status first, then the live body. Dropping the
/// body releases the underlying connection.
pub struct HttpStreamResponse {
    pub status: u16,
    pub body: ByteStream,
}
