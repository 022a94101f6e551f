use async_trait::async_trait;

use crate::types::{HttpRequest, HttpResponse, HttpStreamResponse};
use crate::Result;

mod mock_transport;
mod reqwest_transport;

pub use mock_transport::MockTransport;
pub use reqwest_transport::ReqwestTransport;

/// Connection layer behind [`LisaClient`](crate::LisaClient).
///
/// Implementations report the HTTP status instead of failing on non-2xx
/// responses; status mapping is the client's job (see [`crate::error`]).
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends a request and buffers the whole response.
    async fn send_http_request(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Sends a request and returns the response body as a live byte stream.
    async fn send_http_stream_request(&self, request: HttpRequest) -> Result<HttpStreamResponse>;
}
