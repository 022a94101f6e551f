use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[cfg(feature = "tracing")]
use tracing::instrument;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use futures::StreamExt;

use crate::transport::Transport;
use crate::types::{HttpRequest, HttpResponse, HttpStreamResponse};
use crate::Result;

/// A mock [`Transport`] for testing client logic without a network.
///
/// Non-streaming responses are queued and returned in FIFO order, which
/// covers multi-request flows like `list_models` (one catalog call followed
/// by one `describeModel` call per entry). Streaming calls replay the
/// configured byte chunks under the configured status.
#[derive(Clone, Default)]
pub struct MockTransport {
    stream_chunks: Arc<Mutex<Vec<Bytes>>>,
    stream_status: Arc<Mutex<Option<u16>>>,
    http_responses: Arc<Mutex<VecDeque<HttpResponse>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunks to replay for the next streaming request. Chunk boundaries are
    /// preserved, so tests can split lines mid-chunk to exercise buffering.
    pub fn with_stream_chunks(self, chunks: Vec<Bytes>) -> Self {
        *self.stream_chunks.lock().unwrap() = chunks;
        self
    }

    /// Status for streaming requests; defaults to 200. With a non-success
    /// status the configured chunks act as the error body.
    pub fn with_stream_status(self, status: u16) -> Self {
        *self.stream_status.lock().unwrap() = Some(status);
        self
    }

    /// Queues one buffered response; may be called repeatedly.
    pub fn with_http_response(self, response: HttpResponse) -> Self {
        self.http_responses.lock().unwrap().push_back(response);
        self
    }
}

#[async_trait]
impl Transport for MockTransport {
    #[cfg_attr(feature = "tracing", instrument(skip(self, _request)))]
    async fn send_http_request(&self, _request: HttpRequest) -> Result<HttpResponse> {
        if let Some(response) = self.http_responses.lock().unwrap().pop_front() {
            Ok(response)
        } else {
            Ok(HttpResponse {
                status: 200,
                body: None,
            })
        }
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, _request)))]
    async fn send_http_stream_request(&self, _request: HttpRequest) -> Result<HttpStreamResponse> {
        let status = self.stream_status.lock().unwrap().unwrap_or(200);
        let chunks = self
            .stream_chunks
            .lock()
            .unwrap()
            .drain(..)
            .collect::<Vec<_>>();
        let body = stream::iter(chunks).map(Ok).boxed();
        Ok(HttpStreamResponse { status, body })
    }
}
