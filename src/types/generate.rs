//! Data structures for the text generation endpoints.

use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::types::FoundationModel;
use crate::Result;

/// Request body for `generate` and `generateStream`.
///
/// Built fresh for every call and never persisted.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub provider: String,
    pub model_name: String,
    pub text: String,
    pub model_kwargs: serde_json::Value,
}

impl GenerateRequest {
    /// The prompt is forwarded as-is; empty prompts are not rejected locally.
    pub fn new(prompt: impl Into<String>, model: &FoundationModel) -> Self {
        Self {
            provider: model.provider.clone(),
            model_name: model.model_name.clone(),
            text: prompt.into(),
            model_kwargs: model
                .model_kwargs
                .clone()
                .unwrap_or_else(|| serde_json::json!({})),
        }
    }
}

/// Response body of the non-streaming `generate` endpoint.
#[derive(Deserialize, Serialize, Default, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub generated_text: String,
    pub generated_tokens: u64,
    pub finish_reason: String,
}

/// One decoded unit of a streamed generation response.
///
/// A well-behaved stream yields zero or more `Token` frames followed by
/// exactly one `Finish` frame, after which the sequence ends and the
/// underlying connection is closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// Incremental generated text.
    Token { text: String },
    /// Terminal event carrying the server's completion summary.
    Finish {
        finish_reason: String,
        generated_tokens: u64,
    },
}

impl StreamFrame {
    pub fn token_text(&self) -> Option<&str> {
        match self {
            StreamFrame::Token { text } => Some(text),
            StreamFrame::Finish { .. } => None,
        }
    }

    pub fn is_finish(&self) -> bool {
        matches!(self, StreamFrame::Finish { .. })
    }
}

/// A stream of [`StreamFrame`]s for streaming text generation.
///
/// Frames arrive in network order. Dropping the stream at any point
/// releases the connection it holds.
pub struct GenerateStream {
    pub(crate) inner: Pin<Box<dyn Stream<Item = Result<StreamFrame>> + Send>>,
}

impl Stream for GenerateStream {
    type Item = Result<StreamFrame>;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
