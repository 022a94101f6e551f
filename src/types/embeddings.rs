//! Data structures for the `embeddings` endpoint.

use serde::{Deserialize, Serialize};

use crate::types::FoundationModel;

/// Request body for `embeddings`. The `text` field accepts either a single
/// string or a batch; the server responds with one vector per input.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingsRequest {
    pub provider: String,
    pub model_name: String,
    pub text: EmbeddingsInput,
    pub model_kwargs: serde_json::Value,
}

impl EmbeddingsRequest {
    pub fn new(texts: impl Into<EmbeddingsInput>, model: &FoundationModel) -> Self {
        Self {
            provider: model.provider.clone(),
            model_name: model.model_name.clone(),
            text: texts.into(),
            model_kwargs: model
                .model_kwargs
                .clone()
                .unwrap_or_else(|| serde_json::json!({})),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum EmbeddingsInput {
    Single(String),
    Batch(Vec<String>),
}

impl From<String> for EmbeddingsInput {
    fn from(text: String) -> Self {
        EmbeddingsInput::Single(text)
    }
}

impl From<&str> for EmbeddingsInput {
    fn from(text: &str) -> Self {
        EmbeddingsInput::Single(text.to_string())
    }
}

impl From<Vec<String>> for EmbeddingsInput {
    fn from(texts: Vec<String>) -> Self {
        EmbeddingsInput::Batch(texts)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct EmbeddingsResponse {
    pub embeddings: Vec<Vec<f32>>,
}
