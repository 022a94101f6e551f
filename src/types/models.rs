use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Descriptor for one deployed foundation model.
///
/// Returned by `describeModel` and used to address generation and embedding
/// requests. `model_kwargs` carries provider-specific defaults (temperature,
/// max tokens, ...) that are forwarded verbatim with every request.
#[derive(Deserialize, Serialize, Default, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FoundationModel {
    pub provider: String,
    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_type: Option<ModelType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_kwargs: Option<serde_json::Value>,
}

impl FoundationModel {
    pub fn new(provider: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model_name: model_name.into(),
            ..Default::default()
        }
    }

    /// Sets the keyword arguments forwarded with every request for this model.
    pub fn model_kwargs(mut self, kwargs: serde_json::Value) -> Self {
        self.model_kwargs = Some(kwargs);
        self
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Textgen,
    Embedding,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Textgen => "textgen",
            ModelType::Embedding => "embedding",
        }
    }
}

/// Raw shape of the `listModels` response:
/// model type -> provider -> model names.
pub type ModelCatalog = HashMap<String, HashMap<String, Vec<String>>>;
