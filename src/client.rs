use bytes::Bytes;
use futures::stream::unfold;
use futures::{StreamExt, TryStreamExt};

#[cfg(feature = "metrics")]
use metrics::counter;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::builder::LisaClientBuilder;
use crate::error::parse_error;
use crate::stream::FrameStreamParser;
use crate::types::embeddings::{EmbeddingsInput, EmbeddingsRequest, EmbeddingsResponse};
use crate::types::generate::{GenerateRequest, GenerateResponse, GenerateStream};
use crate::types::{FoundationModel, HttpRequest, HttpResponse, ModelCatalog, ModelType};
use crate::{Error, LisaClient, Result};

impl LisaClient {
    pub fn builder() -> LisaClientBuilder {
        LisaClientBuilder::new()
    }

    /// Fetches the descriptor for one deployed model.
    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn describe_model(
        &self,
        provider: &str,
        model_name: &str,
    ) -> Result<FoundationModel> {
        let request = HttpRequest::new(format!(
            "describeModel?provider={provider}&modelName={model_name}"
        ));
        let response = self.transport.send_http_request(request).await?;
        let body = success_body(response)?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Lists every deployed foundation model.
    ///
    /// The catalog endpoint only returns names, so each entry is resolved
    /// through [`describe_model`](LisaClient::describe_model).
    pub async fn list_models(&self) -> Result<Vec<FoundationModel>> {
        self.list_catalog(None).await
    }

    /// Lists the deployed text generation models.
    pub async fn list_textgen_models(&self) -> Result<Vec<FoundationModel>> {
        self.list_catalog(Some(ModelType::Textgen)).await
    }

    /// Lists the deployed embedding models.
    pub async fn list_embedding_models(&self) -> Result<Vec<FoundationModel>> {
        self.list_catalog(Some(ModelType::Embedding)).await
    }

    async fn list_catalog(&self, model_type: Option<ModelType>) -> Result<Vec<FoundationModel>> {
        let url = match model_type {
            Some(t) => format!("listModels?modelTypes={}", t.as_str()),
            None => "listModels".to_string(),
        };
        let response = self.transport.send_http_request(HttpRequest::new(url)).await?;
        let body = success_body(response)?;
        let catalog: ModelCatalog = serde_json::from_slice(&body)?;

        let mut models = Vec::new();
        for providers in catalog.values() {
            for (provider, model_names) in providers {
                for model_name in model_names {
                    models.push(self.describe_model(provider, model_name).await?);
                }
            }
        }
        Ok(models)
    }

    /// Generates text for `prompt` and waits for the complete response.
    #[cfg_attr(feature = "tracing", instrument(skip(self, prompt)))]
    pub async fn generate(
        &self,
        prompt: impl Into<String>,
        model: &FoundationModel,
    ) -> Result<GenerateResponse> {
        #[cfg(feature = "metrics")]
        counter!("lisa_client.generate_requests_total", "type" => "non_streaming").increment(1);

        let payload = GenerateRequest::new(prompt, model);
        let request = HttpRequest::new("generate").post().body(payload)?;

        let response = self.transport.send_http_request(request).await?;
        let body = success_body(response)?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Generates text for `prompt`, yielding frames as the server produces
    /// them.
    ///
    /// A non-200 status fails the call up front through the error mapper;
    /// no frames are decoded in that case. On success the returned
    /// [`GenerateStream`] yields token frames in arrival order, terminated
    /// by one finish frame. Dropping the stream at any point — including
    /// after a decode error — releases the connection.
    #[cfg_attr(feature = "tracing", instrument(skip(self, prompt)))]
    pub async fn generate_stream(
        &self,
        prompt: impl Into<String>,
        model: &FoundationModel,
    ) -> Result<GenerateStream> {
        #[cfg(feature = "metrics")]
        counter!("lisa_client.generate_requests_total", "type" => "streaming").increment(1);

        let payload = GenerateRequest::new(prompt, model);
        let request = HttpRequest::new("generateStream").post().body(payload)?;

        let response = self.transport.send_http_stream_request(request).await?;
        if response.status != 200 {
            let body = response
                .body
                .try_collect::<Vec<Bytes>>()
                .await?
                .into_iter()
                .flatten()
                .collect::<Vec<u8>>();
            return Err(parse_error(response.status, &String::from_utf8_lossy(&body)));
        }

        let parser = FrameStreamParser::new(response.body);
        let frames = unfold(parser, |mut parser| async {
            parser.next().await.map(|frame| (frame, parser))
        });

        Ok(GenerateStream {
            inner: Box::pin(frames),
        })
    }

    /// Embeds one or more texts, returning one vector per input.
    #[cfg_attr(feature = "tracing", instrument(skip(self, texts)))]
    pub async fn embed(
        &self,
        texts: impl Into<EmbeddingsInput>,
        model: &FoundationModel,
    ) -> Result<Vec<Vec<f32>>> {
        #[cfg(feature = "metrics")]
        counter!("lisa_client.embedding_requests_total").increment(1);

        let payload = EmbeddingsRequest::new(texts, model);
        let request = HttpRequest::new("embeddings").post().body(payload)?;

        let response = self.transport.send_http_request(request).await?;
        let body = success_body(response)?;
        let response: EmbeddingsResponse = serde_json::from_slice(&body)?;
        Ok(response.embeddings)
    }
}

/// Routes non-200 responses through the error mapper and unwraps the body
/// of successful ones.
fn success_body(response: HttpResponse) -> Result<Bytes> {
    if response.status != 200 {
        let body = response.body.unwrap_or_default();
        return Err(parse_error(response.status, &String::from_utf8_lossy(&body)));
    }
    response
        .body
        .ok_or_else(|| Error::Protocol("Missing response body".into()))
}
