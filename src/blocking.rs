//! Blocking client mirroring [`LisaClient`](crate::LisaClient).
//!
//! One persistent `reqwest::blocking` session (headers, cookies, TLS
//! verification, timeout) is reused across calls. Streaming reads happen on
//! the caller's thread; a call fully drains or drops its response before the
//! session is used again.

use std::io::BufReader;
use std::time::Duration;

#[cfg(feature = "metrics")]
use metrics::counter;
#[cfg(feature = "tracing")]
use tracing::instrument;

use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::builder::{build_header_map, normalize_base_url, DEFAULT_TIMEOUT};
use crate::error::parse_error;
use crate::stream::FrameLines;
use crate::types::embeddings::{EmbeddingsInput, EmbeddingsRequest, EmbeddingsResponse};
use crate::types::generate::{GenerateRequest, GenerateResponse};
use crate::types::{FoundationModel, ModelCatalog, ModelType};
use crate::{Error, Result};

/// Frames of one blocking streamed generation call. Iteration blocks until
/// the next line arrives; dropping the iterator early closes the response.
pub type GenerateFrames = FrameLines<BufReader<Response>>;

/// Blocking client for the LISA REST API.
pub struct LisaClient {
    http: HttpClient,
    base_url: Url,
}

impl LisaClient {
    pub fn builder() -> LisaClientBuilder {
        LisaClientBuilder::new()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Client(e.to_string()))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.http.get(self.endpoint(path)?).send()?;
        read_success(response)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.http.post(self.endpoint(path)?).json(body).send()?;
        read_success(response)
    }

    /// Fetches the descriptor for one deployed model.
    pub fn describe_model(&self, provider: &str, model_name: &str) -> Result<FoundationModel> {
        self.get_json(&format!(
            "describeModel?provider={provider}&modelName={model_name}"
        ))
    }

    /// Lists every deployed foundation model.
    pub fn list_models(&self) -> Result<Vec<FoundationModel>> {
        self.list_catalog(None)
    }

    /// Lists the deployed text generation models.
    pub fn list_textgen_models(&self) -> Result<Vec<FoundationModel>> {
        self.list_catalog(Some(ModelType::Textgen))
    }

    /// Lists the deployed embedding models.
    pub fn list_embedding_models(&self) -> Result<Vec<FoundationModel>> {
        self.list_catalog(Some(ModelType::Embedding))
    }

    fn list_catalog(&self, model_type: Option<ModelType>) -> Result<Vec<FoundationModel>> {
        let path = match model_type {
            Some(t) => format!("listModels?modelTypes={}", t.as_str()),
            None => "listModels".to_string(),
        };
        let catalog: ModelCatalog = self.get_json(&path)?;

        let mut models = Vec::new();
        for providers in catalog.values() {
            for (provider, model_names) in providers {
                for model_name in model_names {
                    models.push(self.describe_model(provider, model_name)?);
                }
            }
        }
        Ok(models)
    }

    /// Generates text for `prompt` and waits for the complete response.
    #[cfg_attr(feature = "tracing", instrument(skip(self, prompt)))]
    pub fn generate(
        &self,
        prompt: impl Into<String>,
        model: &FoundationModel,
    ) -> Result<GenerateResponse> {
        #[cfg(feature = "metrics")]
        counter!("lisa_client.generate_requests_total", "type" => "non_streaming").increment(1);

        let payload = GenerateRequest::new(prompt, model);
        self.post_json("generate", &payload)
    }

    /// Generates text for `prompt`, yielding frames as the server flushes
    /// them.
    ///
    /// A non-200 status fails the call up front through the error mapper.
    /// On success the returned iterator yields token frames in arrival
    /// order, terminated by one finish frame; the response connection is
    /// released when the finish frame is produced, a decode or read error
    /// occurs, or the iterator is dropped early.
    #[cfg_attr(feature = "tracing", instrument(skip(self, prompt)))]
    pub fn generate_stream(
        &self,
        prompt: impl Into<String>,
        model: &FoundationModel,
    ) -> Result<GenerateFrames> {
        #[cfg(feature = "metrics")]
        counter!("lisa_client.generate_requests_total", "type" => "streaming").increment(1);

        let payload = GenerateRequest::new(prompt, model);
        let response = self
            .http
            .post(self.endpoint("generateStream")?)
            .json(&payload)
            .send()?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text()?;
            return Err(parse_error(status, &body));
        }

        Ok(FrameLines::new(BufReader::new(response)))
    }

    /// Embeds one or more texts, returning one vector per input.
    pub fn embed(
        &self,
        texts: impl Into<EmbeddingsInput>,
        model: &FoundationModel,
    ) -> Result<Vec<Vec<f32>>> {
        let payload = EmbeddingsRequest::new(texts, model);
        let response: EmbeddingsResponse = self.post_json("embeddings", &payload)?;
        Ok(response.embeddings)
    }
}

fn read_success<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status().as_u16();
    let body = response.text()?;
    if status != 200 {
        return Err(parse_error(status, &body));
    }
    Ok(serde_json::from_str(&body)?)
}

/// Builder for the blocking [`LisaClient`], with the same connection
/// options as the async one.
pub struct LisaClientBuilder {
    base_url: Option<String>,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    timeout: Option<Duration>,
    verify: bool,
}

impl LisaClientBuilder {
    pub(crate) fn new() -> Self {
        LisaClientBuilder {
            base_url: None,
            headers: Vec::new(),
            cookies: Vec::new(),
            timeout: None,
            verify: true,
        }
    }

    /// Sets the REST API base URL. Falls back to `LISA_API_URL` when unset.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds a cookie sent with every request.
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    /// Overall per-call timeout (connect plus full body). Defaults to ten
    /// minutes.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Controls TLS certificate verification (on by default).
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn build(self) -> Result<LisaClient> {
        let base_url_str = self
            .base_url
            .or_else(|| std::env::var("LISA_API_URL").ok())
            .ok_or_else(|| {
                Error::Client(
                    "base URL is required (set it on the builder or via LISA_API_URL)".into(),
                )
            })?;
        let base_url = normalize_base_url(&base_url_str)?;
        let headers = build_header_map(&self.headers, &self.cookies)?;

        let mut http = HttpClient::builder()
            .default_headers(headers)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT));
        if !self.verify {
            http = http.danger_accept_invalid_certs(true);
        }
        let http = http.build().map_err(|e| Error::Client(e.to_string()))?;

        Ok(LisaClient { http, base_url })
    }
}
