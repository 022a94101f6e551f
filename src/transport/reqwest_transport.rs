#[cfg(feature = "tracing")]
use tracing::instrument;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Url};

use crate::transport::Transport;
use crate::types::{HttpRequest, HttpResponse, HttpStreamResponse, HttpVerb};
use crate::{Error, Result};

/// A [`Transport`] implementation backed by a `reqwest` client.
///
/// This is the default transport used by [`LisaClient`](crate::LisaClient).
/// The `reqwest::Client` is built once by the builder (headers, cookies,
/// timeout, TLS verification) and reused for every call; each streaming call
/// holds its own response connection, released when the body stream drops.
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// `base_url` must be the normalized, versioned URL ending in a slash
    /// so that relative endpoint paths join under it.
    pub fn new(base_url: Url, client: Client) -> Self {
        Self { client, base_url }
    }

    async fn build_and_send_request(&self, request: HttpRequest) -> Result<reqwest::Response> {
        let url = self
            .base_url
            .join(&request.url)
            .map_err(|e| Error::Client(e.to_string()))?;

        let mut request_builder = match request.verb {
            HttpVerb::GET => self.client.get(url),
            HttpVerb::POST => self.client.post(url),
        };

        if let Some(body) = request.body {
            request_builder = request_builder.json(&body);
        }

        request_builder.send().await.map_err(Error::Transport)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    async fn send_http_request(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.build_and_send_request(request).await?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(Error::Transport)?;
        Ok(HttpResponse {
            status,
            body: Some(body),
        })
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    async fn send_http_stream_request(&self, request: HttpRequest) -> Result<HttpStreamResponse> {
        let response = self.build_and_send_request(request).await?;
        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|item| item.map_err(Error::Transport))
            .boxed();
        Ok(HttpStreamResponse { status, body })
    }
}
