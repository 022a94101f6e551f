use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::{Client, Url};

use crate::transport::{ReqwestTransport, Transport};
use crate::{Error, LisaClient, Result, API_VERSION};

/// One timeout budget covers the whole call: connect plus the entire
/// (possibly streamed) body.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// A builder for constructing a [`LisaClient`].
///
/// - The base URL comes from the builder or the `LISA_API_URL` environment
///   variable; it is normalized to end in `/v1/` so endpoint paths join
///   under the versioned root.
/// - Headers and cookies are applied to every request of the session.
/// - TLS verification is on unless [`verify`](LisaClientBuilder::verify)
///   disables it.
/// - A custom [`Transport`] replaces the `reqwest`-based default entirely,
///   e.g. [`MockTransport`](crate::transport::MockTransport) in tests.
pub struct LisaClientBuilder {
    base_url: Option<String>,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    timeout: Option<Duration>,
    verify: bool,
    transport: Option<Arc<dyn Transport + Send + Sync>>,
}

impl LisaClientBuilder {
    pub(crate) fn new() -> Self {
        LisaClientBuilder {
            base_url: None,
            headers: Vec::new(),
            cookies: Vec::new(),
            timeout: None,
            verify: true,
            transport: None,
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
    /// minutes; expiry surfaces as a transport error.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Controls TLS certificate verification (on by default).
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Sets a custom transport implementation, bypassing the connection
    /// options above.
    pub fn transport(mut self, transport: Arc<dyn Transport + Send + Sync>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the [`LisaClient`] with the configured options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Client`](variant@Error::Client) when no base URL is
    /// available, the URL does not parse, a header or cookie value is
    /// malformed, or the underlying HTTP client cannot be constructed.
    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub fn build(self) -> Result<LisaClient> {
        let transport = if let Some(t) = self.transport {
            t
        } else {
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

            let mut http = Client::builder()
                .default_headers(headers)
                .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT));
            if !self.verify {
                http = http.danger_accept_invalid_certs(true);
            }
            let client = http.build().map_err(|e| Error::Client(e.to_string()))?;

            Arc::new(ReqwestTransport::new(base_url, client))
        };

        Ok(LisaClient { transport })
    }
}

/// Normalizes a base URL: trims trailing slashes, appends the API version
/// segment when missing, and keeps a trailing slash so `Url::join` resolves
/// endpoint paths under it rather than replacing the last segment.
pub(crate) fn normalize_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim_end_matches('/');
    let versioned = if trimmed.ends_with(&format!("/{API_VERSION}")) {
        trimmed.to_string()
    } else {
        format!("{trimmed}/{API_VERSION}")
    };
    Url::parse(&format!("{versioned}/"))
        .map_err(|e| Error::Client(format!("Invalid base URL: {e}")))
}

/// Builds the session header map, folding cookies into a single `Cookie`
/// header.
pub(crate) fn build_header_map(
    headers: &[(String, String)],
    cookies: &[(String, String)],
) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::Client(format!("invalid header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::Client(format!("invalid header value: {e}")))?;
        map.insert(name, value);
    }
    if !cookies.is_empty() {
        let rendered = cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        let value = HeaderValue::from_str(&rendered)
            .map_err(|e| Error::Client(format!("invalid cookie value: {e}")))?;
        map.insert(COOKIE, value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_api_version_when_missing() {
        let url = normalize_base_url("https://lisa.example.com").unwrap();
        assert_eq!(url.as_str(), "https://lisa.example.com/v1/");
    }

    #[test]
    fn normalization_is_idempotent() {
        let url = normalize_base_url("https://lisa.example.com/v1/").unwrap();
        assert_eq!(url.as_str(), "https://lisa.example.com/v1/");
        let url = normalize_base_url("https://lisa.example.com/api/v1").unwrap();
        assert_eq!(url.as_str(), "https://lisa.example.com/api/v1/");
    }

    #[test]
    fn endpoint_paths_join_under_the_versioned_root() {
        let url = normalize_base_url("https://lisa.example.com").unwrap();
        let endpoint = url.join("generateStream").unwrap();
        assert_eq!(endpoint.as_str(), "https://lisa.example.com/v1/generateStream");
    }

    #[test]
    fn cookies_fold_into_one_header() {
        let map = build_header_map(
            &[("x-api-key".to_string(), "secret".to_string())],
            &[
                ("session".to_string(), "abc".to_string()),
                ("theme".to_string(), "dark".to_string()),
            ],
        )
        .unwrap();
        assert_eq!(map.get("x-api-key").unwrap(), "secret");
        assert_eq!(map.get(COOKIE).unwrap(), "session=abc; theme=dark");
    }
}
