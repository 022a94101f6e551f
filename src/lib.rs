use std::sync::Arc;

use thiserror::Error;

use self::transport::Transport;

pub mod blocking;
pub mod builder;
pub mod client;
pub mod error;
pub mod stream;
pub mod transport;
pub mod types;

/// API version segment appended to base URLs that do not already carry it.
pub const API_VERSION: &str = "v1";

/// Asynchronous client for the LISA REST API.
///
/// Construct one through [`LisaClient::builder`]. The client is cheap to
/// clone; all clones share the same transport.
#[derive(Clone)]
pub struct LisaClient {
    transport: Arc<dyn Transport + Send + Sync>,
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Client error: {0}")]
    Client(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
}
