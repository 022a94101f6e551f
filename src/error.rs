//! Maps non-success API responses to typed errors.

use serde::Deserialize;

use crate::Error;

/// Error payloads come back as JSON with either a `message` or an `error`
/// field depending on which layer of the service rejected the request.
#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Produce a typed error from an HTTP status code and response body.
///
/// Every operation on both clients routes non-200 responses through here
/// instead of raising a generic failure, so callers can match on the
/// resulting [`Error`] variant.
pub fn parse_error(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        400 => Error::BadRequest(message),
        404 => Error::NotFound(message),
        422 => Error::Validation(message),
        429 => Error::RateLimited(message),
        _ => Error::Server { status, message },
    }
}
