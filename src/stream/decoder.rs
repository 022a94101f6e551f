use serde::Deserialize;

use crate::types::generate::StreamFrame;
use crate::{Error, Result};

/// Marker prefix on event lines; anything else is keep-alive padding.
const DATA_PREFIX: &str = "data:";

/// The two payload shapes a `data:` line may carry. Order matters: a finish
/// payload always has `finishReason`, which a token payload never does.
#[derive(Deserialize)]
#[serde(untagged)]
enum StreamPayload {
    #[serde(rename_all = "camelCase")]
    Finish {
        finish_reason: String,
        generated_tokens: u64,
    },
    Token {
        token: TokenPayload,
    },
}

#[derive(Deserialize)]
struct TokenPayload {
    text: String,
}

/// Decode one line of the streamed response body into zero or one frame.
///
/// Pure and stateless:
/// - lines without the `data:` prefix produce nothing;
/// - the remainder is trimmed of surrounding whitespace (covering trailing
///   newline remnants) and parsed as JSON;
/// - invalid JSON or a payload matching neither recognized shape is a
///   protocol error, which is fatal to the stream it came from.
pub fn decode_line(line: &str) -> Result<Option<StreamFrame>> {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Ok(None);
    };
    let payload = payload.trim();

    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| Error::Protocol(format!("invalid JSON in stream payload: {e}")))?;

    let payload: StreamPayload = serde_json::from_value(value)
        .map_err(|_| Error::Protocol(format!("unrecognized stream payload shape: {payload}")))?;

    Ok(Some(match payload {
        StreamPayload::Finish {
            finish_reason,
            generated_tokens,
        } => StreamFrame::Finish {
            finish_reason,
            generated_tokens,
        },
        StreamPayload::Token { token } => StreamFrame::Token { text: token.text },
    }))
}
