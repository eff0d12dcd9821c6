//! Anthropic Messages API framing.
//!
//! Header set for `/v1/messages` and pure reply parsing in `parse_reply`
//! for testability. The network call itself goes through a
//! [`Transport`](super::transport::Transport).

use super::types::{ApiReply, ContentBlock, ReplyError};

pub const API_VERSION: &str = "2023-06-01";

/// Shown when the provider's error object carries no message.
const UNNAMED_REMOTE_ERROR: &str = "The AI provider reported an error";

/// Headers sent with every request. The credential is opaque.
#[must_use]
pub fn request_headers(api_key: &str) -> Vec<(&'static str, String)> {
    vec![
        ("content-type", "application/json".to_owned()),
        ("x-api-key", api_key.to_owned()),
        ("anthropic-version", API_VERSION.to_owned()),
    ]
}

// =============================================================================
// PARSING
// =============================================================================

/// Extract the answer text from a reply body.
///
/// An `error` object wins over any content. Otherwise the first content
/// element must be a text block.
///
/// # Errors
///
/// [`ReplyError::Remote`] for a provider error object, [`ReplyError::Protocol`]
/// for anything that is not a recognizable reply.
pub fn parse_reply(json: &str) -> Result<String, ReplyError> {
    let reply: ApiReply = serde_json::from_str(json).map_err(|e| ReplyError::Protocol(e.to_string()))?;

    if let Some(error) = reply.error {
        let message = if error.message.trim().is_empty() { UNNAMED_REMOTE_ERROR.to_owned() } else { error.message };
        return Err(ReplyError::Remote(message));
    }

    let content = reply
        .content
        .ok_or_else(|| ReplyError::Protocol("reply has neither content nor error".into()))?;
    match content.into_iter().next() {
        Some(ContentBlock::Text { text }) => Ok(text),
        Some(ContentBlock::Unknown) => Err(ReplyError::Protocol("first content block is not text".into())),
        None => Err(ReplyError::Protocol("reply content is empty".into())),
    }
}

#[cfg(test)]
#[path = "anthropic_test.rs"]
mod tests;
