//! LLM types: Messages API wire shapes and reply errors.

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Ways a received reply body can fail to yield an answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplyError {
    /// The provider returned a structured error object.
    #[error("provider error: {0}")]
    Remote(String),

    /// The body did not have the expected structure.
    #[error("reply parse failed: {0}")]
    Protocol(String),
}

// =============================================================================
// CONTENT BLOCKS
// =============================================================================

/// A structured content block in a message or reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    /// A plain text segment.
    #[serde(rename = "text")]
    Text { text: String },

    /// Any other block type (tool use, thinking, future additions).
    #[serde(other)]
    Unknown,
}

// =============================================================================
// REQUEST
// =============================================================================

/// A single message in the request conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: String,
    pub content: Vec<ContentBlock>,
}

/// Body of a `POST /v1/messages` request.
///
/// Field order here is the serialized order, which keeps bodies
/// byte-identical for identical inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
}

// =============================================================================
// REPLY
// =============================================================================

/// Either half of a Messages API reply; success and error bodies share no fields.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiReply {
    #[serde(default)]
    pub content: Option<Vec<ContentBlock>>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}
