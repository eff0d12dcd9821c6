//! Prompt builder: query + history → Messages API request.
//!
//! Pure and deterministic: the same query, history and configuration always
//! serialize to the same bytes. Response length is governed by
//! `max_tokens`, never by trimming history text here.

use crate::config::PanelConfig;
use crate::history::HistoryEntry;
use crate::llm::types::{ContentBlock, Message, MessagesRequest};

const CONTEXT_HEADER: &str = "For context, here are the user's previous queries and your responses:";

/// The primary instruction for `query`. Always precedes any context.
#[must_use]
pub fn instruction(query: &str) -> String {
    format!(
        "You are a senior expert. Provide a concise, helpful response to this search query: \"{query}\". \
         Focus on giving factual, relevant information without any preamble."
    )
}

/// The context block listing `history` newest first, or `None` when empty.
#[must_use]
pub fn context_block(history: &[HistoryEntry]) -> Option<String> {
    if history.is_empty() {
        return None;
    }
    let pairs: Vec<String> = history
        .iter()
        .map(|h| format!("Query: \"{}\"\nYour response: {}", h.query, h.response))
        .collect();
    Some(format!("{CONTEXT_HEADER}\n{}", pairs.join("\n\n")))
}

/// Build the request for `query` with `history` as conversational context.
#[must_use]
pub fn build_request(query: &str, history: &[HistoryEntry], config: &PanelConfig) -> MessagesRequest {
    let mut text = instruction(query);
    if let Some(context) = context_block(history) {
        text.push_str("\n\n");
        text.push_str(&context);
    }

    MessagesRequest {
        model: config.model.clone(),
        max_tokens: config.max_tokens,
        messages: vec![Message { role: "user".to_owned(), content: vec![ContentBlock::Text { text }] }],
    }
}

/// Serialize a request body.
///
/// # Errors
///
/// Returns the serializer error if the body cannot be encoded.
pub fn encode_request(request: &MessagesRequest) -> Result<String, serde_json::Error> {
    serde_json::to_string(request)
}

#[cfg(test)]
#[path = "prompt_test.rs"]
mod tests;
