//! Response pipeline: one provider request per page load.
//!
//! DESIGN
//! ======
//! A pipeline walks `Idle → Loading → Success | Error` exactly once.
//! [`ResponsePipeline::submit`] takes `self` by value, so a second submit on
//! the same pipeline does not compile; a new page load builds a new one.
//!
//! ERROR HANDLING
//! ==============
//! Every failure lands in one of four [`ErrorKind`]s and is terminal. No
//! retries. Only a successful reply writes to the history store; a failed
//! history write is logged and does not change the outcome.

use tracing::{info, warn};

use crate::config::PanelConfig;
use crate::history::HistoryStore;
use crate::llm::anthropic;
use crate::llm::transport::{ProviderRequest, Transport};
use crate::llm::types::ReplyError;
use crate::prompt;
use crate::storage::KeyValueStore;

pub const MISSING_KEY_MESSAGE: &str = "API key not configured";
pub const NETWORK_MESSAGE: &str = "Failed to connect to the AI provider";
pub const PROTOCOL_MESSAGE: &str = "Unexpected response from the AI provider";

/// Category of a terminal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No usable credential. The network is never touched.
    Configuration,
    /// No response was received.
    Network,
    /// The provider answered with an error object.
    Remote,
    /// The reply could not be read as a Messages API body.
    Protocol,
}

/// Where the page's single request stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Loading,
    Success { text: String },
    Error { kind: ErrorKind, message: String },
}

impl RequestState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Error { .. })
    }

    fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Error { kind, message: message.into() }
    }
}

/// Single-shot request driver.
///
/// A pipeline is `Idle` until submitted. `submit` consumes it, so the
/// intermediate states are only visible through
/// [`submit_observed`](Self::submit_observed).
pub struct ResponsePipeline<T, S> {
    config: PanelConfig,
    transport: T,
    history: HistoryStore<S>,
}

impl<T: Transport, S: KeyValueStore> ResponsePipeline<T, S> {
    pub fn new(config: PanelConfig, transport: T, history: HistoryStore<S>) -> Self {
        Self { config, transport, history }
    }

    /// Run the request for `query` and return its terminal state.
    pub async fn submit(self, query: &str) -> RequestState {
        self.submit_observed(query, |_| {}).await
    }

    /// Like [`submit`](Self::submit), reporting every transition to `on_transition`.
    pub async fn submit_observed(self, query: &str, mut on_transition: impl FnMut(&RequestState)) -> RequestState {
        let Some(api_key) = self.config.credential() else {
            info!("no credential configured; skipping request");
            return enter(RequestState::error(ErrorKind::Configuration, MISSING_KEY_MESSAGE), &mut on_transition);
        };

        enter(RequestState::Loading, &mut on_transition);
        let outcome = self.request(query, api_key).await;
        enter(outcome, &mut on_transition)
    }

    async fn request(&self, query: &str, api_key: &str) -> RequestState {
        let history = self.history.load();
        let body = match prompt::encode_request(&prompt::build_request(query, &history, &self.config)) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "request body encode failed");
                return RequestState::error(ErrorKind::Protocol, PROTOCOL_MESSAGE);
            }
        };
        let request = ProviderRequest {
            url: self.config.api_url.clone(),
            headers: anthropic::request_headers(api_key),
            body,
        };

        info!(model = %self.config.model, context = history.len(), "submitting query");
        let reply = match self.transport.post(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "provider unreachable");
                return RequestState::error(ErrorKind::Network, NETWORK_MESSAGE);
            }
        };

        match anthropic::parse_reply(&reply.body) {
            Ok(text) => {
                if let Err(e) = self.history.append(query, &text) {
                    warn!(error = %e, "history write failed");
                }
                RequestState::Success { text }
            }
            Err(ReplyError::Remote(message)) => {
                warn!(status = reply.status, %message, "provider returned an error");
                RequestState::error(ErrorKind::Remote, message)
            }
            Err(ReplyError::Protocol(detail)) => {
                warn!(status = reply.status, %detail, "unreadable provider reply");
                RequestState::error(ErrorKind::Protocol, PROTOCOL_MESSAGE)
            }
        }
    }
}

fn enter(next: RequestState, on_transition: &mut impl FnMut(&RequestState)) -> RequestState {
    if let RequestState::Error { kind, .. } = &next {
        info!(?kind, "request finished with error");
    }
    on_transition(&next);
    next
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
