//! Panel renderer: request state → panel body content.
//!
//! `view` is the pure mapping; `render_into` swaps the body's content for
//! the new view, so rendering the same state twice leaves one node.

use crate::dom::{DomError, ElementSpec, HostDocument};
use crate::pipeline::{ErrorKind, RequestState};

pub const LOADING_ID: &str = "answer-panel-loading";
pub const LOADING_TEXT: &str = "Getting the AI analysis...";
pub const CONFIG_HINT: &str = "Click the settings icon (⚙️) above to configure your API key.";

/// The body subtree for `state`.
#[must_use]
pub fn view(state: &RequestState) -> ElementSpec {
    match state {
        RequestState::Idle | RequestState::Loading => ElementSpec::new("div")
            .id(LOADING_ID)
            .class("answer-panel-loading")
            .child(ElementSpec::new("div").class("loading-spinner"))
            .child(ElementSpec::new("span").text(LOADING_TEXT)),
        RequestState::Success { text } => ElementSpec::new("div").class("answer-panel-response").text(text.clone()),
        RequestState::Error { kind, message } => {
            let block = ElementSpec::new("div").class("answer-panel-error").text(message.clone());
            if *kind == ErrorKind::Configuration {
                block.child(ElementSpec::new("div").class("answer-panel-hint").text(CONFIG_HINT))
            } else {
                block
            }
        }
    }
}

/// Replace the content of `body` with the view of `state`.
///
/// # Errors
///
/// Returns a [`DomError`] if the host rejects the update.
pub fn render_into<D: HostDocument>(doc: &D, body: &D::Node, state: &RequestState) -> Result<(), DomError> {
    doc.clear_children(body)?;
    let node = doc.build(&view(state))?;
    doc.append(body, &node)
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
