//! # answer-panel
//!
//! Augments a search results page with an AI-generated answer panel.
//!
//! DESIGN
//! ======
//! One page load issues at most one provider request. Prior query/response
//! pairs are kept in a bounded history slot and fed back as context. The
//! panel is injected into a host sidebar that the search page rewrites at
//! will, so an anchor watch keeps re-pinning it as the first child.
//!
//! Browser bindings live behind the `browser` feature; everything else runs
//! against the host traits in [`dom`], [`storage`] and [`llm::transport`], which
//! is how the native binary and the tests drive the same flow.

pub mod anchor;
pub mod config;
pub mod dom;
pub mod history;
pub mod llm;
pub mod page;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod storage;

#[cfg(feature = "browser")]
pub mod browser;
