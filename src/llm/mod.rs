//! LLM: Anthropic Messages API adapter for the answer panel.
//!
//! DESIGN
//! ======
//! `types` holds the wire shapes, `anthropic` the header set and reply
//! parsing, and `transport` the one network seam. Request bodies are built
//! by `crate::prompt`; the call itself is driven by `crate::pipeline`.

pub mod anthropic;
pub mod transport;
pub mod types;
