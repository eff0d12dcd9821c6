//! HTTP transport seam for the single provider call.
//!
//! DESIGN
//! ======
//! The pipeline hands a fully framed [`ProviderRequest`] to a [`Transport`]
//! and gets back the raw status and body. Interpreting the body is left to
//! `anthropic::parse_reply`, so a transport error always means "no response
//! received". Futures are `?Send`: everything runs on one event loop.

use async_trait::async_trait;

/// Errors where no response body was received.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),

    /// Connection refused, timed out, or otherwise failed before a response.
    #[error("request failed: {0}")]
    Request(String),

    /// The response started but its body could not be read.
    #[error("response body unreadable: {0}")]
    Body(String),
}

/// A framed `POST` to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

/// Raw reply as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReply {
    pub status: u16,
    pub body: String,
}

/// Sends one request and returns the raw reply.
#[async_trait(?Send)]
pub trait Transport {
    /// POST `request` and read the whole body.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when no response body was received.
    async fn post(&self, request: &ProviderRequest) -> Result<TransportReply, TransportError>;
}

#[async_trait(?Send)]
impl<T: Transport + ?Sized> Transport for &T {
    async fn post(&self, request: &ProviderRequest) -> Result<TransportReply, TransportError> {
        (**self).post(request).await
    }
}

// =============================================================================
// REQWEST (native)
// =============================================================================

#[cfg(not(target_arch = "wasm32"))]
pub use native::ReqwestTransport;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{ProviderRequest, Transport, TransportError, TransportReply};

    const REQUEST_TIMEOUT_SECS: u64 = 120;
    const CONNECT_TIMEOUT_SECS: u64 = 10;

    /// `reqwest` client with fixed request and connect timeouts.
    pub struct ReqwestTransport {
        http: reqwest::Client,
    }

    impl ReqwestTransport {
        /// # Errors
        ///
        /// Returns [`TransportError::ClientBuild`] if the TLS backend fails to initialize.
        pub fn new() -> Result<Self, TransportError> {
            let http = reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
                .build()
                .map_err(|e| TransportError::ClientBuild(e.to_string()))?;
            Ok(Self { http })
        }
    }

    #[async_trait(?Send)]
    impl Transport for ReqwestTransport {
        async fn post(&self, request: &ProviderRequest) -> Result<TransportReply, TransportError> {
            let mut builder = self.http.post(&request.url);
            for (name, value) in &request.headers {
                builder = builder.header(*name, value);
            }

            let response = builder
                .body(request.body.clone())
                .send()
                .await
                .map_err(|e| TransportError::Request(e.to_string()))?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?;
            Ok(TransportReply { status, body })
        }
    }
}

// =============================================================================
// GLOO (browser)
// =============================================================================

/// `fetch`-based transport via `gloo-net`. Timeouts are the browser's.
#[cfg(feature = "browser")]
#[derive(Debug, Default)]
pub struct GlooTransport;

#[cfg(feature = "browser")]
#[async_trait(?Send)]
impl Transport for GlooTransport {
    async fn post(&self, request: &ProviderRequest) -> Result<TransportReply, TransportError> {
        let mut builder = gloo_net::http::Request::post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .body(request.body.clone())
            .map_err(|e| TransportError::Request(e.to_string()))?
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;
        Ok(TransportReply { status, body })
    }
}
