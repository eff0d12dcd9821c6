//! Panel configuration: credential, model and response-size limit.
//!
//! DESIGN
//! ======
//! The settings form that owns these values is an external collaborator.
//! This module only reads them: once loaded, a [`PanelConfig`] is cloned
//! into the prompt builder and response pipeline and never mutated.
//!
//! The collaborator initializes asynchronously, so [`readiness`] hands out
//! a one-shot signal the page awaits before it proceeds. Collaborators
//! without a completion notification go through [`wait_for`], which polls
//! on a fixed, bounded schedule.

use std::future::Future;
use std::time::Duration;

use futures::channel::oneshot;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Models offered by the settings form.
pub const SUPPORTED_MODELS: [&str; 3] = ["claude-3-5-sonnet-20241022", "claude-3-5-haiku-20241022", "claude-3-haiku-20240307"];

/// Slot the settings collaborator writes its record to.
pub const SETTINGS_KEY: &str = "answer_panel_settings";

/// Delay between readiness probes in [`wait_for`].
pub const CONFIG_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Probes attempted by [`wait_for`] before giving up.
pub const CONFIG_POLL_ATTEMPTS: u32 = 100;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The stored settings record could not be decoded.
    #[error("settings parse failed: {0}")]
    Parse(String),

    /// The readiness signal was dropped or polling ran out of attempts.
    #[error("configuration never became ready")]
    NeverReady,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelConfig {
    /// Provider credential. `None` when unset or blank.
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub api_url: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_url: DEFAULT_API_URL.to_owned(),
        }
    }
}

impl PanelConfig {
    /// Build config from environment variables.
    ///
    /// - `ANSWER_PANEL_API_KEY`: provider credential
    /// - `ANSWER_PANEL_MODEL`: default `claude-3-5-sonnet-20241022`
    /// - `ANSWER_PANEL_MAX_TOKENS`: default 1024
    /// - `ANSWER_PANEL_API_URL`: default Anthropic Messages endpoint
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let model = std::env::var("ANSWER_PANEL_MODEL").unwrap_or(defaults.model);
        check_model(&model);
        Self {
            api_key: normalize_key(std::env::var("ANSWER_PANEL_API_KEY").ok()),
            model,
            max_tokens: std::env::var("ANSWER_PANEL_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(DEFAULT_MAX_TOKENS),
            api_url: std::env::var("ANSWER_PANEL_API_URL").unwrap_or(defaults.api_url),
        }
    }

    /// Build config from the settings collaborator's stored record.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if `raw` is not a settings object.
    pub fn from_settings_json(raw: &str) -> Result<Self, ConfigError> {
        let record: SettingsRecord = serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let defaults = Self::default();
        let model = record.model.unwrap_or(defaults.model);
        check_model(&model);
        Ok(Self {
            api_key: normalize_key(record.api_key),
            model,
            max_tokens: record.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            api_url: defaults.api_url,
        })
    }

    /// The credential, if one is configured.
    #[must_use]
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsRecord {
    model: Option<String>,
    api_key: Option<String>,
    max_tokens: Option<u32>,
}

fn normalize_key(raw: Option<String>) -> Option<String> {
    raw.map(|k| k.trim().to_owned()).filter(|k| !k.is_empty())
}

fn check_model(model: &str) {
    if !SUPPORTED_MODELS.contains(&model) {
        warn!(%model, "model is not one of the offered options; passing through");
    }
}

// =============================================================================
// READINESS
// =============================================================================

/// Sender half of the readiness handshake, held by the settings collaborator.
pub struct ReadySignal(oneshot::Sender<PanelConfig>);

/// Receiver half, awaited by the page before it proceeds.
pub struct ConfigReady(oneshot::Receiver<PanelConfig>);

/// Create a one-shot readiness pair.
#[must_use]
pub fn readiness() -> (ReadySignal, ConfigReady) {
    let (tx, rx) = oneshot::channel();
    (ReadySignal(tx), ConfigReady(rx))
}

impl ReadySignal {
    /// Publish the loaded configuration. Later calls are impossible by construction.
    pub fn ready(self, config: PanelConfig) {
        if self.0.send(config).is_err() {
            warn!("configuration published after the page stopped waiting");
        }
    }
}

impl ConfigReady {
    /// Wait for the collaborator to publish its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NeverReady`] if the signal was dropped unsent.
    pub async fn wait(self) -> Result<PanelConfig, ConfigError> {
        self.0.await.map_err(|_| ConfigError::NeverReady)
    }
}

/// Poll `probe` every [`CONFIG_POLL_INTERVAL`] until it yields a config.
///
/// `sleep` supplies the platform timer. Gives up after
/// [`CONFIG_POLL_ATTEMPTS`] probes.
///
/// # Errors
///
/// Returns [`ConfigError::NeverReady`] when the attempts are exhausted.
pub async fn wait_for<P, S, F>(mut probe: P, sleep: S) -> Result<PanelConfig, ConfigError>
where
    P: FnMut() -> Option<PanelConfig>,
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    for _ in 0..CONFIG_POLL_ATTEMPTS {
        if let Some(config) = probe() {
            return Ok(config);
        }
        sleep(CONFIG_POLL_INTERVAL).await;
    }
    Err(ConfigError::NeverReady)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
