use super::*;
use std::cell::Cell;

/// # Safety
/// Only one test in this crate touches `ANSWER_PANEL_*` variables.
unsafe fn clear_panel_env() {
    unsafe {
        std::env::remove_var("ANSWER_PANEL_API_KEY");
        std::env::remove_var("ANSWER_PANEL_MODEL");
        std::env::remove_var("ANSWER_PANEL_MAX_TOKENS");
        std::env::remove_var("ANSWER_PANEL_API_URL");
    }
}

#[test]
fn from_env_defaults_then_overrides() {
    unsafe { clear_panel_env() };

    let cfg = PanelConfig::from_env();
    assert_eq!(cfg, PanelConfig::default());
    assert_eq!(cfg.credential(), None);

    unsafe {
        std::env::set_var("ANSWER_PANEL_API_KEY", "  sk-test  ");
        std::env::set_var("ANSWER_PANEL_MODEL", "claude-3-haiku-20240307");
        std::env::set_var("ANSWER_PANEL_MAX_TOKENS", "lots");
        std::env::set_var("ANSWER_PANEL_API_URL", "http://localhost:9/v1/messages");
    }

    let cfg = PanelConfig::from_env();
    assert_eq!(cfg.credential(), Some("sk-test"));
    assert_eq!(cfg.model, "claude-3-haiku-20240307");
    assert_eq!(cfg.max_tokens, DEFAULT_MAX_TOKENS);
    assert_eq!(cfg.api_url, "http://localhost:9/v1/messages");

    unsafe { clear_panel_env() };
}

#[test]
fn settings_record_fills_missing_fields_with_defaults() {
    let cfg = PanelConfig::from_settings_json(r#"{"apiKey":"sk-1","maxTokens":256}"#).unwrap();
    assert_eq!(cfg.credential(), Some("sk-1"));
    assert_eq!(cfg.max_tokens, 256);
    assert_eq!(cfg.model, DEFAULT_MODEL);
    assert_eq!(cfg.api_url, DEFAULT_API_URL);
}

#[test]
fn settings_blank_key_counts_as_absent() {
    let cfg = PanelConfig::from_settings_json(r#"{"apiKey":"   "}"#).unwrap();
    assert_eq!(cfg.credential(), None);
}

#[test]
fn settings_malformed_record_is_parse_error() {
    let err = PanelConfig::from_settings_json("[1, 2]").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[tokio::test]
async fn readiness_delivers_published_config() {
    let (signal, ready) = readiness();
    let cfg = PanelConfig { api_key: Some("k".into()), ..PanelConfig::default() };
    signal.ready(cfg.clone());
    assert_eq!(ready.wait().await.unwrap(), cfg);
}

#[tokio::test]
async fn readiness_dropped_signal_is_never_ready() {
    let (signal, ready) = readiness();
    drop(signal);
    assert!(matches!(ready.wait().await, Err(ConfigError::NeverReady)));
}

#[tokio::test]
async fn wait_for_polls_until_probe_succeeds() {
    let probes = Cell::new(0u32);
    let sleeps = Cell::new(0u32);
    let cfg = wait_for(
        || {
            probes.set(probes.get() + 1);
            (probes.get() == 3).then(PanelConfig::default)
        },
        |interval| {
            assert_eq!(interval, CONFIG_POLL_INTERVAL);
            sleeps.set(sleeps.get() + 1);
            std::future::ready(())
        },
    )
    .await
    .unwrap();

    assert_eq!(cfg, PanelConfig::default());
    assert_eq!(probes.get(), 3);
    assert_eq!(sleeps.get(), 2);
}

#[tokio::test]
async fn wait_for_gives_up_after_bounded_attempts() {
    let probes = Cell::new(0u32);
    let result = wait_for(
        || {
            probes.set(probes.get() + 1);
            None
        },
        |_| std::future::ready(()),
    )
    .await;

    assert!(matches!(result, Err(ConfigError::NeverReady)));
    assert_eq!(probes.get(), CONFIG_POLL_ATTEMPTS);
}
