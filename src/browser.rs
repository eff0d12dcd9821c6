//! Browser entry point (`browser` feature).
//!
//! SYSTEM CONTEXT
//! ==============
//! Runs once per page load inside the search page. Waits for the document
//! and the stored settings to be ready, then runs the page flow. The panel
//! may mount late, once the host builds its sidebar; the settings affordance
//! is wired whenever a panel is first mounted. The pinning watch is parked
//! in a thread-local for the page's lifetime.

use std::cell::RefCell;

use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CustomEvent, CustomEventInit, DocumentReadyState, Element, Event};

use crate::anchor::{AnchorLayout, AnchorSynchronizer};
use crate::config::{self, PanelConfig, SETTINGS_KEY};
use crate::dom::{BrowserDocument, BrowserWatch, HostDocument};
use crate::llm::transport::GlooTransport;
use crate::page;
use crate::storage::{KeyValueStore, LocalStorage, MemoryStorage};

/// Bubbling DOM event the settings collaborator listens for.
pub const OPEN_SETTINGS_EVENT: &str = "answer-panel:open-settings";

thread_local! {
    static PAGE_WATCH: RefCell<Option<BrowserWatch>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"answer-panel: logger already installed".into());
    }
    wasm_bindgen_futures::spawn_local(run());
}

async fn run() {
    let Some(document) = BrowserDocument::current() else {
        return;
    };
    let config = match config::wait_for(|| settings_when_ready(&document), gloo_timers::future::sleep).await {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "settings unavailable; using defaults");
            PanelConfig::default()
        }
    };

    let anchor = AnchorSynchronizer::new(document.clone(), AnchorLayout::default());
    let settings_id = anchor.layout().settings_id.clone();
    let host = document.clone();
    anchor.on_mount(move |panel| wire_settings(&host, panel, &settings_id));

    let page_url = web_sys::window()
        .and_then(|w| w.location().href().ok())
        .unwrap_or_default();
    let storage: Box<dyn KeyValueStore> = match LocalStorage::open() {
        Some(local) => Box::new(local),
        None => Box::new(MemoryStorage::new()),
    };

    let outcome = page::run_page(&anchor, &page_url, config, GlooTransport, &*storage).await;
    PAGE_WATCH.with(|slot| *slot.borrow_mut() = outcome.watch);
}

/// `Some` once the document has parsed; the stored record or defaults.
fn settings_when_ready(document: &BrowserDocument) -> Option<PanelConfig> {
    if document.document().ready_state() == DocumentReadyState::Loading {
        return None;
    }
    let Some(raw) = LocalStorage::open().and_then(|s| s.get(SETTINGS_KEY)) else {
        return Some(PanelConfig::default());
    };
    match PanelConfig::from_settings_json(&raw) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(error = %e, "stored settings unreadable; using defaults");
            Some(PanelConfig::default())
        }
    }
}

fn wire_settings(document: &BrowserDocument, panel: &Element, settings_id: &str) {
    let Some(button) = document.descendant_by_id(panel, settings_id) else {
        return;
    };
    let target = button.clone();
    let on_click = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
        let init = CustomEventInit::new();
        init.set_bubbles(true);
        match CustomEvent::new_with_event_init_dict(OPEN_SETTINGS_EVENT, &init) {
            Ok(event) => {
                if target.dispatch_event(&event).is_err() {
                    warn!("open-settings dispatch failed");
                }
            }
            Err(e) => warn!(error = ?e, "open-settings event could not be created"),
        }
    });
    if button
        .add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
        .is_err()
    {
        warn!("settings affordance listener not installed");
    }
    on_click.forget();
}
