//! Native runner: the page flow against an in-memory results page.
//!
//! Usage: `answer-panel <search-page-url>`. The credential and model come
//! from `ANSWER_PANEL_*` variables; history persists under
//! `ANSWER_PANEL_PROFILE_DIR` (default `.answer-panel`).

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main(flavor = "current_thread")]
async fn main() -> std::process::ExitCode {
    native::run().await
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;
    use std::process::ExitCode;

    use answer_panel::anchor::{AnchorLayout, AnchorSynchronizer};
    use answer_panel::config::{self, PanelConfig};
    use answer_panel::dom::VirtualDocument;
    use answer_panel::llm::transport::ReqwestTransport;
    use answer_panel::page;
    use answer_panel::pipeline::RequestState;
    use answer_panel::storage::FileStorage;
    use tracing::{error, info, warn};
    use tracing_subscriber::EnvFilter;

    const DEFAULT_PROFILE_DIR: &str = ".answer-panel";

    pub async fn run() -> ExitCode {
        tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

        let Some(page_url) = std::env::args().nth(1) else {
            eprintln!("usage: answer-panel <search-page-url>");
            return ExitCode::from(2);
        };

        let (signal, ready) = config::readiness();
        tokio::spawn(async move { signal.ready(PanelConfig::from_env()) });
        let config = match ready.wait().await {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "using default configuration");
                PanelConfig::default()
            }
        };

        let transport = match ReqwestTransport::new() {
            Ok(transport) => transport,
            Err(e) => {
                error!(error = %e, "HTTP client unavailable");
                return ExitCode::FAILURE;
            }
        };
        let storage = FileStorage::new(profile_dir());
        info!(profile = %storage.dir().display(), "history profile");

        let doc = VirtualDocument::search_page();
        let anchor = AnchorSynchronizer::new(doc.clone(), AnchorLayout::default());
        let outcome = page::run_page(&anchor, &page_url, config, transport, storage).await;
        doc.flush_mutations();

        if let Some(panel) = anchor.panel() {
            print!("{}", doc.outline(panel));
        }
        match outcome.state {
            RequestState::Error { .. } => ExitCode::FAILURE,
            _ => ExitCode::SUCCESS,
        }
    }

    fn profile_dir() -> PathBuf {
        std::env::var_os("ANSWER_PANEL_PROFILE_DIR").map_or_else(|| PathBuf::from(DEFAULT_PROFILE_DIR), PathBuf::from)
    }
}
