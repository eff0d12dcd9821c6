//! Page flow: scaffold, pin, query, request, render.
//!
//! DESIGN
//! ======
//! Ordering is sequenced, not raced: the panel is mounted before the request
//! is submitted, and the terminal state is rendered only after `submit`
//! returns. The anchor watch runs alongside from setup onward and has no
//! ordering tie to the request. On a page whose sidebar appears late, the
//! watch mounts the panel then and replays whatever state was last shown.

use tracing::{debug, info, warn};
use url::Url;

use crate::anchor::AnchorSynchronizer;
use crate::config::PanelConfig;
use crate::dom::{DomError, HostDocument};
use crate::history::HistoryStore;
use crate::llm::transport::Transport;
use crate::pipeline::{RequestState, ResponsePipeline};
use crate::storage::KeyValueStore;

/// URL parameter carrying the search term.
pub const QUERY_PARAM: &str = "q";

/// What a page run leaves behind.
pub struct PageOutcome<W> {
    /// Terminal state, or `Idle` when the page had no query.
    pub state: RequestState,
    /// Pinning subscription. Hold it for the page's lifetime.
    pub watch: Option<W>,
}

/// The non-blank search term in `page_url`, percent- and plus-decoded.
#[must_use]
pub fn query_from_url(page_url: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    url.query_pairs()
        .find(|(name, _)| name == QUERY_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.trim().is_empty())
}

/// Run the whole flow for one page load.
///
/// Scaffolding always happens. Without a query nothing is requested or
/// rendered into the body.
pub async fn run_page<D, T, S>(
    anchor: &AnchorSynchronizer<D>,
    page_url: &str,
    config: PanelConfig,
    transport: T,
    storage: S,
) -> PageOutcome<D::Watch>
where
    D: HostDocument + Clone + 'static,
    T: Transport,
    S: KeyValueStore,
{
    if let Err(e) = anchor.ensure_mounted() {
        warn!(error = %e, "panel scaffold failed");
    }
    let watch = match anchor.keep_pinned() {
        Ok(watch) => Some(watch),
        Err(e) => {
            warn!(error = %e, "anchor watch unavailable");
            None
        }
    };

    let Some(query) = query_from_url(page_url) else {
        info!("no search query on this page");
        return PageOutcome { state: RequestState::Idle, watch };
    };

    show(anchor, &RequestState::Loading);
    let pipeline = ResponsePipeline::new(config, transport, HistoryStore::new(storage));
    let state = pipeline.submit(&query).await;
    show(anchor, &state);

    PageOutcome { state, watch }
}

fn show<D: HostDocument>(anchor: &AnchorSynchronizer<D>, state: &RequestState) {
    match anchor.render(state) {
        Ok(()) => {}
        Err(DomError::NotMounted) => debug!("no sidebar yet; state held for the first mount"),
        Err(e) => warn!(error = %e, "panel render failed"),
    }
}

#[cfg(test)]
#[path = "page_test.rs"]
mod tests;
