//! Anchor synchronizer: keeps the panel first in the host sidebar.
//!
//! DESIGN
//! ======
//! The synchronizer owns the panel's identity: it holds the handles of the
//! panel root and body once mounted, and only ever moves the root. The
//! subtree (and whatever the renderer put in it) survives every re-pin.
//!
//! The host rewrites the sidebar at unpredictable times, so `keep_pinned`
//! subscribes to the document's child-list feed rather than inspecting the
//! sidebar once. The subscription covers the whole document, which also
//! catches the sidebar's first appearance.
//!
//! The watch may be installed before any sidebar exists. Until a panel is
//! mounted, each notification retries the mount; the first successful one
//! replays the most recent rendered state and runs the mount hook.
//!
//! A sidebar that disappears for good leaves the panel detached until the
//! next navigation. That is not reported as an error.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::dom::{DomError, ElementSpec, HostDocument};
use crate::pipeline::RequestState;
use crate::render;

/// Where the panel lives and what it is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorLayout {
    /// Selector of the host sidebar.
    pub container_selector: String,
    /// Id given to a sidebar created by the panel.
    pub container_id: String,
    /// Selector of the element a missing sidebar is appended to.
    pub fallback_parent_selector: String,
    pub panel_id: String,
    pub body_id: String,
    pub settings_id: String,
}

impl Default for AnchorLayout {
    fn default() -> Self {
        Self {
            container_selector: "#rhs".into(),
            container_id: "rhs".into(),
            fallback_parent_selector: "#rcnt".into(),
            panel_id: "answer-panel".into(),
            body_id: "answer-panel-body".into(),
            settings_id: "answer-panel-settings".into(),
        }
    }
}

/// Result of one pin check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOutcome {
    /// Nothing mounted yet.
    NotMounted,
    /// The sidebar is not in the document.
    NoContainer,
    AlreadyFirst,
    Repositioned,
}

struct Mounted<N> {
    root: N,
    body: N,
}

type MountHook<N> = Box<dyn Fn(&N)>;

/// Mounts the panel and keeps it pinned. Clones share the mounted panel,
/// the last rendered state and the mount hook.
pub struct AnchorSynchronizer<D: HostDocument> {
    doc: D,
    layout: Rc<AnchorLayout>,
    mounted: Rc<RefCell<Option<Mounted<D::Node>>>>,
    last_state: Rc<RefCell<Option<RequestState>>>,
    on_mount: Rc<RefCell<Option<MountHook<D::Node>>>>,
}

impl<D: HostDocument + Clone> Clone for AnchorSynchronizer<D> {
    fn clone(&self) -> Self {
        Self {
            doc: self.doc.clone(),
            layout: Rc::clone(&self.layout),
            mounted: Rc::clone(&self.mounted),
            last_state: Rc::clone(&self.last_state),
            on_mount: Rc::clone(&self.on_mount),
        }
    }
}

impl<D: HostDocument> AnchorSynchronizer<D> {
    pub fn new(doc: D, layout: AnchorLayout) -> Self {
        Self {
            doc,
            layout: Rc::new(layout),
            mounted: Rc::new(RefCell::new(None)),
            last_state: Rc::new(RefCell::new(None)),
            on_mount: Rc::new(RefCell::new(None)),
        }
    }

    /// Run `hook` with the panel root each time a new panel is taken into use,
    /// built or adopted. Applies to the current panel too if one is mounted.
    pub fn on_mount(&self, hook: impl Fn(&D::Node) + 'static) {
        if let Some(root) = self.panel() {
            hook(&root);
        }
        *self.on_mount.borrow_mut() = Some(Box::new(hook));
    }

    #[must_use]
    pub fn document(&self) -> &D {
        &self.doc
    }

    #[must_use]
    pub fn layout(&self) -> &AnchorLayout {
        &self.layout
    }

    /// The mounted panel root, if any.
    #[must_use]
    pub fn panel(&self) -> Option<D::Node> {
        self.mounted.borrow().as_ref().map(|m| m.root.clone())
    }

    /// Make sure exactly one panel exists, first in the sidebar.
    ///
    /// Idempotent. A panel already in the document is adopted; a panel this
    /// synchronizer built earlier is re-attached rather than rebuilt; only
    /// when neither exists is a fresh panel built. A missing sidebar is
    /// created under the fallback parent first.
    ///
    /// An element that carries the panel id but has no panel body is not a
    /// panel this code can render into; nothing is mounted in that case.
    ///
    /// # Errors
    ///
    /// Returns a [`DomError`] if the host rejects an insertion.
    pub fn ensure_mounted(&self) -> Result<Option<D::Node>, DomError> {
        if let Some(existing) = self.doc.element_by_id(&self.layout.panel_id) {
            if self.adopt(&existing) {
                return Ok(Some(existing));
            }
            warn!(panel = %self.layout.panel_id, "foreign element holds the panel id; not mounting");
            return Ok(None);
        }

        let Some(container) = self.ensure_container()? else {
            debug!(selector = %self.layout.fallback_parent_selector, "no place to mount the panel");
            return Ok(None);
        };

        if let Some(root) = self.panel() {
            self.doc.prepend(&container, &root)?;
            return Ok(Some(root));
        }

        let root = self.doc.build(&scaffold(&self.layout))?;
        let body = self
            .doc
            .descendant_by_id(&root, &self.layout.body_id)
            .ok_or(DomError::Gone)?;
        self.doc.prepend(&container, &root)?;
        *self.mounted.borrow_mut() = Some(Mounted { root: root.clone(), body });
        debug!(panel = %self.layout.panel_id, "panel mounted");
        self.first_mount(&root);
        Ok(Some(root))
    }

    /// Move the panel back to first position in the sidebar if it is not there.
    pub fn pin(&self) -> PinOutcome {
        let Some(root) = self.panel() else {
            return PinOutcome::NotMounted;
        };
        let Some(container) = self.doc.query_selector(&self.layout.container_selector) else {
            return PinOutcome::NoContainer;
        };
        if self.doc.first_element_child(&container).as_ref() == Some(&root) {
            return PinOutcome::AlreadyFirst;
        }
        match self.doc.prepend(&container, &root) {
            Ok(()) => {
                debug!("panel re-pinned to top of sidebar");
                PinOutcome::Repositioned
            }
            Err(e) => {
                debug!(error = %e, "panel re-pin failed");
                PinOutcome::NoContainer
            }
        }
    }

    /// Subscribe to the document's child lists and re-pin on every change.
    ///
    /// Works before the sidebar exists: while nothing is mounted, each
    /// change retries [`ensure_mounted`](Self::ensure_mounted). The returned
    /// watch must be held for as long as pinning should last.
    ///
    /// # Errors
    ///
    /// Returns a [`DomError`] if the host cannot install the observer.
    pub fn keep_pinned(&self) -> Result<D::Watch, DomError>
    where
        D: Clone + 'static,
    {
        let sync = self.clone();
        self.doc.observe_child_lists(Box::new(move || {
            if sync.panel().is_none() {
                if let Err(e) = sync.ensure_mounted() {
                    debug!(error = %e, "deferred mount failed");
                }
            }
            sync.pin();
        }))
    }

    /// Render `state` into the panel body.
    ///
    /// The state is remembered either way and replayed when a panel is
    /// first mounted later.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NotMounted`] before a successful mount, or the
    /// host's error if the update is rejected.
    pub fn render(&self, state: &RequestState) -> Result<(), DomError> {
        *self.last_state.borrow_mut() = Some(state.clone());
        let body = self
            .mounted
            .borrow()
            .as_ref()
            .map(|m| m.body.clone())
            .ok_or(DomError::NotMounted)?;
        render::render_into(&self.doc, &body, state)
    }

    fn ensure_container(&self) -> Result<Option<D::Node>, DomError> {
        if let Some(container) = self.doc.query_selector(&self.layout.container_selector) {
            return Ok(Some(container));
        }
        let Some(parent) = self.doc.query_selector(&self.layout.fallback_parent_selector) else {
            return Ok(None);
        };
        let container = self.doc.build(&ElementSpec::new("div").id(self.layout.container_id.clone()))?;
        self.doc.append(&parent, &container)?;
        debug!(id = %self.layout.container_id, "created missing sidebar");
        Ok(Some(container))
    }

    /// Take `root` into use. `false` if it has no panel body.
    fn adopt(&self, root: &D::Node) -> bool {
        if self.mounted.borrow().as_ref().is_some_and(|m| &m.root == root) {
            return true;
        }
        let Some(body) = self.doc.descendant_by_id(root, &self.layout.body_id) else {
            return false;
        };
        *self.mounted.borrow_mut() = Some(Mounted { root: root.clone(), body });
        debug!(panel = %self.layout.panel_id, "existing panel adopted");
        self.first_mount(root);
        true
    }

    /// Replay the remembered state into a newly used panel and run the hook.
    fn first_mount(&self, root: &D::Node) {
        let replay = self.last_state.borrow().clone();
        if let Some(state) = replay {
            if let Err(e) = self.render(&state) {
                warn!(error = %e, "replaying panel state failed");
            }
        }
        if let Some(hook) = self.on_mount.borrow().as_ref() {
            hook(root);
        }
    }
}

/// Panel root with header (title, settings affordance) and an empty body.
#[must_use]
pub fn scaffold(layout: &AnchorLayout) -> ElementSpec {
    let title = ElementSpec::new("div")
        .class("answer-panel-title")
        .child(
            ElementSpec::new("img")
                .attr("src", "https://www.anthropic.com/favicon.ico")
                .attr("alt", ""),
        )
        .child(ElementSpec::new("span").text("AI Analysis"));
    let settings = ElementSpec::new("div")
        .id(layout.settings_id.clone())
        .class("answer-panel-settings")
        .attr("title", "Settings")
        .attr("role", "button")
        .text("⚙️");

    ElementSpec::new("div").id(layout.panel_id.clone()).child(
        ElementSpec::new("div")
            .class("answer-panel-container")
            .child(ElementSpec::new("div").class("answer-panel-header").child(title).child(settings))
            .child(ElementSpec::new("div").id(layout.body_id.clone()).class("answer-panel-body")),
    )
}

#[cfg(test)]
#[path = "anchor_test.rs"]
mod tests;
