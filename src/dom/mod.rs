//! Host document seam.
//!
//! SYSTEM CONTEXT
//! ==============
//! The search page owns its DOM and rewrites it whenever it likes. The panel
//! code never caches the host's structure; it looks things up, moves its own
//! nodes, and subscribes to child-list changes through
//! [`HostDocument::observe_child_lists`].
//!
//! [`VirtualDocument`] is an in-memory implementation used by tests and the
//! native binary. The `browser` feature adds `BrowserDocument` over `web-sys`.

mod virtual_dom;

#[cfg(feature = "browser")]
mod browser_dom;

#[cfg(feature = "browser")]
pub use browser_dom::{BrowserDocument, BrowserWatch};
pub use virtual_dom::{NodeId, VirtualDocument, VirtualWatch};

/// Errors from host document operations.
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    /// The host rejected the operation.
    #[error("host DOM operation failed: {0}")]
    Host(String),

    /// The node handle no longer refers to a node.
    #[error("node is gone")]
    Gone,

    /// Rendering was requested before the panel was mounted.
    #[error("panel is not mounted")]
    NotMounted,
}

// =============================================================================
// ELEMENT SPEC
// =============================================================================

/// Pure description of an element subtree.
///
/// `text` is always applied as text content, never parsed as markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSpec {
    pub tag: String,
    pub id: Option<String>,
    pub class: Option<String>,
    pub attrs: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), ..Self::default() }
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }
}

// =============================================================================
// HOST DOCUMENT
// =============================================================================

/// Operations the panel needs from a document it does not own.
///
/// Insertion methods move a node that is already attached elsewhere, as DOM
/// insertion does.
pub trait HostDocument {
    type Node: Clone + PartialEq + std::fmt::Debug;

    /// Keeps a child-list subscription alive while held.
    type Watch;

    /// Attached element with `id`.
    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// First attached element matching `selector`.
    fn query_selector(&self, selector: &str) -> Option<Self::Node>;

    /// Element with `id` inside `root`'s subtree, attached or not.
    fn descendant_by_id(&self, root: &Self::Node, id: &str) -> Option<Self::Node>;

    fn first_element_child(&self, parent: &Self::Node) -> Option<Self::Node>;

    /// Create a detached subtree from `spec`.
    ///
    /// # Errors
    ///
    /// Returns a [`DomError`] if the host refuses to create an element.
    fn build(&self, spec: &ElementSpec) -> Result<Self::Node, DomError>;

    /// Make `child` the first child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns a [`DomError`] if the host rejects the insertion.
    fn prepend(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

    /// Make `child` the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns a [`DomError`] if the host rejects the insertion.
    fn append(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

    /// Remove every child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns a [`DomError`] if the host rejects the removal.
    fn clear_children(&self, parent: &Self::Node) -> Result<(), DomError>;

    /// Call `on_change` after any child list in the document changes.
    ///
    /// Delivery is batched: one call may cover many mutations.
    ///
    /// # Errors
    ///
    /// Returns a [`DomError`] if the host cannot install the observer.
    fn observe_child_lists(&self, on_change: Box<dyn FnMut()>) -> Result<Self::Watch, DomError>;
}
