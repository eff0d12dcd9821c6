//! In-memory host document.
//!
//! An arena of element nodes rooted at a `body` element, with browser-like
//! child-list observation: mutations under the root only mark the document
//! dirty, and observers run when [`VirtualDocument::flush_mutations`] is
//! called (the microtask checkpoint analogue). Observers may mutate the
//! document; those mutations are delivered in a following round.
//!
//! Selectors are limited to `#id`.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::{DomError, ElementSpec, HostDocument};

/// Upper bound on delivery rounds per flush, so observers that keep
/// mutating cannot spin forever.
const MAX_FLUSH_ROUNDS: usize = 16;

const ROOT: usize = 0;

/// Handle to a node in a [`VirtualDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

struct NodeData {
    tag: String,
    id: Option<String>,
    class: Option<String>,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    parent: Option<usize>,
    children: Vec<usize>,
}

type Observer = (usize, Box<dyn FnMut()>);

struct Inner {
    nodes: RefCell<Vec<NodeData>>,
    observers: RefCell<Vec<Observer>>,
    /// Observers unregistered while a delivery round had them checked out.
    retired: RefCell<Vec<usize>>,
    next_observer: Cell<usize>,
    pending: Cell<bool>,
}

/// Cheaply cloneable handle to one shared in-memory document.
#[derive(Clone)]
pub struct VirtualDocument {
    inner: Rc<Inner>,
}

/// Unregisters its observer when dropped.
pub struct VirtualWatch {
    doc: Weak<Inner>,
    id: usize,
}

impl Drop for VirtualWatch {
    fn drop(&mut self) {
        if let Some(inner) = self.doc.upgrade() {
            inner.observers.borrow_mut().retain(|(id, _)| *id != self.id);
            inner.retired.borrow_mut().push(self.id);
        }
    }
}

impl Default for VirtualDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualDocument {
    /// A document holding only an empty `body`.
    #[must_use]
    pub fn new() -> Self {
        let body = NodeData {
            tag: "body".into(),
            id: None,
            class: None,
            attrs: Vec::new(),
            text: None,
            parent: None,
            children: Vec::new(),
        };
        Self {
            inner: Rc::new(Inner {
                nodes: RefCell::new(vec![body]),
                observers: RefCell::new(Vec::new()),
                retired: RefCell::new(Vec::new()),
                next_observer: Cell::new(0),
                pending: Cell::new(false),
            }),
        }
    }

    /// A results page skeleton: `body > div#rcnt > div#rhs`.
    #[must_use]
    pub fn search_page() -> Self {
        let doc = Self::new();
        let center = doc.alloc(&ElementSpec::new("div").id("rcnt"), None);
        let sidebar = doc.alloc(&ElementSpec::new("div").id("rhs"), None);
        doc.link(center.0, sidebar.0, usize::MAX);
        doc.link(ROOT, center.0, usize::MAX);
        doc.inner.pending.set(false);
        doc
    }

    #[must_use]
    pub fn body(&self) -> NodeId {
        NodeId(ROOT)
    }

    // =========================================================================
    // HOST-SIDE MUTATIONS
    // =========================================================================

    /// Build `spec` and insert it as `parent`'s first child.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Gone`] if `parent` is not a node of this document.
    pub fn insert_first(&self, parent: NodeId, spec: &ElementSpec) -> Result<NodeId, DomError> {
        let node = self.build(spec)?;
        self.prepend(&parent, &node)?;
        Ok(node)
    }

    /// Build `spec` and append it to `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Gone`] if `parent` is not a node of this document.
    pub fn insert_last(&self, parent: NodeId, spec: &ElementSpec) -> Result<NodeId, DomError> {
        let node = self.build(spec)?;
        self.append(&parent, &node)?;
        Ok(node)
    }

    /// Detach `node` from its parent. The subtree stays valid but detached.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Gone`] if `node` is not a node of this document.
    pub fn remove(&self, node: NodeId) -> Result<(), DomError> {
        self.check(node)?;
        self.unlink(node.0);
        Ok(())
    }

    /// Run observers until no mutation is pending. Returns the rounds run.
    pub fn flush_mutations(&self) -> usize {
        let mut rounds = 0;
        while rounds < MAX_FLUSH_ROUNDS && self.inner.pending.replace(false) {
            rounds += 1;
            let mut delivering = std::mem::take(&mut *self.inner.observers.borrow_mut());
            for (_, on_change) in &mut delivering {
                on_change();
            }
            let retired = std::mem::take(&mut *self.inner.retired.borrow_mut());
            delivering.retain(|(id, _)| !retired.contains(id));
            let mut slot = self.inner.observers.borrow_mut();
            delivering.append(&mut slot);
            *slot = delivering;
        }
        rounds
    }

    // =========================================================================
    // INSPECTION
    // =========================================================================

    #[must_use]
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .nodes
            .borrow()
            .get(node.0)
            .map(|n| n.children.iter().copied().map(NodeId).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.nodes.borrow().get(node.0)?.parent.map(NodeId)
    }

    #[must_use]
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.attached(node.0)
    }

    #[must_use]
    pub fn class_of(&self, node: NodeId) -> Option<String> {
        self.inner.nodes.borrow().get(node.0)?.class.clone()
    }

    #[must_use]
    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        let nodes = self.inner.nodes.borrow();
        nodes
            .get(node.0)?
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    /// Concatenated text of `node` and its descendants, in document order.
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        let nodes = self.inner.nodes.borrow();
        let mut out = String::new();
        collect_text(&nodes, node.0, &mut out);
        out
    }

    /// Number of attached elements carrying `id`.
    #[must_use]
    pub fn count_with_id(&self, id: &str) -> usize {
        let nodes = self.inner.nodes.borrow();
        (0..nodes.len())
            .filter(|&i| nodes[i].id.as_deref() == Some(id) && attached_in(&nodes, i))
            .count()
    }

    /// Indented one-line-per-element rendering of `node`'s subtree.
    #[must_use]
    pub fn outline(&self, node: NodeId) -> String {
        let nodes = self.inner.nodes.borrow();
        let mut out = String::new();
        write_outline(&nodes, node.0, 0, &mut out);
        out
    }

    // =========================================================================
    // ARENA
    // =========================================================================

    fn check(&self, node: NodeId) -> Result<(), DomError> {
        if node.0 < self.inner.nodes.borrow().len() { Ok(()) } else { Err(DomError::Gone) }
    }

    fn attached(&self, index: usize) -> bool {
        attached_in(&self.inner.nodes.borrow(), index)
    }

    fn alloc(&self, spec: &ElementSpec, parent: Option<usize>) -> NodeId {
        let index = {
            let mut nodes = self.inner.nodes.borrow_mut();
            nodes.push(NodeData {
                tag: spec.tag.clone(),
                id: spec.id.clone(),
                class: spec.class.clone(),
                attrs: spec.attrs.clone(),
                text: spec.text.clone(),
                parent,
                children: Vec::new(),
            });
            nodes.len() - 1
        };
        for child in &spec.children {
            let child_id = self.alloc(child, Some(index));
            self.inner.nodes.borrow_mut()[index].children.push(child_id.0);
        }
        NodeId(index)
    }

    fn unlink(&self, index: usize) {
        let was_attached = self.attached(index);
        let mut nodes = self.inner.nodes.borrow_mut();
        if let Some(old) = nodes[index].parent.take() {
            nodes[old].children.retain(|&c| c != index);
            if was_attached {
                self.inner.pending.set(true);
            }
        }
    }

    /// Attach `child` under `parent` at `position` (clamped to the end).
    fn link(&self, parent: usize, child: usize, position: usize) {
        self.unlink(child);
        let mut nodes = self.inner.nodes.borrow_mut();
        let children = &mut nodes[parent].children;
        let at = position.min(children.len());
        children.insert(at, child);
        nodes[child].parent = Some(parent);
        drop(nodes);
        if self.attached(parent) {
            self.inner.pending.set(true);
        }
    }

    fn insert(&self, parent: &NodeId, child: &NodeId, position: usize) -> Result<(), DomError> {
        self.check(*parent)?;
        self.check(*child)?;
        if child.0 == ROOT || self.is_ancestor(child.0, parent.0) {
            return Err(DomError::Host("insertion would create a cycle".into()));
        }
        self.link(parent.0, child.0, position);
        Ok(())
    }

    fn is_ancestor(&self, candidate: usize, mut node: usize) -> bool {
        let nodes = self.inner.nodes.borrow();
        loop {
            if node == candidate {
                return true;
            }
            match nodes[node].parent {
                Some(p) => node = p,
                None => return false,
            }
        }
    }

    fn find_id_from(&self, start: usize, id: &str) -> Option<NodeId> {
        let nodes = self.inner.nodes.borrow();
        let mut stack = vec![start];
        while let Some(i) = stack.pop() {
            if nodes[i].id.as_deref() == Some(id) {
                return Some(NodeId(i));
            }
            stack.extend(nodes[i].children.iter().rev());
        }
        None
    }
}

fn attached_in(nodes: &[NodeData], mut index: usize) -> bool {
    loop {
        if index == ROOT {
            return true;
        }
        match nodes.get(index).and_then(|n| n.parent) {
            Some(p) => index = p,
            None => return false,
        }
    }
}

fn collect_text(nodes: &[NodeData], index: usize, out: &mut String) {
    let Some(node) = nodes.get(index) else {
        return;
    };
    if let Some(text) = &node.text {
        out.push_str(text);
    }
    for &child in &node.children {
        collect_text(nodes, child, out);
    }
}

fn write_outline(nodes: &[NodeData], index: usize, depth: usize, out: &mut String) {
    let Some(node) = nodes.get(index) else {
        return;
    };
    out.push_str(&"  ".repeat(depth));
    out.push('<');
    out.push_str(&node.tag);
    if let Some(id) = &node.id {
        out.push_str(&format!("#{id}"));
    }
    if let Some(class) = &node.class {
        out.push_str(&format!(".{class}"));
    }
    out.push('>');
    if let Some(text) = &node.text {
        out.push_str(&format!(" {text:?}"));
    }
    out.push('\n');
    for &child in &node.children {
        write_outline(nodes, child, depth + 1, out);
    }
}

impl HostDocument for VirtualDocument {
    type Node = NodeId;
    type Watch = VirtualWatch;

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_id_from(ROOT, id)
    }

    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        selector.strip_prefix('#').and_then(|id| self.element_by_id(id))
    }

    fn descendant_by_id(&self, root: &NodeId, id: &str) -> Option<NodeId> {
        self.check(*root).ok()?;
        self.find_id_from(root.0, id)
    }

    fn first_element_child(&self, parent: &NodeId) -> Option<NodeId> {
        self.inner.nodes.borrow().get(parent.0)?.children.first().copied().map(NodeId)
    }

    fn build(&self, spec: &ElementSpec) -> Result<NodeId, DomError> {
        Ok(self.alloc(spec, None))
    }

    fn prepend(&self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        self.insert(parent, child, 0)
    }

    fn append(&self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        self.insert(parent, child, usize::MAX)
    }

    fn clear_children(&self, parent: &NodeId) -> Result<(), DomError> {
        self.check(*parent)?;
        for child in self.children(*parent) {
            self.unlink(child.0);
        }
        Ok(())
    }

    fn observe_child_lists(&self, on_change: Box<dyn FnMut()>) -> Result<VirtualWatch, DomError> {
        let id = self.inner.next_observer.get();
        self.inner.next_observer.set(id + 1);
        self.inner.observers.borrow_mut().push((id, on_change));
        Ok(VirtualWatch { doc: Rc::downgrade(&self.inner), id })
    }
}

#[cfg(test)]
#[path = "virtual_dom_test.rs"]
mod tests;
