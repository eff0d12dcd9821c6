//! `web-sys` host document for the live search page.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, MutationObserver, MutationObserverInit};

use super::{DomError, ElementSpec, HostDocument};

fn host_err(e: JsValue) -> DomError {
    DomError::Host(format!("{e:?}"))
}

/// The window's document.
#[derive(Debug, Clone)]
pub struct BrowserDocument {
    document: Document,
}

/// Owns the `MutationObserver` and its callback; disconnects on drop.
pub struct BrowserWatch {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
}

impl Drop for BrowserWatch {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

impl BrowserDocument {
    /// The current window's document, if running in a page.
    #[must_use]
    pub fn current() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(Self { document })
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl HostDocument for BrowserDocument {
    type Node = Element;
    type Watch = BrowserWatch;

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn query_selector(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn descendant_by_id(&self, root: &Element, id: &str) -> Option<Element> {
        if root.id() == id {
            return Some(root.clone());
        }
        root.query_selector(&format!("#{id}")).ok().flatten()
    }

    fn first_element_child(&self, parent: &Element) -> Option<Element> {
        parent.first_element_child()
    }

    fn build(&self, spec: &ElementSpec) -> Result<Element, DomError> {
        let el = self.document.create_element(&spec.tag).map_err(host_err)?;
        if let Some(id) = &spec.id {
            el.set_id(id);
        }
        if let Some(class) = &spec.class {
            el.set_class_name(class);
        }
        for (name, value) in &spec.attrs {
            el.set_attribute(name, value).map_err(host_err)?;
        }
        if let Some(text) = &spec.text {
            el.set_text_content(Some(text));
        }
        for child in &spec.children {
            let node = self.build(child)?;
            el.append_child(&node).map_err(host_err)?;
        }
        Ok(el)
    }

    fn prepend(&self, parent: &Element, child: &Element) -> Result<(), DomError> {
        parent.prepend_with_node_1(child).map_err(host_err)
    }

    fn append(&self, parent: &Element, child: &Element) -> Result<(), DomError> {
        parent.append_child(child).map(|_| ()).map_err(host_err)
    }

    fn clear_children(&self, parent: &Element) -> Result<(), DomError> {
        parent.set_text_content(None);
        Ok(())
    }

    fn observe_child_lists(&self, mut on_change: Box<dyn FnMut()>) -> Result<BrowserWatch, DomError> {
        let target = self
            .document
            .document_element()
            .ok_or_else(|| DomError::Host("document has no root element".into()))?;
        let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |_records: js_sys::Array, _observer: MutationObserver| on_change(),
        );
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref()).map_err(host_err)?;
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer.observe_with_options(&target, &init).map_err(host_err)?;
        Ok(BrowserWatch { observer, _callback: callback })
    }
}
