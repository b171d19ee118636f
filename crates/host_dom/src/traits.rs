//! Document interface the overlay bridge is written against.
//!
//! The bridge never owns host nodes. It holds [`NodeKey`]s as back-references
//! and re-resolves them through this trait, so any backend that can answer
//! these queries (the in-memory [`Document`](crate::Document), or a real
//! browser binding) can host the overlay.

use crate::error::DomError;
use crate::event::Event;
use crate::mutation::MutationRecord;
use crate::selector::Selector;
use crate::types::NodeKey;

pub trait HostDocument {
    // =========================================================================
    // Location
    // =========================================================================

    /// Full href of the current location.
    fn location(&self) -> &str;

    // =========================================================================
    // Queries
    // =========================================================================

    fn root(&self) -> NodeKey;

    /// First element matching `selector` in document order, attached nodes only.
    fn query_selector(&self, selector: &Selector) -> Option<NodeKey>;

    fn query_selector_all(&self, selector: &Selector) -> Vec<NodeKey>;

    /// Returns `true` if `key` is reachable from the document root.
    fn is_attached(&self, key: NodeKey) -> bool;

    fn parent(&self, key: NodeKey) -> Option<NodeKey>;

    fn children(&self, key: NodeKey) -> Vec<NodeKey>;

    fn attribute(&self, key: NodeKey, name: &str) -> Option<&str>;

    /// Concatenated text of `key` and its descendants.
    fn text_content(&self, key: NodeKey) -> Option<String>;

    /// Inline style declaration on an element.
    fn style_property(&self, key: NodeKey, name: &str) -> Option<&str>;

    // =========================================================================
    // Mutation
    // =========================================================================

    fn create_element(&mut self, name: &str) -> NodeKey;

    fn create_text(&mut self, text: &str) -> NodeKey;

    fn set_attribute(&mut self, key: NodeKey, name: &str, value: &str) -> Result<(), DomError>;

    /// Set (`Some`) or remove (`None`) an inline style declaration.
    fn set_style_property(
        &mut self,
        key: NodeKey,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), DomError>;

    fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), DomError>;

    fn insert_before(
        &mut self,
        parent: NodeKey,
        child: NodeKey,
        before: NodeKey,
    ) -> Result<(), DomError>;

    /// Detach `key` from its parent. Removing a detached node is a no-op.
    fn remove(&mut self, key: NodeKey) -> Result<(), DomError>;

    /// Detach `key` and free it with its subtree. Released keys are never
    /// valid again.
    fn release(&mut self, key: NodeKey) -> Result<(), DomError>;

    /// Replace all children of `key` with a single text node (none if `text` is empty).
    fn set_text_content(&mut self, key: NodeKey, text: &str) -> Result<(), DomError>;

    // =========================================================================
    // Events & observation
    // =========================================================================

    /// Deliver a synthetic event at an attached target.
    fn dispatch_event(&mut self, target: NodeKey, event: Event) -> Result<(), DomError>;

    /// Start recording subtree mutations for the whole document.
    fn observe(&mut self);

    /// Stop recording and discard pending records.
    fn disconnect(&mut self);

    /// Drain the records gathered since the last call.
    fn take_records(&mut self) -> Vec<MutationRecord>;
}
