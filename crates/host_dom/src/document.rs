//! In-memory document with SPA-style history and a subtree observer.
//!
//! Invariants:
//! - The root is a `Document` node that can never be detached.
//! - Mutation records are only produced while an observer is connected, and
//!   only for targets attached at the time of the change.
//! - The event journal is append-only until drained with `take_events`.
//! - Changing the location through `push_state` never touches the tree.

use crate::arena::DomArena;
use crate::error::DomError;
use crate::event::{DispatchedEvent, Event};
use crate::mutation::{MutationKind, MutationRecord};
use crate::selector::Selector;
use crate::traits::HostDocument;
use crate::types::{NodeKey, NodeKind};
use std::sync::Arc;
use url::Url;

#[derive(Debug)]
pub struct Document {
    arena: DomArena,
    root: NodeKey,
    body: NodeKey,
    location: Url,
    observing: bool,
    records: Vec<MutationRecord>,
    events: Vec<DispatchedEvent>,
    event_seq: u64,
}

impl Document {
    /// Create `#document > html > body` at `location`.
    pub fn new(location: &str) -> Result<Self, url::ParseError> {
        let location = Url::parse(location)?;
        let mut arena = DomArena::new();
        let root = arena.insert_node(NodeKind::Document);
        let html = arena.insert_node(NodeKind::element("html"));
        let body = arena.insert_node(NodeKind::element("body"));
        // Fresh keys with no parents; these links cannot fail.
        let _ = arena.append_child(root, html);
        let _ = arena.append_child(html, body);
        Ok(Self {
            arena,
            root,
            body,
            location,
            observing: false,
            records: Vec::new(),
            events: Vec::new(),
            event_seq: 0,
        })
    }

    pub fn body(&self) -> NodeKey {
        self.body
    }

    pub fn url(&self) -> &Url {
        &self.location
    }

    /// History navigation without a reload. `target` may be relative.
    pub fn push_state(&mut self, target: &str) -> Result<(), url::ParseError> {
        let next = self.location.join(target)?;
        log::trace!(target: "host_dom", "push_state {} -> {}", self.location, next);
        self.location = next;
        Ok(())
    }

    /// Events dispatched since the journal was last drained.
    pub fn events(&self) -> &[DispatchedEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<DispatchedEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    pub fn tag_name(&self, key: NodeKey) -> Option<&str> {
        self.arena.get(key).and_then(|r| r.element_name())
    }

    /// Build an element with attributes in one step.
    pub fn element(&mut self, name: &str, attributes: &[(&str, &str)]) -> NodeKey {
        let key = self.create_element(name);
        for (k, v) in attributes {
            // Freshly created element; setting attributes cannot fail.
            let _ = self.set_attribute(key, k, v);
        }
        key
    }

    /// Live nodes in the arena, attached or not.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Indented tree dump for diagnostics.
    pub fn outline(&self, cap: usize) -> Vec<String> {
        fn walk(doc: &Document, key: NodeKey, depth: usize, out: &mut Vec<String>, left: &mut usize) {
            if *left == 0 {
                return;
            }
            *left -= 1;
            let Some(record) = doc.arena.get(key) else {
                return;
            };
            let indent = "  ".repeat(depth);
            match &record.kind {
                NodeKind::Document => out.push(format!("{indent}#document {}", doc.location)),
                NodeKind::Element {
                    name,
                    attributes,
                    style,
                } => {
                    let mut line = format!("{indent}<{name}");
                    for (k, v) in attributes {
                        match v {
                            Some(v) => line.push_str(&format!(r#" {k}="{v}""#)),
                            None => line.push_str(&format!(" {k}")),
                        }
                    }
                    line.push('>');
                    if !style.is_empty() {
                        let decls = style
                            .iter()
                            .map(|(k, v)| format!("{k}: {v};"))
                            .collect::<Vec<_>>()
                            .join(" ");
                        line.push_str(&format!("  /* {decls} */"));
                    }
                    out.push(line);
                }
                NodeKind::Text { text } => {
                    let t = text.replace('\n', " ");
                    let t = t.trim();
                    if !t.is_empty() {
                        let show = match t.char_indices().nth(40) {
                            Some((cut, _)) => format!("{}…", &t[..cut]),
                            None => t.to_string(),
                        };
                        out.push(format!("{indent}\"{show}\""));
                    }
                }
            }
            for child in &record.children {
                walk(doc, *child, depth + 1, out, left);
            }
        }

        let mut out = Vec::new();
        let mut left = cap;
        walk(self, self.root, 0, &mut out, &mut left);
        out
    }

    fn record(&mut self, target: NodeKey, kind: MutationKind) {
        if self.observing && self.is_attached(target) {
            self.records.push(MutationRecord { target, kind });
        }
    }

    fn collect_text(&self, key: NodeKey, out: &mut String) {
        let Some(record) = self.arena.get(key) else {
            return;
        };
        if let NodeKind::Text { text } = &record.kind {
            out.push_str(text);
        }
        for child in &record.children {
            self.collect_text(*child, out);
        }
    }

    fn walk_matches(&self, key: NodeKey, selector: &Selector, first_only: bool, out: &mut Vec<NodeKey>) {
        let Some(record) = self.arena.get(key) else {
            return;
        };
        for child in &record.children {
            if first_only && !out.is_empty() {
                return;
            }
            if selector.matches(&self.arena, *child) {
                out.push(*child);
                if first_only {
                    return;
                }
            }
            self.walk_matches(*child, selector, first_only, out);
        }
    }
}

impl HostDocument for Document {
    fn location(&self) -> &str {
        self.location.as_str()
    }

    fn root(&self) -> NodeKey {
        self.root
    }

    fn query_selector(&self, selector: &Selector) -> Option<NodeKey> {
        let mut out = Vec::with_capacity(1);
        self.walk_matches(self.root, selector, true, &mut out);
        out.first().copied()
    }

    fn query_selector_all(&self, selector: &Selector) -> Vec<NodeKey> {
        let mut out = Vec::new();
        self.walk_matches(self.root, selector, false, &mut out);
        out
    }

    fn is_attached(&self, key: NodeKey) -> bool {
        key == self.root || self.arena.is_descendant(self.root, key)
    }

    fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.arena.get(key).and_then(|r| r.parent)
    }

    fn children(&self, key: NodeKey) -> Vec<NodeKey> {
        self.arena
            .get(key)
            .map(|r| r.children.clone())
            .unwrap_or_default()
    }

    fn attribute(&self, key: NodeKey, name: &str) -> Option<&str> {
        self.arena.get(key).and_then(|r| r.attribute(name))
    }

    fn text_content(&self, key: NodeKey) -> Option<String> {
        self.arena.get(key)?;
        let mut out = String::new();
        self.collect_text(key, &mut out);
        Some(out)
    }

    fn style_property(&self, key: NodeKey, name: &str) -> Option<&str> {
        match &self.arena.get(key)?.kind {
            NodeKind::Element { style, .. } => style
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    fn create_element(&mut self, name: &str) -> NodeKey {
        self.arena.insert_node(NodeKind::element(name))
    }

    fn create_text(&mut self, text: &str) -> NodeKey {
        self.arena.insert_node(NodeKind::Text {
            text: text.to_string(),
        })
    }

    fn set_attribute(&mut self, key: NodeKey, name: &str, value: &str) -> Result<(), DomError> {
        match &mut self.arena.get_mut(key)?.kind {
            NodeKind::Element { attributes, .. } => {
                let name_lc = name.to_ascii_lowercase();
                match attributes.iter_mut().find(|(k, _)| &**k == name_lc.as_str()) {
                    Some((_, v)) => *v = Some(value.to_string()),
                    None => attributes.push((Arc::from(name_lc.as_str()), Some(value.to_string()))),
                }
                self.record(key, MutationKind::Attributes { name: name_lc });
                Ok(())
            }
            _ => Err(DomError::WrongNodeKind(key)),
        }
    }

    fn set_style_property(
        &mut self,
        key: NodeKey,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), DomError> {
        match &mut self.arena.get_mut(key)?.kind {
            NodeKind::Element { style, .. } => {
                let name_lc = name.to_ascii_lowercase();
                let existing = style.iter().position(|(k, _)| *k == name_lc);
                match (existing, value) {
                    (Some(i), Some(v)) => style[i].1 = v.to_string(),
                    (None, Some(v)) => style.push((name_lc, v.to_string())),
                    (Some(i), None) => {
                        style.remove(i);
                    }
                    (None, None) => return Ok(()),
                }
                self.record(
                    key,
                    MutationKind::Attributes {
                        name: "style".to_string(),
                    },
                );
                Ok(())
            }
            _ => Err(DomError::WrongNodeKind(key)),
        }
    }

    fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        self.arena.append_child(parent, child)?;
        self.record(
            parent,
            MutationKind::ChildList {
                added: vec![child],
                removed: Vec::new(),
            },
        );
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: NodeKey,
        child: NodeKey,
        before: NodeKey,
    ) -> Result<(), DomError> {
        self.arena.insert_before(parent, child, before)?;
        self.record(
            parent,
            MutationKind::ChildList {
                added: vec![child],
                removed: Vec::new(),
            },
        );
        Ok(())
    }

    fn remove(&mut self, key: NodeKey) -> Result<(), DomError> {
        if key == self.root {
            return Err(DomError::RootRemoval);
        }
        if let Some(parent) = self.arena.detach(key)? {
            self.record(
                parent,
                MutationKind::ChildList {
                    added: Vec::new(),
                    removed: vec![key],
                },
            );
        }
        Ok(())
    }

    fn release(&mut self, key: NodeKey) -> Result<(), DomError> {
        if key == self.root {
            return Err(DomError::RootRemoval);
        }
        let (parent, freed) = self.arena.release(key)?;
        if let Some(parent) = parent {
            self.record(
                parent,
                MutationKind::ChildList {
                    added: Vec::new(),
                    removed: vec![key],
                },
            );
        }
        log::trace!(target: "host_dom", "released {freed} nodes under {key:?}");
        Ok(())
    }

    fn set_text_content(&mut self, key: NodeKey, text: &str) -> Result<(), DomError> {
        if let NodeKind::Text { text: existing } = &mut self.arena.get_mut(key)?.kind {
            existing.clear();
            existing.push_str(text);
            self.record(key, MutationKind::CharacterData);
            return Ok(());
        }
        if !self.arena.record(key)?.allows_children() {
            return Err(DomError::WrongNodeKind(key));
        }
        let removed = self.arena.clear_children(key)?;
        // Replaced text nodes are unreachable; element children may still be
        // held by someone and are only detached.
        for &child in &removed {
            if matches!(self.arena.record(child)?.kind, NodeKind::Text { .. }) {
                self.arena.release(child)?;
            }
        }
        let mut added = Vec::new();
        if !text.is_empty() {
            let text_key = self.create_text(text);
            self.arena.append_child(key, text_key)?;
            added.push(text_key);
        }
        self.record(key, MutationKind::ChildList { added, removed });
        Ok(())
    }

    fn dispatch_event(&mut self, target: NodeKey, event: Event) -> Result<(), DomError> {
        self.arena.record(target)?;
        if !self.is_attached(target) {
            return Err(DomError::Detached(target));
        }
        let mut path = vec![target];
        if event.bubbles {
            let mut current = self.parent(target);
            while let Some(key) = current {
                path.push(key);
                current = self.parent(key);
            }
        }
        self.event_seq += 1;
        log::trace!(
            target: "host_dom",
            "dispatch {} at {:?} (seq {})",
            event.kind.name(),
            target,
            self.event_seq
        );
        self.events.push(DispatchedEvent {
            seq: self.event_seq,
            target,
            event,
            path,
        });
        Ok(())
    }

    fn observe(&mut self) {
        self.observing = true;
    }

    fn disconnect(&mut self) {
        self.observing = false;
        self.records.clear();
    }

    fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }
}
