//! Node storage for a single document.
//!
//! Invariants:
//! - A node has at most one parent, and the parent lists it exactly once.
//! - Detaching never frees a key; detached subtrees keep their structure.
//! - Releasing frees a subtree's slots for reuse. Keys are never reused, so a
//!   released key stays invalid.
//! - Operations never create cycles.

use crate::error::DomError;
use crate::types::{NodeKey, NodeKind, NodeRecord};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct DomArena {
    nodes: Vec<Option<NodeRecord>>,
    index: HashMap<NodeKey, usize>,
    free: Vec<usize>,
    next_key: u32,
}

impl DomArena {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            free: Vec::new(),
            next_key: 1,
        }
    }

    pub(crate) fn insert_node(&mut self, kind: NodeKind) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key = self.next_key.wrapping_add(1);
        let record = NodeRecord {
            kind,
            parent: None,
            children: Vec::new(),
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(record);
                slot
            }
            None => {
                self.nodes.push(Some(record));
                self.nodes.len() - 1
            }
        };
        self.index.insert(key, slot);
        key
    }

    /// Number of live nodes, attached or not.
    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn get(&self, key: NodeKey) -> Option<&NodeRecord> {
        self.index
            .get(&key)
            .and_then(|&slot| self.nodes[slot].as_ref())
    }

    pub(crate) fn get_mut(&mut self, key: NodeKey) -> Result<&mut NodeRecord, DomError> {
        let slot = *self.index.get(&key).ok_or(DomError::MissingKey(key))?;
        self.nodes[slot].as_mut().ok_or(DomError::MissingKey(key))
    }

    pub(crate) fn record(&self, key: NodeKey) -> Result<&NodeRecord, DomError> {
        self.get(key).ok_or(DomError::MissingKey(key))
    }

    pub(crate) fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        self.check_insertable(parent, child)?;
        self.get_mut(parent)?.children.push(child);
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    pub(crate) fn insert_before(
        &mut self,
        parent: NodeKey,
        child: NodeKey,
        before: NodeKey,
    ) -> Result<(), DomError> {
        self.check_insertable(parent, child)?;
        if self.record(before)?.parent != Some(parent) {
            return Err(DomError::InvalidSibling { parent, before });
        }
        let siblings = &mut self.get_mut(parent)?.children;
        let pos = siblings
            .iter()
            .position(|k| *k == before)
            .ok_or(DomError::InvalidSibling { parent, before })?;
        siblings.insert(pos, child);
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Unlink `key` from its parent. Returns the former parent, if any.
    pub(crate) fn detach(&mut self, key: NodeKey) -> Result<Option<NodeKey>, DomError> {
        let parent = self.get_mut(key)?.parent.take();
        if let Some(parent) = parent {
            self.get_mut(parent)?.children.retain(|k| *k != key);
        }
        Ok(parent)
    }

    /// Detach `key` and free it with its whole subtree. Returns the former
    /// parent and the number of nodes freed.
    pub(crate) fn release(&mut self, key: NodeKey) -> Result<(Option<NodeKey>, usize), DomError> {
        let parent = self.detach(key)?;
        let mut stack = vec![key];
        let mut freed = 0;
        while let Some(next) = stack.pop() {
            let Some(slot) = self.index.remove(&next) else {
                continue;
            };
            if let Some(record) = self.nodes[slot].take() {
                stack.extend(record.children);
            }
            self.free.push(slot);
            freed += 1;
        }
        Ok((parent, freed))
    }

    /// Detach every child of `key`, returning them in their former order.
    pub(crate) fn clear_children(&mut self, key: NodeKey) -> Result<Vec<NodeKey>, DomError> {
        let children = std::mem::take(&mut self.get_mut(key)?.children);
        for child in &children {
            self.get_mut(*child)?.parent = None;
        }
        Ok(children)
    }

    pub(crate) fn is_descendant(&self, ancestor: NodeKey, maybe_descendant: NodeKey) -> bool {
        let mut current = self.get(maybe_descendant).and_then(|r| r.parent);
        while let Some(key) = current {
            if key == ancestor {
                return true;
            }
            current = self.get(key).and_then(|r| r.parent);
        }
        false
    }

    fn check_insertable(&self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        if parent == child || self.is_descendant(child, parent) {
            return Err(DomError::CycleDetected { parent, child });
        }
        if !self.record(parent)?.allows_children() {
            return Err(DomError::InvalidParent(parent));
        }
        let child_record = self.record(child)?;
        if matches!(child_record.kind, NodeKind::Document) {
            return Err(DomError::InvalidParent(child));
        }
        if child_record.parent.is_some() {
            return Err(DomError::AlreadyAttached(child));
        }
        Ok(())
    }
}
