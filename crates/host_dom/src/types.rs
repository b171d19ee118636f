use std::sync::Arc;

/// Stable identity of a node inside one [`Document`](crate::Document).
///
/// Keys stay valid after a node is detached; a detached node can be queried
/// and re-inserted, but is not reachable from the document root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u32);

impl NodeKey {
    /// Reserved sentinel for "unassigned/invalid" identity.
    pub const INVALID: NodeKey = NodeKey(0);
}

#[derive(Clone, Debug)]
pub(crate) enum NodeKind {
    Document,
    Element {
        name: Arc<str>,
        attributes: Vec<(Arc<str>, Option<String>)>,
        style: Vec<(String, String)>,
    },
    Text {
        text: String,
    },
}

impl NodeKind {
    pub(crate) fn element(name: &str) -> Self {
        NodeKind::Element {
            name: Arc::from(name.to_ascii_lowercase()),
            attributes: Vec::new(),
            style: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct NodeRecord {
    pub kind: NodeKind,
    pub parent: Option<NodeKey>,
    pub children: Vec<NodeKey>,
}

impl NodeRecord {
    pub(crate) fn allows_children(&self) -> bool {
        matches!(self.kind, NodeKind::Document | NodeKind::Element { .. })
    }

    pub(crate) fn element_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub(crate) fn attribute(&self, key: &str) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.as_deref().unwrap_or("")),
            _ => None,
        }
    }

    pub(crate) fn has_attribute(&self, key: &str) -> bool {
        match &self.kind {
            NodeKind::Element { attributes, .. } => {
                attributes.iter().any(|(k, _)| k.eq_ignore_ascii_case(key))
            }
            _ => false,
        }
    }
}
