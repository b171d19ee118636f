use crate::types::NodeKey;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationKind {
    ChildList {
        added: Vec<NodeKey>,
        removed: Vec<NodeKey>,
    },
    Attributes {
        name: String,
    },
    CharacterData,
}

/// A single change observed while a subtree observer is connected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeKey,
    pub kind: MutationKind,
}
