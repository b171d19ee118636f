use crate::types::NodeKey;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("unknown node {0:?}")]
    MissingKey(NodeKey),
    #[error("node {0:?} is not an element")]
    WrongNodeKind(NodeKey),
    #[error("node {0:?} cannot have children")]
    InvalidParent(NodeKey),
    #[error("node {0:?} already has a parent")]
    AlreadyAttached(NodeKey),
    #[error("{before:?} is not a child of {parent:?}")]
    InvalidSibling { parent: NodeKey, before: NodeKey },
    #[error("inserting {child:?} under {parent:?} would create a cycle")]
    CycleDetected { parent: NodeKey, child: NodeKey },
    #[error("node {0:?} is not attached to the document")]
    Detached(NodeKey),
    #[error("the document root cannot be removed")]
    RootRemoval,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("selector is empty")]
    Empty,
    #[error("malformed selector `{selector}`: {reason}")]
    Malformed {
        selector: String,
        reason: &'static str,
    },
}
