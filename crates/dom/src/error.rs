use crate::NodeKey;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeKey),
    #[error("node {0:?} was removed from the document")]
    Retired(NodeKey),
    #[error("node {0:?} cannot have children")]
    NotAContainer(NodeKey),
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeKey),
    #[error("inserting {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeKey, child: NodeKey },
    #[error("reference node {0:?} has no parent")]
    Orphan(NodeKey),
    #[error("the document root cannot be moved or removed")]
    Root,
}
