//! Contract violations raised by tree operations.

use crate::node::NodeType;
use thiserror::Error;

/// A caller handed a tree operation something outside its contract.
///
/// These indicate bugs in the calling pass, not conditions to recover
/// from. Probe with [`crate::Node::kind`] or [`crate::is_literal_term`]
/// first when the shape of an input is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("expected a {expected} node, got {found}")]
    WrongKind { expected: NodeType, found: NodeType },

    #[error("{0} node is not allowed in a pattern")]
    NotAPattern(NodeType),

    #[error("{0} is a leaf kind and cannot be built from subtrees")]
    LeafKind(NodeType),

    #[error("malformed subtrees for {kind}: got slot lengths {found:?}")]
    MalformedSlots { kind: NodeType, found: Vec<usize> },

    #[error("expected a function name variable, got {0}")]
    NotAFunctionName(String),

    #[error("expected a proper list, got {0}")]
    NotAList(String),
}
