//! Scene assembly errors.

use crate::graph::NodeId;

/// Rejected attachments and lookups. The graph stays a forest of
/// single-parent trees, which is what makes the traversal order well defined.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("node {0:?} does not exist in this scene")]
    UnknownNode(NodeId),

    #[error("no node named {0:?}")]
    UnknownName(String),

    #[error("node {0:?} cannot be its own child")]
    SelfParent(NodeId),

    #[error("node {child:?} already has parent {parent:?}")]
    AlreadyParented { child: NodeId, parent: NodeId },

    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
}
