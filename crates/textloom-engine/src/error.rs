use crate::node::NodeKey;

/// Errors surfaced by fallible tree and selection operations.
///
/// Invariant breaches (a selection pointing at a detached node, an
/// offset-kind that does not match the node tier) are not represented
/// here: they panic with a descriptive message, since they signal a
/// programming-contract violation rather than a recoverable condition.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeKey),
    #[error("node {0} is not an element and cannot hold children")]
    NotAnElement(NodeKey),
    #[error("node {0} is not a text node")]
    NotAText(NodeKey),
    #[error("the root node cannot be moved, removed or replaced")]
    RootMutation,
    #[error("offset {offset} out of bounds for node {key} (size {size})")]
    OffsetOutOfBounds {
        key: NodeKey,
        offset: usize,
        size: usize,
    },
    #[error("inserting {node} under {parent} would create a cycle")]
    WouldCycle { node: NodeKey, parent: NodeKey },
}

/// Failure modes of the external clipboard collaborator.
///
/// Degraded gracefully by the engine: cut still removes the selected
/// content when the clipboard write failed.
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("no clipboard is available on the event source")]
    Unavailable,
    #[error("clipboard write failed: {0}")]
    Write(String),
}
