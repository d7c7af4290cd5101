//! External collaborator boundaries.
//!
//! The engine orchestrates these seams but never implements them: view
//! rendering, clipboard payload encoding, screen-coordinate resolution
//! and rich-content insertion are swappable without touching the
//! editing operations.

use crate::error::ClipboardError;
use crate::node::{Node, NodeKey};
use crate::selection::Selection;
use crate::tree::DocumentTree;

/// One file carried by a drag or paste payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedFile {
    pub name: String,
    pub media_type: String,
    pub data: Vec<u8>,
}

/// Decoded transfer payload of a drag/clipboard event.
///
/// An event source may report files it refuses to expose the content
/// of; `has_files` distinguishes "a file transfer" from "a transfer we
/// can read files out of".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTransfer {
    pub files: Vec<DroppedFile>,
    pub text: Option<String>,
    pub html: Option<String>,
}

impl DataTransfer {
    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    /// Whether the payload carries recognized text content (plain or
    /// markup).
    pub fn has_text_content(&self) -> bool {
        self.text.is_some() || self.html.is_some()
    }
}

/// Clipboard collaborator: serializes a selection out of the engine.
/// Writes are best-effort; the engine degrades gracefully on failure.
pub trait ClipboardCollaborator {
    fn write_selection(
        &mut self,
        tree: &DocumentTree,
        selection: &Selection,
        source: Option<&DataTransfer>,
    ) -> Result<(), ClipboardError>;
}

/// A raw node-plus-offset guess produced from screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretHit {
    pub node: NodeKey,
    pub offset: usize,
}

/// Coordinate-resolution collaborator: maps a screen position to a
/// caret guess, or `None` when the position hits nothing.
pub trait CaretResolver {
    fn resolve(&self, x: f64, y: f64) -> Option<CaretHit>;
}

/// Rich-content insertion collaborator: materializes a transfer payload
/// (markup, plain text, whatever it understands) at the selection.
pub trait RichContentInserter {
    fn insert(&mut self, ctx: &mut crate::editor::EditContext<'_>, transfer: &DataTransfer);
}

/// Opaque token a view renderer hands back for a created view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewHandle(pub u64);

/// View renderer collaborator, per node kind. The engine never calls
/// it; per-kind presentation metadata lives on [`crate::node::ElementKind`].
pub trait ViewRenderer {
    fn create_view(&mut self, node: &Node, config: &crate::editor::EditorConfig) -> ViewHandle;

    /// Reconciles an existing view against the node's new state;
    /// returns whether the view must be replaced wholesale.
    fn update_view(
        &mut self,
        prev: &Node,
        handle: &mut ViewHandle,
        config: &crate::editor::EditorConfig,
    ) -> bool;
}
