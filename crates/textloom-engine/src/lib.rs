/*!
 * # Textloom engine
 *
 * A selection-aware editing engine for tree-shaped rich-text documents.
 *
 * The engine maps user input events (keystrokes, drag/drop, clipboard
 * cut/copy/paste) onto structural mutations of a keyed node tree while
 * keeping a consistent caret/range abstraction across heterogeneous
 * node kinds: text-bearing leaves, element containers, atomic
 * decorators, line-break and tab markers.
 *
 * ## Architecture
 *
 * - **`tree`**: the arena-backed [`tree::DocumentTree`] — keyed nodes,
 *   parent/child/sibling relations, structural mutation that always
 *   repairs linkage, and the per-kind block policies (`insert_new_after`,
 *   `collapse_at_start`).
 * - **`selection`**: the two selection variants ([`selection::RangeSelection`]
 *   and [`selection::NodeSelection`]), point normalization, adjacency
 *   queries, and the structural edit primitives (insert/delete/format).
 * - **`command`**: the typed [`command::Command`] set and the
 *   priority-ordered registry with short-circuit dispatch and
 *   disposer-based teardown.
 * - **`rich_text`**: the editing operation handlers —
 *   [`rich_text::register_rich_text`] wires deletion, insertion,
 *   indent/outdent, arrow navigation and drag/clipboard orchestration
 *   onto the bus.
 * - **`collab`** / **`serial`**: the external collaborator boundaries
 *   (view rendering, clipboard, coordinate resolution, rich-content
 *   insertion, structured records and markup conversion).
 *
 * ## Usage
 *
 * ```rust
 * use textloom_engine::editor::{Editor, EditorConfig};
 * use textloom_engine::selection::{Point, Selection};
 *
 * let mut editor = Editor::new(EditorConfig::default());
 * let paragraph = editor.update(|ctx| {
 *     let tree = ctx.tree_mut();
 *     let paragraph = tree.create_paragraph();
 *     let root = tree.root();
 *     tree.append(root, paragraph).unwrap();
 *     ctx.set_selection(Some(Selection::caret(Point::element(paragraph, 0))));
 *     paragraph
 * });
 *
 * // Handlers registered by `register_rich_text` would route this into
 * // the selection's `insert_text` primitive.
 * editor.update(|ctx| {
 *     let mut range = ctx.selection().unwrap().as_range().unwrap().clone();
 *     textloom_engine::selection::edit::insert_text(ctx.tree_mut(), &mut range, "hello");
 *     ctx.set_selection(Some(Selection::Range(range)));
 * });
 * assert_eq!(editor.tree().text_content(paragraph), "hello");
 * ```
 *
 * Mutation happens only inside [`editor::Editor::update`] — the single
 * transaction boundary supplied by the surrounding runtime. Handlers
 * validate before mutating; a handler either completes its mutation or
 * declines without touching the tree.
 */

pub mod collab;
pub mod command;
pub mod editor;
pub mod error;
pub mod node;
pub mod rich_text;
pub mod selection;
pub mod serial;
pub mod tree;

pub use collab::{
    CaretHit, CaretResolver, ClipboardCollaborator, DataTransfer, DroppedFile,
    RichContentInserter, ViewHandle, ViewRenderer,
};
pub use command::{
    Command, CommandKind, CommandPriority, CommandRegistry, Disposer, DragInput, InsertTextPayload,
    KeyInput,
};
pub use editor::{EditContext, Editor, EditorConfig, EditorState, EditorTheme, UpdateTag};
pub use error::{ClipboardError, EngineError};
pub use node::{
    DecoratorNode, Direction, ElementFormat, ElementKind, ElementNode, HeadingTag, Node,
    NodeBody, NodeKey, TextFormat, TextFormatKind, TextNode,
};
pub use rich_text::{RichTextCollaborators, register_rich_text};
pub use selection::{NodeSelection, Point, PointKind, RangeSelection, Selection};
pub use serial::{
    ExternalMarkupExporter, ExternalMarkupImporter, SerializedDocument, SerializedNode,
    export_to_structured_record, import_from_structured_record,
};
pub use tree::DocumentTree;
