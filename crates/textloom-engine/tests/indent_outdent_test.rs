//! Indent/outdent command policies: per-block dedup, the zero floor,
//! and backspace redirection at the front of an indented block.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use rstest::rstest;
use textloom_engine::{
    CaretHit, CaretResolver, ClipboardCollaborator, ClipboardError, Command, DataTransfer,
    DocumentTree, EditContext, Editor, EditorConfig, KeyInput, NodeKey, Point, RangeSelection,
    RichContentInserter, RichTextCollaborators, Selection, register_rich_text,
};

struct NullClipboard;
impl ClipboardCollaborator for NullClipboard {
    fn write_selection(
        &mut self,
        _tree: &DocumentTree,
        _selection: &Selection,
        _source: Option<&DataTransfer>,
    ) -> Result<(), ClipboardError> {
        Ok(())
    }
}

struct NoCaret;
impl CaretResolver for NoCaret {
    fn resolve(&self, _x: f64, _y: f64) -> Option<CaretHit> {
        None
    }
}

struct NoContent;
impl RichContentInserter for NoContent {
    fn insert(&mut self, _ctx: &mut EditContext<'_>, _transfer: &DataTransfer) {}
}

fn collaborators() -> RichTextCollaborators {
    RichTextCollaborators {
        clipboard: Rc::new(RefCell::new(NullClipboard)),
        caret: Rc::new(NoCaret),
        content: Rc::new(RefCell::new(NoContent)),
    }
}

fn block_indent(editor: &Editor, block: NodeKey) -> u32 {
    editor.tree().node(block).element().indent()
}

/// One paragraph holding `leaves` sibling text nodes, caret in the
/// first one.
fn paragraph_with_leaves(editor: &mut Editor, leaves: &[&str]) -> (NodeKey, Vec<NodeKey>) {
    editor.update(|ctx| {
        let tree = ctx.tree_mut();
        let root = tree.root();
        let paragraph = tree.create_paragraph();
        tree.append(root, paragraph).unwrap();
        let mut keys = Vec::new();
        for leaf in leaves {
            let text = tree.create_text(*leaf);
            tree.append(paragraph, text).unwrap();
            keys.push(text);
        }
        ctx.set_selection(Some(Selection::caret(Point::text(keys[0], 0))));
        (paragraph, keys)
    })
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(2)]
#[case(5)]
fn indent_then_outdent_returns_to_original_depth(#[case] depth: u32) {
    let mut editor = Editor::new(EditorConfig::default());
    let _rich = register_rich_text(&editor, collaborators());
    let (paragraph, _keys) = paragraph_with_leaves(&mut editor, &["content"]);
    editor.update(|ctx| {
        ctx.tree_mut()
            .node_mut(paragraph)
            .as_element_mut()
            .unwrap()
            .set_indent(depth);
    });

    assert!(editor.dispatch_command(Command::IndentContent));
    assert_eq!(block_indent(&editor, paragraph), depth + 1);
    assert!(editor.dispatch_command(Command::OutdentContent));
    assert_eq!(block_indent(&editor, paragraph), depth);
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(3)]
fn outdent_never_drives_indent_below_zero(#[case] extra_outdents: u32) {
    let mut editor = Editor::new(EditorConfig::default());
    let _rich = register_rich_text(&editor, collaborators());
    let (paragraph, _keys) = paragraph_with_leaves(&mut editor, &["content"]);

    for _ in 0..=extra_outdents {
        editor.dispatch_command(Command::OutdentContent);
    }
    assert_eq!(block_indent(&editor, paragraph), 0);
}

#[test]
fn selecting_many_leaves_indents_the_block_exactly_once() {
    let mut editor = Editor::new(EditorConfig::default());
    let _rich = register_rich_text(&editor, collaborators());
    let (paragraph, keys) = paragraph_with_leaves(&mut editor, &["one", "two", "three", "four"]);

    // Span every leaf under the block.
    editor.update(|ctx| {
        let first = keys[0];
        let last = *keys.last().unwrap();
        let size = ctx.tree().node(last).text_size();
        ctx.set_selection(Some(Selection::Range(RangeSelection::new(
            Point::text(first, 0),
            Point::text(last, size),
        ))));
    });

    assert!(editor.dispatch_command(Command::IndentContent));
    assert_eq!(block_indent(&editor, paragraph), 1);
}

#[test]
fn indent_spanning_two_blocks_changes_each_once() {
    let mut editor = Editor::new(EditorConfig::default());
    let _rich = register_rich_text(&editor, collaborators());
    let (first_block, second_block, first_text, second_text) = editor.update(|ctx| {
        let tree = ctx.tree_mut();
        let root = tree.root();
        let p1 = tree.create_paragraph();
        let t1 = tree.create_text("alpha");
        let p2 = tree.create_quote();
        let t2 = tree.create_text("beta");
        tree.append(root, p1).unwrap();
        tree.append(p1, t1).unwrap();
        tree.append(root, p2).unwrap();
        tree.append(p2, t2).unwrap();
        (p1, p2, t1, t2)
    });
    editor.update(|ctx| {
        ctx.set_selection(Some(Selection::Range(RangeSelection::new(
            Point::text(first_text, 1),
            Point::text(second_text, 2),
        ))));
    });

    assert!(editor.dispatch_command(Command::IndentContent));
    assert_eq!(block_indent(&editor, first_block), 1);
    assert_eq!(block_indent(&editor, second_block), 1);
}

#[test]
fn backspace_at_front_of_indented_block_outdents_instead_of_deleting() {
    let mut editor = Editor::new(EditorConfig::default());
    let _rich = register_rich_text(&editor, collaborators());
    let (paragraph, keys) = paragraph_with_leaves(&mut editor, &["content"]);
    editor.update(|ctx| {
        ctx.tree_mut()
            .node_mut(paragraph)
            .as_element_mut()
            .unwrap()
            .set_indent(2);
        ctx.set_selection(Some(Selection::caret(Point::text(keys[0], 0))));
    });

    assert!(editor.dispatch_command(Command::Backspace(KeyInput::default())));
    assert_eq!(block_indent(&editor, paragraph), 2 - 1);
    assert_eq!(editor.tree().text_content(paragraph), "content");

    // A second backspace outdents again before any deletion happens.
    assert!(editor.dispatch_command(Command::Backspace(KeyInput::default())));
    assert_eq!(block_indent(&editor, paragraph), 0);
    assert_eq!(editor.tree().text_content(paragraph), "content");
}

#[test]
fn backspace_mid_text_still_deletes_characters() {
    let mut editor = Editor::new(EditorConfig::default());
    let _rich = register_rich_text(&editor, collaborators());
    let (paragraph, keys) = paragraph_with_leaves(&mut editor, &["content"]);
    editor.update(|ctx| {
        ctx.tree_mut()
            .node_mut(paragraph)
            .as_element_mut()
            .unwrap()
            .set_indent(1);
        ctx.set_selection(Some(Selection::caret(Point::text(keys[0], 3))));
    });

    assert!(editor.dispatch_command(Command::Backspace(KeyInput::default())));
    assert_eq!(editor.tree().text_content(paragraph), "cotent");
    assert_eq!(block_indent(&editor, paragraph), 1);
}
