//! The rich-text editing operation set.
//!
//! [`register_rich_text`] wires every editing handler onto the command
//! bus at editor priority and returns one composite disposer. Handlers
//! follow a single contract: read the current selection, mutate the
//! tree and selection inside the active transaction, return whether the
//! command was claimed. A handler that cannot apply to the current
//! selection variant declines so lower-priority handlers or the default
//! platform behavior may proceed.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use log::debug;

use crate::collab::{
    CaretResolver, ClipboardCollaborator, DataTransfer, DroppedFile, RichContentInserter,
};
use crate::command::{Command, CommandKind, CommandPriority, Disposer, InsertTextPayload};
use crate::editor::{EditContext, Editor, UpdateTag};
use crate::node::{NodeKey, TextFormatKind};
use crate::selection::{
    NodeSelection, Point, RangeSelection, Selection, adjacent_node, edit, is_at_document_end,
    normalize_point, select_all, select_next, select_previous,
};
use crate::tree::DocumentTree;

/// External collaborators the rich-text handlers depend on.
#[derive(Clone)]
pub struct RichTextCollaborators {
    pub clipboard: Rc<RefCell<dyn ClipboardCollaborator>>,
    pub caret: Rc<dyn CaretResolver>,
    pub content: Rc<RefCell<dyn RichContentInserter>>,
}

/// Splits a transfer payload into (is file transfer, readable files,
/// has recognized text content).
pub fn transfer_files(transfer: Option<&DataTransfer>) -> (bool, Vec<DroppedFile>, bool) {
    match transfer {
        Some(t) => (t.has_files(), t.files.clone(), t.has_text_content()),
        None => (false, Vec::new(), false),
    }
}

/// Clears any pending case-transform format. Auto-capitalization state
/// must not leak across word boundaries, so enter, space and tab call
/// this before acting.
fn reset_capitalization(sel: &mut RangeSelection) {
    for kind in TextFormatKind::CASE_TRANSFORMS {
        if sel.format.has(kind) {
            sel.format = sel.format.toggled(kind);
        }
    }
}

fn reset_capitalization_in_ctx(ctx: &mut EditContext<'_>) {
    if let Some(Selection::Range(mut range)) = ctx.selection().cloned() {
        reset_capitalization(&mut range);
        ctx.set_selection(Some(Selection::Range(range)));
    }
}

/// Caret collapsed at the first content position of a block whose
/// indent is above zero: backspace becomes outdent there.
fn is_collapsed_at_front_of_indented_block(tree: &DocumentTree, sel: &RangeSelection) -> bool {
    if !sel.is_collapsed() || sel.anchor.offset != 0 {
        return false;
    }
    let anchor_node = sel.anchor.key;
    if tree.node(anchor_node).is_root() {
        return false;
    }
    let Some(block) = tree.nearest_block_ancestor(anchor_node) else {
        return false;
    };
    tree.node(block).element().indent() > 0
        && (block == anchor_node || Some(anchor_node) == tree.first_descendant(block))
}

/// Applies `change` to the nearest non-inline block ancestor of every
/// selected leaf, visiting each block at most once per dispatch.
fn handle_indent_outdent(
    ctx: &mut EditContext<'_>,
    change: impl Fn(u32) -> u32,
) -> bool {
    let Some(Selection::Range(sel)) = ctx.selection().cloned() else {
        return false;
    };
    let mut already_handled: HashSet<NodeKey> = HashSet::new();
    let nodes: Vec<NodeKey> = sel.nodes(ctx.tree()).collect();
    for key in nodes {
        if already_handled.contains(&key) {
            continue;
        }
        let Some(block) = ctx.tree().find_matching_parent(key, |n| n.is_block()) else {
            continue;
        };
        if already_handled.contains(&block) {
            continue;
        }
        if !ctx.tree().node(block).element().kind().can_indent() {
            continue;
        }
        already_handled.insert(block);
        let indent = ctx.tree().node(block).element().indent();
        ctx.tree_mut()
            .node_mut(block)
            .element_mut()
            .set_indent(change(indent));
    }
    !already_handled.is_empty()
}

fn delete_outcome(ctx: &mut EditContext<'_>, range: RangeSelection, replacement: Option<Selection>) {
    match replacement {
        Some(selection) => ctx.set_selection(Some(selection)),
        None => ctx.set_selection(Some(Selection::Range(range))),
    }
}

/// Whether the adjacent node is an atomic decorator that arrow keys
/// select whole instead of moving the caret past.
fn arrow_selects_decorator(
    tree: &DocumentTree,
    sel: &RangeSelection,
    backward: bool,
    shift: bool,
) -> Option<NodeKey> {
    if shift {
        return None;
    }
    let adjacent = adjacent_node(tree, &sel.focus, backward)?;
    let decorator = tree.node(adjacent).as_decorator()?;
    if decorator.isolated || decorator.inline {
        return None;
    }
    Some(adjacent)
}

/// Registers the full rich-text operation set and returns the composite
/// disposer releasing every registration.
pub fn register_rich_text(editor: &Editor, collab: RichTextCollaborators) -> Disposer {
    let mut disposers: Vec<Disposer> = Vec::new();

    disposers.push(editor.register_command(
        CommandKind::Click,
        CommandPriority::Editor,
        |ctx, _cmd| {
            if matches!(ctx.selection(), Some(Selection::Node(_))) {
                ctx.set_selection(None);
                return true;
            }
            false
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::DeleteCharacter,
        CommandPriority::Editor,
        |ctx, cmd| {
            let Command::DeleteCharacter { backward } = cmd else {
                return false;
            };
            match ctx.selection().cloned() {
                Some(Selection::Range(mut range)) => {
                    let replacement =
                        edit::delete_character(ctx.tree_mut(), &mut range, *backward);
                    delete_outcome(ctx, range, replacement);
                    true
                }
                Some(Selection::Node(nodes)) => {
                    let next = edit::delete_nodes(ctx.tree_mut(), &nodes);
                    ctx.set_selection(Some(next));
                    true
                }
                None => false,
            }
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::DeleteWord,
        CommandPriority::Editor,
        |ctx, cmd| {
            let Command::DeleteWord { backward } = cmd else {
                return false;
            };
            let Some(Selection::Range(mut range)) = ctx.selection().cloned() else {
                return false;
            };
            let replacement = edit::delete_word(ctx.tree_mut(), &mut range, *backward);
            delete_outcome(ctx, range, replacement);
            true
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::DeleteLine,
        CommandPriority::Editor,
        |ctx, cmd| {
            let Command::DeleteLine { backward } = cmd else {
                return false;
            };
            let Some(Selection::Range(mut range)) = ctx.selection().cloned() else {
                return false;
            };
            let replacement = edit::delete_line(ctx.tree_mut(), &mut range, *backward);
            delete_outcome(ctx, range, replacement);
            true
        },
    ));

    let content = collab.content.clone();
    disposers.push(editor.register_command(
        CommandKind::InsertText,
        CommandPriority::Editor,
        move |ctx, cmd| {
            let Command::InsertText(payload) = cmd else {
                return false;
            };
            match payload {
                InsertTextPayload::Plain(text) => {
                    match ctx.selection().cloned() {
                        Some(Selection::Range(mut range)) => {
                            edit::insert_text(ctx.tree_mut(), &mut range, text);
                            ctx.set_selection(Some(Selection::Range(range)));
                        }
                        Some(Selection::Node(nodes)) => {
                            // Whole-node selections are replaced by the
                            // typed text.
                            let next = edit::delete_nodes(ctx.tree_mut(), &nodes);
                            let Selection::Range(mut range) = next else {
                                unreachable!("delete_nodes returns a caret")
                            };
                            edit::insert_text(ctx.tree_mut(), &mut range, text);
                            ctx.set_selection(Some(Selection::Range(range)));
                        }
                        None => {}
                    }
                    true
                }
                InsertTextPayload::Transfer(transfer) => {
                    if ctx.selection().is_none() {
                        return false;
                    }
                    content.borrow_mut().insert(ctx, transfer);
                    true
                }
            }
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::RemoveText,
        CommandPriority::Editor,
        |ctx, _cmd| {
            let Some(Selection::Range(mut range)) = ctx.selection().cloned() else {
                return false;
            };
            edit::remove_text(ctx.tree_mut(), &mut range);
            ctx.set_selection(Some(Selection::Range(range)));
            true
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::FormatText,
        CommandPriority::Editor,
        |ctx, cmd| {
            let Command::FormatText(kind) = cmd else {
                return false;
            };
            let Some(Selection::Range(mut range)) = ctx.selection().cloned() else {
                return false;
            };
            edit::format_text(ctx.tree_mut(), &mut range, *kind);
            ctx.set_selection(Some(Selection::Range(range)));
            true
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::FormatElement,
        CommandPriority::Editor,
        |ctx, cmd| {
            let Command::FormatElement(format) = cmd else {
                return false;
            };
            let Some(selection) = ctx.selection().cloned() else {
                return false;
            };
            let nodes: Vec<NodeKey> = match &selection {
                Selection::Range(range) => range.nodes(ctx.tree()).collect(),
                Selection::Node(nodes) => nodes.keys().to_vec(),
            };
            for key in nodes {
                if !ctx.tree().contains(key) {
                    continue;
                }
                if let Some(block) = ctx.tree().find_matching_parent(key, |n| n.is_block()) {
                    ctx.tree_mut()
                        .node_mut(block)
                        .element_mut()
                        .set_format(*format);
                }
            }
            true
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::InsertLineBreak,
        CommandPriority::Editor,
        |ctx, cmd| {
            let Command::InsertLineBreak { select_start } = cmd else {
                return false;
            };
            let Some(Selection::Range(mut range)) = ctx.selection().cloned() else {
                return false;
            };
            edit::insert_line_break(ctx.tree_mut(), &mut range, *select_start);
            ctx.set_selection(Some(Selection::Range(range)));
            true
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::InsertParagraph,
        CommandPriority::Editor,
        |ctx, _cmd| {
            let Some(Selection::Range(mut range)) = ctx.selection().cloned() else {
                return false;
            };
            edit::insert_paragraph(ctx.tree_mut(), &mut range);
            ctx.set_selection(Some(Selection::Range(range)));
            true
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::InsertTab,
        CommandPriority::Editor,
        |ctx, _cmd| {
            let Some(Selection::Range(mut range)) = ctx.selection().cloned() else {
                return false;
            };
            edit::insert_tab(ctx.tree_mut(), &mut range);
            ctx.set_selection(Some(Selection::Range(range)));
            true
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::IndentContent,
        CommandPriority::Editor,
        |ctx, _cmd| handle_indent_outdent(ctx, |indent| indent + 1),
    ));

    disposers.push(editor.register_command(
        CommandKind::OutdentContent,
        CommandPriority::Editor,
        |ctx, _cmd| handle_indent_outdent(ctx, |indent| indent.saturating_sub(1)),
    ));

    disposers.push(editor.register_command(
        CommandKind::ArrowUp,
        CommandPriority::Editor,
        |ctx, cmd| {
            let Command::ArrowUp(key) = cmd else {
                return false;
            };
            match ctx.selection().cloned() {
                Some(Selection::Node(nodes)) => {
                    // Release the whole-node selection back to a caret.
                    if let Some(first) = nodes.first().filter(|&k| ctx.tree().contains(k)) {
                        let range = select_previous(ctx.tree(), first);
                        ctx.set_selection(Some(Selection::Range(range)));
                        return true;
                    }
                    false
                }
                Some(Selection::Range(range)) => {
                    if let Some(decorator) =
                        arrow_selects_decorator(ctx.tree(), &range, true, key.shift)
                    {
                        ctx.set_selection(Some(Selection::Node(NodeSelection::single(
                            decorator,
                        ))));
                        return true;
                    }
                    false
                }
                None => false,
            }
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::ArrowDown,
        CommandPriority::Editor,
        |ctx, cmd| {
            let Command::ArrowDown(key) = cmd else {
                return false;
            };
            match ctx.selection().cloned() {
                Some(Selection::Node(nodes)) => {
                    if let Some(first) = nodes.first().filter(|&k| ctx.tree().contains(k)) {
                        let range = select_next(ctx.tree(), first);
                        ctx.set_selection(Some(Selection::Range(range)));
                        return true;
                    }
                    false
                }
                Some(Selection::Range(range)) => {
                    if is_at_document_end(ctx.tree(), &range) {
                        // Nothing below the last block; suppress the
                        // default caret movement.
                        return true;
                    }
                    if let Some(decorator) =
                        arrow_selects_decorator(ctx.tree(), &range, false, key.shift)
                    {
                        ctx.set_selection(Some(Selection::Node(NodeSelection::single(
                            decorator,
                        ))));
                        return true;
                    }
                    false
                }
                None => false,
            }
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::ArrowLeft,
        CommandPriority::Editor,
        |ctx, cmd| {
            let Command::ArrowLeft(key) = cmd else {
                return false;
            };
            if let Some(Selection::Node(nodes)) = ctx.selection().cloned() {
                if let Some(first) = nodes.first().filter(|&k| ctx.tree().contains(k)) {
                    let range = select_previous(ctx.tree(), first);
                    ctx.set_selection(Some(Selection::Range(range)));
                    return true;
                }
                return false;
            }
            let Some(Selection::Range(mut range)) = ctx.selection().cloned() else {
                return false;
            };
            if edit::should_override_character_move(ctx.tree(), &range, true) {
                let replacement =
                    edit::move_character(ctx.tree_mut(), &mut range, key.shift, true);
                match replacement {
                    Some(selection) => ctx.set_selection(Some(selection)),
                    None => ctx.set_selection(Some(Selection::Range(range))),
                }
                return true;
            }
            false
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::ArrowRight,
        CommandPriority::Editor,
        |ctx, cmd| {
            let Command::ArrowRight(key) = cmd else {
                return false;
            };
            if let Some(Selection::Node(nodes)) = ctx.selection().cloned() {
                if let Some(first) = nodes.first().filter(|&k| ctx.tree().contains(k)) {
                    let range = select_next(ctx.tree(), first);
                    ctx.set_selection(Some(Selection::Range(range)));
                    return true;
                }
                return false;
            }
            let Some(Selection::Range(mut range)) = ctx.selection().cloned() else {
                return false;
            };
            if edit::should_override_character_move(ctx.tree(), &range, false) {
                let replacement =
                    edit::move_character(ctx.tree_mut(), &mut range, key.shift, false);
                match replacement {
                    Some(selection) => ctx.set_selection(Some(selection)),
                    None => ctx.set_selection(Some(Selection::Range(range))),
                }
                return true;
            }
            false
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::Backspace,
        CommandPriority::Editor,
        |ctx, cmd| {
            let Command::Backspace(key) = cmd else {
                return false;
            };
            if let Some(target) = key.target
                && ctx.tree().get(target).map(|n| n.is_decorator()).unwrap_or(false)
            {
                return false;
            }
            match ctx.selection().cloned() {
                Some(Selection::Range(range)) => {
                    if is_collapsed_at_front_of_indented_block(ctx.tree(), &range) {
                        return ctx.dispatch(&Command::OutdentContent);
                    }
                    ctx.dispatch(&Command::DeleteCharacter { backward: true })
                }
                Some(Selection::Node(_)) => {
                    ctx.dispatch(&Command::DeleteCharacter { backward: true })
                }
                None => false,
            }
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::Delete,
        CommandPriority::Editor,
        |ctx, cmd| {
            let Command::Delete(key) = cmd else {
                return false;
            };
            if let Some(target) = key.target
                && ctx.tree().get(target).map(|n| n.is_decorator()).unwrap_or(false)
            {
                return false;
            }
            if ctx.selection().is_none() {
                return false;
            }
            ctx.dispatch(&Command::DeleteCharacter { backward: false })
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::Enter,
        CommandPriority::Editor,
        |ctx, cmd| {
            let Command::Enter(key) = cmd else {
                return false;
            };
            if !matches!(ctx.selection(), Some(Selection::Range(_))) {
                return false;
            }
            reset_capitalization_in_ctx(ctx);
            if let Some(key) = key
                && key.shift
            {
                return ctx.dispatch(&Command::InsertLineBreak {
                    select_start: false,
                });
            }
            ctx.dispatch(&Command::InsertParagraph)
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::Escape,
        CommandPriority::Editor,
        |ctx, _cmd| {
            if !matches!(ctx.selection(), Some(Selection::Range(_))) {
                return false;
            }
            ctx.blur();
            true
        },
    ));

    let caret = collab.caret.clone();
    disposers.push(editor.register_command(
        CommandKind::Drop,
        CommandPriority::Editor,
        move |ctx, cmd| {
            let Command::Drop(drag) = cmd else {
                return false;
            };
            let (_, files, _) = transfer_files(drag.transfer.as_ref());
            if !files.is_empty() {
                if let Some(hit) = caret.resolve(drag.x, drag.y) {
                    if ctx.tree().contains(hit.node) && ctx.tree().is_attached(hit.node) {
                        let point = drop_point(ctx.tree(), hit.node, hit.offset);
                        let point = normalize_point(ctx.tree(), point);
                        ctx.set_selection(Some(Selection::caret(point)));
                    }
                    ctx.dispatch(&Command::DragDropPaste(files));
                }
                return true;
            }
            matches!(ctx.selection(), Some(Selection::Range(_)))
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::DragStart,
        CommandPriority::Editor,
        |ctx, cmd| {
            let Command::DragStart(drag) = cmd else {
                return false;
            };
            let (is_file_transfer, _, _) = transfer_files(drag.transfer.as_ref());
            if is_file_transfer && !matches!(ctx.selection(), Some(Selection::Range(_))) {
                return false;
            }
            true
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::DragOver,
        CommandPriority::Editor,
        |ctx, cmd| {
            let Command::DragOver(drag) = cmd else {
                return false;
            };
            let (is_file_transfer, _, _) = transfer_files(drag.transfer.as_ref());
            if is_file_transfer && !matches!(ctx.selection(), Some(Selection::Range(_))) {
                return false;
            }
            true
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::SelectAll,
        CommandPriority::Editor,
        |ctx, _cmd| {
            let range = select_all(ctx.tree());
            ctx.set_selection(Some(Selection::Range(range)));
            true
        },
    ));

    let clipboard = collab.clipboard.clone();
    disposers.push(editor.register_command(
        CommandKind::Copy,
        CommandPriority::Editor,
        move |ctx, cmd| {
            let Command::Copy(transfer) = cmd else {
                return false;
            };
            if let Some(selection) = ctx.selection() {
                if let Err(err) = clipboard.borrow_mut().write_selection(
                    ctx.tree(),
                    selection,
                    transfer.as_ref(),
                ) {
                    debug!("clipboard write failed on copy: {err}");
                }
            }
            true
        },
    ));

    let clipboard = collab.clipboard.clone();
    disposers.push(editor.register_command(
        CommandKind::Cut,
        CommandPriority::Editor,
        move |ctx, cmd| {
            let Command::Cut(transfer) = cmd else {
                return false;
            };
            if let Some(selection) = ctx.selection().cloned() {
                // Clipboard write completes before the synchronous
                // removal starts; failure degrades to removal only.
                if let Err(err) = clipboard.borrow_mut().write_selection(
                    ctx.tree(),
                    &selection,
                    transfer.as_ref(),
                ) {
                    debug!("clipboard write failed on cut: {err}");
                }
                match selection {
                    Selection::Range(mut range) => {
                        edit::remove_text(ctx.tree_mut(), &mut range);
                        ctx.set_selection(Some(Selection::Range(range)));
                    }
                    Selection::Node(nodes) => {
                        let next = edit::delete_nodes(ctx.tree_mut(), &nodes);
                        ctx.set_selection(Some(next));
                    }
                }
            }
            true
        },
    ));

    let content = collab.content.clone();
    disposers.push(editor.register_command(
        CommandKind::Paste,
        CommandPriority::Editor,
        move |ctx, cmd| {
            let Command::Paste(transfer) = cmd else {
                return false;
            };
            let (_, files, has_text_content) = transfer_files(Some(transfer));
            if !files.is_empty() && !has_text_content {
                ctx.dispatch(&Command::DragDropPaste(files));
                return true;
            }
            if ctx.selection().is_some() {
                let content = content.clone();
                ctx.with_tag(UpdateTag::Paste, |ctx| {
                    content.borrow_mut().insert(ctx, transfer);
                });
                return true;
            }
            false
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::Space,
        CommandPriority::Editor,
        |ctx, _cmd| {
            reset_capitalization_in_ctx(ctx);
            false
        },
    ));

    disposers.push(editor.register_command(
        CommandKind::Tab,
        CommandPriority::Editor,
        |ctx, _cmd| {
            reset_capitalization_in_ctx(ctx);
            false
        },
    ));

    Disposer::merge(disposers)
}

/// Builds the drop target point from a resolved caret hit: a text
/// offset into text nodes, otherwise the child index immediately after
/// the hit node.
fn drop_point(tree: &DocumentTree, node: NodeKey, offset: usize) -> Point {
    if tree.node(node).is_text() {
        return Point::text(node, offset.min(tree.node(node).text_size()));
    }
    match tree.parent(node) {
        Some(parent) => {
            let index = tree.index_within_parent(node).unwrap_or(0);
            Point::element(parent, index + 1)
        }
        None => Point::element(node, offset.min(tree.child_count(node))),
    }
}
