//! Structural text-edit primitives.
//!
//! Every operation here follows the same contract: a ranged selection is
//! first collapsed by deleting exactly the spanned content, then the
//! operation proceeds from the resulting caret. Operations validate
//! before mutating and always leave the selection on attached nodes.
//! Operations that can switch the selection variant (a delete running
//! into an atomic block decorator) return the replacement selection.

use std::collections::HashSet;

use log::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::node::{ElementKind, NodeBody, NodeKey};
use crate::selection::{
    NodeSelection, Point, PointKind, RangeSelection, Selection, caret_at_end, caret_at_start,
    normalize_point,
};
use crate::tree::DocumentTree;

// ---- unit boundaries --------------------------------------------------

fn grapheme_before(text: &str, offset: usize) -> usize {
    text[..offset]
        .grapheme_indices(true)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn grapheme_after(text: &str, offset: usize) -> usize {
    offset
        + text[offset..]
            .graphemes(true)
            .next()
            .map(|g| g.len())
            .unwrap_or(0)
}

// ---- ranged removal ---------------------------------------------------

/// Deletes exactly the spanned content of a ranged selection and
/// collapses the caret to the start of where content was removed.
pub fn remove_ranged_content(tree: &mut DocumentTree, sel: &mut RangeSelection) {
    if sel.is_collapsed() {
        return;
    }
    let (start, end) = sel.ordered_points(tree);

    // Fast path: both ends inside the same text node.
    if start.kind == PointKind::Text && end.kind == PointKind::Text && start.key == end.key {
        tree.splice_text(start.key, start.offset..end.offset, "");
        sel.set_caret(Point::text(start.key, start.offset));
        return;
    }

    let spanned: Vec<NodeKey> = RangeSelection::new(start, end).nodes(tree).collect();
    let Some(&first_target) = spanned.first() else {
        sel.set_caret(start);
        return;
    };

    let first_block = block_of_point(tree, &start);
    let last_block = block_of_point(tree, &end);

    let start_size = tree.node(start.key).text_size();
    let end_size = tree.node(end.key).text_size();
    let partial_first = start.kind == PointKind::Text && start.offset > 0;
    let untouched_first = start.kind == PointKind::Text && start.offset == start_size;
    let partial_last = match end.kind {
        PointKind::Text => end.offset < end_size,
        // A child-index end point below the child count leaves the
        // container's tail unspanned.
        PointKind::Element => end.offset < tree.child_count(end.key),
    };
    let untouched_last = end.kind == PointKind::Text && end.offset == 0;

    // Ancestor chains of both ends survive wholesale removal; they are
    // trimmed or merged instead.
    let mut protected: HashSet<NodeKey> = HashSet::new();
    for key in [start.key, end.key] {
        let mut current = tree.parent(key);
        while let Some(k) = current {
            protected.insert(k);
            current = tree.parent(k);
        }
    }
    if let Some(fb) = first_block {
        protected.insert(fb);
    }

    // Caret fallback position, recorded before anything moves.
    let first_position = (
        tree.parent(first_target),
        tree.index_within_parent(first_target).unwrap_or(0),
    );

    // 1. Trim the boundary text nodes.
    if start.kind == PointKind::Text && start.offset < start_size {
        tree.splice_text(start.key, start.offset..start_size, "");
    }
    if end.kind == PointKind::Text && end.key != start.key && end.offset > 0 {
        tree.splice_text(end.key, 0..end.offset, "");
    }

    // 2. Remove wholly spanned nodes.
    for &key in &spanned {
        if !tree.contains(key) {
            continue;
        }
        if key == start.key {
            if partial_first || untouched_first {
                continue;
            }
        } else if key == end.key {
            if partial_last || untouched_last {
                continue;
            }
        } else if protected.contains(&key) {
            continue;
        }
        let _ = tree.remove(key);
    }

    // 3. Merge the far block's remainder into the caret's block.
    if let (Some(fb), Some(lb)) = (first_block, last_block)
        && fb != lb
        && tree.contains(fb)
        && tree.contains(lb)
    {
        tree.move_children(lb, fb)
            .expect("merge source and target are attached containers");
        let _ = tree.remove(lb);
        debug!("merged block {lb} into {fb} after ranged removal");
    }

    // 4. Drop emptied wrappers along the far end's ancestor chain. The
    //    per-kind hooks decide what may vanish silently.
    let mut current = if tree.contains(end.key) {
        tree.parent(end.key)
    } else {
        None
    };
    while let Some(key) = current {
        if Some(key) == first_block || key == tree.root() {
            break;
        }
        let next = tree.parent(key);
        let removable = match tree.node(key).as_element() {
            Some(el) => {
                el.is_empty()
                    && (el.kind().can_merge_when_empty()
                        || el.kind().extract_with_child()
                        || matches!(el.kind(), ElementKind::Paragraph))
            }
            None => false,
        };
        if removable {
            let _ = tree.remove(key);
        }
        current = next;
    }

    // 5. Land the caret at the start of the removal.
    let caret = if (partial_first || untouched_first) && tree.contains(start.key) {
        Point::text(start.key, start.offset.min(tree.node(start.key).text_size()))
    } else if start.kind == PointKind::Element && tree.contains(start.key) {
        let count = tree.child_count(start.key);
        normalize_point(tree, Point::element(start.key, start.offset.min(count)))
    } else {
        match first_position {
            (Some(parent), index) if tree.contains(parent) && tree.is_attached(parent) => {
                let count = tree.child_count(parent);
                normalize_point(tree, Point::element(parent, index.min(count)))
            }
            _ => match first_block.filter(|&b| tree.contains(b)) {
                Some(block) => caret_at_start(tree, block),
                None => caret_at_start(tree, tree.root()),
            },
        }
    };
    sel.set_caret(caret);
}

fn block_of_point(tree: &DocumentTree, point: &Point) -> Option<NodeKey> {
    if point.kind == PointKind::Element && tree.node(point.key).is_root() {
        return None;
    }
    tree.nearest_block_ancestor(point.key)
}

// ---- insertion --------------------------------------------------------

/// Inserts plain text at the selection, applying the pending character
/// format when it differs from the caret's text node.
pub fn insert_text(tree: &mut DocumentTree, sel: &mut RangeSelection, text: &str) {
    if !sel.is_collapsed() {
        remove_ranged_content(tree, sel);
    }
    if text.is_empty() {
        return;
    }
    let point = sel.anchor;
    match point.kind {
        PointKind::Text => {
            let node_format = tree.node(point.key).text().format();
            if node_format == sel.format {
                tree.splice_text(point.key, point.offset..point.offset, text);
                sel.set_caret(Point::text(point.key, point.offset + text.len()));
            } else {
                let size = tree.node(point.key).text_size();
                let parent = tree
                    .parent(point.key)
                    .expect("caret text node has a parent");
                let index = tree
                    .index_within_parent(point.key)
                    .expect("caret text node has an index");
                let insert_index = if point.offset == 0 {
                    index
                } else if point.offset == size {
                    index + 1
                } else {
                    tree.split_text(point.key, point.offset)
                        .expect("caret offset is splittable");
                    index + 1
                };
                let styled = tree.create_text_with_format(text, sel.format);
                tree.insert_child_at(parent, insert_index, styled)
                    .expect("caret parent admits children");
                sel.set_caret(Point::text(styled, text.len()));
            }
        }
        PointKind::Element => {
            let container = point.key;
            if tree.node(container).is_root() {
                // Text cannot live directly under the root; wrap it.
                let paragraph = tree.create_paragraph();
                tree.insert_child_at(container, point.offset, paragraph)
                    .expect("root admits blocks");
                let styled = tree.create_text_with_format(text, sel.format);
                tree.append(paragraph, styled).expect("paragraph admits text");
                sel.set_caret(Point::text(styled, text.len()));
            } else {
                let styled = tree.create_text_with_format(text, sel.format);
                tree.insert_child_at(container, point.offset, styled)
                    .expect("caret container admits children");
                sel.set_caret(Point::text(styled, text.len()));
            }
        }
    }
}

fn insert_leaf_at_caret(
    tree: &mut DocumentTree,
    sel: &mut RangeSelection,
    leaf: NodeKey,
    select_start: bool,
) {
    if !sel.is_collapsed() {
        remove_ranged_content(tree, sel);
    }
    let point = sel.anchor;
    let (parent, index) = match point.kind {
        PointKind::Text => {
            let size = tree.node(point.key).text_size();
            let parent = tree
                .parent(point.key)
                .expect("caret text node has a parent");
            let index = tree
                .index_within_parent(point.key)
                .expect("caret text node has an index");
            if point.offset == 0 {
                (parent, index)
            } else if point.offset == size {
                (parent, index + 1)
            } else {
                tree.split_text(point.key, point.offset)
                    .expect("caret offset is splittable");
                (parent, index + 1)
            }
        }
        PointKind::Element => {
            if tree.node(point.key).is_root() {
                let paragraph = tree.create_paragraph();
                tree.insert_child_at(point.key, point.offset, paragraph)
                    .expect("root admits blocks");
                (paragraph, 0)
            } else {
                (point.key, point.offset)
            }
        }
    };
    tree.insert_child_at(parent, index, leaf)
        .expect("caret container admits children");
    let caret_index = if select_start { index } else { index + 1 };
    sel.set_caret(normalize_point(tree, Point::element(parent, caret_index)));
}

/// Inserts a line-break marker at the selection. With `select_start` the
/// caret stays before the break instead of after it.
pub fn insert_line_break(tree: &mut DocumentTree, sel: &mut RangeSelection, select_start: bool) {
    let brk = tree.create_line_break();
    insert_leaf_at_caret(tree, sel, brk, select_start);
}

/// Inserts a tab marker at the selection.
pub fn insert_tab(tree: &mut DocumentTree, sel: &mut RangeSelection) {
    let tab = tree.create_tab();
    insert_leaf_at_caret(tree, sel, tab, false);
}

/// Splits the caret's block through the block kind's continuation
/// policy: trailing content moves into the returned sibling and the
/// caret lands at its start.
pub fn insert_paragraph(tree: &mut DocumentTree, sel: &mut RangeSelection) -> Option<NodeKey> {
    if !sel.is_collapsed() {
        remove_ranged_content(tree, sel);
    }
    let anchor = sel.anchor;

    if anchor.kind == PointKind::Element && tree.node(anchor.key).is_root() {
        let paragraph = tree.create_paragraph();
        tree.insert_child_at(anchor.key, anchor.offset, paragraph)
            .expect("root admits blocks");
        sel.set_caret(Point::element(paragraph, 0));
        return Some(paragraph);
    }

    let block = tree.nearest_block_ancestor(anchor.key)?;
    let split_index = match anchor.kind {
        PointKind::Text => {
            let size = tree.node(anchor.key).text_size();
            let index = tree
                .index_within_parent(anchor.key)
                .expect("caret text node has an index");
            if anchor.offset == 0 {
                index
            } else if anchor.offset == size {
                index + 1
            } else {
                tree.split_text(anchor.key, anchor.offset)
                    .expect("caret offset is splittable");
                index + 1
            }
        }
        PointKind::Element => {
            if anchor.key == block {
                anchor.offset
            } else {
                tree.index_within_parent(anchor.key).unwrap_or(0) + anchor.offset.min(1)
            }
        }
    };

    let trailing: Vec<NodeKey> = tree.children(block)[split_index.min(tree.child_count(block))..]
        .to_vec();
    let policy_sel = sel.clone();
    let new_block = tree.insert_new_after_block(block, Some(&policy_sel));
    for key in trailing {
        tree.append(new_block, key)
            .expect("trailing content re-homes into the new block");
    }
    sel.set_caret(normalize_point(tree, Point::element(new_block, 0)));
    Some(new_block)
}

// ---- unit deletion ----------------------------------------------------

/// Deletes one grapheme in the requested direction, merging across block
/// boundaries when the caret sits at a block edge. Returns a replacement
/// selection when the unit in the way is an atomic block decorator.
pub fn delete_character(
    tree: &mut DocumentTree,
    sel: &mut RangeSelection,
    backward: bool,
) -> Option<Selection> {
    if !sel.is_collapsed() {
        remove_ranged_content(tree, sel);
        return None;
    }
    let point = sel.anchor;
    if point.kind == PointKind::Text {
        let (size, in_node_start) = {
            let text = tree.node(point.key).text();
            let start = if backward && point.offset > 0 {
                Some(grapheme_before(text.text(), point.offset))
            } else {
                None
            };
            (text.size(), start)
        };
        if let Some(start) = in_node_start {
            tree.splice_text(point.key, start..point.offset, "");
            sel.set_caret(Point::text(point.key, start));
            return None;
        }
        if !backward && point.offset < size {
            let end = {
                let text = tree.node(point.key).text();
                grapheme_after(text.text(), point.offset)
            };
            tree.splice_text(point.key, point.offset..end, "");
            return None;
        }
    }
    delete_at_boundary(tree, sel, backward)
}

/// Caret slot `(container, index)`: the caret sits between the
/// container's children `index - 1` and `index`.
fn caret_slot(tree: &DocumentTree, point: &Point, backward: bool) -> (NodeKey, usize) {
    match point.kind {
        PointKind::Element => (point.key, point.offset),
        PointKind::Text => {
            let parent = tree
                .parent(point.key)
                .expect("caret text node has a parent");
            let index = tree
                .index_within_parent(point.key)
                .expect("caret text node has an index");
            if backward { (parent, index) } else { (parent, index + 1) }
        }
    }
}

fn delete_at_boundary(
    tree: &mut DocumentTree,
    sel: &mut RangeSelection,
    backward: bool,
) -> Option<Selection> {
    let point = sel.anchor;
    let (container, slot) = caret_slot(tree, &point, backward);
    let neighbor = if backward {
        slot.checked_sub(1)
            .and_then(|i| tree.children(container).get(i).copied())
    } else {
        tree.children(container).get(slot).copied()
    };

    if let Some(neighbor) = neighbor {
        return consume_neighbor(tree, sel, container, slot, neighbor, backward);
    }

    if tree.node(container).is_root() {
        // Caret directly at the document edge.
        return None;
    }

    // The caret sits at a block edge: climb to a sibling block or apply
    // the collapse policy at the document front.
    let mut block = container;
    loop {
        let sibling = if backward {
            tree.prev_sibling(block)
        } else {
            tree.next_sibling(block)
        };
        if let Some(sibling) = sibling {
            return merge_across_blocks(tree, sel, block, sibling, backward);
        }
        match tree.parent(block) {
            Some(parent) if parent != tree.root() => block = parent,
            _ => {
                if backward {
                    apply_collapse_at_start(tree, sel, block);
                }
                return None;
            }
        }
    }
}

enum NeighborUnit {
    EmptyText,
    TextBackward { start: usize, size: usize },
    TextForward { end: usize },
    Marker,
    InlineDecorator,
    BlockDecorator,
    Container,
    Root,
}

fn consume_neighbor(
    tree: &mut DocumentTree,
    sel: &mut RangeSelection,
    container: NodeKey,
    slot: usize,
    neighbor: NodeKey,
    backward: bool,
) -> Option<Selection> {
    let removed_slot = if backward { slot - 1 } else { slot };
    let unit = match tree.node(neighbor).body() {
        NodeBody::Text(t) if t.size() == 0 => NeighborUnit::EmptyText,
        NodeBody::Text(t) if backward => NeighborUnit::TextBackward {
            start: grapheme_before(t.text(), t.size()),
            size: t.size(),
        },
        NodeBody::Text(t) => NeighborUnit::TextForward {
            end: grapheme_after(t.text(), 0),
        },
        NodeBody::LineBreak | NodeBody::Tab => NeighborUnit::Marker,
        NodeBody::Decorator(d) if d.inline => NeighborUnit::InlineDecorator,
        NodeBody::Decorator(_) => NeighborUnit::BlockDecorator,
        NodeBody::Element(_) => NeighborUnit::Container,
        NodeBody::Root(_) => NeighborUnit::Root,
    };
    match unit {
        NeighborUnit::EmptyText => {
            let _ = tree.remove(neighbor);
            if sel.anchor.kind == PointKind::Element {
                sel.set_caret(Point::element(container, removed_slot));
            }
            // The empty node consumed no unit; keep going.
            delete_at_boundary(tree, sel, backward)
        }
        NeighborUnit::TextBackward { start, size } => {
            tree.splice_text(neighbor, start..size, "");
            sel.set_caret(Point::text(neighbor, start));
            None
        }
        NeighborUnit::TextForward { end } => {
            tree.splice_text(neighbor, 0..end, "");
            sel.set_caret(Point::text(neighbor, 0));
            None
        }
        NeighborUnit::Marker | NeighborUnit::InlineDecorator => {
            let _ = tree.remove(neighbor);
            if sel.anchor.kind == PointKind::Element {
                sel.set_caret(Point::element(container, removed_slot));
            }
            None
        }
        // Atomic blocks are selected first; deleting again removes them.
        NeighborUnit::BlockDecorator => Some(Selection::Node(NodeSelection::single(neighbor))),
        NeighborUnit::Container => {
            // Step into the adjacent block and consume there.
            let caret = if backward {
                caret_at_end(tree, neighbor)
            } else {
                caret_at_start(tree, neighbor)
            };
            sel.set_caret(caret);
            delete_character(tree, sel, backward)
        }
        NeighborUnit::Root => None,
    }
}

fn merge_across_blocks(
    tree: &mut DocumentTree,
    sel: &mut RangeSelection,
    block: NodeKey,
    sibling: NodeKey,
    backward: bool,
) -> Option<Selection> {
    enum SiblingKind {
        Block { empty: bool, merges_silently: bool },
        Decorator,
        Other,
    }
    let kind = match tree.node(sibling).body() {
        NodeBody::Element(el) => SiblingKind::Block {
            empty: el.is_empty(),
            merges_silently: el.kind().can_merge_when_empty(),
        },
        NodeBody::Decorator(_) => SiblingKind::Decorator,
        _ => SiblingKind::Other,
    };
    match kind {
        SiblingKind::Block {
            empty,
            merges_silently,
        } => {
            if empty && merges_silently {
                let _ = tree.remove(sibling);
                debug!("removed empty mergeable block {sibling}");
                return None;
            }
            if backward {
                // Join this block onto the end of the previous one.
                let caret = caret_at_end(tree, sibling);
                tree.move_children(block, sibling)
                    .expect("merge source and target are attached");
                let _ = tree.remove(block);
                sel.set_caret(normalize_point(tree, caret));
            } else {
                // Pull the next block's content into this one.
                tree.move_children(sibling, block)
                    .expect("merge source and target are attached");
                let _ = tree.remove(sibling);
            }
            debug!("merged blocks across boundary ({backward})");
            None
        }
        SiblingKind::Decorator => Some(Selection::Node(NodeSelection::single(sibling))),
        SiblingKind::Other => None,
    }
}

fn apply_collapse_at_start(tree: &mut DocumentTree, sel: &mut RangeSelection, block: NodeKey) {
    let anchor = sel.anchor;
    if let Some(replacement) = tree.collapse_block_at_start(block) {
        // Children keep their keys when re-homed, so a text caret stays
        // valid; only an element caret on the old block must be re-aimed.
        if anchor.kind == PointKind::Element && anchor.key == block {
            let count = tree.child_count(replacement);
            sel.set_caret(Point::element(replacement, anchor.offset.min(count)));
        }
    }
}

/// Deletes one word unit in the requested direction; at a node boundary
/// this degrades to character deletion so block merging applies.
pub fn delete_word(
    tree: &mut DocumentTree,
    sel: &mut RangeSelection,
    backward: bool,
) -> Option<Selection> {
    if !sel.is_collapsed() {
        remove_ranged_content(tree, sel);
        return None;
    }
    let point = sel.anchor;
    if point.kind != PointKind::Text {
        return delete_character(tree, sel, backward);
    }
    let text = tree.node(point.key).text().text().to_string();
    if backward {
        if point.offset == 0 {
            return delete_character(tree, sel, true);
        }
        let mut boundary = point.offset;
        let mut segments: Vec<(usize, &str)> =
            text[..point.offset].split_word_bound_indices().collect();
        while let Some((index, segment)) = segments.pop() {
            boundary = index;
            if !segment.trim().is_empty() {
                break;
            }
        }
        tree.splice_text(point.key, boundary..point.offset, "");
        sel.set_caret(Point::text(point.key, boundary));
    } else {
        if point.offset == text.len() {
            return delete_character(tree, sel, false);
        }
        let mut end = point.offset;
        for (index, segment) in text[point.offset..].split_word_bound_indices() {
            end = point.offset + index + segment.len();
            if !segment.trim().is_empty() {
                break;
            }
        }
        tree.splice_text(point.key, point.offset..end, "");
    }
    None
}

/// Deletes to the nearest line boundary: text and leaves back to (or
/// forward to) a line-break marker; a break directly in the way is the
/// consumed unit itself.
pub fn delete_line(
    tree: &mut DocumentTree,
    sel: &mut RangeSelection,
    backward: bool,
) -> Option<Selection> {
    if !sel.is_collapsed() {
        remove_ranged_content(tree, sel);
        return None;
    }

    let mut removed_any = false;
    let point = sel.anchor;
    if point.kind == PointKind::Text {
        let size = tree.node(point.key).text_size();
        if backward && point.offset > 0 {
            tree.splice_text(point.key, 0..point.offset, "");
            sel.set_caret(Point::text(point.key, 0));
            removed_any = true;
        } else if !backward && point.offset < size {
            tree.splice_text(point.key, point.offset..size, "");
            removed_any = true;
        }
    }

    loop {
        let point = sel.anchor;
        let (container, slot) = caret_slot(tree, &point, backward);
        let neighbor = if backward {
            slot.checked_sub(1)
                .and_then(|i| tree.children(container).get(i).copied())
        } else {
            tree.children(container).get(slot).copied()
        };
        let Some(neighbor) = neighbor else {
            if !removed_any {
                return delete_character(tree, sel, backward);
            }
            return None;
        };
        enum LineUnit {
            Break,
            Chunk,
            Stop,
        }
        let unit = match tree.node(neighbor).body() {
            NodeBody::LineBreak => LineUnit::Break,
            NodeBody::Text(_) | NodeBody::Tab => LineUnit::Chunk,
            NodeBody::Decorator(d) if d.inline => LineUnit::Chunk,
            _ => LineUnit::Stop,
        };
        let removed_slot = if backward { slot.saturating_sub(1) } else { slot };
        match unit {
            LineUnit::Break => {
                if !removed_any {
                    let _ = tree.remove(neighbor);
                    if sel.anchor.kind == PointKind::Element {
                        sel.set_caret(Point::element(container, removed_slot));
                    }
                }
                return None;
            }
            LineUnit::Chunk => {
                let _ = tree.remove(neighbor);
                if sel.anchor.kind == PointKind::Element {
                    sel.set_caret(Point::element(container, removed_slot));
                }
                removed_any = true;
            }
            LineUnit::Stop => {
                if !removed_any {
                    return delete_character(tree, sel, backward);
                }
                return None;
            }
        }
    }
}

/// Ranged text removal; a collapsed selection is left untouched.
pub fn remove_text(tree: &mut DocumentTree, sel: &mut RangeSelection) {
    remove_ranged_content(tree, sel);
}

/// Removes every node of a whole-node selection and returns the caret
/// selection nearest to where the nodes were.
pub fn delete_nodes(tree: &mut DocumentTree, sel: &NodeSelection) -> Selection {
    let mut fallback: Option<(NodeKey, usize)> = None;
    for &key in sel.keys() {
        if !tree.contains(key) {
            continue;
        }
        if fallback.is_none() {
            fallback = tree
                .parent(key)
                .map(|p| (p, tree.index_within_parent(key).unwrap_or(0)));
        }
        let _ = tree.remove(key);
    }
    let caret = match fallback {
        Some((parent, index)) if tree.contains(parent) && tree.is_attached(parent) => {
            let count = tree.child_count(parent);
            normalize_point(tree, Point::element(parent, index.min(count)))
        }
        _ => caret_at_end(tree, tree.root()),
    };
    Selection::caret(caret)
}

// ---- character formatting --------------------------------------------

/// Toggles a character format: the pending bitmask for a collapsed
/// caret, the spanned text nodes (split at the boundaries) for a range.
/// The first spanned text node decides the toggle direction.
pub fn format_text(
    tree: &mut DocumentTree,
    sel: &mut RangeSelection,
    kind: crate::node::TextFormatKind,
) {
    if sel.is_collapsed() {
        sel.format = sel.format.toggled(kind);
        return;
    }
    let backward = sel.is_backward(tree);
    let (start, end) = sel.ordered_points(tree);
    let start = normalize_point(tree, start);
    let end = normalize_point(tree, end);

    // Same-node range: isolate the covered slice.
    if start.kind == PointKind::Text && end.kind == PointKind::Text && start.key == end.key {
        let size = tree.node(start.key).text_size();
        let mut target = start.key;
        if end.offset < size {
            tree.split_text(target, end.offset)
                .expect("range end is splittable");
        }
        if start.offset > 0 {
            let (_, right) = tree
                .split_text(target, start.offset)
                .expect("range start is splittable");
            target = right;
        }
        let apply = !tree.node(target).text().format().has(kind);
        toggle_text_format(tree, target, kind, apply);
        let target_size = tree.node(target).text_size();
        let (a, b) = (Point::text(target, 0), Point::text(target, target_size));
        set_range(sel, a, b, backward);
        sel.format = tree.node(target).text().format();
        return;
    }

    let start_size = tree.node(start.key).text_size();
    let skip_first = start.kind == PointKind::Text && start.offset == start_size && start_size > 0;
    let skip_last = end.kind == PointKind::Text && end.offset == 0;

    // Split partially covered boundary nodes so toggles cover whole
    // nodes.
    let first_covered = if start.kind == PointKind::Text && start.offset > 0 && !skip_first {
        let (_, right) = tree
            .split_text(start.key, start.offset)
            .expect("range start is splittable");
        right
    } else {
        start.key
    };
    if end.kind == PointKind::Text && end.offset > 0 && end.offset < tree.node(end.key).text_size()
    {
        tree.split_text(end.key, end.offset)
            .expect("range end is splittable");
    }

    let scan_start = match start.kind {
        PointKind::Text => Point::text(first_covered, 0),
        PointKind::Element => start,
    };
    let scan_end = match end.kind {
        PointKind::Text => Point::text(end.key, tree.node(end.key).text_size()),
        PointKind::Element => end,
    };
    let covered: Vec<NodeKey> = RangeSelection::new(scan_start, scan_end)
        .nodes(tree)
        .filter(|&k| {
            let node = tree.node(k);
            node.is_text()
                && node.text_size() > 0
                && !(skip_first && k == start.key)
                && !(skip_last && k == end.key)
        })
        .collect();
    let Some(&first) = covered.first() else {
        return;
    };
    let apply = !tree.node(first).text().format().has(kind);
    for &key in &covered {
        toggle_text_format(tree, key, kind, apply);
    }

    let last = *covered.last().expect("non-empty covered set");
    let (a, b) = (
        Point::text(first, 0),
        Point::text(last, tree.node(last).text_size()),
    );
    set_range(sel, a, b, backward);
    sel.format = if apply {
        sel.format.with(kind)
    } else {
        sel.format.without(kind)
    };
}

fn toggle_text_format(
    tree: &mut DocumentTree,
    key: NodeKey,
    kind: crate::node::TextFormatKind,
    apply: bool,
) {
    let current = tree.node(key).text().format();
    let next = if apply {
        current.with(kind)
    } else {
        current.without(kind)
    };
    tree.node_mut(key).text_mut().set_format(next);
}

fn set_range(sel: &mut RangeSelection, start: Point, end: Point, backward: bool) {
    if backward {
        sel.anchor = end;
        sel.focus = start;
    } else {
        sel.anchor = start;
        sel.focus = end;
    }
}

// ---- caret movement ---------------------------------------------------

/// Whether default platform caret movement must be overridden because
/// the adjacent unit is an atomic decorator.
pub fn should_override_character_move(
    tree: &DocumentTree,
    sel: &RangeSelection,
    backward: bool,
) -> bool {
    crate::selection::adjacent_node(tree, &sel.focus, backward)
        .map(|k| tree.node(k).is_decorator())
        .unwrap_or(false)
}

/// Moves the caret (or extends the focus) one character unit, stepping
/// over zero-width markers and selecting atomic decorators whole.
pub fn move_character(
    tree: &mut DocumentTree,
    sel: &mut RangeSelection,
    extend: bool,
    backward: bool,
) -> Option<Selection> {
    if !extend && !sel.is_collapsed() {
        let (start, end) = sel.ordered_points(tree);
        sel.set_caret(if backward { start } else { end });
        return None;
    }
    let focus = sel.focus;
    if focus.kind == PointKind::Text {
        let (size, text) = {
            let t = tree.node(focus.key).text();
            (t.size(), t.text().to_string())
        };
        if backward && focus.offset > 0 {
            let target = Point::text(focus.key, grapheme_before(&text, focus.offset));
            apply_move(sel, target, extend);
            return None;
        }
        if !backward && focus.offset < size {
            let target = Point::text(focus.key, grapheme_after(&text, focus.offset));
            apply_move(sel, target, extend);
            return None;
        }
    }
    let Some(adjacent) = crate::selection::adjacent_node(tree, &focus, backward) else {
        return None;
    };
    match tree.node(adjacent).body() {
        NodeBody::Text(t) => {
            let target = if backward {
                Point::text(adjacent, grapheme_before(t.text(), t.size()))
            } else {
                Point::text(adjacent, grapheme_after(t.text(), 0))
            };
            apply_move(sel, target, extend);
            None
        }
        NodeBody::Element(_) => {
            let target = if backward {
                caret_at_end(tree, adjacent)
            } else {
                caret_at_start(tree, adjacent)
            };
            apply_move(sel, target, extend);
            None
        }
        NodeBody::LineBreak | NodeBody::Tab => {
            let parent = tree.parent(adjacent).unwrap_or_else(|| tree.root());
            let index = tree.index_within_parent(adjacent).unwrap_or(0);
            let target = Point::element(parent, if backward { index } else { index + 1 });
            apply_move(sel, target, extend);
            None
        }
        NodeBody::Decorator(_) => {
            if extend {
                let parent = tree.parent(adjacent).unwrap_or_else(|| tree.root());
                let index = tree.index_within_parent(adjacent).unwrap_or(0);
                sel.focus = Point::element(parent, if backward { index } else { index + 1 });
                None
            } else {
                Some(Selection::Node(NodeSelection::single(adjacent)))
            }
        }
        NodeBody::Root(_) => None,
    }
}

fn apply_move(sel: &mut RangeSelection, target: Point, extend: bool) {
    if extend {
        sel.focus = target;
    } else {
        sel.set_caret(target);
    }
}
