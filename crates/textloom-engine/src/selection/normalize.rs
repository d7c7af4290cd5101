//! Point normalization.
//!
//! Externally constructed points (resolved from input coordinates, built
//! by collaborators) may describe the same document position in several
//! ways: a child index into a container, the end of one text node, the
//! start of the next. Normalization canonicalizes them so selection
//! equality is well-defined: element points descend to the leaf-most
//! representation, and a text point at end-of-node moves to the start of
//! a following sibling text node.

use log::trace;

use crate::selection::{Point, PointKind, RangeSelection};
use crate::tree::DocumentTree;

pub fn normalize_point(tree: &DocumentTree, point: Point) -> Point {
    let normalized = normalize_inner(tree, point);
    if normalized != point {
        trace!(
            "normalized point {}:{} to {}:{}",
            point.key, point.offset, normalized.key, normalized.offset
        );
    }
    normalized
}

fn normalize_inner(tree: &DocumentTree, point: Point) -> Point {
    let mut current = point;
    loop {
        match current.kind {
            PointKind::Element => {
                let children = tree.children(current.key);
                if children.is_empty() {
                    return Point::element(current.key, 0);
                }
                if current.offset >= children.len() {
                    // Past the last child: land at the end of it.
                    let child = children[children.len() - 1];
                    let node = tree.node(child);
                    if node.is_text() {
                        return Point::text(child, node.text_size());
                    }
                    if node.is_leaf() {
                        return Point::element(current.key, children.len());
                    }
                    current = Point::element(child, tree.child_count(child));
                } else {
                    let child = children[current.offset];
                    let node = tree.node(child);
                    if node.is_text() {
                        return Point::text(child, 0);
                    }
                    if node.is_leaf() {
                        // Atomic leaves stay addressed by child index.
                        return current;
                    }
                    current = Point::element(child, 0);
                }
            }
            PointKind::Text => {
                let node = tree.node(current.key);
                let text = node.text();
                let mut offset = current.offset.min(text.size());
                while !text.text().is_char_boundary(offset) {
                    offset -= 1;
                }
                if offset == text.size()
                    && let Some(next) = tree.next_sibling(current.key)
                    && tree.node(next).is_text()
                {
                    return Point::text(next, 0);
                }
                return Point::text(current.key, offset);
            }
        }
    }
}

/// Normalizes both ends of a range, preserving the pending format.
pub fn normalize_selection(tree: &DocumentTree, selection: &RangeSelection) -> RangeSelection {
    let mut normalized = RangeSelection::new(
        normalize_point(tree, selection.anchor),
        normalize_point(tree, selection.focus),
    );
    normalized.format = selection.format;
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::DocumentTree;
    use pretty_assertions::assert_eq;

    #[test]
    fn element_point_descends_to_text_start() {
        let (mut tree, paragraph) = DocumentTree::with_empty_paragraph();
        let text = tree.create_text("abc");
        tree.append(paragraph, text).unwrap();

        let p = normalize_point(&tree, Point::element(tree.root(), 0));
        assert_eq!(p, Point::text(text, 0));
    }

    #[test]
    fn element_point_past_children_lands_at_last_text_end() {
        let (mut tree, paragraph) = DocumentTree::with_empty_paragraph();
        let text = tree.create_text("abc");
        tree.append(paragraph, text).unwrap();

        let p = normalize_point(&tree, Point::element(paragraph, 5));
        assert_eq!(p, Point::text(text, 3));
    }

    #[test]
    fn end_of_text_canonicalizes_to_start_of_next_text_sibling() {
        let (mut tree, paragraph) = DocumentTree::with_empty_paragraph();
        let a = tree.create_text("ab");
        let b = tree.create_text("cd");
        tree.append(paragraph, a).unwrap();
        tree.append(paragraph, b).unwrap();

        let p = normalize_point(&tree, Point::text(a, 2));
        assert_eq!(p, Point::text(b, 0));
        // Equivalent boundary representations converge.
        let q = normalize_point(&tree, Point::element(paragraph, 1));
        assert_eq!(p, q);
    }

    #[test]
    fn empty_block_stays_an_element_point() {
        let (tree, paragraph) = DocumentTree::with_empty_paragraph();
        let p = normalize_point(&tree, Point::element(paragraph, 3));
        assert_eq!(p, Point::element(paragraph, 0));
    }

    #[test]
    fn point_before_atomic_leaf_stays_a_child_index() {
        let (mut tree, paragraph) = DocumentTree::with_empty_paragraph();
        let decorator = tree.create_decorator(true, false);
        tree.append(paragraph, decorator).unwrap();

        let p = normalize_point(&tree, Point::element(paragraph, 0));
        assert_eq!(p, Point::element(paragraph, 0));
    }

    #[test]
    fn text_offset_clamps_to_char_boundary() {
        let (mut tree, paragraph) = DocumentTree::with_empty_paragraph();
        let text = tree.create_text("héllo");
        tree.append(paragraph, text).unwrap();
        // 'é' spans bytes 1..3; an offset inside it snaps down.
        let p = normalize_point(&tree, Point::text(text, 2));
        assert_eq!(p, Point::text(text, 1));
    }
}
