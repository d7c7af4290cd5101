//! Selection model: two mutually exclusive variants (a range between two
//! tree points, or a set of whole nodes) plus the adjacency and boundary
//! queries the editing operations are built on.

pub mod edit;
pub mod normalize;
pub mod point;

pub use normalize::{normalize_point, normalize_selection};
pub use point::{Point, PointKind};

use crate::node::{NodeBody, NodeKey, TextFormat, TextFormatKind};
use crate::tree::{DocumentIter, DocumentTree};

/// A caret or directional range between two points, plus the pending
/// character format applied to subsequently typed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSelection {
    pub anchor: Point,
    pub focus: Point,
    pub format: TextFormat,
}

impl RangeSelection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self {
            anchor,
            focus,
            format: TextFormat::NONE,
        }
    }

    pub fn collapsed(point: Point) -> Self {
        Self::new(point, point)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_backward(&self, tree: &DocumentTree) -> bool {
        self.focus.is_before(&self.anchor, tree)
    }

    /// `(start, end)` in document order regardless of drag direction.
    pub fn ordered_points(&self, tree: &DocumentTree) -> (Point, Point) {
        if self.is_backward(tree) {
            (self.focus, self.anchor)
        } else {
            (self.anchor, self.focus)
        }
    }

    pub fn set_caret(&mut self, point: Point) {
        self.anchor = point;
        self.focus = point;
    }

    /// Lazy pre-order sequence of the nodes this selection spans,
    /// leaf-inclusive. Restart by calling again; the iterator is `Clone`.
    pub fn nodes<'a>(&self, tree: &'a DocumentTree) -> SpannedNodes<'a> {
        let (start, end) = self.ordered_points(tree);
        let first = span_target(tree, &start, false);
        let last = first.and_then(|_| span_target(tree, &end, true));
        SpannedNodes {
            iter: tree.iter(),
            first,
            last,
            started: false,
            done: false,
        }
    }

    /// Pending-format query for collapsed carets; for ranges, whether
    /// every spanned non-empty text node carries the format.
    pub fn has_format(&self, tree: &DocumentTree, kind: TextFormatKind) -> bool {
        if self.is_collapsed() {
            return self.format.has(kind);
        }
        let mut saw_text = false;
        for key in self.nodes(tree) {
            if let Some(text) = tree.node(key).as_text() {
                if text.size() == 0 {
                    continue;
                }
                saw_text = true;
                if !text.format().has(kind) {
                    return false;
                }
            }
        }
        if saw_text { true } else { self.format.has(kind) }
    }
}

/// Whole-node selection, used for atomic decorator nodes. Keys keep
/// insertion order so "the first selected node" is well-defined.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeSelection {
    keys: Vec<NodeKey>,
}

impl NodeSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(key: NodeKey) -> Self {
        Self { keys: vec![key] }
    }

    pub fn add(&mut self, key: NodeKey) {
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
    }

    pub fn delete(&mut self, key: NodeKey) {
        self.keys.retain(|&k| k != key);
    }

    pub fn has(&self, key: NodeKey) -> bool {
        self.keys.contains(&key)
    }

    pub fn keys(&self) -> &[NodeKey] {
        &self.keys
    }

    pub fn first(&self) -> Option<NodeKey> {
        self.keys.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

/// The process-wide selection: exactly one variant at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Range(RangeSelection),
    Node(NodeSelection),
}

impl Selection {
    pub fn caret(point: Point) -> Self {
        Selection::Range(RangeSelection::collapsed(point))
    }

    pub fn as_range(&self) -> Option<&RangeSelection> {
        match self {
            Selection::Range(r) => Some(r),
            Selection::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&NodeSelection> {
        match self {
            Selection::Node(n) => Some(n),
            Selection::Range(_) => None,
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Selection::Range(_))
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Selection::Node(_))
    }
}

/// Resolves a point to the node that bounds its side of the span.
/// End points descend so the spanned slice covers whole subtrees; a
/// start point past a container's children continues at the next node
/// in document order (`None` at the document boundary).
fn span_target(tree: &DocumentTree, point: &Point, end: bool) -> Option<NodeKey> {
    match point.kind {
        PointKind::Text => Some(point.key),
        PointKind::Element => {
            let children = tree.children(point.key);
            if children.is_empty() {
                return Some(point.key);
            }
            if !end {
                if point.offset < children.len() {
                    Some(children[point.offset])
                } else {
                    adjacent_node(tree, point, false)
                }
            } else if point.offset == 0 {
                // The span ends at the container's opening boundary:
                // the container itself, none of its children.
                Some(point.key)
            } else {
                let child = children[point.offset.min(children.len()) - 1];
                Some(tree.last_descendant(child).unwrap_or(child))
            }
        }
    }
}

/// Pre-order slice of the document between two nodes, inclusive.
#[derive(Clone)]
pub struct SpannedNodes<'a> {
    iter: DocumentIter<'a>,
    first: Option<NodeKey>,
    last: Option<NodeKey>,
    started: bool,
    done: bool,
}

impl<'a> Iterator for SpannedNodes<'a> {
    type Item = NodeKey;

    fn next(&mut self) -> Option<NodeKey> {
        if self.done {
            return None;
        }
        let (Some(first), Some(last)) = (self.first, self.last) else {
            self.done = true;
            return None;
        };
        for key in self.iter.by_ref() {
            if !self.started {
                if key != first {
                    continue;
                }
                self.started = true;
            }
            if key == last {
                self.done = true;
            }
            return Some(key);
        }
        self.done = true;
        None
    }
}

// ---- caret placement helpers -----------------------------------------

/// Caret at the first content position inside `container`.
pub fn caret_at_start(tree: &DocumentTree, container: NodeKey) -> Point {
    match tree.first_descendant(container) {
        Some(d) if tree.node(d).is_text() => Point::text(d, 0),
        Some(d) => {
            let parent = tree.parent(d).unwrap_or(container);
            let index = tree.index_within_parent(d).unwrap_or(0);
            Point::element(parent, index)
        }
        None => Point::element(container, 0),
    }
}

/// Caret at the last content position inside `container`.
pub fn caret_at_end(tree: &DocumentTree, container: NodeKey) -> Point {
    match tree.last_descendant(container) {
        Some(d) if tree.node(d).is_text() => Point::text(d, tree.node(d).text_size()),
        Some(d) => {
            let parent = tree.parent(d).unwrap_or(container);
            let index = tree.index_within_parent(d).unwrap_or(0);
            Point::element(parent, index + 1)
        }
        None => Point::element(container, 0),
    }
}

/// Caret immediately before `key`, as left-arrow out of a whole-node
/// selection produces: the end of the previous sibling when there is
/// one, the parent's boundary otherwise.
pub fn select_previous(tree: &DocumentTree, key: NodeKey) -> RangeSelection {
    let point = match tree.prev_sibling(key) {
        Some(sibling) => match tree.node(sibling).body() {
            NodeBody::Text(t) => Point::text(sibling, t.size()),
            NodeBody::Element(_) => caret_at_end(tree, sibling),
            _ => {
                let parent = tree.parent(key).unwrap_or_else(|| tree.root());
                let index = tree.index_within_parent(key).unwrap_or(0);
                Point::element(parent, index)
            }
        },
        None => {
            let parent = tree.parent(key).unwrap_or_else(|| tree.root());
            Point::element(parent, 0)
        }
    };
    RangeSelection::collapsed(point)
}

/// Caret immediately after `key`; counterpart to [`select_previous`].
pub fn select_next(tree: &DocumentTree, key: NodeKey) -> RangeSelection {
    let point = match tree.next_sibling(key) {
        Some(sibling) => match tree.node(sibling).body() {
            NodeBody::Text(_) => Point::text(sibling, 0),
            NodeBody::Element(_) => caret_at_start(tree, sibling),
            _ => {
                let parent = tree.parent(key).unwrap_or_else(|| tree.root());
                let index = tree.index_within_parent(key).unwrap_or(0);
                Point::element(parent, index + 1)
            }
        },
        None => {
            let parent = tree.parent(key).unwrap_or_else(|| tree.root());
            Point::element(parent, tree.child_count(parent))
        }
    };
    RangeSelection::collapsed(point)
}

/// The node immediately before or after `point` in document order,
/// climbing out of exhausted ancestors; `None` at the document boundary
/// or when the next unit is a character inside the same text node.
pub fn adjacent_node(tree: &DocumentTree, point: &Point, backward: bool) -> Option<NodeKey> {
    match point.kind {
        PointKind::Element => {
            let children = tree.children(point.key);
            if backward {
                if point.offset > 0 {
                    return children.get(point.offset - 1).copied();
                }
            } else if point.offset < children.len() {
                return Some(children[point.offset]);
            }
            climb(tree, point.key, backward)
        }
        PointKind::Text => {
            let size = tree.node(point.key).text_size();
            if backward && point.offset == 0 {
                climb(tree, point.key, backward)
            } else if !backward && point.offset >= size {
                climb(tree, point.key, backward)
            } else {
                None
            }
        }
    }
}

fn climb(tree: &DocumentTree, start: NodeKey, backward: bool) -> Option<NodeKey> {
    let mut current = start;
    while current != tree.root() {
        let sibling = if backward {
            tree.prev_sibling(current)
        } else {
            tree.next_sibling(current)
        };
        if let Some(s) = sibling {
            return Some(s);
        }
        current = tree.parent(current)?;
    }
    None
}

/// Range spanning the entire document.
pub fn select_all(tree: &DocumentTree) -> RangeSelection {
    RangeSelection::new(
        caret_at_start(tree, tree.root()),
        caret_at_end(tree, tree.root()),
    )
}

/// Whether the focus sits at the very last position of the document —
/// either a child-index point past the root's children or a caret at the
/// end of the last leaf of the last block.
pub fn is_at_document_end(tree: &DocumentTree, selection: &RangeSelection) -> bool {
    let focus = &selection.focus;
    if focus.kind == PointKind::Element
        && focus.key == tree.root()
        && focus.offset == tree.child_count(tree.root())
    {
        return true;
    }
    *focus == caret_at_end(tree, tree.root())
}
