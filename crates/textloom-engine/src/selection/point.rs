use crate::node::NodeKey;
use crate::tree::DocumentTree;

/// Which coordinate space a [`Point`] offset lives in.
///
/// Text offsets are byte offsets into a text node; element offsets are
/// child indices into a container. The kind must match the referenced
/// node's tier — a mismatch is an invariant violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    Text,
    Element,
}

/// One end of a range selection: a node, an offset and the offset kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub key: NodeKey,
    pub offset: usize,
    pub kind: PointKind,
}

impl Point {
    pub fn text(key: NodeKey, offset: usize) -> Self {
        Self {
            key,
            offset,
            kind: PointKind::Text,
        }
    }

    pub fn element(key: NodeKey, offset: usize) -> Self {
        Self {
            key,
            offset,
            kind: PointKind::Element,
        }
    }

    /// Child-index path from the root to this point, offset last.
    /// Lexicographic comparison of paths is document order.
    pub(crate) fn path(&self, tree: &DocumentTree) -> Vec<usize> {
        let mut indices = Vec::new();
        let mut current = self.key;
        while let Some(index) = tree.index_within_parent(current) {
            indices.push(index);
            current = tree
                .parent(current)
                .expect("node with an index has a parent");
        }
        indices.reverse();
        indices.push(self.offset);
        indices
    }

    pub fn is_before(&self, other: &Point, tree: &DocumentTree) -> bool {
        self.path(tree) < other.path(tree)
    }

    /// Fail-fast validation: the point must reference an attached node,
    /// the offset kind must match the node tier, and the offset must sit
    /// inside the node. Violations are programming-contract breaches.
    pub fn assert_valid(&self, tree: &DocumentTree) {
        let Some(node) = tree.get(self.key) else {
            panic!("selection point references removed node {}", self.key);
        };
        assert!(
            tree.is_attached(self.key),
            "selection point references detached node {}",
            self.key
        );
        match self.kind {
            PointKind::Text => {
                let Some(text) = node.as_text() else {
                    panic!(
                        "text-offset point on non-text node {} (tier mismatch)",
                        self.key
                    );
                };
                assert!(
                    self.offset <= text.size() && text.text().is_char_boundary(self.offset),
                    "text offset {} invalid for node {} (size {})",
                    self.offset,
                    self.key,
                    text.size()
                );
            }
            PointKind::Element => {
                assert!(
                    !node.is_leaf(),
                    "child-index point on leaf node {} (tier mismatch)",
                    self.key
                );
                assert!(
                    self.offset <= node.child_keys().len(),
                    "child index {} out of bounds for node {} ({} children)",
                    self.offset,
                    self.key,
                    node.child_keys().len()
                );
            }
        }
    }
}
