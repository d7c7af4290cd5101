//! Node model: a closed set of tagged variants spanning the four
//! capability tiers (root, element, text-bearing leaf, atomic leaf) plus
//! the zero-width line-break and tab markers.

pub mod decorator;
pub mod element;
pub mod heading;
pub mod quote;
pub mod text;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use decorator::DecoratorNode;
pub use element::{Direction, ElementFormat, ElementKind, ElementNode};
pub use heading::HeadingTag;
pub use text::{TextFormat, TextFormatKind, TextNode};

/// Stable node identity, the only valid cross-reference into the tree.
///
/// Keys survive mutation; structural positions do not.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeKey(Uuid);

impl NodeKey {
    pub(crate) fn fresh() -> Self {
        NodeKey(Uuid::new_v4())
    }
}

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The unique top container. Holds blocks and block decorators.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RootNode {
    pub(crate) children: Vec<NodeKey>,
}

/// Payload of a node, one variant per capability tier.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody {
    Root(RootNode),
    Element(ElementNode),
    Text(TextNode),
    Decorator(DecoratorNode),
    LineBreak,
    Tab,
}

/// A node in the document tree: identity, parent linkage and payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) key: NodeKey,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) body: NodeBody,
}

impl Node {
    pub(crate) fn new(body: NodeBody) -> Self {
        Self {
            key: NodeKey::fresh(),
            parent: None,
            body,
        }
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn body(&self) -> &NodeBody {
        &self.body
    }

    pub fn is_root(&self) -> bool {
        matches!(self.body, NodeBody::Root(_))
    }

    pub fn is_element(&self) -> bool {
        matches!(self.body, NodeBody::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.body, NodeBody::Text(_))
    }

    pub fn is_decorator(&self) -> bool {
        matches!(self.body, NodeBody::Decorator(_))
    }

    pub fn is_line_break(&self) -> bool {
        matches!(self.body, NodeBody::LineBreak)
    }

    pub fn is_tab(&self) -> bool {
        matches!(self.body, NodeBody::Tab)
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self.body, NodeBody::Root(_) | NodeBody::Element(_))
    }

    /// A non-inline element: participates in document-level block
    /// structure.
    pub fn is_block(&self) -> bool {
        match &self.body {
            NodeBody::Element(el) => !el.kind().is_inline(),
            _ => false,
        }
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match &self.body {
            NodeBody::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementNode> {
        match &mut self.body {
            NodeBody::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match &self.body {
            NodeBody::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextNode> {
        match &mut self.body {
            NodeBody::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_decorator(&self) -> Option<&DecoratorNode> {
        match &self.body {
            NodeBody::Decorator(d) => Some(d),
            _ => None,
        }
    }

    /// Panicking accessor for contexts where the tier is guaranteed.
    pub fn element(&self) -> &ElementNode {
        self.as_element()
            .unwrap_or_else(|| panic!("node {} is not an element", self.key))
    }

    pub(crate) fn element_mut(&mut self) -> &mut ElementNode {
        let key = self.key;
        self.as_element_mut()
            .unwrap_or_else(|| panic!("node {key} is not an element"))
    }

    /// Panicking accessor for contexts where the tier is guaranteed.
    pub fn text(&self) -> &TextNode {
        self.as_text()
            .unwrap_or_else(|| panic!("node {} is not a text node", self.key))
    }

    pub(crate) fn text_mut(&mut self) -> &mut TextNode {
        let key = self.key;
        self.as_text_mut()
            .unwrap_or_else(|| panic!("node {key} is not a text node"))
    }

    /// Ordered children for container tiers, empty for leaves.
    pub fn child_keys(&self) -> &[NodeKey] {
        match &self.body {
            NodeBody::Root(root) => &root.children,
            NodeBody::Element(el) => &el.children,
            _ => &[],
        }
    }

    pub(crate) fn child_keys_mut(&mut self) -> Option<&mut Vec<NodeKey>> {
        match &mut self.body {
            NodeBody::Root(root) => Some(&mut root.children),
            NodeBody::Element(el) => Some(&mut el.children),
            _ => None,
        }
    }

    /// Text content size in bytes; zero for anything but a text node.
    pub fn text_size(&self) -> usize {
        match &self.body {
            NodeBody::Text(t) => t.size(),
            _ => 0,
        }
    }
}
