use serde::{Deserialize, Serialize};

use crate::node::NodeKey;
use crate::node::heading::HeadingTag;

/// Block-level alignment format of an element, or `None` when unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementFormat {
    #[default]
    None,
    Left,
    Start,
    Center,
    Right,
    End,
    Justify,
}

/// Text direction of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ltr,
    Rtl,
}

/// The closed set of element kinds the engine ships.
///
/// Per-kind editing policies (`insert_new_after`, `collapse_at_start`,
/// merge and extraction capabilities) dispatch on this enum; adding a
/// block kind means adding a variant and its policy arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Paragraph,
    Heading(HeadingTag),
    Quote,
}

impl ElementKind {
    /// Whether this element participates inline rather than as a block.
    /// All shipped kinds are blocks.
    pub fn is_inline(&self) -> bool {
        false
    }

    /// Whether indent/outdent commands may change this block's indent.
    pub fn can_indent(&self) -> bool {
        true
    }

    /// Whether an empty instance may be silently merged away by
    /// delete logic reaching across a block boundary.
    pub fn can_merge_when_empty(&self) -> bool {
        matches!(self, ElementKind::Quote)
    }

    /// Whether the block travels with its child during structural
    /// extraction when it is the sole remaining wrapper.
    pub fn extract_with_child(&self) -> bool {
        matches!(self, ElementKind::Heading(_))
    }

    /// Presentation tag consumed by view renderer collaborators.
    pub fn view_tag(&self) -> &'static str {
        match self {
            ElementKind::Paragraph => "p",
            ElementKind::Heading(tag) => tag.as_str(),
            ElementKind::Quote => "blockquote",
        }
    }
}

/// Container node holding an ordered sequence of children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementNode {
    pub(crate) kind: ElementKind,
    pub(crate) children: Vec<NodeKey>,
    pub(crate) format: ElementFormat,
    pub(crate) indent: u32,
    pub(crate) direction: Option<Direction>,
}

impl ElementNode {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            format: ElementFormat::None,
            indent: 0,
            direction: None,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// The heading level, for heading blocks.
    pub fn heading_tag(&self) -> Option<HeadingTag> {
        match self.kind {
            ElementKind::Heading(tag) => Some(tag),
            _ => None,
        }
    }

    /// Retags a heading block. Returns false on non-heading kinds,
    /// which are left untouched.
    pub fn set_heading_tag(&mut self, tag: HeadingTag) -> bool {
        match &mut self.kind {
            ElementKind::Heading(current) => {
                *current = tag;
                true
            }
            _ => false,
        }
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn format(&self) -> ElementFormat {
        self.format
    }

    pub fn set_format(&mut self, format: ElementFormat) {
        self.format = format;
    }

    pub fn indent(&self) -> u32 {
        self.indent
    }

    /// Sets the indent depth. Callers implementing outdent floor at zero
    /// via saturating arithmetic on [`ElementNode::indent`].
    pub fn set_indent(&mut self, indent: u32) {
        self.indent = indent;
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Option<Direction>) {
        self.direction = direction;
    }
}
