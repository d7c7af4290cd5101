use serde::{Deserialize, Serialize};

use crate::node::NodeKey;
use crate::selection::RangeSelection;
use crate::tree::DocumentTree;

/// Heading level, h1 through h6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingTag {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeadingTag::H1 => "h1",
            HeadingTag::H2 => "h2",
            HeadingTag::H3 => "h3",
            HeadingTag::H4 => "h4",
            HeadingTag::H5 => "h5",
            HeadingTag::H6 => "h6",
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            HeadingTag::H1 => 1,
            HeadingTag::H2 => 2,
            HeadingTag::H3 => 3,
            HeadingTag::H4 => 4,
            HeadingTag::H5 => 5,
            HeadingTag::H6 => 6,
        }
    }
}

impl std::fmt::Display for HeadingTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Continuation policy for a heading block.
///
/// Splitting at the very end of the content (or with no selection at all)
/// demotes the continuation to a paragraph; splitting mid-content
/// continues the heading. Independently, a split at offset 0 of a
/// non-empty heading replaces the original heading with a paragraph whose
/// children are the heading's former children. Both checks are kept as
/// separate conditions; they may overlap for a heading holding a single
/// just-typed character.
pub(crate) fn insert_new_after(
    tree: &mut DocumentTree,
    block: NodeKey,
    tag: HeadingTag,
    selection: Option<&RangeSelection>,
) -> NodeKey {
    let anchor_offset = selection.map(|s| s.anchor.offset).unwrap_or(0);
    let last_desc = tree.last_descendant(block);
    let at_end = match (selection, last_desc) {
        (_, None) => true,
        (Some(sel), Some(last)) => {
            sel.anchor.key == last && anchor_offset == tree.node(last).text_size()
        }
        (None, Some(_)) => false,
    };

    let new_element = if at_end || selection.is_none() {
        tree.create_paragraph()
    } else {
        tree.create_heading(tag)
    };
    let direction = tree.node(block).element().direction();
    tree.node_mut(new_element)
        .element_mut()
        .set_direction(direction);
    tree.insert_after(new_element, block)
        .expect("heading must be attached when splitting");

    if anchor_offset == 0 && !tree.is_empty_element(block) && selection.is_some() {
        let paragraph = tree.create_paragraph();
        tree.replace_with_children(block, paragraph)
            .expect("heading must be attached when splitting");
    }

    new_element
}

/// Collapse policy for a heading at its front: content worth preserving
/// re-homes under a same-tag heading, an empty heading becomes a
/// paragraph.
pub(crate) fn collapse_at_start(
    tree: &mut DocumentTree,
    block: NodeKey,
    tag: HeadingTag,
) -> Option<NodeKey> {
    let replacement = if !tree.is_empty_element(block) {
        tree.create_heading(tag)
    } else {
        tree.create_paragraph()
    };
    tree.replace_with_children(block, replacement)
        .expect("heading must be attached when collapsing");
    Some(replacement)
}
