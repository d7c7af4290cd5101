use crate::node::NodeKey;
use crate::selection::RangeSelection;
use crate::tree::DocumentTree;

/// Continuation policy for a quote block: typing past the end continues
/// in a plain paragraph carrying the quote's direction.
pub(crate) fn insert_new_after(
    tree: &mut DocumentTree,
    block: NodeKey,
    _selection: Option<&RangeSelection>,
) -> NodeKey {
    let new_block = tree.create_paragraph();
    let direction = tree.node(block).element().direction();
    tree.node_mut(new_block)
        .element_mut()
        .set_direction(direction);
    tree.insert_after(new_block, block)
        .expect("quote must be attached when splitting");
    new_block
}

/// Collapse policy for a quote at its front: children re-home under a
/// plain paragraph that replaces the quote.
pub(crate) fn collapse_at_start(tree: &mut DocumentTree, block: NodeKey) -> Option<NodeKey> {
    let paragraph = tree.create_paragraph();
    tree.replace_with_children(block, paragraph)
        .expect("quote must be attached when collapsing");
    Some(paragraph)
}
