/// Atomic leaf node standing in for embedded content (media, widgets).
///
/// Navigation treats a decorator as a single indivisible unit: the caret
/// never enters one, and selecting it produces a whole-node selection.
/// Decorators never merge with siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoratorNode {
    /// Inline decorators flow with text; block decorators sit between
    /// blocks at the root level.
    pub inline: bool,
    /// Isolated decorators are skipped by arrow-key whole-node selection.
    pub isolated: bool,
}

impl DecoratorNode {
    pub fn new(inline: bool, isolated: bool) -> Self {
        Self { inline, isolated }
    }
}
