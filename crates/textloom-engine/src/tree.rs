//! Arena-backed document tree.
//!
//! Nodes live in a key-addressed arena owned by [`DocumentTree`]; all
//! cross-references are [`NodeKey`]s and all structural operations repair
//! sibling linkage so every reachable non-root node has exactly one
//! parent and child order defines document order.

use std::collections::HashMap;

use log::debug;

use crate::error::EngineError;
use crate::node::{
    DecoratorNode, ElementKind, ElementNode, HeadingTag, Node, NodeBody, NodeKey, RootNode,
    TextFormat, TextNode, heading, quote,
};
use crate::selection::RangeSelection;

pub struct DocumentTree {
    nodes: HashMap<NodeKey, Node>,
    root: NodeKey,
}

impl DocumentTree {
    /// An empty document: a root with no children.
    pub fn new() -> Self {
        let root = Node::new(NodeBody::Root(RootNode::default()));
        let key = root.key();
        let mut nodes = HashMap::new();
        nodes.insert(key, root);
        Self { nodes, root: key }
    }

    /// A document holding a single empty paragraph, the smallest state a
    /// caret can live in.
    pub fn with_empty_paragraph() -> (Self, NodeKey) {
        let mut tree = Self::new();
        let paragraph = tree.create_paragraph();
        tree.append(tree.root, paragraph)
            .expect("fresh paragraph is attachable");
        (tree, paragraph)
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(&key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    /// Fail-fast lookup: a missing key means a caller held on to a
    /// removed node, which is a contract breach, not user error.
    pub fn node(&self, key: NodeKey) -> &Node {
        self.nodes
            .get(&key)
            .unwrap_or_else(|| panic!("node {key} is detached from the document tree"))
    }

    /// Mutable fail-fast lookup. Structural linkage stays crate-private;
    /// callers may mutate node attributes (formats, indent, direction).
    pub fn node_mut(&mut self, key: NodeKey) -> &mut Node {
        self.nodes
            .get_mut(&key)
            .unwrap_or_else(|| panic!("node {key} is detached from the document tree"))
    }

    // ---- creation ------------------------------------------------------

    fn insert_fresh(&mut self, body: NodeBody) -> NodeKey {
        let node = Node::new(body);
        let key = node.key();
        self.nodes.insert(key, node);
        key
    }

    pub fn create_element(&mut self, kind: ElementKind) -> NodeKey {
        self.insert_fresh(NodeBody::Element(ElementNode::new(kind)))
    }

    pub fn create_paragraph(&mut self) -> NodeKey {
        self.create_element(ElementKind::Paragraph)
    }

    pub fn create_heading(&mut self, tag: HeadingTag) -> NodeKey {
        self.create_element(ElementKind::Heading(tag))
    }

    pub fn create_quote(&mut self) -> NodeKey {
        self.create_element(ElementKind::Quote)
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeKey {
        self.insert_fresh(NodeBody::Text(TextNode::new(text)))
    }

    pub fn create_text_with_format(
        &mut self,
        text: impl Into<String>,
        format: TextFormat,
    ) -> NodeKey {
        self.insert_fresh(NodeBody::Text(TextNode::with_format(text, format)))
    }

    pub fn create_line_break(&mut self) -> NodeKey {
        self.insert_fresh(NodeBody::LineBreak)
    }

    pub fn create_tab(&mut self) -> NodeKey {
        self.insert_fresh(NodeBody::Tab)
    }

    pub fn create_decorator(&mut self, inline: bool, isolated: bool) -> NodeKey {
        self.insert_fresh(NodeBody::Decorator(DecoratorNode::new(inline, isolated)))
    }

    // ---- structure -----------------------------------------------------

    fn check_can_adopt(&self, parent: NodeKey, child: NodeKey) -> Result<(), EngineError> {
        let parent_node = self
            .get(parent)
            .ok_or(EngineError::NodeNotFound(parent))?;
        if parent_node.is_leaf() {
            return Err(EngineError::NotAnElement(parent));
        }
        let child_node = self.get(child).ok_or(EngineError::NodeNotFound(child))?;
        if child_node.is_root() {
            return Err(EngineError::RootMutation);
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(EngineError::WouldCycle {
                node: child,
                parent,
            });
        }
        Ok(())
    }

    /// Moves `child` to the end of `parent`'s children, detaching it from
    /// any previous parent first.
    pub fn append(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), EngineError> {
        let count = self.child_count(parent);
        self.insert_child_at(parent, count, child)
    }

    /// Moves `child` into `parent` at `index` (clamped to the child
    /// count), detaching it from any previous parent first.
    pub fn insert_child_at(
        &mut self,
        parent: NodeKey,
        index: usize,
        child: NodeKey,
    ) -> Result<(), EngineError> {
        self.check_can_adopt(parent, child)?;
        self.detach(child);
        let children = self
            .node_mut(parent)
            .child_keys_mut()
            .expect("adoption check admits containers only");
        let index = index.min(children.len());
        children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Moves `node` to sit immediately after `reference` under the same
    /// parent.
    pub fn insert_after(&mut self, node: NodeKey, reference: NodeKey) -> Result<(), EngineError> {
        let parent = self.sibling_parent(reference)?;
        let index = self
            .index_within_parent(reference)
            .expect("attached node has an index");
        self.insert_child_at(parent, index + 1, node)
    }

    /// Moves `node` to sit immediately before `reference` under the same
    /// parent.
    pub fn insert_before(&mut self, node: NodeKey, reference: NodeKey) -> Result<(), EngineError> {
        let parent = self.sibling_parent(reference)?;
        let index = self
            .index_within_parent(reference)
            .expect("attached node has an index");
        self.insert_child_at(parent, index, node)
    }

    fn sibling_parent(&self, reference: NodeKey) -> Result<NodeKey, EngineError> {
        let node = self
            .get(reference)
            .ok_or(EngineError::NodeNotFound(reference))?;
        match node.parent() {
            Some(parent) => Ok(parent),
            None if node.is_root() => Err(EngineError::RootMutation),
            None => Err(EngineError::NodeNotFound(reference)),
        }
    }

    /// Unlinks `key` from its parent without destroying it.
    pub(crate) fn detach(&mut self, key: NodeKey) {
        let Some(parent) = self.get(key).and_then(|n| n.parent()) else {
            return;
        };
        if let Some(children) = self.node_mut(parent).child_keys_mut() {
            children.retain(|&c| c != key);
        }
        self.node_mut(key).parent = None;
    }

    /// Removes `key` and its whole subtree from the document.
    pub fn remove(&mut self, key: NodeKey) -> Result<(), EngineError> {
        if !self.contains(key) {
            return Err(EngineError::NodeNotFound(key));
        }
        if key == self.root {
            return Err(EngineError::RootMutation);
        }
        self.detach(key);
        let mut doomed = vec![key];
        while let Some(k) = doomed.pop() {
            if let Some(node) = self.nodes.remove(&k) {
                doomed.extend_from_slice(node.child_keys());
            }
        }
        debug!("removed node {key} and its subtree");
        Ok(())
    }

    /// Puts `new` in `old`'s position and destroys `old` with its
    /// subtree. `new` is detached from any previous parent first.
    pub fn replace(&mut self, old: NodeKey, new: NodeKey) -> Result<(), EngineError> {
        let parent = self.sibling_parent(old)?;
        if !self.contains(new) {
            return Err(EngineError::NodeNotFound(new));
        }
        let index = self
            .index_within_parent(old)
            .expect("attached node has an index");
        self.remove(old)?;
        self.insert_child_at(parent, index, new)?;
        debug!("replaced node {old} with {new}");
        Ok(())
    }

    /// Replace that first re-homes `old`'s children under `new`, in
    /// order. Used by block collapse policies.
    pub fn replace_with_children(&mut self, old: NodeKey, new: NodeKey) -> Result<(), EngineError> {
        let children: Vec<NodeKey> = self.children(old).to_vec();
        for child in children {
            self.append(new, child)?;
        }
        self.replace(old, new)
    }

    /// Moves every remaining child of `from` to the end of `to`.
    pub fn move_children(&mut self, from: NodeKey, to: NodeKey) -> Result<(), EngineError> {
        let children: Vec<NodeKey> = self.children(from).to_vec();
        for child in children {
            self.append(to, child)?;
        }
        Ok(())
    }

    // ---- queries -------------------------------------------------------

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.get(key).and_then(|n| n.parent())
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.get(key).map(|n| n.child_keys()).unwrap_or(&[])
    }

    pub fn child_count(&self, key: NodeKey) -> usize {
        self.children(key).len()
    }

    pub fn first_child(&self, key: NodeKey) -> Option<NodeKey> {
        self.children(key).first().copied()
    }

    pub fn last_child(&self, key: NodeKey) -> Option<NodeKey> {
        self.children(key).last().copied()
    }

    pub fn index_within_parent(&self, key: NodeKey) -> Option<usize> {
        let parent = self.parent(key)?;
        self.children(parent).iter().position(|&c| c == key)
    }

    pub fn prev_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        let index = self.index_within_parent(key)?;
        let parent = self.parent(key)?;
        index.checked_sub(1).map(|i| self.children(parent)[i])
    }

    pub fn next_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        let index = self.index_within_parent(key)?;
        let parent = self.parent(key)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Deepest node reached by following first children; `None` when
    /// `key` has no children.
    pub fn first_descendant(&self, key: NodeKey) -> Option<NodeKey> {
        let mut current = self.first_child(key)?;
        while let Some(child) = self.first_child(current) {
            current = child;
        }
        Some(current)
    }

    /// Deepest node reached by following last children; `None` when
    /// `key` has no children.
    pub fn last_descendant(&self, key: NodeKey) -> Option<NodeKey> {
        let mut current = self.last_child(key)?;
        while let Some(child) = self.last_child(current) {
            current = child;
        }
        Some(current)
    }

    /// Whether `key` is reachable from the root.
    pub fn is_attached(&self, key: NodeKey) -> bool {
        let mut current = key;
        loop {
            if current == self.root {
                return true;
            }
            match self.get(current).and_then(|n| n.parent()) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn is_ancestor(&self, maybe_ancestor: NodeKey, key: NodeKey) -> bool {
        let mut current = self.parent(key);
        while let Some(k) = current {
            if k == maybe_ancestor {
                return true;
            }
            current = self.parent(k);
        }
        false
    }

    pub fn is_empty_element(&self, key: NodeKey) -> bool {
        self.children(key).is_empty()
    }

    /// Walks from `key` up through its ancestors (inclusive) and returns
    /// the first node matching `predicate`.
    pub fn find_matching_parent(
        &self,
        key: NodeKey,
        predicate: impl Fn(&Node) -> bool,
    ) -> Option<NodeKey> {
        let mut current = Some(key);
        while let Some(k) = current {
            let node = self.get(k)?;
            if predicate(node) {
                return Some(k);
            }
            current = node.parent();
        }
        None
    }

    /// Nearest non-inline element at or above `key`.
    pub fn nearest_block_ancestor(&self, key: NodeKey) -> Option<NodeKey> {
        self.find_matching_parent(key, |n| n.is_block())
    }

    /// Concatenated text of the subtree; line breaks and tabs contribute
    /// their character, decorators contribute nothing.
    pub fn text_content(&self, key: NodeKey) -> String {
        let mut out = String::new();
        self.collect_text(key, &mut out);
        out
    }

    fn collect_text(&self, key: NodeKey, out: &mut String) {
        let Some(node) = self.get(key) else { return };
        match node.body() {
            NodeBody::Text(t) => out.push_str(t.text()),
            NodeBody::LineBreak => out.push('\n'),
            NodeBody::Tab => out.push('\t'),
            NodeBody::Decorator(_) => {}
            NodeBody::Root(_) | NodeBody::Element(_) => {
                for &child in node.child_keys() {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Pre-order iterator over every node below the root.
    pub fn iter(&self) -> DocumentIter<'_> {
        let mut stack: Vec<NodeKey> = self.children(self.root).to_vec();
        stack.reverse();
        DocumentIter { tree: self, stack }
    }

    // ---- text node surgery ---------------------------------------------

    /// Splits a text node at a byte offset, producing the pair
    /// `(left, right)` with `left` keeping the original key and format
    /// copied onto `right`.
    pub fn split_text(
        &mut self,
        key: NodeKey,
        offset: usize,
    ) -> Result<(NodeKey, NodeKey), EngineError> {
        let node = self.get(key).ok_or(EngineError::NodeNotFound(key))?;
        let text = node.as_text().ok_or(EngineError::NotAText(key))?;
        if offset > text.size() {
            return Err(EngineError::OffsetOutOfBounds {
                key,
                offset,
                size: text.size(),
            });
        }
        assert!(
            text.text().is_char_boundary(offset),
            "split offset {offset} is not a char boundary in node {key}"
        );
        let format = text.format();
        let tail: String = text.text()[offset..].to_string();
        self.node_mut(key).text_mut().text.truncate(offset);
        let right = self.create_text_with_format(tail, format);
        self.insert_after(right, key)?;
        Ok((key, right))
    }

    /// Splices `replacement` over a byte range of a text node's content.
    /// Range ends must sit on char boundaries.
    pub fn splice_text(&mut self, key: NodeKey, range: std::ops::Range<usize>, replacement: &str) {
        let text = &mut self.node_mut(key).text_mut().text;
        assert!(
            range.end <= text.len()
                && text.is_char_boundary(range.start)
                && text.is_char_boundary(range.end),
            "splice range {range:?} is not valid for node {key}"
        );
        text.replace_range(range, replacement);
    }

    // ---- per-kind block policies ---------------------------------------

    /// Creates the sibling block that continues typing after `block`,
    /// per the block kind's continuation policy. The heading policy may
    /// additionally replace `block` itself; callers must re-resolve any
    /// position they hold into it.
    pub fn insert_new_after_block(
        &mut self,
        block: NodeKey,
        selection: Option<&RangeSelection>,
    ) -> NodeKey {
        match self.node(block).element().kind() {
            ElementKind::Paragraph => {
                let new_block = self.create_paragraph();
                let direction = self.node(block).element().direction();
                self.node_mut(new_block)
                    .element_mut()
                    .set_direction(direction);
                self.insert_after(new_block, block)
                    .expect("block must be attached when splitting");
                new_block
            }
            ElementKind::Heading(tag) => heading::insert_new_after(self, block, tag, selection),
            ElementKind::Quote => quote::insert_new_after(self, block, selection),
        }
    }

    /// Applies the block kind's collapse-at-front policy, returning the
    /// replacement block when one was made.
    pub fn collapse_block_at_start(&mut self, block: NodeKey) -> Option<NodeKey> {
        match self.node(block).element().kind() {
            ElementKind::Paragraph => None,
            ElementKind::Heading(tag) => heading::collapse_at_start(self, block, tag),
            ElementKind::Quote => quote::collapse_at_start(self, block),
        }
    }

    // ---- debugging -----------------------------------------------------

    /// Indented outline of the tree, for tests and logs.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.root, 0, &mut out);
        out
    }

    fn dump_node(&self, key: NodeKey, depth: usize, out: &mut String) {
        let node = self.node(key);
        for _ in 0..depth {
            out.push_str("  ");
        }
        match node.body() {
            NodeBody::Root(_) => out.push_str("root"),
            NodeBody::Element(el) => {
                out.push_str(el.kind().view_tag());
                if el.indent() > 0 {
                    out.push_str(&format!(" indent={}", el.indent()));
                }
            }
            NodeBody::Text(t) => {
                out.push_str(&format!("text {:?}", t.text()));
                let flags: Vec<String> = t
                    .format()
                    .flags()
                    .map(|k| format!("{k:?}").to_lowercase())
                    .collect();
                if !flags.is_empty() {
                    out.push_str(&format!(" [{}]", flags.join(",")));
                }
            }
            NodeBody::Decorator(d) => {
                out.push_str(if d.inline {
                    "decorator(inline)"
                } else {
                    "decorator(block)"
                });
                if d.isolated {
                    out.push_str(" isolated");
                }
            }
            NodeBody::LineBreak => out.push_str("linebreak"),
            NodeBody::Tab => out.push_str("tab"),
        }
        out.push('\n');
        for &child in node.child_keys() {
            self.dump_node(child, depth + 1, out);
        }
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Pre-order document traversal. Cloning restarts nothing: a clone
/// continues from the same position, while [`DocumentTree::iter`] always
/// starts fresh.
#[derive(Clone)]
pub struct DocumentIter<'a> {
    tree: &'a DocumentTree,
    stack: Vec<NodeKey>,
}

impl<'a> Iterator for DocumentIter<'a> {
    type Item = NodeKey;

    fn next(&mut self) -> Option<NodeKey> {
        let key = self.stack.pop()?;
        let children = self.tree.children(key);
        for &child in children.iter().rev() {
            self.stack.push(child);
        }
        Some(key)
    }
}
