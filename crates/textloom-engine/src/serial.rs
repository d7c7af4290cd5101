//! Structured-record serialization collaborators.
//!
//! Node kinds own their record shape; the engine ships the
//! structured-record pair and leaves external markup conversion as a
//! trait boundary for importer/exporter collaborators.

use serde::{Deserialize, Serialize};

use crate::node::{
    Direction, ElementFormat, ElementKind, HeadingTag, NodeBody, NodeKey, TextFormat,
};
use crate::tree::DocumentTree;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("document record must start with a root node")]
    NotARoot,
    #[error("a root record may only appear at the top of the document")]
    NestedRoot,
}

/// One node as a structured record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SerializedNode {
    Root {
        children: Vec<SerializedNode>,
    },
    Paragraph {
        #[serde(default)]
        children: Vec<SerializedNode>,
        #[serde(default)]
        format: ElementFormat,
        #[serde(default)]
        indent: u32,
        #[serde(default)]
        direction: Option<Direction>,
    },
    Heading {
        tag: HeadingTag,
        #[serde(default)]
        children: Vec<SerializedNode>,
        #[serde(default)]
        format: ElementFormat,
        #[serde(default)]
        indent: u32,
        #[serde(default)]
        direction: Option<Direction>,
    },
    Quote {
        #[serde(default)]
        children: Vec<SerializedNode>,
        #[serde(default)]
        format: ElementFormat,
        #[serde(default)]
        indent: u32,
        #[serde(default)]
        direction: Option<Direction>,
    },
    Text {
        text: String,
        #[serde(default)]
        format: TextFormat,
    },
    LineBreak,
    Tab,
    Decorator {
        inline: bool,
        #[serde(default)]
        isolated: bool,
    },
}

/// A whole document as a structured record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedDocument {
    pub root: SerializedNode,
}

/// Exports the tree to its structured record.
pub fn export_to_structured_record(tree: &DocumentTree) -> SerializedDocument {
    SerializedDocument {
        root: export_node(tree, tree.root()),
    }
}

fn export_node(tree: &DocumentTree, key: NodeKey) -> SerializedNode {
    let node = tree.node(key);
    let children = |tree: &DocumentTree| {
        node.child_keys()
            .iter()
            .map(|&c| export_node(tree, c))
            .collect()
    };
    match node.body() {
        NodeBody::Root(_) => SerializedNode::Root {
            children: children(tree),
        },
        NodeBody::Element(el) => match el.kind() {
            ElementKind::Paragraph => SerializedNode::Paragraph {
                children: children(tree),
                format: el.format(),
                indent: el.indent(),
                direction: el.direction(),
            },
            ElementKind::Heading(tag) => SerializedNode::Heading {
                tag,
                children: children(tree),
                format: el.format(),
                indent: el.indent(),
                direction: el.direction(),
            },
            ElementKind::Quote => SerializedNode::Quote {
                children: children(tree),
                format: el.format(),
                indent: el.indent(),
                direction: el.direction(),
            },
        },
        NodeBody::Text(t) => SerializedNode::Text {
            text: t.text().to_string(),
            format: t.format(),
        },
        NodeBody::LineBreak => SerializedNode::LineBreak,
        NodeBody::Tab => SerializedNode::Tab,
        NodeBody::Decorator(d) => SerializedNode::Decorator {
            inline: d.inline,
            isolated: d.isolated,
        },
    }
}

/// Builds a document tree from its structured record.
pub fn import_from_structured_record(
    document: &SerializedDocument,
) -> Result<DocumentTree, ImportError> {
    let SerializedNode::Root { children } = &document.root else {
        return Err(ImportError::NotARoot);
    };
    let mut tree = DocumentTree::new();
    let root = tree.root();
    for child in children {
        import_node(&mut tree, root, child)?;
    }
    Ok(tree)
}

fn import_node(
    tree: &mut DocumentTree,
    parent: NodeKey,
    record: &SerializedNode,
) -> Result<(), ImportError> {
    let key = match record {
        SerializedNode::Root { .. } => return Err(ImportError::NestedRoot),
        SerializedNode::Paragraph {
            format,
            indent,
            direction,
            ..
        } => import_element(tree, ElementKind::Paragraph, *format, *indent, *direction),
        SerializedNode::Heading {
            tag,
            format,
            indent,
            direction,
            ..
        } => import_element(tree, ElementKind::Heading(*tag), *format, *indent, *direction),
        SerializedNode::Quote {
            format,
            indent,
            direction,
            ..
        } => import_element(tree, ElementKind::Quote, *format, *indent, *direction),
        SerializedNode::Text { text, format } => {
            tree.create_text_with_format(text.as_str(), *format)
        }
        SerializedNode::LineBreak => tree.create_line_break(),
        SerializedNode::Tab => tree.create_tab(),
        SerializedNode::Decorator { inline, isolated } => {
            tree.create_decorator(*inline, *isolated)
        }
    };
    tree.append(parent, key)
        .expect("imported nodes are freshly created");
    if let SerializedNode::Paragraph { children, .. }
    | SerializedNode::Heading { children, .. }
    | SerializedNode::Quote { children, .. } = record
    {
        for child in children {
            import_node(tree, key, child)?;
        }
    }
    Ok(())
}

fn import_element(
    tree: &mut DocumentTree,
    kind: ElementKind,
    format: ElementFormat,
    indent: u32,
    direction: Option<Direction>,
) -> NodeKey {
    let key = tree.create_element(kind);
    let element = tree.node_mut(key).element_mut();
    element.set_format(format);
    element.set_indent(indent);
    element.set_direction(direction);
    key
}

/// External markup (e.g. HTML) import boundary: produces node records
/// the structured importer understands.
pub trait ExternalMarkupImporter {
    fn import_markup(&self, markup: &str) -> Vec<SerializedNode>;
}

/// External markup export boundary: renders a subtree to markup.
pub trait ExternalMarkupExporter {
    fn export_markup(&self, tree: &DocumentTree, node: NodeKey) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TextFormatKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn export_import_round_trips_structure() {
        let mut tree = DocumentTree::new();
        let heading = tree.create_heading(HeadingTag::H2);
        let title = tree.create_text("Title");
        let quote = tree.create_quote();
        let body =
            tree.create_text_with_format("wise words", TextFormat::NONE.with(TextFormatKind::Italic));
        tree.append(tree.root(), heading).unwrap();
        tree.append(heading, title).unwrap();
        tree.append(tree.root(), quote).unwrap();
        tree.append(quote, body).unwrap();
        tree.node_mut(quote).element_mut().set_indent(1);

        let record = export_to_structured_record(&tree);
        let rebuilt = import_from_structured_record(&record).unwrap();
        let round_tripped = export_to_structured_record(&rebuilt);
        assert_eq!(record, round_tripped);
        assert_eq!(tree.dump(), rebuilt.dump());
    }

    #[test]
    fn import_rejects_non_root_top_level() {
        let document = SerializedDocument {
            root: SerializedNode::Tab,
        };
        assert!(matches!(
            import_from_structured_record(&document),
            Err(ImportError::NotARoot)
        ));
    }
}
