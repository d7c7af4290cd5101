//! The editor session: one live document tree, one live selection, and
//! the command registry. All mutation happens inside an update
//! transaction that lends an [`EditContext`] to the caller — handlers
//! receive explicit context instead of reading ambient global state.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::command::{Command, CommandKind, CommandPriority, CommandRegistry, Disposer};
use crate::node::HeadingTag;
use crate::selection::Selection;
use crate::tree::DocumentTree;

/// Presentation class names per node kind, consumed by view renderer
/// collaborators; the engine only carries them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorTheme {
    #[serde(default)]
    pub paragraph: Option<String>,
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default)]
    pub heading: HashMap<HeadingTag, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    pub namespace: String,
    #[serde(default)]
    pub theme: EditorTheme,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            namespace: "textloom".to_string(),
            theme: EditorTheme::default(),
        }
    }
}

/// Tag carried by an update so the surrounding runtime can coalesce it
/// in undo history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTag {
    Paste,
}

/// The mutable state of an editing session: the tree and the selection.
pub struct EditorState {
    pub(crate) tree: DocumentTree,
    pub(crate) selection: Option<Selection>,
}

impl EditorState {
    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }
}

pub struct Editor {
    state: EditorState,
    registry: CommandRegistry,
    config: EditorConfig,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            state: EditorState {
                tree: DocumentTree::new(),
                selection: None,
            },
            registry: CommandRegistry::new(),
            config,
        }
    }

    /// An editor over an existing document, e.g. one built by the
    /// structured-record importer.
    pub fn with_tree(config: EditorConfig, tree: DocumentTree) -> Self {
        Self {
            state: EditorState {
                tree,
                selection: None,
            },
            registry: CommandRegistry::new(),
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn tree(&self) -> &DocumentTree {
        &self.state.tree
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.state.selection.as_ref()
    }

    pub fn register_command(
        &self,
        kind: CommandKind,
        priority: CommandPriority,
        handler: impl Fn(&mut EditContext<'_>, &Command) -> bool + 'static,
    ) -> Disposer {
        self.registry.register(kind, priority, handler)
    }

    /// Opens the update transaction: the closure receives the editing
    /// context and runs to completion before control returns. The
    /// exclusive borrow guarantees at most one transaction at a time.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut EditContext<'_>) -> R) -> R {
        let mut ctx = EditContext {
            state: &mut self.state,
            registry: &self.registry,
            config: &self.config,
            tag: None,
        };
        f(&mut ctx)
    }

    /// Dispatches a command inside its own update transaction. Returns
    /// whether a handler claimed it.
    pub fn dispatch_command(&mut self, command: Command) -> bool {
        self.update(|ctx| ctx.dispatch(&command))
    }
}

/// The explicit editing context passed through every handler call: the
/// tree handle, the current selection and the transaction tag.
pub struct EditContext<'a> {
    state: &'a mut EditorState,
    registry: &'a CommandRegistry,
    config: &'a EditorConfig,
    tag: Option<UpdateTag>,
}

impl<'a> EditContext<'a> {
    pub fn tree(&self) -> &DocumentTree {
        &self.state.tree
    }

    pub fn tree_mut(&mut self) -> &mut DocumentTree {
        &mut self.state.tree
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.state.selection.as_ref()
    }

    /// Commits a selection. Points are validated fail-fast: committing a
    /// selection onto removed or mismatched nodes is a contract breach.
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        if let Some(sel) = &selection {
            match sel {
                Selection::Range(range) => {
                    range.anchor.assert_valid(&self.state.tree);
                    range.focus.assert_valid(&self.state.tree);
                }
                Selection::Node(nodes) => {
                    for &key in nodes.keys() {
                        assert!(
                            self.state.tree.contains(key)
                                && self.state.tree.is_attached(key),
                            "node selection references detached node {key}"
                        );
                    }
                }
            }
        }
        self.state.selection = selection;
    }

    /// Drops focus: the selection is cleared.
    pub fn blur(&mut self) {
        debug!("editor blurred, selection cleared");
        self.state.selection = None;
    }

    pub fn config(&self) -> &EditorConfig {
        self.config
    }

    pub fn tag(&self) -> Option<UpdateTag> {
        self.tag
    }

    /// Runs `f` with the given update tag active, restoring the previous
    /// tag afterwards.
    pub fn with_tag<R>(&mut self, tag: UpdateTag, f: impl FnOnce(&mut EditContext<'_>) -> R) -> R {
        let previous = self.tag;
        self.tag = Some(tag);
        let result = f(self);
        self.tag = previous;
        result
    }

    /// Dispatches a command to its handlers, highest priority first,
    /// stopping at the first to claim it.
    pub fn dispatch(&mut self, command: &Command) -> bool {
        let kind = command.kind();
        let handlers = self.registry.snapshot(kind);
        debug!("dispatching {kind:?} to {} handler(s)", handlers.len());
        for handler in handlers {
            if handler(self, command) {
                debug!("{kind:?} handled");
                return true;
            }
        }
        false
    }
}
