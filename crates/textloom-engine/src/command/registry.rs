//! Handler registry with short-circuit dispatch and disposer-based
//! deregistration.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::command::{CommandKind, CommandPriority};
use crate::editor::EditContext;

/// A registered command handler. Returning `true` stops propagation to
/// lower-priority handlers and suppresses the default platform behavior.
pub type CommandHandler =
    Rc<dyn Fn(&mut EditContext<'_>, &crate::command::Command) -> bool>;

struct Entry {
    id: u64,
    priority: CommandPriority,
    handler: CommandHandler,
}

#[derive(Default)]
struct RegistryInner {
    handlers: HashMap<CommandKind, Vec<Entry>>,
    next_id: u64,
}

/// Registry mapping command identity to an ordered set of
/// (priority, handler) pairs. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl CommandRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a handler and returns the disposer that removes it.
    pub fn register(
        &self,
        kind: CommandKind,
        priority: CommandPriority,
        handler: impl Fn(&mut EditContext<'_>, &crate::command::Command) -> bool + 'static,
    ) -> Disposer {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.handlers.entry(kind).or_default().push(Entry {
            id,
            priority,
            handler: Rc::new(handler),
        });
        let weak = Rc::downgrade(&self.inner);
        Disposer::new(move || {
            if let Some(cell) = weak.upgrade() {
                let mut inner = cell.borrow_mut();
                if let Some(entries) = inner.handlers.get_mut(&kind) {
                    entries.retain(|e| e.id != id);
                }
            }
        })
    }

    /// Handlers for `kind`, highest priority first, ties in registration
    /// order. Snapshotted so handlers may re-dispatch or re-register.
    pub(crate) fn snapshot(&self, kind: CommandKind) -> Vec<CommandHandler> {
        let inner = self.inner.borrow();
        let mut entries: Vec<(CommandPriority, u64, CommandHandler)> = inner
            .handlers
            .get(&kind)
            .map(|v| {
                v.iter()
                    .map(|e| (e.priority, e.id, e.handler.clone()))
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        entries.into_iter().map(|(_, _, h)| h).collect()
    }
}

/// Owns teardown work for one or more registrations. Releases exactly
/// once, in registration order: explicitly through [`Disposer::dispose`]
/// or implicitly on drop. Repeated disposal is a no-op.
pub struct Disposer {
    cleanups: Vec<Box<dyn FnOnce()>>,
}

impl Disposer {
    pub(crate) fn new(cleanup: impl FnOnce() + 'static) -> Self {
        Self {
            cleanups: vec![Box::new(cleanup)],
        }
    }

    /// Wraps an arbitrary teardown action so it can be aggregated with
    /// registration disposers.
    pub fn from_fn(cleanup: impl FnOnce() + 'static) -> Self {
        Self::new(cleanup)
    }

    /// A disposer that owns nothing.
    pub fn noop() -> Self {
        Self {
            cleanups: Vec::new(),
        }
    }

    /// Aggregates many disposers into one composite guard that releases
    /// all of them, in order, exactly once.
    pub fn merge(parts: impl IntoIterator<Item = Disposer>) -> Disposer {
        let mut cleanups = Vec::new();
        for mut part in parts {
            cleanups.append(&mut part.cleanups);
        }
        Disposer { cleanups }
    }

    pub fn dispose(&mut self) {
        for cleanup in self.cleanups.drain(..) {
            cleanup();
        }
    }
}

impl Drop for Disposer {
    fn drop(&mut self) {
        self.dispose();
    }
}
