//! Dispatch order, short-circuiting and disposer semantics of the
//! command bus.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use textloom_engine::{Command, CommandKind, CommandPriority, Disposer, Editor, EditorConfig};

#[test]
fn handlers_run_highest_priority_first() {
    let mut editor = Editor::new(EditorConfig::default());
    let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

    let o = order.clone();
    let _low = editor.register_command(CommandKind::SelectAll, CommandPriority::Low, move |_, _| {
        o.borrow_mut().push("low");
        false
    });
    let o = order.clone();
    let _critical = editor.register_command(
        CommandKind::SelectAll,
        CommandPriority::Critical,
        move |_, _| {
            o.borrow_mut().push("critical");
            false
        },
    );
    let o = order.clone();
    let _editor_prio = editor.register_command(
        CommandKind::SelectAll,
        CommandPriority::Editor,
        move |_, _| {
            o.borrow_mut().push("editor");
            false
        },
    );

    let handled = editor.dispatch_command(Command::SelectAll);
    assert!(!handled);
    assert_eq!(*order.borrow(), vec!["critical", "low", "editor"]);
}

#[test]
fn equal_priority_runs_in_registration_order() {
    let mut editor = Editor::new(EditorConfig::default());
    let order: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));

    let mut guards = Vec::new();
    for i in 0..4 {
        let o = order.clone();
        guards.push(editor.register_command(
            CommandKind::Escape,
            CommandPriority::Normal,
            move |_, _| {
                o.borrow_mut().push(i);
                false
            },
        ));
    }
    editor.dispatch_command(Command::Escape);
    assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
}

#[test]
fn a_true_return_stops_propagation() {
    let mut editor = Editor::new(EditorConfig::default());
    let reached_low = Rc::new(RefCell::new(false));

    let _high = editor.register_command(CommandKind::Click, CommandPriority::High, |_, _| true);
    let flag = reached_low.clone();
    let _low = editor.register_command(CommandKind::Click, CommandPriority::Low, move |_, _| {
        *flag.borrow_mut() = true;
        true
    });

    assert!(editor.dispatch_command(Command::Click));
    assert!(!*reached_low.borrow());
}

#[test]
fn disposing_removes_the_handler() {
    let mut editor = Editor::new(EditorConfig::default());
    let calls = Rc::new(RefCell::new(0u32));

    let c = calls.clone();
    let mut disposer = editor.register_command(
        CommandKind::RemoveText,
        CommandPriority::Editor,
        move |_, _| {
            *c.borrow_mut() += 1;
            true
        },
    );

    assert!(editor.dispatch_command(Command::RemoveText));
    disposer.dispose();
    assert!(!editor.dispatch_command(Command::RemoveText));
    assert_eq!(*calls.borrow(), 1);
}

#[test]
fn dropping_the_disposer_also_unregisters() {
    let mut editor = Editor::new(EditorConfig::default());
    {
        let _scoped =
            editor.register_command(CommandKind::Tab, CommandPriority::Editor, |_, _| true);
        assert!(editor.dispatch_command(Command::Tab));
    }
    assert!(!editor.dispatch_command(Command::Tab));
}

#[test]
fn merged_disposer_releases_all_once_in_order() {
    let released: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

    let log = released.clone();
    let a = Disposer::from_fn(move || log.borrow_mut().push("a"));
    let log = released.clone();
    let b = Disposer::from_fn(move || log.borrow_mut().push("b"));
    let log = released.clone();
    let c = Disposer::from_fn(move || log.borrow_mut().push("c"));

    let mut merged = Disposer::merge([a, Disposer::merge([b, Disposer::noop()]), c]);
    assert!(released.borrow().is_empty());
    merged.dispose();
    merged.dispose(); // idempotent
    assert_eq!(*released.borrow(), vec!["a", "b", "c"]);
    drop(merged);
    assert_eq!(*released.borrow(), vec!["a", "b", "c"]);
}

#[test]
fn handlers_can_redispatch_other_commands() {
    let mut editor = Editor::new(EditorConfig::default());
    let inner_ran = Rc::new(RefCell::new(false));

    let flag = inner_ran.clone();
    let _inner = editor.register_command(
        CommandKind::InsertParagraph,
        CommandPriority::Editor,
        move |_, _| {
            *flag.borrow_mut() = true;
            true
        },
    );
    let _outer = editor.register_command(
        CommandKind::Enter,
        CommandPriority::Editor,
        |ctx, _| ctx.dispatch(&Command::InsertParagraph),
    );

    assert!(editor.dispatch_command(Command::Enter(None)));
    assert!(*inner_ran.borrow());
}
