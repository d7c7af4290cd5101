//! Typed commands and the priority-ordered dispatch registry.

pub mod registry;

pub use registry::{CommandRegistry, Disposer};

use crate::collab::{DataTransfer, DroppedFile};
use crate::node::{ElementFormat, NodeKey, TextFormatKind};

/// Handler priority. Dispatch runs from `Critical` down to `Editor`;
/// within one priority, handlers run in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandPriority {
    Editor,
    Low,
    Normal,
    High,
    Critical,
}

/// Modifier state and optional target carried by key commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyInput {
    pub shift: bool,
    /// The node under the input focus, when the event source knows it.
    pub target: Option<NodeKey>,
}

/// Screen coordinates plus transfer payload of a drag-family event.
#[derive(Debug, Clone, PartialEq)]
pub struct DragInput {
    pub x: f64,
    pub y: f64,
    pub transfer: Option<DataTransfer>,
}

/// Payload of controlled text insertion: either plain text or a full
/// data transfer handed to the rich-content collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertTextPayload {
    Plain(String),
    Transfer(DataTransfer),
}

/// A named, typed input event routed through the command bus.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Click,
    DeleteCharacter { backward: bool },
    DeleteWord { backward: bool },
    DeleteLine { backward: bool },
    InsertText(InsertTextPayload),
    RemoveText,
    FormatText(TextFormatKind),
    FormatElement(ElementFormat),
    InsertLineBreak { select_start: bool },
    InsertParagraph,
    InsertTab,
    IndentContent,
    OutdentContent,
    ArrowUp(KeyInput),
    ArrowDown(KeyInput),
    ArrowLeft(KeyInput),
    ArrowRight(KeyInput),
    Backspace(KeyInput),
    Delete(KeyInput),
    Enter(Option<KeyInput>),
    Escape,
    Space,
    Tab,
    Copy(Option<DataTransfer>),
    Cut(Option<DataTransfer>),
    Paste(DataTransfer),
    Drop(DragInput),
    DragStart(DragInput),
    DragOver(DragInput),
    /// A plain file payload with no recognized text content, forwarded
    /// by drop and paste handling.
    DragDropPaste(Vec<DroppedFile>),
    SelectAll,
}

/// Command identity: the registry key handlers subscribe under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Click,
    DeleteCharacter,
    DeleteWord,
    DeleteLine,
    InsertText,
    RemoveText,
    FormatText,
    FormatElement,
    InsertLineBreak,
    InsertParagraph,
    InsertTab,
    IndentContent,
    OutdentContent,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Backspace,
    Delete,
    Enter,
    Escape,
    Space,
    Tab,
    Copy,
    Cut,
    Paste,
    Drop,
    DragStart,
    DragOver,
    DragDropPaste,
    SelectAll,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Click => CommandKind::Click,
            Command::DeleteCharacter { .. } => CommandKind::DeleteCharacter,
            Command::DeleteWord { .. } => CommandKind::DeleteWord,
            Command::DeleteLine { .. } => CommandKind::DeleteLine,
            Command::InsertText(_) => CommandKind::InsertText,
            Command::RemoveText => CommandKind::RemoveText,
            Command::FormatText(_) => CommandKind::FormatText,
            Command::FormatElement(_) => CommandKind::FormatElement,
            Command::InsertLineBreak { .. } => CommandKind::InsertLineBreak,
            Command::InsertParagraph => CommandKind::InsertParagraph,
            Command::InsertTab => CommandKind::InsertTab,
            Command::IndentContent => CommandKind::IndentContent,
            Command::OutdentContent => CommandKind::OutdentContent,
            Command::ArrowUp(_) => CommandKind::ArrowUp,
            Command::ArrowDown(_) => CommandKind::ArrowDown,
            Command::ArrowLeft(_) => CommandKind::ArrowLeft,
            Command::ArrowRight(_) => CommandKind::ArrowRight,
            Command::Backspace(_) => CommandKind::Backspace,
            Command::Delete(_) => CommandKind::Delete,
            Command::Enter(_) => CommandKind::Enter,
            Command::Escape => CommandKind::Escape,
            Command::Space => CommandKind::Space,
            Command::Tab => CommandKind::Tab,
            Command::Copy(_) => CommandKind::Copy,
            Command::Cut(_) => CommandKind::Cut,
            Command::Paste(_) => CommandKind::Paste,
            Command::Drop(_) => CommandKind::Drop,
            Command::DragStart(_) => CommandKind::DragStart,
            Command::DragOver(_) => CommandKind::DragOver,
            Command::DragDropPaste(_) => CommandKind::DragDropPaste,
            Command::SelectAll => CommandKind::SelectAll,
        }
    }
}
