use serde::{Deserialize, Serialize};

/// One toggleable character-format flag.
///
/// The three case transforms (`Lowercase`, `Uppercase`, `Capitalize`) are
/// mutually exclusive: setting one clears the other two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormatKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
    Subscript,
    Superscript,
    Highlight,
    Lowercase,
    Uppercase,
    Capitalize,
}

impl TextFormatKind {
    pub const CASE_TRANSFORMS: [TextFormatKind; 3] = [
        TextFormatKind::Lowercase,
        TextFormatKind::Uppercase,
        TextFormatKind::Capitalize,
    ];

    const fn bit(self) -> u16 {
        match self {
            TextFormatKind::Bold => 1 << 0,
            TextFormatKind::Italic => 1 << 1,
            TextFormatKind::Underline => 1 << 2,
            TextFormatKind::Strikethrough => 1 << 3,
            TextFormatKind::Code => 1 << 4,
            TextFormatKind::Subscript => 1 << 5,
            TextFormatKind::Superscript => 1 << 6,
            TextFormatKind::Highlight => 1 << 7,
            TextFormatKind::Lowercase => 1 << 8,
            TextFormatKind::Uppercase => 1 << 9,
            TextFormatKind::Capitalize => 1 << 10,
        }
    }

    pub fn is_case_transform(self) -> bool {
        matches!(
            self,
            TextFormatKind::Lowercase | TextFormatKind::Uppercase | TextFormatKind::Capitalize
        )
    }
}

/// Character-format bitmask carried by text nodes and, as the pending
/// format, by a collapsed range selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextFormat(u16);

impl TextFormat {
    pub const NONE: TextFormat = TextFormat(0);

    pub fn has(self, kind: TextFormatKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Sets `kind`. Setting a case transform clears the other two.
    pub fn with(self, kind: TextFormatKind) -> TextFormat {
        let mut bits = self.0;
        if kind.is_case_transform() {
            for other in TextFormatKind::CASE_TRANSFORMS {
                bits &= !other.bit();
            }
        }
        TextFormat(bits | kind.bit())
    }

    pub fn without(self, kind: TextFormatKind) -> TextFormat {
        TextFormat(self.0 & !kind.bit())
    }

    pub fn toggled(self, kind: TextFormatKind) -> TextFormat {
        if self.has(kind) {
            self.without(kind)
        } else {
            self.with(kind)
        }
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The active case transform, if any.
    pub fn case_transform(self) -> Option<TextFormatKind> {
        TextFormatKind::CASE_TRANSFORMS
            .into_iter()
            .find(|&k| self.has(k))
    }

    pub fn flags(self) -> impl Iterator<Item = TextFormatKind> {
        [
            TextFormatKind::Bold,
            TextFormatKind::Italic,
            TextFormatKind::Underline,
            TextFormatKind::Strikethrough,
            TextFormatKind::Code,
            TextFormatKind::Subscript,
            TextFormatKind::Superscript,
            TextFormatKind::Highlight,
            TextFormatKind::Lowercase,
            TextFormatKind::Uppercase,
            TextFormatKind::Capitalize,
        ]
        .into_iter()
        .filter(move |&k| self.has(k))
    }
}

/// Leaf node carrying a run of text with uniform character formatting.
///
/// Offsets into the text are byte offsets and always sit on `char`
/// boundaries; grapheme and word units are computed by the editing layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub(crate) text: String,
    pub(crate) format: TextFormat,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::NONE,
        }
    }

    pub fn with_format(text: impl Into<String>, format: TextFormat) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Content size in bytes.
    pub fn size(&self) -> usize {
        self.text.len()
    }

    pub fn format(&self) -> TextFormat {
        self.format
    }

    pub fn set_format(&mut self, format: TextFormat) {
        self.format = format;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_sets_and_clears_flags() {
        let f = TextFormat::NONE.toggled(TextFormatKind::Bold);
        assert!(f.has(TextFormatKind::Bold));
        let f = f.toggled(TextFormatKind::Bold);
        assert!(f.is_empty());
    }

    #[test]
    fn case_transforms_are_mutually_exclusive() {
        let f = TextFormat::NONE
            .with(TextFormatKind::Bold)
            .with(TextFormatKind::Lowercase)
            .with(TextFormatKind::Uppercase);
        assert!(f.has(TextFormatKind::Bold));
        assert!(!f.has(TextFormatKind::Lowercase));
        assert!(f.has(TextFormatKind::Uppercase));
        assert_eq!(f.case_transform(), Some(TextFormatKind::Uppercase));

        let f = f.with(TextFormatKind::Capitalize);
        assert_eq!(f.case_transform(), Some(TextFormatKind::Capitalize));
    }

    #[test]
    fn clearing_a_case_transform_leaves_none_active() {
        let f = TextFormat::NONE.with(TextFormatKind::Capitalize);
        let f = f.toggled(TextFormatKind::Capitalize);
        assert_eq!(f.case_transform(), None);
    }
}
