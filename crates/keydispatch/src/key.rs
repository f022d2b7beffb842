//! Key data and the catalog of well-known key codes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Catalog of key codes the dispatcher treats specially.
///
/// Printable keys use their character code; function keys are negative.
pub struct KeyCode;

impl KeyCode {
    /// Line feed / enter.
    pub const ENTER: i32 = 10;
    /// Regular space bar.
    pub const SPACE: i32 = 32;
    /// Ideographic (full-width) space used by CJK layouts.
    pub const CJK_SPACE: i32 = 12288;

    /// Delete the character before the cursor.
    pub const DELETE: i32 = -7;
    /// Delete the word before the cursor.
    pub const DELETE_WORD: i32 = -8;
    /// Delete the character after the cursor.
    pub const FORWARD_DELETE: i32 = -9;
    /// Delete the word after the cursor.
    pub const FORWARD_DELETE_WORD: i32 = -10;
    /// Shift modifier.
    pub const SHIFT: i32 = -11;

    /// Cursor up.
    pub const ARROW_UP: i32 = -21;
    /// Cursor down.
    pub const ARROW_DOWN: i32 = -22;
    /// Cursor left.
    pub const ARROW_LEFT: i32 = -23;
    /// Cursor right.
    pub const ARROW_RIGHT: i32 = -24;

    /// Undo the last edit.
    pub const UNDO: i32 = -131;
    /// Redo the last undone edit.
    pub const REDO: i32 = -132;

    /// Cycle to the next input language.
    pub const LANGUAGE_SWITCH: i32 = -212;

    /// Codes that auto-repeat while held when no long-press action claims them.
    pub const DEFAULT_REPEATABLE: &'static [i32] = &[
        Self::ARROW_DOWN,
        Self::ARROW_LEFT,
        Self::ARROW_RIGHT,
        Self::ARROW_UP,
        Self::DELETE,
        Self::FORWARD_DELETE,
        Self::UNDO,
        Self::REDO,
    ];
}

/// A logical key as seen by the dispatcher.
///
/// Only `code` drives dispatch decisions; `label` is carried through to the receiver untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyData {
    /// Integer key code.
    pub code: i32,
    /// Optional display payload.
    #[serde(default)]
    pub label: Option<String>,
}

impl KeyData {
    /// Key data with no payload.
    pub fn new(code: i32) -> Self {
        Self { code, label: None }
    }

    /// Key data carrying a display label.
    pub fn with_label(code: i32, label: impl Into<String>) -> Self {
        Self {
            code,
            label: Some(label.into()),
        }
    }
}

impl From<i32> for KeyData {
    fn from(code: i32) -> Self {
        Self::new(code)
    }
}

impl fmt::Display for KeyData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} ({label})", self.code),
            None => write!(f, "{}", self.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_label_when_present() {
        assert_eq!(KeyData::new(KeyCode::SPACE).to_string(), "32");
        assert_eq!(KeyData::with_label(97, "a").to_string(), "97 (a)");
    }

    #[test]
    fn deserializes_without_label() {
        let data: KeyData = ron::from_str("(code: -7)").expect("parse key data");
        assert_eq!(data, KeyData::new(KeyCode::DELETE));
    }

    #[test]
    fn default_repeatable_excludes_word_deletes() {
        assert!(KeyCode::DEFAULT_REPEATABLE.contains(&KeyCode::DELETE));
        assert!(!KeyCode::DEFAULT_REPEATABLE.contains(&KeyCode::DELETE_WORD));
        assert!(!KeyCode::DEFAULT_REPEATABLE.contains(&KeyCode::SPACE));
    }
}
