//! Length-bounded text input.
//!
//! Mirrors how the composer and the inline editor treat keystrokes: an edit
//! that would push the text past the limit is dropped as a whole, so the
//! buffer never holds more than `MAX` characters.

use crate::model::post::MESSAGE_MAX_LEN;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct BoundedText<const MAX: usize> {
    text: String,
    len: usize,
}

pub type MessageInput = BoundedText<MESSAGE_MAX_LEN>;

impl<const MAX: usize> BoundedText<MAX> {
    pub const LIMIT: usize = MAX;

    #[must_use]
    pub fn new() -> Self {
        Self {
            text: String::new(),
            len: 0,
        }
    }

    /// Returns `None` if `text` is longer than `MAX` characters.
    #[must_use]
    pub fn from_text(text: &str) -> Option<Self> {
        let mut bounded = Self::new();
        bounded.set(text).then_some(bounded)
    }

    /// Replaces the whole text. A replacement longer than `MAX` characters
    /// is ignored and `false` is returned.
    pub fn set(&mut self, text: &str) -> bool {
        let len = text.chars().count();
        if len > MAX {
            return false;
        }
        text.clone_into(&mut self.text);
        self.len = len;
        true
    }

    /// Appends one character unless the text is already full.
    pub fn push(&mut self, c: char) -> bool {
        if self.len >= MAX {
            return false;
        }
        self.text.push(c);
        self.len += 1;
        true
    }

    /// Types `input` one character at a time and returns how many
    /// characters were accepted.
    pub fn type_str(&mut self, input: &str) -> usize {
        input.chars().take_while(|&c| self.push(c)).count()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.len = 0;
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        MAX - self.len
    }
}
