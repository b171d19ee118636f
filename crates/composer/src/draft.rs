//! Draft message buffer.
//!
//! Holds the text the user is composing. The caret is a byte index that is
//! always on a UTF-8 character boundary; line endings are stored as LF.

use std::borrow::Cow;

#[derive(Clone, Debug, Default)]
pub struct Draft {
    value: String,
    /// Monotonic revision counter, incremented on any text change.
    revision: u64,
    caret: usize,
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.value
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// `true` when there is nothing to send.
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    /// Replace the whole draft. The caret moves to the end.
    pub fn set(&mut self, text: &str) {
        let text = normalize_newlines(text);
        if self.value == text {
            return;
        }
        self.value = text.into_owned();
        self.caret = self.value.len();
        self.bump();
    }

    pub fn clear(&mut self) {
        if self.value.is_empty() {
            return;
        }
        self.value.clear();
        self.caret = 0;
        self.bump();
    }

    /// Insert at the caret.
    pub fn insert(&mut self, text: &str) {
        let text = normalize_newlines(text);
        if text.is_empty() {
            return;
        }
        let caret = clamp_to_char_boundary(&self.value, self.caret);
        self.value.insert_str(caret, &text);
        self.caret = caret + text.len();
        self.bump();
    }

    /// Delete the character before the caret.
    pub fn backspace(&mut self) {
        let caret = clamp_to_char_boundary(&self.value, self.caret);
        let Some((prev, _)) = self.value[..caret].char_indices().last() else {
            return;
        };
        self.value.drain(prev..caret);
        self.caret = prev;
        self.bump();
    }

    pub fn set_caret(&mut self, caret: usize) {
        self.caret = clamp_to_char_boundary(&self.value, caret);
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

fn clamp_to_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn normalize_newlines(s: &str) -> Cow<'_, str> {
    if !s.contains('\r') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut it = s.chars().peekable();
    while let Some(ch) = it.next() {
        match ch {
            '\r' => {
                if it.peek() == Some(&'\n') {
                    let _ = it.next();
                }
                out.push('\n');
            }
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}
