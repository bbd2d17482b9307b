//! Chat Input Line
//!
//! The text the user is composing in `Active` mode. Lives in the surface,
//! not the session: the session only sees the finished line.

/// Single-line input buffer
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputLine {
    buffer: String,
}

impl InputLine {
    /// Append a character
    pub fn insert(&mut self, c: char) {
        self.buffer.push(c);
    }

    /// Remove the last character
    pub fn backspace(&mut self) {
        self.buffer.pop();
    }

    /// Remove the last word and any whitespace after it
    pub fn delete_word(&mut self) {
        let trimmed = self.buffer.trim_end().len();
        self.buffer.truncate(trimmed);
        let start = self
            .buffer
            .rfind(char::is_whitespace)
            .map_or(0, |i| i + 1);
        self.buffer.truncate(start);
    }

    /// Take the line, leaving the buffer empty
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }

    /// Discard everything typed
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Current text
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Whether nothing has been typed
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
