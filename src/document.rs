use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an open document
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    pub fn next() -> Self {
        Self(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("range {start}..{end} is outside the document (length {len})")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("edit rejected: {0}")]
    Rejected(String),
}

/// The text a session is bound to.
///
/// All offsets are character offsets into `text()`, never byte offsets.
pub trait Document {
    fn id(&self) -> DocumentId;

    fn text(&self) -> &str;

    fn char_len(&self) -> usize {
        self.text().chars().count()
    }

    /// Remove the characters in `range`.
    fn delete_range(&mut self, range: Range<usize>) -> Result<(), DocumentError>;
}

/// In-memory editable text with a character cursor
#[derive(Debug, Clone)]
pub struct TextBuffer {
    id: DocumentId,
    text: String,
    cursor: usize,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::from_text(String::new())
    }

    /// Load existing text, placing the cursor at the end.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self {
            id: DocumentId::next(),
            text,
            cursor,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    /// Delete the character before the cursor. Returns false at the start.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let at = self.byte_offset(self.cursor - 1);
        self.text.remove(at);
        self.cursor -= 1;
        true
    }

    /// Delete the character under the cursor. Returns false at the end.
    pub fn delete_forward(&mut self) -> bool {
        if self.cursor >= self.char_len() {
            return false;
        }
        let at = self.byte_offset(self.cursor);
        self.text.remove(at);
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for TextBuffer {
    fn id(&self) -> DocumentId {
        self.id
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn delete_range(&mut self, range: Range<usize>) -> Result<(), DocumentError> {
        let len = self.char_len();
        if range.start > range.end || range.end > len {
            return Err(DocumentError::InvalidRange {
                start: range.start,
                end: range.end,
                len,
            });
        }

        let start = self.byte_offset(range.start);
        let end = self.byte_offset(range.end);
        self.text.replace_range(start..end, "");

        if self.cursor > range.end {
            self.cursor -= range.end - range.start;
        } else if self.cursor > range.start {
            self.cursor = range.start;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn ids_are_unique() {
        assert_ne!(TextBuffer::new().id(), TextBuffer::new().id());
    }

    #[test]
    fn typing_appends_at_cursor() {
        let mut buf = TextBuffer::from_text("ab");
        buf.insert_char('c');
        buf.move_home();
        buf.insert_char('>');
        assert_eq!(buf.text(), ">abc");
        assert_eq!(buf.cursor(), 1);
    }

    #[test]
    fn backspace_and_delete_respect_bounds() {
        let mut buf = TextBuffer::from_text("xy");
        buf.move_home();
        assert!(!buf.backspace());
        assert!(buf.delete_forward());
        assert_eq!(buf.text(), "y");

        buf.move_end();
        assert!(!buf.delete_forward());
        assert!(buf.backspace());
        assert_eq!(buf.text(), "");
    }

    #[test]
    fn delete_range_uses_char_offsets() {
        let mut buf = TextBuffer::from_text("héllo wörld");
        buf.delete_range(5..11).unwrap();
        assert_eq!(buf.text(), "héllo");
        assert_eq!(buf.cursor(), 5);
    }

    #[test]
    fn delete_range_moves_cursor_inside_range_to_start() {
        let mut buf = TextBuffer::from_text("abcdef");
        buf.move_home();
        buf.move_right();
        buf.move_right();
        buf.move_right();
        buf.delete_range(2..6).unwrap();
        assert_eq!(buf.text(), "ab");
        assert_eq!(buf.cursor(), 2);
    }

    #[test]
    fn delete_range_rejects_out_of_bounds() {
        let mut buf = TextBuffer::from_text("abc");
        assert_matches!(
            buf.delete_range(1..9),
            Err(DocumentError::InvalidRange { start: 1, end: 9, len: 3 })
        );
        assert_eq!(buf.text(), "abc");
    }

    #[test]
    fn multibyte_editing() {
        let mut buf = TextBuffer::from_text("日本");
        assert_eq!(buf.char_len(), 2);
        buf.move_left();
        buf.insert_char('の');
        assert_eq!(buf.text(), "日の本");
        assert!(buf.backspace());
        assert_eq!(buf.text(), "日本");
    }
}
