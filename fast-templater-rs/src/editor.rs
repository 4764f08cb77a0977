//! Editor capability.
//!
//! The engine never owns a document: it reads and edits one through
//! [`Editor`]. [`TextBuffer`] is the in-memory implementation used by the CLI
//! (a note file loaded into memory) and by tests.

use crate::parser::frontmatter::parse_frontmatter;
use crate::types::Frontmatter;
use serde::Serialize;

/// A 0-based line/character position. `ch` counts Unicode scalar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct EditorPosition {
    pub line: usize,
    pub ch: usize,
}

impl EditorPosition {
    pub fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }

    pub fn line_start(line: usize) -> Self {
        Self { line, ch: 0 }
    }
}

/// Text editing operations the insertion pipeline needs from its host.
pub trait Editor {
    /// Full text of the document.
    fn content(&self) -> String;

    fn cursor(&self) -> EditorPosition;

    /// Replace the selection (or insert at the cursor) and leave the cursor
    /// after the inserted text.
    fn replace_selection(&mut self, text: &str);

    /// Replace the text between two positions.
    fn replace_range(&mut self, text: &str, from: EditorPosition, to: EditorPosition);

    /// Frontmatter of the document being edited. Unparseable frontmatter
    /// reads as empty.
    fn active_file_frontmatter(&self) -> Frontmatter {
        parse_frontmatter(&self.content()).frontmatter
    }
}

/// An in-memory document with a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    content: String,
    /// Byte offsets, `anchor <= head` not required.
    anchor: usize,
    head: usize,
}

impl TextBuffer {
    /// Create a buffer with the cursor at the end of the document.
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let end = content.len();
        Self {
            content,
            anchor: end,
            head: end,
        }
    }

    pub fn with_cursor(mut self, position: EditorPosition) -> Self {
        self.set_cursor(position);
        self
    }

    pub fn set_cursor(&mut self, position: EditorPosition) {
        let offset = self.offset_of(position);
        self.anchor = offset;
        self.head = offset;
    }

    pub fn select(&mut self, from: EditorPosition, to: EditorPosition) {
        self.anchor = self.offset_of(from);
        self.head = self.offset_of(to);
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }

    /// Byte offset of a position, clamped to the document.
    pub fn offset_of(&self, position: EditorPosition) -> usize {
        let mut line_start = 0;
        for _ in 0..position.line {
            match self.content[line_start..].find('\n') {
                Some(i) => line_start += i + 1,
                None => return self.content.len(),
            }
        }
        let line_end = self.content[line_start..]
            .find('\n')
            .map_or(self.content.len(), |i| line_start + i);
        self.content[line_start..line_end]
            .char_indices()
            .nth(position.ch)
            .map_or(line_end, |(i, _)| line_start + i)
    }

    /// Position of a byte offset.
    pub fn position_of(&self, offset: usize) -> EditorPosition {
        let offset = offset.min(self.content.len());
        let before = &self.content[..offset];
        let line = before.matches('\n').count();
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        EditorPosition {
            line,
            ch: self.content[line_start..offset].chars().count(),
        }
    }

    fn replace_offsets(&mut self, text: &str, from: usize, to: usize) {
        let (from, to) = if from <= to { (from, to) } else { (to, from) };
        self.content.replace_range(from..to, text);

        let map = |offset: usize| {
            if offset < from {
                offset
            } else if offset >= to {
                offset - (to - from) + text.len()
            } else {
                from + text.len()
            }
        };
        self.anchor = map(self.anchor);
        self.head = map(self.head);
    }
}

impl Editor for TextBuffer {
    fn content(&self) -> String {
        self.content.clone()
    }

    fn cursor(&self) -> EditorPosition {
        self.position_of(self.head)
    }

    fn replace_selection(&mut self, text: &str) {
        let from = self.anchor.min(self.head);
        let to = self.anchor.max(self.head);
        self.content.replace_range(from..to, text);
        self.anchor = from + text.len();
        self.head = self.anchor;
    }

    fn replace_range(&mut self, text: &str, from: EditorPosition, to: EditorPosition) {
        let from = self.offset_of(from);
        let to = self.offset_of(to);
        self.replace_offsets(text, from, to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_offsets_and_positions() {
        let buffer = TextBuffer::new("ab\ncdé\n\nxyz");
        assert_eq!(buffer.offset_of(EditorPosition::new(0, 0)), 0);
        assert_eq!(buffer.offset_of(EditorPosition::new(1, 2)), 5);
        assert_eq!(buffer.offset_of(EditorPosition::new(1, 3)), 7);
        // Past the end of a line clamps to the line end.
        assert_eq!(buffer.offset_of(EditorPosition::new(0, 10)), 2);
        // Past the last line clamps to the document end.
        assert_eq!(buffer.offset_of(EditorPosition::new(9, 0)), buffer.as_str().len());
        assert_eq!(buffer.position_of(5), EditorPosition::new(1, 2));
        assert_eq!(buffer.cursor(), EditorPosition::new(3, 3));
    }

    #[test]
    fn test_replace_selection_moves_cursor() {
        let mut buffer = TextBuffer::new("hello world").with_cursor(EditorPosition::new(0, 5));
        buffer.replace_selection(",");
        assert_eq!(buffer.as_str(), "hello, world");
        assert_eq!(buffer.cursor(), EditorPosition::new(0, 6));

        buffer.select(EditorPosition::new(0, 7), EditorPosition::new(0, 12));
        buffer.replace_selection("there");
        assert_eq!(buffer.as_str(), "hello, there");
    }

    #[test]
    fn test_replace_range_shifts_cursor() {
        let mut buffer = TextBuffer::new("one\ntwo\nthree").with_cursor(EditorPosition::new(2, 0));
        buffer.replace_range("ONE\nONE\n", EditorPosition::line_start(0), EditorPosition::line_start(1));
        assert_eq!(buffer.as_str(), "ONE\nONE\ntwo\nthree");
        assert_eq!(buffer.cursor(), EditorPosition::new(3, 0));
    }

    #[test]
    fn test_insert_at_cursor_pushes_cursor_forward() {
        let mut buffer = TextBuffer::new("body").with_cursor(EditorPosition::new(0, 0));
        buffer.replace_range("head\n", EditorPosition::new(0, 0), EditorPosition::new(0, 0));
        buffer.replace_selection("X");
        assert_eq!(buffer.as_str(), "head\nXbody");
    }

    #[test]
    fn test_active_file_frontmatter() {
        let buffer = TextBuffer::new("---\ntitle: Hi\n---\nbody");
        let fm = buffer.active_file_frontmatter();
        assert_eq!(fm.get("title").and_then(|v| v.as_str()), Some("Hi"));
    }
}
