//! Line-addressed text storage.
//!
//! [`TextBuffer`] keeps its text in a [`Rope`] (O(log N) line access and editing) and records
//! every mutation in an undo history. All public coordinates are `(line, column)` pairs in
//! characters; internally they are converted to rope character offsets.

use crate::error::UsageError;
use crate::history::{EditHistory, TextEdit};
use crate::line_ending::normalize_newlines;
use crate::position::{Position, Range};
use ropey::{Rope, RopeSlice};

/// Default number of undo steps a buffer keeps.
pub const DEFAULT_MAX_UNDO: usize = 1000;

/// A mutable, line-addressed text buffer with undo/redo.
///
/// The buffer always holds at least one (possibly empty) line. Text ending in `'\n'` has a
/// trailing empty line, so `"a\n"` has two lines.
///
/// # Example
///
/// ```rust
/// use doc_engine::{Position, Range, TextBuffer};
///
/// let mut buffer = TextBuffer::from_text("Hello\nWorld");
/// buffer.insert_text(Position::new(1, 5), "!").unwrap();
/// assert_eq!(buffer.get_line(1).unwrap(), "World!");
///
/// buffer.remove_text(Range::from_coords(0, 5, 1, 0)).unwrap();
/// assert_eq!(buffer.get_text(), "HelloWorld!");
///
/// assert!(buffer.undo());
/// assert_eq!(buffer.line_count(), 2);
/// ```
#[derive(Debug)]
pub struct TextBuffer {
    rope: Rope,
    history: EditHistory,
    revision: u64,
}

impl TextBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::with_max_undo("", DEFAULT_MAX_UNDO)
    }

    /// Create a buffer holding `text`. The initial content is not part of the undo history.
    pub fn from_text(text: &str) -> Self {
        Self::with_max_undo(text, DEFAULT_MAX_UNDO)
    }

    /// Create a buffer holding `text` with a custom undo limit.
    pub fn with_max_undo(text: &str, max_undo: usize) -> Self {
        Self {
            rope: Rope::from_str(&normalize_newlines(text)),
            history: EditHistory::new(max_undo),
            revision: 0,
        }
    }

    /// Get complete text
    pub fn get_text(&self) -> String {
        self.rope.to_string()
    }

    /// Get total line count
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get total character count, line separators included.
    pub fn length(&self) -> usize {
        self.rope.len_chars()
    }

    /// Monotonic counter bumped by every mutation (including undo/redo).
    ///
    /// Content engines use it to invalidate cached per-document analysis.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns `true` if the content differs from the last clean point (load/save).
    pub fn is_modified(&self) -> bool {
        !self.history.is_clean()
    }

    /// Record the current state as the clean point.
    pub fn mark_clean(&mut self) {
        self.history.mark_clean();
    }

    /// Returns `true` if there is an edit to undo.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Returns `true` if there is an undone edit to redo.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Undo stack depth, counted in undo steps (edit groups).
    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    /// Redo stack depth, counted in undo steps (edit groups).
    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    /// Length of `line` in characters, excluding the separator.
    pub fn line_len(&self, line: usize) -> Option<usize> {
        self.line_slice(line).map(|slice| slice.len_chars())
    }

    /// Text of `line` without its separator.
    pub fn get_line(&self, line: usize) -> Result<String, UsageError> {
        self.line_slice(line)
            .map(|slice| slice.to_string())
            .ok_or(UsageError::LineOutOfRange {
                line,
                line_count: self.line_count(),
            })
    }

    /// Borrow `line` without its separator.
    pub(crate) fn line_slice(&self, line: usize) -> Option<RopeSlice<'_>> {
        if line >= self.rope.len_lines() {
            return None;
        }
        let slice = self.rope.line(line);
        let len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            Some(slice.slice(..len - 1))
        } else {
            Some(slice)
        }
    }

    /// Convert a position to a character offset, or `None` if it is outside the document.
    pub fn char_offset(&self, pos: Position) -> Option<usize> {
        let line_len = self.line_len(pos.line)?;
        if pos.column > line_len {
            return None;
        }
        Some(self.rope.line_to_char(pos.line) + pos.column)
    }

    /// Convert a character offset (clamped to the document) to a position.
    pub fn position_at(&self, char_offset: usize) -> Position {
        let char_offset = char_offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(char_offset);
        Position::new(line, char_offset - self.rope.line_to_char(line))
    }

    fn check_position(&self, pos: Position) -> Result<usize, UsageError> {
        self.char_offset(pos)
            .ok_or(UsageError::PositionOutOfRange(pos))
    }

    fn check_range(&self, range: Range) -> Result<(usize, usize), UsageError> {
        if !range.is_ordered() {
            return Err(UsageError::InvalidRange(range));
        }
        let start = self
            .char_offset(range.start)
            .ok_or(UsageError::InvalidRange(range))?;
        let end = self
            .char_offset(range.end)
            .ok_or(UsageError::InvalidRange(range))?;
        Ok((start, end))
    }

    /// Text covered by `range`.
    pub fn text_in_range(&self, range: Range) -> Result<String, UsageError> {
        let (start, end) = self.check_range(range)?;
        Ok(self.rope.slice(start..end).to_string())
    }

    /// Replace the whole content. Recorded as a single undoable edit.
    pub fn set_text(&mut self, text: &str) {
        let text = normalize_newlines(text);
        if self.rope == text.as_ref() {
            return;
        }
        let end = self.rope.len_chars();
        self.apply_recorded(0, end, &text);
    }

    /// Insert `text` at `pos`.
    pub fn insert_text(&mut self, pos: Position, text: &str) -> Result<(), UsageError> {
        let offset = self.check_position(pos)?;
        if text.is_empty() {
            return Ok(());
        }
        let text = normalize_newlines(text);
        self.apply_recorded(offset, offset, &text);
        Ok(())
    }

    /// Remove the text covered by `range`, returning it.
    pub fn remove_text(&mut self, range: Range) -> Result<String, UsageError> {
        let (start, end) = self.check_range(range)?;
        if start == end {
            return Ok(String::new());
        }
        Ok(self.apply_recorded(start, end, ""))
    }

    /// Atomically replace the text covered by `range` with `text` (one undo step).
    pub fn replace_text(&mut self, range: Range, text: &str) -> Result<(), UsageError> {
        let (start, end) = self.check_range(range)?;
        if start == end && text.is_empty() {
            return Ok(());
        }
        let text = normalize_newlines(text);
        self.apply_recorded(start, end, &text);
        Ok(())
    }

    /// Run `f` with an open undo group: every edit it makes is undone/redone as one step.
    pub fn group<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.history.begin_group();
        let result = f(self);
        self.history.end_group();
        result
    }

    /// Revert the newest undo group. Returns `false` if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(group) = self.history.pop_undo_group() else {
            return false;
        };
        for edit in group.edits.iter().rev() {
            self.apply_raw(edit.start, edit.start + edit.inserted_len(), &edit.deleted);
        }
        self.history.push_redo_group(group);
        true
    }

    /// Re-apply the most recently undone group. Returns `false` if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(group) = self.history.pop_redo_group() else {
            return false;
        };
        for edit in &group.edits {
            self.apply_raw(edit.start, edit.start + edit.deleted_len(), &edit.inserted);
        }
        self.history.push_undo_group(group);
        true
    }

    fn apply_recorded(&mut self, start: usize, end: usize, text: &str) -> String {
        let deleted = self.rope.slice(start..end).to_string();
        self.apply_raw(start, end, text);
        self.history.record(TextEdit {
            start,
            deleted: deleted.clone(),
            inserted: text.to_string(),
        });
        deleted
    }

    fn apply_raw(&mut self, start: usize, end: usize, text: &str) {
        if start < end {
            self.rope.remove(start..end);
        }
        if !text.is_empty() {
            self.rope.insert(start, text);
        }
        self.revision = self.revision.wrapping_add(1);
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_has_one_line() {
        let buffer = TextBuffer::new();
        assert_eq!(buffer.line_count(), 1);
        assert_eq!(buffer.length(), 0);
        assert_eq!(buffer.get_line(0).unwrap(), "");
        assert!(!buffer.is_modified());
    }

    #[test]
    fn test_trailing_newline_adds_empty_line() {
        let buffer = TextBuffer::from_text("a\n");
        assert_eq!(buffer.line_count(), 2);
        assert_eq!(buffer.get_line(0).unwrap(), "a");
        assert_eq!(buffer.get_line(1).unwrap(), "");
        assert_eq!(buffer.line_len(0), Some(1));
    }

    #[test]
    fn test_get_line_out_of_range() {
        let buffer = TextBuffer::from_text("one\ntwo");
        assert_eq!(
            buffer.get_line(2),
            Err(UsageError::LineOutOfRange {
                line: 2,
                line_count: 2
            })
        );
    }

    #[test]
    fn test_insert_rejects_column_past_line_end() {
        let mut buffer = TextBuffer::from_text("abc\ndef");
        let err = buffer.insert_text(Position::new(0, 4), "x").unwrap_err();
        assert_eq!(err, UsageError::PositionOutOfRange(Position::new(0, 4)));
        assert_eq!(buffer.get_text(), "abc\ndef");
        assert!(!buffer.can_undo());
    }

    #[test]
    fn test_remove_rejects_reversed_range() {
        let mut buffer = TextBuffer::from_text("abc\ndef");
        let range = Range::from_coords(1, 0, 0, 1);
        assert_eq!(
            buffer.remove_text(range),
            Err(UsageError::InvalidRange(range))
        );
        assert_eq!(buffer.revision(), 0);
    }

    #[test]
    fn test_remove_across_lines_joins_them() {
        let mut buffer = TextBuffer::from_text("abc\ndef\nghi");
        let removed = buffer.remove_text(Range::from_coords(0, 2, 2, 1)).unwrap();
        assert_eq!(removed, "c\ndef\ng");
        assert_eq!(buffer.get_text(), "abhi");
        assert_eq!(buffer.line_count(), 1);
    }

    #[test]
    fn test_insert_normalizes_carriage_returns() {
        let mut buffer = TextBuffer::new();
        buffer.insert_text(Position::new(0, 0), "a\r\nb\rc").unwrap();
        assert_eq!(buffer.get_text(), "a\nb\nc");
        assert_eq!(buffer.line_count(), 3);
    }

    #[test]
    fn test_unicode_columns_are_chars() {
        let mut buffer = TextBuffer::from_text("你好\n世界");
        buffer.insert_text(Position::new(1, 1), "の").unwrap();
        assert_eq!(buffer.get_line(1).unwrap(), "世の界");
        assert_eq!(buffer.length(), 6);
        assert_eq!(buffer.position_at(4), Position::new(1, 1));
    }

    #[test]
    fn test_replace_is_single_undo_step() {
        let mut buffer = TextBuffer::from_text("hello world");
        buffer
            .replace_text(Range::on_line(0, 6, 5), "there")
            .unwrap();
        assert_eq!(buffer.get_text(), "hello there");
        assert_eq!(buffer.undo_depth(), 1);

        assert!(buffer.undo());
        assert_eq!(buffer.get_text(), "hello world");
        assert!(buffer.redo());
        assert_eq!(buffer.get_text(), "hello there");
    }

    #[test]
    fn test_group_undoes_together() {
        let mut buffer = TextBuffer::from_text("abc");
        buffer.group(|buf| {
            buf.insert_text(Position::new(0, 3), "d").unwrap();
            buf.insert_text(Position::new(0, 0), "_").unwrap();
        });
        assert_eq!(buffer.get_text(), "_abcd");
        assert!(buffer.undo());
        assert_eq!(buffer.get_text(), "abc");
        assert!(!buffer.undo());
    }

    #[test]
    fn test_modified_follows_clean_point() {
        let mut buffer = TextBuffer::from_text("x");
        buffer.insert_text(Position::new(0, 1), "y").unwrap();
        assert!(buffer.is_modified());
        assert!(buffer.undo());
        assert!(!buffer.is_modified());
    }

    #[test]
    fn test_set_text_same_content_is_noop() {
        let mut buffer = TextBuffer::from_text("same");
        buffer.set_text("same");
        assert!(!buffer.is_modified());
        assert!(!buffer.can_undo());

        buffer.set_text("other");
        assert!(buffer.is_modified());
        assert!(buffer.undo());
        assert_eq!(buffer.get_text(), "same");
    }
}
