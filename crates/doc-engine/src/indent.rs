//! Leading-whitespace management.
//!
//! Out-of-range lines are ignored rather than reported: `get_indentation` returns 0 and the
//! mutating calls do nothing.

use crate::buffer::TextBuffer;
use crate::config::IndentConfig;
use crate::engine::ContentEngine;
use crate::position::Range;

/// Widest indentation `set_indentation` will write.
pub const MAX_INDENT_WIDTH: usize = 4096;

/// Width of the leading run of spaces and tabs in `text`.
///
/// A space counts 1 column, a tab counts `tab_width` columns.
pub fn measure_indentation(text: &str, tab_width: usize) -> usize {
    text.chars()
        .take_while(|ch| *ch == ' ' || *ch == '\t')
        .map(|ch| if ch == '\t' { tab_width } else { 1 })
        .sum()
}

fn leading_whitespace_chars(text: &str) -> usize {
    text.chars()
        .take_while(|ch| *ch == ' ' || *ch == '\t')
        .count()
}

/// Reads and rewrites line indentation.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndentManager {
    config: IndentConfig,
}

impl IndentManager {
    /// Create a manager with the given widths.
    pub fn new(config: IndentConfig) -> Self {
        Self { config }
    }

    /// Indentation width of `line`; 0 when the line does not exist.
    pub fn get_indentation(&self, buffer: &TextBuffer, line: usize) -> usize {
        buffer
            .get_line(line)
            .map(|text| measure_indentation(&text, self.config.tab_width))
            .unwrap_or(0)
    }

    /// Replace the leading whitespace of `line` with exactly `width` spaces.
    ///
    /// Returns `true` if the buffer changed. Widths above [`MAX_INDENT_WIDTH`] are refused.
    pub fn set_indentation(&self, buffer: &mut TextBuffer, line: usize, width: usize) -> bool {
        if width > MAX_INDENT_WIDTH {
            tracing::debug!(line, width, "indentation width refused");
            return false;
        }
        let Ok(text) = buffer.get_line(line) else {
            return false;
        };
        // Spaces and tabs are single-byte, so the char count is also a byte index.
        let leading = leading_whitespace_chars(&text);
        let current = &text[..leading];
        if current.len() == width && current.bytes().all(|b| b == b' ') {
            return false;
        }
        buffer
            .replace_text(Range::on_line(line, 0, leading), &" ".repeat(width))
            .is_ok()
    }

    /// Re-indent one line using the engine's structural rules.
    pub fn indent_line(
        &self,
        buffer: &mut TextBuffer,
        engine: &dyn ContentEngine,
        line: usize,
    ) -> bool {
        self.indent_lines(buffer, engine, line, line)
    }

    /// Re-indent `start..=end` as one undo step. Blank lines are left alone.
    ///
    /// Does nothing unless `start <= end < line_count`. Returns `true` if any line changed.
    pub fn indent_lines(
        &self,
        buffer: &mut TextBuffer,
        engine: &dyn ContentEngine,
        start: usize,
        end: usize,
    ) -> bool {
        if start > end || end >= buffer.line_count() {
            return false;
        }
        let config = self.config;
        let planned = engine.structural_indent_range(buffer, start, end, &config);
        buffer.group(|buffer| {
            let mut changed = false;
            for line in start..=end {
                if is_blank(buffer, line) {
                    continue;
                }
                let width = match &planned {
                    Some(widths) => widths.get(line - start).copied().flatten(),
                    None => engine.structural_indent(buffer, line, &config),
                };
                if let Some(width) = width {
                    changed |= self.set_indentation(buffer, line, width);
                }
            }
            changed
        })
    }

    /// Add (`levels > 0`) or remove (`levels < 0`) whole indent levels on `start..=end`.
    ///
    /// Blank lines are skipped. Same bounds rules as [`indent_lines`](Self::indent_lines).
    pub fn shift_indentation(
        &self,
        buffer: &mut TextBuffer,
        start: usize,
        end: usize,
        levels: isize,
    ) -> bool {
        if start > end || end >= buffer.line_count() || levels == 0 {
            return false;
        }
        let delta = levels.saturating_mul(self.config.indent_width as isize);
        buffer.group(|buffer| {
            let mut changed = false;
            for line in start..=end {
                if is_blank(buffer, line) {
                    continue;
                }
                let current = self.get_indentation(buffer, line) as isize;
                let width = current.saturating_add(delta).max(0) as usize;
                let width = width.min(MAX_INDENT_WIDTH);
                changed |= self.set_indentation(buffer, line, width);
            }
            changed
        })
    }
}

fn is_blank(buffer: &TextBuffer, line: usize) -> bool {
    buffer
        .get_line(line)
        .map(|text| text.trim().is_empty())
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PlainTextEngine;

    #[test]
    fn test_measure_tab_and_spaces() {
        assert_eq!(measure_indentation("\t  x", 4), 6);
        assert_eq!(measure_indentation("    ", 4), 4);
        assert_eq!(measure_indentation("x\t", 4), 0);
        assert_eq!(measure_indentation("\t\t", 2), 4);
    }

    #[test]
    fn test_set_indentation_rewrites_leading_run_only() {
        let mut buffer = TextBuffer::from_text("\t  x = 1;\ny");
        let manager = IndentManager::default();

        assert_eq!(manager.get_indentation(&buffer, 0), 6);
        assert!(manager.set_indentation(&mut buffer, 0, 2));
        assert_eq!(buffer.get_line(0).unwrap(), "  x = 1;");
        assert_eq!(manager.get_indentation(&buffer, 0), 2);

        // Already exactly two spaces: nothing recorded.
        let depth = buffer.undo_depth();
        assert!(!manager.set_indentation(&mut buffer, 0, 2));
        assert_eq!(buffer.undo_depth(), depth);
    }

    #[test]
    fn test_oversized_width_is_refused() {
        let mut buffer = TextBuffer::from_text("  x");
        let manager = IndentManager::default();
        assert!(!manager.set_indentation(&mut buffer, 0, usize::MAX));
        assert!(!manager.set_indentation(&mut buffer, 0, MAX_INDENT_WIDTH + 1));
        assert_eq!(buffer.get_text(), "  x");

        assert!(manager.shift_indentation(&mut buffer, 0, 0, isize::MAX));
        assert_eq!(manager.get_indentation(&buffer, 0), MAX_INDENT_WIDTH);
    }

    #[test]
    fn test_out_of_range_lines_are_ignored() {
        let mut buffer = TextBuffer::from_text("a");
        let manager = IndentManager::default();
        assert_eq!(manager.get_indentation(&buffer, 5), 0);
        assert!(!manager.set_indentation(&mut buffer, 5, 4));
        assert!(!manager.indent_lines(&mut buffer, &PlainTextEngine, 0, 1));
        assert!(!manager.indent_lines(&mut buffer, &PlainTextEngine, 1, 0));
        assert_eq!(buffer.revision(), 0);
    }

    #[test]
    fn test_indent_lines_is_one_undo_step() {
        let mut buffer = TextBuffer::from_text("  a\nb\n\nc");
        let manager = IndentManager::default();

        assert!(manager.indent_lines(&mut buffer, &PlainTextEngine, 1, 3));
        assert_eq!(buffer.get_text(), "  a\n  b\n\n  c");

        assert!(buffer.undo());
        assert_eq!(buffer.get_text(), "  a\nb\n\nc");
    }

    #[test]
    fn test_shift_indentation_clamps_at_zero() {
        let mut buffer = TextBuffer::from_text("x\n  y\n");
        let manager = IndentManager::default();

        assert!(manager.shift_indentation(&mut buffer, 0, 1, 1));
        assert_eq!(buffer.get_text(), "    x\n      y\n");

        assert!(manager.shift_indentation(&mut buffer, 0, 1, -2));
        assert_eq!(buffer.get_text(), "x\ny\n");
    }
}
