//! Text search and replace over a [`TextBuffer`].
//!
//! Searches run line by line, so a match never spans a line separator. All public inputs and
//! outputs are character columns (not byte offsets). It supports:
//!
//! - literal search (case-aware character comparison at successive offsets)
//! - regex search
//! - optional whole-word matching

use crate::buffer::TextBuffer;
use crate::error::UsageError;
use crate::position::Range;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Options that control how search is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchOptions {
    /// If `true`, performs a case-sensitive search.
    pub case_sensitive: bool,
    /// If `true`, a match must not touch alphanumeric characters on either side.
    pub whole_words: bool,
    /// If `true`, treats the pattern as a regex.
    pub regex: bool,
}

impl SearchOptions {
    /// Literal, case-sensitive search.
    pub fn case_sensitive() -> Self {
        Self {
            case_sensitive: true,
            ..Self::default()
        }
    }

    /// Regex search (case-insensitive unless combined with `case_sensitive`).
    pub fn regex() -> Self {
        Self {
            regex: true,
            ..Self::default()
        }
    }

    /// Enable whole-word matching.
    pub fn with_whole_words(mut self) -> Self {
        self.whole_words = true;
        self
    }
}

/// A match returned by [`search`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    /// Line index.
    pub line: usize,
    /// Start column in characters.
    pub column: usize,
    /// Length in characters.
    pub length: usize,
    /// The matched text.
    pub matched_text: String,
}

impl SearchMatch {
    /// The range covered by the match.
    pub fn range(&self) -> Range {
        Range::on_line(self.line, self.column, self.length)
    }
}

#[derive(Debug)]
pub(crate) struct CharIndex {
    char_to_byte: Vec<usize>,
    text_len: usize,
}

impl CharIndex {
    pub(crate) fn new(text: &str) -> Self {
        let mut char_to_byte: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        char_to_byte.push(text.len());
        Self {
            char_to_byte,
            text_len: text.len(),
        }
    }

    pub(crate) fn byte_to_char(&self, byte_offset: usize) -> usize {
        let clamped = byte_offset.min(self.text_len);
        match self.char_to_byte.binary_search(&clamped) {
            Ok(idx) => idx,
            Err(idx) => idx,
        }
    }
}

enum Matcher {
    Literal {
        pattern: Vec<char>,
        case_sensitive: bool,
    },
    Regex(Regex),
}

impl Matcher {
    fn compile(pattern: &str, options: SearchOptions) -> Result<Self, UsageError> {
        if options.regex {
            let re = RegexBuilder::new(pattern)
                .case_insensitive(!options.case_sensitive)
                .build()
                .map_err(|err| UsageError::InvalidPattern(err.to_string()))?;
            Ok(Self::Regex(re))
        } else {
            Ok(Self::Literal {
                pattern: pattern.chars().collect(),
                case_sensitive: options.case_sensitive,
            })
        }
    }
}

/// A match plus the replacement text to use for it (regex replacements expand captures).
struct PlannedMatch {
    found: SearchMatch,
    replacement: Option<String>,
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric()
}

fn is_whole_word(chars: &[char], start: usize, end: usize) -> bool {
    let before = start.checked_sub(1).and_then(|i| chars.get(i)).copied();
    let after = chars.get(end).copied();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

fn chars_equal(a: char, b: char, case_sensitive: bool) -> bool {
    a == b || (!case_sensitive && a.to_lowercase().eq(b.to_lowercase()))
}

fn find_literal(
    line: usize,
    chars: &[char],
    pattern: &[char],
    case_sensitive: bool,
    whole_words: bool,
    out: &mut Vec<PlannedMatch>,
) {
    let len = pattern.len();
    if len == 0 || chars.len() < len {
        return;
    }

    let mut start = 0;
    while start + len <= chars.len() {
        let hit = chars[start..start + len]
            .iter()
            .zip(pattern)
            .all(|(a, b)| chars_equal(*a, *b, case_sensitive));
        if !hit || (whole_words && !is_whole_word(chars, start, start + len)) {
            start += 1;
            continue;
        }
        out.push(PlannedMatch {
            found: SearchMatch {
                line,
                column: start,
                length: len,
                matched_text: chars[start..start + len].iter().collect(),
            },
            replacement: None,
        });
        start += len;
    }
}

fn find_regex(
    line: usize,
    text: &str,
    chars: &[char],
    re: &Regex,
    whole_words: bool,
    replacement: Option<&str>,
    out: &mut Vec<PlannedMatch>,
) {
    let index = CharIndex::new(text);
    for caps in re.captures_iter(text) {
        let Some(m) = caps.get(0) else {
            continue;
        };
        if m.start() == m.end() {
            continue;
        }
        let start = index.byte_to_char(m.start());
        let end = index.byte_to_char(m.end());
        if whole_words && !is_whole_word(chars, start, end) {
            continue;
        }
        let replacement = replacement.map(|template| {
            let mut expanded = String::new();
            caps.expand(template, &mut expanded);
            expanded
        });
        out.push(PlannedMatch {
            found: SearchMatch {
                line,
                column: start,
                length: end - start,
                matched_text: m.as_str().to_string(),
            },
            replacement,
        });
    }
}

fn plan(
    buffer: &TextBuffer,
    pattern: &str,
    options: SearchOptions,
    replacement: Option<&str>,
) -> Result<Vec<PlannedMatch>, UsageError> {
    if pattern.is_empty() {
        return Ok(Vec::new());
    }
    let matcher = Matcher::compile(pattern, options)?;

    let mut planned = Vec::new();
    for line in 0..buffer.line_count() {
        let Ok(text) = buffer.get_line(line) else {
            continue;
        };
        let chars: Vec<char> = text.chars().collect();
        match &matcher {
            Matcher::Literal {
                pattern,
                case_sensitive,
            } => find_literal(
                line,
                &chars,
                pattern,
                *case_sensitive,
                options.whole_words,
                &mut planned,
            ),
            Matcher::Regex(re) => find_regex(
                line,
                &text,
                &chars,
                re,
                options.whole_words,
                replacement,
                &mut planned,
            ),
        }
    }
    Ok(planned)
}

/// Find all matches of `pattern`, line-major and column-ascending.
///
/// - Returns an empty list if `pattern` is empty.
/// - Regex matches never overlap and empty regex matches are skipped.
/// - An invalid regex is reported as [`UsageError::InvalidPattern`].
pub fn search(
    buffer: &TextBuffer,
    pattern: &str,
    options: SearchOptions,
) -> Result<Vec<SearchMatch>, UsageError> {
    Ok(plan(buffer, pattern, options, None)?
        .into_iter()
        .map(|planned| planned.found)
        .collect())
}

/// Replace `length` characters at `(line, column)` with `replacement`.
///
/// Returns `false` without touching the buffer if the span does not fit on the line.
pub fn replace(
    buffer: &mut TextBuffer,
    line: usize,
    column: usize,
    length: usize,
    replacement: &str,
) -> bool {
    buffer
        .replace_text(Range::on_line(line, column, length), replacement)
        .is_ok()
}

/// Replace every match of `pattern`, returning how many replacements were applied.
///
/// Matches are collected first and applied last-to-first, so earlier replacements never shift
/// the columns of matches still pending. The whole operation is one undo step. In regex mode
/// the replacement may reference captures (`$1`, `${name}`).
pub fn replace_all(
    buffer: &mut TextBuffer,
    pattern: &str,
    replacement: &str,
    options: SearchOptions,
) -> Result<usize, UsageError> {
    let planned = plan(buffer, pattern, options, Some(replacement))?;
    if planned.is_empty() {
        return Ok(0);
    }

    let count = buffer.group(|buffer| {
        planned
            .iter()
            .rev()
            .filter(|planned| {
                let text = planned.replacement.as_deref().unwrap_or(replacement);
                let found = &planned.found;
                replace(buffer, found.line, found.column, found.length, text)
            })
            .count()
    });
    tracing::debug!(pattern, matches = planned.len(), replaced = count, "replace_all");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(matches: &[SearchMatch]) -> Vec<(usize, usize)> {
        matches.iter().map(|m| (m.line, m.column)).collect()
    }

    #[test]
    fn test_whole_word_skips_embedded_occurrence() {
        let buffer = TextBuffer::from_text("foobar foo baz");
        let matches = search(&buffer, "foo", SearchOptions::default().with_whole_words()).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].column, 7);
        assert_eq!(matches[0].matched_text, "foo");
    }

    #[test]
    fn test_whole_word_rejection_advances_by_one_char() {
        // "aa" at column 0 touches "a" on the right; the accepted candidate starts at 3.
        let buffer = TextBuffer::from_text("aaa aa");
        let matches = search(&buffer, "aa", SearchOptions::default().with_whole_words()).unwrap();
        assert_eq!(columns(&matches), vec![(0, 4)]);
    }

    #[test]
    fn test_literal_is_case_insensitive_by_default() {
        let buffer = TextBuffer::from_text("Hello hello\nHELLO");
        let matches = search(&buffer, "hello", SearchOptions::default()).unwrap();
        assert_eq!(columns(&matches), vec![(0, 0), (0, 6), (1, 0)]);
        assert_eq!(matches[2].matched_text, "HELLO");

        let matches = search(&buffer, "hello", SearchOptions::case_sensitive()).unwrap();
        assert_eq!(columns(&matches), vec![(0, 6)]);
    }

    #[test]
    fn test_regex_columns_are_chars() {
        let buffer = TextBuffer::from_text("你好 abc12 x9");
        let matches = search(&buffer, r"[a-z]+\d+", SearchOptions::regex()).unwrap();
        assert_eq!(columns(&matches), vec![(0, 3), (0, 9)]);
        assert_eq!(matches[0].length, 5);
    }

    #[test]
    fn test_regex_skips_empty_matches_and_reports_bad_patterns() {
        let buffer = TextBuffer::from_text("abc");
        assert!(search(&buffer, "x*", SearchOptions::regex()).unwrap().is_empty());
        assert!(matches!(
            search(&buffer, "(", SearchOptions::regex()),
            Err(UsageError::InvalidPattern(_))
        ));
        assert!(search(&buffer, "", SearchOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn test_replace_all_applies_back_to_front() {
        let mut buffer = TextBuffer::from_text("aaa");
        let count = replace_all(&mut buffer, "a", "b", SearchOptions::default()).unwrap();
        assert_eq!(count, 3);
        assert_eq!(buffer.get_text(), "bbb");
    }

    #[test]
    fn test_replace_all_with_growing_replacement_is_one_undo_step() {
        let mut buffer = TextBuffer::from_text("x.x\nx");
        let count = replace_all(&mut buffer, "x", "long", SearchOptions::default()).unwrap();
        assert_eq!(count, 3);
        assert_eq!(buffer.get_text(), "long.long\nlong");

        assert!(buffer.undo());
        assert_eq!(buffer.get_text(), "x.x\nx");
    }

    #[test]
    fn test_replace_all_beyond_undo_limit_is_undone_completely() {
        let original = "a".repeat(1500);
        let mut buffer = TextBuffer::from_text(&original);
        let count = replace_all(&mut buffer, "a", "b", SearchOptions::default()).unwrap();
        assert_eq!(count, 1500);
        assert_eq!(buffer.undo_depth(), 1);

        assert!(buffer.undo());
        assert_eq!(buffer.get_text(), original);
        assert!(!buffer.can_undo());

        assert!(buffer.redo());
        assert_eq!(buffer.get_text(), "b".repeat(1500));
    }

    #[test]
    fn test_replace_all_regex_expands_captures() {
        let mut buffer = TextBuffer::from_text("foo1 foo2\nfoo3");
        let count = replace_all(
            &mut buffer,
            r"foo(\d)",
            "bar$1",
            SearchOptions::regex(),
        )
        .unwrap();
        assert_eq!(count, 3);
        assert_eq!(buffer.get_text(), "bar1 bar2\nbar3");
    }

    #[test]
    fn test_replace_rejects_out_of_bounds_span() {
        let mut buffer = TextBuffer::from_text("short");
        assert!(!replace(&mut buffer, 0, 3, 5, "x"));
        assert!(!replace(&mut buffer, 1, 0, 0, "x"));
        assert_eq!(buffer.get_text(), "short");

        assert!(replace(&mut buffer, 0, 0, 5, "tall"));
        assert_eq!(buffer.get_text(), "tall");
    }
}
