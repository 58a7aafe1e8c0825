//! Whole-buffer lexical pass.
//!
//! One pass over the text produces per-line attribute spans, fold ranges and bracket indent
//! levels. String literals end at the end of their line; block comments may span lines.

use crate::rules::RegexRule;
use crate::{ATTR_BOOLEAN, ATTR_COMMENT, ATTR_KEYWORD, ATTR_NULL, ATTR_NUMBER};
use crate::{ATTR_PREPROCESSOR, ATTR_STRING};
use doc_engine::{AttributeId, Range, measure_indentation};
use doc_engine_lang::{IndentStyle, LanguageMode};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) attr: AttributeId,
}

/// Result of analyzing one buffer revision.
#[derive(Debug, Default)]
pub(crate) struct Analysis {
    lines: Vec<Vec<Span>>,
    /// Longest fold per start line.
    folds: BTreeMap<usize, Range>,
    /// Unclosed bracket lines at the first token of each line.
    levels: Vec<usize>,
}

impl Analysis {
    pub(crate) fn attribute_at(&self, line: usize, column: usize) -> Option<AttributeId> {
        self.lines
            .get(line)?
            .iter()
            .find(|span| span.start <= column && column < span.end)
            .map(|span| span.attr)
    }

    pub(crate) fn line_attributes(&self, line: usize, columns: usize) -> Vec<Option<AttributeId>> {
        let mut attrs = vec![None; columns];
        for span in self.lines.get(line).into_iter().flatten() {
            let end = span.end.min(columns);
            for slot in attrs.iter_mut().take(end).skip(span.start) {
                *slot = Some(span.attr);
            }
        }
        attrs
    }

    /// The fold starting on `line`, else the innermost fold containing it.
    pub(crate) fn fold_at(&self, line: usize) -> Option<Range> {
        if let Some(range) = self.folds.get(&line) {
            return Some(*range);
        }
        self.folds
            .range(..line)
            .rev()
            .map(|(_, range)| *range)
            .find(|range| range.end.line >= line)
    }

    pub(crate) fn level(&self, line: usize) -> Option<usize> {
        self.levels.get(line).copied()
    }

    #[cfg(test)]
    pub(crate) fn fold_lines(&self) -> Vec<(usize, usize)> {
        self.folds
            .values()
            .map(|range| (range.start.line, range.end.line))
            .collect()
    }
}

struct Lexer<'a> {
    language: &'a LanguageMode,
    /// Start of the block comment still open at the current position.
    block: Option<(usize, usize)>,
    /// Open brackets: (expected closer, line, column).
    brackets: Vec<(char, usize, usize)>,
    folds: BTreeMap<usize, Range>,
}

impl<'a> Lexer<'a> {
    fn new(language: &'a LanguageMode) -> Self {
        Self {
            language,
            block: None,
            brackets: Vec::new(),
            folds: BTreeMap::new(),
        }
    }

    fn add_fold(&mut self, range: Range) {
        self.folds
            .entry(range.start.line)
            .and_modify(|existing| {
                if range.end.line > existing.end.line {
                    *existing = range;
                }
            })
            .or_insert(range);
    }

    fn open_levels(&self) -> usize {
        let mut count = 0;
        let mut last_line = None;
        for (_, line, _) in &self.brackets {
            if last_line != Some(*line) {
                count += 1;
                last_line = Some(*line);
            }
        }
        count
    }

    fn close_bracket(&mut self, closer: char, line: usize, column: usize) {
        let Some(idx) = self.brackets.iter().rposition(|(c, _, _)| *c == closer) else {
            return;
        };
        let (_, open_line, open_column) = self.brackets[idx];
        self.brackets.truncate(idx);
        if open_line < line {
            self.add_fold(Range::from_coords(open_line, open_column, line, column + 1));
        }
    }

    fn lex_line(
        &mut self,
        line: usize,
        chars: &[char],
        attrs: &mut [Option<AttributeId>],
    ) -> usize {
        let language = self.language;
        let comments = &language.comments;
        let line_comment = comments.line.as_deref().filter(|t| !t.is_empty());
        let block_tokens = if comments.has_block() {
            comments.block_start.as_deref().zip(comments.block_end.as_deref())
        } else {
            None
        };

        let mut level = self.block.is_some().then(|| self.open_levels());
        let mut first_token = true;
        let mut i = 0;

        while i < chars.len() {
            if let Some((start_line, start_column)) = self.block {
                let Some((_, end_token)) = block_tokens else {
                    self.block = None;
                    continue;
                };
                match find_from(chars, i, end_token) {
                    Some(found) => {
                        let end = found + end_token.chars().count();
                        fill(attrs, i, end, ATTR_COMMENT);
                        self.block = None;
                        if start_line < line {
                            self.add_fold(Range::from_coords(start_line, start_column, line, end));
                        }
                        i = end;
                    }
                    None => {
                        fill(attrs, i, chars.len(), ATTR_COMMENT);
                        i = chars.len();
                    }
                }
                continue;
            }

            let ch = chars[i];
            if ch.is_whitespace() {
                i += 1;
                continue;
            }
            if level.is_none() && !language.is_closing_bracket(ch) {
                level = Some(self.open_levels());
            }
            let at_line_start = std::mem::replace(&mut first_token, false);

            if line_comment.is_some_and(|token| starts_with_at(chars, i, token)) {
                fill(attrs, i, chars.len(), ATTR_COMMENT);
                break;
            }
            if let Some((start_token, _)) = block_tokens
                && starts_with_at(chars, i, start_token)
            {
                let len = start_token.chars().count();
                fill(attrs, i, i + len, ATTR_COMMENT);
                self.block = Some((line, i));
                i += len;
                continue;
            }
            if at_line_start
                && language
                    .preprocessor_prefix
                    .as_deref()
                    .is_some_and(|prefix| starts_with_at(chars, i, prefix))
            {
                fill(attrs, i, chars.len(), ATTR_PREPROCESSOR);
                break;
            }
            if language.string_delimiters.contains(&ch) {
                let end = scan_string(chars, i, ch);
                fill(attrs, i, end, ATTR_STRING);
                i = end;
                continue;
            }
            if ch.is_ascii_digit() {
                let end = scan_while(chars, i, |c| c.is_alphanumeric() || c == '.' || c == '_');
                fill(attrs, i, end, ATTR_NUMBER);
                i = end;
                continue;
            }
            if ch.is_alphabetic() || ch == '_' {
                let end = scan_while(chars, i, |c| c.is_alphanumeric() || c == '_');
                let word: String = chars[i..end].iter().collect();
                if let Some(attr) = self.word_attribute(&word) {
                    fill(attrs, i, end, attr);
                }
                i = end;
                continue;
            }
            if let Some(closer) = language.closing_bracket(ch) {
                self.brackets.push((closer, line, i));
            } else if language.is_closing_bracket(ch) {
                self.close_bracket(ch, line, i);
            }
            i += 1;
        }

        level.unwrap_or_else(|| self.open_levels())
    }

    fn word_attribute(&self, word: &str) -> Option<AttributeId> {
        let language = self.language;
        if language.is_keyword(word) {
            Some(ATTR_KEYWORD)
        } else if language.booleans.iter().any(|w| w == word) {
            Some(ATTR_BOOLEAN)
        } else if language.null_literals.iter().any(|w| w == word) {
            Some(ATTR_NULL)
        } else {
            None
        }
    }
}

fn starts_with_at(chars: &[char], at: usize, token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .enumerate()
            .all(|(k, c)| chars.get(at + k) == Some(&c))
}

fn find_from(chars: &[char], from: usize, token: &str) -> Option<usize> {
    (from..chars.len()).find(|&at| starts_with_at(chars, at, token))
}

fn scan_while(chars: &[char], from: usize, pred: impl Fn(char) -> bool) -> usize {
    chars[from..]
        .iter()
        .position(|c| !pred(*c))
        .map_or(chars.len(), |offset| from + offset)
}

/// End (exclusive) of the string opened at `start`; the line end if unterminated.
fn scan_string(chars: &[char], start: usize, delimiter: char) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == delimiter => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

fn fill(attrs: &mut [Option<AttributeId>], start: usize, end: usize, attr: AttributeId) {
    let end = end.min(attrs.len());
    for slot in attrs.iter_mut().take(end).skip(start) {
        *slot = Some(attr);
    }
}

fn to_spans(attrs: &[Option<AttributeId>]) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    for (column, attr) in attrs.iter().enumerate() {
        let Some(attr) = *attr else {
            continue;
        };
        match spans.last_mut() {
            Some(last) if last.attr == attr && last.end == column => last.end = column + 1,
            _ => spans.push(Span {
                start: column,
                end: column + 1,
                attr,
            }),
        }
    }
    spans
}

/// Runs of two or more consecutive lines matching `pred`.
fn line_runs(lines: &[&str], pred: impl Fn(&str) -> bool) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;
    for (idx, text) in lines.iter().enumerate() {
        match (pred(text.trim_start()), start) {
            (true, None) => start = Some(idx),
            (false, Some(first)) => {
                if idx - first >= 2 {
                    runs.push((first, idx - 1));
                }
                start = None;
            }
            _ => {}
        }
    }
    if let Some(first) = start
        && lines.len() - first >= 2
    {
        runs.push((first, lines.len() - 1));
    }
    runs
}

/// Regions delimited by indentation: a line followed by deeper-indented lines.
fn offside_regions(lines: &[&str], tab_width: usize) -> Vec<(usize, usize)> {
    let mut regions = Vec::new();
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let mut last = None;

    for (idx, text) in lines.iter().enumerate() {
        if text.trim().is_empty() {
            continue;
        }
        let width = measure_indentation(text, tab_width);
        while let Some(&(head, head_width)) = stack.last() {
            if width > head_width {
                break;
            }
            stack.pop();
            if let Some(prev) = last
                && prev > head
            {
                regions.push((head, prev));
            }
        }
        stack.push((idx, width));
        last = Some(idx);
    }
    if let Some(prev) = last {
        for (head, _) in stack {
            if prev > head {
                regions.push((head, prev));
            }
        }
    }
    regions
}

fn line_end_range(lines: &[&str], start: usize, end: usize) -> Range {
    let end_column = lines.get(end).map_or(0, |text| text.chars().count());
    Range::from_coords(start, 0, end, end_column)
}

/// Analyze `text` (LF-separated) for `language`, then paint `rules` over the lexer output.
///
/// `tab_width` is used to measure indentation for offside fold regions.
pub(crate) fn analyze(
    text: &str,
    language: &LanguageMode,
    rules: &[RegexRule],
    tab_width: usize,
) -> Analysis {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut lexer = Lexer::new(language);
    let mut spans = Vec::with_capacity(lines.len());
    let mut levels = Vec::with_capacity(lines.len());

    for (line, line_text) in lines.iter().enumerate() {
        let chars: Vec<char> = line_text.chars().collect();
        let mut attrs = vec![None; chars.len()];
        levels.push(lexer.lex_line(line, &chars, &mut attrs));
        for rule in rules {
            rule.apply(line_text, &mut attrs);
        }
        spans.push(to_spans(&attrs));
    }

    if let Some(token) = language.comments.line.as_deref().filter(|t| !t.is_empty()) {
        for (start, end) in line_runs(&lines, |text| text.starts_with(token)) {
            lexer.add_fold(line_end_range(&lines, start, end));
        }
    }
    if !language.import_prefixes.is_empty() {
        let is_import = |text: &str| {
            language
                .import_prefixes
                .iter()
                .any(|prefix| text.starts_with(prefix.as_str()))
        };
        for (start, end) in line_runs(&lines, is_import) {
            lexer.add_fold(line_end_range(&lines, start, end));
        }
    }
    if language.indent_style == IndentStyle::Offside {
        for (start, end) in offside_regions(&lines, tab_width) {
            lexer.add_fold(line_end_range(&lines, start, end));
        }
    }

    Analysis {
        lines: spans,
        folds: lexer.folds,
        levels,
    }
}
