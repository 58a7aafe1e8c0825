//! Run-length syntax tokens.

use crate::buffer::TextBuffer;
use crate::config::TokenizerConfig;
use crate::engine::{AttributeId, ContentEngine};
use serde::{Deserialize, Serialize};

/// Token type reported for columns without an attribute.
pub const PLAIN_TOKEN_TYPE: &str = "text";

/// A maximal run of columns sharing one attribute (subject to the run-length bound).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Line index.
    pub line: usize,
    /// Inclusive start column.
    pub start_column: usize,
    /// Exclusive end column.
    pub end_column: usize,
    /// Attribute name, or [`PLAIN_TOKEN_TYPE`].
    pub token_type: String,
}

impl Token {
    /// Number of columns covered.
    pub fn len(&self) -> usize {
        self.end_column - self.start_column
    }

    /// Always `false` for tokens produced by [`Tokenizer`].
    pub fn is_empty(&self) -> bool {
        self.end_column <= self.start_column
    }
}

/// Turns per-column attributes into bounded run-length tokens.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    max_scan_columns: usize,
    max_run_length: usize,
}

impl Tokenizer {
    /// Create a tokenizer with the given bounds. Zero bounds are treated as 1.
    pub fn new(config: TokenizerConfig) -> Self {
        Self {
            max_scan_columns: config.max_scan_columns.max(1),
            max_run_length: config.max_run_length.max(1),
        }
    }

    /// Tokens for lines `line_start..=line_end`, clipped to the buffer.
    pub fn tokenize(
        &self,
        buffer: &TextBuffer,
        engine: &dyn ContentEngine,
        line_start: usize,
        line_end: usize,
    ) -> Vec<Token> {
        let mut tokens = Vec::new();
        let Some(last_line) = buffer.line_count().checked_sub(1) else {
            return tokens;
        };
        if line_start > line_end || line_start > last_line {
            return tokens;
        }
        for line in line_start..=line_end.min(last_line) {
            self.tokenize_line(buffer, engine, line, &mut tokens);
        }
        tokens
    }

    fn tokenize_line(
        &self,
        buffer: &TextBuffer,
        engine: &dyn ContentEngine,
        line: usize,
        out: &mut Vec<Token>,
    ) {
        let line_len = buffer.line_len(line).unwrap_or(0);
        let scan_len = line_len.min(self.max_scan_columns);
        if scan_len == 0 {
            return;
        }

        let mut attrs = engine.line_attributes(buffer, line, scan_len);
        // Engines may return short or long vectors; missing columns are plain text.
        attrs.resize(scan_len, None);

        let mut run_start = 0;
        let mut current = attrs[0];
        for (column, attr) in attrs.iter().enumerate().skip(1) {
            if *attr != current || column - run_start >= self.max_run_length {
                out.push(Self::make_token(engine, line, run_start, column, current));
                run_start = column;
                current = *attr;
            }
        }
        out.push(Self::make_token(engine, line, run_start, scan_len, current));
    }

    fn make_token(
        engine: &dyn ContentEngine,
        line: usize,
        start_column: usize,
        end_column: usize,
        attr: Option<AttributeId>,
    ) -> Token {
        let token_type = attr
            .and_then(|id| engine.attribute_name(id))
            .unwrap_or(PLAIN_TOKEN_TYPE);
        Token {
            line,
            start_column,
            end_column,
            token_type: token_type.to_string(),
        }
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(TokenizerConfig::default())
    }
}
