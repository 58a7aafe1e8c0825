//! Fold-region discovery.
//!
//! [`FoldScanner`] walks lines, asks the content engine for the fold range at column 0, and keeps
//! a range only on the line it starts on. Labelling regions is left to a [`FoldClassifier`], so
//! classification strategies can change without touching the scan.

use crate::buffer::TextBuffer;
use crate::config::FoldingConfig;
use crate::engine::ContentEngine;
use crate::position::Position;
use doc_engine_lang::CommentConfig;
use serde::{Deserialize, Serialize};

/// What a fold region contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoldKind {
    /// A structural block.
    Region,
    /// A comment block.
    Comment,
    /// A run of import/include statements.
    Imports,
}

impl FoldKind {
    /// Lowercase name (`"region"`, `"comment"`, `"imports"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Comment => "comment",
            Self::Imports => "imports",
        }
    }
}

/// A foldable line range (inclusive on both ends).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoldRegion {
    /// First line of the region.
    pub start_line: usize,
    /// Last line of the region (inclusive).
    pub end_line: usize,
    /// Region classification.
    pub kind: FoldKind,
}

/// Labels a fold region from the text of its first line.
pub trait FoldClassifier {
    /// Classify the region whose first line is `first_line`.
    fn classify(&self, first_line: &str) -> FoldKind;
}

impl<F> FoldClassifier for F
where
    F: Fn(&str) -> FoldKind,
{
    fn classify(&self, first_line: &str) -> FoldKind {
        self(first_line)
    }
}

/// Text heuristic: comment marker prefix → `Comment`, import token → `Imports`, else `Region`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeuristicClassifier {
    comment_markers: Vec<String>,
    import_tokens: Vec<String>,
}

impl HeuristicClassifier {
    /// Build a classifier from explicit marker lists.
    pub fn new(comment_markers: Vec<String>, import_tokens: Vec<String>) -> Self {
        Self {
            comment_markers,
            import_tokens,
        }
    }

    /// Use a language's comment tokens as the comment markers.
    pub fn from_comments(comments: &CommentConfig, import_tokens: Vec<String>) -> Self {
        let markers = [comments.line.as_ref(), comments.block_start.as_ref()]
            .into_iter()
            .flatten()
            .filter(|token| !token.is_empty())
            .cloned()
            .collect();
        Self::new(markers, import_tokens)
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new(
            vec!["/*".to_string(), "//".to_string()],
            vec!["import".to_string(), "include".to_string()],
        )
    }
}

impl FoldClassifier for HeuristicClassifier {
    fn classify(&self, first_line: &str) -> FoldKind {
        let trimmed = first_line.trim();
        if self
            .comment_markers
            .iter()
            .any(|marker| trimmed.starts_with(marker.as_str()))
        {
            FoldKind::Comment
        } else if self
            .import_tokens
            .iter()
            .any(|token| first_line.contains(token.as_str()))
        {
            FoldKind::Imports
        } else {
            FoldKind::Region
        }
    }
}

/// Bounded fold-region scan.
#[derive(Debug, Clone, Copy)]
pub struct FoldScanner {
    max_lines: usize,
}

impl FoldScanner {
    /// Create a scanner that looks at no more than `config.max_lines` lines.
    pub fn new(config: FoldingConfig) -> Self {
        Self {
            max_lines: config.max_lines,
        }
    }

    /// Fold regions in document order, one per start line at most.
    pub fn scan(
        &self,
        buffer: &TextBuffer,
        engine: &dyn ContentEngine,
        classifier: &dyn FoldClassifier,
    ) -> Vec<FoldRegion> {
        let limit = buffer.line_count().min(self.max_lines);
        let mut regions = Vec::new();

        for line in 0..limit {
            if !engine.is_line_visible(buffer, line) {
                continue;
            }
            let Some(range) = engine.folding_region_at(buffer, Position::new(line, 0)) else {
                continue;
            };
            // Interior lines report their enclosing region; only its first line emits it.
            if range.start.line != line || !range.is_ordered() {
                continue;
            }
            let first_line = buffer.get_line(line).unwrap_or_default();
            regions.push(FoldRegion {
                start_line: range.start.line,
                end_line: range.end.line,
                kind: classifier.classify(&first_line),
            });
        }

        regions
    }
}

impl Default for FoldScanner {
    fn default() -> Self {
        Self::new(FoldingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AttributeId;
    use crate::position::Range;

    /// Folds `{ ... }` blocks whose braces sit at the end/start of their lines.
    struct BlockEngine {
        blocks: Vec<(usize, usize)>,
        hidden: Vec<usize>,
    }

    impl ContentEngine for BlockEngine {
        fn attribute_at(&self, _: &TextBuffer, _: Position) -> Option<AttributeId> {
            None
        }

        fn attribute_name(&self, _: AttributeId) -> Option<&str> {
            None
        }

        fn folding_region_at(&self, _: &TextBuffer, pos: Position) -> Option<Range> {
            self.blocks
                .iter()
                .filter(|(start, end)| *start <= pos.line && pos.line <= *end)
                .max_by_key(|(start, _)| *start)
                .map(|(start, end)| Range::from_coords(*start, 0, *end, 0))
        }

        fn is_line_visible(&self, buffer: &TextBuffer, line: usize) -> bool {
            line < buffer.line_count() && !self.hidden.contains(&line)
        }
    }

    #[test]
    fn test_interior_lines_do_not_duplicate_regions() {
        let buffer = TextBuffer::from_text("fn a() {\n  x\n  y\n}\n");
        let engine = BlockEngine {
            blocks: vec![(0, 3)],
            hidden: vec![],
        };
        let regions =
            FoldScanner::default().scan(&buffer, &engine, &HeuristicClassifier::default());
        assert_eq!(
            regions,
            vec![FoldRegion {
                start_line: 0,
                end_line: 3,
                kind: FoldKind::Region
            }]
        );
    }

    #[test]
    fn test_scan_respects_line_bound_and_visibility() {
        let buffer = TextBuffer::from_text("a\nb\nc\nd\ne\nf");
        let engine = BlockEngine {
            blocks: vec![(0, 1), (2, 3), (4, 5)],
            hidden: vec![2],
        };
        let scanner = FoldScanner::new(FoldingConfig { max_lines: 5 });
        let starts: Vec<_> = scanner
            .scan(&buffer, &engine, &HeuristicClassifier::default())
            .iter()
            .map(|r| r.start_line)
            .collect();
        assert_eq!(starts, vec![0, 4]);
    }

    #[test]
    fn test_heuristic_classification() {
        let classifier = HeuristicClassifier::default();
        assert_eq!(classifier.classify("  /* license"), FoldKind::Comment);
        assert_eq!(classifier.classify("// notes"), FoldKind::Comment);
        assert_eq!(classifier.classify("#include <stdio.h>"), FoldKind::Imports);
        assert_eq!(classifier.classify("import os"), FoldKind::Imports);
        assert_eq!(classifier.classify("fn main() {"), FoldKind::Region);
    }

    #[test]
    fn test_classifier_from_comment_config_and_closures() {
        let classifier = HeuristicClassifier::from_comments(
            &CommentConfig::line("#"),
            vec!["use ".to_string()],
        );
        assert_eq!(classifier.classify("# heading"), FoldKind::Comment);
        assert_eq!(classifier.classify("use std::fmt;"), FoldKind::Imports);

        let always_region = |_: &str| FoldKind::Region;
        assert_eq!(always_region.classify("// x"), FoldKind::Region);
    }
}
