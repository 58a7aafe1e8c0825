//! [`ContentEngine`] implementation over the lexer.

use crate::lexer::{Analysis, analyze};
use crate::rules::RegexRule;
use doc_engine::{
    AttributeId, ContentEngine, FoldClassifier, HeuristicClassifier, IndentConfig, Position, Range,
    TextBuffer, measure_indentation,
};
use doc_engine_lang::{IndentStyle, LanguageMode};
use std::cell::RefCell;
use std::rc::Rc;

/// A content engine driven by a [`LanguageMode`] plus optional regex rules.
///
/// The buffer is re-analyzed lazily, at most once per buffer revision.
#[derive(Debug)]
pub struct HighlightEngine {
    language: LanguageMode,
    rules: Vec<RegexRule>,
    indent: IndentConfig,
    cache: RefCell<Option<(u64, Rc<Analysis>)>>,
}

impl HighlightEngine {
    /// Create an engine for `language` with extra `rules` painted over the lexer output.
    pub fn new(language: LanguageMode, rules: Vec<RegexRule>) -> Self {
        Self {
            language,
            rules,
            indent: IndentConfig::default(),
            cache: RefCell::new(None),
        }
    }

    /// The language this engine describes.
    pub fn language(&self) -> &LanguageMode {
        &self.language
    }

    fn analysis(&self, buffer: &TextBuffer) -> Rc<Analysis> {
        let revision = buffer.revision();
        if let Some((cached, analysis)) = self.cache.borrow().as_ref()
            && *cached == revision
        {
            return Rc::clone(analysis);
        }
        let analysis = Rc::new(analyze(
            &buffer.get_text(),
            &self.language,
            &self.rules,
            self.indent.tab_width,
        ));
        *self.cache.borrow_mut() = Some((revision, Rc::clone(&analysis)));
        analysis
    }

    fn offside_indent(&self, buffer: &TextBuffer, line: usize, config: &IndentConfig) -> usize {
        let previous = (0..line).rev().find_map(|candidate| {
            let text = buffer.get_line(candidate).ok()?;
            (!text.trim().is_empty()).then_some(text)
        });
        let Some(previous) = previous else {
            return 0;
        };
        let base = measure_indentation(&previous, config.tab_width);
        if previous.trim_end().ends_with(':') {
            base + config.indent_width
        } else {
            base
        }
    }
}

impl ContentEngine for HighlightEngine {
    fn attribute_at(&self, buffer: &TextBuffer, pos: Position) -> Option<AttributeId> {
        self.analysis(buffer).attribute_at(pos.line, pos.column)
    }

    fn attribute_name(&self, id: AttributeId) -> Option<&str> {
        crate::attribute_name(id)
    }

    fn line_attributes(
        &self,
        buffer: &TextBuffer,
        line: usize,
        columns: usize,
    ) -> Vec<Option<AttributeId>> {
        self.analysis(buffer).line_attributes(line, columns)
    }

    fn folding_region_at(&self, buffer: &TextBuffer, pos: Position) -> Option<Range> {
        self.analysis(buffer).fold_at(pos.line)
    }

    fn structural_indent(
        &self,
        buffer: &TextBuffer,
        line: usize,
        config: &IndentConfig,
    ) -> Option<usize> {
        if line >= buffer.line_count() {
            return None;
        }
        match self.language.indent_style {
            IndentStyle::Brackets => self
                .analysis(buffer)
                .level(line)
                .map(|level| level * config.indent_width),
            IndentStyle::Offside => Some(self.offside_indent(buffer, line, config)),
            IndentStyle::Flat => Some(0),
        }
    }

    fn structural_indent_range(
        &self,
        buffer: &TextBuffer,
        start: usize,
        end: usize,
        config: &IndentConfig,
    ) -> Option<Vec<Option<usize>>> {
        match self.language.indent_style {
            // Bracket depth ignores leading whitespace, so one analysis covers the whole range.
            IndentStyle::Brackets => {
                let analysis = self.analysis(buffer);
                Some(
                    (start..=end)
                        .map(|line| {
                            analysis
                                .level(line)
                                .map(|level| level * config.indent_width)
                        })
                        .collect(),
                )
            }
            IndentStyle::Flat => Some(
                (start..=end)
                    .map(|line| (line < buffer.line_count()).then_some(0))
                    .collect(),
            ),
            IndentStyle::Offside => None,
        }
    }

    fn configure_indent(&mut self, config: IndentConfig) {
        if self.indent != config {
            self.indent = config;
            self.cache.get_mut().take();
        }
    }

    fn fold_classifier(&self) -> Box<dyn FoldClassifier> {
        Box::new(HeuristicClassifier::from_comments(
            &self.language.comments,
            self.language.import_prefixes.clone(),
        ))
    }
}
