//! Content-type engines.
//!
//! A [`ContentEngine`] supplies everything the document engine does not compute itself:
//! per-character syntax attributes, fold ranges, line visibility and structural indentation.
//! Engines are created per document by a [`ModeRegistry`] and live on the runtime thread, so
//! they need not be `Send`.

use crate::buffer::TextBuffer;
use crate::config::IndentConfig;
use crate::folding::{FoldClassifier, HeuristicClassifier};
use crate::indent::measure_indentation;
use crate::position::{Position, Range};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Opaque attribute identifier. Names are resolved with [`ContentEngine::attribute_name`].
pub type AttributeId = u32;

/// Name of the plain-text mode every registry provides.
pub const NORMAL_MODE: &str = "Normal";

/// Capability provider for one content type (mode).
pub trait ContentEngine {
    /// The attribute active at `pos`, if any.
    fn attribute_at(&self, buffer: &TextBuffer, pos: Position) -> Option<AttributeId>;

    /// Human-readable name of an attribute (used as the token type).
    fn attribute_name(&self, id: AttributeId) -> Option<&str>;

    /// Attributes for the first `columns` characters of `line`.
    ///
    /// The default asks [`attribute_at`](Self::attribute_at) column by column; engines that
    /// highlight whole lines at once should override it.
    fn line_attributes(
        &self,
        buffer: &TextBuffer,
        line: usize,
        columns: usize,
    ) -> Vec<Option<AttributeId>> {
        (0..columns)
            .map(|column| self.attribute_at(buffer, Position::new(line, column)))
            .collect()
    }

    /// The fold range at `pos`.
    ///
    /// A region that starts on `pos.line` is preferred; otherwise the innermost region
    /// containing the line may be returned.
    fn folding_region_at(&self, _buffer: &TextBuffer, _pos: Position) -> Option<Range> {
        None
    }

    /// Whether `line` is currently visible (not hidden inside a collapsed fold).
    fn is_line_visible(&self, buffer: &TextBuffer, line: usize) -> bool {
        line < buffer.line_count()
    }

    /// Desired indentation width of `line`, or `None` to leave it untouched.
    ///
    /// The default copies the indentation of the nearest non-blank line above.
    fn structural_indent(
        &self,
        buffer: &TextBuffer,
        line: usize,
        config: &IndentConfig,
    ) -> Option<usize> {
        if line >= buffer.line_count() {
            return None;
        }
        let previous = (0..line).rev().find_map(|candidate| {
            let text = buffer.get_line(candidate).ok()?;
            (!text.trim().is_empty()).then_some(text)
        });
        Some(
            previous
                .map(|text| measure_indentation(&text, config.tab_width))
                .unwrap_or(0),
        )
    }

    /// Planned widths for `start..=end`, indexed from `start`, computed against the buffer as
    /// it is now.
    ///
    /// Return `None` (the default) when a line's width depends on the re-indented lines above
    /// it; callers then ask [`structural_indent`](Self::structural_indent) line by line.
    fn structural_indent_range(
        &self,
        _buffer: &TextBuffer,
        _start: usize,
        _end: usize,
        _config: &IndentConfig,
    ) -> Option<Vec<Option<usize>>> {
        None
    }

    /// Called with the document's indentation widths when the engine is attached.
    fn configure_indent(&mut self, _config: IndentConfig) {}

    /// Classifier used to label fold regions found in documents of this mode.
    fn fold_classifier(&self) -> Box<dyn FoldClassifier> {
        Box::new(HeuristicClassifier::default())
    }
}

/// Plain text: no attributes, no folds.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextEngine;

impl ContentEngine for PlainTextEngine {
    fn attribute_at(&self, _buffer: &TextBuffer, _pos: Position) -> Option<AttributeId> {
        None
    }

    fn attribute_name(&self, _id: AttributeId) -> Option<&str> {
        None
    }

    fn line_attributes(
        &self,
        _buffer: &TextBuffer,
        _line: usize,
        columns: usize,
    ) -> Vec<Option<AttributeId>> {
        vec![None; columns]
    }
}

/// Factory producing a fresh engine for one document.
pub type EngineFactory = Box<dyn Fn() -> Box<dyn ContentEngine>>;

struct ModeEntry {
    extensions: Vec<String>,
    factory: EngineFactory,
}

/// Registry of the modes a runtime knows about.
///
/// A new registry already contains [`NORMAL_MODE`].
pub struct ModeRegistry {
    modes: BTreeMap<String, ModeEntry>,
}

impl ModeRegistry {
    /// Create a registry holding only the plain-text mode.
    pub fn new() -> Self {
        let mut registry = Self {
            modes: BTreeMap::new(),
        };
        registry.register(NORMAL_MODE, ["txt"], || Box::new(PlainTextEngine));
        registry
    }

    /// Register (or replace) a mode.
    ///
    /// `extensions` are matched case-insensitively and without the leading dot.
    pub fn register<I, S, F>(&mut self, name: impl Into<String>, extensions: I, factory: F)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn() -> Box<dyn ContentEngine> + 'static,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self.modes.insert(
            name.into(),
            ModeEntry {
                extensions,
                factory: Box::new(factory),
            },
        );
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.modes.contains_key(name)
    }

    /// Names of all registered modes, sorted.
    pub fn available_modes(&self) -> Vec<String> {
        self.modes.keys().cloned().collect()
    }

    /// Instantiate the engine for `name`.
    pub fn create(&self, name: &str) -> Option<Box<dyn ContentEngine>> {
        self.modes.get(name).map(|entry| (entry.factory)())
    }

    /// The mode registered for `path`'s extension.
    pub fn mode_for_path(&self, path: &Path) -> Option<&str> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.modes
            .iter()
            .find(|(_, entry)| entry.extensions.iter().any(|e| *e == ext))
            .map(|(name, _)| name.as_str())
    }
}

impl Default for ModeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ModeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeRegistry")
            .field("modes", &self.modes.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_starts_with_normal_mode() {
        let registry = ModeRegistry::new();
        assert_eq!(registry.available_modes(), vec![NORMAL_MODE.to_string()]);
        assert!(registry.create(NORMAL_MODE).is_some());
        assert!(registry.create("Missing").is_none());
    }

    #[test]
    fn test_mode_for_path_matches_extension_case_insensitively() {
        let mut registry = ModeRegistry::new();
        registry.register("Rust", [".rs"], || Box::new(PlainTextEngine));

        assert_eq!(registry.mode_for_path(Path::new("src/lib.RS")), Some("Rust"));
        assert_eq!(registry.mode_for_path(Path::new("notes.txt")), Some(NORMAL_MODE));
        assert_eq!(registry.mode_for_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_default_structural_indent_copies_previous_non_blank_line() {
        let buffer = TextBuffer::from_text("    a\n\n\tb\nc");
        let engine = PlainTextEngine;
        let config = IndentConfig::default();

        assert_eq!(engine.structural_indent(&buffer, 0, &config), Some(0));
        assert_eq!(engine.structural_indent(&buffer, 2, &config), Some(4));
        assert_eq!(engine.structural_indent(&buffer, 3, &config), Some(4));
        assert_eq!(engine.structural_indent(&buffer, 9, &config), None);
    }
}
