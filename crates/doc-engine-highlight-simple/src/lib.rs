#![warn(missing_docs)]
//! `doc-engine-highlight-simple` - Simple (lexer + regex) content engines for `doc-engine`.
//!
//! This crate covers common languages well enough for tokens, folds and indentation without a
//! real parser: comments, strings, numbers, keywords and literal words are recognized by a
//! small lexer configured from [`doc_engine_lang::LanguageMode`]; line-local regex rules add
//! format-specific attributes (INI sections and keys).
//!
//! ```
//! use doc_engine::{Document, EngineConfig, RuntimeBridge};
//!
//! let bridge = RuntimeBridge::with_modes(EngineConfig::default(), || {
//!     Ok(doc_engine_highlight_simple::builtin_registry()?)
//! });
//! bridge.initialize().unwrap();
//!
//! let doc = Document::with_mode(&bridge, "Rust").unwrap();
//! doc.set_text("fn main() {}").unwrap();
//! let tokens = doc.get_syntax_tokens(0, 0).unwrap();
//! assert_eq!(tokens[0].token_type, "Keyword");
//! ```

mod engine;
mod lexer;
mod rules;

pub use engine::HighlightEngine;
pub use rules::{RegexRule, ini_rules};

use doc_engine::{AttributeId, ContentEngine, ModeRegistry};
use doc_engine_lang::{LanguageMode, builtin_modes};

/// Attribute ids reported by [`HighlightEngine`].
///
/// These are only identifiers. A theme layer is expected to map them to actual colors.
pub const ATTR_KEYWORD: AttributeId = 1;
/// String literal.
pub const ATTR_STRING: AttributeId = 2;
/// Comment.
pub const ATTR_COMMENT: AttributeId = 3;
/// Numeric literal.
pub const ATTR_NUMBER: AttributeId = 4;
/// Preprocessor directive.
pub const ATTR_PREPROCESSOR: AttributeId = 5;
/// INI section name.
pub const ATTR_SECTION: AttributeId = 6;
/// INI key.
pub const ATTR_KEY: AttributeId = 7;
/// Boolean literal.
pub const ATTR_BOOLEAN: AttributeId = 8;
/// Null literal.
pub const ATTR_NULL: AttributeId = 9;

/// Name reported as the token type for `id`.
pub fn attribute_name(id: AttributeId) -> Option<&'static str> {
    let name = match id {
        ATTR_KEYWORD => "Keyword",
        ATTR_STRING => "String",
        ATTR_COMMENT => "Comment",
        ATTR_NUMBER => "Number",
        ATTR_PREPROCESSOR => "Preprocessor",
        ATTR_SECTION => "Section",
        ATTR_KEY => "Key",
        ATTR_BOOLEAN => "Boolean",
        ATTR_NULL => "Null",
        _ => return None,
    };
    Some(name)
}

/// Extra regex rules for a built-in language.
fn rules_for(language: &LanguageMode) -> Result<Vec<RegexRule>, regex::Error> {
    match language.name.as_str() {
        "INI" => ini_rules(),
        _ => Ok(Vec::new()),
    }
}

/// Register `language` (with `rules`) in `registry`.
pub fn register_language(
    registry: &mut ModeRegistry,
    language: LanguageMode,
    rules: Vec<RegexRule>,
) {
    let name = language.name.clone();
    let extensions = language.extensions.clone();
    registry.register(name, extensions, move || {
        Box::new(HighlightEngine::new(language.clone(), rules.clone())) as Box<dyn ContentEngine>
    });
}

/// A registry with plain text plus every built-in language.
pub fn builtin_registry() -> Result<ModeRegistry, regex::Error> {
    let mut registry = ModeRegistry::new();
    for language in builtin_modes() {
        let rules = rules_for(&language)?;
        register_language(&mut registry, language, rules);
    }
    tracing::debug!(modes = ?registry.available_modes(), "built-in modes registered");
    Ok(registry)
}
