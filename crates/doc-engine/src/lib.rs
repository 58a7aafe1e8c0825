#![warn(missing_docs)]
//! Doc Engine - Headless Document Engine Behind a Runtime Thread
//!
//! # Overview
//!
//! `doc-engine` is a line-addressed text document engine: a mutable buffer with undo/redo,
//! search and replace, syntax-attribute tokens, fold regions and indentation management. All
//! buffers and their content engines live on one dedicated runtime thread; host threads drive
//! them through [`Document`] handles, and [`RuntimeBridge`] owns the runtime's lifecycle.
//!
//! # Core Features
//!
//! - **Rope Storage**: `ropey` backed buffer, char-based `(line, column)` addressing
//! - **Undo/Redo**: grouped steps with a clean point for the modified flag
//! - **Search**: literal or regex, case and whole-word options, back-to-front replace-all
//! - **Tokens & Folds**: bounded run-length tokenization and fold scanning over a pluggable
//!   [`ContentEngine`]
//! - **Indentation**: measure, set, re-indent and shift leading whitespace
//! - **Runtime Bridge**: actor-style sequencing of every operation on the runtime thread
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Document handles (any host thread)         │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  RuntimeBridge (channel + runtime thread)   │  ← Sequencing
//! ├─────────────────────────────────────────────┤
//! │  Tokenizer / FoldScanner / Search / Indent  │  ← Buffer services
//! ├─────────────────────────────────────────────┤
//! │  ContentEngine + ModeRegistry               │  ← Per-mode rules
//! ├─────────────────────────────────────────────┤
//! │  TextBuffer + EditHistory (Rope-based)      │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use doc_engine::{Document, EngineConfig, Position, RuntimeBridge, SearchOptions};
//!
//! let bridge = RuntimeBridge::new(EngineConfig::default());
//! bridge.initialize().unwrap();
//!
//! let doc = Document::new(&bridge).unwrap();
//! doc.set_text("let a = 1;\nlet b = a;").unwrap();
//! doc.insert_text(Position::new(1, 0), "    ").unwrap();
//!
//! let matches = doc.search("a", SearchOptions::default().with_whole_words()).unwrap();
//! assert_eq!(matches.len(), 2);
//!
//! assert!(doc.undo().unwrap());
//! assert_eq!(doc.get_line(1).unwrap(), "let b = a;");
//!
//! bridge.shutdown();
//! ```
//!
//! Synchronous use without a runtime thread goes through [`TextBuffer`] and the free functions
//! in [`search`] directly.
//!
//! # Module Description
//!
//! - [`buffer`] - Rope-backed text buffer with undo/redo
//! - [`tokenizer`] - Run-length syntax tokens
//! - [`folding`] - Fold-region scan and classification
//! - [`search`] - Search and replace
//! - [`indent`] - Indentation management
//! - [`engine`] - Content-engine trait and mode registry
//! - [`runtime`] - Runtime thread lifecycle
//! - [`document`] - Host-side document handles
//! - [`config`] - Engine configuration
//!
//! # Logging
//!
//! Events are emitted through `tracing`; no subscriber is installed by this crate.

pub mod buffer;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod folding;
mod history;
pub mod indent;
pub mod line_ending;
pub mod position;
pub mod runtime;
pub mod search;
pub mod tokenizer;

pub use buffer::TextBuffer;
pub use config::{
    EngineConfig, FoldingConfig, HistoryConfig, IndentConfig, RuntimeConfig, TokenizerConfig,
};
pub use document::Document;
pub use engine::{
    AttributeId, ContentEngine, EngineFactory, ModeRegistry, NORMAL_MODE, PlainTextEngine,
};
pub use error::{ConfigError, EngineError, IoFailure, IoFailureKind, UsageError};
pub use folding::{FoldClassifier, FoldKind, FoldRegion, FoldScanner, HeuristicClassifier};
pub use indent::{IndentManager, MAX_INDENT_WIDTH, measure_indentation};
pub use line_ending::LineEnding;
pub use position::{Position, Range};
pub use runtime::{AboutData, ModeProvider, RuntimeBridge, RuntimeStats};
pub use search::{SearchMatch, SearchOptions};
pub use tokenizer::{PLAIN_TOKEN_TYPE, Token, Tokenizer};
