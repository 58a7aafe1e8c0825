//! Documents: one text buffer plus its content engine, owned by the runtime thread.
//!
//! [`Document`] is the host-side handle. Every method forwards to the runtime and blocks until
//! the runtime answers, so a handle can be used from any thread. Strict operations report
//! [`UsageError`]s; indentation operations ignore out-of-range lines.

use crate::buffer::TextBuffer;
use crate::config::{EngineConfig, IndentConfig};
use crate::engine::{ContentEngine, ModeRegistry, NORMAL_MODE};
use crate::error::{EngineError, IoFailure, UsageError};
use crate::folding::{FoldRegion, FoldScanner};
use crate::indent::IndentManager;
use crate::line_ending::LineEnding;
use crate::position::{Position, Range};
use crate::runtime::{DocumentId, RuntimeBridge, RuntimeEvent, RuntimeHandle};
use crate::search::{self, SearchMatch, SearchOptions};
use crate::tokenizer::{Token, Tokenizer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Runtime-owned services a document operation may need.
pub(crate) struct DocumentEnv<'a> {
    pub(crate) modes: &'a ModeRegistry,
    pub(crate) config: &'a EngineConfig,
}

/// A document as it lives on the runtime thread.
pub(crate) struct DocumentState {
    buffer: TextBuffer,
    mode: String,
    engine: Box<dyn ContentEngine>,
    indent: IndentConfig,
    url: Option<PathBuf>,
    line_ending: LineEnding,
}

impl DocumentState {
    pub(crate) fn new(
        mode: &str,
        mut engine: Box<dyn ContentEngine>,
        config: &EngineConfig,
    ) -> Self {
        engine.configure_indent(config.indent);
        Self {
            buffer: TextBuffer::with_max_undo("", config.history.max_undo),
            mode: mode.to_string(),
            engine,
            indent: config.indent,
            url: None,
            line_ending: LineEnding::default(),
        }
    }

    fn set_mode(&mut self, name: &str, modes: &ModeRegistry) -> Result<(), UsageError> {
        if name == self.mode {
            return Ok(());
        }
        let Some(mut engine) = modes.create(name) else {
            tracing::warn!(mode = name, "unknown mode");
            return Err(UsageError::UnknownMode(name.to_string()));
        };
        engine.configure_indent(self.indent);
        tracing::debug!(from = %self.mode, to = name, "mode changed");
        self.engine = engine;
        self.mode = name.to_string();
        Ok(())
    }

    fn open(&mut self, path: &Path, modes: &ModeRegistry) -> Result<(), IoFailure> {
        let bytes = fs::read(path).map_err(|err| {
            tracing::warn!(path = %path.display(), error = %err, "open failed");
            IoFailure::new(path, err)
        })?;
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes.as_slice());
        let text = std::str::from_utf8(bytes).map_err(|err| {
            tracing::warn!(path = %path.display(), error = %err, "file is not valid UTF-8");
            IoFailure::encoding(path, err)
        })?;

        self.line_ending = LineEnding::detect_in_text(text);
        self.buffer.set_text(text);
        self.buffer.mark_clean();
        self.url = Some(path.to_path_buf());

        if let Some(mode) = modes.mode_for_path(path) {
            let mode = mode.to_string();
            if let Err(err) = self.set_mode(&mode, modes) {
                tracing::warn!(error = %err, "mode detection failed");
            }
        }
        tracing::info!(
            path = %path.display(),
            lines = self.buffer.line_count(),
            mode = %self.mode,
            line_ending = ?self.line_ending,
            "document opened"
        );
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<(), IoFailure> {
        let text = self.buffer.get_text();
        let text = self.line_ending.apply_to_text(&text);
        fs::write(path, text.as_bytes()).map_err(|err| {
            tracing::warn!(path = %path.display(), error = %err, "save failed");
            IoFailure::new(path, err)
        })?;
        self.buffer.mark_clean();
        self.url = Some(path.to_path_buf());
        tracing::info!(path = %path.display(), "document saved");
        Ok(())
    }
}

/// Host-side handle to a document living in a running [`RuntimeBridge`].
///
/// Dropping the handle releases the document on the runtime's next tick.
pub struct Document {
    runtime: Arc<RuntimeHandle>,
    id: DocumentId,
}

impl Document {
    /// Create an empty plain-text document.
    ///
    /// Fails with [`EngineError::NotInitialized`] unless the bridge is running.
    pub fn new(bridge: &RuntimeBridge) -> Result<Self, EngineError> {
        Self::with_mode(bridge, NORMAL_MODE)
    }

    /// Create an empty document using the named mode.
    pub fn with_mode(bridge: &RuntimeBridge, mode: &str) -> Result<Self, EngineError> {
        let runtime = bridge.handle()?;
        let mode = mode.to_string();
        let id = runtime.call(move |app| app.create_document(&mode))??;
        Ok(Self { runtime, id })
    }

    fn with_state<R, F>(&self, f: F) -> Result<R, EngineError>
    where
        F: FnOnce(&mut DocumentState, DocumentEnv<'_>) -> R + Send + 'static,
        R: Send + 'static,
    {
        let id = self.id;
        let result = self.runtime.call(move |app| {
            let (state, env) = app.document(id)?;
            Ok::<R, UsageError>(f(state, env))
        })?;
        Ok(result?)
    }

    fn with_buffer<R, F>(&self, f: F) -> Result<R, EngineError>
    where
        F: FnOnce(&mut TextBuffer) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.with_state(move |state, _| f(&mut state.buffer))
    }

    /// The whole content, lines joined with `'\n'`.
    pub fn get_text(&self) -> Result<String, EngineError> {
        self.with_buffer(|buffer| buffer.get_text())
    }

    /// Replace the whole content (one undo step).
    pub fn set_text(&self, text: &str) -> Result<(), EngineError> {
        let text = text.to_string();
        self.with_buffer(move |buffer| buffer.set_text(&text))
    }

    /// Text of `line` without its separator.
    pub fn get_line(&self, line: usize) -> Result<String, EngineError> {
        Ok(self.with_buffer(move |buffer| buffer.get_line(line))??)
    }

    /// Insert `text` at `pos`.
    pub fn insert_text(&self, pos: Position, text: &str) -> Result<(), EngineError> {
        let text = text.to_string();
        Ok(self.with_buffer(move |buffer| buffer.insert_text(pos, &text))??)
    }

    /// Remove the text covered by `range`, returning it.
    pub fn remove_text(&self, range: Range) -> Result<String, EngineError> {
        Ok(self.with_buffer(move |buffer| buffer.remove_text(range))??)
    }

    /// Replace the text covered by `range`.
    ///
    /// Returns `Ok(false)` without mutating if `range` is not valid for the document.
    pub fn replace_text(&self, range: Range, text: &str) -> Result<bool, EngineError> {
        let text = text.to_string();
        self.with_buffer(move |buffer| buffer.replace_text(range, &text).is_ok())
    }

    /// Number of lines (at least 1).
    pub fn line_count(&self) -> Result<usize, EngineError> {
        self.with_buffer(|buffer| buffer.line_count())
    }

    /// Number of characters, line separators included.
    pub fn length(&self) -> Result<usize, EngineError> {
        self.with_buffer(|buffer| buffer.length())
    }

    /// Whether the content differs from the last open/save point.
    pub fn is_modified(&self) -> Result<bool, EngineError> {
        self.with_buffer(|buffer| buffer.is_modified())
    }

    /// Undo the most recent step. Returns `false` if there was nothing to undo.
    pub fn undo(&self) -> Result<bool, EngineError> {
        self.with_buffer(|buffer| buffer.undo())
    }

    /// Redo the most recently undone step.
    pub fn redo(&self) -> Result<bool, EngineError> {
        self.with_buffer(|buffer| buffer.redo())
    }

    /// Whether [`undo`](Self::undo) would do anything.
    pub fn can_undo(&self) -> Result<bool, EngineError> {
        self.with_buffer(|buffer| buffer.can_undo())
    }

    /// Whether [`redo`](Self::redo) would do anything.
    pub fn can_redo(&self) -> Result<bool, EngineError> {
        self.with_buffer(|buffer| buffer.can_redo())
    }

    /// The current mode name.
    pub fn mode(&self) -> Result<String, EngineError> {
        self.with_state(|state, _| state.mode.clone())
    }

    /// Switch the content engine. Tokens and folds are computed lazily on the next query.
    pub fn set_mode(&self, name: &str) -> Result<(), EngineError> {
        let name = name.to_string();
        Ok(self.with_state(move |state, env| state.set_mode(&name, env.modes))??)
    }

    /// Mode names the runtime knows.
    pub fn available_modes(&self) -> Result<Vec<String>, EngineError> {
        self.with_state(|_, env| env.modes.available_modes())
    }

    /// Load `path` into the document.
    ///
    /// The load is one undo step and becomes the clean point. A leading UTF-8 BOM is dropped,
    /// CRLF files are normalized and remembered for saving, and the mode registered for the
    /// file extension is selected.
    pub fn open_url(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let path = path.as_ref().to_path_buf();
        Ok(self.with_state(move |state, env| state.open(&path, env.modes))??)
    }

    /// Write the document to `path` and make it the document's url.
    pub fn save_url(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let path = path.as_ref().to_path_buf();
        Ok(self.with_state(move |state, _| state.save(&path))??)
    }

    /// Write the document back to its url.
    pub fn save(&self) -> Result<(), EngineError> {
        self.with_state(|state, _| match state.url.clone() {
            Some(path) => state.save(&path).map_err(EngineError::from),
            None => Err(UsageError::NoUrl.into()),
        })?
    }

    /// The path last opened or saved.
    pub fn url(&self) -> Result<Option<PathBuf>, EngineError> {
        self.with_state(|state, _| state.url.clone())
    }

    /// Syntax tokens for lines `line_start..=line_end`.
    pub fn get_syntax_tokens(
        &self,
        line_start: usize,
        line_end: usize,
    ) -> Result<Vec<Token>, EngineError> {
        self.with_state(move |state, env| {
            Tokenizer::new(env.config.tokenizer).tokenize(
                &state.buffer,
                state.engine.as_ref(),
                line_start,
                line_end,
            )
        })
    }

    /// Fold regions in document order.
    pub fn get_folding_regions(&self) -> Result<Vec<FoldRegion>, EngineError> {
        self.with_state(|state, env| {
            let classifier = state.engine.fold_classifier();
            FoldScanner::new(env.config.folding).scan(
                &state.buffer,
                state.engine.as_ref(),
                classifier.as_ref(),
            )
        })
    }

    /// All matches of `pattern`.
    pub fn search(
        &self,
        pattern: &str,
        options: SearchOptions,
    ) -> Result<Vec<SearchMatch>, EngineError> {
        let pattern = pattern.to_string();
        Ok(self.with_buffer(move |buffer| search::search(buffer, &pattern, options))??)
    }

    /// Replace `length` characters at `(line, column)`. `Ok(false)` if the span is out of bounds.
    pub fn replace(
        &self,
        line: usize,
        column: usize,
        length: usize,
        replacement: &str,
    ) -> Result<bool, EngineError> {
        let replacement = replacement.to_string();
        self.with_buffer(move |buffer| {
            search::replace(buffer, line, column, length, &replacement)
        })
    }

    /// Replace every match of `pattern`; returns the number of replacements.
    pub fn replace_all(
        &self,
        pattern: &str,
        replacement: &str,
        options: SearchOptions,
    ) -> Result<usize, EngineError> {
        let pattern = pattern.to_string();
        let replacement = replacement.to_string();
        Ok(self.with_buffer(move |buffer| {
            search::replace_all(buffer, &pattern, &replacement, options)
        })??)
    }

    /// Leading whitespace width of `line` (0 for a missing line).
    pub fn get_indentation(&self, line: usize) -> Result<usize, EngineError> {
        self.with_state(move |state, env| {
            IndentManager::new(env.config.indent).get_indentation(&state.buffer, line)
        })
    }

    /// Set the leading whitespace of `line` to `width` spaces. Returns whether it changed.
    pub fn set_indentation(&self, line: usize, width: usize) -> Result<bool, EngineError> {
        self.with_state(move |state, env| {
            IndentManager::new(env.config.indent).set_indentation(&mut state.buffer, line, width)
        })
    }

    /// Re-indent `line` with the mode's structural rules.
    pub fn indent_line(&self, line: usize) -> Result<bool, EngineError> {
        self.indent_lines(line, line)
    }

    /// Re-indent `start..=end` with the mode's structural rules (one undo step).
    pub fn indent_lines(&self, start: usize, end: usize) -> Result<bool, EngineError> {
        self.with_state(move |state, env| {
            IndentManager::new(env.config.indent).indent_lines(
                &mut state.buffer,
                state.engine.as_ref(),
                start,
                end,
            )
        })
    }

    /// Shift `start..=end` by whole indent levels (one undo step).
    pub fn shift_indentation(
        &self,
        start: usize,
        end: usize,
        levels: isize,
    ) -> Result<bool, EngineError> {
        self.with_state(move |state, env| {
            IndentManager::new(env.config.indent).shift_indentation(
                &mut state.buffer,
                start,
                end,
                levels,
            )
        })
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        self.runtime.post(RuntimeEvent::ReleaseDocument(self.id));
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document").field("id", &self.id).finish()
    }
}
