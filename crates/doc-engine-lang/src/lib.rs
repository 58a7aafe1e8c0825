#![warn(missing_docs)]
//! `doc-engine-lang` - data-driven language descriptions for `doc-engine`.
//!
//! This crate intentionally stays lightweight and does **not** depend on any parsing or
//! highlighting system. It provides small structs that content engines use to behave in a
//! language-aware way: comment tokens, keywords, literal words, bracket pairs, import prefixes,
//! file extensions and the indentation style.

/// Comment tokens/config for a given language.
///
/// Fold classification uses these as comment markers; lexers use them to find comments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentConfig {
    /// Line comment token (e.g. `//`, `#`).
    pub line: Option<String>,
    /// Block comment start token (e.g. `/*`).
    pub block_start: Option<String>,
    /// Block comment end token (e.g. `*/`).
    pub block_end: Option<String>,
}

impl CommentConfig {
    /// Create a config that supports only line comments.
    pub fn line(token: impl Into<String>) -> Self {
        Self {
            line: Some(token.into()),
            block_start: None,
            block_end: None,
        }
    }

    /// Create a config that supports only block comments.
    pub fn block(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            line: None,
            block_start: Some(start.into()),
            block_end: Some(end.into()),
        }
    }

    /// Create a config that supports both line and block comments.
    pub fn line_and_block(
        line: impl Into<String>,
        block_start: impl Into<String>,
        block_end: impl Into<String>,
    ) -> Self {
        Self {
            line: Some(line.into()),
            block_start: Some(block_start.into()),
            block_end: Some(block_end.into()),
        }
    }

    /// Returns `true` if a line comment token is configured.
    pub fn has_line(&self) -> bool {
        self.line.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Returns `true` if both block comment tokens are configured.
    pub fn has_block(&self) -> bool {
        self.block_start.as_deref().is_some_and(|s| !s.is_empty())
            && self.block_end.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// How structural indentation is derived for a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndentStyle {
    /// One level per unclosed bracket line (C family, JSON).
    #[default]
    Brackets,
    /// Blocks are introduced by a trailing `:` and delimited by indentation (Python).
    Offside,
    /// Every line sits at column 0 (INI).
    Flat,
}

/// Description of one language mode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LanguageMode {
    /// Mode name as listed by the mode registry (e.g. `"Rust"`).
    pub name: String,
    /// File extensions without the leading dot.
    pub extensions: Vec<String>,
    /// Comment tokens.
    pub comments: CommentConfig,
    /// Characters that open and close single-line string literals.
    pub string_delimiters: Vec<char>,
    /// Reserved words.
    pub keywords: Vec<String>,
    /// Boolean literal words.
    pub booleans: Vec<String>,
    /// Null-like literal words.
    pub null_literals: Vec<String>,
    /// Line prefixes (after leading whitespace) that mark import/include statements.
    pub import_prefixes: Vec<String>,
    /// A line whose first non-blank text starts with this is a preprocessor directive.
    pub preprocessor_prefix: Option<String>,
    /// Bracket pairs used for folding and indentation.
    pub brackets: Vec<(char, char)>,
    /// Indentation style.
    pub indent_style: IndentStyle,
}

impl LanguageMode {
    /// Create an empty description named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns `true` if `word` is a keyword of this language.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.iter().any(|k| k == word)
    }

    /// The closing bracket for `open`, if `open` is an opening bracket.
    pub fn closing_bracket(&self, open: char) -> Option<char> {
        self.brackets
            .iter()
            .find(|(o, _)| *o == open)
            .map(|(_, c)| *c)
    }

    /// Returns `true` if `ch` closes one of the bracket pairs.
    pub fn is_closing_bracket(&self, ch: char) -> bool {
        self.brackets.iter().any(|(_, c)| *c == ch)
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

const C_BRACKETS: [(char, char); 3] = [('{', '}'), ('(', ')'), ('[', ']')];

const C_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while",
];

const CPP_EXTRA_KEYWORDS: &[&str] = &[
    "catch", "class", "constexpr", "delete", "explicit", "friend", "mutable", "namespace", "new",
    "noexcept", "operator", "override", "private", "protected", "public", "template", "this",
    "throw", "try", "typename", "using", "virtual",
];

const JS_KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "default",
    "delete", "do", "else", "export", "extends", "finally", "for", "from", "function", "if",
    "import", "in", "instanceof", "let", "new", "of", "return", "static", "super", "switch",
    "this", "throw", "try", "typeof", "var", "void", "while", "yield",
];

const TS_EXTRA_KEYWORDS: &[&str] = &[
    "abstract", "as", "declare", "enum", "implements", "interface", "keyof", "namespace",
    "private", "protected", "public", "readonly", "type",
];

/// Rust.
pub fn rust() -> LanguageMode {
    LanguageMode {
        extensions: words(&["rs"]),
        comments: CommentConfig::line_and_block("//", "/*", "*/"),
        string_delimiters: vec!['"'],
        keywords: words(&[
            "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
            "extern", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
            "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait",
            "type", "unsafe", "use", "where", "while",
        ]),
        booleans: words(&["true", "false"]),
        import_prefixes: words(&["use ", "extern crate "]),
        brackets: C_BRACKETS.to_vec(),
        ..LanguageMode::new("Rust")
    }
}

/// C.
pub fn c() -> LanguageMode {
    LanguageMode {
        extensions: words(&["c", "h"]),
        comments: CommentConfig::line_and_block("//", "/*", "*/"),
        string_delimiters: vec!['"', '\''],
        keywords: words(C_KEYWORDS),
        booleans: words(&["true", "false"]),
        null_literals: words(&["NULL"]),
        import_prefixes: words(&["#include"]),
        preprocessor_prefix: Some("#".to_string()),
        brackets: C_BRACKETS.to_vec(),
        ..LanguageMode::new("C")
    }
}

/// C++.
pub fn cpp() -> LanguageMode {
    let mut mode = c();
    mode.name = "C++".to_string();
    mode.extensions = words(&["cpp", "cc", "cxx", "hpp", "hh", "hxx"]);
    mode.keywords.extend(words(CPP_EXTRA_KEYWORDS));
    mode.null_literals.push("nullptr".to_string());
    mode
}

/// JavaScript.
pub fn javascript() -> LanguageMode {
    LanguageMode {
        extensions: words(&["js", "mjs", "cjs", "jsx"]),
        comments: CommentConfig::line_and_block("//", "/*", "*/"),
        string_delimiters: vec!['"', '\'', '`'],
        keywords: words(JS_KEYWORDS),
        booleans: words(&["true", "false"]),
        null_literals: words(&["null", "undefined"]),
        import_prefixes: words(&["import "]),
        brackets: C_BRACKETS.to_vec(),
        ..LanguageMode::new("JavaScript")
    }
}

/// TypeScript.
pub fn typescript() -> LanguageMode {
    let mut mode = javascript();
    mode.name = "TypeScript".to_string();
    mode.extensions = words(&["ts", "mts", "cts", "tsx"]);
    mode.keywords.extend(words(TS_EXTRA_KEYWORDS));
    mode
}

/// Python.
pub fn python() -> LanguageMode {
    LanguageMode {
        extensions: words(&["py", "pyi"]),
        comments: CommentConfig::line("#"),
        string_delimiters: vec!['"', '\''],
        keywords: words(&[
            "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del",
            "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in",
            "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while",
            "with", "yield",
        ]),
        booleans: words(&["True", "False"]),
        null_literals: words(&["None"]),
        import_prefixes: words(&["import ", "from "]),
        brackets: C_BRACKETS.to_vec(),
        indent_style: IndentStyle::Offside,
        ..LanguageMode::new("Python")
    }
}

/// JSON.
pub fn json() -> LanguageMode {
    LanguageMode {
        extensions: words(&["json"]),
        string_delimiters: vec!['"'],
        booleans: words(&["true", "false"]),
        null_literals: words(&["null"]),
        brackets: vec![('{', '}'), ('[', ']')],
        ..LanguageMode::new("JSON")
    }
}

/// INI.
pub fn ini() -> LanguageMode {
    LanguageMode {
        extensions: words(&["ini", "cfg", "conf"]),
        comments: CommentConfig::line(";"),
        indent_style: IndentStyle::Flat,
        ..LanguageMode::new("INI")
    }
}

/// Every built-in language description.
pub fn builtin_modes() -> Vec<LanguageMode> {
    vec![
        rust(),
        c(),
        cpp(),
        javascript(),
        typescript(),
        python(),
        json(),
        ini(),
    ]
}
