use doc_engine::{Document, EngineConfig, FoldKind, FoldRegion, RuntimeBridge};
use doc_engine_highlight_simple::builtin_registry;
use pretty_assertions::assert_eq;
use std::fs;

fn bridge() -> RuntimeBridge {
    let bridge = RuntimeBridge::with_modes(EngineConfig::default(), || Ok(builtin_registry()?));
    bridge.initialize().unwrap();
    bridge
}

fn token_types(doc: &Document, line: usize) -> Vec<(usize, usize, String)> {
    doc.get_syntax_tokens(line, line)
        .unwrap()
        .into_iter()
        .map(|t| (t.start_column, t.end_column, t.token_type))
        .collect()
}

#[test]
fn test_open_detects_mode_and_highlights() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.c");
    fs::write(&path, "#include <stdio.h>\nint x = 42; // answer\n").unwrap();

    let bridge = bridge();
    let doc = Document::new(&bridge).unwrap();
    doc.open_url(&path).unwrap();
    assert_eq!(doc.mode().unwrap(), "C");

    assert_eq!(token_types(&doc, 0), vec![(0, 18, "Preprocessor".to_string())]);
    assert_eq!(
        token_types(&doc, 1),
        vec![
            (0, 3, "Keyword".to_string()),
            (3, 8, "text".to_string()),
            (8, 10, "Number".to_string()),
            (10, 12, "text".to_string()),
            (12, 21, "Comment".to_string()),
        ]
    );
}

#[test]
fn test_folding_regions_are_classified() {
    let bridge = bridge();
    let doc = Document::with_mode(&bridge, "Rust").unwrap();
    doc.set_text(
        "use std::fmt;\nuse std::io;\n\n/* licence\n   text */\nfn main() {\n    body();\n}\n",
    )
    .unwrap();

    assert_eq!(
        doc.get_folding_regions().unwrap(),
        vec![
            FoldRegion {
                start_line: 0,
                end_line: 1,
                kind: FoldKind::Imports,
            },
            FoldRegion {
                start_line: 3,
                end_line: 4,
                kind: FoldKind::Comment,
            },
            FoldRegion {
                start_line: 5,
                end_line: 7,
                kind: FoldKind::Region,
            },
        ]
    );
}

#[test]
fn test_indent_lines_uses_bracket_depth() {
    let bridge = bridge();
    let doc = Document::with_mode(&bridge, "JavaScript").unwrap();
    doc.set_text("function f() {\nif (x) {\ny();\n}\n}").unwrap();

    assert!(doc.indent_lines(0, 4).unwrap());
    assert_eq!(
        doc.get_text().unwrap(),
        "function f() {\n    if (x) {\n        y();\n    }\n}"
    );

    assert!(doc.undo().unwrap());
    assert_eq!(doc.get_text().unwrap(), "function f() {\nif (x) {\ny();\n}\n}");
}

#[test]
fn test_indent_lines_over_a_large_buffer() {
    let bridge = bridge();
    let doc = Document::with_mode(&bridge, "Rust").unwrap();
    let functions = 1700;
    let flat: String = (0..functions)
        .map(|i| format!("fn f{i}() {{\nx();\n}}\n"))
        .collect();
    doc.set_text(&flat).unwrap();
    let last = doc.line_count().unwrap() - 1;

    assert!(doc.indent_lines(0, last).unwrap());
    let expected: String = (0..functions)
        .map(|i| format!("fn f{i}() {{\n    x();\n}}\n"))
        .collect();
    assert_eq!(doc.get_text().unwrap(), expected);

    assert!(doc.undo().unwrap());
    assert_eq!(doc.get_text().unwrap(), flat);
}

#[test]
fn test_offside_folds_follow_configured_tab_width() {
    let mut config = EngineConfig::default();
    config.indent.tab_width = 8;
    let bridge = RuntimeBridge::with_modes(config, || Ok(builtin_registry()?));
    bridge.initialize().unwrap();
    let doc = Document::with_mode(&bridge, "Python").unwrap();
    doc.set_text("if a:\n\tb\n      c").unwrap();

    assert_eq!(
        doc.get_folding_regions().unwrap(),
        vec![FoldRegion {
            start_line: 0,
            end_line: 2,
            kind: FoldKind::Region,
        }]
    );
}

#[test]
fn test_ini_sections_and_keys() {
    let bridge = bridge();
    let doc = Document::with_mode(&bridge, "INI").unwrap();
    doc.set_text("[core]\nname = doc\n; note").unwrap();

    assert_eq!(
        token_types(&doc, 0),
        vec![
            (0, 1, "text".to_string()),
            (1, 5, "Section".to_string()),
            (5, 6, "text".to_string()),
        ]
    );
    assert_eq!(token_types(&doc, 1)[0], (0, 4, "Key".to_string()));
    assert_eq!(token_types(&doc, 2), vec![(0, 6, "Comment".to_string())]);
}

#[test]
fn test_set_mode_switches_engine() {
    let bridge = bridge();
    let doc = Document::new(&bridge).unwrap();
    doc.set_text("true").unwrap();
    assert_eq!(token_types(&doc, 0), vec![(0, 4, "text".to_string())]);

    doc.set_mode("JSON").unwrap();
    assert_eq!(token_types(&doc, 0), vec![(0, 4, "Boolean".to_string())]);
}
