//! Line-local regex rules layered on top of the lexer.

use doc_engine::AttributeId;
use regex::Regex;

/// A single regex highlighting rule.
#[derive(Debug, Clone)]
pub struct RegexRule {
    regex: Regex,
    attribute: AttributeId,
    capture_group: Option<usize>,
}

impl RegexRule {
    /// Highlight every match of `pattern` with `attribute`.
    pub fn new(pattern: &str, attribute: AttributeId) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            attribute,
            capture_group: None,
        })
    }

    /// Highlight only a capture group of each match.
    ///
    /// Example (INI key):
    /// - pattern: `^\\s*([^=\\s]+)\\s*=`
    /// - capture_group: `1` (the key)
    pub fn with_capture_group(mut self, group: usize) -> Self {
        self.capture_group = Some(group);
        self
    }

    /// The attribute this rule assigns.
    pub fn attribute(&self) -> AttributeId {
        self.attribute
    }

    /// Paint this rule's matches on `line_text` into `attrs` (one slot per char).
    pub(crate) fn apply(&self, line_text: &str, attrs: &mut [Option<AttributeId>]) {
        for caps in self.regex.captures_iter(line_text) {
            let group = self.capture_group.unwrap_or(0);
            let Some(m) = caps.get(group) else {
                continue;
            };
            if let Some((start, end)) = char_span(line_text, m.start(), m.end()) {
                let end = end.min(attrs.len());
                for slot in attrs.iter_mut().take(end).skip(start) {
                    *slot = Some(self.attribute);
                }
            }
        }
    }
}

fn char_span(line_text: &str, start_byte: usize, end_byte: usize) -> Option<(usize, usize)> {
    if start_byte >= end_byte || end_byte > line_text.len() {
        return None;
    }
    let start = line_text[..start_byte].chars().count();
    let end = start + line_text[start_byte..end_byte].chars().count();
    (start < end).then_some((start, end))
}

/// Rules for INI files: section names, keys, and `;`/`#` comment lines.
pub fn ini_rules() -> Result<Vec<RegexRule>, regex::Error> {
    Ok(vec![
        // Section header: [section]
        RegexRule::new(r#"^\s*\[([^\]]+)\]\s*$"#, crate::ATTR_SECTION)?.with_capture_group(1),
        // Key: key = value
        RegexRule::new(r#"^\s*([^=\s]+)\s*="#, crate::ATTR_KEY)?.with_capture_group(1),
        // Comment: ;... or #...
        RegexRule::new(r#"^\s*[;#].*$"#, crate::ATTR_COMMENT)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ATTR_COMMENT, ATTR_KEY, ATTR_SECTION};

    fn paint(rules: &[RegexRule], text: &str) -> Vec<Option<AttributeId>> {
        let mut attrs = vec![None; text.chars().count()];
        for rule in rules {
            rule.apply(text, &mut attrs);
        }
        attrs
    }

    #[test]
    fn test_ini_capture_groups() {
        let rules = ini_rules().unwrap();

        let section = paint(&rules, "[core]");
        assert_eq!(section[0], None);
        assert!(section[1..5].iter().all(|a| *a == Some(ATTR_SECTION)));
        assert_eq!(section[5], None);

        let key = paint(&rules, "name = doc-engine");
        assert!(key[..4].iter().all(|a| *a == Some(ATTR_KEY)));
        assert!(key[4..].iter().all(Option::is_none));

        let comment = paint(&rules, "# note");
        assert!(comment.iter().all(|a| *a == Some(ATTR_COMMENT)));
    }

    #[test]
    fn test_columns_are_chars_not_bytes() {
        let rule = RegexRule::new("值+", 7).unwrap();
        let attrs = paint(&[rule], "a值值b");
        assert_eq!(attrs, vec![None, Some(7), Some(7), None]);
    }
}
