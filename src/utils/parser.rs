//! Template text helpers.
//!
//! Used at config load time and when formatting welcome messages:
//! - Escapes: literal `\n` (two characters) becomes a real line break
//! - Overrides: `<group id>: text` records, one group per entry line
//! - Nicknames: placeholder braces are swapped for full-width ones

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

/// Full-width stand-ins for placeholder delimiters.
const FULLWIDTH_OPEN: char = '｛';
const FULLWIDTH_CLOSE: char = '｝';

/// Convert literal `\n` sequences (backslash + `n`) into line breaks.
///
/// Config editors usually cannot enter real newlines in a single-line
/// field, so templates carry the escaped form.
pub fn unescape_newlines(input: &str) -> String {
    input.replace("\\n", "\n")
}

/// Replace `{` and `}` in a nickname with full-width look-alikes.
///
/// A member named `{at}` or `{nickname}` must not be able to inject
/// placeholders into the template.
pub fn sanitize_nickname(nickname: &str) -> String {
    nickname
        .chars()
        .map(|c| match c {
            '{' => FULLWIDTH_OPEN,
            '}' => FULLWIDTH_CLOSE,
            other => other,
        })
        .collect()
}

/// Read a platform identifier given as a JSON number or numeric string.
pub fn id_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Parse per-group template overrides.
///
/// Syntax:
/// - `123456: text` at the very start of a line starts the entry for
///   group 123456
/// - any other line continues the previous entry (blank lines included)
/// - lines before the first entry are dropped with a warning
///
/// The text after the colon loses its leading whitespace, each entry
/// loses trailing whitespace, and literal `\n` escapes are expanded.
pub fn parse_group_templates(input: &str) -> HashMap<i64, String> {
    let mut entries: Vec<(i64, String)> = vec![];

    for (line_no, line) in input.lines().enumerate() {
        if let Some((group_id, rest)) = parse_entry_header(line) {
            entries.push((group_id, rest.trim_start().to_string()));
            continue;
        }

        match entries.last_mut() {
            Some((_, text)) => {
                text.push('\n');
                text.push_str(line);
            }
            None => {
                if !line.trim().is_empty() {
                    warn!(
                        "welcome_messages line {} has no group id prefix and no entry to continue, dropped: {:?}",
                        line_no + 1,
                        line
                    );
                }
            }
        }
    }

    let mut templates = HashMap::with_capacity(entries.len());
    for (group_id, text) in entries {
        let text = unescape_newlines(text.trim_end());
        if templates.insert(group_id, text).is_some() {
            warn!("welcome_messages defines group {} more than once, last entry wins", group_id);
        }
    }
    templates
}

/// Split `"<digits>:<rest>"` into the group id and the rest.
///
/// The digits must start the line; indented lines are continuations.
fn parse_entry_header(line: &str) -> Option<(i64, &str)> {
    let digits_end = line
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(line.len());

    if digits_end == 0 {
        return None;
    }

    let rest = line[digits_end..].strip_prefix(':')?;
    let group_id = line[..digits_end].parse::<i64>().ok()?;
    Some((group_id, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape_newlines() {
        assert_eq!(unescape_newlines("a\\nb\\n\\nc"), "a\nb\n\nc");
        assert_eq!(unescape_newlines("already\nreal"), "already\nreal");
    }

    #[test]
    fn test_sanitize_nickname() {
        let cleaned = sanitize_nickname("{at}{nickname}");
        assert_eq!(cleaned, "｛at｝｛nickname｝");
        assert!(!cleaned.contains('{'));
        assert!(!cleaned.contains('}'));
        assert_eq!(sanitize_nickname("Bob"), "Bob");
    }

    #[test]
    fn test_parse_group_templates_continuation() {
        let parsed = parse_group_templates("100: Hi\n there\n200: Bye");

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[&100], "Hi\n there");
        assert_eq!(parsed[&200], "Bye");
    }

    #[test]
    fn test_parse_group_templates_keeps_blank_lines() {
        let parsed = parse_group_templates("100: first\n\nthird\n\n");
        assert_eq!(parsed[&100], "first\n\nthird");
    }

    #[test]
    fn test_parse_group_templates_drops_orphan_lines() {
        let parsed = parse_group_templates("orphan text\n300:Hello\\nworld");

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[&300], "Hello\nworld");
    }

    #[test]
    fn test_parse_group_templates_indented_numbers_continue() {
        let parsed = parse_group_templates("100: Rules:\n  1: be nice\n  2: no spam");

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[&100], "Rules:\n  1: be nice\n  2: no spam");
    }

    #[test]
    fn test_parse_group_templates_last_entry_wins() {
        let parsed = parse_group_templates("1: a\n1: b");
        assert_eq!(parsed[&1], "b");
    }

    #[test]
    fn test_id_from_value() {
        assert_eq!(id_from_value(&Value::from(123456)), Some(123456));
        assert_eq!(id_from_value(&Value::from(" 42 ")), Some(42));
        assert_eq!(id_from_value(&Value::from("4x")), None);
        assert_eq!(id_from_value(&Value::from(1.5)), None);
        assert_eq!(id_from_value(&Value::Null), None);
    }

    #[test]
    fn test_entry_header_requires_digits_and_colon() {
        assert_eq!(parse_entry_header("42: x"), Some((42, " x")));
        assert_eq!(parse_entry_header("  42: x"), None);
        assert_eq!(parse_entry_header("42 x"), None);
        assert_eq!(parse_entry_header(": x"), None);
        assert_eq!(parse_entry_header("abc: x"), None);
    }
}
