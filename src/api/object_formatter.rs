use std::fmt::Write as _;

use serde_json::{Map, Value};

use crate::script::is_identifier_name;

const INDENT: &str = "  ";
const INLINE_SCALAR_LIMIT: usize = 5;

/// Renders an option object as editable `option = { ... };` source text.
///
/// Two-space indentation, single-quoted strings, bare keys where the key is an
/// identifier. Arrays of at most five scalars stay on one line.
#[must_use]
pub fn serialize_option(option: &Map<String, Value>) -> String {
    let mut out = String::from("option = ");
    write_object(&mut out, option, 0);
    out.push_str(";\n");
    out
}

/// Renders any JSON value as a source-text literal in the same layout.
#[must_use]
pub fn format_literal(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

fn write_value(out: &mut String, value: &Value, level: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => {
            let _ = write!(out, "{n}");
        }
        Value::String(s) => write_string(out, s),
        Value::Array(items) => write_array(out, items, level),
        Value::Object(map) => write_object(out, map, level),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn write_array(out: &mut String, items: &[Value], level: usize) {
    if items.is_empty() {
        out.push_str("[]");
        return;
    }
    if items.len() <= INLINE_SCALAR_LIMIT && items.iter().all(is_scalar) {
        out.push('[');
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                out.push_str(", ");
            }
            write_value(out, item, level);
        }
        out.push(']');
        return;
    }
    out.push_str("[\n");
    for (index, item) in items.iter().enumerate() {
        push_indent(out, level + 1);
        write_value(out, item, level + 1);
        if index + 1 < items.len() {
            out.push(',');
        }
        out.push('\n');
    }
    push_indent(out, level);
    out.push(']');
}

fn write_object(out: &mut String, map: &Map<String, Value>, level: usize) {
    if map.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{\n");
    for (index, (key, value)) in map.iter().enumerate() {
        push_indent(out, level + 1);
        write_key(out, key);
        out.push_str(": ");
        write_value(out, value, level + 1);
        if index + 1 < map.len() {
            out.push(',');
        }
        out.push('\n');
    }
    push_indent(out, level);
    out.push('}');
}

fn write_key(out: &mut String, key: &str) {
    if is_identifier_name(key) {
        out.push_str(key);
    } else {
        write_string(out, key);
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('\'');
}

fn push_indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::format_literal;

    #[test]
    fn strings_escape_quotes_and_newlines() {
        assert_eq!(format_literal(&json!("it's\na")), "'it\\'s\\na'");
    }

    #[test]
    fn non_identifier_keys_are_quoted() {
        assert_eq!(
            format_literal(&json!({ "font-size": 12 })),
            "{\n  'font-size': 12\n}"
        );
    }
}
