//! Block-style YAML writer for the MapProxy configuration.
//!
//! MapProxy loads its configuration with a YAML 1.1 reader, which turns plain
//! scalars such as `NO`, `on`, `1:50` or `1_000` into booleans and integers.
//! The document is converted to a [`serde_yaml_ng::Value`] and then written
//! here so that every string scalar either reads back as the same string under
//! both YAML 1.1 and 1.2, or is double-quoted.

use crate::utils::error::Result;
use regex::RegexSet;
use serde::Serialize;
use serde_yaml_ng::{Mapping, Value};
use std::sync::OnceLock;

const INDENT: usize = 2;

/// Implicit resolvers of a YAML 1.1 loader: bool, float, int (including
/// sexagesimal), merge, null, timestamp and value.
fn yaml11_implicit_types() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| {
        RegexSet::new([
            r"^(?:yes|Yes|YES|no|No|NO|true|True|TRUE|false|False|FALSE|on|On|ON|off|Off|OFF)$",
            r"^(?:[-+]?[0-9][0-9_]*\.[0-9_]*(?:[eE][-+][0-9]+)?|\.[0-9][0-9_]*(?:[eE][-+][0-9]+)?|[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN))$",
            r"^(?:[-+]?0b[0-1_]+|[-+]?0[0-7_]+|[-+]?(?:0|[1-9][0-9_]*)|[-+]?0x[0-9a-fA-F_]+|[-+]?[1-9][0-9_]*(?::[0-5]?[0-9])+)$",
            r"^<<$",
            r"^(?:~|null|Null|NULL|)$",
            r"^(?:[0-9]{4}-[0-9]{2}-[0-9]{2}|[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}(?:[Tt]|[ \t]+)[0-9]{1,2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]*)?(?:[ \t]*(?:Z|[-+][0-9]{1,2}(?::[0-9]{2})?))?)$",
            r"^=$",
        ])
        .expect("static patterns")
    })
}

pub fn to_yaml<T: Serialize>(document: &T) -> Result<String> {
    let value = serde_yaml_ng::to_value(document)?;
    let mut out = String::new();

    match inline(&value) {
        Some(text) => {
            out.push_str(&text);
            out.push('\n');
        }
        None => write_block(&mut out, &value, 0, false)?,
    }
    Ok(out)
}

/// A string scalar as it must appear in the document.
pub fn scalar(text: &str) -> String {
    if is_plain_safe(text) && !is_implicitly_typed(text) {
        text.to_string()
    } else {
        double_quoted(text)
    }
}

fn is_implicitly_typed(text: &str) -> bool {
    if yaml11_implicit_types().is_match(text) {
        return true;
    }
    // Anything a YAML 1.2 reader would not hand back verbatim is quoted too.
    !matches!(
        serde_yaml_ng::from_str::<Value>(text),
        Ok(Value::String(ref parsed)) if parsed == text
    )
}

fn is_plain_safe(text: &str) -> bool {
    let Some(first) = text.chars().next() else {
        return false;
    };

    !(first.is_whitespace()
        || "-?:,[]{}#&*!|>'\"%@`<=".contains(first)
        || text.starts_with("...")
        || text.ends_with(char::is_whitespace)
        || text.ends_with(':')
        || text.contains(": ")
        || text.contains(" #")
        || text
            .chars()
            .any(|c| c.is_control() || matches!(c, '\u{2028}' | '\u{2029}' | '\u{feff}')))
}

fn double_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() || matches!(c, '\u{2028}' | '\u{2029}' | '\u{feff}') => {
                out.push_str(&format!("\\u{:04X}", c as u32))
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn untagged(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untagged(&tagged.value),
        other => other,
    }
}

/// Scalars and empty collections fit on the line of their key or dash.
fn inline(value: &Value) -> Option<String> {
    match untagged(value) {
        Value::Null => Some("null".to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(scalar(s)),
        Value::Sequence(seq) if seq.is_empty() => Some("[]".to_string()),
        Value::Mapping(map) if map.is_empty() => Some("{}".to_string()),
        _ => None,
    }
}

fn pad(out: &mut String, indent: usize) {
    out.extend(std::iter::repeat(' ').take(indent));
}

fn write_block(out: &mut String, value: &Value, indent: usize, inline_first: bool) -> Result<()> {
    match untagged(value) {
        Value::Mapping(map) => write_mapping(out, map, indent, inline_first),
        Value::Sequence(seq) => write_sequence(out, seq, indent, inline_first),
        _ => Ok(()),
    }
}

fn write_mapping(out: &mut String, map: &Mapping, indent: usize, inline_first: bool) -> Result<()> {
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 || !inline_first {
            pad(out, indent);
        }

        let key = match untagged(key) {
            Value::Sequence(_) | Value::Mapping(_) => {
                return Err(<serde_yaml_ng::Error as serde::ser::Error>::custom(
                    "collections cannot be used as mapping keys",
                )
                .into())
            }
            other => inline(other).unwrap_or_default(),
        };
        out.push_str(&key);
        out.push(':');

        match inline(value) {
            Some(text) => {
                out.push(' ');
                out.push_str(&text);
                out.push('\n');
            }
            None => {
                out.push('\n');
                // Sequences under a key sit at the key's own indentation.
                match untagged(value) {
                    Value::Sequence(seq) => write_sequence(out, seq, indent, false)?,
                    other => write_block(out, other, indent + INDENT, false)?,
                }
            }
        }
    }
    Ok(())
}

fn write_sequence(out: &mut String, seq: &[Value], indent: usize, inline_first: bool) -> Result<()> {
    for (i, item) in seq.iter().enumerate() {
        if i > 0 || !inline_first {
            pad(out, indent);
        }
        out.push_str("- ");

        match inline(item) {
            Some(text) => {
                out.push_str(&text);
                out.push('\n');
            }
            None => write_block(out, item, indent + INDENT, true)?,
        }
    }
    Ok(())
}
