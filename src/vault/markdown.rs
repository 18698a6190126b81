//! Markdown helpers for Quarry.
//!
//! Handles the two metadata styles found in notes:
//! - a leading `---` frontmatter block of `key: value` lines
//! - inline `key:: value` fields anywhere in the body

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use serde_json::Value;

use crate::config::DiscoveryConfig;
use crate::core::SourceNote;
use crate::error::{QuarryError, Result};
use crate::vault::Vault;

const FRONTMATTER_DELIMITER: &str = "---";

// =============================================================================
// Frontmatter
// =============================================================================

/// Split a note into its frontmatter map and the remaining body.
///
/// A note without a well-formed leading block yields an empty map and the
/// full text as body.
pub fn split_frontmatter(input: &str) -> (BTreeMap<String, Value>, String) {
    match frontmatter_bounds(input) {
        Some((block, body_start)) => {
            let map = parse_frontmatter(&input[block.0..block.1]);
            (map, input[body_start..].to_string())
        }
        None => (BTreeMap::new(), input.to_string()),
    }
}

/// Byte ranges of the frontmatter content and the start of the body.
fn frontmatter_bounds(input: &str) -> Option<((usize, usize), usize)> {
    let mut lines = input.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != FRONTMATTER_DELIMITER {
        return None;
    }

    let content_start = first.len();
    let mut offset = content_start;
    for line in lines {
        if line.trim_end() == FRONTMATTER_DELIMITER {
            return Some(((content_start, offset), offset + line.len()));
        }
        offset += line.len();
    }
    None
}

fn parse_frontmatter(block: &str) -> BTreeMap<String, Value> {
    let mut map = BTreeMap::new();
    let mut list_key: Option<String> = None;

    for line in block.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(item) = trimmed.strip_prefix("- ") {
            if let Some(Value::Array(items)) = list_key.as_ref().and_then(|k| map.get_mut(k)) {
                items.push(Value::String(unquote(item.trim()).to_string()));
            }
            continue;
        }

        let Some((key, raw)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_string();
        if key.is_empty() {
            continue;
        }

        close_list(&mut map, &mut list_key);
        let raw = raw.trim();
        if raw.is_empty() {
            map.insert(key.clone(), Value::Array(Vec::new()));
            list_key = Some(key);
        } else {
            map.insert(key, parse_scalar(raw));
        }
    }

    close_list(&mut map, &mut list_key);
    map
}

/// A bare `key:` with no list items underneath is a null, not a list.
fn close_list(map: &mut BTreeMap<String, Value>, list_key: &mut Option<String>) {
    if let Some(key) = list_key.take() {
        if matches!(map.get(&key), Some(Value::Array(items)) if items.is_empty()) {
            map.insert(key, Value::Null);
        }
    }
}

fn parse_scalar(raw: &str) -> Value {
    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        let items = inner
            .split(',')
            .map(|s| unquote(s.trim()))
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()))
            .collect();
        return Value::Array(items);
    }

    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" | "~" => return Value::Null,
        _ => {}
    }

    if let Ok(n) = raw.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(f) = raw.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }

    Value::String(unquote(raw).to_string())
}

fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(quote).and_then(|r| r.strip_suffix(quote)) {
            return inner;
        }
    }
    s
}

/// Read a frontmatter value as a string. Numbers and booleans are rendered.
pub fn frontmatter_string(fm: &BTreeMap<String, Value>, key: &str) -> Option<String> {
    match fm.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// =============================================================================
// Inline fields
// =============================================================================

fn inline_field_regex(field: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?m)^(\s*){}::[ \t]*(.*?)[ \t]*\r?$", regex::escape(field))).ok()
}

/// Value of the first inline `field:: value` line in `text`.
pub fn inline_field(text: &str, field: &str) -> Option<String> {
    let re = inline_field_regex(field)?;
    re.captures(text)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().to_string())
}

// =============================================================================
// Status rewrite
// =============================================================================

/// Rewrite every `field` marker reading `from` to `to`.
///
/// Covers inline `field:: value` lines in the whole note and `field: value`
/// lines inside the frontmatter block. Markers with any other value are
/// left alone. Returns `None` when no marker reads `from`.
pub fn rewrite_field(text: &str, field: &str, from: &str, to: &str) -> Option<String> {
    if from == to {
        return None;
    }
    let bounds = frontmatter_bounds(text);
    let mut out = String::with_capacity(text.len() + to.len());
    let mut changed = false;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let in_frontmatter = bounds
            .map(|((start, end), _)| offset >= start && offset < end)
            .unwrap_or(false);
        offset += line.len();

        let (content, ending) = split_line_ending(line);
        let indent_len = content.len() - content.trim_start().len();
        let (indent, rest) = content.split_at(indent_len);

        let rewritten = if let Some(value) = rest.strip_prefix(field).and_then(|r| r.strip_prefix("::")) {
            (value.trim() == from).then(|| format!("{}{}:: {}{}", indent, field, to, ending))
        } else if in_frontmatter {
            rest.strip_prefix(field)
                .and_then(|r| r.trim_start().strip_prefix(':'))
                .filter(|value| unquote(value.trim()) == from)
                .map(|_| format!("{}{}: {}{}", indent, field, to, ending))
        } else {
            None
        };

        match rewritten {
            Some(new_line) => {
                out.push_str(&new_line);
                changed = true;
            }
            None => out.push_str(line),
        }
    }

    changed.then_some(out)
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, "\n")
    } else {
        (line, "")
    }
}

// =============================================================================
// Source notes
// =============================================================================

/// Title of a note: its file stem.
pub fn note_title(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

impl SourceNote {
    /// Load a note from `vault` for atomisation.
    ///
    /// The migration status comes from the frontmatter field, falling back
    /// to an inline field when `config.use_inline_fields` is set.
    pub fn load(vault: &dyn Vault, path: &str, config: &DiscoveryConfig) -> Result<Self> {
        if !path.ends_with(".md") {
            return Err(QuarryError::discovery(format!(
                "{} is not a Markdown note",
                path
            )));
        }

        let text = vault.read(path)?;
        let (frontmatter, _) = split_frontmatter(&text);

        let migration_status = frontmatter_string(&frontmatter, &config.migration_field).or_else(
            || {
                config
                    .use_inline_fields
                    .then(|| inline_field(&text, &config.migration_field))
                    .flatten()
            },
        );

        Ok(Self {
            path: path.to_string(),
            title: note_title(path),
            body: text,
            frontmatter,
            migration_status,
        })
    }
}
