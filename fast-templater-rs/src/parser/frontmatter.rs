//! YAML frontmatter parsing, serialization and splicing.
//!
//! A frontmatter block sits at the very start of a document:
//! ```text
//! ---
//! title: Example
//! ---
//! ```
//! Parsing never fails. A block that is not a YAML mapping is treated as if
//! there were no frontmatter at all, so the whole text survives as body.

use crate::editor::{Editor, EditorPosition, TextBuffer};
use crate::error::Result;
use crate::types::{Frontmatter, LinePosition, ParsedFrontmatter, Position};
use regex::Regex;
use serde_yaml::Value;
use std::sync::LazyLock;
use tracing::warn;

static FRONTMATTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A---\r?\n(.+?)\r?\n---[ \t]*\r?(?:\n|\z)").unwrap());

/// Raw pieces of a frontmatter block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontmatterSplit<'a> {
    /// The YAML text between the delimiters.
    pub yaml: &'a str,
    /// Everything after the closing delimiter line.
    pub body: &'a str,
    pub position: Position,
}

/// Locate the frontmatter block, if any.
pub fn split_frontmatter(content: &str) -> Option<FrontmatterSplit<'_>> {
    let caps = FRONTMATTER.captures(content)?;
    let whole = caps.get(0)?;
    let yaml = caps.get(1)?.as_str();

    // The match ends after the closing line's terminator, if it has one.
    let block = whole.as_str().trim_end_matches(['\r', '\n']);

    Some(FrontmatterSplit {
        yaml,
        body: &content[whole.end()..],
        position: Position {
            start: LinePosition { line: 0 },
            end: LinePosition {
                line: block.matches('\n').count(),
            },
        },
    })
}

/// Extract frontmatter as a raw YAML string.
pub fn extract_frontmatter(content: &str) -> Option<&str> {
    split_frontmatter(content).map(|split| split.yaml)
}

/// Split a document into its frontmatter record and body.
pub fn parse_frontmatter(content: &str) -> ParsedFrontmatter {
    let Some(split) = split_frontmatter(content) else {
        return ParsedFrontmatter {
            frontmatter: Frontmatter::new(),
            body: content.to_string(),
            position: None,
        };
    };

    match parse_yaml_mapping(split.yaml) {
        Some(frontmatter) => ParsedFrontmatter {
            frontmatter,
            body: split.body.to_string(),
            position: Some(split.position),
        },
        None => ParsedFrontmatter {
            frontmatter: Frontmatter::new(),
            body: content.to_string(),
            position: None,
        },
    }
}

fn parse_yaml_mapping(yaml: &str) -> Option<Frontmatter> {
    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(mapping)) => Some(mapping),
        Ok(Value::Null) => Some(Frontmatter::new()),
        Ok(other) => {
            warn!(kind = value_kind(&other), "frontmatter is not a mapping, ignoring it");
            None
        }
        Err(e) => {
            warn!(error = %e, "failed to parse frontmatter, ignoring it");
            None
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}

/// Serialize a record to YAML, keys in the record's own order. An empty
/// record serializes to an empty string.
pub fn serialize_frontmatter(frontmatter: &Frontmatter) -> Result<String> {
    if frontmatter.is_empty() {
        return Ok(String::new());
    }
    Ok(serde_yaml::to_string(frontmatter)?)
}

/// The full block written into a note: delimiters plus a blank line.
pub fn render_frontmatter_block(frontmatter: &Frontmatter) -> Result<String> {
    Ok(format!("---\n{}---\n\n", serialize_frontmatter(frontmatter)?))
}

/// Write `frontmatter` into the editor, replacing the block at `position`
/// (lines `start..=end`) or inserting at the top when there is none.
pub fn splice_frontmatter(
    editor: &mut dyn Editor,
    frontmatter: &Frontmatter,
    position: Option<Position>,
) -> Result<()> {
    let block = render_frontmatter_block(frontmatter)?;
    let (from, to) = match position {
        Some(pos) => (
            EditorPosition::line_start(pos.start.line),
            EditorPosition::line_start(pos.end.line + 1),
        ),
        None => (EditorPosition::line_start(0), EditorPosition::line_start(0)),
    };
    editor.replace_range(&block, from, to);
    Ok(())
}

/// Replace (or add) the frontmatter of a document held as a string.
pub fn update_frontmatter(content: &str, frontmatter: &Frontmatter) -> Result<String> {
    let position = parse_frontmatter(content).position;
    let mut buffer = TextBuffer::new(content);
    splice_frontmatter(&mut buffer, frontmatter, position)?;
    Ok(buffer.into_content())
}
