//! Shared types for Fast Templater.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A frontmatter record. `serde_yaml::Mapping` keeps insertion order, which
/// the merge engine relies on for deterministic output.
pub type Frontmatter = serde_yaml::Mapping;

/// Frontmatter key that binds a template to one or more presets. It is
/// bookkeeping only and never written into a note.
pub const RESERVED_CONFIG_KEY: &str = "fast-templater-config";

/// The kind of input a preset field collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    Select,
    Date,
    MultiSelect,
}

impl FieldType {
    /// All supported field types.
    pub const ALL: [FieldType; 4] = [
        FieldType::Text,
        FieldType::Select,
        FieldType::Date,
        FieldType::MultiSelect,
    ];

    /// Parse the persisted representation (`text`, `select`, `date`, `multi-select`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(FieldType::Text),
            "select" => Some(FieldType::Select),
            "date" => Some(FieldType::Date),
            "multi-select" => Some(FieldType::MultiSelect),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Select => "select",
            FieldType::Date => "date",
            FieldType::MultiSelect => "multi-select",
        }
    }

    /// Whether fields of this type need a non-empty option list.
    pub fn requires_options(self) -> bool {
        matches!(self, FieldType::Select | FieldType::MultiSelect)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A single typed field of a preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontmatterField {
    /// Frontmatter key written into the note.
    pub key: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Display name.
    pub label: String,

    /// Default value. May be empty, or a macro expression such as `<% tp.date.now() %>`.
    #[serde(default)]
    pub default: String,

    /// Choices for select and multi-select fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Date fields only: the default is a generated timestamp expression and
    /// the input is read-only.
    #[serde(default, skip_serializing_if = "is_false")]
    pub use_templater_timestamp: bool,
}

impl FrontmatterField {
    /// Create a plain field with no default and no options.
    pub fn new(key: impl Into<String>, field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            field_type,
            label: label.into(),
            default: String::new(),
            options: Vec::new(),
            use_templater_timestamp: false,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_templater_timestamp(mut self) -> Self {
        self.use_templater_timestamp = true;
        self
    }

    /// True for date fields whose value is a macro expression rather than a date.
    pub fn is_timestamp(&self) -> bool {
        self.field_type == FieldType::Date && self.use_templater_timestamp
    }
}

/// A named, reusable schema of frontmatter fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontmatterPreset {
    pub id: String,
    pub name: String,
    pub fields: Vec<FrontmatterField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FrontmatterPreset {
    /// Field keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }
}

/// Read-only snapshot of a template file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Vault-relative path, used as the identifier.
    pub id: String,
    /// File stem.
    pub name: String,
    pub path: String,
    pub content: String,
}

impl Template {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let name = std::path::Path::new(&path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();
        Self {
            id: path.clone(),
            name,
            path,
            content: content.into(),
        }
    }
}

/// A 0-based line reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePosition {
    pub line: usize,
}

/// Line span of a frontmatter block, from the opening to the closing `---`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub start: LinePosition,
    pub end: LinePosition,
}

/// Result of splitting a document into frontmatter and body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedFrontmatter {
    pub frontmatter: Frontmatter,
    pub body: String,
    /// `None` when the document has no frontmatter block.
    pub position: Option<Position>,
}
