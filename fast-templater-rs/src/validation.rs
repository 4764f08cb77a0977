//! Format checks for field keys, preset ids and preset definitions.

use crate::error::{Result, TemplaterError};
use crate::types::{FrontmatterField, FrontmatterPreset};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static FIELD_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_-]*$").unwrap());

static PRESET_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").unwrap());

pub const PRESET_ID_MIN_LEN: usize = 2;
pub const PRESET_ID_MAX_LEN: usize = 50;

/// Whether `key` can be used as a frontmatter field key.
pub fn is_valid_field_key(key: &str) -> bool {
    FIELD_KEY.is_match(key)
}

/// Whether `id` has the shape of a preset id (ignores uniqueness).
pub fn is_valid_preset_id(id: &str) -> bool {
    (PRESET_ID_MIN_LEN..=PRESET_ID_MAX_LEN).contains(&id.len()) && PRESET_ID.is_match(id)
}

/// Check the format of `id` and that no preset other than `exclude` uses it.
pub fn validate_preset_id(
    id: &str,
    existing: &[FrontmatterPreset],
    exclude: Option<&str>,
) -> Result<()> {
    if id.len() < PRESET_ID_MIN_LEN || id.len() > PRESET_ID_MAX_LEN {
        return Err(TemplaterError::InvalidPresetId {
            id: id.to_string(),
            message: format!(
                "must be between {} and {} characters",
                PRESET_ID_MIN_LEN, PRESET_ID_MAX_LEN
            ),
        });
    }
    if !PRESET_ID.is_match(id) {
        return Err(TemplaterError::InvalidPresetId {
            id: id.to_string(),
            message: "must start with a letter and contain only letters, digits, '-' or '_'"
                .to_string(),
        });
    }
    if existing
        .iter()
        .any(|p| p.id == id && Some(p.id.as_str()) != exclude)
    {
        return Err(TemplaterError::DuplicatePresetId(id.to_string()));
    }
    Ok(())
}

/// Reject blank preset names.
pub fn validate_preset_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(TemplaterError::InvalidPreset {
            preset: name.to_string(),
            message: "name cannot be empty".to_string(),
        });
    }
    Ok(())
}

/// Trim option strings and drop the empty ones.
pub fn clean_options(options: &[String]) -> Vec<String> {
    options
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validate a single field definition.
pub fn validate_field(field: &FrontmatterField) -> Result<()> {
    let label = if field.label.trim().is_empty() {
        field.key.clone()
    } else {
        field.label.clone()
    };
    let invalid = |message: &str| TemplaterError::InvalidField {
        field: label.clone(),
        message: message.to_string(),
    };

    if field.key.is_empty() {
        return Err(invalid("key cannot be empty"));
    }
    if !is_valid_field_key(&field.key) {
        return Err(invalid(
            "key must start with a letter or '_' and contain only letters, digits, '-' or '_'",
        ));
    }
    if field.label.trim().is_empty() {
        return Err(invalid("label cannot be empty"));
    }
    if field.field_type.requires_options() && clean_options(&field.options).is_empty() {
        return Err(invalid(&format!(
            "{} fields need at least one option",
            field.field_type
        )));
    }
    if field.use_templater_timestamp && field.field_type != crate::types::FieldType::Date {
        return Err(invalid("timestamp defaults are only available for date fields"));
    }
    Ok(())
}

/// Validate every field and reject duplicate keys.
pub fn validate_fields(fields: &[FrontmatterField]) -> Result<()> {
    let mut seen = HashSet::new();
    for field in fields {
        validate_field(field)?;
        if !seen.insert(field.key.as_str()) {
            return Err(TemplaterError::InvalidField {
                field: field.label.clone(),
                message: format!("duplicate key '{}'", field.key),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;

    fn preset(id: &str) -> FrontmatterPreset {
        FrontmatterPreset {
            id: id.to_string(),
            name: id.to_string(),
            fields: Vec::new(),
            description: None,
        }
    }

    #[test]
    fn test_field_keys() {
        assert!(is_valid_field_key("title"));
        assert!(is_valid_field_key("_private"));
        assert!(is_valid_field_key("due-date_2"));
        assert!(!is_valid_field_key("2nd"));
        assert!(!is_valid_field_key("has space"));
        assert!(!is_valid_field_key(""));
    }

    #[test]
    fn test_preset_id_format() {
        assert!(is_valid_preset_id("ab"));
        assert!(is_valid_preset_id("project-template"));
        assert!(!is_valid_preset_id("a"));
        assert!(!is_valid_preset_id("-leading"));
        assert!(!is_valid_preset_id("9lives"));
        assert!(!is_valid_preset_id(&"a".repeat(51)));
        assert!(is_valid_preset_id(&"a".repeat(50)));
    }

    #[test]
    fn test_validate_preset_id_uniqueness() {
        let existing = vec![preset("meeting")];
        assert!(matches!(
            validate_preset_id("meeting", &existing, None),
            Err(TemplaterError::DuplicatePresetId(_))
        ));
        assert!(validate_preset_id("meeting", &existing, Some("meeting")).is_ok());
        assert!(validate_preset_id("journal", &existing, None).is_ok());
    }

    #[test]
    fn test_select_requires_options() {
        let field = FrontmatterField::new("status", FieldType::Select, "Status")
            .with_options(["  ", ""]);
        let err = validate_field(&field).unwrap_err();
        assert!(err.to_string().contains("Status"));

        let field = field.with_options(["draft"]);
        assert!(validate_field(&field).is_ok());
    }

    #[test]
    fn test_timestamp_only_on_dates() {
        let field = FrontmatterField::new("title", FieldType::Text, "Title").with_templater_timestamp();
        assert!(validate_field(&field).is_err());
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let fields = vec![
            FrontmatterField::new("title", FieldType::Text, "Title"),
            FrontmatterField::new("title", FieldType::Text, "Other title"),
        ];
        assert!(validate_fields(&fields).is_err());
    }
}
