//! Preset import and export.
//!
//! Exports are wrapped in an envelope:
//! ```json
//! {"type": "fast-templater-presets", "version": 1, "exportedAt": "...", "presets": [...]}
//! ```
//! Imports accept the envelope, a bare array of presets, or a single preset
//! object. Unlike loading settings, importing is strict: the first malformed
//! preset or field rejects the whole payload with a message naming it.

use crate::error::{Result, TemplaterError};
use crate::preset::id::{generate_unique_preset_id, unique_id_from_base};
use crate::types::{FieldType, FrontmatterField, FrontmatterPreset};
use crate::validation::{clean_options, is_valid_field_key, is_valid_preset_id, validate_fields};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

pub const EXPORT_TYPE: &str = "fast-templater-presets";
pub const EXPORT_VERSION: u64 = 1;

/// The export envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetExport {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u64,
    pub exported_at: String,
    pub presets: Vec<FrontmatterPreset>,
}

/// How imported presets combine with the existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStrategy {
    /// Append to the store; colliding ids are regenerated.
    #[default]
    Merge,
    /// Discard the store and install the imported set.
    Replace,
}

/// An imported preset whose id had to change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedPreset {
    pub name: String,
    pub from: String,
    pub to: String,
}

/// What an import did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub strategy: ImportStrategy,
    /// Final ids of the imported presets, in payload order.
    pub imported: Vec<String>,
    pub renamed: Vec<RenamedPreset>,
    /// Number of presets discarded by a replace.
    pub removed: usize,
}

/// A validated preset from an import payload. The id is optional in legacy
/// payloads.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedPreset {
    pub id: Option<String>,
    pub name: String,
    pub fields: Vec<FrontmatterField>,
    pub description: Option<String>,
}

/// Build the export envelope for `presets`.
pub fn export_presets(presets: &[FrontmatterPreset]) -> PresetExport {
    PresetExport {
        kind: EXPORT_TYPE.to_string(),
        version: EXPORT_VERSION,
        exported_at: chrono::Utc::now().to_rfc3339(),
        presets: presets.to_vec(),
    }
}

/// Parse and validate an import payload.
pub fn parse_import(json: &str) -> Result<Vec<ImportedPreset>> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| TemplaterError::InvalidImport(format!("not valid JSON: {}", e)))?;

    let items: Vec<&Value> = match &value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) if map.contains_key("presets") => {
            if let Some(kind) = map.get("type") {
                if kind.as_str() != Some(EXPORT_TYPE) {
                    return Err(TemplaterError::InvalidImport(format!(
                        "unexpected payload type {}",
                        kind
                    )));
                }
            }
            if let Some(version) = map.get("version") {
                match version.as_u64() {
                    Some(v) if v <= EXPORT_VERSION => {}
                    _ => {
                        return Err(TemplaterError::InvalidImport(format!(
                            "unsupported version {}",
                            version
                        )));
                    }
                }
            }
            map.get("presets")
                .and_then(Value::as_array)
                .ok_or_else(|| TemplaterError::InvalidImport("'presets' must be an array".into()))?
                .iter()
                .collect()
        }
        Value::Object(map) if map.contains_key("fields") => vec![&value],
        _ => {
            return Err(TemplaterError::InvalidImport(
                "expected a preset export, an array of presets or a single preset".into(),
            ));
        }
    };

    if items.is_empty() {
        return Err(TemplaterError::InvalidImport("payload contains no presets".into()));
    }

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| parse_preset(item, i + 1))
        .collect()
}

fn parse_preset(value: &Value, position: usize) -> Result<ImportedPreset> {
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or("");
    let label = if name.is_empty() {
        format!("preset #{}", position)
    } else {
        format!("preset #{} ('{}')", position, name)
    };
    let fail = |message: String| TemplaterError::InvalidImport(format!("{}: {}", label, message));

    if !value.is_object() {
        return Err(fail("must be an object".into()));
    }
    if name.is_empty() {
        return Err(fail("missing name".into()));
    }

    let id = match value.get("id") {
        None | Some(Value::Null) => None,
        Some(Value::String(id)) if is_valid_preset_id(id) => Some(id.clone()),
        Some(other) => return Err(fail(format!("invalid id {}", other))),
    };

    let fields = value
        .get("fields")
        .and_then(Value::as_array)
        .ok_or_else(|| fail("'fields' must be an array".into()))?
        .iter()
        .enumerate()
        .map(|(i, field)| parse_field(field).map_err(|msg| fail(format!("field #{}: {}", i + 1, msg))))
        .collect::<Result<Vec<_>>>()?;
    validate_fields(&fields).map_err(|e| fail(e.to_string()))?;

    let description = match value.get("description") {
        None | Some(Value::Null) => None,
        Some(Value::String(d)) => Some(d.trim().to_string()).filter(|d| !d.is_empty()),
        Some(_) => return Err(fail("description must be a string".into())),
    };

    Ok(ImportedPreset {
        id,
        name: name.to_string(),
        fields,
        description,
    })
}

fn parse_field(value: &Value) -> std::result::Result<FrontmatterField, String> {
    if !value.is_object() {
        return Err("must be an object".into());
    }
    let key = value
        .get("key")
        .and_then(Value::as_str)
        .ok_or("missing key")?;
    if !is_valid_field_key(key) {
        return Err(format!("invalid key '{}'", key));
    }
    let type_name = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| format!("'{}' is missing a type", key))?;
    let field_type = FieldType::parse(type_name)
        .ok_or_else(|| format!("'{}' has unsupported type '{}'", key, type_name))?;
    let label = value
        .get("label")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| format!("'{}' is missing a label", key))?;
    let default = match value.get("default") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(d)) => d.clone(),
        Some(_) => return Err(format!("'{}' default must be a string", label)),
    };
    let options = match value.get("options") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let strings: Option<Vec<String>> = items
                .iter()
                .map(|o| o.as_str().map(str::to_string))
                .collect();
            clean_options(&strings.ok_or_else(|| format!("'{}' options must be strings", label))?)
        }
        Some(_) => return Err(format!("'{}' options must be an array", label)),
    };
    let use_templater_timestamp = match value.get("useTemplaterTimestamp") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(format!("'{}' useTemplaterTimestamp must be a boolean", label)),
    };

    Ok(FrontmatterField {
        key: key.to_string(),
        field_type,
        label: label.to_string(),
        default,
        options,
        use_templater_timestamp,
    })
}

/// Combine `imported` with `existing` according to `strategy`.
///
/// Returns the new preset collection and a report of what happened. Any id
/// already taken (by an existing preset under merge, or by an earlier preset
/// in the same payload) is regenerated and reported.
pub fn apply_import(
    existing: &[FrontmatterPreset],
    imported: Vec<ImportedPreset>,
    strategy: ImportStrategy,
) -> (Vec<FrontmatterPreset>, ImportReport) {
    let mut presets = match strategy {
        ImportStrategy::Merge => existing.to_vec(),
        ImportStrategy::Replace => Vec::new(),
    };
    let mut report = ImportReport {
        strategy,
        imported: Vec::with_capacity(imported.len()),
        renamed: Vec::new(),
        removed: match strategy {
            ImportStrategy::Merge => 0,
            ImportStrategy::Replace => existing.len(),
        },
    };

    for preset in imported {
        let id = match preset.id {
            Some(wanted) => {
                let taken: HashSet<&str> = presets.iter().map(|p| p.id.as_str()).collect();
                if taken.contains(wanted.as_str()) {
                    let fresh = unique_id_from_base(&wanted, |id| taken.contains(id));
                    report.renamed.push(RenamedPreset {
                        name: preset.name.clone(),
                        from: wanted,
                        to: fresh.clone(),
                    });
                    fresh
                } else {
                    wanted
                }
            }
            None => generate_unique_preset_id(&preset.name, &presets),
        };

        report.imported.push(id.clone());
        presets.push(FrontmatterPreset {
            id,
            name: preset.name,
            fields: preset.fields,
            description: preset.description,
        });
    }

    (presets, report)
}
