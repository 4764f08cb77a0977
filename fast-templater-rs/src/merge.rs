//! Frontmatter merging.
//!
//! Four sources are merged, later ones winning:
//! 1. preset field defaults
//! 2. the note's existing frontmatter
//! 3. the template's frontmatter
//! 4. user input
//!
//! `tags` is the exception: values from every source are unioned, keeping the
//! first occurrence of each tag. The reserved `fast-templater-config` key is
//! dropped, and the result is ordered by the preset's field declarations
//! followed by any other keys in the order they were first seen.

use crate::error::{Result, TemplaterError};
use crate::types::{FieldType, Frontmatter, FrontmatterPreset, RESERVED_CONFIG_KEY};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::HashMap;

pub const TAGS_KEY: &str = "tags";

/// A raw value entered for a preset field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Text(String),
    List(Vec<String>),
}

impl FormValue {
    fn as_text(&self) -> String {
        match self {
            FormValue::Text(s) => s.clone(),
            FormValue::List(items) => items.join(", "),
        }
    }

    fn as_list(&self) -> Vec<String> {
        let items: Vec<&str> = match self {
            FormValue::Text(s) => s.split(',').collect(),
            FormValue::List(items) => items.iter().map(String::as_str).collect(),
        };
        items
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        FormValue::Text(s.to_string())
    }
}

impl From<Vec<String>> for FormValue {
    fn from(items: Vec<String>) -> Self {
        FormValue::List(items)
    }
}

/// User input keyed by field key.
pub type FormData = HashMap<String, FormValue>;

/// Defaults contributed by a preset's fields.
///
/// Fields with a blank default contribute nothing. A multi-select default is
/// only used when it is exactly one of the field's options, and becomes a
/// one-element list.
pub fn extract_preset_defaults(preset: &FrontmatterPreset) -> Frontmatter {
    let mut defaults = Frontmatter::new();
    for field in &preset.fields {
        if field.default.trim().is_empty() {
            continue;
        }
        let value = match field.field_type {
            FieldType::MultiSelect => {
                if !field.options.contains(&field.default) {
                    continue;
                }
                Value::Sequence(vec![Value::String(field.default.clone())])
            }
            _ => Value::String(field.default.clone()),
        };
        defaults.insert(Value::String(field.key.clone()), value);
    }
    defaults
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Normalize a tag value to a list: lists as-is, a truthy scalar as a
/// one-element list, anything else as empty.
pub fn to_array(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Sequence(items)) => items.clone(),
        Some(v) if is_truthy(v) => vec![v.clone()],
        _ => Vec::new(),
    }
}

fn union_tags(base: Option<&Value>, overrides: Option<&Value>) -> Value {
    let mut tags: Vec<Value> = Vec::new();
    for tag in to_array(base).into_iter().chain(to_array(overrides)) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    Value::Sequence(tags)
}

/// Merge two records: keys in `overrides` replace those in `base`, except
/// `tags`, which are unioned.
pub fn merge_frontmatters(base: &Frontmatter, overrides: &Frontmatter) -> Frontmatter {
    let mut merged = base.clone();
    for (key, value) in overrides {
        if key.as_str() == Some(TAGS_KEY) {
            let tags = union_tags(base.get(TAGS_KEY), Some(value));
            merged.insert(key.clone(), tags);
        } else {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Reorder a record: the preset's field keys first, in declaration order,
/// then every other key in its current order.
pub fn order_by_preset(record: Frontmatter, preset: Option<&FrontmatterPreset>) -> Frontmatter {
    let Some(preset) = preset else {
        return record;
    };

    let mut ordered = Frontmatter::with_capacity(record.len());
    for key in preset.keys() {
        if let Some(value) = record.get(key) {
            ordered.insert(Value::String(key.to_string()), value.clone());
        }
    }
    for (key, value) in record {
        if !ordered.contains_key(&key) {
            ordered.insert(key, value);
        }
    }
    ordered
}

/// Merge all four sources into the record written to a note.
///
/// `user` is input already converted with [`convert_form_data_to_frontmatter`].
pub fn merge_frontmatter_with_user_input(
    preset: Option<&FrontmatterPreset>,
    note: &Frontmatter,
    template: &Frontmatter,
    user: &Frontmatter,
) -> Frontmatter {
    let defaults = preset.map(extract_preset_defaults).unwrap_or_default();

    let mut merged = merge_frontmatters(&defaults, note);
    merged = merge_frontmatters(&merged, template);
    merged = merge_frontmatters(&merged, user);
    merged.shift_remove(RESERVED_CONFIG_KEY);

    order_by_preset(merged, preset)
}

/// Convert raw form input into frontmatter values according to the preset's
/// field types.
///
/// Only fields present in `form` contribute. A field that was cleared
/// contributes an empty string so it still overrides lower-priority sources.
/// Invalid dates fail with an error naming the field.
pub fn convert_form_data_to_frontmatter(
    preset: &FrontmatterPreset,
    form: &FormData,
) -> Result<Frontmatter> {
    let mut out = Frontmatter::new();
    for field in &preset.fields {
        let Some(raw) = form.get(&field.key) else {
            continue;
        };

        let value = match field.field_type {
            FieldType::Text | FieldType::Select => Value::String(raw.as_text().trim().to_string()),
            FieldType::Date if field.use_templater_timestamp => Value::String(raw.as_text()),
            FieldType::Date => {
                let text = raw.as_text();
                let text = text.trim();
                if text.is_empty() {
                    Value::String(String::new())
                } else {
                    let date = parse_calendar_date(text).ok_or_else(|| TemplaterError::InvalidDate {
                        field: field.label.clone(),
                        value: text.to_string(),
                    })?;
                    Value::String(date.format("%Y-%m-%d").to_string())
                }
            }
            FieldType::MultiSelect => {
                let items = raw.as_list();
                if items.is_empty() {
                    Value::String(String::new())
                } else {
                    Value::Sequence(items.into_iter().map(Value::String).collect())
                }
            }
        };
        out.insert(Value::String(field.key.clone()), value);
    }
    Ok(out)
}

/// Convert form input when no preset describes the fields: text is trimmed,
/// lists are kept when non-empty. Keys are emitted in sorted order.
pub fn convert_untyped_form_data(form: &FormData) -> Frontmatter {
    let mut keys: Vec<&String> = form.keys().collect();
    keys.sort();

    let mut out = Frontmatter::new();
    for key in keys {
        let value = match &form[key] {
            FormValue::Text(s) => Value::String(s.trim().to_string()),
            list @ FormValue::List(_) => {
                let items = list.as_list();
                if items.is_empty() {
                    Value::String(String::new())
                } else {
                    Value::Sequence(items.into_iter().map(Value::String).collect())
                }
            }
        };
        out.insert(Value::String(key.clone()), value);
    }
    out
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a calendar date written in one of the common formats.
pub fn parse_calendar_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();

    if input.len() == 8 && input.bytes().all(|b| b.is_ascii_digit()) {
        let year = input[..4].parse().ok()?;
        let month = input[4..6].parse().ok()?;
        let day = input[6..].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
    {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(|dt| dt.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FrontmatterField;
    use pretty_assertions::assert_eq;

    fn fm(yaml: &str) -> Frontmatter {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn keys(record: &Frontmatter) -> Vec<&str> {
        record.keys().filter_map(Value::as_str).collect()
    }

    fn preset(fields: Vec<FrontmatterField>) -> FrontmatterPreset {
        FrontmatterPreset {
            id: "test".into(),
            name: "Test".into(),
            fields,
            description: None,
        }
    }

    fn project_preset() -> FrontmatterPreset {
        preset(vec![
            FrontmatterField::new("title", FieldType::Text, "Title"),
            FrontmatterField::new("status", FieldType::Select, "Status")
                .with_options(["draft", "published", "archived"])
                .with_default("draft"),
            FrontmatterField::new("tags", FieldType::MultiSelect, "Tags")
                .with_options(["project", "work"])
                .with_default("project"),
            FrontmatterField::new("due", FieldType::Date, "Due date"),
            FrontmatterField::new("created", FieldType::Date, "Created")
                .with_templater_timestamp()
                .with_default("<% tp.date.now(\"YYYY-MM-DD\") %>"),
        ])
    }

    #[test]
    fn test_precedence_scenario() {
        let preset = preset(vec![
            FrontmatterField::new("status", FieldType::Text, "Status").with_default("draft"),
        ]);
        let merged = merge_frontmatter_with_user_input(
            Some(&preset),
            &fm("status: published\ntitle: Old"),
            &fm("status: archived"),
            &fm("title: New"),
        );
        assert_eq!(merged, fm("status: archived\ntitle: New"));
    }

    #[test]
    fn test_default_visible_only_when_unset() {
        let merged = merge_frontmatter_with_user_input(
            Some(&project_preset()),
            &Frontmatter::new(),
            &fm("title: From template"),
            &Frontmatter::new(),
        );
        assert_eq!(merged.get("status"), Some(&Value::from("draft")));
        assert_eq!(merged.get("title"), Some(&Value::from("From template")));
    }

    #[test]
    fn test_tag_union_order() {
        let merged = merge_frontmatters(&fm("tags: [a, b]"), &fm("tags: [b, c]"));
        assert_eq!(merged, fm("tags: [a, b, c]"));

        // Idempotent.
        let again = merge_frontmatters(&merged, &fm("tags: [b, c]"));
        assert_eq!(again, merged);
    }

    #[test]
    fn test_tag_scalars_and_falsy_values() {
        assert_eq!(
            merge_frontmatters(&fm("tags: solo"), &fm("tags: [x]")),
            fm("tags: [solo, x]")
        );
        assert_eq!(
            merge_frontmatters(&fm("tags: [a]"), &fm("tags: ''")),
            fm("tags: [a]")
        );
        assert_eq!(
            merge_frontmatters(&fm("title: x"), &fm("tags: null")),
            fm("title: x\ntags: []")
        );
        // Without tags in the override, base tags are left alone.
        assert_eq!(
            merge_frontmatters(&fm("tags: solo"), &fm("title: y")),
            fm("tags: solo\ntitle: y")
        );
    }

    #[test]
    fn test_tags_from_every_tier_survive_once() {
        let merged = merge_frontmatter_with_user_input(
            Some(&project_preset()),
            &fm("tags: [note, project]"),
            &fm("tags: [template]"),
            &fm("tags: [user, note]"),
        );
        assert_eq!(
            merged.get("tags"),
            Some(&fm("v: [project, note, template, user]")["v"])
        );
    }

    #[test]
    fn test_reserved_key_never_leaks() {
        let tiers = [
            fm("fast-templater-config: meeting"),
            fm("fast-templater-config: [meeting]"),
        ];
        for source in &tiers {
            for slot in 0..3 {
                let mut inputs = [Frontmatter::new(), Frontmatter::new(), Frontmatter::new()];
                inputs[slot] = source.clone();
                let merged = merge_frontmatter_with_user_input(
                    Some(&project_preset()),
                    &inputs[0],
                    &inputs[1],
                    &inputs[2],
                );
                assert!(!merged.contains_key(RESERVED_CONFIG_KEY));
            }
        }
    }

    #[test]
    fn test_key_order_follows_preset() {
        let merged = merge_frontmatter_with_user_input(
            Some(&project_preset()),
            &fm("zzz: extra\ndue: 2024-01-02\naaa: other"),
            &fm("title: T\nbonus: 1"),
            &fm("status: published"),
        );
        assert_eq!(
            keys(&merged),
            vec!["title", "status", "tags", "due", "created", "zzz", "aaa", "bonus"]
        );
    }

    #[test]
    fn test_no_preset_keeps_merge_order() {
        let merged = merge_frontmatter_with_user_input(
            None,
            &fm("b: 1\na: 2"),
            &fm("c: 3\nb: 4"),
            &Frontmatter::new(),
        );
        assert_eq!(merged, fm("b: 4\na: 2\nc: 3"));
    }

    #[test]
    fn test_multi_select_default_must_be_option() {
        let p = preset(vec![
            FrontmatterField::new("tags", FieldType::MultiSelect, "Tags")
                .with_options(["a", "b"])
                .with_default("c"),
            FrontmatterField::new("kind", FieldType::MultiSelect, "Kind")
                .with_options(["x", "y"])
                .with_default("y"),
            FrontmatterField::new("blank", FieldType::Text, "Blank").with_default("   "),
        ]);
        assert_eq!(extract_preset_defaults(&p), fm("kind: [y]"));
    }

    #[test]
    fn test_convert_form_data() {
        let mut form = FormData::new();
        form.insert("title".into(), "  Hello  ".into());
        form.insert("status".into(), "".into());
        form.insert("tags".into(), FormValue::List(vec!["work".into(), " ".into()]));
        form.insert("due".into(), "2024/03/05".into());
        form.insert("created".into(), "<% tp.date.now(\"YYYY\") %>".into());
        form.insert("unknown".into(), "ignored".into());

        let out = convert_form_data_to_frontmatter(&project_preset(), &form).unwrap();
        assert_eq!(
            out,
            fm("title: Hello\nstatus: ''\ntags: [work]\ndue: '2024-03-05'\ncreated: <% tp.date.now(\"YYYY\") %>")
        );
    }

    #[test]
    fn test_convert_empty_multi_select_and_date() {
        let mut form = FormData::new();
        form.insert("tags".into(), FormValue::List(Vec::new()));
        form.insert("due".into(), "  ".into());
        let out = convert_form_data_to_frontmatter(&project_preset(), &form).unwrap();
        assert_eq!(out, fm("tags: ''\ndue: ''"));
    }

    #[test]
    fn test_invalid_date_names_label() {
        let mut form = FormData::new();
        form.insert("due".into(), "next tuesday".into());
        let err = convert_form_data_to_frontmatter(&project_preset(), &form).unwrap_err();
        match err {
            TemplaterError::InvalidDate { field, value } => {
                assert_eq!(field, "Due date");
                assert_eq!(value, "next tuesday");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cleared_field_overrides_lower_tiers() {
        let mut form = FormData::new();
        form.insert("title".into(), "".into());
        let user = convert_form_data_to_frontmatter(&project_preset(), &form).unwrap();
        let merged = merge_frontmatter_with_user_input(
            Some(&project_preset()),
            &fm("title: Existing"),
            &Frontmatter::new(),
            &user,
        );
        assert_eq!(merged.get("title"), Some(&Value::from("")));
    }

    #[test]
    fn test_convert_untyped() {
        let mut form = FormData::new();
        form.insert("b".into(), " text ".into());
        form.insert("a".into(), FormValue::List(vec!["x".into(), "y".into()]));
        let out = convert_untyped_form_data(&form);
        assert_eq!(keys(&out), vec!["a", "b"]);
        assert_eq!(out, fm("a: [x, y]\nb: text"));
    }

    #[test]
    fn test_parse_calendar_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5);
        for input in [
            "2024-03-05",
            "2024/03/05",
            "03/05/2024",
            "March 5, 2024",
            "Mar 5, 2024",
            "5 March 2024",
            "20240305",
            "2024-03-05T10:30:00Z",
            "2024-03-05T10:30",
            "2024-03-05 10:30:00",
        ] {
            assert_eq!(parse_calendar_date(input), expected, "input: {input}");
        }
        assert_eq!(parse_calendar_date("2024-02-30"), None);
        assert_eq!(parse_calendar_date("soon"), None);
    }
}
