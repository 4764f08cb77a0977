//! Insert command implementation.

use crate::cli::args::InsertArgs;
use crate::cli::output::Output;
use crate::editor::{Editor, EditorPosition, TextBuffer};
use crate::error::{Result, TemplaterError};
use crate::insert::{InsertOutcome, InsertRequest, insert_template, record_template_use};
use crate::merge::{FormData, FormValue};
use crate::vault::Vault;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct InsertResponse {
    pub path: String,
    pub template: String,
    #[serde(flatten)]
    pub outcome: InsertOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

pub fn run(vault: &mut Vault, args: &InsertArgs, no_templater: bool, output: &Output) -> Result<()> {
    let template = vault.library()?.load(&args.template)?;
    let note_path = vault.normalize_note_path(&args.into);
    let content = vault.read_note(&note_path)?;
    let form = parse_form_values(&args.values)?;

    let mut buffer = TextBuffer::new(content);
    if let Some(line) = args.line {
        buffer.set_cursor(EditorPosition::line_start(line.saturating_sub(1)));
    }
    debug!(cursor = ?buffer.cursor(), "inserting at cursor");

    let mut request = InsertRequest::new(&template);
    if let Some(preset) = &args.preset {
        request = request.with_preset(preset);
    }
    if !form.is_empty() {
        request = request.with_form(&form);
    }

    let expander = vault.expander(no_templater);
    let mut outcome =
        insert_template(Some(&mut buffer), request, vault.settings().get(), expander.as_ref())?;

    let content = buffer.into_content();
    let content = if args.dry_run {
        Some(content)
    } else {
        save_note(vault, &note_path, &content, &template.path, &mut outcome)?;
        output.info(&format!(
            "Inserted '{}' into {}",
            template.name,
            note_path.display()
        ));
        None
    };

    for warning in &outcome.warnings {
        output.warn(warning);
    }

    output.print(&InsertResponse {
        path: note_path.to_string_lossy().to_string(),
        template: template.path.clone(),
        outcome,
        content,
    })
}

/// Write the note, then record the template as used. Nothing is recorded
/// when the write fails.
fn save_note(
    vault: &mut Vault,
    note_path: &Path,
    content: &str,
    template_path: &str,
    outcome: &mut InsertOutcome,
) -> Result<()> {
    vault.write_note(note_path, content)?;
    record_template_use(vault.settings_mut(), template_path, outcome);
    Ok(())
}

/// Build form data from `KEY=VALUE` pairs. A key given more than once
/// collects its values into a list.
pub fn parse_form_values(pairs: &[String]) -> Result<FormData> {
    let mut form = FormData::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            TemplaterError::Other(format!("Expected KEY=VALUE, got '{}'", pair))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(TemplaterError::Other(format!("Missing key in '{}'", pair)));
        }
        let value = value.to_string();
        match form.remove(key) {
            None => {
                form.insert(key.to_string(), FormValue::Text(value));
            }
            Some(FormValue::Text(first)) => {
                form.insert(key.to_string(), FormValue::List(vec![first, value]));
            }
            Some(FormValue::List(mut items)) => {
                items.push(value);
                form.insert(key.to_string(), FormValue::List(items));
            }
        }
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn pairs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_values() {
        let form = parse_form_values(&pairs(&["title=Hello", "due=2024-01-02"])).unwrap();
        assert_eq!(form.get("title"), Some(&FormValue::Text("Hello".into())));
        assert_eq!(form.get("due"), Some(&FormValue::Text("2024-01-02".into())));
    }

    #[test]
    fn test_repeated_key_becomes_list() {
        let form = parse_form_values(&pairs(&["tags=a", "tags=b", "tags=c"])).unwrap();
        assert_eq!(
            form.get("tags"),
            Some(&FormValue::List(vec!["a".into(), "b".into(), "c".into()]))
        );
    }

    #[test]
    fn test_value_may_contain_equals() {
        let form = parse_form_values(&pairs(&["expr=a=b"])).unwrap();
        assert_eq!(form.get("expr"), Some(&FormValue::Text("a=b".into())));
    }

    #[test]
    fn test_malformed_pairs() {
        assert!(parse_form_values(&pairs(&["novalue"])).is_err());
        assert!(parse_form_values(&pairs(&["=x"])).is_err());
    }

    #[test]
    fn test_save_note_records_template() {
        let dir = TempDir::new().unwrap();
        let mut vault = Vault::open(dir.path(), Config::default(), None).unwrap();
        let mut outcome = InsertOutcome::default();

        save_note(
            &mut vault,
            Path::new("Notes/Today.md"),
            "Hi\n",
            "Templates/Plain.md",
            &mut outcome,
        )
        .unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("Notes/Today.md")).unwrap(), "Hi\n");
        assert_eq!(
            vault.settings().get().recently_used_templates,
            vec!["Templates/Plain.md".to_string()]
        );
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_failed_write_records_nothing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("blocked"), "a file, not a folder").unwrap();
        let mut vault = Vault::open(dir.path(), Config::default(), None).unwrap();
        let mut outcome = InsertOutcome::default();

        let result = save_note(
            &mut vault,
            Path::new("blocked/Note.md"),
            "Hi\n",
            "Templates/Plain.md",
            &mut outcome,
        );
        assert!(matches!(result, Err(TemplaterError::Io(_))));
        assert!(vault.settings().get().recently_used_templates.is_empty());
        assert!(!dir.path().join(".obsidian").exists());
    }
}
