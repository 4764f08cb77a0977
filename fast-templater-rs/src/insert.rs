//! Inserting a template into the active note.

use crate::editor::Editor;
use crate::error::{Result, TemplaterError};
use crate::expander::{MacroExpander, expand_or_literal};
use crate::library::bound_preset_ids;
use crate::merge::{
    FormData, convert_form_data_to_frontmatter, convert_untyped_form_data,
    merge_frontmatter_with_user_input,
};
use crate::parser::{parse_frontmatter, splice_frontmatter};
use crate::settings::{Settings, SettingsManager, SettingsStorage};
use crate::types::{Frontmatter, FrontmatterPreset, Template};
use serde::Serialize;
use tracing::{debug, warn};

/// What to insert.
#[derive(Debug, Clone, Copy)]
pub struct InsertRequest<'a> {
    pub template: &'a Template,
    /// Preset to merge with. When `None`, the first existing preset bound by
    /// the template's `fast-templater-config` is used.
    pub preset_id: Option<&'a str>,
    /// Raw user input for the preset's fields.
    pub form: Option<&'a FormData>,
}

impl<'a> InsertRequest<'a> {
    pub fn new(template: &'a Template) -> Self {
        Self {
            template,
            preset_id: None,
            form: None,
        }
    }

    pub fn with_preset(mut self, preset_id: &'a str) -> Self {
        self.preset_id = Some(preset_id);
        self
    }

    pub fn with_form(mut self, form: &'a FormData) -> Self {
        self.form = Some(form);
        self
    }
}

/// What an insertion did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InsertOutcome {
    /// Whether the note's frontmatter was rewritten.
    pub frontmatter_merged: bool,
    pub preset_id: Option<String>,
    /// Whether macro expansion ran successfully.
    pub expanded: bool,
    /// Problems that were worked around.
    pub warnings: Vec<String>,
}

fn resolve_preset<'s>(
    settings: &'s Settings,
    explicit: Option<&str>,
    template_frontmatter: &Frontmatter,
) -> Result<Option<&'s FrontmatterPreset>> {
    if let Some(id) = explicit {
        return settings
            .preset(id)
            .map(Some)
            .ok_or_else(|| TemplaterError::PresetNotFound(id.to_string()));
    }
    Ok(bound_preset_ids(template_frontmatter)
        .iter()
        .find_map(|id| settings.preset(id)))
}

/// Insert a template at the editor's cursor, merging its frontmatter into the
/// note's.
///
/// Invalid user input fails before the editor is touched. If the merged
/// frontmatter cannot be written, only the template body is inserted and the
/// outcome carries a warning.
pub fn insert_template(
    editor: Option<&mut dyn Editor>,
    request: InsertRequest<'_>,
    settings: &Settings,
    expander: &dyn MacroExpander,
) -> Result<InsertOutcome> {
    let editor = editor.ok_or(TemplaterError::NoActiveEditor)?;
    let template = request.template;

    let (content, expanded) = if settings.enable_templater_integration {
        expand_or_literal(expander, template)
    } else {
        (template.content.clone(), false)
    };
    let mut outcome = InsertOutcome {
        expanded,
        ..Default::default()
    };

    let parsed = parse_frontmatter(&content);
    let preset = resolve_preset(settings, request.preset_id, &parsed.frontmatter)?;
    outcome.preset_id = preset.map(|p| p.id.clone());

    let user = match (request.form, preset) {
        (Some(form), Some(preset)) => convert_form_data_to_frontmatter(preset, form)?,
        (Some(form), None) => convert_untyped_form_data(form),
        (None, _) => Frontmatter::new(),
    };

    let nothing_to_merge = parsed.frontmatter.is_empty() && preset.is_none() && user.is_empty();
    if !settings.enable_frontmatter_merge || nothing_to_merge {
        debug!(template = %template.path, "inserting template without frontmatter merge");
        editor.replace_selection(&content);
        return Ok(outcome);
    }

    let note = parse_frontmatter(&editor.content());
    let merged = merge_frontmatter_with_user_input(preset, &note.frontmatter, &parsed.frontmatter, &user);

    if merged.is_empty() {
        debug!("merged frontmatter is empty, leaving the note's frontmatter alone");
    } else {
        match splice_frontmatter(editor, &merged, note.position) {
            Ok(()) => outcome.frontmatter_merged = true,
            Err(e) => {
                warn!(error = %e, "failed to write merged frontmatter, inserting body only");
                outcome
                    .warnings
                    .push(format!("Frontmatter was not updated: {}", e));
            }
        }
    }

    editor.replace_selection(&parsed.body);
    Ok(outcome)
}

/// [`insert_template`], then remember the template as recently used.
pub fn insert_and_record<S: SettingsStorage>(
    editor: Option<&mut dyn Editor>,
    request: InsertRequest<'_>,
    settings: &mut SettingsManager<S>,
    expander: &dyn MacroExpander,
) -> Result<InsertOutcome> {
    let mut outcome = insert_template(editor, request, settings.get(), expander)?;
    record_template_use(settings, &request.template.path, &mut outcome);
    Ok(outcome)
}

/// Remember `template_path` as recently used. A failed save only adds a
/// warning to `outcome`.
pub fn record_template_use<S: SettingsStorage>(
    settings: &mut SettingsManager<S>,
    template_path: &str,
    outcome: &mut InsertOutcome,
) {
    if let Err(e) = settings.record_recent_template(template_path) {
        warn!(error = %e, "failed to record recent template");
        outcome
            .warnings
            .push(format!("Could not update recent templates: {}", e));
    }
}
