//! Preset CRUD.
//!
//! The store is the only way presets change: every mutation is validated and
//! then persisted through the [`SettingsManager`] it borrows. A mutation whose
//! save fails leaves the in-memory list as it was.

use crate::error::{Result, TemplaterError};
use crate::expander::timestamp_expression;
use crate::preset::id::generate_unique_preset_id;
use crate::preset::transfer::{self, ImportReport, ImportStrategy, PresetExport};
use crate::settings::{SettingsManager, SettingsStorage};
use crate::types::{FrontmatterField, FrontmatterPreset};
use crate::validation::{clean_options, validate_fields, validate_preset_id, validate_preset_name};
use tracing::info;

/// Input for [`PresetStore::create`].
#[derive(Debug, Clone, Default)]
pub struct PresetDraft {
    pub name: String,
    /// Explicit id; generated from the name when `None`.
    pub id: Option<String>,
    pub fields: Vec<FrontmatterField>,
    pub description: Option<String>,
}

impl PresetDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_fields(mut self, fields: Vec<FrontmatterField>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Preset operations over a borrowed settings manager.
pub struct PresetStore<'a, S: SettingsStorage> {
    settings: &'a mut SettingsManager<S>,
}

impl<'a, S: SettingsStorage> PresetStore<'a, S> {
    pub fn new(settings: &'a mut SettingsManager<S>) -> Self {
        Self { settings }
    }

    pub fn list(&self) -> &[FrontmatterPreset] {
        &self.settings.get().frontmatter_presets
    }

    pub fn get(&self, id: &str) -> Option<&FrontmatterPreset> {
        self.list().iter().find(|p| p.id == id)
    }

    /// Like [`get`](Self::get), but a missing preset is an error.
    pub fn require(&self, id: &str) -> Result<&FrontmatterPreset> {
        self.get(id)
            .ok_or_else(|| TemplaterError::PresetNotFound(id.to_string()))
    }

    /// The id [`create`](Self::create) would generate for `name` right now.
    pub fn suggest_id(&self, name: &str) -> String {
        generate_unique_preset_id(name, self.list())
    }

    pub fn create(&mut self, draft: PresetDraft) -> Result<FrontmatterPreset> {
        validate_preset_name(&draft.name)?;
        let id = match draft.id {
            Some(id) => {
                let id = id.trim().to_string();
                validate_preset_id(&id, self.list(), None)?;
                id
            }
            None => self.suggest_id(&draft.name),
        };
        let fields = self.prepare_fields(draft.fields)?;

        let preset = FrontmatterPreset {
            id,
            name: draft.name.trim().to_string(),
            fields,
            description: clean_description(draft.description),
        };
        let mut presets = self.list().to_vec();
        presets.push(preset.clone());
        self.commit(presets)?;
        info!(id = %preset.id, "created preset");
        Ok(preset)
    }

    pub fn rename(&mut self, id: &str, new_name: &str) -> Result<()> {
        validate_preset_name(new_name)?;
        self.edit(id, |preset| preset.name = new_name.trim().to_string())?;
        info!(id, name = new_name, "renamed preset");
        Ok(())
    }

    pub fn set_description(&mut self, id: &str, description: Option<String>) -> Result<()> {
        self.edit(id, |preset| preset.description = clean_description(description))
    }

    /// Replace the whole field list of a preset.
    pub fn update_fields(&mut self, id: &str, fields: Vec<FrontmatterField>) -> Result<()> {
        self.require(id)?;
        let fields = self.prepare_fields(fields)?;
        self.edit(id, |preset| preset.fields = fields)?;
        info!(id, "updated preset fields");
        Ok(())
    }

    /// Copy a preset under a new name and a freshly generated id.
    pub fn duplicate(&mut self, id: &str) -> Result<FrontmatterPreset> {
        let source = self.require(id)?.clone();
        let name = format!("{} (copy)", source.name);
        let copy = FrontmatterPreset {
            id: self.suggest_id(&name),
            name,
            fields: source.fields,
            description: source.description,
        };
        let mut presets = self.list().to_vec();
        presets.push(copy.clone());
        self.commit(presets)?;
        info!(from = id, id = %copy.id, "duplicated preset");
        Ok(copy)
    }

    pub fn delete(&mut self, id: &str) -> Result<FrontmatterPreset> {
        let index = self
            .list()
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| TemplaterError::PresetNotFound(id.to_string()))?;
        let mut presets = self.list().to_vec();
        let removed = presets.remove(index);
        self.commit(presets)?;
        info!(id, "deleted preset");
        Ok(removed)
    }

    pub fn export(&self) -> PresetExport {
        transfer::export_presets(self.list())
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }

    /// Import presets from a JSON payload. Nothing changes unless the whole
    /// payload validates.
    pub fn import_json(&mut self, json: &str, strategy: ImportStrategy) -> Result<ImportReport> {
        let imported = transfer::parse_import(json)?;
        let (merged, report) = transfer::apply_import(self.list(), imported, strategy);
        self.commit(merged)?;
        info!(
            imported = report.imported.len(),
            renamed = report.renamed.len(),
            ?strategy,
            "imported presets"
        );
        Ok(report)
    }

    fn prepare_fields(&self, fields: Vec<FrontmatterField>) -> Result<Vec<FrontmatterField>> {
        let date_format = &self.settings.get().default_date_format;
        let fields: Vec<FrontmatterField> = fields
            .into_iter()
            .map(|mut field| {
                field.key = field.key.trim().to_string();
                field.label = field.label.trim().to_string();
                field.options = clean_options(&field.options);
                if field.is_timestamp() && field.default.trim().is_empty() {
                    field.default = timestamp_expression(date_format);
                }
                field
            })
            .collect();
        validate_fields(&fields)?;
        Ok(fields)
    }

    /// Apply `change` to a copy of one preset and commit the result.
    fn edit(&mut self, id: &str, change: impl FnOnce(&mut FrontmatterPreset)) -> Result<()> {
        let mut presets = self.list().to_vec();
        let preset = presets
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| TemplaterError::PresetNotFound(id.to_string()))?;
        change(preset);
        self.commit(presets)
    }

    /// Swap in `presets` and persist, restoring the previous list if the
    /// save fails.
    fn commit(&mut self, presets: Vec<FrontmatterPreset>) -> Result<()> {
        let current = &mut self.settings.get_mut().frontmatter_presets;
        let previous = std::mem::replace(current, presets);
        if let Err(e) = self.settings.save() {
            self.settings.get_mut().frontmatter_presets = previous;
            return Err(e);
        }
        Ok(())
    }
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}
