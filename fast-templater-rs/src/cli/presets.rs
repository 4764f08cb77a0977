//! Preset commands implementation.

use crate::cli::args::{
    CreatePresetArgs, DescribePresetArgs, ExportPresetsArgs, FieldDefArgs, ImportPresetsArgs,
    PresetCommands, RenamePresetArgs, SetFieldsArgs,
};
use crate::cli::output::{CommandResponse, Output};
use crate::error::{Result, TemplaterError};
use crate::preset::{ImportStrategy, PresetDraft};
use crate::types::{FieldType, FrontmatterField, FrontmatterPreset};
use crate::vault::Vault;
use serde::Serialize;
use std::io::Read;

#[derive(Debug, Serialize)]
pub struct PresetSummary<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub fields: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

impl<'a> From<&'a FrontmatterPreset> for PresetSummary<'a> {
    fn from(preset: &'a FrontmatterPreset) -> Self {
        Self {
            id: &preset.id,
            name: &preset.name,
            fields: preset.fields.len(),
            description: preset.description.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PresetListResponse<'a> {
    pub presets: Vec<PresetSummary<'a>>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct SuggestIdResponse {
    pub name: String,
    pub id: String,
}

pub fn run(vault: &mut Vault, command: &PresetCommands, output: &Output) -> Result<()> {
    match command {
        PresetCommands::List => list(vault, output),
        PresetCommands::Show(args) => {
            let presets = vault.presets();
            output.print(presets.require(&args.id)?)
        }
        PresetCommands::Create(args) => create(vault, args, output),
        PresetCommands::Rename(args) => rename(vault, args, output),
        PresetCommands::Describe(args) => describe(vault, args, output),
        PresetCommands::SetFields(args) => set_fields(vault, args, output),
        PresetCommands::Duplicate(args) => {
            let copy = vault.presets().duplicate(&args.id)?;
            output.print(&CommandResponse::data(copy).with_message(format!("Duplicated '{}'", args.id)))
        }
        PresetCommands::Delete(args) => {
            let removed = vault.presets().delete(&args.id)?;
            output.print(&CommandResponse::message(format!(
                "Deleted preset '{}' ({})",
                removed.name, removed.id
            )))
        }
        PresetCommands::Export(args) => export(vault, args, output),
        PresetCommands::Import(args) => import(vault, args, output),
        PresetCommands::SuggestId(args) => {
            let id = vault.presets().suggest_id(&args.name);
            output.print(&SuggestIdResponse {
                name: args.name.clone(),
                id,
            })
        }
    }
}

fn list(vault: &mut Vault, output: &Output) -> Result<()> {
    let presets = &vault.settings().get().frontmatter_presets;
    output.print(&PresetListResponse {
        presets: presets.iter().map(PresetSummary::from).collect(),
        total: presets.len(),
    })
}

fn create(vault: &mut Vault, args: &CreatePresetArgs, output: &Output) -> Result<()> {
    let mut draft = PresetDraft::new(&args.name).with_fields(read_fields(&args.fields)?);
    if let Some(id) = &args.id {
        draft = draft.with_id(id);
    }
    if let Some(description) = &args.description {
        draft = draft.with_description(description);
    }
    let preset = vault.presets().create(draft)?;
    output.print(&CommandResponse::data(&preset).with_message(format!("Created preset '{}'", preset.id)))
}

fn rename(vault: &mut Vault, args: &RenamePresetArgs, output: &Output) -> Result<()> {
    vault.presets().rename(&args.id, &args.name)?;
    output.print(&CommandResponse::message(format!(
        "Renamed preset '{}' to '{}'",
        args.id,
        args.name.trim()
    )))
}

fn describe(vault: &mut Vault, args: &DescribePresetArgs, output: &Output) -> Result<()> {
    vault
        .presets()
        .set_description(&args.id, args.description.clone())?;
    let message = match &args.description {
        Some(_) => format!("Updated description of '{}'", args.id),
        None => format!("Cleared description of '{}'", args.id),
    };
    output.print(&CommandResponse::message(message))
}

fn set_fields(vault: &mut Vault, args: &SetFieldsArgs, output: &Output) -> Result<()> {
    let fields = read_fields(&args.fields)?;
    let mut presets = vault.presets();
    presets.update_fields(&args.id, fields)?;
    let preset = presets.require(&args.id)?;
    output.print(&CommandResponse::data(preset).with_message(format!("Updated fields of '{}'", args.id)))
}

fn export(vault: &mut Vault, args: &ExportPresetsArgs, output: &Output) -> Result<()> {
    let presets = vault.presets();
    match &args.output {
        Some(path) => {
            std::fs::write(path, presets.export_json()?)?;
            output.print(&CommandResponse::message(format!(
                "Exported {} presets to {}",
                presets.list().len(),
                path.display()
            )))
        }
        None => output.print(&presets.export()),
    }
}

fn import(vault: &mut Vault, args: &ImportPresetsArgs, output: &Output) -> Result<()> {
    let json = if args.file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(&args.file)?
    };
    let strategy = if args.replace {
        ImportStrategy::Replace
    } else {
        ImportStrategy::Merge
    };
    let report = vault.presets().import_json(&json, strategy)?;
    for renamed in &report.renamed {
        output.warn(&format!(
            "Preset '{}' imported as '{}' (id '{}' was taken)",
            renamed.name, renamed.to, renamed.from
        ));
    }
    output.print(&report)
}

fn read_fields(args: &FieldDefArgs) -> Result<Vec<FrontmatterField>> {
    if let Some(path) = &args.fields_file {
        let json = std::fs::read_to_string(path)?;
        return Ok(serde_json::from_str(&json)?);
    }
    args.fields.iter().map(|def| parse_field_def(def)).collect()
}

/// Parse `KEY:TYPE[:LABEL[:OPTIONS[:DEFAULT]]]`. The label defaults to the
/// key and options are separated by `|`.
pub fn parse_field_def(def: &str) -> Result<FrontmatterField> {
    let mut parts = def.splitn(5, ':');
    let key = parts.next().unwrap_or_default().trim();
    let kind = parts.next().map(str::trim).ok_or_else(|| TemplaterError::InvalidField {
        field: key.to_string(),
        message: format!("expected KEY:TYPE, got '{}'", def),
    })?;

    let (field_type, timestamp) = match kind {
        "timestamp" => (FieldType::Date, true),
        other => (
            FieldType::parse(other).ok_or_else(|| TemplaterError::InvalidField {
                field: key.to_string(),
                message: format!(
                    "unknown type '{}' (expected text, select, date, multi-select or timestamp)",
                    other
                ),
            })?,
            false,
        ),
    };

    let label = parts
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(key);
    let options: Vec<String> = parts
        .next()
        .map(|o| {
            o.split('|')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let default = parts.next().unwrap_or_default();

    let mut field = FrontmatterField::new(key, field_type, label)
        .with_options(options)
        .with_default(default);
    if timestamp {
        field = field.with_templater_timestamp();
    }
    Ok(field)
}
