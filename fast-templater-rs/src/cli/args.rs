//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fast-templater")]
#[command(author, version, about = "Insert templates into Obsidian-style vaults with preset-driven frontmatter", long_about = None)]
pub struct Cli {
    /// Path to the vault (overrides config default)
    #[arg(long, global = true)]
    pub vault: Option<PathBuf>,

    /// Path to the settings file (defaults to the plugin's data.json in the vault)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Output as JSON (default)
    #[arg(long, global = true, conflicts_with_all = ["yaml", "toml"])]
    pub json: bool,

    /// Output as YAML
    #[arg(long, global = true, conflicts_with_all = ["json", "toml"])]
    pub yaml: bool,

    /// Output as TOML
    #[arg(long, global = true, conflicts_with_all = ["json", "yaml"])]
    pub toml: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (can be repeated)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Skip macro expansion even if an expander is configured
    #[arg(long, global = true)]
    pub no_templater: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        if self.yaml {
            OutputFormat::Yaml
        } else if self.toml {
            OutputFormat::Toml
        } else {
            OutputFormat::Json
        }
    }

    /// Default log directive for the verbosity flags.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Toml,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage frontmatter presets
    #[command(subcommand)]
    Presets(PresetCommands),

    /// Browse templates
    #[command(subcommand)]
    Templates(TemplateCommands),

    /// Split a note into frontmatter and body
    Parse(ParseArgs),

    /// Insert a template into a note
    Insert(InsertArgs),

    /// Inspect plugin settings
    #[command(subcommand)]
    Settings(SettingsCommands),
}

// === Presets ===

#[derive(Subcommand, Debug)]
pub enum PresetCommands {
    /// List presets
    List,

    /// Show one preset
    Show(PresetIdArgs),

    /// Create a preset
    Create(CreatePresetArgs),

    /// Rename a preset (the id is kept)
    Rename(RenamePresetArgs),

    /// Set or clear a preset's description
    Describe(DescribePresetArgs),

    /// Replace a preset's fields
    #[command(name = "set-fields")]
    SetFields(SetFieldsArgs),

    /// Copy a preset under a new id
    Duplicate(PresetIdArgs),

    /// Delete a preset
    Delete(PresetIdArgs),

    /// Export presets as JSON
    Export(ExportPresetsArgs),

    /// Import presets from JSON
    Import(ImportPresetsArgs),

    /// Preview the id a new preset with this name would get
    #[command(name = "suggest-id")]
    SuggestId(SuggestIdArgs),
}

#[derive(Args, Debug)]
pub struct PresetIdArgs {
    /// Preset id
    pub id: String,
}

/// Field definitions, shared by `create` and `set-fields`.
#[derive(Args, Debug, Default)]
pub struct FieldDefArgs {
    /// Field as KEY:TYPE[:LABEL[:OPTIONS[:DEFAULT]]], options separated by '|'.
    /// TYPE is text, select, date, multi-select, or timestamp (a date filled by
    /// the macro expander). Can be repeated.
    #[arg(long = "field", value_name = "FIELD")]
    pub fields: Vec<String>,

    /// JSON file with an array of field objects (as stored in settings)
    #[arg(long, conflicts_with = "fields")]
    pub fields_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CreatePresetArgs {
    /// Display name
    pub name: String,

    /// Explicit id (generated from the name if omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Description
    #[arg(long)]
    pub description: Option<String>,

    #[command(flatten)]
    pub fields: FieldDefArgs,
}

#[derive(Args, Debug)]
pub struct RenamePresetArgs {
    /// Preset id
    pub id: String,

    /// New display name
    pub name: String,
}

#[derive(Args, Debug)]
pub struct DescribePresetArgs {
    /// Preset id
    pub id: String,

    /// New description (omit to clear)
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct SetFieldsArgs {
    /// Preset id
    pub id: String,

    #[command(flatten)]
    pub fields: FieldDefArgs,
}

#[derive(Args, Debug)]
pub struct ExportPresetsArgs {
    /// Write the export to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ImportPresetsArgs {
    /// JSON file to import ('-' reads stdin)
    pub file: PathBuf,

    /// Replace all existing presets instead of merging
    #[arg(long)]
    pub replace: bool,
}

#[derive(Args, Debug)]
pub struct SuggestIdArgs {
    /// Preset name
    pub name: String,
}

// === Templates ===

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// List templates in the template folder
    List,

    /// Search templates by name or path
    Search(SearchTemplatesArgs),

    /// Rank presets for a template
    Match(MatchTemplateArgs),
}

#[derive(Args, Debug)]
pub struct SearchTemplatesArgs {
    /// Search query (empty lists all, recently used first)
    #[arg(default_value = "")]
    pub query: String,
}

#[derive(Args, Debug)]
pub struct MatchTemplateArgs {
    /// Template path or name
    pub template: String,

    /// Include presets below the "worth considering" threshold
    #[arg(long)]
    pub all: bool,
}

// === Parse ===

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Note path (relative to the vault)
    pub path: String,
}

// === Insert ===

#[derive(Args, Debug)]
pub struct InsertArgs {
    /// Template path or name
    pub template: String,

    /// Note to insert into (relative to the vault)
    #[arg(long)]
    pub into: String,

    /// Preset to merge with (defaults to the one the template binds)
    #[arg(long)]
    pub preset: Option<String>,

    /// Field value as KEY=VALUE (repeat a key for multiple values)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub values: Vec<String>,

    /// Insert at the start of this 1-based line (default: end of note)
    #[arg(long)]
    pub line: Option<usize>,

    /// Print the resulting note without writing it
    #[arg(long)]
    pub dry_run: bool,
}

// === Settings ===

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Show the effective settings
    Show,

    /// Show where settings are stored
    Path,
}
