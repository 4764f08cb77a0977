//! Error types and exit codes for Fast Templater.

use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes used by the CLI.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const PRESET_NOT_FOUND: i32 = 3;
    pub const VALIDATION_ERROR: i32 = 4;
    pub const INVALID_INPUT: i32 = 5;
}

/// Main error type for Fast Templater operations.
///
/// Only errors the caller has to act on live here. Recoverable conditions
/// (unparseable frontmatter, a failing macro expansion) are handled where they
/// occur by falling back to an empty or literal value.
#[derive(Error, Debug)]
pub enum TemplaterError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid preset '{preset}': {message}")]
    InvalidPreset { preset: String, message: String },

    #[error("Invalid preset id '{id}': {message}")]
    InvalidPresetId { id: String, message: String },

    #[error("Preset id already exists: {0}")]
    DuplicatePresetId(String),

    #[error("Preset not found: {0}")]
    PresetNotFound(String),

    #[error("Invalid date for field '{field}': '{value}'")]
    InvalidDate { field: String, value: String },

    #[error("Invalid preset import: {0}")]
    InvalidImport(String),

    #[error("No active markdown editor")]
    NoActiveEditor,

    #[error("Note not found: {0}")]
    NoteNotFound(PathBuf),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Vault not found at: {0}")]
    VaultNotFound(PathBuf),

    #[error("Macro expansion failed: {0}")]
    Expansion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("{0}")]
    Other(String),
}

impl TemplaterError {
    /// Returns the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            TemplaterError::NoteNotFound(_)
            | TemplaterError::TemplateNotFound(_)
            | TemplaterError::VaultNotFound(_) => exit_code::NOT_FOUND,
            TemplaterError::PresetNotFound(_) => exit_code::PRESET_NOT_FOUND,
            TemplaterError::InvalidField { .. }
            | TemplaterError::InvalidPreset { .. }
            | TemplaterError::InvalidPresetId { .. }
            | TemplaterError::DuplicatePresetId(_)
            | TemplaterError::InvalidDate { .. } => exit_code::VALIDATION_ERROR,
            TemplaterError::InvalidImport(_) | TemplaterError::Yaml(_) | TemplaterError::Json(_) => {
                exit_code::INVALID_INPUT
            }
            _ => exit_code::GENERAL_ERROR,
        }
    }
}

/// Result type alias for Fast Templater operations.
pub type Result<T> = std::result::Result<T, TemplaterError>;
