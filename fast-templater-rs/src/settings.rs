//! Persisted plugin settings.
//!
//! The settings blob is a single JSON object. Loading is lenient: every scalar
//! setting falls back to its default on its own, and presets and fields are
//! validated one by one so that a corrupt entry never costs the rest of the
//! collection.

use crate::error::Result;
use crate::types::{FieldType, FrontmatterField, FrontmatterPreset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_TEMPLATE_FOLDER: &str = "Templates";
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";
pub const MAX_RECENT_TEMPLATES: usize = 10;

/// The settings aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub template_folder_path: String,
    pub enable_templater_integration: bool,
    pub enable_frontmatter_merge: bool,
    pub default_date_format: String,
    pub frontmatter_presets: Vec<FrontmatterPreset>,
    pub recently_used_templates: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            template_folder_path: DEFAULT_TEMPLATE_FOLDER.to_string(),
            enable_templater_integration: true,
            enable_frontmatter_merge: true,
            default_date_format: DEFAULT_DATE_FORMAT.to_string(),
            frontmatter_presets: Vec::new(),
            recently_used_templates: Vec::new(),
        }
    }
}

impl Settings {
    /// Build settings from a persisted blob, healing whatever is malformed.
    pub fn from_value(value: &Value) -> Self {
        let defaults = Settings::default();
        let get_str = |key: &str, fallback: String| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(fallback)
        };
        let get_bool = |key: &str, fallback: bool| {
            value.get(key).and_then(Value::as_bool).unwrap_or(fallback)
        };

        Self {
            template_folder_path: get_str("templateFolderPath", defaults.template_folder_path),
            enable_templater_integration: get_bool(
                "enableTemplaterIntegration",
                defaults.enable_templater_integration,
            ),
            enable_frontmatter_merge: get_bool(
                "enableFrontmatterMerge",
                defaults.enable_frontmatter_merge,
            ),
            default_date_format: get_str("defaultDateFormat", defaults.default_date_format),
            frontmatter_presets: normalize_presets(value.get("frontmatterPresets")),
            recently_used_templates: value
                .get("recentlyUsedTemplates")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Look up a preset by id.
    pub fn preset(&self, id: &str) -> Option<&FrontmatterPreset> {
        self.frontmatter_presets.iter().find(|p| p.id == id)
    }
}

/// Normalize a persisted preset collection. Anything that is not an array
/// becomes empty; unusable presets are dropped individually.
pub fn normalize_presets(value: Option<&Value>) -> Vec<FrontmatterPreset> {
    let Some(items) = value.and_then(Value::as_array) else {
        if value.is_some_and(|v| !v.is_null()) {
            debug!("frontmatterPresets is not an array, resetting");
        }
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut presets = Vec::with_capacity(items.len());
    for item in items {
        match normalize_preset(item) {
            Some(preset) => {
                if seen.insert(preset.id.clone()) {
                    presets.push(preset);
                } else {
                    debug!(id = %preset.id, "dropping preset with duplicate id");
                }
            }
            None => debug!("dropping malformed preset"),
        }
    }
    presets
}

fn normalize_preset(value: &Value) -> Option<FrontmatterPreset> {
    let id = value.get("id")?.as_str().filter(|s| !s.is_empty())?;
    let name = value.get("name")?.as_str()?;
    let fields = value.get("fields")?.as_array()?;

    Some(FrontmatterPreset {
        id: id.to_string(),
        name: name.to_string(),
        fields: fields.iter().filter_map(normalize_field).collect(),
        description: value
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn normalize_field(value: &Value) -> Option<FrontmatterField> {
    let key = value.get("key")?.as_str()?;
    let type_name = value.get("type")?.as_str()?;
    let label = value.get("label")?.as_str()?;
    let default = value.get("default")?.as_str()?;

    let field_type = FieldType::parse(type_name).unwrap_or_else(|| {
        debug!(key, type_name, "unknown field type, treating as text");
        FieldType::Text
    });

    let options = value
        .get("options")
        .and_then(Value::as_array)
        .map(|opts| {
            opts.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(FrontmatterField {
        key: key.to_string(),
        field_type,
        label: label.to_string(),
        default: default.to_string(),
        options,
        use_templater_timestamp: value
            .get("useTemplaterTimestamp")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

/// Host-provided storage for the raw settings blob.
pub trait SettingsStorage {
    /// Read the stored blob, `None` if nothing has been saved yet.
    fn load(&self) -> Result<Option<Value>>;

    fn save(&self, data: &Value) -> Result<()>;
}

/// Stores settings as a JSON file (an Obsidian plugin's `data.json`).
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location of the settings blob inside a vault.
    pub fn in_vault(vault_root: &Path) -> Self {
        Self::new(
            vault_root
                .join(".obsidian")
                .join("plugins")
                .join("fast-templater")
                .join("data.json"),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<Value>> {
        if !self.path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, data: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(data)?)?;
        Ok(())
    }
}

/// In-memory storage, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: RefCell<Option<Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: Value) -> Self {
        Self {
            data: RefCell::new(Some(data)),
        }
    }

    /// The last saved blob.
    pub fn data(&self) -> Option<Value> {
        self.data.borrow().clone()
    }
}

impl SettingsStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Value>> {
        Ok(self.data.borrow().clone())
    }

    fn save(&self, data: &Value) -> Result<()> {
        *self.data.borrow_mut() = Some(data.clone());
        Ok(())
    }
}

/// Owns the current settings value and its storage.
#[derive(Debug)]
pub struct SettingsManager<S: SettingsStorage> {
    storage: S,
    settings: Settings,
}

impl<S: SettingsStorage> SettingsManager<S> {
    /// Create a manager holding default settings. Call [`load`](Self::load)
    /// to read the persisted state.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            settings: Settings::default(),
        }
    }

    /// Create a manager and load the persisted state.
    pub fn open(storage: S) -> Result<Self> {
        let mut manager = Self::new(storage);
        manager.load()?;
        Ok(manager)
    }

    pub fn load(&mut self) -> Result<&Settings> {
        self.settings = match self.storage.load()? {
            Some(value) => Settings::from_value(&value),
            None => Settings::default(),
        };
        Ok(&self.settings)
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn save(&self) -> Result<()> {
        let value = serde_json::to_value(&self.settings)?;
        self.storage.save(&value)?;
        debug!(presets = self.settings.frontmatter_presets.len(), "settings saved");
        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Move `path` to the front of the recently used list and persist. The
    /// list is left untouched if the save fails.
    pub fn record_recent_template(&mut self, path: &str) -> Result<()> {
        let mut recent = self.settings.recently_used_templates.clone();
        recent.retain(|p| p != path);
        recent.insert(0, path.to_string());
        recent.truncate(MAX_RECENT_TEMPLATES);

        let previous = std::mem::replace(&mut self.settings.recently_used_templates, recent);
        if let Err(e) = self.save() {
            self.settings.recently_used_templates = previous;
            return Err(e);
        }
        info!(template = path, "recorded recent template");
        Ok(())
    }
}
