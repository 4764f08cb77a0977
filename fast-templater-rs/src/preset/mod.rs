//! Frontmatter presets: id generation, storage and import/export.

pub mod id;
pub mod store;
pub mod transfer;

pub use id::{generate_unique_preset_id, slugify_preset_name};
pub use store::{PresetDraft, PresetStore};
pub use transfer::{ImportReport, ImportStrategy, PresetExport, RenamedPreset};
