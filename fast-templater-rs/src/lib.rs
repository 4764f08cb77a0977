//! Fast Templater - template insertion for Obsidian-style vaults.
//!
//! # Overview
//!
//! Fast Templater inserts note templates at the cursor and merges structured
//! frontmatter into the note while doing so:
//! - Frontmatter presets: named, typed field schemas with defaults
//! - Four-tier merge (preset defaults, note, template, user input) with tag union
//! - Typed coercion of user input (text, select, date, multi-select)
//! - Preset import/export and id generation
//! - Preset recommendation for a template
//! - Optional macro expansion through an external command
//!
//! # Example
//!
//! ```no_run
//! use fast_templater::editor::TextBuffer;
//! use fast_templater::expander::Disabled;
//! use fast_templater::insert::{InsertRequest, insert_template};
//! use fast_templater::settings::Settings;
//! use fast_templater::types::Template;
//!
//! let template = Template::new("Templates/Daily.md", "---\ntags: [daily]\n---\n## Log\n");
//! let mut note = TextBuffer::new("---\ntitle: Today\n---\n");
//! let outcome = insert_template(
//!     Some(&mut note),
//!     InsertRequest::new(&template),
//!     &Settings::default(),
//!     &Disabled,
//! )
//! .unwrap();
//! println!("merged: {}", outcome.frontmatter_merged);
//! println!("{}", note.as_str());
//! ```

pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod expander;
pub mod insert;
pub mod library;
pub mod matcher;
pub mod merge;
pub mod parser;
pub mod preset;
pub mod settings;
pub mod types;
pub mod validation;
pub mod vault;

// Re-export main types at crate root
pub use config::Config;
pub use error::{Result, TemplaterError};
pub use insert::{InsertOutcome, InsertRequest, insert_template};
pub use settings::{Settings, SettingsManager};
pub use types::*;
pub use vault::Vault;
