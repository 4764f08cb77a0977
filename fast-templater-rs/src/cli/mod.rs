//! CLI command implementations.

pub mod args;
pub mod output;

pub mod insert;
pub mod parse;
pub mod presets;
pub mod settings;
pub mod templates;

pub use args::{Cli, Commands};
pub use output::Output;
