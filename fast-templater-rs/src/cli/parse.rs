//! Parse command implementation.

use crate::cli::args::ParseArgs;
use crate::cli::output::Output;
use crate::error::Result;
use crate::parser::parse_frontmatter;
use crate::vault::Vault;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub path: String,
    #[serde(flatten)]
    pub parsed: crate::types::ParsedFrontmatter,
}

pub fn run(vault: &Vault, args: &ParseArgs, output: &Output) -> Result<()> {
    let path = vault.normalize_note_path(&args.path);
    let content = vault.read_note(&path)?;
    output.print(&ParseResponse {
        path: path.to_string_lossy().to_string(),
        parsed: parse_frontmatter(&content),
    })
}
