//! Settings commands implementation.

use crate::cli::args::SettingsCommands;
use crate::cli::output::Output;
use crate::error::Result;
use crate::vault::Vault;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SettingsPathResponse {
    pub vault: String,
    pub settings: String,
    pub exists: bool,
}

pub fn run(vault: &Vault, command: &SettingsCommands, output: &Output) -> Result<()> {
    match command {
        SettingsCommands::Show => output.print(vault.settings().get()),
        SettingsCommands::Path => {
            let path = vault.settings().storage().path();
            output.print(&SettingsPathResponse {
                vault: vault.root.to_string_lossy().to_string(),
                settings: path.to_string_lossy().to_string(),
                exists: path.is_file(),
            })
        }
    }
}
