//! Template commands implementation.

use crate::cli::args::{MatchTemplateArgs, SearchTemplatesArgs, TemplateCommands};
use crate::cli::output::Output;
use crate::error::Result;
use crate::library::{TemplateInfo, template_bound_preset_ids};
use crate::matcher::{MatchTier, WORTH_CONSIDERING, match_presets};
use crate::vault::Vault;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    pub templates: Vec<TemplateInfo>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub template: String,
    pub bound: Vec<String>,
    pub matches: Vec<MatchEntry>,
}

#[derive(Debug, Serialize)]
pub struct MatchEntry {
    pub id: String,
    pub name: String,
    pub score: f64,
    pub tier: MatchTier,
    pub reasons: Vec<String>,
}

pub fn run(vault: &Vault, command: &TemplateCommands, output: &Output) -> Result<()> {
    match command {
        TemplateCommands::List => {
            let templates = vault.library()?.list()?;
            output.print(&TemplateListResponse {
                total: templates.len(),
                templates,
            })
        }
        TemplateCommands::Search(args) => search(vault, args, output),
        TemplateCommands::Match(args) => match_template(vault, args, output),
    }
}

fn search(vault: &Vault, args: &SearchTemplatesArgs, output: &Output) -> Result<()> {
    let recent = &vault.settings().get().recently_used_templates;
    let templates = vault.library()?.search(&args.query, recent)?;
    output.print(&TemplateListResponse {
        total: templates.len(),
        templates,
    })
}

fn match_template(vault: &Vault, args: &MatchTemplateArgs, output: &Output) -> Result<()> {
    let template = vault.library()?.load(&args.template)?;
    let presets = &vault.settings().get().frontmatter_presets;

    let matches = match_presets(&template, presets)
        .into_iter()
        .filter(|m| args.all || m.score >= WORTH_CONSIDERING)
        .map(|m| MatchEntry {
            id: m.preset.id.clone(),
            name: m.preset.name.clone(),
            score: (m.score * 100.0).round() / 100.0,
            tier: m.tier,
            reasons: m.reasons,
        })
        .collect();

    output.print(&MatchResponse {
        bound: template_bound_preset_ids(&template),
        template: template.path,
        matches,
    })
}
