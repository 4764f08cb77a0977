//! Fast Templater CLI entry point.

use clap::Parser;
use fast_templater::cli::args::{Cli, Commands};
use fast_templater::cli::output::Output;
use fast_templater::cli::{insert, parse, presets, settings, templates};
use fast_templater::config::Config;
use fast_templater::error::{Result, exit_code};
use fast_templater::vault::Vault;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::from(exit_code::SUCCESS as u8),
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {}", e);
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fast_templater={}", cli.log_level())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    // Load config
    let config = Config::load()?;

    // Resolve vault path
    let vault_path = config.resolve_vault_path(cli.vault.as_deref())?;
    let mut vault = Vault::open(vault_path, config, cli.settings.as_deref())?;

    // Create output helper
    let output = Output::new(cli.output_format(), cli.quiet);

    // Dispatch command
    match &cli.command {
        Commands::Presets(command) => presets::run(&mut vault, command, &output),
        Commands::Templates(command) => templates::run(&vault, command, &output),
        Commands::Parse(args) => parse::run(&vault, args, &output),
        Commands::Insert(args) => insert::run(&mut vault, args, cli.no_templater, &output),
        Commands::Settings(command) => settings::run(&vault, command, &output),
    }
}
