//! Output formatting for CLI commands.

use crate::cli::args::OutputFormat;
use crate::error::Result;
use serde::Serialize;

/// Helper for formatting and printing output.
pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    /// Render a serializable value in the configured format.
    pub fn render<T: Serialize>(&self, value: &T) -> Result<String> {
        Ok(match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
            OutputFormat::Yaml => serde_yaml::to_string(value)?.trim_end().to_string(),
            OutputFormat::Toml => {
                // TOML requires a table at the root
                let json = serde_json::to_value(value)?;
                if json.is_object() {
                    toml::to_string_pretty(value)?.trim_end().to_string()
                } else {
                    toml::to_string_pretty(&Wrapped { items: value })?
                        .trim_end()
                        .to_string()
                }
            }
        })
    }

    /// Print a serializable value in the configured format.
    pub fn print<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", self.render(value)?);
        Ok(())
    }

    /// Print a message if not in quiet mode.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }

    /// Print a warning message.
    pub fn warn(&self, message: &str) {
        eprintln!("Warning: {}", message);
    }
}

#[derive(Serialize)]
struct Wrapped<'a, T: Serialize> {
    items: &'a T,
}

/// Standard response structure for commands.
#[derive(Debug, Serialize)]
pub struct CommandResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> CommandResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }
}

impl CommandResponse<()> {
    pub fn message(msg: impl Into<String>) -> Self {
        Self {
            data: None,
            message: Some(msg.into()),
        }
    }
}
