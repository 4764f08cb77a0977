//! Macro-expansion capability (Templater integration).
//!
//! Expansion is optional. When the expander is unavailable or fails, the
//! template's literal text is used instead and the insertion carries on.

use crate::error::{Result, TemplaterError};
use crate::types::Template;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Something that can expand `<% ... %>` expressions in a template.
pub trait MacroExpander {
    fn is_available(&self) -> bool;

    fn process_template(&self, template: &Template) -> Result<String>;
}

/// The expander used when the integration is turned off or not installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Disabled;

impl MacroExpander for Disabled {
    fn is_available(&self) -> bool {
        false
    }

    fn process_template(&self, _template: &Template) -> Result<String> {
        Err(TemplaterError::Expansion("macro expansion is disabled".into()))
    }
}

/// Runs an external program that reads the template on stdin and writes the
/// expanded text to stdout. The template path is passed in
/// `FAST_TEMPLATER_TEMPLATE_PATH`.
#[derive(Debug, Clone)]
pub struct CommandExpander {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandExpander {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a command line such as `"templater-cli --strict"`.
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program, parts.map(str::to_string).collect()))
    }

    fn resolve_program(&self) -> Option<PathBuf> {
        if self.program.components().count() > 1 {
            return self.program.is_file().then(|| self.program.clone());
        }
        let paths = std::env::var_os("PATH")?;
        std::env::split_paths(&paths)
            .map(|dir| dir.join(&self.program))
            .find(|candidate| candidate.is_file())
    }
}

impl MacroExpander for CommandExpander {
    fn is_available(&self) -> bool {
        self.resolve_program().is_some()
    }

    fn process_template(&self, template: &Template) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env("FAST_TEMPLATER_TEMPLATE_PATH", &template.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                TemplaterError::Expansion(format!("failed to start {}: {}", self.program.display(), e))
            })?;

        // The child may fill stdout before it has read all of stdin.
        let writer = child.stdin.take().map(|mut stdin| {
            let content = template.content.clone();
            std::thread::spawn(move || stdin.write_all(content.as_bytes()))
        });

        let output = child.wait_with_output()?;
        if let Some(handle) = writer {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!(error = %e, "expander closed stdin early"),
                Err(_) => return Err(TemplaterError::Expansion("stdin writer panicked".into())),
            }
        }

        if !output.status.success() {
            return Err(TemplaterError::Expansion(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        String::from_utf8(output.stdout)
            .map_err(|e| TemplaterError::Expansion(format!("output is not UTF-8: {}", e)))
    }
}

/// Expand a template, falling back to its literal content.
///
/// Returns the text and whether expansion actually happened.
pub fn expand_or_literal(expander: &dyn MacroExpander, template: &Template) -> (String, bool) {
    if !expander.is_available() {
        debug!(template = %template.path, "macro expansion unavailable, using literal template");
        return (template.content.clone(), false);
    }
    match expander.process_template(template) {
        Ok(expanded) => (expanded, true),
        Err(e) => {
            warn!(template = %template.path, error = %e, "macro expansion failed, using literal template");
            (template.content.clone(), false)
        }
    }
}

/// The expression stored as the default of a timestamp date field.
pub fn timestamp_expression(date_format: &str) -> String {
    format!("<% tp.date.now(\"{}\") %>", date_format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Failing {
        calls: Cell<usize>,
    }

    impl MacroExpander for Failing {
        fn is_available(&self) -> bool {
            true
        }

        fn process_template(&self, _template: &Template) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            Err(TemplaterError::Expansion("boom".into()))
        }
    }

    struct Upper;

    impl MacroExpander for Upper {
        fn is_available(&self) -> bool {
            true
        }

        fn process_template(&self, template: &Template) -> Result<String> {
            Ok(template.content.to_uppercase())
        }
    }

    #[test]
    fn test_disabled_uses_literal() {
        let template = Template::new("T.md", "<% tp.file.title %>");
        assert_eq!(
            expand_or_literal(&Disabled, &template),
            ("<% tp.file.title %>".to_string(), false)
        );
    }

    #[test]
    fn test_failure_falls_back() {
        let template = Template::new("T.md", "literal");
        let failing = Failing { calls: Cell::new(0) };
        assert_eq!(expand_or_literal(&failing, &template), ("literal".to_string(), false));
        assert_eq!(failing.calls.get(), 1);
    }

    #[test]
    fn test_success_is_used() {
        let template = Template::new("T.md", "abc");
        assert_eq!(expand_or_literal(&Upper, &template), ("ABC".to_string(), true));
    }

    #[test]
    fn test_missing_command_is_unavailable() {
        let expander = CommandExpander::from_command_line("definitely-not-a-real-expander-binary").unwrap();
        assert!(!expander.is_available());
        assert!(CommandExpander::from_command_line("   ").is_none());
    }

    #[test]
    fn test_timestamp_expression() {
        assert_eq!(timestamp_expression("YYYY-MM-DD"), "<% tp.date.now(\"YYYY-MM-DD\") %>");
    }
}
