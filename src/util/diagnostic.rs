//! Batch failure reports for the terminal.
//!
//! A report names the root cause, lists one line per affected stack and
//! ends with numbered hints.

use std::fmt;

/// Hints attached to fetch failures.
pub mod suggestions {
    pub const FETCH_FAILED: &str = "Check that the release repositories are reachable";

    pub const MISSING_TAG: &str = "Check that the catalog version matches a published release tag";

    pub const STALE_WORKSPACE: &str = "Remove the workspace directory and retry";
}

/// An error report with per-stack context and hints.
#[derive(Debug, Clone, Default)]
pub struct Diagnostic {
    pub message: String,
    /// One line per affected stack
    pub context: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a hint; repeated hints are kept once.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        let suggestion = suggestion.into();
        if !self.suggestions.contains(&suggestion) {
            self.suggestions.push(suggestion);
        }
        self
    }

    /// Render for stderr, with ANSI colors when `color` is set.
    pub fn format(&self, color: bool) -> String {
        let (error, help) = if color {
            ("\x1b[1;31merror\x1b[0m", "\x1b[1;32mhelp\x1b[0m")
        } else {
            ("error", "help")
        };

        let mut output = format!("{}: {}\n", error, self.message);
        for line in &self.context {
            output.push_str(&format!("  → {}\n", line));
        }

        if !self.suggestions.is_empty() {
            output.push_str(&format!("\n{}: consider:\n", help));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
