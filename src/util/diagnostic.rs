//! User-facing diagnostic messages.
//!
//! Every error shown to the user should say what went wrong, where, and what
//! to do about it. Errors that carry source spans (see
//! [`crate::codec::CodecError`]) are rendered through miette instead.

use std::fmt;
use std::path::PathBuf;

use miette::{GraphicalReportHandler, GraphicalTheme};

/// Common suggestion messages.
pub mod suggestions {
    /// No conanfile.py or conanfile.txt was found.
    pub const NO_MANIFEST: &str = "Run `conanfest init` to create a conanfile";

    /// Both conanfile.py and conanfile.txt are present.
    pub const AMBIGUOUS_MANIFEST: &str =
        "Pass the file explicitly, e.g. `conanfest inspect conanfile.py`";

    /// The lockfile disagrees with the manifest.
    pub const STALE_LOCK: &str = "Run `conanfest lock` to rewrite the lockfile";

    /// A lockfile cannot hold version ranges.
    pub const RANGE_IN_LOCK: &str = "Pin the requirement to an exact version first";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related file
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    fn with_severity(message: impl Into<String>, severity: Severity) -> Self {
        Diagnostic {
            message: message.into(),
            severity,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_severity(message, Severity::Error)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_severity(message, Severity::Warning)
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity = if color {
            let code = match self.severity {
                Severity::Error => "\x1b[1;31m",
                Severity::Warning => "\x1b[1;33m",
            };
            format!("{}{}\x1b[0m", code, self.severity)
        } else {
            self.severity.to_string()
        };

        output.push_str(&format!("{}: {}\n", severity, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            let help = if color { "\x1b[1;32mhelp\x1b[0m" } else { "help" };
            if self.suggestions.len() == 1 {
                output.push_str(&format!("{}: {}\n", help, self.suggestions[0]));
            } else {
                output.push_str(&format!("{}: consider:\n", help));
                for (i, suggestion) in self.suggestions.iter().enumerate() {
                    output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
                }
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

/// Render a miette diagnostic with its source snippet.
pub fn render_report(diagnostic: &dyn miette::Diagnostic, color: bool) -> String {
    let theme = if color {
        GraphicalTheme::unicode()
    } else {
        GraphicalTheme::unicode_nocolor()
    };
    let handler = GraphicalReportHandler::new_themed(theme);

    let mut out = String::new();
    if handler.render_report(&mut out, diagnostic).is_err() {
        out = format!("error: {}\n", diagnostic);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecError;
    use crate::core::reference::Reference;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("lockfile is out of date")
            .with_location("conan.lock")
            .with_context("zlib/1.3.1 is required but not locked")
            .with_suggestion(suggestions::STALE_LOCK);

        let output = diag.format(false);
        assert!(output.starts_with("error: lockfile is out of date\n"));
        assert!(output.contains("  --> conan.lock\n"));
        assert!(output.contains("  = zlib/1.3.1 is required"));
        assert!(output.contains("help: Run `conanfest lock`"));
    }

    #[test]
    fn test_multiple_suggestions_are_numbered() {
        let diag = Diagnostic::warning("two manifests")
            .with_suggestion("remove one")
            .with_suggestion("pass a path");

        let output = diag.format(false);
        assert!(output.contains("help: consider:"));
        assert!(output.contains("  2. pass a path"));
    }

    #[test]
    fn test_render_report_includes_snippet() {
        let content = "[requires]\nzlib\n";
        let reason = Reference::parse("zlib").unwrap_err();
        let err = CodecError::invalid_reference("conanfile.txt", content, "zlib", 11, reason);

        let out = render_report(&err, false);
        assert!(out.contains("conanfile.txt"));
        assert!(out.contains("zlib"));
    }
}
