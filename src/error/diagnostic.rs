//! Diagnostic formatting for better error messages
//!
//! Renders a `ZenError` for a terminal: a colored header, each message,
//! and the surrounding source lines with a caret under the failing column.

use super::{SourceLocation, ZenError};
use colored::Colorize;

/// Diagnostic information for displaying errors with context
pub struct Diagnostic<'a> {
    error: &'a ZenError,
}

impl<'a> Diagnostic<'a> {
    pub fn new(error: &'a ZenError) -> Self {
        Self { error }
    }

    /// Format the diagnostic with color and context
    pub fn format(&self) -> String {
        let mut output = String::new();

        match self.error {
            ZenError::Syntax(errors) => {
                output.push_str(&format!("{}\n", "Syntax Error(s):".red().bold()));
                for error in errors {
                    output.push_str(&format!("  {} {}\n", "-".red(), error.message));
                    if let Some(location) = &error.location {
                        output.push_str(&self.format_source_context(location));
                    }
                }
            }
            ZenError::Runtime(error) => {
                output.push_str(&format!("{} {}\n", "Runtime Error:".red().bold(), error.kind));
                if let Some(location) = &error.location {
                    output.push_str(&self.format_source_context(location));
                }
            }
        }

        output
    }

    fn format_source_context(&self, location: &SourceLocation) -> String {
        let mut output = String::new();
        let source = location.source();

        let header = match source.path() {
            Some(path) => format!("{}: {}", path.display(), location),
            None => location.to_string(),
        };
        output.push_str(&format!("  {} {}\n", "-->".blue().bold(), header));

        if location.line == 0 {
            return output;
        }

        let width = (location.line + 1).to_string().len();

        if location.line > 1 {
            output.push_str(&format!(
                "  {} {}\n",
                format!("{:width$}", location.line - 1).blue(),
                source.line(location.line - 1)
            ));
        }

        output.push_str(&format!(
            "  {} {}\n",
            format!("{:width$}", location.line).blue().bold(),
            source.line(location.line)
        ));

        let padding = " ".repeat(width + 3 + location.column);
        output.push_str(&format!("{}{}\n", padding, "^".red().bold()));

        let next = source.line(location.line + 1);
        if !next.is_empty() {
            output.push_str(&format!(
                "  {} {}\n",
                format!("{:width$}", location.line + 1).blue(),
                next
            ));
        }

        output
    }
}

impl std::fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RuntimeError, SyntaxError};
    use crate::runtime::environment::ScopeError;
    use crate::source::SourceCode;

    #[test]
    fn test_syntax_header_and_context() {
        colored::control::set_override(false);
        let source = SourceCode::inline("var x = 1\nvar = 2\nvar z = 3");
        let error = ZenError::Syntax(vec![SyntaxError::new(
            "Expected variable name",
            source.location(2, 4),
        )]);

        let formatted = Diagnostic::new(&error).format();
        assert!(formatted.starts_with("Syntax Error(s):"));
        assert!(formatted.contains("Expected variable name"));
        assert!(formatted.contains("var x = 1"));
        assert!(formatted.contains("2 var = 2"));
        assert!(formatted.contains("var z = 3"));
    }

    #[test]
    fn test_runtime_without_location() {
        colored::control::set_override(false);
        let error = ZenError::Runtime(RuntimeError::from(ScopeError::Undefined("y".into())));
        let formatted = Diagnostic::new(&error).to_string();
        assert_eq!(formatted, "Runtime Error: Undefined variable: y\n");
    }
}
