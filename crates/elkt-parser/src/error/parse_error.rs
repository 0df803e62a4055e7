//! The error returned when a document has at least one error diagnostic.

use std::fmt;

use crate::error::Diagnostic;

/// Every diagnostic of a document that failed to parse, warnings included,
/// in the order the phases reported them.
#[derive(Debug, Clone)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity().is_error())
            .count()
    }
}

/// Shows the first error and how many more there are.
impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(first) = self.diagnostics.iter().find(|d| d.severity().is_error()) else {
            return f.write_str("document has no errors");
        };
        write!(f, "{first}")?;
        match self.error_count() {
            1 => Ok(()),
            count => write!(f, " (and {} more errors)", count - 1),
        }
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_display_single_error() {
        let err = ParseError::new(vec![
            Diagnostic::warning("attribute `width` is given more than once"),
            Diagnostic::error("unresolved reference `B`").with_code(ErrorCode::E200),
        ]);

        assert_eq!(err.to_string(), "error: unresolved reference `B`");
        assert_eq!(err.diagnostics().len(), 2);
    }

    #[test]
    fn test_display_counts_remaining_errors() {
        let err = ParseError::new(vec![
            Diagnostic::error("first"),
            Diagnostic::warning("ignored"),
            Diagnostic::error("second"),
            Diagnostic::error("third"),
        ]);

        assert_eq!(err.to_string(), "error: first (and 2 more errors)");
    }
}
