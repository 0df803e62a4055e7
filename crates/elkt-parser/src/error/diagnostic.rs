//! The core diagnostic type.
//!
//! A [`Diagnostic`] represents a single error or warning with optional
//! error code, multiple labeled source spans, and help text.

use std::fmt;

use crate::{
    error::{
        Severity,
        error_code::ErrorCode,
        label::{Label, LabelKind},
    },
    span::{Location, Span},
};

/// A rich diagnostic message with source location information.
///
/// # Example
///
/// ```text
/// warning[E104]: `width` is given more than once
///   --> graph.elkt:1:29
///    |
///  1 | node A { layout [ width: 5 width: 6 ] }
///    |                   -------- ^^^^^^^^ ignored
///    |                   |
///    |                   first given here
///    |
///    = help: remove the repeated attribute
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use elkt_parser::error::{Diagnostic, ErrorCode};
    /// # use elkt_parser::Span;
    ///
    /// let diag = Diagnostic::error("unresolved reference `B`")
    ///     .with_code(ErrorCode::E200)
    ///     .with_label(Span::new(8..9), "not declared")
    ///     .with_help("declare a node or port named `B`");
    /// assert_eq!(diag.to_string(), "error[E200]: unresolved reference `B`");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Get the severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get all labels attached to this diagnostic.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Span of the first primary label.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|label| label.is_primary())
            .map(Label::span)
    }

    /// Line, column and length of the primary label within `source`.
    pub fn location(&self, source: &str) -> Option<Location> {
        self.primary_span().map(|span| span.location(source))
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a primary label to this diagnostic.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::new(LabelKind::Primary, span, message));
        self
    }

    /// Add a secondary label to this diagnostic.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::new(LabelKind::Secondary, span, message));
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Create a new diagnostic with the given severity and message.
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[E001]: message" or "error: message"
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_new() {
        let diag = Diagnostic::new(Severity::Error, "test error");

        assert!(diag.severity().is_error());
        assert!(!diag.severity().is_warning());
        assert_eq!(diag.message(), "test error");
        assert!(diag.code().is_none());
        assert!(diag.labels().is_empty());
        assert!(diag.help().is_none());
        assert!(diag.primary_span().is_none());
    }

    #[test]
    fn test_diagnostic_with_secondary_label() {
        let diag = Diagnostic::warning("duplicate attribute")
            .with_secondary_label(Span::new(5..15), "first given here")
            .with_label(Span::new(10..20), "ignored");

        assert_eq!(diag.labels().len(), 2);
        assert_eq!(diag.labels()[0].kind(), LabelKind::Secondary);
        assert!(diag.labels()[1].is_primary());
        assert_eq!(diag.primary_span(), Some(Span::new(10..20)));
    }

    #[test]
    fn test_diagnostic_location() {
        let source = "node A\nedge -> B";
        let diag = Diagnostic::error("unresolved reference `B`").with_label(Span::new(15..16), "here");

        let location = diag.location(source).unwrap();
        assert_eq!(location.line, 2);
        assert_eq!(location.column, 9);
        assert_eq!(location.length, 1);
    }

    #[test]
    fn test_diagnostic_display_with_code() {
        let diag = Diagnostic::warning("`width` is given more than once").with_code(ErrorCode::E104);

        assert_eq!(
            diag.to_string(),
            "warning[E104]: `width` is given more than once"
        );
    }

    #[test]
    fn test_diagnostic_display_without_code() {
        let diag = Diagnostic::error("unexpected token");

        assert_eq!(diag.to_string(), "error: unexpected token");
    }

    #[test]
    fn test_diagnostic_builder_chain() {
        let diag = Diagnostic::error("identifier `A` is declared twice in this scope")
            .with_code(ErrorCode::E201)
            .with_label(Span::new(100..120), "duplicate declaration")
            .with_secondary_label(Span::new(50..70), "first declared here")
            .with_help("rename one of the elements");

        assert_eq!(diag.code(), Some(ErrorCode::E201));
        assert_eq!(diag.labels().len(), 2);
        assert_eq!(diag.help(), Some("rename one of the elements"));
    }
}
