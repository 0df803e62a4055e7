//! Source spans attached to a diagnostic.

use crate::span::Span;

/// Whether a label marks the offending code or points at related code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// The location the diagnostic is about.
    Primary,
    /// Context such as the first declaration of a duplicate identifier.
    Secondary,
}

/// A message attached to a span of the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    span: Span,
    message: String,
    kind: LabelKind,
}

impl Label {
    pub fn new(kind: LabelKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            kind,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> LabelKind {
        self.kind
    }

    pub fn is_primary(&self) -> bool {
        self.kind == LabelKind::Primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_kinds() {
        let duplicate = Label::new(LabelKind::Primary, Span::new(10..20), "declared again here");
        let first = Label::new(LabelKind::Secondary, Span::new(0..5), "first declared here");

        assert_eq!(duplicate.span(), Span::new(10..20));
        assert_eq!(duplicate.message(), "declared again here");
        assert!(duplicate.is_primary());
        assert_eq!(first.kind(), LabelKind::Secondary);
        assert!(!first.is_primary());
    }
}
