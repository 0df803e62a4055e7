//! Severity levels for diagnostics.

use std::fmt;

/// How serious a diagnostic is.
///
/// Any [`Severity::Error`] makes the document invalid, so
/// [`parse_graph_document`](crate::parse_graph_document) fails. Warnings,
/// such as a repeated layout attribute, are reported but leave the document
/// usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }

    pub fn is_warning(self) -> bool {
        self == Severity::Warning
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        })
    }
}
