//! Accumulates the diagnostics of one phase.

use crate::error::Diagnostic;

/// Diagnostics of one phase, in the order they were emitted.
#[derive(Debug, Default)]
pub(crate) struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity().is_error())
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_are_not_errors() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::warning("repeated attribute"));
        assert!(!collector.has_errors());

        collector.emit(Diagnostic::error("unexpected token"));
        assert!(collector.has_errors());

        let messages: Vec<_> = collector
            .into_diagnostics()
            .iter()
            .map(|d| d.message().to_string())
            .collect();
        assert_eq!(messages, ["repeated attribute", "unexpected token"]);
    }
}
