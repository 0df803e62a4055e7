//! Parser configuration.

/// What the parser does after a syntax error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Recovery {
    /// Skip to the next `node`, `edge`, `port`, `label` or `}` at the
    /// current nesting depth and keep parsing.
    #[default]
    Resynchronize,
    /// Stop at the first error. Later phases are skipped.
    FailFast,
}

/// Configuration for [`analyze`](crate::analyze).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseConfig {
    /// Error recovery policy
    pub recovery: Recovery,
    /// Upper bound on the number of reported diagnostics, if any.
    /// At least one error is kept when the document has errors.
    pub max_diagnostics: Option<usize>,
}

impl ParseConfig {
    /// Create a new ParseConfig with the given recovery policy
    pub fn new(recovery: Recovery) -> Self {
        Self {
            recovery,
            max_diagnostics: None,
        }
    }

    /// Limit the number of reported diagnostics.
    pub fn with_max_diagnostics(mut self, max: usize) -> Self {
        self.max_diagnostics = Some(max);
        self
    }

    pub fn is_fail_fast(&self) -> bool {
        self.recovery == Recovery::FailFast
    }
}
