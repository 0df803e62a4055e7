//! Configuration types for reading and formatting documents.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from
//! external sources such as a TOML file.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the sections below.
//! - [`ParserConfig`] - Controls error recovery and diagnostic limits.
//! - [`FormatConfig`] - Controls the layout of formatted output.
//!
//! # Example
//!
//! ```
//! # use elkt::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(!config.parser().fail_fast());
//! assert_eq!(config.format().indent(), 4);
//! ```

use serde::Deserialize;

use elkt_parser::{ParseConfig, Recovery, emitter};

/// Largest indent accepted by [`AppConfig::validate`].
pub const MAX_INDENT: usize = 16;

/// Top-level configuration combining parser and formatter settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Parser configuration section.
    #[serde(default)]
    parser: ParserConfig,

    /// Formatter configuration section.
    #[serde(default)]
    format: FormatConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(parser: ParserConfig, format: FormatConfig) -> Self {
        Self { parser, format }
    }

    /// Returns the parser configuration.
    pub fn parser(&self) -> &ParserConfig {
        &self.parser
    }

    /// Returns the formatter configuration.
    pub fn format(&self) -> &FormatConfig {
        &self.format
    }

    /// Check values that deserialize fine but make no sense.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.format.indent > MAX_INDENT {
            return Err(format!(
                "format.indent must be at most {MAX_INDENT}, got {}",
                self.format.indent
            ));
        }
        if self.parser.max_diagnostics == Some(0) {
            return Err("parser.max_diagnostics must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Error recovery settings.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ParserConfig {
    /// Stop at the first error instead of recovering.
    #[serde(default)]
    fail_fast: bool,

    /// Report at most this many diagnostics.
    #[serde(default)]
    max_diagnostics: Option<usize>,
}

impl ParserConfig {
    pub fn new(fail_fast: bool, max_diagnostics: Option<usize>) -> Self {
        Self {
            fail_fast,
            max_diagnostics,
        }
    }

    pub fn fail_fast(&self) -> bool {
        self.fail_fast
    }

    pub fn max_diagnostics(&self) -> Option<usize> {
        self.max_diagnostics
    }

    /// The parser crate's view of these settings.
    pub fn to_parse_config(&self) -> ParseConfig {
        let recovery = if self.fail_fast {
            Recovery::FailFast
        } else {
            Recovery::Resynchronize
        };
        let config = ParseConfig::new(recovery);
        match self.max_diagnostics {
            Some(max) => config.with_max_diagnostics(max),
            None => config,
        }
    }
}

/// Layout of formatted output.
#[derive(Debug, Clone, Deserialize)]
pub struct FormatConfig {
    /// Spaces per nesting level.
    #[serde(default = "default_indent")]
    indent: usize,
}

fn default_indent() -> usize {
    emitter::FormatConfig::default().indent
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent: default_indent(),
        }
    }
}

impl FormatConfig {
    pub fn new(indent: usize) -> Self {
        Self { indent }
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    /// The serializer's view of these settings.
    pub fn to_emitter_config(&self) -> emitter::FormatConfig {
        emitter::FormatConfig::new(self.indent)
    }
}
