//! Error types for ELKT operations.
//!
//! This module provides the main error type [`ElktError`] which wraps
//! the error conditions that can occur while reading and formatting
//! documents.

use std::io;

use thiserror::Error;

use elkt_parser::error::ParseError;

/// The main error type for ELKT operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the source text next to the diagnostics, so
/// reporters can show the offending snippets.
#[derive(Debug, Error)]
pub enum ElktError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ElktError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
