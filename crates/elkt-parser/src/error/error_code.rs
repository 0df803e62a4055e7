//! Error codes for the ELKT diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser errors
//! - `E2xx` - Reference resolution errors
//! - `E3xx` - Value coercion errors

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    ///
    /// A string was opened with a quote but never closed.
    E001,

    /// Unexpected character.
    ///
    /// A character was encountered that does not start any token.
    E002,

    /// Unterminated block comment.
    ///
    /// A `/*` comment has no matching `*/`.
    E003,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    ///
    /// The parser encountered a token it did not expect at this position.
    E100,

    /// Unexpected end of input.
    ///
    /// The input ended before a complete construct was parsed.
    E101,

    /// Duplicate attribute.
    ///
    /// A layout attribute (`position`, `size`, `width`, `height`) or a
    /// section attribute (`incoming`, `outgoing`, `start`, `end`, `bends`)
    /// was given twice in the same block. Reported as a warning; the first
    /// occurrence is kept.
    E104,

    // =========================================================================
    // Resolution Errors (E2xx)
    // =========================================================================
    /// Unresolved reference.
    ///
    /// An edge endpoint, section shape or section chain names an element
    /// that is not declared anywhere in the document.
    E200,

    /// Duplicate identifier.
    ///
    /// Two nodes or ports of the same scope, or two sections of the same
    /// edge, share an identifier.
    E201,

    // =========================================================================
    // Coercion Errors (E3xx)
    // =========================================================================
    /// Numeric value out of range.
    ///
    /// An integer does not fit in 32 bits, or a float is not finite.
    E300,

    /// Malformed escape sequence.
    ///
    /// A string literal contains an unknown or incomplete escape.
    E301,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            // Parser errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E104 => "E104",
            // Resolution errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            // Coercion errors
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "unterminated block comment",
            // Parser errors
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "unexpected end of input",
            ErrorCode::E104 => "duplicate attribute",
            // Resolution errors
            ErrorCode::E200 => "unresolved reference",
            ErrorCode::E201 => "duplicate identifier",
            // Coercion errors
            ErrorCode::E300 => "value out of range",
            ErrorCode::E301 => "malformed escape sequence",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
