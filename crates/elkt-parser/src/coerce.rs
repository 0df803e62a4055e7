//! Conversion of literal lexemes into typed values.
//!
//! The parser keeps every literal exactly as written. This module turns those
//! lexemes into [`PropertyValue`]s and numbers: strings are unescaped,
//! integers must fit in an `i32` and floats must be finite.

use thiserror::Error;

use elkt_core::property::PropertyValue;

use crate::{ast::RawValue, error::ErrorCode};

/// A literal that is well formed but has no typed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("integer `{0}` does not fit in 32 bits")]
    IntegerOutOfRange(String),

    #[error("number `{0}` is out of range")]
    NumberOutOfRange(String),

    #[error("invalid escape sequence `{0}`")]
    InvalidEscape(String),
}

impl CoercionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CoercionError::IntegerOutOfRange(_) | CoercionError::NumberOutOfRange(_) => {
                ErrorCode::E300
            }
            CoercionError::InvalidEscape(_) => ErrorCode::E301,
        }
    }

    /// A hint on how to fix the literal.
    pub fn help(&self) -> &'static str {
        match self {
            CoercionError::IntegerOutOfRange(_) => {
                "integers range from -2147483648 to 2147483647; write a float for larger values"
            }
            CoercionError::NumberOutOfRange(_) => "use a smaller exponent",
            CoercionError::InvalidEscape(_) => {
                "supported escapes are \\n \\r \\t \\b \\f \\0 \\\\ \\\" \\' \\uXXXX and \\u{...}"
            }
        }
    }
}

/// Coerce a raw property value.
pub fn coerce(value: &RawValue) -> Result<PropertyValue, CoercionError> {
    Ok(match value {
        RawValue::String(raw) => PropertyValue::String(unescape(raw)?),
        RawValue::QualifiedId(id) => PropertyValue::QualifiedId(id.to_string()),
        RawValue::Bool(b) => PropertyValue::Boolean(*b),
        RawValue::Int(raw) => PropertyValue::Integer(integer(raw)?),
        RawValue::Float(raw) => PropertyValue::Float(number(raw)?),
        RawValue::Null => PropertyValue::Null,
    })
}

/// Parse an integer lexeme, with an optional sign, into an `i32`.
pub fn integer(raw: &str) -> Result<i32, CoercionError> {
    raw.parse::<i32>()
        .map_err(|_| CoercionError::IntegerOutOfRange(raw.to_string()))
}

/// Parse any number lexeme into a finite `f64`.
pub fn number(raw: &str) -> Result<f64, CoercionError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(CoercionError::NumberOutOfRange(raw.to_string())),
    }
}

/// Unescape a quoted string lexeme.
///
/// The lexeme must still carry its quotes, either `"` or `'`.
pub fn unescape(raw: &str) -> Result<String, CoercionError> {
    let body = strip_quotes(raw);
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some(escape) = chars.next() else {
            return Err(CoercionError::InvalidEscape("\\".to_string()));
        };
        let unescaped = match escape {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'b' => '\u{0008}',
            'f' => '\u{000C}',
            '0' => '\0',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            'u' if chars.peek() == Some(&'{') => {
                chars.next();
                let mut digits = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    digits.push(c);
                }
                let sequence = format!("\\u{{{digits}}}");
                if !closed || digits.is_empty() || digits.len() > 6 {
                    return Err(CoercionError::InvalidEscape(sequence));
                }
                code_point(&digits).ok_or(CoercionError::InvalidEscape(sequence))?
            }
            'u' => {
                let high = hex4(&mut chars)?;
                match high {
                    0xD800..=0xDBFF => {
                        let low = low_surrogate(&mut chars, high)?;
                        let value = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                        char::from_u32(value)
                            .ok_or_else(|| CoercionError::InvalidEscape(format!("\\u{high:04X}")))?
                    }
                    _ => char::from_u32(high)
                        .ok_or_else(|| CoercionError::InvalidEscape(format!("\\u{high:04X}")))?,
                }
            }
            other => return Err(CoercionError::InvalidEscape(format!("\\{other}"))),
        };
        out.push(unescaped);
    }

    Ok(out)
}

fn strip_quotes(raw: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(body) = raw
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return body;
        }
    }
    raw
}

fn code_point(digits: &str) -> Option<char> {
    u32::from_str_radix(digits, 16)
        .ok()
        .and_then(char::from_u32)
}

/// Read the four hex digits of a `\uXXXX` escape.
fn hex4(chars: &mut impl Iterator<Item = char>) -> Result<u32, CoercionError> {
    let digits: String = chars.take(4).collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CoercionError::InvalidEscape(format!("\\u{digits}")));
    }
    u32::from_str_radix(&digits, 16).map_err(|_| CoercionError::InvalidEscape(format!("\\u{digits}")))
}

/// Read the `\uXXXX` low surrogate completing `high`.
fn low_surrogate(
    chars: &mut std::iter::Peekable<impl Iterator<Item = char>>,
    high: u32,
) -> Result<u32, CoercionError> {
    let lone = || CoercionError::InvalidEscape(format!("\\u{high:04X}"));
    if chars.next() != Some('\\') || chars.next() != Some('u') {
        return Err(lone());
    }
    let low = hex4(chars)?;
    if !(0xDC00..=0xDFFF).contains(&low) {
        return Err(lone());
    }
    Ok(low)
}
