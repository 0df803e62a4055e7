//! Layout option values.
//!
//! A property pairs a dotted key such as `elk.direction` with exactly one
//! typed [`PropertyValue`]. The value kind is decided by the literal that was
//! written, not by the key: `spacing: 10` is an integer while
//! `spacing: 10.0` is a float.

use std::fmt;

use crate::identifier::Id;

/// The kind of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    QualifiedId,
    Boolean,
    Integer,
    Float,
    Null,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::QualifiedId => "qualified id",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Null => "null",
        };
        f.write_str(name)
    }
}

/// A coerced property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Unescaped string contents.
    String(String),
    /// Dotted identifier path, kept opaque (for example an enum literal such as `RIGHT`).
    QualifiedId(String),
    Boolean(bool),
    /// 32-bit signed integer.
    Integer(i32),
    /// Finite double precision float.
    Float(f64),
    /// Explicit `null`, which clears an option.
    Null,
}

impl PropertyValue {
    /// Returns the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            PropertyValue::String(_) => ValueKind::String,
            PropertyValue::QualifiedId(_) => ValueKind::QualifiedId,
            PropertyValue::Boolean(_) => ValueKind::Boolean,
            PropertyValue::Integer(_) => ValueKind::Integer,
            PropertyValue::Float(_) => ValueKind::Float,
            PropertyValue::Null => ValueKind::Null,
        }
    }

    /// Returns the text of string and qualified id values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) | PropertyValue::QualifiedId(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the numeric value; integers widen to `f64`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(i) => Some(f64::from(*i)),
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }
}

/// A key/value layout option attached to a graph element.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    key: Id,
    value: PropertyValue,
}

impl Property {
    pub fn new(key: Id, value: PropertyValue) -> Self {
        Self { key, value }
    }

    /// The dotted key, e.g. `elk.direction`.
    pub fn key(&self) -> Id {
        self.key
    }

    pub fn value(&self) -> &PropertyValue {
        &self.value
    }
}
