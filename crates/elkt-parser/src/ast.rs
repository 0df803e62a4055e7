//! Syntax tree of an ELK graph text document.
//!
//! The tree mirrors the text: every element owns its nested elements in the
//! order they were written, cross-references are kept as unresolved
//! [`QualifiedId`]s, and literal values keep their raw lexemes. Resolution
//! and value coercion happen later, in [`resolve`](crate::resolver::resolve).
//!
//! All positions are tracked with [`Spanned`]; equality ignores them, so two
//! trees parsed from differently formatted text compare equal when they
//! describe the same document.

use std::fmt;

use elkt_core::identifier::Id;

use crate::span::Spanned;

/// A dotted identifier path such as `A.p1` or `elk.direction`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedId(Vec<Id>);

impl QualifiedId {
    pub fn new(segments: Vec<Id>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[Id] {
        &self.0
    }

    /// The path as a single interned identifier, segments joined with `.`.
    pub fn to_id(&self) -> Id {
        Id::new(&self.to_string())
    }
}

impl From<Id> for QualifiedId {
    fn from(id: Id) -> Self {
        Self(vec![id])
    }
}

impl fmt::Display for QualifiedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// A number as written in the text, e.g. `10`, `-2` or `1.5e3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Number(String);

impl Number {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn raw(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An `x, y` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    pub x: Spanned<Number>,
    pub y: Spanned<Number>,
}

/// A property value before coercion. The variant is chosen by the token kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Raw string lexeme, quotes and escapes included.
    String(String),
    QualifiedId(QualifiedId),
    Bool(bool),
    /// An integer lexeme, signed or not.
    Int(String),
    Float(String),
    Null,
}

/// A `key: value` layout option.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: Spanned<QualifiedId>,
    pub value: Spanned<RawValue>,
}

/// The `layout [ ... ]` block of a node, port or label.
///
/// `size: w, h` fills both `width` and `height`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeLayout {
    pub position: Option<Spanned<Coordinates>>,
    pub width: Option<Spanned<Number>>,
    pub height: Option<Spanned<Number>>,
}

/// Routing data of an edge, either inline or split into named sections.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeLayout {
    /// `layout [ incoming: A start: 0, 0 ... ]`
    Single(EdgeSection),
    /// `layout [ section s1 [ ... ] section s2 -> s1 [ ... ] ]`
    Sections(Vec<EdgeSection>),
}

impl EdgeLayout {
    pub fn sections(&self) -> &[EdgeSection] {
        match self {
            EdgeLayout::Single(section) => std::slice::from_ref(section),
            EdgeLayout::Sections(sections) => sections,
        }
    }
}

/// One routing section of an edge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeSection {
    /// Always set for named sections, never for the inline form.
    pub identifier: Option<Spanned<Id>>,
    /// Sections this one continues into, written `section s1 -> s2, s3`.
    pub outgoing_sections: Vec<Spanned<Id>>,
    pub incoming_shape: Option<Spanned<QualifiedId>>,
    pub outgoing_shape: Option<Spanned<QualifiedId>>,
    pub start: Option<Spanned<Coordinates>>,
    pub end: Option<Spanned<Coordinates>>,
    pub bend_points: Vec<Spanned<Coordinates>>,
    pub properties: Vec<Property>,
}

/// The contents shared by the root and every node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    pub layout: Option<Spanned<ShapeLayout>>,
    pub properties: Vec<Property>,
    pub children: Vec<Node>,
    pub edges: Vec<Edge>,
    pub ports: Vec<Port>,
    pub labels: Vec<Label>,
}

/// The document itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootNode {
    /// Set by a leading `graph <id>`.
    pub identifier: Option<Spanned<Id>>,
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub identifier: Spanned<Id>,
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub identifier: Spanned<Id>,
    pub layout: Option<Spanned<ShapeLayout>>,
    pub properties: Vec<Property>,
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub identifier: Option<Spanned<Id>>,
    /// Raw string lexeme of the text.
    pub text: Spanned<String>,
    pub layout: Option<Spanned<ShapeLayout>>,
    pub properties: Vec<Property>,
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub identifier: Option<Spanned<Id>>,
    pub sources: Vec<Spanned<QualifiedId>>,
    pub targets: Vec<Spanned<QualifiedId>>,
    pub layout: Option<Spanned<EdgeLayout>>,
    pub properties: Vec<Property>,
    pub labels: Vec<Label>,
}
