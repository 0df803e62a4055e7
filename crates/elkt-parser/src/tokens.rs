//! Token definitions for the ELK graph text format.

use std::fmt;

use winnow::stream::Location;

use crate::span::Span;

/// Token types for the ELK graph text format
///
/// Literal tokens borrow their raw lexeme from the source. Strings keep their
/// quotes and escape sequences; unescaping happens during value coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'src> {
    // Keywords
    True,
    False,
    Null,
    Graph,
    Node,
    Label,
    Port,
    Layout,
    Position,
    Size,
    Width,
    Height,
    Edge,
    Incoming,
    Outgoing,
    Start,
    End,
    Bends,
    Section,

    // Literals
    /// Identifier text, without the `^` escape prefix.
    Identifier(&'src str),
    /// Raw string lexeme including its quotes.
    StringLiteral(&'src str),
    /// Unsigned integer, e.g. `42`.
    Integer(&'src str),
    /// Integer with an explicit sign, e.g. `-3`.
    SignedInteger(&'src str),
    /// Number with a fraction or exponent, e.g. `2.5` or `1e-3`.
    Float(&'src str),

    // Punctuation
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    Colon,        // :
    Equals,       // =
    Comma,        // ,
    Arrow,        // ->
    Pipe,         // |
    Dot,          // .

    // Trivia
    LineComment(&'src str),
    BlockComment(&'src str),
    Whitespace,
}

impl<'src> Token<'src> {
    /// Looks up the keyword spelled `text`.
    pub fn keyword(text: &str) -> Option<Token<'static>> {
        let token = match text {
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            "graph" => Token::Graph,
            "node" => Token::Node,
            "label" => Token::Label,
            "port" => Token::Port,
            "layout" => Token::Layout,
            "position" => Token::Position,
            "size" => Token::Size,
            "width" => Token::Width,
            "height" => Token::Height,
            "edge" => Token::Edge,
            "incoming" => Token::Incoming,
            "outgoing" => Token::Outgoing,
            "start" => Token::Start,
            "end" => Token::End,
            "bends" => Token::Bends,
            "section" => Token::Section,
            _ => return None,
        };
        Some(token)
    }

    /// Returns the spelling of a keyword token.
    pub fn keyword_text(&self) -> Option<&'static str> {
        let text = match self {
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::Graph => "graph",
            Token::Node => "node",
            Token::Label => "label",
            Token::Port => "port",
            Token::Layout => "layout",
            Token::Position => "position",
            Token::Size => "size",
            Token::Width => "width",
            Token::Height => "height",
            Token::Edge => "edge",
            Token::Incoming => "incoming",
            Token::Outgoing => "outgoing",
            Token::Start => "start",
            Token::End => "end",
            Token::Bends => "bends",
            Token::Section => "section",
            _ => return None,
        };
        Some(text)
    }

    /// Whitespace and comments, which never reach the parser.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace | Token::LineComment(_) | Token::BlockComment(_)
        )
    }

    /// Short description used in "expected X, found Y" messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Identifier(name) => format!("identifier `{name}`"),
            Token::StringLiteral(_) => "string literal".to_string(),
            Token::Integer(n) | Token::SignedInteger(n) | Token::Float(n) => {
                format!("number `{n}`")
            }
            Token::LineComment(_) | Token::BlockComment(_) => "comment".to_string(),
            Token::Whitespace => "whitespace".to_string(),
            other => format!("`{other}`"),
        }
    }
}

/// A token with position information for winnow integration
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

impl<'src> std::ops::Deref for PositionedToken<'src> {
    type Target = Token<'src>;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl<'src> fmt::Display for PositionedToken<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.token.fmt(f)
    }
}

impl<'src> Location for PositionedToken<'src> {
    fn previous_token_end(&self) -> usize {
        self.span.start()
    }

    fn current_token_start(&self) -> usize {
        self.span.start()
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(keyword) = self.keyword_text() {
            return f.write_str(keyword);
        }
        match self {
            Token::Identifier(name) => write!(f, "{name}"),
            Token::StringLiteral(raw)
            | Token::Integer(raw)
            | Token::SignedInteger(raw)
            | Token::Float(raw) => write!(f, "{raw}"),

            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Colon => write!(f, ":"),
            Token::Equals => write!(f, "="),
            Token::Comma => write!(f, ","),
            Token::Arrow => write!(f, "->"),
            Token::Pipe => write!(f, "|"),
            Token::Dot => write!(f, "."),

            Token::LineComment(comment) => write!(f, "//{comment}"),
            Token::BlockComment(comment) => write!(f, "/*{comment}*/"),
            Token::Whitespace => write!(f, " "),
            _ => Ok(()),
        }
    }
}
