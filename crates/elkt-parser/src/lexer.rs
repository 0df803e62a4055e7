//! Lexical analyzer for ELK graph text.
//!
//! The lexer converts source text into a stream of [`Token`]s. Whitespace
//! and comments are produced as trivia tokens and dropped afterwards by
//! [`significant_tokens`], so no grammar rule ever has to deal with them.
//!
//! Errors do not stop the lexer: after reporting a diagnostic it skips to
//! the next whitespace boundary and keeps going, so one pass reports every
//! lexical problem of a document.

use winnow::{
    Parser as _,
    ascii::digit1,
    combinator::{alt, cut_err, opt, preceded, repeat, terminated},
    error::{ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{any, literal, none_of, one_of, take_until, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Rich diagnostic information for lexer errors.
///
/// Attached to winnow errors via `.context()` to provide detailed error
/// messages with codes, help text, and precise span information.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    pub code: ErrorCode,
    pub message: &'static str,
    pub help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    pub start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<'a, O> = ModalResult<O, ContextError<LexerDiagnostic>>;

/// Parse the characters between the quotes of a string.
///
/// A backslash escapes whatever character follows it, the closing quote
/// included. Line breaks are allowed inside strings.
fn string_body<'a>(input: &mut Input<'a>, quote: char) -> IResult<'a, ()> {
    repeat(
        0..,
        alt((
            preceded('\\', any).void(),
            none_of([quote, '\\']).void(),
        )),
    )
    .parse_next(input)
}

/// Parse a string quoted with `quote`, returning the raw lexeme.
fn quoted<'a>(input: &mut Input<'a>, quote: char) -> IResult<'a, &'a str> {
    let start = input.current_token_start();

    (
        quote,
        cut_err(terminated(|i: &mut Input<'a>| string_body(i, quote), quote)).context(
            LexerDiagnostic {
                code: ErrorCode::E001,
                message: "unterminated string literal",
                help: Some("add the closing quote"),
                start,
            },
        ),
    )
        .take()
        .parse_next(input)
}

/// Parse a double or single quoted string literal.
///
/// The token keeps the quotes and escape sequences untouched; they are
/// decoded when the value is coerced.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt((
        |i: &mut Input<'a>| quoted(i, '"'),
        |i: &mut Input<'a>| quoted(i, '\''),
    ))
    .map(Token::StringLiteral)
    .parse_next(input)
}

/// Parse line comment starting with '//'
fn line_comment<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    preceded("//", take_while(0.., |c| c != '\n'))
        .map(Token::LineComment)
        .parse_next(input)
}

/// Parse a `/* ... */` comment. Block comments do not nest.
fn block_comment<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start = input.current_token_start();

    preceded(
        "/*",
        cut_err(terminated(take_until(0.., "*/"), "*/")).context(LexerDiagnostic {
            code: ErrorCode::E003,
            message: "unterminated block comment",
            help: Some("close the comment with `*/`"),
            start,
        }),
    )
    .map(Token::BlockComment)
    .parse_next(input)
}

/// Parse a number and classify it by its shape.
///
/// - `Float` when it has a fraction or an exponent
/// - `SignedInteger` when it starts with `+` or `-`
/// - `Integer` otherwise
fn number<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    (
        opt(one_of(['+', '-'])),
        digit1,
        opt(('.', digit1)),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
    )
        .take()
        .map(|raw: &'a str| {
            if raw.contains(['.', 'e', 'E']) {
                Token::Float(raw)
            } else if raw.starts_with(['+', '-']) {
                Token::SignedInteger(raw)
            } else {
                Token::Integer(raw)
            }
        })
        .parse_next(input)
}

/// Parse a keyword or an identifier.
///
/// A leading `^` turns a keyword into a plain identifier: `^node` is the
/// identifier `node`.
fn word<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    (
        opt('^'),
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .map(|raw: &'a str| match raw.strip_prefix('^') {
            Some(escaped) => Token::Identifier(escaped),
            None => Token::keyword(raw).unwrap_or(Token::Identifier(raw)),
        })
        .parse_next(input)
}

/// Parse punctuation (longest match first)
fn punctuation<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt((
        literal("->").value(Token::Arrow),
        '{'.value(Token::LeftBrace),
        '}'.value(Token::RightBrace),
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
        ':'.value(Token::Colon),
        '='.value(Token::Equals),
        ','.value(Token::Comma),
        alt(('|'.value(Token::Pipe), '.'.value(Token::Dot))),
    ))
    .parse_next(input)
}

/// Spaces, tabs and line breaks. Other Unicode whitespace is an unexpected character.
fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Parse a run of whitespace, line breaks included.
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    take_while(1.., is_whitespace)
        .value(Token::Whitespace)
        .parse_next(input)
}

/// Parse a single token with position tracking
fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<'a, PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        block_comment,  // Must come before line comment
        line_comment,   // Must come before any single char
        string_literal, // Must come before any single char
        punctuation,    // `->` must come before signed numbers
        number,         // Must come before word
        word,
        whitespace,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    let span = Span::new(start_pos..end_pos);

    Ok(PositionedToken::new(token, span))
}

/// Lexer that accumulates tokens and diagnostics during tokenization.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer.
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Tokenize the input, collecting tokens and errors.
    fn tokenize(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            let checkpoint = input.checkpoint();
            let token_start = input.current_token_start();

            match positioned_token(&mut input) {
                Ok(token) => {
                    self.tokens.push(token);
                }
                Err(e) => {
                    let error_pos = input.current_token_start();
                    input.reset(&checkpoint);

                    let width = input.peek_token().map_or(1, char::len_utf8);
                    let diagnostic = Self::convert_err_mode(e, token_start, error_pos, width);
                    self.diagnostics.emit(diagnostic);

                    Self::resynchronize(&mut input);
                }
            }
        }
    }

    /// Skip the offending character and everything up to the next whitespace.
    fn resynchronize(input: &mut Input<'a>) {
        if input.next_token().is_some() {
            let _skipped: IResult<'a, &'a str> =
                take_while(0.., |c: char| !is_whitespace(c)).parse_next(input);
        }
    }

    /// Finish lexing and return tokens or collected errors.
    fn finish(self) -> Result<Vec<PositionedToken<'a>>, ParseError> {
        if self.diagnostics.has_errors() {
            Err(ParseError::new(self.diagnostics.into_diagnostics()))
        } else {
            Ok(self.tokens)
        }
    }

    /// Finish lexing and return the tokens together with every diagnostic.
    fn into_parts(self) -> (Vec<PositionedToken<'a>>, Vec<Diagnostic>) {
        (self.tokens, self.diagnostics.into_diagnostics())
    }

    /// Convert an ErrMode and error position to a Diagnostic.
    ///
    /// Extracts `LexerDiagnostic` from the error context for rich error info
    /// with code, message, and help. Falls back to E002 (unexpected character)
    /// if no diagnostic context is found.
    fn convert_err_mode(
        err: ErrMode<ContextError<LexerDiagnostic>>,
        token_start: usize,
        error_pos: usize,
        width: usize,
    ) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let span = Span::new(*start..error_pos.max(*start + 1));

            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(span, code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        let span = Span::new(token_start..token_start + width);
        Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(span, ErrorCode::E002.description())
            .with_help("remove the character or put it inside a string")
    }
}

/// Tokenize a whole document.
///
/// Attempts to recover from errors and continue tokenizing, collecting
/// all errors encountered.
///
/// # Returns
///
/// - `Ok(tokens)` - All tokens successfully lexed, trivia included
/// - `Err(ParseError)` - One or more errors occurred; contains all diagnostics
///
/// # Example
///
/// ```
/// # use elkt_parser::lexer::{significant_tokens, tokenize};
/// # use elkt_parser::tokens::Token;
/// let tokens = tokenize("node A // first\nnode ^node").unwrap();
/// let tokens = significant_tokens(&tokens);
///
/// assert_eq!(tokens[1].token, Token::Identifier("A"));
/// assert_eq!(tokens[3].token, Token::Identifier("node"));
/// ```
pub fn tokenize(input: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    let mut lexer = Lexer::new();
    lexer.tokenize(LocatingSlice::new(input));
    lexer.finish()
}

/// Tokenize a whole document, returning whatever tokens could be produced
/// together with every diagnostic.
pub fn tokenize_recovering(input: &str) -> (Vec<PositionedToken<'_>>, Vec<Diagnostic>) {
    let mut lexer = Lexer::new();
    lexer.tokenize(LocatingSlice::new(input));
    lexer.into_parts()
}

/// Drop whitespace and comments.
pub fn significant_tokens<'a>(tokens: &[PositionedToken<'a>]) -> Vec<PositionedToken<'a>> {
    tokens
        .iter()
        .filter(|token| !token.is_trivia())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_single_token(input: &str, expected: Token<'_>) {
        let mut located_input = LocatingSlice::new(input);
        let result = positioned_token(&mut located_input);
        assert!(result.is_ok(), "Failed to parse: {}", input);
        let positioned = result.unwrap();
        assert_eq!(positioned.token, expected);
        assert_eq!(positioned.span, Span::new(0..input.len()));
    }

    fn kinds(input: &str) -> Vec<Token<'_>> {
        significant_tokens(&tokenize(input).expect("should tokenize"))
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_keywords() {
        test_single_token("true", Token::True);
        test_single_token("false", Token::False);
        test_single_token("null", Token::Null);
        test_single_token("graph", Token::Graph);
        test_single_token("node", Token::Node);
        test_single_token("label", Token::Label);
        test_single_token("port", Token::Port);
        test_single_token("layout", Token::Layout);
        test_single_token("position", Token::Position);
        test_single_token("size", Token::Size);
        test_single_token("width", Token::Width);
        test_single_token("height", Token::Height);
        test_single_token("edge", Token::Edge);
        test_single_token("incoming", Token::Incoming);
        test_single_token("outgoing", Token::Outgoing);
        test_single_token("start", Token::Start);
        test_single_token("end", Token::End);
        test_single_token("bends", Token::Bends);
        test_single_token("section", Token::Section);
    }

    #[test]
    fn test_identifiers() {
        test_single_token("hello", Token::Identifier("hello"));
        test_single_token("_private", Token::Identifier("_private"));
        test_single_token("n123", Token::Identifier("n123"));
        test_single_token("nodes", Token::Identifier("nodes"));
        test_single_token("endpoint", Token::Identifier("endpoint"));
    }

    #[test]
    fn test_escaped_keyword_is_identifier() {
        test_single_token("^node", Token::Identifier("node"));
        test_single_token("^layout", Token::Identifier("layout"));
        test_single_token("^plain", Token::Identifier("plain"));
    }

    #[test]
    fn test_punctuation() {
        test_single_token("{", Token::LeftBrace);
        test_single_token("}", Token::RightBrace);
        test_single_token("[", Token::LeftBracket);
        test_single_token("]", Token::RightBracket);
        test_single_token(":", Token::Colon);
        test_single_token("=", Token::Equals);
        test_single_token(",", Token::Comma);
        test_single_token("->", Token::Arrow);
        test_single_token("|", Token::Pipe);
        test_single_token(".", Token::Dot);
    }

    #[test]
    fn test_numbers() {
        test_single_token("42", Token::Integer("42"));
        test_single_token("0", Token::Integer("0"));
        test_single_token("-3", Token::SignedInteger("-3"));
        test_single_token("+7", Token::SignedInteger("+7"));
        test_single_token("2.5", Token::Float("2.5"));
        test_single_token("-0.25", Token::Float("-0.25"));
        test_single_token("1e5", Token::Float("1e5"));
        test_single_token("2.5E-3", Token::Float("2.5E-3"));
        test_single_token("1e+4", Token::Float("1e+4"));
    }

    #[test]
    fn test_number_boundaries() {
        // A trailing dot or exponent marker without digits is not part of the number
        assert_eq!(kinds("5."), vec![Token::Integer("5"), Token::Dot]);
        assert_eq!(
            kinds("2abc"),
            vec![Token::Integer("2"), Token::Identifier("abc")]
        );
        assert_eq!(kinds("2edge"), vec![Token::Integer("2"), Token::Edge]);
        assert_eq!(
            kinds("10,20"),
            vec![Token::Integer("10"), Token::Comma, Token::Integer("20")]
        );
    }

    #[test]
    fn test_arrow_before_negative_number() {
        assert_eq!(
            kinds("A->-1"),
            vec![
                Token::Identifier("A"),
                Token::Arrow,
                Token::SignedInteger("-1")
            ]
        );
    }

    #[test]
    fn test_string_literals_keep_raw_lexeme() {
        test_single_token("\"hello world\"", Token::StringLiteral("\"hello world\""));
        test_single_token("\"\"", Token::StringLiteral("\"\""));
        test_single_token("'single'", Token::StringLiteral("'single'"));
        test_single_token(
            "\"say \\\"hi\\\"\"",
            Token::StringLiteral("\"say \\\"hi\\\"\""),
        );
        test_single_token("'it\\'s'", Token::StringLiteral("'it\\'s'"));
        test_single_token("\"two\nlines\"", Token::StringLiteral("\"two\nlines\""));
    }

    #[test]
    fn test_comments() {
        test_single_token("// note", Token::LineComment(" note"));
        test_single_token("/* a\nb */", Token::BlockComment(" a\nb "));
        test_single_token("/**/", Token::BlockComment(""));
    }

    #[test]
    fn test_trivia_is_filtered() {
        let tokens = tokenize("node /* x */ A // y\n").unwrap();
        assert_eq!(tokens.len(), 8);

        let significant = significant_tokens(&tokens);
        assert_eq!(significant.len(), 2);
        assert_eq!(significant[0].token, Token::Node);
        assert_eq!(significant[1].token, Token::Identifier("A"));
        assert_eq!(significant[1].span, Span::new(13..14));
    }

    #[test]
    fn test_dotted_key_with_interior_whitespace() {
        assert_eq!(
            kinds("elk . direction"),
            vec![
                Token::Identifier("elk"),
                Token::Dot,
                Token::Identifier("direction")
            ]
        );
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("node A # node B").unwrap_err();
        assert_eq!(err.diagnostics().len(), 1);

        let diag = &err.diagnostics()[0];
        assert_eq!(diag.code(), Some(ErrorCode::E002));
        assert_eq!(diag.primary_span(), Some(Span::new(7..8)));
    }

    #[test]
    fn test_unexpected_character_recovers_at_whitespace() {
        let (tokens, diagnostics) = tokenize_recovering("node A#x node B");
        assert_eq!(diagnostics.len(), 1);

        let kinds: Vec<_> = significant_tokens(&tokens).into_iter().map(|t| t.token).collect();
        assert_eq!(
            kinds,
            vec![
                Token::Node,
                Token::Identifier("A"),
                Token::Node,
                Token::Identifier("B")
            ]
        );
    }

    #[test]
    fn test_only_ascii_whitespace_separates_tokens() {
        let (tokens, diagnostics) = tokenize_recovering("node\u{a0}A node\tB\r\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E002));
        assert_eq!(diagnostics[0].primary_span().map(|s| s.start()), Some(4));

        let kinds: Vec<_> = significant_tokens(&tokens).into_iter().map(|t| t.token).collect();
        assert_eq!(
            kinds,
            vec![Token::Node, Token::Node, Token::Identifier("B")]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("label \"open").unwrap_err();
        let diag = &err.diagnostics()[0];

        assert_eq!(diag.code(), Some(ErrorCode::E001));
        assert_eq!(diag.primary_span().map(|s| s.start()), Some(6));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = tokenize("node A /* never closed").unwrap_err();
        let diag = &err.diagnostics()[0];

        assert_eq!(diag.code(), Some(ErrorCode::E003));
        assert_eq!(diag.primary_span().map(|s| s.start()), Some(7));
    }

    #[test]
    fn test_multiple_errors_in_one_pass() {
        let (_, diagnostics) = tokenize_recovering("node # edge $ port %");
        assert_eq!(diagnostics.len(), 3);
        assert!(
            diagnostics
                .iter()
                .all(|d| d.code() == Some(ErrorCode::E002))
        );
    }

    #[test]
    fn test_multibyte_unexpected_character() {
        let err = tokenize("node é").unwrap_err();
        assert_eq!(err.diagnostics()[0].primary_span(), Some(Span::new(5..7)));
    }
}
