//! Parser for ELK graph text tokens.
//!
//! This module transforms the significant tokens produced by the
//! [`lexer`](super::lexer) into the syntax tree defined in
//! [`ast`](super::ast). The public entry point is [`parse`].
//!
//! Leaf rules (identifiers, numbers, property values) are plain winnow
//! parsers. Structural rules are methods of [`Parser`], which owns the
//! diagnostics and performs error recovery: when an element fails to parse
//! the error is recorded and the parser skips ahead to the next `node`,
//! `edge`, `port`, `label` or `}` at the same nesting depth.

use std::{collections::HashMap, fmt};

use log::trace;
use winnow::{
    Parser as _,
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use elkt_core::identifier::Id;

use crate::{
    ast::{self, QualifiedId},
    config::{ParseConfig, Recovery},
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    lexer::significant_tokens,
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what the failing rule was looking for
    Expected(&'static str),
}

type Input<'a> = TokenSlice<'a, PositionedToken<'a>>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;

/// Peek at the kind of the next token.
fn peek<'a>(input: &Input<'a>) -> Option<Token<'a>> {
    input.peek_token().map(|token| token.token)
}

fn peek_is(input: &Input<'_>, expected: Token<'static>) -> bool {
    peek(input) == Some(expected)
}

/// Consume one specific token and return its span.
fn expect<'a>(input: &mut Input<'a>, expected: Token<'static>, label: &'static str) -> IResult<Span> {
    any.verify_map(|token: &PositionedToken<'_>| (token.token == expected).then_some(token.span))
        .context(Context::Expected(label))
        .parse_next(input)
}

/// Parse the `:` or `=` between a name and its value.
fn separator<'a>(input: &mut Input<'a>) -> IResult<Span> {
    any.verify_map(|token: &PositionedToken<'_>| {
        matches!(token.token, Token::Colon | Token::Equals).then_some(token.span)
    })
    .context(Context::Expected("`:` or `=`"))
    .parse_next(input)
}

/// Parse an identifier
fn identifier<'a>(input: &mut Input<'a>) -> IResult<Spanned<Id>> {
    any.verify_map(|token: &PositionedToken<'_>| match token.token {
        Token::Identifier(name) => Some(Spanned::new(Id::new(name), token.span)),
        _ => None,
    })
    .context(Context::Expected("identifier"))
    .parse_next(input)
}

/// Parse a segment following a `.`, where keywords are plain names.
fn segment<'a>(input: &mut Input<'a>) -> IResult<Spanned<Id>> {
    any.verify_map(|token: &PositionedToken<'_>| match token.token {
        Token::Identifier(name) => Some(Spanned::new(Id::new(name), token.span)),
        other => other
            .keyword_text()
            .map(|keyword| Spanned::new(Id::new(keyword), token.span)),
    })
    .context(Context::Expected("identifier"))
    .parse_next(input)
}

/// Parse a dotted identifier path such as `A.p1`
fn qualified_id<'a>(input: &mut Input<'a>) -> IResult<Spanned<QualifiedId>> {
    let first = identifier.parse_next(input)?;
    let mut span = first.span();
    let mut segments = vec![*first.inner()];

    while peek_is(input, Token::Dot) {
        input.next_token();
        let next = segment.parse_next(input)?;
        span = span.union(next.span());
        segments.push(*next.inner());
    }

    Ok(Spanned::new(QualifiedId::new(segments), span))
}

/// Parse a comma separated list of qualified ids
fn qualified_ids<'a>(input: &mut Input<'a>) -> IResult<Vec<Spanned<QualifiedId>>> {
    let mut ids = vec![qualified_id.parse_next(input)?];
    while peek_is(input, Token::Comma) {
        input.next_token();
        ids.push(qualified_id.parse_next(input)?);
    }
    Ok(ids)
}

/// Parse a number literal
fn number<'a>(input: &mut Input<'a>) -> IResult<Spanned<ast::Number>> {
    any.verify_map(|token: &PositionedToken<'_>| match token.token {
        Token::Integer(raw) | Token::SignedInteger(raw) | Token::Float(raw) => {
            Some(Spanned::new(ast::Number::new(raw), token.span))
        }
        _ => None,
    })
    .context(Context::Expected("number"))
    .parse_next(input)
}

/// Parse an `x, y` pair
fn coordinates<'a>(input: &mut Input<'a>) -> IResult<Spanned<ast::Coordinates>> {
    let x = number.parse_next(input)?;
    expect(input, Token::Comma, "`,`")?;
    let y = number.parse_next(input)?;
    let span = x.span().union(y.span());
    Ok(Spanned::new(ast::Coordinates { x, y }, span))
}

/// Parse string literal, keeping the raw lexeme
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<Spanned<String>> {
    any.verify_map(|token: &PositionedToken<'_>| match token.token {
        Token::StringLiteral(raw) => Some(Spanned::new(raw.to_string(), token.span)),
        _ => None,
    })
    .context(Context::Expected("string literal"))
    .parse_next(input)
}

/// Parse a property value.
///
/// The value kind is decided by the kind of the first token alone.
fn property_value<'a>(input: &mut Input<'a>) -> IResult<Spanned<ast::RawValue>> {
    if matches!(peek(input), Some(Token::Identifier(_))) {
        return Ok(qualified_id.parse_next(input)?.map(|id| ast::RawValue::QualifiedId(id.clone())));
    }

    any.verify_map(|token: &PositionedToken<'_>| {
        let value = match token.token {
            Token::StringLiteral(raw) => ast::RawValue::String(raw.to_string()),
            Token::True => ast::RawValue::Bool(true),
            Token::False => ast::RawValue::Bool(false),
            Token::Null => ast::RawValue::Null,
            Token::Integer(raw) | Token::SignedInteger(raw) => ast::RawValue::Int(raw.to_string()),
            Token::Float(raw) => ast::RawValue::Float(raw.to_string()),
            _ => return None,
        };
        Some(Spanned::new(value, token.span))
    })
    .context(Context::Expected("property value"))
    .parse_next(input)
}

/// Parse a `key: value` property
fn property<'a>(input: &mut Input<'a>) -> IResult<ast::Property> {
    let key = qualified_id.parse_next(input)?;
    separator.parse_next(input)?;
    let value = property_value.parse_next(input)?;
    Ok(ast::Property { key, value })
}

/// Attributes of the unordered layout groups, each allowed at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Attribute {
    Position,
    Width,
    Height,
    Incoming,
    Outgoing,
    Start,
    End,
    Bends,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Attribute::Position => "position",
            Attribute::Width => "width",
            Attribute::Height => "height",
            Attribute::Incoming => "incoming",
            Attribute::Outgoing => "outgoing",
            Attribute::Start => "start",
            Attribute::End => "end",
            Attribute::Bends => "bends",
        };
        f.write_str(name)
    }
}

/// Tracks which attributes of one layout block were already given.
#[derive(Debug, Default)]
struct AttributeSet {
    seen: HashMap<Attribute, Span>,
}

impl AttributeSet {
    /// Record `attributes` as given at `span`.
    ///
    /// Fails with the attribute and span of the earlier clause if any of
    /// them was already given; nothing is recorded in that case.
    fn claim(&mut self, attributes: &[Attribute], span: Span) -> Result<(), (Attribute, Span)> {
        if let Some((attribute, first)) = attributes
            .iter()
            .find_map(|attribute| self.seen.get(attribute).map(|first| (*attribute, *first)))
        {
            return Err((attribute, first));
        }
        for attribute in attributes {
            self.seen.insert(*attribute, span);
        }
        Ok(())
    }
}

/// Which block a list of items belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Root,
    Node,
    Port,
    Label,
    Edge,
}

impl BlockKind {
    /// Only the root and nodes contain nodes, edges and ports.
    fn allows_elements(self) -> bool {
        matches!(self, BlockKind::Root | BlockKind::Node)
    }

    fn describe(self) -> &'static str {
        match self {
            BlockKind::Root => "the graph",
            BlockKind::Node => "a node",
            BlockKind::Port => "a port",
            BlockKind::Label => "a label",
            BlockKind::Edge => "an edge",
        }
    }
}

/// Item groups of a block, which must appear in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Layout,
    Properties,
    Elements,
}

#[derive(Debug)]
enum Layout {
    Shape(Spanned<ast::ShapeLayout>),
    Edge(Spanned<ast::EdgeLayout>),
}

impl Layout {
    fn span(&self) -> Span {
        match self {
            Layout::Shape(layout) => layout.span(),
            Layout::Edge(layout) => layout.span(),
        }
    }
}

/// Everything found between the braces of a block.
#[derive(Debug, Default)]
struct BlockContent {
    layout: Option<Layout>,
    properties: Vec<ast::Property>,
    children: Vec<ast::Node>,
    edges: Vec<ast::Edge>,
    ports: Vec<ast::Port>,
    labels: Vec<ast::Label>,
}

impl BlockContent {
    fn shape_layout(&mut self) -> Option<Spanned<ast::ShapeLayout>> {
        match self.layout.take() {
            Some(Layout::Shape(layout)) => Some(layout),
            _ => None,
        }
    }

    fn edge_layout(&mut self) -> Option<Spanned<ast::EdgeLayout>> {
        match self.layout.take() {
            Some(Layout::Edge(layout)) => Some(layout),
            _ => None,
        }
    }

    fn into_body(mut self) -> ast::Body {
        ast::Body {
            layout: self.shape_layout(),
            properties: self.properties,
            children: self.children,
            edges: self.edges,
            ports: self.ports,
            labels: self.labels,
        }
    }
}

/// Recursive descent parser with error recovery.
struct Parser<'a> {
    tokens: &'a [PositionedToken<'a>],
    diagnostics: DiagnosticCollector,
    recovery: Recovery,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [PositionedToken<'a>], config: &ParseConfig) -> Self {
        Self {
            tokens,
            diagnostics: DiagnosticCollector::new(),
            recovery: config.recovery,
        }
    }

    /// Fail-fast parsing stops once the first error is out.
    fn aborted(&self) -> bool {
        self.recovery == Recovery::FailFast && self.diagnostics.has_errors()
    }

    // =========================================================================
    // Diagnostics and recovery
    // =========================================================================

    fn emit(&mut self, diagnostic: Diagnostic) {
        if !self.aborted() {
            self.diagnostics.emit(diagnostic);
        }
    }

    fn report(&mut self, error: ErrMode<ContextError<Context>>, input: &Input<'a>) {
        let diagnostic = convert_error(error, self.tokens, input.eof_offset());
        self.emit(diagnostic);
    }

    /// Report the next token as unexpected in a block.
    fn unexpected(&mut self, token: &PositionedToken<'_>, expected: &str) {
        let diagnostic = Diagnostic::error(format!(
            "expected {expected}, found {}",
            token.describe()
        ))
        .with_code(ErrorCode::E100)
        .with_label(token.span, "unexpected token");
        self.emit(diagnostic);
    }

    /// Skip tokens until the next `node`, `edge`, `port`, `label` or `}` at
    /// the nesting depth the failed item started at.
    ///
    /// At least one token is consumed when the failed item consumed none.
    fn synchronize(&mut self, input: &mut Input<'a>, start_offset: usize) {
        let mut previous = None;
        if input.eof_offset() == start_offset {
            previous = input.next_token().map(|token| token.token);
        }

        let mut depth = 0usize;
        while let Some(token) = peek(input) {
            match token {
                Token::LeftBrace | Token::LeftBracket => depth += 1,
                Token::RightBracket => depth = depth.saturating_sub(1),
                Token::RightBrace if depth == 0 => break,
                Token::RightBrace => depth -= 1,
                Token::Node | Token::Edge | Token::Port | Token::Label
                    if depth == 0 && previous != Some(Token::Dot) =>
                {
                    break;
                }
                _ => {}
            }
            previous = input.next_token().map(|token| token.token);
        }

        trace!(skipped_to = self.tokens.len() - input.eof_offset(); "Resynchronized parser");
    }

    /// Run `rule`, recovering from its failure.
    fn attempt<T>(
        &mut self,
        input: &mut Input<'a>,
        rule: impl FnOnce(&mut Self, &mut Input<'a>) -> IResult<T>,
    ) -> Option<T> {
        let start_offset = input.eof_offset();
        match rule(self, input) {
            Ok(value) => Some(value),
            Err(error) => {
                self.report(error, input);
                self.synchronize(input, start_offset);
                None
            }
        }
    }

    /// Warn about a repeated attribute, keeping the first occurrence.
    fn claim(
        &mut self,
        attributes: &mut AttributeSet,
        claimed: &[Attribute],
        span: Span,
    ) -> bool {
        match attributes.claim(claimed, span) {
            Ok(()) => true,
            Err((attribute, first)) => {
                self.emit(
                    Diagnostic::warning(format!("`{attribute}` is given more than once"))
                        .with_code(ErrorCode::E104)
                        .with_label(span, "ignored")
                        .with_secondary_label(first, "first given here")
                        .with_help("remove the repeated attribute; the first one is kept"),
                );
                false
            }
        }
    }

    /// Consume the `}` closing a block opened at `open`.
    fn close_block(&mut self, input: &mut Input<'a>, open: Span) {
        if expect(input, Token::RightBrace, "`}`").is_ok() {
            return;
        }
        let found = input.peek_token().cloned();
        let diagnostic = match found {
            Some(token) => Diagnostic::error(format!("expected `}}`, found {}", token.describe()))
                .with_code(ErrorCode::E100)
                .with_label(token.span, "expected `}`"),
            None => Diagnostic::error("unexpected end of input, expected `}`")
                .with_code(ErrorCode::E101)
                .with_label(end_of_input(self.tokens), "expected `}`"),
        };
        self.emit(
            diagnostic
                .with_secondary_label(open, "block opened here")
                .with_help("add the missing `}`"),
        );
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    /// Parse the items of a block until `}` or the end of input.
    ///
    /// Items are expected in the order layout, properties, elements; items
    /// out of order are reported but kept. Elements a block cannot hold are
    /// reported and dropped.
    fn block_items(&mut self, input: &mut Input<'a>, kind: BlockKind, braced: bool) -> BlockContent {
        let mut content = BlockContent::default();
        let mut stage = Stage::Layout;

        while !self.aborted() {
            let Some(token) = input.peek_token().cloned() else {
                break;
            };

            let item_stage = match token.token {
                Token::RightBrace if braced => break,
                Token::RightBrace => {
                    self.unexpected(&token, "an element");
                    input.next_token();
                    continue;
                }
                Token::Layout => Stage::Layout,
                Token::Identifier(_) => Stage::Properties,
                Token::Label => Stage::Elements,
                Token::Node | Token::Edge | Token::Port => {
                    if !kind.allows_elements() {
                        self.emit(
                            Diagnostic::error(format!(
                                "`{}` is not allowed inside {}",
                                token.token,
                                kind.describe()
                            ))
                            .with_code(ErrorCode::E100)
                            .with_label(token.span, "not allowed here")
                            .with_help("only labels can be nested here"),
                        );
                    }
                    Stage::Elements
                }
                _ => {
                    let start_offset = input.eof_offset();
                    self.unexpected(&token, &block_expectation(kind));
                    self.synchronize(input, start_offset);
                    continue;
                }
            };

            if item_stage < stage {
                self.emit(
                    Diagnostic::error(format!(
                        "{} must come before {}",
                        stage_name(item_stage),
                        stage_name(stage)
                    ))
                    .with_code(ErrorCode::E100)
                    .with_label(token.span, "out of order")
                    .with_help("write the layout first, then properties, then nested elements"),
                );
            }
            stage = stage.max(item_stage);

            match token.token {
                Token::Layout => {
                    let layout = self.attempt(input, |parser, input| {
                        if kind == BlockKind::Edge {
                            parser.edge_layout(input).map(Layout::Edge)
                        } else {
                            parser.shape_layout(input).map(Layout::Shape)
                        }
                    });
                    if let Some(layout) = layout {
                        match &content.layout {
                            Some(first) => {
                                let first = first.span();
                                self.emit(
                                    Diagnostic::error("a block can hold only one `layout`")
                                        .with_code(ErrorCode::E100)
                                        .with_label(layout.span(), "second layout")
                                        .with_secondary_label(first, "first layout"),
                                );
                            }
                            None => content.layout = Some(layout),
                        }
                    }
                }
                Token::Identifier(_) => {
                    if let Some(property) = self.attempt(input, |_, input| property(input)) {
                        content.properties.push(property);
                    }
                }
                Token::Label => {
                    if let Some(label) = self.attempt(input, Self::label) {
                        content.labels.push(label);
                    }
                }
                Token::Node => {
                    if let Some(node) = self.attempt(input, Self::node) {
                        if kind.allows_elements() {
                            content.children.push(node);
                        }
                    }
                }
                Token::Edge => {
                    if let Some(edge) = self.attempt(input, Self::edge) {
                        if kind.allows_elements() {
                            content.edges.push(edge);
                        }
                    }
                }
                Token::Port => {
                    if let Some(port) = self.attempt(input, Self::port) {
                        if kind.allows_elements() {
                            content.ports.push(port);
                        }
                    }
                }
                _ => {}
            }
        }

        content
    }

    /// Parse an optional `{ ... }` block.
    fn optional_block(&mut self, input: &mut Input<'a>, kind: BlockKind) -> BlockContent {
        match expect(input, Token::LeftBrace, "`{`") {
            Ok(open) => {
                let content = self.block_items(input, kind, true);
                if !self.aborted() {
                    self.close_block(input, open);
                }
                content
            }
            Err(_) => BlockContent::default(),
        }
    }

    // =========================================================================
    // Elements
    // =========================================================================

    /// Parse the whole document.
    fn root(&mut self, input: &mut Input<'a>) -> ast::RootNode {
        let mut root = ast::RootNode::default();
        let mut open = None;

        if peek_is(input, Token::Graph) {
            input.next_token();
            match identifier(input) {
                Ok(id) => root.identifier = Some(id),
                Err(error) => self.report(error, input),
            }
            open = expect(input, Token::LeftBrace, "`{`").ok();
        }

        let content = self.block_items(input, BlockKind::Root, open.is_some());
        root.body = content.into_body();

        if self.aborted() {
            return root;
        }
        if let Some(open) = open {
            self.close_block(input, open);
        }
        if let Some(token) = input.peek_token().cloned() {
            self.emit(
                Diagnostic::error(format!(
                    "unexpected {} after the end of the graph",
                    token.describe()
                ))
                .with_code(ErrorCode::E100)
                .with_label(token.span, "unexpected token")
                .with_help("move this inside the graph's braces"),
            );
            while input.next_token().is_some() {}
        }

        root
    }

    /// Parse a node: `node ID ({ ... })?`
    fn node(&mut self, input: &mut Input<'a>) -> IResult<ast::Node> {
        expect(input, Token::Node, "`node`")?;
        let identifier = identifier(input)?;
        let body = self.optional_block(input, BlockKind::Node).into_body();
        Ok(ast::Node { identifier, body })
    }

    /// Parse a port: `port ID ({ layout? properties labels })?`
    fn port(&mut self, input: &mut Input<'a>) -> IResult<ast::Port> {
        expect(input, Token::Port, "`port`")?;
        let identifier = identifier(input)?;
        let mut content = self.optional_block(input, BlockKind::Port);
        Ok(ast::Port {
            identifier,
            layout: content.shape_layout(),
            properties: content.properties,
            labels: content.labels,
        })
    }

    /// Parse a label: `label (ID :?)? STRING ({ ... })?`
    fn label(&mut self, input: &mut Input<'a>) -> IResult<ast::Label> {
        expect(input, Token::Label, "`label`")?;
        let identifier = if matches!(peek(input), Some(Token::Identifier(_))) {
            let id = identifier(input)?;
            if peek_is(input, Token::Colon) {
                input.next_token();
            }
            Some(id)
        } else {
            None
        };
        let text = string_literal(input)?;
        let mut content = self.optional_block(input, BlockKind::Label);
        Ok(ast::Label {
            identifier,
            text,
            layout: content.shape_layout(),
            properties: content.properties,
            labels: content.labels,
        })
    }

    /// Parse an edge: `edge (ID? :)? sources? -> targets? ({ ... })?`
    ///
    /// The optional identifier needs two tokens of lookahead: `e1 :` names
    /// the edge, while `e1 ->` starts the source list.
    fn edge(&mut self, input: &mut Input<'a>) -> IResult<ast::Edge> {
        expect(input, Token::Edge, "`edge`")?;

        let checkpoint = input.checkpoint();
        let identifier = match identifier(input) {
            Ok(id) if expect(input, Token::Colon, "`:`").is_ok() => Some(id),
            _ => {
                input.reset(&checkpoint);
                if peek_is(input, Token::Colon) {
                    input.next_token();
                }
                None
            }
        };

        let sources = if peek_is(input, Token::Arrow) {
            Vec::new()
        } else {
            qualified_ids(input)?
        };
        expect(input, Token::Arrow, "`->`")?;
        let targets = if matches!(peek(input), Some(Token::Identifier(_))) {
            qualified_ids(input)?
        } else {
            Vec::new()
        };

        let mut content = self.optional_block(input, BlockKind::Edge);
        Ok(ast::Edge {
            identifier,
            sources,
            targets,
            layout: content.edge_layout(),
            properties: content.properties,
            labels: content.labels,
        })
    }

    // =========================================================================
    // Layout blocks
    // =========================================================================

    /// Parse `keyword : x, y`, returning the clause span and the pair.
    fn coordinates_clause(
        input: &mut Input<'a>,
        keyword: Token<'static>,
        label: &'static str,
    ) -> IResult<(Span, Spanned<ast::Coordinates>)> {
        let start = expect(input, keyword, label)?;
        separator(input)?;
        let value = coordinates(input)?;
        Ok((start.union(value.span()), value))
    }

    /// Parse `keyword : n`, returning the clause span and the number.
    fn number_clause(
        input: &mut Input<'a>,
        keyword: Token<'static>,
        label: &'static str,
    ) -> IResult<(Span, Spanned<ast::Number>)> {
        let start = expect(input, keyword, label)?;
        separator(input)?;
        let value = number(input)?;
        Ok((start.union(value.span()), value))
    }

    /// Parse `keyword : qualified.id`, returning the clause span and the id.
    fn reference_clause(
        input: &mut Input<'a>,
        keyword: Token<'static>,
        label: &'static str,
    ) -> IResult<(Span, Spanned<QualifiedId>)> {
        let start = expect(input, keyword, label)?;
        separator(input)?;
        let value = qualified_id(input)?;
        Ok((start.union(value.span()), value))
    }

    /// Parse `layout [ ... ]` of a node, port or label.
    ///
    /// `position`, `size`, `width` and `height` may come in any order, each
    /// at most once; `size` counts as both `width` and `height`.
    fn shape_layout(&mut self, input: &mut Input<'a>) -> IResult<Spanned<ast::ShapeLayout>> {
        let start = expect(input, Token::Layout, "`layout`")?;
        expect(input, Token::LeftBracket, "`[`")?;

        let mut attributes = AttributeSet::default();
        let mut layout = ast::ShapeLayout::default();

        loop {
            match peek(input) {
                Some(Token::Position) => {
                    let (span, value) = Self::coordinates_clause(input, Token::Position, "`position`")?;
                    if self.claim(&mut attributes, &[Attribute::Position], span) {
                        layout.position = Some(value);
                    }
                }
                Some(Token::Size) => {
                    let (span, value) = Self::coordinates_clause(input, Token::Size, "`size`")?;
                    if self.claim(&mut attributes, &[Attribute::Width, Attribute::Height], span) {
                        let ast::Coordinates { x, y } = value.into_inner();
                        layout.width = Some(x);
                        layout.height = Some(y);
                    }
                }
                Some(Token::Width) => {
                    let (span, value) = Self::number_clause(input, Token::Width, "`width`")?;
                    if self.claim(&mut attributes, &[Attribute::Width], span) {
                        layout.width = Some(value);
                    }
                }
                Some(Token::Height) => {
                    let (span, value) = Self::number_clause(input, Token::Height, "`height`")?;
                    if self.claim(&mut attributes, &[Attribute::Height], span) {
                        layout.height = Some(value);
                    }
                }
                _ => break,
            }
        }

        let end = expect(input, Token::RightBracket, "`position`, `size`, `width`, `height` or `]`")?;
        Ok(Spanned::new(layout, start.union(end)))
    }

    /// Parse `layout [ ... ]` of an edge: one inline section or a list of
    /// named sections.
    fn edge_layout(&mut self, input: &mut Input<'a>) -> IResult<Spanned<ast::EdgeLayout>> {
        let start = expect(input, Token::Layout, "`layout`")?;
        expect(input, Token::LeftBracket, "`[`")?;

        let layout = if peek_is(input, Token::Section) {
            let mut sections = Vec::new();
            while peek_is(input, Token::Section) {
                sections.push(self.named_section(input)?);
            }
            ast::EdgeLayout::Sections(sections)
        } else {
            ast::EdgeLayout::Single(self.section_body(input)?)
        };

        let end = expect(input, Token::RightBracket, "`]`")?;
        Ok(Spanned::new(layout, start.union(end)))
    }

    /// Parse `section ID (-> ID (, ID)*)? [ ... ]`
    fn named_section(&mut self, input: &mut Input<'a>) -> IResult<ast::EdgeSection> {
        expect(input, Token::Section, "`section`")?;
        let name = identifier(input)?;

        let mut outgoing_sections = Vec::new();
        if peek_is(input, Token::Arrow) {
            input.next_token();
            outgoing_sections.push(identifier.parse_next(input)?);
            while peek_is(input, Token::Comma) {
                input.next_token();
                outgoing_sections.push(identifier.parse_next(input)?);
            }
        }

        expect(input, Token::LeftBracket, "`[`")?;
        let mut section = self.section_body(input)?;
        expect(input, Token::RightBracket, "`]`")?;

        section.identifier = Some(name);
        section.outgoing_sections = outgoing_sections;
        Ok(section)
    }

    /// Parse the attributes and properties of a section.
    ///
    /// `incoming`, `outgoing`, `start`, `end` and `bends` may come in any
    /// order, each at most once, followed by properties.
    fn section_body(&mut self, input: &mut Input<'a>) -> IResult<ast::EdgeSection> {
        let mut attributes = AttributeSet::default();
        let mut section = ast::EdgeSection::default();

        loop {
            match peek(input) {
                Some(Token::Incoming) => {
                    let (span, value) = Self::reference_clause(input, Token::Incoming, "`incoming`")?;
                    if self.claim(&mut attributes, &[Attribute::Incoming], span) {
                        section.incoming_shape = Some(value);
                    }
                }
                Some(Token::Outgoing) => {
                    let (span, value) = Self::reference_clause(input, Token::Outgoing, "`outgoing`")?;
                    if self.claim(&mut attributes, &[Attribute::Outgoing], span) {
                        section.outgoing_shape = Some(value);
                    }
                }
                Some(Token::Start) => {
                    let (span, value) = Self::coordinates_clause(input, Token::Start, "`start`")?;
                    if self.claim(&mut attributes, &[Attribute::Start], span) {
                        section.start = Some(value);
                    }
                }
                Some(Token::End) => {
                    let (span, value) = Self::coordinates_clause(input, Token::End, "`end`")?;
                    if self.claim(&mut attributes, &[Attribute::End], span) {
                        section.end = Some(value);
                    }
                }
                Some(Token::Bends) => {
                    let (span, points) = Self::bends_clause(input)?;
                    if self.claim(&mut attributes, &[Attribute::Bends], span) {
                        section.bend_points = points;
                    }
                }
                _ => break,
            }
        }

        while matches!(peek(input), Some(Token::Identifier(_))) {
            section.properties.push(property(input)?);
        }

        Ok(section)
    }

    /// Parse `bends : x, y (| x, y)*`
    fn bends_clause(input: &mut Input<'a>) -> IResult<(Span, Vec<Spanned<ast::Coordinates>>)> {
        let start = expect(input, Token::Bends, "`bends`")?;
        separator(input)?;

        let first = coordinates(input)?;
        let mut span = start.union(first.span());
        let mut points = vec![first];
        while peek_is(input, Token::Pipe) {
            input.next_token();
            let point = coordinates(input)?;
            span = span.union(point.span());
            points.push(point);
        }
        Ok((span, points))
    }
}

fn stage_name(stage: Stage) -> &'static str {
    match stage {
        Stage::Layout => "`layout`",
        Stage::Properties => "properties",
        Stage::Elements => "nested elements",
    }
}

fn block_expectation(kind: BlockKind) -> String {
    let closing = if kind == BlockKind::Root { "" } else { " or `}`" };
    if kind.allows_elements() {
        format!("`node`, `edge`, `port`, `label`, `layout`, a property{closing}")
    } else {
        format!("`label`, `layout`, a property{closing}")
    }
}

/// Empty span just past the last token.
fn end_of_input(tokens: &[PositionedToken<'_>]) -> Span {
    tokens
        .last()
        .map(|token| Span::new(token.span.end()..token.span.end()))
        .unwrap_or_default()
}

/// Convert a winnow error into a diagnostic.
///
/// The offending token is the one the input stopped at; an error at the end
/// of the token stream becomes E101.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken<'_>],
    current_remaining: usize,
) -> Diagnostic {
    let expected = match &error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e.context().find_map(|ctx| match ctx {
            Context::Expected(label) => Some(*label),
        }),
        ErrMode::Incomplete(_) => None,
    };

    let position = tokens.len().saturating_sub(current_remaining);
    match tokens.get(position) {
        Some(found) => {
            let message = match expected {
                Some(expected) => format!("expected {expected}, found {}", found.describe()),
                None => format!("unexpected {}", found.describe()),
            };
            let label = expected.map_or_else(
                || "unexpected token".to_string(),
                |expected| format!("expected {expected}"),
            );
            Diagnostic::error(message)
                .with_code(ErrorCode::E100)
                .with_label(found.span, label)
        }
        None => {
            let message = match expected {
                Some(expected) => format!("unexpected end of input, expected {expected}"),
                None => "unexpected end of input".to_string(),
            };
            Diagnostic::error(message)
                .with_code(ErrorCode::E101)
                .with_label(end_of_input(tokens), "input ends here")
                .with_help("the document seems to be cut off")
        }
    }
}

/// Parse tokens into a syntax tree.
///
/// Trivia tokens are ignored. A tree is always returned, holding everything
/// that could be parsed; syntax errors and warnings come back alongside it.
pub fn parse(tokens: &[PositionedToken<'_>], config: &ParseConfig) -> (ast::RootNode, Vec<Diagnostic>) {
    let significant = significant_tokens(tokens);
    let mut parser = Parser::new(&significant, config);
    let mut input = TokenSlice::new(&significant);

    let root = parser.root(&mut input);
    (root, parser.diagnostics.into_diagnostics())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_ok(source: &str) -> ast::RootNode {
        let tokens = tokenize(source).expect("source should tokenize");
        let (root, diagnostics) = parse(&tokens, &ParseConfig::default());
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
        root
    }

    fn parse_with(source: &str, config: &ParseConfig) -> (ast::RootNode, Vec<Diagnostic>) {
        let tokens = tokenize(source).expect("source should tokenize");
        parse(&tokens, config)
    }

    fn parse_diagnostics(source: &str) -> (ast::RootNode, Vec<Diagnostic>) {
        parse_with(source, &ParseConfig::default())
    }

    fn make_token(token: Token<'static>, start: usize, len: usize) -> PositionedToken<'static> {
        PositionedToken::new(token, Span::new(start..start + len))
    }

    fn ids(list: &[Spanned<QualifiedId>]) -> Vec<String> {
        list.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_qualified_id_accepts_keyword_segments() {
        let tokens = vec![
            make_token(Token::Identifier("elk"), 0, 3),
            make_token(Token::Dot, 3, 1),
            make_token(Token::Port, 4, 4),
            make_token(Token::Dot, 8, 1),
            make_token(Token::Identifier("side"), 9, 4),
        ];
        let mut input = TokenSlice::new(&tokens);

        let id = qualified_id(&mut input).unwrap();
        assert_eq!(id.to_string(), "elk.port.side");
        assert_eq!(id.span(), Span::new(0..13));
        assert!(input.is_empty());
    }

    #[test]
    fn test_qualified_id_rejects_leading_keyword() {
        let tokens = vec![make_token(Token::Node, 0, 4)];
        let mut input = TokenSlice::new(&tokens);
        assert!(qualified_id(&mut input).is_err());
    }

    #[test]
    fn test_property_value_kind_follows_token_kind() {
        let root = parse_ok(
            r#"
            a: "text"
            b: RIGHT
            c: true
            d: false
            e: -3
            f: 4
            g: 2.5e1
            h: null
            i: elk.layered
            "#,
        );
        let values: Vec<_> = root
            .body
            .properties
            .iter()
            .map(|p| p.value.inner().clone())
            .collect();

        assert_eq!(
            values,
            vec![
                ast::RawValue::String("\"text\"".to_string()),
                ast::RawValue::QualifiedId(QualifiedId::new(vec![Id::new("RIGHT")])),
                ast::RawValue::Bool(true),
                ast::RawValue::Bool(false),
                ast::RawValue::Int("-3".to_string()),
                ast::RawValue::Int("4".to_string()),
                ast::RawValue::Float("2.5e1".to_string()),
                ast::RawValue::Null,
                ast::RawValue::QualifiedId(QualifiedId::new(vec![
                    Id::new("elk"),
                    Id::new("layered")
                ])),
            ]
        );
    }

    #[test]
    fn test_equals_and_colon_are_interchangeable() {
        let with_colon = parse_ok("elk.direction: RIGHT node A { layout [ width: 3 ] }");
        let with_equals = parse_ok("elk.direction = RIGHT node A { layout [ width = 3 ] }");
        assert_eq!(with_colon, with_equals);
    }

    #[test]
    fn test_graph_header_with_braces() {
        let root = parse_ok("graph G { node A node B edge e1: A -> B }");

        assert_eq!(root.identifier.as_deref().copied(), Some(Id::new("G")));
        assert_eq!(root.body.children.len(), 2);
        let edge = &root.body.edges[0];
        assert_eq!(edge.identifier.as_deref().copied(), Some(Id::new("e1")));
        assert_eq!(ids(&edge.sources), vec!["A"]);
        assert_eq!(ids(&edge.targets), vec!["B"]);
    }

    #[test]
    fn test_graph_header_without_braces() {
        let root = parse_ok("graph G\nnode A");
        assert_eq!(root.identifier.as_deref().copied(), Some(Id::new("G")));
        assert_eq!(root.body.children.len(), 1);
    }

    #[test]
    fn test_root_layout_and_properties() {
        let root = parse_ok("layout [ size: 100, 50 ] elk.algorithm: layered node A");

        let layout = root.body.layout.as_ref().unwrap();
        assert_eq!(layout.width.as_ref().unwrap().raw(), "100");
        assert_eq!(layout.height.as_ref().unwrap().raw(), "50");
        assert_eq!(root.body.properties.len(), 1);
    }

    #[test]
    fn test_edge_forms() {
        let root = parse_ok(
            "edge A -> B
             edge e2: A, B -> C.p, D
             edge : A -> B
             edge -> B
             edge A ->",
        );
        let edges = &root.body.edges;

        assert_eq!(edges.len(), 5);
        assert!(edges[0].identifier.is_none());
        assert_eq!(ids(&edges[1].sources), vec!["A", "B"]);
        assert_eq!(ids(&edges[1].targets), vec!["C.p", "D"]);
        assert!(edges[2].identifier.is_none());
        assert_eq!(ids(&edges[2].sources), vec!["A"]);
        assert!(edges[3].sources.is_empty());
        assert!(edges[4].targets.is_empty());
    }

    #[test]
    fn test_edge_identifier_lookahead() {
        // `A` followed by `->` is a source, not an identifier
        let root = parse_ok("edge A -> B");
        assert!(root.body.edges[0].identifier.is_none());
        assert_eq!(ids(&root.body.edges[0].sources), vec!["A"]);
    }

    #[test]
    fn test_label_forms() {
        let root = parse_ok(
            r#"node A {
                label "plain"
                label l1 "named"
                label l2: 'colon'
                label "outer" { label "inner" }
            }"#,
        );
        let labels = &root.body.children[0].body.labels;

        assert_eq!(labels.len(), 4);
        assert!(labels[0].identifier.is_none());
        assert_eq!(labels[1].identifier.as_deref().copied(), Some(Id::new("l1")));
        assert_eq!(labels[2].text.inner(), "'colon'");
        assert_eq!(labels[3].labels.len(), 1);
    }

    #[test]
    fn test_port_block() {
        let root = parse_ok(
            r#"node A {
                port p { layout [ position: 0, 5 size: 2, 2 ] side: WEST label "p" }
            }"#,
        );
        let port = &root.body.children[0].body.ports[0];

        assert_eq!(*port.identifier.inner(), Id::new("p"));
        assert!(port.layout.as_ref().unwrap().position.is_some());
        assert_eq!(port.properties.len(), 1);
        assert_eq!(port.labels.len(), 1);
    }

    #[test]
    fn test_interleaved_elements_keep_order_per_kind() {
        let root = parse_ok("node A edge A -> B node B port p label \"x\" node C edge B -> C");

        let children: Vec<_> = root
            .body
            .children
            .iter()
            .map(|n| n.identifier.to_string())
            .collect();
        assert_eq!(children, vec!["A", "B", "C"]);
        assert_eq!(root.body.edges.len(), 2);
        assert_eq!(root.body.ports.len(), 1);
        assert_eq!(root.body.labels.len(), 1);
    }

    #[test]
    fn test_single_section_edge_layout() {
        let root = parse_ok(
            "edge A -> B {
                layout [ start: 0, 0 end: 10, 0 bends: 5, 5 | 6, 6 incoming: A outgoing: B ]
            }",
        );
        let layout = root.body.edges[0].layout.as_ref().unwrap();

        let ast::EdgeLayout::Single(section) = layout.inner() else {
            panic!("expected a single section");
        };
        assert!(section.identifier.is_none());
        assert_eq!(section.bend_points.len(), 2);
        assert_eq!(section.incoming_shape.as_ref().unwrap().to_string(), "A");
        assert_eq!(section.outgoing_shape.as_ref().unwrap().to_string(), "B");
    }

    #[test]
    fn test_named_sections() {
        let root = parse_ok(
            "edge A -> B {
                layout [
                    section s1 -> s2, s3 [ incoming: A start: 0, 0 end: 1, 1 ]
                    section s2 [ outgoing: B start: 1, 1 end: 2, 2 weight: 3 ]
                    section s3 [ ]
                ]
            }",
        );
        let layout = root.body.edges[0].layout.as_ref().unwrap();

        let ast::EdgeLayout::Sections(sections) = layout.inner() else {
            panic!("expected named sections");
        };
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].outgoing_sections.len(), 2);
        assert_eq!(sections[1].properties.len(), 1);
        assert_eq!(
            sections[2].identifier.as_deref().copied(),
            Some(Id::new("s3"))
        );
    }

    #[test]
    fn test_duplicate_attribute_keeps_first() {
        let (root, diagnostics) = parse_diagnostics("node A { layout [ width = 5 width = 6 ] }");

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E104));
        assert!(diagnostics[0].severity().is_warning());
        assert_eq!(diagnostics[0].labels().len(), 2);

        let layout = root.body.children[0].body.layout.as_ref().unwrap();
        assert_eq!(layout.width.as_ref().unwrap().raw(), "5");
    }

    #[test]
    fn test_size_conflicts_with_width() {
        let (root, diagnostics) = parse_diagnostics("node A { layout [ width: 1 size: 2, 3 ] }");

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E104));

        let layout = root.body.children[0].body.layout.as_ref().unwrap();
        assert_eq!(layout.width.as_ref().unwrap().raw(), "1");
        assert!(layout.height.is_none());
    }

    #[test]
    fn test_duplicate_section_attribute() {
        let (_, diagnostics) =
            parse_diagnostics("edge A -> B { layout [ start: 0, 0 start: 1, 1 ] }");

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E104));
        assert!(diagnostics[0].message().contains("start"));
    }

    #[test]
    fn test_out_of_order_items_are_reported_and_kept() {
        let (root, diagnostics) = parse_diagnostics("node A { node B a: 1 }");

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E100));
        assert_eq!(root.body.children[0].body.properties.len(), 1);
    }

    #[test]
    fn test_second_layout_is_reported() {
        let (root, diagnostics) =
            parse_diagnostics("node A { layout [ width: 1 ] layout [ width: 2 ] }");

        assert_eq!(diagnostics.len(), 1);
        let layout = root.body.children[0].body.layout.as_ref().unwrap();
        assert_eq!(layout.width.as_ref().unwrap().raw(), "1");
    }

    #[test]
    fn test_node_inside_port_is_rejected() {
        let (root, diagnostics) = parse_diagnostics("node A { port p { node X } }");

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message().contains("not allowed inside a port"));
        assert_eq!(root.body.children[0].body.ports.len(), 1);
    }

    #[test]
    fn test_resynchronizes_at_next_element() {
        let (root, diagnostics) = parse_diagnostics("node A { layout [ width: ] } node B node C");

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E100));
        let children: Vec<_> = root
            .body
            .children
            .iter()
            .map(|n| n.identifier.to_string())
            .collect();
        assert_eq!(children, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_multiple_independent_errors() {
        let (root, diagnostics) = parse_diagnostics("node { } node B edge A B node C port");

        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics.iter().all(|d| d.severity().is_error()));
        assert_eq!(root.body.children.len(), 2);
    }

    #[test]
    fn test_keyword_after_dot_does_not_stop_resynchronization() {
        let (root, diagnostics) = parse_diagnostics("node A { a b.node: 1 } node B");

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(root.body.children.len(), 2);
    }

    #[test]
    fn test_unexpected_end_of_input() {
        let (_, diagnostics) = parse_diagnostics("node A { layout [ position: 1,");

        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E101));
        assert!(diagnostics[0].message().contains("expected number"));
    }

    #[test]
    fn test_unclosed_block() {
        let (root, diagnostics) = parse_diagnostics("node A { node B");

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E101));
        assert_eq!(diagnostics[0].labels().len(), 2);
        assert_eq!(root.body.children[0].body.children.len(), 1);
    }

    #[test]
    fn test_stray_closing_brace_in_unbraced_root() {
        let (root, diagnostics) = parse_diagnostics("node A } node B");

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(root.body.children.len(), 2);
    }

    #[test]
    fn test_tokens_after_braced_root() {
        let (_, diagnostics) = parse_diagnostics("graph G { node A } node B");

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message().contains("after the end of the graph"));
    }

    #[test]
    fn test_fail_fast_stops_after_first_error() {
        let config = ParseConfig::new(Recovery::FailFast);
        let (root, diagnostics) = parse_with("node { } node B edge A B node C", &config);

        assert_eq!(diagnostics.len(), 1);
        assert!(root.body.children.is_empty());
    }

    #[test]
    fn test_fail_fast_continues_after_warning() {
        let config = ParseConfig::new(Recovery::FailFast);
        let (root, diagnostics) =
            parse_with("node A { layout [ width: 1 width: 2 ] } node B", &config);

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].severity().is_warning());
        assert_eq!(root.body.children.len(), 2);
    }

    #[test]
    fn test_convert_error_at_token() {
        let tokens = vec![
            make_token(Token::Node, 0, 4),
            make_token(Token::LeftBrace, 5, 1),
        ];

        let mut err = ContextError::new();
        err.push(Context::Expected("identifier"));

        let diagnostic = convert_error(ErrMode::Backtrack(err), &tokens, 1);
        assert_eq!(diagnostic.code(), Some(ErrorCode::E100));
        assert_eq!(diagnostic.message(), "expected identifier, found `{`");
        assert_eq!(diagnostic.primary_span(), Some(Span::new(5..6)));
    }

    #[test]
    fn test_convert_error_at_eof() {
        let tokens = vec![make_token(Token::Node, 0, 4)];

        let mut err = ContextError::new();
        err.push(Context::Expected("identifier"));

        let diagnostic = convert_error(ErrMode::Backtrack(err), &tokens, 0);
        assert_eq!(diagnostic.code(), Some(ErrorCode::E101));
        assert_eq!(diagnostic.primary_span(), Some(Span::new(4..4)));
    }

    #[test]
    fn test_empty_document() {
        let root = parse_ok("  // nothing here\n");
        assert_eq!(root, ast::RootNode::default());
    }
}
