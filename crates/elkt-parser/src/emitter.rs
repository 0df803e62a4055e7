//! Serialization back to ELK graph text.
//!
//! [`serialize`] writes a syntax tree and [`serialize_graph`] writes a
//! resolved [`ElkGraph`]. Both produce the same canonical layout:
//!
//! - one element or property per line, nested blocks indented,
//! - `:` as the separator everywhere,
//! - identifiers that spell a keyword escaped with `^`,
//! - `size` instead of `width` and `height` when both are given.
//!
//! Parsing the output of [`serialize`] yields a tree equal to the input.

use std::fmt::Write as _;

use elkt_core::{
    geometry::{Point, ShapeLayout},
    graph::{EdgeId, ElkGraph, LabelId, NodeId, ShapeRef},
    identifier::Id,
    property::{Property, PropertyValue},
};

use crate::{
    ast::{self, QualifiedId},
    tokens::Token,
};

/// Layout of the serialized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatConfig {
    /// Spaces per nesting level.
    pub indent: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self { indent: 4 }
    }
}

impl FormatConfig {
    pub fn new(indent: usize) -> Self {
        Self { indent }
    }
}

/// Escape an identifier that would otherwise lex as a keyword.
fn escape_identifier(name: &str) -> String {
    if Token::keyword(name).is_some() {
        format!("^{name}")
    } else {
        name.to_string()
    }
}

fn escape_id(id: Id) -> String {
    escape_identifier(&id.to_text())
}

fn escape_path<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    segments
        .into_iter()
        .map(escape_identifier)
        .collect::<Vec<_>>()
        .join(".")
}

fn qualified(id: &QualifiedId) -> String {
    let names: Vec<String> = id.segments().iter().map(Id::to_text).collect();
    escape_path(names.iter().map(String::as_str))
}

/// Quote `text`, escaping everything the lexer would not take literally.
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:x}}}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Format a float so that it lexes back as a float.
fn float(value: f64) -> String {
    format!("{value:?}")
}

/// Line-oriented text writer.
struct Writer {
    out: String,
    indent: usize,
    level: usize,
}

impl Writer {
    fn new(config: &FormatConfig) -> Self {
        Self {
            out: String::new(),
            indent: config.indent,
            level: 0,
        }
    }

    fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.level * self.indent {
            self.out.push(' ');
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    /// Write `header {`, the block written by `body`, and `}`.
    fn block(&mut self, header: impl AsRef<str>, body: impl FnOnce(&mut Self)) {
        self.line(format!("{} {{", header.as_ref()));
        self.level += 1;
        body(self);
        self.level -= 1;
        self.line("}");
    }

    /// Like [`Self::block`] with square brackets.
    fn bracketed(&mut self, header: impl AsRef<str>, body: impl FnOnce(&mut Self)) {
        self.line(format!("{} [", header.as_ref()));
        self.level += 1;
        body(self);
        self.level -= 1;
        self.line("]");
    }

    fn finish(self) -> String {
        self.out
    }
}

// =============================================================================
// Syntax tree
// =============================================================================

fn raw_value(value: &ast::RawValue) -> String {
    match value {
        ast::RawValue::String(raw) => raw.clone(),
        ast::RawValue::QualifiedId(id) => qualified(id),
        ast::RawValue::Bool(b) => b.to_string(),
        ast::RawValue::Int(raw) | ast::RawValue::Float(raw) => raw.clone(),
        ast::RawValue::Null => "null".to_string(),
    }
}

fn coordinates(value: &ast::Coordinates) -> String {
    format!("{}, {}", value.x.raw(), value.y.raw())
}

fn shape_layout_clauses(layout: &ast::ShapeLayout) -> Vec<String> {
    let mut clauses = Vec::new();
    if let Some(position) = &layout.position {
        clauses.push(format!("position: {}", coordinates(position)));
    }
    match (&layout.width, &layout.height) {
        (Some(width), Some(height)) => {
            clauses.push(format!("size: {}, {}", width.raw(), height.raw()));
        }
        (width, height) => {
            if let Some(width) = width {
                clauses.push(format!("width: {}", width.raw()));
            }
            if let Some(height) = height {
                clauses.push(format!("height: {}", height.raw()));
            }
        }
    }
    clauses
}

fn write_shape_layout(w: &mut Writer, layout: &ast::ShapeLayout) {
    let clauses = shape_layout_clauses(layout);
    if clauses.is_empty() {
        w.line("layout [ ]");
    } else {
        w.line(format!("layout [ {} ]", clauses.join(" ")));
    }
}

fn write_properties(w: &mut Writer, properties: &[ast::Property]) {
    for property in properties {
        w.line(format!(
            "{}: {}",
            qualified(&property.key),
            raw_value(&property.value)
        ));
    }
}

fn write_section_body(w: &mut Writer, section: &ast::EdgeSection) {
    if let Some(shape) = &section.incoming_shape {
        w.line(format!("incoming: {}", qualified(shape)));
    }
    if let Some(shape) = &section.outgoing_shape {
        w.line(format!("outgoing: {}", qualified(shape)));
    }
    if let Some(start) = &section.start {
        w.line(format!("start: {}", coordinates(start)));
    }
    if let Some(end) = &section.end {
        w.line(format!("end: {}", coordinates(end)));
    }
    if !section.bend_points.is_empty() {
        let points: Vec<String> = section
            .bend_points
            .iter()
            .map(|point| coordinates(point))
            .collect();
        w.line(format!("bends: {}", points.join(" | ")));
    }
    write_properties(w, &section.properties);
}

fn write_edge_layout(w: &mut Writer, layout: &ast::EdgeLayout) {
    w.bracketed("layout", |w| match layout {
        ast::EdgeLayout::Single(section) => write_section_body(w, section),
        ast::EdgeLayout::Sections(sections) => {
            for section in sections {
                let mut header = String::from("section");
                if let Some(id) = &section.identifier {
                    let _ = write!(header, " {}", escape_id(*id.inner()));
                }
                if !section.outgoing_sections.is_empty() {
                    let next: Vec<String> = section
                        .outgoing_sections
                        .iter()
                        .map(|id| escape_id(*id.inner()))
                        .collect();
                    let _ = write!(header, " -> {}", next.join(", "));
                }
                w.bracketed(header, |w| write_section_body(w, section));
            }
        }
    });
}

fn write_label(w: &mut Writer, label: &ast::Label) {
    let mut header = String::from("label");
    if let Some(id) = &label.identifier {
        let _ = write!(header, " {}:", escape_id(*id.inner()));
    }
    let _ = write!(header, " {}", label.text.inner());

    if label.layout.is_none() && label.properties.is_empty() && label.labels.is_empty() {
        w.line(header);
        return;
    }
    w.block(header, |w| {
        if let Some(layout) = &label.layout {
            write_shape_layout(w, layout);
        }
        write_properties(w, &label.properties);
        for nested in &label.labels {
            write_label(w, nested);
        }
    });
}

fn write_port(w: &mut Writer, port: &ast::Port) {
    let header = format!("port {}", escape_id(*port.identifier.inner()));
    if port.layout.is_none() && port.properties.is_empty() && port.labels.is_empty() {
        w.line(header);
        return;
    }
    w.block(header, |w| {
        if let Some(layout) = &port.layout {
            write_shape_layout(w, layout);
        }
        write_properties(w, &port.properties);
        for label in &port.labels {
            write_label(w, label);
        }
    });
}

fn write_edge(w: &mut Writer, edge: &ast::Edge) {
    let mut header = String::from("edge");
    if let Some(id) = &edge.identifier {
        let _ = write!(header, " {}:", escape_id(*id.inner()));
    }
    let sources: Vec<String> = edge.sources.iter().map(|id| qualified(id)).collect();
    let targets: Vec<String> = edge.targets.iter().map(|id| qualified(id)).collect();
    if !sources.is_empty() {
        let _ = write!(header, " {}", sources.join(", "));
    }
    header.push_str(" ->");
    if !targets.is_empty() {
        let _ = write!(header, " {}", targets.join(", "));
    }

    if edge.layout.is_none() && edge.properties.is_empty() && edge.labels.is_empty() {
        w.line(header);
        return;
    }
    w.block(header, |w| {
        if let Some(layout) = &edge.layout {
            write_edge_layout(w, layout);
        }
        write_properties(w, &edge.properties);
        for label in &edge.labels {
            write_label(w, label);
        }
    });
}

fn body_is_empty(body: &ast::Body) -> bool {
    body.layout.is_none()
        && body.properties.is_empty()
        && body.children.is_empty()
        && body.edges.is_empty()
        && body.ports.is_empty()
        && body.labels.is_empty()
}

fn write_body(w: &mut Writer, body: &ast::Body) {
    if let Some(layout) = &body.layout {
        write_shape_layout(w, layout);
    }
    write_properties(w, &body.properties);
    for label in &body.labels {
        write_label(w, label);
    }
    for port in &body.ports {
        write_port(w, port);
    }
    for child in &body.children {
        write_node(w, child);
    }
    for edge in &body.edges {
        write_edge(w, edge);
    }
}

fn write_node(w: &mut Writer, node: &ast::Node) {
    let header = format!("node {}", escape_id(*node.identifier.inner()));
    if body_is_empty(&node.body) {
        w.line(header);
    } else {
        w.block(header, |w| write_body(w, &node.body));
    }
}

/// Serialize a syntax tree.
///
/// Literals are written exactly as they were lexed, so no value is lost even
/// if it would not coerce.
///
/// # Example
///
/// ```
/// # use elkt_parser::{config::ParseConfig, emitter::{serialize, FormatConfig}, lexer::tokenize, parser::parse};
/// let tokens = tokenize("node A{layout[width=2 height=3]}edge A->A").unwrap();
/// let (root, _) = parse(&tokens, &ParseConfig::default());
///
/// assert_eq!(
///     serialize(&root, &FormatConfig::default()),
///     "node A {\n    layout [ size: 2, 3 ]\n}\nedge A -> A\n",
/// );
/// ```
pub fn serialize(root: &ast::RootNode, config: &FormatConfig) -> String {
    let mut w = Writer::new(config);
    match &root.identifier {
        Some(id) => {
            let header = format!("graph {}", escape_id(*id.inner()));
            w.block(header, |w| write_body(w, &root.body));
        }
        None => write_body(&mut w, &root.body),
    }
    w.finish()
}

// =============================================================================
// Resolved graph
// =============================================================================

fn value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::String(text) => quote(text),
        PropertyValue::QualifiedId(path) => escape_path(path.split('.')),
        PropertyValue::Boolean(b) => b.to_string(),
        PropertyValue::Integer(i) => i.to_string(),
        PropertyValue::Float(f) => float(*f),
        PropertyValue::Null => "null".to_string(),
    }
}

fn point(point: Point) -> String {
    format!("{}, {}", float(point.x()), float(point.y()))
}

fn write_graph_properties(w: &mut Writer, properties: &[Property]) {
    for property in properties {
        let key = property.key().to_text();
        w.line(format!(
            "{}: {}",
            escape_path(key.split('.')),
            value(property.value())
        ));
    }
}

fn write_graph_layout(w: &mut Writer, layout: &ShapeLayout) {
    if layout.is_empty() {
        return;
    }
    let mut clauses = Vec::new();
    if let Some(position) = layout.position() {
        clauses.push(format!("position: {}", point(position)));
    }
    match (layout.width(), layout.height()) {
        (Some(width), Some(height)) => {
            clauses.push(format!("size: {}, {}", float(width), float(height)));
        }
        (width, height) => {
            if let Some(width) = width {
                clauses.push(format!("width: {}", float(width)));
            }
            if let Some(height) = height {
                clauses.push(format!("height: {}", float(height)));
            }
        }
    }
    w.line(format!("layout [ {} ]", clauses.join(" ")));
}

struct GraphWriter<'g> {
    graph: &'g ElkGraph,
    w: Writer,
}

impl<'g> GraphWriter<'g> {
    /// Find the shape `name` declared directly in `node`; the first
    /// declaration of a name wins, child nodes before ports.
    fn declared(&self, node: NodeId, name: Id) -> Option<ShapeRef> {
        let child = self
            .graph
            .children(node)
            .iter()
            .find(|child| self.graph.node(**child).identifier() == Some(name))
            .map(|child| ShapeRef::Node(*child));
        child.or_else(|| {
            self.graph
                .ports(node)
                .iter()
                .find(|port| self.graph.port(**port).identifier() == name)
                .map(|port| ShapeRef::Port(*port))
        })
    }

    fn lookup(&self, container: NodeId, path: &[Id]) -> Option<ShapeRef> {
        let (first, rest) = path.split_first()?;
        let mut scope = Some(container);
        let mut current = None;
        while let Some(node) = scope {
            current = self.declared(node, *first);
            if current.is_some() {
                break;
            }
            scope = self.graph.parent(node);
        }
        rest.iter().try_fold(current?, |shape, segment| match shape {
            ShapeRef::Node(node) => self.declared(node, *segment),
            ShapeRef::Port(_) => None,
        })
    }

    /// Shortest path naming `shape` from inside `container`.
    ///
    /// Paths are tried from the innermost common scope outwards so that the
    /// written reference resolves to the same shape again.
    fn reference(&self, container: NodeId, shape: ShapeRef) -> String {
        let mut chain = Vec::new();
        if let ShapeRef::Port(port) = shape {
            chain.push(self.graph.port(port).identifier());
        }
        let mut current = self.graph.shape_node(shape);
        while let Some(parent) = self.graph.parent(current) {
            chain.extend(self.graph.node(current).identifier());
            current = parent;
        }
        chain.reverse();

        for start in (0..chain.len()).rev() {
            let path = &chain[start..];
            if self.lookup(container, path) == Some(shape) {
                return escape_path_ids(path);
            }
        }
        escape_path_ids(&chain)
    }

    fn write_label(&mut self, label: LabelId) {
        let graph = self.graph;
        let data = graph.label(label);
        let mut header = String::from("label");
        if let Some(id) = data.identifier() {
            let _ = write!(header, " {}:", escape_id(id));
        }
        let _ = write!(header, " {}", quote(data.text()));

        if data.layout().is_empty() && data.properties().is_empty() && data.labels().is_empty() {
            self.w.line(header);
            return;
        }
        self.w.line(format!("{header} {{"));
        self.w.level += 1;
        write_graph_layout(&mut self.w, data.layout());
        write_graph_properties(&mut self.w, data.properties());
        for nested in data.labels() {
            self.write_label(*nested);
        }
        self.w.level -= 1;
        self.w.line("}");
    }

    fn write_node_body(&mut self, node: NodeId) {
        let graph = self.graph;
        let data = graph.node(node);
        write_graph_layout(&mut self.w, data.layout());
        write_graph_properties(&mut self.w, data.properties());
        for label in data.labels() {
            self.write_label(*label);
        }
        for port in data.ports() {
            let port = graph.port(*port);
            let header = format!("port {}", escape_id(port.identifier()));
            if port.layout().is_empty() && port.properties().is_empty() && port.labels().is_empty()
            {
                self.w.line(header);
                continue;
            }
            self.w.line(format!("{header} {{"));
            self.w.level += 1;
            write_graph_layout(&mut self.w, port.layout());
            write_graph_properties(&mut self.w, port.properties());
            for label in port.labels() {
                self.write_label(*label);
            }
            self.w.level -= 1;
            self.w.line("}");
        }
        for child in data.children() {
            self.write_node(*child);
        }
        for edge in data.edges() {
            self.write_edge(*edge);
        }
    }

    fn write_node(&mut self, node: NodeId) {
        let graph = self.graph;
        let data = graph.node(node);
        let name = data.identifier().map(escape_id).unwrap_or_default();
        let header = format!("node {name}");
        let is_empty = data.layout().is_empty()
            && data.properties().is_empty()
            && data.labels().is_empty()
            && data.ports().is_empty()
            && data.children().is_empty()
            && data.edges().is_empty();
        if is_empty {
            self.w.line(header);
            return;
        }
        self.w.line(format!("{header} {{"));
        self.w.level += 1;
        self.write_node_body(node);
        self.w.level -= 1;
        self.w.line("}");
    }

    fn write_section_body(&mut self, container: NodeId, section: &elkt_core::graph::ElkEdgeSection) {
        let graph = self.graph;
        if let Some(shape) = section.incoming_shape() {
            let reference = self.reference(container, shape);
            self.w.line(format!("incoming: {reference}"));
        }
        if let Some(shape) = section.outgoing_shape() {
            let reference = self.reference(container, shape);
            self.w.line(format!("outgoing: {reference}"));
        }
        if let Some(start) = section.start() {
            self.w.line(format!("start: {}", point(start)));
        }
        if let Some(end) = section.end() {
            self.w.line(format!("end: {}", point(end)));
        }
        if !section.bend_points().is_empty() {
            let points: Vec<String> = section.bend_points().iter().map(|p| point(*p)).collect();
            self.w.line(format!("bends: {}", points.join(" | ")));
        }
        write_graph_properties(&mut self.w, section.properties());
    }

    /// Name used for a section in `section` headers and chaining.
    fn section_name(&self, section: elkt_core::graph::SectionId) -> String {
        self.graph
            .section(section)
            .identifier()
            .map(escape_id)
            .unwrap_or_else(|| format!("section{}", section.index()))
    }

    fn write_edge(&mut self, edge: EdgeId) {
        let graph = self.graph;
        let data = graph.edge(edge);
        let container = data.containing_node();

        let mut header = String::from("edge");
        if let Some(id) = data.identifier() {
            let _ = write!(header, " {}:", escape_id(id));
        }
        let sources: Vec<String> = data
            .sources()
            .iter()
            .map(|shape| self.reference(container, *shape))
            .collect();
        let targets: Vec<String> = data
            .targets()
            .iter()
            .map(|shape| self.reference(container, *shape))
            .collect();
        if !sources.is_empty() {
            let _ = write!(header, " {}", sources.join(", "));
        }
        header.push_str(" ->");
        if !targets.is_empty() {
            let _ = write!(header, " {}", targets.join(", "));
        }

        let sections = data.sections();
        if sections.is_empty() && data.properties().is_empty() && data.labels().is_empty() {
            self.w.line(header);
            return;
        }

        self.w.line(format!("{header} {{"));
        self.w.level += 1;
        match sections {
            [] => {}
            [single]
                if graph.section(*single).identifier().is_none()
                    && graph.section(*single).outgoing_sections().is_empty() =>
            {
                self.w.line("layout [");
                self.w.level += 1;
                self.write_section_body(container, graph.section(*single));
                self.w.level -= 1;
                self.w.line("]");
            }
            sections => {
                self.w.line("layout [");
                self.w.level += 1;
                for section in sections {
                    let data = graph.section(*section);
                    let mut header = format!("section {}", self.section_name(*section));
                    if !data.outgoing_sections().is_empty() {
                        let next: Vec<String> = data
                            .outgoing_sections()
                            .iter()
                            .map(|next| self.section_name(*next))
                            .collect();
                        let _ = write!(header, " -> {}", next.join(", "));
                    }
                    self.w.line(format!("{header} ["));
                    self.w.level += 1;
                    self.write_section_body(container, data);
                    self.w.level -= 1;
                    self.w.line("]");
                }
                self.w.level -= 1;
                self.w.line("]");
            }
        }
        write_graph_properties(&mut self.w, data.properties());
        for label in data.labels() {
            self.write_label(*label);
        }
        self.w.level -= 1;
        self.w.line("}");
    }
}

fn escape_path_ids(path: &[Id]) -> String {
    let names: Vec<String> = path.iter().map(Id::to_text).collect();
    escape_path(names.iter().map(String::as_str))
}

/// Serialize a resolved graph.
///
/// References are written as the shortest qualified id that resolves to the
/// same shape from the edge's containing node. Numbers are written from
/// their coerced values, so `1e2` comes back as `100.0`.
pub fn serialize_graph(graph: &ElkGraph, config: &FormatConfig) -> String {
    let mut writer = GraphWriter {
        graph,
        w: Writer::new(config),
    };
    let root = graph.root();
    match graph.node(root).identifier() {
        Some(id) => {
            writer.w.line(format!("graph {} {{", escape_id(id)));
            writer.w.level += 1;
            writer.write_node_body(root);
            writer.w.level -= 1;
            writer.w.line("}");
        }
        None => writer.write_node_body(root),
    }
    writer.w.finish()
}
