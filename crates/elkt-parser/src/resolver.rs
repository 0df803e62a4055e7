//! Cross-reference resolution.
//!
//! [`resolve`] turns a syntax tree into an [`ElkGraph`] in two passes:
//!
//! 1. **Collect**: walk the tree once, allocate every element in the graph,
//!    coerce literal values and record which identifiers each node scope
//!    declares. Named edge sections are recorded per edge and document-wide.
//! 2. **Link**: resolve edge endpoints, section shapes and section chaining
//!    against the collected scopes.
//!
//! Since nothing is linked before everything is collected, a reference may
//! point at an element declared further down the document.
//!
//! # Lookup rules
//!
//! A qualified id such as `A.B.p` is resolved relative to the node the edge
//! is declared in. The first segment is looked up in that node's scope, then
//! in each enclosing scope up to the root. Each following segment descends
//! into the child nodes and ports of the shape found so far.

use indexmap::IndexMap;
use log::{debug, trace};

use elkt_core::{
    geometry::{Point, ShapeLayout},
    graph::{EdgeId, ElkGraph, ElkGraphBuilder, LabelOwner, NodeId, SectionId, ShapeRef},
    identifier::Id,
    property::{Property, PropertyValue},
};

use crate::{
    ast::{self, QualifiedId},
    coerce::{self, CoercionError},
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    span::{Span, Spanned},
};

/// Identifiers declared directly in one node: its child nodes and its ports.
type Scope = IndexMap<Id, Declaration<ShapeRef>>;

/// A declared element together with where it was declared.
#[derive(Debug, Clone, Copy)]
struct Declaration<T> {
    handle: T,
    span: Span,
}

/// An edge waiting for pass 2.
struct PendingEdge<'a> {
    edge: EdgeId,
    container: NodeId,
    ast: &'a ast::Edge,
    /// Sections in declaration order, paired with their syntax.
    sections: Vec<(SectionId, &'a ast::EdgeSection)>,
    /// Named sections of this edge.
    named_sections: IndexMap<Id, Declaration<SectionId>>,
}

struct Resolver<'a> {
    builder: ElkGraphBuilder,
    diagnostics: DiagnosticCollector,
    /// One scope per node, indexed by [`NodeId::index`].
    scopes: Vec<Scope>,
    pending: Vec<PendingEdge<'a>>,
    /// Named sections of the whole document; the first declaration of a name wins.
    document_sections: IndexMap<Id, SectionId>,
}

impl<'a> Resolver<'a> {
    fn new(root: &ast::RootNode) -> Self {
        let builder = ElkGraphBuilder::new(root.identifier.as_ref().map(|id| *id.inner()));
        Self {
            builder,
            diagnostics: DiagnosticCollector::new(),
            scopes: vec![Scope::new()],
            pending: Vec::new(),
            document_sections: IndexMap::new(),
        }
    }

    fn finish(self) -> (ElkGraph, Vec<Diagnostic>) {
        (self.builder.build(), self.diagnostics.into_diagnostics())
    }

    // =========================================================================
    // Pass 1: collect
    // =========================================================================

    fn collect_body(&mut self, node: NodeId, body: &'a ast::Body) {
        if let Some(layout) = &body.layout {
            let layout = self.shape_layout(layout);
            self.builder.node_mut(node).set_layout(layout);
        }
        for property in self.properties(&body.properties) {
            self.builder.node_mut(node).add_property(property);
        }
        for child in &body.children {
            self.collect_node(node, child);
        }
        for port in &body.ports {
            self.collect_port(node, port);
        }
        for label in &body.labels {
            self.collect_label(node, label);
        }
        for edge in &body.edges {
            self.collect_edge(node, edge);
        }
    }

    fn collect_node(&mut self, parent: NodeId, node: &'a ast::Node) {
        let id = self.builder.add_node(parent, *node.identifier.inner());
        self.scopes.push(Scope::new());
        self.declare(parent, &node.identifier, ShapeRef::Node(id));
        trace!(node = node.identifier.to_string(); "Collected node");
        self.collect_body(id, &node.body);
    }

    fn collect_port(&mut self, node: NodeId, port: &'a ast::Port) {
        let id = self.builder.add_port(node, *port.identifier.inner());
        self.declare(node, &port.identifier, ShapeRef::Port(id));

        if let Some(layout) = &port.layout {
            let layout = self.shape_layout(layout);
            self.builder.port_mut(id).set_layout(layout);
        }
        for property in self.properties(&port.properties) {
            self.builder.port_mut(id).add_property(property);
        }
        for label in &port.labels {
            self.collect_label(id, label);
        }
    }

    fn collect_label(&mut self, owner: impl Into<LabelOwner>, label: &'a ast::Label) {
        let text = match coerce::unescape(label.text.inner()) {
            Ok(text) => text,
            Err(err) => {
                self.coercion_error(&err, label.text.span());
                label.text.inner().clone()
            }
        };
        let identifier = label.identifier.as_ref().map(|id| *id.inner());
        let id = self.builder.add_label(owner, identifier, text);

        if let Some(layout) = &label.layout {
            let layout = self.shape_layout(layout);
            self.builder.label_mut(id).set_layout(layout);
        }
        for property in self.properties(&label.properties) {
            self.builder.label_mut(id).add_property(property);
        }
        for nested in &label.labels {
            self.collect_label(id, nested);
        }
    }

    fn collect_edge(&mut self, container: NodeId, edge: &'a ast::Edge) {
        let identifier = edge.identifier.as_ref().map(|id| *id.inner());
        let id = self.builder.add_edge(container, identifier);

        let mut pending = PendingEdge {
            edge: id,
            container,
            ast: edge,
            sections: Vec::new(),
            named_sections: IndexMap::new(),
        };

        if let Some(layout) = &edge.layout {
            for section in layout.sections() {
                let section_id = self.collect_section(id, section);
                pending.sections.push((section_id, section));

                let Some(name) = &section.identifier else {
                    continue;
                };
                if let Some(first) = pending.named_sections.get(name.inner()) {
                    self.diagnostics
                        .emit(duplicate_identifier(name, first.span, "section"));
                    continue;
                }
                pending.named_sections.insert(
                    *name.inner(),
                    Declaration {
                        handle: section_id,
                        span: name.span(),
                    },
                );
                self.document_sections
                    .entry(*name.inner())
                    .or_insert(section_id);
            }
        }

        for property in self.properties(&edge.properties) {
            self.builder.edge_mut(id).add_property(property);
        }
        for label in &edge.labels {
            self.collect_label(id, label);
        }

        self.pending.push(pending);
    }

    fn collect_section(&mut self, edge: EdgeId, section: &ast::EdgeSection) -> SectionId {
        let identifier = section.identifier.as_ref().map(|id| *id.inner());
        let id = self.builder.add_section(edge, identifier);

        if let Some(point) = section.start.as_ref().and_then(|c| self.point(c)) {
            self.builder.section_mut(id).set_start(point);
        }
        if let Some(point) = section.end.as_ref().and_then(|c| self.point(c)) {
            self.builder.section_mut(id).set_end(point);
        }
        for bend in &section.bend_points {
            if let Some(point) = self.point(bend) {
                self.builder.section_mut(id).add_bend_point(point);
            }
        }
        for property in self.properties(&section.properties) {
            self.builder.section_mut(id).add_property(property);
        }
        id
    }

    /// Record `shape` in the scope of `node`; the first declaration of a name wins.
    fn declare(&mut self, node: NodeId, identifier: &Spanned<Id>, shape: ShapeRef) {
        let scope = &mut self.scopes[node.index()];
        if let Some(first) = scope.get(identifier.inner()) {
            let kind = match first.handle {
                ShapeRef::Node(_) => "node",
                ShapeRef::Port(_) => "port",
            };
            let diagnostic = duplicate_identifier(identifier, first.span, kind);
            self.diagnostics.emit(diagnostic);
            return;
        }
        scope.insert(
            *identifier.inner(),
            Declaration {
                handle: shape,
                span: identifier.span(),
            },
        );
    }

    // =========================================================================
    // Value coercion
    // =========================================================================

    fn coercion_error(&mut self, err: &CoercionError, span: Span) {
        let label = match err.code() {
            ErrorCode::E301 => "malformed escape",
            _ => "out of range",
        };
        self.diagnostics.emit(
            Diagnostic::error(err.to_string())
                .with_code(err.code())
                .with_label(span, label)
                .with_help(err.help()),
        );
    }

    /// Coerce properties, dropping the ones whose value has no typed form.
    fn properties(&mut self, properties: &[ast::Property]) -> Vec<Property> {
        properties
            .iter()
            .filter_map(|property| {
                let value = self.value(&property.value)?;
                Some(Property::new(property.key.to_id(), value))
            })
            .collect()
    }

    fn value(&mut self, value: &Spanned<ast::RawValue>) -> Option<PropertyValue> {
        coerce::coerce(value.inner())
            .map_err(|err| self.coercion_error(&err, value.span()))
            .ok()
    }

    fn number(&mut self, number: &Spanned<ast::Number>) -> Option<f64> {
        coerce::number(number.raw())
            .map_err(|err| self.coercion_error(&err, number.span()))
            .ok()
    }

    fn point(&mut self, coordinates: &Spanned<ast::Coordinates>) -> Option<Point> {
        let x = self.number(&coordinates.x);
        let y = self.number(&coordinates.y);
        Some(Point::new(x?, y?))
    }

    fn shape_layout(&mut self, layout: &ast::ShapeLayout) -> ShapeLayout {
        let mut resolved = ShapeLayout::default();
        if let Some(position) = layout.position.as_ref().and_then(|c| self.point(c)) {
            resolved = resolved.with_position(position);
        }
        if let Some(width) = layout.width.as_ref().and_then(|n| self.number(n)) {
            resolved = resolved.with_width(width);
        }
        if let Some(height) = layout.height.as_ref().and_then(|n| self.number(n)) {
            resolved = resolved.with_height(height);
        }
        resolved
    }

    // =========================================================================
    // Pass 2: link
    // =========================================================================

    fn link(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for edge in &pending {
            self.link_edge(edge);
        }
    }

    fn link_edge(&mut self, pending: &PendingEdge<'a>) {
        for source in &pending.ast.sources {
            if let Some(shape) = self.resolve_shape(pending.container, source) {
                self.builder.add_source(pending.edge, shape);
            }
        }
        for target in &pending.ast.targets {
            if let Some(shape) = self.resolve_shape(pending.container, target) {
                self.builder.add_target(pending.edge, shape);
            }
        }

        for (section, ast) in &pending.sections {
            let incoming = ast
                .incoming_shape
                .as_ref()
                .and_then(|reference| self.resolve_shape(pending.container, reference));
            if let Some(shape) = incoming {
                self.builder.section_mut(*section).set_incoming_shape(shape);
            }
            let outgoing = ast
                .outgoing_shape
                .as_ref()
                .and_then(|reference| self.resolve_shape(pending.container, reference));
            if let Some(shape) = outgoing {
                self.builder.section_mut(*section).set_outgoing_shape(shape);
            }
            for next in &ast.outgoing_sections {
                let target = pending
                    .named_sections
                    .get(next.inner())
                    .map(|declaration| declaration.handle)
                    .or_else(|| self.document_sections.get(next.inner()).copied());
                match target {
                    Some(target) => self.builder.link_sections(*section, target),
                    None => self
                        .diagnostics
                        .emit(unresolved(&next.inner().to_string(), next.span(), "section")),
                }
            }
        }
    }

    /// Resolve a qualified shape reference made from inside `container`.
    fn resolve_shape(
        &mut self,
        container: NodeId,
        reference: &Spanned<QualifiedId>,
    ) -> Option<ShapeRef> {
        let found = self.lookup(container, reference.inner());
        if found.is_none() {
            self.diagnostics
                .emit(unresolved(&reference.to_string(), reference.span(), "shape"));
        }
        found
    }

    fn lookup(&self, container: NodeId, reference: &QualifiedId) -> Option<ShapeRef> {
        let (first, rest) = reference.segments().split_first()?;

        let mut scope = Some(container);
        let mut current = None;
        while let Some(node) = scope {
            if let Some(declaration) = self.scopes[node.index()].get(first) {
                current = Some(declaration.handle);
                break;
            }
            scope = self.builder.graph().parent(node);
        }

        rest.iter().try_fold(current?, |shape, segment| match shape {
            ShapeRef::Node(node) => self.scopes[node.index()]
                .get(segment)
                .map(|declaration| declaration.handle),
            ShapeRef::Port(_) => None,
        })
    }
}

fn duplicate_identifier(identifier: &Spanned<Id>, first: Span, kind: &str) -> Diagnostic {
    Diagnostic::error(format!("duplicate identifier `{identifier}`"))
        .with_code(ErrorCode::E201)
        .with_label(identifier.span(), "declared again here")
        .with_secondary_label(first, format!("first declared here as a {kind}"))
        .with_help("identifiers must be unique within their scope; the first declaration is used")
}

fn unresolved(identifier: &str, span: Span, kind: &str) -> Diagnostic {
    Diagnostic::error(format!("unresolved reference `{identifier}`"))
        .with_code(ErrorCode::E200)
        .with_label(span, format!("no {kind} with this name is in scope"))
}

/// Resolve a syntax tree into a graph.
///
/// Always returns a graph. Elements with unresolvable references or
/// uncoercible values are kept with the offending slot left empty, and a
/// diagnostic is reported for each of them.
pub fn resolve(root: &ast::RootNode) -> (ElkGraph, Vec<Diagnostic>) {
    let mut resolver = Resolver::new(root);

    debug!("Collecting declarations");
    resolver.collect_body(resolver.builder.graph().root(), &root.body);
    debug!(
        nodes = resolver.builder.graph().node_count(),
        edges = resolver.builder.graph().edge_count();
        "Declarations collected"
    );

    debug!("Linking references");
    resolver.link();

    resolver.finish()
}
