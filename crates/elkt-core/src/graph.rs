//! The resolved graph model.
//!
//! An [`ElkGraph`] owns every node, port, label, edge and edge section of a
//! document in flat arenas. Elements refer to each other through copyable
//! typed handles ([`NodeId`], [`PortId`], [`LabelId`], [`EdgeId`],
//! [`SectionId`]); containment is expressed by the ordered handle lists each
//! element keeps, cross-references (edge endpoints, section shapes and
//! section chaining) by plain handles.
//!
//! The root node always exists and is returned by [`ElkGraph::root`].
//! Graphs are assembled with an [`ElkGraphBuilder`] and cannot be changed
//! once built.
//!
//! # Example
//!
//! ```
//! use elkt_core::{graph::{ElkGraphBuilder, ShapeRef}, identifier::Id};
//!
//! let mut builder = ElkGraphBuilder::new(Some(Id::new("G")));
//! let root = builder.graph().root();
//! let a = builder.add_node(root, Id::new("A"));
//! let b = builder.add_node(root, Id::new("B"));
//! let edge = builder.add_edge(root, Some(Id::new("e1")));
//! builder.add_source(edge, ShapeRef::Node(a));
//! builder.add_target(edge, ShapeRef::Node(b));
//!
//! let graph = builder.build();
//! assert_eq!(graph.children(root), &[a, b]);
//! assert_eq!(graph.endpoints(edge).targets(), &[ShapeRef::Node(b)]);
//! assert!(graph.is_connected(edge));
//! assert!(!graph.is_selfloop(edge));
//! ```

use std::fmt;

use crate::{
    geometry::{Point, ShapeLayout},
    identifier::Id,
    property::Property,
};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            /// Position of the element in its arena, in creation order.
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

handle!(
    /// Handle of a node, the root included.
    NodeId
);
handle!(
    /// Handle of a port.
    PortId
);
handle!(
    /// Handle of a label.
    LabelId
);
handle!(
    /// Handle of an edge.
    EdgeId
);
handle!(
    /// Handle of an edge section.
    SectionId
);

/// A shape an edge can connect to: a node or a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeRef {
    Node(NodeId),
    Port(PortId),
}

/// Any element that can own labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelOwner {
    Node(NodeId),
    Port(PortId),
    Edge(EdgeId),
    Label(LabelId),
}

/// Any element of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRef {
    Node(NodeId),
    Port(PortId),
    Label(LabelId),
    Edge(EdgeId),
    Section(SectionId),
}

impl From<NodeId> for ElementRef {
    fn from(id: NodeId) -> Self {
        ElementRef::Node(id)
    }
}

impl From<PortId> for ElementRef {
    fn from(id: PortId) -> Self {
        ElementRef::Port(id)
    }
}

impl From<LabelId> for ElementRef {
    fn from(id: LabelId) -> Self {
        ElementRef::Label(id)
    }
}

impl From<EdgeId> for ElementRef {
    fn from(id: EdgeId) -> Self {
        ElementRef::Edge(id)
    }
}

impl From<SectionId> for ElementRef {
    fn from(id: SectionId) -> Self {
        ElementRef::Section(id)
    }
}

impl From<ShapeRef> for ElementRef {
    fn from(shape: ShapeRef) -> Self {
        match shape {
            ShapeRef::Node(id) => ElementRef::Node(id),
            ShapeRef::Port(id) => ElementRef::Port(id),
        }
    }
}

impl From<NodeId> for LabelOwner {
    fn from(id: NodeId) -> Self {
        LabelOwner::Node(id)
    }
}

impl From<PortId> for LabelOwner {
    fn from(id: PortId) -> Self {
        LabelOwner::Port(id)
    }
}

impl From<EdgeId> for LabelOwner {
    fn from(id: EdgeId) -> Self {
        LabelOwner::Edge(id)
    }
}

impl From<LabelId> for LabelOwner {
    fn from(id: LabelId) -> Self {
        LabelOwner::Label(id)
    }
}

/// A node. The root node has no identifier requirement and no parent.
#[derive(Debug, Clone, PartialEq)]
pub struct ElkNode {
    identifier: Option<Id>,
    parent: Option<NodeId>,
    layout: ShapeLayout,
    properties: Vec<Property>,
    children: Vec<NodeId>,
    ports: Vec<PortId>,
    labels: Vec<LabelId>,
    edges: Vec<EdgeId>,
    incoming_edges: Vec<EdgeId>,
    outgoing_edges: Vec<EdgeId>,
}

impl ElkNode {
    fn new(identifier: Option<Id>, parent: Option<NodeId>) -> Self {
        Self {
            identifier,
            parent,
            layout: ShapeLayout::default(),
            properties: Vec::new(),
            children: Vec::new(),
            ports: Vec::new(),
            labels: Vec::new(),
            edges: Vec::new(),
            incoming_edges: Vec::new(),
            outgoing_edges: Vec::new(),
        }
    }

    pub fn identifier(&self) -> Option<Id> {
        self.identifier
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn layout(&self) -> &ShapeLayout {
        &self.layout
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn ports(&self) -> &[PortId] {
        &self.ports
    }

    pub fn labels(&self) -> &[LabelId] {
        &self.labels
    }

    /// Edges contained in this node, not edges incident to it.
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Edges that have this node itself as a target.
    pub fn incoming_edges(&self) -> &[EdgeId] {
        &self.incoming_edges
    }

    /// Edges that have this node itself as a source.
    pub fn outgoing_edges(&self) -> &[EdgeId] {
        &self.outgoing_edges
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn set_layout(&mut self, layout: ShapeLayout) {
        self.layout = layout;
    }

    pub fn add_property(&mut self, property: Property) {
        self.properties.push(property);
    }
}

/// A port, owned by a node.
#[derive(Debug, Clone, PartialEq)]
pub struct ElkPort {
    identifier: Id,
    node: NodeId,
    layout: ShapeLayout,
    properties: Vec<Property>,
    labels: Vec<LabelId>,
    incoming_edges: Vec<EdgeId>,
    outgoing_edges: Vec<EdgeId>,
}

impl ElkPort {
    pub fn identifier(&self) -> Id {
        self.identifier
    }

    /// The node owning this port.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn layout(&self) -> &ShapeLayout {
        &self.layout
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn labels(&self) -> &[LabelId] {
        &self.labels
    }

    pub fn incoming_edges(&self) -> &[EdgeId] {
        &self.incoming_edges
    }

    pub fn outgoing_edges(&self) -> &[EdgeId] {
        &self.outgoing_edges
    }

    pub fn set_layout(&mut self, layout: ShapeLayout) {
        self.layout = layout;
    }

    pub fn add_property(&mut self, property: Property) {
        self.properties.push(property);
    }
}

/// A text label. Labels can be nested inside other labels.
#[derive(Debug, Clone, PartialEq)]
pub struct ElkLabel {
    identifier: Option<Id>,
    text: String,
    owner: LabelOwner,
    layout: ShapeLayout,
    properties: Vec<Property>,
    labels: Vec<LabelId>,
}

impl ElkLabel {
    pub fn identifier(&self) -> Option<Id> {
        self.identifier
    }

    /// The unescaped label text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn owner(&self) -> LabelOwner {
        self.owner
    }

    pub fn layout(&self) -> &ShapeLayout {
        &self.layout
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn labels(&self) -> &[LabelId] {
        &self.labels
    }

    pub fn set_layout(&mut self, layout: ShapeLayout) {
        self.layout = layout;
    }

    pub fn add_property(&mut self, property: Property) {
        self.properties.push(property);
    }
}

/// An edge connecting one or more sources to one or more targets.
#[derive(Debug, Clone, PartialEq)]
pub struct ElkEdge {
    identifier: Option<Id>,
    container: NodeId,
    sources: Vec<ShapeRef>,
    targets: Vec<ShapeRef>,
    sections: Vec<SectionId>,
    properties: Vec<Property>,
    labels: Vec<LabelId>,
}

impl ElkEdge {
    pub fn identifier(&self) -> Option<Id> {
        self.identifier
    }

    /// The node the edge is declared in.
    pub fn containing_node(&self) -> NodeId {
        self.container
    }

    pub fn sources(&self) -> &[ShapeRef] {
        &self.sources
    }

    pub fn targets(&self) -> &[ShapeRef] {
        &self.targets
    }

    pub fn sections(&self) -> &[SectionId] {
        &self.sections
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn labels(&self) -> &[LabelId] {
        &self.labels
    }

    pub fn add_property(&mut self, property: Property) {
        self.properties.push(property);
    }
}

/// Routing geometry of (part of) an edge.
#[derive(Debug, Clone, PartialEq)]
pub struct ElkEdgeSection {
    identifier: Option<Id>,
    edge: EdgeId,
    incoming_shape: Option<ShapeRef>,
    outgoing_shape: Option<ShapeRef>,
    start: Option<Point>,
    end: Option<Point>,
    bend_points: Vec<Point>,
    outgoing_sections: Vec<SectionId>,
    incoming_sections: Vec<SectionId>,
    properties: Vec<Property>,
}

impl ElkEdgeSection {
    pub fn identifier(&self) -> Option<Id> {
        self.identifier
    }

    /// The edge this section belongs to.
    pub fn edge(&self) -> EdgeId {
        self.edge
    }

    /// The shape the section starts at.
    pub fn incoming_shape(&self) -> Option<ShapeRef> {
        self.incoming_shape
    }

    /// The shape the section ends at.
    pub fn outgoing_shape(&self) -> Option<ShapeRef> {
        self.outgoing_shape
    }

    pub fn start(&self) -> Option<Point> {
        self.start
    }

    pub fn end(&self) -> Option<Point> {
        self.end
    }

    pub fn bend_points(&self) -> &[Point] {
        &self.bend_points
    }

    /// Sections this one continues into.
    pub fn outgoing_sections(&self) -> &[SectionId] {
        &self.outgoing_sections
    }

    /// Sections continuing into this one; the inverse of [`Self::outgoing_sections`].
    pub fn incoming_sections(&self) -> &[SectionId] {
        &self.incoming_sections
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn set_incoming_shape(&mut self, shape: ShapeRef) {
        self.incoming_shape = Some(shape);
    }

    pub fn set_outgoing_shape(&mut self, shape: ShapeRef) {
        self.outgoing_shape = Some(shape);
    }

    pub fn set_start(&mut self, point: Point) {
        self.start = Some(point);
    }

    pub fn set_end(&mut self, point: Point) {
        self.end = Some(point);
    }

    pub fn add_bend_point(&mut self, point: Point) {
        self.bend_points.push(point);
    }

    pub fn add_property(&mut self, property: Property) {
        self.properties.push(property);
    }
}

/// Sources and targets of an edge.
#[derive(Debug, Clone, Copy)]
pub struct Endpoints<'a> {
    sources: &'a [ShapeRef],
    targets: &'a [ShapeRef],
}

impl<'a> Endpoints<'a> {
    pub fn sources(&self) -> &'a [ShapeRef] {
        self.sources
    }

    pub fn targets(&self) -> &'a [ShapeRef] {
        self.targets
    }

    /// Sources followed by targets.
    pub fn all(&self) -> impl Iterator<Item = ShapeRef> + 'a {
        self.sources.iter().chain(self.targets).copied()
    }
}

/// A fully resolved graph.
///
/// All accessors taking a handle panic if the handle was issued by another
/// graph and is out of range, just like slice indexing.
///
/// A graph offers no way to change it:
///
/// ```compile_fail
/// use elkt_core::{graph::ElkGraph, geometry::ShapeLayout};
///
/// let mut graph = ElkGraph::default();
/// let root = graph.root();
/// graph.node_mut(root).set_layout(ShapeLayout::default().with_width(1.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ElkGraph {
    nodes: Vec<ElkNode>,
    ports: Vec<ElkPort>,
    labels: Vec<ElkLabel>,
    edges: Vec<ElkEdge>,
    sections: Vec<ElkEdgeSection>,
}

impl ElkGraph {
    fn new(identifier: Option<Id>) -> Self {
        Self {
            nodes: vec![ElkNode::new(identifier, None)],
            ports: Vec::new(),
            labels: Vec::new(),
            edges: Vec::new(),
            sections: Vec::new(),
        }
    }

    // =========================================================================
    // Element access
    // =========================================================================

    /// The root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &ElkNode {
        &self.nodes[id.0]
    }

    pub fn port(&self, id: PortId) -> &ElkPort {
        &self.ports[id.0]
    }

    pub fn label(&self, id: LabelId) -> &ElkLabel {
        &self.labels[id.0]
    }

    pub fn edge(&self, id: EdgeId) -> &ElkEdge {
        &self.edges[id.0]
    }

    pub fn section(&self, id: SectionId) -> &ElkEdgeSection {
        &self.sections[id.0]
    }

    /// Number of nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// All edges of the graph, in creation order.
    pub fn all_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edges.len()).map(EdgeId)
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).children()
    }

    pub fn ports(&self, node: NodeId) -> &[PortId] {
        self.node(node).ports()
    }

    /// Edges contained in `container`.
    pub fn edges(&self, container: NodeId) -> &[EdgeId] {
        self.node(container).edges()
    }

    pub fn labels(&self, owner: impl Into<LabelOwner>) -> &[LabelId] {
        match owner.into() {
            LabelOwner::Node(id) => self.node(id).labels(),
            LabelOwner::Port(id) => self.port(id).labels(),
            LabelOwner::Edge(id) => self.edge(id).labels(),
            LabelOwner::Label(id) => self.label(id).labels(),
        }
    }

    pub fn properties(&self, element: impl Into<ElementRef>) -> &[Property] {
        match element.into() {
            ElementRef::Node(id) => self.node(id).properties(),
            ElementRef::Port(id) => self.port(id).properties(),
            ElementRef::Label(id) => self.label(id).properties(),
            ElementRef::Edge(id) => self.edge(id).properties(),
            ElementRef::Section(id) => self.section(id).properties(),
        }
    }

    pub fn endpoints(&self, edge: EdgeId) -> Endpoints<'_> {
        let edge = self.edge(edge);
        Endpoints {
            sources: edge.sources(),
            targets: edge.targets(),
        }
    }

    pub fn sections(&self, edge: EdgeId) -> &[SectionId] {
        self.edge(edge).sections()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent()
    }

    pub fn containing_node(&self, edge: EdgeId) -> NodeId {
        self.edge(edge).containing_node()
    }

    /// The node a shape represents: the node itself, or the node owning a port.
    pub fn shape_node(&self, shape: ShapeRef) -> NodeId {
        match shape {
            ShapeRef::Node(node) => node,
            ShapeRef::Port(port) => self.port(port).node(),
        }
    }

    /// Identifier of a shape.
    pub fn shape_identifier(&self, shape: ShapeRef) -> Option<Id> {
        match shape {
            ShapeRef::Node(node) => self.node(node).identifier(),
            ShapeRef::Port(port) => Some(self.port(port).identifier()),
        }
    }

    /// Identifier of any element. Only ports always carry one.
    pub fn identifier(&self, element: impl Into<ElementRef>) -> Option<Id> {
        match element.into() {
            ElementRef::Node(id) => self.node(id).identifier(),
            ElementRef::Port(id) => Some(self.port(id).identifier()),
            ElementRef::Label(id) => self.label(id).identifier(),
            ElementRef::Edge(id) => self.edge(id).identifier(),
            ElementRef::Section(id) => self.section(id).identifier(),
        }
    }

    /// Edges having exactly this shape as a target.
    pub fn incoming_edges(&self, shape: ShapeRef) -> &[EdgeId] {
        match shape {
            ShapeRef::Node(id) => self.node(id).incoming_edges(),
            ShapeRef::Port(id) => self.port(id).incoming_edges(),
        }
    }

    /// Edges having exactly this shape as a source.
    pub fn outgoing_edges(&self, shape: ShapeRef) -> &[EdgeId] {
        match shape {
            ShapeRef::Node(id) => self.node(id).outgoing_edges(),
            ShapeRef::Port(id) => self.port(id).outgoing_edges(),
        }
    }

    pub fn incoming_sections(&self, section: SectionId) -> &[SectionId] {
        self.section(section).incoming_sections()
    }

    pub fn outgoing_sections(&self, section: SectionId) -> &[SectionId] {
        self.section(section).outgoing_sections()
    }

    /// Dotted path of a shape relative to the root, e.g. `A.B.p1`.
    ///
    /// Returns `None` for the root node itself.
    pub fn qualified_name(&self, shape: ShapeRef) -> Option<String> {
        let mut segments = Vec::new();
        if let ShapeRef::Port(port) = shape {
            segments.push(self.port(port).identifier());
        }
        let mut current = Some(self.shape_node(shape));
        while let Some(node) = current {
            let data = self.node(node);
            if data.is_root() {
                break;
            }
            segments.extend(data.identifier());
            current = data.parent();
        }
        if segments.is_empty() {
            return None;
        }
        let names: Vec<String> = segments.iter().rev().map(Id::to_text).collect();
        Some(names.join("."))
    }

    /// Edges targeting `node` or any of its ports.
    pub fn all_incoming_edges(&self, node: NodeId) -> Vec<EdgeId> {
        let data = self.node(node);
        let mut edges = data.incoming_edges().to_vec();
        for port in data.ports() {
            edges.extend_from_slice(self.port(*port).incoming_edges());
        }
        edges
    }

    /// Edges leaving `node` or any of its ports.
    pub fn all_outgoing_edges(&self, node: NodeId) -> Vec<EdgeId> {
        let data = self.node(node);
        let mut edges = data.outgoing_edges().to_vec();
        for port in data.ports() {
            edges.extend_from_slice(self.port(*port).outgoing_edges());
        }
        edges
    }

    /// Incoming and outgoing edges of `node` and its ports.
    pub fn all_incident_edges(&self, node: NodeId) -> Vec<EdgeId> {
        let mut edges = self.all_incoming_edges(node);
        edges.extend(self.all_outgoing_edges(node));
        edges
    }

    /// An edge with more than one source or more than one target.
    pub fn is_hyperedge(&self, edge: EdgeId) -> bool {
        let edge = self.edge(edge);
        edge.sources().len() > 1 || edge.targets().len() > 1
    }

    /// All endpoints belong to the same node.
    ///
    /// An edge without any endpoint is trivially a self loop.
    pub fn is_selfloop(&self, edge: EdgeId) -> bool {
        let mut nodes = self
            .endpoints(edge)
            .all()
            .map(|shape| self.shape_node(shape));
        match nodes.next() {
            Some(first) => nodes.all(|node| node == first),
            None => true,
        }
    }

    /// Endpoints are not all placed in the same parent node.
    pub fn is_hierarchical(&self, edge: EdgeId) -> bool {
        let mut parents = self
            .endpoints(edge)
            .all()
            .map(|shape| self.parent(self.shape_node(shape)));
        match parents.next() {
            Some(first) => parents.any(|parent| parent != first),
            None => false,
        }
    }

    /// The edge has at least one source and at least one target.
    pub fn is_connected(&self, edge: EdgeId) -> bool {
        let edge = self.edge(edge);
        !edge.sources().is_empty() && !edge.targets().is_empty()
    }
}

/// Builds an [`ElkGraph`].
///
/// Elements can only be added or changed through the builder; the graph
/// returned by [`ElkGraphBuilder::build`] is read-only.
#[derive(Debug, Default)]
pub struct ElkGraphBuilder {
    graph: ElkGraph,
}

impl ElkGraphBuilder {
    /// Starts a graph holding only a root node.
    pub fn new(identifier: Option<Id>) -> Self {
        Self {
            graph: ElkGraph::new(identifier),
        }
    }

    /// The graph built so far.
    pub fn graph(&self) -> &ElkGraph {
        &self.graph
    }

    pub fn build(self) -> ElkGraph {
        self.graph
    }

    /// Adds a child node to `parent`.
    pub fn add_node(&mut self, parent: NodeId, identifier: Id) -> NodeId {
        let id = NodeId(self.graph.nodes.len());
        self.graph.nodes.push(ElkNode::new(Some(identifier), Some(parent)));
        self.graph.nodes[parent.0].children.push(id);
        id
    }

    /// Adds a port to `node`.
    pub fn add_port(&mut self, node: NodeId, identifier: Id) -> PortId {
        let id = PortId(self.graph.ports.len());
        self.graph.ports.push(ElkPort {
            identifier,
            node,
            layout: ShapeLayout::default(),
            properties: Vec::new(),
            labels: Vec::new(),
            incoming_edges: Vec::new(),
            outgoing_edges: Vec::new(),
        });
        self.graph.nodes[node.0].ports.push(id);
        id
    }

    /// Adds a label to `owner`.
    pub fn add_label(
        &mut self,
        owner: impl Into<LabelOwner>,
        identifier: Option<Id>,
        text: impl Into<String>,
    ) -> LabelId {
        let owner = owner.into();
        let id = LabelId(self.graph.labels.len());
        self.graph.labels.push(ElkLabel {
            identifier,
            text: text.into(),
            owner,
            layout: ShapeLayout::default(),
            properties: Vec::new(),
            labels: Vec::new(),
        });
        match owner {
            LabelOwner::Node(node) => self.graph.nodes[node.0].labels.push(id),
            LabelOwner::Port(port) => self.graph.ports[port.0].labels.push(id),
            LabelOwner::Edge(edge) => self.graph.edges[edge.0].labels.push(id),
            LabelOwner::Label(label) => self.graph.labels[label.0].labels.push(id),
        }
        id
    }

    /// Adds an edge contained in `container`, without endpoints.
    pub fn add_edge(&mut self, container: NodeId, identifier: Option<Id>) -> EdgeId {
        let id = EdgeId(self.graph.edges.len());
        self.graph.edges.push(ElkEdge {
            identifier,
            container,
            sources: Vec::new(),
            targets: Vec::new(),
            sections: Vec::new(),
            properties: Vec::new(),
            labels: Vec::new(),
        });
        self.graph.nodes[container.0].edges.push(id);
        id
    }

    /// Adds an empty section to `edge`.
    pub fn add_section(&mut self, edge: EdgeId, identifier: Option<Id>) -> SectionId {
        let id = SectionId(self.graph.sections.len());
        self.graph.sections.push(ElkEdgeSection {
            identifier,
            edge,
            incoming_shape: None,
            outgoing_shape: None,
            start: None,
            end: None,
            bend_points: Vec::new(),
            outgoing_sections: Vec::new(),
            incoming_sections: Vec::new(),
            properties: Vec::new(),
        });
        self.graph.edges[edge.0].sections.push(id);
        id
    }

    /// Appends a source to `edge` and records the edge as outgoing on the shape.
    pub fn add_source(&mut self, edge: EdgeId, shape: ShapeRef) {
        self.graph.edges[edge.0].sources.push(shape);
        match shape {
            ShapeRef::Node(node) => self.graph.nodes[node.0].outgoing_edges.push(edge),
            ShapeRef::Port(port) => self.graph.ports[port.0].outgoing_edges.push(edge),
        }
    }

    /// Appends a target to `edge` and records the edge as incoming on the shape.
    pub fn add_target(&mut self, edge: EdgeId, shape: ShapeRef) {
        self.graph.edges[edge.0].targets.push(shape);
        match shape {
            ShapeRef::Node(node) => self.graph.nodes[node.0].incoming_edges.push(edge),
            ShapeRef::Port(port) => self.graph.ports[port.0].incoming_edges.push(edge),
        }
    }

    /// Chains `from` into `to`, keeping both directions of the link.
    pub fn link_sections(&mut self, from: SectionId, to: SectionId) {
        self.graph.sections[from.0].outgoing_sections.push(to);
        self.graph.sections[to.0].incoming_sections.push(from);
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut ElkNode {
        &mut self.graph.nodes[id.0]
    }

    pub fn port_mut(&mut self, id: PortId) -> &mut ElkPort {
        &mut self.graph.ports[id.0]
    }

    pub fn label_mut(&mut self, id: LabelId) -> &mut ElkLabel {
        &mut self.graph.labels[id.0]
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> &mut ElkEdge {
        &mut self.graph.edges[id.0]
    }

    pub fn section_mut(&mut self, id: SectionId) -> &mut ElkEdgeSection {
        &mut self.graph.sections[id.0]
    }
}

impl Default for ElkGraph {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Display for ShapeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeRef::Node(id) => write!(f, "node#{}", id.0),
            ShapeRef::Port(id) => write!(f, "port#{}", id.0),
        }
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// A tree given as a list of parent indices: entry `i` is the parent of
    /// node `i + 1`, always an index lower than `i + 1`.
    fn tree_strategy() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(any::<prop::sample::Index>(), 0..24).prop_map(|picks| {
            picks
                .iter()
                .enumerate()
                .map(|(i, pick)| pick.index(i + 1))
                .collect()
        })
    }

    fn build(parents: &[usize]) -> (ElkGraphBuilder, Vec<NodeId>) {
        let mut builder = ElkGraphBuilder::new(None);
        let mut nodes = vec![builder.graph().root()];
        for (i, parent) in parents.iter().enumerate() {
            let id = builder.add_node(nodes[*parent], Id::new(&format!("n{i}")));
            nodes.push(id);
        }
        (builder, nodes)
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Every child lists its parent, and every node is listed by its parent exactly once.
    fn check_parent_child_consistency(parents: &[usize]) -> Result<(), TestCaseError> {
        let (builder, nodes) = build(parents);
        let graph = builder.build();

        for node in &nodes {
            for child in graph.children(*node) {
                prop_assert_eq!(graph.parent(*child), Some(*node));
            }
            if let Some(parent) = graph.parent(*node) {
                let count = graph
                    .children(parent)
                    .iter()
                    .filter(|child| *child == node)
                    .count();
                prop_assert_eq!(count, 1);
            }
        }
        Ok(())
    }

    /// The qualified name has one segment per ancestor below the root.
    fn check_qualified_name_depth(parents: &[usize]) -> Result<(), TestCaseError> {
        let (builder, nodes) = build(parents);
        let graph = builder.build();

        for node in nodes.iter().skip(1) {
            let mut depth = 0;
            let mut current = *node;
            while let Some(parent) = graph.parent(current) {
                depth += 1;
                current = parent;
            }
            let name = graph.qualified_name(ShapeRef::Node(*node));
            prop_assert_eq!(name.map(|n| n.split('.').count()), Some(depth));
        }
        Ok(())
    }

    /// Edges between two nodes under one parent are never hierarchical.
    fn check_sibling_edges_are_flat(parents: &[usize]) -> Result<(), TestCaseError> {
        let (mut builder, nodes) = build(parents);

        for node in &nodes {
            let children = builder.graph().children(*node).to_vec();
            if let [a, b, ..] = children.as_slice() {
                let edge = builder.add_edge(*node, None);
                builder.add_source(edge, ShapeRef::Node(*a));
                builder.add_target(edge, ShapeRef::Node(*b));
                let graph = builder.graph();
                prop_assert!(!graph.is_hierarchical(edge));
                prop_assert!(!graph.is_selfloop(edge));
                prop_assert!(graph.is_connected(edge));
            }
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn parent_child_consistency(parents in tree_strategy()) {
            check_parent_child_consistency(&parents)?;
        }

        #[test]
        fn qualified_name_depth(parents in tree_strategy()) {
            check_qualified_name_depth(&parents)?;
        }

        #[test]
        fn sibling_edges_are_flat(parents in tree_strategy()) {
            check_sibling_edges_are_flat(&parents)?;
        }
    }
}
