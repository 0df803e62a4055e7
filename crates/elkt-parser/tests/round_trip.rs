use proptest::prelude::*;

use elkt_parser::emitter::{serialize, serialize_graph};
use elkt_parser::{FormatConfig, ParseConfig, analyze};

// ===================
// Strategies
// ===================

#[derive(Debug, Clone)]
struct NodeShape {
    ports: usize,
    label: Option<String>,
    layout: Option<(i32, i32, u16, u16)>,
    properties: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
struct Document {
    /// Entry `i` is the parent of node `i + 1`; node 0 is the root.
    parents: Vec<usize>,
    nodes: Vec<NodeShape>,
    edges: Vec<(prop::sample::Index, prop::sample::Index)>,
    header: bool,
}

fn value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<i32>().prop_map(|v| v.to_string()),
        (-1.0e4f64..1.0e4).prop_map(|v| format!("{v:?}")),
        any::<bool>().prop_map(|v| v.to_string()),
        Just("null".to_string()),
        ("[a-zA-Z0-9 ]{0,8}", any::<bool>()).prop_map(|(text, newline)| {
            let escape = if newline { "\\n" } else { "" };
            format!("\"{text}{escape}\"")
        }),
        "v[a-z]{0,4}(\\.v[a-z]{0,4})?",
    ]
}

fn property_strategy() -> impl Strategy<Value = (String, String)> {
    ("x[a-z]{0,5}(\\.x[a-z]{0,5})?", value_strategy())
}

fn node_strategy() -> impl Strategy<Value = NodeShape> {
    (
        0..3usize,
        prop::option::of("[a-z ]{0,6}"),
        prop::option::of((-500..500i32, -500..500i32, any::<u16>(), any::<u16>())),
        prop::collection::vec(property_strategy(), 0..3),
    )
        .prop_map(|(ports, label, layout, properties)| NodeShape {
            ports,
            label,
            layout,
            properties,
        })
}

fn document_strategy() -> impl Strategy<Value = Document> {
    prop::collection::vec(any::<prop::sample::Index>(), 0..12)
        .prop_flat_map(|picks| {
            let parents: Vec<usize> = picks
                .iter()
                .enumerate()
                .map(|(i, pick)| pick.index(i + 1))
                .collect();
            let count = parents.len() + 1;
            (
                Just(parents),
                prop::collection::vec(node_strategy(), count),
                prop::collection::vec(
                    (any::<prop::sample::Index>(), any::<prop::sample::Index>()),
                    0..6,
                ),
                any::<bool>(),
            )
        })
        .prop_map(|(parents, nodes, edges, header)| Document {
            parents,
            nodes,
            edges,
            header,
        })
}

// ===================
// Rendering
// ===================

impl Document {
    fn children(&self, node: usize) -> Vec<usize> {
        self.parents
            .iter()
            .enumerate()
            .filter(|(_, parent)| **parent == node)
            .map(|(i, _)| i + 1)
            .collect()
    }

    fn render(&self) -> String {
        let mut out = String::new();
        let mut shapes = Vec::new();
        if self.header {
            out.push_str("graph G {\n");
        }
        self.render_body(0, "", &mut out, &mut shapes);
        if !shapes.is_empty() {
            for (i, (source, target)) in self.edges.iter().enumerate() {
                let source = &shapes[source.index(shapes.len())];
                let target = &shapes[target.index(shapes.len())];
                out.push_str(&format!("edge e{i}: {source} -> {target}\n"));
            }
        }
        if self.header {
            out.push_str("}\n");
        }
        out
    }

    fn render_body(&self, node: usize, path: &str, out: &mut String, shapes: &mut Vec<String>) {
        let shape = &self.nodes[node];
        if let Some((x, y, w, h)) = shape.layout {
            out.push_str(&format!(
                "layout [ position: {x}, {y} size: {w}, {h} ]\n"
            ));
        }
        for (key, value) in &shape.properties {
            out.push_str(&format!("{key}: {value}\n"));
        }
        if let Some(text) = &shape.label {
            out.push_str(&format!("label \"{text}\"\n"));
        }
        for port in 0..shape.ports {
            let name = format!("n{node}p{port}");
            out.push_str(&format!("port {name}\n"));
            shapes.push(format!("{path}{name}"));
        }
        for child in self.children(node) {
            let name = format!("n{child}");
            let child_path = format!("{path}{name}.");
            shapes.push(format!("{path}{name}"));
            out.push_str(&format!("node {name} {{\n"));
            self.render_body(child, &child_path, out, shapes);
            out.push_str("}\n");
        }
    }
}

// ===================
// Property Test Functions
// ===================

/// Formatting a tree and parsing it again yields the same tree.
fn check_serialize_round_trip(document: &Document) -> Result<(), TestCaseError> {
    let source = document.render();
    let first = analyze(&source, &ParseConfig::default());
    prop_assert!(
        first.diagnostics.is_empty(),
        "generated document has diagnostics: {:?}\n{}",
        first.diagnostics,
        source
    );

    let text = serialize(&first.root, &FormatConfig::default());
    let second = analyze(&text, &ParseConfig::default());
    prop_assert!(second.diagnostics.is_empty(), "{:?}\n{}", second.diagnostics, text);
    prop_assert_eq!(&second.root, &first.root);
    prop_assert_eq!(&second.graph, &first.graph);
    Ok(())
}

/// Formatting a resolved graph and resolving it again yields the same graph.
fn check_serialize_graph_round_trip(document: &Document) -> Result<(), TestCaseError> {
    let source = document.render();
    let first = analyze(&source, &ParseConfig::default());
    prop_assert!(first.diagnostics.is_empty(), "{:?}", first.diagnostics);

    let text = serialize_graph(&first.graph, &FormatConfig::new(2));
    let second = analyze(&text, &ParseConfig::default());
    prop_assert!(second.diagnostics.is_empty(), "{:?}\n{}", second.diagnostics, text);
    prop_assert_eq!(&second.graph, &first.graph);
    Ok(())
}

/// Formatting is stable: formatting formatted text changes nothing.
fn check_serialize_is_idempotent(document: &Document) -> Result<(), TestCaseError> {
    let first = analyze(&document.render(), &ParseConfig::default());
    let text = serialize(&first.root, &FormatConfig::default());
    let again = serialize(
        &analyze(&text, &ParseConfig::default()).root,
        &FormatConfig::default(),
    );
    prop_assert_eq!(again, text);
    Ok(())
}

proptest! {
    #[test]
    fn serialize_round_trip(document in document_strategy()) {
        check_serialize_round_trip(&document)?;
    }

    #[test]
    fn serialize_graph_round_trip(document in document_strategy()) {
        check_serialize_graph_round_trip(&document)?;
    }

    #[test]
    fn serialize_is_idempotent(document in document_strategy()) {
        check_serialize_is_idempotent(&document)?;
    }
}
