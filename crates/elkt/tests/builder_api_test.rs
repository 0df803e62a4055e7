//! Integration tests for the DocumentBuilder API

use float_cmp::approx_eq;

use elkt::{
    DocumentBuilder, ElktError,
    config::{AppConfig, FormatConfig, ParserConfig},
    diagnostics::ErrorCode,
    graph::ShapeRef,
};

#[test]
fn test_parse_simple_document() {
    let source = r#"
        graph G {
            node A { port p1 }
            node B { layout [ size: 20, 10 ] }
            edge e1: A.p1 -> B
        }
    "#;

    let builder = DocumentBuilder::default();
    let graph = builder.parse(source).expect("Failed to parse document");

    let b = graph.children(graph.root())[1];
    assert!(approx_eq!(f64, graph.node(b).layout().width().unwrap(), 20.0));

    let edge = graph.edges(graph.root())[0];
    let a = graph.children(graph.root())[0];
    assert_eq!(graph.edge(edge).sources(), &[ShapeRef::Port(graph.ports(a)[0])]);
}

#[test]
fn test_parse_invalid_document_returns_error() {
    let source = "node A { edge A -> Missing";

    let builder = DocumentBuilder::default();
    match builder.parse(source) {
        Err(ElktError::Parse { err, src }) => {
            assert_eq!(src, source);
            let codes: Vec<_> = err.diagnostics().iter().filter_map(|d| d.code()).collect();
            assert_eq!(codes, vec![ErrorCode::E101, ErrorCode::E200]);
        }
        other => panic!("Expected parse error, got {other:?}"),
    }
}

#[test]
fn test_parse_with_diagnostic_limit_still_fails() {
    let config = AppConfig::new(ParserConfig::new(false, Some(1)), FormatConfig::default());
    let builder = DocumentBuilder::new(config);

    let err = builder
        .parse("node A { layout [ width: 1 width: 2 ] } edge A -> Missing")
        .unwrap_err();
    let ElktError::Parse { err, .. } = err else {
        panic!("Expected parse error");
    };
    assert_eq!(err.diagnostics().len(), 1);
    assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E200));
}

#[test]
fn test_parse_with_fail_fast() {
    let config = AppConfig::new(ParserConfig::new(true, None), FormatConfig::default());
    let builder = DocumentBuilder::new(config);

    let err = builder.parse("node A { edge A -> Missing").unwrap_err();
    let ElktError::Parse { err, .. } = err else {
        panic!("Expected parse error");
    };
    assert_eq!(err.diagnostics().len(), 1);
}

#[test]
fn test_analyze_keeps_partial_results() {
    let builder = DocumentBuilder::default();
    let analysis = builder.analyze("node A node B edge A -> C");

    assert!(analysis.has_errors());
    assert_eq!(analysis.graph.node_count(), 3);
    assert_eq!(analysis.graph.edge_count(), 1);
}

#[test]
fn test_format_uses_configured_indent() {
    let config = AppConfig::new(ParserConfig::default(), FormatConfig::new(2));
    let builder = DocumentBuilder::new(config);

    let text = builder
        .format("node A{port p node B}edge A.p->A.B")
        .expect("Failed to format");
    assert_eq!(text, "node A {\n  port p\n  node B\n}\nedge A.p -> A.B\n");
}

#[test]
fn test_format_rejects_invalid_documents() {
    let builder = DocumentBuilder::default();
    assert!(matches!(
        builder.format("node A {"),
        Err(ElktError::Parse { .. })
    ));
}

#[test]
fn test_format_graph_round_trips() {
    let source = r#"
        node A { node inner }
        node B
        edge A.inner -> B { weight: 1.5e0 }
    "#;

    let builder = DocumentBuilder::default();
    let graph = builder.parse(source).expect("Failed to parse");
    let text = builder.format_graph(&graph);

    assert!(text.contains("weight: 1.5"), "{text}");
    let again = builder.parse(&text).expect("Failed to parse formatted graph");
    assert_eq!(again, graph);
}

#[test]
fn test_builder_reusability() {
    let builder = DocumentBuilder::default();

    let first = builder.parse("node A").expect("Failed to parse first");
    let second = builder.parse("node B node C").expect("Failed to parse second");

    assert_eq!(first.node_count(), 2);
    assert_eq!(second.node_count(), 3);
}
