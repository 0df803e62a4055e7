//! ELKT - Reading and formatting the ELK graph text format.
//!
//! This crate ties the parser and the graph model together behind a small
//! API: parse a document into a resolved [`ElkGraph`], inspect every
//! diagnostic of a document, or rewrite a document in canonical form.

pub mod config;

mod error;

pub use elkt_core::{geometry, graph, identifier, property};
pub use elkt_parser::{Analysis, error as diagnostics};

pub use error::ElktError;

use log::{debug, info, trace};

use elkt_parser::{analyze, ast, emitter, error::ParseError};

use config::AppConfig;
use graph::ElkGraph;

/// Builder for reading and formatting ELKT documents.
///
/// # Examples
///
/// ```rust
/// use elkt::{DocumentBuilder, config::AppConfig};
///
/// let source = "node A node B edge A -> B";
///
/// let builder = DocumentBuilder::new(AppConfig::default());
///
/// // Parse source to a resolved graph
/// let graph = builder.parse(source).expect("Failed to parse");
/// assert_eq!(graph.edge_count(), 1);
///
/// // Rewrite source in canonical form
/// let text = builder.format(source).expect("Failed to format");
/// assert_eq!(text, "node A\nnode B\nedge A -> B\n");
/// ```
#[derive(Default)]
pub struct DocumentBuilder {
    config: AppConfig,
}

impl DocumentBuilder {
    /// Create a new document builder with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Parser and formatter settings
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration this builder was created with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run every phase over `source` and keep all results.
    ///
    /// Unlike [`parse`](Self::parse), this never fails: syntax and
    /// resolution problems end up in [`Analysis::diagnostics`], next to
    /// whatever could be built.
    pub fn analyze(&self, source: &str) -> Analysis {
        let parse_config = self.config.parser().to_parse_config();
        trace!(config:? = parse_config; "Analyzing with config");
        analyze(source, &parse_config)
    }

    /// Parse source text into a resolved graph.
    ///
    /// # Errors
    ///
    /// Returns `ElktError::Parse` holding every diagnostic when the document
    /// has at least one error. Warnings alone do not fail a document.
    pub fn parse(&self, source: &str) -> Result<ElkGraph, ElktError> {
        info!("Parsing document");

        let graph = self
            .analyze(source)
            .into_result()
            .map_err(|err| ElktError::new_parse_error(err, source))?;

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count();
            "Document parsed successfully"
        );
        Ok(graph)
    }

    /// Rewrite source text in canonical form.
    ///
    /// The output keeps the document's own references and literals; only
    /// layout and separators change.
    ///
    /// # Errors
    ///
    /// Returns `ElktError::Parse` when the document has at least one error.
    pub fn format(&self, source: &str) -> Result<String, ElktError> {
        let analysis = self.analyze(source);
        if analysis.has_errors() {
            return Err(ElktError::new_parse_error(
                ParseError::new(analysis.diagnostics),
                source,
            ));
        }
        Ok(self.format_tree(&analysis.root))
    }

    /// Write a syntax tree in canonical form.
    pub fn format_tree(&self, root: &ast::RootNode) -> String {
        let text = emitter::serialize(root, &self.config.format().to_emitter_config());
        debug!(output_len = text.len(); "Formatted document");
        text
    }

    /// Write a resolved graph as text.
    ///
    /// Values appear coerced and references use the shortest path that
    /// resolves to the same shape.
    pub fn format_graph(&self, graph: &ElkGraph) -> String {
        let text = emitter::serialize_graph(graph, &self.config.format().to_emitter_config());
        debug!(output_len = text.len(); "Formatted graph");
        text
    }
}
