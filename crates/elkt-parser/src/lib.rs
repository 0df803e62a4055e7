//! # ELKT Parser
//!
//! Parser for the ELK graph text format. This crate provides the pipeline
//! from source text to a resolved [`ElkGraph`]:
//!
//! 1. **Tokenize** ([`lexer`]) - Convert source text to tokens
//! 2. **Parse** ([`parser`]) - Build the syntax tree ([`ast`]) from tokens
//! 3. **Resolve** ([`resolver`]) - Coerce values and link cross-references
//!
//! Every phase recovers from errors and keeps going, so a single run reports
//! as many problems as possible. The [`emitter`] writes trees and graphs
//! back to text.
//!
//! ## Usage
//!
//! ```
//! # use elkt_parser::{parse_graph_document, error::ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         graph G {
//!             node A { port p1 }
//!             node B
//!             edge e1: A.p1 -> B
//!         }
//!     "#;
//!
//!     let graph = parse_graph_document(source)?;
//!     assert_eq!(graph.children(graph.root()).len(), 2);
//!     Ok(())
//! }
//! ```

pub mod ast;
pub mod coerce;
pub mod config;
pub mod emitter;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod span;
pub mod tokens;

pub use config::{ParseConfig, Recovery};
pub use emitter::FormatConfig;
pub use span::Span;

use log::{debug, trace};

use elkt_core::graph::ElkGraph;

use error::{Diagnostic, ParseError};

/// Everything learned about a document, problems included.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The syntax tree, holding whatever could be parsed.
    pub root: ast::RootNode,
    /// The resolved graph. Empty when fail-fast recovery stopped early.
    pub graph: ElkGraph,
    /// Errors and warnings of all phases, in phase order.
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity().is_error())
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity().is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity().is_warning())
    }

    /// The graph if no error was found, all diagnostics otherwise.
    ///
    /// Warnings alone do not fail a document.
    pub fn into_result(self) -> Result<ElkGraph, ParseError> {
        if self.has_errors() {
            Err(ParseError::new(self.diagnostics))
        } else {
            Ok(self.graph)
        }
    }
}

/// Keep the diagnostics up to and including the first error.
fn truncate_after_first_error(diagnostics: &mut Vec<Diagnostic>) -> bool {
    match diagnostics.iter().position(|d| d.severity().is_error()) {
        Some(position) => {
            diagnostics.truncate(position + 1);
            true
        }
        None => false,
    }
}

/// Keep at most `max` diagnostics.
///
/// If the cut would drop every error, the first error takes the last kept
/// slot, so a limited report of a broken document still fails.
fn limit_diagnostics(diagnostics: &mut Vec<Diagnostic>, max: usize) {
    match diagnostics.iter().position(|d| d.severity().is_error()) {
        Some(position) if position >= max => {
            let error = diagnostics.swap_remove(position);
            diagnostics.truncate(max.saturating_sub(1));
            diagnostics.push(error);
        }
        _ => diagnostics.truncate(max),
    }
}

/// Run every phase over `source`.
///
/// Never fails: the returned [`Analysis`] carries the partial results and
/// all diagnostics. With [`Recovery::FailFast`], the first error ends the
/// analysis and later phases are skipped.
pub fn analyze(source: &str, config: &ParseConfig) -> Analysis {
    debug!(source_len = source.len(); "Analyzing document");
    let mut analysis = Analysis {
        root: ast::RootNode::default(),
        graph: ElkGraph::default(),
        diagnostics: Vec::new(),
    };

    let (tokens, diagnostics) = lexer::tokenize_recovering(source);
    trace!(tokens_len = tokens.len(), errors = diagnostics.len(); "Tokenized");
    analysis.diagnostics = diagnostics;

    let stopped = config.is_fail_fast() && truncate_after_first_error(&mut analysis.diagnostics);
    if !stopped {
        let (root, diagnostics) = parser::parse(&tokens, config);
        trace!(diagnostics = diagnostics.len(); "Parsed");
        analysis.root = root;
        analysis.diagnostics.extend(diagnostics);

        let stopped =
            config.is_fail_fast() && truncate_after_first_error(&mut analysis.diagnostics);
        if !stopped {
            let (graph, diagnostics) = resolver::resolve(&analysis.root);
            trace!(diagnostics = diagnostics.len(); "Resolved");
            analysis.graph = graph;
            analysis.diagnostics.extend(diagnostics);

            if config.is_fail_fast() {
                truncate_after_first_error(&mut analysis.diagnostics);
            }
        }
    }

    if let Some(max) = config.max_diagnostics {
        limit_diagnostics(&mut analysis.diagnostics, max);
    }

    debug!(
        diagnostics = analysis.diagnostics.len(),
        has_errors = analysis.has_errors();
        "Analysis finished"
    );
    analysis
}

/// Parse source text into a resolved graph.
///
/// This is the main entry point for reading ELK graph text. It runs
/// [`analyze`] with the default configuration.
///
/// # Returns
///
/// Returns the [`ElkGraph`] if no error was found, or a [`ParseError`]
/// holding every diagnostic (warnings included) otherwise.
///
/// # Example
///
/// ```
/// # use elkt_parser::parse_graph_document;
/// let err = parse_graph_document("node A edge A -> Missing").unwrap_err();
/// assert_eq!(err.diagnostics()[0].message(), "unresolved reference `Missing`");
/// ```
pub fn parse_graph_document(source: &str) -> Result<ElkGraph, ParseError> {
    analyze(source, &ParseConfig::default()).into_result()
}
