//! CLI logic for the ELKT tool.
//!
//! Reads a document, reports its diagnostics and writes it back in
//! canonical form.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::fs;

use log::{info, warn};

use elkt::{DocumentBuilder, ElktError, diagnostics::ParseError};

use error_adapter::{DiagnosticAdapter, Reportable, render};

/// Run the ELKT CLI application
///
/// This function processes the input file through the parser, reports any
/// warnings, and writes the formatted document to the output file or to
/// stdout. With `--check`, nothing is written.
///
/// # Errors
///
/// Returns `ElktError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Documents with at least one error diagnostic
pub fn run(args: &Args) -> Result<(), ElktError> {
    info!(
        input_path = args.input,
        check = args.check;
        "Processing document"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let source = fs::read_to_string(&args.input)?;

    let builder = DocumentBuilder::new(app_config);
    let analysis = builder.analyze(&source);

    for diagnostic in analysis.warnings() {
        let reportable = Reportable::Diagnostic(DiagnosticAdapter::new(diagnostic, &source));
        warn!("{}", render(&reportable));
    }

    if analysis.has_errors() {
        return Err(ElktError::new_parse_error(
            ParseError::new(analysis.diagnostics),
            source,
        ));
    }

    if args.check {
        info!(
            nodes = analysis.graph.node_count(),
            edges = analysis.graph.edge_count();
            "Document is valid"
        );
        return Ok(());
    }

    let text = if args.resolved {
        builder.format_graph(&analysis.graph)
    } else {
        builder.format_tree(&analysis.root)
    };

    match &args.output {
        Some(output) => {
            fs::write(output, text)?;
            info!(output_file = output; "Formatted document written");
        }
        None => print!("{text}"),
    }

    Ok(())
}
