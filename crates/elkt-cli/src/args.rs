//! Command-line argument definitions for the ELKT CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, the output form and logging verbosity.

use clap::Parser;

/// Command-line arguments for the ELKT tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input ELKT file
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to write the formatted document to, stdout if omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Only check the document, write nothing
    #[arg(long, conflicts_with = "output")]
    pub check: bool,

    /// Write the resolved graph instead of the document as written
    #[arg(long)]
    pub resolved: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
