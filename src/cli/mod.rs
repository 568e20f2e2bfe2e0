//! CLI interface using clap
//!
//! Provides the command-line interface for apidoc

mod commands;

pub use commands::*;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// apidoc - API documentation from Python and TypeScript sources
#[derive(Parser, Debug)]
#[command(name = "apidoc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a config file (defaults to ./apidoc.toml when present)
    #[arg(short, long, global = true, env = "APIDOC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract API metadata from a source file and print it as JSON
    Extract(ExtractArgs),

    /// Render a metadata JSON file as Markdown
    Render(RenderArgs),

    /// Extract and render a source file in one step
    Generate(GenerateArgs),
}

/// Arguments for extract command
#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// Source file (.py, .ts, .tsx, .js, .jsx)
    pub file: PathBuf,

    /// Print the JSON on a single line
    #[arg(long)]
    pub compact: bool,
}

/// Arguments for render command
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Metadata JSON produced by `apidoc extract`
    pub metadata: PathBuf,

    /// Output file (defaults to stdout)
    pub output: Option<PathBuf>,
}

/// Arguments for generate command
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Source file (.py, .ts, .tsx, .js, .jsx)
    pub file: PathBuf,

    /// Output file (defaults to stdout)
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
