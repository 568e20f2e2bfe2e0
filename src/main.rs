//! apidoc - API documentation generator
//!
//! Extracts functions, classes, interfaces and type aliases from a source
//! file and renders them as Markdown.

use anyhow::{Context, Result};
use apidoc::cli::{extract, generate, render, Cli, Commands};
use apidoc::Config;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Setup logging; stdout carries JSON or Markdown, so logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Execute command
    match cli.command {
        Commands::Extract(args) => {
            extract(&args.file, args.compact)?;
        }

        Commands::Render(args) => {
            let config = load_config(cli.config.as_deref())?;
            render(&args.metadata, args.output.as_deref(), &config)?;
        }

        Commands::Generate(args) => {
            let config = load_config(cli.config.as_deref())?;
            generate(&args.file, args.output.as_deref(), &config)?;
        }
    }

    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let config = Config::resolve(explicit, &cwd)?;
    Ok(config)
}
