//! Command implementations

use crate::config::Config;
use crate::extract::extract_file;
use crate::metadata::Extraction;
use crate::render::MarkdownRenderer;
use anyhow::{Context, Result};
use std::path::Path;

/// Extract a source file and print the metadata as JSON
///
/// Unsupported, missing and unparsable files still print an error record
/// and succeed; the failure lives in the payload.
pub fn extract(file: &Path, compact: bool) -> Result<()> {
    let extraction = extract_file(file);
    print_extraction_json(&extraction, compact)
}

/// Render a metadata JSON file to stdout or to `output`
pub fn render(metadata: &Path, output: Option<&Path>, config: &Config) -> Result<()> {
    let extraction = load_extraction(metadata)?;
    let renderer = MarkdownRenderer::new(config.render.clone());

    let markdown = renderer
        .render(&extraction)
        .with_context(|| format!("Failed to render {:?}", metadata))?;

    emit_markdown(&markdown, output)
}

/// Extract and render a source file in one step
pub fn generate(file: &Path, output: Option<&Path>, config: &Config) -> Result<()> {
    let extraction = extract_file(file);
    if let Some(message) = extraction.error() {
        anyhow::bail!("{}", message);
    }

    let renderer = MarkdownRenderer::new(config.render.clone());
    let markdown = renderer.render(&extraction)?;

    emit_markdown(&markdown, output)
}

/// Read a metadata record (or error record) from a JSON file
pub fn load_extraction(path: &Path) -> Result<Extraction> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read metadata file: {:?}", path))?;

    Extraction::from_json(&content)
        .with_context(|| format!("Failed to parse metadata file: {:?}", path))
}

/// Print an extraction as JSON, non-ASCII text left unescaped
pub fn print_extraction_json(extraction: &Extraction, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(extraction)?
    } else {
        serde_json::to_string_pretty(extraction)?
    };
    println!("{}", json);
    Ok(())
}

fn emit_markdown(markdown: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, markdown)
                .with_context(|| format!("Failed to write documentation: {:?}", path))?;
            tracing::debug!("Wrote {} bytes to {:?}", markdown.len(), path);
            println!("Documentation written to: {}", path.display());
        }
        None => println!("{}", markdown),
    }

    Ok(())
}
