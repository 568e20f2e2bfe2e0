//! Markdown rendering of metadata records
//!
//! Section order is fixed: header, overview, functions, classes,
//! interfaces, type aliases. Empty sections are left out entirely.

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::metadata::{
    ClassDescriptor, Extraction, FunctionDescriptor, InterfaceDescriptor, MetadataRecord,
    TypeAliasDescriptor,
};
use std::fmt::Write as _;
use std::path::Path;

/// Separator placed between entity blocks of one section
const BLOCK_SEPARATOR: &str = "\n---\n\n";

/// Renders metadata records as Markdown documents
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    config: RenderConfig,
}

impl MarkdownRenderer {
    /// Create a renderer with the given options
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render an extraction outcome; error records are rejected
    pub fn render(&self, extraction: &Extraction) -> Result<String, RenderError> {
        match extraction {
            Extraction::Record(record) => self.render_record(record),
            Extraction::Failed(failed) => Err(RenderError::ErrorRecord(failed.error.clone())),
        }
    }

    /// Render a record stamped with the current time
    pub fn render_record(&self, record: &MetadataRecord) -> Result<String, RenderError> {
        let generated_at = self.timestamp()?;
        Ok(self.render_record_at(record, &generated_at))
    }

    /// Render a record with a caller-provided timestamp
    pub fn render_record_at(&self, record: &MetadataRecord, generated_at: &str) -> String {
        let sections = [
            Some(self.header(record, generated_at)),
            Some(overview(record)),
            section("Functions", &record.functions, function_block),
            section("Classes", &record.classes, class_block),
            section("Interfaces", record.interfaces(), interface_block),
            section("Type Aliases", record.types(), type_alias_block),
        ];

        sections
            .into_iter()
            .flatten()
            .filter(|section| !section.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn timestamp(&self) -> Result<String, RenderError> {
        let format = &self.config.timestamp_format;
        let mut stamp = String::new();

        let written = if self.config.utc {
            write!(stamp, "{}", chrono::Utc::now().format(format))
        } else {
            write!(stamp, "{}", chrono::Local::now().format(format))
        };

        written.map_err(|_| RenderError::TimestampFormat(format.clone()))?;
        Ok(stamp)
    }

    fn header(&self, record: &MetadataRecord, generated_at: &str) -> String {
        let file_name = Path::new(&record.file)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "API".to_string());

        let mut header = String::new();
        header.push_str(&format!("# {}: {}\n\n", self.config.title, file_name));
        header.push_str(&format!("> Generated: {}\n", generated_at));
        header.push_str(">\n");
        header.push_str(&format!(
            "> Language: {}\n\n",
            record.language.as_str().to_uppercase()
        ));
        header.push_str("---\n");
        header
    }
}

/// Render with default options
pub fn render_markdown(extraction: &Extraction) -> Result<String, RenderError> {
    MarkdownRenderer::default().render(extraction)
}

/// Count table listing only the non-empty categories
fn overview(record: &MetadataRecord) -> String {
    let counts = [
        ("Functions", record.functions.len()),
        ("Classes", record.classes.len()),
        ("Interfaces", record.interfaces().len()),
        ("Type Aliases", record.types().len()),
    ];

    let mut overview = String::from("## Overview\n\n");
    overview.push_str("| Kind | Count |\n");
    overview.push_str("|------|-------|\n");
    for (kind, count) in counts.iter().filter(|(_, count)| *count > 0) {
        overview.push_str(&format!("| {} | {} |\n", kind, count));
    }
    overview
}

fn section<T>(heading: &str, items: &[T], block: fn(&T) -> String) -> Option<String> {
    if items.is_empty() {
        return None;
    }

    let blocks: Vec<String> = items.iter().map(block).collect();
    let mut section = format!("## {}\n\n", heading);
    section.push_str(&blocks.join(BLOCK_SEPARATOR));

    // No rule after the last block
    Some(section.trim_end_matches('\n').to_string())
}

fn function_block(function: &FunctionDescriptor) -> String {
    let mut doc = format!("### {}\n\n", function.name);

    let mut badges = Vec::new();
    if function.is_exported {
        badges.push("`exported`");
    }
    if function.is_async {
        badges.push("`async`");
    }
    if !badges.is_empty() {
        doc.push_str(&format!("{}\n\n", badges.join(" ")));
    }

    doc.push_str(&location(function.line));

    if let Some(ref text) = function.doc {
        doc.push_str(&description(text));
    }

    if !function.params.is_empty() {
        doc.push_str("**Parameters**:\n");
        for param in &function.params {
            doc.push_str(&format!("- `{}`\n", param));
        }
        doc.push('\n');
    }

    if let Some(ref returns) = function.returns {
        doc.push_str(&format!("**Returns**: `{}`\n\n", returns));
    }

    if !function.decorators.is_empty() {
        let decorators: Vec<String> = function
            .decorators
            .iter()
            .map(|d| format!("`@{}`", d))
            .collect();
        doc.push_str(&format!("**Decorators**: {}\n\n", decorators.join(", ")));
    }

    doc
}

fn class_block(class: &ClassDescriptor) -> String {
    let mut doc = format!("### {}\n\n", class.name);

    if class.is_exported {
        doc.push_str("`exported`\n\n");
    }

    doc.push_str(&location(class.line));

    if let Some(ref extends) = class.extends {
        doc.push_str(&format!("**Extends**: `{}`\n\n", extends));
    }
    if !class.implements.is_empty() {
        doc.push_str(&format!("**Implements**: {}\n\n", code_list(&class.implements)));
    }
    if !class.bases.is_empty() {
        doc.push_str(&format!("**Bases**: {}\n\n", code_list(&class.bases)));
    }

    if let Some(ref text) = class.doc {
        doc.push_str(&description(text));
    }

    if !class.methods.is_empty() {
        doc.push_str("**Methods**:\n\n");
        for method in &class.methods {
            let mut badges = String::new();
            if method.is_static {
                badges.push_str("`static` ");
            }
            if method.is_classmethod {
                badges.push_str("`classmethod` ");
            }

            doc.push_str(&format!(
                "- {}`{}()` - line {}\n",
                badges,
                method.name,
                line_label(method.line)
            ));

            if let Some(ref text) = method.doc {
                for line in text.lines() {
                    doc.push_str(&format!("  > {}\n", line));
                }
            }
        }
        doc.push('\n');
    }

    doc
}

fn interface_block(interface: &InterfaceDescriptor) -> String {
    let mut doc = format!("### {}\n\n", interface.name);

    if interface.is_exported {
        doc.push_str("`exported`\n\n");
    }

    doc.push_str(&location(interface.line));

    if !interface.extends.is_empty() {
        doc.push_str(&format!("**Extends**: {}\n\n", code_list(&interface.extends)));
    }

    if let Some(ref text) = interface.doc {
        doc.push_str(&description(text));
    }

    doc
}

fn type_alias_block(alias: &TypeAliasDescriptor) -> String {
    let mut doc = format!("### {}\n\n", alias.name);

    if alias.is_exported {
        doc.push_str("`exported`\n\n");
    }

    doc.push_str(&location(alias.line));

    if let Some(ref text) = alias.doc {
        doc.push_str(&description(text));
    }

    doc
}

fn location(line: Option<usize>) -> String {
    format!("**Location**: line {}\n\n", line_label(line))
}

/// Line number, or `?` for records written without one
fn line_label(line: Option<usize>) -> String {
    line.map_or_else(|| "?".to_string(), |line| line.to_string())
}

fn code_list(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("`{}`", name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Doc text in a fence longer than any backtick run inside it
fn description(text: &str) -> String {
    let longest_run = text
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest_run.max(2) + 1);

    format!("**Description**:\n{}\n{}\n{}\n\n", fence, text, fence)
}
