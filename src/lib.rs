//! apidoc - API documentation from Python and TypeScript sources
//!
//! Extraction turns one source file into a [`MetadataRecord`]: Python is
//! parsed exactly with tree-sitter, TypeScript/JavaScript is matched
//! heuristically with regular expressions. Rendering turns a record into a
//! Markdown document.
//!
//! Records are written with `doc` and `params` fields for every dialect.
//! The older `docstring`, `jsdoc` and `args` names are read as aliases, but
//! are never written.

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod metadata;
pub mod render;

/// Re-export commonly used types
pub use config::Config;
pub use error::{ExtractError, RenderError};
pub use extract::{extract_file, try_extract_file, Extractor};
pub use metadata::{Dialect, Extraction, MetadataRecord};
pub use render::{render_markdown, MarkdownRenderer};

/// Application-wide error type
pub use anyhow::Result;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "apidoc";
