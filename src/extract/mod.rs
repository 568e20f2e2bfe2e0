//! Structural metadata extraction
//!
//! This module turns one source file into a [`MetadataRecord`]:
//! - Python files are parsed with tree-sitter (exact, all-or-nothing)
//! - TypeScript/JavaScript files are scanned with regular expressions
//!   (best effort, no tokenizer)
//!
//! The dialect is picked purely from the file extension.

pub mod python;
pub mod typescript;

pub use python::PythonExtractor;
pub use typescript::TypeScriptExtractor;

use crate::error::ExtractError;
use crate::metadata::{Dialect, ErrorRecord, Extraction, MetadataRecord};
use std::path::Path;

/// A strategy that turns source text into a metadata record
pub trait Extractor {
    /// Dialect tag stamped on produced records
    fn dialect(&self) -> Dialect;

    /// Extract metadata from the full text of one file
    fn extract(&mut self, path: &Path, source: &str) -> Result<MetadataRecord, ExtractError>;
}

/// Build the extractor for a dialect
pub fn extractor_for(dialect: Dialect) -> Result<Box<dyn Extractor>, ExtractError> {
    match dialect {
        Dialect::Python => Ok(Box::new(PythonExtractor::new()?)),
        Dialect::TypeScript => Ok(Box::new(TypeScriptExtractor::new())),
        Dialect::Unknown => Err(ExtractError::UnsupportedFileType(String::new())),
    }
}

/// Pick the dialect for a path, or report its (lowercased) suffix
pub fn dialect_for_path(path: &Path) -> Result<Dialect, ExtractError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension {
        Some(ext) => Dialect::from_extension(&ext)
            .ok_or_else(|| ExtractError::UnsupportedFileType(format!(".{}", ext))),
        None => Err(ExtractError::UnsupportedFileType(String::new())),
    }
}

/// Extract a file, keeping the typed error
pub fn try_extract_file(path: &Path) -> Result<MetadataRecord, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::FileNotFound(path.to_string_lossy().to_string()));
    }

    let dialect = dialect_for_path(path)?;
    tracing::debug!("Extracting {:?} as {}", path, dialect);

    let source = std::fs::read_to_string(path).map_err(|source| ExtractError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut extractor = extractor_for(dialect)?;
    let record = extractor.extract(path, &source)?;

    tracing::debug!(
        "Extracted {} function(s), {} class(es), {} interface(s), {} type alias(es)",
        record.functions.len(),
        record.classes.len(),
        record.interfaces().len(),
        record.types().len()
    );

    Ok(record)
}

/// Extract a file, folding any failure into an error record
pub fn extract_file(path: &Path) -> Extraction {
    match try_extract_file(path) {
        Ok(record) => Extraction::Record(record),
        Err(e) => {
            tracing::warn!("Extraction of {:?} failed: {}", path, e);
            Extraction::Failed(ErrorRecord {
                error: e.to_string(),
            })
        }
    }
}

/// Precomputed line starts for byte offset to line number lookups
pub(crate) struct LineIndex {
    newlines: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(text: &str) -> Self {
        let newlines = text
            .bytes()
            .enumerate()
            .filter(|(_, b)| *b == b'\n')
            .map(|(i, _)| i)
            .collect();
        Self { newlines }
    }

    /// 1-based line containing `offset`: one plus the newlines before it
    pub(crate) fn line_of(&self, offset: usize) -> usize {
        self.newlines.partition_point(|&nl| nl < offset) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("a\nbb\n\nccc");
        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(1), 1);
        assert_eq!(index.line_of(2), 2);
        assert_eq!(index.line_of(5), 3);
        assert_eq!(index.line_of(6), 4);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let result = extract_file(&path);
        assert_eq!(result.error(), Some("unsupported file type: .txt"));
    }

    #[test]
    fn test_extension_is_lowercased() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("README.MD");
        std::fs::write(&path, "# hi").unwrap();

        assert_eq!(extract_file(&path).error(), Some("unsupported file type: .md"));
    }

    #[test]
    fn test_missing_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Makefile");
        std::fs::write(&path, "all:").unwrap();

        assert_eq!(extract_file(&path).error(), Some("unsupported file type: "));
    }

    #[test]
    fn test_file_not_found() {
        let result = extract_file(Path::new("does/not/exist.py"));
        assert_eq!(result.error(), Some("file not found: does/not/exist.py"));
    }

    #[test]
    fn test_dispatch_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let py = dir.path().join("mod.py");
        std::fs::write(&py, "def f():\n    pass\n").unwrap();
        let record = extract_file(&py);
        assert_eq!(record.record().unwrap().language, Dialect::Python);

        let ts = dir.path().join("mod.tsx");
        let mut file = std::fs::File::create(&ts).unwrap();
        writeln!(file, "export function f() {{}}").unwrap();
        let record = extract_file(&ts);
        assert_eq!(record.record().unwrap().language, Dialect::TypeScript);
    }
}
