//! TypeScript / JavaScript extraction using regular expressions
//!
//! There is no tokenizer here. Five independent passes (functions, classes,
//! interfaces, type aliases, exports) each scan the whole text, so a
//! construct inside a string or comment can match, and the same text can
//! match more than one pass. Export and async flags come from the literal
//! keyword text inside the matched header.

use super::{Extractor, LineIndex};
use crate::error::ExtractError;
use crate::metadata::{
    ClassDescriptor, Dialect, FunctionDescriptor, InterfaceDescriptor, MetadataRecord,
    TypeAliasDescriptor,
};
use regex::Regex;
use std::path::Path;

lazy_static::lazy_static! {
    /// `function name` or `const name = (...) =>`
    static ref FUNCTION_RE: Regex = Regex::new(
        r"(?:export\s+)?(?:async\s+)?(?:function\s+(\w+)|const\s+(\w+)\s*=\s*(?:async\s+)?\(([^)]*)\)\s*=>)"
    )
    .expect("function pattern is valid");

    static ref CLASS_RE: Regex = Regex::new(
        r"(?:export\s+)?(?:abstract\s+)?class\s+(\w+)(?:\s+extends\s+(\w+))?(?:\s+implements\s+([\w,\s]+))?"
    )
    .expect("class pattern is valid");

    static ref INTERFACE_RE: Regex =
        Regex::new(r"(?:export\s+)?interface\s+(\w+)(?:\s+extends\s+([\w,\s]+))?")
            .expect("interface pattern is valid");

    static ref TYPE_ALIAS_RE: Regex =
        Regex::new(r"(?:export\s+)?type\s+(\w+)\s*=").expect("type alias pattern is valid");

    static ref EXPORT_RE: Regex = Regex::new(
        r"export\s+(?:default\s+)?(?:const|let|var|function|class|interface|type)\s+(\w+)"
    )
    .expect("export pattern is valid");

    /// `/** ... */` blocks, located once per file; `/**/` closes itself
    static ref DOC_COMMENT_RE: Regex =
        Regex::new(r"/\*\*/|/\*\*[\s\S]*?\*/").expect("doc comment pattern is valid");

    /// Parameter list right after a matched `function name` header
    static ref DECLARATION_PARAMS_RE: Regex =
        Regex::new(r"^\s*(?:<[^>()]*>)?\s*\(([^)]*)\)").expect("parameter pattern is valid");
}

/// Extracts metadata from TypeScript and JavaScript source
#[derive(Debug, Default)]
pub struct TypeScriptExtractor;

impl TypeScriptExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for TypeScriptExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::TypeScript
    }

    fn extract(&mut self, path: &Path, source: &str) -> Result<MetadataRecord, ExtractError> {
        let scan = Scan::new(source);

        Ok(MetadataRecord {
            file: path.to_string_lossy().to_string(),
            language: self.dialect(),
            functions: scan.functions(),
            classes: scan.classes(),
            interfaces: Some(scan.interfaces()),
            types: Some(scan.types()),
            exports: Some(scan.exports()),
            imports: None,
        })
    }
}

/// One file's text plus the per-file indexes every pass shares
struct Scan<'a> {
    source: &'a str,
    lines: LineIndex,
    docs: DocComments<'a>,
}

impl<'a> Scan<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            lines: LineIndex::new(source),
            docs: DocComments::new(source),
        }
    }

    fn functions(&self) -> Vec<FunctionDescriptor> {
        let mut functions = Vec::new();

        for caps in FUNCTION_RE.captures_iter(self.source) {
            let Some(header) = caps.get(0) else { continue };

            let (name, params) = if let Some(name) = caps.get(1) {
                (name.as_str(), self.declaration_params(header.end()))
            } else if let Some(name) = caps.get(2) {
                let params = caps.get(3).map(|p| split_params(p.as_str())).unwrap_or_default();
                (name.as_str(), params)
            } else {
                continue;
            };

            let mut function = FunctionDescriptor::new(name, self.lines.line_of(header.start()));
            function.doc = self.docs.nearest_before(header.start());
            function.params = params;
            function.is_exported = header.as_str().contains("export");
            function.is_async = header.as_str().contains("async");
            functions.push(function);
        }

        functions
    }

    /// Parameters following a `function name` header, outside the match span
    fn declaration_params(&self, header_end: usize) -> Vec<String> {
        DECLARATION_PARAMS_RE
            .captures(&self.source[header_end..])
            .and_then(|caps| caps.get(1))
            .map(|params| split_params(params.as_str()))
            .unwrap_or_default()
    }

    fn classes(&self) -> Vec<ClassDescriptor> {
        CLASS_RE
            .captures_iter(self.source)
            .filter_map(|caps| {
                let header = caps.get(0)?;
                let mut class =
                    ClassDescriptor::new(caps.get(1)?.as_str(), self.lines.line_of(header.start()));

                class.extends = caps.get(2).map(|e| e.as_str().to_string());
                class.implements = caps.get(3).map(|i| split_names(i.as_str())).unwrap_or_default();
                class.is_exported = header.as_str().contains("export");
                class.doc = self.docs.nearest_before(header.start());
                Some(class)
            })
            .collect()
    }

    fn interfaces(&self) -> Vec<InterfaceDescriptor> {
        INTERFACE_RE
            .captures_iter(self.source)
            .filter_map(|caps| {
                let header = caps.get(0)?;
                Some(InterfaceDescriptor {
                    name: caps.get(1)?.as_str().to_string(),
                    line: Some(self.lines.line_of(header.start())),
                    doc: self.docs.nearest_before(header.start()),
                    extends: caps.get(2).map(|e| split_names(e.as_str())).unwrap_or_default(),
                    is_exported: header.as_str().contains("export"),
                })
            })
            .collect()
    }

    fn types(&self) -> Vec<TypeAliasDescriptor> {
        TYPE_ALIAS_RE
            .captures_iter(self.source)
            .filter_map(|caps| {
                let header = caps.get(0)?;
                Some(TypeAliasDescriptor {
                    name: caps.get(1)?.as_str().to_string(),
                    line: Some(self.lines.line_of(header.start())),
                    doc: self.docs.nearest_before(header.start()),
                    is_exported: header.as_str().contains("export"),
                })
            })
            .collect()
    }

    fn exports(&self) -> Vec<String> {
        EXPORT_RE
            .captures_iter(self.source)
            .filter_map(|caps| caps.get(1).map(|name| name.as_str().to_string()))
            .collect()
    }
}

/// Spans of every `/** ... */` block in a file, in source order
struct DocComments<'a> {
    source: &'a str,
    spans: Vec<(usize, usize)>,
}

impl<'a> DocComments<'a> {
    fn new(source: &'a str) -> Self {
        let spans = DOC_COMMENT_RE
            .find_iter(source)
            .map(|m| (m.start(), m.end()))
            .collect();
        Self { source, spans }
    }

    /// The closest block ending at or before `offset`, however far away
    fn nearest_before(&self, offset: usize) -> Option<String> {
        let count = self.spans.partition_point(|&(_, end)| end <= offset);
        let (start, end) = *self.spans.get(count.checked_sub(1)?)?;
        Some(self.source[start..end].trim().to_string())
    }
}

/// `A, B ,C` into trimmed names, empty pieces kept
fn split_names(list: &str) -> Vec<String> {
    list.split(',').map(|name| name.trim().to_string()).collect()
}

/// Binding names from a parameter list, ignoring types and defaults
fn split_params(list: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();

    for c in list.chars() {
        match c {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' | '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                params.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    params.push(current);

    params
        .iter()
        .map(|param| binding_name(param))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Text before the first top-level `:`, `=` or `?`
fn binding_name(param: &str) -> String {
    let mut depth = 0usize;
    let mut end = param.len();

    for (i, c) in param.char_indices() {
        match c {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' | '>' => depth = depth.saturating_sub(1),
            ':' | '=' | '?' if depth == 0 => {
                end = i;
                break;
            }
            _ => {}
        }
    }

    param[..end].trim().to_string()
}
