//! Python extraction using tree-sitter
//!
//! Parses the whole file and walks the full tree:
//! - every function definition at any depth (methods and inner functions included)
//! - every class definition, with its direct-child methods
//! - every import, flattened to `module.name` strings
//!
//! A tree containing any error or missing node is rejected as a whole, as
//! is one that breaks a rule the grammar does not enforce (see [`checks`]).

mod checks;

use super::Extractor;
use crate::error::ExtractError;
use crate::metadata::{ClassDescriptor, Dialect, FunctionDescriptor, MetadataRecord, MethodDescriptor};
use std::path::Path;
use tree_sitter::Node;

/// Extracts metadata from Python source
pub struct PythonExtractor {
    parser: tree_sitter::Parser,
}

impl PythonExtractor {
    /// Create a new Python extractor
    pub fn new() -> Result<Self, ExtractError> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| ExtractError::Grammar(e.to_string()))?;

        Ok(Self { parser })
    }
}

impl Extractor for PythonExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::Python
    }

    fn extract(&mut self, path: &Path, source: &str) -> Result<MetadataRecord, ExtractError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ExtractError::Grammar("parser produced no tree".to_string()))?;

        let root = tree.root_node();
        if let Some(bad) = first_syntax_error(root) {
            return Err(ExtractError::Syntax(describe_syntax_error(bad)));
        }
        if let Some(violation) = checks::first_violation(root, source) {
            return Err(ExtractError::Syntax(violation));
        }

        let mut walk = Walk::new(source);
        walk.visit(root);

        Ok(MetadataRecord {
            file: path.to_string_lossy().to_string(),
            language: self.dialect(),
            functions: walk.functions,
            classes: walk.classes,
            imports: Some(walk.imports),
            ..Default::default()
        })
    }
}

/// First error or missing node in document order
fn first_syntax_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .find_map(first_syntax_error);
    found
}

fn describe_syntax_error(node: Node) -> String {
    let position = node.start_position();
    let (line, column) = (position.row + 1, position.column + 1);

    if node.is_missing() {
        format!("missing `{}` (line {}, column {})", node.kind(), line, column)
    } else {
        format!("invalid syntax (line {}, column {})", line, column)
    }
}

/// Pre-order walk collecting descriptors in document order
struct Walk<'a> {
    source: &'a str,
    functions: Vec<FunctionDescriptor>,
    classes: Vec<ClassDescriptor>,
    imports: Vec<String>,
}

impl<'a> Walk<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
        }
    }

    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn visit(&mut self, node: Node) {
        match node.kind() {
            "function_definition" => {
                if let Some(function) = self.function(node) {
                    self.functions.push(function);
                }
            }
            "class_definition" => {
                if let Some(class) = self.class(node) {
                    self.classes.push(class);
                }
            }
            "import_statement" => self.plain_import(node),
            "import_from_statement" => self.from_import(node),
            "future_import_statement" => {
                let mut cursor = node.walk();
                for name in node.children_by_field_name("name", &mut cursor) {
                    let name = self.imported_name(name);
                    self.imports.push(format!("__future__.{}", name));
                }
            }
            _ => {}
        }

        // Recurse into everything, class bodies and function bodies included
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child);
        }
    }

    fn function(&self, node: Node) -> Option<FunctionDescriptor> {
        let name = self.text(node.child_by_field_name("name")?);
        let mut function = FunctionDescriptor::new(name, line_of(node));

        function.doc = self.docstring(node);
        function.params = node
            .child_by_field_name("parameters")
            .map(|params| self.positional_params(params))
            .unwrap_or_default();
        function.decorators = self.decorators(node);
        function.returns = node
            .child_by_field_name("return_type")
            .map(|ret| self.text(ret).to_string());
        function.is_async = node.child(0).is_some_and(|first| first.kind() == "async");

        Some(function)
    }

    fn class(&self, node: Node) -> Option<ClassDescriptor> {
        let name = self.text(node.child_by_field_name("name")?);
        let mut class = ClassDescriptor::new(name, line_of(node));

        class.doc = self.docstring(node);
        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            let mut cursor = superclasses.walk();
            class.bases = superclasses
                .named_children(&mut cursor)
                .filter(|base| {
                    !matches!(base.kind(), "keyword_argument" | "dictionary_splat" | "comment")
                })
                .map(|base| self.text(base).to_string())
                .collect();
        }

        // Only direct children of the body count as methods
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for item in body.named_children(&mut cursor) {
                let definition = match item.kind() {
                    "function_definition" => Some(item),
                    "decorated_definition" => item
                        .child_by_field_name("definition")
                        .filter(|def| def.kind() == "function_definition"),
                    _ => None,
                };
                if let Some(method) = definition.and_then(|def| self.method(def)) {
                    class.methods.push(method);
                }
            }
        }

        Some(class)
    }

    fn method(&self, node: Node) -> Option<MethodDescriptor> {
        let name = self.text(node.child_by_field_name("name")?).to_string();
        let decorators = self.decorators(node);

        Some(MethodDescriptor {
            name,
            line: Some(line_of(node)),
            doc: self.docstring(node),
            params: node
                .child_by_field_name("parameters")
                .map(|params| self.positional_params(params))
                .unwrap_or_default(),
            is_static: decorators.iter().any(|d| d == "staticmethod"),
            is_classmethod: decorators.iter().any(|d| d == "classmethod"),
        })
    }

    /// Decorators of a definition wrapped in a `decorated_definition`
    ///
    /// Bare names are kept as-is; anything else (attribute access, calls)
    /// falls back to the expression's source text.
    fn decorators(&self, definition: Node) -> Vec<String> {
        let Some(parent) = definition.parent().filter(|p| p.kind() == "decorated_definition") else {
            return Vec::new();
        };

        let mut cursor = parent.walk();
        parent
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "decorator")
            .filter_map(|decorator| {
                let mut inner = decorator.walk();
                let expression = decorator
                    .named_children(&mut inner)
                    .find(|n| n.kind() != "comment");
                expression
            })
            .map(|expression| self.text(expression).to_string())
            .collect()
    }

    /// Names of positional-or-keyword parameters
    fn positional_params(&self, params: Node) -> Vec<String> {
        let mut names = Vec::new();
        let mut cursor = params.walk();

        for param in params.named_children(&mut cursor) {
            match param.kind() {
                "identifier" => names.push(self.text(param).to_string()),
                "typed_parameter" => {
                    let mut inner = param.walk();
                    let target = param.named_children(&mut inner).next();
                    match target {
                        Some(ident) if ident.kind() == "identifier" => {
                            names.push(self.text(ident).to_string())
                        }
                        // `*args: T` or `**kwargs: T`
                        _ => break,
                    }
                }
                "default_parameter" | "typed_default_parameter" => {
                    if let Some(name) = param.child_by_field_name("name") {
                        names.push(self.text(name).to_string());
                    }
                }
                // Everything before `/` is positional-only
                "positional_separator" => names.clear(),
                "keyword_separator" | "list_splat_pattern" | "dictionary_splat_pattern" => break,
                _ => {}
            }
        }

        names
    }

    /// Docstring of a function or class, cleaned like `inspect.cleandoc`
    fn docstring(&self, node: Node) -> Option<String> {
        let body = node.child_by_field_name("body")?;

        let mut cursor = body.walk();
        let first = body
            .named_children(&mut cursor)
            .find(|child| child.kind() != "comment")?;
        if first.kind() != "expression_statement" || first.named_child_count() != 1 {
            return None;
        }

        let mut inner = first.walk();
        let literal = first.named_children(&mut inner).next()?;
        let value = match literal.kind() {
            "string" => self.string_value(literal)?,
            "concatenated_string" => {
                let mut parts = literal.walk();
                let pieces: Option<Vec<String>> = literal
                    .named_children(&mut parts)
                    .filter(|part| part.kind() == "string")
                    .map(|part| self.string_value(part))
                    .collect();
                pieces?.concat()
            }
            _ => return None,
        };

        Some(clean_docstring(&value))
    }

    /// Value of a plain string literal; `None` for byte and f-strings
    fn string_value(&self, node: Node) -> Option<String> {
        let text = self.text(node);
        let quote_at = text.find(['"', '\''])?;
        let prefix = text[..quote_at].to_lowercase();
        if prefix.contains('b') || prefix.contains('f') {
            return None;
        }

        let quotes = &text[quote_at..];
        let delimiter = if quotes.starts_with("\"\"\"") || quotes.starts_with("'''") {
            &quotes[..3]
        } else {
            &quotes[..1]
        };

        let body = quotes
            .strip_prefix(delimiter)
            .and_then(|rest| rest.strip_suffix(delimiter))?;

        if prefix.contains('r') {
            Some(body.to_string())
        } else {
            Some(unescape(body))
        }
    }

    fn plain_import(&mut self, node: Node) {
        let mut cursor = node.walk();
        let names: Vec<String> = node
            .children_by_field_name("name", &mut cursor)
            .map(|name| self.imported_name(name))
            .collect();
        self.imports.extend(names);
    }

    fn from_import(&mut self, node: Node) {
        // `from . import x` has no module name, which yields `.x`
        let module = node
            .child_by_field_name("module_name")
            .map(|module| match module.kind() {
                "relative_import" => {
                    let mut cursor = module.walk();
                    let dotted = module
                        .named_children(&mut cursor)
                        .find(|n| n.kind() == "dotted_name");
                    dotted.map(|d| self.dotted(d)).unwrap_or_default()
                }
                _ => self.dotted(module),
            })
            .unwrap_or_default();

        let mut cursor = node.walk();
        let mut names: Vec<String> = node
            .children_by_field_name("name", &mut cursor)
            .map(|name| format!("{}.{}", module, self.imported_name(name)))
            .collect();

        let mut cursor = node.walk();
        if node
            .named_children(&mut cursor)
            .any(|child| child.kind() == "wildcard_import")
        {
            names.push(format!("{}.*", module));
        }

        self.imports.extend(names);
    }

    /// Imported name without its `as` alias
    fn imported_name(&self, node: Node) -> String {
        match node.kind() {
            "aliased_import" => node
                .child_by_field_name("name")
                .map(|name| self.dotted(name))
                .unwrap_or_default(),
            _ => self.dotted(node),
        }
    }

    /// `a . b` normalized to `a.b`
    fn dotted(&self, node: Node) -> String {
        if node.kind() != "dotted_name" {
            return self.text(node).to_string();
        }

        let mut cursor = node.walk();
        let parts: Vec<&str> = node
            .named_children(&mut cursor)
            .filter(|part| part.kind() == "identifier")
            .map(|part| self.text(part))
            .collect();
        parts.join(".")
    }
}

fn line_of(node: Node) -> usize {
    node.start_position().row + 1
}

/// Decode Python escape sequences in a non-raw string body
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };

        match next {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0b}'),
            '0'..='7' => {
                let mut digits = next.to_string();
                while digits.len() < 3 {
                    match chars.peek() {
                        Some(d @ '0'..='7') => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                push_code_point(&mut out, &digits, 8, &format!("\\{}", digits));
            }
            'x' | 'u' | 'U' => {
                let width = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let mut digits = String::new();
                while digits.len() < width {
                    match chars.peek() {
                        Some(d) if d.is_ascii_hexdigit() => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                let raw = format!("\\{}{}", next, digits);
                if digits.len() == width {
                    push_code_point(&mut out, &digits, 16, &raw);
                } else {
                    out.push_str(&raw);
                }
            }
            other => {
                // Unknown escapes keep their backslash, `\N{...}` included
                out.push('\\');
                out.push(other);
            }
        }
    }

    out
}

fn push_code_point(out: &mut String, digits: &str, radix: u32, fallback: &str) {
    match u32::from_str_radix(digits, radix).ok().and_then(char::from_u32) {
        Some(c) => out.push(c),
        None => out.push_str(fallback),
    }
}

/// Strip the common indentation of all lines after the first, plus
/// leading and trailing empty lines
fn clean_docstring(doc: &str) -> String {
    let expanded: Vec<String> = doc.split('\n').map(expand_tabs).collect();

    let margin = expanded
        .iter()
        .skip(1)
        .filter_map(|line| {
            let content = line.trim_start();
            (!content.is_empty()).then(|| line.chars().count() - content.chars().count())
        })
        .min();

    let mut lines: Vec<String> = Vec::with_capacity(expanded.len());
    for (i, line) in expanded.iter().enumerate() {
        if i == 0 {
            lines.push(line.trim_start().to_string());
        } else if let Some(margin) = margin {
            lines.push(line.chars().skip(margin).collect());
        } else {
            lines.push(line.clone());
        }
    }

    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|line| line.is_empty()).count();

    lines[leading..].join("\n")
}

fn expand_tabs(line: &str) -> String {
    const TAB_SIZE: usize = 8;

    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let fill = TAB_SIZE - column % TAB_SIZE;
            out.extend(std::iter::repeat(' ').take(fill));
            column += fill;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(code: &str) -> Result<MetadataRecord, ExtractError> {
        let mut extractor = PythonExtractor::new().unwrap();
        extractor.extract(Path::new("test.py"), code)
    }

    #[test]
    fn test_extract_python_function() {
        let code = r#"
def hello_world(name: str, greeting="hi") -> str:
    """This is a docstring."""
    return f"{greeting}, {name}!"
"#;

        let record = extract(code).unwrap();

        assert_eq!(record.language, Dialect::Python);
        assert_eq!(record.functions.len(), 1);
        let function = &record.functions[0];
        assert_eq!(function.name, "hello_world");
        assert_eq!(function.line, Some(2));
        assert_eq!(function.doc.as_deref(), Some("This is a docstring."));
        assert_eq!(function.params, vec!["name", "greeting"]);
        assert_eq!(function.returns.as_deref(), Some("str"));
        assert!(function.decorators.is_empty());
    }

    #[test]
    fn test_line_numbers_follow_defining_keyword() {
        let code = "import os\n\n\n@decorator\ndef first():\n    pass\n\nclass Second:\n    def third(self):\n        pass\n";

        let record = extract(code).unwrap();

        let lines: Vec<(&str, Option<usize>)> = record
            .functions
            .iter()
            .map(|f| (f.name.as_str(), f.line))
            .collect();
        assert_eq!(lines, vec![("first", Some(5)), ("third", Some(9))]);
        assert_eq!(record.classes[0].line, Some(8));
        assert_eq!(record.classes[0].methods[0].line, Some(9));
    }

    #[test]
    fn test_nested_functions_are_flattened_in_document_order() {
        let code = r#"
def outer():
    def inner():
        def innermost():
            pass
    return inner

def after():
    pass
"#;

        let record = extract(code).unwrap();
        let names: Vec<&str> = record.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["outer", "inner", "innermost", "after"]);
    }

    #[test]
    fn test_class_methods_are_one_level_deep() {
        let code = r#"
class Service(Base, mixins.Logging, metaclass=Meta):
    """A service.

    Handles things.
    """

    def __init__(self, client):
        """Build it."""
        def helper():
            pass

    @staticmethod
    def build(config):
        pass

    @classmethod
    def default(cls):
        pass

    class Nested:
        def deep(self):
            pass
"#;

        let record = extract(code).unwrap();

        let service = &record.classes[0];
        assert_eq!(service.name, "Service");
        assert_eq!(service.bases, vec!["Base", "mixins.Logging"]);
        assert_eq!(service.doc.as_deref(), Some("A service.\n\nHandles things."));

        let methods: Vec<(&str, bool, bool)> = service
            .methods
            .iter()
            .map(|m| (m.name.as_str(), m.is_static, m.is_classmethod))
            .collect();
        assert_eq!(
            methods,
            vec![
                ("__init__", false, false),
                ("build", true, false),
                ("default", false, true),
            ]
        );
        assert_eq!(service.methods[0].params, vec!["self", "client"]);
        assert_eq!(service.methods[0].doc.as_deref(), Some("Build it."));

        // Nested class is collected on its own
        assert_eq!(record.classes.len(), 2);
        assert_eq!(record.classes[1].name, "Nested");
        assert_eq!(record.classes[1].methods.len(), 1);

        // Every def shows up as a function, methods and helpers included
        let names: Vec<&str> = record.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["__init__", "helper", "build", "default", "deep"]);
    }

    #[test]
    fn test_decorator_names() {
        let code = r#"
@app.route("/users")
@cached
def users():
    pass
"#;

        let record = extract(code).unwrap();
        assert_eq!(
            record.functions[0].decorators,
            vec!["app.route(\"/users\")", "cached"]
        );
    }

    #[test]
    fn test_aliased_static_decorator_is_not_resolved() {
        let code = r#"
sm = staticmethod

class Tool:
    @sm
    def run():
        pass
"#;

        let record = extract(code).unwrap();
        assert!(!record.classes[0].methods[0].is_static);
    }

    #[test]
    fn test_positional_parameters_only() {
        let code = "def f(a, b: int, /, c, d=1, *args, e, **kwargs):\n    pass\n\ndef g(x, *, y):\n    pass\n";

        let record = extract(code).unwrap();
        assert_eq!(record.functions[0].params, vec!["c", "d"]);
        assert_eq!(record.functions[1].params, vec!["x"]);
    }

    #[test]
    fn test_async_function() {
        let record = extract("async def fetch(url):\n    pass\n").unwrap();
        assert!(record.functions[0].is_async);
        assert_eq!(record.functions[0].line, Some(1));
    }

    #[test]
    fn test_imports() {
        let code = r#"
from __future__ import annotations
import os, json as j
import xml.etree.ElementTree as ET
from typing import List, Optional as Opt
from . import sibling
from .pkg import thing
from collections import *

def lazy():
    import sqlite3
"#;

        let record = extract(code).unwrap();
        assert_eq!(
            record.imports(),
            &[
                "__future__.annotations",
                "os",
                "json",
                "xml.etree.ElementTree",
                "typing.List",
                "typing.Optional",
                ".sibling",
                "pkg.thing",
                "collections.*",
                "sqlite3",
            ]
        );
    }

    #[test]
    fn test_syntax_error_rejects_whole_file() {
        let code = "def ok():\n    pass\n\ndef broken(:\n    pass\n";

        let err = extract(code).unwrap_err();
        assert!(matches!(err, ExtractError::Syntax(_)));
        assert!(err.to_string().starts_with("syntax error: "));
    }

    #[test]
    fn test_inputs_python_rejects_are_syntax_errors() {
        let rejected = [
            "def f():\npass\n",
            "def h():\n    return\n  x = 1\n",
            "def f(x=1, y):\n    pass\n",
            "f(**a, *b)\n",
            "x = 1\n    y = 2\n",
            "class C:\n    def run(self):\n        pass\n   def stop(self):\n        pass\n",
        ];

        for code in rejected {
            let err = extract(code).unwrap_err();
            assert!(matches!(err, ExtractError::Syntax(_)), "{:?}: {}", code, err);
        }
    }

    #[test]
    fn test_indentation_error_message() {
        let err = extract("def f():\npass\n").unwrap_err();
        assert!(err
            .to_string()
            .starts_with("syntax error: expected an indented block"));
    }

    #[test]
    fn test_docstring_forms() {
        let code = r#"
def raw():
    r"""Keep \n as is."""

def escaped():
    "Tab\there"

def fstring():
    f"""Not a {docstring}."""

def later():
    x = 1
    """Not first."""

def commented():
    # leading comment
    '''Still a docstring.'''
"#;

        let record = extract(code).unwrap();
        let docs: Vec<Option<&str>> = record.functions.iter().map(|f| f.doc.as_deref()).collect();
        assert_eq!(
            docs,
            vec![
                Some("Keep \\n as is."),
                Some("Tab     here"),
                None,
                None,
                Some("Still a docstring."),
            ]
        );
    }

    #[test]
    fn test_clean_docstring() {
        assert_eq!(clean_docstring("Summary."), "Summary.");
        assert_eq!(
            clean_docstring("\n    Summary.\n\n    Details\n      indented.\n    "),
            "Summary.\n\nDetails\n  indented."
        );
        assert_eq!(clean_docstring("  First\n\tTabbed"), "First\nTabbed");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"a\nb"), "a\nb");
        assert_eq!(unescape(r"\x41é\101"), "AéA");
        assert_eq!(unescape(r"\q"), "\\q");
        assert_eq!(unescape("line\\\ncontinued"), "linecontinued");
    }
}
