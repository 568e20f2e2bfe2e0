//! Metadata record exchanged between extraction and rendering
//!
//! A record is built fresh per extraction call and never mutated afterwards.
//! Relationships (`extends`, `implements`, `bases`) are plain names; nothing
//! is resolved across files.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Source dialect of an extracted file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Dialect {
    /// Parsed with the tree-sitter Python grammar
    Python,
    /// Matched heuristically with regular expressions (TS/JS)
    TypeScript,
    /// Anything a hand-written or foreign record might carry
    #[default]
    Unknown,
}

impl Dialect {
    /// Detect dialect from a file extension (without the leading dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "py" => Some(Dialect::Python),
            "ts" | "tsx" | "js" | "jsx" => Some(Dialect::TypeScript),
            _ => None,
        }
    }

    /// Tag used in JSON and in the rendered header
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Python => "python",
            Dialect::TypeScript => "typescript",
            Dialect::Unknown => "unknown",
        }
    }
}

impl From<String> for Dialect {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "python" => Dialect::Python,
            "typescript" => Dialect::TypeScript,
            _ => Dialect::Unknown,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one extraction: a full record or an error, never a mix
///
/// Any JSON object carrying an `"error"` key reads back as an error record;
/// everything else must be a metadata record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Extraction {
    Failed(ErrorRecord),
    Record(MetadataRecord),
}

impl Extraction {
    /// The record, if extraction succeeded
    pub fn record(&self) -> Option<&MetadataRecord> {
        match self {
            Extraction::Record(record) => Some(record),
            Extraction::Failed(_) => None,
        }
    }

    /// The error message, if extraction failed
    pub fn error(&self) -> Option<&str> {
        match self {
            Extraction::Failed(failed) => Some(&failed.error),
            Extraction::Record(_) => None,
        }
    }

    /// Parse JSON text, keeping line and column in record errors
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        if is_error_object(&value) {
            serde_json::from_value(value).map(Extraction::Failed)
        } else {
            serde_json::from_str(text).map(Extraction::Record)
        }
    }
}

fn is_error_object(value: &serde_json::Value) -> bool {
    value
        .as_object()
        .is_some_and(|object| object.contains_key("error"))
}

impl<'de> Deserialize<'de> for Extraction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        if is_error_object(&value) {
            ErrorRecord::deserialize(value)
                .map(Extraction::Failed)
                .map_err(D::Error::custom)
        } else {
            MetadataRecord::deserialize(value)
                .map(Extraction::Record)
                .map_err(D::Error::custom)
        }
    }
}

/// `{ "error": "<message>" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error: String,
}

/// Structural summary of one source file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Path of the source file, as given to the extractor
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub language: Dialect,
    #[serde(default)]
    pub functions: Vec<FunctionDescriptor>,
    #[serde(default)]
    pub classes: Vec<ClassDescriptor>,
    /// Heuristic dialect only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<Vec<InterfaceDescriptor>>,
    /// Heuristic dialect only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<TypeAliasDescriptor>>,
    /// Formal dialect only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imports: Option<Vec<String>>,
    /// Heuristic dialect only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<Vec<String>>,
}

impl MetadataRecord {
    /// Interfaces, or an empty slice for dialects that have none
    pub fn interfaces(&self) -> &[InterfaceDescriptor] {
        self.interfaces.as_deref().unwrap_or_default()
    }

    pub fn types(&self) -> &[TypeAliasDescriptor] {
        self.types.as_deref().unwrap_or_default()
    }

    pub fn imports(&self) -> &[String] {
        self.imports.as_deref().unwrap_or_default()
    }

    pub fn exports(&self) -> &[String] {
        self.exports.as_deref().unwrap_or_default()
    }

    /// True when no function, class, interface or type alias was found
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
            && self.classes.is_empty()
            && self.interfaces().is_empty()
            && self.types().is_empty()
    }
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// A function definition, at any nesting depth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub name: String,
    /// 1-based line of the defining keyword, absent in hand-written records
    #[serde(default)]
    pub line: Option<usize>,
    /// Docstring (formal) or preceding `/** */` block (heuristic)
    #[serde(default, alias = "docstring", alias = "jsdoc")]
    pub doc: Option<String>,
    #[serde(default, alias = "args", skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
    /// Return annotation source text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_exported: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_async: bool,
}

impl FunctionDescriptor {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            line: Some(line),
            doc: None,
            params: Vec::new(),
            returns: None,
            decorators: Vec::new(),
            is_exported: false,
            is_async: false,
        }
    }
}

/// A class definition
///
/// `methods` and `bases` are filled for the formal dialect;
/// `extends`, `implements` and `is_exported` for the heuristic one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,
    #[serde(default)]
    pub line: Option<usize>,
    #[serde(default, alias = "docstring", alias = "jsdoc")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_exported: bool,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            line: Some(line),
            doc: None,
            methods: Vec::new(),
            bases: Vec::new(),
            extends: None,
            implements: Vec::new(),
            is_exported: false,
        }
    }
}

/// A function defined directly in a class body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    #[serde(default)]
    pub line: Option<usize>,
    #[serde(default, alias = "docstring")]
    pub doc: Option<String>,
    #[serde(default, alias = "args", skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_classmethod: bool,
}

/// An `interface` declaration (heuristic dialect)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDescriptor {
    pub name: String,
    #[serde(default)]
    pub line: Option<usize>,
    #[serde(default, alias = "jsdoc")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_exported: bool,
}

/// A `type X =` alias (heuristic dialect)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeAliasDescriptor {
    pub name: String,
    #[serde(default)]
    pub line: Option<usize>,
    #[serde(default, alias = "jsdoc")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_exported: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_extension() {
        assert_eq!(Dialect::from_extension("py"), Some(Dialect::Python));
        assert_eq!(Dialect::from_extension("TSX"), Some(Dialect::TypeScript));
        assert_eq!(Dialect::from_extension("jsx"), Some(Dialect::TypeScript));
        assert_eq!(Dialect::from_extension("txt"), None);
    }

    #[test]
    fn test_error_record_shape() {
        let failed = Extraction::Failed(ErrorRecord {
            error: "unsupported file type: .txt".to_string(),
        });
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "unsupported file type: .txt" }));

        let parsed: Extraction = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.error(), Some("unsupported file type: .txt"));
    }

    #[test]
    fn test_lenient_record_input() {
        // Field names produced by other tools are accepted as aliases
        let json = serde_json::json!({
            "file": "src/app.py",
            "language": "python",
            "functions": [
                { "name": "run", "line": 3, "docstring": "Run it.", "args": ["a", "b"] }
            ],
            "classes": [
                { "name": "Widget", "line": 9, "jsdoc": null, "unexpected": true }
            ]
        });

        let parsed: Extraction = serde_json::from_value(json).unwrap();
        let record = parsed.record().unwrap();
        assert_eq!(record.language, Dialect::Python);
        assert_eq!(record.functions[0].doc.as_deref(), Some("Run it."));
        assert_eq!(record.functions[0].params, vec!["a", "b"]);
        assert!(record.interfaces().is_empty());
    }

    #[test]
    fn test_unknown_language_tag() {
        let parsed: MetadataRecord =
            serde_json::from_str(r#"{ "language": "cobol" }"#).unwrap();
        assert_eq!(parsed.language, Dialect::Unknown);
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let result: Result<Extraction, _> =
            serde_json::from_str(r#"{ "functions": [ { "line": 1 } ] }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_field_names() {
        let mut function = FunctionDescriptor::new("run", 3);
        function.doc = Some("Run it.".to_string());
        function.params = vec!["a".to_string()];

        let json = serde_json::to_value(&function).unwrap();
        assert_eq!(json["doc"], "Run it.");
        assert_eq!(json["params"], serde_json::json!(["a"]));
        assert!(json.get("docstring").is_none());
        assert!(json.get("args").is_none());
    }

    #[test]
    fn test_missing_line_is_tolerated() {
        let parsed: Extraction =
            serde_json::from_str(r#"{ "functions": [ { "name": "f" } ] }"#).unwrap();
        let record = parsed.record().unwrap();
        assert_eq!(record.functions[0].name, "f");
        assert_eq!(record.functions[0].line, None);
    }

    #[test]
    fn test_record_errors_name_the_field() {
        let err = serde_json::from_str::<Extraction>(r#"{ "classes": [ { "line": 2 } ] }"#)
            .unwrap_err();
        assert!(err.to_string().contains("missing field `name`"));

        let err = Extraction::from_json("{\n  \"classes\": [ { \"line\": 2 } ]\n}").unwrap_err();
        assert!(err.to_string().contains("missing field `name`"));
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn test_any_object_with_error_key_is_an_error_record() {
        let parsed = Extraction::from_json(r#"{ "error": "boom", "file": "a.py" }"#).unwrap();
        assert_eq!(parsed.error(), Some("boom"));
    }

    #[test]
    fn test_dialect_specific_fields_are_omitted() {
        let record = MetadataRecord {
            file: "a.py".to_string(),
            language: Dialect::Python,
            functions: vec![FunctionDescriptor::new("f", 1)],
            imports: Some(vec![]),
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        let object = json.as_object().unwrap();
        assert!(object.contains_key("imports"));
        assert!(!object.contains_key("interfaces"));
        assert!(!object.contains_key("exports"));

        let function = &json["functions"][0];
        assert!(function["doc"].is_null());
        assert!(function.get("is_exported").is_none());
    }
}
