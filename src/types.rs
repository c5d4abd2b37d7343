//! Core types for code generation configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Language the generated source is written in.
///
/// Selects which emission backend runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLanguage {
    #[default]
    Kotlin,
    Java,
    Rust,
}

impl TargetLanguage {
    /// File suffix for generated sources, without the dot.
    pub fn suffix(&self) -> &'static str {
        match self {
            TargetLanguage::Kotlin => "kt",
            TargetLanguage::Java => "java",
            TargetLanguage::Rust => "rs",
        }
    }

    /// Whether the language can express a class extending another class.
    ///
    /// Languages without it get variant classes with the base fields
    /// flattened in.
    pub fn supports_inheritance(&self) -> bool {
        match self {
            TargetLanguage::Kotlin | TargetLanguage::Java => true,
            TargetLanguage::Rust => false,
        }
    }

    /// Parse a language name (case-insensitive).
    ///
    /// Returns `None` for unknown values (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "kotlin" | "kt" => Some(TargetLanguage::Kotlin),
            "java" => Some(TargetLanguage::Java),
            "rust" | "rs" => Some(TargetLanguage::Rust),
            _ => None,
        }
    }
}

/// Options for a generation run.
///
/// Can be deserialized from a JSON or YAML config file (camelCase keys).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateOptions {
    /// Backend to render with.
    pub language: TargetLanguage,
    /// Package or namespace applied to every generated class.
    /// Empty means the default package.
    pub base_package: String,
    /// Directory handed to the output router as the first path component.
    pub base_directory: String,
    /// When true, every root schema is checked against its meta-schema
    /// before the class model is built.
    pub validate_schema: bool,
    /// Extra line placed in the header comment of every generated file.
    pub header_comment: Option<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            language: TargetLanguage::default(),
            base_package: String::new(),
            base_directory: ".".to_string(),
            validate_schema: false,
            header_comment: None,
        }
    }
}

impl GenerateOptions {
    /// Create options for the given language with the default package.
    pub fn new(language: TargetLanguage) -> Self {
        Self {
            language,
            ..Self::default()
        }
    }

    /// Set the package or namespace of all generated classes.
    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.base_package = package.into();
        self
    }

    /// Set the base output directory.
    pub fn directory(mut self, directory: impl Into<String>) -> Self {
        self.base_directory = directory.into();
        self
    }

    /// Enable or disable meta-schema validation of root schemas.
    pub fn validate_schema(mut self, validate: bool) -> Self {
        self.validate_schema = validate;
        self
    }

    /// Add a line to the generated header comment.
    pub fn header_comment(mut self, comment: impl Into<String>) -> Self {
        self.header_comment = Some(comment.into());
        self
    }

    /// Directory segments derived from the base package.
    pub fn package_directories(&self) -> Vec<String> {
        self.base_package
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(String::from)
            .collect()
    }
}
