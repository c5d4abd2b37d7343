//! Error types for document loading and code generation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading a schema document.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML: {source}")]
    InvalidYaml {
        #[source]
        source: serde_yaml::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors that abort a generation run.
///
/// Every variant is fatal: nothing is retried and no sink is written once
/// one of these has been raised during model building or rendering.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("unresolved reference: {pointer}")]
    UnresolvedReference { pointer: String },

    #[error("cyclic reference cannot be represented: {pointer}")]
    CyclicReference { pointer: String },

    #[error("unsupported schema construct at {pointer}: {construct}")]
    UnsupportedSchemaConstruct { pointer: String, construct: String },

    #[error("cannot render {construct} in class {class}")]
    UnsupportedTargetConstruct { class: String, construct: String },

    #[error("invalid schema at {pointer}: {message}")]
    InvalidSchema { pointer: String, message: String },

    #[error("cannot write {file}: {source}")]
    Output {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

impl GenerateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            GenerateError::Output { .. } => 3,
            _ => 2,
        }
    }

    pub(crate) fn unsupported(pointer: &str, construct: impl Into<String>) -> Self {
        GenerateError::UnsupportedSchemaConstruct {
            pointer: display_pointer(pointer),
            construct: construct.into(),
        }
    }

    pub(crate) fn target(class: &str, construct: impl Into<String>) -> Self {
        GenerateError::UnsupportedTargetConstruct {
            class: class.to_string(),
            construct: construct.into(),
        }
    }
}

/// Render a canonical pointer the way users write it in `$ref`.
pub(crate) fn display_pointer(pointer: &str) -> String {
    format!("#{}", pointer)
}
