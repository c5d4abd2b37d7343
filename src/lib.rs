//! JSON Schema Code Generator
//!
//! Compiles JSON Schema documents, and the `definitions` of Swagger/OpenAPI
//! documents, into data classes for Kotlin, Java and Rust. Generated
//! classes validate their fields on construction.
//!
//! # Example
//!
//! ```
//! use schema_codegen::{CodeGenerator, GenerateOptions, MemoryOutput, TargetLanguage};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "title": "Person",
//!     "type": "object",
//!     "required": ["id", "name"],
//!     "properties": {
//!         "id": { "type": "integer", "minimum": 1, "maximum": 9999 },
//!         "name": { "type": "string", "minLength": 1 }
//!     }
//! });
//!
//! let options = GenerateOptions::new(TargetLanguage::Kotlin).package("com.example");
//! let mut output = MemoryOutput::new();
//! CodeGenerator::new(options)
//!     .generate(&schema, "Person", &mut output)
//!     .unwrap();
//!
//! let person = output.get("Person").unwrap();
//! assert!(person.contains("data class Person("));
//! assert!(person.contains(r#"require(id >= 1) { "id < minimum 1 - $id" }"#));
//! ```
//!
//! # Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Loading | `loader` | `serde_json::Value` |
//! | Reference resolution | `resolver` | nodes and canonical pointers |
//! | Model building | `builder` | [`ClassGraph`] |
//! | Constraint translation | `constraints` | ordered [`Guard`]s per property |
//! | Emission | [`emit`] | source text per top-level class |
//! | Output routing | `output` | one sink per [`TargetFile`] |
//!
//! # Composition
//!
//! `allOf` with one reference makes the class extend the referenced class
//! and adds the properties of any inline members. The base properties are
//! copied instead when the class redeclares or newly requires one of them.
//! Targets without inheritance carry the base fields in every subclass.
//! `oneOf`/`anyOf` turn the class into a base whose alternatives become
//! nested variant classes.

mod builder;
mod constraints;
pub mod emit;
mod error;
mod generator;
mod loader;
mod model;
mod naming;
mod output;
mod resolver;
mod types;

pub use builder::ClassModelBuilder;
pub use constraints::{guards, Actual, Guard, Subject};
pub use emit::{emitter_for, Emitter, JavaEmitter, KotlinEmitter, RustEmitter};
pub use error::{GenerateError, LoadError};
pub use generator::CodeGenerator;
pub use loader::{
    is_url, load_document, load_document_auto, load_document_str, load_document_yaml_str,
};
pub use model::{
    ClassGraph, ClassId, ClassKind, ClassModel, Constraint, DefaultValue, Element, EnumModel,
    PrimitiveKind, Property, PropertyDefault, StringFormat, Type,
};
pub use output::{DirectoryOutput, MemoryOutput, OutputResolver, TargetFile};
pub use resolver::{ResolvedRef, Resolver};
pub use types::{GenerateOptions, TargetLanguage};

#[cfg(feature = "remote")]
pub use loader::load_document_url;
