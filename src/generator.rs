//! Generation entry points.
//!
//! A run builds the class model for a document, renders every emitted
//! top-level class, and only then hands the files to the output resolver.
//! A failure while building or rendering leaves the resolver untouched.

use std::collections::HashSet;
use std::io::Write;

use serde_json::Value;
use tracing::{debug, info};

use crate::builder::ClassModelBuilder;
use crate::emit::{emitter_for, Emitter};
use crate::error::{display_pointer, GenerateError};
use crate::model::{ClassGraph, ClassId};
use crate::output::{OutputResolver, TargetFile};
use crate::resolver::Resolver;
use crate::types::GenerateOptions;

/// Generates source files for one target language.
///
/// A generator holds no per-run state; each call builds its own class
/// model, so one generator may serve several threads.
pub struct CodeGenerator {
    options: GenerateOptions,
    emitter: Box<dyn Emitter>,
}

impl CodeGenerator {
    pub fn new(options: GenerateOptions) -> Self {
        let emitter = emitter_for(options.language);
        Self { options, emitter }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Build the class model for a document whose root is a class schema.
    ///
    /// `name` names the root class when it has no `title`.
    pub fn build(&self, document: &Value, name: &str) -> Result<(ClassGraph, ClassId), GenerateError> {
        self.check_schema(document, "")?;
        let mut builder = ClassModelBuilder::new(document, self.options.base_package.as_str());
        let root = builder.build_root(name)?;
        Ok((builder.finish(), root))
    }

    /// Build the class model for the members of a definitions container
    /// accepted by `filter`.
    ///
    /// Returns the graph and the top-level classes to emit: every
    /// top-level class except those standing for members the filter
    /// rejected. Rejected members are still built when an accepted member
    /// references them.
    pub fn build_all(
        &self,
        document: &Value,
        container: &str,
        filter: impl Fn(&str) -> bool,
    ) -> Result<(ClassGraph, Vec<ClassId>), GenerateError> {
        self.check_schema(document, "")?;
        let resolver = Resolver::new(document);
        let mut builder = ClassModelBuilder::new(document, self.options.base_package.as_str());
        let mut requested = HashSet::new();
        let mut excluded = HashSet::new();

        for (name, member) in resolver.definitions(container)? {
            if !filter(name) {
                debug!(member = name, "excluded by filter");
                excluded.insert(member.pointer);
                continue;
            }
            if let Some(id) = builder.build_definition(name, member)? {
                requested.insert(id);
            }
        }

        let graph = builder.finish();
        let emitted = graph
            .top_level()
            .filter(|class| requested.contains(&class.id) || !excluded.contains(&class.pointer))
            .map(|class| class.id)
            .collect();
        Ok((graph, emitted))
    }

    /// Render one top-level class to source text.
    pub fn render(&self, graph: &ClassGraph, id: ClassId) -> Result<String, GenerateError> {
        debug!(class = %graph[id].name, language = ?self.options.language, "rendering");
        self.emitter.render(graph, id, &self.options)
    }

    /// Generate every top-level class reachable from the document root.
    ///
    /// Returns the files written, in model order.
    ///
    /// # Errors
    ///
    /// Model and rendering errors abort the run before anything is written.
    /// `GenerateError::Output` reports a sink that failed.
    pub fn generate(
        &self,
        document: &Value,
        name: &str,
        output: &mut dyn OutputResolver,
    ) -> Result<Vec<TargetFile>, GenerateError> {
        let (graph, _) = self.build(document, name)?;
        let classes: Vec<ClassId> = graph.top_level().map(|class| class.id).collect();
        self.emit(&graph, &classes, output)
    }

    /// Generate every member of a definitions container, such as
    /// `/definitions` or `/components/schemas`.
    pub fn generate_all(
        &self,
        document: &Value,
        container: &str,
        output: &mut dyn OutputResolver,
    ) -> Result<Vec<TargetFile>, GenerateError> {
        self.generate_all_filtered(document, container, |_| true, output)
    }

    /// Generate the members of a definitions container accepted by
    /// `filter`. Rejected members get no file of their own.
    pub fn generate_all_filtered(
        &self,
        document: &Value,
        container: &str,
        filter: impl Fn(&str) -> bool,
        output: &mut dyn OutputResolver,
    ) -> Result<Vec<TargetFile>, GenerateError> {
        let (graph, classes) = self.build_all(document, container, filter)?;
        self.emit(&graph, &classes, output)
    }

    fn emit(
        &self,
        graph: &ClassGraph,
        classes: &[ClassId],
        output: &mut dyn OutputResolver,
    ) -> Result<Vec<TargetFile>, GenerateError> {
        let mut rendered = Vec::with_capacity(classes.len());
        for id in classes {
            let text = self.render(graph, *id)?;
            rendered.push((self.target_file(graph, *id), text));
        }

        let mut written = Vec::with_capacity(rendered.len());
        for (target, text) in rendered {
            let failed = |source| GenerateError::Output {
                file: target.path().display().to_string(),
                source,
            };
            let mut sink = output.resolve(&target).map_err(failed)?;
            sink.write_all(text.as_bytes()).map_err(failed)?;
            sink.flush().map_err(failed)?;
            drop(sink);
            info!(file = %target.path().display(), "generated");
            written.push(target);
        }
        Ok(written)
    }

    fn target_file(&self, graph: &ClassGraph, id: ClassId) -> TargetFile {
        TargetFile {
            base_directory: self.options.base_directory.clone(),
            directories: self.options.package_directories(),
            name: self.emitter.file_name(&graph[id]),
            suffix: self.options.language.suffix().to_string(),
        }
    }

    /// Compile `schema` as a validator when enabled. This checks it against
    /// its meta-schema and resolves its local references.
    fn check_schema(&self, schema: &Value, pointer: &str) -> Result<(), GenerateError> {
        if !self.options.validate_schema {
            return Ok(());
        }
        jsonschema::validator_for(schema)
            .map(|_| ())
            .map_err(|e| GenerateError::InvalidSchema {
                pointer: display_pointer(pointer),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemoryOutput;
    use crate::types::TargetLanguage;
    use serde_json::json;

    fn definitions() -> Value {
        json!({
            "definitions": {
                "Person": {
                    "type": "object",
                    "properties": { "name": { "type": "string" } }
                },
                "Team": {
                    "type": "object",
                    "properties": {
                        "lead": { "$ref": "#/definitions/Person" }
                    }
                },
                "Status": { "type": "string", "enum": ["on", "off"] }
            }
        })
    }

    #[test]
    fn filter_selects_members() {
        let generator = CodeGenerator::new(GenerateOptions::new(TargetLanguage::Kotlin));
        let mut output = MemoryOutput::new();
        let files = generator
            .generate_all_filtered(&definitions(), "/definitions", |name| name == "Person", &mut output)
            .unwrap();
        assert_eq!(files.len(), 1);
        assert!(output.get("Person").is_some());
        assert_eq!(output.get("Team"), None);
    }

    #[test]
    fn referenced_members_are_emitted_unless_excluded() {
        let generator = CodeGenerator::new(GenerateOptions::new(TargetLanguage::Java));
        let mut output = MemoryOutput::new();
        generator
            .generate_all_filtered(&definitions(), "/definitions", |name| name == "Team", &mut output)
            .unwrap();
        assert!(output.get("Team").is_some());
        assert_eq!(output.get("Person"), None);
    }

    #[test]
    fn target_files_follow_package() {
        let options = GenerateOptions::new(TargetLanguage::Kotlin)
            .package("com.example")
            .directory("out");
        let generator = CodeGenerator::new(options);
        let mut output = MemoryOutput::new();
        let files = generator
            .generate_all(&definitions(), "#/definitions", &mut output)
            .unwrap();
        let names: Vec<String> = files.iter().map(TargetFile::file_name).collect();
        assert_eq!(names, vec!["Person.kt", "Team.kt"]);
        assert_eq!(files[0].directories, vec!["com", "example"]);
        assert_eq!(files[0].base_directory, "out");
    }

    #[test]
    fn render_failure_writes_nothing() {
        let document = json!({
            "definitions": {
                "Good": { "type": "object", "properties": { "a": { "type": "string" } } },
                "Bad": {
                    "type": "object",
                    "properties": { "code": { "type": "string", "pattern": "^x$" } }
                }
            }
        });
        let generator = CodeGenerator::new(GenerateOptions::new(TargetLanguage::Rust));
        let mut output = MemoryOutput::new();
        let result = generator.generate_all(&document, "/definitions", &mut output);
        assert!(matches!(
            result,
            Err(GenerateError::UnsupportedTargetConstruct { .. })
        ));
        assert!(output.is_empty());
    }

    #[test]
    fn meta_validation_rejects_invalid_schema() {
        let document = json!({ "type": "object", "properties": { "a": { "type": 7 } } });
        let generator = CodeGenerator::new(
            GenerateOptions::new(TargetLanguage::Kotlin).validate_schema(true),
        );
        let result = generator.generate(&document, "Root", &mut MemoryOutput::new());
        assert!(matches!(result, Err(GenerateError::InvalidSchema { .. })));
    }

    #[test]
    fn meta_validation_covers_definitions_document() {
        let generator = CodeGenerator::new(
            GenerateOptions::new(TargetLanguage::Kotlin).validate_schema(true),
        );
        let mut output = MemoryOutput::new();
        let files = generator
            .generate_all(&definitions(), "/definitions", &mut output)
            .unwrap();
        assert_eq!(files.len(), 2);

        let mut document = definitions();
        document["definitions"]["Person"]["properties"]["name"]["minLength"] = json!("one");
        let result = generator.generate_all(&document, "/definitions", &mut MemoryOutput::new());
        match result {
            Err(GenerateError::InvalidSchema { pointer, .. }) => assert_eq!(pointer, "#"),
            other => panic!("expected invalid schema, got {:?}", other.map(|f| f.len())),
        }
    }
}
