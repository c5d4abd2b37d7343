//! Integration tests for code generation.

use std::path::PathBuf;

use serde_json::{json, Value};
use schema_codegen::{
    load_document, CodeGenerator, GenerateError, GenerateOptions, MemoryOutput, TargetLanguage,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn generator(language: TargetLanguage) -> CodeGenerator {
    CodeGenerator::new(GenerateOptions::new(language).package("com.example"))
}

/// Generated text without the header comment.
fn body(text: &str) -> &str {
    text.split_once(" */\n\n").map(|(_, body)| body).unwrap_or(text)
}

fn generate_root(language: TargetLanguage, schema: &Value) -> Result<MemoryOutput, GenerateError> {
    let mut output = MemoryOutput::new();
    generator(language).generate(schema, "Root", &mut output)?;
    Ok(output)
}

fn generate_defs(language: TargetLanguage, document: &Value) -> Result<MemoryOutput, GenerateError> {
    let mut output = MemoryOutput::new();
    generator(language).generate_all(document, "/$defs", &mut output)?;
    Ok(output)
}

const KOTLIN_PERSON: &str = r#"/*
 * Person.kt
 *
 * This code was generated by schema-codegen - JSON Schema Code Generator
 *
 * It is not advisable to modify generated code as any modifications will be lost
 * when the generation process is re-run.
 */

package com.example

data class Person(
    val id: Int,
    val name: String
) {

    init {
        require(id >= 1) { "id < minimum 1 - $id" }
        require(id <= 9999) { "id > maximum 9999 - $id" }
        require(name.isNotEmpty()) { "name length < minimum 1 - ${name.length}" }
    }

}
"#;

const JAVA_PERSON: &str = r#"package com.example;

public class Person {

    private final int id;
    private final String name;

    public Person(
            int id,
            String name
    ) {
        if (id < 1)
            throw new IllegalArgumentException("id < minimum 1 - " + id);
        if (id > 9999)
            throw new IllegalArgumentException("id > maximum 9999 - " + id);
        this.id = id;
        if (name == null)
            throw new IllegalArgumentException("Must not be null - name");
        if (name.isEmpty())
            throw new IllegalArgumentException("name length < minimum 1 - " + name.length());
        this.name = name;
    }

    public int getId() {
        return id;
    }

    public String getName() {
        return name;
    }

    @Override
    public boolean equals(Object other) {
        if (this == other)
            return true;
        if (!(other instanceof Person))
            return false;
        Person typedOther = (Person)other;
        if (id != typedOther.id)
            return false;
        return name.equals(typedOther.name);
    }

    @Override
    public int hashCode() {
        int hash = id;
        hash = 31 * hash + name.hashCode();
        return hash;
    }

}
"#;

const RUST_PERSON: &str = r#"#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Person {
    id: i32,
    name: String,
}

impl Person {
    pub fn new(id: i32, name: String) -> Result<Self, String> {
        if id < 1 {
            return Err(format!("id < minimum 1 - {}", id));
        }
        if id > 9999 {
            return Err(format!("id > maximum 9999 - {}", id));
        }
        if name.is_empty() {
            return Err(format!("name length < minimum 1 - {}", name.chars().count()));
        }
        Ok(Self { id, name })
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
"#;

mod swagger {
    use super::*;

    fn document() -> Value {
        load_document(&fixture("swagger.yaml")).unwrap()
    }

    #[test]
    fn kotlin_definitions() {
        let mut output = MemoryOutput::new();
        let files = generator(TargetLanguage::Kotlin)
            .generate_all(&document(), "/definitions", &mut output)
            .unwrap();
        let names: Vec<String> = files.iter().map(|f| f.file_name()).collect();
        assert_eq!(names, vec!["Person.kt", "QueryResponse.kt"]);

        assert_eq!(output.get("Person").unwrap(), KOTLIN_PERSON);
        assert_eq!(
            body(&output.get("QueryResponse").unwrap()),
            "package com.example\n\ndata class QueryResponse(\n    val total: Long? = null,\n    val people: List<Person>? = null\n)\n"
        );
    }

    #[test]
    fn filter_leaves_other_members_empty() {
        let mut output = MemoryOutput::new();
        generator(TargetLanguage::Kotlin)
            .generate_all_filtered(&document(), "/definitions", |name| name == "Person", &mut output)
            .unwrap();
        assert_eq!(output.get("Person").unwrap(), KOTLIN_PERSON);
        assert_eq!(output.get("QueryResponse"), None);
        assert_eq!(output.len(), 1);
    }

    #[test]
    fn java_definitions() {
        let mut output = MemoryOutput::new();
        generator(TargetLanguage::Java)
            .generate_all(&document(), "#/definitions", &mut output)
            .unwrap();
        assert_eq!(body(&output.get("Person").unwrap()), JAVA_PERSON);

        let response = output.get("QueryResponse").unwrap();
        assert!(response.contains("import java.util.List;\n\npublic class QueryResponse {\n"));
        assert!(response.contains("    private final Long total;\n    private final List<Person> people;\n"));
        assert!(response.contains("        int hash = (total != null ? total.hashCode() : 0);\n"));
    }

    #[test]
    fn rust_definitions() {
        let mut output = MemoryOutput::new();
        let files = generator(TargetLanguage::Rust)
            .generate_all(&document(), "/definitions", &mut output)
            .unwrap();
        let names: Vec<String> = files.iter().map(|f| f.file_name()).collect();
        assert_eq!(names, vec!["person.rs", "query_response.rs"]);

        assert_eq!(body(&output.get("person").unwrap()), RUST_PERSON);
        let response = output.get("query_response").unwrap();
        assert!(response.contains("    people: Option<Vec<super::person::Person>>,\n"));
        assert!(response.contains(
            "    pub fn people(&self) -> Option<&[super::person::Person]> {\n        self.people.as_deref()\n"
        ));
    }
}

mod root_schemas {
    use super::*;

    #[test]
    fn json_fixture_root() {
        let document = load_document(&fixture("person.schema.json")).unwrap();
        let mut output = MemoryOutput::new();
        generator(TargetLanguage::Kotlin)
            .generate(&document, "person", &mut output)
            .unwrap();
        assert_eq!(output.get("Person").unwrap(), KOTLIN_PERSON);
    }

    #[test]
    fn empty_object_has_no_fields_or_guards() {
        let document = load_document(&fixture("empty.schema.json")).unwrap();
        let mut output = MemoryOutput::new();
        generator(TargetLanguage::Kotlin)
            .generate(&document, "test_empty", &mut output)
            .unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(
            body(&output.get("TestEmpty").unwrap()),
            "package com.example\n\nclass TestEmpty\n"
        );

        let java = generate_root(TargetLanguage::Java, &document).unwrap();
        assert_eq!(
            body(&java.get("Root").unwrap()),
            "package com.example;\n\npublic class Root {\n\n}\n"
        );
    }

    #[test]
    fn header_comment_option() {
        let options = GenerateOptions::new(TargetLanguage::Kotlin).header_comment("Source: person.schema.json");
        let document = load_document(&fixture("person.schema.json")).unwrap();
        let mut output = MemoryOutput::new();
        CodeGenerator::new(options)
            .generate(&document, "person", &mut output)
            .unwrap();
        let text = output.get("Person").unwrap();
        assert!(text.starts_with(
            "/*\n * Person.kt\n *\n * This code was generated by schema-codegen - JSON Schema Code Generator\n * Source: person.schema.json\n *\n"
        ));
        assert!(body(&text).starts_with("data class Person("));
    }
}

mod composition {
    use super::*;

    fn type_a() -> Value {
        json!({
            "$defs": {
                "TypeA": {
                    "type": "object",
                    "properties": { "aaa": { "type": "integer", "format": "int64" } },
                    "oneOf": [
                        { "title": "A", "type": "object", "properties": { "xxx": { "type": "string" } } },
                        { "title": "B", "type": "object", "properties": { "yyy": { "type": "string" } } }
                    ]
                }
            }
        })
    }

    #[test]
    fn kotlin_open_base_with_variants() {
        let output = generate_defs(TargetLanguage::Kotlin, &type_a()).unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(
            body(&output.get("TypeA").unwrap()),
            r#"package com.example

open class TypeA(
    val aaa: Long? = null
) {

    override fun equals(other: Any?): Boolean = this === other || other is TypeA &&
            aaa == other.aaa

    override fun hashCode(): Int = aaa.hashCode()

    class A(
        aaa: Long? = null,
        val xxx: String? = null
    ) : TypeA(aaa) {

        override fun equals(other: Any?): Boolean = this === other || other is A && super.equals(other) &&
                xxx == other.xxx

        override fun hashCode(): Int {
            var hash = super.hashCode()
            hash = 31 * hash + xxx.hashCode()
            return hash
        }

    }

    class B(
        aaa: Long? = null,
        val yyy: String? = null
    ) : TypeA(aaa) {

        override fun equals(other: Any?): Boolean = this === other || other is B && super.equals(other) &&
                yyy == other.yyy

        override fun hashCode(): Int {
            var hash = super.hashCode()
            hash = 31 * hash + yyy.hashCode()
            return hash
        }

    }

}
"#
        );
    }

    #[test]
    fn java_variants_extend_base() {
        let output = generate_defs(TargetLanguage::Java, &type_a()).unwrap();
        let text = output.get("TypeA").unwrap();
        assert!(text.contains("    public static class A extends TypeA {\n"));
        assert!(text.contains(
            "        public A(\n                Long aaa,\n                String xxx\n        ) {\n            super(aaa);\n            this.xxx = xxx;\n        }\n"
        ));
        assert!(text.contains("            if (!super.equals(other))\n                return false;\n"));
        assert!(text.contains(
            "            int hash = super.hashCode();\n            hash = 31 * hash + (xxx != null ? xxx.hashCode() : 0);\n"
        ));
    }

    #[test]
    fn rust_variants_flatten_base_fields() {
        let output = generate_defs(TargetLanguage::Rust, &type_a()).unwrap();
        let text = output.get("type_a").unwrap();
        assert!(text.contains("pub mod type_a {\n"));
        assert!(text.contains("    pub struct B {\n        aaa: Option<i64>,\n        yyy: Option<String>,\n    }\n"));
    }

    fn pet_and_dog() -> Value {
        json!({
            "$defs": {
                "Pet": {
                    "type": "object",
                    "required": ["name"],
                    "properties": { "name": { "type": "string" } }
                },
                "Dog": {
                    "description": "A dog.",
                    "allOf": [
                        { "$ref": "#/$defs/Pet" },
                        { "type": "object", "properties": { "breed": { "type": "string" } } }
                    ]
                }
            }
        })
    }

    #[test]
    fn kotlin_all_of_extends_base() {
        let output = generate_defs(TargetLanguage::Kotlin, &pet_and_dog()).unwrap();
        assert_eq!(
            body(&output.get("Pet").unwrap()),
            r#"package com.example

open class Pet(
    val name: String
) {

    override fun equals(other: Any?): Boolean = this === other || other is Pet &&
            name == other.name

    override fun hashCode(): Int = name.hashCode()

}
"#
        );
        assert_eq!(
            body(&output.get("Dog").unwrap()),
            r#"package com.example

/**
 * A dog.
 */
class Dog(
    name: String,
    val breed: String? = null
) : Pet(name) {

    override fun equals(other: Any?): Boolean = this === other || other is Dog && super.equals(other) &&
            breed == other.breed

    override fun hashCode(): Int {
        var hash = super.hashCode()
        hash = 31 * hash + breed.hashCode()
        return hash
    }

}
"#
        );
    }

    #[test]
    fn java_all_of_extends_base() {
        let output = generate_defs(TargetLanguage::Java, &pet_and_dog()).unwrap();
        let text = output.get("Dog").unwrap();
        assert!(text.contains("public class Dog extends Pet {\n"));
        assert!(text.contains("    private final String breed;\n"));
        assert!(!text.contains("private final String name;"));
        assert!(text.contains(
            "    public Dog(\n            String name,\n            String breed\n    ) {\n        super(name);\n        this.breed = breed;\n    }\n"
        ));
        assert!(text.contains(
            "        int hash = super.hashCode();\n        hash = 31 * hash + (breed != null ? breed.hashCode() : 0);\n"
        ));
    }

    #[test]
    fn rust_all_of_flattens_base_fields() {
        let output = generate_defs(TargetLanguage::Rust, &pet_and_dog()).unwrap();
        let text = output.get("dog").unwrap();
        assert!(text.contains("pub struct Dog {\n    name: String,\n    breed: Option<String>,\n}\n"));
        assert!(text.contains("    pub fn new(name: String, breed: Option<String>) -> Self {\n"));
    }

    #[test]
    fn all_of_copies_base_properties_it_narrows() {
        let document = json!({
            "$defs": {
                "Base": {
                    "type": "object",
                    "properties": { "id": { "type": "string" } }
                },
                "Derived": {
                    "required": ["id"],
                    "allOf": [
                        { "$ref": "#/$defs/Base" },
                        { "type": "object", "properties": { "note": { "type": "string" } } }
                    ]
                }
            }
        });
        let output = generate_defs(TargetLanguage::Kotlin, &document).unwrap();
        assert_eq!(
            body(&output.get("Derived").unwrap()),
            "package com.example\n\ndata class Derived(\n    val id: String,\n    val note: String? = null\n)\n"
        );
    }

    #[test]
    fn annotated_reference_reuses_referenced_class() {
        let document = json!({
            "$defs": {
                "Person": {
                    "type": "object",
                    "properties": { "name": { "type": "string" } }
                },
                "Team": {
                    "type": "object",
                    "properties": {
                        "lead": {
                            "description": "Team lead",
                            "allOf": [ { "$ref": "#/$defs/Person" } ]
                        },
                        "deputy": {
                            "description": "Stand-in",
                            "allOf": [ { "$ref": "#/$defs/Person" } ]
                        }
                    }
                }
            }
        });
        let output = generate_defs(TargetLanguage::Kotlin, &document).unwrap();
        assert_eq!(output.len(), 2);
        assert_eq!(
            body(&output.get("Team").unwrap()),
            "package com.example\n\ndata class Team(\n    val lead: Person? = null,\n    val deputy: Person? = null\n)\n"
        );
    }

    #[test]
    fn java_owner_named_property_nests_under_path_name() {
        let document = json!({
            "$defs": {
                "Order": {
                    "type": "object",
                    "properties": {
                        "order": {
                            "type": "object",
                            "properties": { "number": { "type": "string" } }
                        }
                    }
                }
            }
        });
        let output = generate_defs(TargetLanguage::Java, &document).unwrap();
        let text = output.get("Order").unwrap();
        assert!(text.contains("    private final Order.OrderOrder order;\n"));
        assert!(text.contains("    public static class OrderOrder {\n"));
    }

    #[test]
    fn fan_in_builds_one_class() {
        let document = json!({
            "$defs": {
                "Home": {
                    "type": "object",
                    "properties": { "address": { "$ref": "#/$defs/Address" } }
                },
                "Office": {
                    "type": "object",
                    "properties": { "address": { "$ref": "#/$defs/Address" } }
                },
                "Address": {
                    "type": "object",
                    "properties": { "street": { "type": "string" } }
                }
            }
        });
        let mut output = MemoryOutput::new();
        let files = generator(TargetLanguage::Kotlin)
            .generate_all(&document, "/$defs", &mut output)
            .unwrap();
        let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
        assert_eq!(names, vec!["Home", "Address", "Office"]);
        assert!(output.get("Office").unwrap().contains("val address: Address? = null"));
    }
}

mod errors {
    use super::*;

    #[test]
    fn unresolved_reference() {
        let schema = json!({
            "type": "object",
            "properties": { "owner": { "$ref": "#/$defs/Missing" } }
        });
        match generate_root(TargetLanguage::Kotlin, &schema) {
            Err(GenerateError::UnresolvedReference { pointer }) => {
                assert_eq!(pointer, "#/$defs/Missing")
            }
            other => panic!("expected unresolved reference, got {:?}", other.map(|o| o.len())),
        }
    }

    #[test]
    fn alias_cycle() {
        let document = json!({
            "$defs": {
                "A": { "$ref": "#/$defs/B" },
                "B": { "$ref": "#/$defs/A" }
            }
        });
        assert!(matches!(
            generate_defs(TargetLanguage::Java, &document),
            Err(GenerateError::CyclicReference { .. })
        ));
    }

    #[test]
    fn failed_run_writes_nothing() {
        let document = json!({
            "$defs": {
                "Fine": { "type": "object", "properties": { "a": { "type": "string" } } },
                "Broken": {
                    "type": "object",
                    "properties": { "b": { "type": "array" } }
                }
            }
        });
        let mut output = MemoryOutput::new();
        let result = generator(TargetLanguage::Kotlin).generate_all(&document, "/$defs", &mut output);
        match result {
            Err(GenerateError::UnsupportedSchemaConstruct { pointer, .. }) => {
                assert_eq!(pointer, "#/$defs/Broken/properties/b")
            }
            other => panic!("expected unsupported construct, got {:?}", other.map(|f| f.len())),
        }
        assert!(output.is_empty());
    }

    #[test]
    fn exit_codes() {
        let error = GenerateError::CyclicReference {
            pointer: "#/a".to_string(),
        };
        assert_eq!(error.exit_code(), 2);
    }
}

mod determinism {
    use super::*;

    fn document() -> Value {
        json!({
            "$defs": {
                "Order": {
                    "type": "object",
                    "required": ["id"],
                    "properties": {
                        "id": { "type": "string", "format": "uuid" },
                        "status": { "type": "string", "enum": ["open", "closed"] },
                        "lines": {
                            "type": "array",
                            "minItems": 1,
                            "items": {
                                "type": "object",
                                "properties": { "qty": { "type": "integer", "minimum": 1 } }
                            }
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn repeated_runs_are_identical() {
        for language in [TargetLanguage::Kotlin, TargetLanguage::Java, TargetLanguage::Rust] {
            let first = generate_defs(language, &document()).unwrap();
            let second = generate_defs(language, &document()).unwrap();
            assert_eq!(first.files(), second.files());
        }
    }

    #[test]
    fn concurrent_runs_do_not_interfere() {
        let document = document();
        let expected = generate_defs(TargetLanguage::Java, &document).unwrap();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| generate_defs(TargetLanguage::Java, &document).unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap().files(), expected.files());
            }
        });
    }

    #[test]
    fn shared_generator_across_threads() {
        let document = document();
        let shared = generator(TargetLanguage::Kotlin);
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..3)
                .map(|_| {
                    scope.spawn(|| {
                        let mut output = MemoryOutput::new();
                        shared.generate_all(&document, "/$defs", &mut output).unwrap();
                        output.get("Order").unwrap()
                    })
                })
                .collect();
            let texts: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            assert!(texts.windows(2).all(|pair| pair[0] == pair[1]));
            assert!(texts[0].contains("import java.util.UUID\n"));
        });
    }
}
