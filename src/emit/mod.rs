//! Emission engine.
//!
//! Each target language has a backend implementing [`Emitter`]. A backend
//! renders one file per top-level class: the header block, then the class
//! with everything nested in it. Rendering is a pure function of the graph
//! and the options.

mod java;
mod kotlin;
mod rust;

use std::collections::BTreeSet;

use serde_json::Number;

use crate::error::GenerateError;
use crate::model::{
    ClassGraph, ClassId, ClassModel, EnumModel, PrimitiveKind, Property, StringFormat, Type,
};
use crate::naming::{enum_constant, field_ident};
use crate::types::{GenerateOptions, TargetLanguage};

pub use java::JavaEmitter;
pub use kotlin::KotlinEmitter;
pub use rust::RustEmitter;

/// Multiplier of the order-dependent hash combination
/// `hash = 31 * hash + fieldHash`.
pub(crate) const HASH_MULTIPLIER: u32 = 31;

/// A code generation backend.
pub trait Emitter: Send + Sync {
    fn language(&self) -> TargetLanguage;

    /// File base name (without suffix) for a top-level class.
    fn file_name(&self, class: &ClassModel) -> String {
        class.name.clone()
    }

    /// Render the file holding top-level class `id`, header included.
    ///
    /// # Errors
    ///
    /// Returns `GenerateError::UnsupportedTargetConstruct` when the class
    /// uses something the language cannot express.
    fn render(
        &self,
        graph: &ClassGraph,
        id: ClassId,
        options: &GenerateOptions,
    ) -> Result<String, GenerateError>;
}

/// The backend for a target language.
pub fn emitter_for(language: TargetLanguage) -> Box<dyn Emitter> {
    match language {
        TargetLanguage::Kotlin => Box::new(KotlinEmitter),
        TargetLanguage::Java => Box::new(JavaEmitter),
        TargetLanguage::Rust => Box::new(RustEmitter),
    }
}

/// The fixed comment block every generated file starts with.
pub fn header(file_name: &str, comment: Option<&str>) -> String {
    let mut text = String::from("/*\n");
    text.push_str(&format!(" * {}\n", file_name));
    text.push_str(" *\n");
    text.push_str(" * This code was generated by schema-codegen - JSON Schema Code Generator\n");
    if let Some(comment) = comment {
        for line in comment.lines() {
            let line = format!(" * {}", line.replace("*/", "* /"));
            text.push_str(line.trim_end());
            text.push('\n');
        }
    }
    text.push_str(" *\n");
    text.push_str(
        " * It is not advisable to modify generated code as any modifications will be lost\n",
    );
    text.push_str(" * when the generation process is re-run.\n");
    text.push_str(" */\n\n");
    text
}

pub(crate) fn indent(level: usize) -> String {
    "    ".repeat(level)
}

/// Append class body sections, each preceded by a blank line, plus the
/// blank line before the closing brace.
pub(crate) fn push_sections(out: &mut Vec<String>, sections: Vec<Vec<String>>) {
    for section in sections {
        out.push(String::new());
        out.extend(section);
    }
    out.push(String::new());
}

pub(crate) fn join_lines(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// `id` followed by every class nested in it, depth first.
pub(crate) fn file_classes(graph: &ClassGraph, id: ClassId) -> Vec<ClassId> {
    let mut result = vec![id];
    for nested in &graph[id].nested {
        result.extend(file_classes(graph, *nested));
    }
    result
}

/// Properties stored as fields of class `id`. A language without
/// inheritance stores the base chain's properties too, root-most first.
pub(crate) fn declared_properties(
    graph: &ClassGraph,
    id: ClassId,
    language: TargetLanguage,
) -> Vec<&Property> {
    let mut properties = if language.supports_inheritance() {
        Vec::new()
    } else {
        graph.inherited_properties(id)
    };
    properties.extend(graph[id].properties.iter());
    properties
}

/// Every type mentioned by the properties of the given classes, element and
/// value types included.
pub(crate) fn mentioned_types<'g>(graph: &'g ClassGraph, classes: &[ClassId]) -> Vec<&'g Type> {
    fn walk<'g>(ty: &'g Type, out: &mut Vec<&'g Type>) {
        out.push(ty);
        match ty {
            Type::SequenceOf(element) => walk(&element.ty, out),
            Type::MapOf(key, value) => {
                walk(key, out);
                walk(value, out);
            }
            _ => {}
        }
    }
    let mut out = Vec::new();
    for id in classes {
        for property in &graph[*id].properties {
            walk(&property.ty, &mut out);
        }
    }
    out
}

/// JVM class and import for a string format.
pub(crate) fn jvm_format_type(format: StringFormat) -> (&'static str, &'static str) {
    match format {
        StringFormat::DateTime => ("OffsetDateTime", "java.time.OffsetDateTime"),
        StringFormat::Date => ("LocalDate", "java.time.LocalDate"),
        StringFormat::Time => ("LocalTime", "java.time.LocalTime"),
        StringFormat::Uuid => ("UUID", "java.util.UUID"),
        StringFormat::Uri => ("URI", "java.net.URI"),
    }
}

/// Imports needed by JVM files for formats and decimals.
pub(crate) fn jvm_value_imports(types: &[&Type], imports: &mut BTreeSet<&'static str>) {
    for ty in types {
        match ty {
            Type::Primitive(PrimitiveKind::Decimal, _) => {
                imports.insert("java.math.BigDecimal");
            }
            Type::Primitive(_, Some(format)) => {
                imports.insert(jvm_format_type(*format).1);
            }
            _ => {}
        }
    }
}

/// Name of `target` (optionally a member enum of it) as written inside
/// class `from` on a JVM target.
///
/// Names are qualified from the package root. When a type nested in `from`
/// or one of its enclosing classes shadows the first segment, the package
/// name is prepended.
pub(crate) fn jvm_reference(
    graph: &ClassGraph,
    from: ClassId,
    target: ClassId,
    member: Option<&str>,
) -> Result<String, GenerateError> {
    if target == from {
        return Ok(member.map_or_else(|| graph[from].name.clone(), str::to_string));
    }
    let mut name = graph.qualified_name(target);
    if let Some(member) = member {
        name = format!("{}.{}", name, member);
    }

    let outermost = graph.outermost(target);
    let head = graph[outermost].name.as_str();
    let mut scopes = graph.enclosing_chain(from);
    scopes.push(from);
    let shadowed = scopes.iter().any(|scope| {
        let class = &graph[*scope];
        (class.name == head && class.id != outermost)
            || class.nested.iter().any(|n| graph[*n].name == head)
            || class.enums.iter().any(|e| e.name == head)
    });
    if !shadowed {
        return Ok(name);
    }
    let package = &graph[target].package;
    if package.is_empty() {
        return Err(GenerateError::target(
            &graph.qualified_name(from),
            format!("reference to {} shadowed by a nested type", name),
        ));
    }
    Ok(format!("{}.{}", package, name))
}

/// Enum constants paired with their string values.
pub(crate) fn enum_constants(
    class: &str,
    model: &EnumModel,
    language: TargetLanguage,
) -> Result<Vec<(String, String)>, GenerateError> {
    let mut seen = BTreeSet::new();
    let mut constants = Vec::with_capacity(model.values.len());
    for value in &model.values {
        let constant = enum_constant(value, language)
            .filter(|constant| seen.insert(constant.clone()))
            .ok_or_else(|| {
                GenerateError::target(
                    class,
                    format!("enum {} value \"{}\" as a constant", model.name, value),
                )
            })?;
        constants.push((constant, value.clone()));
    }
    Ok(constants)
}

/// Field identifiers for a list of property names, rejecting names that
/// collapse onto the same identifier.
pub(crate) fn field_idents<'p>(
    class: &str,
    names: impl IntoIterator<Item = &'p str>,
    language: TargetLanguage,
) -> Result<Vec<String>, GenerateError> {
    let mut seen = BTreeSet::new();
    let mut idents = Vec::new();
    for name in names {
        let ident = field_ident(name, language);
        if !seen.insert(ident.clone()) {
            return Err(GenerateError::target(
                class,
                format!("property {} as a distinct field {}", name, ident),
            ));
        }
        idents.push(ident);
    }
    Ok(idents)
}

pub(crate) fn is_integral(n: &Number) -> bool {
    n.is_i64() || n.is_u64()
}

/// A floating point literal for `n`.
pub(crate) fn float_literal(n: &Number) -> String {
    if is_integral(n) {
        format!("{}.0", n)
    } else {
        n.to_string()
    }
}

/// Escape text for a double-quoted JVM or Rust string literal.
pub(crate) fn escape_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Doc comment block in `/** ... */` form.
pub(crate) fn doc_block(level: usize, description: &str) -> Vec<String> {
    let pad = indent(level);
    let mut lines = vec![format!("{}/**", pad)];
    for line in description.lines() {
        let line = format!("{} * {}", pad, line.replace("*/", "* /"));
        lines.push(line.trim_end().to_string());
    }
    lines.push(format!("{} */", pad));
    lines
}
