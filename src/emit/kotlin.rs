//! Kotlin backend.
//!
//! Value classes become `data class`es validated in an `init` block;
//! Classes extended through `oneOf` or `allOf` become `open class`es, and
//! `oneOf` variants are nested inside their base.

use std::collections::BTreeSet;

use super::{
    doc_block, enum_constants, field_idents, file_classes, float_literal, header, indent,
    join_lines, jvm_format_type, jvm_reference, jvm_value_imports, mentioned_types,
    push_sections, Emitter, HASH_MULTIPLIER,
};
use crate::constraints::{guards, Actual, Guard, Subject};
use crate::error::GenerateError;
use crate::model::{
    ClassGraph, ClassId, ClassKind, Constraint, DefaultValue, PrimitiveKind, Property,
    PropertyDefault, Type,
};
use crate::naming::enum_constant;
use crate::types::{GenerateOptions, TargetLanguage};

/// Renders Kotlin source files.
#[derive(Debug, Clone, Copy, Default)]
pub struct KotlinEmitter;

impl Emitter for KotlinEmitter {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::Kotlin
    }

    fn render(
        &self,
        graph: &ClassGraph,
        id: ClassId,
        options: &GenerateOptions,
    ) -> Result<String, GenerateError> {
        let class = &graph[id];
        let mut text = header(
            &format!("{}.kt", self.file_name(class)),
            options.header_comment.as_deref(),
        );
        if !class.package.is_empty() {
            text.push_str(&format!("package {}\n\n", class.package));
        }

        let mut imports = BTreeSet::new();
        jvm_value_imports(&mentioned_types(graph, &file_classes(graph, id)), &mut imports);
        if !imports.is_empty() {
            for import in &imports {
                text.push_str(&format!("import {}\n", import));
            }
            text.push('\n');
        }

        text.push_str(&join_lines(&class_lines(graph, id, 0)?));
        Ok(text)
    }
}

fn class_lines(graph: &ClassGraph, id: ClassId, level: usize) -> Result<Vec<String>, GenerateError> {
    let class = &graph[id];
    let qualified = graph.qualified_name(id);
    let pad = indent(level);
    let member = indent(level + 1);

    let own = field_idents(
        &qualified,
        class.properties.iter().map(|p| p.name.as_str()),
        TargetLanguage::Kotlin,
    )?;
    let inherited = graph.inherited_properties(id);
    let inherited_idents = field_idents(
        &qualified,
        inherited.iter().map(|p| p.name.as_str()),
        TargetLanguage::Kotlin,
    )?;

    let mut params = Vec::new();
    for (property, ident) in inherited.iter().zip(&inherited_idents) {
        params.push(format!(
            "{}{}: {}{}",
            member,
            ident,
            property_type(graph, id, property)?,
            default_suffix(graph, id, property)?
        ));
    }
    for (property, ident) in class.properties.iter().zip(&own) {
        params.push(format!(
            "{}val {}: {}{}",
            member,
            ident,
            property_type(graph, id, property)?,
            default_suffix(graph, id, property)?
        ));
    }

    let keyword = match class.kind {
        ClassKind::Plain | ClassKind::Variant => "class",
        ClassKind::Data => "data class",
        ClassKind::OpenBase => "open class",
    };
    let supertype = match class.base {
        Some(base) => format!(
            " : {}({})",
            jvm_reference(graph, id, base, None)?,
            inherited_idents.join(", ")
        ),
        None => String::new(),
    };

    let mut regexes = Vec::new();
    let mut sections = Vec::new();
    if let Some(init) = init_section(graph, id, &own, level + 1, &mut regexes) {
        sections.push(init);
    }
    if matches!(class.kind, ClassKind::OpenBase | ClassKind::Variant) {
        sections.push(equality_section(graph, id, &own, level + 1));
    }
    if !regexes.is_empty() {
        let mut companion = vec![format!("{}companion object {{", member)];
        for (index, pattern) in regexes.iter().enumerate() {
            companion.push(format!(
                "{}private val cg_regex{} = Regex(\"{}\")",
                indent(level + 2),
                index,
                escape(pattern)
            ));
        }
        companion.push(format!("{}}}", member));
        sections.push(companion);
    }
    for model in &class.enums {
        let constants = enum_constants(&qualified, model, TargetLanguage::Kotlin)?;
        let mut lines = vec![format!("{}enum class {}(val value: String) {{", member, model.name)];
        let count = constants.len();
        for (index, (constant, value)) in constants.iter().enumerate() {
            let separator = if index + 1 < count { "," } else { "" };
            lines.push(format!(
                "{}{}(\"{}\"){}",
                indent(level + 2),
                constant,
                escape(value),
                separator
            ));
        }
        lines.push(format!("{}}}", member));
        sections.push(lines);
    }
    for nested in &class.nested {
        sections.push(class_lines(graph, *nested, level + 1)?);
    }

    let mut lines = Vec::new();
    if let Some(description) = &class.description {
        lines.extend(doc_block(level, description));
    }
    let declaration = if params.is_empty() {
        format!("{}{} {}{}", pad, keyword, class.name, supertype)
    } else {
        lines.push(format!("{}{} {}(", pad, keyword, class.name));
        let count = params.len();
        for (index, param) in params.into_iter().enumerate() {
            lines.push(if index + 1 < count {
                format!("{},", param)
            } else {
                param
            });
        }
        format!("{}){}", pad, supertype)
    };
    if sections.is_empty() {
        lines.push(declaration);
    } else {
        lines.push(format!("{} {{", declaration));
        push_sections(&mut lines, sections);
        lines.push(format!("{}}}", pad));
    }
    Ok(lines)
}

/// `init` block running every guard of the class's own properties.
fn init_section(
    graph: &ClassGraph,
    id: ClassId,
    idents: &[String],
    level: usize,
    regexes: &mut Vec<String>,
) -> Option<Vec<String>> {
    let pad = indent(level);
    let body = indent(level + 1);
    let inner = indent(level + 2);
    let mut lines = Vec::new();

    for (property, ident) in graph[id].properties.iter().zip(idents) {
        // Nullability is carried by the type system.
        let property_guards: Vec<Guard> = guards(property)
            .into_iter()
            .filter(|guard| !guard.is_null_check())
            .collect();

        for guard in property_guards.iter().filter(|g| g.subject == Subject::Value) {
            let check = format!(
                "require({}) {{ {} }}",
                condition(guard, ident, &property.ty, regexes),
                message(guard, ident)
            );
            if guard.when_present {
                lines.push(format!("{}if ({} != null)", body, ident));
                lines.push(format!("{}{}", inner, check));
            } else {
                lines.push(format!("{}{}", body, check));
            }
        }

        let items: Vec<&Guard> = property_guards
            .iter()
            .filter(|g| g.subject == Subject::Item)
            .collect();
        if let (Some(first), Type::SequenceOf(element)) = (items.first(), &property.ty) {
            let call = if first.when_present { "?.forEach" } else { ".forEach" };
            lines.push(format!("{}{}{} {{", body, ident, call));
            for guard in &items {
                lines.push(format!(
                    "{}require({}) {{ {} }}",
                    inner,
                    condition(guard, "it", &element.ty, regexes),
                    message(guard, "it")
                ));
            }
            lines.push(format!("{}}}", body));
        }
    }

    if lines.is_empty() {
        return None;
    }
    let mut section = vec![format!("{}init {{", pad)];
    section.extend(lines);
    section.push(format!("{}}}", pad));
    Some(section)
}

/// `equals`/`hashCode` for open bases and variants; variants compare and
/// hash their base first.
fn equality_section(graph: &ClassGraph, id: ClassId, idents: &[String], level: usize) -> Vec<String> {
    let class = &graph[id];
    let pad = indent(level);
    let body = indent(level + 1);
    let continuation = indent(level + 2);
    let mut lines = Vec::new();

    let mut head = format!(
        "{}override fun equals(other: Any?): Boolean = this === other || other is {}",
        pad, class.name
    );
    if class.base.is_some() {
        head.push_str(" && super.equals(other)");
    }
    if idents.is_empty() {
        lines.push(head);
    } else {
        lines.push(format!("{} &&", head));
        let count = idents.len();
        for (index, ident) in idents.iter().enumerate() {
            let separator = if index + 1 < count { " &&" } else { "" };
            lines.push(format!("{}{} == other.{}{}", continuation, ident, ident, separator));
        }
    }
    lines.push(String::new());

    let mut hashes = Vec::new();
    if class.base.is_some() {
        hashes.push("super.hashCode()".to_string());
    }
    hashes.extend(idents.iter().map(|ident| format!("{}.hashCode()", ident)));
    match hashes.as_slice() {
        [] => lines.push(format!("{}override fun hashCode(): Int = 0", pad)),
        [single] => lines.push(format!("{}override fun hashCode(): Int = {}", pad, single)),
        [first, rest @ ..] => {
            lines.push(format!("{}override fun hashCode(): Int {{", pad));
            lines.push(format!("{}var hash = {}", body, first));
            for hash in rest {
                lines.push(format!("{}hash = {} * hash + {}", body, HASH_MULTIPLIER, hash));
            }
            lines.push(format!("{}return hash", body));
            lines.push(format!("{}}}", pad));
        }
    }
    lines
}

/// Expression that must hold for the guard to pass.
fn condition(guard: &Guard, subject: &str, ty: &Type, regexes: &mut Vec<String>) -> String {
    match &guard.constraint {
        Constraint::Required => format!("{} != null", subject),
        Constraint::Minimum(n) => format!("{} >= {}", subject, bound(ty, n)),
        Constraint::ExclusiveMinimum(n) => format!("{} > {}", subject, bound(ty, n)),
        Constraint::Maximum(n) => format!("{} <= {}", subject, bound(ty, n)),
        Constraint::ExclusiveMaximum(n) => format!("{} < {}", subject, bound(ty, n)),
        Constraint::MinLength(1) => format!("{}.isNotEmpty()", subject),
        Constraint::MinLength(n) => format!("{}.length >= {}", subject, n),
        Constraint::MaxLength(n) => format!("{}.length <= {}", subject, n),
        Constraint::Pattern(pattern) => {
            let index = match regexes.iter().position(|p| p == pattern) {
                Some(index) => index,
                None => {
                    regexes.push(pattern.clone());
                    regexes.len() - 1
                }
            };
            format!("cg_regex{}.containsMatchIn({})", index, subject)
        }
        Constraint::MinItems(n) => format!("{}.size >= {}", subject, n),
        Constraint::MaxItems(n) => format!("{}.size <= {}", subject, n),
        Constraint::UniqueItems => format!("{}.toSet().size == {}.size", subject, subject),
    }
}

fn bound(ty: &Type, n: &serde_json::Number) -> String {
    match ty {
        Type::Primitive(PrimitiveKind::Decimal, _) => format!("BigDecimal(\"{}\")", n),
        Type::Primitive(PrimitiveKind::Double, _) => float_literal(n),
        _ => n.to_string(),
    }
}

/// Failure message as a Kotlin string template.
fn message(guard: &Guard, subject: &str) -> String {
    let prefix = escape(&guard.message_prefix());
    let actual = match guard.actual() {
        Actual::None => return format!("\"{}\"", prefix),
        Actual::Value if subject.starts_with('`') => format!("${{{}}}", subject),
        Actual::Value => format!("${}", subject),
        Actual::Length => format!("${{{}.length}}", subject),
        Actual::Size => format!("${{{}.size}}", subject),
        Actual::Duplicates => format!("${{{}.size - {}.toSet().size}}", subject, subject),
    };
    format!("\"{} - {}\"", prefix, actual)
}

fn property_type(graph: &ClassGraph, from: ClassId, property: &Property) -> Result<String, GenerateError> {
    let name = type_name(graph, from, &property.ty)?;
    Ok(if property.nullable {
        format!("{}?", name)
    } else {
        name
    })
}

fn type_name(graph: &ClassGraph, from: ClassId, ty: &Type) -> Result<String, GenerateError> {
    Ok(match ty {
        Type::Primitive(PrimitiveKind::String, Some(format)) => jvm_format_type(*format).0.to_string(),
        Type::Primitive(kind, _) => match kind {
            PrimitiveKind::String => "String",
            PrimitiveKind::Int => "Int",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Decimal => "BigDecimal",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::Boolean => "Boolean",
        }
        .to_string(),
        Type::ClassRef(target) => jvm_reference(graph, from, *target, None)?,
        Type::SequenceOf(element) => format!("List<{}>", type_name(graph, from, &element.ty)?),
        Type::MapOf(key, value) => format!(
            "Map<{}, {}>",
            type_name(graph, from, key)?,
            type_name(graph, from, value)?
        ),
        Type::EnumOf { owner, name, .. } => jvm_reference(graph, from, *owner, Some(name))?,
    })
}

fn default_suffix(graph: &ClassGraph, from: ClassId, property: &Property) -> Result<String, GenerateError> {
    Ok(match &property.default {
        PropertyDefault::None => String::new(),
        PropertyDefault::Absent => " = null".to_string(),
        PropertyDefault::Value(value) => format!(" = {}", literal(graph, from, &property.ty, value)?),
    })
}

fn literal(graph: &ClassGraph, from: ClassId, ty: &Type, value: &DefaultValue) -> Result<String, GenerateError> {
    Ok(match (ty, value) {
        (Type::EnumOf { owner, name, .. }, DefaultValue::String(s)) => {
            let constant = enum_constant(s, TargetLanguage::Kotlin).ok_or_else(|| {
                GenerateError::target(&graph.qualified_name(from), format!("enum default \"{}\"", s))
            })?;
            format!("{}.{}", jvm_reference(graph, from, *owner, Some(name))?, constant)
        }
        (_, DefaultValue::String(s)) => format!("\"{}\"", escape(s)),
        (Type::Primitive(PrimitiveKind::Long, _), DefaultValue::Number(n)) => format!("{}L", n),
        (Type::Primitive(PrimitiveKind::Decimal, _), DefaultValue::Number(n)) => {
            format!("BigDecimal(\"{}\")", n)
        }
        (Type::Primitive(PrimitiveKind::Double, _), DefaultValue::Number(n)) => float_literal(n),
        (_, DefaultValue::Number(n)) => n.to_string(),
        (_, DefaultValue::Boolean(b)) => b.to_string(),
    })
}

/// Escape for a Kotlin string literal, where `$` starts a template.
fn escape(s: &str) -> String {
    super::escape_string(s).replace('$', "\\$")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ClassModelBuilder;
    use serde_json::json;

    fn render(schema: serde_json::Value) -> String {
        let mut builder = ClassModelBuilder::new(&schema, "com.example");
        let id = builder.build_root("Root").unwrap();
        let graph = builder.finish();
        let text = KotlinEmitter
            .render(&graph, id, &GenerateOptions::default())
            .unwrap();
        text.split(" */\n\n").nth(1).unwrap().to_string()
    }

    #[test]
    fn empty_class() {
        let text = render(json!({ "title": "TestEmpty", "type": "object" }));
        assert_eq!(text, "package com.example\n\nclass TestEmpty\n");
    }

    #[test]
    fn nullable_guards_and_templates() {
        let text = render(json!({
            "title": "Item",
            "type": "object",
            "properties": {
                "code": { "type": "string", "pattern": "^[A-Z]{2}$" },
                "price": { "type": "number", "exclusiveMinimum": 0 },
                "tags": { "type": "array", "items": { "type": "string", "minLength": 1 } }
            }
        }));
        assert_eq!(
            text,
            r#"package com.example

import java.math.BigDecimal

data class Item(
    val code: String? = null,
    val price: BigDecimal? = null,
    val tags: List<String>? = null
) {

    init {
        if (code != null)
            require(cg_regex0.containsMatchIn(code)) { "code does not match pattern ^[A-Z]{2}\$ - $code" }
        if (price != null)
            require(price > BigDecimal("0")) { "price <= exclusiveMinimum 0 - $price" }
        tags?.forEach {
            require(it.isNotEmpty()) { "tags item length < minimum 1 - ${it.length}" }
        }
    }

    companion object {
        private val cg_regex0 = Regex("^[A-Z]{2}\$")
    }

}
"#
        );
    }

    #[test]
    fn unique_items_report_duplicate_count() {
        let text = render(json!({
            "title": "Batch",
            "type": "object",
            "properties": {
                "codes": { "type": "array", "uniqueItems": true, "items": { "type": "string" } }
            }
        }));
        assert!(text.contains(
            "        if (codes != null)\n            require(codes.toSet().size == codes.size) { \"codes contains duplicate items - ${codes.size - codes.toSet().size}\" }\n"
        ));
    }

    #[test]
    fn enums_and_defaults() {
        let text = render(json!({
            "title": "Account",
            "type": "object",
            "properties": {
                "status": { "type": "string", "enum": ["active", "on-hold"], "default": "active" },
                "limit": { "type": "integer", "format": "int64", "default": 100 },
                "class": { "type": "boolean" }
            }
        }));
        assert_eq!(
            text,
            r#"package com.example

data class Account(
    val status: Status = Status.ACTIVE,
    val limit: Long = 100L,
    val `class`: Boolean? = null
) {

    enum class Status(val value: String) {
        ACTIVE("active"),
        ON_HOLD("on-hold")
    }

}
"#
        );
    }
}
