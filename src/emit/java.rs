//! Java backend.
//!
//! Classes are immutable: final fields, a validating constructor, getters,
//! and value-based `equals`/`hashCode`. Nested types are `static`.

use std::collections::BTreeSet;

use super::{
    declared_properties, doc_block, enum_constants, field_idents, file_classes, float_literal,
    header, indent, is_integral, join_lines, jvm_format_type, jvm_reference, jvm_value_imports,
    mentioned_types, push_sections, Emitter, HASH_MULTIPLIER,
};
use crate::constraints::{guards, Actual, Guard, Subject};
use crate::error::GenerateError;
use crate::model::{
    ClassGraph, ClassId, ClassKind, Constraint, DefaultValue, EnumModel, PrimitiveKind, Property,
    PropertyDefault, Type,
};
use crate::naming::{enum_constant, field_name};
use crate::types::{GenerateOptions, TargetLanguage};

/// Renders Java source files.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaEmitter;

impl Emitter for JavaEmitter {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::Java
    }

    fn render(
        &self,
        graph: &ClassGraph,
        id: ClassId,
        options: &GenerateOptions,
    ) -> Result<String, GenerateError> {
        let class = &graph[id];
        let mut text = header(
            &format!("{}.java", self.file_name(class)),
            options.header_comment.as_deref(),
        );
        if !class.package.is_empty() {
            text.push_str(&format!("package {};\n\n", class.package));
        }

        let classes = file_classes(graph, id);
        let imports = imports(graph, &classes);
        if !imports.is_empty() {
            for import in &imports {
                text.push_str(&format!("import {};\n", import));
            }
            text.push('\n');
        }

        text.push_str(&join_lines(&class_lines(graph, id, 0)?));
        Ok(text)
    }
}

fn imports(graph: &ClassGraph, classes: &[ClassId]) -> BTreeSet<&'static str> {
    let mut imports = BTreeSet::new();
    let types = mentioned_types(graph, classes);
    jvm_value_imports(&types, &mut imports);
    for ty in &types {
        match ty {
            Type::SequenceOf(_) => {
                imports.insert("java.util.List");
            }
            Type::MapOf(..) => {
                imports.insert("java.util.Map");
            }
            _ => {}
        }
    }
    for guard in classes
        .iter()
        .flat_map(|id| graph[*id].properties.iter())
        .flat_map(guards)
    {
        match guard.constraint {
            Constraint::UniqueItems => {
                imports.insert("java.util.HashSet");
            }
            Constraint::Pattern(_) => {
                imports.insert("java.util.regex.Pattern");
            }
            _ => {}
        }
    }
    imports
}

fn class_lines(graph: &ClassGraph, id: ClassId, level: usize) -> Result<Vec<String>, GenerateError> {
    let class = &graph[id];
    let qualified = graph.qualified_name(id);
    let pad = indent(level);
    let member = indent(level + 1);

    let own = field_idents(
        &qualified,
        class.properties.iter().map(|p| p.name.as_str()),
        TargetLanguage::Java,
    )?;
    let inherited = graph.inherited_properties(id);
    let inherited_idents = field_idents(
        &qualified,
        inherited.iter().map(|p| p.name.as_str()),
        TargetLanguage::Java,
    )?;

    let mut regexes = Vec::new();
    let constructor = constructor_section(graph, id, &own, &inherited_idents, level + 1, &mut regexes)?;

    let mut sections = Vec::new();
    if !regexes.is_empty() {
        sections.push(
            regexes
                .iter()
                .enumerate()
                .map(|(index, pattern)| {
                    format!(
                        "{}private static final Pattern cg_regex{} = Pattern.compile(\"{}\");",
                        member,
                        index,
                        super::escape_string(pattern)
                    )
                })
                .collect(),
        );
    }
    let declared = declared_properties(graph, id, TargetLanguage::Java);
    if !declared.is_empty() {
        let mut fields = Vec::new();
        for (property, ident) in declared.iter().zip(&own) {
            fields.push(format!(
                "{}private final {} {};",
                member,
                type_name(graph, id, &property.ty, property.nullable)?,
                ident
            ));
        }
        sections.push(fields);
    }
    sections.extend(constructor);
    for (property, ident) in class.properties.iter().zip(&own) {
        sections.push(vec![
            format!(
                "{}public {} {}() {{",
                member,
                type_name(graph, id, &property.ty, property.nullable)?,
                getter_name(&qualified, property)?
            ),
            format!("{}return {};", indent(level + 2), ident),
            format!("{}}}", member),
        ]);
    }
    if class.kind != ClassKind::Plain {
        sections.push(equals_section(graph, id, &own, level + 1));
        sections.push(hash_code_section(graph, id, &own, level + 1));
    }
    for model in &class.enums {
        sections.push(enum_lines(&qualified, model, level + 1)?);
    }
    for nested in &class.nested {
        sections.push(class_lines(graph, *nested, level + 1)?);
    }

    let mut lines = Vec::new();
    if let Some(description) = &class.description {
        lines.extend(doc_block(level, description));
    }
    let modifiers = if class.is_top_level() {
        "public class"
    } else {
        "public static class"
    };
    let extends = match class.base {
        Some(base) => format!(" extends {}", jvm_reference(graph, id, base, None)?),
        None => String::new(),
    };
    lines.push(format!("{}{} {}{} {{", pad, modifiers, class.name, extends));
    push_sections(&mut lines, sections);
    lines.push(format!("{}}}", pad));
    Ok(lines)
}

/// Constructor taking inherited then own properties. Classes without
/// parameters keep the implicit default constructor.
fn constructor_section(
    graph: &ClassGraph,
    id: ClassId,
    own: &[String],
    inherited_idents: &[String],
    level: usize,
    regexes: &mut Vec<String>,
) -> Result<Option<Vec<String>>, GenerateError> {
    let class = &graph[id];
    let inherited = graph.inherited_properties(id);
    if inherited.is_empty() && class.properties.is_empty() {
        return Ok(None);
    }

    let pad = indent(level);
    let body = indent(level + 1);
    let mut params = Vec::new();
    for (property, ident) in inherited.iter().zip(inherited_idents) {
        params.push((parameter_type(graph, id, property)?, ident));
    }
    for (property, ident) in class.properties.iter().zip(own) {
        params.push((parameter_type(graph, id, property)?, ident));
    }

    let mut lines = vec![format!("{}public {}(", pad, class.name)];
    let count = params.len();
    for (index, (ty, ident)) in params.iter().enumerate() {
        let separator = if index + 1 < count { "," } else { "" };
        lines.push(format!("{}{} {}{}", indent(level + 2), ty, ident, separator));
    }
    lines.push(format!("{}) {{", pad));

    if class.base.is_some() {
        lines.push(format!("{}super({});", body, inherited_idents.join(", ")));
    }
    for (property, ident) in class.properties.iter().zip(own) {
        lines.extend(guard_lines(property, ident, level + 1, regexes));
        match &property.default {
            PropertyDefault::Value(value) => lines.push(format!(
                "{}this.{} = {} != null ? {} : {};",
                body,
                ident,
                ident,
                ident,
                literal(graph, id, &property.ty, value)?
            )),
            _ => lines.push(format!("{}this.{} = {};", body, ident, ident)),
        }
    }
    lines.push(format!("{}}}", pad));
    Ok(Some(lines))
}

fn guard_lines(property: &Property, ident: &str, level: usize, regexes: &mut Vec<String>) -> Vec<String> {
    let pad = indent(level);
    // Defaulted parameters are boxed and may be null until the default applies.
    let optional = property.nullable || property.has_default();
    let presence = if optional {
        format!("{} != null && ", ident)
    } else {
        String::new()
    };

    let property_guards = guards(property);
    let mut lines = Vec::new();
    for guard in property_guards.iter().filter(|g| g.subject == Subject::Value) {
        let check = if guard.is_null_check() {
            if is_primitive(&property.ty) {
                continue;
            }
            format!("{} == null", ident)
        } else {
            format!("{}{}", presence, failure(guard, ident, &property.ty, regexes))
        };
        lines.push(format!("{}if ({})", pad, check));
        lines.push(format!(
            "{}throw new IllegalArgumentException({});",
            indent(level + 1),
            message(guard, ident)
        ));
    }

    let items: Vec<&Guard> = property_guards
        .iter()
        .filter(|g| g.subject == Subject::Item)
        .collect();
    if let (false, Type::SequenceOf(element)) = (items.is_empty(), &property.ty) {
        let mut depth = level;
        if optional {
            lines.push(format!("{}if ({} != null) {{", pad, ident));
            depth += 1;
        }
        let element_type = simple_element_type(&element.ty);
        lines.push(format!(
            "{}for ({} cg_item : {}) {{",
            indent(depth),
            element_type,
            ident
        ));
        for guard in items {
            lines.push(format!(
                "{}if ({})",
                indent(depth + 1),
                failure(guard, "cg_item", &element.ty, regexes)
            ));
            lines.push(format!(
                "{}throw new IllegalArgumentException({});",
                indent(depth + 2),
                message(guard, "cg_item")
            ));
        }
        lines.push(format!("{}}}", indent(depth)));
        if optional {
            lines.push(format!("{}}}", pad));
        }
    }
    lines
}

/// Element type of a guarded sequence. Only primitives carry element
/// constraints, so no class lookup is needed.
fn simple_element_type(ty: &Type) -> &'static str {
    match ty {
        Type::Primitive(PrimitiveKind::Int, _) => "Integer",
        Type::Primitive(PrimitiveKind::Long, _) => "Long",
        Type::Primitive(PrimitiveKind::Decimal, _) => "BigDecimal",
        Type::Primitive(PrimitiveKind::Double, _) => "Double",
        Type::Primitive(PrimitiveKind::Boolean, _) => "Boolean",
        _ => "String",
    }
}

/// Expression that is true when the guard fails.
fn failure(guard: &Guard, subject: &str, ty: &Type, regexes: &mut Vec<String>) -> String {
    let compare = |operator: &str, n: &serde_json::Number| match ty {
        Type::Primitive(PrimitiveKind::Decimal, _) => {
            format!("{}.compareTo(new BigDecimal(\"{}\")) {} 0", subject, n, operator)
        }
        _ => format!("{} {} {}", subject, operator, bound(ty, n)),
    };
    match &guard.constraint {
        Constraint::Required => format!("{} == null", subject),
        Constraint::Minimum(n) => compare("<", n),
        Constraint::ExclusiveMinimum(n) => compare("<=", n),
        Constraint::Maximum(n) => compare(">", n),
        Constraint::ExclusiveMaximum(n) => compare(">=", n),
        Constraint::MinLength(1) => format!("{}.isEmpty()", subject),
        Constraint::MinLength(n) => format!("{}.length() < {}", subject, n),
        Constraint::MaxLength(n) => format!("{}.length() > {}", subject, n),
        Constraint::Pattern(pattern) => {
            let index = match regexes.iter().position(|p| p == pattern) {
                Some(index) => index,
                None => {
                    regexes.push(pattern.clone());
                    regexes.len() - 1
                }
            };
            format!("!cg_regex{}.matcher({}).find()", index, subject)
        }
        Constraint::MinItems(n) => format!("{}.size() < {}", subject, n),
        Constraint::MaxItems(n) => format!("{}.size() > {}", subject, n),
        Constraint::UniqueItems => format!("new HashSet<>({}).size() < {}.size()", subject, subject),
    }
}

fn bound(ty: &Type, n: &serde_json::Number) -> String {
    match ty {
        Type::Primitive(PrimitiveKind::Long, _) if is_integral(n) => format!("{}L", n),
        Type::Primitive(PrimitiveKind::Double, _) => float_literal(n),
        _ => n.to_string(),
    }
}

fn message(guard: &Guard, subject: &str) -> String {
    let prefix = super::escape_string(&guard.message_prefix());
    match guard.actual() {
        Actual::None => format!("\"{}\"", prefix),
        Actual::Value => format!("\"{} - \" + {}", prefix, subject),
        Actual::Length => format!("\"{} - \" + {}.length()", prefix, subject),
        Actual::Size => format!("\"{} - \" + {}.size()", prefix, subject),
        Actual::Duplicates => format!(
            "\"{} - \" + ({}.size() - new HashSet<>({}).size())",
            prefix, subject, subject
        ),
    }
}

fn equals_section(graph: &ClassGraph, id: ClassId, idents: &[String], level: usize) -> Vec<String> {
    let class = &graph[id];
    let pad = indent(level);
    let body = indent(level + 1);
    let inner = indent(level + 2);
    let mut lines = vec![
        format!("{}@Override", pad),
        format!("{}public boolean equals(Object other) {{", pad),
        format!("{}if (this == other)", body),
        format!("{}return true;", inner),
        format!("{}if (!(other instanceof {}))", body, class.name),
        format!("{}return false;", inner),
    ];
    if class.base.is_some() {
        lines.push(format!("{}if (!super.equals(other))", body));
        lines.push(format!("{}return false;", inner));
    }
    if idents.is_empty() {
        lines.push(format!("{}return true;", body));
    } else {
        lines.push(format!("{}{} typedOther = ({})other;", body, class.name, class.name));
        let count = idents.len();
        for (index, (property, ident)) in class.properties.iter().zip(idents).enumerate() {
            let (equal, different) = comparison(property, ident);
            if index + 1 < count {
                lines.push(format!("{}if ({})", body, different));
                lines.push(format!("{}return false;", inner));
            } else {
                lines.push(format!("{}return {};", body, equal));
            }
        }
    }
    lines.push(format!("{}}}", pad));
    lines
}

/// Equality and inequality expressions for one field against `typedOther`.
fn comparison(property: &Property, ident: &str) -> (String, String) {
    let other = format!("typedOther.{}", ident);
    if property.nullable {
        let equal = format!("{} == null ? {} == null : {}.equals({})", ident, other, ident, other);
        let different = format!("!({})", equal);
        return (equal, different);
    }
    match &property.ty {
        Type::Primitive(PrimitiveKind::Double, _) => (
            format!("Double.compare({}, {}) == 0", ident, other),
            format!("Double.compare({}, {}) != 0", ident, other),
        ),
        ty if is_primitive(ty) => (
            format!("{} == {}", ident, other),
            format!("{} != {}", ident, other),
        ),
        _ => (
            format!("{}.equals({})", ident, other),
            format!("!{}.equals({})", ident, other),
        ),
    }
}

fn hash_code_section(graph: &ClassGraph, id: ClassId, idents: &[String], level: usize) -> Vec<String> {
    let class = &graph[id];
    let pad = indent(level);
    let body = indent(level + 1);

    let mut hashes = Vec::new();
    if class.base.is_some() {
        hashes.push("super.hashCode()".to_string());
    }
    for (property, ident) in class.properties.iter().zip(idents) {
        hashes.push(if property.nullable {
            format!("({} != null ? {}.hashCode() : 0)", ident, ident)
        } else {
            match &property.ty {
                Type::Primitive(PrimitiveKind::Int, _) => ident.clone(),
                Type::Primitive(PrimitiveKind::Long, _) => format!("Long.hashCode({})", ident),
                Type::Primitive(PrimitiveKind::Double, _) => format!("Double.hashCode({})", ident),
                Type::Primitive(PrimitiveKind::Boolean, _) => format!("Boolean.hashCode({})", ident),
                _ => format!("{}.hashCode()", ident),
            }
        });
    }

    let mut lines = vec![
        format!("{}@Override", pad),
        format!("{}public int hashCode() {{", pad),
    ];
    match hashes.as_slice() {
        [] => lines.push(format!("{}return 0;", body)),
        [single] => lines.push(format!("{}return {};", body, single)),
        [first, rest @ ..] => {
            lines.push(format!("{}int hash = {};", body, first));
            for hash in rest {
                lines.push(format!("{}hash = {} * hash + {};", body, HASH_MULTIPLIER, hash));
            }
            lines.push(format!("{}return hash;", body));
        }
    }
    lines.push(format!("{}}}", pad));
    lines
}

fn enum_lines(class: &str, model: &EnumModel, level: usize) -> Result<Vec<String>, GenerateError> {
    let pad = indent(level);
    let body = indent(level + 1);
    let constants = enum_constants(class, model, TargetLanguage::Java)?;

    let mut lines = vec![format!("{}public enum {} {{", pad, model.name)];
    let count = constants.len();
    for (index, (constant, value)) in constants.iter().enumerate() {
        let separator = if index + 1 < count { "," } else { ";" };
        lines.push(format!(
            "{}{}(\"{}\"){}",
            body,
            constant,
            super::escape_string(value),
            separator
        ));
    }
    lines.push(String::new());
    lines.push(format!("{}private final String value;", body));
    lines.push(String::new());
    lines.push(format!("{}{}(String value) {{", body, model.name));
    lines.push(format!("{}this.value = value;", indent(level + 2)));
    lines.push(format!("{}}}", body));
    lines.push(String::new());
    lines.push(format!("{}public String getValue() {{", body));
    lines.push(format!("{}return value;", indent(level + 2)));
    lines.push(format!("{}}}", body));
    lines.push(String::new());
    lines.push(format!("{}}}", pad));
    Ok(lines)
}

fn getter_name(class: &str, property: &Property) -> Result<String, GenerateError> {
    let field = field_name(&property.name);
    let mut chars = field.chars();
    let getter = match chars.next() {
        Some(first) => format!("get{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => "get".to_string(),
    };
    if getter == "getClass" || getter == "get" {
        return Err(GenerateError::target(
            class,
            format!("property {} as a getter", property.name),
        ));
    }
    Ok(getter)
}

/// Whether the non-null form of `ty` is a Java primitive.
fn is_primitive(ty: &Type) -> bool {
    matches!(
        ty,
        Type::Primitive(
            PrimitiveKind::Int | PrimitiveKind::Long | PrimitiveKind::Double | PrimitiveKind::Boolean,
            _
        )
    )
}

fn parameter_type(graph: &ClassGraph, from: ClassId, property: &Property) -> Result<String, GenerateError> {
    type_name(graph, from, &property.ty, property.nullable || property.has_default())
}

fn type_name(graph: &ClassGraph, from: ClassId, ty: &Type, boxed: bool) -> Result<String, GenerateError> {
    Ok(match ty {
        Type::Primitive(PrimitiveKind::String, Some(format)) => jvm_format_type(*format).0.to_string(),
        Type::Primitive(kind, _) => match (kind, boxed) {
            (PrimitiveKind::String, _) => "String",
            (PrimitiveKind::Decimal, _) => "BigDecimal",
            (PrimitiveKind::Int, true) => "Integer",
            (PrimitiveKind::Int, false) => "int",
            (PrimitiveKind::Long, true) => "Long",
            (PrimitiveKind::Long, false) => "long",
            (PrimitiveKind::Double, true) => "Double",
            (PrimitiveKind::Double, false) => "double",
            (PrimitiveKind::Boolean, true) => "Boolean",
            (PrimitiveKind::Boolean, false) => "boolean",
        }
        .to_string(),
        Type::ClassRef(target) => jvm_reference(graph, from, *target, None)?,
        Type::SequenceOf(element) => format!("List<{}>", type_name(graph, from, &element.ty, true)?),
        Type::MapOf(key, value) => format!(
            "Map<{}, {}>",
            type_name(graph, from, key, true)?,
            type_name(graph, from, value, true)?
        ),
        Type::EnumOf { owner, name, .. } => jvm_reference(graph, from, *owner, Some(name))?,
    })
}

fn literal(graph: &ClassGraph, from: ClassId, ty: &Type, value: &DefaultValue) -> Result<String, GenerateError> {
    Ok(match (ty, value) {
        (Type::EnumOf { owner, name, .. }, DefaultValue::String(s)) => {
            let constant = enum_constant(s, TargetLanguage::Java).ok_or_else(|| {
                GenerateError::target(&graph.qualified_name(from), format!("enum default \"{}\"", s))
            })?;
            format!("{}.{}", jvm_reference(graph, from, *owner, Some(name))?, constant)
        }
        (_, DefaultValue::String(s)) => format!("\"{}\"", super::escape_string(s)),
        (Type::Primitive(PrimitiveKind::Long, _), DefaultValue::Number(n)) => format!("{}L", n),
        (Type::Primitive(PrimitiveKind::Decimal, _), DefaultValue::Number(n)) => {
            format!("new BigDecimal(\"{}\")", n)
        }
        (Type::Primitive(PrimitiveKind::Double, _), DefaultValue::Number(n)) => float_literal(n),
        (_, DefaultValue::Number(n)) => n.to_string(),
        (_, DefaultValue::Boolean(b)) => b.to_string(),
    })
}
