//! Rust backend.
//!
//! Each top-level class becomes a module file holding a struct with private
//! fields, a validating `new` constructor and getters. Nested classes and
//! enums live in a child module named after their owner. Rust has no class
//! inheritance, so variants carry the fields of their bases.
//!
//! Generated files are meant to be sibling modules of one parent module;
//! references between files go through `super::`.

use std::collections::HashSet;

use super::{
    declared_properties, enum_constants, field_idents, float_literal, header, indent, is_integral,
    join_lines, Emitter,
};
use crate::constraints::{guards, Actual, Guard, Subject};
use crate::error::GenerateError;
use crate::model::{
    ClassGraph, ClassId, ClassModel, Constraint, DefaultValue, EnumModel, PrimitiveKind, Property,
    PropertyDefault, Type,
};
use crate::naming::{enum_constant, module_name};
use crate::types::{GenerateOptions, TargetLanguage};

/// Longest `fn new` signature kept on one line.
const MAX_SIGNATURE_WIDTH: usize = 100;

/// Renders Rust source files.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustEmitter;

impl Emitter for RustEmitter {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::Rust
    }

    fn file_name(&self, class: &ClassModel) -> String {
        module_name(&class.name)
    }

    fn render(
        &self,
        graph: &ClassGraph,
        id: ClassId,
        options: &GenerateOptions,
    ) -> Result<String, GenerateError> {
        let mut text = header(
            &format!("{}.rs", self.file_name(&graph[id])),
            options.header_comment.as_deref(),
        );
        text.push_str(&join_lines(&class_items(graph, id, 0)?));
        Ok(text)
    }
}

/// Struct, impl and child module of one class.
fn class_items(graph: &ClassGraph, id: ClassId, level: usize) -> Result<Vec<String>, GenerateError> {
    let class = &graph[id];
    let qualified = graph.qualified_name(id);
    let pad = indent(level);
    let member = indent(level + 1);

    let properties = fields(graph, id);
    let idents = field_idents(
        &qualified,
        properties.iter().map(|p| p.name.as_str()),
        TargetLanguage::Rust,
    )?;

    let mut lines = Vec::new();
    if let Some(description) = &class.description {
        lines.extend(doc_lines(&pad, description));
    }
    if properties.is_empty() {
        lines.push(format!("{}#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]", pad));
        lines.push(format!("{}pub struct {} {{}}", pad, class.name));
    } else {
        let derive = if has_float(graph, id, &mut HashSet::new()) {
            "Debug, Clone, PartialEq"
        } else {
            "Debug, Clone, PartialEq, Eq, Hash"
        };
        lines.push(format!("{}#[derive({})]", pad, derive));
        lines.push(format!("{}pub struct {} {{", pad, class.name));
        for (property, ident) in properties.iter().zip(&idents) {
            if let Some(description) = &property.description {
                lines.extend(doc_lines(&member, description));
            }
            lines.push(format!("{}{}: {},", member, ident, field_type(graph, id, property)?));
        }
        lines.push(format!("{}}}", pad));
        lines.push(String::new());
        lines.extend(impl_block(graph, id, &properties, &idents, level)?);
    }

    let mut children = Vec::new();
    for model in &class.enums {
        children.push(enum_items(&qualified, model, level + 1)?);
    }
    for nested in &class.nested {
        children.push(class_items(graph, *nested, level + 1)?);
    }
    if !children.is_empty() {
        lines.push(String::new());
        lines.push(format!("{}pub mod {} {{", pad, module_name(&class.name)));
        for (index, child) in children.into_iter().enumerate() {
            if index > 0 {
                lines.push(String::new());
            }
            lines.extend(child);
        }
        lines.push(format!("{}}}", pad));
    }
    Ok(lines)
}

fn impl_block(
    graph: &ClassGraph,
    id: ClassId,
    properties: &[&Property],
    idents: &[String],
    level: usize,
) -> Result<Vec<String>, GenerateError> {
    let class = &graph[id];
    let qualified = graph.qualified_name(id);
    let pad = indent(level);
    let member = indent(level + 1);
    let body = indent(level + 2);

    let mut statements = Vec::new();
    for (property, ident) in properties.iter().zip(idents) {
        if let Some(statement) = default_statement(graph, id, property, ident)? {
            statements.push(format!("{}{}", body, statement));
        }
    }
    let mut checks = Vec::new();
    for (property, ident) in properties.iter().zip(idents) {
        checks.extend(guard_lines(&qualified, property, ident, level + 2)?);
    }
    let fallible = !checks.is_empty();
    statements.extend(checks);

    let mut params = Vec::new();
    for (property, ident) in properties.iter().zip(idents) {
        params.push(format!("{}: {}", ident, parameter_type(graph, id, property)?));
    }
    let output = if fallible {
        "Result<Self, String>"
    } else {
        "Self"
    };

    let mut lines = vec![format!("{}impl {} {{", pad, class.name)];
    if params.len() > 7 {
        lines.push(format!("{}#[allow(clippy::too_many_arguments)]", member));
    }
    let signature = format!("{}pub fn new({}) -> {} {{", member, params.join(", "), output);
    if signature.len() <= MAX_SIGNATURE_WIDTH {
        lines.push(signature);
    } else {
        lines.push(format!("{}pub fn new(", member));
        for param in &params {
            lines.push(format!("{}{},", body, param));
        }
        lines.push(format!("{}) -> {} {{", member, output));
    }
    lines.extend(statements);
    let construct = format!("Self {{ {} }}", idents.join(", "));
    if fallible {
        lines.push(format!("{}Ok({})", body, construct));
    } else {
        lines.push(format!("{}{}", body, construct));
    }
    lines.push(format!("{}}}", member));

    for (property, ident) in properties.iter().zip(idents) {
        let (returns, expression) = getter(graph, id, property, ident)?;
        lines.push(String::new());
        lines.push(format!("{}pub fn {}(&self) -> {} {{", member, ident, returns));
        lines.push(format!("{}{}", body, expression));
        lines.push(format!("{}}}", member));
    }
    lines.push(format!("{}}}", pad));
    Ok(lines)
}

/// `let` binding applying a schema default to an optional parameter.
fn default_statement(
    graph: &ClassGraph,
    from: ClassId,
    property: &Property,
    ident: &str,
) -> Result<Option<String>, GenerateError> {
    let value = match &property.default {
        PropertyDefault::Value(value) => value,
        _ => return Ok(None),
    };
    let literal = literal(graph, from, &property.ty, value)?;
    let owned = matches!(value, DefaultValue::String(_)) && !matches!(property.ty, Type::EnumOf { .. });
    Ok(Some(match (property.nullable, owned) {
        (false, false) => format!("let {} = {}.unwrap_or({});", ident, ident, literal),
        (false, true) => format!("let {} = {}.unwrap_or_else(|| {});", ident, ident, literal),
        (true, false) => format!("let {} = {}.or(Some({}));", ident, ident, literal),
        (true, true) => format!("let {} = {}.or_else(|| Some({}));", ident, ident, literal),
    }))
}

fn guard_lines(
    class: &str,
    property: &Property,
    ident: &str,
    level: usize,
) -> Result<Vec<String>, GenerateError> {
    // Absence is carried by `Option`.
    let property_guards: Vec<Guard> = guards(property)
        .into_iter()
        .filter(|guard| !guard.is_null_check())
        .collect();
    if property_guards.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(guard) = property_guards
        .iter()
        .find(|guard| matches!(guard.constraint, Constraint::Pattern(_)))
    {
        return Err(GenerateError::target(
            class,
            format!("{} on {}", guard.constraint, guard.subject_name()),
        ));
    }

    let optional = property.nullable;
    let depth = if optional { level + 1 } else { level };
    let mut lines = Vec::new();
    for guard in property_guards.iter().filter(|g| g.subject == Subject::Value) {
        lines.extend(check(guard, ident, optional, &property.ty, depth));
    }
    let items: Vec<&Guard> = property_guards
        .iter()
        .filter(|g| g.subject == Subject::Item)
        .collect();
    if let (false, Type::SequenceOf(element)) = (items.is_empty(), &property.ty) {
        lines.push(format!("{}for item in {}.iter() {{", indent(depth), ident));
        for guard in items {
            lines.extend(check(guard, "item", true, &element.ty, depth + 1));
        }
        lines.push(format!("{}}}", indent(depth)));
    }

    if optional {
        let pad = indent(level);
        let mut wrapped = vec![format!("{}if let Some({}) = &{} {{", pad, ident, ident)];
        wrapped.extend(lines);
        wrapped.push(format!("{}}}", pad));
        return Ok(wrapped);
    }
    Ok(lines)
}

/// `if` statement returning the failure message. `borrowed` subjects are
/// references and are dereferenced for numeric comparisons.
fn check(guard: &Guard, subject: &str, borrowed: bool, ty: &Type, level: usize) -> Vec<String> {
    let value = if borrowed {
        format!("*{}", subject)
    } else {
        subject.to_string()
    };
    let compare = |operator: &str, n: &serde_json::Number| match ty {
        Type::Primitive(PrimitiveKind::Int, _) if !is_integral(n) => {
            format!("f64::from({}) {} {}", value, operator, n)
        }
        Type::Primitive(PrimitiveKind::Long, _) if !is_integral(n) => {
            format!("({} as f64) {} {}", value, operator, n)
        }
        Type::Primitive(PrimitiveKind::Decimal | PrimitiveKind::Double, _) => {
            format!("{} {} {}", value, operator, float_literal(n))
        }
        _ => format!("{} {} {}", value, operator, n),
    };
    let failure = match &guard.constraint {
        Constraint::Minimum(n) => compare("<", n),
        Constraint::ExclusiveMinimum(n) => compare("<=", n),
        Constraint::Maximum(n) => compare(">", n),
        Constraint::ExclusiveMaximum(n) => compare(">=", n),
        Constraint::MinLength(1) => format!("{}.is_empty()", subject),
        Constraint::MinLength(n) => format!("{}.chars().count() < {}", subject, n),
        Constraint::MaxLength(n) => format!("{}.chars().count() > {}", subject, n),
        Constraint::MinItems(n) => format!("{}.len() < {}", subject, n),
        Constraint::MaxItems(n) => format!("{}.len() > {}", subject, n),
        Constraint::UniqueItems => format!(
            "{}.iter().enumerate().any(|(cg_index, cg_element)| {}[..cg_index].contains(cg_element))",
            subject, subject
        ),
        // Filtered out by the caller.
        Constraint::Required | Constraint::Pattern(_) => "false".to_string(),
    };

    let prefix = super::escape_string(&guard.message_prefix());
    let error = match guard.actual() {
        Actual::None => format!("String::from(\"{}\")", prefix),
        actual => {
            let quantity = match actual {
                Actual::Length => format!("{}.chars().count()", subject),
                Actual::Size => format!("{}.len()", subject),
                Actual::Duplicates => format!(
                    "{}.iter().enumerate().filter(|&(cg_index, cg_element)| {}[..cg_index].contains(cg_element)).count()",
                    subject, subject
                ),
                _ => subject.to_string(),
            };
            format!(
                "format!(\"{} - {{}}\", {})",
                prefix.replace('{', "{{").replace('}', "}}"),
                quantity
            )
        }
    };
    vec![
        format!("{}if {} {{", indent(level), failure),
        format!("{}return Err({});", indent(level + 1), error),
        format!("{}}}", indent(level)),
    ]
}

fn fields(graph: &ClassGraph, id: ClassId) -> Vec<&Property> {
    declared_properties(graph, id, TargetLanguage::Rust)
}

/// Whether a float is reachable from the fields of `id`; such structs
/// cannot derive `Eq` and `Hash`.
fn has_float(graph: &ClassGraph, id: ClassId, visited: &mut HashSet<ClassId>) -> bool {
    fn walk(graph: &ClassGraph, ty: &Type, visited: &mut HashSet<ClassId>) -> bool {
        match ty {
            Type::Primitive(PrimitiveKind::Decimal | PrimitiveKind::Double, _) => true,
            Type::Primitive(..) | Type::EnumOf { .. } => false,
            Type::ClassRef(target) => has_float(graph, *target, visited),
            Type::SequenceOf(element) => walk(graph, &element.ty, visited),
            Type::MapOf(key, value) => walk(graph, key, visited) || walk(graph, value, visited),
        }
    }
    if !visited.insert(id) {
        return false;
    }
    fields(graph, id)
        .into_iter()
        .any(|property| walk(graph, &property.ty, visited))
}

/// Whether `goal` is reachable from `start` through fields stored inline.
/// Such fields must be boxed.
fn reaches_inline(graph: &ClassGraph, start: ClassId, goal: ClassId, visited: &mut HashSet<ClassId>) -> bool {
    if start == goal {
        return true;
    }
    if !visited.insert(start) {
        return false;
    }
    fields(graph, start).into_iter().any(|property| match &property.ty {
        Type::ClassRef(target) => reaches_inline(graph, *target, goal, visited),
        _ => false,
    })
}

fn is_boxed(graph: &ClassGraph, from: ClassId, property: &Property) -> bool {
    match &property.ty {
        Type::ClassRef(target) => reaches_inline(graph, *target, from, &mut HashSet::new()),
        _ => false,
    }
}

fn is_copy(ty: &Type) -> bool {
    matches!(
        ty,
        Type::Primitive(
            PrimitiveKind::Int
                | PrimitiveKind::Long
                | PrimitiveKind::Decimal
                | PrimitiveKind::Double
                | PrimitiveKind::Boolean,
            _
        ) | Type::EnumOf { .. }
    )
}

fn field_type(graph: &ClassGraph, from: ClassId, property: &Property) -> Result<String, GenerateError> {
    let mut ty = type_name(graph, from, &property.ty)?;
    if is_boxed(graph, from, property) {
        ty = format!("Box<{}>", ty);
    }
    Ok(if property.nullable {
        format!("Option<{}>", ty)
    } else {
        ty
    })
}

/// Defaulted parameters are optional even when the field is not.
fn parameter_type(graph: &ClassGraph, from: ClassId, property: &Property) -> Result<String, GenerateError> {
    let ty = field_type(graph, from, property)?;
    Ok(match property.default {
        PropertyDefault::Value(_) if !property.nullable => format!("Option<{}>", ty),
        _ => ty,
    })
}

/// Getter return type and body.
fn getter(
    graph: &ClassGraph,
    from: ClassId,
    property: &Property,
    ident: &str,
) -> Result<(String, String), GenerateError> {
    let field = format!("self.{}", ident);
    if is_copy(&property.ty) {
        return Ok((field_type(graph, from, property)?, field));
    }
    let (borrowed, deref) = match &property.ty {
        Type::Primitive(..) => ("str".to_string(), true),
        Type::SequenceOf(element) => (format!("[{}]", type_name(graph, from, &element.ty)?), true),
        _ => (type_name(graph, from, &property.ty)?, is_boxed(graph, from, property)),
    };
    Ok(match (property.nullable, deref) {
        (false, _) => (format!("&{}", borrowed), format!("&{}", field)),
        (true, true) => (format!("Option<&{}>", borrowed), format!("{}.as_deref()", field)),
        (true, false) => (format!("Option<&{}>", borrowed), format!("{}.as_ref()", field)),
    })
}

fn type_name(graph: &ClassGraph, from: ClassId, ty: &Type) -> Result<String, GenerateError> {
    Ok(match ty {
        Type::Primitive(kind, _) => match kind {
            PrimitiveKind::String => "String",
            PrimitiveKind::Int => "i32",
            PrimitiveKind::Long => "i64",
            PrimitiveKind::Decimal | PrimitiveKind::Double => "f64",
            PrimitiveKind::Boolean => "bool",
        }
        .to_string(),
        Type::ClassRef(target) => {
            let decl = declared_in(graph, *target);
            path(graph, from, *target, &decl, &graph[*target].name)
        }
        Type::SequenceOf(element) => format!("Vec<{}>", type_name(graph, from, &element.ty)?),
        Type::MapOf(key, value) => format!(
            "std::collections::BTreeMap<{}, {}>",
            type_name(graph, from, key)?,
            type_name(graph, from, value)?
        ),
        Type::EnumOf { owner, name, .. } => enum_path(graph, from, *owner, name),
    })
}

/// Module path, relative to the file, where class `id` is declared.
fn declared_in(graph: &ClassGraph, id: ClassId) -> Vec<String> {
    graph
        .enclosing_chain(id)
        .into_iter()
        .map(|outer| module_name(&graph[outer].name))
        .collect()
}

fn enum_path(graph: &ClassGraph, from: ClassId, owner: ClassId, name: &str) -> String {
    let mut decl = declared_in(graph, owner);
    decl.push(module_name(&graph[owner].name));
    path(graph, from, owner, &decl, name)
}

/// Path to an item declared in module `decl` of the file holding `anchor`,
/// written from the module where class `from` is declared.
fn path(graph: &ClassGraph, from: ClassId, anchor: ClassId, decl: &[String], name: &str) -> String {
    let depth = declared_in(graph, from).len();
    let target_file = graph.outermost(anchor);
    let mut segments = Vec::new();
    if graph.outermost(from) == target_file {
        segments.extend(std::iter::repeat("super".to_string()).take(depth));
    } else {
        segments.extend(std::iter::repeat("super".to_string()).take(depth + 1));
        segments.push(module_name(&graph[target_file].name));
    }
    segments.extend(decl.iter().cloned());
    segments.push(name.to_string());
    segments.join("::")
}

fn literal(graph: &ClassGraph, from: ClassId, ty: &Type, value: &DefaultValue) -> Result<String, GenerateError> {
    Ok(match (ty, value) {
        (Type::EnumOf { owner, name, .. }, DefaultValue::String(s)) => {
            let variant = enum_constant(s, TargetLanguage::Rust).ok_or_else(|| {
                GenerateError::target(&graph.qualified_name(from), format!("enum default \"{}\"", s))
            })?;
            format!("{}::{}", enum_path(graph, from, *owner, name), variant)
        }
        (_, DefaultValue::String(s)) => format!("String::from(\"{}\")", super::escape_string(s)),
        (Type::Primitive(PrimitiveKind::Decimal | PrimitiveKind::Double, _), DefaultValue::Number(n)) => {
            float_literal(n)
        }
        (_, DefaultValue::Number(n)) => n.to_string(),
        (_, DefaultValue::Boolean(b)) => b.to_string(),
    })
}

fn enum_items(class: &str, model: &EnumModel, level: usize) -> Result<Vec<String>, GenerateError> {
    let pad = indent(level);
    let constants = enum_constants(class, model, TargetLanguage::Rust)?;
    let mut lines = vec![
        format!("{}#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]", pad),
        format!("{}pub enum {} {{", pad, model.name),
    ];
    for (variant, _) in &constants {
        lines.push(format!("{}{},", indent(level + 1), variant));
    }
    lines.push(format!("{}}}", pad));
    lines.push(String::new());
    lines.push(format!("{}impl {} {{", pad, model.name));
    lines.push(format!("{}pub fn as_str(&self) -> &'static str {{", indent(level + 1)));
    lines.push(format!("{}match self {{", indent(level + 2)));
    for (variant, value) in &constants {
        lines.push(format!(
            "{}Self::{} => \"{}\",",
            indent(level + 3),
            variant,
            super::escape_string(value)
        ));
    }
    lines.push(format!("{}}}", indent(level + 2)));
    lines.push(format!("{}}}", indent(level + 1)));
    lines.push(format!("{}}}", pad));
    Ok(lines)
}

fn doc_lines(pad: &str, description: &str) -> Vec<String> {
    description
        .lines()
        .map(|line| format!("{}/// {}", pad, line).trim_end().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ClassModelBuilder;
    use serde_json::json;

    fn render(schema: serde_json::Value) -> Result<String, GenerateError> {
        let mut builder = ClassModelBuilder::new(&schema, "");
        let id = builder.build_root("Root")?;
        let graph = builder.finish();
        let text = RustEmitter.render(&graph, id, &GenerateOptions::new(TargetLanguage::Rust))?;
        Ok(text.split(" */\n\n").nth(1).unwrap_or_default().to_string())
    }

    #[test]
    fn empty_struct() {
        let text = render(json!({ "title": "TestEmpty", "type": "object" })).unwrap();
        assert_eq!(
            text,
            "#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]\npub struct TestEmpty {}\n"
        );
    }

    #[test]
    fn optional_fields_and_defaults() {
        let text = render(json!({
            "title": "Reading",
            "type": "object",
            "required": ["sensor"],
            "properties": {
                "sensor": { "type": "string", "maxLength": 8 },
                "value": { "type": "number", "minimum": 0 },
                "unit": { "type": "string", "enum": ["celsius", "kelvin"], "default": "celsius" }
            }
        }))
        .unwrap();
        assert_eq!(
            text,
            r#"#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    sensor: String,
    value: Option<f64>,
    unit: reading::Unit,
}

impl Reading {
    pub fn new(
        sensor: String,
        value: Option<f64>,
        unit: Option<reading::Unit>,
    ) -> Result<Self, String> {
        let unit = unit.unwrap_or(reading::Unit::Celsius);
        if sensor.chars().count() > 8 {
            return Err(format!("sensor length > maximum 8 - {}", sensor.chars().count()));
        }
        if let Some(value) = &value {
            if *value < 0.0 {
                return Err(format!("value < minimum 0 - {}", value));
            }
        }
        Ok(Self { sensor, value, unit })
    }

    pub fn sensor(&self) -> &str {
        &self.sensor
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn unit(&self) -> reading::Unit {
        self.unit
    }
}

pub mod reading {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Unit {
        Celsius,
        Kelvin,
    }

    impl Unit {
        pub fn as_str(&self) -> &'static str {
            match self {
                Self::Celsius => "celsius",
                Self::Kelvin => "kelvin",
            }
        }
    }
}
"#
        );
    }

    #[test]
    fn self_reference_is_boxed() {
        let text = render(json!({
            "title": "Node",
            "type": "object",
            "properties": {
                "next": { "$ref": "#" },
                "children": { "type": "array", "items": { "$ref": "#" } }
            }
        }))
        .unwrap();
        assert!(text.contains("    next: Option<Box<Node>>,\n    children: Option<Vec<Node>>,\n"));
        assert!(text.contains("    pub fn next(&self) -> Option<&Node> {\n        self.next.as_deref()\n"));
        assert!(text.contains("    pub fn children(&self) -> Option<&[Node]> {\n        self.children.as_deref()\n"));
        assert!(text.contains("pub fn new(next: Option<Box<Node>>, children: Option<Vec<Node>>) -> Self {"));
    }

    #[test]
    fn variants_carry_base_fields() {
        let text = render(json!({
            "title": "Shape",
            "type": "object",
            "properties": { "label": { "type": "string" } },
            "oneOf": [
                {
                    "title": "Circle",
                    "type": "object",
                    "properties": { "radius": { "type": "integer" } }
                }
            ]
        }))
        .unwrap();
        assert!(text.contains(
            "pub mod shape {\n    #[derive(Debug, Clone, PartialEq, Eq, Hash)]\n    pub struct Circle {\n        label: Option<String>,\n        radius: Option<i32>,\n    }\n"
        ));
    }

    #[test]
    fn unique_items_report_duplicate_count() {
        let text = render(json!({
            "title": "Batch",
            "type": "object",
            "required": ["codes"],
            "properties": {
                "codes": { "type": "array", "uniqueItems": true, "items": { "type": "string" } }
            }
        }))
        .unwrap();
        assert!(text.contains(
            "        if codes.iter().enumerate().any(|(cg_index, cg_element)| codes[..cg_index].contains(cg_element)) {\n"
        ));
        assert!(text.contains(
            "            return Err(format!(\"codes contains duplicate items - {}\", codes.iter().enumerate().filter(|&(cg_index, cg_element)| codes[..cg_index].contains(cg_element)).count()));\n"
        ));
    }

    #[test]
    fn patterns_are_rejected() {
        let result = render(json!({
            "title": "Code",
            "type": "object",
            "properties": { "value": { "type": "string", "pattern": "^[0-9]+$" } }
        }));
        assert!(matches!(
            result,
            Err(GenerateError::UnsupportedTargetConstruct { .. })
        ));
    }
}
