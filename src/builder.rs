//! Class model builder.
//!
//! Walks resolved schema nodes and produces the [`ClassGraph`]. Classes are
//! memoized by canonical pointer: a pointer reached a second time yields the
//! same [`ClassId`], and a pointer reached while its class is still being
//! populated yields a back-reference to the in-progress class.

use std::collections::HashMap;

use serde_json::{Number, Value};
use tracing::{debug, warn};

use crate::error::{display_pointer, GenerateError};
use crate::model::{
    ClassGraph, ClassId, ClassKind, ClassModel, Constraint, DefaultValue, Element, EnumModel,
    PrimitiveKind, Property, PropertyDefault, StringFormat, Type,
};
use crate::naming::type_name;
use crate::resolver::{child_pointer, last_segment, ref_of, segments, ResolvedRef, Resolver};
use crate::types::json_type_name;

/// Keywords no part of the builder interprets.
const IGNORED_KEYWORDS: &[&str] = &[
    "not",
    "if",
    "then",
    "else",
    "const",
    "patternProperties",
    "dependencies",
    "dependentSchemas",
];

/// Pointer segments that structure a document rather than name a schema.
const STRUCTURAL_SEGMENTS: &[&str] = &[
    "properties",
    "items",
    "additionalProperties",
    "allOf",
    "oneOf",
    "anyOf",
    "$defs",
    "definitions",
    "components",
    "schemas",
];

#[derive(Debug, Clone, Copy)]
enum Slot {
    InProgress(ClassId),
    Built(ClassId),
}

impl Slot {
    fn id(self) -> ClassId {
        match self {
            Slot::InProgress(id) | Slot::Built(id) => id,
        }
    }
}

#[derive(Debug, Clone)]
enum ScopeEntry {
    Class,
    Enum(Vec<String>),
}

type Scope = HashMap<String, ScopeEntry>;

/// Where a new class may be declared: enclosing class (`None` for package
/// scope) and simple name. Candidates are tried in order.
type Candidate = (Option<ClassId>, String);

/// Builds the class model for one generation run.
///
/// Owns every piece of build state (classes, scopes, pointer cache); nothing
/// survives [`ClassModelBuilder::finish`].
pub struct ClassModelBuilder<'a> {
    resolver: Resolver<'a>,
    package: String,
    classes: Vec<ClassModel>,
    scopes: Vec<Scope>,
    package_scope: Scope,
    cache: HashMap<String, Slot>,
    /// Non-class `$ref` targets currently being typed.
    typing: Vec<String>,
}

impl<'a> ClassModelBuilder<'a> {
    pub fn new(root: &'a Value, package: impl Into<String>) -> Self {
        Self {
            resolver: Resolver::new(root),
            package: package.into(),
            classes: Vec::new(),
            scopes: Vec::new(),
            package_scope: Scope::new(),
            cache: HashMap::new(),
            typing: Vec::new(),
        }
    }

    /// Build the class described by the document root.
    ///
    /// The class is named from the root `title`, else from `name`.
    pub fn build_root(&mut self, name: &str) -> Result<ClassId, GenerateError> {
        let target = self.resolver.follow("", self.resolver.root())?;
        if !is_class_schema(target.node) {
            return Err(GenerateError::unsupported(
                &target.pointer,
                "root schema does not describe an object",
            ));
        }
        let primary = title_of(target.node).unwrap_or_else(|| type_name(name));
        self.class_at(target, vec![(None, primary)])
    }

    /// Build the class for one member of a definitions container.
    ///
    /// Returns `None` for members that do not describe an object (enum or
    /// primitive definitions); those are only used through references.
    pub fn build_definition(
        &mut self,
        name: &str,
        member: ResolvedRef<'a>,
    ) -> Result<Option<ClassId>, GenerateError> {
        let target = self.resolver.follow(&member.pointer, member.node)?;
        if !is_class_schema(target.node) {
            debug!(pointer = %display_pointer(&member.pointer), "skipping non-object definition");
            return Ok(None);
        }
        let candidates = if target.pointer == member.pointer {
            let mut candidates = Vec::new();
            if let Some(title) = title_of(target.node) {
                candidates.push((None, title));
            }
            candidates.push((None, type_name(name)));
            candidates
        } else {
            vec![(None, ref_name(&target))]
        };
        self.class_at(target, candidates).map(Some)
    }

    /// Freeze the graph, assigning each class its final kind.
    pub fn finish(mut self) -> ClassGraph {
        let bases: Vec<ClassId> = self.classes.iter().filter_map(|c| c.base).collect();
        for class in &mut self.classes {
            class.kind = if bases.contains(&class.id) {
                ClassKind::OpenBase
            } else if class.base.is_some() {
                ClassKind::Variant
            } else if class.properties.is_empty() {
                ClassKind::Plain
            } else {
                ClassKind::Data
            };
        }
        ClassGraph::from_classes(self.classes)
    }

    fn class_at(
        &mut self,
        target: ResolvedRef<'a>,
        candidates: Vec<Candidate>,
    ) -> Result<ClassId, GenerateError> {
        if let Some(slot) = self.cache.get(&target.pointer) {
            return Ok(slot.id());
        }
        let (scope, name) = self.choose(&target.pointer, candidates)?;
        let id = self.allocate(&target.pointer, scope, name);
        self.populate(id, &target)?;
        self.cache.insert(target.pointer, Slot::Built(id));
        Ok(id)
    }

    /// First free candidate. When every candidate is taken, a name derived
    /// from the pointer is declared in the scope of the last candidate.
    fn choose(&self, pointer: &str, candidates: Vec<Candidate>) -> Result<Candidate, GenerateError> {
        let first = candidates
            .first()
            .map(|(_, name)| name.clone())
            .unwrap_or_default();
        let scope = candidates.last().and_then(|(scope, _)| *scope);
        if let Some(candidate) = candidates
            .into_iter()
            .find(|(scope, name)| self.is_free(*scope, name))
        {
            return Ok(candidate);
        }
        let name = path_names(pointer)
            .into_iter()
            .find(|name| self.is_free(scope, name))
            .ok_or_else(|| {
                GenerateError::unsupported(pointer, format!("class name {} is already in use", first))
            })?;
        debug!(pointer = %display_pointer(pointer), taken = %first, class = %name, "class name taken, using pointer name");
        Ok((scope, name))
    }

    /// A name is free in a scope if nothing is declared under it there and
    /// no enclosing class carries it.
    fn is_free(&self, scope: Option<ClassId>, name: &str) -> bool {
        if name.is_empty() || self.scope(scope).contains_key(name) {
            return false;
        }
        let mut current = scope;
        while let Some(id) = current {
            if self.classes[id.0].name == name {
                return false;
            }
            current = self.classes[id.0].enclosing;
        }
        true
    }

    fn scope(&self, scope: Option<ClassId>) -> &Scope {
        match scope {
            Some(id) => &self.scopes[id.0],
            None => &self.package_scope,
        }
    }

    fn scope_mut(&mut self, scope: Option<ClassId>) -> &mut Scope {
        match scope {
            Some(id) => &mut self.scopes[id.0],
            None => &mut self.package_scope,
        }
    }

    fn allocate(&mut self, pointer: &str, enclosing: Option<ClassId>, name: String) -> ClassId {
        let id = ClassId(self.classes.len());
        debug!(class = %name, pointer = %display_pointer(pointer), "building class");
        self.scope_mut(enclosing).insert(name.clone(), ScopeEntry::Class);
        if let Some(outer) = enclosing {
            self.classes[outer.0].nested.push(id);
        }
        self.classes.push(ClassModel {
            id,
            package: self.package.clone(),
            enclosing,
            name,
            kind: ClassKind::Plain,
            pointer: pointer.to_string(),
            description: None,
            properties: Vec::new(),
            base: None,
            nested: Vec::new(),
            enums: Vec::new(),
        });
        self.scopes.push(Scope::new());
        self.cache.insert(pointer.to_string(), Slot::InProgress(id));
        id
    }

    fn in_progress(&self, pointer: &str) -> bool {
        matches!(self.cache.get(pointer), Some(Slot::InProgress(_)))
    }

    fn populate(&mut self, id: ClassId, target: &ResolvedRef<'a>) -> Result<(), GenerateError> {
        let node = target.node;
        let pointer = target.pointer.as_str();
        warn_ignored(pointer, node);
        self.classes[id.0].description = description_of(node);

        let alternatives = match (node.get("oneOf"), node.get("anyOf")) {
            (Some(_), Some(_)) => {
                return Err(GenerateError::unsupported(pointer, "oneOf combined with anyOf"))
            }
            (Some(alternatives), None) => Some(("oneOf", alternatives)),
            (None, Some(alternatives)) => Some(("anyOf", alternatives)),
            (None, None) => None,
        };

        let mut required = required_of(pointer, node)?;
        let mut properties = Vec::new();
        let mut base = None;
        if let Some(members) = node.get("allOf") {
            if alternatives.is_some() {
                return Err(GenerateError::unsupported(
                    pointer,
                    "allOf combined with oneOf/anyOf",
                ));
            }
            (base, properties) = self.all_of(id, pointer, members, &mut required)?;
        }
        for property in self.object_properties(id, pointer, node, &required)? {
            merge(&mut properties, property);
        }
        if let Some(base) = base {
            properties = self.extend(id, pointer, base, properties, &required);
        }
        for property in &mut properties {
            if required.contains(&property.name) {
                require(property);
            }
        }
        self.classes[id.0].properties = properties;

        if let Some((keyword, alternatives)) = alternatives {
            self.alternatives(id, pointer, keyword, alternatives)?;
        }
        Ok(())
    }

    /// Read `allOf`: at most one reference, returned as the base class, plus
    /// inline object members whose properties are merged in order. A later
    /// property replaces an earlier one of the same name in place.
    fn all_of(
        &mut self,
        id: ClassId,
        pointer: &str,
        members: &'a Value,
        required: &mut Vec<String>,
    ) -> Result<(Option<ClassId>, Vec<Property>), GenerateError> {
        let container = child_pointer(pointer, "allOf");
        let members = members
            .as_array()
            .ok_or_else(|| GenerateError::unsupported(&container, "allOf is not an array"))?;

        for member in members.iter().filter(|m| ref_of(m).is_none()) {
            for name in required_of(&container, member)? {
                if !required.contains(&name) {
                    required.push(name);
                }
            }
        }

        let mut properties = Vec::new();
        let mut reference = None;
        for (index, member) in members.iter().enumerate() {
            let member_pointer = child_pointer(&container, &index.to_string());
            if ref_of(member).is_some() {
                if reference.is_some() {
                    return Err(GenerateError::unsupported(
                        &member_pointer,
                        "allOf with more than one reference",
                    ));
                }
                let target = self.resolver.follow(&member_pointer, member)?;
                if !is_class_schema(target.node) {
                    return Err(GenerateError::unsupported(
                        &member_pointer,
                        "allOf reference to a non-object schema",
                    ));
                }
                let name = ref_name(&target);
                let candidates = vec![(None, name.clone()), (Some(id), name)];
                let base = self.class_at(target, candidates)?;
                if self.in_progress(&self.classes[base.0].pointer) {
                    return Err(GenerateError::CyclicReference {
                        pointer: display_pointer(&self.classes[base.0].pointer),
                    });
                }
                reference = Some(base);
            } else {
                if has_composition(member) {
                    return Err(GenerateError::unsupported(
                        &member_pointer,
                        "nested composition in allOf",
                    ));
                }
                warn_ignored(&member_pointer, member);
                for property in self.object_properties(id, &member_pointer, member, required)? {
                    merge(&mut properties, property);
                }
            }
        }
        Ok((reference, properties))
    }

    /// Make `id` extend the `allOf` base, returning its own properties.
    ///
    /// The inherited properties are copied in front of the own ones instead
    /// when an own property redeclares one of them, when `required` makes an
    /// inherited optional property mandatory, or when the base is nested in
    /// `id`.
    fn extend(
        &mut self,
        id: ClassId,
        pointer: &str,
        base: ClassId,
        own: Vec<Property>,
        required: &[String],
    ) -> Vec<Property> {
        let inherited = self.all_properties(base);
        let overrides = own
            .iter()
            .any(|property| inherited.iter().any(|i| i.name == property.name));
        let tightens = inherited
            .iter()
            .any(|property| property.has_default() && required.contains(&property.name));
        if !overrides && !tightens && !self.encloses(id, base) {
            self.classes[id.0].base = Some(base);
            return own;
        }
        debug!(
            pointer = %display_pointer(pointer),
            base = %self.classes[base.0].name,
            "copying allOf base properties"
        );
        let mut properties = inherited;
        for property in own {
            merge(&mut properties, property);
        }
        properties
    }

    /// Whether `inner` is declared inside `outer`, at any depth.
    fn encloses(&self, outer: ClassId, inner: ClassId) -> bool {
        let mut current = self.classes[inner.0].enclosing;
        while let Some(id) = current {
            if id == outer {
                return true;
            }
            current = self.classes[id.0].enclosing;
        }
        false
    }

    /// One nested variant per `oneOf`/`anyOf` alternative, each extending
    /// the class holding the shared properties.
    fn alternatives(
        &mut self,
        base: ClassId,
        pointer: &str,
        keyword: &str,
        alternatives: &'a Value,
    ) -> Result<(), GenerateError> {
        let container = child_pointer(pointer, keyword);
        let alternatives = alternatives
            .as_array()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| {
                GenerateError::unsupported(&container, format!("{} must be a non-empty array", keyword))
            })?;
        let inherited: Vec<String> = self
            .all_properties(base)
            .into_iter()
            .map(|p| p.name)
            .collect();

        for (index, alternative) in alternatives.iter().enumerate() {
            let alternative_pointer = child_pointer(&container, &index.to_string());
            let (schema_pointer, schema, name) = if ref_of(alternative).is_some() {
                let target = self.resolver.follow(&alternative_pointer, alternative)?;
                if self.in_progress(&target.pointer) {
                    return Err(GenerateError::CyclicReference {
                        pointer: display_pointer(&target.pointer),
                    });
                }
                let name = ref_name(&target);
                (target.pointer, target.node, name)
            } else {
                let name =
                    title_of(alternative).unwrap_or_else(|| format!("Alternative{}", index + 1));
                (alternative_pointer.clone(), alternative, name)
            };
            if !is_class_schema(schema) || has_composition(schema) {
                return Err(GenerateError::unsupported(
                    &alternative_pointer,
                    format!("{} alternative must be an object schema without composition", keyword),
                ));
            }

            let (scope, name) = self.choose(&alternative_pointer, vec![(Some(base), name)])?;
            let variant = self.allocate(&alternative_pointer, scope, name);
            self.classes[variant.0].base = Some(base);
            self.classes[variant.0].description = description_of(schema);
            warn_ignored(&schema_pointer, schema);

            let required = required_of(&schema_pointer, schema)?;
            let mut properties = Vec::new();
            for property in self.object_properties(variant, &schema_pointer, schema, &required)? {
                if inherited.contains(&property.name) {
                    debug!(
                        property = %property.name,
                        pointer = %display_pointer(&alternative_pointer),
                        "variant property already declared by base"
                    );
                    continue;
                }
                merge(&mut properties, property);
            }
            self.classes[variant.0].properties = properties;
            self.cache.insert(alternative_pointer, Slot::Built(variant));
        }
        Ok(())
    }

    /// Properties of `id` including those of its base chain, base first.
    fn all_properties(&self, id: ClassId) -> Vec<Property> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(class) = current {
            chain.push(class);
            current = self.classes[class.0].base;
        }
        chain
            .iter()
            .rev()
            .flat_map(|class| self.classes[class.0].properties.iter().cloned())
            .collect()
    }

    fn object_properties(
        &mut self,
        owner: ClassId,
        pointer: &str,
        node: &'a Value,
        required: &[String],
    ) -> Result<Vec<Property>, GenerateError> {
        let Some(properties) = node.get("properties") else {
            return Ok(Vec::new());
        };
        let container = child_pointer(pointer, "properties");
        let members = properties
            .as_object()
            .ok_or_else(|| GenerateError::unsupported(&container, "properties is not an object"))?;

        let mut result = Vec::with_capacity(members.len());
        for (name, schema) in members {
            let property_pointer = child_pointer(&container, name);
            let is_required = required.iter().any(|r| r == name);
            result.push(self.property(owner, name, &property_pointer, schema, is_required)?);
        }
        Ok(result)
    }

    fn property(
        &mut self,
        owner: ClassId,
        name: &str,
        pointer: &str,
        schema: &'a Value,
        required: bool,
    ) -> Result<Property, GenerateError> {
        let (ty, mut constraints) = self.type_of(owner, name, pointer, schema)?;
        let default = match schema.get("default") {
            _ if required => PropertyDefault::None,
            Some(value) => default_value(pointer, &ty, value),
            None => PropertyDefault::Absent,
        };
        let nullable = allows_null(schema) || matches!(default, PropertyDefault::Absent);
        if required && !nullable {
            constraints.insert(0, Constraint::Required);
        }
        Ok(Property {
            name: name.to_string(),
            ty,
            nullable,
            default,
            constraints,
            description: description_of(schema),
        })
    }

    /// Type of a property schema plus the constraints read from it.
    fn type_of(
        &mut self,
        owner: ClassId,
        name: &str,
        pointer: &str,
        schema: &'a Value,
    ) -> Result<(Type, Vec<Constraint>), GenerateError> {
        if ref_of(schema).is_some() {
            let target = self.resolver.follow(pointer, schema)?;
            if is_class_schema(target.node) {
                let class_name = ref_name(&target);
                let candidates = vec![(None, class_name.clone()), (Some(owner), class_name)];
                let id = self.class_at(target, candidates)?;
                return Ok((Type::ClassRef(id), Vec::new()));
            }
            if self.typing.contains(&target.pointer) {
                return Err(GenerateError::CyclicReference {
                    pointer: display_pointer(&target.pointer),
                });
            }
            self.typing.push(target.pointer.clone());
            let hint = last_segment(&target.pointer);
            let result = self.type_of(owner, &hint, &target.pointer, target.node);
            self.typing.pop();
            return result;
        }
        if let Some(reference) = sole_reference(schema) {
            let member_pointer = child_pointer(&child_pointer(pointer, "allOf"), "0");
            return self.type_of(owner, name, &member_pointer, reference);
        }

        match schema_type(pointer, schema)? {
            "object" => self.object_type(owner, name, pointer, schema),
            "array" => self.array_type(owner, name, pointer, schema),
            "string" => self.string_type(owner, name, pointer, schema),
            "integer" => {
                ignore_enum(pointer, schema);
                Ok((
                    Type::Primitive(integer_kind(schema), None),
                    numeric_constraints(schema),
                ))
            }
            "number" => {
                ignore_enum(pointer, schema);
                Ok((
                    Type::Primitive(number_kind(schema), None),
                    numeric_constraints(schema),
                ))
            }
            "boolean" => Ok((Type::Primitive(PrimitiveKind::Boolean, None), Vec::new())),
            other => Err(GenerateError::unsupported(pointer, format!("type {}", other))),
        }
    }

    fn object_type(
        &mut self,
        owner: ClassId,
        name: &str,
        pointer: &str,
        schema: &'a Value,
    ) -> Result<(Type, Vec<Constraint>), GenerateError> {
        if let Some(values) = map_values(schema) {
            let values_pointer = child_pointer(pointer, "additionalProperties");
            let (value_type, constraints) =
                self.type_of(owner, &format!("{}Value", name), &values_pointer, values)?;
            if !constraints.is_empty() {
                warn!(pointer = %display_pointer(&values_pointer), "constraints on map values are not checked");
            }
            return Ok((Type::MapOf(Box::new(Type::string()), Box::new(value_type)), Vec::new()));
        }

        let fallback = type_name(name);
        let mut candidates = Vec::new();
        if let Some(title) = title_of(schema).filter(|t| *t != fallback) {
            candidates.push((Some(owner), title));
        }
        candidates.push((Some(owner), fallback));
        let target = ResolvedRef {
            pointer: pointer.to_string(),
            node: schema,
        };
        let id = self.class_at(target, candidates)?;
        Ok((Type::ClassRef(id), Vec::new()))
    }

    fn array_type(
        &mut self,
        owner: ClassId,
        name: &str,
        pointer: &str,
        schema: &'a Value,
    ) -> Result<(Type, Vec<Constraint>), GenerateError> {
        let items_pointer = child_pointer(pointer, "items");
        let items = match schema.get("items") {
            Some(items @ Value::Object(_)) => items,
            Some(_) => {
                return Err(GenerateError::unsupported(
                    &items_pointer,
                    "items must be a single schema",
                ))
            }
            None => return Err(GenerateError::unsupported(pointer, "array without items")),
        };
        let (ty, element_constraints) =
            self.type_of(owner, &format!("{}Item", name), &items_pointer, items)?;

        let mut constraints = Vec::new();
        if let Some(n) = schema.get("minItems").and_then(Value::as_u64) {
            constraints.push(Constraint::MinItems(n));
        }
        if let Some(n) = schema.get("maxItems").and_then(Value::as_u64) {
            constraints.push(Constraint::MaxItems(n));
        }
        if schema.get("uniqueItems").and_then(Value::as_bool) == Some(true) {
            constraints.push(Constraint::UniqueItems);
        }
        let element = Element {
            ty,
            constraints: element_constraints,
        };
        Ok((Type::SequenceOf(Box::new(element)), constraints))
    }

    fn string_type(
        &mut self,
        owner: ClassId,
        name: &str,
        pointer: &str,
        schema: &'a Value,
    ) -> Result<(Type, Vec<Constraint>), GenerateError> {
        if let Some(values) = schema.get("enum") {
            let enum_pointer = child_pointer(pointer, "enum");
            let values = values
                .as_array()
                .and_then(|values| {
                    values
                        .iter()
                        .map(|v| v.as_str().map(String::from))
                        .collect::<Option<Vec<_>>>()
                })
                .filter(|values| !values.is_empty())
                .ok_or_else(|| {
                    GenerateError::unsupported(&enum_pointer, "enum must be a non-empty list of strings")
                })?;
            let enum_name = title_of(schema).unwrap_or_else(|| type_name(name));
            let enum_name = self.register_enum(owner, pointer, enum_name, &values)?;
            return Ok((
                Type::EnumOf {
                    owner,
                    name: enum_name,
                    values,
                },
                Vec::new(),
            ));
        }

        let constraints = string_constraints(schema);
        let format = schema.get("format").and_then(Value::as_str);
        let format = match format.map(|f| (f, StringFormat::parse(f))) {
            Some((_, Some(parsed))) if constraints.is_empty() => Some(parsed),
            Some((raw, _)) => {
                debug!(pointer = %display_pointer(pointer), format = raw, "format kept as plain string");
                None
            }
            None => None,
        };
        Ok((Type::Primitive(PrimitiveKind::String, format), constraints))
    }

    /// Declare an enum in `owner`, reusing an identical one already there.
    /// A taken name falls back to names derived from the pointer.
    fn register_enum(
        &mut self,
        owner: ClassId,
        pointer: &str,
        name: String,
        values: &[String],
    ) -> Result<String, GenerateError> {
        let mut candidates = vec![name.clone()];
        candidates.extend(path_names(pointer));
        for candidate in candidates {
            match self.scopes[owner.0].get(&candidate) {
                Some(ScopeEntry::Enum(existing)) if existing.as_slice() == values => {
                    return Ok(candidate)
                }
                Some(_) => continue,
                None if !self.is_free(Some(owner), &candidate) => continue,
                None => {}
            }
            if candidate != name {
                debug!(pointer = %display_pointer(pointer), taken = %name, name = %candidate, "enum name taken, using pointer name");
            }
            self.scopes[owner.0].insert(candidate.clone(), ScopeEntry::Enum(values.to_vec()));
            self.classes[owner.0].enums.push(EnumModel {
                name: candidate.clone(),
                values: values.to_vec(),
            });
            return Ok(candidate);
        }
        Err(GenerateError::unsupported(
            pointer,
            format!("enum name {} is already in use", name),
        ))
    }
}

fn ref_name(target: &ResolvedRef<'_>) -> String {
    title_of(target.node).unwrap_or_else(|| type_name(&last_segment(&target.pointer)))
}

fn title_of(node: &Value) -> Option<String> {
    node.get("title")
        .and_then(Value::as_str)
        .map(type_name)
        .filter(|name| !name.is_empty())
}

fn description_of(node: &Value) -> Option<String> {
    node.get("description")
        .and_then(Value::as_str)
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

fn required_of(pointer: &str, node: &Value) -> Result<Vec<String>, GenerateError> {
    match node.get("required") {
        None => Ok(Vec::new()),
        Some(Value::Array(names)) => names
            .iter()
            .map(|name| {
                name.as_str().map(String::from).ok_or_else(|| {
                    GenerateError::unsupported(
                        &child_pointer(pointer, "required"),
                        "required must list property names",
                    )
                })
            })
            .collect(),
        Some(other) => Err(GenerateError::unsupported(
            &child_pointer(pointer, "required"),
            format!("required must be an array, found {}", json_type_name(other)),
        )),
    }
}

fn has_composition(node: &Value) -> bool {
    ["allOf", "oneOf", "anyOf"]
        .iter()
        .any(|keyword| node.get(*keyword).is_some())
}

/// The referenced member of an `allOf` wrapping a single `$ref` and adding
/// nothing but annotations, e.g. a `description` next to the reference.
fn sole_reference(node: &Value) -> Option<&Value> {
    const SHAPING: &[&str] = &[
        "properties",
        "additionalProperties",
        "items",
        "enum",
        "oneOf",
        "anyOf",
        "required",
    ];
    if SHAPING.iter().any(|keyword| node.get(*keyword).is_some()) {
        return None;
    }
    match node.get("allOf")?.as_array()?.as_slice() {
        [member] if ref_of(member).is_some() => Some(member),
        _ => None,
    }
}

/// Fallback class names derived from a pointer: the named segments joined
/// from the last one outwards, then every segment joined.
fn path_names(pointer: &str) -> Vec<String> {
    let segments = segments(pointer);
    let named: Vec<&str> = segments
        .iter()
        .map(String::as_str)
        .filter(|segment| {
            !STRUCTURAL_SEGMENTS.contains(segment) && !segment.chars().all(|c| c.is_ascii_digit())
        })
        .collect();
    let mut raw: Vec<String> = (0..named.len())
        .rev()
        .map(|start| named[start..].join("_"))
        .collect();
    raw.push(segments.join("_"));

    let mut names = Vec::new();
    for name in raw.iter().map(|raw| type_name(raw)) {
        if name.starts_with(|c: char| c.is_ascii_alphabetic()) && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Value schema of an object that only declares `additionalProperties`.
fn map_values(node: &Value) -> Option<&Value> {
    if node.get("properties").is_some() || has_composition(node) {
        return None;
    }
    node.get("additionalProperties").filter(|v| v.is_object())
}

/// Whether a node becomes a class of its own.
fn is_class_schema(node: &Value) -> bool {
    let object = match node.get("type") {
        Some(Value::String(t)) => t == "object",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("object")),
        Some(_) => false,
        None => node.get("properties").is_some() || has_composition(node),
    };
    object && map_values(node).is_none()
}

/// The single non-null type a schema declares, or the type implied by its
/// keywords.
fn schema_type<'v>(pointer: &str, schema: &'v Value) -> Result<&'v str, GenerateError> {
    match schema.get("type") {
        Some(Value::String(t)) => Ok(t.as_str()),
        Some(Value::Array(types)) => {
            let named: Vec<&str> = types
                .iter()
                .filter_map(Value::as_str)
                .filter(|t| *t != "null")
                .collect();
            match named.as_slice() {
                [single] => Ok(*single),
                _ => Err(GenerateError::unsupported(
                    pointer,
                    "type must name exactly one non-null type",
                )),
            }
        }
        Some(other) => Err(GenerateError::unsupported(
            pointer,
            format!("type must be a string or array, found {}", json_type_name(other)),
        )),
        None if schema.get("properties").is_some()
            || has_composition(schema)
            || schema.get("additionalProperties").is_some() =>
        {
            Ok("object")
        }
        None if schema.get("items").is_some() => Ok("array"),
        None if schema.get("enum").is_some() => Ok("string"),
        None => Err(GenerateError::unsupported(pointer, "schema without type")),
    }
}

fn allows_null(schema: &Value) -> bool {
    schema.get("nullable").and_then(Value::as_bool) == Some(true)
        || schema
            .get("type")
            .and_then(Value::as_array)
            .map_or(false, |types| types.iter().any(|t| t.as_str() == Some("null")))
}

fn integer_kind(schema: &Value) -> PrimitiveKind {
    match schema.get("format").and_then(Value::as_str) {
        Some("int64") => PrimitiveKind::Long,
        Some("int32") => PrimitiveKind::Int,
        _ => {
            let exceeds = ["minimum", "maximum", "exclusiveMinimum", "exclusiveMaximum"]
                .iter()
                .filter_map(|keyword| schema.get(*keyword).and_then(Value::as_f64))
                .any(|bound| bound < f64::from(i32::MIN) || bound > f64::from(i32::MAX));
            if exceeds {
                PrimitiveKind::Long
            } else {
                PrimitiveKind::Int
            }
        }
    }
}

fn number_kind(schema: &Value) -> PrimitiveKind {
    match schema.get("format").and_then(Value::as_str) {
        Some("double") | Some("float") => PrimitiveKind::Double,
        _ => PrimitiveKind::Decimal,
    }
}

/// Numeric bounds in keyword order. The draft-04 boolean forms of
/// `exclusiveMinimum`/`exclusiveMaximum` turn the matching bound exclusive.
fn numeric_constraints(schema: &Value) -> Vec<Constraint> {
    let number = |keyword: &str| -> Option<Number> {
        match schema.get(keyword) {
            Some(Value::Number(n)) => Some(n.clone()),
            _ => None,
        }
    };
    let flag = |keyword: &str| schema.get(keyword).and_then(Value::as_bool) == Some(true);

    let mut constraints = Vec::new();
    if let Some(n) = number("minimum") {
        constraints.push(if flag("exclusiveMinimum") {
            Constraint::ExclusiveMinimum(n)
        } else {
            Constraint::Minimum(n)
        });
    }
    if let Some(n) = number("exclusiveMinimum") {
        constraints.push(Constraint::ExclusiveMinimum(n));
    }
    if let Some(n) = number("maximum") {
        constraints.push(if flag("exclusiveMaximum") {
            Constraint::ExclusiveMaximum(n)
        } else {
            Constraint::Maximum(n)
        });
    }
    if let Some(n) = number("exclusiveMaximum") {
        constraints.push(Constraint::ExclusiveMaximum(n));
    }
    constraints
}

fn string_constraints(schema: &Value) -> Vec<Constraint> {
    let mut constraints = Vec::new();
    if let Some(n) = schema.get("minLength").and_then(Value::as_u64) {
        constraints.push(Constraint::MinLength(n));
    }
    if let Some(n) = schema.get("maxLength").and_then(Value::as_u64) {
        constraints.push(Constraint::MaxLength(n));
    }
    if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
        constraints.push(Constraint::Pattern(pattern.to_string()));
    }
    constraints
}

fn default_value(pointer: &str, ty: &Type, value: &Value) -> PropertyDefault {
    let default = match (ty, value) {
        (Type::Primitive(PrimitiveKind::String, None), Value::String(s)) => {
            Some(DefaultValue::String(s.clone()))
        }
        (Type::EnumOf { values, .. }, Value::String(s)) if values.contains(s) => {
            Some(DefaultValue::String(s.clone()))
        }
        (Type::Primitive(PrimitiveKind::Int | PrimitiveKind::Long, _), Value::Number(n))
            if n.is_i64() || n.is_u64() =>
        {
            Some(DefaultValue::Number(n.clone()))
        }
        (Type::Primitive(PrimitiveKind::Decimal | PrimitiveKind::Double, _), Value::Number(n)) => {
            Some(DefaultValue::Number(n.clone()))
        }
        (Type::Primitive(PrimitiveKind::Boolean, _), Value::Bool(b)) => {
            Some(DefaultValue::Boolean(*b))
        }
        _ => None,
    };
    match default {
        Some(default) => PropertyDefault::Value(default),
        None => {
            warn!(pointer = %display_pointer(pointer), "ignoring default that does not fit the property type");
            PropertyDefault::Absent
        }
    }
}

fn ignore_enum(pointer: &str, schema: &Value) {
    if schema.get("enum").is_some() {
        warn!(pointer = %display_pointer(pointer), "ignoring enum on a non-string type");
    }
}

fn warn_ignored(pointer: &str, node: &Value) {
    for keyword in IGNORED_KEYWORDS {
        if node.get(*keyword).is_some() {
            warn!(pointer = %display_pointer(pointer), keyword = *keyword, "ignoring unsupported keyword");
        }
    }
}

/// Append a property, or replace the earlier one of the same name in place.
fn merge(properties: &mut Vec<Property>, property: Property) {
    match properties.iter_mut().find(|p| p.name == property.name) {
        Some(existing) => *existing = property,
        None => properties.push(property),
    }
}

/// Apply an enclosing `required` list to a copied property.
fn require(property: &mut Property) {
    if property.is_required() || matches!(property.default, PropertyDefault::None) {
        return;
    }
    property.nullable = false;
    property.default = PropertyDefault::None;
    property.constraints.insert(0, Constraint::Required);
}
