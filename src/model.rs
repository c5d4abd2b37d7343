//! Class model: the language-agnostic representation generated code is
//! rendered from.
//!
//! Classes live in an arena ([`ClassGraph`]) and refer to each other by
//! [`ClassId`], so recursive schemas become plain back-references and a
//! class reached through several `$ref` paths exists exactly once.

use std::fmt;
use std::ops::Index;

use serde_json::Number;

/// Index of a class within its [`ClassGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) usize);

impl ClassId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Shape of a generated class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// No properties: rendered as a bare class.
    Plain,
    /// Value class with properties and structural equality.
    Data,
    /// Open class extended by `oneOf`/`anyOf` variants or by `allOf`
    /// subclasses.
    OpenBase,
    /// Class extending an [`ClassKind::OpenBase`].
    Variant,
}

/// One generated type.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassModel {
    pub id: ClassId,
    pub package: String,
    /// Class this one is declared inside, if any.
    pub enclosing: Option<ClassId>,
    pub name: String,
    pub kind: ClassKind,
    /// Canonical pointer of the schema node the class was built from.
    pub pointer: String,
    pub description: Option<String>,
    pub properties: Vec<Property>,
    /// Class this one extends: the `oneOf`/`anyOf` base of a variant or
    /// the `allOf` reference of a subclass.
    pub base: Option<ClassId>,
    /// Nested classes, in the order they were first reached.
    pub nested: Vec<ClassId>,
    /// Enums declared inside this class.
    pub enums: Vec<EnumModel>,
}

impl ClassModel {
    pub fn is_top_level(&self) -> bool {
        self.enclosing.is_none()
    }
}

/// A string enumeration declared inside a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumModel {
    pub name: String,
    pub values: Vec<String>,
}

/// A field of a generated class.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Name as written in the schema.
    pub name: String,
    pub ty: Type,
    pub nullable: bool,
    pub default: PropertyDefault,
    /// Constraints on the property value itself, in keyword order.
    pub constraints: Vec<Constraint>,
    pub description: Option<String>,
}

impl Property {
    pub fn has_default(&self) -> bool {
        !matches!(self.default, PropertyDefault::None)
    }

    pub fn is_required(&self) -> bool {
        self.constraints.contains(&Constraint::Required)
    }
}

/// Default applied when a property is not supplied.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyDefault {
    /// Required property: no default.
    None,
    /// Optional property without an explicit default: absent (null).
    Absent,
    Value(DefaultValue),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    String(String),
    Number(Number),
    Boolean(bool),
}

/// Primitive value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Int,
    Long,
    Decimal,
    Double,
    Boolean,
}

/// String formats with a native representation on some targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringFormat {
    DateTime,
    Date,
    Time,
    Uuid,
    Uri,
}

impl StringFormat {
    pub fn parse(format: &str) -> Option<Self> {
        match format {
            "date-time" => Some(StringFormat::DateTime),
            "date" => Some(StringFormat::Date),
            "time" => Some(StringFormat::Time),
            "uuid" => Some(StringFormat::Uuid),
            "uri" => Some(StringFormat::Uri),
            _ => None,
        }
    }
}

/// Declared type of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Primitive(PrimitiveKind, Option<StringFormat>),
    ClassRef(ClassId),
    SequenceOf(Box<Element>),
    MapOf(Box<Type>, Box<Type>),
    /// Reference to an enum declared inside `owner`.
    EnumOf {
        owner: ClassId,
        name: String,
        values: Vec<String>,
    },
}

impl Type {
    pub fn string() -> Self {
        Type::Primitive(PrimitiveKind::String, None)
    }
}

/// Element type of a sequence, with the constraints each element must meet.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub ty: Type,
    pub constraints: Vec<Constraint>,
}

/// A validation keyword with its operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Minimum(Number),
    Maximum(Number),
    ExclusiveMinimum(Number),
    ExclusiveMaximum(Number),
    MinLength(u64),
    MaxLength(u64),
    Pattern(String),
    MinItems(u64),
    MaxItems(u64),
    UniqueItems,
    Required,
}

impl Constraint {
    /// Keyword the constraint was read from.
    pub fn keyword(&self) -> &'static str {
        match self {
            Constraint::Minimum(_) => "minimum",
            Constraint::Maximum(_) => "maximum",
            Constraint::ExclusiveMinimum(_) => "exclusiveMinimum",
            Constraint::ExclusiveMaximum(_) => "exclusiveMaximum",
            Constraint::MinLength(_) => "minLength",
            Constraint::MaxLength(_) => "maxLength",
            Constraint::Pattern(_) => "pattern",
            Constraint::MinItems(_) => "minItems",
            Constraint::MaxItems(_) => "maxItems",
            Constraint::UniqueItems => "uniqueItems",
            Constraint::Required => "required",
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Minimum(n)
            | Constraint::Maximum(n)
            | Constraint::ExclusiveMinimum(n)
            | Constraint::ExclusiveMaximum(n) => write!(f, "{} {}", self.keyword(), n),
            Constraint::MinLength(n)
            | Constraint::MaxLength(n)
            | Constraint::MinItems(n)
            | Constraint::MaxItems(n) => write!(f, "{} {}", self.keyword(), n),
            Constraint::Pattern(p) => write!(f, "pattern {}", p),
            Constraint::UniqueItems | Constraint::Required => f.write_str(self.keyword()),
        }
    }
}

/// Arena of every class built during one generation run.
///
/// Immutable once returned by the builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassGraph {
    classes: Vec<ClassModel>,
}

impl ClassGraph {
    pub(crate) fn from_classes(classes: Vec<ClassModel>) -> Self {
        Self { classes }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn get(&self, id: ClassId) -> Option<&ClassModel> {
        self.classes.get(id.0)
    }

    /// All classes in construction order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassModel> {
        self.classes.iter()
    }

    /// Classes that get a file of their own.
    pub fn top_level(&self) -> impl Iterator<Item = &ClassModel> {
        self.classes.iter().filter(|c| c.is_top_level())
    }

    /// Find a top-level class by simple name.
    pub fn find(&self, name: &str) -> Option<&ClassModel> {
        self.top_level().find(|c| c.name == name)
    }

    /// Name qualified by its enclosing classes, e.g. `TypeA.B`.
    pub fn qualified_name(&self, id: ClassId) -> String {
        self.enclosing_chain(id)
            .into_iter()
            .chain(std::iter::once(id))
            .map(|c| self[c].name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Enclosing classes of `id`, outermost first.
    pub fn enclosing_chain(&self, id: ClassId) -> Vec<ClassId> {
        let mut chain = Vec::new();
        let mut current = self[id].enclosing;
        while let Some(outer) = current {
            chain.push(outer);
            current = self[outer].enclosing;
        }
        chain.reverse();
        chain
    }

    /// The top-level class whose file contains `id`.
    pub fn outermost(&self, id: ClassId) -> ClassId {
        self.enclosing_chain(id).first().copied().unwrap_or(id)
    }

    /// Properties inherited from the base chain, root-most base first.
    pub fn inherited_properties(&self, id: ClassId) -> Vec<&Property> {
        let mut bases = Vec::new();
        let mut current = self[id].base;
        while let Some(base) = current {
            bases.push(base);
            current = self[base].base;
        }
        bases
            .into_iter()
            .rev()
            .flat_map(|base| self[base].properties.iter())
            .collect()
    }
}

impl Index<ClassId> for ClassGraph {
    type Output = ClassModel;

    fn index(&self, id: ClassId) -> &ClassModel {
        &self.classes[id.0]
    }
}
