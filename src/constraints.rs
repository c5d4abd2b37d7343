//! Constraint translator.
//!
//! Turns the constraints of a property into the ordered guard list every
//! backend renders. Order and message text are fixed:
//!
//! | Order | Keyword | Message |
//! |-------|---------|---------|
//! | 1 | `required` | `Must not be null - <name>` |
//! | 2 | `minimum` | `<name> < minimum <n> - <value>` |
//! | 3 | `exclusiveMinimum` | `<name> <= exclusiveMinimum <n> - <value>` |
//! | 4 | `maximum` | `<name> > maximum <n> - <value>` |
//! | 5 | `exclusiveMaximum` | `<name> >= exclusiveMaximum <n> - <value>` |
//! | 6 | `minLength` | `<name> length < minimum <n> - <length>` |
//! | 7 | `maxLength` | `<name> length > maximum <n> - <length>` |
//! | 8 | `pattern` | `<name> does not match pattern <re> - <value>` |
//! | 9 | `minItems` | `<name> size < minimum <n> - <size>` |
//! | 10 | `maxItems` | `<name> size > maximum <n> - <size>` |
//! | 11 | `uniqueItems` | `<name> contains duplicate items - <count>` |
//!
//! `<count>` is the number of elements equal to an earlier element.
//!
//! Guards on array elements follow the property's own guards in the same
//! order, with `<name> item` as the subject.

use crate::model::{Constraint, Property, Type};

/// What a guard inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    /// The property value.
    Value,
    /// Each element of a sequence property.
    Item,
}

/// The runtime quantity a failure message ends with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actual {
    None,
    Value,
    Length,
    Size,
    /// Elements repeating an earlier element.
    Duplicates,
}

/// One check a generated constructor performs.
#[derive(Debug, Clone, PartialEq)]
pub struct Guard {
    /// Property name as written in the schema.
    pub property: String,
    pub subject: Subject,
    pub constraint: Constraint,
    /// The property may be null; the check applies only when it is present.
    pub when_present: bool,
}

impl Guard {
    pub fn is_null_check(&self) -> bool {
        self.constraint == Constraint::Required
    }

    /// Name used in messages: the property name, or `<name> item`.
    pub fn subject_name(&self) -> String {
        match self.subject {
            Subject::Value => self.property.clone(),
            Subject::Item => format!("{} item", self.property),
        }
    }

    pub fn actual(&self) -> Actual {
        match self.constraint {
            Constraint::Required => Actual::None,
            Constraint::Minimum(_)
            | Constraint::Maximum(_)
            | Constraint::ExclusiveMinimum(_)
            | Constraint::ExclusiveMaximum(_)
            | Constraint::Pattern(_) => Actual::Value,
            Constraint::MinLength(_) | Constraint::MaxLength(_) => Actual::Length,
            Constraint::MinItems(_) | Constraint::MaxItems(_) => Actual::Size,
            Constraint::UniqueItems => Actual::Duplicates,
        }
    }

    /// Literal part of the failure message. When [`Guard::actual`] is not
    /// `Actual::None`, backends append `" - "` and the runtime quantity.
    pub fn message_prefix(&self) -> String {
        let name = self.subject_name();
        match &self.constraint {
            Constraint::Required => format!("Must not be null - {}", name),
            Constraint::Minimum(n) => format!("{} < minimum {}", name, n),
            Constraint::ExclusiveMinimum(n) => format!("{} <= exclusiveMinimum {}", name, n),
            Constraint::Maximum(n) => format!("{} > maximum {}", name, n),
            Constraint::ExclusiveMaximum(n) => format!("{} >= exclusiveMaximum {}", name, n),
            Constraint::MinLength(n) => format!("{} length < minimum {}", name, n),
            Constraint::MaxLength(n) => format!("{} length > maximum {}", name, n),
            Constraint::Pattern(p) => format!("{} does not match pattern {}", name, p),
            Constraint::MinItems(n) => format!("{} size < minimum {}", name, n),
            Constraint::MaxItems(n) => format!("{} size > maximum {}", name, n),
            Constraint::UniqueItems => format!("{} contains duplicate items", name),
        }
    }
}

/// Guards for one property, in evaluation order.
///
/// Unconstrained properties yield no guards.
pub fn guards(property: &Property) -> Vec<Guard> {
    let mut result: Vec<Guard> = ordered(&property.constraints)
        .into_iter()
        .map(|constraint| Guard {
            property: property.name.clone(),
            subject: Subject::Value,
            constraint: constraint.clone(),
            when_present: property.nullable,
        })
        .collect();

    if let Type::SequenceOf(element) = &property.ty {
        result.extend(
            ordered(&element.constraints)
                .into_iter()
                .filter(|constraint| **constraint != Constraint::Required)
                .map(|constraint| Guard {
                    property: property.name.clone(),
                    subject: Subject::Item,
                    constraint: constraint.clone(),
                    when_present: property.nullable,
                }),
        );
    }
    result
}

fn ordered(constraints: &[Constraint]) -> Vec<&Constraint> {
    let mut ordered: Vec<&Constraint> = constraints.iter().collect();
    ordered.sort_by_key(|constraint| precedence(constraint));
    ordered
}

fn precedence(constraint: &Constraint) -> u8 {
    match constraint {
        Constraint::Required => 0,
        Constraint::Minimum(_) => 1,
        Constraint::ExclusiveMinimum(_) => 2,
        Constraint::Maximum(_) => 3,
        Constraint::ExclusiveMaximum(_) => 4,
        Constraint::MinLength(_) => 5,
        Constraint::MaxLength(_) => 6,
        Constraint::Pattern(_) => 7,
        Constraint::MinItems(_) => 8,
        Constraint::MaxItems(_) => 9,
        Constraint::UniqueItems => 10,
    }
}
