//! Name derivation for generated types, fields and enum constants.

use heck::{ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};

use crate::types::TargetLanguage;

/// Canonical type-name casing (`UpperCamelCase`).
///
/// Names that would start with a digit get a leading underscore.
pub fn type_name(raw: &str) -> String {
    prefix_digit(raw.to_upper_camel_case())
}

/// Canonical field-name casing (`lowerCamelCase`) used by the JVM targets.
pub fn field_name(raw: &str) -> String {
    prefix_digit(raw.to_lower_camel_case())
}

/// Module and file name for the Rust target.
pub fn module_name(type_name: &str) -> String {
    type_name.to_snake_case()
}

/// Enum constant for a string value, or `None` if the value yields no
/// usable identifier.
pub fn enum_constant(value: &str, language: TargetLanguage) -> Option<String> {
    let constant = match language {
        TargetLanguage::Kotlin | TargetLanguage::Java => value.to_shouty_snake_case(),
        TargetLanguage::Rust => value.to_upper_camel_case(),
    };
    if is_identifier(&constant) && !is_keyword(&constant, language) {
        Some(constant)
    } else {
        None
    }
}

/// Whether `s` is an ASCII identifier: a letter or underscore followed by
/// letters, digits or underscores.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Field identifier in the target's casing, escaped if it is a keyword.
pub fn field_ident(raw: &str, language: TargetLanguage) -> String {
    match language {
        TargetLanguage::Kotlin => {
            let name = field_name(raw);
            if is_keyword(&name, language) {
                format!("`{}`", name)
            } else {
                name
            }
        }
        TargetLanguage::Java => {
            let name = field_name(raw);
            if is_keyword(&name, language) {
                format!("{}_", name)
            } else {
                name
            }
        }
        TargetLanguage::Rust => {
            let name = prefix_digit(raw.to_snake_case());
            match name.as_str() {
                // Not usable as raw identifiers.
                "self" | "Self" | "super" | "crate" => format!("{}_", name),
                _ if is_keyword(&name, language) => format!("r#{}", name),
                _ => name,
            }
        }
    }
}

/// Whether `s` is reserved in the target language.
pub fn is_keyword(s: &str, language: TargetLanguage) -> bool {
    match language {
        TargetLanguage::Kotlin => is_kotlin_keyword(s),
        TargetLanguage::Java => is_java_keyword(s),
        TargetLanguage::Rust => is_rust_keyword(s),
    }
}

fn prefix_digit(name: String) -> String {
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", name)
    } else {
        name
    }
}

/// Kotlin hard keywords.
fn is_kotlin_keyword(s: &str) -> bool {
    matches!(
        s,
        "as" | "break"
            | "class"
            | "continue"
            | "do"
            | "else"
            | "false"
            | "for"
            | "fun"
            | "if"
            | "in"
            | "interface"
            | "is"
            | "null"
            | "object"
            | "package"
            | "return"
            | "super"
            | "this"
            | "throw"
            | "true"
            | "try"
            | "typealias"
            | "typeof"
            | "val"
            | "var"
            | "when"
            | "while"
    )
}

fn is_java_keyword(s: &str) -> bool {
    matches!(
        s,
        "abstract"
            | "assert"
            | "boolean"
            | "break"
            | "byte"
            | "case"
            | "catch"
            | "char"
            | "class"
            | "const"
            | "continue"
            | "default"
            | "do"
            | "double"
            | "else"
            | "enum"
            | "extends"
            | "false"
            | "final"
            | "finally"
            | "float"
            | "for"
            | "goto"
            | "if"
            | "implements"
            | "import"
            | "instanceof"
            | "int"
            | "interface"
            | "long"
            | "native"
            | "new"
            | "null"
            | "package"
            | "private"
            | "protected"
            | "public"
            | "return"
            | "short"
            | "static"
            | "strictfp"
            | "super"
            | "switch"
            | "synchronized"
            | "this"
            | "throw"
            | "throws"
            | "transient"
            | "true"
            | "try"
            | "void"
            | "volatile"
            | "while"
    )
}

fn is_rust_keyword(s: &str) -> bool {
    matches!(
        s,
        "as" | "break"
            | "const"
            | "continue"
            | "crate"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "self"
            | "Self"
            | "static"
            | "struct"
            | "super"
            | "trait"
            | "true"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
            | "async"
            | "await"
            | "dyn"
            | "abstract"
            | "become"
            | "box"
            | "do"
            | "final"
            | "macro"
            | "override"
            | "priv"
            | "typeof"
            | "unsized"
            | "virtual"
            | "yield"
            | "try"
    )
}
