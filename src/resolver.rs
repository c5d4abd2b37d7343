//! Reference resolution within a single schema document.
//!
//! Pointers are accepted in fragment form (`#/$defs/Name`) or plain JSON
//! Pointer form (`/definitions/Name`) and canonicalized to the plain form,
//! which is also the key the class model builder caches under.

use serde_json::Value;

use crate::error::{display_pointer, GenerateError};

/// A reference resolved to the node it designates.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRef<'a> {
    /// Canonical pointer of the designated node.
    pub pointer: String,
    pub node: &'a Value,
}

/// Resolves `$ref` pointers against a document root.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    root: &'a Value,
}

impl<'a> Resolver<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &'a Value {
        self.root
    }

    /// Resolve a pointer to the node it designates.
    ///
    /// # Errors
    ///
    /// Returns `GenerateError::UnresolvedReference` if any segment is
    /// missing, or if the reference points outside this document.
    pub fn resolve(&self, pointer: &str) -> Result<&'a Value, GenerateError> {
        let canonical = canonical_pointer(pointer).ok_or_else(|| unresolved(pointer))?;
        tracing::trace!(pointer = %canonical, "resolving pointer");
        navigate(self.root, &canonical).ok_or_else(|| unresolved(pointer))
    }

    /// Follow a chain of `$ref` nodes starting at `node` until a node
    /// without `$ref` is reached.
    ///
    /// Returns the final node together with its canonical pointer. A chain
    /// that revisits a pointer before reaching a concrete schema is a cycle
    /// no type can represent.
    pub fn follow(&self, pointer: &str, node: &'a Value) -> Result<ResolvedRef<'a>, GenerateError> {
        let mut current_pointer = pointer.to_string();
        let mut current = node;
        let mut in_progress: Vec<String> = Vec::new();

        while let Some(reference) = ref_of(current) {
            let target = canonical_pointer(reference).ok_or_else(|| unresolved(reference))?;
            if in_progress.contains(&target) {
                return Err(GenerateError::CyclicReference {
                    pointer: display_pointer(&target),
                });
            }
            in_progress.push(current_pointer);
            current = self.resolve(reference)?;
            current_pointer = target;
        }

        Ok(ResolvedRef {
            pointer: current_pointer,
            node: current,
        })
    }

    /// Iterate the members of a definitions container in document order.
    ///
    /// Each item is the member name plus the reference to its node. Members
    /// are not followed, so an alias member keeps its own pointer.
    ///
    /// # Errors
    ///
    /// Fails with `UnresolvedReference` if the container is missing, and
    /// with `UnsupportedSchemaConstruct` if it is not an object.
    pub fn definitions(
        &self,
        container: &str,
    ) -> Result<impl Iterator<Item = (&'a str, ResolvedRef<'a>)> + 'a, GenerateError> {
        let base = canonical_pointer(container).ok_or_else(|| unresolved(container))?;
        let node = self.resolve(container)?;
        let members = node.as_object().ok_or_else(|| {
            GenerateError::unsupported(&base, "definitions container is not an object")
        })?;

        Ok(members.iter().map(move |(name, node)| {
            let pointer = child_pointer(&base, name);
            (name.as_str(), ResolvedRef { pointer, node })
        }))
    }
}

/// Return the `$ref` string of a node, if it has one.
pub fn ref_of(node: &Value) -> Option<&str> {
    node.get("$ref").and_then(Value::as_str)
}

/// Canonicalize a document-local pointer.
///
/// `#`, `#/a/b` and `/a/b` are accepted; the result has no leading `#`.
/// References into other documents (`other.json#/a`) return `None`.
pub fn canonical_pointer(pointer: &str) -> Option<String> {
    let path = pointer.strip_prefix('#').unwrap_or(pointer);
    if path.is_empty() {
        return Some(String::new());
    }
    if !path.starts_with('/') {
        return None;
    }
    Some(path.to_string())
}

/// Append one member name to a canonical pointer, escaping as RFC 6901 requires.
pub fn child_pointer(parent: &str, name: &str) -> String {
    format!("{}/{}", parent, name.replace('~', "~0").replace('/', "~1"))
}

/// The final segment of a pointer, unescaped.
pub fn last_segment(pointer: &str) -> String {
    let segment = pointer.rsplit('/').next().unwrap_or(pointer);
    segment.replace("~1", "/").replace("~0", "~")
}

/// Every segment of a canonical pointer, unescaped.
pub fn segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect()
}

fn navigate<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    if pointer.is_empty() {
        return Some(root);
    }

    let mut current = root;
    for part in pointer.trim_start_matches('/').split('/') {
        // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
        let key = part.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Object(map) => map.get(&key)?,
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn unresolved(pointer: &str) -> GenerateError {
    GenerateError::UnresolvedReference {
        pointer: pointer.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "$defs": {
                "Person": { "type": "object" },
                "Alias": { "$ref": "#/$defs/Person" },
                "Loop1": { "$ref": "#/$defs/Loop2" },
                "Loop2": { "$ref": "#/$defs/Loop1" },
                "a/b": { "type": "string" }
            },
            "list": [ { "type": "integer" } ]
        })
    }

    #[test]
    fn canonical_forms() {
        assert_eq!(canonical_pointer("#").as_deref(), Some(""));
        assert_eq!(canonical_pointer("#/$defs/A").as_deref(), Some("/$defs/A"));
        assert_eq!(canonical_pointer("/definitions/A").as_deref(), Some("/definitions/A"));
        assert_eq!(canonical_pointer("other.json#/A"), None);
    }

    #[test]
    fn resolve_fragment_and_plain_pointer() {
        let doc = document();
        let resolver = Resolver::new(&doc);
        assert_eq!(resolver.resolve("#/$defs/Person").unwrap()["type"], "object");
        assert_eq!(resolver.resolve("/$defs/Person").unwrap()["type"], "object");
        assert_eq!(resolver.resolve("#").unwrap(), &doc);
    }

    #[test]
    fn resolve_escaped_and_array_segments() {
        let doc = document();
        let resolver = Resolver::new(&doc);
        assert_eq!(resolver.resolve("#/$defs/a~1b").unwrap()["type"], "string");
        assert_eq!(resolver.resolve("/list/0").unwrap()["type"], "integer");
    }

    #[test]
    fn unresolved_names_pointer() {
        let doc = document();
        let resolver = Resolver::new(&doc);
        let err = resolver.resolve("#/$defs/Missing").unwrap_err();
        match err {
            GenerateError::UnresolvedReference { pointer } => {
                assert_eq!(pointer, "#/$defs/Missing");
            }
            other => panic!("expected UnresolvedReference, got {other:?}"),
        }
    }

    #[test]
    fn external_reference_is_unresolved() {
        let doc = document();
        let resolver = Resolver::new(&doc);
        assert!(matches!(
            resolver.resolve("person.json#/Person"),
            Err(GenerateError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn follow_alias_chain() {
        let doc = document();
        let resolver = Resolver::new(&doc);
        let alias = resolver.resolve("#/$defs/Alias").unwrap();
        let resolved = resolver.follow("/$defs/Alias", alias).unwrap();
        assert_eq!(resolved.pointer, "/$defs/Person");
        assert_eq!(resolved.node["type"], "object");
    }

    #[test]
    fn follow_detects_alias_cycle() {
        let doc = document();
        let resolver = Resolver::new(&doc);
        let start = resolver.resolve("#/$defs/Loop1").unwrap();
        let err = resolver.follow("/$defs/Loop1", start).unwrap_err();
        assert!(matches!(err, GenerateError::CyclicReference { .. }));
    }

    #[test]
    fn definitions_in_document_order() {
        let doc = document();
        let resolver = Resolver::new(&doc);
        let names: Vec<(&str, String)> = resolver
            .definitions("#/$defs")
            .unwrap()
            .map(|(name, resolved)| (name, resolved.pointer))
            .collect();
        assert_eq!(names[0], ("Person", "/$defs/Person".to_string()));
        assert_eq!(names[1].0, "Alias");
        assert_eq!(names[4], ("a/b", "/$defs/a~1b".to_string()));
    }

    #[test]
    fn segments_unescape() {
        assert_eq!(segments("/$defs/a~1b/properties/c~0d"), vec!["$defs", "a/b", "properties", "c~d"]);
        assert!(segments("").is_empty());
    }

    #[test]
    fn last_segment_unescapes() {
        assert_eq!(last_segment("/$defs/Person"), "Person");
        assert_eq!(last_segment("/$defs/a~1b"), "a/b");
        assert_eq!(last_segment(""), "");
    }

    #[test]
    fn definitions_container_must_be_object() {
        let doc = document();
        let resolver = Resolver::new(&doc);
        assert!(matches!(
            resolver.definitions("/list"),
            Err(GenerateError::UnsupportedSchemaConstruct { .. })
        ));
        assert!(matches!(
            resolver.definitions("/components/schemas"),
            Err(GenerateError::UnresolvedReference { .. })
        ));
    }
}
