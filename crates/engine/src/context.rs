//! Copy-on-write workflow context addressed by dotted paths.
//!
//! A [`Context`] is an ordered mapping from key to [`Value`]. Lookups never fail: a missing
//! key, or a path that runs through a non-mapping value, simply yields `None`. Writes never
//! mutate in place; [`Context::set`] returns a new context in which only the mappings along
//! the written path have been copied, while every other branch is shared with the original.

use std::sync::Arc;

use effectflow_types::{Value, ValueMap};
use serde::{Deserialize, Serialize};

use crate::error::ContextError;

/// Workflow state threaded from effect to effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    entries: Arc<ValueMap>,
}

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context from an owned map.
    pub fn from_map(entries: ValueMap) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Returns the value at `path`, or `None` when any segment is missing or not a mapping.
    ///
    /// An empty path yields `None`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let segments = path_segments(path);
        let (first, rest) = segments.split_first()?;
        let mut current = self.entries.get(*first)?;
        for segment in rest {
            current = current.as_mapping()?.get(*segment)?;
        }
        Some(current)
    }

    /// Returns true when a value exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Returns a new context with `value` placed at `path`.
    ///
    /// Mappings along the path are copied; intermediate values that are missing or are not
    /// mappings are replaced by fresh mappings. An empty path returns the context unchanged.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> Context {
        let segments = path_segments(path);
        if segments.is_empty() {
            return self.clone();
        }
        Self::from_map(write_path(&self.entries, &segments, value.into()))
    }

    /// Returns a new context with `value` stored under the literal top-level `key`.
    ///
    /// Unlike [`Context::set`], dots in `key` are not treated as separators.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Context {
        let mut entries = ValueMap::clone(&self.entries);
        entries.insert(key.into(), value.into());
        Self::from_map(entries)
    }

    /// Applies a `path=value` assignment, parsing the right-hand side as a YAML scalar or
    /// collection. Text that is not valid YAML is stored as a plain string.
    pub fn apply_assignment(&self, assignment: &str) -> Result<Context, ContextError> {
        let (path, raw_value) = assignment
            .split_once('=')
            .ok_or_else(|| ContextError::InvalidAssignment(assignment.to_string()))?;
        validate_path(path)?;
        let raw_value = raw_value.trim();
        let value = if raw_value.is_empty() {
            Value::String(String::new())
        } else {
            serde_yaml::from_str::<Value>(raw_value).unwrap_or_else(|_| Value::String(raw_value.to_string()))
        };
        Ok(self.set(path, value))
    }

    /// Read-only view of the top-level entries.
    pub fn entries(&self) -> &ValueMap {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the whole context as a mapping value sharing the same storage.
    pub fn to_value(&self) -> Value {
        Value::Mapping(Arc::clone(&self.entries))
    }

    /// Returns true when both contexts share the same top-level storage.
    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl From<ValueMap> for Context {
    fn from(entries: ValueMap) -> Self {
        Self::from_map(entries)
    }
}

/// Splits a dotted path into its segments. Surrounding whitespace is ignored and an empty
/// path has no segments.
pub fn path_segments(path: &str) -> Vec<&str> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('.').collect()
}

/// Rejects paths that cannot address a value: empty paths and paths with empty segments
/// (`"a..b"`, `".a"`, `"a."`).
pub fn validate_path(path: &str) -> Result<(), ContextError> {
    let segments = path_segments(path);
    if segments.is_empty() {
        return Err(ContextError::MalformedPath {
            path: path.to_string(),
            reason: "path is empty",
        });
    }
    if segments.iter().any(|segment| segment.trim().is_empty()) {
        return Err(ContextError::MalformedPath {
            path: path.to_string(),
            reason: "path contains an empty segment",
        });
    }
    Ok(())
}

fn write_path(entries: &ValueMap, segments: &[&str], value: Value) -> ValueMap {
    let mut copied = entries.clone();
    match segments {
        [] => {}
        [leaf] => {
            copied.insert(leaf.to_string(), value);
        }
        [head, rest @ ..] => {
            let child = match entries.get(*head) {
                Some(Value::Mapping(nested)) => write_path(nested, rest, value),
                _ => write_path(&ValueMap::new(), rest, value),
            };
            copied.insert(head.to_string(), Value::mapping(child));
        }
    }
    copied
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Context {
        let yaml = "a:\n  b:\n    c: 1\n  sibling: keep\nother:\n  deep: {x: true}\nscalar: 5\n";
        serde_yaml::from_str(yaml).expect("parse sample context")
    }

    #[test]
    fn get_walks_nested_mappings() {
        let context = sample();
        assert_eq!(context.get("a.b.c"), Some(&Value::from(1)));
        assert_eq!(context.get(" a.sibling "), Some(&Value::from("keep")));
        assert!(context.get("a.b").is_some_and(|value| value.as_mapping().is_some()));
    }

    #[test]
    fn get_yields_none_for_missing_or_non_mapping_segments() {
        let context = sample();
        assert_eq!(context.get("a.missing"), None);
        assert_eq!(context.get("scalar.inner"), None);
        assert_eq!(context.get("a.b.c.d"), None);
        assert_eq!(context.get(""), None);
        assert_eq!(context.get("   "), None);
    }

    #[test]
    fn set_then_get_returns_written_value() {
        let context = sample();
        for path in ["a.b.c", "a.b.new", "fresh", "fresh.nested.leaf", "scalar.now_mapping"] {
            let updated = context.set(path, "written");
            assert_eq!(updated.get(path), Some(&Value::from("written")), "path {path}");
        }
    }

    #[test]
    fn set_never_mutates_the_input() {
        let context = sample();
        let snapshot = context.clone();

        let updated = context.set("a.b.c", 99);

        assert_eq!(context, snapshot);
        assert!(context.ptr_eq(&snapshot));
        assert_eq!(context.get("a.b.c"), Some(&Value::from(1)));
        assert_eq!(updated.get("a.b.c"), Some(&Value::from(99)));
    }

    #[test]
    fn set_shares_branches_off_the_written_path() {
        let context = sample();
        let updated = context.set("a.b.c", 2);

        let original_other = context.entries().get("other").and_then(|value| match value {
            Value::Mapping(map) => Some(map.clone()),
            _ => None,
        });
        let updated_other = updated.entries().get("other").and_then(|value| match value {
            Value::Mapping(map) => Some(map.clone()),
            _ => None,
        });
        let (Some(original_other), Some(updated_other)) = (original_other, updated_other) else {
            panic!("expected 'other' to stay a mapping");
        };
        assert!(Arc::ptr_eq(&original_other, &updated_other));
        assert_eq!(updated.get("a.sibling"), Some(&Value::from("keep")));
    }

    #[test]
    fn set_keeps_key_positions() {
        let updated = sample().set("a", 0);
        let keys = updated.entries().keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys, vec!["a".to_string(), "other".to_string(), "scalar".to_string()]);
    }

    #[test]
    fn empty_path_set_is_a_no_op() {
        let context = sample();
        let updated = context.set("", 1);
        assert!(updated.ptr_eq(&context));
    }

    #[test]
    fn insert_treats_dots_literally() {
        let updated = Context::new().insert("step.one", "done");
        assert_eq!(updated.entries().get("step.one"), Some(&Value::from("done")));
        assert_eq!(updated.get("step.one"), None);
    }

    #[test]
    fn assignments_parse_yaml_values() {
        let context = Context::new()
            .apply_assignment("x=2")
            .and_then(|context| context.apply_assignment("nested.flag=true"))
            .and_then(|context| context.apply_assignment("name=[unclosed"))
            .expect("apply assignments");

        assert_eq!(context.get("x"), Some(&Value::from(2)));
        assert_eq!(context.get("nested.flag"), Some(&Value::from(true)));
        assert_eq!(context.get("name"), Some(&Value::from("[unclosed")));

        assert!(matches!(
            Context::new().apply_assignment("no-equals-sign"),
            Err(ContextError::InvalidAssignment(_))
        ));
        assert!(matches!(
            Context::new().apply_assignment("a..b=1"),
            Err(ContextError::MalformedPath { .. })
        ));
    }

    #[test]
    fn validate_path_rejects_empty_segments() {
        assert!(validate_path("a.b").is_ok());
        assert!(validate_path("a..b").is_err());
        assert!(validate_path(".a").is_err());
        assert!(validate_path("a.").is_err());
        assert!(validate_path("").is_err());
    }
}
