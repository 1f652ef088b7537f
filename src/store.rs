//! Configuration stores the engine reads from and writes back to.
//!
//! The engine only needs two things from a store: a snapshot of the subtree
//! at a dotted path, and a way to swap that subtree in one step. [`MemoryStore`]
//! is the in-process implementation, with layering helpers for merging trees,
//! TOML documents, and environment variables.

use serde_json::{Map, Value};

use crate::env;
use crate::error::TransfigError;
use crate::merge::deep_merge;
use crate::path;
use crate::types::Tree;

/// A hierarchical configuration store addressed by dotted paths.
pub trait ConfigStore {
    /// Copy of the subtree at `path`, or `None` if nothing is there.
    fn snapshot(&self, path: &str) -> Option<Tree>;

    /// Replace the subtree at `path`. Readers see either the old tree or the
    /// new one, never a mix.
    fn replace(&mut self, path: &str, subtree: Tree) -> Result<(), TransfigError>;
}

/// In-memory store. The root is always a mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryStore {
    root: Tree,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing tree. The tree must be a mapping.
    pub fn from_tree(tree: Tree) -> Result<Self, TransfigError> {
        let root = into_mapping(tree, "")?;
        Ok(Self {
            root: Value::Object(root),
        })
    }

    pub fn root(&self) -> &Tree {
        &self.root
    }

    pub fn into_tree(self) -> Tree {
        self.root
    }

    /// Value at a dotted path. Segments match keys case-insensitively; numeric
    /// segments index into sequences.
    pub fn get(&self, path: &str) -> Option<&Tree> {
        if path.is_empty() {
            return Some(&self.root);
        }
        let mut current = &self.root;
        for segment in path::split(path) {
            current = match current {
                Value::Object(map) => map.get(&find_key(map, segment)?)?,
                Value::Array(items) => items.get(path::as_index(segment)?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Deep-merge `overlay` into the root. Mappings recurse; everything else in
    /// the overlay wins. Keys land on existing keys that match ignoring case.
    pub fn merge(&mut self, overlay: Tree) -> Result<(), TransfigError> {
        let overlay = into_mapping(overlay, "")?;
        let base = match std::mem::take(&mut self.root) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.root = Value::Object(deep_merge(base, overlay));
        Ok(())
    }

    /// Nest `data` under a dotted path and merge it in. An empty path merges at
    /// the root.
    pub fn load_at(&mut self, at: &str, data: Tree) -> Result<(), TransfigError> {
        if at.is_empty() {
            return self.merge(data);
        }
        path::validate_store_path(at)?;
        let mut nested = data;
        for segment in path::split(at).into_iter().rev() {
            let mut map = Map::new();
            map.insert(segment.to_string(), nested);
            nested = Value::Object(map);
        }
        self.merge(nested)
    }

    /// Merge a TOML document into the root.
    pub fn load_toml_str(&mut self, content: &str) -> Result<(), TransfigError> {
        let table: toml::Table = toml::from_str(content)?;
        self.merge(serde_json::to_value(table)?)
    }

    /// Merge `{PREFIX}__A__B=v` variables as `a.b = v`.
    pub fn load_env(
        &mut self,
        prefix: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), TransfigError> {
        let layer = env::env_to_map(prefix, vars);
        tracing::debug!(prefix, keys = layer.len(), "merging environment layer");
        self.merge(Value::Object(layer))
    }
}

impl ConfigStore for MemoryStore {
    fn snapshot(&self, path: &str) -> Option<Tree> {
        self.get(path).cloned()
    }

    fn replace(&mut self, path: &str, subtree: Tree) -> Result<(), TransfigError> {
        path::validate_store_path(path)?;
        let mut next = self.root.clone();
        set_nested(&mut next, path, subtree)?;
        self.root = next;
        Ok(())
    }
}

/// Set `value` at a dotted path, creating intermediate mappings on demand.
fn set_nested(root: &mut Value, dotted_key: &str, value: Value) -> Result<(), TransfigError> {
    let segments = path::split(dotted_key);
    let Some((leaf, parents)) = segments.split_last() else {
        return Ok(());
    };

    let mut current = root;
    for segment in parents {
        current = child_mut(current, segment, dotted_key)?;
    }

    match current {
        Value::Object(map) => {
            let key = find_key(map, leaf).unwrap_or_else(|| leaf.to_string());
            map.insert(key, value);
        }
        Value::Array(items) => {
            let slot = path::as_index(leaf)
                .and_then(|i| items.get_mut(i))
                .ok_or_else(|| shape_error(dotted_key, "index is out of range"))?;
            *slot = value;
        }
        _ => return Err(shape_error(dotted_key, "parent is not a container")),
    }
    Ok(())
}

fn child_mut<'a>(
    node: &'a mut Value,
    segment: &str,
    dotted_key: &str,
) -> Result<&'a mut Value, TransfigError> {
    match node {
        Value::Object(map) => {
            let key = find_key(map, segment).unwrap_or_else(|| segment.to_string());
            Ok(map
                .entry(key)
                .or_insert_with(|| Value::Object(Map::new())))
        }
        Value::Array(items) => path::as_index(segment)
            .and_then(|i| items.get_mut(i))
            .ok_or_else(|| shape_error(dotted_key, "index is out of range")),
        _ => Err(shape_error(dotted_key, "intermediate value is not a container")),
    }
}

/// Existing key matching `segment`, exactly or ignoring ASCII case.
fn find_key(map: &Map<String, Value>, segment: &str) -> Option<String> {
    if map.contains_key(segment) {
        return Some(segment.to_string());
    }
    map.keys()
        .find(|k| k.eq_ignore_ascii_case(segment))
        .cloned()
}

fn into_mapping(tree: Tree, at: &str) -> Result<Map<String, Value>, TransfigError> {
    match tree {
        Value::Object(map) => Ok(map),
        _ => Err(shape_error(at, "expected a mapping")),
    }
}

fn shape_error(key: &str, reason: &str) -> TransfigError {
    TransfigError::InvalidTreeShape {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(tree: Tree) -> MemoryStore {
        MemoryStore::from_tree(tree).unwrap()
    }

    #[test]
    fn new_store_is_empty_mapping() {
        assert_eq!(MemoryStore::new().root(), &json!({}));
    }

    #[test]
    fn from_tree_rejects_scalar_root() {
        assert!(matches!(
            MemoryStore::from_tree(json!([1])),
            Err(TransfigError::InvalidTreeShape { .. })
        ));
    }

    #[test]
    fn get_walks_mappings_and_sequences() {
        let s = store(json!({"services": {"API": {"ports": [80, 443]}}}));
        assert_eq!(s.get("services.api.ports.1"), Some(&json!(443)));
        assert_eq!(s.get("services.API"), Some(&json!({"ports": [80, 443]})));
        assert_eq!(s.get("services.api.ports.2"), None);
        assert_eq!(s.get("services.api.ports.x"), None);
        assert_eq!(s.get(""), Some(s.root()));
    }

    #[test]
    fn load_at_nests_under_path() {
        let mut s = MemoryStore::new();
        s.load_at("app.db", json!({"url": "pg://"})).unwrap();
        s.load_at("app", json!({"name": "demo"})).unwrap();
        assert_eq!(s.root(), &json!({"app": {"db": {"url": "pg://"}, "name": "demo"}}));
    }

    #[test]
    fn load_at_empty_path_merges_root() {
        let mut s = store(json!({"a": 1}));
        s.load_at("", json!({"b": 2})).unwrap();
        assert_eq!(s.root(), &json!({"a": 1, "b": 2}));
    }

    #[test]
    fn load_at_rejects_wildcard() {
        let mut s = MemoryStore::new();
        assert!(matches!(
            s.load_at("a.*", json!(1)),
            Err(TransfigError::InvalidPath { .. })
        ));
    }

    #[test]
    fn merge_requires_mapping() {
        let mut s = MemoryStore::new();
        assert!(s.merge(json!("x")).is_err());
        assert_eq!(s.root(), &json!({}));
    }

    #[test]
    fn load_toml_str_merges_document() {
        let mut s = store(json!({"server": {"port": 80, "host": "a"}}));
        s.load_toml_str("[server]\nport = 8080\n").unwrap();
        assert_eq!(s.root(), &json!({"server": {"port": 8080, "host": "a"}}));
    }

    #[test]
    fn load_toml_str_reports_parse_errors() {
        let mut s = MemoryStore::new();
        assert!(matches!(
            s.load_toml_str("[server\n"),
            Err(TransfigError::TomlParse(_))
        ));
    }

    #[test]
    fn load_env_layers_on_top() {
        let mut s = store(json!({"db": {"url": "sqlite://", "pool": 1}}));
        s.load_env(
            "APP",
            vec![("APP__DB__POOL".to_string(), "8".to_string())],
        )
        .unwrap();
        assert_eq!(s.root(), &json!({"db": {"url": "sqlite://", "pool": 8}}));
    }

    #[test]
    fn env_layer_updates_mixed_case_keys() {
        let mut s = store(json!({"Server": {"Port": 80, "host": "a"}}));
        s.load_env(
            "APP",
            vec![("APP__SERVER__PORT".to_string(), "8080".to_string())],
        )
        .unwrap();
        assert_eq!(s.root(), &json!({"Server": {"Port": 8080, "host": "a"}}));
        assert_eq!(s.get("server.port"), Some(&json!(8080)));
    }

    #[test]
    fn snapshot_copies_subtree() {
        let s = store(json!({"a": {"b": 1}}));
        assert_eq!(s.snapshot("a"), Some(json!({"b": 1})));
        assert_eq!(s.snapshot("missing"), None);
    }

    #[test]
    fn replace_swaps_subtree() {
        let mut s = store(json!({"a": {"b": 1}, "keep": true}));
        s.replace("a", json!({"c": 2})).unwrap();
        assert_eq!(s.root(), &json!({"a": {"c": 2}, "keep": true}));
    }

    #[test]
    fn replace_creates_missing_parents() {
        let mut s = MemoryStore::new();
        s.replace("x.y", json!({"z": 1})).unwrap();
        assert_eq!(s.root(), &json!({"x": {"y": {"z": 1}}}));
    }

    #[test]
    fn replace_reuses_existing_key_case() {
        let mut s = store(json!({"Services": {"api": 1}}));
        s.replace("services", json!({"web": 2})).unwrap();
        assert_eq!(s.root(), &json!({"Services": {"web": 2}}));
    }

    #[test]
    fn replace_into_sequence_element() {
        let mut s = store(json!({"list": [{"a": 1}, {"a": 2}]}));
        s.replace("list.1", json!({"b": 3})).unwrap();
        assert_eq!(s.root(), &json!({"list": [{"a": 1}, {"b": 3}]}));
        assert!(s.replace("list.5", json!({})).is_err());
    }

    #[test]
    fn failed_replace_leaves_store_untouched() {
        let mut s = store(json!({"a": 1}));
        let before = s.clone();
        let result = s.replace("a.b.c", json!({}));
        assert!(matches!(result, Err(TransfigError::InvalidTreeShape { .. })));
        assert_eq!(s, before);
    }

    #[test]
    fn replace_rejects_bad_paths() {
        let mut s = MemoryStore::new();
        assert!(matches!(
            s.replace("", json!({})),
            Err(TransfigError::InvalidPath { .. })
        ));
        assert!(s.replace("a..b", json!({})).is_err());
    }
}
