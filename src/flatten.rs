//! Path codec: flatten a nested tree into dotted key-value pairs and rebuild
//! the tree from them.
//!
//! Mappings contribute their keys as segments, sequences contribute the
//! element index. Anything else (including `null`) is a leaf:
//! `{"array": [1, 2]}` → `{"array.0": 1, "array.1": 2}`.
//!
//! Empty containers below the root have no leaves and therefore vanish.

use serde_json::{Map, Value};

use crate::error::TransfigError;
use crate::path;
use crate::types::{FlatMap, ShapePolicy, Tree};

/// Highest index a numeric segment may address. Larger numbers are mapping
/// keys under [`ShapePolicy::Lenient`] and an error under
/// [`ShapePolicy::Strict`].
pub const MAX_SEQUENCE_INDEX: usize = 1 << 16;

/// Flatten `tree` into a [`FlatMap`], prefixing every key with `prefix`.
pub fn flatten(prefix: &str, tree: &Tree) -> FlatMap {
    let mut out = FlatMap::new();
    flatten_into(prefix, tree, &mut out);
    out
}

/// Like [`flatten`] but writes into an existing map.
pub fn flatten_into(prefix: &str, tree: &Tree, out: &mut FlatMap) {
    match tree {
        Value::Object(map) => {
            for (key, value) in map {
                flatten_into(&path::dotted(prefix, key), value, out);
            }
        }
        Value::Array(items) => {
            for (i, value) in items.iter().enumerate() {
                flatten_into(&path::dotted(prefix, &i.to_string()), value, out);
            }
        }
        leaf => {
            out.insert(prefix.to_string(), leaf.clone());
        }
    }
}

/// Rebuild a tree from dotted keys. The root is always a mapping.
///
/// A segment followed by a numeric segment becomes a sequence, padded with
/// `null` up to the highest index (at most [`MAX_SEQUENCE_INDEX`]). Under [`ShapePolicy::Lenient`] a write
/// that conflicts with an existing container is coerced onto it; under
/// [`ShapePolicy::Strict`] it fails with `InvalidTreeShape`.
pub fn unflatten(flat: &FlatMap, policy: ShapePolicy) -> Result<Tree, TransfigError> {
    let mut root = Value::Object(Map::new());
    for (key, value) in flat {
        let segments = path::split(key);
        insert(&mut root, &segments, value.clone(), key, policy)?;
    }
    Ok(root)
}

fn insert(
    node: &mut Value,
    segments: &[&str],
    value: Value,
    key: &str,
    policy: ShapePolicy,
) -> Result<(), TransfigError> {
    let Some((head, rest)) = segments.split_first() else {
        return Ok(());
    };

    let Some(next) = rest.first() else {
        return put(node, head, value, key, policy);
    };

    let wants_sequence = match path::as_index(next) {
        Some(index) if index <= MAX_SEQUENCE_INDEX => true,
        Some(_) if policy == ShapePolicy::Strict => {
            return Err(TransfigError::InvalidTreeShape {
                key: key.to_string(),
                reason: format!("index '{next}' exceeds {MAX_SEQUENCE_INDEX}"),
            });
        }
        _ => false,
    };
    let child = child_container(node, head, wants_sequence, key, policy)?;
    insert(child, rest, value, key, policy)
}

/// Store a leaf at `segment` inside `node`.
fn put(
    node: &mut Value,
    segment: &str,
    value: Value,
    key: &str,
    policy: ShapePolicy,
) -> Result<(), TransfigError> {
    let slot = entry_at(node, segment);
    if policy == ShapePolicy::Strict && (slot.is_object() || slot.is_array()) {
        return Err(TransfigError::InvalidTreeShape {
            key: key.to_string(),
            reason: format!("leaf would replace the container at '{segment}'"),
        });
    }
    *slot = value;
    Ok(())
}

/// Return the container at `segment` inside `node`, creating it on demand.
fn child_container<'a>(
    node: &'a mut Value,
    segment: &str,
    wants_sequence: bool,
    key: &str,
    policy: ShapePolicy,
) -> Result<&'a mut Value, TransfigError> {
    let slot = entry_at(node, segment);

    let conflict = match &*slot {
        Value::Null => None,
        Value::Array(_) if !wants_sequence => Some("a mapping where a sequence exists"),
        Value::Array(_) | Value::Object(_) => None,
        _ => Some("a container where a leaf exists"),
    };

    if let Some(reason) = conflict {
        if policy == ShapePolicy::Strict {
            return Err(TransfigError::InvalidTreeShape {
                key: key.to_string(),
                reason: format!("path needs {reason} at '{segment}'"),
            });
        }
        coerce(slot, wants_sequence);
    } else if slot.is_null() {
        *slot = if wants_sequence {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        };
    }

    Ok(slot)
}

/// Lenient conflict handling. A sequence asked to hold string keys turns into
/// a mapping keyed by index; a leaf is replaced by a fresh container. A
/// mapping asked to hold an index keeps the index as a string key.
fn coerce(slot: &mut Value, wants_sequence: bool) {
    *slot = match slot.take() {
        Value::Array(items) => Value::Object(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
        ),
        Value::Object(map) => Value::Object(map),
        _ if wants_sequence => Value::Array(Vec::new()),
        _ => Value::Object(Map::new()),
    };
}

/// Mutable slot for `segment` inside `node`, inserting `null` if missing.
/// Sequences are grown with `null` up to the requested index.
fn entry_at<'a>(node: &'a mut Value, segment: &str) -> &'a mut Value {
    let index = sequence_index(segment).filter(|_| node.is_array());
    if index.is_none() && !node.is_object() {
        *node = Value::Object(Map::new());
    }

    match (node, index) {
        (Value::Array(items), Some(index)) => {
            if let Some(len) = index.checked_add(1)
                && items.len() < len
            {
                items.resize(len, Value::Null);
            }
            &mut items[index]
        }
        (Value::Object(map), _) => map.entry(segment.to_string()).or_insert(Value::Null),
        // An index implies a sequence; anything else was made a mapping above.
        (other, _) => other,
    }
}

fn sequence_index(segment: &str) -> Option<usize> {
    path::as_index(segment).filter(|index| *index <= MAX_SEQUENCE_INDEX)
}
