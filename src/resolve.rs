//! Target resolution: find the [`TransformTarget`] for a concrete flattened key.
//!
//! Three tiers, first hit wins:
//!
//! 1. Exact lookup of the lowercased key.
//! 2. Pattern lookup: every schema path that matches the key's trailing
//!    segments (`*` matches any one segment). The longest match wins.
//! 3. Child inheritance: walk up the key's ancestors; the first one that
//!    resolves to a container with a `childtransform` yields a synthesized
//!    target carrying that child transform.
//!
//! Matching is anchored on the right. This is what lets a root-anchored alias
//! like `.key2` (stored under the one-segment path `key2`) match any key whose
//! last segment is `key2`.
//!
//! Sequence-of-struct members are stored without an index segment
//! (`users.name`). A numeric segment in the key that the schema path has no
//! counterpart for is skipped while matching (`users.0.name`), and put back
//! into the resolved target's output and parent paths.

use crate::path::{self, WILDCARD};
use crate::walker::{TargetMap, TransformTarget};

/// A resolved target and the schema path it was found under.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// Matched schema path, or the key itself for inherited targets.
    pub schema_path: String,
    pub target: TransformTarget,
    pub inherited: bool,
}

/// Resolve a lowercased flattened key.
pub fn resolve(lower_key: &str, targets: &TargetMap) -> Option<Resolved> {
    if let Some((schema_path, target)) = lookup(lower_key, targets) {
        return Some(Resolved {
            schema_path: schema_path.to_string(),
            target: localize(lower_key, schema_path, target),
            inherited: false,
        });
    }
    inherit(lower_key, targets)
}

/// Tiers 1 and 2: exact hit, else the longest pattern match.
pub fn lookup<'a>(key: &str, targets: &'a TargetMap) -> Option<(&'a str, &'a TransformTarget)> {
    if let Some((schema_path, target)) = targets.get_key_value(key) {
        return Some((schema_path.as_str(), target));
    }
    find_transform(key, targets)
}

/// Longest schema path whose segments match the key's trailing segments.
/// Ties go to the first path in key order.
pub fn find_transform<'a>(
    key: &str,
    targets: &'a TargetMap,
) -> Option<(&'a str, &'a TransformTarget)> {
    let actual = path::split(key);
    let mut best: Option<(&'a str, &'a TransformTarget, usize)> = None;

    for (schema_path, target) in targets {
        let schema = path::split(schema_path);
        if !match_with_dynamic(&actual, &schema) {
            continue;
        }
        if best.is_none_or(|(_, _, len)| schema.len() > len) {
            best = Some((schema_path.as_str(), target, schema.len()));
        }
    }

    best.map(|(schema_path, target, _)| (schema_path, target))
}

/// Right-aligned segment match. `*` in the schema matches any segment; other
/// segments compare case-insensitively. Numeric key segments before the last
/// one may be skipped when the schema has nothing at that position.
pub fn match_with_dynamic(actual: &[&str], schema: &[&str]) -> bool {
    align(actual, schema).is_some()
}

/// Align `schema` against the tail of `actual`. On a match, returns every
/// skipped index segment with the schema position it sits before, right to
/// left.
fn align<'a>(actual: &[&'a str], schema: &[&str]) -> Option<Vec<(usize, &'a str)>> {
    let mut skipped = Vec::new();
    let (mut i, mut j) = (actual.len(), schema.len());

    while j > 0 {
        let a = *actual.get(i.checked_sub(1)?)?;
        let s = schema[j - 1];
        if s == WILDCARD || s.eq_ignore_ascii_case(a) {
            j -= 1;
        } else if i < actual.len() && path::as_index(a).is_some() {
            skipped.push((j, a));
        } else {
            return None;
        }
        i -= 1;
    }
    Some(skipped)
}

/// Copy of `target` with the index segments skipped while matching `key`
/// against `schema_path` put back into its output and parent paths.
fn localize(key: &str, schema_path: &str, target: &TransformTarget) -> TransformTarget {
    let mut target = target.clone();
    let schema = path::split(schema_path);
    let Some(skipped) = align(&path::split(key), &schema) else {
        return target;
    };
    if skipped.is_empty() || path::segment_count(&target.output_key) != schema.len() {
        return target;
    }

    let mut output = path::split(&target.output_key);
    let stem = path::join(&output[..output.len() - 1]);
    for (at, index) in skipped {
        output.insert(at, index);
    }
    let output_key = path::join(&output);
    if target.parent == stem {
        target.parent = path::join(&output[..output.len() - 1]);
    }
    target.output_key = output_key;
    target
}

/// Tier 3: synthesize a target from the nearest ancestor container that
/// declares a child transform.
fn inherit(lower_key: &str, targets: &TargetMap) -> Option<Resolved> {
    let parts = path::split(lower_key);

    for i in (1..parts.len()).rev() {
        let parent_key = path::join(&parts[..i]);
        let Some((schema_path, parent)) = lookup(&parent_key, targets) else {
            continue;
        };
        if !parent.is_container() || parent.child_transform.is_empty() {
            continue;
        }

        let parent = localize(&parent_key, schema_path, parent);
        let parent_output = fill_wildcards(&parent.output_key, &parts[..i]);
        let target = TransformTarget {
            output_key: path::dotted(&parent_output, &path::join(&parts[i..])),
            parent: parent_output,
            transform: parent.child_transform.clone(),
            ..TransformTarget::default()
        };
        return Some(Resolved {
            schema_path: lower_key.to_string(),
            target,
            inherited: true,
        });
    }
    None
}

/// Replace `*` segments of a schema output path with the concrete segments
/// they matched, aligned on the right.
fn fill_wildcards(output_key: &str, actual: &[&str]) -> String {
    if !output_key.split('.').any(|s| s == WILDCARD) {
        return output_key.to_string();
    }
    let schema = path::split(output_key);
    let offset = actual.len().saturating_sub(schema.len());
    let filled: Vec<&str> = schema
        .iter()
        .enumerate()
        .map(|(i, s)| match actual.get(offset + i) {
            Some(concrete) if *s == WILDCARD => *concrete,
            _ => *s,
        })
        .collect();
    path::join(&filled)
}
