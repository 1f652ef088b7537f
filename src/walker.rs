//! Schema walker: turn a [`Schema`] into the table of [`TransformTarget`]s
//! the resolver matches flattened keys against.
//!
//! Every field contributes one entry per input key (its canonical segment
//! plus each alias), all pointing at the same canonical `output_key`.
//! Relative aliases are placed under the field's parent path; absolute
//! aliases (leading `.`) are rooted at the top. Mapping-of-struct fields put a
//! `*` segment between the mapping and its members.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::path::{self, WILDCARD};
use crate::schema::{Field, FieldKind, Schema, TAG_CHILD_TRANSFORM, TAG_ON_USE, TAG_TRANSFORM};
use crate::types::{Tree, ValueKind};

/// Lowercased schema path → target.
pub type TargetMap = BTreeMap<String, TransformTarget>;

/// What the engine knows about one schema path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransformTarget {
    /// Canonical dotted path the value is written under.
    pub output_key: String,
    /// Canonical dotted path of the enclosing container.
    pub parent: String,
    pub transform: String,
    pub child_transform: String,
    pub on_use: String,
    pub kind: ValueKind,
    /// Schema default value.
    pub value: Tree,
}

impl TransformTarget {
    /// A target counts as a container if its schema value is a mapping or
    /// sequence, or if it declares a child transform.
    pub fn is_container(&self) -> bool {
        self.kind.is_container() || !self.child_transform.is_empty()
    }
}

/// Build the target map for `schema`, reading `<id>>` tag overlays.
pub fn build_target_map(id: &str, schema: &Schema) -> TargetMap {
    let mut out = TargetMap::new();
    walk(id, schema, "", &mut out);
    tracing::debug!(id, targets = out.len(), "built transform target map");
    if tracing::enabled!(tracing::Level::TRACE)
        && let Ok(json) = serde_json::to_string_pretty(&out)
    {
        tracing::trace!(id, targets = %json, "transform target table");
    }
    out
}

fn walk(id: &str, schema: &Schema, stem: &str, out: &mut TargetMap) {
    for field in &schema.fields {
        let canonical = field.canonical_for(id).to_lowercase();
        if canonical.is_empty() {
            continue;
        }

        let output_key = path::dotted(stem, &canonical);
        let target = TransformTarget {
            output_key: output_key.clone(),
            parent: stem.to_string(),
            transform: field.lookup_or_empty(id, TAG_TRANSFORM).to_string(),
            child_transform: field.lookup_or_empty(id, TAG_CHILD_TRANSFORM).to_string(),
            on_use: field.lookup_or_empty(id, TAG_ON_USE).to_string(),
            kind: field.kind.value_kind(),
            value: field.default.clone(),
        };

        for key in lookup_keys(id, field, &canonical, stem) {
            out.insert(key, target.clone());
        }

        let Some(child) = &field.schema else {
            continue;
        };
        match field.kind {
            FieldKind::Struct | FieldKind::SeqOfStruct => walk(id, child, &output_key, out),
            FieldKind::MapOfStruct => {
                walk(id, child, &path::dotted(&output_key, WILDCARD), out);
            }
            FieldKind::Scalar | FieldKind::Mapping | FieldKind::Sequence => {}
        }
    }
}

/// Fully-qualified lookup keys for a field: its canonical segment and every
/// alias, placed relative to `stem` unless rooted with a leading `.`.
fn lookup_keys(id: &str, field: &Field, canonical: &str, stem: &str) -> Vec<String> {
    std::iter::once(canonical)
        .chain(field.aliases_for(id))
        .map(|key| {
            let key = key.to_lowercase();
            match key.strip_prefix('.') {
                Some(absolute) => absolute.to_string(),
                None => path::dotted(stem, &key),
            }
        })
        .filter(|key| !key.is_empty())
        .collect()
}
