//! Schema descriptors: the declared shape of the configuration an
//! application cares about, with per-field transform tags.
//!
//! A [`Schema`] is an ordered list of [`Field`]s. Each field has a canonical
//! key segment, a [`FieldKind`] saying whether (and how) it nests, and a tag
//! bag:
//!
//! | Tag | Meaning |
//! |-----|---------|
//! | `aliases` | Comma list of lookup keys. `.key` is root-anchored, `key` is relative to the field's parent. |
//! | `transform` | Comma list of transform names applied to the field's own key. |
//! | `childtransform` | Comma list applied to descendants that have no target of their own. |
//! | `onuse` | On-use hook descriptor (see [`onuse`](crate::onuse)). |
//! | `<id>><tag>` | Overlay of any tag above, preferred when the engine id is `<id>`. |
//!
//! Descriptors are plain data. Build them with the constructors below, parse
//! them from a file with [`Schema::from_toml_str`], or implement [`Describe`]
//! next to a config struct.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Tree, ValueKind};

pub const TAG_CANONICAL: &str = "canonical";
pub const TAG_ALIASES: &str = "aliases";
pub const TAG_TRANSFORM: &str = "transform";
pub const TAG_CHILD_TRANSFORM: &str = "childtransform";
pub const TAG_ON_USE: &str = "onuse";

/// Types that carry their own schema descriptor.
pub trait Describe {
    fn describe() -> Schema;
}

/// An ordered list of field descriptors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field (builder style).
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
}

/// How a field nests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// A leaf value.
    #[default]
    Scalar,
    /// A free-form mapping with no declared element shape.
    Mapping,
    /// A free-form sequence with no declared element shape.
    Sequence,
    /// A nested structure described by the field's child schema.
    Struct,
    /// A sequence whose elements follow the child schema.
    SeqOfStruct,
    /// A string-keyed mapping whose values follow the child schema.
    MapOfStruct,
}

impl FieldKind {
    /// Whether this kind must carry a child schema.
    pub fn is_structured(self) -> bool {
        matches!(
            self,
            FieldKind::Struct | FieldKind::SeqOfStruct | FieldKind::MapOfStruct
        )
    }

    /// The value shape this kind produces in a configuration tree.
    pub fn value_kind(self) -> ValueKind {
        match self {
            FieldKind::Scalar => ValueKind::Scalar,
            FieldKind::Mapping | FieldKind::Struct | FieldKind::MapOfStruct => ValueKind::Mapping,
            FieldKind::Sequence | FieldKind::SeqOfStruct => ValueKind::Sequence,
        }
    }
}

/// A single field descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Canonical key segment. Empty means the field is ignored.
    pub canonical: String,

    #[serde(default)]
    pub kind: FieldKind,

    /// Element or member schema for structured kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,

    /// Schema default value.
    #[serde(default, skip_serializing_if = "Tree::is_null")]
    pub default: Tree,
}

impl Field {
    pub fn new(canonical: &str, kind: FieldKind) -> Self {
        Self {
            canonical: canonical.to_string(),
            kind,
            ..Self::default()
        }
    }

    pub fn scalar(canonical: &str) -> Self {
        Self::new(canonical, FieldKind::Scalar)
    }

    pub fn mapping(canonical: &str) -> Self {
        Self::new(canonical, FieldKind::Mapping)
    }

    pub fn sequence(canonical: &str) -> Self {
        Self::new(canonical, FieldKind::Sequence)
    }

    pub fn structure(canonical: &str, schema: Schema) -> Self {
        Self::new(canonical, FieldKind::Struct).with_schema(schema)
    }

    pub fn seq_of(canonical: &str, schema: Schema) -> Self {
        Self::new(canonical, FieldKind::SeqOfStruct).with_schema(schema)
    }

    pub fn map_of(canonical: &str, schema: Schema) -> Self {
        Self::new(canonical, FieldKind::MapOfStruct).with_schema(schema)
    }

    fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set a raw tag. Use `"<id>>name"` for an overlay.
    pub fn tag(mut self, name: &str, value: &str) -> Self {
        self.tags.insert(name.to_string(), value.to_string());
        self
    }

    pub fn aliases(self, aliases: &str) -> Self {
        self.tag(TAG_ALIASES, aliases)
    }

    pub fn transform(self, transform: &str) -> Self {
        self.tag(TAG_TRANSFORM, transform)
    }

    pub fn child_transform(self, transform: &str) -> Self {
        self.tag(TAG_CHILD_TRANSFORM, transform)
    }

    pub fn on_use(self, descriptor: &str) -> Self {
        self.tag(TAG_ON_USE, descriptor)
    }

    pub fn default_value(mut self, value: Tree) -> Self {
        self.default = value;
        self
    }

    /// Look up a tag, preferring the `<id>>name` overlay when `id` is set.
    pub fn lookup(&self, id: &str, name: &str) -> Option<&str> {
        if !id.is_empty()
            && let Some(overlay) = self.tags.get(&format!("{id}>{name}"))
        {
            return Some(overlay.as_str());
        }
        self.tags.get(name).map(String::as_str)
    }

    /// Tag value or empty string.
    pub fn lookup_or_empty(&self, id: &str, name: &str) -> &str {
        self.lookup(id, name).unwrap_or("")
    }

    /// Canonical segment, honoring a `canonical` tag overlay.
    pub fn canonical_for(&self, id: &str) -> &str {
        self.lookup(id, TAG_CANONICAL).unwrap_or(&self.canonical)
    }

    /// Alias list, split on commas with blanks dropped.
    pub fn aliases_for(&self, id: &str) -> Vec<&str> {
        self.lookup_or_empty(id, TAG_ALIASES)
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect()
    }
}
