use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A configuration tree: scalars, mappings, and sequences.
///
/// `null` is a scalar like any other.
pub type Tree = serde_json::Value;

/// Dotted path → scalar. Sequence elements are addressed by numeric segments.
pub type FlatMap = BTreeMap<String, Tree>;

/// Shape of a schema field's value, used to tell containers from scalars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    Scalar,
    Mapping,
    Sequence,
}

impl ValueKind {
    pub fn is_container(self) -> bool {
        !matches!(self, ValueKind::Scalar)
    }
}

/// What unflatten does when a path demands a sequence where a mapping was
/// already placed (or the other way around).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShapePolicy {
    /// Keep the first container and coerce later writes onto it.
    #[default]
    Lenient,
    /// Fail with [`InvalidTreeShape`](crate::TransfigError::InvalidTreeShape).
    Strict,
}
