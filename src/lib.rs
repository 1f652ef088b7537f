//! Schema-driven key and value rewriting for hierarchical configuration.
//!
//! Transfig takes a configuration tree (nested mappings, sequences, and
//! scalars) and a schema describing the shape your application expects, and
//! rewrites the tree so every value lands under its canonical key, run
//! through the transforms the schema names for it.
//!
//! ```ignore
//! let engine = Transfig::builder()
//!     .transform("secret", |seg, v| Ok((seg.to_string(), vault.resolve(v)?)))
//!     .build();
//!
//! let report = engine.apply(&mut store, "services", &Services::describe())?;
//! ```
//!
//! That single call snapshots `services` from the store, renames aliased keys
//! to their canonical names, runs each field's transforms, fires on-use
//! hooks, and swaps the rewritten subtree back in.
//!
//! # Why transfig
//!
//! Configuration outlives code. Keys get renamed, sections get nested, and
//! old deployments keep sending the old names. The usual answer is a pile
//! of one-off migration code that knows about every historical spelling.
//!
//! Transfig replaces that with a declaration. Each schema field names its
//! canonical key, the aliases it also answers to, and the transforms to run
//! on it. Add an alias to a field and every old config that used it is
//! rewritten on load.
//!
//! # The schema
//!
//! A [`Schema`] is an ordered list of [`Field`]s. Each field has a canonical
//! key segment, a [`FieldKind`], and a tag bag:
//!
//! | Tag | Meaning |
//! |-----|---------|
//! | `aliases` | Comma list of other input keys. `.key` is root-anchored, `key` sits next to the field. |
//! | `transform` | Comma list of transform names, applied left to right. |
//! | `childtransform` | Comma list applied to descendants of a container that have no field of their own. |
//! | `onuse` | Hooks to fire when the field is used, optionally scoped by source key. |
//! | `<id>><tag>` | Overlay of any tag above, preferred when the engine's id is `<id>`. |
//!
//! Schemas can be built in code, parsed from a TOML or JSON descriptor with
//! [`Schema::from_toml_str`] / [`Schema::from_file`], or attached to a type
//! through the [`Describe`] trait.
//!
//! # How keys are matched
//!
//! The tree is flattened into dotted keys (`servers.0.host`). Each key, and
//! each prefix of it, is matched against the schema's target table:
//!
//! 1. An exact hit on the lowercased key.
//! 2. The longest schema path matching the key's trailing segments. Mappings
//!    of structs put a `*` segment in their member paths, which matches any
//!    one segment.
//! 3. The nearest ancestor container that declares a `childtransform`.
//!
//! Matching is anchored on the right, so a root-anchored alias `.port`
//! matches any key whose last segment is `port`.
//!
//! # Transforms and hooks
//!
//! Transforms are named functions `(segment, value) → (segment, value)`
//! registered on the builder. The name `default` is special: it stands in for
//! any name that is not registered and runs for keys with no target. If there
//! is no `default` either, the segment is left as it is.
//!
//! A transform that returns an error aborts the whole pass and nothing is
//! written. On-use hooks are side-effect callbacks; a failing hook is logged
//! and listed in the [`TransformReport`], and the pass carries on.
//!
//! # Stores
//!
//! The engine reads and writes through the [`ConfigStore`] trait: a snapshot
//! of a subtree and an all-at-once replacement. [`MemoryStore`] is the
//! in-process implementation and can layer TOML documents, trees, and
//! `PREFIX__A__B` environment variables.
//!
//! # Settings
//!
//! [`EngineSettings`] loads the engine's knobs (overlay id, strict shapes,
//! strict descriptors) from defaults, an optional TOML file, and `TRANSFIG_*`
//! environment variables.
//!
//! # Optional values
//!
//! [`Opt`] tells an absent key apart from an explicit `null`, which plain
//! `Option` cannot.
//!
//! # Error handling
//!
//! All fallible operations return [`TransfigError`]. See the [`error`]
//! module for the full set.

pub mod error;
pub mod types;

mod builder;
mod descriptor;
mod env;
mod flatten;
mod merge;
mod onuse;
mod optional;
mod path;
mod pipeline;
mod resolve;
mod schema;
mod settings;
mod store;
mod walker;

#[cfg(test)]
mod fixtures;

pub use builder::{Engine, Transfig, TransfigBuilder, TransformReport};
pub use error::{BoxError, TransfigError};
pub use flatten::{flatten, unflatten};
pub use onuse::OnUseRules;
pub use optional::Opt;
pub use pipeline::{Applied, DEFAULT, HookFn, TransformFn, TransformOptions, apply_transforms};
pub use resolve::{Resolved, find_transform, match_with_dynamic, resolve};
pub use schema::{
    Describe, Field, FieldKind, Schema, TAG_ALIASES, TAG_CANONICAL, TAG_CHILD_TRANSFORM,
    TAG_ON_USE, TAG_TRANSFORM,
};
pub use settings::EngineSettings;
pub use store::{ConfigStore, MemoryStore};
pub use types::{FlatMap, ShapePolicy, Tree, ValueKind};
pub use walker::{TargetMap, TransformTarget, build_target_map};
