//! Engine façade: configure a [`Transfig`] builder once, then run the
//! flatten → transform → unflatten pass over whole trees or over subtrees of a
//! [`ConfigStore`].

use std::path::Path;

use crate::error::{BoxError, TransfigError};
use crate::flatten;
use crate::path;
use crate::pipeline::{self, TransformOptions};
use crate::schema::{Describe, Schema};
use crate::settings::EngineSettings;
use crate::store::ConfigStore;
use crate::types::{ShapePolicy, Tree};
use crate::walker::{self, TargetMap, TransformTarget};

/// Entry point for building a transform engine.
pub struct Transfig;

impl Transfig {
    pub fn builder() -> TransfigBuilder {
        TransfigBuilder::new()
    }
}

/// Builder for an [`Engine`].
///
/// Controls three things:
///
/// - **Scope**: [`id()`](Self::id) picks which `<id>>tag` overlays apply.
/// - **Shape handling**: [`strict_shapes()`](Self::strict_shapes) decides
///   whether rebuilding a tree coerces or rejects conflicting shapes.
/// - **Functions**: [`transform()`](Self::transform) and
///   [`on_use()`](Self::on_use) register the named functions schemas refer to.
#[derive(Debug, Clone)]
pub struct TransfigBuilder {
    id: String,
    shape: ShapePolicy,
    strict_descriptors: bool,
    options: TransformOptions,
}

impl TransfigBuilder {
    fn new() -> Self {
        Self {
            id: String::new(),
            shape: ShapePolicy::default(),
            strict_descriptors: true,
            options: TransformOptions::new(),
        }
    }

    /// Set the overlay scope (default: none).
    pub fn id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Enable or disable strict shapes (default: `false`).
    /// When strict, conflicting sequence/mapping writes fail with
    /// [`TransfigError::InvalidTreeShape`] instead of being coerced.
    pub fn strict_shapes(mut self, strict: bool) -> Self {
        self.shape = if strict {
            ShapePolicy::Strict
        } else {
            ShapePolicy::Lenient
        };
        self
    }

    /// Enable or disable strict descriptor parsing (default: `true`).
    /// In strict mode, unknown keys in descriptor files produce errors.
    pub fn strict_descriptors(mut self, strict: bool) -> Self {
        self.strict_descriptors = strict;
        self
    }

    /// Apply loaded [`EngineSettings`].
    pub fn settings(self, settings: &EngineSettings) -> Self {
        self.id(&settings.id)
            .strict_shapes(settings.strict_shapes)
            .strict_descriptors(settings.strict_descriptors)
    }

    /// Add a prepared function table. Names already registered are replaced.
    pub fn options(mut self, options: TransformOptions) -> Self {
        self.options = self.options.extend(options);
        self
    }

    /// Register a named transform.
    pub fn transform<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&str, Tree) -> Result<(String, Tree), BoxError> + Send + Sync + 'static,
    {
        self.options = self.options.transform(name, f);
        self
    }

    /// Register a named on-use hook.
    pub fn on_use<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&str, &TransformTarget) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.options = self.options.on_use(name, f);
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            id: self.id,
            shape: self.shape,
            strict_descriptors: self.strict_descriptors,
            options: self.options,
        }
    }
}

/// Rewrites configuration subtrees against a schema.
///
/// The engine keeps no state between calls; the target map is rebuilt from
/// the schema on every call.
#[derive(Debug, Clone)]
pub struct Engine {
    id: String,
    shape: ShapePolicy,
    strict_descriptors: bool,
    options: TransformOptions,
}

/// What a call to [`Engine::apply`] did.
#[derive(Debug)]
pub struct TransformReport {
    pub path: String,
    /// Flattened keys read from the snapshot.
    pub keys_in: usize,
    /// Flattened keys written back.
    pub keys_out: usize,
    /// `false` when there was nothing at `path`.
    pub written: bool,
    /// Failed on-use hooks. They do not stop the pass.
    pub hook_errors: Vec<TransfigError>,
}

struct Transformed {
    tree: Tree,
    keys_in: usize,
    keys_out: usize,
    hook_errors: Vec<TransfigError>,
}

impl Engine {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Build the target map this engine would use for `schema`.
    pub fn targets(&self, schema: &Schema) -> TargetMap {
        walker::build_target_map(&self.id, schema)
    }

    /// Parse a descriptor file with this engine's strictness.
    pub fn load_schema(&self, path: &Path) -> Result<Schema, TransfigError> {
        Schema::from_file(path, self.strict_descriptors)
    }

    /// Transform a tree without touching any store.
    pub fn transform_tree(&self, schema: &Schema, tree: &Tree) -> Result<Tree, TransfigError> {
        self.run(schema, tree).map(|t| t.tree)
    }

    /// Snapshot the subtree at `path`, transform it, and swap the result in.
    ///
    /// Nothing is written if the path is invalid or a transform fails. A path
    /// with nothing under it is a no-op.
    pub fn apply<S: ConfigStore + ?Sized>(
        &self,
        store: &mut S,
        path: &str,
        schema: &Schema,
    ) -> Result<TransformReport, TransfigError> {
        path::validate_store_path(path)?;

        let Some(snapshot) = store.snapshot(path) else {
            tracing::debug!(path, "nothing at store path, skipping");
            return Ok(TransformReport {
                path: path.to_string(),
                keys_in: 0,
                keys_out: 0,
                written: false,
                hook_errors: Vec::new(),
            });
        };
        if !snapshot.is_object() {
            return Err(TransfigError::InvalidTreeShape {
                key: path.to_string(),
                reason: "subtree is not a mapping".into(),
            });
        }

        let transformed = self.run(schema, &snapshot)?;
        store.replace(path, transformed.tree)?;
        tracing::debug!(
            path,
            keys_in = transformed.keys_in,
            keys_out = transformed.keys_out,
            hook_errors = transformed.hook_errors.len(),
            "applied transforms"
        );

        Ok(TransformReport {
            path: path.to_string(),
            keys_in: transformed.keys_in,
            keys_out: transformed.keys_out,
            written: true,
            hook_errors: transformed.hook_errors,
        })
    }

    /// [`apply`](Self::apply) with the schema a type describes.
    pub fn apply_described<T: Describe, S: ConfigStore + ?Sized>(
        &self,
        store: &mut S,
        path: &str,
    ) -> Result<TransformReport, TransfigError> {
        self.apply(store, path, &T::describe())
    }

    fn run(&self, schema: &Schema, tree: &Tree) -> Result<Transformed, TransfigError> {
        let flat = flatten::flatten("", tree);
        let targets = self.targets(schema);
        let applied = pipeline::apply_transforms(&flat, &targets, &self.options)?;
        let tree = flatten::unflatten(&applied.flat, self.shape)?;
        Ok(Transformed {
            tree,
            keys_in: flat.len(),
            keys_out: applied.flat.len(),
            hook_errors: applied.hook_errors,
        })
    }
}
