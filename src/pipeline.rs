//! Transform pipeline: rewrite every flattened key segment by segment through
//! the named transforms its target declares, firing on-use hooks as it goes.
//!
//! For each `(key, value)`:
//!
//! 1. Resolve the whole key. If the target's output key has a different
//!    segment count, the entry is redirected there (this is how a rooted alias
//!    like `.key2` lands at `struct.key2`).
//! 2. For every prefix of the working key, resolve a target (falling back to
//!    the `default` transform and the prefix itself), run its transforms over
//!    the last output segment and the value, then fire its on-use hooks.
//! 3. Emit the rewritten segments joined back together.
//!
//! Unknown transform or hook names fall back to `default`; a missing `default`
//! leaves the segment alone. A failing transform aborts the pass. A failing
//! hook is logged and reported but does not stop anything.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, TransfigError};
use crate::onuse::OnUseRules;
use crate::path::{self, WILDCARD};
use crate::resolve::resolve;
use crate::types::{FlatMap, Tree};
use crate::walker::{TargetMap, TransformTarget};

/// Name consulted when a transform or hook is missing, and for keys without
/// a target.
pub const DEFAULT: &str = "default";

/// `(segment, value) → (segment′, value′)`.
pub type TransformFn = Arc<dyn Fn(&str, Tree) -> Result<(String, Tree), BoxError> + Send + Sync>;

/// `(schema path, target) → ()`, side effects only.
pub type HookFn = Arc<dyn Fn(&str, &TransformTarget) -> Result<(), BoxError> + Send + Sync>;

/// The host's transform and on-use function tables.
#[derive(Clone, Default)]
pub struct TransformOptions {
    transforms: HashMap<String, TransformFn>,
    hooks: HashMap<String, HookFn>,
}

impl fmt::Debug for TransformOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut transforms: Vec<&str> = self.transforms.keys().map(String::as_str).collect();
        let mut hooks: Vec<&str> = self.hooks.keys().map(String::as_str).collect();
        transforms.sort_unstable();
        hooks.sort_unstable();
        f.debug_struct("TransformOptions")
            .field("transforms", &transforms)
            .field("hooks", &hooks)
            .finish()
    }
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named transform. Registering a name twice replaces it.
    pub fn transform<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&str, Tree) -> Result<(String, Tree), BoxError> + Send + Sync + 'static,
    {
        self.transforms.insert(name.to_string(), Arc::new(f));
        self
    }

    /// Register a named on-use hook.
    pub fn on_use<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&str, &TransformTarget) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.hooks.insert(name.to_string(), Arc::new(f));
        self
    }

    /// Merge `other` into `self`; `other` wins on name clashes.
    pub fn extend(mut self, other: TransformOptions) -> Self {
        self.transforms.extend(other.transforms);
        self.hooks.extend(other.hooks);
        self
    }

    fn transform_fn(&self, name: &str) -> Option<&TransformFn> {
        self.transforms
            .get(name)
            .or_else(|| self.transforms.get(DEFAULT))
    }

    fn hook_fn(&self, name: &str) -> Option<&HookFn> {
        self.hooks.get(name).or_else(|| self.hooks.get(DEFAULT))
    }
}

/// Output of [`apply_transforms`].
#[derive(Debug, Default)]
pub struct Applied {
    pub flat: FlatMap,
    /// One [`TransfigError::HookError`] per failed hook call.
    pub hook_errors: Vec<TransfigError>,
}

/// Rewrite `flat` against `targets`.
///
/// When two entries rewrite to the same output key, an entry that was
/// redirected by whole-key resolution wins over one that was not. Otherwise
/// the later key (in sorted order) wins.
pub fn apply_transforms(
    flat: &FlatMap,
    targets: &TargetMap,
    options: &TransformOptions,
) -> Result<Applied, TransfigError> {
    let mut direct: Vec<(String, Tree)> = Vec::new();
    let mut redirected: Vec<(String, Tree)> = Vec::new();
    let mut hook_errors = Vec::new();

    for (key, value) in flat {
        let lower = key.to_lowercase();
        let working = redirect(&lower, targets);
        let is_redirected = working.is_some();
        let working = working.unwrap_or_else(|| lower.clone());

        let ctx = EntryContext {
            key,
            source: &lower,
            is_redirected,
        };
        let entry = rewrite(&ctx, &working, value.clone(), targets, options, &mut hook_errors)?;
        if is_redirected {
            redirected.push(entry);
        } else {
            direct.push(entry);
        }
    }

    let mut out = FlatMap::new();
    for (key, value) in direct.into_iter().chain(redirected) {
        if out.insert(key.clone(), value).is_some() {
            tracing::debug!(key = %key, "output key collision, later entry wins");
        }
    }

    Ok(Applied {
        flat: out,
        hook_errors,
    })
}

struct EntryContext<'a> {
    /// Input key as it appears in the tree.
    key: &'a str,
    /// Lowercased input key.
    source: &'a str,
    is_redirected: bool,
}

/// The canonical key to rewrite instead of `lower`, if whole-key resolution
/// points somewhere with a different depth.
fn redirect(lower: &str, targets: &TargetMap) -> Option<String> {
    let resolved = resolve(lower, targets)?;
    let output_key = resolved.target.output_key;
    if output_key.is_empty() || path::segment_count(&output_key) == path::segment_count(lower) {
        return None;
    }
    if output_key.split(path::DELIM).any(|s| s == WILDCARD) {
        tracing::debug!(key = lower, output_key = %output_key, "not redirecting to a wildcard path");
        return None;
    }
    tracing::trace!(key = lower, output_key = %output_key, "redirecting");
    Some(output_key)
}

fn rewrite(
    ctx: &EntryContext<'_>,
    working: &str,
    mut value: Tree,
    targets: &TargetMap,
    options: &TransformOptions,
    hook_errors: &mut Vec<TransfigError>,
) -> Result<(String, Tree), TransfigError> {
    let parts = path::split(working);
    let mut new_parts: Vec<String> = Vec::with_capacity(parts.len());

    for i in 1..=parts.len() {
        let prefix = path::join(&parts[..i]);
        let (schema_path, target) = match resolve(&prefix, targets) {
            Some(resolved) => (resolved.schema_path, resolved.target),
            None => (prefix.clone(), TransformTarget::default()),
        };
        let target = with_fallbacks(target, &prefix);

        let mut segment = path::last_segment(&target.output_key).to_string();
        for name in names(&target.transform) {
            let Some(f) = options.transform_fn(name) else {
                continue;
            };
            (segment, value) = f(&segment, value).map_err(|e| TransfigError::TransformAborted {
                name: name.to_string(),
                key: ctx.key.to_string(),
                reason: e.to_string(),
            })?;
        }
        tracing::trace!(key = ctx.key, prefix = %prefix, segment = %segment, "rewrote segment");

        let source = if ctx.is_redirected {
            ctx.source
        } else {
            prefix.as_str()
        };
        fire_hooks(&schema_path, source, &target, options, hook_errors);

        new_parts.push(segment);
    }

    Ok((new_parts.join("."), value))
}

fn with_fallbacks(mut target: TransformTarget, prefix: &str) -> TransformTarget {
    if target.transform.is_empty() {
        target.transform = DEFAULT.to_string();
    }
    if target.output_key.is_empty() {
        target.output_key = prefix.to_string();
    }
    target
}

fn fire_hooks(
    schema_path: &str,
    source: &str,
    target: &TransformTarget,
    options: &TransformOptions,
    hook_errors: &mut Vec<TransfigError>,
) {
    let rules = OnUseRules::parse(&target.on_use);
    let hooks = match rules.resolve(source, &target.parent) {
        "" => DEFAULT,
        hooks => hooks,
    };

    for name in names(hooks) {
        let Some(hook) = options.hook_fn(name) else {
            continue;
        };
        if let Err(e) = hook(schema_path, target) {
            tracing::warn!(hook = name, source_path = schema_path, error = %e, "on-use hook failed");
            hook_errors.push(TransfigError::HookError {
                name: name.to_string(),
                source_path: schema_path.to_string(),
                reason: e.to_string(),
            });
        }
    }
}

/// Comma list with blanks dropped.
fn names(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|n| !n.is_empty())
}
