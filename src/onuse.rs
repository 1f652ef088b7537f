//! On-use hook descriptors.
//!
//! A descriptor is a `|`-separated list of clauses. A bare clause names the
//! hooks to run when no source rule matches; `src[,src...]>>hooks` names the
//! hooks to run when the value came from one of the listed sources:
//!
//! ```text
//! audit | .key2>>migrate,audit | legacy.port>>warn_legacy
//! ```
//!
//! Sources are written relative to the field's parent (`legacy.port`) or
//! rooted with a leading `.` (`.key2`). A `*` segment in the parent, as under
//! a mapping of structs, matches any one segment of the source.

use std::collections::BTreeMap;

use crate::path::{self, DELIM, WILDCARD};

/// Parsed on-use descriptor: source → hook list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnUseRules {
    rules: BTreeMap<String, String>,
}

impl OnUseRules {
    /// Parse a descriptor. Sources are lowercased; later clauses replace
    /// earlier ones for the same source.
    pub fn parse(descriptor: &str) -> Self {
        let mut rules = BTreeMap::new();
        for clause in descriptor.split('|').map(str::trim) {
            if clause.is_empty() {
                continue;
            }
            match clause.split_once(">>") {
                Some((sources, hooks)) => {
                    for source in sources.split(',').map(str::trim) {
                        if !source.is_empty() {
                            rules.insert(source.to_lowercase(), hooks.trim().to_string());
                        }
                    }
                }
                None => {
                    rules.insert(WILDCARD.to_string(), clause.to_string());
                }
            }
        }
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Hook list for a value sourced from `source` under schema parent
    /// `parent`, or `""` if nothing applies.
    ///
    /// Tried in order: the source relative to `parent`, the rooted `.source`,
    /// then the bare default clause.
    pub fn resolve(&self, source: &str, parent: &str) -> &str {
        if let Some(rel) = relative_to(source, parent)
            && let Some(hooks) = self.rules.get(&rel)
        {
            return hooks;
        }
        if let Some(hooks) = self.rules.get(&format!("{DELIM}{source}")) {
            return hooks;
        }
        self.rules.get(WILDCARD).map(String::as_str).unwrap_or("")
    }
}

/// `source` with the leading segments of `parent` removed. Nothing is left
/// over when `source` is not strictly below `parent`.
fn relative_to(source: &str, parent: &str) -> Option<String> {
    if parent.is_empty() {
        return Some(source.to_string());
    }
    let parent = path::split(parent);
    let source = path::split(source);
    if source.len() <= parent.len() {
        return None;
    }
    let under = parent
        .iter()
        .zip(&source)
        .all(|(p, s)| *p == WILDCARD || p == s);
    under.then(|| path::join(&source[parent.len()..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_clause_is_default() {
        let rules = OnUseRules::parse("audit");
        assert_eq!(rules.resolve("anything", "parent"), "audit");
        assert_eq!(rules.resolve("x", ""), "audit");
    }

    #[test]
    fn absolute_source_matches_root_key() {
        let rules = OnUseRules::parse(".key2>>test");
        assert_eq!(rules.resolve("key2", "struct"), "test");
        assert_eq!(rules.resolve("struct.key2", "struct"), "");
    }

    #[test]
    fn relative_source_is_stripped_of_parent() {
        let rules = OnUseRules::parse("legacy.port>>warn | audit");
        assert_eq!(rules.resolve("server.legacy.port", "server"), "warn");
        assert_eq!(rules.resolve("server.port", "server"), "audit");
    }

    #[test]
    fn parent_prefix_respects_segment_boundary() {
        let rules = OnUseRules::parse("port>>hit");
        assert_eq!(rules.resolve("serverx.port", "server"), "");
    }

    #[test]
    fn wildcard_parent_matches_any_member() {
        let rules = OnUseRules::parse("port>>audit");
        assert_eq!(rules.resolve("services.api.port", "services.*"), "audit");
        assert_eq!(rules.resolve("services.web.port", "services.*"), "audit");
        assert_eq!(rules.resolve("other.api.port", "services.*"), "");
    }

    #[test]
    fn source_equal_to_parent_is_not_relative() {
        let rules = OnUseRules::parse("server>>hit");
        assert_eq!(rules.resolve("server", "server"), "");
    }

    #[test]
    fn empty_parent_uses_source_as_relative() {
        let rules = OnUseRules::parse("port>>hit");
        assert_eq!(rules.resolve("port", ""), "hit");
    }

    #[test]
    fn relative_beats_absolute_beats_default() {
        let rules = OnUseRules::parse("fallback | .a.b>>absolute | b>>relative");
        assert_eq!(rules.resolve("a.b", "a"), "relative");

        let rules = OnUseRules::parse("fallback | .a.b>>absolute");
        assert_eq!(rules.resolve("a.b", "a"), "absolute");

        let rules = OnUseRules::parse("fallback");
        assert_eq!(rules.resolve("a.b", "a"), "fallback");
    }

    #[test]
    fn multiple_sources_share_hooks() {
        let rules = OnUseRules::parse(".Host, .addr >> net,audit");
        assert_eq!(rules.resolve("host", "server"), "net,audit");
        assert_eq!(rules.resolve("addr", "server"), "net,audit");
    }

    #[test]
    fn empty_descriptor_resolves_to_nothing() {
        let rules = OnUseRules::parse("");
        assert!(rules.is_empty());
        assert_eq!(rules.resolve("a", ""), "");
        assert!(OnUseRules::parse(" | ").is_empty());
    }
}
