//! Engine settings, loaded the usual way: compiled defaults, then an optional
//! TOML file, then `TRANSFIG_*` environment variables.

use std::path::Path;

use confique::Config;

use crate::error::TransfigError;

/// Knobs for [`TransfigBuilder`](crate::TransfigBuilder).
#[derive(Config, Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Overlay scope. Tags named `<id>>tag` win over `tag` when set.
    #[config(default = "", env = "TRANSFIG_ID")]
    pub id: String,

    /// Fail with `InvalidTreeShape` instead of coercing conflicting
    /// sequence/mapping writes when rebuilding a tree.
    #[config(default = false, env = "TRANSFIG_STRICT_SHAPES")]
    pub strict_shapes: bool,

    /// Reject unknown keys in schema descriptor files.
    #[config(default = true, env = "TRANSFIG_STRICT_DESCRIPTORS")]
    pub strict_descriptors: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            id: String::new(),
            strict_shapes: false,
            strict_descriptors: true,
        }
    }
}

impl EngineSettings {
    /// Load settings. Environment variables override the file, which
    /// overrides the defaults. A `path` that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, TransfigError> {
        let mut builder = Self::builder().env();
        if let Some(path) = path {
            let content = std::fs::read_to_string(path).map_err(|e| TransfigError::IoError {
                path: path.to_path_buf(),
                source: e,
            })?;
            builder = builder.preloaded(Self::parse_layer(&content, path)?);
        }
        Ok(builder.load()?)
    }

    fn parse_layer(content: &str, path: &Path) -> Result<<Self as Config>::Layer, TransfigError> {
        toml::from_str(content).map_err(|e| TransfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_default_impl() {
        let loaded = EngineSettings::builder().load().unwrap();
        assert_eq!(loaded, EngineSettings::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transfig.toml");
        fs::write(&path, "id = \"svc\"\nstrict_shapes = true\n").unwrap();

        let settings = EngineSettings::load(Some(&path)).unwrap();
        assert_eq!(settings.id, "svc");
        assert!(settings.strict_shapes);
        assert!(settings.strict_descriptors);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = EngineSettings::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(TransfigError::IoError { .. })));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transfig.toml");
        fs::write(&path, "strict_shapes = \"maybe\"\n").unwrap();
        let result = EngineSettings::load(Some(&path));
        assert!(matches!(result, Err(TransfigError::ParseError { .. })));
    }
}
