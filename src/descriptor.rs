//! Schema descriptor documents: parse a [`Schema`] from TOML or JSON text.
//!
//! ```toml
//! [[fields]]
//! canonical = "struct"
//! kind = "struct"
//!
//! [[fields.schema.fields]]
//! canonical = "key2"
//! tags = { aliases = ".key2", transform = "normal" }
//! ```
//!
//! In strict mode, `serde_ignored` reports every key the descriptor types do
//! not consume (a misspelled `tagz` table, say) with a best-effort line number.

use std::path::Path;

use crate::error::TransfigError;
use crate::schema::{Field, Schema};

impl Schema {
    /// Read a descriptor file. `.json` files are parsed as JSON, anything
    /// else as TOML.
    pub fn from_file(path: &Path, strict: bool) -> Result<Schema, TransfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| TransfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            Self::from_json_str(&content, strict)
        } else {
            Self::from_toml_str(&content, strict)
        };
        parsed.map_err(|e| match e {
            TransfigError::TomlParse(source) => TransfigError::ParseError {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse a TOML descriptor document.
    pub fn from_toml_str(content: &str, strict: bool) -> Result<Schema, TransfigError> {
        let table: toml::Table = toml::from_str(content)?;
        if !matches!(table.get("fields"), Some(toml::Value::Array(_))) {
            return Err(TransfigError::SchemaInvalid(
                "root must be a table with a `fields` array".into(),
            ));
        }

        let mut unknown: Vec<String> = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let schema: Schema = serde_ignored::deserialize(deserializer, |path| {
            unknown.push(path.to_string());
        })?;

        if strict && !unknown.is_empty() {
            return Err(unknown_keys_error(content, unknown));
        }
        schema.validate()?;
        Ok(schema)
    }

    /// Parse a JSON descriptor document.
    pub fn from_json_str(content: &str, strict: bool) -> Result<Schema, TransfigError> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        if !value.get("fields").is_some_and(serde_json::Value::is_array) {
            return Err(TransfigError::SchemaInvalid(
                "root must be an object with a `fields` array".into(),
            ));
        }

        let mut unknown: Vec<String> = Vec::new();
        let schema: Schema = serde_ignored::deserialize(value, |path| {
            unknown.push(path.to_string());
        })?;

        if strict && !unknown.is_empty() {
            return Err(unknown_keys_error(content, unknown));
        }
        schema.validate()?;
        Ok(schema)
    }

    /// Check that every structured field carries a child schema.
    pub fn validate(&self) -> Result<(), TransfigError> {
        validate_fields(&self.fields, "")
    }
}

fn validate_fields(fields: &[Field], stem: &str) -> Result<(), TransfigError> {
    for field in fields {
        let path = crate::path::dotted(stem, &field.canonical);
        match (&field.schema, field.kind.is_structured()) {
            (None, true) => {
                return Err(TransfigError::SchemaInvalid(format!(
                    "field '{path}' is {:?} but has no `schema`",
                    field.kind
                )));
            }
            (Some(child), true) => validate_fields(&child.fields, &path)?,
            (Some(_), false) => {
                return Err(TransfigError::SchemaInvalid(format!(
                    "field '{path}' is {:?} and cannot carry a `schema`",
                    field.kind
                )));
            }
            (None, false) => {}
        }
    }
    Ok(())
}

fn unknown_keys_error(content: &str, unknown: Vec<String>) -> TransfigError {
    let errors = unknown
        .into_iter()
        .map(|key| {
            let line = find_key_line(content, &key);
            TransfigError::UnknownDescriptorKey { key, line }
        })
        .collect();
    TransfigError::UnknownDescriptorKeys(errors)
}

/// Find the 1-indexed line of the leaf of a dotted key path, or 0.
///
/// Descriptor paths run through array indices (`fields.0.tagz`), so this only
/// looks for the first `leaf =` or `[...leaf]` line. Good enough to point a
/// user at a typo.
fn find_key_line(content: &str, dotted_key: &str) -> usize {
    let leaf = dotted_key.rsplit('.').next().unwrap_or(dotted_key);

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim().trim_start_matches('"');
        if let Some(after_key) = trimmed.strip_prefix(leaf) {
            let after_key = after_key.trim_start_matches('"').trim_start();
            if after_key.starts_with('=') || after_key.starts_with(':') {
                return i + 1;
            }
        }
        let header = line.trim().trim_start_matches('[').trim_end_matches(']');
        if line.trim().starts_with('[') && header.rsplit('.').next() == Some(leaf) {
            return i + 1;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::sample_schema;
    use crate::schema::FieldKind;
    use std::fs;
    use tempfile::TempDir;

    const SAMPLE_TOML: &str = r#"
[[fields]]
canonical = "unknownmap"
kind = "mapping"
tags = { transform = "normal" }

[[fields]]
canonical = "unknownarray"
kind = "sequence"
tags = { childtransform = "child" }

[[fields]]
canonical = "structmap"
kind = "map_of_struct"
tags = { childtransform = "child" }

[[fields.schema.fields]]
canonical = "key"
tags = { transform = "normal", onuse = "test" }

[[fields]]
canonical = "struct"
kind = "struct"

[[fields.schema.fields]]
canonical = "key2"
tags = { aliases = ".key2", transform = "normal", onuse = ".key2>>test" }
"#;

    #[test]
    fn toml_descriptor_matches_built_schema() {
        let schema = Schema::from_toml_str(SAMPLE_TOML, true).unwrap();
        assert_eq!(schema, sample_schema());
    }

    #[test]
    fn json_descriptor_parses() {
        let content = r#"{
            "fields": [
                {"canonical": "db", "kind": "struct", "schema": {"fields": [
                    {"canonical": "url", "tags": {"aliases": "uri"}, "default": "pg://"}
                ]}}
            ]
        }"#;
        let schema = Schema::from_json_str(content, true).unwrap();
        let db = &schema.fields[0];
        assert_eq!(db.kind, FieldKind::Struct);
        let url = &db.schema.as_ref().unwrap().fields[0];
        assert_eq!(url.aliases_for(""), vec!["uri"]);
        assert_eq!(url.default, serde_json::json!("pg://"));
    }

    #[test]
    fn root_without_fields_is_invalid() {
        let result = Schema::from_toml_str("name = \"x\"\n", true);
        assert!(matches!(result, Err(TransfigError::SchemaInvalid(_))));
        let result = Schema::from_json_str("[1, 2]", true);
        assert!(matches!(result, Err(TransfigError::SchemaInvalid(_))));
    }

    #[test]
    fn structured_field_without_schema_is_invalid() {
        let content = "[[fields]]\ncanonical = \"db\"\nkind = \"struct\"\n";
        let result = Schema::from_toml_str(content, true);
        assert!(matches!(result, Err(TransfigError::SchemaInvalid(msg)) if msg.contains("db")));
    }

    #[test]
    fn scalar_with_schema_is_invalid() {
        let content = r#"
[[fields]]
canonical = "port"

[[fields.schema.fields]]
canonical = "x"
"#;
        assert!(Schema::from_toml_str(content, true).is_err());
    }

    #[test]
    fn strict_rejects_unknown_key_with_line() {
        let content = "[[fields]]\ncanonical = \"port\"\ntagz = { transform = \"x\" }\n";
        let result = Schema::from_toml_str(content, true);
        match result {
            Err(TransfigError::UnknownDescriptorKeys(errors)) => {
                assert_eq!(errors.len(), 1);
                match &errors[0] {
                    TransfigError::UnknownDescriptorKey { key, line } => {
                        assert!(key.ends_with("tagz"));
                        assert_eq!(*line, 3);
                    }
                    other => panic!("Expected UnknownDescriptorKey, got {other:?}"),
                }
            }
            other => panic!("Expected UnknownDescriptorKeys, got {other:?}"),
        }
    }

    #[test]
    fn lenient_ignores_unknown_key() {
        let content = "[[fields]]\ncanonical = \"port\"\ntagz = { transform = \"x\" }\n";
        let schema = Schema::from_toml_str(content, false).unwrap();
        assert_eq!(schema.fields[0].canonical, "port");
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let result = Schema::from_toml_str("[[fields]\n", true);
        assert!(matches!(result, Err(TransfigError::TomlParse(_))));
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.toml");
        fs::write(&path, SAMPLE_TOML).unwrap();
        assert_eq!(Schema::from_file(&path, true).unwrap(), sample_schema());
    }

    #[test]
    fn from_file_reads_json_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.JSON");
        fs::write(&path, r#"{"fields": [{"canonical": "port"}]}"#).unwrap();
        let schema = Schema::from_file(&path, true).unwrap();
        assert_eq!(schema.fields[0].canonical, "port");
    }

    #[test]
    fn from_file_parse_error_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[[fields]\n").unwrap();
        match Schema::from_file(&path, true) {
            Err(TransfigError::ParseError { path: p, .. }) => assert_eq!(p, path),
            other => panic!("Expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = Schema::from_file(&dir.path().join("nope.toml"), true);
        assert!(matches!(result, Err(TransfigError::IoError { .. })));
    }

    #[test]
    fn find_key_line_locates_leaf() {
        let content = "[[fields]]\ncanonical = \"a\"\nbogus = 1\n";
        assert_eq!(find_key_line(content, "fields.0.bogus"), 3);
        assert_eq!(find_key_line(content, "fields.0.missing"), 0);
    }
}
