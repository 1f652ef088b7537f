#[cfg(test)]
pub mod test {
    use serde_json::json;

    use crate::pipeline::TransformOptions;
    use crate::schema::{Describe, Field, Schema};
    use crate::types::{FlatMap, Tree};

    /// Nested tree used by the flatten/unflatten tests.
    pub fn sample_tree() -> Tree {
        json!({
            "data": {"key": "value"},
            "array": [1, 2, 3],
            "dict": {"data": {"key": "value"}},
        })
    }

    /// `sample_tree()` flattened.
    pub fn sample_flat() -> FlatMap {
        [
            ("data.key", json!("value")),
            ("array.0", json!(1)),
            ("array.1", json!(2)),
            ("array.2", json!(3)),
            ("dict.data.key", json!("value")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    /// A free-form mapping, a free-form sequence with a child transform, a
    /// mapping of structs, and a struct whose field has a rooted alias.
    pub fn sample_schema() -> Schema {
        Schema::new()
            .field(Field::mapping("unknownmap").transform("normal"))
            .field(Field::sequence("unknownarray").child_transform("child"))
            .field(
                Field::map_of(
                    "structmap",
                    Schema::new().field(Field::scalar("key").transform("normal").on_use("test")),
                )
                .child_transform("child"),
            )
            .field(Field::structure(
                "struct",
                Schema::new().field(
                    Field::scalar("key2")
                        .aliases(".key2")
                        .transform("normal")
                        .on_use(".key2>>test"),
                ),
            ))
    }

    /// `normal` and `child` prefix the segment they are given.
    pub fn sample_options() -> TransformOptions {
        TransformOptions::new()
            .transform("normal", |s, v| Ok((format!("normal:{s}"), v)))
            .transform("child", |s, v| Ok((format!("child:{s}"), v)))
    }

    /// Input tree for the end-to-end scenario over `sample_schema()`.
    pub fn sample_input() -> Tree {
        json!({
            "key2": "value2",
            "unknownmap": {"key": "value"},
            "unknownarray": [1, 2, 3],
            "structmap": {"mapKey": {"key": "value"}},
            "struct": {"key2": "value1"},
        })
    }

    /// `sample_input()` after a transform pass.
    pub fn sample_output() -> Tree {
        json!({
            "normal:unknownmap": {"key": "value"},
            "unknownarray": {"child:0": 1, "child:1": 2, "child:2": 3},
            "structmap": {"child:mapkey": {"normal:key": "value"}},
            "struct": {"normal:key2": "value2"},
        })
    }

    /// A typed config that carries its own descriptor.
    pub struct ServerConfig;

    impl Describe for ServerConfig {
        fn describe() -> Schema {
            Schema::new()
                .field(Field::scalar("host").aliases("address,.bind"))
                .field(Field::scalar("port").transform("int"))
                .field(Field::structure(
                    "tls",
                    Schema::new().field(Field::scalar("cert").aliases("certificate")),
                ))
        }
    }

    #[test]
    fn sample_schema_is_valid() {
        assert!(sample_schema().validate().is_ok());
        assert!(ServerConfig::describe().validate().is_ok());
    }
}
