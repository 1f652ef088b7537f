use serde_json::{Map, Value};

/// Collect `{PREFIX}__A__B=v` variables into the layer `{"a": {"b": v}}`.
///
/// Path segments are split on `__` and lowercased, so `APP__POOL_SIZE`
/// becomes `pool_size`. Variables outside the prefix are ignored.
/// Values are typed with `parse_env_value`.
pub fn env_to_map(
    prefix: &str,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Map<String, Value> {
    let needle = format!("{prefix}__");
    let mut map = Map::new();

    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(&needle) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }

        let segments: Vec<&str> = rest.split("__").collect();
        insert_nested(&mut map, &segments, parse_env_value(&value));
    }

    map
}

fn insert_nested(map: &mut Map<String, Value>, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    let key = head.to_lowercase();

    if rest.is_empty() {
        map.insert(key, value);
        return;
    }

    let sub = map
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()));
    if !sub.is_object() {
        // A deeper variable beats a shallower one that named the same key.
        *sub = Value::Object(Map::new());
    }
    if let Value::Object(sub_map) = sub {
        insert_nested(sub_map, rest, value);
    }
}

/// `true`/`false` in any case, then `i64`, then a finite float written with a
/// `.`, else the raw string.
fn parse_env_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::from(i);
    }
    if s.contains('.')
        && let Ok(f) = s.parse::<f64>()
        && let Some(n) = serde_json::Number::from_f64(f)
    {
        return Value::Number(n);
    }
    Value::String(s.to_string())
}
