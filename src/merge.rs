use serde_json::{Map, Value};

/// Layer `overlay` onto `base`.
///
/// Overlay keys land on an existing key that matches ignoring ASCII case, so
/// a lowercased environment layer updates `Server.Port` in place. Mappings on
/// both sides are layered recursively; any other overlay value replaces what
/// was there, sequences included.
pub fn deep_merge(mut base: Map<String, Value>, overlay: Map<String, Value>) -> Map<String, Value> {
    for (key, incoming) in overlay {
        let key = existing_key(&base, &key).unwrap_or(key);
        let merged = match (base.remove(&key), incoming) {
            (Some(Value::Object(below)), Value::Object(above)) => {
                Value::Object(deep_merge(below, above))
            }
            (_, incoming) => incoming,
        };
        base.insert(key, merged);
    }
    base
}

fn existing_key(map: &Map<String, Value>, key: &str) -> Option<String> {
    if map.contains_key(key) {
        return None;
    }
    map.keys().find(|k| k.eq_ignore_ascii_case(key)).cloned()
}
