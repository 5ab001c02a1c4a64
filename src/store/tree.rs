// Path operations over a JSON tree, shared by the in-memory store and the
// realtime subscription cache.

use serde_json::{Map, Value};

/// Split a slash-separated path into segments, ignoring empty ones.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// True when one path is equal to, above, or below the other.
pub fn overlaps(a: &[String], b: &[&str]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

pub fn value_at<'a>(root: &'a Value, segs: &[&str]) -> Option<&'a Value> {
    let mut node = root;
    for seg in segs {
        node = match node {
            Value::Object(map) => map.get(*seg)?,
            Value::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}

/// Snapshot as seen by readers: null and empty objects read as absent.
pub fn snapshot(root: &Value, segs: &[&str]) -> Option<Value> {
    match value_at(root, segs)? {
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        other => Some(other.clone()),
    }
}

/// Write `value` at `segs`, creating intermediate objects.
///
/// Writing `null` deletes; parents left empty by a delete are pruned.
pub fn set_at(node: &mut Value, segs: &[&str], value: Value) {
    let Some((head, rest)) = segs.split_first() else {
        *node = value;
        return;
    };

    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    let child = map.entry(head.to_string()).or_insert(Value::Null);
    set_at(child, rest, value);
    let empty = match child {
        Value::Null => true,
        Value::Object(m) => m.is_empty(),
        _ => false,
    };
    if empty {
        map.remove(*head);
    }
}

/// Merge `fields` into the object at `segs`. Field keys may themselves be paths.
pub fn update_at(root: &mut Value, segs: &[&str], fields: Map<String, Value>) {
    for (key, value) in fields {
        let mut full: Vec<&str> = segs.to_vec();
        full.extend(segments(&key));
        set_at(root, &full, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut root = Value::Null;
        set_at(&mut root, &["motorcycles", "m1"], json!({"name": "Biz"}));
        assert_eq!(root, json!({"motorcycles": {"m1": {"name": "Biz"}}}));
    }

    #[test]
    fn test_null_write_prunes_empty_parents() {
        let mut root = json!({"motorcycles": {"m1": {"name": "Biz"}}, "clients": {"c1": {}}});
        set_at(&mut root, &["motorcycles", "m1"], Value::Null);
        assert_eq!(root, json!({"clients": {"c1": {}}}));
        assert_eq!(snapshot(&root, &["motorcycles"]), None);
    }

    #[test]
    fn test_update_merges_and_deletes_fields() {
        let mut root = json!({"motorcycles": {"m1": {"name": "Biz", "client": "Ana", "isAvailable": false}}});
        let mut fields = Map::new();
        fields.insert("client".into(), Value::Null);
        fields.insert("isAvailable".into(), json!(true));
        update_at(&mut root, &["motorcycles", "m1"], fields);
        assert_eq!(
            root,
            json!({"motorcycles": {"m1": {"name": "Biz", "isAvailable": true}}})
        );
    }

    #[test]
    fn test_reads_through_arrays() {
        let root = json!({"m": {"pictures": ["a.jpg", "b.jpg"]}});
        assert_eq!(value_at(&root, &["m", "pictures", "1"]), Some(&json!("b.jpg")));
        assert_eq!(value_at(&root, &["m", "pictures", "x"]), None);
    }

    #[test]
    fn test_overlapping_paths() {
        let watched = vec!["motorcycles".to_string()];
        assert!(overlaps(&watched, &["motorcycles", "m1"]));
        assert!(overlaps(&watched, &[]));
        assert!(!overlaps(&watched, &["clients", "c1"]));
    }

    #[test]
    fn test_segments_ignore_extra_slashes() {
        assert_eq!(segments("/motorcycles//m1/"), vec!["motorcycles", "m1"]);
        assert!(segments("").is_empty());
    }
}
