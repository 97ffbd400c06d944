//! Dotted field paths over JSON documents.
//!
//! `set_path` follows `$set` update semantics:
//! - missing intermediate fields are created as objects
//! - numeric segments index into arrays; writing past the end pads with null
//! - descending into a scalar is an error

use serde_json::{Map, Value};

use crate::error::{ResolverError, Result};

/// Value at `path`, if every segment exists.
pub fn get_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Set `path` to `value`, creating what is missing along the way.
pub fn set_path(doc: &mut Value, path: &str, value: Value) -> Result<()> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ResolverError::Store(format!("invalid field path '{path}'")));
    }

    let Some((last, parents)) = segments.split_last() else {
        return Err(ResolverError::Store(format!("invalid field path '{path}'")));
    };

    let mut current = doc;
    for segment in parents {
        current = child_mut(current, segment, path)?;
    }
    *slot_mut(current, last, path)? = value;
    Ok(())
}

/// Descend one segment, turning a missing or null child into an object.
fn child_mut<'a>(current: &'a mut Value, segment: &str, path: &str) -> Result<&'a mut Value> {
    let slot = slot_mut(current, segment, path)?;
    if slot.is_null() {
        *slot = Value::Object(Map::new());
    }
    Ok(slot)
}

/// The slot named by `segment`, inserting null when absent.
fn slot_mut<'a>(current: &'a mut Value, segment: &str, path: &str) -> Result<&'a mut Value> {
    match current {
        Value::Object(map) => Ok(map.entry(segment.to_string()).or_insert(Value::Null)),
        Value::Array(items) => {
            let index: usize = segment.parse().map_err(|_| {
                ResolverError::Store(format!(
                    "cannot use non-numeric segment '{segment}' on an array in '{path}'"
                ))
            })?;
            if index >= items.len() {
                items.resize(index + 1, Value::Null);
            }
            Ok(&mut items[index])
        }
        other => Err(ResolverError::Store(format!(
            "cannot create field '{segment}' in non-container {} in '{path}'",
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_into_existing_array_element() {
        let mut doc = json!({"human_labels": [{"labels": [{"label_id": "a"}, {"label_id": "b"}]}]});
        set_path(
            &mut doc,
            "human_labels.0.labels.1.exactCoordinates",
            json!({"lat": 1.0, "lng": 2.0}),
        )
        .unwrap();

        assert_eq!(
            doc["human_labels"][0]["labels"][1],
            json!({"label_id": "b", "exactCoordinates": {"lat": 1.0, "lng": 2.0}})
        );
        assert_eq!(doc["human_labels"][0]["labels"][0], json!({"label_id": "a"}));
    }

    #[test]
    fn test_missing_intermediates_become_objects() {
        let mut doc = json!({});
        set_path(&mut doc, "a.b.c", json!(1)).unwrap();
        assert_eq!(doc, json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn test_array_padded_with_null() {
        let mut doc = json!({"items": [1]});
        set_path(&mut doc, "items.3", json!(4)).unwrap();
        assert_eq!(doc, json!({"items": [1, null, null, 4]}));
    }

    #[test]
    fn test_overwrite_top_level() {
        let mut doc = json!({"address": "old"});
        set_path(&mut doc, "address", json!("new")).unwrap();
        assert_eq!(doc["address"], "new");

        set_path(&mut doc, "address", Value::Null).unwrap();
        assert!(doc["address"].is_null());
    }

    #[test]
    fn test_errors() {
        let mut doc = json!({"name": "x", "list": []});
        assert!(set_path(&mut doc, "name.first", json!(1)).is_err());
        assert!(set_path(&mut doc, "list.first", json!(1)).is_err());
        assert!(set_path(&mut doc, "a..b", json!(1)).is_err());
        assert!(set_path(&mut doc, "", json!(1)).is_err());
    }

    #[test]
    fn test_get_path() {
        let doc = json!({"a": [{"b": 5}]});
        assert_eq!(get_path(&doc, "a.0.b"), Some(&json!(5)));
        assert_eq!(get_path(&doc, "a.1.b"), None);
        assert_eq!(get_path(&doc, "a.x"), None);
    }
}
