//! Header normalization: upstream sometimes sends ordered lists as keyed objects
//! (`{"0": {...}, "1": {...}}`). These are coerced to arrays of their values, keeping
//! key insertion order.

use serde_json::{Map, Value};

/// Replaces a keyed object with an array of its values. Returns `true` when it changed.
pub fn coerce_sequence(value: &mut Value) -> bool {
    match value {
        Value::Object(map) => {
            let items: Vec<Value> = std::mem::take(map).into_iter().map(|(_, v)| v).collect();
            *value = Value::Array(items);
            true
        }
        _ => false,
    }
}

fn coerce_field(obj: &mut Map<String, Value>, key: &str) -> bool {
    obj.get_mut(key).map(coerce_sequence).unwrap_or(false)
}

/// Normalizes a header config in place: `nav`, `bars`, each bar's `list` and each list's
/// `items` become arrays. Returns the number of fields that were coerced.
pub fn normalize_header(header: &mut Value) -> usize {
    let Some(obj) = header.as_object_mut() else {
        return 0;
    };
    let mut changed = usize::from(coerce_field(obj, "nav")) + usize::from(coerce_field(obj, "bars"));

    if let Some(Value::Array(bars)) = obj.get_mut("bars") {
        for bar in bars.iter_mut().filter_map(Value::as_object_mut) {
            changed += usize::from(coerce_field(bar, "list"));
            if let Some(Value::Array(lists)) = bar.get_mut("list") {
                for list in lists.iter_mut().filter_map(Value::as_object_mut) {
                    changed += usize::from(coerce_field(list, "items"));
                }
            }
        }
    }
    changed
}
