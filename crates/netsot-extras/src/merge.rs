//! Deep merge of config context data
//!
//! Mappings merge key by key, recursively. Any other pairing, including
//! lists and mismatched types, takes the overlay value wholesale.

use serde_json::Value;

use netsot_persistence::ContextData;

fn merge_value(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => deep_merge(base_map, overlay_map),
        (b, v) => *b = v.clone(),
    }
}

/// Merge `overlay` into `base`; `overlay` wins at every leaf
pub fn deep_merge(base: &mut ContextData, overlay: &ContextData) {
    for (key, value) in overlay {
        match base.get_mut(key) {
            Some(existing) => merge_value(existing, value),
            None => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Fold documents left to right starting from the empty mapping
pub fn merge<'a, I>(documents: I) -> ContextData
where
    I: IntoIterator<Item = &'a ContextData>,
{
    documents
        .into_iter()
        .fold(ContextData::new(), |mut acc, document| {
            deep_merge(&mut acc, document);
            acc
        })
}
