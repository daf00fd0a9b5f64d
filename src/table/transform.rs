//! Response-shape normalization
//!
//! Flattening helpers shared by every table: dotted-path extraction from the
//! response envelope, provider tag arrays to maps, zone to region.

use serde_json::{Map, Value};

/// Extract the value at a dotted path ("KeyPairs.KeyPair"). An empty path
/// is the root; numeric segments index into arrays.
pub fn value_at_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(root);
    }
    let mut current = root;
    for part in path.split('.') {
        current = match part.parse::<usize>() {
            Ok(index) => current.get(index)?,
            Err(_) => current.get(part)?,
        };
    }
    Some(current)
}

/// The items array at a dotted path; missing or non-array yields empty.
pub fn items_at_path(root: &Value, path: &str) -> Vec<Value> {
    match value_at_path(root, path) {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

/// The string at a dotted path, when present and non-empty.
pub fn string_at_path(root: &Value, path: &str) -> Option<String> {
    value_at_path(root, path)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// The integer at a dotted path.
pub fn int_at_path(root: &Value, path: &str) -> Option<i64> {
    value_at_path(root, path).and_then(Value::as_i64)
}

/// Convert a provider tag array to a flat map. Different services name the
/// entry fields Key/Value or TagKey/TagValue.
pub fn tags_to_map(tags: &Value) -> Option<Map<String, Value>> {
    let entries = tags.as_array()?;
    if entries.is_empty() {
        return None;
    }

    let mut map = Map::new();
    for entry in entries {
        let key = entry
            .get("Key")
            .or_else(|| entry.get("TagKey"))
            .and_then(Value::as_str);
        let value = entry
            .get("Value")
            .or_else(|| entry.get("TagValue"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        if let Some(key) = key {
            map.insert(key.to_string(), Value::String(value.to_string()));
        }
    }
    Some(map)
}

/// Strip the zone discriminator: "cn-hangzhou-b" -> "cn-hangzhou",
/// "us-east-1a" -> "us-east-1".
pub fn zone_to_region(zone: &str) -> &str {
    zone.trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .trim_end_matches('-')
}

/// Post-process one listed item before streaming: rewrite the tag array at
/// `tag_path` into a "tags" map and record the region the item came from.
pub fn normalize_item(mut item: Value, tag_path: Option<&str>, region: &str) -> Value {
    let tags = tag_path
        .and_then(|path| value_at_path(&item, path))
        .cloned()
        .as_ref()
        .and_then(tags_to_map);

    if let Value::Object(map) = &mut item {
        if let Some(tags) = tags {
            map.insert("tags".to_string(), Value::Object(tags));
        }
        map.insert("region".to_string(), Value::String(region.to_string()));
    }

    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_at_path() {
        let root = json!({"KeyPairs": {"KeyPair": [{"KeyPairName": "kp-1"}]}});
        assert_eq!(
            value_at_path(&root, "KeyPairs.KeyPair.0.KeyPairName"),
            Some(&json!("kp-1"))
        );
        assert_eq!(value_at_path(&root, "KeyPairs.Missing"), None);
        assert_eq!(value_at_path(&root, ""), Some(&root));
    }

    #[test]
    fn test_items_at_path_tolerates_missing() {
        let root = json!({"Vpcs": {"Vpc": [1, 2]}});
        assert_eq!(items_at_path(&root, "Vpcs.Vpc").len(), 2);
        assert!(items_at_path(&root, "Nope").is_empty());
        assert!(items_at_path(&root, "Vpcs").is_empty());
    }

    #[test]
    fn test_tags_to_map_handles_both_namings() {
        let short = json!([{"Key": "env", "Value": "prod"}]);
        let long = json!([{"TagKey": "team", "TagValue": "infra"}]);
        assert_eq!(tags_to_map(&short).unwrap()["env"], "prod");
        assert_eq!(tags_to_map(&long).unwrap()["team"], "infra");
        assert!(tags_to_map(&json!([])).is_none());
    }

    #[test]
    fn test_zone_to_region() {
        assert_eq!(zone_to_region("cn-hangzhou-b"), "cn-hangzhou");
        assert_eq!(zone_to_region("us-east-1a"), "us-east-1");
        assert_eq!(zone_to_region("123"), "123");
    }

    #[test]
    fn test_normalize_item() {
        let item = json!({
            "KeyPairName": "kp-1",
            "Tags": {"Tag": [{"TagKey": "env", "TagValue": "prod"}]}
        });
        let normalized = normalize_item(item, Some("Tags.Tag"), "cn-hangzhou");
        assert_eq!(normalized["tags"]["env"], "prod");
        assert_eq!(normalized["region"], "cn-hangzhou");
        // Original structure stays for hosts that project the raw field.
        assert_eq!(normalized["KeyPairName"], "kp-1");
    }
}
