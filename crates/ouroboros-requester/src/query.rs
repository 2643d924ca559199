//! Query string formatting
//!
//! Keys are converted to snake_case before encoding. Arrays use bracket
//! notation (`labels[]=bug&labels[]=ui`) and nested objects expand to
//! bracketed paths (`filter[author_id]=5`), which a flat
//! `serde_urlencoded` pass cannot express.

use crate::case::decamelize_map;
use crate::options::ConfigMap;
use serde_json::Value;

/// Format search parameters into a URL query string (without the leading `?`).
///
/// An empty mapping yields an empty string.
pub fn format_query(params: &ConfigMap) -> String {
    let decamelized = decamelize_map(params.clone());

    let mut pairs = Vec::new();
    for (key, value) in &decamelized {
        push_pairs(&urlencoding::encode(key), value, &mut pairs);
    }

    pairs.join("&")
}

fn push_pairs(prefix: &str, value: &Value, pairs: &mut Vec<String>) {
    match value {
        Value::Null => pairs.push(format!("{}=", prefix)),
        Value::Bool(b) => pairs.push(format!("{}={}", prefix, b)),
        Value::Number(n) => pairs.push(format!("{}={}", prefix, n)),
        Value::String(s) => pairs.push(format!("{}={}", prefix, urlencoding::encode(s))),
        Value::Array(items) => {
            let key = format!("{}[]", prefix);
            for item in items {
                push_pairs(&key, item, pairs);
            }
        }
        Value::Object(map) => {
            for (sub_key, sub_value) in map {
                let key = format!("{}[{}]", prefix, urlencoding::encode(sub_key));
                push_pairs(&key, sub_value, pairs);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> ConfigMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_empty_params() {
        assert_eq!(format_query(&ConfigMap::new()), "");
    }

    #[test]
    fn test_scalar_params_are_snake_cased() {
        let query = format_query(&params(json!({ "orderBy": "created_at", "perPage": 50 })));
        assert_eq!(query, "order_by=created_at&per_page=50");
    }

    #[test]
    fn test_array_uses_brackets() {
        let query = format_query(&params(json!({ "labels": ["bug", "ui"] })));
        assert_eq!(query, "labels[]=bug&labels[]=ui");
    }

    #[test]
    fn test_nested_objects_expand_to_paths() {
        let query = format_query(&params(json!({
            "notIn": { "authorId": 5, "labelName": ["wontfix"] }
        })));
        assert_eq!(
            query,
            "not_in[author_id]=5&not_in[label_name][]=wontfix"
        );
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let query = format_query(&params(json!({ "archived": false, "search": "fix & merge" })));
        assert_eq!(query, "archived=false&search=fix%20%26%20merge");
    }

    #[test]
    fn test_empty_collections_are_dropped() {
        let query = format_query(&params(json!({ "labels": [], "scope": {}, "page": 2 })));
        assert_eq!(query, "page=2");
    }

    #[test]
    fn test_null_renders_empty_value() {
        let query = format_query(&params(json!({ "milestone": null })));
        assert_eq!(query, "milestone=");
    }

    #[test]
    fn test_array_of_objects() {
        let query = format_query(&params(json!({
            "rules": [{ "n": 1, "ruleType": "any" }, { "ruleType": "all" }]
        })));
        assert_eq!(query, "rules[][n]=1&rules[][rule_type]=any&rules[][rule_type]=all");
    }

    #[test]
    fn test_mixed_nesting_emits_every_leaf() {
        let query = format_query(&params(json!({
            "authorId": 7,
            "filter": {
                "approvedBy": [3, 4],
                "milestone": { "dueDate": "2024-01-01", "state": null },
            },
            "labels": ["bug", "needs review"],
            "scope": "all",
        })));

        let pairs: Vec<&str> = query.split('&').collect();
        assert_eq!(
            pairs,
            vec![
                "author_id=7",
                "filter[approved_by][]=3",
                "filter[approved_by][]=4",
                "filter[milestone][due_date]=2024-01-01",
                "filter[milestone][state]=",
                "labels[]=bug",
                "labels[]=needs%20review",
                "scope=all",
            ]
        );
    }

    #[test]
    fn test_non_camel_keys_are_not_rewritten() {
        let query = format_query(&params(json!({ "_links": 1, "x-total": 2 })));
        assert_eq!(query, "_links=1&x-total=2");
    }
}
