//! camelCase to snake_case key conversion for JSON payloads.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Recursively rename every object key to snake_case.
///
/// Arrays are walked so objects nested inside them are converted too.
/// Scalar values are returned untouched.
pub fn decamelize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(decamelize_map(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(decamelize_keys).collect()),
        other => other,
    }
}

/// Same as [`decamelize_keys`] for a bare object.
pub fn decamelize_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| (decamelize(&key), decamelize_keys(value)))
        .collect()
}

/// Insert `_` at case boundaries and lowercase the result.
///
/// Only a lowercase letter or digit followed by an uppercase letter, or the
/// end of an uppercase run followed by a capitalized word, counts as a
/// boundary. Every other character, `_`, `-`, `.` and brackets included, is
/// kept as written.
pub fn decamelize(key: &str) -> String {
    static LOWER_UPPER_RE: OnceLock<Regex> = OnceLock::new();
    static ACRONYM_RE: OnceLock<Regex> = OnceLock::new();

    let lower_upper_re = LOWER_UPPER_RE
        .get_or_init(|| Regex::new(r"([\p{Ll}\d])(\p{Lu})").expect("valid regex"));
    let acronym_re = ACRONYM_RE
        .get_or_init(|| Regex::new(r"(\p{Lu}+)(\p{Lu}[\p{Ll}\d]+)").expect("valid regex"));

    let split = lower_upper_re.replace_all(key, "${1}_${2}");
    let split = acronym_re.replace_all(&split, "${1}_${2}");
    split.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decamelize_nested() {
        let value = json!({
            "userName": "x",
            "projectSettings": { "mergeMethod": "ff", "squashOption": ["always"] },
            "approvalRules": [{ "ruleType": "any" }],
        });

        let converted = decamelize_keys(value);
        assert_eq!(
            converted,
            json!({
                "user_name": "x",
                "project_settings": { "merge_method": "ff", "squash_option": ["always"] },
                "approval_rules": [{ "rule_type": "any" }],
            })
        );
    }

    #[test]
    fn test_decamelize_leaves_values_alone() {
        let converted = decamelize_keys(json!({ "title": "camelCaseTitle" }));
        assert_eq!(converted, json!({ "title": "camelCaseTitle" }));
    }

    #[test]
    fn test_acronyms_split_before_next_word() {
        assert_eq!(decamelize("HTTPStatus"), "http_status");
        assert_eq!(decamelize("userIDList"), "user_id_list");
        assert_eq!(decamelize("sha256Sum"), "sha256_sum");
    }

    #[test]
    fn test_non_camel_keys_are_kept() {
        let converted = decamelize_keys(json!({
            "_links": 1,
            "foo-bar": 2,
            "a.b": 3,
            "not[labels]": 4,
            "double__underscore": 5,
        }));
        assert_eq!(
            converted,
            json!({
                "_links": 1,
                "foo-bar": 2,
                "a.b": 3,
                "not[labels]": 4,
                "double__underscore": 5,
            })
        );
    }

    #[test]
    fn test_snake_keys_are_stable() {
        let converted = decamelize_keys(json!({ "already_snake": 1 }));
        assert_eq!(converted, json!({ "already_snake": 1 }));
    }
}
