//! Deep merge for layered YAML configuration.
//!
//! # Merge Rules
//!
//! - Mappings are merged recursively
//! - Sequences are replaced entirely, so a project dependency list fully
//!   replaces the user's
//! - Null values in the overlay delete the key from the base
//! - Scalars in the overlay replace the base

use serde_yaml::Value;

/// Deep merge two YAML values. `overlay` wins at every conflict.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            let mut result = base_map.clone();

            for (key, overlay_value) in overlay_map {
                if overlay_value.is_null() {
                    result.remove(key);
                } else if let Some(base_value) = base_map.get(key) {
                    result.insert(key.clone(), deep_merge(base_value, overlay_value));
                } else {
                    result.insert(key.clone(), overlay_value.clone());
                }
            }

            Value::Mapping(result)
        }

        (_, overlay) => overlay.clone(),
    }
}

/// Merge configs in order; later entries take precedence.
///
/// Null documents (empty files) are skipped rather than wiping the base.
pub fn merge_configs(configs: &[Value]) -> Value {
    configs
        .iter()
        .filter(|config| !config.is_null())
        .fold(Value::Mapping(Default::default()), |acc, config| {
            deep_merge(&acc, config)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn overlay_replaces_only_conflicting_key() {
        let base = yaml(
            r#"
authors:
  domain: foo.com
  output: authors.txt
"#,
        );
        let overlay = yaml(
            r#"
authors:
  domain: example.com
"#,
        );

        let result = deep_merge(&base, &overlay);

        assert_eq!(result["authors"]["domain"], "example.com");
        assert_eq!(result["authors"]["output"], "authors.txt");
    }

    #[test]
    fn dependency_lists_are_replaced() {
        let base = yaml(
            r#"
verify:
  dependencies:
    - { name: Git, required_version: 1.7.7.5, command: git }
    - { name: svn, required_version: 1.6.17, command: svn }
"#,
        );
        let overlay = yaml(
            r#"
verify:
  dependencies:
    - { name: svn, required_version: 1.8.0, command: svn }
"#,
        );

        let result = deep_merge(&base, &overlay);
        let deps = result["verify"]["dependencies"].as_sequence().unwrap();

        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0]["required_version"], "1.8.0");
    }

    #[test]
    fn null_removes_inherited_value() {
        let base = yaml("authors:\n  domain: corp.example\n  repo: /srv/svn\n");
        let overlay = yaml("authors:\n  domain: null\n");

        let result = deep_merge(&base, &overlay);

        assert!(result["authors"].get("domain").is_none());
        assert_eq!(result["authors"]["repo"], "/srv/svn");
    }

    #[test]
    fn scalar_overlay_replaces_mapping_base() {
        let base = yaml("verify:\n  connectivity:\n    enabled: true\n");
        let overlay = yaml("verify:\n  connectivity: off\n");

        let result = deep_merge(&base, &overlay);
        assert_eq!(result["verify"]["connectivity"], "off");
    }

    #[test]
    fn merge_configs_applies_in_order() {
        let configs = vec![yaml("a: 1\nb: 2"), yaml("b: 3\nc: 4"), yaml("c: 5")];

        let result = merge_configs(&configs);

        assert_eq!(result["a"], 1);
        assert_eq!(result["b"], 3);
        assert_eq!(result["c"], 5);
    }

    #[test]
    fn empty_documents_are_skipped() {
        let configs = vec![yaml("a: 1"), Value::Null];
        let result = merge_configs(&configs);
        assert_eq!(result["a"], 1);
    }

    #[test]
    fn merge_nothing_is_empty_mapping() {
        let result = merge_configs(&[]);
        assert!(result.as_mapping().unwrap().is_empty());
    }
}
