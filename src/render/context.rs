//! Render context composition.
//!
//! The data object handed to the layout template is built by layering
//! four sources, later layers winning key-by-key:
//!
//! ```text
//! {} ← global data ← upstream per-document data ← front matter
//!    ← { page, layout, root }
//! ```
//!
//! Nested objects merge recursively; scalars and arrays are replaced
//! wholesale. The computed constants come last so a page can never
//! shadow its own `page`/`layout`/`root` values.

use serde_json::{Map, Value, json};

/// Deep-merge `overlay` into `base`.
///
/// Objects merge key-by-key recursively; any other pairing replaces the
/// base value. Arrays replace, they do not concatenate.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match overlay {
        Value::Object(entries) => {
            if let Value::Object(target) = base {
                for (key, value) in entries {
                    match target.get_mut(&key) {
                        Some(slot) => deep_merge(slot, value),
                        None => {
                            target.insert(key, value);
                        }
                    }
                }
            } else {
                *base = Value::Object(entries);
            }
        }
        other => *base = other,
    }
}

/// Merge an overlay value into a map, ignoring non-object overlays.
fn merge_into(target: &mut Map<String, Value>, overlay: Value) {
    if let Value::Object(entries) = overlay {
        for (key, value) in entries {
            match target.get_mut(&key) {
                Some(slot) => deep_merge(slot, value),
                None => {
                    target.insert(key, value);
                }
            }
        }
    }
}

/// Build the render context for one document.
pub fn compose(
    global: &Value,
    upstream: Option<&Value>,
    attributes: &Map<String, Value>,
    page: &str,
    layout: &str,
    root: &str,
) -> Map<String, Value> {
    let mut context = Map::new();
    merge_into(&mut context, global.clone());
    if let Some(data) = upstream {
        merge_into(&mut context, data.clone());
    }
    merge_into(&mut context, Value::Object(attributes.clone()));

    // Computed constants are applied last and always win
    context.insert("page".into(), json!(page));
    context.insert("layout".into(), json!(layout));
    context.insert("root".into(), json!(root));
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("attrs helper expects an object"),
        }
    }

    #[test]
    fn test_deep_merge_scalar_replaced() {
        let mut base = json!({"a": 1});
        deep_merge(&mut base, json!({"a": 2, "b": 3}));
        assert_eq!(base, json!({"a": 2, "b": 3}));
    }

    #[test]
    fn test_deep_merge_nested_objects_merge() {
        let mut base = json!({"k": {"x": 1}});
        deep_merge(&mut base, json!({"k": {"y": 2}}));
        assert_eq!(base, json!({"k": {"x": 1, "y": 2}}));
    }

    #[test]
    fn test_deep_merge_arrays_replace() {
        let mut base = json!({"tags": [1, 2, 3]});
        deep_merge(&mut base, json!({"tags": [4]}));
        assert_eq!(base, json!({"tags": [4]}));
    }

    #[test]
    fn test_deep_merge_absent_key_retained() {
        let mut base = json!({"keep": "me", "k": {"deep": true}});
        deep_merge(&mut base, json!({"other": 1}));
        assert_eq!(base, json!({"keep": "me", "k": {"deep": true}, "other": 1}));
    }

    #[test]
    fn test_deep_merge_object_over_scalar() {
        let mut base = json!({"k": 1});
        deep_merge(&mut base, json!({"k": {"x": 2}}));
        assert_eq!(base, json!({"k": {"x": 2}}));
    }

    #[test]
    fn test_compose_later_layer_wins_scalar() {
        let context = compose(
            &json!({"a": 1}),
            Some(&json!({})),
            &attrs(json!({"a": 2, "b": 3})),
            "index",
            "default",
            "",
        );
        assert_eq!(context["a"], json!(2));
        assert_eq!(context["b"], json!(3));
    }

    #[test]
    fn test_compose_recursive_merge_across_layers() {
        let context = compose(
            &json!({"k": {"x": 1}}),
            None,
            &attrs(json!({"k": {"y": 2}})),
            "index",
            "default",
            "",
        );
        assert_eq!(context["k"], json!({"x": 1, "y": 2}));
    }

    #[test]
    fn test_compose_upstream_between_global_and_front_matter() {
        let context = compose(
            &json!({"a": "global", "b": "global"}),
            Some(&json!({"b": "upstream", "c": "upstream"})),
            &attrs(json!({"c": "page"})),
            "index",
            "default",
            "",
        );
        assert_eq!(context["a"], json!("global"));
        assert_eq!(context["b"], json!("upstream"));
        assert_eq!(context["c"], json!("page"));
    }

    #[test]
    fn test_compose_constants_not_overridable() {
        let context = compose(
            &json!({}),
            None,
            &attrs(json!({"page": "spoofed", "layout": "spoofed", "root": "spoofed"})),
            "real-page",
            "real-layout",
            "../",
        );
        assert_eq!(context["page"], json!("real-page"));
        assert_eq!(context["layout"], json!("real-layout"));
        assert_eq!(context["root"], json!("../"));
    }

    #[test]
    fn test_compose_empty_front_matter_contributes_nothing() {
        let context = compose(&json!({"a": 1}), None, &Map::new(), "p", "default", "");
        assert_eq!(context["a"], json!(1));
        assert_eq!(context.len(), 4); // a + the three constants
    }

    #[test]
    fn test_compose_non_object_global_ignored() {
        let context = compose(&json!("scalar"), None, &Map::new(), "p", "default", "");
        assert_eq!(context.len(), 3); // only the constants
    }
}
