//! Request-layer authorisation rewriting: a thin consumer of
//! the reference API over finalised CSN — not a compiler phase. Two
//! operations: substituting `$user.<attr>` refs with resolved literals, and
//! expanding a structured reference into its leaf path, preserving order.

use rustc_hash::FxHashMap;
use serde_json::{Value, json};

/// Rewrites every `{"ref": ["$user", attr, ...]}` node found anywhere in
/// `predicate` into a CSN literal (`{"val": ...}`) using `user_attrs`. A
/// `$user` ref naming an attribute absent from `user_attrs` is left
/// untouched — the caller decides whether an unresolved `$user` attribute
/// is itself an authorisation failure.
pub fn rewrite_predicate(predicate: &Value, user_attrs: &FxHashMap<String, Value>) -> Value {
    match predicate {
        Value::Object(map) => {
            if let Some(literal) = user_literal(map, user_attrs) {
                return literal;
            }
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), rewrite_predicate(v, user_attrs));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| rewrite_predicate(v, user_attrs)).collect()),
        other => other.clone(),
    }
}

fn user_literal(map: &serde_json::Map<String, Value>, user_attrs: &FxHashMap<String, Value>) -> Option<Value> {
    let Value::Array(steps) = map.get("ref")? else {
        return None;
    };
    if steps.first()?.as_str()? != "$user" {
        return None;
    }
    let attr = steps.get(1)?.as_str()?;
    user_attrs.get(attr).map(|v| json!({ "val": v }))
}

/// Expands a structured `{"ref": [...]}` reference into its leaf step
/// names, preserving order. Non-ref values produce an empty path.
pub fn expand_leaf_path(reference: &Value) -> Vec<String> {
    let Some(Value::Array(steps)) = reference.get("ref") else {
        return Vec::new();
    };
    steps
        .iter()
        .filter_map(|step| match step {
            Value::String(s) => Some(s.clone()),
            Value::Object(o) => o.get("id").and_then(Value::as_str).map(String::from),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn a_user_ref_is_replaced_with_its_resolved_literal() {
        let mut attrs = FxHashMap::default();
        attrs.insert("region".to_string(), json!("EU"));
        let predicate = json!({
            "xpr": [
                { "ref": ["region"] },
                "=",
                { "ref": ["$user", "region"] },
            ]
        });
        let rewritten = rewrite_predicate(&predicate, &attrs);
        assert_eq!(rewritten["xpr"][2], json!({ "val": "EU" }));
        assert_eq!(rewritten["xpr"][0], json!({ "ref": ["region"] }));
    }

    #[test]
    fn an_unresolved_user_attribute_is_left_as_is() {
        let attrs = FxHashMap::default();
        let predicate = json!({ "ref": ["$user", "region"] });
        let rewritten = rewrite_predicate(&predicate, &attrs);
        assert_eq!(rewritten, predicate);
    }

    #[test]
    fn expand_leaf_path_preserves_step_order() {
        let reference = json!({ "ref": ["author", "books", "title"] });
        assert_eq!(expand_leaf_path(&reference), vec!["author", "books", "title"]);
    }
}
