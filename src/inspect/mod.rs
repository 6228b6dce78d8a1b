//! CSN reference inspector: a pure reader over a finalised
//! CSN document. Given a navigational path (property names/array indices
//! from the document root), classifies the reference context the resolver
//! would have used at that position — lexical search start and dynamic
//! environment — and reports the artifact name the path navigates to.
//!
//! Backed by an identity-keyed cache (the "WeakMap-based inspector cache"
//! REDESIGN FLAG): keyed by the pointer address of the terminal
//! [`serde_json::Value`] the path reaches, scoped to the [`Inspector`]
//! handle and cleared on drop — the closest safe analogue to a weak map
//! available without unsafe code or nightly weak-table crates. Callers must
//! not mutate the underlying document while an `Inspector` is alive: doing
//! so can make a cached pointer-identity key collide with an unrelated,
//! newly-allocated node.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::model::Scope;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl PathSegment {
    pub fn field(name: impl Into<String>) -> Self {
        PathSegment::Field(name.into())
    }
}

/// Context key classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKey {
    /// `type`, `includes`, `target`, `targetAspect`, `from`.
    TypeLike,
    Keys,
    Excluding,
    /// `expand`/`inline` path continuations.
    ExpandInline,
    RefWhere,
    /// `on` inside a mixin/unmanaged-association declaration.
    OnMixinAssoc,
    OrderBy,
    OrderBySet,
    Default,
}

impl ContextKey {
    fn classify(last_field: Option<&str>) -> Self {
        match last_field {
            Some("type") | Some("includes") | Some("target") | Some("targetAspect") | Some("from") => {
                ContextKey::TypeLike
            }
            Some("keys") => ContextKey::Keys,
            Some("excluding") => ContextKey::Excluding,
            Some("expand") | Some("inline") => ContextKey::ExpandInline,
            Some("where") => ContextKey::RefWhere,
            Some("on") => ContextKey::OnMixinAssoc,
            Some("orderBy") => ContextKey::OrderBy,
            Some("orderBy_set") => ContextKey::OrderBySet,
            _ => ContextKey::Default,
        }
    }

    /// Lexical search start: `None` means "no lexical chain, go straight to
    /// the dynamic environment"; `Some(Scope::Magic)` means "`$`-names only".
    fn lexical_start(self) -> Option<Scope> {
        match self {
            ContextKey::TypeLike | ContextKey::Keys | ContextKey::Excluding => None,
            ContextKey::ExpandInline | ContextKey::RefWhere | ContextKey::OnMixinAssoc => Some(Scope::Magic),
            ContextKey::OrderBy | ContextKey::OrderBySet => Some(Scope::Query),
            ContextKey::Default => Some(Scope::Query),
        }
    }

    /// Static fallback, used when [`ref_terminal_scope`] can't pin down the
    /// ref's actual terminal (a `JOIN`/subquery `FROM`, or a malformed
    /// document) — the closest approximation previously hardcoded for every
    /// `where`/`expand`/`inline` context regardless of what it was inside.
    fn dynamic_env(self) -> Scope {
        match self {
            ContextKey::TypeLike => Scope::Global,
            ContextKey::Keys => Scope::Target,
            ContextKey::Excluding => Scope::Source,
            ContextKey::ExpandInline | ContextKey::RefWhere => Scope::Source,
            ContextKey::OnMixinAssoc | ContextKey::OrderBy | ContextKey::OrderBySet => Scope::Query,
            ContextKey::Default => Scope::Source,
        }
    }
}

/// For a `where`/`expand`/`inline` context, the real resolver seeds the
/// nested ref/filter from the *elements of the outer ref's terminal*, not
/// the query's combined source elements (`resolve::path::resolve_continuations`
/// tags every such seed entry `Scope::RefTarget`). Reconstructs that
/// terminal from the raw document: finds the object holding the `where`/
/// `expand`/`inline` key, reads its sibling `ref` array, and walks that
/// chain from the enclosing query's `FROM` entity through `elements.<id>`
/// target hops. Returns `None` (falling back to the static default) for
/// anything this can't determine: a `JOIN`/subquery `FROM`, a step with no
/// `target` (the chain doesn't end on an association), or a path shape that
/// doesn't start at `/definitions/<Name>`.
fn ref_terminal_scope(root: &Value, path: &[PathSegment]) -> Option<Scope> {
    let last_field_idx = path.iter().rposition(|seg| matches!(seg, PathSegment::Field(_)))?;
    let parent = navigate(root, &path[..last_field_idx])?;
    let sibling_ref = parent.get("ref")?.as_array()?;

    let PathSegment::Field(definitions) = &path[0] else { return None };
    if definitions != "definitions" {
        return None;
    }
    let PathSegment::Field(entity_name) = path.get(1)? else { return None };

    let base_entity = from_entity_of(root, entity_name)?;
    resolve_ref_chain(root, &base_entity, sibling_ref)?;
    Some(Scope::RefTarget)
}

/// The base entity of `entity_name`'s own top-level query: `from`'s single
/// `ref` (a `JOIN`/subquery `FROM` is not handled here, only a plain path).
fn from_entity_of(root: &Value, entity_name: &str) -> Option<String> {
    let from = root.get("definitions")?.get(entity_name)?.get("query")?.get("SELECT")?.get("from")?;
    ref_last_step_name(from)
}

fn ref_last_step_name(value: &Value) -> Option<String> {
    value.get("ref")?.as_array()?.last()?.as_str().map(String::from)
}

fn step_id(step: &Value) -> Option<&str> {
    match step {
        Value::String(s) => Some(s),
        Value::Object(o) => o.get("id").and_then(Value::as_str),
        _ => None,
    }
}

fn target_name_of(element: &Value) -> Option<String> {
    match element.get("target")? {
        Value::Object(_) => ref_last_step_name(element.get("target")?),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Walks `steps` from `start_entity`, hopping to each step's element's
/// `target` in turn. `None` as soon as a step names no element, or an
/// element with no `target` (association hop required at every step).
fn resolve_ref_chain(root: &Value, start_entity: &str, steps: &[Value]) -> Option<String> {
    let mut current = start_entity.to_string();
    for step in steps {
        let id = step_id(step)?;
        let element = root.get("definitions")?.get(&current)?.get("elements")?.get(id)?;
        current = target_name_of(element)?;
    }
    Some(current)
}

#[derive(Debug, Clone)]
pub struct InspectResult {
    pub context: ContextKey,
    pub lexical_start: Option<Scope>,
    pub env: Scope,
    /// The artifact/member name the path navigates to, if the terminal
    /// value is itself a name (a bare string) or a `ref` array whose last
    /// step names one.
    pub art: Option<String>,
}

pub struct Inspector<'a> {
    root: &'a Value,
    cache: Mutex<FxHashMap<usize, InspectResult>>,
}

impl<'a> Inspector<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self {
            root,
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn inspect(&self, path: &[PathSegment]) -> InspectResult {
        let terminal = navigate(self.root, path);
        let key = terminal.map(|v| v as *const Value as usize).unwrap_or(0);

        if let Some(cached) = self.cache.lock().get(&key) {
            return cached.clone();
        }

        let last_field = path.iter().rev().find_map(|seg| match seg {
            PathSegment::Field(name) => Some(name.as_str()),
            PathSegment::Index(_) => None,
        });
        let context = ContextKey::classify(last_field);
        let env = match context {
            ContextKey::ExpandInline | ContextKey::RefWhere => {
                ref_terminal_scope(self.root, path).unwrap_or_else(|| context.dynamic_env())
            }
            _ => context.dynamic_env(),
        };
        let result = InspectResult {
            context,
            lexical_start: context.lexical_start(),
            env,
            art: terminal.and_then(art_name_of),
        };
        self.cache.lock().insert(key, result.clone());
        result
    }
}

fn navigate<'v>(root: &'v Value, path: &[PathSegment]) -> Option<&'v Value> {
    let mut current = root;
    for seg in path {
        current = match (current, seg) {
            (Value::Object(map), PathSegment::Field(name)) => map.get(name)?,
            (Value::Array(items), PathSegment::Index(i)) => items.get(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

fn art_name_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => match map.get("ref") {
            Some(Value::Array(steps)) => steps.last().and_then(|step| match step {
                Value::String(s) => Some(s.clone()),
                Value::Object(o) => o.get("id").and_then(Value::as_str).map(String::from),
                _ => None,
            }),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn a_type_segment_classifies_as_typelike_with_global_env() {
        let root = json!({
            "definitions": {
                "Books.currency": { "type": "sap.common.Currency" }
            }
        });
        let path = vec![
            PathSegment::field("definitions"),
            PathSegment::field("Books.currency"),
            PathSegment::field("type"),
        ];
        let inspector = Inspector::new(&root);
        let result = inspector.inspect(&path);
        assert_eq!(result.context, ContextKey::TypeLike);
        assert_eq!(result.env, Scope::Global);
        assert_eq!(result.art.as_deref(), Some("sap.common.Currency"));
    }

    #[test]
    fn a_ref_array_terminal_names_its_last_step() {
        let root = json!({
            "on": { "ref": ["texts", "locale"] }
        });
        let path = vec![PathSegment::field("on")];
        let inspector = Inspector::new(&root);
        let result = inspector.inspect(&path);
        assert_eq!(result.context, ContextKey::OnMixinAssoc);
        assert_eq!(result.art.as_deref(), Some("locale"));
    }

    #[test]
    fn an_expand_nested_ref_resolves_scope_against_the_outer_refs_target_entity() {
        let root = json!({
            "definitions": {
                "Authors": {
                    "kind": "entity",
                    "elements": {
                        "ID": { "type": "cds.Integer" },
                        "books": { "type": "cds.Composition", "target": "Books" }
                    }
                },
                "Books": {
                    "kind": "entity",
                    "elements": {
                        "ID": { "type": "cds.Integer" },
                        "price": { "type": "cds.Decimal" }
                    }
                },
                "AuthorsView": {
                    "kind": "entity",
                    "query": {
                        "SELECT": {
                            "from": { "ref": ["Authors"] },
                            "columns": [
                                { "ref": ["books"], "expand": [ { "ref": ["price"] } ] }
                            ]
                        }
                    }
                }
            }
        });
        let path = vec![
            PathSegment::field("definitions"),
            PathSegment::field("AuthorsView"),
            PathSegment::field("query"),
            PathSegment::field("SELECT"),
            PathSegment::field("columns"),
            PathSegment::Index(0),
            PathSegment::field("expand"),
            PathSegment::Index(0),
        ];
        let inspector = Inspector::new(&root);
        let result = inspector.inspect(&path);
        assert_eq!(result.context, ContextKey::ExpandInline);
        assert_eq!(result.env, Scope::RefTarget);
        assert_eq!(result.art.as_deref(), Some("price"));
    }

    #[test]
    fn an_unresolvable_join_from_falls_back_to_the_static_default_scope() {
        let root = json!({
            "definitions": {
                "Authors": {
                    "kind": "entity",
                    "elements": {
                        "books": { "type": "cds.Composition", "target": "Books" }
                    }
                },
                "AuthorsView": {
                    "kind": "entity",
                    "query": {
                        "SELECT": {
                            "from": {
                                "join": "inner",
                                "args": [ { "ref": ["Authors"] }, { "ref": ["Books"] } ]
                            },
                            "columns": [
                                { "ref": ["books"], "expand": [ { "ref": ["price"] } ] }
                            ]
                        }
                    }
                }
            }
        });
        let path = vec![
            PathSegment::field("definitions"),
            PathSegment::field("AuthorsView"),
            PathSegment::field("query"),
            PathSegment::field("SELECT"),
            PathSegment::field("columns"),
            PathSegment::Index(0),
            PathSegment::field("expand"),
            PathSegment::Index(0),
        ];
        let inspector = Inspector::new(&root);
        let result = inspector.inspect(&path);
        assert_eq!(result.env, Scope::Source);
    }

    #[test]
    fn repeated_inspection_of_the_same_path_hits_the_cache() {
        let root = json!({ "keys": ["ID"] });
        let path = vec![PathSegment::field("keys")];
        let inspector = Inspector::new(&root);
        let first = inspector.inspect(&path);
        let second = inspector.inspect(&path);
        assert_eq!(first.context, second.context);
        assert_eq!(inspector.cache.lock().len(), 1);
    }
}
