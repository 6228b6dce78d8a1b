//! Canonical CSN projection.
//!
//! Canonical CSN is obtained by projecting out non-enumerable link slots
//! (their names start with `_` or `$`) and serialising the rest. Because
//! this crate never stores those link slots as object fields in the first
//! place (see [`crate::model::links`]), projection is just "serialize the
//! arenas' own fields" — there is no filtering pass to get wrong.

use indexmap::IndexMap;
use serde_json::{Value, json};

use crate::model::ids::{NodeId, PathRefId, QueryId};
use crate::model::node::{ArtifactKind, Kind, MemberKind, TypeRef};
use crate::model::pathref::PathRef;
use crate::model::query::{JoinKind, QueryKind, QueryNode, SetOp, SortDirection, TableAlias, TableAliasSource};
use crate::model::{Model, OrderedDict};

impl Model {
    /// The augmented CSN's canonical (non-augmented) projection.
    pub fn to_csn(&self) -> Value {
        let mut definitions = IndexMap::new();
        for (name, &id) in self.definitions.iter() {
            definitions.insert(name.to_string(), self.node_to_csn(id));
        }
        json!({ "definitions": Value::Object(definitions.into_iter().collect()) })
    }

    fn node_to_csn(&self, id: NodeId) -> Value {
        let node = self.node(id);
        let mut obj = IndexMap::new();
        obj.insert("kind".to_string(), json!(kind_string(node.kind)));

        match node.type_ref {
            Some(TypeRef::Type(p)) => {
                obj.insert("type".to_string(), self.pathref_to_csn(p));
            }
            Some(TypeRef::Target(p)) => {
                obj.insert("target".to_string(), self.pathref_to_csn(p));
            }
            Some(TypeRef::TargetAspect(p)) => {
                obj.insert("targetAspect".to_string(), self.pathref_to_csn(p));
            }
            Some(TypeRef::InlineAspect(aspect_id)) => {
                let inner = self.node_to_csn(aspect_id);
                if let Value::Object(fields) = inner {
                    for (k, v) in fields {
                        if k != "kind" {
                            obj.insert(k, v);
                        }
                    }
                }
            }
            None => {}
        }

        if let Some(assoc) = node.assoc_kind {
            let type_name = match assoc {
                crate::model::AssocKind::Association => "cds.Association",
                crate::model::AssocKind::Composition => "cds.Composition",
            };
            obj.insert("type".to_string(), json!(type_name));
        }

        if !node.includes.is_empty() {
            obj.insert(
                "includes".to_string(),
                Value::Array(
                    node.includes
                        .iter()
                        .map(|&p| self.pathref_to_csn(p))
                        .collect(),
                ),
            );
        }

        self.insert_member_dict(&mut obj, "elements", &node.elements);
        self.insert_member_dict(&mut obj, "actions", &node.actions);
        self.insert_member_dict(&mut obj, "params", &node.params);
        self.insert_member_dict(&mut obj, "enum", &node.enum_values);

        for (name, value) in node.annotations.iter() {
            obj.insert(name.to_string(), value.clone());
        }

        if node.key {
            obj.insert("key".to_string(), json!(true));
        }
        if node.masked {
            obj.insert("masked".to_string(), json!(true));
        }
        if node.not_null {
            obj.insert("notNull".to_string(), json!(true));
        }
        if node.is_many {
            obj.insert("isMany".to_string(), json!(true));
        }
        if node.localized {
            obj.insert("localized".to_string(), json!(true));
        }
        if !node.foreign_keys.is_empty() {
            obj.insert(
                "keys".to_string(),
                Value::Array(
                    node.foreign_keys
                        .iter()
                        .map(|k| json!({ "ref": [k.to_string()] }))
                        .collect(),
                ),
            );
        }
        if let Some(on) = node.on_condition {
            obj.insert("on".to_string(), self.pathref_to_csn(on));
        }
        if let Some(length) = node.type_params.length {
            obj.insert("length".to_string(), json!(length));
        }
        if let Some(precision) = node.type_params.precision {
            obj.insert("precision".to_string(), json!(precision));
        }
        if let Some(scale) = node.type_params.scale {
            obj.insert("scale".to_string(), json!(scale));
        }
        if let Some(default) = &node.default_value {
            obj.insert("default".to_string(), default.clone());
        }
        if let Some(qid) = node.query {
            obj.insert("query".to_string(), self.query_to_csn(qid));
        }
        if let Some(returns_id) = node.returns {
            let inner = self.node_to_csn(returns_id);
            if let Value::Object(fields) = inner {
                let mut ret = IndexMap::new();
                for (k, v) in fields {
                    if k != "kind" {
                        ret.insert(k, v);
                    }
                }
                obj.insert("returns".to_string(), Value::Object(ret.into_iter().collect()));
            }
        }

        Value::Object(obj.into_iter().collect())
    }

    /// A query's CSN shape: `{"SELECT": {...}}` or, for a `UNION`/`INTERSECT`/
    /// `EXCEPT` set, `{"SET": {"op": ..., "args": [...]}}` with the leading
    /// `SELECT` as the first arg.
    fn query_to_csn(&self, id: QueryId) -> Value {
        let q = self.queries.get(id);
        match q.kind {
            QueryKind::Set => {
                json!({
                    "SET": {
                        "op": set_op_string(q.set_op),
                        "args": q.set_args.iter().map(|&a| self.query_to_csn(a)).collect::<Vec<_>>(),
                    }
                })
            }
            QueryKind::Select | QueryKind::SubqueryInFrom => {
                json!({ "SELECT": self.select_to_csn(q) })
            }
        }
    }

    fn select_to_csn(&self, q: &QueryNode) -> Value {
        let mut obj = IndexMap::new();
        if let Some(from) = &q.from {
            obj.insert("from".to_string(), self.table_source_to_csn(from, &q.table_aliases));
        }
        if let Some(cols) = &q.columns {
            let mut excluding: Vec<String> = Vec::new();
            let columns: Vec<Value> = cols
                .iter()
                .map(|c| {
                    if c.star {
                        excluding.extend(c.excluding.iter().map(|s| s.to_string()));
                        json!("*")
                    } else {
                        let mut v = c.expr.map(|pr| self.pathref_to_csn(pr)).unwrap_or(Value::Null);
                        if let (Some(alias), Value::Object(ref mut o)) = (&c.alias, &mut v) {
                            o.insert("as".to_string(), json!(alias.to_string()));
                        }
                        v
                    }
                })
                .collect();
            obj.insert("columns".to_string(), Value::Array(columns));
            if !excluding.is_empty() {
                obj.insert("excluding".to_string(), json!(excluding));
            }
        }
        if let Some(w) = q.where_ {
            obj.insert("where".to_string(), self.pathref_to_csn(w));
        }
        if !q.group_by.is_empty() {
            obj.insert(
                "groupBy".to_string(),
                Value::Array(q.group_by.iter().map(|&pr| self.pathref_to_csn(pr)).collect()),
            );
        }
        if let Some(h) = q.having {
            obj.insert("having".to_string(), self.pathref_to_csn(h));
        }
        if !q.order_by.is_empty() {
            let items: Vec<Value> = q
                .order_by
                .iter()
                .map(|o| {
                    let mut v = self.pathref_to_csn(o.expr);
                    if o.direction == SortDirection::Desc {
                        if let Value::Object(ref mut m) = v {
                            m.insert("sort".to_string(), json!("desc"));
                        }
                    }
                    v
                })
                .collect();
            obj.insert("orderBy".to_string(), Value::Array(items));
        }
        if let Some(limit) = q.limit {
            obj.insert("limit".to_string(), json!({ "rows": { "val": limit } }));
        }
        if !q.mixins.is_empty() {
            let mut nested = IndexMap::new();
            for (name, &id) in q.mixins.iter() {
                nested.insert(name.to_string(), self.node_to_csn(id));
            }
            obj.insert("mixin".to_string(), Value::Object(nested.into_iter().collect()));
        }
        Value::Object(obj.into_iter().collect())
    }

    /// A `FROM` source: a plain ref (with `as` when the alias is explicit),
    /// a nested query (`as` is always explicit), or a `JOIN`. `aliases` is
    /// the map `src` itself was registered in — the owning query's flat map
    /// for a top-level source, or a `JoinClause`'s own two-sided map when
    /// recursing into one side of a join.
    fn table_source_to_csn(&self, src: &TableAliasSource, aliases: &OrderedDict<crate::core::IStr, TableAlias>) -> Value {
        match src {
            TableAliasSource::Path(pr) => {
                let mut v = self.pathref_to_csn(*pr);
                if let Some((name, _)) = aliases
                    .iter()
                    .find(|(_, a)| a.explicit && matches!(&a.source, TableAliasSource::Path(p) if *p == *pr))
                {
                    if let Value::Object(ref mut o) = v {
                        o.insert("as".to_string(), json!(name.to_string()));
                    }
                }
                v
            }
            TableAliasSource::Subquery(qid) => {
                let mut v = self.query_to_csn(*qid);
                if let Some((name, _)) = aliases
                    .iter()
                    .find(|(_, a)| matches!(&a.source, TableAliasSource::Subquery(q) if *q == *qid))
                {
                    if let Value::Object(ref mut o) = v {
                        o.insert("as".to_string(), json!(name.to_string()));
                    }
                }
                v
            }
            TableAliasSource::Join(join) => {
                json!({
                    "join": join_kind_string(join.kind),
                    "args": [
                        self.table_source_to_csn(&join.left, &join.table_aliases),
                        self.table_source_to_csn(&join.right, &join.table_aliases),
                    ],
                    "on": join.on.map(|pr| self.pathref_to_csn(pr)),
                })
            }
        }
    }

    fn insert_member_dict(
        &self,
        obj: &mut IndexMap<String, Value>,
        field: &str,
        dict: &OrderedDict<crate::core::IStr, NodeId>,
    ) {
        if dict.is_empty() {
            return;
        }
        let mut nested = IndexMap::new();
        for (name, &id) in dict.iter() {
            nested.insert(name.to_string(), self.node_to_csn(id));
        }
        obj.insert(field.to_string(), Value::Object(nested.into_iter().collect()));
    }

    fn pathref_to_csn(&self, id: PathRefId) -> Value {
        let path: &PathRef = self.pathrefs.get(id);
        json!({ "ref": path.items.iter().map(|i| i.id.to_string()).collect::<Vec<_>>() })
    }

    /// A structural form used only for an idempotence comparison: object
    /// keys are sorted recursively so two runs that built their
    /// dictionaries through different (but equally valid) code paths still
    /// compare equal. `to_csn` itself is already insertion-order stable —
    /// this is strictly looser, for comparison only.
    pub fn canonical_csn(&self) -> Value {
        sort_keys(self.to_csn())
    }
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

fn set_op_string(op: Option<SetOp>) -> &'static str {
    match op.unwrap_or(SetOp::Union) {
        SetOp::Union => "union",
        SetOp::UnionAll => "union all",
        SetOp::Intersect => "intersect",
        SetOp::Except => "except",
    }
}

fn join_kind_string(kind: JoinKind) -> &'static str {
    match kind {
        JoinKind::Inner => "inner",
        JoinKind::Left => "left",
        JoinKind::Right => "right",
        JoinKind::Full => "full",
        JoinKind::Cross => "cross",
    }
}

fn kind_string(kind: Kind) -> &'static str {
    match kind {
        Kind::Artifact(ArtifactKind::Namespace) => "namespace",
        Kind::Artifact(ArtifactKind::Context) => "context",
        Kind::Artifact(ArtifactKind::Service) => "service",
        Kind::Artifact(ArtifactKind::Entity) => "entity",
        Kind::Artifact(ArtifactKind::Type) => "type",
        Kind::Artifact(ArtifactKind::Aspect) => "aspect",
        Kind::Artifact(ArtifactKind::Event) => "event",
        Kind::Artifact(ArtifactKind::Action) => "action",
        Kind::Artifact(ArtifactKind::Function) => "function",
        Kind::Artifact(ArtifactKind::Annotation) => "annotation",
        Kind::Member(MemberKind::Element) => "element",
        Kind::Member(MemberKind::EnumValue) => "enum",
        Kind::Member(MemberKind::Action) => "action",
        Kind::Member(MemberKind::Function) => "function",
        Kind::Member(MemberKind::Param) => "param",
        Kind::Member(MemberKind::Returns) => "returns",
        Kind::Member(MemberKind::Mixin) => "mixin",
        Kind::Member(MemberKind::TableAlias) => "$tableAlias",
        Kind::Member(MemberKind::SelfAlias) => "$self",
        Kind::Member(MemberKind::ParametersAlias) => "$parameters",
        Kind::Member(MemberKind::Join) => "$join",
    }
}
