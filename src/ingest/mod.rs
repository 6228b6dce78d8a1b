//! Source ingestion: turns a caller-supplied [`ast::SourceInput`]
//! into `Source`/`Node`/`Extension` arena entries. No name resolution happens
//! here beyond the unchecked path resolution used to compute extension
//! targets — everything else is left exactly as written for
//! [`crate::resolve`] to chase later.

pub mod ast;
pub mod cache;
mod i18n;
pub mod loader;
mod reserved;
pub mod waves;

use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::base::{FileId, Position, Span};
use crate::core::IStr;
use crate::ctx::Ctx;
use crate::diag::{Message, codes};
use crate::model::{
    ArtifactKind, AssocKind, ColumnItem, Extension, ExtensionKind, I18nBlock, Insertion,
    MemberKind, Node, NodeId, OrderByItem, OrderedDict, PathItem, PathRef, PendingMember, QueryId,
    QueryNode, ReferenceContext, SortDirection, Source, SourceId, SourceMember, TableAlias,
    TableAliasSource, TypeParams, TypeRef, UsingDirective,
};

pub use ast::{CdlAst, SourceInput};
pub use cache::{CacheEntry, FileCache};
pub use i18n::merge as merge_i18n;
pub use loader::{CsnOnlyLoader, LoadError, SourceLoader};
pub use waves::{CancelToken, WaveResult, load_waves};

use ast::{
    ArtifactDecl, ArtifactKindDecl, ElementDecl, ExprDecl, ExtensionDecl, FromDecl,
    I18nEntryDecl, QueryDecl,
};

fn intern(s: &str) -> IStr {
    Rc::from(s)
}

fn synthetic_span() -> Span {
    Span::point(Position::new(0, 0))
}

/// Ingests every `(path, input)` pair into `ctx.model` in iteration order,
/// returning the [`SourceId`] each path landed in — the layer builder's
/// input.
pub fn ingest(
    ctx: &mut Ctx<'_>,
    inputs: IndexMap<String, SourceInput>,
) -> IndexMap<String, SourceId> {
    let mut by_path = IndexMap::new();
    for (path, input) in inputs {
        let file_id = ctx.files.intern(std::path::Path::new(&path));
        let source_id = ctx.model.sources.push(Source::new());
        match input {
            SourceInput::Cdl(ast) => ingest_cdl(ctx, source_id, file_id, &ast),
            SourceInput::Csn(value) => ingest_csn(ctx, source_id, file_id, &value),
        }
        by_path.insert(path, source_id);
    }
    by_path
}

/// Every proper dotted-name prefix of `name`, shortest first:
/// `"A.B.C"` -> `["A", "A.B"]`. The substrate for path-prefix `using`
/// synthesis.
fn dotted_prefixes(name: &str) -> Vec<String> {
    let parts: Vec<&str> = name.split('.').collect();
    (1..parts.len()).map(|i| parts[..i].join(".")).collect()
}

fn push_local_prefix(source: &mut Source, prefix: &str) {
    let prefix = intern(prefix);
    if !source.local_prefixes.iter().any(|p| **p == *prefix) {
        source.local_prefixes.push(prefix);
    }
}

/// Best-effort, unchecked qualification of an extension's target path: tries
/// the current namespace first, falls back to the raw text. Sub-phase 1 only
/// needs this to bucket extensions by target name; [`crate::resolve`]
/// re-validates the real reference later.
fn qualify_unchecked(ctx: &Ctx<'_>, namespace: Option<&str>, raw: &str) -> String {
    if let Some(ns) = namespace {
        let qualified = format!("{ns}.{raw}");
        if ctx.model.definitions.contains_key(&intern(&qualified)) {
            return qualified;
        }
    }
    raw.to_string()
}

/// Builds a one-item `PathRef` whose single step carries the *whole* dotted
/// name verbatim (`"sap.common.Currency"`, not three stepwise hops) — the
/// `type`/`target`/`includes`/`targetAspect`/`from` contexts look names
/// up as one qualified-or-unqualified string against global definitions,
/// never by per-segment member navigation.
fn build_pathref_from_dotted(ctx: &mut Ctx<'_>, dotted: &str, context: ReferenceContext) -> crate::model::PathRefId {
    let items = vec![PathItem::simple(intern(dotted))];
    ctx.model.pathrefs.push(PathRef::new(items, context))
}

fn build_pathref(ctx: &mut Ctx<'_>, expr: &ExprDecl, context: ReferenceContext) -> crate::model::PathRefId {
    let items = expr.steps.iter().map(|s| build_path_item(ctx, s)).collect();
    ctx.model.pathrefs.push(PathRef::new(items, context))
}

fn build_path_item(ctx: &mut Ctx<'_>, step: &ast::StepDecl) -> PathItem {
    let mut item = PathItem::simple(intern(&step.id));
    item.args = step.args.clone();
    if let Some(filter) = &step.filter {
        item.filter = Some(build_pathref(ctx, filter, ReferenceContext::RefWhere));
    }
    item
}

fn build_i18n(entries: &[I18nEntryDecl]) -> Option<I18nBlock> {
    if entries.is_empty() {
        return None;
    }
    let mut bundles: IndexMap<String, Vec<(IStr, IStr)>> = IndexMap::new();
    for entry in entries {
        bundles
            .entry(entry.locale.clone())
            .or_default()
            .push((intern(&entry.key), intern(&entry.text)));
    }
    Some(I18nBlock {
        bundles: bundles
            .into_iter()
            .map(|(locale, kv)| (intern(&locale), kv))
            .collect(),
    })
}

// ---- CDL ingestion ------------------------------------------------------

fn ingest_cdl(ctx: &mut Ctx<'_>, source_id: SourceId, file_id: FileId, ast: &CdlAst) {
    if ast.parse_failed {
        ctx.model.sources.get_mut(source_id).parse_failed = true;
        return;
    }
    let namespace = ast.namespace.as_deref();
    if let Some(ns) = namespace {
        ctx.model.sources.get_mut(source_id).namespace = Some(intern(ns));
    }
    ctx.model.sources.get_mut(source_id).i18n = build_i18n(&ast.i18n);

    for using in &ast.usings {
        let source = ctx.model.sources.get_mut(source_id);
        let idx = source.usings.len();
        source.usings.push(UsingDirective {
            local_name: intern(&using.local_name),
            from: intern(&using.from),
            target_source: None,
        });
        source
            .members
            .insert(intern(&using.local_name), SourceMember::Using(idx));
    }

    for artifact in ast.artifacts.iter().chain(ast.vocabularies.iter()) {
        ingest_artifact(ctx, source_id, file_id, namespace, artifact);
    }

    for ext in &ast.extensions {
        ingest_extension(ctx, source_id, namespace, ext);
    }
}

fn ingest_artifact(
    ctx: &mut Ctx<'_>,
    source_id: SourceId,
    file_id: FileId,
    namespace: Option<&str>,
    decl: &ArtifactDecl,
) {
    let absolute_string = match namespace {
        Some(ns) => format!("{ns}.{}", decl.name),
        None => decl.name.clone(),
    };
    if let Some(msg) = reserved::diagnostic(&absolute_string, file_id, synthetic_span()) {
        ctx.messages.push(msg);
        return;
    }
    let absolute = intern(&absolute_string);
    let kind: ArtifactKind = decl.kind.unwrap_or(ArtifactKindDecl::Context).into();
    let node_id = ctx.model.nodes.push(Node::new_artifact(absolute.clone(), kind));
    ctx.model.links.block.insert(node_id, source_id);

    for el in &decl.elements {
        let member_kind = el.member_kind.map(Into::into).unwrap_or(MemberKind::Element);
        let member_id = ingest_member(
            ctx, source_id, &absolute, node_id, node_id, &el.name, el, member_kind,
        );
        ctx.model
            .node_mut(node_id)
            .elements
            .insert(intern(&el.name), member_id);
    }
    for el in &decl.actions {
        let member_kind = el.member_kind.map(Into::into).unwrap_or(MemberKind::Action);
        let member_id = ingest_member(
            ctx, source_id, &absolute, node_id, node_id, &el.name, el, member_kind,
        );
        ctx.model
            .node_mut(node_id)
            .actions
            .insert(intern(&el.name), member_id);
    }
    for incl in &decl.includes {
        let pr = build_pathref_from_dotted(ctx, incl, ReferenceContext::Includes);
        ctx.model.node_mut(node_id).includes.push(pr);
    }
    for (k, v) in &decl.annotations {
        ctx.model.node_mut(node_id).annotations.insert(intern(k), v.clone());
    }
    if let Some(target) = &decl.target {
        let pr = build_pathref_from_dotted(ctx, target, ReferenceContext::Target);
        ctx.model.node_mut(node_id).type_ref = Some(TypeRef::Target(pr));
    } else if let Some(ty) = &decl.type_ref {
        let pr = build_pathref_from_dotted(ctx, ty, ReferenceContext::Type);
        ctx.model.node_mut(node_id).type_ref = Some(TypeRef::Type(pr));
    }
    if let Some(q) = &decl.query {
        let query_id = ingest_query(ctx, source_id, &absolute, node_id, q);
        ctx.model.node_mut(node_id).query = Some(query_id);
    }

    if let Insertion::Duplicate = ctx.model.definitions.insert_tracked(absolute.clone(), node_id) {
        ctx.messages.push(Message::error(
            codes::DUPLICATE_DEFINITION,
            file_id,
            synthetic_span(),
            format!("'{absolute}' is defined more than once"),
        ));
    }

    let source = ctx.model.sources.get_mut(source_id);
    source
        .members
        .insert(intern(&decl.name), SourceMember::Artifact(node_id));
    for prefix in dotted_prefixes(&decl.name) {
        push_local_prefix(source, &prefix);
    }
}

#[allow(clippy::too_many_arguments)]
fn ingest_member(
    ctx: &mut Ctx<'_>,
    source_id: SourceId,
    owner_absolute: &IStr,
    owner_main: NodeId,
    parent_id: NodeId,
    component_name: &str,
    decl: &ElementDecl,
    kind: MemberKind,
) -> NodeId {
    let component = intern(component_name);
    let mut node = Node::new_member(owner_absolute.clone(), component, kind);
    node.key = decl.key;
    node.not_null = decl.not_null;
    node.is_many = decl.is_many;
    node.localized = decl.localized;
    node.type_params = TypeParams {
        length: decl.length,
        precision: decl.precision,
        scale: decl.scale,
    };
    node.default_value = decl.default_value.clone();
    node.foreign_keys = decl.foreign_keys.iter().map(|s| intern(s)).collect();
    node.assoc_kind = decl.assoc_kind.map(Into::into);
    for (k, v) in &decl.annotations {
        node.annotations.insert(intern(k), v.clone());
    }

    let node_id = ctx.model.nodes.push(node);
    ctx.model.links.parent.insert(node_id, parent_id);
    ctx.model.links.main.insert(node_id, owner_main);
    ctx.model.links.block.insert(node_id, source_id);

    if let Some(on_cond) = &decl.on_condition {
        let pr = build_pathref(ctx, on_cond, ReferenceContext::Default);
        ctx.model.node_mut(node_id).on_condition = Some(pr);
    }

    if let Some(inline) = &decl.inline_aspect {
        let aspect_absolute = intern(&format!("{owner_absolute}.{component_name}"));
        let aspect_id = ctx
            .model
            .nodes
            .push(Node::new_artifact(aspect_absolute.clone(), ArtifactKind::Aspect));
        ctx.model.links.block.insert(aspect_id, source_id);
        ctx.model.links.main.insert(aspect_id, aspect_id);
        for el in &inline.elements {
            let mk = el.member_kind.map(Into::into).unwrap_or(MemberKind::Element);
            let child_id = ingest_member(
                ctx, source_id, &aspect_absolute, aspect_id, aspect_id, &el.name, el, mk,
            );
            ctx.model
                .node_mut(aspect_id)
                .elements
                .insert(intern(&el.name), child_id);
        }
        for incl in &inline.includes {
            let pr = build_pathref_from_dotted(ctx, incl, ReferenceContext::Includes);
            ctx.model.node_mut(aspect_id).includes.push(pr);
        }
        ctx.model.node_mut(node_id).type_ref = Some(TypeRef::InlineAspect(aspect_id));
    } else if let Some(target) = &decl.target {
        let pr = build_pathref_from_dotted(ctx, target, ReferenceContext::Target);
        ctx.model.node_mut(node_id).type_ref = Some(TypeRef::Target(pr));
    } else if let Some(ty) = &decl.type_ref {
        let pr = build_pathref_from_dotted(ctx, ty, ReferenceContext::Type);
        ctx.model.node_mut(node_id).type_ref = Some(TypeRef::Type(pr));
    }

    node_id
}

fn ingest_query(
    ctx: &mut Ctx<'_>,
    source_id: SourceId,
    owner_absolute: &IStr,
    main_id: NodeId,
    decl: &QueryDecl,
) -> QueryId {
    if decl.set_args.is_empty() {
        return ingest_select(ctx, source_id, owner_absolute, main_id, decl);
    }
    let leading_id = ingest_select(ctx, source_id, owner_absolute, main_id, decl);
    let mut arg_ids = vec![leading_id];
    for sub in &decl.set_args {
        arg_ids.push(ingest_query(ctx, source_id, owner_absolute, main_id, sub));
    }
    let mut set_node = QueryNode::new_set(arg_ids.clone());
    set_node.main = Some(main_id);
    set_node.leading_query = Some(leading_id);
    let set_id = ctx.model.queries.push(set_node);
    for id in arg_ids {
        ctx.model.queries.get_mut(id).leading_query = Some(leading_id);
    }
    set_id
}

/// Builds a `FROM` source, recursing through `JOIN` trees. Every alias found
/// anywhere in the tree — either side of every nested join — is inserted
/// into `query_aliases`, the owning query's flat `$tableAliases` map (name
/// resolution searches that flat map, never the tree shape); each
/// [`JoinClause`] additionally keeps just its own two sides' aliases, to
/// mirror the CSN `$tableAliases` shape.
fn build_from_source(
    ctx: &mut Ctx<'_>,
    source_id: SourceId,
    owner_absolute: &IStr,
    main_id: NodeId,
    decl: &FromDecl,
    query_aliases: &mut OrderedDict<IStr, TableAlias>,
) -> TableAliasSource {
    match decl {
        FromDecl::Path { steps, alias } => {
            let expr = ExprDecl { steps: steps.clone() };
            let pr = build_pathref(ctx, &expr, ReferenceContext::From);
            let implicit_alias = alias.clone().or_else(|| steps.last().map(|s| s.id.clone()));
            if let Some(a) = &implicit_alias {
                query_aliases.insert(
                    intern(a),
                    TableAlias {
                        name: intern(a),
                        explicit: alias.is_some(),
                        source: TableAliasSource::Path(pr),
                    },
                );
            }
            TableAliasSource::Path(pr)
        }
        FromDecl::Subquery { query, alias } => {
            let sub_id = ingest_query(ctx, source_id, owner_absolute, main_id, query);
            query_aliases.insert(
                intern(alias),
                TableAlias {
                    name: intern(alias),
                    explicit: true,
                    source: TableAliasSource::Subquery(sub_id),
                },
            );
            TableAliasSource::Subquery(sub_id)
        }
        FromDecl::Join { kind, left, right, on } => {
            let mut join_aliases = OrderedDict::new();
            let left_source = build_from_source(ctx, source_id, owner_absolute, main_id, left, &mut join_aliases);
            let right_source = build_from_source(ctx, source_id, owner_absolute, main_id, right, &mut join_aliases);
            for (name, alias) in join_aliases.iter() {
                query_aliases.insert(name.clone(), alias.clone());
            }
            let on_pr = on.as_ref().map(|expr| build_pathref(ctx, expr, ReferenceContext::Default));
            TableAliasSource::Join(Box::new(crate::model::JoinClause {
                kind: (*kind).into(),
                left: left_source,
                right: right_source,
                on: on_pr,
                table_aliases: join_aliases,
            }))
        }
    }
}

fn ingest_select(
    ctx: &mut Ctx<'_>,
    source_id: SourceId,
    owner_absolute: &IStr,
    main_id: NodeId,
    decl: &QueryDecl,
) -> QueryId {
    let mut q = QueryNode::new_select(main_id);

    let from_source = build_from_source(ctx, source_id, owner_absolute, main_id, &decl.from, &mut q.table_aliases);
    q.from = Some(from_source);

    if let Some(cols) = &decl.columns {
        let mut items = Vec::with_capacity(cols.len());
        for c in cols {
            if c.star {
                items.push(ColumnItem::star_with_excluding(
                    c.excluding.iter().map(|s| intern(s)).collect(),
                ));
            } else if let Some(expr) = &c.expr {
                let pr = build_pathref(ctx, expr, ReferenceContext::Default);
                items.push(ColumnItem::expr(pr, c.alias.as_deref().map(intern)));
            }
        }
        q.columns = Some(items);
    }
    if let Some(w) = &decl.where_ {
        q.where_ = Some(build_pathref(ctx, w, ReferenceContext::RefWhere));
    }
    for g in &decl.group_by {
        q.group_by.push(build_pathref(ctx, g, ReferenceContext::Default));
    }
    if let Some(h) = &decl.having {
        q.having = Some(build_pathref(ctx, h, ReferenceContext::Default));
    }
    for (expr, descending) in &decl.order_by {
        let pr = build_pathref(ctx, expr, ReferenceContext::OrderBy);
        q.order_by.push(OrderByItem {
            expr: pr,
            direction: if *descending { SortDirection::Desc } else { SortDirection::Asc },
        });
    }
    q.limit = decl.limit;

    for mixin in &decl.mixins {
        let member_id = ingest_member(
            ctx,
            source_id,
            owner_absolute,
            main_id,
            main_id,
            &mixin.name,
            mixin,
            MemberKind::Mixin,
        );
        q.mixins.insert(intern(&mixin.name), member_id);
    }

    ctx.model.queries.push(q)
}

fn ingest_extension(ctx: &mut Ctx<'_>, source_id: SourceId, namespace: Option<&str>, decl: &ExtensionDecl) {
    let kind = if decl.annotate { ExtensionKind::Annotate } else { ExtensionKind::Extend };
    let target_absolute = qualify_unchecked(ctx, namespace, &decl.target);
    let target_istr = intern(&target_absolute);
    let mut ext = Extension::new(kind, target_istr.clone(), source_id);

    for el in decl.new_elements.iter().chain(decl.new_actions.iter()) {
        ext.new_members.push(PendingMember {
            name: intern(&el.name),
            kind: el.member_kind.map(Into::into).unwrap_or(MemberKind::Element),
            annotations: el.annotations.iter().map(|(k, v)| (intern(k), v.clone())).collect(),
        });
    }
    for (k, v) in &decl.annotations {
        ext.annotations.push((intern(k), v.clone()));
    }
    if let Some(cols) = &decl.columns {
        ext.columns = Some(cols.iter().map(|s| intern(s)).collect());
    }
    ext.includes = decl.includes.iter().map(|s| intern(s)).collect();

    let ext_id = ctx.model.extensions.push(ext);
    ctx.model
        .extensions_by_target
        .entry(target_istr)
        .or_default()
        .push(ext_id);
}

// ---- CSN ingestion --------------------------------------------------------

fn ingest_csn(ctx: &mut Ctx<'_>, source_id: SourceId, file_id: FileId, value: &Value) {
    let Some(obj) = value.as_object() else {
        ctx.model.sources.get_mut(source_id).parse_failed = true;
        return;
    };
    if let Some(ns) = obj.get("namespace").and_then(Value::as_str) {
        ctx.model.sources.get_mut(source_id).namespace = Some(intern(ns));
    }
    let Some(defs) = obj.get("definitions").and_then(Value::as_object) else {
        return;
    };
    for (name, def_value) in defs {
        ingest_csn_definition(ctx, source_id, file_id, name, def_value);
    }
}

fn csn_kind(s: &str) -> Option<ArtifactKind> {
    Some(match s {
        "namespace" => ArtifactKind::Namespace,
        "context" => ArtifactKind::Context,
        "service" => ArtifactKind::Service,
        "entity" => ArtifactKind::Entity,
        "type" => ArtifactKind::Type,
        "aspect" => ArtifactKind::Aspect,
        "event" => ArtifactKind::Event,
        "action" => ArtifactKind::Action,
        "function" => ArtifactKind::Function,
        "annotation" => ArtifactKind::Annotation,
        _ => return None,
    })
}

fn ingest_csn_definition(ctx: &mut Ctx<'_>, source_id: SourceId, file_id: FileId, name: &str, value: &Value) {
    let Some(obj) = value.as_object() else { return };
    let kind_str = obj.get("kind").and_then(Value::as_str).unwrap_or("context");
    let Some(kind) = csn_kind(kind_str) else { return };
    if let Some(msg) = reserved::diagnostic(name, file_id, synthetic_span()) {
        ctx.messages.push(msg);
        return;
    }

    let absolute = intern(name);
    let node_id = ctx.model.nodes.push(Node::new_artifact(absolute.clone(), kind));
    ctx.model.links.block.insert(node_id, source_id);

    if let Some(elements) = obj.get("elements").and_then(Value::as_object) {
        for (ename, evalue) in elements {
            let member_id = ingest_csn_member(
                ctx, source_id, &absolute, node_id, node_id, ename, evalue, MemberKind::Element,
            );
            ctx.model.node_mut(node_id).elements.insert(intern(ename), member_id);
        }
    }
    if let Some(actions) = obj.get("actions").and_then(Value::as_object) {
        for (aname, avalue) in actions {
            let member_id = ingest_csn_member(
                ctx, source_id, &absolute, node_id, node_id, aname, avalue, MemberKind::Action,
            );
            ctx.model.node_mut(node_id).actions.insert(intern(aname), member_id);
        }
    }
    if let Some(includes) = obj.get("includes").and_then(Value::as_array) {
        for incl in includes.iter().filter_map(Value::as_str) {
            let pr = build_pathref_from_dotted(ctx, incl, ReferenceContext::Includes);
            ctx.model.node_mut(node_id).includes.push(pr);
        }
    }
    if let Some(target) = obj.get("target").and_then(Value::as_str) {
        let pr = build_pathref_from_dotted(ctx, target, ReferenceContext::Target);
        ctx.model.node_mut(node_id).type_ref = Some(TypeRef::Target(pr));
    } else if let Some(ty) = obj.get("type").and_then(Value::as_str) {
        let pr = build_pathref_from_dotted(ctx, ty, ReferenceContext::Type);
        ctx.model.node_mut(node_id).type_ref = Some(TypeRef::Type(pr));
    }
    for (key, val) in obj {
        if key.starts_with('@') {
            ctx.model.node_mut(node_id).annotations.insert(intern(key), val.clone());
        }
    }

    if let Insertion::Duplicate = ctx.model.definitions.insert_tracked(absolute.clone(), node_id) {
        ctx.messages.push(Message::error(
            codes::DUPLICATE_DEFINITION,
            file_id,
            synthetic_span(),
            format!("'{absolute}' is defined more than once"),
        ));
    }

    let source = ctx.model.sources.get_mut(source_id);
    source.members.insert(absolute.clone(), SourceMember::Artifact(node_id));
    for prefix in dotted_prefixes(name) {
        push_local_prefix(source, &prefix);
    }
}

#[allow(clippy::too_many_arguments)]
fn ingest_csn_member(
    ctx: &mut Ctx<'_>,
    source_id: SourceId,
    owner_absolute: &IStr,
    owner_main: NodeId,
    parent_id: NodeId,
    name: &str,
    value: &Value,
    default_kind: MemberKind,
) -> NodeId {
    let Some(obj) = value.as_object() else {
        let node = Node::new_member(owner_absolute.clone(), intern(name), default_kind);
        let node_id = ctx.model.nodes.push(node);
        ctx.model.links.parent.insert(node_id, parent_id);
        ctx.model.links.main.insert(node_id, owner_main);
        ctx.model.links.block.insert(node_id, source_id);
        return node_id;
    };
    let kind = match obj.get("kind").and_then(Value::as_str) {
        Some("action") => MemberKind::Action,
        Some("function") => MemberKind::Function,
        _ => default_kind,
    };
    let mut node = Node::new_member(owner_absolute.clone(), intern(name), kind);
    node.key = obj.get("key").and_then(Value::as_bool).unwrap_or(false);
    node.not_null = obj.get("notNull").and_then(Value::as_bool).unwrap_or(false);
    node.is_many = obj.get("isMany").and_then(Value::as_bool).unwrap_or(false);
    node.localized = obj.get("localized").and_then(Value::as_bool).unwrap_or(false);
    node.type_params = TypeParams {
        length: obj.get("length").and_then(Value::as_u64).map(|v| v as u32),
        precision: obj.get("precision").and_then(Value::as_u64).map(|v| v as u32),
        scale: obj.get("scale").and_then(Value::as_u64).map(|v| v as u32),
    };
    node.default_value = obj.get("default").cloned();
    if let Some(keys) = obj.get("keys").and_then(Value::as_array) {
        node.foreign_keys = keys
            .iter()
            .filter_map(|k| k.get("ref"))
            .filter_map(Value::as_array)
            .map(|steps| {
                steps
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(".")
            })
            .map(|s| intern(&s))
            .collect();
    }
    node.assoc_kind = match obj.get("type").and_then(Value::as_str) {
        Some("cds.Association") => Some(AssocKind::Association),
        Some("cds.Composition") => Some(AssocKind::Composition),
        _ => None,
    };
    for (key, val) in obj {
        if key.starts_with('@') {
            node.annotations.insert(intern(key), val.clone());
        }
    }

    let node_id = ctx.model.nodes.push(node);
    ctx.model.links.parent.insert(node_id, parent_id);
    ctx.model.links.main.insert(node_id, owner_main);
    ctx.model.links.block.insert(node_id, source_id);

    if let Some(on) = obj.get("on").and_then(Value::as_array) {
        let items: Vec<PathItem> = on
            .iter()
            .filter_map(|step| step.get("ref"))
            .filter_map(Value::as_array)
            .flat_map(|refs| refs.iter().filter_map(Value::as_str))
            .map(|s| PathItem::simple(intern(s)))
            .collect();
        if !items.is_empty() {
            let pr = ctx.model.pathrefs.push(PathRef::new(items, ReferenceContext::Default));
            ctx.model.node_mut(node_id).on_condition = Some(pr);
        }
    }
    if let Some(target) = obj.get("target").and_then(Value::as_str) {
        let pr = build_pathref_from_dotted(ctx, target, ReferenceContext::Target);
        ctx.model.node_mut(node_id).type_ref = Some(TypeRef::Target(pr));
    } else if let Some(ty) = obj.get("type").and_then(Value::as_str) {
        if ty != "cds.Association" && ty != "cds.Composition" {
            let pr = build_pathref_from_dotted(ctx, ty, ReferenceContext::Type);
            ctx.model.node_mut(node_id).type_ref = Some(TypeRef::Type(pr));
        }
    }

    node_id
}
