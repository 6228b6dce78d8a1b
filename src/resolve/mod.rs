//! Reference resolution: the state machine that turns every
//! `PathRef` ingestion left with `art: None` into a resolved `_links`/`_art`/
//! `$scope`/`$env`, or a located `ref-undefined` diagnostic.
//!
//! [`run`] is called twice by [`crate::compile::compile`] (before and after
//! derived-artefact generation) and is idempotent: every resolution helper
//! skips a [`crate::model::PathRef`] that already carries `art` or `error`.
//!
//! Two passes:
//! 1. `type`/`target`/`targetAspect`/`includes`/`from` — single-name lookups
//!    against global definitions, namespace-qualified or `using`-aliased.
//!    Also normalises
//!    `target` vs `targetAspect` once the referenced artifact's kind is
//!    known, and resolves member-level (non-query) `on` conditions for
//!    unmanaged associations.
//! 2. Everything lexically inside a query — delegated to
//!    [`query::resolve_all`].

mod path;
mod query;

use rustc_hash::FxHashMap;

use crate::base::FileId;
use crate::core::IStr;
use crate::ctx::Ctx;
use crate::diag::{Message, codes};
use crate::model::{ArtifactKind, Kind, NodeId, PathRefId, Scope, Source, SourceMember, SourceId, TypeRef};

fn synthetic_span() -> crate::base::Span {
    crate::base::Span::point(crate::base::Position::new(0, 0))
}

fn intern(s: &str) -> IStr {
    std::rc::Rc::from(s)
}

pub fn run(ctx: &mut Ctx<'_>) {
    resolve_type_refs_and_includes(ctx);
    resolve_member_on_conditions(ctx);
    query::resolve_all(ctx);
}

fn resolve_type_refs_and_includes(ctx: &mut Ctx<'_>) {
    let node_ids: Vec<NodeId> = ctx.model.nodes.ids().collect();
    for node_id in node_ids {
        let block = ctx.model.links.block.get(&node_id).copied();

        if let Some(type_ref) = ctx.model.nodes.get(node_id).type_ref {
            match type_ref {
                TypeRef::Type(pr) | TypeRef::Target(pr) | TypeRef::TargetAspect(pr) => {
                    resolve_global_chain(ctx, pr, block);
                }
                TypeRef::InlineAspect(_) => {}
            }
            normalize_target_aspect(ctx, node_id);
        }

        let includes: Vec<PathRefId> = ctx.model.nodes.get(node_id).includes.clone();
        for pr in includes {
            resolve_global_chain(ctx, pr, block);
        }
    }
}

/// `target` vs `targetAspect` depends on the resolved artifact's kind:
/// an association/composition pointing at an `aspect` or `type` is really
/// a `targetAspect`, and vice versa.
fn normalize_target_aspect(ctx: &mut Ctx<'_>, node_id: NodeId) {
    let Some(type_ref) = ctx.model.nodes.get(node_id).type_ref else {
        return;
    };
    let (pr, currently_aspect) = match type_ref {
        TypeRef::Target(pr) => (pr, false),
        TypeRef::TargetAspect(pr) => (pr, true),
        _ => return,
    };
    let Some(art) = ctx.model.pathrefs.get(pr).art else {
        return;
    };
    let is_aspect_like = matches!(
        ctx.model.nodes.get(art).kind,
        Kind::Artifact(ArtifactKind::Aspect) | Kind::Artifact(ArtifactKind::Type)
    );
    if is_aspect_like && !currently_aspect {
        ctx.model.nodes.get_mut(node_id).type_ref = Some(TypeRef::TargetAspect(pr));
    } else if !is_aspect_like && currently_aspect {
        ctx.model.nodes.get_mut(node_id).type_ref = Some(TypeRef::Target(pr));
    }
}

/// Resolves a single-name (`type`/`target`/`targetAspect`/`includes`/`from`)
/// or stepwise (rare: dotted navigation attached to one of those contexts)
/// `PathRef` by resolving step 0 against global definitions and walking the
/// rest via [`path::resolve_with_seed`]'s ordinary element navigation.
pub(crate) fn resolve_global_chain(ctx: &mut Ctx<'_>, pr: PathRefId, block: Option<SourceId>) {
    if ctx.model.pathrefs.get(pr).art.is_some() || ctx.model.pathrefs.get(pr).error {
        return;
    }
    // A single-step reference naming a predefined scalar (`cds.String`, …)
    // has no `Node` to link to; leave it `art: None`, `error: false` rather
    // than raising `ref-undefined` on every builtin-typed element.
    let raw = ctx.model.pathrefs.get(pr).items[0].id.clone();
    if ctx.model.pathrefs.get(pr).items.len() == 1 && crate::base::is_builtin_scalar_type(&raw) {
        return;
    }
    match resolve_global_name(ctx, block, &raw) {
        Some(node_id) => {
            let mut seed: FxHashMap<IStr, (NodeId, Scope, IStr)> = FxHashMap::default();
            seed.insert(raw, (node_id, Scope::Global, intern("definitions")));
            path::resolve_with_seed(ctx, pr, &seed);
        }
        None => {
            ctx.model.pathrefs.get_mut(pr).error = true;
            ctx.messages.push(Message::error(
                codes::REF_UNDEFINED,
                FileId::SYNTHETIC,
                synthetic_span(),
                format!("'{raw}' is not defined"),
            ));
        }
    }
}

/// Looks `raw` up as: an exact absolute name, `raw` qualified by `block`'s
/// own namespace, `raw`'s first segment matched against one of `block`'s own
/// `local_prefixes` (a dotted artifact name addressed without repeating the
/// source's namespace), or `raw`'s first dotted segment matched against a
/// `using` alias of `block` (searched in the `using`'s target source's own
/// member table — including its `local_prefixes` — then namespace-qualified
/// there too).
fn resolve_global_name(ctx: &Ctx<'_>, block: Option<SourceId>, raw: &str) -> Option<NodeId> {
    if let Some(&id) = ctx.model.definitions.get(&intern(raw)) {
        return Some(id);
    }
    let block = block?;
    let source = ctx.model.sources.get(block);
    if let Some(ns) = &source.namespace {
        let qualified = format!("{ns}.{raw}");
        if let Some(&id) = ctx.model.definitions.get(&intern(&qualified)) {
            return Some(id);
        }
    }
    if let Some(id) = resolve_via_local_prefix(source, raw) {
        return Some(id);
    }

    let first_segment = raw.split('.').next().unwrap_or(raw);
    let remainder = raw[first_segment.len()..].strip_prefix('.').unwrap_or("");
    let using = source.usings.iter().find(|u| u.local_name.as_ref() == first_segment)?;
    let target_source = using.target_source?;
    let target = ctx.model.sources.get(target_source);
    // The alias may name a concrete artifact (strip it, look up the
    // remainder) or a bare local prefix the target source never gave its
    // own node (look the whole name up in the target's own member table).
    if let Some(id) = resolve_via_local_prefix(target, raw) {
        return Some(id);
    }
    let candidate_name = if remainder.is_empty() {
        first_segment.to_string()
    } else {
        remainder.to_string()
    };
    if let Some(SourceMember::Artifact(node_id)) = target.members.get(&intern(&candidate_name)) {
        return Some(*node_id);
    }
    if let Some(ns) = &target.namespace {
        let qualified = format!("{ns}.{candidate_name}");
        if let Some(&id) = ctx.model.definitions.get(&intern(&qualified)) {
            return Some(id);
        }
    }
    None
}

/// `raw`'s first dotted segment matching one of `source`'s own
/// `local_prefixes` makes the whole name locally addressable: `source`'s own
/// member table is keyed by the dotted name exactly as declared, so the
/// lookup is a direct hit once the prefix is recognized.
fn resolve_via_local_prefix(source: &Source, raw: &str) -> Option<NodeId> {
    let first_segment = raw.split('.').next().unwrap_or(raw);
    if !source.local_prefixes.iter().any(|p| p.as_ref() == first_segment) {
        return None;
    }
    match source.members.get(&intern(raw)) {
        Some(SourceMember::Artifact(node_id)) => Some(*node_id),
        _ => None,
    }
}

/// Resolves a member-level (non-query) `on` condition — an unmanaged
/// association declared directly on an entity/aspect, not inside a `SELECT`
/// — against its owner's own elements plus `$self`/`$projection`. Mixins
/// (query-lexical `on` conditions) are excluded here and handled by
/// [`query::resolve_all`] instead, which has the right environment (the
/// query's combined source elements, not the owner's own).
fn resolve_member_on_conditions(ctx: &mut Ctx<'_>) {
    let node_ids: Vec<NodeId> = ctx.model.nodes.ids().collect();
    for node_id in node_ids {
        let (assoc, on_condition, is_mixin) = {
            let node = ctx.model.nodes.get(node_id);
            (
                node.assoc_kind.is_some(),
                node.on_condition,
                node.member_kind() == Some(crate::model::MemberKind::Mixin),
            )
        };
        if !assoc || is_mixin {
            continue;
        }
        let Some(pr) = on_condition else { continue };
        let Some(&owner) = ctx.model.links.parent.get(&node_id) else {
            continue;
        };
        let mut seed: FxHashMap<IStr, (NodeId, Scope, IStr)> = FxHashMap::default();
        seed.insert(intern("$self"), (owner, Scope::SelfAlias, intern("self")));
        seed.insert(intern("$projection"), (owner, Scope::SelfAlias, intern("self")));
        for (name, member_id) in ctx.model.nodes.get(owner).elements.iter() {
            seed.entry(name.clone()).or_insert((*member_id, Scope::Source, intern("elements")));
        }
        path::resolve_with_seed(ctx, pr, &seed);
    }
}
