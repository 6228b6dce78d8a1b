//! Propagation (runs last): computes `_ancestors` from
//! resolved `includes` chains, materialises included elements onto the
//! including artifact (copying `masked`/`key` from their origin), walks
//! `_ancestors`/`_origin` chains to propagate `@cds.autoexpose` and
//! `@fiori.draft.enabled` down to artifacts that don't declare their own,
//! and marks every composition target in `model.links.composition_targets`.

use rustc_hash::FxHashSet;

use crate::core::IStr;
use crate::ctx::Ctx;
use crate::model::{AssocKind, MemberKind, Node, NodeId, TypeRef};

const PROPAGATED_ANNOTATIONS: &[&str] = &["@cds.autoexpose", "@fiori.draft.enabled"];

fn intern(s: &str) -> IStr {
    std::rc::Rc::from(s)
}

pub fn run(ctx: &mut Ctx<'_>) {
    compute_ancestors(ctx);
    materialize_includes(ctx);
    propagate_via_ancestors(ctx);
    propagate_via_origin(ctx);
    mark_composition_targets(ctx);
}

/// `_ancestors`: every artifact transitively reachable through resolved
/// `includes`, nearest first, deduplicated. A `visiting` guard stops an
/// include cycle (which nothing upstream refuses) from recursing forever —
/// the chain it produces is simply incomplete past the cycle, rather than
/// raising a diagnostic no later phase reads.
fn compute_ancestors(ctx: &mut Ctx<'_>) {
    let ids: Vec<NodeId> = ctx
        .model
        .nodes
        .ids()
        .filter(|&id| ctx.model.nodes.get(id).kind.is_artifact())
        .collect();
    for id in ids {
        let mut visiting = FxHashSet::default();
        let chain = ancestors_of(ctx, id, &mut visiting);
        if !chain.is_empty() {
            ctx.model.links.ancestors.insert(id, chain);
        }
    }
}

fn ancestors_of(ctx: &Ctx<'_>, id: NodeId, visiting: &mut FxHashSet<NodeId>) -> Vec<NodeId> {
    if !visiting.insert(id) {
        return Vec::new();
    }
    let mut out = Vec::new();
    for pr in ctx.model.nodes.get(id).includes.clone() {
        let Some(inc_id) = ctx.model.pathrefs.get(pr).art else {
            continue;
        };
        if !out.contains(&inc_id) {
            out.push(inc_id);
        }
        for anc in ancestors_of(ctx, inc_id, visiting) {
            if !out.contains(&anc) {
                out.push(anc);
            }
        }
    }
    visiting.remove(&id);
    out
}

/// Copies each ancestor's elements onto the including artifact — first
/// include wins on a name clash, matching `_ancestors`' "nearest first"
/// order — with `_origin` set to the source element and `masked`/`key`
/// carried over verbatim from their origin.
fn materialize_includes(ctx: &mut Ctx<'_>) {
    let ids: Vec<NodeId> = ctx.model.links.ancestors.keys().copied().collect();
    for id in ids {
        let ancestors = ctx.model.links.ancestors.get(&id).cloned().unwrap_or_default();
        let absolute = ctx.model.nodes.get(id).name.absolute.clone();
        let block = ctx.model.links.block.get(&id).copied();
        for anc in ancestors {
            let anc_elements: Vec<(IStr, NodeId)> = ctx
                .model
                .nodes
                .get(anc)
                .elements
                .iter()
                .map(|(k, &v)| (k.clone(), v))
                .collect();
            for (name, orig_id) in anc_elements {
                if ctx.model.nodes.get(id).elements.contains_key(&name) {
                    continue;
                }
                let proxy_id = clone_for_include(ctx, &absolute, id, block, &name, orig_id);
                ctx.model.nodes.get_mut(id).elements.insert(name, proxy_id);
            }
        }
    }
}

fn clone_for_include(
    ctx: &mut Ctx<'_>,
    owner_absolute: &IStr,
    owner_id: NodeId,
    block: Option<crate::model::SourceId>,
    name: &IStr,
    orig_id: NodeId,
) -> NodeId {
    let orig = ctx.model.nodes.get(orig_id).clone();
    let member_kind = orig.member_kind().unwrap_or(MemberKind::Element);
    let mut proxy = Node::new_member(owner_absolute.clone(), name.clone(), member_kind);
    proxy.inferred = true;
    proxy.key = orig.key;
    proxy.masked = orig.masked;
    proxy.not_null = orig.not_null;
    proxy.is_many = orig.is_many;
    proxy.localized = orig.localized;
    proxy.type_ref = orig.type_ref;
    proxy.type_params = orig.type_params;
    proxy.assoc_kind = orig.assoc_kind;
    proxy.on_condition = orig.on_condition;
    proxy.foreign_keys = orig.foreign_keys.clone();
    proxy.default_value = orig.default_value.clone();
    for (k, v) in orig.annotations.iter() {
        proxy.annotations.insert(k.clone(), v.clone());
    }
    let proxy_id = ctx.model.nodes.push(proxy);
    ctx.model.links.parent.insert(proxy_id, owner_id);
    ctx.model.links.main.insert(proxy_id, owner_id);
    ctx.model.links.origin.insert(proxy_id, orig_id);
    if let Some(src) = block {
        ctx.model.links.block.insert(proxy_id, src);
    }
    proxy_id
}

fn propagate_via_ancestors(ctx: &mut Ctx<'_>) {
    let ids: Vec<NodeId> = ctx.model.links.ancestors.keys().copied().collect();
    for id in ids {
        let ancestors = ctx.model.links.ancestors.get(&id).cloned().unwrap_or_default();
        for name in PROPAGATED_ANNOTATIONS {
            let key = intern(name);
            if ctx.model.nodes.get(id).annotations.get(&key).is_some() {
                continue;
            }
            let inherited = ancestors
                .iter()
                .find_map(|&anc| ctx.model.nodes.get(anc).annotations.get(&key).cloned());
            if let Some(value) = inherited {
                ctx.model.nodes.get_mut(id).annotations.insert(key, value);
            }
        }
    }
}

fn propagate_via_origin(ctx: &mut Ctx<'_>) {
    let ids: Vec<NodeId> = ctx.model.links.origin.keys().copied().collect();
    for id in ids {
        let Some(&origin) = ctx.model.links.origin.get(&id) else {
            continue;
        };
        for name in PROPAGATED_ANNOTATIONS {
            let key = intern(name);
            if ctx.model.nodes.get(id).annotations.get(&key).is_some() {
                continue;
            }
            if let Some(value) = ctx.model.nodes.get(origin).annotations.get(&key).cloned() {
                ctx.model.nodes.get_mut(id).annotations.insert(key, value);
            }
        }
    }
}

fn mark_composition_targets(ctx: &mut Ctx<'_>) {
    let ids: Vec<NodeId> = ctx.model.nodes.ids().collect();
    for id in ids {
        let node = ctx.model.nodes.get(id);
        if node.assoc_kind != Some(AssocKind::Composition) {
            continue;
        }
        let target = match node.type_ref {
            Some(TypeRef::Target(pr)) | Some(TypeRef::TargetAspect(pr)) | Some(TypeRef::Type(pr)) => {
                ctx.model.pathrefs.get(pr).art
            }
            Some(TypeRef::InlineAspect(aspect_id)) => Some(aspect_id),
            None => None,
        };
        if let Some(target_id) = target {
            ctx.model.links.composition_targets.insert(target_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileTable;
    use crate::compile::CompileOptions;
    use crate::diag::MessageSink;
    use crate::model::{ArtifactKind, Model, PathItem, PathRef, ReferenceContext};

    fn ctx_parts() -> (Model, MessageSink, FileTable, CompileOptions) {
        (Model::new(), MessageSink::new(), FileTable::new(), CompileOptions::default())
    }

    #[test]
    fn an_include_materialises_the_base_elements_with_origin_and_flags() {
        let (mut model, mut messages, mut files, options) = ctx_parts();

        let managed = model.nodes.push(Node::new_artifact(intern("Managed"), ArtifactKind::Aspect));
        model.definitions.insert(intern("Managed"), managed);
        let mut created_at = Node::new_member(intern("Managed"), intern("createdAt"), MemberKind::Element);
        created_at.masked = true;
        let created_at_id = model.nodes.push(created_at);
        model.links.parent.insert(created_at_id, managed);
        model.links.main.insert(created_at_id, managed);
        model.nodes.get_mut(managed).elements.insert(intern("createdAt"), created_at_id);

        let books = model.nodes.push(Node::new_artifact(intern("Books"), ArtifactKind::Entity));
        model.definitions.insert(intern("Books"), books);
        let mut include_pr = PathRef::new(vec![PathItem::simple(intern("Managed"))], ReferenceContext::Includes);
        include_pr.art = Some(managed);
        let include_pr_id = model.pathrefs.push(include_pr);
        model.nodes.get_mut(books).includes.push(include_pr_id);

        let mut ctx = Ctx::new(&mut model, &mut messages, &mut files, &options);
        run(&mut ctx);

        let books_node = model.node(books);
        let proxy_id = *books_node.elements.get(&intern("createdAt")).unwrap();
        assert!(model.node(proxy_id).masked);
        assert_eq!(model.links.origin.get(&proxy_id), Some(&created_at_id));
        assert_eq!(model.links.ancestors.get(&books), Some(&vec![managed]));
    }

    #[test]
    fn autoexpose_propagates_from_an_included_ancestor() {
        let (mut model, mut messages, mut files, options) = ctx_parts();

        let drafts = model.nodes.push(Node::new_artifact(intern("Drafts"), ArtifactKind::Aspect));
        model.definitions.insert(intern("Drafts"), drafts);
        model
            .nodes
            .get_mut(drafts)
            .annotations
            .insert(intern("@cds.autoexpose"), serde_json::json!(true));

        let books = model.nodes.push(Node::new_artifact(intern("Books"), ArtifactKind::Entity));
        model.definitions.insert(intern("Books"), books);
        let mut include_pr = PathRef::new(vec![PathItem::simple(intern("Drafts"))], ReferenceContext::Includes);
        include_pr.art = Some(drafts);
        let include_pr_id = model.pathrefs.push(include_pr);
        model.nodes.get_mut(books).includes.push(include_pr_id);

        let mut ctx = Ctx::new(&mut model, &mut messages, &mut files, &options);
        run(&mut ctx);

        assert!(model.node(books).annotations.get(&intern("@cds.autoexpose")).is_some());
    }

    #[test]
    fn a_composition_target_is_recorded_in_the_global_set() {
        let (mut model, mut messages, mut files, options) = ctx_parts();
        let authors = model.nodes.push(Node::new_artifact(intern("Authors"), ArtifactKind::Entity));
        model.definitions.insert(intern("Authors"), authors);

        let books = model.nodes.push(Node::new_artifact(intern("Books"), ArtifactKind::Entity));
        model.definitions.insert(intern("Books"), books);
        let mut target_pr = PathRef::new(vec![PathItem::simple(intern("Authors"))], ReferenceContext::Target);
        target_pr.art = Some(authors);
        let target_pr_id = model.pathrefs.push(target_pr);
        let mut comp = Node::new_member(intern("Books"), intern("authors"), MemberKind::Element);
        comp.assoc_kind = Some(AssocKind::Composition);
        comp.type_ref = Some(TypeRef::Target(target_pr_id));
        let comp_id = model.nodes.push(comp);
        model.links.parent.insert(comp_id, books);
        model.links.main.insert(comp_id, books);
        model.nodes.get_mut(books).elements.insert(intern("authors"), comp_id);

        let mut ctx = Ctx::new(&mut model, &mut messages, &mut files, &options);
        run(&mut ctx);

        assert!(model.links.composition_targets.contains(&authors));
    }
}
