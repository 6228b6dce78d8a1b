//! Extension application.
//!
//! Runs in three passes, serialized by layer rank:
//!
//! 1. `extend context|service` — would introduce new sub-artifacts in the
//!    full language; the sub-artifact shape this repo supports
//!    (elements/actions/annotations/includes/columns on an *existing*
//!    target) applies identically here, just ordered first so later passes
//!    see anything it added. See DESIGN.md for the scope note on
//!    `PendingSubArtifact`.
//! 2. Artifact-level extensions whose `includes` can be spliced without
//!    completing a cycle.
//! 3. Final pass: whatever is left applies with its `includes` dropped
//!    applied in a final pass without structural includes.
//!
//! Two extensions targeting the same artifact from unrelated layers (no
//! `using from` path between them) apply in an order this crate cannot make
//! stable across runs of a caller that re-orders its inputs —
//! `extend-unrelated-layer` flags that. Two from the *same* layer (an SCC)
//! have no topological order at all; DESIGN.md's decision is to apply them
//! in encounter order and warn with `extend-repeated-intralayer`.

use crate::base::FileId;
use crate::core::IStr;
use crate::ctx::Ctx;
use crate::diag::{Message, codes};
use crate::model::{
    ArtifactKind, ColumnItem, ExtensionId, ExtensionKind, Insertion, Kind, MemberKind, Node,
    NodeId, PathItem, PathRef, ReferenceContext,
};

fn intern(s: &str) -> IStr {
    std::rc::Rc::from(s)
}

pub fn apply(ctx: &mut Ctx<'_>) {
    let mut targets: Vec<IStr> = ctx.model.extensions_by_target.keys().cloned().collect();
    targets.sort();

    for target in &targets {
        diagnose_ordering(ctx, target);
    }

    for target in &targets {
        apply_phase(ctx, target, Phase::ContextOrService);
    }
    for target in &targets {
        apply_phase(ctx, target, Phase::ArtifactLevel);
    }
    for target in &targets {
        apply_phase(ctx, target, Phase::Final);
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    ContextOrService,
    ArtifactLevel,
    Final,
}

fn ordered_extensions(ctx: &Ctx<'_>, target: &IStr) -> Vec<ExtensionId> {
    let mut exts = ctx
        .model
        .extensions_by_target
        .get(target)
        .cloned()
        .unwrap_or_default();
    exts.sort_by_key(|&id| {
        let ext = ctx.model.extensions.get(id);
        ctx.model
            .sources
            .get(ext.block)
            .layer
            .map(|l| ctx.model.layers.get(l).rank)
            .unwrap_or(0)
    });
    exts
}

fn diagnose_ordering(ctx: &mut Ctx<'_>, target: &IStr) {
    let exts = ordered_extensions(ctx, target);
    for pair in exts.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let layer_a = ctx.model.sources.get(ctx.model.extensions.get(a).block).layer;
        let layer_b = ctx.model.sources.get(ctx.model.extensions.get(b).block).layer;
        let (Some(la), Some(lb)) = (layer_a, layer_b) else {
            continue;
        };
        if la == lb {
            ctx.messages.push(Message::warning(
                codes::EXTEND_REPEATED_INTRALAYER,
                FileId::SYNTHETIC,
                synthetic_span(),
                format!("multiple extensions of '{target}' within one dependency cycle apply in encounter order"),
            ));
            continue;
        }
        let extends_a = &ctx.model.layers.get(la).layer_extends;
        let extends_b = &ctx.model.layers.get(lb).layer_extends;
        let related = extends_a.contains(&lb) || extends_b.contains(&la);
        if !related {
            ctx.messages.push(Message::warning(
                codes::EXTEND_UNRELATED_LAYER,
                FileId::SYNTHETIC,
                synthetic_span(),
                format!("extensions of '{target}' from unrelated layers apply in an unstable order"),
            ));
        }
    }
}

fn synthetic_span() -> crate::base::Span {
    super::synthetic_span()
}

fn has_direct_cycle(ctx: &Ctx<'_>, target_absolute: &str, include_name: &IStr) -> bool {
    if include_name.as_ref() == target_absolute {
        return true;
    }
    let Some(&other_id) = ctx.model.definitions.get(include_name) else {
        return false;
    };
    ctx.model
        .nodes
        .get(other_id)
        .includes
        .iter()
        .any(|&pr| ctx.model.pathrefs.get(pr).dotted() == target_absolute)
}

fn apply_phase(ctx: &mut Ctx<'_>, target: &IStr, phase: Phase) {
    let exts = ordered_extensions(ctx, target);
    let Some(&target_id) = ctx.model.definitions.get(target) else {
        if phase == Phase::Final {
            for &ext_id in &exts {
                if ctx.model.extensions.get(ext_id).applied.is_none() {
                    ctx.messages.push(Message::error(
                        codes::EXTEND_UNDEFINED,
                        FileId::SYNTHETIC,
                        synthetic_span(),
                        format!("extend/annotate of undefined artifact '{target}'"),
                    ));
                }
            }
        }
        return;
    };

    for &ext_id in &exts {
        if ctx.model.extensions.get(ext_id).applied.is_some() {
            continue;
        }
        let target_kind = ctx.model.nodes.get(target_id).kind;
        let is_context_or_service = matches!(
            target_kind,
            Kind::Artifact(ArtifactKind::Context) | Kind::Artifact(ArtifactKind::Service)
        );
        let applies_this_phase = match phase {
            Phase::ContextOrService => is_context_or_service,
            Phase::ArtifactLevel => {
                !is_context_or_service
                    && ctx
                        .model
                        .extensions
                        .get(ext_id)
                        .includes
                        .iter()
                        .all(|inc| !has_direct_cycle(&*ctx, target.as_ref(), inc))
            }
            Phase::Final => true,
        };
        if !applies_this_phase {
            continue;
        }
        apply_one(ctx, target_id, ext_id, phase == Phase::Final);
    }
}

fn apply_one(ctx: &mut Ctx<'_>, target_id: NodeId, ext_id: ExtensionId, skip_includes: bool) {
    let target_absolute = ctx.model.nodes.get(target_id).name.absolute.clone();
    let is_query_entity = ctx.model.nodes.get(target_id).query.is_some();
    let kind = ctx.model.extensions.get(ext_id).kind;

    if let Some(cols) = ctx.model.extensions.get(ext_id).columns.clone() {
        if !is_query_entity {
            ctx.messages.push(Message::error(
                codes::EXTEND_COLUMNS,
                FileId::SYNTHETIC,
                synthetic_span(),
                format!("'{target_absolute}' is not a projection; `with columns` requires one"),
            ));
        } else if let Some(query_id) = ctx.model.nodes.get(target_id).query {
            for col in cols {
                let pathref = PathRef::new(vec![PathItem::simple(col)], ReferenceContext::Default);
                let pathref_id = ctx.model.pathrefs.push(pathref);
                let query = ctx.model.queries.get_mut(query_id);
                query
                    .columns
                    .get_or_insert_with(Vec::new)
                    .push(ColumnItem::expr(pathref_id, None));
            }
        }
    }

    let new_members = ctx.model.extensions.get(ext_id).new_members.clone();
    if is_query_entity
        && kind == ExtensionKind::Extend
        && new_members.iter().any(|m| m.kind != MemberKind::Action)
    {
        ctx.messages.push(Message::error(
            codes::EXTEND_REQ_ACTIONS_ONLY,
            FileId::SYNTHETIC,
            synthetic_span(),
            format!("'{target_absolute}' is a projection; `extend` may only add actions"),
        ));
    } else {
        for pm in &new_members {
            let component_absolute = intern(&format!("{target_absolute}.{}", pm.name));
            let mut member = Node::new_member(component_absolute, pm.name.clone(), pm.kind);
            for (k, v) in &pm.annotations {
                member.annotations.insert(k.clone(), v.clone());
            }
            let member_id = ctx.model.nodes.push(member);
            ctx.model.links.parent.insert(member_id, target_id);
            ctx.model.links.main.insert(member_id, target_id);
            let block = ctx.model.extensions.get(ext_id).block;
            ctx.model.links.block.insert(member_id, block);

            let dict = if pm.kind == MemberKind::Action {
                &mut ctx.model.nodes.get_mut(target_id).actions
            } else {
                &mut ctx.model.nodes.get_mut(target_id).elements
            };
            if let Insertion::Duplicate = dict.insert_tracked(pm.name.clone(), member_id) {
                ctx.messages.push(Message::error(
                    codes::DUPLICATE_DEFINITION,
                    FileId::SYNTHETIC,
                    synthetic_span(),
                    format!("'{}' already has a member named '{}'", target_absolute, pm.name),
                ));
            }
        }
    }

    for (k, v) in ctx.model.extensions.get(ext_id).annotations.clone() {
        ctx.model.nodes.get_mut(target_id).annotations.insert(k, v);
    }

    if !skip_includes {
        for inc in ctx.model.extensions.get(ext_id).includes.clone() {
            let pathref = PathRef::new(vec![PathItem::simple(inc)], ReferenceContext::Includes);
            let pathref_id = ctx.model.pathrefs.push(pathref);
            ctx.model.nodes.get_mut(target_id).includes.push(pathref_id);
        }
    }

    ctx.model.extensions.get_mut(ext_id).applied = Some(target_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileTable;
    use crate::compile::CompileOptions;
    use crate::diag::MessageSink;
    use crate::model::{ArtifactKind, Extension, Model, Source};

    fn ctx_parts() -> (Model, MessageSink, FileTable, CompileOptions) {
        (Model::new(), MessageSink::new(), FileTable::new(), CompileOptions::default())
    }

    #[test]
    fn new_elements_are_spliced_onto_the_target_entity() {
        let (mut model, mut messages, mut files, options) = ctx_parts();
        let source_id = model.sources.push(Source::new());
        let target_id = model.nodes.push(Node::new_artifact(intern("Books"), ArtifactKind::Entity));
        model.definitions.insert(intern("Books"), target_id);

        let mut ext = Extension::new(ExtensionKind::Extend, intern("Books"), source_id);
        ext.new_members.push(crate::model::PendingMember {
            name: intern("rating"),
            kind: MemberKind::Element,
            annotations: Vec::new(),
        });
        let ext_id = model.extensions.push(ext);
        model.extensions_by_target.entry(intern("Books")).or_default().push(ext_id);

        let mut ctx = Ctx::new(&mut model, &mut messages, &mut files, &options);
        apply(&mut ctx);

        assert!(model.nodes.get(target_id).elements.contains_key(&intern("rating")));
        assert!(model.extensions.get(ext_id).applied.is_some());
    }

    #[test]
    fn extending_an_undefined_target_is_an_error() {
        let (mut model, mut messages, mut files, options) = ctx_parts();
        let source_id = model.sources.push(Source::new());
        let ext = Extension::new(ExtensionKind::Extend, intern("Ghost"), source_id);
        let ext_id = model.extensions.push(ext);
        model.extensions_by_target.entry(intern("Ghost")).or_default().push(ext_id);

        let mut ctx = Ctx::new(&mut model, &mut messages, &mut files, &options);
        apply(&mut ctx);

        assert!(messages.messages().iter().any(|m| m.code == codes::EXTEND_UNDEFINED));
    }
}
