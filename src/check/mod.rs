//! Structural checks (runs last): the diagnostics that depend
//! on a fully resolved and propagated model rather than on any single
//! ingestion or resolution step. Grounded on the diagnostic-emission idiom
//! of a post-resolution validation pass over a finished tree.

use crate::core::IStr;
use crate::ctx::Ctx;
use crate::diag::{Message, codes};
use crate::model::{ArtifactKind, Kind, NodeId, TypeRef};

fn synthetic_span() -> crate::base::Span {
    crate::base::Span::point(crate::base::Position::new(0, 0))
}

pub fn run(ctx: &mut Ctx<'_>) {
    check_target_aspect_consistency(ctx);
    check_managed_aspect_composition(ctx);
    check_default_on_enum_or_assoc(ctx);
    check_circular_type_reference(ctx);
    check_query_requires_alias(ctx);
}

/// Defensive backstop for [`crate::resolve::resolve_type_refs_and_includes`]'s
/// own `target`/`targetAspect` normalisation: since `resolve::run` executes
/// twice (once before, once after derived-artefact generation), a reference
/// added or rewritten in between should already have been normalised by the
/// second pass — this just asserts that invariant holds on the final model.
fn check_target_aspect_consistency(ctx: &mut Ctx<'_>) {
    let node_ids: Vec<NodeId> = ctx.model.nodes.ids().collect();
    for node_id in node_ids {
        let Some(type_ref) = ctx.model.nodes.get(node_id).type_ref else {
            continue;
        };
        let (pr, currently_aspect) = match type_ref {
            TypeRef::Target(pr) => (pr, false),
            TypeRef::TargetAspect(pr) => (pr, true),
            _ => continue,
        };
        let Some(art) = ctx.model.pathrefs.get(pr).art else {
            continue;
        };
        let is_aspect_like = matches!(
            ctx.model.nodes.get(art).kind,
            Kind::Artifact(ArtifactKind::Aspect) | Kind::Artifact(ArtifactKind::Type)
        );
        if is_aspect_like != currently_aspect {
            ctx.messages.push(Message::error(
                codes::INCONSISTENT_TARGET_ASPECT,
                crate::base::FileId::SYNTHETIC,
                synthetic_span(),
                format!(
                    "'{}' targets '{}', whose kind is inconsistent with target/targetAspect",
                    ctx.model.nodes.get(node_id).name.absolute,
                    ctx.model.nodes.get(art).name.absolute
                ),
            ));
        }
    }
}

/// A composition of an inline aspect is "managed": the target entity and
/// its `up_` back-association are system-generated
/// ([`crate::definer::derive_aspect`]). Explicit `foreign_keys`/`on` on such
/// an element would conflict with the generated shape.
fn check_managed_aspect_composition(ctx: &mut Ctx<'_>) {
    let node_ids: Vec<NodeId> = ctx.model.nodes.ids().collect();
    for node_id in node_ids {
        let node = ctx.model.nodes.get(node_id);
        if !matches!(node.type_ref, Some(TypeRef::InlineAspect(_))) {
            continue;
        }
        if !node.foreign_keys.is_empty() {
            ctx.messages.push(Message::error(
                codes::FOREIGN_KEYS_WITH_MANAGED_ASPECT,
                crate::base::FileId::SYNTHETIC,
                synthetic_span(),
                format!("'{}' has explicit foreign keys on a managed aspect composition", node.name.absolute),
            ));
        }
        if node.on_condition.is_some() {
            ctx.messages.push(Message::error(
                codes::ON_CONDITION_ON_MANAGED_ASPECT,
                crate::base::FileId::SYNTHETIC,
                synthetic_span(),
                format!("'{}' has an explicit on-condition on a managed aspect composition", node.name.absolute),
            ));
        }
    }
}

fn check_default_on_enum_or_assoc(ctx: &mut Ctx<'_>) {
    let node_ids: Vec<NodeId> = ctx.model.nodes.ids().collect();
    for node_id in node_ids {
        let node = ctx.model.nodes.get(node_id);
        if node.default_value.is_none() {
            continue;
        }
        let is_assoc = node.assoc_kind.is_some();
        let is_enum = resolved_type_is_enum(ctx, node_id);
        if is_assoc || is_enum {
            ctx.messages.push(Message::error(
                codes::DEFAULT_ON_ENUM_OR_ASSOC,
                crate::base::FileId::SYNTHETIC,
                synthetic_span(),
                format!("'{}' has a default value on an enum or association", ctx.model.nodes.get(node_id).name.absolute),
            ));
        }
    }
}

fn resolved_type_is_enum(ctx: &Ctx<'_>, node_id: NodeId) -> bool {
    let Some(TypeRef::Type(pr)) = ctx.model.nodes.get(node_id).type_ref else {
        return false;
    };
    let Some(art) = ctx.model.pathrefs.get(pr).art else {
        return false;
    };
    !ctx.model.nodes.get(art).enum_values.is_empty()
}

/// Walks `type:` chains looking for a cycle. Only `type` (not
/// `target`/`targetAspect`) can legally form a reference cycle, since
/// associations/compositions are allowed to be self-referential.
fn check_circular_type_reference(ctx: &mut Ctx<'_>) {
    let type_ids: Vec<NodeId> = ctx
        .model
        .nodes
        .ids()
        .filter(|&id| matches!(ctx.model.nodes.get(id).kind, Kind::Artifact(ArtifactKind::Type)))
        .collect();
    for start in type_ids {
        let mut seen = vec![start];
        let mut current = start;
        loop {
            let Some(TypeRef::Type(pr)) = ctx.model.nodes.get(current).type_ref else {
                break;
            };
            let Some(next) = ctx.model.pathrefs.get(pr).art else {
                break;
            };
            if next == start {
                let name: IStr = ctx.model.nodes.get(start).name.absolute.clone();
                ctx.messages.push(Message::error(
                    codes::CIRCULAR_TYPE_REFERENCE,
                    crate::base::FileId::SYNTHETIC,
                    synthetic_span(),
                    format!("'{name}' has a circular type reference"),
                ));
                break;
            }
            if seen.contains(&next) {
                break;
            }
            seen.push(next);
            current = next;
        }
    }
}

/// A `FROM` with more than one table source requires every alias to be
/// explicit, since implicit aliasing (the final path segment) can't
/// disambiguate a join.
fn check_query_requires_alias(ctx: &mut Ctx<'_>) {
    let query_ids: Vec<crate::model::QueryId> = ctx.model.queries.ids().collect();
    for qid in query_ids {
        let query = ctx.model.queries.get(qid);
        if query.table_aliases.len() <= 1 {
            continue;
        }
        let implicit: Vec<IStr> = query
            .table_aliases
            .iter()
            .filter(|(_, alias)| !alias.explicit)
            .map(|(name, _)| name.clone())
            .collect();
        for name in implicit {
            ctx.messages.push(Message::error(
                codes::QUERY_REQ_ALIAS,
                crate::base::FileId::SYNTHETIC,
                synthetic_span(),
                format!("'{name}' requires an explicit alias in a multi-source query"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileTable;
    use crate::compile::CompileOptions;
    use crate::diag::MessageSink;
    use crate::model::{AssocKind, MemberKind, Model, Node, PathItem, PathRef, QueryNode, ReferenceContext, TableAlias};

    fn intern(s: &str) -> IStr {
        std::rc::Rc::from(s)
    }

    fn ctx_parts() -> (Model, MessageSink, FileTable, CompileOptions) {
        (Model::new(), MessageSink::new(), FileTable::new(), CompileOptions::default())
    }

    #[test]
    fn a_default_value_on_an_association_is_refused() {
        let (mut model, mut messages, mut files, options) = ctx_parts();
        let mut elem = Node::new_member(intern("Books.author"), intern("author"), MemberKind::Element);
        elem.assoc_kind = Some(AssocKind::Association);
        elem.default_value = Some(serde_json::json!(1));
        model.nodes.push(elem);

        let mut ctx = Ctx::new(&mut model, &mut messages, &mut files, &options);
        run(&mut ctx);
        assert!(messages.messages().iter().any(|m| m.code == codes::DEFAULT_ON_ENUM_OR_ASSOC));
    }

    #[test]
    fn a_self_referential_type_chain_is_flagged_circular() {
        let (mut model, mut messages, mut files, options) = ctx_parts();
        let a = model.nodes.push(Node::new_artifact(intern("A"), ArtifactKind::Type));
        model.definitions.insert(intern("A"), a);
        let mut pr = PathRef::new(vec![PathItem::simple(intern("A"))], ReferenceContext::Type);
        pr.art = Some(a);
        let pr_id = model.pathrefs.push(pr);
        model.nodes.get_mut(a).type_ref = Some(TypeRef::Type(pr_id));

        let mut ctx = Ctx::new(&mut model, &mut messages, &mut files, &options);
        run(&mut ctx);
        assert!(messages.messages().iter().any(|m| m.code == codes::CIRCULAR_TYPE_REFERENCE));
    }

    #[test]
    fn a_multi_source_query_with_an_implicit_alias_requires_one() {
        let (mut model, mut messages, mut files, options) = ctx_parts();
        let books = model.nodes.push(Node::new_artifact(intern("Books"), ArtifactKind::Entity));
        let authors = model.nodes.push(Node::new_artifact(intern("Authors"), ArtifactKind::Entity));

        let mut books_pr = PathRef::new(vec![PathItem::simple(intern("Books"))], ReferenceContext::From);
        books_pr.art = Some(books);
        let books_pr_id = model.pathrefs.push(books_pr);
        let mut authors_pr = PathRef::new(vec![PathItem::simple(intern("Authors"))], ReferenceContext::From);
        authors_pr.art = Some(authors);
        let authors_pr_id = model.pathrefs.push(authors_pr);

        let mut query = QueryNode::new_select(books);
        query.table_aliases.insert(
            intern("Books"),
            TableAlias { name: intern("Books"), explicit: false, source: crate::model::TableAliasSource::Path(books_pr_id) },
        );
        query.table_aliases.insert(
            intern("Authors"),
            TableAlias { name: intern("Authors"), explicit: false, source: crate::model::TableAliasSource::Path(authors_pr_id) },
        );
        model.queries.push(query);

        let mut ctx = Ctx::new(&mut model, &mut messages, &mut files, &options);
        run(&mut ctx);
        assert!(messages.messages().iter().filter(|m| m.code == codes::QUERY_REQ_ALIAS).count() == 2);
    }
}
