//! The step-by-step path walker shared by every reference context that
//! isn't resolved as one flat global-name lookup: given a
//! seed for step 0 (built differently per context — see
//! [`crate::resolve::query`] and [`crate::resolve`]'s member-level
//! on-condition handling), walks the remaining steps through each node's
//! "navigation environment" and attaches `_links`/`_art`/`$scope`/`$env`.

use rustc_hash::FxHashMap;

use crate::base::FileId;
use crate::core::IStr;
use crate::ctx::Ctx;
use crate::diag::{Message, codes};
use crate::model::{Link, NodeId, PathRefId, Scope, TypeRef};

fn synthetic_span() -> crate::base::Span {
    crate::base::Span::point(crate::base::Position::new(0, 0))
}

fn intern(s: &str) -> IStr {
    std::rc::Rc::from(s)
}

/// Candidates available at step 0 of a path: name -> (node reached, the
/// scope it was found in, a human-readable environment description).
pub type Seed = FxHashMap<IStr, (NodeId, Scope, IStr)>;

/// The elements a path step can continue navigating into: an association's
/// or composition's target entity's elements, or — for a plain
/// struct-shaped element/type/aspect — its own elements. `is_many` does not
/// change this: array-typed elements are navigated through transparently
pub fn target_entity_of(ctx: &Ctx<'_>, node_id: NodeId) -> Option<NodeId> {
    let node = ctx.model.nodes.get(node_id);
    if node.assoc_kind.is_none() {
        return Some(node_id);
    }
    match node.type_ref {
        Some(TypeRef::Target(pr)) | Some(TypeRef::TargetAspect(pr)) | Some(TypeRef::Type(pr)) => {
            ctx.model.pathrefs.get(pr).art
        }
        Some(TypeRef::InlineAspect(aspect_id)) => Some(aspect_id),
        None => None,
    }
}

fn navigate(ctx: &Ctx<'_>, current: NodeId, name: &IStr) -> Option<NodeId> {
    let container = target_entity_of(ctx, current)?;
    ctx.model.nodes.get(container).elements.get(name).copied()
}

/// Resolves `pr` against `seed` for step 0 and [`navigate`] for every
/// subsequent step. No-op if `pr` is already resolved or already marked
/// errored (repeated `resolve::run` calls are idempotent).
pub fn resolve_with_seed(ctx: &mut Ctx<'_>, pr: PathRefId, seed: &Seed) {
    if ctx.model.pathrefs.get(pr).art.is_some() || ctx.model.pathrefs.get(pr).error {
        return;
    }
    let len = ctx.model.pathrefs.get(pr).items.len();
    if len == 0 {
        return;
    }
    let first = ctx.model.pathrefs.get(pr).items[0].id.clone();
    let Some(&(mut current, scope0, ref env0)) = seed.get(&first) else {
        let dotted = ctx.model.pathrefs.get(pr).dotted();
        let mut names: Vec<IStr> = seed.keys().cloned().collect();
        names.sort();
        ctx.model.pathrefs.get_mut(pr).error = true;
        ctx.messages.push(
            Message::error(
                codes::REF_UNDEFINED,
                FileId::SYNTHETIC,
                synthetic_span(),
                format!("'{dotted}' could not be resolved"),
            )
            .with_valid_names(names),
        );
        return;
    };
    let env0 = env0.clone();
    let mut links = vec![Some(Link {
        art: current,
        env_description: env0.clone(),
    })];
    let mut ok = true;
    for i in 1..len {
        let name = ctx.model.pathrefs.get(pr).items[i].id.clone();
        match navigate(ctx, current, &name) {
            Some(next) => {
                links.push(Some(Link {
                    art: next,
                    env_description: intern("elements"),
                }));
                current = next;
            }
            None => {
                links.push(None);
                ok = false;
                break;
            }
        }
    }

    resolve_continuations(ctx, pr, &links);

    let dotted = ctx.model.pathrefs.get(pr).dotted();
    let pr_mut = ctx.model.pathrefs.get_mut(pr);
    pr_mut.links = links;
    if ok {
        pr_mut.art = Some(current);
        pr_mut.scope = Some(scope0);
        pr_mut.env = Some(env0);
    } else {
        pr_mut.error = true;
    }
    drop(pr_mut);
    if !ok {
        ctx.messages.push(Message::error(
            codes::REF_UNDEFINED,
            FileId::SYNTHETIC,
            synthetic_span(),
            format!("'{dotted}' has no member matching the reference"),
        ));
    }
}

/// Resolves a bracket filter (`books[where: ...]`) or an `expand`/`inline`
/// continuation attached to a step, seeded from that step's own terminal
/// elements plus `$self`/`$projection` (the outer ref's terminal type
/// becomes the child lookup's base environment).
fn resolve_continuations(ctx: &mut Ctx<'_>, pr: PathRefId, links: &[Option<Link>]) {
    let items_len = ctx.model.pathrefs.get(pr).items.len();
    for i in 0..items_len {
        let Some(Some(link)) = links.get(i) else {
            continue;
        };
        let base = link.art;
        let mut seed: Seed = FxHashMap::default();
        if let Some(container) = target_entity_of(ctx, base) {
            for (name, node_id) in ctx.model.nodes.get(container).elements.iter() {
                seed.insert(name.clone(), (*node_id, Scope::RefTarget, intern("elements")));
            }
        }
        seed.insert(intern("$self"), (base, Scope::SelfAlias, intern("self")));
        seed.insert(intern("$projection"), (base, Scope::SelfAlias, intern("self")));

        let filter = ctx.model.pathrefs.get(pr).items[i].filter;
        if let Some(filter_pr) = filter {
            resolve_with_seed(ctx, filter_pr, &seed);
        }
        let expand_exprs: Vec<PathRefId> = ctx.model.pathrefs.get(pr).items[i]
            .expand
            .iter()
            .flatten()
            .filter_map(|c| c.expr)
            .collect();
        for expr in expand_exprs {
            resolve_with_seed(ctx, expr, &seed);
        }
        let inline_exprs: Vec<PathRefId> = ctx.model.pathrefs.get(pr).items[i]
            .inline
            .iter()
            .flatten()
            .filter_map(|c| c.expr)
            .collect();
        for expr in inline_exprs {
            resolve_with_seed(ctx, expr, &seed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileTable;
    use crate::compile::CompileOptions;
    use crate::diag::MessageSink;
    use crate::model::{ArtifactKind, MemberKind, Model, Node, PathItem, PathRef, ReferenceContext};

    #[test]
    fn a_two_step_path_navigates_through_an_association_target() {
        let mut model = Model::new();
        let mut messages = MessageSink::new();
        let mut files = FileTable::new();
        let options = CompileOptions::default();

        let author = model.nodes.push(Node::new_artifact(intern("Authors"), ArtifactKind::Entity));
        let name_el = model.nodes.push(Node::new_member(intern("Authors.name"), intern("name"), MemberKind::Element));
        model.nodes.get_mut(author).elements.insert(intern("name"), name_el);

        let target_pr = model.pathrefs.push(PathRef::new(vec![PathItem::simple(intern("Authors"))], ReferenceContext::Target));
        model.pathrefs.get_mut(target_pr).art = Some(author);

        let mut assoc = Node::new_member(intern("Books.author"), intern("author"), MemberKind::Element);
        assoc.assoc_kind = Some(crate::model::AssocKind::Association);
        assoc.type_ref = Some(crate::model::TypeRef::Target(target_pr));
        let assoc_id = model.nodes.push(assoc);

        let books = model.nodes.push(Node::new_artifact(intern("Books"), ArtifactKind::Entity));
        model.nodes.get_mut(books).elements.insert(intern("author"), assoc_id);

        let pr = model.pathrefs.push(PathRef::new(
            vec![PathItem::simple(intern("author")), PathItem::simple(intern("name"))],
            ReferenceContext::Default,
        ));

        let mut ctx = Ctx::new(&mut model, &mut messages, &mut files, &options);
        let mut seed: Seed = FxHashMap::default();
        seed.insert(intern("author"), (assoc_id, Scope::Source, intern("source")));
        resolve_with_seed(&mut ctx, pr, &seed);

        assert_eq!(model.pathrefs.get(pr).art, Some(name_el));
    }

    #[test]
    fn an_unknown_step0_name_is_marked_as_an_error() {
        let mut model = Model::new();
        let mut messages = MessageSink::new();
        let mut files = FileTable::new();
        let options = CompileOptions::default();
        let pr = model.pathrefs.push(PathRef::new(vec![PathItem::simple(intern("ghost"))], ReferenceContext::Default));
        let mut ctx = Ctx::new(&mut model, &mut messages, &mut files, &options);
        resolve_with_seed(&mut ctx, pr, &Seed::default());
        assert!(model.pathrefs.get(pr).error);
    }
}
