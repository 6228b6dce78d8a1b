//! Composition-of-aspect target-entity generation: every
//! `Composition of { .. }` element whose target is an inline aspect gets a
//! real sibling entity `<Entity>.<elem>` (or `<Entity>_<elem>` under the
//! deprecated flag), with a keyed `up_` association back to the
//! composition's immediate owner and proxy elements copied from the
//! aspect.
//!
//! Four refusals, each leaving the element's `type_ref` as the unresolved
//! `InlineAspect` it already was (so [`crate::resolve::path::target_entity_of`]'s
//! fallback — navigate the anonymous aspect node directly — still gives
//! editors something to walk):
//! - `aspect-has-up-element`: the aspect already declares its own `up_`.
//! - `aspect-key-collision`: one of the aspect's own key elements shares a
//!   name with one of the immediate owner's own keys (this crate's reading
//!   of "key elements collide" — a generated and a hand-written key
//!   wouldn't be distinguishable downstream).
//! - `aspect-target-name-exists`: `<Entity>.<elem>` is already a definition.
//! - `aspect-composition-cycle`: one of the aspect's own elements names the
//!   immediate owner as its `type`/`target`/`targetAspect` — a one-level
//!   re-introduction check, not a full transitive cycle search (this
//!   crate's scope reduction, same spirit as the extension applicator's
//!   `has_direct_cycle`).

use rustc_hash::FxHashSet;

use crate::base::FileId;
use crate::core::IStr;
use crate::ctx::Ctx;
use crate::diag::{Message, codes};
use crate::model::{
    ArtifactKind, AssocKind, MemberKind, Node, NodeId, PathItem, PathRef, ReferenceContext, TypeRef,
};

fn intern(s: &str) -> IStr {
    std::rc::Rc::from(s)
}

pub fn run(ctx: &mut Ctx<'_>) {
    let candidates: Vec<NodeId> = ctx
        .model
        .nodes
        .ids()
        .filter(|&id| {
            let node = ctx.model.nodes.get(id);
            node.assoc_kind == Some(AssocKind::Composition)
                && matches!(node.type_ref, Some(TypeRef::InlineAspect(_)))
        })
        .collect();
    for elem_id in candidates {
        maybe_generate(ctx, elem_id);
    }
}

fn maybe_generate(ctx: &mut Ctx<'_>, elem_id: NodeId) {
    let Some(TypeRef::InlineAspect(aspect_id)) = ctx.model.nodes.get(elem_id).type_ref else {
        return;
    };
    let owner_absolute = ctx.model.nodes.get(elem_id).name.absolute.clone();
    let component = ctx
        .model
        .nodes
        .get(elem_id)
        .name
        .component
        .clone()
        .unwrap_or_else(|| intern("item"));

    let underscore = ctx.options.deprecated.generated_entity_name_with_underscore;
    let target_name = if underscore {
        intern(&format!("{owner_absolute}_{component}"))
    } else {
        intern(&format!("{owner_absolute}.{component}"))
    };

    if ctx.model.definitions.contains_key(&target_name) {
        ctx.messages.push(Message::error(
            codes::ASPECT_TARGET_NAME_EXISTS,
            FileId::SYNTHETIC,
            super::synthetic_span(),
            format!("'{target_name}' already exists; cannot generate aspect-composition target entity"),
        ));
        return;
    }

    if ctx.model.nodes.get(aspect_id).elements.contains_key(&intern("up_")) {
        ctx.messages.push(Message::error(
            codes::ASPECT_HAS_UP_ELEMENT,
            FileId::SYNTHETIC,
            super::synthetic_span(),
            format!("'{owner_absolute}.{component}': the aspect already declares its own 'up_' element"),
        ));
        return;
    }

    if has_direct_reentry(ctx, aspect_id, &owner_absolute) {
        ctx.messages.push(Message::error(
            codes::ASPECT_COMPOSITION_CYCLE,
            FileId::SYNTHETIC,
            super::synthetic_span(),
            format!("'{owner_absolute}.{component}': the aspect re-introduces '{owner_absolute}' as a target"),
        ));
        return;
    }

    let Some(&parent_id) = ctx.model.links.parent.get(&elem_id) else {
        return;
    };
    let owner_key_names: FxHashSet<IStr> = ctx
        .model
        .nodes
        .get(parent_id)
        .elements
        .iter()
        .filter(|(_, &id)| ctx.model.nodes.get(id).key)
        .map(|(k, _)| k.clone())
        .collect();
    let aspect_key_collision = ctx
        .model
        .nodes
        .get(aspect_id)
        .elements
        .iter()
        .any(|(name, &id)| ctx.model.nodes.get(id).key && owner_key_names.contains(name));
    if aspect_key_collision {
        ctx.messages.push(Message::error(
            codes::ASPECT_KEY_COLLISION,
            FileId::SYNTHETIC,
            super::synthetic_span(),
            format!("'{owner_absolute}.{component}': an aspect key collides with a key of '{owner_absolute}'"),
        ));
        return;
    }

    let block = ctx.model.links.block.get(&elem_id).copied();

    let mut target_node = Node::new_artifact(target_name.clone(), ArtifactKind::Entity);
    target_node.inferred = true;
    let target_id = ctx.model.nodes.push(target_node);
    ctx.model.links.main.insert(target_id, target_id);
    ctx.model.links.origin.insert(target_id, aspect_id);
    if let Some(src) = block {
        ctx.model.links.block.insert(target_id, src);
    }
    ctx.model.definitions.insert(target_name.clone(), target_id);

    let up_pathref = {
        let parent_absolute = ctx.model.nodes.get(parent_id).name.absolute.clone();
        let mut pr = PathRef::new(vec![PathItem::simple(parent_absolute)], ReferenceContext::Target);
        pr.art = Some(parent_id);
        ctx.model.pathrefs.push(pr)
    };
    let mut up_node = Node::new_member(target_name.clone(), intern("up_"), MemberKind::Element);
    up_node.inferred = true;
    up_node.key = !ctx.options.deprecated.unmanaged_up_in_component;
    up_node.not_null = true;
    up_node.assoc_kind = Some(AssocKind::Association);
    up_node.type_ref = Some(TypeRef::Target(up_pathref));
    let up_id = ctx.model.nodes.push(up_node);
    ctx.model.links.parent.insert(up_id, target_id);
    ctx.model.links.main.insert(up_id, target_id);
    if let Some(src) = block {
        ctx.model.links.block.insert(up_id, src);
    }
    ctx.model.nodes.get_mut(target_id).elements.insert(intern("up_"), up_id);

    let aspect_elements: Vec<(IStr, NodeId)> = ctx
        .model
        .nodes
        .get(aspect_id)
        .elements
        .iter()
        .map(|(k, &v)| (k.clone(), v))
        .collect();
    for (name, orig_id) in aspect_elements {
        let proxy_id = clone_member_as_proxy(ctx, &target_name, target_id, block, &name, orig_id);
        ctx.model.nodes.get_mut(target_id).elements.insert(name, proxy_id);
    }

    let target_pathref = {
        let mut pr = PathRef::new(vec![PathItem::simple(target_name.clone())], ReferenceContext::Target);
        pr.art = Some(target_id);
        ctx.model.pathrefs.push(pr)
    };
    ctx.model.nodes.get_mut(elem_id).type_ref = Some(TypeRef::Target(target_pathref));
}

/// One-level re-introduction check (see module doc): does the aspect
/// declare an element whose `type`/`target`/`targetAspect` names
/// `owner_absolute` directly?
fn has_direct_reentry(ctx: &Ctx<'_>, aspect_id: NodeId, owner_absolute: &IStr) -> bool {
    ctx.model.nodes.get(aspect_id).elements.values().any(|&id| {
        let node = ctx.model.nodes.get(id);
        match node.type_ref {
            Some(TypeRef::Type(pr)) | Some(TypeRef::Target(pr)) | Some(TypeRef::TargetAspect(pr)) => {
                ctx.model.pathrefs.get(pr).dotted() == owner_absolute.as_ref()
            }
            _ => false,
        }
    })
}

fn clone_member_as_proxy(
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
    let proxy_id = ctx.model.nodes.push(proxy);
    ctx.model.links.parent.insert(proxy_id, owner_id);
    ctx.model.links.main.insert(proxy_id, owner_id);
    ctx.model.links.origin.insert(proxy_id, orig_id);
    if let Some(src) = block {
        ctx.model.links.block.insert(proxy_id, src);
    }
    proxy_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileTable;
    use crate::compile::CompileOptions;
    use crate::diag::MessageSink;
    use crate::model::Model;

    fn ctx_parts() -> (Model, MessageSink, FileTable, CompileOptions) {
        (Model::new(), MessageSink::new(), FileTable::new(), CompileOptions::default())
    }

    fn make_base_with_inline_composition(model: &mut Model) -> (NodeId, NodeId, NodeId) {
        let books = model.nodes.push(Node::new_artifact(intern("Books"), ArtifactKind::Entity));
        model.definitions.insert(intern("Books"), books);

        let mut id = Node::new_member(intern("Books"), intern("ID"), MemberKind::Element);
        id.key = true;
        let id_id = model.nodes.push(id);
        model.links.parent.insert(id_id, books);
        model.links.main.insert(id_id, books);
        model.nodes.get_mut(books).elements.insert(intern("ID"), id_id);

        let aspect_id = model
            .nodes
            .push(Node::new_artifact(intern("Books.reviews"), ArtifactKind::Aspect));
        let mut text = Node::new_member(intern("Books.reviews"), intern("text"), MemberKind::Element);
        text.type_ref = Some(TypeRef::Type(model.pathrefs.push(PathRef::new(
            vec![PathItem::simple(intern("cds.String"))],
            ReferenceContext::Type,
        ))));
        let text_id = model.nodes.push(text);
        model.links.parent.insert(text_id, aspect_id);
        model.links.main.insert(text_id, aspect_id);
        model.nodes.get_mut(aspect_id).elements.insert(intern("text"), text_id);

        let mut reviews = Node::new_member(intern("Books"), intern("reviews"), MemberKind::Element);
        reviews.assoc_kind = Some(AssocKind::Composition);
        reviews.is_many = true;
        reviews.type_ref = Some(TypeRef::InlineAspect(aspect_id));
        let reviews_id = model.nodes.push(reviews);
        model.links.parent.insert(reviews_id, books);
        model.links.main.insert(reviews_id, books);
        model.nodes.get_mut(books).elements.insert(intern("reviews"), reviews_id);

        (books, reviews_id, aspect_id)
    }

    #[test]
    fn an_inline_aspect_composition_gets_a_generated_target_entity_with_up_and_proxies() {
        let (mut model, mut messages, mut files, options) = ctx_parts();
        let (_books, reviews_id, _aspect_id) = make_base_with_inline_composition(&mut model);

        let mut ctx = Ctx::new(&mut model, &mut messages, &mut files, &options);
        run(&mut ctx);

        let target_id = *model.definitions.get(&intern("Books.reviews")).unwrap();
        let target = model.node(target_id);
        assert!(target.elements.contains_key(&intern("up_")));
        assert!(target.elements.contains_key(&intern("text")));
        let up = model.node(*target.elements.get(&intern("up_")).unwrap());
        assert!(up.key);

        assert!(matches!(model.node(reviews_id).type_ref, Some(TypeRef::Target(_))));
    }

    #[test]
    fn a_preexisting_up_element_on_the_aspect_refuses_generation() {
        let (mut model, mut messages, mut files, options) = ctx_parts();
        let (_books, _reviews_id, aspect_id) = make_base_with_inline_composition(&mut model);
        let up_clash = model.nodes.push(Node::new_member(intern("Books.reviews"), intern("up_"), MemberKind::Element));
        model.nodes.get_mut(aspect_id).elements.insert(intern("up_"), up_clash);

        let mut ctx = Ctx::new(&mut model, &mut messages, &mut files, &options);
        run(&mut ctx);

        assert!(messages.messages().iter().any(|m| m.code == codes::ASPECT_HAS_UP_ELEMENT));
        assert!(!model.definitions.contains_key(&intern("Books.reviews")));
    }
}
