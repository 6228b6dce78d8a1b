//! Texts-entity generation: every entity with at least one
//! key and at least one `localized` element gets a sibling `<Entity>.texts`
//! (or legacy `<Entity>_texts`) entity, plus a managed `texts` composition
//! and an unmanaged `localized` association wired onto the base.
//!
//! The `on` condition this crate attaches to the generated `localized`
//! association is a single two-step `ref` into the texts entity's own
//! `locale` element (`texts.locale`), not the full `locale = $user.locale
//! and <key> = <key> …` conjunction a real CDS compiler writes — this
//! crate's [`crate::model::PathRef`] models one referenced path, never a
//! boolean expression tree (the same simplification
//! [`crate::resolve::query`] notes for view projections), so the generated
//! condition captures the join's *shape*, not its full predicate.

use crate::base::FileId;
use crate::core::IStr;
use crate::ctx::Ctx;
use crate::diag::{Message, codes};
use crate::model::{
    ArtifactKind, AssocKind, Kind, MemberKind, Node, NodeId, PathItem, PathRef, ReferenceContext,
    TypeParams, TypeRef,
};

fn intern(s: &str) -> IStr {
    std::rc::Rc::from(s)
}

pub fn run(ctx: &mut Ctx<'_>) {
    let entity_ids: Vec<NodeId> = ctx
        .model
        .nodes
        .ids()
        .filter(|&id| matches!(ctx.model.nodes.get(id).kind, Kind::Artifact(ArtifactKind::Entity)))
        .collect();
    for entity_id in entity_ids {
        maybe_generate(ctx, entity_id);
    }
}

fn maybe_generate(ctx: &mut Ctx<'_>, entity_id: NodeId) {
    let keys: Vec<(IStr, NodeId)> = ctx
        .model
        .nodes
        .get(entity_id)
        .elements
        .iter()
        .filter(|(_, &id)| ctx.model.nodes.get(id).key)
        .map(|(k, &v)| (k.clone(), v))
        .collect();
    let localized: Vec<(IStr, NodeId)> = ctx
        .model
        .nodes
        .get(entity_id)
        .elements
        .iter()
        .filter(|(_, &id)| ctx.model.nodes.get(id).localized)
        .map(|(k, &v)| (k.clone(), v))
        .collect();
    if keys.is_empty() || localized.is_empty() {
        return;
    }

    let base_absolute = ctx.model.nodes.get(entity_id).name.absolute.clone();
    let underscore = ctx.options.deprecated.generated_entity_name_with_underscore;
    let texts_name = if underscore {
        intern(&format!("{base_absolute}_texts"))
    } else {
        intern(&format!("{base_absolute}.texts"))
    };

    if ctx.model.definitions.contains_key(&texts_name) {
        ctx.messages.push(Message::info(
            codes::TEXTS_ENTITY_EXISTS,
            FileId::SYNTHETIC,
            super::synthetic_span(),
            format!("'{texts_name}' already exists; skipping generated texts entity for '{base_absolute}'"),
        ));
        return;
    }

    let draft_enabled = ctx
        .model
        .nodes
        .get(entity_id)
        .annotations
        .get(&intern("@fiori.draft.enabled"))
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);

    let block = ctx.model.links.block.get(&entity_id).copied();

    let mut texts_node = Node::new_artifact(texts_name.clone(), ArtifactKind::Entity);
    texts_node.inferred = true;
    let texts_id = ctx.model.nodes.push(texts_node);
    ctx.model.links.main.insert(texts_id, texts_id);
    ctx.model.links.origin.insert(texts_id, entity_id);
    if let Some(src) = block {
        ctx.model.links.block.insert(texts_id, src);
    }
    ctx.model.definitions.insert(texts_name.clone(), texts_id);

    if draft_enabled {
        let id_texts = new_proxy_element(ctx, &texts_name, texts_id, block, "ID_texts", None);
        ctx.model.nodes.get_mut(id_texts).key = true;
        ctx.model.nodes.get_mut(id_texts).type_ref =
            Some(TypeRef::Type(global_type_ref(ctx, "cds.UUID")));
        ctx.model
            .nodes
            .get_mut(texts_id)
            .elements
            .insert(intern("ID_texts"), id_texts);
    }

    let locale = new_proxy_element(ctx, &texts_name, texts_id, block, "locale", None);
    {
        let locale_node = ctx.model.nodes.get_mut(locale);
        locale_node.key = !draft_enabled;
        locale_node.type_ref = Some(TypeRef::Type(global_type_ref(ctx, "cds.String")));
        locale_node.type_params = TypeParams {
            length: Some(14),
            ..TypeParams::default()
        };
    }
    ctx.model.nodes.get_mut(texts_id).elements.insert(intern("locale"), locale);

    for (name, orig_id) in &keys {
        let proxy = new_proxy_element(ctx, &texts_name, texts_id, block, name, Some(*orig_id));
        ctx.model.nodes.get_mut(proxy).key = !draft_enabled;
        ctx.model
            .nodes
            .get_mut(texts_id)
            .elements
            .insert(name.clone(), proxy);
    }
    for (name, orig_id) in &localized {
        let proxy = new_proxy_element(ctx, &texts_name, texts_id, block, name, Some(*orig_id));
        ctx.model
            .nodes
            .get_mut(texts_id)
            .elements
            .insert(name.clone(), proxy);
    }

    if draft_enabled {
        let mut unique_group: Vec<IStr> = vec![intern("locale")];
        unique_group.extend(keys.iter().map(|(k, _)| k.clone()));
        ctx.model.nodes.get_mut(texts_id).annotations.insert(
            intern("@assert.unique.locale"),
            serde_json::Value::Array(unique_group.into_iter().map(|k| serde_json::json!(k.to_string())).collect()),
        );
    }

    let texts_pathref = {
        let mut pr = PathRef::new(vec![PathItem::simple(texts_name.clone())], ReferenceContext::Target);
        pr.art = Some(texts_id);
        ctx.model.pathrefs.push(pr)
    };
    let localized_pathref = {
        let mut pr = PathRef::new(vec![PathItem::simple(texts_name.clone())], ReferenceContext::Target);
        pr.art = Some(texts_id);
        ctx.model.pathrefs.push(pr)
    };

    let texts_absolute = intern(&format!("{base_absolute}.texts"));
    let mut texts_member = Node::new_member(texts_absolute, intern("texts"), MemberKind::Element);
    texts_member.inferred = true;
    texts_member.assoc_kind = Some(AssocKind::Composition);
    texts_member.is_many = true;
    texts_member.type_ref = Some(TypeRef::Target(texts_pathref));
    let texts_member_id = ctx.model.nodes.push(texts_member);
    ctx.model.links.parent.insert(texts_member_id, entity_id);
    ctx.model.links.main.insert(texts_member_id, ctx.model.main_of(entity_id));
    if let Some(src) = block {
        ctx.model.links.block.insert(texts_member_id, src);
    }

    let localized_absolute = intern(&format!("{base_absolute}.localized"));
    let mut localized_member = Node::new_member(localized_absolute, intern("localized"), MemberKind::Element);
    localized_member.inferred = true;
    localized_member.assoc_kind = Some(AssocKind::Association);
    localized_member.type_ref = Some(TypeRef::Target(localized_pathref));
    let on_pr = PathRef::new(
        vec![PathItem::simple(intern("texts")), PathItem::simple(intern("locale"))],
        ReferenceContext::OnMixinAssoc,
    );
    let on_pr_id = ctx.model.pathrefs.push(on_pr);
    localized_member.on_condition = Some(on_pr_id);
    let localized_member_id = ctx.model.nodes.push(localized_member);
    ctx.model.links.parent.insert(localized_member_id, entity_id);
    ctx.model.links.main.insert(localized_member_id, ctx.model.main_of(entity_id));
    if let Some(src) = block {
        ctx.model.links.block.insert(localized_member_id, src);
    }

    let base = ctx.model.nodes.get_mut(entity_id);
    base.elements.insert(intern("texts"), texts_member_id);
    base.elements.insert(intern("localized"), localized_member_id);
}

/// A resolved, already-`art`-set `PathRef` naming a predefined scalar type
/// (`cds.String`, `cds.UUID`, …). These never live in `model.definitions` —
/// they are builtin, not user-defined — so generated elements point at them
/// by name only, the same unresolved-by-design shape a hand-written `type:
/// cds.String` carries until a caller chooses to special-case builtins.
fn global_type_ref(ctx: &mut Ctx<'_>, name: &str) -> crate::model::PathRefId {
    ctx.model
        .pathrefs
        .push(PathRef::new(vec![PathItem::simple(intern(name))], ReferenceContext::Type))
}

fn new_proxy_element(
    ctx: &mut Ctx<'_>,
    owner_absolute: &IStr,
    owner_id: NodeId,
    block: Option<crate::model::SourceId>,
    name: &str,
    origin: Option<NodeId>,
) -> NodeId {
    let absolute = intern(&format!("{owner_absolute}.{name}"));
    let mut node = Node::new_member(absolute, intern(name), MemberKind::Element);
    node.inferred = true;
    if let Some(origin_id) = origin {
        let orig = ctx.model.nodes.get(origin_id).clone();
        node.type_ref = orig.type_ref;
        node.type_params = orig.type_params;
        node.not_null = orig.not_null;
    }
    let node_id = ctx.model.nodes.push(node);
    ctx.model.links.parent.insert(node_id, owner_id);
    ctx.model.links.main.insert(node_id, owner_id);
    if let Some(origin_id) = origin {
        ctx.model.links.origin.insert(node_id, origin_id);
    }
    if let Some(src) = block {
        ctx.model.links.block.insert(node_id, src);
    }
    node_id
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

    fn make_base(model: &mut Model) -> NodeId {
        let books = model.nodes.push(Node::new_artifact(intern("Books"), ArtifactKind::Entity));
        model.definitions.insert(intern("Books"), books);

        let mut id = Node::new_member(intern("Books.ID"), intern("ID"), MemberKind::Element);
        id.key = true;
        let id_id = model.nodes.push(id);
        model.links.parent.insert(id_id, books);
        model.links.main.insert(id_id, books);

        let mut title = Node::new_member(intern("Books.title"), intern("title"), MemberKind::Element);
        title.localized = true;
        let title_id = model.nodes.push(title);
        model.links.parent.insert(title_id, books);
        model.links.main.insert(title_id, books);

        model.nodes.get_mut(books).elements.insert(intern("ID"), id_id);
        model.nodes.get_mut(books).elements.insert(intern("title"), title_id);
        books
    }

    #[test]
    fn an_entity_with_a_key_and_a_localized_element_gets_a_texts_entity() {
        let (mut model, mut messages, mut files, options) = ctx_parts();
        let books = make_base(&mut model);

        let mut ctx = Ctx::new(&mut model, &mut messages, &mut files, &options);
        run(&mut ctx);

        let texts_id = *model.definitions.get(&intern("Books.texts")).unwrap();
        let texts = model.node(texts_id);
        assert_eq!(texts.elements.len(), 3); // locale, ID, title
        assert!(model.node(books).elements.contains_key(&intern("texts")));
        assert!(model.node(books).elements.contains_key(&intern("localized")));
    }

    #[test]
    fn draft_enabled_entities_get_a_generated_uuid_key_and_a_unique_annotation() {
        let (mut model, mut messages, mut files, options) = ctx_parts();
        let books = make_base(&mut model);
        model
            .nodes
            .get_mut(books)
            .annotations
            .insert(intern("@fiori.draft.enabled"), serde_json::json!(true));

        let mut ctx = Ctx::new(&mut model, &mut messages, &mut files, &options);
        run(&mut ctx);

        let texts_id = *model.definitions.get(&intern("Books.texts")).unwrap();
        let texts = model.node(texts_id);
        assert_eq!(texts.elements.len(), 4); // locale, ID, title, ID_texts
        let id_texts = *texts.elements.get(&intern("ID_texts")).unwrap();
        assert!(model.node(id_texts).key);
        assert!(!model.node(*texts.elements.get(&intern("locale")).unwrap()).key);
        assert!(texts.annotations.get(&intern("@assert.unique.locale")).is_some());
    }

    #[test]
    fn a_preexisting_same_named_artifact_is_left_alone_with_an_info_diagnostic() {
        let (mut model, mut messages, mut files, options) = ctx_parts();
        let books = make_base(&mut model);
        let existing = model.nodes.push(Node::new_artifact(intern("Books.texts"), ArtifactKind::Entity));
        model.definitions.insert(intern("Books.texts"), existing);

        let mut ctx = Ctx::new(&mut model, &mut messages, &mut files, &options);
        run(&mut ctx);

        assert!(messages.messages().iter().any(|m| m.code == codes::TEXTS_ENTITY_EXISTS));
        assert!(!model.node(books).elements.contains_key(&intern("texts")));
    }
}
