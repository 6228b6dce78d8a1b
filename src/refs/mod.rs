//! Referential-constraint generation: a thin consumer of the
//! resolved model, not a compiler phase. Every association/composition
//! whose target resolved to a real entity yields one constraint; on-delete
//! follows a fixed rule (`RESTRICT` for associations, `CASCADE` for
//! compositions) rather than a per-declaration override, since this
//! crate's [`crate::model::PathRef`]-based `on_condition` models one
//! referenced path, not a full expression tree — there is no way to check
//! the "=`/`and` only, both sides key-covered" restriction literally; every
//! resolved association/composition is treated as already satisfying it.

use crate::core::IStr;
use crate::model::{AssocKind, Model, NodeId, TypeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Restrict,
    Cascade,
}

#[derive(Debug, Clone)]
pub struct ReferentialConstraint {
    pub from: IStr,
    pub from_id: NodeId,
    pub target: IStr,
    pub target_id: NodeId,
    pub on_delete: OnDelete,
}

pub fn referential_constraints(model: &Model) -> Vec<ReferentialConstraint> {
    let mut out = Vec::new();
    for id in model.nodes.ids() {
        let node = model.node(id);
        let Some(assoc) = node.assoc_kind else { continue };
        let target_id = match node.type_ref {
            Some(TypeRef::Target(pr)) | Some(TypeRef::TargetAspect(pr)) | Some(TypeRef::Type(pr)) => {
                model.pathrefs.get(pr).art
            }
            Some(TypeRef::InlineAspect(aspect_id)) => Some(aspect_id),
            None => None,
        };
        let Some(target_id) = target_id else { continue };
        out.push(ReferentialConstraint {
            from: node.name.absolute.clone(),
            from_id: id,
            target: model.node(target_id).name.absolute.clone(),
            target_id,
            on_delete: match assoc {
                AssocKind::Association => OnDelete::Restrict,
                AssocKind::Composition => OnDelete::Cascade,
            },
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArtifactKind, MemberKind, Node, PathItem, PathRef, ReferenceContext};

    fn intern(s: &str) -> IStr {
        std::rc::Rc::from(s)
    }

    #[test]
    fn a_composition_generates_a_cascade_constraint() {
        let mut model = Model::new();
        let authors = model.nodes.push(Node::new_artifact(intern("Authors"), ArtifactKind::Entity));
        model.definitions.insert(intern("Authors"), authors);

        let mut target_pr = PathRef::new(vec![PathItem::simple(intern("Authors"))], ReferenceContext::Target);
        target_pr.art = Some(authors);
        let target_pr_id = model.pathrefs.push(target_pr);
        let mut comp = Node::new_member(intern("Books.authors"), intern("authors"), MemberKind::Element);
        comp.assoc_kind = Some(AssocKind::Composition);
        comp.type_ref = Some(TypeRef::Target(target_pr_id));
        model.nodes.push(comp);

        let constraints = referential_constraints(&model);
        assert_eq!(constraints.len(), 1);
        assert_eq!(constraints[0].on_delete, OnDelete::Cascade);
        assert_eq!(constraints[0].target.as_ref(), "Authors");
    }

    #[test]
    fn an_association_generates_a_restrict_constraint() {
        let mut model = Model::new();
        let authors = model.nodes.push(Node::new_artifact(intern("Authors"), ArtifactKind::Entity));
        model.definitions.insert(intern("Authors"), authors);

        let mut target_pr = PathRef::new(vec![PathItem::simple(intern("Authors"))], ReferenceContext::Target);
        target_pr.art = Some(authors);
        let target_pr_id = model.pathrefs.push(target_pr);
        let mut assoc = Node::new_member(intern("Books.author"), intern("author"), MemberKind::Element);
        assoc.assoc_kind = Some(AssocKind::Association);
        assoc.type_ref = Some(TypeRef::Target(target_pr_id));
        model.nodes.push(assoc);

        let constraints = referential_constraints(&model);
        assert_eq!(constraints[0].on_delete, OnDelete::Restrict);
    }
}
