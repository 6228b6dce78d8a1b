//! Back-reference attach/cleanup:
//! `attach` materialises `_subArtifacts` and the `$path`/`$scope` index for
//! tooling that wants them precomputed; `cleanup` clears both so a caller
//! can mutate the model and re-attach. Grounded on the "walk once, attach
//! derived info, can be cleaned up" shape of a post-resolution enrichment
//! pass over a finished tree.

use crate::core::IStr;
use crate::model::{Model, NodeId, Scope};

pub fn attach(model: &mut Model) {
    build_sub_artifacts(model);
    build_path_and_scope(model);
}

pub fn cleanup(model: &mut Model) {
    model.links.sub_artifacts.clear();
    model.enriched.clear();
}

fn build_sub_artifacts(model: &mut Model) {
    model.links.sub_artifacts.clear();
    let ids: Vec<NodeId> = model.nodes.ids().collect();
    for id in ids {
        if let Some(&parent) = model.links.parent.get(&id) {
            model.links.sub_artifacts.entry(parent).or_default().push(id);
        }
    }
}

fn build_path_and_scope(model: &mut Model) {
    model.enriched.clear();
    let ids: Vec<NodeId> = model.nodes.ids().collect();
    for id in ids {
        let (is_artifact, absolute, component, bucket) = {
            let node = model.nodes.get(id);
            (
                node.kind.is_artifact(),
                node.name.absolute.clone(),
                node.name.component.clone(),
                member_bucket(node.member_kind()),
            )
        };
        if is_artifact {
            let path: IStr = format!("/definitions/{absolute}").into();
            model.enriched.path.insert(id, path);
            model.enriched.scope.insert(id, Scope::Global);
            continue;
        }
        let component = component.unwrap_or_else(|| absolute.clone());
        let parent_path = model
            .links
            .parent
            .get(&id)
            .and_then(|p| model.enriched.path.get(p))
            .cloned()
            .unwrap_or_else(|| format!("/definitions/{absolute}").into());
        let path: IStr = format!("{parent_path}/{bucket}/{component}").into();
        model.enriched.path.insert(id, path);
        model.enriched.scope.insert(id, Scope::Source);
    }
}

fn member_bucket(member_kind: Option<crate::model::MemberKind>) -> &'static str {
    use crate::model::MemberKind;
    match member_kind {
        Some(MemberKind::Action) | Some(MemberKind::Function) => "actions",
        Some(MemberKind::Param) => "params",
        Some(MemberKind::EnumValue) => "enum",
        _ => "elements",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArtifactKind, MemberKind, Node};

    fn intern(s: &str) -> IStr {
        std::rc::Rc::from(s)
    }

    #[test]
    fn attach_materialises_subartifacts_and_path() {
        let mut model = Model::new();
        let books = model.nodes.push(Node::new_artifact(intern("Books"), ArtifactKind::Entity));
        model.definitions.insert(intern("Books"), books);
        let title = model.nodes.push(Node::new_member(intern("Books.title"), intern("title"), MemberKind::Element));
        model.links.parent.insert(title, books);
        model.links.main.insert(title, books);

        attach(&mut model);

        assert_eq!(model.links.sub_artifacts.get(&books), Some(&vec![title]));
        assert_eq!(model.enriched.path.get(&books).map(|s| s.as_ref()), Some("/definitions/Books"));
        assert_eq!(model.enriched.path.get(&title).map(|s| s.as_ref()), Some("/definitions/Books/elements/title"));
    }

    #[test]
    fn cleanup_clears_both_tables() {
        let mut model = Model::new();
        let books = model.nodes.push(Node::new_artifact(intern("Books"), ArtifactKind::Entity));
        model.definitions.insert(intern("Books"), books);
        attach(&mut model);
        cleanup(&mut model);
        assert!(model.links.sub_artifacts.is_empty());
        assert!(model.enriched.path.is_empty());
    }
}
