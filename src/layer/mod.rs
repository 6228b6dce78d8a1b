//! The source dependency graph: `using from` edges, SCC collapsing, and
//! layer rank. Sources in the same SCC share one [`Layer`]
//! and one rank; extension application and the `$recompile` texts-entity
//! check both read `layer.rank`/`layer_extends` from here.

mod graph;

use indexmap::IndexMap;

use crate::base::FileId;
use crate::ctx::Ctx;
use crate::diag::{Message, codes};
use crate::model::{Layer, LayerId, SourceId};

fn synthetic_span() -> crate::base::Span {
    crate::base::Span::point(crate::base::Position::new(0, 0))
}

/// Resolves every [`crate::model::UsingDirective`]'s `from` text to a
/// [`SourceId`] via `resolve` (a per-entry-point strategy — direct key
/// lookup for [`crate::compile_sources`]/[`crate::recompile`], path
/// resolution through the caller's loader for [`crate::compile`]), raising
/// `using-from-not-found` for anything that doesn't land in `by_path`.
pub fn link_usings(
    ctx: &mut Ctx<'_>,
    by_path: &IndexMap<String, SourceId>,
    resolve: impl Fn(&str, &str) -> String,
) {
    for (path, &source_id) in by_path {
        let count = ctx.model.sources.get(source_id).usings.len();
        for i in 0..count {
            let from = ctx.model.sources.get(source_id).usings[i].from.clone();
            let target_key = resolve(&from, path);
            if let Some(&target_id) = by_path.get(&target_key) {
                ctx.model.sources.get_mut(source_id).usings[i].target_source = Some(target_id);
            } else {
                ctx.messages.push(Message::warning(
                    codes::USING_FROM_NOT_FOUND,
                    FileId::SYNTHETIC,
                    synthetic_span(),
                    format!("using from '{from}' could not be resolved"),
                ));
            }
        }
    }
}

/// Builds `ctx.model.layers` from `using from` edges between `by_path`'s
/// sources: Tarjan SCC to merge cycles into one layer, then a topological
/// rank over the SCC condensation (dependencies before dependents).
pub fn build(ctx: &mut Ctx<'_>, by_path: &IndexMap<String, SourceId>) {
    let ids: Vec<SourceId> = ctx.model.sources.ids().collect();
    let index_of: std::collections::HashMap<SourceId, usize> =
        ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
    let _ = by_path;

    let adj: Vec<Vec<usize>> = ids
        .iter()
        .map(|&id| {
            ctx.model
                .sources
                .get(id)
                .usings
                .iter()
                .filter_map(|u| u.target_source)
                .filter_map(|t| index_of.get(&t).copied())
                .collect()
        })
        .collect();

    let (comp_of, comp_count) = graph::tarjan_scc(ids.len(), &adj);
    let cadj = graph::condensation(comp_count, &comp_of, &adj);
    let rank = graph::component_ranks(comp_count, &cadj);
    let reach = graph::reachable(comp_count, &cadj);

    let mut layer_ids = Vec::with_capacity(comp_count);
    for comp in 0..comp_count {
        let members: Vec<SourceId> = (0..ids.len())
            .filter(|&i| comp_of[i] == comp)
            .map(|i| ids[i])
            .collect();
        let representative = members[0];
        let layer_id = ctx.model.layers.push(Layer {
            representative,
            members,
            rank: rank[comp],
            layer_extends: Default::default(),
        });
        layer_ids.push(layer_id);
    }
    for comp in 0..comp_count {
        let extends: rustc_hash::FxHashSet<LayerId> =
            reach[comp].iter().map(|&c| layer_ids[c]).collect();
        ctx.model.layers.get_mut(layer_ids[comp]).layer_extends = extends;
    }
    for (i, &id) in ids.iter().enumerate() {
        let layer_id = layer_ids[comp_of[i]];
        ctx.model.sources.get_mut(id).layer = Some(layer_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileTable;
    use crate::compile::CompileOptions;
    use crate::diag::MessageSink;
    use crate::model::Model;

    #[test]
    fn a_chain_of_using_from_edges_ranks_the_dependency_first() {
        let mut model = Model::new();
        let mut messages = MessageSink::new();
        let mut files = FileTable::new();
        let options = CompileOptions::default();
        let a = model.sources.push(crate::model::Source::new());
        let b = model.sources.push(crate::model::Source::new());
        model.sources.get_mut(a).usings.push(crate::model::UsingDirective {
            local_name: std::rc::Rc::from("b"),
            from: std::rc::Rc::from("b"),
            target_source: None,
        });
        let mut by_path = IndexMap::new();
        by_path.insert("a".to_string(), a);
        by_path.insert("b".to_string(), b);
        let mut ctx = Ctx::new(&mut model, &mut messages, &mut files, &options);
        link_usings(&mut ctx, &by_path, |from, _here| from.to_string());
        build(&mut ctx, &by_path);

        let a_layer = model.sources.get(a).layer.unwrap();
        let b_layer = model.sources.get(b).layer.unwrap();
        assert!(model.layers.get(a_layer).rank > model.layers.get(b_layer).rank);
    }

    #[test]
    fn mutually_using_sources_collapse_into_one_layer() {
        let mut model = Model::new();
        let mut messages = MessageSink::new();
        let mut files = FileTable::new();
        let options = CompileOptions::default();
        let a = model.sources.push(crate::model::Source::new());
        let b = model.sources.push(crate::model::Source::new());
        model.sources.get_mut(a).usings.push(crate::model::UsingDirective {
            local_name: std::rc::Rc::from("b"),
            from: std::rc::Rc::from("b"),
            target_source: None,
        });
        model.sources.get_mut(b).usings.push(crate::model::UsingDirective {
            local_name: std::rc::Rc::from("a"),
            from: std::rc::Rc::from("a"),
            target_source: None,
        });
        let mut by_path = IndexMap::new();
        by_path.insert("a".to_string(), a);
        by_path.insert("b".to_string(), b);
        let mut ctx = Ctx::new(&mut model, &mut messages, &mut files, &options);
        link_usings(&mut ctx, &by_path, |from, _here| from.to_string());
        build(&mut ctx, &by_path);

        assert_eq!(model.sources.get(a).layer, model.sources.get(b).layer);
    }
}
