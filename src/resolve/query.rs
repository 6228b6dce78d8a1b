//! Per-query resolution: table aliases, `$self`/`$projection`, combined
//! source elements, and the `columns`/`where`/`group by`/`having`/
//! `order by`/mixin-`on` references that search them.

use rustc_hash::FxHashMap;

use crate::core::IStr;
use crate::ctx::Ctx;
use crate::model::{QueryId, QueryKind, Scope, TableAliasSource};

use super::path::{self, Seed};

fn intern(s: &str) -> IStr {
    std::rc::Rc::from(s)
}

pub fn resolve_all(ctx: &mut Ctx<'_>) {
    let ids: Vec<QueryId> = ctx.model.queries.ids().collect();
    for &qid in &ids {
        resolve_from(ctx, qid);
    }
    for &qid in &ids {
        resolve_body(ctx, qid);
    }
}

/// Resolves the `FROM` path(s) of a query (a global-name lookup), and
/// links a subquery-in-FROM's `_$next` back to its enclosing query for
/// lexical continuation.
fn resolve_from(ctx: &mut Ctx<'_>, qid: QueryId) {
    let block = ctx
        .model
        .queries
        .get(qid)
        .main
        .and_then(|main| ctx.model.links.block.get(&main).copied());

    let sources: Vec<TableAliasSource> = ctx
        .model
        .queries
        .get(qid)
        .table_aliases
        .values()
        .map(|a| a.source.clone())
        .collect();
    for source in sources {
        resolve_source(ctx, source, block, qid);
    }
}

fn resolve_source(ctx: &mut Ctx<'_>, source: TableAliasSource, block: Option<crate::model::SourceId>, parent: QueryId) {
    match source {
        TableAliasSource::Path(pr) => {
            super::resolve_global_chain(ctx, pr, block);
        }
        TableAliasSource::Subquery(sub_id) => {
            ctx.model.queries.get_mut(sub_id).next = Some(parent);
        }
        TableAliasSource::Join(join) => {
            resolve_source(ctx, join.left, block, parent);
            resolve_source(ctx, join.right, block, parent);
            if let Some(on) = join.on {
                let seed = build_query_seed(&*ctx, parent);
                path::resolve_with_seed(ctx, on, &seed);
            }
        }
    }
}

/// The element names reachable through one `FROM`/JOIN source, approximated
/// as the backing entity's own `elements` (this compiler does not compute
/// a view's projected element shape from its query, so a view referenced
/// from another query's `FROM` exposes only whatever elements it declares
/// directly).
fn elements_of_source(ctx: &Ctx<'_>, source: &TableAliasSource) -> Vec<(IStr, crate::model::NodeId)> {
    match source {
        TableAliasSource::Path(pr) => match ctx.model.pathrefs.get(*pr).art {
            Some(art) => ctx
                .model
                .nodes
                .get(art)
                .elements
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            None => Vec::new(),
        },
        TableAliasSource::Subquery(sub_id) => {
            let sub_aliases: Vec<TableAliasSource> = ctx
                .model
                .queries
                .get(*sub_id)
                .table_aliases
                .values()
                .map(|a| a.source.clone())
                .collect();
            sub_aliases.iter().flat_map(|s| elements_of_source(ctx, s)).collect()
        }
        TableAliasSource::Join(join) => {
            let mut out = elements_of_source(ctx, &join.left);
            out.extend(elements_of_source(ctx, &join.right));
            out
        }
    }
}

/// Builds the seed for step 0 of any reference lexically inside `qid`:
/// `$self`/`$projection` first, then explicit/implicit table aliases, then
/// mixins, then the combined elements of every `FROM` source — first
/// insertion wins via `entry().or_insert`.
pub fn build_query_seed(ctx: &Ctx<'_>, qid: QueryId) -> Seed {
    let q = ctx.model.queries.get(qid);
    let mut seed: Seed = FxHashMap::default();
    if let Some(main) = q.main {
        seed.insert(intern("$self"), (main, Scope::SelfAlias, intern("self")));
        seed.insert(intern("$projection"), (main, Scope::SelfAlias, intern("self")));
    }
    let aliases: Vec<(IStr, TableAliasSource)> = q
        .table_aliases
        .iter()
        .map(|(k, v)| (k.clone(), v.source.clone()))
        .collect();
    for (name, source) in &aliases {
        if let TableAliasSource::Path(pr) = source {
            if let Some(art) = ctx.model.pathrefs.get(*pr).art {
                seed.entry(name.clone()).or_insert((art, Scope::Alias, intern("alias")));
            }
        }
    }
    let mixins: Vec<(IStr, crate::model::NodeId)> =
        q.mixins.iter().map(|(k, v)| (k.clone(), *v)).collect();
    for (name, mixin_id) in mixins {
        seed.entry(name).or_insert((mixin_id, Scope::Mixin, intern("mixin")));
    }
    for (_, source) in &aliases {
        for (name, node_id) in elements_of_source(ctx, source) {
            seed.entry(name).or_insert((node_id, Scope::Source, intern("source")));
        }
    }
    seed
}

/// `order by`'s lexical search starts at the current query (its column
/// aliases), falling through to the same combined elements.
fn build_order_by_seed(ctx: &Ctx<'_>, qid: QueryId) -> Seed {
    let mut seed = build_query_seed(ctx, qid);
    let columns: Vec<(IStr, crate::model::NodeId)> = ctx
        .model
        .queries
        .get(qid)
        .columns
        .iter()
        .flatten()
        .filter_map(|c| {
            let alias = c.alias.clone()?;
            let art = ctx.model.pathrefs.get(c.expr?).art?;
            Some((alias, art))
        })
        .collect();
    for (alias, art) in columns {
        seed.insert(alias, (art, Scope::Query, intern("column")));
    }
    seed
}

fn resolve_body(ctx: &mut Ctx<'_>, qid: QueryId) {
    let seed = build_query_seed(&*ctx, qid);

    let column_exprs: Vec<crate::model::PathRefId> = ctx
        .model
        .queries
        .get(qid)
        .columns
        .iter()
        .flatten()
        .filter_map(|c| c.expr)
        .collect();
    for pr in column_exprs {
        path::resolve_with_seed(ctx, pr, &seed);
    }

    if let Some(w) = ctx.model.queries.get(qid).where_ {
        path::resolve_with_seed(ctx, w, &seed);
    }
    let group_by: Vec<_> = ctx.model.queries.get(qid).group_by.clone();
    for pr in group_by {
        path::resolve_with_seed(ctx, pr, &seed);
    }
    if let Some(h) = ctx.model.queries.get(qid).having {
        path::resolve_with_seed(ctx, h, &seed);
    }

    let order_seed = if ctx.model.queries.get(qid).kind == QueryKind::Set {
        let lead = ctx.model.queries.get(qid).leading_query;
        match lead {
            Some(lead) => build_order_by_seed(&*ctx, lead),
            None => seed.clone(),
        }
    } else {
        build_order_by_seed(&*ctx, qid)
    };
    let order_by: Vec<_> = ctx.model.queries.get(qid).order_by.iter().map(|o| o.expr).collect();
    for pr in order_by {
        path::resolve_with_seed(ctx, pr, &order_seed);
    }

    let mixin_ons: Vec<crate::model::PathRefId> = ctx
        .model
        .queries
        .get(qid)
        .mixins
        .values()
        .filter_map(|&mixin_id| ctx.model.nodes.get(mixin_id).on_condition)
        .collect();
    for pr in mixin_ons {
        path::resolve_with_seed(ctx, pr, &seed);
    }
}
