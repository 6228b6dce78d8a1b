//! I18n blocks are deferred to a merge pass that compares values across
//! layer order and emits a diagnostic on conflicts, keeping the value from
//! the lowest layer.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::base::{FileId, Span};
use crate::core::IStr;
use crate::ctx::Ctx;
use crate::diag::{Message, codes};
use crate::model::I18nBlock;

/// One (locale, key) -> (text, layer rank, source file) seen while merging.
struct Seen {
    text: IStr,
    layer_rank: u32,
    file: FileId,
}

/// Merges every source's `i18n` block into one per-locale bundle, keeping
/// the lowest layer's value on conflict and emitting `i18n-different-value`
/// for the rest.
pub fn merge(ctx: &mut Ctx<'_>) -> FxHashMap<IStr, Vec<(IStr, IStr)>> {
    let mut seen: FxHashMap<(IStr, IStr), Seen> = FxHashMap::default();
    let mut order: Vec<(IStr, IStr)> = Vec::new();

    for source_id in ctx.model.sources.ids() {
        let (blocks, layer_rank) = {
            let source = ctx.model.sources.get(source_id);
            let rank = source
                .layer
                .map(|l| ctx.model.layers.get(l).rank)
                .unwrap_or(0);
            (source.i18n.clone(), rank)
        };
        let Some(block) = blocks else { continue };
        for (locale, entries) in &block.bundles {
            for (key, text) in entries {
                let dict_key = (locale.clone(), key.clone());
                match seen.get_mut(&dict_key) {
                    None => {
                        order.push(dict_key.clone());
                        seen.insert(
                            dict_key,
                            Seen {
                                text: text.clone(),
                                layer_rank,
                                file: FileId::SYNTHETIC,
                            },
                        );
                    }
                    Some(existing) => {
                        if existing.text != *text {
                            if layer_rank < existing.layer_rank {
                                existing.text = text.clone();
                                existing.layer_rank = layer_rank;
                            }
                            ctx.messages.push(Message::warning(
                                codes::I18N_DIFFERENT_VALUE,
                                existing.file,
                                Span::point(crate::base::Position::new(0, 0)),
                                format!(
                                    "different value for '{key}' in locale '{locale}': keeping the lowest layer's translation"
                                ),
                            ));
                        }
                    }
                }
            }
        }
    }

    let mut by_locale: FxHashMap<IStr, Vec<(IStr, IStr)>> = FxHashMap::default();
    for (locale, key) in order {
        let text = seen[&(locale.clone(), key.clone())].text.clone();
        by_locale.entry(locale).or_default().push((key, text));
    }
    by_locale
}

pub fn intern(s: &str) -> IStr {
    Rc::from(s)
}
