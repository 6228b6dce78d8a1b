//! Materialised `$path`/`$scope` side tables, built on demand by
//! [`crate::enrich::attach`] for tooling that wants them precomputed rather
//! than derived per query. Unlike [`crate::model::Links`] (populated once
//! during compilation and never cleared), this index is explicitly
//! attach/cleanup-able — the crate has no Salsa-style invalidation, so a
//! caller who mutates the model after attaching is responsible for calling
//! [`crate::enrich::cleanup`] and re-attaching.

use rustc_hash::FxHashMap;

use crate::core::IStr;
use crate::model::ids::NodeId;
use crate::model::pathref::Scope;

#[derive(Debug, Default)]
pub struct EnrichedIndex {
    /// JSON-pointer-style path from the CSN document root, e.g.
    /// `/definitions/Books/elements/title`.
    pub path: FxHashMap<NodeId, IStr>,
    /// Lexical scope a node's own name search would start from: `Global`
    /// for top-level artifacts, `Source` for ordinary members.
    pub scope: FxHashMap<NodeId, Scope>,
}

impl EnrichedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.path.clear();
        self.scope.clear();
    }
}
