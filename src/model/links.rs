//! Non-enumerable back-reference side tables.
//!
//! `_parent`/`_main`/`_service`/`_ancestors`/`_subArtifacts`/`_block`/
//! `_origin` never live as fields on [`crate::model::Node`] itself — they
//! live here, indexed by [`NodeId`]/[`SourceId`], so that projecting
//! canonical CSN is "serialize the arenas' public fields" rather than
//! "recursively skip underscore-prefixed keys".

use rustc_hash::{FxHashMap, FxHashSet};

use crate::model::ids::{NodeId, SourceId};

#[derive(Debug, Default)]
pub struct Links {
    pub parent: FxHashMap<NodeId, NodeId>,
    pub main: FxHashMap<NodeId, NodeId>,
    pub service: FxHashMap<NodeId, NodeId>,
    pub ancestors: FxHashMap<NodeId, Vec<NodeId>>,
    pub sub_artifacts: FxHashMap<NodeId, Vec<NodeId>>,
    pub block: FxHashMap<NodeId, SourceId>,
    pub origin: FxHashMap<NodeId, NodeId>,
    /// Global set of composition-target entities, populated by the
    /// propagator.
    pub composition_targets: FxHashSet<NodeId>,
}

impl Links {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chases `_parent` until reaching a node with none.
    pub fn top_level_ancestor(&self, mut node: NodeId) -> NodeId {
        while let Some(&parent) = self.parent.get(&node) {
            node = parent;
        }
        node
    }
}
