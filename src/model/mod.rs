//! The augmented CSN: arenas of artifacts/members, extensions, queries,
//! path references, sources, and layers, plus the non-enumerable link side
//! tables that make the graph between them navigable.

mod csn;
mod dict;
mod enriched;
mod extension;
mod ids;
mod layer;
mod links;
mod node;
mod pathref;
mod query;
mod source;

pub use dict::{Insertion, OrderedDict};
pub use enriched::EnrichedIndex;
pub use extension::{Extension, ExtensionKind, PendingMember, PendingSubArtifact};
pub use ids::{Arena, ArenaId, ExtensionId, LayerId, NodeId, PathRefId, QueryId, SourceId};
pub use layer::Layer;
pub use links::Links;
pub use node::{ArtifactKind, AssocKind, Kind, MemberKind, Name, Node, TypeParams, TypeRef};
pub use pathref::{Link, PathItem, PathRef, ReferenceContext, Scope};
pub use query::{
    ColumnItem, JoinClause, JoinKind, OrderByItem, QueryKind, QueryNode, SetOp, SortDirection,
    TableAlias, TableAliasSource,
};
pub use source::{I18nBlock, Source, SourceMember, UsingDirective};

use crate::core::IStr;

/// The compiler's single, in-place-mutated model value ("Shared state").
/// Owns every arena; everything that points between
/// arenas does so by id, never by reference, so the model has no lifetime
/// parameter and no internal cycles of Rust ownership.
#[derive(Debug, Default)]
pub struct Model {
    pub nodes: Arena<NodeId, Node>,
    pub extensions: Arena<ExtensionId, Extension>,
    pub queries: Arena<QueryId, QueryNode>,
    pub pathrefs: Arena<PathRefId, PathRef>,
    pub sources: Arena<SourceId, Source>,
    pub layers: Arena<LayerId, Layer>,
    /// absolute name -> top-level artifact, with duplicate tracking
    /// (absolute names are unique across the model).
    pub definitions: OrderedDict<IStr, NodeId>,
    pub links: Links,
    /// Extensions queued per absolute target name, in encounter order —
    /// the substrate for `add`'s "records extensions in a per-target list".
    pub extensions_by_target: rustc_hash::FxHashMap<IStr, Vec<ExtensionId>>,
    /// Merged per-locale translation bundles, populated once after
    /// ingestion.
    pub i18n: rustc_hash::FxHashMap<IStr, Vec<(IStr, IStr)>>,
    /// `$recompile`: set by [`crate::recompile`] so derived-artefact
    /// generation can treat already-generated texts/aspect entities as
    /// up to date rather than regenerating them from scratch.
    pub recompile: bool,
    /// Materialised `$path`/`$scope`, built by [`crate::enrich::attach`] and
    /// cleared by [`crate::enrich::cleanup`]. Empty until a caller attaches.
    pub enriched: EnrichedIndex,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes.get_mut(id)
    }

    /// Chases `_parent` to the enclosing top-level artifact: for every
    /// member `m`, `m._main` equals the artifact with no `_parent`.
    pub fn main_of(&self, id: NodeId) -> NodeId {
        self.links.main.get(&id).copied().unwrap_or(id)
    }

    pub fn is_duplicate_definition(&self, name: &IStr) -> bool {
        self.definitions.has_duplicates(name)
    }
}
