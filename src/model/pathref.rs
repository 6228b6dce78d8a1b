//! Path references and the reference contexts that select their
//! resolution semantics.

use serde_json::Value;

use crate::core::IStr;
use crate::model::ids::{NodeId, PathRefId, QueryId};

/// One step of a `ref` array: a name, plus optional filter/arguments/
/// continuation.
#[derive(Debug, Clone)]
pub struct PathItem {
    pub id: IStr,
    /// `where` filter attached to this step (`books[where: price > 10]`).
    pub filter: Option<PathRefId>,
    pub args: Vec<Value>,
    pub expand: Option<Vec<crate::model::query::ColumnItem>>,
    pub inline: Option<Vec<crate::model::query::ColumnItem>>,
}

impl PathItem {
    pub fn simple(id: IStr) -> Self {
        Self {
            id,
            filter: None,
            args: Vec::new(),
            expand: None,
            inline: None,
        }
    }
}

/// `$scope` — where a resolved path's first step was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Param,
    Parent,
    Target,
    Magic,
    SelfAlias,
    Mixin,
    Alias,
    Source,
    Query,
    RefTarget,
    Expand,
    Inline,
}

/// The canonical string key selecting name-resolution semantics for a path
/// ("reference context").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceContext {
    Type,
    Includes,
    Target,
    TargetAspect,
    From,
    Keys,
    Excluding,
    Expand,
    Inline,
    RefWhere,
    OnMixinAssoc,
    OrderBy,
    OrderBySet,
    /// Everything else: combined source elements of the current query.
    Default,
}

impl ReferenceContext {
    /// `true` if lexical search (table aliases/mixins/`$`-names) starts
    /// before the dynamic environment is tried for this context.
    pub fn has_lexical_start(self) -> bool {
        !matches!(
            self,
            ReferenceContext::Type
                | ReferenceContext::Includes
                | ReferenceContext::Target
                | ReferenceContext::TargetAspect
                | ReferenceContext::From
                | ReferenceContext::Keys
                | ReferenceContext::Excluding
        )
    }

    /// `true` if only `$`-prefixed magic names are searched lexically
    /// before falling through to the dynamic environment (as opposed to the
    /// full table-alias/mixin chain).
    pub fn dollar_names_only(self) -> bool {
        matches!(
            self,
            ReferenceContext::Expand
                | ReferenceContext::Inline
                | ReferenceContext::RefWhere
                | ReferenceContext::OnMixinAssoc
        )
    }
}

/// A resolved per-step link: the artifact/member reached by that step, and
/// the environment it was found in (used for editor "go to definition" on
/// any path segment, not just the terminal one).
#[derive(Debug, Clone)]
pub struct Link {
    pub art: NodeId,
    pub env_description: IStr,
}

/// One `ref` array plus everything attached to it once resolved:
/// `_links` (one per step), `_art` (terminal), `$scope`, `$env`.
#[derive(Debug, Clone)]
pub struct PathRef {
    pub items: Vec<PathItem>,
    pub context: ReferenceContext,
    /// The query this path lexically belongs to, used to seed environment
    /// search (table aliases, mixins, `_$next` chain). `None` for refs in
    /// `type`/`target`/`includes` position, which search global
    /// definitions directly.
    pub owning_query: Option<QueryId>,
    pub links: Vec<Option<Link>>,
    pub art: Option<NodeId>,
    pub scope: Option<Scope>,
    pub env: Option<IStr>,
    /// Set when resolution failed; the message is recorded in the sink
    /// separately, this just marks the path so `_links.len() ==
    /// path.len()` is known to not hold.
    pub error: bool,
}

impl PathRef {
    pub fn new(items: Vec<PathItem>, context: ReferenceContext) -> Self {
        let len = items.len();
        Self {
            items,
            context,
            owning_query: None,
            links: vec![None; len],
            art: None,
            scope: None,
            env: None,
            error: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.error && self.art.is_some() && self.links.iter().all(Option::is_some)
    }

    pub fn dotted(&self) -> String {
        self.items
            .iter()
            .map(|item| item.id.as_ref())
            .collect::<Vec<_>>()
            .join(".")
    }
}
