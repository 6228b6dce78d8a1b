//! `extend`/`annotate` directives (the "Extension" entity).

use serde_json::Value;

use crate::core::IStr;
use crate::model::ids::{NodeId, SourceId};
use crate::model::node::{ArtifactKind, Kind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionKind {
    Extend,
    Annotate,
}

/// A pending new element/action to splice into the target once the
/// extension is applied.
#[derive(Debug, Clone)]
pub struct PendingMember {
    pub name: IStr,
    pub kind: crate::model::node::MemberKind,
    pub annotations: Vec<(IStr, Value)>,
}

/// One `extend X with { .. }` / `annotate X with @(..)` directive.
///
/// Applied at most once per applicable artifact —
/// `applied` records the target once [`crate::definer::extend`] has spliced
/// this extension in, so a second attempt (e.g. in the cyclic-include
/// final pass) is a no-op.
#[derive(Debug, Clone)]
pub struct Extension {
    pub kind: ExtensionKind,
    pub target_path: IStr,
    pub block: SourceId,
    pub expected_kind: Option<Kind>,
    pub new_members: Vec<PendingMember>,
    pub annotations: Vec<(IStr, Value)>,
    /// `extend projection with columns { .. }` — only legal on a query
    /// artifact.
    pub columns: Option<Vec<IStr>>,
    pub includes: Vec<IStr>,
    pub applied: Option<NodeId>,
}

impl Extension {
    pub fn new(kind: ExtensionKind, target_path: IStr, block: SourceId) -> Self {
        Self {
            kind,
            target_path,
            block,
            expected_kind: None,
            new_members: Vec::new(),
            annotations: Vec::new(),
            columns: None,
            includes: Vec::new(),
            applied: None,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.applied.is_some()
    }

    /// `extend` of a query entity is only legal when it adds actions, not
    /// elements.
    pub fn adds_only_actions(&self) -> bool {
        self.new_members
            .iter()
            .all(|m| matches!(m.kind, crate::model::node::MemberKind::Action))
    }
}

/// `extend context|service` can introduce entirely new sub-artifacts, which
/// must be visible to pass 2 of extension application.
#[derive(Debug, Clone)]
pub struct PendingSubArtifact {
    pub name: IStr,
    pub kind: ArtifactKind,
}
