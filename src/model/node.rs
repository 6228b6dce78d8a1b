//! Artifacts and members.
//!
//! Named definitions (`Artifact`) and their elements/actions (`Member`)
//! share most of their shape, so both are unified into one [`Node`] arena
//! with a [`Kind`] discriminant rather than kept as two separate arenas.

use serde_json::Value;

use crate::core::IStr;
use crate::model::dict::OrderedDict;
use crate::model::ids::{NodeId, PathRefId, QueryId};

/// Top-level artifact variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Namespace,
    Context,
    Service,
    Entity,
    Type,
    Aspect,
    Event,
    Action,
    Function,
    Annotation,
}

/// Member variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Element,
    EnumValue,
    Action,
    Function,
    Param,
    Returns,
    Mixin,
    TableAlias,
    SelfAlias,
    ParametersAlias,
    Join,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Artifact(ArtifactKind),
    Member(MemberKind),
}

impl Kind {
    pub fn is_member(self) -> bool {
        matches!(self, Kind::Member(_))
    }

    pub fn is_artifact(self) -> bool {
        matches!(self, Kind::Artifact(_))
    }

    /// Query-bearing artifact kinds: `entity` (as projection) and `service`
    /// never carry a query themselves, but an `entity` defined `as select
    /// from` does.
    pub fn can_carry_query(self) -> bool {
        matches!(self, Kind::Artifact(ArtifactKind::Entity))
    }
}

/// A dotted name: the absolute name every artifact/member carries, plus —
/// for members only — the dotted path within the owning artifact
/// (`name.component`).
#[derive(Debug, Clone)]
pub struct Name {
    pub absolute: IStr,
    pub component: Option<IStr>,
}

impl Name {
    pub fn artifact(absolute: IStr) -> Self {
        Self {
            absolute,
            component: None,
        }
    }

    pub fn member(absolute: IStr, component: IStr) -> Self {
        Self {
            absolute,
            component: Some(component),
        }
    }
}

/// Declared length/precision/scale, relevant to `String`/`Decimal`-typed
/// elements (used by the texts-entity generator for the `locale` element).
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeParams {
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

/// A reference to the target type of an element/parameter: either a plain
/// `type`/`target`, or — after sub-phase 2 normalises it — a `targetAspect`
/// when the target name denotes an aspect or type rather than an entity.
#[derive(Debug, Clone, Copy)]
pub enum TypeRef {
    Type(PathRefId),
    Target(PathRefId),
    TargetAspect(PathRefId),
    /// An inline `{ .. }` aspect written directly at the element's target
    /// position. Already "resolved" at ingest time — there is no name to
    /// look up — so this bypasses [`crate::resolve`] entirely and points
    /// straight at the anonymous aspect [`crate::model::Node`] the
    /// ingestor created for it.
    InlineAspect(NodeId),
}

/// One artifact or member. Shared shape; kind-specific
/// behaviour is read off `kind`.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: Name,
    pub kind: Kind,
    /// `$inferred`: true for derived/generated artifacts and members copied
    /// down an `_origin` chain.
    pub inferred: bool,
    pub elements: OrderedDict<IStr, NodeId>,
    pub actions: OrderedDict<IStr, NodeId>,
    pub params: OrderedDict<IStr, NodeId>,
    pub enum_values: OrderedDict<IStr, NodeId>,
    pub annotations: OrderedDict<IStr, Value>,
    pub type_ref: Option<TypeRef>,
    pub includes: Vec<PathRefId>,
    pub query: Option<QueryId>,
    pub returns: Option<NodeId>,
    pub type_params: TypeParams,
    pub key: bool,
    pub masked: bool,
    pub not_null: bool,
    pub is_many: bool,
    /// The `localized` modifier (the texts-entity generator's trigger).
    pub localized: bool,
    /// `Composition`/`Association of` cardinality marker; `None` for plain
    /// elements.
    pub assoc_kind: Option<AssocKind>,
    pub on_condition: Option<PathRefId>,
    pub foreign_keys: Vec<IStr>,
    pub default_value: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssocKind {
    Association,
    Composition,
}

impl Node {
    pub fn new_artifact(absolute: IStr, kind: ArtifactKind) -> Self {
        Self {
            name: Name::artifact(absolute),
            kind: Kind::Artifact(kind),
            inferred: false,
            elements: OrderedDict::new(),
            actions: OrderedDict::new(),
            params: OrderedDict::new(),
            enum_values: OrderedDict::new(),
            annotations: OrderedDict::new(),
            type_ref: None,
            includes: Vec::new(),
            query: None,
            returns: None,
            type_params: TypeParams::default(),
            key: false,
            masked: false,
            not_null: false,
            is_many: false,
            localized: false,
            assoc_kind: None,
            on_condition: None,
            foreign_keys: Vec::new(),
            default_value: None,
        }
    }

    pub fn new_member(absolute: IStr, component: IStr, kind: MemberKind) -> Self {
        Self {
            name: Name::member(absolute, component),
            kind: Kind::Member(kind),
            ..Self::new_artifact(absolute, ArtifactKind::Type)
        }
    }

    pub fn artifact_kind(&self) -> Option<ArtifactKind> {
        match self.kind {
            Kind::Artifact(k) => Some(k),
            Kind::Member(_) => None,
        }
    }

    pub fn member_kind(&self) -> Option<MemberKind> {
        match self.kind {
            Kind::Member(k) => Some(k),
            Kind::Artifact(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_constructor_sets_member_kind_and_overrides_the_shared_defaults() {
        let absolute: IStr = std::rc::Rc::from("Books.title");
        let component: IStr = std::rc::Rc::from("title");
        let node = Node::new_member(absolute, component, MemberKind::Element);
        assert!(node.kind.is_member());
        assert_eq!(node.name.component.as_deref(), Some("title"));
    }
}
