//! Input shapes the ingestor accepts: a pre-parsed CDL source AST, or a CSN
//! document. Neither variant is produced by this crate — the lexer/grammar
//! for CDL source is out of scope here; the engine only ever consumes what
//! a caller-supplied loader/parser hands it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{ArtifactKind, AssocKind, MemberKind};

/// One input file, already parsed by the caller.
#[derive(Debug, Clone)]
pub enum SourceInput {
    Cdl(CdlAst),
    Csn(Value),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CdlAst {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub usings: Vec<UsingDecl>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactDecl>,
    #[serde(default)]
    pub extensions: Vec<ExtensionDecl>,
    #[serde(default)]
    pub vocabularies: Vec<ArtifactDecl>,
    #[serde(default)]
    pub i18n: Vec<I18nEntryDecl>,
    /// Set by the ingestor when the upstream parser could not produce a
    /// recognizable AST: the source is kept, just without a `kind`.
    #[serde(default)]
    pub parse_failed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsingDecl {
    pub local_name: String,
    pub from: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct I18nEntryDecl {
    pub locale: String,
    pub key: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKindDecl {
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

impl From<ArtifactKindDecl> for ArtifactKind {
    fn from(value: ArtifactKindDecl) -> Self {
        match value {
            ArtifactKindDecl::Namespace => ArtifactKind::Namespace,
            ArtifactKindDecl::Context => ArtifactKind::Context,
            ArtifactKindDecl::Service => ArtifactKind::Service,
            ArtifactKindDecl::Entity => ArtifactKind::Entity,
            ArtifactKindDecl::Type => ArtifactKind::Type,
            ArtifactKindDecl::Aspect => ArtifactKind::Aspect,
            ArtifactKindDecl::Event => ArtifactKind::Event,
            ArtifactKindDecl::Action => ArtifactKind::Action,
            ArtifactKindDecl::Function => ArtifactKind::Function,
            ArtifactKindDecl::Annotation => ArtifactKind::Annotation,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactDecl {
    /// Dotted absolute-ish name as written (`A.B.C`); the ingestor
    /// synthesizes path-prefix `using` entries from it.
    pub name: String,
    pub kind: Option<ArtifactKindDecl>,
    #[serde(default)]
    pub elements: Vec<ElementDecl>,
    #[serde(default)]
    pub actions: Vec<ElementDecl>,
    #[serde(default)]
    pub includes: Vec<String>,
    pub type_ref: Option<String>,
    pub target: Option<String>,
    #[serde(default)]
    pub annotations: Vec<(String, Value)>,
    pub query: Option<QueryDecl>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementDecl {
    pub name: String,
    pub member_kind: Option<MemberKindDecl>,
    pub type_ref: Option<String>,
    pub target: Option<String>,
    pub assoc_kind: Option<AssocKindDecl>,
    #[serde(default)]
    pub key: bool,
    #[serde(default)]
    pub localized: bool,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub is_many: bool,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub default_value: Option<Value>,
    #[serde(default)]
    pub foreign_keys: Vec<String>,
    pub on_condition: Option<ExprDecl>,
    #[serde(default)]
    pub annotations: Vec<(String, Value)>,
    /// Present when the element's target is an inline aspect with its own
    /// elements — triggers aspect-composition target generation.
    pub inline_aspect: Option<Box<ArtifactDecl>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberKindDecl {
    Element,
    EnumValue,
    Action,
    Function,
    Param,
    Returns,
    Mixin,
}

impl From<MemberKindDecl> for MemberKind {
    fn from(value: MemberKindDecl) -> Self {
        match value {
            MemberKindDecl::Element => MemberKind::Element,
            MemberKindDecl::EnumValue => MemberKind::EnumValue,
            MemberKindDecl::Action => MemberKind::Action,
            MemberKindDecl::Function => MemberKind::Function,
            MemberKindDecl::Param => MemberKind::Param,
            MemberKindDecl::Returns => MemberKind::Returns,
            MemberKindDecl::Mixin => MemberKind::Mixin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssocKindDecl {
    Association,
    Composition,
}

impl From<AssocKindDecl> for AssocKind {
    fn from(value: AssocKindDecl) -> Self {
        match value {
            AssocKindDecl::Association => AssocKind::Association,
            AssocKindDecl::Composition => AssocKind::Composition,
        }
    }
}

/// A raw path expression, as written: a dotted/step list plus an optional
/// filter — the minimal shape [`crate::resolve`] needs to build a
/// [`crate::model::PathRef`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExprDecl {
    pub steps: Vec<StepDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDecl {
    pub id: String,
    pub filter: Option<Box<ExprDecl>>,
    #[serde(default)]
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryDecl {
    pub from: FromDecl,
    /// `None` means no explicit column list (`SELECT from Books`); `Some`
    /// with no star entries means an explicit, non-`*` projection.
    pub columns: Option<Vec<ColumnDecl>>,
    pub where_: Option<ExprDecl>,
    #[serde(default)]
    pub group_by: Vec<ExprDecl>,
    pub having: Option<ExprDecl>,
    #[serde(default)]
    pub order_by: Vec<(ExprDecl, bool)>,
    pub limit: Option<u64>,
    #[serde(default)]
    pub mixins: Vec<ElementDecl>,
    #[serde(default)]
    pub set_args: Vec<QueryDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FromDecl {
    Path {
        steps: Vec<StepDecl>,
        alias: Option<String>,
    },
    Subquery {
        query: Box<QueryDecl>,
        alias: String,
    },
    Join {
        kind: JoinKindDecl,
        left: Box<FromDecl>,
        right: Box<FromDecl>,
        on: Option<ExprDecl>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKindDecl {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl From<JoinKindDecl> for crate::model::JoinKind {
    fn from(value: JoinKindDecl) -> Self {
        match value {
            JoinKindDecl::Inner => crate::model::JoinKind::Inner,
            JoinKindDecl::Left => crate::model::JoinKind::Left,
            JoinKindDecl::Right => crate::model::JoinKind::Right,
            JoinKindDecl::Full => crate::model::JoinKind::Full,
            JoinKindDecl::Cross => crate::model::JoinKind::Cross,
        }
    }
}

impl Default for FromDecl {
    fn default() -> Self {
        FromDecl::Path {
            steps: Vec::new(),
            alias: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDecl {
    pub star: bool,
    #[serde(default)]
    pub excluding: Vec<String>,
    pub expr: Option<ExprDecl>,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionDecl {
    pub annotate: bool,
    pub target: String,
    #[serde(default)]
    pub new_elements: Vec<ElementDecl>,
    #[serde(default)]
    pub new_actions: Vec<ElementDecl>,
    #[serde(default)]
    pub annotations: Vec<(String, Value)>,
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub includes: Vec<String>,
}
