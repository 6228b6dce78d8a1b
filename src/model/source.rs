//! One ingested file or CSN document ("Source").

use crate::core::IStr;
use crate::model::dict::OrderedDict;
use crate::model::ids::{LayerId, NodeId, SourceId};

/// A `using X from './y'` (or `using { A, B } from ...`) directive; the
/// layer graph draws one edge per directive.
#[derive(Debug, Clone)]
pub struct UsingDirective {
    pub local_name: IStr,
    pub from: IStr,
    pub target_source: Option<SourceId>,
}

/// Either a locally defined artifact, or an alias introduced by a `using`.
#[derive(Debug, Clone)]
pub enum SourceMember {
    Artifact(NodeId),
    Using(usize),
}

#[derive(Debug, Clone, Default)]
pub struct I18nBlock {
    /// locale -> (key -> text)
    pub bundles: Vec<(IStr, Vec<(IStr, IStr)>)>,
}

/// One ingested source. `kind` is always `'source'`; there is no separate
/// Rust type for that literal field because nothing else can occupy a
/// `Sources` dictionary slot.
#[derive(Debug, Clone)]
pub struct Source {
    pub namespace: Option<IStr>,
    /// local name -> artifact or using-alias.
    pub members: OrderedDict<IStr, SourceMember>,
    pub usings: Vec<UsingDirective>,
    /// Path-prefix aliases synthesized from dotted artifact names (e.g. a
    /// declared `A.B.C` makes `A` locally addressable).
    /// These are *not* `using from` edges: they carry no file dependency
    /// and do not participate in the layer graph.
    pub local_prefixes: Vec<IStr>,
    pub i18n: Option<I18nBlock>,
    pub layer: Option<LayerId>,
    /// `true` if the upstream parser failed and this source carries no
    /// recognizable `kind` beyond the synthetic `'source'` stub.
    pub parse_failed: bool,
}

impl Source {
    pub fn new() -> Self {
        Self {
            namespace: None,
            members: OrderedDict::new(),
            usings: Vec::new(),
            local_prefixes: Vec::new(),
            i18n: None,
            layer: None,
            parse_failed: false,
        }
    }
}

impl Default for Source {
    fn default() -> Self {
        Self::new()
    }
}
