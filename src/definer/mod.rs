//! Sub-phases that run after ingestion but outside resolution proper:
//! extension application, derived-artefact generation, and flag
//! propagation down `_ancestors`/`_origin` chains.
//!
//! The `add`/`init` sub-phases here are mostly folded
//! into [`crate::ingest`] already (back-links, global-dict insertion,
//! reserved-namespace refusal, unchecked target text) — what's left here is
//! the part that genuinely can't run until targets are nameable: splicing
//! extensions in, and the entity generators that read resolved types.

pub mod derive_aspect;
pub mod derive_texts;
pub mod extend;
pub mod propagate;

fn synthetic_span() -> crate::base::Span {
    crate::base::Span::point(crate::base::Position::new(0, 0))
}
