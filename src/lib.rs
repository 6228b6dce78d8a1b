//! # cdsc
//!
//! Compiler for a schema-and-service modelling language (CDL) that produces
//! a canonical JSON model (CSN), plus the CSN reference inspector every
//! downstream consumer uses to navigate and classify references.
//!
//! ## Module structure (dependency order)
//!
//! ```text
//! ide        → editor probe (complete / find / lint)
//! auth, refs → thin consumers of the inspector API
//! inspect    → CSN reference inspector (read-only, cached)
//! enrich     → non-enumerable back-reference attach/cleanup
//! check      → structural / cardinality / name-clash checks
//! resolve    → reference-context resolution state machine
//! definer    → add/init sub-phases, extension applicator, derived artefacts
//! layer      → source dependency graph, SCC, rank
//! ingest     → source ingestor, file cache, wave scheduler
//! model      → arena-based Artifact/Member/Extension/Query/PathRef/Source/Layer
//! diag       → message sink, stable message ids
//! core       → string interner
//! base       → FileId, Position/Span, reserved-namespace constants
//! ```

pub mod base;
pub mod core;
mod ctx;
pub mod diag;
pub mod model;

pub use ctx::Ctx;

pub mod ingest;
pub mod layer;

pub mod definer;
pub mod resolve;

pub mod check;
pub mod enrich;
pub mod inspect;

pub mod auth;
pub mod refs;

pub mod ide;

mod compile;

pub use compile::{
    CompileError, CompileOptions, DeprecatedFlags, FallbackParser, compile, compile_sources,
    compile_sync, recompile,
};
pub use model::Model;
