//! External entry points: the four ways a caller hands this crate sources
//! and gets back a [`Model`] or a fatal [`CompileError`].
//!
//! Every phase past ingestion appends to the message sink rather than
//! returning early — a `Result::Err` here
//! means invocation-level failure (nothing could be loaded) or the
//! accumulated diagnostics crossed the fatal threshold, never a single bad
//! reference.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::base::FileTable;
use crate::ctx::Ctx;
use crate::diag::{Message, MessageSink};
use crate::ingest::{self, CancelToken, FileCache, LoadError, SourceInput, SourceLoader};
use crate::model::Model;

/// Whether the legacy, non-`async`-grammar fallback parser may be invoked
/// for a source the primary parser rejects (`fallbackParser`).
/// The parser itself is out of scope; this only threads the caller's choice
/// through to whichever [`SourceLoader`] they supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FallbackParser {
    #[default]
    Disabled,
    Enabled,
}

/// Legacy shape toggles: kept as booleans the way
/// `deprecated.*` flags are kept in real compiler configs, defaulting to
/// `false` (the modern shape) everywhere.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DeprecatedFlags {
    /// Generates `Books_texts` instead of `Books.texts` for the texts
    /// entity.
    pub generated_entity_name_with_underscore: bool,
    /// Places the up-link element of an aspect-composition target entity
    /// outside its key (legacy shape), instead of including it in the key.
    pub unmanaged_up_in_component: bool,
}

/// Configuration for [`compile`]/[`compile_sync`]/[`compile_sources`]/
/// [`recompile`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Stop after ingestion + layer assignment; skip definer/resolve/check.
    pub parse_only: bool,
    /// Downgrade selected errors to warnings for editor use.
    pub lint_mode: bool,
    /// Accept `.cds` input at all (vs. CSN-only mode).
    pub parse_cdl: bool,
    pub fallback_parser: FallbackParser,
    /// Opt-in experimental feature names, checked by name where relevant.
    pub beta: Vec<String>,
    pub deprecated: DeprecatedFlags,
    /// Relaxes fatal-threshold checks for test fixtures that intentionally
    /// carry errors.
    pub test_mode: bool,
    /// Set internally by [`recompile`]; not meant to be set directly by
    /// callers of [`compile`]/[`compile_sources`].
    #[serde(skip)]
    pub recompile: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("compilation failed with {} error(s)", .0.len())]
    Fatal(Vec<Message>),
    #[error("cancelled")]
    Cancelled,
    #[error("failed to load '{path}': {source}")]
    Load {
        path: String,
        #[source]
        source: LoadError,
    },
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Runs every phase after ingestion: using-edge linking, layer assignment,
/// extension application, reference resolution, derived-artefact
/// generation, propagation, structural checks, and (unless `parse_only`)
/// the enrichment caches consumers read from.
fn run_pipeline(ctx: &mut Ctx<'_>, by_path: &IndexMap<String, crate::model::SourceId>) {
    crate::layer::link_usings(ctx, by_path, |from, _here| from.to_string());
    crate::layer::build(ctx, by_path);

    if ctx.options.parse_only {
        return;
    }

    crate::definer::extend::apply(ctx);
    crate::resolve::run(ctx);
    crate::definer::derive_texts::run(ctx);
    crate::definer::derive_aspect::run(ctx);
    crate::resolve::run(ctx);

    // lintMode: skip final checks and propagation so an editor
    // can show a best-effort model for sources with unresolved references.
    if !ctx.options.lint_mode {
        crate::definer::propagate::run(ctx);
        crate::check::run(ctx);
    }
    crate::enrich::attach(ctx.model);

    ctx.model.i18n = ingest::merge_i18n(ctx);
}

fn finish(model: Model, messages: MessageSink, options: &CompileOptions) -> Result<Model, CompileError> {
    let mut messages = messages;
    if options.test_mode {
        return Ok(model);
    }
    match messages.check_fatal() {
        Ok(()) => Ok(model),
        Err(errors) => Err(CompileError::Fatal(errors)),
    }
}

/// Reads `files` (and everything they transitively `using from`) through
/// `loader`, parallelising the reads via `ingest`'s wave scheduler, then
/// runs the full pipeline.
pub fn compile(
    files: Vec<PathBuf>,
    _base_dir: &Path,
    options: CompileOptions,
    _cache: &mut FileCache,
    loader: &dyn SourceLoader,
) -> Result<Model, CompileError> {
    let cancel = CancelToken::new();
    let wave = ingest::load_waves(
        files,
        loader,
        |input| using_from_targets(input),
        &cancel,
    );
    if wave.cancelled {
        return Err(CompileError::Cancelled);
    }
    if let Some((path, err)) = wave.errors.into_iter().next() {
        return Err(CompileError::Load {
            path: path_key(&path),
            source: err,
        });
    }

    let mut model = Model::new();
    let mut messages = MessageSink::new();
    let mut file_table = FileTable::new();
    let inputs: IndexMap<String, SourceInput> = wave
        .sources
        .into_iter()
        .map(|(path, input)| (path_key(&path), input))
        .collect();
    {
        let mut ctx = Ctx::new(&mut model, &mut messages, &mut file_table, &options);
        let by_path = ingest::ingest(&mut ctx, inputs);
        run_pipeline(&mut ctx, &by_path);
    }
    finish(model, messages, &options)
}

/// Same as [`compile`], but reads every file on the caller's thread instead
/// of handing reads to `ingest`'s rayon-backed wave scheduler.
pub fn compile_sync(
    files: Vec<PathBuf>,
    _base_dir: &Path,
    options: CompileOptions,
    _cache: &mut FileCache,
    loader: &dyn SourceLoader,
) -> Result<Model, CompileError> {
    let mut sources: IndexMap<PathBuf, SourceInput> = IndexMap::new();
    let mut pending = files;
    while let Some(path) = pending.pop() {
        if sources.contains_key(&path) {
            continue;
        }
        let input = loader.load(&path).map_err(|source| CompileError::Load {
            path: path_key(&path),
            source,
        })?;
        for target in using_from_targets(&input) {
            if let Some(resolved) = loader.resolve_using_from(&target, &path) {
                pending.push(resolved);
            }
        }
        sources.insert(path, input);
    }

    let mut model = Model::new();
    let mut messages = MessageSink::new();
    let mut file_table = FileTable::new();
    let inputs: IndexMap<String, SourceInput> = sources
        .into_iter()
        .map(|(path, input)| (path_key(&path), input))
        .collect();
    {
        let mut ctx = Ctx::new(&mut model, &mut messages, &mut file_table, &options);
        let by_path = ingest::ingest(&mut ctx, inputs);
        run_pipeline(&mut ctx, &by_path);
    }
    finish(model, messages, &options)
}

/// Ingests pre-loaded/pre-parsed sources directly — no file system, no
/// loader. Keys in `sources` double as the `using from` namespace: a
/// directive's `from` text must match another key verbatim.
pub fn compile_sources(
    sources: IndexMap<String, SourceInput>,
    options: CompileOptions,
) -> Result<Model, CompileError> {
    let mut model = Model::new();
    let mut messages = MessageSink::new();
    let mut file_table = FileTable::new();
    {
        let mut ctx = Ctx::new(&mut model, &mut messages, &mut file_table, &options);
        let by_path = ingest::ingest(&mut ctx, sources);
        run_pipeline(&mut ctx, &by_path);
    }
    finish(model, messages, &options)
}

/// Re-ingests a single already-generated CSN document, setting `$recompile`
/// so derived-artefact generation treats pre-existing texts/aspect-target
/// entities as current rather than regenerating them (DESIGN.md's
/// recompile-mismatch decision).
pub fn recompile(csn: Value, options: CompileOptions) -> Result<Model, CompileError> {
    let mut options = options;
    options.recompile = true;
    let mut sources = IndexMap::new();
    sources.insert("<recompile>".to_string(), SourceInput::Csn(csn));
    let mut model = Model::new();
    let mut messages = MessageSink::new();
    let mut file_table = FileTable::new();
    {
        let mut ctx = Ctx::new(&mut model, &mut messages, &mut file_table, &options);
        ctx.model.recompile = true;
        let by_path = ingest::ingest(&mut ctx, sources);
        run_pipeline(&mut ctx, &by_path);
    }
    finish(model, messages, &options)
}

fn using_from_targets(input: &SourceInput) -> Vec<String> {
    match input {
        SourceInput::Cdl(ast) => ast.usings.iter().map(|u| u.from.clone()).collect(),
        SourceInput::Csn(_) => Vec::new(),
    }
}
