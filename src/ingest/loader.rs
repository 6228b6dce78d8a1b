//! The read-file interface the file-based [`crate::compile`] entry point
//! reads through. The file-system loader and module resolver are out of
//! scope here — callers provide one, the crate only defines the trait and
//! the deterministic wave scheduler that drives it.

use std::path::Path;

use super::ast::SourceInput;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("missing file: {0}")]
    Missing(String),
    #[error("unknown extension: {0}")]
    UnknownExtension(String),
    #[error("{0}")]
    Other(String),
}

/// Reads and parses one source file. Implementations decide how `.cds`
/// text becomes a [`SourceInput::Cdl`] (grammar, out of scope here) and how
/// `.json`/`.csn` becomes [`SourceInput::Csn`].
pub trait SourceLoader: Sync {
    fn load(&self, path: &Path) -> Result<SourceInput, LoadError>;

    /// Resolves a `using from './rel/path'` directive relative to the
    /// source that contains it, returning the path the wave scheduler
    /// should load next.
    fn resolve_using_from(&self, from: &str, relative_to: &Path) -> Option<std::path::PathBuf> {
        Some(relative_to.with_file_name(from))
    }
}

/// A loader that treats every input as a CSN JSON document — useful for
/// tests and for callers who pre-parse CDL themselves and only ever hand
/// this crate CSN.
pub struct CsnOnlyLoader;

impl SourceLoader for CsnOnlyLoader {
    fn load(&self, path: &Path) -> Result<SourceInput, LoadError> {
        let text = std::fs::read_to_string(path)
            .map_err(|_| LoadError::Missing(path.display().to_string()))?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| LoadError::Other(format!("{}: {e}", path.display())))?;
        Ok(SourceInput::Csn(value))
    }
}
