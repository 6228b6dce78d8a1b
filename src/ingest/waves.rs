//! Dependency reads scheduled in waves: each wave resolves
//! module names, reads files in parallel, then parses them; waves repeat
//! until all transitive dependencies are loaded. Commit order into the
//! `Sources` dictionary is always input-path order, never completion
//! order, so the result is deterministic regardless of how the OS
//! schedules the parallel reads.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use rayon::prelude::*;

use super::ast::SourceInput;
use super::loader::{LoadError, SourceLoader};

/// Cooperative cancellation flag checked at wave boundaries:
/// an abort before a wave completes leaves partial state intact, but the
/// caller must discard the model rather than resume it.
#[derive(Debug, Default)]
pub struct CancelToken(AtomicBool);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct WaveResult {
    /// Path -> parsed input, in first-seen path order.
    pub sources: IndexMap<PathBuf, SourceInput>,
    pub errors: Vec<(PathBuf, LoadError)>,
    pub cancelled: bool,
}

/// Loads `roots` and everything they transitively `using from`, via
/// `loader`. Each wave: collect the paths still outstanding, read+parse
/// them in parallel with rayon, then ask the loader to resolve any new
/// `using from` targets those sources name, repeating until a wave adds
/// nothing new.
pub fn load_waves(
    roots: Vec<PathBuf>,
    loader: &dyn SourceLoader,
    using_from_targets: impl Fn(&SourceInput) -> Vec<String>,
    cancel: &CancelToken,
) -> WaveResult {
    let mut sources: IndexMap<PathBuf, SourceInput> = IndexMap::new();
    let mut errors = Vec::new();
    let mut pending = roots;

    loop {
        if cancel.is_cancelled() {
            return WaveResult {
                sources,
                errors,
                cancelled: true,
            };
        }
        pending.retain(|p| !sources.contains_key(p));
        if pending.is_empty() {
            break;
        }

        // Parallel read+parse; order is re-imposed below by iterating
        // `pending` (the wave's input order), not the completion order
        // rayon produced.
        let results: Vec<(PathBuf, Result<SourceInput, LoadError>)> = pending
            .par_iter()
            .map(|path| (path.clone(), loader.load(path)))
            .collect();

        let mut next_wave = Vec::new();
        for path in &pending {
            let (_, result) = results
                .iter()
                .find(|(p, _)| p == path)
                .expect("path present in its own wave's results");
            match result {
                Ok(input) => {
                    for target in using_from_targets(input) {
                        if let Some(resolved) = loader.resolve_using_from(&target, path) {
                            next_wave.push(resolved);
                        }
                    }
                    sources.insert(path.clone(), input.clone());
                }
                Err(e) => errors.push((path.clone(), clone_error(e))),
            }
        }
        pending = next_wave;
    }

    WaveResult {
        sources,
        errors,
        cancelled: false,
    }
}

fn clone_error(e: &LoadError) -> LoadError {
    match e {
        LoadError::Missing(s) => LoadError::Missing(s.clone()),
        LoadError::UnknownExtension(s) => LoadError::UnknownExtension(s.clone()),
        LoadError::Other(s) => LoadError::Other(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;

    struct FixedLoader {
        files: Mutex<IndexMap<PathBuf, serde_json::Value>>,
    }

    impl SourceLoader for FixedLoader {
        fn load(&self, path: &Path) -> Result<SourceInput, LoadError> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .map(SourceInput::Csn)
                .ok_or_else(|| LoadError::Missing(path.display().to_string()))
        }
    }

    #[test]
    fn commit_order_matches_input_order_regardless_of_parallel_completion() {
        let mut files = IndexMap::new();
        files.insert(PathBuf::from("a.csn"), serde_json::json!({"definitions": {}}));
        files.insert(PathBuf::from("b.csn"), serde_json::json!({"definitions": {}}));
        files.insert(PathBuf::from("c.csn"), serde_json::json!({"definitions": {}}));
        let loader = FixedLoader {
            files: Mutex::new(files),
        };
        let roots = vec![
            PathBuf::from("c.csn"),
            PathBuf::from("a.csn"),
            PathBuf::from("b.csn"),
        ];
        let cancel = CancelToken::new();
        let result = load_waves(roots, &loader, |_| Vec::new(), &cancel);
        let order: Vec<_> = result.sources.keys().cloned().collect();
        assert_eq!(
            order,
            vec![
                PathBuf::from("c.csn"),
                PathBuf::from("a.csn"),
                PathBuf::from("b.csn"),
            ]
        );
    }

    #[test]
    fn missing_dependency_is_reported_not_panicked_on() {
        let files = IndexMap::new();
        let loader = FixedLoader {
            files: Mutex::new(files),
        };
        let cancel = CancelToken::new();
        let result = load_waves(vec![PathBuf::from("missing.csn")], &loader, |_| Vec::new(), &cancel);
        assert_eq!(result.errors.len(), 1);
    }
}
