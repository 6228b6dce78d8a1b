use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

/// An interned handle to a source path.
///
/// Cheap to copy and compare; the actual path lives in a [`FileTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(u32);

impl FileId {
    /// Synthetic id for generated artefacts that do not originate from any
    /// input file (derived texts entities, aspect-composition targets).
    pub const SYNTHETIC: FileId = FileId(u32::MAX);
}

/// Interner mapping source paths to [`FileId`]s, preserving first-seen
/// order so iteration over files is deterministic.
#[derive(Debug, Default)]
pub struct FileTable {
    paths: Vec<PathBuf>,
    by_path: FxHashMap<PathBuf, FileId>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, path: impl AsRef<Path>) -> FileId {
        let path = path.as_ref();
        if let Some(&id) = self.by_path.get(path) {
            return id;
        }
        let id = FileId(self.paths.len() as u32);
        self.paths.push(path.to_path_buf());
        self.by_path.insert(path.to_path_buf(), id);
        id
    }

    pub fn path(&self, id: FileId) -> Option<&Path> {
        if id == FileId::SYNTHETIC {
            return None;
        }
        self.paths.get(id.0 as usize).map(PathBuf::as_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_the_same_path_returns_the_same_id() {
        let mut table = FileTable::new();
        let a = table.intern("db/schema.cds");
        let b = table.intern("db/schema.cds");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_paths_get_distinct_ids_in_first_seen_order() {
        let mut table = FileTable::new();
        let a = table.intern("a.cds");
        let b = table.intern("b.cds");
        assert_ne!(a, b);
        assert_eq!(table.path(a), Some(Path::new("a.cds")));
        assert_eq!(table.path(b), Some(Path::new("b.cds")));
    }
}
