//! Process-local module search path.
//!
//! The analogue of an interpreter's import path: directories consulted when
//! resolving an artifact identifier to its staged source and built module.
//! Every rank appends the output directory itself, since every rank loads
//! the artifact independently.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

/// An ordered list of directories searched for staged artifacts.
#[derive(Debug, Default)]
pub struct SearchPath {
    entries: Mutex<Vec<PathBuf>>,
}

impl SearchPath {
    /// Creates an empty search path.
    pub const fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Appends `dir` to the search path.
    ///
    /// Entries are not deduplicated: one append per `compile` call, repeated
    /// calls append repeated entries.
    pub fn append(&self, dir: &Path) {
        self.entries.lock().push(dir.to_path_buf());
    }

    /// Snapshots the current entries in append order.
    pub fn entries(&self) -> Vec<PathBuf> {
        self.entries.lock().clone()
    }
}

/// The process-wide search path used by [`compile`](crate::compile::compile).
pub fn global() -> &'static SearchPath {
    static GLOBAL: SearchPath = SearchPath::new();
    &GLOBAL
}
