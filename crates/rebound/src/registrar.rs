// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Watch roots and directory tree discovery.

use crate::error::WatchError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories registered for observation before the controller starts.
#[derive(Debug, Clone, Default)]
pub struct WatchRoots {
    roots: Vec<PathBuf>,
}

impl WatchRoots {
    /// Creates an empty root set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a root. Duplicates are dropped; nonexistent paths are accepted
    /// and only reported once the walker visits them.
    ///
    /// Returns true if the root was new.
    pub fn register(&mut self, root: impl Into<PathBuf>) -> bool {
        let root = root.into();
        if self.roots.contains(&root) {
            return false;
        }
        self.roots.push(root);
        true
    }

    /// Whether no root has been registered.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of registered roots.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Iterates over the roots in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(PathBuf::as_path)
    }
}

/// Collects `root` and every directory below it, parents first.
///
/// Symlinked directories are not followed. Unreadable directories are
/// reported and the walk continues past them.
pub fn walk_dirs(root: &Path) -> (Vec<PathBuf>, Vec<WatchError>) {
    let mut dirs = Vec::new();
    let mut errors = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();
    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_dir() => dirs.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                errors.push(WatchError::Walk {
                    path,
                    source: e.into(),
                });
            }
        }
    }

    (dirs, errors)
}
