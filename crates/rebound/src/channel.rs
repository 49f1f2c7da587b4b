// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The OS-level watch channel shared by every root.
//!
//! Each directory is registered on its own, non-recursively, so the
//! monitor decides which subdirectories are observed and can drop the ones
//! that disappear.

use crate::error::{WatchError, WatchResult};
use crate::registrar::walk_dirs;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};

/// Receiving end of the watch channel.
pub type EventReceiver = Receiver<notify::Result<Event>>;

/// A native watcher plus the directories registered on it.
pub struct WatchChannel {
    watcher: RecommendedWatcher,
    watched: HashSet<PathBuf>,
}

impl std::fmt::Debug for WatchChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchChannel")
            .field("watched", &self.watched.len())
            .finish()
    }
}

impl WatchChannel {
    /// Opens the native watcher and returns it with its event receiver.
    pub fn open() -> WatchResult<(Self, EventReceiver)> {
        let (tx, rx) = mpsc::channel();
        let watcher =
            RecommendedWatcher::new(tx, Config::default()).map_err(WatchError::ChannelUnavailable)?;
        Ok((
            Self {
                watcher,
                watched: HashSet::new(),
            },
            rx,
        ))
    }

    /// Registers a single directory. Returns false if it was already watched.
    pub fn register(&mut self, dir: &Path) -> WatchResult<bool> {
        if self.watched.contains(dir) {
            return Ok(false);
        }
        self.watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Register {
                path: dir.to_path_buf(),
                source,
            })?;
        self.watched.insert(dir.to_path_buf());
        Ok(true)
    }

    /// Registers `root` and every directory below it.
    ///
    /// Failures are logged per path; returns how many directories were
    /// newly registered.
    pub fn register_tree(&mut self, root: &Path) -> usize {
        let (dirs, errors) = walk_dirs(root);
        for error in errors {
            tracing::warn!("{}", error);
        }

        let mut added = 0;
        for dir in dirs {
            match self.register(&dir) {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!("{}", e),
            }
        }
        added
    }

    /// Whether `dir` is currently registered.
    pub fn is_watched(&self, dir: &Path) -> bool {
        self.watched.contains(dir)
    }

    /// Number of registered directories.
    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }

    /// Drops `dir` and everything registered below it.
    ///
    /// Used once a directory is removed; the native registration may
    /// already be gone, so unwatch failures are only logged at debug.
    pub fn forget(&mut self, dir: &Path) {
        let gone: Vec<PathBuf> = self
            .watched
            .iter()
            .filter(|p| p.starts_with(dir))
            .cloned()
            .collect();
        for path in gone {
            self.watched.remove(&path);
            if let Err(e) = self.watcher.unwatch(&path) {
                tracing::debug!("Unwatch {} after removal: {}", path.display(), e);
            }
        }
    }

    /// Unregisters every directory and closes the native watcher.
    pub fn release(mut self) {
        for path in self.watched.drain() {
            if let Err(e) = self.watcher.unwatch(&path) {
                // Deleted directories are already unwatched by the OS.
                if path.exists() {
                    tracing::warn!("Failed to release watch on {}: {}", path.display(), e);
                }
            }
        }
    }
}
