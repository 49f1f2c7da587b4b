// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Error types for the redeploy controller.
//!
//! Only construction errors reach the caller. Everything that goes wrong
//! once the watcher threads are running (walking a tree, registering a
//! directory, releasing the channel) is converted into a [`WatchError`]
//! and logged, so the surrounding application keeps running without hot
//! reload instead of failing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while setting up or driving the watcher.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The debounce interval must be a positive number of milliseconds.
    #[error("Invalid bouncing interval: {0}ms (must be > 0)")]
    InvalidInterval(u64),

    /// The OS-level watch channel could not be opened.
    #[error("Watch channel unavailable: {0}")]
    ChannelUnavailable(#[source] notify::Error),

    /// A directory could not be registered on the watch channel.
    #[error("Cannot watch {}: {source}", path.display())]
    Register {
        /// Directory that failed to register.
        path: PathBuf,
        /// Underlying watcher error.
        #[source]
        source: notify::Error,
    },

    /// A directory could not be traversed.
    #[error("Cannot walk {}: {source}", path.display())]
    Walk {
        /// Directory that failed to traverse.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for watcher operations.
pub type WatchResult<T> = Result<T, WatchError>;

/// Error type returned by redeploy callbacks.
///
/// Callbacks belong to the host application, so any error type is accepted.
pub type RedeployError = Box<dyn std::error::Error + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_interval_message() {
        let err = WatchError::InvalidInterval(0);
        assert_eq!(err.to_string(), "Invalid bouncing interval: 0ms (must be > 0)");
    }

    #[test]
    fn test_walk_error_mentions_path() {
        let err = WatchError::Walk {
            path: PathBuf::from("/missing/dir"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let message = err.to_string();
        assert!(message.contains("/missing/dir"));
        assert!(message.contains("gone"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: WatchError = io.into();
        assert!(matches!(err, WatchError::Io(_)));
    }
}
