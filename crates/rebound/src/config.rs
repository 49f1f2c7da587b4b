// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Watcher configuration.
//!
//! Usually embedded as the `[watch]` table of a host configuration file:
//!
//! ```toml
//! [watch]
//! bouncing = 500
//! roots = ["src", "templates"]
//! ignore_suffixes = ["___jb_tmp___", "___jb_old___", "~"]
//! passthrough_extensions = [".html", ".css", ".png"]
//! shutdown_margin = 5000
//! ```

use crate::filter::{IgnoreFilter, DEFAULT_IGNORE_SUFFIXES, DEFAULT_PASSTHROUGH_EXTENSIONS};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Settings for a [`ReloadController`](crate::ReloadController).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct WatchConfig {
    /// Debounce interval in milliseconds (default: 500). Zero disables watching.
    #[serde(default = "default_bouncing")]
    pub bouncing: u64,

    /// Directories to observe (default: none).
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    /// File name suffixes treated as editor noise.
    #[serde(default = "default_ignore_suffixes")]
    pub ignore_suffixes: Vec<String>,

    /// Extensions of static resources that never need a redeploy.
    #[serde(default = "default_passthrough_extensions")]
    pub passthrough_extensions: Vec<String>,

    /// Extra milliseconds granted to threads on close, on top of two intervals
    /// (default: 5000). Covers a redeploy still in flight.
    #[serde(default = "default_shutdown_margin")]
    pub shutdown_margin: u64,
}

fn default_bouncing() -> u64 {
    500
}

fn default_ignore_suffixes() -> Vec<String> {
    DEFAULT_IGNORE_SUFFIXES.iter().map(|s| s.to_string()).collect()
}

fn default_passthrough_extensions() -> Vec<String> {
    DEFAULT_PASSTHROUGH_EXTENSIONS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_shutdown_margin() -> u64 {
    5000
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            bouncing: default_bouncing(),
            roots: Vec::new(),
            ignore_suffixes: default_ignore_suffixes(),
            passthrough_extensions: default_passthrough_extensions(),
            shutdown_margin: default_shutdown_margin(),
        }
    }
}

impl WatchConfig {
    /// Whether hot redeploy is active at all.
    pub fn is_enabled(&self) -> bool {
        self.bouncing > 0
    }

    /// The debounce interval.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.bouncing)
    }

    /// Upper bound for joining each watcher thread on close.
    pub fn join_budget(&self) -> Duration {
        join_budget(self.interval(), Duration::from_millis(self.shutdown_margin))
    }

    /// Builds the ignore predicate described by this configuration.
    pub fn filter(&self) -> IgnoreFilter {
        IgnoreFilter::new(
            self.ignore_suffixes.iter().cloned(),
            self.passthrough_extensions.iter().cloned(),
        )
    }
}

pub(crate) fn join_budget(interval: Duration, margin: Duration) -> Duration {
    interval * 2 + margin
}
