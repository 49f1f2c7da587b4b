// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Project configuration.
//!
//! Configuration is loaded from `rebound.toml` at the project root.
//!
//! # Example Configuration
//!
//! ```toml
//! [project]
//! name = "my-app"
//!
//! [watch]
//! bouncing = 500
//! roots = ["src", "templates"]
//! passthrough_extensions = [".css", ".png"]
//!
//! [run]
//! command = ["cargo", "run"]
//! stop_timeout = 3000
//! ```

use rebound::WatchConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "rebound.toml";

/// Main configuration structure loaded from `rebound.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Project metadata.
    #[serde(default)]
    pub project: ProjectConfig,
    /// Watcher settings.
    #[serde(default)]
    pub watch: WatchConfig,
    /// Supervised command settings.
    #[serde(default)]
    pub run: RunConfig,
}

/// Project metadata configuration.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Project name, used in log lines (default: "unnamed").
    #[serde(default = "default_name")]
    pub name: String,
}

/// Settings for `rebound run`.
#[derive(Debug, Deserialize)]
pub struct RunConfig {
    /// Command and arguments to supervise (default: none).
    #[serde(default)]
    pub command: Vec<String>,
    /// Milliseconds to wait for the command to exit when stopping (default: 3000).
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout: u64,
}

fn default_name() -> String {
    "unnamed".to_string()
}

fn default_stop_timeout() -> u64 {
    3000
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            stop_timeout: default_stop_timeout(),
        }
    }
}

impl RunConfig {
    /// The stop timeout as a duration.
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout)
    }
}

impl Config {
    /// Loads configuration from `rebound.toml` in the current directory.
    ///
    /// If no configuration file exists, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be parsed.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Loads configuration from an explicit path.
    ///
    /// Relative watch roots are resolved against the directory holding the
    /// file. A missing file yields the default configuration.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", path.display(), e))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.watch.roots = config
            .watch
            .roots
            .iter()
            .map(|root| resolve(base, root))
            .collect();
        Ok(config)
    }

    /// Applies command line overrides.
    ///
    /// Directories given on the command line replace the configured roots.
    pub fn apply_overrides(&mut self, dirs: Vec<PathBuf>, bouncing: Option<u64>) {
        if !dirs.is_empty() {
            self.watch.roots = dirs;
        }
        if let Some(bouncing) = bouncing {
            self.watch.bouncing = bouncing;
        }
    }
}

fn resolve(base: &Path, root: &Path) -> PathBuf {
    if root.is_absolute() || base.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        base.join(root)
    }
}
