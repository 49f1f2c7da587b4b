// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Noise filtering for filesystem events.
//!
//! An event is noise when the affected file name ends with an editor-lock
//! suffix, a backup tilde, or one of the pass-through resource extensions
//! (static assets served as-is that never need a redeploy).
//!
//! Matching is exact and case-sensitive on the file name only. A missed
//! filter costs an extra reload; an overly broad one leaves stale code
//! deployed, so no globbing or case folding happens here.

use std::path::Path;

/// Suffixes written by editors for temporary or backup files.
pub const DEFAULT_IGNORE_SUFFIXES: &[&str] = &["___jb_tmp___", "___jb_old___", "~"];

/// Static resource extensions that are served without redeploying.
pub const DEFAULT_PASSTHROUGH_EXTENSIONS: &[&str] = &[
    ".html", ".xhtml", ".js", ".ts", ".css", ".png", ".svg", ".jpg", ".jpeg",
];

/// Decides whether a changed path is noise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreFilter {
    suffixes: Vec<String>,
    extensions: Vec<String>,
}

impl Default for IgnoreFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_IGNORE_SUFFIXES.iter().map(|s| s.to_string()),
            DEFAULT_PASSTHROUGH_EXTENSIONS.iter().map(|s| s.to_string()),
        )
    }
}

impl IgnoreFilter {
    /// Creates a filter from suffixes and pass-through extensions.
    ///
    /// Extensions are normalized to carry a leading dot, so `"css"` and
    /// `".css"` are equivalent.
    pub fn new<S, E>(suffixes: S, extensions: E) -> Self
    where
        S: IntoIterator<Item = String>,
        E: IntoIterator<Item = String>,
    {
        Self {
            suffixes: suffixes.into_iter().filter(|s| !s.is_empty()).collect(),
            extensions: extensions
                .into_iter()
                .filter(|e| !e.is_empty() && e != ".")
                .map(normalize_extension)
                .collect(),
        }
    }

    /// A filter that lets every event through.
    pub fn none() -> Self {
        Self {
            suffixes: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// Adds an ignored file name suffix.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        if !suffix.is_empty() {
            self.suffixes.push(suffix);
        }
        self
    }

    /// Adds a pass-through extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        if !extension.is_empty() && extension != "." {
            self.extensions.push(normalize_extension(extension));
        }
        self
    }

    /// Returns true when a change to `path` must not trigger a redeploy.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy(),
            None => return false,
        };

        if self.suffixes.iter().any(|s| name.ends_with(s.as_str())) {
            return true;
        }

        self.is_passthrough(&name)
    }

    fn is_passthrough(&self, name: &str) -> bool {
        // A leading dot is a hidden file, not an extension.
        match name.rfind('.') {
            Some(idx) if idx > 0 => {
                let extension = &name[idx..];
                self.extensions.iter().any(|e| e == extension)
            }
            _ => false,
        }
    }
}

fn normalize_extension(extension: String) -> String {
    if extension.starts_with('.') {
        extension
    } else {
        format!(".{}", extension)
    }
}
