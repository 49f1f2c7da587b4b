// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! rebound CLI library.
//!
//! Command-line host for the [`rebound`] redeploy controller.
//!
//! # Usage
//!
//! ```bash
//! rebound watch --dir src           # Report settled bursts of changes
//! rebound run --dir src -- cargo run  # Restart a command on change
//! ```
//!
//! # Configuration
//!
//! Projects are configured via `rebound.toml` at the project root.

/// CLI commands (watch, run).
pub mod commands;
/// Project configuration from `rebound.toml`.
pub mod config;
/// Child processes as deployment units.
pub mod process;
