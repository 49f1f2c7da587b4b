// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! # rebound
//!
//! Debounced directory watching with single-shot redeploy triggering.
//!
//! A [`ReloadController`] observes a set of root directories (and every
//! subdirectory, including the ones created later), ignores editor noise
//! and static resources, and once a burst of changes has been quiet for a
//! full interval it fires exactly one redeploy of its deployment unit.
//!
//! ## Features
//!
//! - One OS watch channel shared by all roots
//! - Transitive registration of new subdirectories
//! - Exact-suffix noise filtering ([`IgnoreFilter`])
//! - Bounded, idempotent shutdown
//! - Callback failures are logged and never stop the watcher
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rebound::{ReloadController, WatchConfig};
//!
//! let config = WatchConfig { roots: vec!["src".into()], ..Default::default() };
//! let mut controller = ReloadController::from_config(app, &config, None)?;
//! controller.start();
//! ```

/// Debounce state machine and loop.
pub mod bouncer;
/// The shared OS watch channel.
pub mod channel;
/// Watcher configuration.
pub mod config;
/// Controller facade and lifecycle.
pub mod controller;
/// Deployment units and redeploy strategies.
pub mod deployment;
/// Error types.
pub mod error;
/// Noise filtering for change events.
pub mod filter;
/// Filesystem event loop.
pub mod monitor;
/// Watch roots and directory discovery.
pub mod registrar;
/// Cross-thread markers and gates.
pub mod signal;

pub use bouncer::BounceState;
pub use config::WatchConfig;
pub use controller::{ControllerState, ReloadController};
pub use deployment::{reload_in_place, Deployment, RedeployCallback};
pub use error::{RedeployError, WatchError, WatchResult};
pub use filter::IgnoreFilter;
pub use registrar::{walk_dirs, WatchRoots};
pub use signal::{DirtyMarker, RunningFlag, StartGate};
