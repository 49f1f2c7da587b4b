// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Filesystem event loop.
//!
//! The monitor starts the bouncer, registers every existing subdirectory
//! of the roots, then drains the watch channel in batches. New directories
//! are registered as they appear, removed ones are dropped, and any batch
//! holding a non-ignored change advances the dirty marker.

use crate::bouncer::Bouncer;
use crate::channel::{EventReceiver, WatchChannel};
use crate::filter::IgnoreFilter;
use crate::signal::{DirtyMarker, RunningFlag};
use notify::event::{EventKind, ModifyKind};
use notify::Event;
use std::path::PathBuf;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Name of the thread running the debounce loop.
pub const BOUNCER_THREAD: &str = "rebound-redeployer";

/// Upper bound for the bouncer thread to come up.
const GATE_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) struct Monitor {
    pub(crate) name: String,
    pub(crate) roots: Vec<PathBuf>,
    pub(crate) channel: Arc<Mutex<Option<WatchChannel>>>,
    pub(crate) events: EventReceiver,
    pub(crate) filter: IgnoreFilter,
    pub(crate) marker: Arc<DirtyMarker>,
    pub(crate) running: Arc<RunningFlag>,
    pub(crate) interval: Duration,
    pub(crate) bouncer: Bouncer,
    pub(crate) bouncer_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Monitor {
    pub(crate) fn run(self) {
        let Monitor {
            name,
            roots,
            channel,
            events,
            filter,
            marker,
            running,
            interval,
            bouncer,
            bouncer_handle,
        } = self;

        if !running.is_running() {
            return;
        }

        let gate = bouncer.gate.clone();
        match thread::Builder::new()
            .name(BOUNCER_THREAD.to_string())
            .spawn(move || bouncer.run())
        {
            Ok(handle) => {
                *bouncer_handle.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
            }
            Err(e) => {
                tracing::warn!("Cannot start redeployer thread, hot reloading disabled: {}", e);
                return;
            }
        }

        if !gate.wait(GATE_TIMEOUT) {
            tracing::warn!("Redeployer thread did not start, hot reloading disabled");
            return;
        }

        {
            let mut guard = channel.lock().unwrap_or_else(|e| e.into_inner());
            let Some(channel) = guard.as_mut() else {
                return;
            };
            for root in &roots {
                let added = channel.register_tree(root);
                tracing::debug!("Watching {} directories under {}", added, root.display());
            }
        }

        while running.is_running() {
            let first = match events.recv_timeout(interval) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };

            let mut batch = vec![first];
            batch.extend(events.try_iter());

            let mut dirty = false;
            {
                let mut guard = channel.lock().unwrap_or_else(|e| e.into_inner());
                let Some(channel) = guard.as_mut() else {
                    break;
                };
                for result in batch {
                    match result {
                        Ok(event) => dirty |= handle_event(channel, &filter, &roots, &event),
                        Err(e) => tracing::warn!("Watch error: {}", e),
                    }
                }
            }

            if dirty {
                let value = marker.touch();
                tracing::debug!("Marking {} for redeploy ({})", name, value);
            }
        }
    }
}

/// Applies one event to the channel bookkeeping.
///
/// Returns true when the event is a qualifying change. A rescan request
/// (the backend dropped events) re-registers every root and always counts
/// as a change, since the lost events cannot be inspected.
pub(crate) fn handle_event(
    channel: &mut WatchChannel,
    filter: &IgnoreFilter,
    roots: &[PathBuf],
    event: &Event,
) -> bool {
    if event.need_rescan() {
        tracing::warn!("Watch backend lost events, rescanning {} root(s)", roots.len());
        for root in roots {
            let added = channel.register_tree(root);
            tracing::debug!("Rescan registered {} new directories under {}", added, root.display());
        }
        return true;
    }

    let qualifying = matches!(
        event.kind,
        EventKind::Any | EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    if !qualifying {
        return false;
    }

    let mut found = false;
    for path in &event.paths {
        match event.kind {
            EventKind::Create(_) if path.is_dir() => {
                channel.register_tree(path);
            }
            EventKind::Modify(ModifyKind::Name(_)) => {
                // Renames arrive as a pair of paths; follow the directory.
                if path.is_dir() {
                    channel.register_tree(path);
                } else if channel.is_watched(path) {
                    channel.forget(path);
                }
            }
            EventKind::Remove(_) if channel.is_watched(path) => {
                channel.forget(path);
            }
            _ => {}
        }

        if !filter.is_ignored(path) {
            found = true;
        }
    }
    found
}
