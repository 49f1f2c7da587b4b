// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Debounce loop turning a stream of dirty marks into single redeploys.
//!
//! The bouncer samples the [`DirtyMarker`] once per interval. A sample that
//! moved past the last one means changes are still arriving; a sample that
//! did not move while a change is pending means a full interval went by
//! without any new change, so exactly one redeploy fires.

use crate::signal::{DirtyMarker, RunningFlag, StartGate};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Bookkeeping between two marker samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BounceState {
    last: u64,
    pending: bool,
}

impl BounceState {
    /// Starts from the marker value observed when the loop begins.
    pub fn new(initial: u64) -> Self {
        Self {
            last: initial,
            pending: false,
        }
    }

    /// Feeds one marker sample. Returns true when a redeploy must fire.
    pub fn tick(&mut self, marker: u64) -> bool {
        if marker > self.last {
            self.last = marker;
            self.pending = true;
            return false;
        }

        // Unchanged since the previous sample: quiet for a whole interval.
        if self.pending {
            self.pending = false;
            return true;
        }

        false
    }

    /// Whether a change was seen but has not settled yet.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Most recent marker value seen.
    pub fn last(&self) -> u64 {
        self.last
    }
}

/// The debounce thread body.
pub(crate) struct Bouncer {
    pub(crate) marker: Arc<DirtyMarker>,
    pub(crate) running: Arc<RunningFlag>,
    pub(crate) gate: Arc<StartGate>,
    pub(crate) interval: Duration,
    pub(crate) trigger: Arc<dyn Fn() + Send + Sync>,
}

impl Bouncer {
    pub(crate) fn run(self) {
        let mut state = BounceState::new(self.marker.read());
        self.gate.open();

        while self.running.is_running() {
            if state.tick(self.marker.read()) {
                (self.trigger)();
            }
            thread::sleep(self.interval);
        }

        if state.is_pending() {
            tracing::debug!("Watcher closed with a pending redeploy, skipping it");
        }
    }
}
