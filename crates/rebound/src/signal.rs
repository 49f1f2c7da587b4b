// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! State shared between the monitor and bouncer threads.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Logical clock bumped on every accepted filesystem change.
///
/// Written by the monitor thread only and read by the bouncer thread only.
/// Values are nanoseconds since the marker was created and strictly
/// increase on every [`touch`](Self::touch).
#[derive(Debug)]
pub struct DirtyMarker {
    origin: Instant,
    value: AtomicU64,
}

impl Default for DirtyMarker {
    fn default() -> Self {
        Self::new()
    }
}

impl DirtyMarker {
    /// Creates a clean marker at zero.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            value: AtomicU64::new(0),
        }
    }

    /// Advances the marker to the current time and returns the new value.
    pub fn touch(&self) -> u64 {
        let now = u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX);
        let mut current = self.value.load(Ordering::Acquire);
        loop {
            let next = now.max(current.saturating_add(1));
            match self.value.compare_exchange_weak(
                current,
                next,
                Ordering::Release,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    /// Reads the latest value published by [`touch`](Self::touch).
    pub fn read(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }
}

/// Cross-thread "controller is active" flag.
#[derive(Debug)]
pub struct RunningFlag(AtomicBool);

impl Default for RunningFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningFlag {
    /// Creates a flag in the running state.
    pub fn new() -> Self {
        Self(AtomicBool::new(true))
    }

    /// Whether the controller is still active.
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clears the flag. Returns true only for the call that performed the
    /// transition.
    pub fn stop(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// One-shot gate: opened once, waited on by another thread.
#[derive(Debug, Default)]
pub struct StartGate {
    open: Mutex<bool>,
    ready: Condvar,
}

impl StartGate {
    /// Creates a closed gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the gate and wakes every waiter.
    pub fn open(&self) {
        let mut open = self.open.lock().unwrap_or_else(|e| e.into_inner());
        *open = true;
        self.ready.notify_all();
    }

    /// Blocks until the gate opens or `timeout` elapses.
    ///
    /// Returns true if the gate is open.
    pub fn wait(&self, timeout: Duration) -> bool {
        let open = self.open.lock().unwrap_or_else(|e| e.into_inner());
        let (open, _) = self
            .ready
            .wait_timeout_while(open, timeout, |open| !*open)
            .unwrap_or_else(|e| e.into_inner());
        *open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_marker_is_strictly_monotonic() {
        let marker = DirtyMarker::new();
        assert_eq!(marker.read(), 0);

        let mut previous = 0;
        for _ in 0..1000 {
            let value = marker.touch();
            assert!(value > previous);
            assert_eq!(marker.read(), value);
            previous = value;
        }
    }

    #[test]
    fn test_marker_visible_across_threads() {
        let marker = Arc::new(DirtyMarker::new());
        let writer = marker.clone();
        let written = thread::spawn(move || writer.touch()).join().unwrap();
        assert!(marker.read() >= written);
    }

    #[test]
    fn test_running_flag_stops_once() {
        let flag = RunningFlag::new();
        assert!(flag.is_running());
        assert!(flag.stop());
        assert!(!flag.is_running());
        assert!(!flag.stop());
    }

    #[test]
    fn test_gate_times_out_when_closed() {
        let gate = StartGate::new();
        assert!(!gate.wait(Duration::from_millis(20)));
    }

    #[test]
    fn test_gate_releases_waiter() {
        let gate = Arc::new(StartGate::new());
        let opener = gate.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            opener.open();
        });
        assert!(gate.wait(Duration::from_secs(5)));
        handle.join().unwrap();
        // Stays open for late waiters.
        assert!(gate.wait(Duration::from_millis(1)));
    }
}
