// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The redeploy controller facade.
//!
//! [`ReloadController`] owns the watch roots, the OS watch channel and both
//! background threads:
//!
//! - `rebound-watcher` observes the roots and marks the unit dirty
//! - `rebound-redeployer` waits for a quiet interval and fires the callback
//!
//! # Lifecycle
//!
//! ```text
//! Idle --start()--> Armed --bouncer up--> Running --close()--> Closed
//!   \--start() with a broken channel--> Disabled --close()--> Closed
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use rebound::{Deployment, RedeployError, ReloadController};
//! use std::sync::Arc;
//!
//! struct App;
//!
//! impl Deployment for App {
//!     fn name(&self) -> String {
//!         "app".to_string()
//!     }
//!
//!     fn reload(&self) -> Result<(), RedeployError> {
//!         println!("reloading");
//!         Ok(())
//!     }
//! }
//!
//! let mut controller = ReloadController::new(Arc::new(App), 500, None)?;
//! controller.register("target/classes");
//! if controller.should_run() {
//!     controller.start();
//! }
//! // ...
//! controller.close();
//! # Ok::<(), rebound::WatchError>(())
//! ```

use crate::bouncer::Bouncer;
use crate::channel::WatchChannel;
use crate::config::{join_budget, WatchConfig};
use crate::deployment::{reload_in_place, Deployment, RedeployCallback};
use crate::error::{WatchError, WatchResult};
use crate::filter::IgnoreFilter;
use crate::monitor::Monitor;
use crate::registrar::WatchRoots;
use crate::signal::{DirtyMarker, RunningFlag, StartGate};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, TryLockError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Name of the thread observing the filesystem.
pub const MONITOR_THREAD: &str = "rebound-watcher";

/// Default extra time granted to the threads on close.
pub const DEFAULT_SHUTDOWN_MARGIN: Duration = Duration::from_millis(5000);

const JOIN_POLL: Duration = Duration::from_millis(10);

/// Observable lifecycle state of a [`ReloadController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Not started, or started without any root.
    Idle,
    /// The watch channel could not be opened; hot reload is off.
    Disabled,
    /// Channel open and monitor running, bouncer not up yet.
    Armed,
    /// Both threads running.
    Running,
    /// Terminal.
    Closed,
}

/// Watches directories and redeploys a unit once changes settle.
pub struct ReloadController<D: Send + Sync + 'static> {
    unit: Arc<D>,
    name: String,
    interval: Duration,
    margin: Duration,
    callback: RedeployCallback<D>,
    filter: IgnoreFilter,
    roots: WatchRoots,
    marker: Arc<DirtyMarker>,
    running: Arc<RunningFlag>,
    redeploys: Arc<AtomicUsize>,
    channel: Arc<Mutex<Option<WatchChannel>>>,
    monitor: Option<JoinHandle<()>>,
    bouncer: Arc<Mutex<Option<JoinHandle<()>>>>,
    started: bool,
    disabled: bool,
    closed: bool,
}

impl<D: Send + Sync + 'static> std::fmt::Debug for ReloadController<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadController")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("roots", &self.roots)
            .field("state", &self.state())
            .finish()
    }
}

impl<D: Deployment> ReloadController<D> {
    /// Creates a controller for `unit`.
    ///
    /// `bouncing_ms` is the debounce interval. Without a callback the unit
    /// is reloaded in place.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::InvalidInterval`] when `bouncing_ms` is zero.
    pub fn new(
        unit: Arc<D>,
        bouncing_ms: u64,
        callback: Option<RedeployCallback<D>>,
    ) -> WatchResult<Self> {
        let name = unit.name();
        let callback = callback.unwrap_or_else(reload_in_place::<D>);
        Self::with_callback(unit, name, bouncing_ms, callback)
    }

    /// Creates a controller from a [`WatchConfig`], registering its roots.
    pub fn from_config(
        unit: Arc<D>,
        config: &WatchConfig,
        callback: Option<RedeployCallback<D>>,
    ) -> WatchResult<Self> {
        let mut controller = Self::new(unit, config.bouncing, callback)?
            .with_filter(config.filter())
            .with_shutdown_margin(Duration::from_millis(config.shutdown_margin));
        for root in &config.roots {
            controller.register(root.clone());
        }
        Ok(controller)
    }
}

impl<D: Send + Sync + 'static> ReloadController<D> {
    /// Creates a controller for any unit, with an explicit callback.
    pub fn with_callback(
        unit: Arc<D>,
        name: impl Into<String>,
        bouncing_ms: u64,
        callback: RedeployCallback<D>,
    ) -> WatchResult<Self> {
        if bouncing_ms == 0 {
            return Err(WatchError::InvalidInterval(bouncing_ms));
        }

        Ok(Self {
            unit,
            name: name.into(),
            interval: Duration::from_millis(bouncing_ms),
            margin: DEFAULT_SHUTDOWN_MARGIN,
            callback,
            filter: IgnoreFilter::default(),
            roots: WatchRoots::new(),
            marker: Arc::new(DirtyMarker::new()),
            running: Arc::new(RunningFlag::new()),
            redeploys: Arc::new(AtomicUsize::new(0)),
            channel: Arc::new(Mutex::new(None)),
            monitor: None,
            bouncer: Arc::new(Mutex::new(None)),
            started: false,
            disabled: false,
            closed: false,
        })
    }

    /// Replaces the ignore predicate.
    pub fn with_filter(mut self, filter: IgnoreFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the extra time granted to the threads on close.
    pub fn with_shutdown_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    /// Adds a directory to observe. Only effective before [`start`](Self::start).
    pub fn register(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        if self.started || self.closed {
            tracing::warn!(
                "Ignoring watch root {} registered after start",
                dir.display()
            );
            return;
        }
        self.roots.register(dir);
    }

    /// Whether at least one root is registered.
    pub fn should_run(&self) -> bool {
        !self.roots.is_empty()
    }

    /// The deployment unit.
    pub fn unit(&self) -> &Arc<D> {
        &self.unit
    }

    /// The debounce interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of redeploys fired so far.
    pub fn redeploy_count(&self) -> usize {
        self.redeploys.load(Ordering::Acquire)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ControllerState {
        if self.closed {
            ControllerState::Closed
        } else if self.disabled {
            ControllerState::Disabled
        } else if !self.started {
            ControllerState::Idle
        } else if self
            .bouncer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
        {
            ControllerState::Running
        } else {
            ControllerState::Armed
        }
    }

    /// Opens the watch channel and starts the watcher threads.
    ///
    /// Does nothing without roots, when already started, or once closed.
    /// A channel that cannot be opened leaves the controller
    /// [`Disabled`](ControllerState::Disabled) with a warning.
    pub fn start(&mut self) {
        if self.started || self.closed {
            return;
        }
        if self.roots.is_empty() {
            tracing::debug!("No directory registered for {}, watcher stays idle", self.name);
            return;
        }
        self.started = true;

        let (mut channel, events) = match WatchChannel::open() {
            Ok(opened) => opened,
            Err(e) => {
                tracing::warn!("Hot reloading will not be available: {}", e);
                self.disabled = true;
                return;
            }
        };
        for root in self.roots.iter() {
            if let Err(e) = channel.register(root) {
                tracing::warn!("{}", e);
            }
        }
        *self.channel.lock().unwrap_or_else(|e| e.into_inner()) = Some(channel);

        let bouncer = Bouncer {
            marker: self.marker.clone(),
            running: self.running.clone(),
            gate: Arc::new(StartGate::new()),
            interval: self.interval,
            trigger: self.trigger(),
        };
        let monitor = Monitor {
            name: self.name.clone(),
            roots: self.roots.iter().map(|p| p.to_path_buf()).collect(),
            channel: self.channel.clone(),
            events,
            filter: self.filter.clone(),
            marker: self.marker.clone(),
            running: self.running.clone(),
            interval: self.interval,
            bouncer,
            bouncer_handle: self.bouncer.clone(),
        };

        match thread::Builder::new()
            .name(MONITOR_THREAD.to_string())
            .spawn(move || monitor.run())
        {
            Ok(handle) => {
                self.monitor = Some(handle);
                tracing::info!(
                    "Watching {} director{} for {} (bouncing {}ms)",
                    self.roots.len(),
                    if self.roots.len() == 1 { "y" } else { "ies" },
                    self.name,
                    self.interval.as_millis()
                );
            }
            Err(e) => {
                tracing::warn!("Cannot start watcher thread, hot reloading disabled: {}", e);
                self.disabled = true;
                if let Some(channel) = self.channel.lock().unwrap_or_else(|e| e.into_inner()).take() {
                    channel.release();
                }
            }
        }
    }

    /// Stops both threads and releases the watch channel.
    ///
    /// Waits at most two intervals plus the shutdown margin; a thread that
    /// does not stop in time is detached. Calling it again is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.running.stop();

        let deadline = Instant::now() + join_budget(self.interval, self.margin);
        if let Some(handle) = self.monitor.take() {
            join_until(handle, deadline, MONITOR_THREAD);
        }
        let bouncer = self.bouncer.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = bouncer {
            join_until(handle, deadline, crate::monitor::BOUNCER_THREAD);
        }

        let channel = match self.channel.try_lock() {
            Ok(mut guard) => guard.take(),
            Err(TryLockError::Poisoned(e)) => e.into_inner().take(),
            Err(TryLockError::WouldBlock) => {
                tracing::warn!("Watch channel still in use, leaving it to the watcher thread");
                None
            }
        };
        if let Some(channel) = channel {
            channel.release();
        }
    }

    fn trigger(&self) -> Arc<dyn Fn() + Send + Sync> {
        let unit = self.unit.clone();
        let callback = self.callback.clone();
        let name = self.name.clone();
        let redeploys = self.redeploys.clone();

        Arc::new(move || {
            tracing::info!("Redeploying {}", name);
            let start = Instant::now();
            match panic::catch_unwind(AssertUnwindSafe(|| callback(unit.as_ref()))) {
                Ok(Ok(())) => {
                    tracing::debug!("Redeployed {} in {:?}", name, start.elapsed());
                }
                Ok(Err(e)) => tracing::error!("Redeploy of {} failed: {}", name, e),
                Err(payload) => {
                    tracing::error!("Redeploy of {} panicked: {}", name, panic_message(&*payload))
                }
            }
            redeploys.fetch_add(1, Ordering::AcqRel);
        })
    }
}

impl<D: Send + Sync + 'static> Drop for ReloadController<D> {
    fn drop(&mut self) {
        self.close();
    }
}

fn join_until(handle: JoinHandle<()>, deadline: Instant, label: &str) {
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            tracing::warn!("Thread {} did not stop in time, detaching it", label);
            return;
        }
        thread::sleep(JOIN_POLL);
    }
    if handle.join().is_err() {
        tracing::warn!("Thread {} panicked", label);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RedeployError;
    use tempfile::tempdir;

    struct Noop;

    impl Deployment for Noop {
        fn name(&self) -> String {
            "noop".to_string()
        }

        fn reload(&self) -> Result<(), RedeployError> {
            Ok(())
        }
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = ReloadController::new(Arc::new(Noop), 0, None).unwrap_err();
        assert!(matches!(err, WatchError::InvalidInterval(0)));
    }

    #[test]
    fn test_idle_start_is_noop() {
        let mut controller = ReloadController::new(Arc::new(Noop), 50, None).unwrap();
        assert!(!controller.should_run());
        controller.start();
        assert_eq!(controller.state(), ControllerState::Idle);
        assert!(controller.channel.lock().unwrap().is_none());
        controller.close();
        assert_eq!(controller.state(), ControllerState::Closed);
    }

    #[test]
    fn test_register_after_start_is_ignored() {
        let dir = tempdir().unwrap();
        let mut controller = ReloadController::new(Arc::new(Noop), 50, None).unwrap();
        controller.register(dir.path());
        controller.start();
        controller.register(dir.path().join("late"));
        assert_eq!(controller.roots.len(), 1);
        controller.close();
    }

    #[test]
    fn test_from_config_registers_roots() {
        let dir = tempdir().unwrap();
        let config = WatchConfig {
            bouncing: 75,
            roots: vec![dir.path().to_path_buf()],
            shutdown_margin: 100,
            ..Default::default()
        };
        let controller = ReloadController::from_config(Arc::new(Noop), &config, None).unwrap();
        assert!(controller.should_run());
        assert_eq!(controller.interval(), Duration::from_millis(75));
        assert_eq!(controller.margin, Duration::from_millis(100));
    }

    #[test]
    fn test_panic_message_extracts_text() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*payload), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*payload), "bang");
        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(&*payload), "unknown panic");
    }
}
