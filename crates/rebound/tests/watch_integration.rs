// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Integration tests for the redeploy controller against a real filesystem.
//!
//! Timings use generous upper bounds: only lower bounds (no redeploy before
//! quiescence) and counts are asserted strictly.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use rebound::{ControllerState, Deployment, RedeployCallback, RedeployError, ReloadController};
use tempfile::tempdir;

const BOUNCING_MS: u64 = 150;

/// Deployment unit recording when it was reloaded.
#[derive(Default)]
struct Recorder {
    reloads: Mutex<Vec<Instant>>,
}

impl Recorder {
    fn count(&self) -> usize {
        self.reloads.lock().unwrap().len()
    }

    fn first(&self) -> Option<Instant> {
        self.reloads.lock().unwrap().first().copied()
    }
}

impl Deployment for Recorder {
    fn name(&self) -> String {
        "recorder".to_string()
    }

    fn reload(&self) -> Result<(), RedeployError> {
        self.reloads.lock().unwrap().push(Instant::now());
        Ok(())
    }
}

fn interval() -> Duration {
    Duration::from_millis(BOUNCING_MS)
}

/// Starts a controller on `root` and waits until both threads are up and
/// the existing tree is registered.
fn start_watching(root: &Path) -> (Arc<Recorder>, ReloadController<Recorder>) {
    let unit = Arc::new(Recorder::default());
    let mut controller = ReloadController::new(unit.clone(), BOUNCING_MS, None)
        .unwrap()
        .with_shutdown_margin(Duration::from_millis(1000));
    controller.register(root);
    assert!(controller.should_run());
    controller.start();

    let deadline = Instant::now() + Duration::from_secs(5);
    while controller.state() != ControllerState::Running {
        assert!(Instant::now() < deadline, "controller never reached Running");
        thread::sleep(Duration::from_millis(10));
    }
    // Let the monitor finish walking the tree.
    thread::sleep(interval());
    (unit, controller)
}

fn wait_for(mut condition: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

#[test]
fn test_burst_coalesces_into_single_redeploy() {
    let dir = tempdir().unwrap();
    let (unit, mut controller) = start_watching(dir.path());

    fs::write(dir.path().join("a.txt"), "a").unwrap();
    thread::sleep(Duration::from_millis(30));
    let last_change = Instant::now();
    fs::write(dir.path().join("b.txt"), "b").unwrap();

    assert!(wait_for(|| unit.count() >= 1, Duration::from_secs(5)));
    let fired = unit.first().unwrap();
    assert!(
        fired.duration_since(last_change) >= interval(),
        "redeploy fired before the burst settled"
    );

    // Nothing else may follow the settled burst.
    thread::sleep(interval() * 4);
    assert_eq!(unit.count(), 1);
    assert_eq!(controller.redeploy_count(), 1);

    controller.close();
}

#[test]
fn test_separate_bursts_redeploy_separately() {
    let dir = tempdir().unwrap();
    let (unit, mut controller) = start_watching(dir.path());

    fs::write(dir.path().join("b.txt"), "first").unwrap();
    assert!(wait_for(|| unit.count() == 1, Duration::from_secs(5)));
    thread::sleep(interval() * 2);

    fs::write(dir.path().join("b.txt"), "second").unwrap();
    assert!(wait_for(|| unit.count() == 2, Duration::from_secs(5)));
    thread::sleep(interval() * 3);
    assert_eq!(unit.count(), 2);

    controller.close();
}

#[test]
fn test_noise_never_triggers_redeploy() {
    let dir = tempdir().unwrap();
    let (unit, mut controller) = start_watching(dir.path());

    fs::write(dir.path().join("site.css"), "body {}").unwrap();
    fs::write(dir.path().join("logo.png"), [0u8; 4]).unwrap();
    fs::write(dir.path().join("Main.java~"), "backup").unwrap();
    fs::write(dir.path().join("Main.java___jb_tmp___"), "tmp").unwrap();
    fs::remove_file(dir.path().join("site.css")).unwrap();

    thread::sleep(interval() * 6);
    assert_eq!(unit.count(), 0);

    controller.close();
}

#[test]
fn test_existing_subdirectories_are_watched() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("com/example/app");
    fs::create_dir_all(&nested).unwrap();
    let (unit, mut controller) = start_watching(dir.path());

    fs::write(nested.join("Service.class"), "v2").unwrap();
    assert!(wait_for(|| unit.count() == 1, Duration::from_secs(5)));

    controller.close();
}

#[test]
fn test_new_subdirectory_is_discovered() {
    let dir = tempdir().unwrap();
    let (unit, mut controller) = start_watching(dir.path());

    let created = dir.path().join("generated");
    fs::create_dir(&created).unwrap();
    assert!(wait_for(|| unit.count() == 1, Duration::from_secs(5)));
    thread::sleep(interval() * 2);

    fs::write(created.join("Generated.class"), "x").unwrap();
    assert!(wait_for(|| unit.count() == 2, Duration::from_secs(5)));
    thread::sleep(interval() * 3);
    assert_eq!(unit.count(), 2);

    controller.close();
}

#[test]
fn test_idle_controller_start_and_close() {
    let unit = Arc::new(Recorder::default());
    let mut controller = ReloadController::new(unit, BOUNCING_MS, None).unwrap();
    assert!(!controller.should_run());

    let started = Instant::now();
    controller.start();
    assert_eq!(controller.state(), ControllerState::Idle);
    controller.close();
    assert_eq!(controller.state(), ControllerState::Closed);
    assert!(started.elapsed() < Duration::from_millis(100));
}

#[test]
fn test_close_is_idempotent() {
    let dir = tempdir().unwrap();
    let (_unit, mut controller) = start_watching(dir.path());

    controller.close();
    assert_eq!(controller.state(), ControllerState::Closed);
    let again = Instant::now();
    controller.close();
    assert!(again.elapsed() < Duration::from_millis(50));
    assert_eq!(controller.state(), ControllerState::Closed);

    // Closed is terminal.
    controller.start();
    assert_eq!(controller.state(), ControllerState::Closed);
}

#[test]
fn test_close_is_bounded_under_load() {
    let dir = tempdir().unwrap();
    let (_unit, mut controller) = start_watching(dir.path());

    let writing = Arc::new(std::sync::atomic::AtomicBool::new(true));
    let writer = {
        let writing = writing.clone();
        let root = dir.path().to_path_buf();
        thread::spawn(move || {
            let mut i = 0u64;
            while writing.load(Ordering::Acquire) {
                let _ = fs::write(root.join(format!("f{}.txt", i % 8)), i.to_string());
                i += 1;
                thread::sleep(Duration::from_millis(5));
            }
        })
    };

    thread::sleep(interval() * 2);
    let closing = Instant::now();
    controller.close();
    let elapsed = closing.elapsed();

    writing.store(false, Ordering::Release);
    writer.join().unwrap();

    // Two intervals plus the configured margin.
    assert!(elapsed <= interval() * 2 + Duration::from_millis(1000), "close took {:?}", elapsed);
}

#[test]
fn test_failing_callback_does_not_stop_watcher() {
    let dir = tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = calls.clone();
    let callback: RedeployCallback<Recorder> = Arc::new(move |_unit: &Recorder| {
        match counter.fetch_add(1, Ordering::SeqCst) {
            0 => panic!("first redeploy blows up"),
            1 => Err("second redeploy fails".into()),
            _ => Ok(()),
        }
    });

    let mut controller =
        ReloadController::new(Arc::new(Recorder::default()), BOUNCING_MS, Some(callback)).unwrap();
    controller.register(dir.path());
    controller.start();
    assert!(wait_for(
        || controller.state() == ControllerState::Running,
        Duration::from_secs(5)
    ));
    thread::sleep(interval());

    for round in 1..=3 {
        fs::write(dir.path().join("App.class"), round.to_string()).unwrap();
        assert!(wait_for(
            || calls.load(Ordering::SeqCst) == round,
            Duration::from_secs(5)
        ));
        thread::sleep(interval() * 2);
    }
    assert_eq!(controller.redeploy_count(), 3);

    controller.close();
}

#[test]
fn test_close_detaches_a_stuck_redeploy() {
    let dir = tempdir().unwrap();
    let margin = Duration::from_millis(200);
    let entered = Arc::new(std::sync::atomic::AtomicBool::new(false));

    let flag = entered.clone();
    let callback: RedeployCallback<Recorder> = Arc::new(move |_unit: &Recorder| {
        flag.store(true, Ordering::Release);
        thread::sleep(Duration::from_secs(10));
        Ok(())
    });

    let mut controller =
        ReloadController::new(Arc::new(Recorder::default()), BOUNCING_MS, Some(callback))
            .unwrap()
            .with_shutdown_margin(margin);
    controller.register(dir.path());
    controller.start();
    assert!(wait_for(
        || controller.state() == ControllerState::Running,
        Duration::from_secs(5)
    ));
    thread::sleep(interval());

    fs::write(dir.path().join("App.class"), "v2").unwrap();
    assert!(wait_for(
        || entered.load(Ordering::Acquire),
        Duration::from_secs(5)
    ));

    let closing = Instant::now();
    controller.close();
    let elapsed = closing.elapsed();

    let budget = interval() * 2 + margin;
    assert!(elapsed >= budget, "close returned before the deadline: {:?}", elapsed);
    assert!(elapsed < budget + Duration::from_millis(250), "close took {:?}", elapsed);
    assert_eq!(controller.state(), ControllerState::Closed);
    assert_eq!(controller.redeploy_count(), 0);
}
