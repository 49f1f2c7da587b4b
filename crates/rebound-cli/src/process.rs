// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! A child process used as a deployment unit.
//!
//! Reloading stops the running child and spawns the same command again.

use rebound::{Deployment, RedeployError};
use std::path::PathBuf;
use std::process::{Child, Command};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

/// Error types for supervised processes.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// No program was configured.
    #[error("No command to run: set [run].command in rebound.toml or pass one after --")]
    EmptyCommand,

    /// The program could not be spawned.
    #[error("Failed to start {program}: {source}")]
    Spawn {
        /// Program name.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The running child could not be signalled or waited on.
    #[error("Failed to stop process: {0}")]
    Stop(#[from] std::io::Error),

    /// The child did not exit in time.
    #[error("Process did not exit within {0:?}")]
    StopTimeout(Duration),
}

/// Result type for process operations.
pub type ProcessResult<T> = Result<T, ProcessError>;

const EXIT_POLL: Duration = Duration::from_millis(10);

/// Supervises one child process that is restarted on every redeploy.
#[derive(Debug)]
pub struct ProcessDeployment {
    name: String,
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    stop_timeout: Duration,
    child: Mutex<Option<Child>>,
    restarts: AtomicUsize,
}

impl ProcessDeployment {
    /// Creates a deployment for `command` (program followed by arguments).
    pub fn new(name: impl Into<String>, command: &[String]) -> ProcessResult<Self> {
        let (program, args) = command.split_first().ok_or(ProcessError::EmptyCommand)?;
        Ok(Self {
            name: name.into(),
            program: program.clone(),
            args: args.to_vec(),
            working_dir: None,
            stop_timeout: Duration::from_millis(3000),
            child: Mutex::new(None),
            restarts: AtomicUsize::new(0),
        })
    }

    /// Runs the command from `dir` instead of the current directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Sets how long to wait for the child to exit.
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Spawns the command unless a child is already running.
    pub fn start(&self) -> ProcessResult<()> {
        let mut child = self.child.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(running) = child.as_mut() {
            if running.try_wait()?.is_none() {
                return Ok(());
            }
        }

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        let spawned = command.spawn().map_err(|source| ProcessError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        tracing::info!("Started {} (pid {})", self.name, spawned.id());
        *child = Some(spawned);
        Ok(())
    }

    /// Kills the running child, if any, and waits for it to exit.
    pub fn stop(&self) -> ProcessResult<()> {
        let mut guard = self.child.lock().unwrap_or_else(|e| e.into_inner());
        let Some(mut child) = guard.take() else {
            return Ok(());
        };

        if let Some(status) = child.try_wait()? {
            tracing::debug!("{} already exited with {}", self.name, status);
            return Ok(());
        }

        child.kill()?;
        let deadline = Instant::now() + self.stop_timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                tracing::debug!("Stopped {} ({})", self.name, status);
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ProcessError::StopTimeout(self.stop_timeout));
            }
            thread::sleep(EXIT_POLL);
        }
    }

    /// Whether a child is currently alive.
    pub fn is_running(&self) -> bool {
        let mut guard = self.child.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Process id of the current child.
    pub fn pid(&self) -> Option<u32> {
        self.child
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(Child::id)
    }

    /// Number of completed restarts.
    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::Acquire)
    }
}

impl Deployment for ProcessDeployment {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn reload(&self) -> Result<(), RedeployError> {
        self.stop()?;
        self.start()?;
        self.restarts.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

impl Drop for ProcessDeployment {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!("{}", e);
        }
    }
}
