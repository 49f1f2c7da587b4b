// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! File watcher command reporting change bursts.

use console::style;
use rebound::{Deployment, RedeployError, ReloadController};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::commands::{print_roots, wait_and_close};
use crate::config::Config;

/// Deployment unit that only reports redeploys.
#[derive(Debug)]
pub struct ReportingDeployment {
    name: String,
    quiet: bool,
    count: AtomicUsize,
}

impl ReportingDeployment {
    /// Creates a reporter for the named project.
    pub fn new(name: impl Into<String>, quiet: bool) -> Self {
        Self {
            name: name.into(),
            quiet,
            count: AtomicUsize::new(0),
        }
    }

    /// Number of bursts reported so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}

impl Deployment for ReportingDeployment {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn reload(&self) -> Result<(), RedeployError> {
        let n = self.count.fetch_add(1, Ordering::AcqRel) + 1;
        if !self.quiet {
            println!(
                "  {} {} {}",
                style("✓").green(),
                style(&self.name).dim(),
                style(format!("redeploy #{}", n)).dim()
            );
        }
        Ok(())
    }
}

/// Runs the file watcher and reports each settled burst of changes.
pub async fn run(dirs: Vec<PathBuf>, bouncing: Option<u64>, quiet: bool) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    config.apply_overrides(dirs, bouncing);

    if !config.watch.is_enabled() {
        println!("Watching is disabled (bouncing = 0)");
        return Ok(());
    }

    let unit = Arc::new(ReportingDeployment::new(config.project.name.clone(), quiet));
    let mut controller = ReloadController::from_config(unit, &config.watch, None)?;
    if !controller.should_run() {
        anyhow::bail!("Nothing to watch: add roots to [watch] in rebound.toml or pass --dir");
    }

    if !quiet {
        println!(
            "{} {}",
            style("Watching:").cyan(),
            style(format!("bouncing {}ms", config.watch.bouncing)).dim()
        );
        print_roots(&config.watch);
        println!("Press Ctrl+C to stop...");
        println!();
    }

    controller.start();
    wait_and_close(controller).await
}
