// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Supervised command with hot redeploy on change.

use console::style;
use rebound::ReloadController;
use std::path::PathBuf;
use std::sync::Arc;

use crate::commands::{print_roots, wait_and_close};
use crate::config::Config;
use crate::process::ProcessDeployment;

/// Starts the command and restarts it after every settled burst of changes.
///
/// A command given on the command line replaces `[run].command`.
pub async fn run(
    dirs: Vec<PathBuf>,
    bouncing: Option<u64>,
    command: Vec<String>,
    quiet: bool,
) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    config.apply_overrides(dirs, bouncing);
    if !command.is_empty() {
        config.run.command = command;
    }

    let unit = Arc::new(
        ProcessDeployment::new(config.project.name.clone(), &config.run.command)?
            .with_stop_timeout(config.run.stop_timeout()),
    );
    unit.start()?;

    if !quiet {
        println!(
            "{} {}",
            style("Running:").cyan(),
            style(config.run.command.join(" ")).green().bold()
        );
    }

    if !config.watch.is_enabled() {
        if !quiet {
            println!("{} {}", style("Status:").cyan(), style("hot redeploy disabled").dim());
        }
        tokio::signal::ctrl_c().await?;
        unit.stop()?;
        return Ok(());
    }

    let mut controller = ReloadController::from_config(unit.clone(), &config.watch, None)?;
    if controller.should_run() {
        if !quiet {
            println!(
                "{} {}",
                style("Status:").cyan(),
                style(format!("watching for changes, bouncing {}ms", config.watch.bouncing)).dim()
            );
            print_roots(&config.watch);
            println!();
        }
        controller.start();
    } else {
        tracing::warn!("No watch roots configured, {} runs without hot redeploy", config.project.name);
    }

    wait_and_close(controller).await?;
    unit.stop()?;
    Ok(())
}
