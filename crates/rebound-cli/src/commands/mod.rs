// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! CLI command implementations.
//!
//! - `watch`: Report coalesced change bursts without redeploying anything
//! - `run`: Supervise a command and restart it after each burst

/// Supervised command with hot redeploy.
pub mod run;
/// Change reporting command.
pub mod watch;

use rebound::{ReloadController, WatchConfig};

/// Prints the watched roots before the controller starts.
pub(crate) fn print_roots(watch: &WatchConfig) {
    for root in &watch.roots {
        let marker = if root.is_dir() { "" } else { " (missing)" };
        println!(
            "  {} {}{}",
            console::style("•").cyan(),
            root.display(),
            console::style(marker).yellow()
        );
    }
}

/// Blocks until Ctrl+C, then closes the controller off the async runtime.
pub(crate) async fn wait_and_close<D: Send + Sync + 'static>(
    mut controller: ReloadController<D>,
) -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await?;
    println!("\nStopping watcher...");
    tokio::task::spawn_blocking(move || controller.close()).await?;
    Ok(())
}
