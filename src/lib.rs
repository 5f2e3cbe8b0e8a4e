//! Chorewatch -- overdue chore watcher for Grocy.
//!
//! This crate provides the Grocy API client, overdue detection, the polling
//! controller with its auto-check timer, and the presentation sinks that
//! deliver notifications.

pub mod config;
pub mod detect;
pub mod grocy;
pub mod notify;
pub mod scheduler;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::config::FileConfigSource;
use crate::notify::Presenter;
use crate::scheduler::{Command, PollController};

/// Start the watcher: command input and the event loop. A missing config
/// file is created and announced by the first cycle.
pub async fn serve(source: FileConfigSource, presenter: Arc<dyn Presenter>) -> Result<()> {
    let controller = PollController::new(Arc::new(source), presenter);

    // 1. Commands from stdin and Ctrl-C.
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(scheduler::read_commands(tokio::io::stdin(), tx.clone()));
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(Command::Quit).await;
        }
    });

    // 2. Event loop.
    tracing::info!("Chorewatch running. Commands: check, toggle, web, settings, quit");
    let state = scheduler::run_event_loop(controller, rx).await;
    tracing::info!(auto_check = %state, "Exiting");

    Ok(())
}
