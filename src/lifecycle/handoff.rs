//! Handing the process over to the application server.
//!
//! # Modes
//! - `exec`: `execvp` the server. Its pid, signals and exit code are the
//!   bootstrap's, because it *is* the bootstrap process now.
//! - `spawn`: run the server as a child, relay signals to it, and exit with
//!   its exit code. Used where `exec` is unavailable or unwanted.
//!
//! A termination signal already pending when `exec` is about to happen
//! aborts the handoff instead.

use async_trait::async_trait;

use crate::config::schema::HandoffMode;
use crate::error::{BootstrapError, BootstrapResult};
use crate::process::command::CommandSpec;
use crate::process::signals::SignalListener;
use crate::process::supervise::supervise;

/// Starts the application server.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Returns the server's exit code. In `exec` mode it only returns on
    /// failure.
    async fn launch(
        &self,
        spec: &CommandSpec,
        mode: HandoffMode,
        signals: &mut SignalListener,
    ) -> BootstrapResult<i32>;
}

/// Launches the server as a real process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(
        &self,
        spec: &CommandSpec,
        mode: HandoffMode,
        signals: &mut SignalListener,
    ) -> BootstrapResult<i32> {
        tracing::info!(command = %spec, handoff = %mode, "Launching application server");
        match mode {
            HandoffMode::Exec => exec(spec, signals).await,
            HandoffMode::Spawn => spawn(spec, signals).await,
        }
    }
}

#[cfg(unix)]
async fn exec(spec: &CommandSpec, signals: &mut SignalListener) -> BootstrapResult<i32> {
    use std::os::unix::process::CommandExt;

    if let Some(signal) = signals.pending_termination().await {
        return Err(BootstrapError::Interrupted { signal });
    }

    // Only returns if the exec itself failed.
    let source = spec.to_std().exec();
    Err(BootstrapError::Spawn {
        program: spec.program.clone(),
        source,
    })
}

#[cfg(not(unix))]
async fn exec(spec: &CommandSpec, signals: &mut SignalListener) -> BootstrapResult<i32> {
    tracing::warn!("Process replacement is unavailable on this platform, spawning instead");
    spawn(spec, signals).await
}

async fn spawn(spec: &CommandSpec, signals: &mut SignalListener) -> BootstrapResult<i32> {
    let report = supervise(spec, None, signals).await?;
    tracing::info!(
        code = report.code,
        signal = report.signal.map(|s| s.name()),
        "Application server exited"
    );
    Ok(report.code)
}
