//! Running a child to completion.
//!
//! # Responsibilities
//! - Spawn the child with inherited stdio
//! - Relay signals received meanwhile (only termination signals are recorded)
//! - Enforce an optional deadline by killing the child

use std::time::Duration;

use tokio::process::Child;

use crate::error::{BootstrapError, BootstrapResult};
use crate::process::command::CommandSpec;
use crate::process::exit;
use crate::process::signals::{ForwardedSignal, SignalListener};
use crate::resilience::timeouts::expire;

/// How a supervised child finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildReport {
    /// Shell-style exit code.
    pub code: i32,
    /// First termination signal relayed to the child, if any.
    pub signal: Option<ForwardedSignal>,
    /// The deadline fired and the child was killed.
    pub timed_out: bool,
}

impl ChildReport {
    pub fn success(&self) -> bool {
        self.code == 0 && self.signal.is_none() && !self.timed_out
    }
}

/// Spawn `spec` and wait for it, relaying signals from `signals`, until it
/// exits or `deadline` passes.
pub async fn supervise(
    spec: &CommandSpec,
    deadline: Option<Duration>,
    signals: &mut SignalListener,
) -> BootstrapResult<ChildReport> {
    let mut child = spec.to_tokio().spawn().map_err(|source| BootstrapError::Spawn {
        program: spec.program.clone(),
        source,
    })?;
    let pid = child.id();
    tracing::debug!(pid = ?pid, command = %spec, "Child started");

    let mut received = None;
    let expiry = expire(deadline);
    tokio::pin!(expiry);

    loop {
        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|source| BootstrapError::Wait {
                    program: spec.program.clone(),
                    source,
                })?;
                let code = exit::code_from_status(status);
                tracing::debug!(pid = ?pid, code, "Child exited");
                return Ok(ChildReport { code, signal: received, timed_out: false });
            }
            Some(signal) = signals.recv() => {
                tracing::info!(pid = ?pid, signal = %signal, "Relaying signal to child");
                if signal.terminates() {
                    received.get_or_insert(signal);
                }
                relay(&mut child, pid, signal);
            }
            _ = &mut expiry => {
                tracing::warn!(
                    pid = ?pid,
                    deadline_secs = deadline.map(|d| d.as_secs()),
                    "Child exceeded its deadline, killing"
                );
                // start_kill only fails if the child already exited
                let _ = child.start_kill();
                let status = child.wait().await.map_err(|source| BootstrapError::Wait {
                    program: spec.program.clone(),
                    source,
                })?;
                return Ok(ChildReport {
                    code: exit::code_from_status(status),
                    signal: received,
                    timed_out: true,
                });
            }
        }
    }
}

#[cfg(unix)]
fn relay(_child: &mut Child, pid: Option<u32>, signal: ForwardedSignal) {
    if let Some(pid) = pid {
        if let Err(e) = crate::process::signals::forward(pid, signal) {
            tracing::warn!(pid, signal = %signal, error = %e, "Failed to relay signal");
        }
    }
}

#[cfg(not(unix))]
fn relay(child: &mut Child, _pid: Option<u32>, _signal: ForwardedSignal) {
    if let Err(e) = child.start_kill() {
        tracing::warn!(error = %e, "Failed to stop child");
    }
}
