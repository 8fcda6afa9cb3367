//! Command execution seam.
//!
//! Stages depend on [`CommandRunner`] rather than on process spawning so the
//! ordering rules can be tested without real children.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::BootstrapResult;
use crate::process::command::CommandSpec;
use crate::process::signals::SignalListener;
use crate::process::supervise::{supervise, ChildReport};

/// Runs a command to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Signals arriving on `signals` meanwhile are relayed to the child.
    async fn run(
        &self,
        spec: &CommandSpec,
        deadline: Option<Duration>,
        signals: &mut SignalListener,
    ) -> BootstrapResult<ChildReport>;
}

/// Runs commands as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        spec: &CommandSpec,
        deadline: Option<Duration>,
        signals: &mut SignalListener,
    ) -> BootstrapResult<ChildReport> {
        supervise(spec, deadline, signals).await
    }
}
