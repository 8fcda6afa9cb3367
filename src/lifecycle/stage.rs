//! A single named startup step.

use async_trait::async_trait;

use crate::error::BootstrapResult;
use crate::process::signals::SignalListener;

/// What a successful stage leaves behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Continue with the next stage.
    Completed,
    /// The launched server exited with this code; the pipeline is over.
    Exited(i32),
}

/// One step of the startup sequence.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stable name used in logs and plans.
    fn name(&self) -> &'static str;

    /// `signals` is shared by every stage; stages that wait on something
    /// must give up (or relay) when a termination signal arrives.
    async fn run(&self, signals: &mut SignalListener) -> BootstrapResult<StageOutcome>;
}
