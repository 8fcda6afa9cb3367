//! Launch stage: always last.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::schema::HandoffMode;
use crate::error::BootstrapResult;
use crate::lifecycle::handoff::Launcher;
use crate::lifecycle::stage::{Stage, StageOutcome};
use crate::process::command::CommandSpec;
use crate::process::signals::SignalListener;

pub struct LaunchStage {
    command: CommandSpec,
    mode: HandoffMode,
    launcher: Arc<dyn Launcher>,
}

impl LaunchStage {
    pub const NAME: &'static str = "launch";

    pub fn new(command: CommandSpec, mode: HandoffMode, launcher: Arc<dyn Launcher>) -> Self {
        Self {
            command,
            mode,
            launcher,
        }
    }
}

#[async_trait]
impl Stage for LaunchStage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(&self, signals: &mut SignalListener) -> BootstrapResult<StageOutcome> {
        let code = self.launcher.launch(&self.command, self.mode, signals).await?;
        Ok(StageOutcome::Exited(code))
    }
}
