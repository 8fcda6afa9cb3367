//! Migration stage.
//!
//! Runs the migration tool's "upgrade to latest" command and turns its
//! outcome into a stage result. Any non-zero exit aborts startup with the
//! tool's own exit code.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::error::{BootstrapError, BootstrapResult};
use crate::lifecycle::plan::MigrationPlan;
use crate::lifecycle::stage::{Stage, StageOutcome};
use crate::process::command::CommandSpec;
use crate::process::runner::CommandRunner;
use crate::process::signals::SignalListener;
use crate::resilience::timeouts::seconds;

pub struct MigrationStage {
    command: CommandSpec,
    timeout_secs: Option<u64>,
    runner: Arc<dyn CommandRunner>,
}

impl MigrationStage {
    pub const NAME: &'static str = "migration";

    pub fn new(plan: &MigrationPlan, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            command: plan.command.clone(),
            timeout_secs: plan.timeout_secs,
            runner,
        }
    }
}

#[async_trait]
impl Stage for MigrationStage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(&self, signals: &mut SignalListener) -> BootstrapResult<StageOutcome> {
        tracing::info!(
            command = %self.command,
            timeout_secs = self.timeout_secs,
            "Upgrading database schema to latest revision"
        );
        let started = Instant::now();
        let report = self
            .runner
            .run(&self.command, seconds(self.timeout_secs), signals)
            .await?;

        if report.success() {
            tracing::info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Database schema is up to date"
            );
            return Ok(StageOutcome::Completed);
        }
        if let Some(signal) = report.signal {
            return Err(BootstrapError::Interrupted { signal });
        }
        if report.timed_out {
            return Err(BootstrapError::MigrationTimedOut {
                secs: self.timeout_secs.unwrap_or_default(),
            });
        }
        Err(BootstrapError::MigrationFailed { code: report.code })
    }
}
