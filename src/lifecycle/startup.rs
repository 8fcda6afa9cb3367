//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the ordered stage list from a [`LaunchPlan`]
//! - Run stages one at a time, logging each
//! - Stop at the first failure and surface its error (and exit code)
//! - Own the signal listener for the whole sequence and stop before the next
//!   stage once a termination signal has arrived
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Stages run in order, not concurrently
//! - Launch runs last (traffic only after the schema is current)

use std::sync::Arc;
use std::time::Instant;

use crate::database::readiness::ReadinessStage;
use crate::error::{BootstrapError, BootstrapResult};
use crate::lifecycle::handoff::Launcher;
use crate::lifecycle::launch::LaunchStage;
use crate::lifecycle::migrate::MigrationStage;
use crate::lifecycle::plan::LaunchPlan;
use crate::lifecycle::preflight::PortCheckStage;
use crate::lifecycle::stage::{Stage, StageOutcome};
use crate::process::runner::CommandRunner;
use crate::process::signals::SignalListener;

/// Which part of the sequence to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineScope {
    /// Every stage, ending in the server handoff.
    Full,
    /// Readiness and migration only.
    MigrateOnly,
}

/// Result of a pipeline that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapOutcome {
    /// Stages that finished, in order.
    pub completed: Vec<&'static str>,
    /// Exit code for the bootstrap process.
    pub exit_code: i32,
}

/// Ordered list of startup stages.
#[derive(Default)]
pub struct StartupPipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl StartupPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    pub fn with_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Standard pipeline: readiness → migration → preflight → launch.
    pub fn build(
        plan: &LaunchPlan,
        scope: PipelineScope,
        runner: Arc<dyn CommandRunner>,
        launcher: Arc<dyn Launcher>,
    ) -> Self {
        let mut pipeline = Self::new();

        if let Some(readiness) = &plan.readiness {
            pipeline = pipeline.with_stage(ReadinessStage::new(
                readiness.endpoint.clone(),
                readiness.settings.clone(),
            ));
        }
        if let Some(migration) = &plan.migration {
            pipeline = pipeline.with_stage(MigrationStage::new(migration, runner));
        }
        if scope == PipelineScope::MigrateOnly {
            return pipeline;
        }
        if plan.check_port {
            pipeline = pipeline.with_stage(PortCheckStage::new(plan.bind.clone()));
        }
        pipeline.with_stage(LaunchStage::new(plan.server.clone(), plan.handoff, launcher))
    }

    /// Install signal handlers and run every stage in order.
    pub async fn run(self) -> BootstrapResult<BootstrapOutcome> {
        let mut signals = SignalListener::install().map_err(BootstrapError::Signals)?;
        self.run_with(&mut signals).await
    }

    /// Run every stage in order, sharing `signals` between them.
    pub async fn run_with(self, signals: &mut SignalListener) -> BootstrapResult<BootstrapOutcome> {
        let mut completed = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let name = stage.name();
            if let Some(signal) = signals.pending_termination().await {
                return Err(aborted(name, BootstrapError::Interrupted { signal }));
            }

            let started = Instant::now();
            tracing::debug!(stage = name, "Stage starting");

            match stage.run(signals).await {
                Ok(StageOutcome::Completed) => {
                    tracing::debug!(
                        stage = name,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Stage completed"
                    );
                    completed.push(name);
                }
                Ok(StageOutcome::Exited(code)) => {
                    completed.push(name);
                    return Ok(BootstrapOutcome {
                        completed,
                        exit_code: code,
                    });
                }
                Err(e) => return Err(aborted(name, e)),
            }
        }

        Ok(BootstrapOutcome {
            completed,
            exit_code: 0,
        })
    }
}

fn aborted(stage: &'static str, e: BootstrapError) -> BootstrapError {
    tracing::error!(
        stage,
        error = %e,
        exit_code = e.exit_code(),
        "Startup aborted"
    );
    e
}
