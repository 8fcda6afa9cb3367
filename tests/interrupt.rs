//! Termination signals that land between stages.
//!
//! This binary signals its own process, so it holds a single test: any other
//! test's listener would see the signal too.

#![cfg(unix)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use service_bootstrap::config::schema::HandoffMode;
use service_bootstrap::error::{BootstrapError, BootstrapResult};
use service_bootstrap::lifecycle::launch::LaunchStage;
use service_bootstrap::lifecycle::migrate::MigrationStage;
use service_bootstrap::lifecycle::plan::MigrationPlan;
use service_bootstrap::lifecycle::{Launcher, Stage, StageOutcome, StartupPipeline};
use service_bootstrap::process::signals::{forward, ForwardedSignal, SignalListener};
use service_bootstrap::process::{CommandSpec, SystemRunner};

/// Delivers SIGTERM to this process once the previous stage has finished,
/// while no child is running.
struct TerminateSelf;

#[async_trait]
impl Stage for TerminateSelf {
    fn name(&self) -> &'static str {
        "terminate-self"
    }

    async fn run(&self, _signals: &mut SignalListener) -> BootstrapResult<StageOutcome> {
        forward(std::process::id(), ForwardedSignal::Terminate).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(StageOutcome::Completed)
    }
}

#[derive(Default)]
struct CountingLauncher {
    launched: AtomicUsize,
}

#[async_trait]
impl Launcher for CountingLauncher {
    async fn launch(
        &self,
        _spec: &CommandSpec,
        _mode: HandoffMode,
        _signals: &mut SignalListener,
    ) -> BootstrapResult<i32> {
        self.launched.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }
}

#[tokio::test]
async fn term_after_migration_prevents_launch() {
    let migration = MigrationPlan {
        command: CommandSpec::new("/bin/sh").args(["-c", "exit 0"]),
        timeout_secs: None,
    };
    let launcher = Arc::new(CountingLauncher::default());

    let pipeline = StartupPipeline::new()
        .with_stage(MigrationStage::new(&migration, Arc::new(SystemRunner)))
        .with_stage(TerminateSelf)
        .with_stage(LaunchStage::new(
            CommandSpec::new("/bin/sh").args(["-c", "exit 0"]),
            HandoffMode::Spawn,
            launcher.clone(),
        ));

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(
        err,
        BootstrapError::Interrupted {
            signal: ForwardedSignal::Terminate
        }
    ));
    assert_eq!(err.exit_code(), 128 + 15);
    assert_eq!(launcher.launched.load(Ordering::SeqCst), 0);
}
