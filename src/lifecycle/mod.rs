//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Plan (plan.rs):
//!     BootstrapConfig → LaunchPlan (resolved commands, env, bind address)
//!
//! Startup (startup.rs):
//!     readiness → migrate → preflight → launch, halting at the first failure
//!
//! Handoff (handoff.rs):
//!     exec: server replaces the bootstrap process
//!     spawn: server runs as a child, signals relayed, exit code propagated
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, nothing is retried here
//! - Stages run in order, never concurrently
//! - Launch is always the last stage; nothing runs after handoff

pub mod handoff;
pub mod launch;
pub mod migrate;
pub mod plan;
pub mod preflight;
pub mod stage;
pub mod startup;

pub use handoff::{Launcher, ProcessLauncher};
pub use plan::LaunchPlan;
pub use stage::{Stage, StageOutcome};
pub use startup::{BootstrapOutcome, PipelineScope, StartupPipeline};
