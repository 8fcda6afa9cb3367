//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Waiting on an external collaborator:
//!     → timeouts.rs (optional deadline around a child or probe)
//!     → backoff.rs (delay between readiness probes)
//! ```
//!
//! # Design Decisions
//! - Retrying a failed migration is the supervisor's job, never ours
//! - Probes back off with jitter so restarted replicas do not stampede
//! - A missing deadline means "wait forever", expressed as a pending future

pub mod backoff;
pub mod timeouts;

pub use backoff::Backoff;
pub use timeouts::{expire, seconds};
