//! Service bootstrap library.
//!
//! Boots a backend service in two ordered steps: bring the database schema to
//! the latest revision with an external migration tool, then hand the process
//! over to the service's HTTP application server.
//!
//! # Architecture Overview
//!
//! ```text
//!   profile defaults ─┐
//!   TOML file ────────┼─▶ config ──▶ lifecycle::plan ──▶ lifecycle::startup
//!   environment ──────┤                                     │
//!   CLI flags ────────┘                                     ▼
//!                              ┌───────────┐   ┌───────────┐   ┌───────────┐   ┌──────────┐
//!                              │ readiness │──▶│ migration │──▶│ preflight │──▶│  launch  │
//!                              │ (database)│   │ (process) │   │  (port)   │   │ (handoff)│
//!                              └───────────┘   └───────────┘   └───────────┘   └──────────┘
//!                                    any stage failure ──▶ {aborted}, exit code
//! ```

pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod process;
pub mod resilience;

pub use config::schema::BootstrapConfig;
pub use error::BootstrapError;
pub use lifecycle::StartupPipeline;
