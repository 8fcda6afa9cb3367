//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! profile.rs (per-service defaults)
//!     → loader.rs (merge TOML file over defaults)
//!     → loader.rs (environment overrides, then CLI overrides)
//!     → validation.rs (semantic checks)
//!     → BootstrapConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - One binary serves every service; the profile supplies the differences
//! - All fields have defaults so an empty file is a valid config
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod profile;
pub mod schema;
pub mod validation;

pub use loader::{ConfigError, ConfigLoader, Overrides};
pub use profile::ServiceProfile;
pub use schema::{
    BootstrapConfig, DatabaseConfig, HandoffMode, LogFormat, MigrationConfig,
    ObservabilityConfig, ReadinessConfig, ServerConfig, ServiceConfig,
};
