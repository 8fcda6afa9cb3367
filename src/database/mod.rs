//! Database settings handed to the external collaborators.
//!
//! # Data Flow
//! ```text
//! DatabaseConfig (templates + parts)
//!     → url.rs (substitute ${VAR}, redact for logs, extract host:port)
//!     → DATABASE_URL / ALEMBIC_URL in the children's environment
//!     → readiness.rs (optional TCP probe before migrating)
//! ```
//!
//! # Design Decisions
//! - The bootstrap never speaks the database protocol; the migration tool does
//! - Credentials never reach the logs unredacted

pub mod readiness;
pub mod url;

pub use readiness::{wait_for_endpoint, ReadinessStage};
pub use url::{redact, DatabaseUrls, Endpoint};
