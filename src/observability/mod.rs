//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every stage emits:
//!     → logging.rs (structured events on stderr)
//!
//! Consumers:
//!     → container log collection
//! ```
//!
//! # Design Decisions
//! - Logs go to stderr; stdout belongs to the children
//! - JSON for production, text for development
//! - The bootstrap's log level is independent of the server's `--log-level`

pub mod logging;

pub use logging::init_logging;
