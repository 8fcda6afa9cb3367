//! Fatal startup errors and their exit codes.
//!
//! Every failure during bootstrap is terminal. The only thing the error decides
//! is the exit code the supervisor (container runtime, process manager) sees.

use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::process::exit;
use crate::process::signals::ForwardedSignal;

/// Errors that abort the startup sequence.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The database endpoint never accepted a connection before the deadline.
    #[error("database at {endpoint} not reachable after {waited_secs}s")]
    DatabaseUnavailable { endpoint: String, waited_secs: u64 },

    /// The migration command exited with a non-zero code.
    #[error("migration exited with code {code}")]
    MigrationFailed { code: i32 },

    /// The migration command ran past its deadline and was killed.
    #[error("migration timed out after {secs}s")]
    MigrationTimedOut { secs: u64 },

    /// A child process could not be started (or `exec` failed).
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on a running child failed.
    #[error("failed to wait on `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The server's bind address is already taken.
    #[error("bind address {addr} is already in use")]
    PortInUse { addr: String },

    /// Signal handlers could not be registered.
    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),

    /// A termination signal arrived before the server was launched.
    #[error("startup interrupted by {signal}")]
    Interrupted { signal: ForwardedSignal },
}

impl BootstrapError {
    /// Exit code reported to the supervising process.
    pub fn exit_code(&self) -> i32 {
        match self {
            BootstrapError::Config(_) => exit::USAGE,
            BootstrapError::DatabaseUnavailable { .. } => exit::UNAVAILABLE,
            BootstrapError::MigrationFailed { code } => *code,
            BootstrapError::MigrationTimedOut { .. } => exit::TIMED_OUT,
            BootstrapError::Spawn { source, .. } => exit::spawn_failure_code(source),
            BootstrapError::Wait { .. } | BootstrapError::Signals(_) => exit::GENERAL_FAILURE,
            BootstrapError::PortInUse { .. } => exit::ADDR_IN_USE,
            BootstrapError::Interrupted { signal } => exit::SIGNAL_BASE + signal.number(),
        }
    }
}

/// Result type for bootstrap operations.
pub type BootstrapResult<T> = Result<T, BootstrapError>;
