//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bootstrap.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::profile::ServiceProfile;

/// Root configuration for one service bootstrap.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Which service is being booted.
    pub service: ServiceConfig,

    /// Database connection settings handed to the migration tool and server.
    pub database: DatabaseConfig,

    /// Optional wait for the database to accept connections.
    pub readiness: ReadinessConfig,

    /// Migration stage settings.
    pub migration: MigrationConfig,

    /// Application server launch settings.
    pub server: ServerConfig,

    /// The bootstrap's own logging.
    pub observability: ObservabilityConfig,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        ServiceProfile::default().defaults()
    }
}

/// Service identity.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Profile the defaults came from.
    pub profile: ServiceProfile,

    /// Human-readable service name, exported as `SERVICE_NAME`.
    pub name: String,

    /// Working directory for both child processes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let profile = ServiceProfile::default();
        Self {
            profile,
            name: profile.service_name().to_string(),
            working_dir: None,
        }
    }
}

/// Database connection settings.
///
/// `url` and `migration_url` are templates: `${DATABASE_USER}`,
/// `${DATABASE_PASSWORD}`, `${DATABASE_HOST}`, `${DATABASE_PORT}` and
/// `${DATABASE_NAME}` are substituted from the fields below.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Application connection URL (async driver), exported as `DATABASE_URL`.
    pub url: String,

    /// Migration connection URL (sync driver), exported as `ALEMBIC_URL`.
    pub migration_url: String,

    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub name: String,
}

pub const DEFAULT_DATABASE_URL: &str =
    "postgresql+asyncpg://${DATABASE_USER}:${DATABASE_PASSWORD}@${DATABASE_HOST}:${DATABASE_PORT}/${DATABASE_NAME}";

pub const DEFAULT_MIGRATION_URL: &str =
    "postgresql://${DATABASE_USER}:${DATABASE_PASSWORD}@${DATABASE_HOST}:${DATABASE_PORT}/${DATABASE_NAME}";

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            migration_url: DEFAULT_MIGRATION_URL.to_string(),
            user: "bot_user".to_string(),
            password: "bot_password".to_string(),
            host: "localhost".to_string(),
            port: 5432,
            name: ServiceProfile::default().database_name().to_string(),
        }
    }
}

/// Database readiness probe.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Probe the database endpoint before migrating.
    pub enabled: bool,

    /// Overall deadline for the database to become reachable, in seconds.
    pub timeout_secs: u64,

    /// Per-attempt TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_secs: 30,
            connect_timeout_ms: 1000,
            base_delay_ms: 200,
            max_delay_ms: 5000,
        }
    }
}

/// Migration stage.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MigrationConfig {
    /// Run the migration stage at all.
    pub enabled: bool,

    /// Migration tool executable.
    pub program: String,

    /// Arguments for the "upgrade to latest revision" operation.
    pub args: Vec<String>,

    /// Extra environment for the migration child.
    pub env: BTreeMap<String, String>,

    /// Kill the migration after this many seconds. Unbounded when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "alembic".to_string(),
            args: vec!["upgrade".to_string(), "head".to_string()],
            env: BTreeMap::new(),
            timeout_secs: None,
        }
    }
}

/// Application server launch.
///
/// `args` may reference `{app}`, `{host}`, `{port}`, `{log_level}` and
/// `{service}`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Application server executable.
    pub program: String,

    /// Argument templates.
    pub args: Vec<String>,

    /// Application object location (module:attribute).
    pub app: String,

    /// Bind host (wildcard by default).
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Server log verbosity.
    pub log_level: String,

    /// Restart workers on source change. Development only.
    pub reload: bool,

    /// Arguments appended when `reload` is on.
    pub reload_args: Vec<String>,

    /// Extra environment for the server.
    pub env: BTreeMap<String, String>,

    /// How the bootstrap hands its process over to the server.
    pub handoff: HandoffMode,

    /// Fail before launch if the bind address is already taken.
    pub check_port: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            program: "uvicorn".to_string(),
            args: [
                "{app}",
                "--host",
                "{host}",
                "--port",
                "{port}",
                "--log-level",
                "{log_level}",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            app: "src.app:app".to_string(),
            host: "0.0.0.0".to_string(),
            port: ServiceProfile::default().default_port(),
            log_level: "info".to_string(),
            reload: false,
            reload_args: vec!["--reload".to_string()],
            env: BTreeMap::new(),
            handoff: HandoffMode::default(),
            check_port: true,
        }
    }
}

/// Process handoff strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HandoffMode {
    /// Replace the bootstrap process image with the server.
    Exec,
    /// Run the server as a child, forwarding signals and its exit code.
    Spawn,
}

impl Default for HandoffMode {
    fn default() -> Self {
        if cfg!(unix) {
            HandoffMode::Exec
        } else {
            HandoffMode::Spawn
        }
    }
}

impl std::fmt::Display for HandoffMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandoffMode::Exec => write!(f, "exec"),
            HandoffMode::Spawn => write!(f, "spawn"),
        }
    }
}

/// Observability configuration for the bootstrap itself.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line events.
    Text,
    /// One JSON object per event.
    Json,
}
