//! Configuration loading.
//!
//! Layers, lowest precedence first: profile defaults, TOML file, environment,
//! CLI overrides. The file is merged table-by-table over the serialized
//! defaults, so a file only needs the keys it changes.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::profile::ServiceProfile;
use crate::config::schema::{BootstrapConfig, HandoffMode, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot serialize defaults: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Env {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values given on the command line. They win over every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub reload: Option<bool>,
    pub handoff: Option<HandoffMode>,
    pub skip_migrations: bool,
    pub migration_timeout_secs: Option<u64>,
}

type EnvSource = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Builds a validated [`BootstrapConfig`] from all sources.
pub struct ConfigLoader {
    profile: Option<ServiceProfile>,
    file: Option<PathBuf>,
    overrides: Overrides,
    env: EnvSource,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader reading the process environment.
    pub fn new() -> Self {
        Self {
            profile: None,
            file: None,
            overrides: Overrides::default(),
            env: Box::new(|key| std::env::var(key).ok()),
        }
    }

    /// Force a profile. Otherwise the file's `service.profile` or the default
    /// profile is used.
    pub fn profile(mut self, profile: Option<ServiceProfile>) -> Self {
        self.profile = profile;
        self
    }

    pub fn file(mut self, path: Option<PathBuf>) -> Self {
        self.file = path;
        self
    }

    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Replace the environment with a fixed map.
    pub fn env_map(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Box::new(move |key| vars.get(key).cloned());
        self
    }

    /// Load, merge and validate.
    pub fn load(&self) -> Result<BootstrapConfig, ConfigError> {
        let file = match &self.file {
            Some(path) => Some(read_table(path)?),
            None => None,
        };

        let profile = match self.profile {
            Some(profile) => profile,
            None => file
                .as_ref()
                .map(profile_from_table)
                .transpose()?
                .flatten()
                .unwrap_or_default(),
        };

        let mut merged = match toml::Value::try_from(profile.defaults())? {
            toml::Value::Table(table) => table,
            _ => toml::Table::new(),
        };
        if let Some(file) = file {
            merge_tables(&mut merged, file);
        }
        let mut config: BootstrapConfig = toml::Value::Table(merged).try_into()?;
        config.service.profile = profile;

        self.apply_env(&mut config)?;
        apply_overrides(&mut config, &self.overrides);
        config.server.log_level = config.server.log_level.to_ascii_lowercase();

        validate_config(&config).map_err(ConfigError::Validation)?;

        tracing::debug!(
            profile = %profile,
            file = ?self.file,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn var(&self, key: &str) -> Option<String> {
        (self.env)(key).filter(|v| !v.is_empty())
    }

    fn apply_env(&self, config: &mut BootstrapConfig) -> Result<(), ConfigError> {
        if let Some(v) = self.var("SERVICE_NAME") {
            config.service.name = v;
        }
        if let Some(v) = self.var("APP_HOST") {
            config.server.host = v;
        }
        if let Some(v) = self.var("APP_PORT") {
            config.server.port = parse_env("APP_PORT", v)?;
        }
        if let Some(v) = self.var("LOG_LEVEL") {
            config.server.log_level = v;
        }
        if let Some(v) = self.var("BOOTSTRAP_RELOAD") {
            config.server.reload = parse_bool("BOOTSTRAP_RELOAD", v)?;
        }
        if let Some(v) = self.var("BOOTSTRAP_HANDOFF") {
            config.server.handoff = match v.to_ascii_lowercase().as_str() {
                "exec" => HandoffMode::Exec,
                "spawn" => HandoffMode::Spawn,
                _ => {
                    return Err(ConfigError::Env {
                        key: "BOOTSTRAP_HANDOFF",
                        value: v,
                        reason: "expected exec or spawn".into(),
                    })
                }
            };
        }
        if let Some(v) = self.var("BOOTSTRAP_MIGRATION_TIMEOUT") {
            config.migration.timeout_secs = Some(parse_env("BOOTSTRAP_MIGRATION_TIMEOUT", v)?);
        }
        if let Some(v) = self.var("BOOTSTRAP_LOG_FORMAT") {
            config.observability.log_format = match v.to_ascii_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::Env {
                        key: "BOOTSTRAP_LOG_FORMAT",
                        value: v,
                        reason: "expected text or json".into(),
                    })
                }
            };
        }

        let db = &mut config.database;
        if let Some(v) = self.var("DATABASE_URL") {
            db.url = v;
        }
        if let Some(v) = self.var("ALEMBIC_URL") {
            db.migration_url = v;
        }
        if let Some(v) = self.var("DATABASE_USER") {
            db.user = v;
        }
        if let Some(v) = self.var("DATABASE_PASSWORD") {
            db.password = v;
        }
        if let Some(v) = self.var("DATABASE_HOST") {
            db.host = v;
        }
        if let Some(v) = self.var("DATABASE_PORT") {
            db.port = parse_env("DATABASE_PORT", v)?;
        }
        if let Some(v) = self.var("DATABASE_NAME") {
            db.name = v;
        }
        Ok(())
    }
}

fn apply_overrides(config: &mut BootstrapConfig, overrides: &Overrides) {
    if let Some(host) = &overrides.host {
        config.server.host = host.clone();
    }
    if let Some(port) = overrides.port {
        config.server.port = port;
    }
    if let Some(level) = &overrides.log_level {
        config.server.log_level = level.clone();
    }
    if let Some(reload) = overrides.reload {
        config.server.reload = reload;
    }
    if let Some(handoff) = overrides.handoff {
        config.server.handoff = handoff;
    }
    if overrides.skip_migrations {
        config.migration.enabled = false;
    }
    if let Some(secs) = overrides.migration_timeout_secs {
        config.migration.timeout_secs = Some(secs);
    }
}

fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

fn profile_from_table(table: &toml::Table) -> Result<Option<ServiceProfile>, ConfigError> {
    match table.get("service").and_then(|s| s.get("profile")) {
        Some(value) => Ok(Some(value.clone().try_into()?)),
        None => Ok(None),
    }
}

/// Recursively overlay `overlay` onto `base`. Tables merge; everything else
/// (including arrays) is replaced.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn parse_env<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Env {
        key,
        reason: e.to_string(),
        value,
    })
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Env {
            key,
            value,
            reason: "expected a boolean".into(),
        }),
    }
}
