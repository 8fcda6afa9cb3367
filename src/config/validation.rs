//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports non-zero, timeouts > 0)
//! - Reject unknown `{placeholders}` in server arguments
//! - Check that resolved database URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BootstrapConfig → Result<(), Vec<ValidationError>>

use std::net::IpAddr;

use thiserror::Error;

use crate::config::schema::BootstrapConfig;
use crate::database::url::DatabaseUrls;
use crate::process::command::{unknown_placeholders, SERVER_PLACEHOLDERS};

/// Log levels the application server understands.
pub const SERVER_LOG_LEVELS: &[&str] = &["critical", "error", "warning", "warn", "info", "debug", "trace"];

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("service.name must not be empty")]
    EmptyServiceName,

    #[error("server.host {0:?} is not an IP address or hostname")]
    InvalidHost(String),

    #[error("{0} must be a non-zero port")]
    ZeroPort(&'static str),

    #[error("server.log_level {0:?} is not a known log level")]
    InvalidLogLevel(String),

    #[error("{0}.program must not be empty")]
    EmptyProgram(&'static str),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("readiness.base_delay_ms ({base}) exceeds readiness.max_delay_ms ({max})")]
    InvalidBackoff { base: u64, max: u64 },

    #[error("server.args references unknown placeholder `{0}`")]
    UnknownPlaceholder(String),

    #[error("{field} does not parse as a URL: {reason}")]
    InvalidDatabaseUrl { field: &'static str, reason: String },
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &BootstrapConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }

    let server = &config.server;
    if !is_valid_host(&server.host) {
        errors.push(ValidationError::InvalidHost(server.host.clone()));
    }
    if server.port == 0 {
        errors.push(ValidationError::ZeroPort("server.port"));
    }
    if !SERVER_LOG_LEVELS.contains(&server.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::InvalidLogLevel(server.log_level.clone()));
    }
    if server.program.trim().is_empty() {
        errors.push(ValidationError::EmptyProgram("server"));
    }
    for name in unknown_placeholders(&server.args, SERVER_PLACEHOLDERS) {
        errors.push(ValidationError::UnknownPlaceholder(name));
    }

    if config.migration.enabled && config.migration.program.trim().is_empty() {
        errors.push(ValidationError::EmptyProgram("migration"));
    }
    if config.migration.timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroDuration("migration.timeout_secs"));
    }

    if config.database.port == 0 {
        errors.push(ValidationError::ZeroPort("database.port"));
    }
    let urls = DatabaseUrls::resolve(&config.database);
    for (field, raw) in [("database.url", &urls.url), ("database.migration_url", &urls.migration_url)] {
        if let Err(e) = url::Url::parse(raw) {
            errors.push(ValidationError::InvalidDatabaseUrl {
                field,
                reason: e.to_string(),
            });
        }
    }

    let readiness = &config.readiness;
    if readiness.enabled {
        if readiness.timeout_secs == 0 {
            errors.push(ValidationError::ZeroDuration("readiness.timeout_secs"));
        }
        if readiness.connect_timeout_ms == 0 {
            errors.push(ValidationError::ZeroDuration("readiness.connect_timeout_ms"));
        }
        if readiness.base_delay_ms > readiness.max_delay_ms {
            errors.push(ValidationError::InvalidBackoff {
                base: readiness.base_delay_ms,
                max: readiness.max_delay_ms,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_host(host: &str) -> bool {
    if host.parse::<IpAddr>().is_ok() {
        return true;
    }
    !host.is_empty()
        && host.len() <= 253
        && host.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::profile::ServiceProfile;

    #[test]
    fn profile_defaults_are_valid() {
        for profile in ServiceProfile::all() {
            assert_eq!(validate_config(&profile.defaults()), Ok(()));
        }
    }

    #[test]
    fn reports_every_error() {
        let mut config = BootstrapConfig::default();
        config.service.name = " ".into();
        config.server.port = 0;
        config.server.log_level = "loud".into();
        config.server.program = String::new();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::ZeroPort("server.port")));
        assert!(errors.contains(&ValidationError::InvalidLogLevel("loud".into())));
    }

    #[test]
    fn hosts() {
        assert!(is_valid_host("0.0.0.0"));
        assert!(is_valid_host("::"));
        assert!(is_valid_host("auth-service.internal"));
        assert!(!is_valid_host(""));
        assert!(!is_valid_host("bad host"));
        assert!(!is_valid_host("-leading.dash"));
    }

    #[test]
    fn unknown_placeholder_is_rejected() {
        let mut config = BootstrapConfig::default();
        config.server.args.push("--workers={workers}".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::UnknownPlaceholder("workers".into())]
        );
    }

    #[test]
    fn disabled_migration_may_have_no_program() {
        let mut config = BootstrapConfig::default();
        config.migration.enabled = false;
        config.migration.program = String::new();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn readiness_backoff_checked_only_when_enabled() {
        let mut config = BootstrapConfig::default();
        config.readiness.base_delay_ms = 10_000;
        config.readiness.max_delay_ms = 100;
        assert!(validate_config(&config).is_ok());

        config.readiness.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidBackoff { .. }));
    }

    #[test]
    fn garbage_database_url() {
        let mut config = BootstrapConfig::default();
        config.database.url = "not a url".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::InvalidDatabaseUrl { field: "database.url", .. }
        ));
    }
}
