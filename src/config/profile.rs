//! Built-in service profiles.
//!
//! The services differ only in name, port and database; everything else is
//! shared.

use serde::{Deserialize, Serialize};

use crate::config::schema::{BootstrapConfig, DatabaseConfig, ServerConfig, ServiceConfig};

/// A service this binary knows how to boot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceProfile {
    /// Data Storage Service.
    #[default]
    DataStorage,
    /// Auth Service.
    Auth,
}

impl ServiceProfile {
    pub fn service_name(self) -> &'static str {
        match self {
            ServiceProfile::DataStorage => "DataStorageService",
            ServiceProfile::Auth => "AuthService",
        }
    }

    /// Port the service listens on unless overridden.
    pub fn default_port(self) -> u16 {
        match self {
            ServiceProfile::DataStorage => 8001,
            ServiceProfile::Auth => 8002,
        }
    }

    pub fn database_name(self) -> &'static str {
        match self {
            ServiceProfile::DataStorage => "data_storage_service",
            ServiceProfile::Auth => "auth_service_db",
        }
    }

    /// Full default configuration for this profile.
    pub fn defaults(self) -> BootstrapConfig {
        BootstrapConfig {
            service: ServiceConfig {
                profile: self,
                name: self.service_name().to_string(),
                working_dir: None,
            },
            database: DatabaseConfig {
                name: self.database_name().to_string(),
                ..DatabaseConfig::default()
            },
            readiness: Default::default(),
            migration: Default::default(),
            server: ServerConfig {
                port: self.default_port(),
                ..ServerConfig::default()
            },
            observability: Default::default(),
        }
    }

    pub fn all() -> [ServiceProfile; 2] {
        [ServiceProfile::DataStorage, ServiceProfile::Auth]
    }
}

impl std::fmt::Display for ServiceProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceProfile::DataStorage => write!(f, "data-storage"),
            ServiceProfile::Auth => write!(f, "auth"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_and_auth_ports() {
        assert_eq!(ServiceProfile::DataStorage.defaults().server.port, 8001);
        assert_eq!(ServiceProfile::Auth.defaults().server.port, 8002);
    }

    #[test]
    fn profiles_never_share_a_port() {
        let [a, b] = ServiceProfile::all();
        assert_ne!(a.default_port(), b.default_port());
    }

    #[test]
    fn both_profiles_bind_wildcard_at_info() {
        for profile in ServiceProfile::all() {
            let config = profile.defaults();
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.server.log_level, "info");
            assert_eq!(config.migration.args, vec!["upgrade", "head"]);
        }
    }

    #[test]
    fn auth_profile_names() {
        let config = ServiceProfile::Auth.defaults();
        assert_eq!(config.service.name, "AuthService");
        assert_eq!(config.database.name, "auth_service_db");
    }
}
