//! Resolving configuration into concrete commands.
//!
//! The plan is pure data: nothing here touches the network or spawns
//! anything, so `service-bootstrap plan` can print it as-is.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::profile::ServiceProfile;
use crate::config::schema::{BootstrapConfig, HandoffMode, ReadinessConfig};
use crate::database::readiness::ReadinessStage;
use crate::database::url::{DatabaseUrls, Endpoint};
use crate::lifecycle::launch::LaunchStage;
use crate::lifecycle::migrate::MigrationStage;
use crate::lifecycle::preflight::PortCheckStage;
use crate::process::command::{expand, CommandSpec};

/// Everything the startup pipeline needs, fully resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchPlan {
    pub service: String,
    pub profile: ServiceProfile,

    /// Stages `run` will execute, in order.
    pub stages: Vec<&'static str>,

    /// Probe target and timings, when the readiness stage is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness: Option<ReadinessPlan>,

    /// Migration command, when the migration stage is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration: Option<MigrationPlan>,

    /// Address the server binds.
    pub bind: Endpoint,

    /// Run the bind pre-flight before launching.
    pub check_port: bool,

    pub handoff: HandoffMode,

    pub server: CommandSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadinessPlan {
    pub endpoint: Endpoint,
    pub settings: ReadinessConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationPlan {
    pub command: CommandSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl LaunchPlan {
    pub fn from_config(config: &BootstrapConfig) -> Self {
        let urls = DatabaseUrls::resolve(&config.database);
        let server_cfg = &config.server;

        let mut shared_env = BTreeMap::new();
        shared_env.insert("SERVICE_NAME".to_string(), config.service.name.clone());
        shared_env.insert("DATABASE_URL".to_string(), urls.url.clone());
        shared_env.insert("ALEMBIC_URL".to_string(), urls.migration_url.clone());

        let readiness = if config.readiness.enabled {
            match urls.endpoint() {
                Some(endpoint) => Some(ReadinessPlan {
                    endpoint,
                    settings: config.readiness.clone(),
                }),
                None => {
                    tracing::warn!(
                        url = %crate::database::url::redact(&urls.migration_url),
                        "Readiness probe enabled but the database URL has no host, skipping"
                    );
                    None
                }
            }
        } else {
            None
        };

        let migration = config.migration.enabled.then(|| MigrationPlan {
            command: CommandSpec::new(&config.migration.program)
                .args(config.migration.args.iter().cloned())
                .envs(shared_env.clone())
                .envs(config.migration.env.clone())
                .working_dir(config.service.working_dir.clone()),
            timeout_secs: config.migration.timeout_secs,
        });

        let values = BTreeMap::from([
            ("app", server_cfg.app.clone()),
            ("host", server_cfg.host.clone()),
            ("port", server_cfg.port.to_string()),
            ("log_level", server_cfg.log_level.clone()),
            ("service", config.service.name.clone()),
        ]);
        let mut args: Vec<String> = server_cfg.args.iter().map(|a| expand(a, &values)).collect();
        if server_cfg.reload {
            args.extend(server_cfg.reload_args.iter().cloned());
        }

        let server = CommandSpec::new(&server_cfg.program)
            .args(args)
            .envs(shared_env)
            .env("APP_HOST", &server_cfg.host)
            .env("APP_PORT", server_cfg.port.to_string())
            .env("LOG_LEVEL", &server_cfg.log_level)
            .envs(server_cfg.env.clone())
            .working_dir(config.service.working_dir.clone());

        let stages = [
            readiness.as_ref().map(|_| ReadinessStage::NAME),
            migration.as_ref().map(|_| MigrationStage::NAME),
            server_cfg.check_port.then_some(PortCheckStage::NAME),
            Some(LaunchStage::NAME),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self {
            service: config.service.name.clone(),
            profile: config.service.profile,
            stages,
            readiness,
            migration,
            bind: Endpoint {
                host: server_cfg.host.clone(),
                port: server_cfg.port,
            },
            check_port: server_cfg.check_port,
            handoff: server_cfg.handoff,
            server,
        }
    }

    /// Copy safe to print or log.
    pub fn redacted(&self) -> Self {
        let mut plan = self.clone();
        plan.server = plan.server.redacted();
        if let Some(migration) = plan.migration.as_mut() {
            migration.command = migration.command.redacted();
        }
        plan
    }
}
