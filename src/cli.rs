//! Command-line interface.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::loader::{ConfigLoader, Overrides};
use crate::config::profile::ServiceProfile;
use crate::config::schema::{HandoffMode, ObservabilityConfig};
use crate::lifecycle::handoff::ProcessLauncher;
use crate::lifecycle::plan::LaunchPlan;
use crate::lifecycle::startup::{PipelineScope, StartupPipeline};
use crate::observability::init_logging;
use crate::process::exit;
use crate::process::runner::SystemRunner;

#[derive(Parser, Debug)]
#[command(name = "service-bootstrap", version)]
#[command(about = "Migrate a service's database, then hand off to its application server", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "BOOTSTRAP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Service to boot
    #[arg(short, long, value_enum, env = "BOOTSTRAP_PROFILE", global = true)]
    pub profile: Option<ServiceProfile>,

    /// Override the bind host
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Override the bind port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Override the server log level
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Enable server auto-reload (development only)
    #[arg(long, global = true)]
    pub reload: bool,

    /// How to hand the process over to the server
    #[arg(long, value_enum, global = true)]
    pub handoff: Option<HandoffMode>,

    /// Do not run the migration stage
    #[arg(long, global = true)]
    pub skip_migrations: bool,

    /// Kill the migration after SECS seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub migration_timeout: Option<u64>,

    /// dotenv file to load (default: ./.env when present)
    #[arg(long, value_name = "PATH", global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run every stage and hand off to the server (default)
    Run,
    /// Run the readiness and migration stages only
    Migrate,
    /// Print the resolved plan as JSON without running anything
    Plan,
    /// Load and validate configuration
    Check,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            log_level: self.log_level.clone(),
            reload: self.reload.then_some(true),
            handoff: self.handoff,
            skip_migrations: self.skip_migrations,
            migration_timeout_secs: self.migration_timeout,
        }
    }
}

/// Run the CLI and return the process exit code.
pub async fn run(cli: Cli) -> i32 {
    let env_file = load_env_file(cli.env_file.as_deref());

    let loaded = ConfigLoader::new()
        .profile(cli.profile)
        .file(cli.config.clone())
        .overrides(cli.overrides())
        .load();

    let config = match (env_file, loaded) {
        (Err(e), _) => {
            init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Cannot load env file");
            return exit::USAGE;
        }
        (Ok(_), Err(e)) => {
            init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Invalid configuration");
            return exit::USAGE;
        }
        (Ok(env_path), Ok(config)) => {
            init_logging(&config.observability);
            if let Some(path) = env_path {
                tracing::debug!(path = %path.display(), "Loaded env file");
            }
            config
        }
    };

    let plan = LaunchPlan::from_config(&config);
    let command = cli.command.unwrap_or(Commands::Run);
    tracing::info!(
        service = %plan.service,
        profile = %plan.profile,
        bind = %plan.bind,
        reload = config.server.reload,
        "service-bootstrap v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    match command {
        Commands::Check => {
            tracing::info!("Configuration is valid");
            0
        }
        Commands::Plan => print_plan(&plan),
        Commands::Migrate => execute(&plan, PipelineScope::MigrateOnly).await,
        Commands::Run => execute(&plan, PipelineScope::Full).await,
    }
}

async fn execute(plan: &LaunchPlan, scope: PipelineScope) -> i32 {
    if plan.handoff == HandoffMode::Spawn || scope == PipelineScope::MigrateOnly {
        tracing::debug!(?scope, "Bootstrap stays resident");
    }
    let pipeline = StartupPipeline::build(
        plan,
        scope,
        Arc::new(SystemRunner),
        Arc::new(ProcessLauncher),
    );
    match pipeline.run().await {
        Ok(outcome) => {
            tracing::info!(
                stages = ?outcome.completed,
                exit_code = outcome.exit_code,
                "Bootstrap finished"
            );
            outcome.exit_code
        }
        Err(e) => e.exit_code(),
    }
}

fn print_plan(plan: &LaunchPlan) -> i32 {
    match serde_json::to_string_pretty(&plan.redacted()) {
        Ok(json) => {
            println!("{json}");
            0
        }
        Err(e) => {
            tracing::error!(error = %e, "Cannot render plan");
            exit::GENERAL_FAILURE
        }
    }
}

/// Load an explicit dotenv file, or `./.env` when it exists. Variables
/// already set in the environment win.
fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, dotenvy::Error> {
    match path {
        Some(path) => dotenvy::from_path(path).map(|_| Some(path.to_path_buf())),
        None => match dotenvy::dotenv() {
            Ok(path) => Ok(Some(path)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(e),
        },
    }
}

/// Map an exit code into the 0..=255 range a process can report.
pub fn clamp_exit_code(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(exit::GENERAL_FAILURE as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_to_no_subcommand() {
        let cli = Cli::try_parse_from(["service-bootstrap", "--profile", "auth"]).unwrap();
        assert_eq!(cli.profile, Some(ServiceProfile::Auth));
        assert_eq!(cli.command, None);
        assert!(!cli.reload);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "service-bootstrap",
            "run",
            "--reload",
            "--handoff",
            "spawn",
            "--port",
            "9001",
        ])
        .unwrap();
        assert_eq!(cli.command, Some(Commands::Run));
        let overrides = cli.overrides();
        assert_eq!(overrides.reload, Some(true));
        assert_eq!(overrides.handoff, Some(HandoffMode::Spawn));
        assert_eq!(overrides.port, Some(9001));
    }

    #[test]
    fn unknown_profile_is_rejected() {
        assert!(Cli::try_parse_from(["service-bootstrap", "--profile", "billing"]).is_err());
    }

    #[test]
    fn exit_codes_clamp() {
        assert_eq!(clamp_exit_code(0), 0);
        assert_eq!(clamp_exit_code(143), 143);
        assert_eq!(clamp_exit_code(-1), 1);
        assert_eq!(clamp_exit_code(300), 1);
    }
}
