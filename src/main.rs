//! `service-bootstrap` entrypoint.
//!
//! Runs the database migration for a service and then replaces itself with the
//! service's application server. See the library docs for the stage layout.

use std::process::ExitCode;

use clap::Parser;
use service_bootstrap::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let code = cli::run(cli).await;
    ExitCode::from(cli::clamp_exit_code(code))
}
