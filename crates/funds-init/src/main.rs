//! Funds Init - `MongoDB` schema initializer for the funds platform
//!
//! Usage:
//!     funds-init [--uri URI] [--database NAME] [init|verify|seed]

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use funds_init::{execute, Cli, InitConfig};
use funds_store::MongoTarget;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing; stdout is reserved for the summary
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,funds=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "funds-init failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let command = cli.selected_command();
    let config = InitConfig::from_env().with_overrides(cli.uri, cli.database);

    tracing::info!(
        ?command,
        uri = %config.redacted_url(),
        database = %config.database_name,
        timeout_seconds = config.timeout_seconds,
        "Configuration loaded"
    );

    let target = MongoTarget::connect(&config.mongo_settings()).await?;
    let outcome = execute(command, &target).await?;

    print!("{}", outcome.render(&config.database_name));
    outcome.check()?;

    Ok(())
}
