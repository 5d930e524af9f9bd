use anyhow::Result;
use clap::Parser;

use logwell_daemon::cli::DaemonCli;
use logwell_daemon::logging;
use logwell_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let config = cli
        .load_config()
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", cli.config.display(), e))?;

    if cli.validate {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(config = %cli.config.display(), "logwell-daemon starting");

    let mut orchestrator = Orchestrator::build_from_config(config)?;
    if let Err(e) = orchestrator.run().await {
        tracing::error!(error = %e, "logwell-daemon exited with error");
        return Err(e);
    }

    Ok(())
}
