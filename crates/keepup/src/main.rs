use anyhow::Context;
use clap::Parser;
use keepup::{Cli, PlatformApplicationFactory, init_logging};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format)?;

    let config = cli.supervisor_config()?;
    info!(
        "Starting keepup for {} on {}",
        config.identifier,
        PlatformApplicationFactory::platform_name()
    );

    let mut handle = keepup::supervise(&config)?;

    shutdown_signal().await?;
    info!("Shutdown requested");
    handle.stop().await;

    Ok(())
}

async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("Failed to listen for Ctrl-C")?,
            _ = terminate.recv() => {}
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")
    }
}
