mod app;
mod config;
mod healthcheck;
mod http;
mod scheduler;
mod serve;

use clap::Parser;
use config::{Cli, Commands};
use topstories_core::KvStore;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    cli.config.validate()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve::run(cli.config).await,
        Commands::Refresh => {
            let services = serve::build(&cli.config)?;
            let outcome = services.refresher.refresh().await?;
            info!(skipped = outcome.skipped, "refresh complete");
            println!("{}", serde_json::to_string(&outcome.accepted)?);
            Ok(())
        }
        Commands::Show => {
            let services = serve::build(&cli.config)?;
            let view = services.reader.top_stories_view().await?;
            println!("{}", serde_json::to_string_pretty(&view)?);
            services.tasks.drain(cli.config.shutdown_grace()).await;
            Ok(())
        }
        Commands::Sweep => {
            let services = serve::build(&cli.config)?;
            let removed = services.kv.purge_expired()?;
            println!("removed {} expired keys", removed);
            Ok(())
        }
    }
}
