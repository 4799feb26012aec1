use anyhow::Context;
use clap::Parser;
use tick_sentinel::cli::{config_summary, Cli, Commands};
use tick_sentinel::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?;
    config.validate().context("Invalid configuration")?;

    tick_sentinel::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!(symbol = %config.feed.symbol, "Starting monitor");
            args.execute(&config).await?;
        }
        Commands::Check => {
            println!("Configuration OK: {}", cli.config);
        }
        Commands::Config => {
            println!("{}", config_summary(&config));
        }
    }

    Ok(())
}
