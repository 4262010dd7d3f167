use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod cli;

use cli::commands::Commands;
use cli::env::CliArgs;
use cli::runtime::init_logging;
use ridescan_cli::load_config;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(&args.log_level, args.debug, args.log_format)?;

    let loaded = load_config(args.config.as_deref()).await?;
    let mut config = loaded.config;
    config.apply_env_overrides()?;
    debug!(path = %loaded.path.display(), apps = ?config.apps, "Configuration ready");

    match args.command {
        Commands::Run(run) => cli::run::cmd_run(run, config, args.output).await,
        Commands::Apps(apps) => cli::apps::cmd_apps(apps, &config, args.output),
        Commands::Locate(locate) => cli::locate::cmd_locate(locate, &config, args.output).await,
    }
}
