use anyhow::Result;
use clap::Parser;

mod cli;
mod cluster_cmd;
mod config_cmds;
mod report;

use cli::{Cli, Commands, ConfigCommands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (output to stderr, initialize only once)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    let output_format = cli.format;
    let config_path = cli.config;

    match cli.command {
        Commands::Cluster {
            input,
            clusters,
            now,
            offline,
        } => {
            cluster_cmd::handle_cluster(
                input,
                clusters,
                now,
                offline,
                config_path.as_deref(),
                output_format,
            )
            .await?;
        }
        Commands::Signals { input } => {
            cluster_cmd::handle_signals(input, config_path.as_deref(), output_format)?;
        }
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => {
                config_cmds::handle_config_show(config_path.as_deref(), output_format)?;
            }
            ConfigCommands::Path => {
                config_cmds::handle_config_path(config_path.as_deref())?;
            }
            ConfigCommands::Validate => {
                config_cmds::handle_config_validate(config_path.as_deref())?;
            }
            ConfigCommands::Init { force } => {
                config_cmds::handle_config_init(force)?;
            }
        },
    }

    Ok(())
}
