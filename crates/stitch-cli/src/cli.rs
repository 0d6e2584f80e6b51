use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use stitch_core::OutputFormat;

#[derive(Parser)]
#[command(name = "stitch")]
#[command(about = "stitch: group work activities from many tools into efforts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Config file (defaults to ~/.config/stitch/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Cluster a batch of activities and print the resulting partition
    Cluster {
        #[command(flatten)]
        input: InputArgs,

        /// Stored clusters as JSON lines (defaults to the state dir)
        #[arg(long)]
        clusters: Option<PathBuf>,

        /// Reference time for the recent-cluster window (RFC 3339, defaults to now)
        #[arg(long)]
        now: Option<String>,

        /// Skip refinement even if it is enabled in config
        #[arg(long)]
        offline: bool,
    },

    /// Print extracted signals and any-edge components
    Signals {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Show/manage configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Args)]
pub struct InputArgs {
    /// JSON array of activity records
    #[arg(long)]
    pub activities: PathBuf,

    /// Identity of the acting user; repeatable, added to `identity.self`
    #[arg(long = "identity")]
    pub identities: Vec<String>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration with secrets masked
    Show,
    /// Print the config file location
    Path,
    /// Validate the effective configuration
    Validate,
    /// Write a commented default config if none exists
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
