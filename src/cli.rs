use clap::{Parser, Subcommand};
use cost_analytics::aggregator::KeywordProfile;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cost-analytics", version, about = "Cloud cost analytics")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Aggregate a local .xls, .xlsx or .csv file and print the result
    Aggregate {
        /// Spreadsheet or CSV export to aggregate
        file: PathBuf,

        /// Column keyword profile: spreadsheet or remote
        #[arg(short, long, default_value = "spreadsheet")]
        profile: KeywordProfile,

        /// Number of sample rows to include (0 omits the sample)
        #[arg(short, long, default_value = "10")]
        sample: usize,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Display current configuration (with secrets masked)
    Show,

    /// Validate configuration file
    Validate,
}

impl Cli {
    /// Get the command to execute, defaulting to Serve if none provided
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}
