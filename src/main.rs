use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cost_analytics::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let command = args.get_command();

    // The server configures logging from its own config once loaded
    if !matches!(command, cli::Commands::Serve) {
        init_tracing("warn", false);
    }

    match command {
        cli::Commands::Serve => {
            commands::serve::execute(&args.config).await?;
        }
        cli::Commands::Aggregate {
            file,
            profile,
            sample,
        } => {
            commands::aggregate::execute(&file, profile, sample)?;
        }
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => commands::config::show(&args.config)?,
            cli::ConfigCommands::Validate => commands::config::validate(&args.config)?,
        },
        cli::Commands::Version => {
            println!("Cost Analytics v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
