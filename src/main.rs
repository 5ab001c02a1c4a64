use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

mod cli;

use cli::commands::clients::ClientsCommand;
use cli::commands::config::ConfigCommand;
use cli::commands::motorcycles::MotorcyclesCommand;
use cli::commands::rentals::RentalsCommand;
use cli::commands::FleetContext;
use cli::{ClientCommands, Cli, Commands, MotorcycleCommands};
use fleet::{init_telemetry, FleetConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    FleetConfig::load_env_file()?;
    let config = match &cli.config_dir {
        Some(dir) => FleetConfig::load_from(dir),
        None => FleetConfig::load(),
    }
    .context("Failed to load configuration")?;
    init_telemetry(&config.observability)?;

    tokio::runtime::Runtime::new()?.block_on(async { run(cli.command, config).await })
}

async fn run(command: Commands, config: FleetConfig) -> Result<()> {
    if let Commands::Config { save } = command {
        return ConfigCommand::new(save).execute(&config);
    }

    let ctx = FleetContext::build(&config, camera_files(&command)).await?;
    match command {
        Commands::Motorcycles(sub) => MotorcyclesCommand::new(sub).execute(&ctx).await,
        Commands::Clients(sub) => ClientsCommand::new(sub).execute(&ctx).await,
        Commands::Rentals(sub) => RentalsCommand::new(sub).execute(&ctx).await,
        Commands::Config { .. } => Ok(()),
    }
}

/// Image files the `photo` subcommands capture from.
fn camera_files(command: &Commands) -> Vec<PathBuf> {
    match command {
        Commands::Motorcycles(MotorcycleCommands::Photo(args))
        | Commands::Clients(ClientCommands::Photo(args)) => args.files.clone(),
        _ => Vec::new(),
    }
}
