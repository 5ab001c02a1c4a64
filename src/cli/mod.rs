use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "fleet")]
#[command(about = "Motorcycle rental management")]
#[command(long_about = "Fleet keeps track of motorcycles, clients and who is renting what. \
                       Records live in a local JSON database or a realtime database; photos \
                       are normalized and stored in a local image directory.")]
pub struct Cli {
    /// Directory holding fleet.toml / .fleet-rc
    #[arg(long, global = true, help = "Look up configuration files in this directory")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage motorcycle records
    #[command(subcommand)]
    Motorcycles(MotorcycleCommands),
    /// Manage client records
    #[command(subcommand)]
    Clients(ClientCommands),
    /// Assign and return rentals
    #[command(subcommand)]
    Rentals(RentalCommands),
    /// Print the effective configuration
    Config {
        /// Also write it to a TOML file
        #[arg(long, help = "Write the effective configuration to this file")]
        save: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum MotorcycleCommands {
    /// List motorcycles
    List {
        #[arg(long, help = "Only show motorcycles that can be rented")]
        available: bool,
    },
    /// Show one motorcycle
    Show { id: String },
    /// Register a new motorcycle
    Add(MotorcycleFields),
    /// Edit a motorcycle; omitted fields keep their value
    Edit {
        id: String,
        #[command(flatten)]
        fields: MotorcycleEdits,
    },
    /// Delete motorcycles and their photos
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Attach photos taken from image files
    Photo(PhotoArgs),
    /// Remove one attached photo
    RemovePhoto(RemovePhotoArgs),
}

#[derive(Subcommand)]
pub enum ClientCommands {
    /// List clients
    List,
    /// Show one client
    Show { id: String },
    /// Register a new client
    Add(ClientFields),
    /// Edit a client; omitted fields keep their value
    Edit {
        id: String,
        #[command(flatten)]
        fields: ClientEdits,
    },
    /// Delete a client and their photos
    Delete { id: String },
    /// Attach photos taken from image files
    Photo(PhotoArgs),
    /// Remove one attached photo
    RemovePhoto(RemovePhotoArgs),
}

#[derive(Subcommand)]
pub enum RentalCommands {
    /// List active rentals
    List,
    /// Rent a motorcycle to a client
    Assign { motorcycle: String, client: String },
    /// Mark a rented motorcycle as returned
    Return { motorcycle: String },
}

#[derive(Args)]
pub struct MotorcycleFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub brand: String,
    #[arg(long)]
    pub year: u32,
    #[arg(long = "type")]
    pub kind: String,
    #[arg(long)]
    pub color: String,
    #[arg(long, default_value = "0")]
    pub odometer: u64,
}

#[derive(Args)]
pub struct MotorcycleEdits {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub brand: Option<String>,
    #[arg(long)]
    pub year: Option<u32>,
    #[arg(long = "type")]
    pub kind: Option<String>,
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long)]
    pub odometer: Option<u64>,
}

#[derive(Args)]
pub struct ClientFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub address: String,
    #[arg(long)]
    pub phone: String,
}

#[derive(Args)]
pub struct ClientEdits {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
}

#[derive(Args)]
pub struct PhotoArgs {
    pub id: String,
    /// Image files to capture from, in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    #[arg(long, help = "Attach as document photos instead of the main picture(s)")]
    pub documents: bool,
}

#[derive(Args)]
pub struct RemovePhotoArgs {
    pub id: String,
    /// Position of the photo, starting at 0
    pub index: usize,
    #[arg(long, help = "Remove from the document photos")]
    pub documents: bool,
}
