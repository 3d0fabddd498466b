//! Shipdesk CLI - Database migrations and shipment inspection.
//!
//! # Usage
//!
//! ```bash
//! # Create or update the shipments table
//! shipdesk migrate
//!
//! # Print every shipment as a JSON line, newest first
//! shipdesk shipments list
//!
//! # Print one shipment
//! shipdesk shipments show 6f1c0b1e-3c1a-4f5e-9d59-0e6b1c2f8a10
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `shipments list` - List stored shipments
//! - `shipments show` - Show one stored shipment

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shipdesk")]
#[command(author, version, about = "Shipdesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Inspect stored shipments
    Shipments {
        #[command(subcommand)]
        action: ShipmentAction,
    },
}

#[derive(Subcommand)]
enum ShipmentAction {
    /// List shipments, newest first, one JSON document per line
    List {
        /// Only print the first N shipments
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show a single shipment as pretty JSON
    Show {
        /// Shipment id
        id: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Shipments { action } => match action {
            ShipmentAction::List { limit } => commands::shipments::list(limit).await?,
            ShipmentAction::Show { id } => commands::shipments::show(&id).await?,
        },
    }
    Ok(())
}
