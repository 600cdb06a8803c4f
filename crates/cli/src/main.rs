//! Vitrine CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Create or update the documents table
//! vitrine-cli migrate
//!
//! # Write default shop settings if none exist yet
//! vitrine-cli seed
//!
//! # Show the media host id a delivery URL maps to
//! vitrine-cli resolve-asset https://res.cloudinary.com/demo/image/upload/v1/shop-products/mug.jpg
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the settings document with defaults
//! - `resolve-asset` - Derive the media host id from a URL

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vitrine-cli")]
#[command(author, version, about = "Vitrine CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Write default shop settings when no settings document exists
    Seed,
    /// Print the media host id derived from a delivery URL
    ResolveAsset {
        /// Delivery URL as stored on a product or in settings
        url: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

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
        Commands::Seed => commands::seed::settings().await?,
        Commands::ResolveAsset { url } => commands::asset::resolve(&url)?,
    }
    Ok(())
}
