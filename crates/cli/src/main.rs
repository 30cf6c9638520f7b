//! Numa CLI - store seeding and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Seed the remote store with site settings and a sample product
//! numa-cli seed
//!
//! # Seed from custom fixture files
//! numa-cli seed --settings path/to/settings.json --product path/to/product.json
//! ```
//!
//! # Commands
//!
//! - `seed` - Write the site settings document and one sample product
//!   from JSON fixtures into the remote store
//!
//! Exit code is 0 on success and 1 on any failure; there is no retry.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "numa-cli")]
#[command(author, version, about = "Numa CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the remote store with initial site settings and a sample product
    Seed {
        /// Path to the site settings fixture
        #[arg(long, default_value = "fixtures/site-settings.json")]
        settings: PathBuf,

        /// Path to the sample product fixture
        #[arg(long, default_value = "fixtures/sample-product.json")]
        product: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing; diagnostics go to stderr so failures land on
    // the error stream
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
        Commands::Seed { settings, product } => {
            commands::seed::run(&settings, &product).await?;
        }
    }
    Ok(())
}
