//! Giftshop CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply storefront database migrations
//! gs-cli migrate
//!
//! # Insert the sample catalog into an empty database
//! gs-cli seed
//!
//! # Hash an admin password for GIFTSHOP_ADMIN_PASSWORD_HASH
//! gs-cli admin hash-password
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the catalog with sample products
//! - `admin hash-password` - Produce an Argon2 hash for the admin password

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gs-cli")]
#[command(author, version, about = "Giftshop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert sample products when the catalog is empty
    Seed,
    /// Admin credential tools
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Hash an admin password read from stdin
    HashPassword,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::HashPassword => commands::admin::hash_password()?,
        },
    }
    Ok(())
}
