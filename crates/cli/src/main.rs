//! SF Secret Menu CLI - database migrations and member tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront schema migrations
//! secret-menu-cli migrate storefront
//!
//! # Create the session store table
//! secret-menu-cli migrate sessions
//!
//! # Run everything
//! secret-menu-cli migrate all
//!
//! # Create (or update) a member profile and print its referral code
//! secret-menu-cli profile create -e member@example.com -n "Member Name"
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "secret-menu-cli")]
#[command(author, version, about = "SF Secret Menu CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Manage member profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Run storefront schema migrations
    Storefront,
    /// Create the session store table
    Sessions,
    /// Run all migrations
    All,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Create a member profile, or fill in the name of an existing one
    Create {
        /// Member email address
        #[arg(short, long)]
        email: String,

        /// Display name shown to people the member refers
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
            MigrateTarget::Sessions => commands::migrate::sessions().await?,
            MigrateTarget::All => {
                commands::migrate::storefront().await?;
                commands::migrate::sessions().await?;
            }
        },
        Commands::Profile { action } => match action {
            ProfileAction::Create { email, name } => {
                commands::profile::create(&email, name.as_deref()).await?;
            }
        },
    }
    Ok(())
}
