//! Rain Advisory CLI - session table setup and role checks.
//!
//! # Usage
//!
//! ```bash
//! # Create the tower-sessions table in the session database
//! rain-cli migrate sessions
//!
//! # Check whether an account holds the admin role
//! rain-cli roles check -e admin@example.com -p 'password'
//! ```
//!
//! # Commands
//!
//! - `migrate sessions` - Create the session store table
//! - `roles check` - Sign in and run the same role lookup as the admin guard

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rain-cli")]
#[command(author, version, about = "Rain Advisory CLI tools")]
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
    /// Inspect role assignments
    Roles {
        #[command(subcommand)]
        action: RolesAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Create the server-side session table
    Sessions,
}

#[derive(Subcommand)]
enum RolesAction {
    /// Sign in and report whether the account is an admin
    Check {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
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
        Commands::Migrate { target } => match target {
            MigrateTarget::Sessions => commands::migrate::sessions().await?,
        },
        Commands::Roles { action } => match action {
            RolesAction::Check { email, password } => {
                let admin = commands::roles::check(&email, &password).await?;
                commands::roles::print_result(&email, admin);
            }
        },
    }
    Ok(())
}
