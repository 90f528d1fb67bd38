//! Telar CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! telar migrate
//!
//! # Create an admin user
//! telar admin create -e admin@telar.cl -r 11111111-1 -n Valentina -l Reyes
//!
//! # Seed reference data (colors, categories, brands)
//! telar seed
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "telar")]
#[command(author, version, about = "Telar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the database with reference data
    Seed,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin RUT
        #[arg(short, long)]
        rut: String,

        /// Given name
        #[arg(short = 'n', long)]
        first_name: String,

        /// Family name
        #[arg(short = 'l', long)]
        last_name: String,

        /// Password (prompted interactively when omitted is not supported;
        /// pass via environment in scripts)
        #[arg(short, long, env = "TELAR_ADMIN_PASSWORD")]
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                rut,
                first_name,
                last_name,
                password,
            } => {
                commands::admin::create_user(&email, &rut, &first_name, &last_name, &password)
                    .await?;
            }
        },
        Commands::Seed => commands::seed::run().await?,
    }
    Ok(())
}
