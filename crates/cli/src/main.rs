//! Clique & Recicle CLI - Seeding and inspection tools.
//!
//! # Usage
//!
//! ```bash
//! # Insert the starter collection points for an agent
//! cr-cli seed points crates/cli/seed/collection_points.yaml --agent <uuid>
//!
//! # List collection points as the site would
//! cr-cli points list --query verde --page 1
//! ```
//!
//! # Commands
//!
//! - `seed points` - Insert collection points from a YAML file
//! - `points list` - Search and paginate collection points

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use clique_recicle_core::UserId;

mod commands;

#[derive(Parser)]
#[command(name = "cr-cli")]
#[command(author, version, about = "Clique & Recicle CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the backend with data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Inspect collection points
    Points {
        #[command(subcommand)]
        action: PointsAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert collection points from a YAML file
    Points {
        /// Path to the YAML file
        file: String,

        /// Agent (user id) who will own the points
        #[arg(short, long)]
        agent: UserId,
    },
}

#[derive(Subcommand)]
enum PointsAction {
    /// List collection points, newest first
    List {
        /// Only points owned by this agent
        #[arg(short, long)]
        agent: Option<UserId>,

        /// Search text (name, address, city or material)
        #[arg(short, long)]
        query: Option<String>,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
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

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Seed { target } => match target {
            SeedTarget::Points { file, agent } => commands::seed::points(&file, agent).await?,
        },
        Commands::Points { action } => match action {
            PointsAction::List {
                agent,
                query,
                page,
            } => commands::points::list(agent, query, page).await?,
        },
    }
    Ok(())
}
