//! Kolla operator CLI: team bootstrap, token minting and link housekeeping.
//!
//! Reads DATABASE_URL and JWT_SECRET from the environment or a `.env` file.

use anyhow::Context;
use clap::{Parser, Subcommand};
use kolla_cli::{init_tracing, mint_token, purge_expired_links, stranded_clips};
use kolla_core::TeamRole;
use kolla_db::TeamRepository;
use serde::Serialize;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "kolla", about = "Kolla operator CLI")]
struct Cli {
    /// SQLite database URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://kolla.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a team
    CreateTeam {
        /// Team name
        name: String,
    },
    /// List teams
    Teams,
    /// Sign a bearer token for a team member
    MintToken {
        /// Team id
        #[arg(long)]
        team: i64,
        /// coach or player
        #[arg(long, default_value = "coach")]
        role: TeamRole,
        /// Reuse a user id instead of generating one
        #[arg(long)]
        user: Option<Uuid>,
        /// Token lifetime in hours
        #[arg(long, default_value = "24")]
        ttl_hours: i64,
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        jwt_secret: String,
    },
    /// Report clips stuck in processing without a transcoding job
    Stranded {
        /// Only clips untouched for at least this many minutes
        #[arg(long, default_value = "30")]
        older_than_minutes: i64,
    },
    /// Delete expired upload links and share links
    PurgeExpiredLinks,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let pool = kolla_db::connect(&cli.database_url, 1, 30).await?;

    match cli.command {
        Commands::CreateTeam { name } => {
            let team = TeamRepository::new(pool.clone())
                .create(name.trim())
                .await?;
            print_json(&team)?;
        }
        Commands::Teams => {
            let teams = TeamRepository::new(pool.clone()).list().await?;
            print_json(&teams)?;
        }
        Commands::MintToken {
            team,
            role,
            user,
            ttl_hours,
            jwt_secret,
        } => {
            let minted = mint_token(&pool, &jwt_secret, team, user, role, ttl_hours).await?;
            print_json(&minted)?;
        }
        Commands::Stranded { older_than_minutes } => {
            let clips = stranded_clips(&pool, older_than_minutes).await?;
            if clips.is_empty() {
                tracing::info!("No stranded clips");
            }
            print_json(&clips)?;
        }
        Commands::PurgeExpiredLinks => {
            let report = purge_expired_links(&pool).await?;
            print_json(&report)?;
        }
    }

    Ok(())
}
