//! CLI administration tool for content-guard.
//!
//! Provides key generation, token inspection, manual expiry sweeps and
//! database diagnostics without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Generate a fresh ENCRYPTION_KEY
//! cargo run --bin admin -- key generate
//!
//! # Show the status of a token
//! cargo run --bin admin -- token status 3q2-7wAAAAC6vK3e_Q8BAg
//!
//! # Deactivate every expired token now
//! cargo run --bin admin -- sweep --yes
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required for all commands except `key generate`)

use content_guard::domain::repositories::TokenStore;
use content_guard::infrastructure::persistence::PgTokenStore;
use content_guard::utils::cipher::generate_key;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing content-guard.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Encryption key management
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Inspect tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Deactivate all expired tokens
    Sweep {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Print a new random ENCRYPTION_KEY
    Generate {
        /// Print only the key, for use in scripts
        #[arg(long)]
        raw: bool,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Show the status of a token
    Status {
        /// Public token id
        token_id: String,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info and row counts
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Key { action } => handle_key_action(action),
        Commands::Token { action } => {
            let pool = connect().await?;
            handle_token_action(action, &pool).await
        }
        Commands::Sweep { yes } => {
            let pool = connect().await?;
            sweep(&pool, yes).await
        }
        Commands::Db { action } => {
            let pool = connect().await?;
            handle_db_action(action, &pool).await
        }
    }
}

async fn connect() -> Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")
}

fn store(pool: &PgPool) -> PgTokenStore {
    PgTokenStore::new(Arc::new(pool.clone()))
}

fn handle_key_action(action: KeyAction) -> Result<()> {
    match action {
        KeyAction::Generate { raw } => {
            let key = generate_key();

            if raw {
                println!("{key}");
                return Ok(());
            }

            println!("{}", "🔑 New encryption key".bright_blue().bold());
            println!();
            println!("  ENCRYPTION_KEY={}", key.bright_yellow().bold());
            println!();
            println!(
                "{}",
                "⚠️  Changing the key makes every stored token undecryptable."
                    .red()
                    .bold()
            );
            println!();
        }
    }

    Ok(())
}

/// Prints token status.
///
/// # Output Format
///
/// ```text
/// 🎫 Token 3q2-7wAAAAC6vK3e_Q8BAg
///
///   URL:           https://cdn.example.com/video.mp4
///   Created:       2026-01-15 10:30:00 UTC
///   Expires:       2026-01-15 11:30:00 UTC
///   Status:        LIVE
///   Accesses:      3
///   Last access:   2026-01-15 10:42:13 UTC
/// ```
async fn handle_token_action(action: TokenAction, pool: &PgPool) -> Result<()> {
    match action {
        TokenAction::Status { token_id } => {
            let token = store(pool)
                .get_by_id(&token_id)
                .await
                .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
                .context("Token not found")?;

            let status = if token.is_live_at(chrono::Utc::now()) {
                "LIVE".green()
            } else if token.is_active {
                "EXPIRED".yellow()
            } else {
                "INACTIVE".red()
            };

            let fmt_time = |t: chrono::DateTime<chrono::Utc>| {
                t.format("%Y-%m-%d %H:%M:%S UTC").to_string()
            };

            println!("{} {}", "🎫 Token".bright_blue().bold(), token.token_id.cyan());
            println!();
            println!("  URL:           {}", token.original_url.bright_white());
            println!("  Created:       {}", fmt_time(token.created_at).bright_black());
            println!("  Expires:       {}", fmt_time(token.expires_at).bright_black());
            println!("  Status:        {}", status);
            println!(
                "  Accesses:      {}",
                token.access_count.to_string().bright_green().bold()
            );
            println!(
                "  Last access:   {}",
                token
                    .last_accessed
                    .map(fmt_time)
                    .unwrap_or_else(|| "never".to_string())
                    .bright_black()
            );

            for (label, value) in [
                ("User", &token.identity.user_id),
                ("Session", &token.identity.session_id),
                ("Device", &token.identity.device_id),
            ] {
                if let Some(value) = value {
                    println!("  {:<14} {}", format!("{label}:"), value.cyan());
                }
            }
            println!();
        }
    }

    Ok(())
}

/// Runs one expiry sweep after confirmation.
async fn sweep(pool: &PgPool, skip_confirm: bool) -> Result<()> {
    println!("{}", "🧹 Expiry sweep".bright_blue().bold());
    println!();

    let pending: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tokens WHERE is_active AND expires_at <= $1",
    )
    .bind(chrono::Utc::now())
    .fetch_one(pool)
    .await?;

    if pending == 0 {
        println!("{}", "  No expired tokens to deactivate".yellow());
        return Ok(());
    }

    println!(
        "  Expired active tokens: {}",
        pending.to_string().bright_white().bold()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Deactivate them now?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let swept = store(pool)
        .deactivate_all_expired()
        .await
        .map_err(|e| anyhow::anyhow!("Sweep failed: {}", e))?;

    println!();
    println!(
        "{} {}",
        "✅ Deactivated tokens:".green().bold(),
        swept.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            if !store(pool).health_check().await {
                anyhow::bail!("Database connection check failed");
            }

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let tokens: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tokens")
                .fetch_one(pool)
                .await?;

            let live: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM tokens WHERE is_active AND expires_at > $1",
            )
            .bind(chrono::Utc::now())
            .fetch_one(pool)
            .await?;

            let logs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM access_logs")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL:   {}", version.bright_white());
            println!("  Tokens:       {}", tokens.to_string().bright_green().bold());
            println!("  Live tokens:  {}", live.to_string().bright_green().bold());
            println!("  Access logs:  {}", logs.to_string().bright_green().bold());
            println!();
        }
    }

    Ok(())
}
