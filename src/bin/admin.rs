//! CLI administration tool for shortlink.
//!
//! Reads click aggregates and audits durable alias records straight from the
//! shared store, without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Check store connection
//! cargo run --bin admin -- check
//!
//! # Statistics for one alias
//! cargo run --bin admin -- stats abc123
//!
//! # Global ranking for the current week
//! cargo run --bin admin -- top --period week --limit 20
//!
//! # Referrers and hourly distribution
//! cargo run --bin admin -- referrers abc123
//! cargo run --bin admin -- hourly abc123 --date 2024-03-05
//!
//! # Replay the startup scan, optionally for one owner
//! cargo run --bin admin -- aliases --owner u1
//! ```
//!
//! # Environment Variables
//!
//! - `REDIS_URL` or `REDIS_HOST`/`REDIS_PORT`/`REDIS_PASSWORD`/`REDIS_DB` (required)
//! - `BASE_URL` / `DOMAIN_NAME`: used to print short URLs
//! - `STORE_TIMEOUT_MS`: per-call deadline

use shortlink::application::services::{AliasService, AnalyticsService};
use shortlink::config::{Config, mask_connection_string};
use shortlink::domain::entities::{RankedEntry, TopPeriod};
use shortlink::domain::repositories::{KvStore, bounded};
use shortlink::server::connect_store;
use shortlink::utils::code_generator::is_valid_code;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use clap::{Parser, Subcommand};
use colored::*;
use std::sync::Arc;

/// CLI tool for inspecting shortlink data.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check store connection
    Check,

    /// Show click statistics for an alias
    Stats {
        /// Short code
        code: String,
    },

    /// Show the global alias ranking
    Top {
        /// Ranking window: all, week or month
        #[arg(short, long, default_value = "all")]
        period: String,

        /// Number of entries (max 100)
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Show the top referrers of an alias
    Referrers {
        /// Short code
        code: String,

        /// Number of entries (max 100)
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Show clicks per hour for an alias
    Hourly {
        /// Short code
        code: String,

        /// Day in YYYY-MM-DD (default: today, UTC)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// List durable alias records as the server would restore them
    Aliases {
        /// Only show aliases of this owner
        #[arg(short, long)]
        owner: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::from_env().context("Invalid configuration")?;
    let redis_url = config
        .redis_url
        .clone()
        .context("REDIS_URL or REDIS_HOST must be set")?;

    let store = connect_store(Some(&redis_url)).await?;
    let analytics = AnalyticsService::new(store.clone(), config.store_timeout());

    match cli.command {
        Commands::Check => check(&store, &redis_url, &config).await?,
        Commands::Stats { code } => show_stats(&analytics, &code).await?,
        Commands::Top { period, limit } => {
            let period = TopPeriod::from_param(Some(&period));
            let entries = analytics.top_aliases(period, limit).await;
            print_ranking(&format!("🏆 Top aliases ({})", period.as_str()), &entries);
        }
        Commands::Referrers { code, limit } => {
            ensure_code(&code)?;
            let entries = analytics.top_referrers(&code, limit).await;
            print_ranking(&format!("🔗 Referrers of {}", code), &entries);
        }
        Commands::Hourly { code, date } => show_hourly(&analytics, &code, date).await?,
        Commands::Aliases { owner } => list_aliases(store, &config, owner).await?,
    }

    Ok(())
}

/// Pings the store.
async fn check(store: &Arc<dyn KvStore>, redis_url: &str, config: &Config) -> Result<()> {
    println!("{}", "🔍 Checking store connection...".bright_blue());

    bounded(config.store_timeout(), store.ping())
        .await
        .map_err(|e| anyhow::anyhow!("Store PING failed: {}", e))?;

    println!("{}", "✅ Store connection OK".green().bold());
    println!("  Store: {}", mask_connection_string(redis_url).cyan());

    Ok(())
}

async fn show_stats(analytics: &AnalyticsService, code: &str) -> Result<()> {
    ensure_code(code)?;

    println!("{}", format!("📊 Statistics for {}", code).bright_blue().bold());
    println!();

    let stats = analytics.get_stats(code).await;

    println!(
        "  Total clicks:   {}",
        stats.total_clicks.to_string().bright_white().bold()
    );
    println!(
        "  Unique clicks:  {}",
        stats.unique_clicks.to_string().bright_white().bold()
    );
    println!();
    println!("  {:<12} {}", "Date".bright_white().bold(), "Clicks".bright_white().bold());
    println!("  {}", "─".repeat(24).bright_black());

    for day in &stats.daily_clicks {
        println!(
            "  {:<12} {}",
            day.date.to_string().bright_black(),
            day.count.to_string().cyan()
        );
    }
    println!();

    Ok(())
}

async fn show_hourly(analytics: &AnalyticsService, code: &str, date: Option<NaiveDate>) -> Result<()> {
    ensure_code(code)?;

    let date = date.unwrap_or_else(|| chrono::Utc::now().date_naive());
    let hours = analytics.hourly_distribution(code, Some(date)).await;
    let peak = hours.iter().map(|h| h.count).max().unwrap_or(0).max(1);

    println!(
        "{}",
        format!("🕒 Hourly clicks for {} on {}", code, date)
            .bright_blue()
            .bold()
    );
    println!();

    for hour in &hours {
        let width = (hour.count * 40 / peak) as usize;
        println!(
            "  {:02}:00 {:>6} {}",
            hour.hour,
            hour.count.to_string().cyan(),
            "█".repeat(width).green()
        );
    }
    println!();

    Ok(())
}

/// Replays the startup scan and prints what the server would serve.
async fn list_aliases(store: Arc<dyn KvStore>, config: &Config, owner: Option<String>) -> Result<()> {
    println!("{}", "📋 Durable alias records".bright_blue().bold());
    println!();

    let service = AliasService::new(store, config.base_url.clone(), config.store_timeout());
    let restored = service.restore_index().await;

    let aliases = match owner.as_deref() {
        Some(owner) => service.list_by_owner(owner).await,
        None => service.list_all().await,
    };

    if aliases.is_empty() {
        println!("{}", "  No aliases found".yellow());
        return Ok(());
    }

    println!(
        "  {:<12} {:<16} {:<20} {}",
        "Code".bright_white().bold(),
        "Owner".bright_white().bold(),
        "Created".bright_white().bold(),
        "Target".bright_white().bold()
    );
    println!("  {}", "─".repeat(80).bright_black());

    for alias in &aliases {
        let created = DateTime::from_timestamp(alias.record.created_at, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| alias.record.created_at.to_string());

        println!(
            "  {:<12} {:<16} {:<20} {}",
            alias.record.code.cyan(),
            alias.record.owner_id,
            created.bright_black(),
            alias.record.target_url
        );
    }

    println!();
    println!(
        "  Shown: {} of {} restored",
        aliases.len().to_string().bright_white().bold(),
        restored.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

fn print_ranking(title: &str, entries: &[RankedEntry]) {
    println!("{}", title.bright_blue().bold());
    println!();

    if entries.is_empty() {
        println!("{}", "  No data".yellow());
        println!();
        return;
    }

    for (rank, entry) in entries.iter().enumerate() {
        println!(
            "  {:>3}. {:<40} {}",
            rank + 1,
            entry.member.cyan(),
            entry.score.to_string().bright_white().bold()
        );
    }
    println!();
}

fn ensure_code(code: &str) -> Result<()> {
    if !is_valid_code(code) {
        anyhow::bail!("'{}' is not a valid short code", code);
    }
    Ok(())
}
