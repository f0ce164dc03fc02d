//! Scheduled house-hunt daemon.
//!
//! Each cycle: fetch listings from the Realtor API under a call budget,
//! run them through the evaluation pipeline, deliver Telegram
//! notifications, send the price-drop digest, prune stale records.

mod config;
mod format;
mod notifier;
mod provider;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use homescout::{HuntPipeline, ListingStore, OpenAiScorer, SqliteStore};
use realtor_client::RealtorClient;
use telegram_rs::TelegramBot;

use config::Config;
use notifier::TelegramNotifier;

#[derive(Parser)]
#[command(name = "homescout-daemon", about = "House-hunt fetch/evaluate/notify daemon")]
struct Cli {
    /// Run one cycle immediately and exit instead of scheduling
    #[arg(long)]
    once: bool,

    /// Evaluate but deliver nothing and mark nothing as notified
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,homescout=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        cities = ?config.cities,
        price_range = format!("${}-${}", config.min_price, config.max_price),
        "Configuration loaded"
    );

    if cli.once {
        if let Err(err) = run_cycle(&config, cli.dry_run).await {
            report_run_failure(&config, cli.dry_run, &err).await;
            return Err(err);
        }
        return Ok(());
    }

    let scheduler = JobScheduler::new()
        .await
        .context("Failed to create scheduler")?;

    let job_config = config.clone();
    let dry_run = cli.dry_run;
    let job = Job::new_async(config.schedule.as_str(), move |_id, _lock| {
        let config = job_config.clone();
        Box::pin(async move {
            if let Err(err) = run_cycle(&config, dry_run).await {
                report_run_failure(&config, dry_run, &err).await;
            }
        })
    })
    .context("Invalid schedule expression")?;

    scheduler.add(job).await.context("Failed to add job")?;
    scheduler.start().await.context("Failed to start scheduler")?;
    tracing::info!(schedule = %config.schedule, "Scheduler started");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutting down");
    Ok(())
}

/// Log a failed cycle and raise it on Telegram so a silently broken
/// daemon gets noticed. Best-effort: a failed send only warns. Dry runs
/// stay quiet on the wire.
async fn report_run_failure(config: &Config, dry_run: bool, err: &anyhow::Error) {
    tracing::error!(error = %err, "hunt cycle failed");
    if dry_run {
        return;
    }
    let bot = TelegramBot::new(
        config.telegram_bot_token.clone(),
        config.telegram_chat_id.clone(),
    );
    if let Err(send_err) = bot
        .send_html(&format::format_run_failure(&err.to_string()), None)
        .await
    {
        tracing::warn!(error = %send_err, "failure alert not delivered");
    }
}

async fn run_cycle(config: &Config, dry_run: bool) -> Result<()> {
    let now = Utc::now();

    let store: Arc<SqliteStore> = Arc::new(
        SqliteStore::new(&config.database_url)
            .await
            .context("Failed to open listing store")?,
    );
    let pipeline = HuntPipeline::new(
        store.clone() as Arc<dyn ListingStore>,
        OpenAiScorer::new(config.openai_api_key.clone()),
        config.criteria(),
    );

    let client =
        RealtorClient::new(config.rapidapi_key.clone()).with_call_budget(config.call_budget);
    let raw = provider::fetch_listings(&client, config).await;

    let result = pipeline.evaluate(&raw, now).await?;
    tracing::info!(
        run_id = %result.run_id,
        seen = result.listings_seen,
        qualifying = result.qualifying.len(),
        closest_miss = result.closest_miss.is_some(),
        "cycle evaluated"
    );

    if dry_run {
        for entry in &result.qualifying {
            tracing::info!(
                identity_key = %entry.listing.identity_key,
                tier = %entry.tier,
                "dry run: would notify"
            );
        }
        return Ok(());
    }

    let bot = TelegramBot::new(
        config.telegram_bot_token.clone(),
        config.telegram_chat_id.clone(),
    );
    let notifier = TelegramNotifier::new(bot.clone(), store.clone() as Arc<dyn ListingStore>);
    let delivered = pipeline.deliver(&result, &notifier, now).await?;
    tracing::info!(delivered, "notifications sent");

    send_price_drop_digest(&bot, store.as_ref(), &result, config, now).await;

    let pruned = store
        .prune_stale(now - Duration::days(config.prune_after_days))
        .await?;
    let stats = store.stats().await?;
    tracing::info!(
        pruned,
        tracked = stats.total_tracked,
        notified = stats.notified_count,
        "cycle complete"
    );
    Ok(())
}

/// Announce drops on tracked listings that were not already re-notified
/// as matches this cycle. Best-effort: failures are logged, never fatal.
async fn send_price_drop_digest(
    bot: &TelegramBot,
    store: &dyn ListingStore,
    result: &homescout::RunResult,
    config: &Config,
    now: chrono::DateTime<Utc>,
) {
    let drops = match store
        .recent_price_drops(config.price_drop_percent, now - Duration::days(1))
        .await
    {
        Ok(drops) => drops,
        Err(err) => {
            tracing::warn!(error = %err, "price-drop query failed");
            return;
        }
    };

    for drop in drops {
        let already_announced = result
            .qualifying
            .iter()
            .any(|e| e.listing.identity_key == drop.identity_key);
        if already_announced {
            continue;
        }
        if let Err(err) = bot.send_html(&format::format_price_drop(&drop), None).await {
            tracing::warn!(
                identity_key = %drop.identity_key,
                error = %err,
                "price-drop notification failed"
            );
        }
    }
}
