//! Scheduled ledger jobs for Caixa.
//!
//! Usage:
//!   ledger-jobs                      - Run every job for today
//!   ledger-jobs recurrences [DATE]   - Generate recurring transactions due on DATE (YYYY-MM-DD)
//!   ledger-jobs purge                - Delete expired operation log records

use anyhow::{Context, bail};
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caixa_db::{LedgerCommands, connect};
use caixa_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caixa=debug,ledger_jobs=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let db = connect(&config.database).await?;
    info!("Connected to database");

    let commands = LedgerCommands::new(db, config.ledger);
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        None => {
            generate_recurrences(&commands, Utc::now().date_naive()).await?;
            purge_operations(&commands).await?;
        }
        Some("recurrences") => {
            let as_of = match args.next() {
                Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .with_context(|| format!("invalid date: {raw}"))?,
                None => Utc::now().date_naive(),
            };
            generate_recurrences(&commands, as_of).await?;
        }
        Some("purge") => purge_operations(&commands).await?,
        Some(other) => bail!("unknown job: {other}"),
    }

    Ok(())
}

async fn generate_recurrences(commands: &LedgerCommands, as_of: NaiveDate) -> anyhow::Result<()> {
    let run = commands.generate_recurring_transactions(as_of).await?;
    for (template_id, err) in &run.failed {
        warn!(%template_id, code = err.error_code(), error = %err, "template skipped");
    }
    info!(
        %as_of,
        generated = run.generated.len(),
        failed = run.failed.len(),
        "Recurring transactions generated"
    );
    Ok(())
}

async fn purge_operations(commands: &LedgerCommands) -> anyhow::Result<()> {
    let purged = commands.purge_expired_operations(Utc::now()).await?;
    info!(purged, "Expired operation records purged");
    Ok(())
}
