//! content-sync: run one sync pass against the configured document source.
//!
//! Takes no arguments. Configuration comes from the environment (see
//! `core_runtime::config`); `SYNC_MODE` picks `full` (default) or
//! `incremental` and `LOG_FORMAT` picks `pretty`, `json` or `compact`.
//! Exits non-zero when the run fails.

use anyhow::Context;
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, LoggingConfig};
use core_sync::SyncMode;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Sync failed: {:#}", e);
        eprintln!("content-sync: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let mut logging = LoggingConfig::default();
    if let Ok(format) = std::env::var("LOG_FORMAT") {
        logging = logging.with_format(format.parse()?);
    }
    init_logging(logging)?;

    let mode = match std::env::var("SYNC_MODE") {
        Ok(value) => value.parse::<SyncMode>().map_err(anyhow::Error::msg)?,
        Err(_) => SyncMode::Full,
    };

    let config = CoreConfig::from_env().context("invalid configuration")?;
    let core = core_service::bootstrap_desktop(config)
        .await
        .context("failed to start core")?;

    let report = core.sync(mode).await?;

    for skipped in &report.skipped {
        warn!(path = %skipped.path, "Skipped: {}", skipped.reason);
    }
    for path in &report.mirror_errors {
        warn!("Mirror not updated: {}", path);
    }
    info!(
        upserted = report.documents_upserted,
        removed = report.documents_removed,
        skipped = report.skipped.len(),
        duration_ms = report.duration_ms,
        "Processed {} documents",
        report.documents_processed
    );
    Ok(())
}
