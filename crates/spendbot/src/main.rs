use std::sync::Arc;

use tracing::info;

use spendbot_core::{config::Config, dispatcher::Dispatcher};
use spendbot_openai::OpenAiExtractor;
use spendbot_sqlite::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    spendbot_core::logging::init("spendbot")?;

    let cfg = Arc::new(Config::load()?);

    let store = Arc::new(SqliteStore::open(&cfg.database_path)?);
    let extractor = Arc::new(OpenAiExtractor::from_config(&cfg)?);
    info!(
        model = %extractor.model,
        endpoint = %extractor.endpoint(),
        "extraction service configured"
    );

    let dispatcher = Arc::new(Dispatcher::new(
        store,
        extractor,
        cfg.currency_symbol.clone(),
    ));

    spendbot_telegram::router::run_polling(cfg, dispatcher)
        .await
        .map_err(|e| anyhow::anyhow!("telegram bot failed: {e}"))?;

    Ok(())
}
