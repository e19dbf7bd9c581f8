use std::sync::Arc;

use backend::{
    api::{self, QueryState},
    config::{AppConfig, load_symbols},
    logger::{LogFormat, init_tracing},
};
use market::{
    CurrencyCache, SubscriptionManager, backoff::Backoff, feed::ws::WsFeedConnector,
};
use tracing::{info, warn};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "ctrl-c handler unavailable; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(LogFormat::for_app_env(std::env::var("APP_ENV").ok().as_deref()));

    let cfg = AppConfig::from_env()?;
    let symbols = load_symbols(&cfg.symbols_file)?;

    info!(
        feed = %cfg.feed_url,
        symbols_file = %cfg.symbols_file,
        symbols = symbols.len(),
        "starting currency feed"
    );
    if symbols.is_empty() {
        warn!("symbols file lists nothing to track; serving an empty cache");
    }

    let connector = Arc::new(WsFeedConnector::new(
        cfg.feed_url.clone(),
        cfg.feed_origin.clone(),
        cfg.reply_timeout,
    ));

    let manager = SubscriptionManager::new(
        connector,
        CurrencyCache::new(),
        Backoff::new(cfg.backoff_initial, cfg.backoff_max),
    );

    let started = manager.subscribe_all(&symbols);
    info!(started, "subscriptions started");

    let query = QueryState {
        cache: manager.cache().clone(),
        states: manager.states().clone(),
        counters: manager.counters().clone(),
    };

    let served = api::serve(&cfg.http_bind, query, shutdown_signal()).await;

    manager.shutdown().await;
    info!("all subscriptions stopped");

    served?;
    Ok(())
}
