use mawimbi::config::Settings;
use mawimbi::domain::repositories::exchange::ExchangeApi;
use mawimbi::domain::services::engine::TradingEngine;
use mawimbi::domain::services::indicators::StandardIndicators;
use mawimbi::domain::services::oracle::DecisionOracle;
use mawimbi::domain::services::portfolio::PortfolioAllocator;
use mawimbi::domain::services::sentiment::FixedSentiment;
use mawimbi::infrastructure::kraken::KrakenClient;
use mawimbi::infrastructure::openai_oracle::OpenAiOracle;
use mawimbi::infrastructure::signing::Credentials;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mawimbi=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Malformed configuration or credentials are the only fatal errors;
    // everything past this point degrades per cycle instead of exiting.
    let settings = Settings::from_env()?;
    let credentials = Credentials::new(settings.api_key.clone(), &settings.api_secret)?;
    let client = Arc::new(KrakenClient::new(
        credentials,
        settings.api_domain.clone(),
        settings.retry_policy(),
    ));

    info!(pair = %settings.pair, "mawimbi starting");

    let initial_balance = match client.account_balance(&settings.balance_asset).await {
        Ok(balance) => {
            info!(balance, asset = %settings.balance_asset, "fetched total balance");
            balance
        }
        Err(e) => {
            warn!(error = %e, "could not fetch initial balance, starting from zero");
            0.0
        }
    };
    let allocator = Arc::new(PortfolioAllocator::new(
        settings.allocations,
        initial_balance,
    ));

    // Sentiment is pinned until a live news scorer is wired in.
    let sentiment = Arc::new(FixedSentiment(0.3));
    let oracle: Option<OpenAiOracle> = settings
        .openai_api_key
        .as_deref()
        .map(OpenAiOracle::new);

    let mut engine = TradingEngine::new(
        settings.engine_settings(),
        client.clone(),
        allocator.clone(),
        sentiment,
        Box::new(StandardIndicators::default()),
    );

    info!("fetching historical prices for warm-up");
    match client
        .historical_closes(&settings.pair, settings.warmup_interval_minutes, None)
        .await
    {
        Ok(closes) if !closes.is_empty() => engine.seed_history(closes),
        Ok(_) => warn!("no historical prices available, starting with an empty window"),
        Err(e) => warn!(error = %e, "history warm-up failed, indicators will build up live"),
    }

    let mut ticker = tokio::time::interval(settings.cycle_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_one_cycle(&mut engine, &*client, &allocator, oracle.as_ref(), &settings).await;
            }
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("received Ctrl+C, shutting down"),
                    Err(e) => error!(error = %e, "signal handler failed, shutting down"),
                }
                break;
            }
        }
    }

    Ok(())
}

/// One scheduler tick: rebalance from a fresh balance poll, run the decision
/// cycle, and log the oracle's advisory view. Awaited inline so cycles never
/// overlap.
async fn run_one_cycle(
    engine: &mut TradingEngine,
    client: &dyn ExchangeApi,
    allocator: &PortfolioAllocator,
    oracle: Option<&OpenAiOracle>,
    settings: &Settings,
) {
    match client.account_balance(&settings.balance_asset).await {
        Ok(total) => allocator.rebalance(total),
        Err(e) => warn!(error = %e, "balance poll failed, keeping previous allocation"),
    }

    let outcome = engine.run_cycle().await;
    info!(?outcome, "cycle finished");

    if let Some(oracle) = oracle {
        if let Some(snapshot) = engine.market_snapshot() {
            let advice = oracle.advise(&snapshot).await;
            info!(%advice, "oracle advice");
        }
    }
}
