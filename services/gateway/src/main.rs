use contracts::memory_ledger::MemoryLedger;
use gateway::events::run_event_loop;
use gateway::notify::LogNotifier;
use gateway::router::create_router;
use gateway::state::AppState;
use gateway::{Exchange, GatewayConfig};
use persistence::{ExchangeStore, MemoryStore};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = GatewayConfig::load()?;

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting exchange node");

    let store = Arc::new(MemoryStore::new());
    for pair in &config.pairs {
        store.insert_pair(pair.clone())?;
        tracing::info!(pair_id = %pair.pair_id, "pair listed");
    }

    // The in-process ledger has no history to wait for
    let ledger = Arc::new(MemoryLedger::new(
        config.ledger.operator_address.clone(),
        config.ledger.device_address.clone(),
    ));
    ledger.mark_operator_stable();

    let addr = config.http_listen_addr.clone();
    let exchange = Arc::new(Exchange::new(config, store, ledger, Arc::new(LogNotifier)).with_configured_journal()?);
    if !exchange.is_operator_ready().await? {
        tracing::warn!("operator address not resolved yet");
    }

    let (events_tx, events_rx) = mpsc::channel(1024);
    let (fatal_tx, mut fatal_rx) = mpsc::channel(1);
    let event_loop = tokio::spawn(run_event_loop(exchange.clone(), events_rx, fatal_tx));

    let app = create_router(AppState::new(exchange, events_tx));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    tokio::select! {
        served = axum::serve(listener, app).into_future() => served?,
        fatal = fatal_rx.recv() => {
            event_loop.abort();
            match fatal {
                Some(err) => {
                    tracing::error!(error = %err, "fatal error, shutting down");
                    return Err(err.into());
                }
                None => anyhow::bail!("ledger event loop stopped"),
            }
        }
    }

    Ok(())
}
