use std::sync::Arc;

use actix_web::web;
use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use order_ingest::api::{build_http_server, AppState};
use order_ingest::cache::OrderCache;
use order_ingest::config::Config;
use order_ingest::messaging::OrderConsumer;
use order_ingest::metrics::Metrics;
use order_ingest::pipeline::{recover_cache, IngestPipeline};
use order_ingest::store::{OrderStore, PgOrderStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_ingest=debug")),
        )
        .init();

    tracing::info!("🚀 Starting order ingestion service");

    let config = Config::from_env()?;
    tracing::info!(
        kafka_brokers = %config.kafka_brokers,
        topic = %config.kafka_topic,
        workers = config.consumer_workers,
        http_port = config.http_port,
        "Configuration loaded"
    );

    // === 1. Store ===
    tracing::info!("Connecting to PostgreSQL...");
    let store = PgOrderStore::connect(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to connect to database")?;
    store.ensure_schema().await.context("Failed to prepare schema")?;
    let store: Arc<dyn OrderStore> = Arc::new(store);

    // === 2. Metrics ===
    let metrics = Arc::new(Metrics::new()?);

    // === 3. Cache, restored before anything is consumed ===
    let cache = Arc::new(OrderCache::new());
    let restored = recover_cache(store.as_ref(), &cache, config.startup_load_timeout).await;
    metrics.record_restore(restored);

    // === 4. Consumers ===
    let pipeline = IngestPipeline::new(store.clone(), cache.clone(), config.pipeline_settings())
        .with_metrics(metrics.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut consumers = Vec::with_capacity(config.consumer_workers);
    for worker in 0..config.consumer_workers {
        let consumer = OrderConsumer::new(
            &config.kafka_brokers,
            &config.kafka_group_id,
            &config.kafka_topic,
        )?;
        consumers.push(tokio::spawn(consumer.run(
            worker,
            pipeline.clone(),
            shutdown_rx.clone(),
        )));
    }
    tracing::info!(workers = consumers.len(), "📡 Subscribed to topic {}", config.kafka_topic);

    // === 5. HTTP read surface ===
    let state = web::Data::new(AppState {
        lookup: cache.clone(),
        metrics: metrics.clone(),
    });
    let server = build_http_server(state, config.http_port)?;
    let server_handle = server.handle();
    let http = tokio::spawn(server);

    // === 6. Wait for Ctrl-C, then shut down ===
    tokio::signal::ctrl_c().await?;
    tracing::info!("🛑 Shutting down...");

    let _ = shutdown_tx.send(true);
    server_handle.stop(true).await;

    for result in futures_util::future::join_all(consumers).await {
        if let Err(e) = result {
            tracing::error!(error = %e, "Consumer task failed");
        }
    }
    if let Err(e) = http.await? {
        tracing::error!(error = %e, "HTTP server error");
    }

    tracing::info!(cached_orders = cache.size(), "Service exited");
    Ok(())
}
