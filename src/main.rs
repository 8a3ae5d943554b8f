use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use dotenvy::dotenv;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod bus;
mod chain;
mod config;
mod domain;
mod errors;
mod ingest;
mod kv;
mod notify;
mod payout;
mod seed_window;
mod state;

use api::RateLimiter;
use bus::NatsMessageBus;
use chain::HttpChainClient;
use config::Config;
use kv::{BetRepository, KvStore, RedisKvStore};
use notify::{DeliveryHandler, NotConfirmedSet, SpendWatcher};
use payout::PayoutEngine;
use seed_window::{SeedWindow, SeedWindowConfig};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let (filter, log_filter) = tracing_subscriber::reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let metrics_handle = install_metrics();

    let config = Config::from_env()?;

    let kv: Arc<dyn KvStore> = Arc::new(RedisKvStore::connect(&config.kv_url).await?);
    let bus: Arc<dyn bus::MessageBus> = Arc::new(NatsMessageBus::connect(&config.bus_url).await?);
    let chain: Arc<dyn chain::ChainClient> = Arc::new(HttpChainClient::new(
        config.node_url.clone(),
        config.node_api_key.clone(),
        config.wallet_pass.clone(),
        config.explorer_url.clone(),
    )?);
    let seed_window = Arc::new(SeedWindow::new(SeedWindowConfig::default()));

    let not_confirmed = Arc::new(NotConfirmedSet::new());
    not_confirmed.sync_from_kv(&kv).await?;
    info!("NotConfirmed mirror synced from kv at startup");

    let cancel = CancellationToken::new();

    let payout_engine = PayoutEngine::new(
        chain.clone(),
        kv.clone(),
        payout::PayoutConfig {
            oracle_address: config.oracle_address.clone(),
            roulette_ergo_tree: config.roulette_ergo_tree.clone(),
            house_address: config.house_address.clone(),
        },
    );
    let spend_watcher = SpendWatcher::new(
        chain.clone(),
        bus.clone(),
        BetRepository::new(kv.clone()),
        not_confirmed.clone(),
    );
    let delivery_handler = DeliveryHandler::new(bus.clone(), kv.clone());

    let mut background_tasks = Vec::new();
    {
        let cancel = cancel.clone();
        background_tasks.push(tokio::spawn(async move { payout_engine.run(cancel).await }));
    }
    {
        let cancel = cancel.clone();
        background_tasks.push(tokio::spawn(async move { spend_watcher.run(cancel).await }));
    }
    {
        let cancel = cancel.clone();
        background_tasks.push(tokio::spawn(async move { delivery_handler.run(cancel).await }));
    }
    {
        let bus = bus.clone();
        let seed_window = seed_window.clone();
        let cancel = cancel.clone();
        background_tasks.push(tokio::spawn(async move {
            ingest::run(bus, seed_window, cancel).await
        }));
    }

    let app_state = AppState {
        kv: kv.clone(),
        bus: bus.clone(),
        seed_window: seed_window.clone(),
        metrics: metrics_handle.clone(),
        log_filter,
    };

    let rate_limiter = RateLimiter::new();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderName::from_static("owl-session-id"),
        ]);

    let notifs_route = Router::new()
        .route("/api/v1/notifs/:wallet_addr", get(api::notifs))
        .route_layer(axum::middleware::from_fn_with_state(
            rate_limiter,
            api::notifs_rate_limit,
        ));

    let app = Router::new()
        .route("/info", get(api::info))
        .route("/metrics", get(move || async move { metrics_handle.render() }))
        .route("/api/v1/random-number/:game", get(api::random_number))
        .route(
            "/api/v1/test/random-number/roulette",
            get(api::test_random_number),
        )
        .merge(notifs_route)
        .route(
            "/api/v1/verbosity",
            get(api::get_verbosity).put(api::put_verbosity),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;

    let shutdown_cancel = cancel.clone();
    let serve = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
        shutdown_cancel.cancel();
    });

    if let Err(e) = serve.await {
        error!(error = %e, "http server exited with error");
    }

    cancel.cancel();
    for task in background_tasks {
        let _ = tokio::time::timeout(Duration::from_secs(15), task).await;
    }

    Ok(())
}

fn install_metrics() -> metrics_exporter_prometheus::PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("install metrics recorder")
}
