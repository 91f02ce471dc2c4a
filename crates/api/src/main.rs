//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use common::Currency;
use metrics_exporter_prometheus::PrometheusHandle;
use payments::{CheckoutUrls, InMemoryPaymentGateway, PaymentGateway, StripeConfig, StripeGateway};
use sqlx::postgres::PgPoolOptions;
use store::{InMemoryStore, PostgresStore, Store};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn build_gateway(config: &Config) -> Arc<dyn PaymentGateway> {
    match &config.stripe_key {
        Some(key) => {
            let stripe =
                StripeConfig::new(key.as_str()).with_api_base(config.stripe_api_base.as_str());
            tracing::info!(api_base = %config.stripe_api_base, "using Stripe payment gateway");
            Arc::new(StripeGateway::new(stripe).expect("failed to build HTTP client"))
        }
        None => {
            tracing::warn!("STRIPE_KEY not set, using in-memory payment gateway");
            Arc::new(InMemoryPaymentGateway::new())
        }
    }
}

async fn serve<S: Store>(
    config: Config,
    store: S,
    gateway: Arc<dyn PaymentGateway>,
    metrics_handle: PrometheusHandle,
) {
    let currency = Currency::parse(&config.currency).expect("CURRENCY must be a three-letter code");
    let urls = CheckoutUrls::for_site(&config.site_url);
    let state = api::create_default_state(store, gateway, urls, currency);
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    tracing::debug!(?config, "configuration loaded");

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Pick the payment gateway and the store
    let gateway = build_gateway(&config);

    match config.database_url.clone() {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(&url)
                .await
                .expect("failed to connect to database");
            let store = PostgresStore::new(pool);
            store.run_migrations().await.expect("migrations failed");
            tracing::info!("using PostgreSQL store");
            serve(config, store, gateway, metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            serve(config, InMemoryStore::new(), gateway, metrics_handle).await;
        }
    }
}
