//! Channel Ranking Service Binary
//!
//! Runs the channel registry, the growth conversion scheduler and the HTTP
//! layer in one process:
//! - Structured JSON logging
//! - Request access log with correlation IDs
//! - Graceful shutdown with a final snapshot
//!
//! ## Configuration
//!
//! See [`ServiceConfig`] for the environment variables. `RUST_LOG` sets
//! the log filter (default: info).
//!
//! ## Usage
//!
//! ```bash
//! PORT=3000 DATA_DIR=./data cargo run --bin channel_ranking_service
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::middleware;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use channel_ranking::service::{access_log_middleware, create_router, metrics_middleware, ServiceState};
use channel_ranking::{ChannelRegistry, ConversionScheduler, JsonFileStore, LogFormat, ServiceConfig};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "channel_ranking=info,channel_ranking_service=info,tower_http=info".into());

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE)
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_current_span(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .flatten_event(true)
                )
                .init();
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::from_env();
    init_tracing(config.log_format);

    let version = env!("CARGO_PKG_VERSION");
    info!(version = version, "Starting Channel Ranking Service");

    let store = Arc::new(JsonFileStore::new(config.snapshot_path()));
    let policy = config.growth_policy();
    let registry = Arc::new(ChannelRegistry::open(store, policy).await);

    info!(
        channel_count = registry.len().await,
        ticks_per_hour = policy.ticks_per_hour(),
        snapshot = %config.snapshot_path().display(),
        "Channel registry initialized"
    );

    let scheduler = ConversionScheduler::spawn(Arc::clone(&registry), config.tick_interval);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(ServiceState::new(Arc::clone(&registry)))
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(access_log_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = config.bind_address().parse()?;
    info!(
        address = %addr,
        static_dir = %config.static_dir.display(),
        version = version,
        "Channel Ranking Service listening"
    );

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await?;
    if let Err(e) = registry.persist().await {
        error!(error = %e, "Final snapshot failed");
    }

    info!("Channel Ranking Service shutdown complete");

    Ok(())
}
