use anyhow::Result;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    serve, Router,
};
use fastbreak_core::{
    cache::{CacheStore, CacheTtls},
    config::AppConfig,
    middleware::ClientRateLimiter,
    service::StatsService,
    upstream::{CallGovernor, RetryingClient, StatsClient},
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod middleware;
mod router;
mod schemas;

/// Interval for evicting idle clients from the inbound limiter.
const LIMITER_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,fastbreak_core={level},server={level}",
            level = config.logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.as_str() == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        // "pretty" and any other format default to pretty logging
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_target(false);
        registry.with(fmt_layer).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config =
        AppConfig::load().map_err(|e| anyhow::anyhow!("Configuration loading failed: {e}"))?;
    config.validate().map_err(|e| anyhow::anyhow!("Configuration validation failed: {e}"))?;

    init_logging(&config);
    info!("Starting stats proxy");

    let cache = Arc::new(CacheStore::connect(&config.cache).await);
    info!(backend = cache.backend_name(), "Cache store initialized");

    let governor = Arc::new(CallGovernor::new(
        config.upstream.rate_limit_calls,
        config.upstream.rate_limit_period(),
    ));
    let client = Arc::new(
        StatsClient::new(&config.upstream)
            .map_err(|e| anyhow::anyhow!("HTTP client initialization failed: {e}"))?,
    );
    let retry =
        RetryingClient::new(governor, config.upstream.max_retries, config.upstream.backoff_base());
    let service = Arc::new(StatsService::new(
        cache.clone(),
        client,
        retry,
        CacheTtls::from_config(&config.cache),
    ));

    let limiter = Arc::new(ClientRateLimiter::new(
        config.server.client_rate_limit_calls,
        Duration::from_secs(config.server.client_rate_limit_period_seconds),
    ));
    limiter.start_cleanup_task(LIMITER_CLEANUP_INTERVAL);

    let state = router::AppState { service, cache };
    let app = create_app(state, limiter, &config);

    let addr = config.socket_addr().map_err(|e| anyhow::anyhow!(e))?;
    info!(address = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server = serve(listener, app.into_make_service_with_connect_info::<SocketAddr>());

    if let Err(e) = server.with_graceful_shutdown(shutdown_signal()).await {
        error!(error = %e, "Server error occurred");
    }

    info!("Server shutdown complete");
    Ok(())
}

fn create_app(
    state: router::AppState,
    limiter: Arc<ClientRateLimiter>,
    config: &AppConfig,
) -> Router {
    let public = Router::new()
        .route("/health", get(router::handle_health))
        .with_state(state.clone());

    let api = Router::new()
        .route("/api/players/search", get(router::handle_player_search))
        .route("/api/players/:name/evolution", get(router::handle_player_evolution))
        .route("/api/players/:name/shot-chart", get(router::handle_player_shot_chart))
        .route("/api/teams/stats", get(router::handle_team_stats))
        .route("/api/teams/standings", get(router::handle_team_standings))
        .route("/api/teams/:name", get(router::handle_team_lookup))
        .route("/api/analytics/compare-players", post(router::handle_compare_players))
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(limiter, middleware::rate_limit_middleware))
        .layer(ConcurrencyLimitLayer::new(config.server.max_concurrent_requests))
        .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
        .layer(CorsLayer::permissive());

    public.merge(api)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                () = std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
