//! HTTP surface of the portfolio site.
//!
//!
//!
//! # Routes
//!
//! | Method | Path                      | Answer |
//! |--------|---------------------------|--------|
//! | GET    | `/api/github/user`        | GitHub user or `null`, always 200 |
//! | GET    | `/api/github/repos`       | 10 most recently updated repos or `[]`, always 200 |
//! | GET    | `/api/modrinth/user`      | Modrinth user or `null`, always 200 |
//! | GET    | `/api/modrinth/projects`  | Modrinth projects or `[]`, always 200 |
//! | GET    | `/api/profile`            | Latest aggregated snapshot |
//! | POST   | `/api/profile/refresh`    | Manual retry, answers with the new snapshot |
//! | GET    | `/api/health`             | Uptime, version and per-platform status |
//! | GET    | `/api/maintenance`        | Maintenance flag |
//! | POST   | `/api/maintenance`        | Set the maintenance flag |
//!
//! The four proxies never forward an upstream failure as an HTTP error. Instead:
//! - `X-Rate-Limited: true` when the platform's quota is spent
//! - `X-Error: true` for anything else that went wrong
//! - Neither when the resource simply does not exist (404)
//!
//!
//!
//! # Refresh Loop
//! - The aggregator refreshes once at startup, then every `REFRESH_INTERVAL_SECS`
//! - Shutdown stops the loop through its handle before the process exits
//!
//!
//!
//! # Environment
//!
//! | Key | Default |
//! |-----|---------|
//! | `RUST_PORT` | `8080` |
//! | `RUST_LOG` | unset, errors only |
//! | `GITHUB_USERNAME` | `MatisseAD` |
//! | `MODRINTH_USERNAME` | `Matisse` |
//! | `GITHUB_API_URL` | `https://api.github.com` |
//! | `MODRINTH_API_URL` | `https://api.modrinth.com/v2` |
//! | `REFRESH_INTERVAL_SECS` | `900` |
//! | `REQUEST_TIMEOUT_MS` | `10000` |
//!
//! An optional GitHub token is read from `/run/secrets/GITHUB_TOKEN`.
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{
            CONTENT_TYPE, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_DNS_PREFETCH_CONTROL,
            X_FRAME_OPTIONS, X_XSS_PROTECTION,
        },
    },
    routing::{get, post},
};

use signal::ctrl_c;
#[cfg(unix)]
use signal::unix::{SignalKind, signal};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod aggregator;
pub mod config;
pub mod error;
pub mod maintenance;
pub mod routes;
pub mod state;
pub mod utils;

#[cfg(test)]
mod testing;

use config::Config;
use error::AppError;
use routes::{
    github_repos_handler, github_user_handler, health_handler, maintenance_handler,
    modrinth_projects_handler, modrinth_user_handler, profile_handler, refresh_handler,
    update_maintenance_handler,
};
use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/github/user", get(github_user_handler))
        .route("/api/github/repos", get(github_repos_handler))
        .route("/api/modrinth/user", get(modrinth_user_handler))
        .route("/api/modrinth/projects", get(modrinth_projects_handler))
        .route("/api/profile", get(profile_handler))
        .route("/api/profile/refresh", post(refresh_handler))
        .route("/api/health", get(health_handler))
        .route(
            "/api/maintenance",
            get(maintenance_handler).post(update_maintenance_handler),
        )
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            REFERRER_POLICY,
            HeaderValue::from_static("origin-when-cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_DNS_PREFETCH_CONTROL,
            HeaderValue::from_static("on"),
        ))
        .with_state(state)
}

pub async fn start_server() -> Result<(), AppError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let config = Config::load()?;
    let refresh_interval = config.refresh_interval;
    let state = AppState::new(config)?;

    info!("Starting profile refresh every {}s", refresh_interval.as_secs());
    let refresher = state.aggregator.start(refresh_interval);

    info!("Starting server...");
    let app = build_router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    refresher.stop().await;
    info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
