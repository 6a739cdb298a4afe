use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use upstream::{GitHubRepo, GitHubUser, ModrinthProject, ModrinthUser, Source};

use crate::{
    aggregator::{ProfileSnapshot, SourceStatus},
    error::AppError,
    maintenance::MaintenanceUpdate,
    state::AppState,
    utils::{proxy_collection, proxy_record},
};

pub async fn github_user_handler(State(state): State<Arc<AppState>>) -> Response {
    proxy_record::<GitHubUser>(Source::GitHub, "GitHub user", state.source.github_user().await)
}

pub async fn github_repos_handler(State(state): State<Arc<AppState>>) -> Response {
    proxy_collection::<GitHubRepo>(
        Source::GitHub,
        "GitHub repos",
        state.source.github_repos().await,
    )
}

pub async fn modrinth_user_handler(State(state): State<Arc<AppState>>) -> Response {
    proxy_record::<ModrinthUser>(
        Source::Modrinth,
        "Modrinth user",
        state.source.modrinth_user().await,
    )
}

pub async fn modrinth_projects_handler(State(state): State<Arc<AppState>>) -> Response {
    proxy_collection::<ModrinthProject>(
        Source::Modrinth,
        "Modrinth projects",
        state.source.modrinth_projects().await,
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileView<'a> {
    #[serde(flatten)]
    snapshot: &'a ProfileSnapshot,
    is_rate_limited: bool,
    has_partial_data: bool,
}

fn profile_response(snapshot: &ProfileSnapshot) -> Response {
    Json(ProfileView {
        snapshot,
        is_rate_limited: snapshot.is_rate_limited(),
        has_partial_data: snapshot.has_partial_data(),
    })
    .into_response()
}

pub async fn profile_handler(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.aggregator.snapshot();
    profile_response(&snapshot)
}

pub async fn refresh_handler(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.aggregator.refresh(true).await;
    profile_response(&snapshot)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceHealth {
    Operational,
    Degraded,
    Down,
}

impl From<SourceStatus> for ServiceHealth {
    fn from(status: SourceStatus) -> Self {
        match status {
            SourceStatus::Success => Self::Operational,
            SourceStatus::RateLimited => Self::Degraded,
            SourceStatus::Error => Self::Down,
        }
    }
}

#[derive(Serialize)]
struct Services {
    github: ServiceHealth,
    modrinth: ServiceHealth,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    timestamp: DateTime<Utc>,
    uptime: u64,
    version: &'static str,
    services: Services,
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let api_status = state.aggregator.snapshot().api_status;

    Json(Health {
        status: "healthy",
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION"),
        services: Services {
            github: api_status.github.into(),
            modrinth: api_status.modrinth.into(),
        },
    })
}

pub async fn maintenance_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.maintenance.get().await)
}

pub async fn update_maintenance_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) =
        payload.map_err(|_| AppError::MalformedPayload("Invalid request body".to_string()))?;

    let update = MaintenanceUpdate::from_json(&body)?;
    let state = state.maintenance.set(update).await;

    Ok(Json(json!({ "success": true, "state": state })))
}
