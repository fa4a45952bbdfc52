use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::cli::ServeArgs;
use crate::constants::{
    DEFAULT_RADIUS_KM, DEFAULT_RESULT_LIMIT, GEOCODE_API_DOC_URL, NPPES_API_DOC_URL,
    TRIALS_API_DOC_URL,
};
use crate::service::FinderService;

#[derive(Clone)]
struct AppState {
    service: Arc<FinderService>,
}

pub async fn run(opts: ServeArgs) -> anyhow::Result<()> {
    tracing::info!("Upstream API references:");
    tracing::info!("  - {NPPES_API_DOC_URL}");
    tracing::info!("  - {TRIALS_API_DOC_URL}");
    tracing::info!("  - {GEOCODE_API_DOC_URL}");

    let service = FinderService::new(opts.api.to_config()).context("build finder service")?;
    let state = AppState {
        service: Arc::new(service),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/physicians", get(api_physicians))
        .route("/api/trials", get(api_trials))
        .layer(cors)
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", opts.host, opts.port)
        .parse()
        .context("parse host:port")?;

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct PhysicianParams {
    city: Option<String>,
    state: Option<String>,
    condition: Option<String>,
    limit: Option<usize>,
}

async fn api_physicians(
    State(st): State<AppState>,
    Query(p): Query<PhysicianParams>,
) -> impl IntoResponse {
    let response = st
        .service
        .find_physicians(
            p.city.as_deref(),
            p.state.as_deref(),
            p.condition.as_deref(),
            p.limit.unwrap_or(DEFAULT_RESULT_LIMIT),
        )
        .await;
    Json(response)
}

#[derive(Debug, Deserialize)]
struct TrialParams {
    condition: Option<String>,
    city: Option<String>,
    state: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
    max_distance_km: Option<f64>,
}

async fn api_trials(
    State(st): State<AppState>,
    Query(p): Query<TrialParams>,
) -> impl IntoResponse {
    let response = st
        .service
        .find_trials_with_physicians(
            p.condition.as_deref(),
            p.city.as_deref(),
            p.state.as_deref(),
            p.limit.unwrap_or(DEFAULT_RESULT_LIMIT),
            p.offset.unwrap_or(0),
            p.max_distance_km.unwrap_or(DEFAULT_RADIUS_KM),
        )
        .await;
    Json(response)
}
