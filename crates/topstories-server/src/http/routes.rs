use super::{AppResult, AppState};
use axum::{
    extract::State,
    http::Method,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use topstories_core::{HnApi, TopStoriesView};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn create_router<H: HnApi + 'static>(state: AppState<H>) -> Router {
    Router::new()
        .route("/top-stories.json", get(top_stories::<H>))
        .route("/update", get(update::<H>))
        .route("/health", get(health::<H>))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn top_stories<H: HnApi + 'static>(
    State(state): State<AppState<H>>,
) -> AppResult<Json<TopStoriesView>> {
    Ok(Json(state.reader.top_stories_view().await?))
}

#[derive(Serialize)]
struct UpdateResponse {
    ok: bool,
}

async fn update<H: HnApi + 'static>(
    State(state): State<AppState<H>>,
) -> AppResult<Json<UpdateResponse>> {
    let outcome = state.refresher.refresh_guarded().await?;
    tracing::info!(accepted = ?outcome.accepted, "manual refresh complete");
    Ok(Json(UpdateResponse { ok: true }))
}

#[derive(Serialize)]
struct HealthResponse {
    healthy: bool,
    version: String,
    uptime_seconds: u64,
}

async fn health<H: HnApi + 'static>(State(state): State<AppState<H>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}
