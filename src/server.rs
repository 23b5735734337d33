use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::notify::Notification;
use crate::session::{GuessReply, SessionView};
use crate::state::{AppState, EventEntry};
use crate::types::Direction;
use crate::web;

type S = Arc<AppState>;

pub fn build_router(state: S) -> Router {
    Router::new()
        .route("/", get(serve_ui))
        .route("/api/status", get(get_status))
        .route("/api/config", get(get_config))
        .route("/api/events", get(get_events))
        .route("/api/notifications", get(get_notifications))
        .route("/api/guess", post(post_guess))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── UI ──────────────────────────────────────────────────────────────────────

async fn serve_ui() -> axum::response::Html<&'static str> {
    axum::response::Html(web::INDEX_HTML)
}

// ── Status ──────────────────────────────────────────────────────────────────

async fn get_status(State(state): State<S>) -> Json<SessionView> {
    Json(state.session.view())
}

async fn get_config(State(state): State<S>) -> Json<serde_json::Value> {
    let config = &state.config;
    Json(serde_json::json!({
        "supabase_url": config.supabase_url,
        "players_table": config.players_table,
        "btc_price_api": config.btc_price_api,
        "price_poll_secs": config.price_poll_secs,
        "guess_window_secs": config.guess_window_secs,
        "notifications": config.notifications,
    }))
}

async fn get_events(State(state): State<S>) -> Json<Vec<EventEntry>> {
    Json(state.events.snapshot())
}

async fn get_notifications(State(state): State<S>) -> Json<Vec<Notification>> {
    Json(state.feed.as_ref().map(|f| f.drain()).unwrap_or_default())
}

// ── Guess ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct GuessRequest {
    direction: String,
}

#[derive(Serialize)]
struct GuessResponse {
    accepted: bool,
    #[serde(flatten)]
    reply: GuessReply,
}

async fn post_guess(
    State(state): State<S>,
    Json(body): Json<GuessRequest>,
) -> Result<Json<GuessResponse>, (StatusCode, Json<serde_json::Value>)> {
    let direction = Direction::parse(&body.direction).ok_or_else(|| {
        reject(StatusCode::BAD_REQUEST, format!("invalid direction {:?}, expected up or down", body.direction))
    })?;

    let reply = state
        .session
        .submit_guess(direction)
        .await
        .map_err(|e| reject(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;

    match reply {
        GuessReply::Accepted { .. } => Ok(Json(GuessResponse { accepted: true, reply })),
        GuessReply::AlreadyPending => Err(reject(StatusCode::CONFLICT, "a guess is already pending".into())),
        GuessReply::PlayerNotReady => Err(reject(StatusCode::SERVICE_UNAVAILABLE, "player not loaded".into())),
        GuessReply::NoPrice => Err(reject(StatusCode::SERVICE_UNAVAILABLE, "no price available yet".into())),
    }
}

fn reject(status: StatusCode, detail: String) -> (StatusCode, Json<serde_json::Value>) {
    tracing::debug!(status = %status, detail, "guess rejected");
    (status, Json(serde_json::json!({ "accepted": false, "detail": detail })))
}
