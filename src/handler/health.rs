use axum::{Router, extract::State, response::IntoResponse, routing::get};
use tracing::instrument;

use crate::{AppState, dtos::Response, error::HttpError};

pub fn health_handler() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

/// Liveness of the API and both backing stores
#[instrument(skip(app_state))]
pub async fn health_check(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let db = app_state.db_client.ping().await;
    let cache = app_state.redis_client.ping().await;

    if let Err(e) = &db {
        tracing::error!("DB error, health check: {}", e);
    }
    if let Err(e) = &cache {
        tracing::error!("RedisDB error, health check: {}", e);
    }
    if db.is_err() || cache.is_err() {
        return Err(HttpError::server_error("Failed checking health services"));
    }

    Ok(Response::ok("OK", "OK"))
}
