use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};

use super::{headers::no_store, SharedState};

/// `GET /health`: `ok` when the database answers, 503 otherwise.
pub async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    let (status, body) = match state.repository.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(err) => {
            tracing::warn!("Health check failed: {}", err);
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    };

    (status, [(header::CACHE_CONTROL, no_store())], body)
}
