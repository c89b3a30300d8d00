//! HTTP surface.
//!
//! Every owner-scoped route reads the owner from the `X-Owner-Id` header
//! (see [`headers::OwnerId`]). Errors are returned as
//! `(StatusCode, Json({"error": ...}))`.

pub mod alerts;
pub mod headers;
pub mod health;
pub mod medicines;
pub mod stocks;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use crate::expiry::ExpirySweeper;
use crate::lookup::MedicineResolver;
use crate::metrics::AppMetrics;
use crate::repository::MedicineRepository;

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<Value>);

/// Everything the handlers need.
pub struct AppState {
    pub repository: Arc<MedicineRepository>,
    pub resolver: MedicineResolver,
    pub sweeper: ExpirySweeper,
    pub metrics: Arc<AppMetrics>,
}

pub type SharedState = Arc<AppState>;

/// Assemble the full router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(render_metrics))
        .route("/medicines", post(medicines::create_medicine))
        .route("/medicines/barcode/:barcode", get(medicines::lookup_barcode))
        .route("/medicines/detailed/:barcode", get(medicines::detailed_lookup))
        .route("/medicines/clear-cache", post(medicines::clear_cache))
        .route("/stocks", get(stocks::list_stocks).post(stocks::create_stock))
        .route("/stocks/expiring/:days", get(stocks::expiring_stocks))
        .route("/stocks/:id", put(stocks::update_stock).delete(stocks::delete_stock))
        .route("/alerts", get(alerts::list_alerts))
        .route("/alerts/unread", get(alerts::unread_alerts))
        .route("/alerts/stats", get(alerts::alert_stats))
        .route("/alerts/read-all", put(alerts::mark_all_read))
        .route("/alerts/check-expiry", post(alerts::check_expiry))
        .route("/alerts/:id/read", put(alerts::mark_read))
        .route("/alerts/:id", delete(alerts::delete_alert))
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_http_metrics,
        ))
        .with_state(state)
}

/// `GET /metrics` in Prometheus text format.
async fn render_metrics(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let body = state.metrics.render().map_err(internal)?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
        .body(Body::from(body))
        .map_err(internal)
}

async fn track_http_metrics(
    State(metrics): State<Arc<AppMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let started = Instant::now();

    let response = next.run(request).await;

    metrics
        .http_requests_total
        .with_label_values(&[&method, &path, response.status().as_str()])
        .inc();
    metrics
        .http_request_duration
        .observe(started.elapsed().as_secs_f64());

    response
}

pub(crate) fn internal(err: impl std::fmt::Display) -> ApiError {
    tracing::error!("Request failed: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string() })),
    )
}

pub(crate) fn not_found(message: &str) -> ApiError {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message })))
}

pub(crate) fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message.into() })),
    )
}
