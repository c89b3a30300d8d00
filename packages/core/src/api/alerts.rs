//! Expiry alert endpoints.
//!
//! Routes:
//! - `GET    /alerts`               owner's alerts, newest first
//! - `GET    /alerts/unread`        unread only
//! - `GET    /alerts/stats`         totals per bucket
//! - `PUT    /alerts/:id/read`      mark one read
//! - `PUT    /alerts/read-all`      mark all read
//! - `DELETE /alerts/:id`           delete one
//! - `POST   /alerts/check-expiry`  run an expiry sweep now

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Local;
use serde::Serialize;
use serde_json::json;

use super::{headers::OwnerId, internal, not_found, ApiError, SharedState};
use crate::expiry::SweepReport;
use crate::repository::{AlertStats, AlertView};
use crate::scheduler::sweep_once;

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

pub async fn list_alerts(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
) -> Result<Json<Vec<AlertView>>, ApiError> {
    state
        .repository
        .list_alerts(owner_id, false)
        .await
        .map(Json)
        .map_err(internal)
}

pub async fn unread_alerts(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
) -> Result<Json<Vec<AlertView>>, ApiError> {
    state
        .repository
        .list_alerts(owner_id, true)
        .await
        .map(Json)
        .map_err(internal)
}

pub async fn alert_stats(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
) -> Result<Json<AlertStats>, ApiError> {
    state
        .repository
        .alert_stats(owner_id)
        .await
        .map(Json)
        .map_err(internal)
}

pub async fn mark_read(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let updated = state
        .repository
        .mark_alert_read(owner_id, id)
        .await
        .map_err(internal)?;

    if updated {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Alert not found"))
    }
}

pub async fn mark_all_read(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let updated = state
        .repository
        .mark_all_alerts_read(owner_id)
        .await
        .map_err(internal)?;

    Ok(Json(MarkAllReadResponse { updated }))
}

pub async fn delete_alert(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .repository
        .delete_alert(owner_id, id)
        .await
        .map_err(internal)?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Alert not found"))
    }
}

/// `POST /alerts/check-expiry` sweeps every owner's stock as of today.
///
/// On failure the response reports how many alerts landed before the
/// sweep stopped; calling again is safe.
pub async fn check_expiry(State(state): State<SharedState>) -> Result<Json<SweepReport>, ApiError> {
    let today = Local::now().date_naive();

    sweep_once(&state.sweeper, &state.metrics, today)
        .await
        .map(Json)
        .map_err(|err| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": err.to_string(),
                    "created": err.partial.created,
                })),
            )
        })
}
