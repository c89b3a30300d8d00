//! Stock lot endpoints.
//!
//! Routes:
//! - `GET    /stocks`                 owner's lots with status, soonest expiry first
//! - `POST   /stocks`                 add a lot
//! - `PUT    /stocks/:id`             partial update
//! - `DELETE /stocks/:id`             remove a lot and its alerts
//! - `GET    /stocks/expiring/:days`  lots expiring within `days` (expired included)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Local;

use super::{bad_request, headers::OwnerId, internal, not_found, ApiError, SharedState};
use crate::expiry::StockRecord;
use crate::repository::{NewStock, StockUpdate, StockWithStatus};

/// Longest look-ahead accepted by `/stocks/expiring/:days`.
pub const MAX_EXPIRING_DAYS: u32 = 3650;

pub async fn list_stocks(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
) -> Result<Json<Vec<StockWithStatus>>, ApiError> {
    let today = Local::now().date_naive();
    let stocks = state
        .repository
        .list_stocks(owner_id)
        .await
        .map_err(internal)?;

    Ok(Json(
        stocks.into_iter().map(|s| s.with_status(today)).collect(),
    ))
}

pub async fn expiring_stocks(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Path(days): Path<u32>,
) -> Result<Json<Vec<StockWithStatus>>, ApiError> {
    if days > MAX_EXPIRING_DAYS {
        return Err(bad_request(format!(
            "days must be at most {}",
            MAX_EXPIRING_DAYS
        )));
    }

    let today = Local::now().date_naive();
    let stocks = state
        .repository
        .list_expiring(owner_id, days, today)
        .await
        .map_err(internal)?;

    Ok(Json(
        stocks.into_iter().map(|s| s.with_status(today)).collect(),
    ))
}

pub async fn create_stock(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Json(body): Json<NewStock>,
) -> Result<(StatusCode, Json<StockRecord>), ApiError> {
    if body.purchase_price.is_some_and(|price| price < 0.0) {
        return Err(bad_request("purchase_price must not be negative"));
    }

    let stock = state
        .repository
        .insert_stock(owner_id, &body)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Medicine not found"))?;

    tracing::debug!("Owner {} added stock {}", owner_id, stock.id);
    Ok((StatusCode::CREATED, Json(stock)))
}

pub async fn update_stock(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<i64>,
    Json(body): Json<StockUpdate>,
) -> Result<Json<StockRecord>, ApiError> {
    if body.is_empty() {
        return Err(bad_request("No fields to update"));
    }

    state
        .repository
        .update_stock(owner_id, id, &body)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| not_found("Stock not found"))
}

pub async fn delete_stock(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .repository
        .delete_stock(owner_id, id)
        .await
        .map_err(internal)?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Stock not found"))
    }
}
