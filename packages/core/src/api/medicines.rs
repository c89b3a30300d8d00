//! Medicine endpoints.
//!
//! Routes:
//! - `GET  /medicines/barcode/:barcode`   resolve a scanned barcode
//! - `GET  /medicines/detailed/:barcode`  resolve plus storage/usage advice
//! - `POST /medicines`                    manual entry
//! - `POST /medicines/clear-cache`        drop the lookup cache

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{bad_request, headers::OwnerId, internal, ApiError, SharedState};
use crate::lookup::{
    resolver::validate_barcode, MedicineAdvice, MedicineRecord, MedicineStore, NewMedicine,
    Resolution, ResolveError, ResolvedMedicine,
};

#[derive(Debug, Deserialize)]
pub struct CreateMedicineRequest {
    pub barcode: String,
    pub name: String,
    pub active_ingredient: Option<String>,
    pub manufacturer: Option<String>,
    pub dosage_form: Option<String>,
    pub strength: Option<String>,
    pub package_size: Option<String>,
    pub description: Option<String>,
    pub country: Option<String>,
    pub prescription_required: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct DetailedMedicineResponse {
    #[serde(flatten)]
    pub resolved: ResolvedMedicine,
    pub advice: MedicineAdvice,
}

fn resolve_error(err: ResolveError) -> ApiError {
    match err {
        ResolveError::InvalidBarcode { reason } => bad_request(reason),
        ResolveError::Persistence(source) => internal(source),
    }
}

async fn resolve(
    state: &SharedState,
    owner_id: i64,
    barcode: &str,
) -> Result<ResolvedMedicine, ApiError> {
    match state
        .resolver
        .resolve(owner_id, barcode)
        .await
        .map_err(resolve_error)?
    {
        Resolution::Found(resolved) => Ok(resolved),
        Resolution::NotFound { attempts } => Err((
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "Medicine not found",
                "attempts": attempts,
            })),
        )),
    }
}

/// `GET /medicines/barcode/:barcode`
pub async fn lookup_barcode(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Path(barcode): Path<String>,
) -> Result<Json<ResolvedMedicine>, ApiError> {
    resolve(&state, owner_id, &barcode).await.map(Json)
}

/// `GET /medicines/detailed/:barcode`
pub async fn detailed_lookup(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Path(barcode): Path<String>,
) -> Result<Json<DetailedMedicineResponse>, ApiError> {
    let resolved = resolve(&state, owner_id, &barcode).await?;
    let advice = MedicineAdvice::derive(
        resolved.record.dosage_form.as_deref(),
        resolved.record.prescription_required,
    );

    Ok(Json(DetailedMedicineResponse { resolved, advice }))
}

/// `POST /medicines`: 409 when the owner already has this barcode.
pub async fn create_medicine(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Json(body): Json<CreateMedicineRequest>,
) -> Result<(StatusCode, Json<MedicineRecord>), ApiError> {
    let barcode = validate_barcode(&body.barcode).map_err(resolve_error)?;
    let name = body.name.trim();
    if name.is_empty() {
        return Err(bad_request("name is required"));
    }

    let fields = NewMedicine {
        barcode: barcode.to_string(),
        name: name.to_string(),
        active_ingredient: body.active_ingredient,
        manufacturer: body.manufacturer,
        dosage_form: body.dosage_form,
        strength: body.strength,
        package_size: body.package_size,
        description: body.description,
        country: body.country,
        prescription_required: body.prescription_required,
    };

    match state.repository.insert_medicine(owner_id, &fields).await {
        Ok(record) => Ok((StatusCode::CREATED, Json(record))),
        Err(err) if err.is_duplicate() => Err((
            StatusCode::CONFLICT,
            Json(json!({ "error": "A medicine with this barcode already exists" })),
        )),
        Err(err) => Err(internal(err)),
    }
}

/// `POST /medicines/clear-cache`
pub async fn clear_cache(State(state): State<SharedState>) -> Json<Value> {
    state.resolver.clear_cache().await;
    Json(json!({ "cleared": true }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Method, Request},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::api::{router, test_support::*};
    use crate::lookup::{MedicineProvider, NormalizedMedicine, ProviderError};
    use crate::services::mock_provider::MockMedicineProvider;

    fn syrup() -> NormalizedMedicine {
        NormalizedMedicine {
            name: Some("Calpol Syrup".into()),
            dosage_form: Some("Oral syrup".into()),
            country: Some("TR".into()),
            prescription_required: Some(true),
            ..Default::default()
        }
    }

    fn get(uri: &str, owner: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header("x-owner-id", owner)
            .body(Body::empty())
            .unwrap()
    }

    fn post_json(uri: &str, owner: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("x-owner-id", owner)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn barcode_lookup_returns_record_and_source() {
        let provider: Arc<dyn MedicineProvider + Send + Sync> =
            Arc::new(MockMedicineProvider::new("regional").with_medicine(syrup()));
        let app = router(state_with(vec![provider]).await);

        let resp = app.clone().oneshot(get("/medicines/barcode/8699", "1")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp.into_body()).await;
        assert_eq!(json["source"], "external");
        assert_eq!(json["record"]["name"], "Calpol Syrup");
        assert_eq!(json["record"]["owner_id"], 1);
        assert_eq!(json["provider_meta"]["provider"], "regional");

        let resp = app.oneshot(get("/medicines/barcode/8699", "1")).await.unwrap();
        let json = body_json(resp.into_body()).await;
        assert_eq!(json["source"], "persisted");
    }

    #[tokio::test]
    async fn unknown_barcode_is_404_with_attempts() {
        let failing: Arc<dyn MedicineProvider + Send + Sync> = Arc::new(
            MockMedicineProvider::new("regional").with_error(ProviderError::ServiceUnavailable),
        );
        let empty: Arc<dyn MedicineProvider + Send + Sync> =
            Arc::new(MockMedicineProvider::new("openfda"));
        let app = router(state_with(vec![failing, empty]).await);

        let resp = app.oneshot(get("/medicines/barcode/0000", "1")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp.into_body()).await;
        assert_eq!(json["error"], "Medicine not found");
        assert_eq!(json["attempts"][0]["provider"], "regional");
        assert_eq!(json["attempts"][0]["outcome"], "unavailable");
        assert_eq!(json["attempts"][1]["outcome"], "no_match");
    }

    #[tokio::test]
    async fn missing_owner_header_is_400() {
        let app = router(state_with(vec![]).await);
        let req = Request::builder()
            .uri("/medicines/barcode/8699")
            .body(Body::empty())
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_barcode_is_400() {
        let app = router(state_with(vec![]).await);

        let resp = app.oneshot(get("/medicines/barcode/86%3B99", "1")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn detailed_lookup_adds_advice() {
        let provider: Arc<dyn MedicineProvider + Send + Sync> =
            Arc::new(MockMedicineProvider::new("regional").with_medicine(syrup()));
        let app = router(state_with(vec![provider]).await);

        let resp = app.oneshot(get("/medicines/detailed/8699", "1")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp.into_body()).await;
        assert_eq!(json["record"]["name"], "Calpol Syrup");
        assert_eq!(json["advice"]["storage_conditions"][0], "Store in a refrigerator");
        assert_eq!(
            json["advice"]["usage_instructions"][0],
            "Prescription medicine: use under medical supervision"
        );
    }

    #[tokio::test]
    async fn detailed_advice_is_stable_once_persisted() {
        let provider: Arc<dyn MedicineProvider + Send + Sync> = Arc::new(
            MockMedicineProvider::new("regional").with_medicine(NormalizedMedicine {
                name: Some("Parol".into()),
                dosage_form: Some("Tablet".into()),
                prescription_required: Some(true),
                ..Default::default()
            }),
        );
        let app = router(state_with(vec![provider]).await);

        let resp = app.clone().oneshot(get("/medicines/detailed/8699", "1")).await.unwrap();
        let first = body_json(resp.into_body()).await;
        let resp = app.oneshot(get("/medicines/detailed/8699", "1")).await.unwrap();
        let second = body_json(resp.into_body()).await;

        assert_eq!(first["source"], "external");
        assert_eq!(second["source"], "persisted");
        assert_eq!(second["record"]["prescription_required"], true);
        assert_eq!(
            second["advice"]["usage_instructions"],
            serde_json::json!([
                "Prescription medicine: use under medical supervision",
                "Take after meals"
            ])
        );
        assert_eq!(first["advice"], second["advice"]);
    }

    #[tokio::test]
    async fn manual_entry_keeps_prescription_flag_for_advice() {
        let app = router(state_with(vec![]).await);
        let body = r#"{"barcode":"8699","name":"Augmentin","dosage_form":"Tablet","prescription_required":true}"#;

        let resp = app.clone().oneshot(post_json("/medicines", "1", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = app.oneshot(get("/medicines/detailed/8699", "1")).await.unwrap();
        let json = body_json(resp.into_body()).await;
        assert_eq!(json["source"], "persisted");
        assert_eq!(
            json["advice"]["usage_instructions"][0],
            "Prescription medicine: use under medical supervision"
        );
    }

    #[tokio::test]
    async fn manual_entry_then_duplicate_is_409() {
        let app = router(state_with(vec![]).await);
        let body = r#"{"barcode":"8699","name":"Parol","dosage_form":"Tablet"}"#;

        let resp = app.clone().oneshot(post_json("/medicines", "1", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = body_json(resp.into_body()).await;
        assert_eq!(json["barcode"], "8699");
        assert_eq!(json["dosage_form"], "Tablet");

        let resp = app.clone().oneshot(post_json("/medicines", "1", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = app.clone().oneshot(post_json("/medicines", "2", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = app.oneshot(get("/medicines/barcode/8699", "1")).await.unwrap();
        let json = body_json(resp.into_body()).await;
        assert_eq!(json["source"], "persisted");
    }

    #[tokio::test]
    async fn manual_entry_requires_name() {
        let app = router(state_with(vec![]).await);

        let resp = app
            .oneshot(post_json("/medicines", "1", r#"{"barcode":"8699","name":"  "}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn clear_cache_empties_lookup_cache() {
        let provider: Arc<dyn MedicineProvider + Send + Sync> =
            Arc::new(MockMedicineProvider::new("regional").with_medicine(syrup()));
        let state = state_with(vec![provider]).await;
        let app = router(state.clone());

        app.clone().oneshot(get("/medicines/barcode/8699", "1")).await.unwrap();
        assert_eq!(state.resolver.cache_len().await, 1);

        let resp = app
            .oneshot(post_json("/medicines/clear-cache", "1", ""))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(state.resolver.cache_len().await, 0);
    }
}
