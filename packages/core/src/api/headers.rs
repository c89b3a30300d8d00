use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, HeaderValue},
};

use super::{bad_request, ApiError};

/// Header carrying the id of the user a request acts for.
pub const OWNER_HEADER: &str = "x-owner-id";

/// `Cache-Control` for responses that must never be reused.
pub fn no_store() -> HeaderValue {
    HeaderValue::from_static("no-store")
}

/// Parse the owner id out of `X-Owner-Id`.
pub fn owner_from_headers(headers: &HeaderMap) -> Result<i64, ApiError> {
    let raw = headers
        .get(OWNER_HEADER)
        .ok_or_else(|| bad_request("Missing X-Owner-Id header"))?;

    raw.to_str()
        .ok()
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| bad_request("X-Owner-Id must be a positive integer"))
}

/// Extractor for the requesting owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        owner_from_headers(&parts.headers).map(OwnerId)
    }
}
