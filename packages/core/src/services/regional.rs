use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::lookup::error::ProviderError;
use crate::lookup::normalize::first_record;

pub const USER_AGENT: &str = "MedicineTracker/1.0";

/// Client for a national medicine registry search endpoint
/// (`GET {base_url}/search?barcode=...&format=json`).
#[derive(Clone)]
pub struct RegionalRegistryClient {
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl RegionalRegistryClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| ProviderError::network(err.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Raw JSON record for `barcode`, or `None` when the registry has no match.
    ///
    /// The registry answers with an array of records; an object wrapping
    /// that array under `data` or `results` is accepted too.
    pub async fn search(&self, barcode: &str) -> Result<Option<Value>, ProviderError> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("barcode", barcode), ("format", "json")])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| ProviderError::from_reqwest(err, self.timeout.as_secs()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus {
                status: response.status().as_u16(),
            });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|err| ProviderError::format(err.to_string()))?;

        let records = match &body {
            Value::Object(map) => map
                .get("data")
                .or_else(|| map.get("results"))
                .unwrap_or(&body),
            _ => &body,
        };

        Ok(first_record(records).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    async fn client_for(server: &MockServer) -> RegionalRegistryClient {
        RegionalRegistryClient::new(server.uri(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn search_returns_first_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("barcode", "8699546090115"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "barkod": "8699546090115", "ilac_adi": "PAROL 500 MG TABLET" },
                { "barkod": "8699546090116", "ilac_adi": "OTHER" }
            ])))
            .mount(&server)
            .await;

        let record = client_for(&server).await.search("8699546090115").await.unwrap();

        assert_eq!(record.unwrap()["ilac_adi"], "PAROL 500 MG TABLET");
    }

    #[tokio::test]
    async fn empty_array_is_no_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        assert_eq!(client_for(&server).await.search("1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn wrapped_data_array_is_unwrapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "name": "Aspirin" }]
            })))
            .mount(&server)
            .await;

        let record = client_for(&server).await.search("1").await.unwrap();
        assert_eq!(record.unwrap()["name"], "Aspirin");
    }

    #[tokio::test]
    async fn server_error_is_reported_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).await.search("1").await.unwrap_err();
        assert_eq!(err, ProviderError::HttpStatus { status: 503 });
    }

    #[tokio::test]
    async fn malformed_body_is_a_format_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html>", "text/html"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.search("1").await.unwrap_err();
        assert!(matches!(err, ProviderError::FormatError { .. }));
    }
}
