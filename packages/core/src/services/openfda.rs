use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::lookup::error::ProviderError;
use crate::services::regional::USER_AGENT;

/// Client for the openFDA NDC directory (`/drug/ndc.json`).
#[derive(Clone)]
pub struct OpenFdaClient {
    endpoint: String,
    api_key: Option<String>,
    http: Client,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct NdcResponse {
    #[serde(default)]
    results: Vec<Value>,
}

impl OpenFdaClient {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| ProviderError::network(err.to_string()))?;

        Ok(Self {
            endpoint,
            api_key,
            http,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// First NDC product whose `product_ndc` matches `barcode`.
    ///
    /// openFDA answers 404 when a search has no results; that is a miss,
    /// not a failure.
    pub async fn search_ndc(&self, barcode: &str) -> Result<Option<Value>, ProviderError> {
        let search = format!("product_ndc:\"{}\"", barcode);
        let mut request = self
            .http
            .get(&self.endpoint)
            .query(&[("search", search.as_str()), ("limit", "1")]);

        if let Some(key) = &self.api_key {
            request = request.query(&[("api_key", key.as_str())]);
        }

        let response = request
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
            .json::<NdcResponse>()
            .await
            .map_err(|err| ProviderError::format(err.to_string()))?;

        Ok(body.results.into_iter().find(|item| item.is_object()))
    }
}
