//! Scriptable in-process medicine provider for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::lookup::{
    error::ProviderError,
    provider::{MedicineProvider, ProviderKind, ProviderMetadata, ProviderResult},
    types::NormalizedMedicine,
};

#[derive(Debug, Clone)]
enum MockResponse {
    Found(NormalizedMedicine),
    NoMatch,
    Error(ProviderError),
}

/// A provider that answers every lookup the same way.
#[derive(Debug)]
pub struct MockMedicineProvider {
    name: String,
    response: MockResponse,
    delay: Option<Duration>,
    kind: ProviderKind,
    calls: AtomicUsize,
}

impl MockMedicineProvider {
    /// Provider that knows no barcodes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response: MockResponse::NoMatch,
            delay: None,
            kind: ProviderKind::Generic,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_medicine(mut self, medicine: NormalizedMedicine) -> Self {
        self.response = MockResponse::Found(medicine);
        self
    }

    pub fn with_error(mut self, error: ProviderError) -> Self {
        self.response = MockResponse::Error(error);
        self
    }

    /// Sleep before answering (to exercise timeouts).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_kind(mut self, kind: ProviderKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MedicineProvider for MockMedicineProvider {
    async fn lookup(&self, barcode: &str) -> ProviderResult<Option<NormalizedMedicine>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.response {
            MockResponse::Found(medicine) => Ok(Some(NormalizedMedicine {
                barcode: barcode.to_string(),
                ..medicine.clone()
            })),
            MockResponse::NoMatch => Ok(None),
            MockResponse::Error(err) => Err(err.clone()),
        }
    }

    fn provider_name(&self) -> &str {
        &self.name
    }

    fn get_metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            kind: self.kind,
            country: None,
        }
    }
}
