//! Ordered provider fallback.

use std::sync::Arc;
use std::time::Duration;

use crate::lookup::{
    error::ProviderError,
    provider::MedicineProvider,
    types::{AttemptOutcome, ChainOutcome, ProviderAttempt, ProviderHit},
};

/// Providers tried regional tier first, then generic; within a tier in
/// insertion order. The first hit wins.
#[derive(Clone)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn MedicineProvider + Send + Sync>>,
    timeout: Duration,
}

impl ProviderChain {
    /// `timeout` bounds each provider call separately.
    pub fn new(timeout: Duration) -> Self {
        Self {
            providers: Vec::new(),
            timeout,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn MedicineProvider + Send + Sync>) -> Self {
        let kind = provider.get_metadata().kind;
        let position = self
            .providers
            .iter()
            .position(|existing| existing.get_metadata().kind > kind)
            .unwrap_or(self.providers.len());
        self.providers.insert(position, provider);
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.provider_name()).collect()
    }

    /// Ask each provider in turn.
    ///
    /// A timeout, transport failure or unparsable answer from one provider
    /// is logged and recorded in the attempt list, then the next provider
    /// is asked. Running out of providers is a normal `NotFound`.
    pub async fn lookup(&self, barcode: &str) -> ChainOutcome {
        let mut attempts = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let name = provider.provider_name();

            let result = match tokio::time::timeout(self.timeout, provider.lookup(barcode)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout {
                    seconds: self.timeout.as_secs(),
                }),
            };

            match result {
                Ok(Some(medicine)) => {
                    tracing::debug!("Provider {} resolved barcode {}", name, barcode);
                    return ChainOutcome::Found {
                        hit: ProviderHit {
                            provider: name.to_string(),
                            medicine,
                        },
                        attempts,
                    };
                }
                Ok(None) => {
                    tracing::debug!("Provider {} has no match for barcode {}", name, barcode);
                    attempts.push(ProviderAttempt {
                        provider: name.to_string(),
                        outcome: AttemptOutcome::NoMatch,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        "Provider {} failed for barcode {}, trying next: {}",
                        name,
                        barcode,
                        err
                    );
                    attempts.push(ProviderAttempt {
                        provider: name.to_string(),
                        outcome: AttemptOutcome::Unavailable {
                            reason: err.to_string(),
                        },
                    });
                }
            }
        }

        ChainOutcome::NotFound { attempts }
    }
}
