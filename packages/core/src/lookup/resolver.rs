//! Barcode → medicine record resolution.
//!
//! Lookup order is persisted row, then the in-process cache, then the
//! provider chain. Anything found outside persistence is written for the
//! requesting owner before it is returned.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::cache::LookupCache;
use crate::metrics::AppMetrics;
use crate::lookup::{
    chain::ProviderChain,
    error::ResolveError,
    store::MedicineStore,
    types::{
        AttemptOutcome, ChainOutcome, LookupSource, MedicineRecord, NewMedicine, ProviderAttempt,
        ProviderHit, ProviderMeta, Resolution, ResolvedMedicine,
    },
};

/// Longest barcode accepted.
pub const MAX_BARCODE_LEN: usize = 64;

/// Shared lookup cache keyed by barcode.
pub type SharedLookupCache = Arc<Mutex<LookupCache<ProviderHit>>>;

#[derive(Clone)]
pub struct MedicineResolver {
    store: Arc<dyn MedicineStore + Send + Sync>,
    cache: SharedLookupCache,
    chain: ProviderChain,
    metrics: Option<Arc<AppMetrics>>,
}

impl MedicineResolver {
    pub fn new(
        store: Arc<dyn MedicineStore + Send + Sync>,
        cache: SharedLookupCache,
        chain: ProviderChain,
    ) -> Self {
        Self {
            store,
            cache,
            chain,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<AppMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn resolve(&self, owner_id: i64, barcode: &str) -> Result<Resolution, ResolveError> {
        let barcode = validate_barcode(barcode)?;

        if let Some(record) = self.store.find_medicine(owner_id, barcode).await? {
            tracing::debug!("Barcode {} already persisted for owner {}", barcode, owner_id);
            self.record_lookup(LookupSource::Persisted.as_str());
            return Ok(Resolution::Found(ResolvedMedicine {
                record,
                source: LookupSource::Persisted,
                provider_meta: None,
            }));
        }

        let cached = self.cache.lock().await.get(barcode);
        if let Some(hit) = cached {
            tracing::debug!("Lookup cache hit for barcode {}", barcode);
            let record = self.persist(owner_id, barcode, &hit).await?;
            self.record_lookup(LookupSource::Cache.as_str());
            return Ok(Resolution::Found(ResolvedMedicine {
                record,
                source: LookupSource::Cache,
                provider_meta: Some(ProviderMeta::from(&hit)),
            }));
        }

        match self.chain.lookup(barcode).await {
            ChainOutcome::Found { hit, attempts } => {
                self.record_failures(&attempts);
                let record = self.persist(owner_id, barcode, &hit).await?;
                let provider_meta = ProviderMeta::from(&hit);
                let cache_len = {
                    let mut cache = self.cache.lock().await;
                    cache.put(barcode, hit);
                    cache.len()
                };
                self.record_lookup(LookupSource::External.as_str());
                self.record_cache_len(cache_len);

                tracing::info!(
                    "Resolved barcode {} via {} for owner {}",
                    barcode,
                    provider_meta.provider,
                    owner_id
                );
                Ok(Resolution::Found(ResolvedMedicine {
                    record,
                    source: LookupSource::External,
                    provider_meta: Some(provider_meta),
                }))
            }
            ChainOutcome::NotFound { attempts } => {
                self.record_failures(&attempts);
                self.record_lookup("not_found");
                tracing::info!(
                    "Barcode {} not found after {} provider attempt(s)",
                    barcode,
                    attempts.len()
                );
                Ok(Resolution::NotFound { attempts })
            }
        }
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
        self.record_cache_len(0);
        tracing::info!("Lookup cache cleared");
    }

    pub async fn cache_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    fn record_lookup(&self, source: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.lookups_total.with_label_values(&[source]).inc();
        }
    }

    fn record_failures(&self, attempts: &[ProviderAttempt]) {
        if let Some(metrics) = &self.metrics {
            for attempt in attempts {
                if let AttemptOutcome::Unavailable { .. } = attempt.outcome {
                    metrics
                        .provider_failures_total
                        .with_label_values(&[attempt.provider.as_str()])
                        .inc();
                }
            }
        }
    }

    fn record_cache_len(&self, len: usize) {
        if let Some(metrics) = &self.metrics {
            metrics.lookup_cache_entries.set(len as f64);
        }
    }

    /// Insert the row, or return the one a concurrent resolve inserted first.
    async fn persist(
        &self,
        owner_id: i64,
        barcode: &str,
        hit: &ProviderHit,
    ) -> Result<MedicineRecord, ResolveError> {
        let fields = NewMedicine::from_normalized(barcode, &hit.medicine);

        match self.store.insert_medicine(owner_id, &fields).await {
            Ok(record) => Ok(record),
            Err(err) if err.is_duplicate() => {
                tracing::debug!(
                    "Barcode {} was persisted concurrently for owner {}, re-fetching",
                    barcode,
                    owner_id
                );
                match self.store.find_medicine(owner_id, barcode).await? {
                    Some(record) => Ok(record),
                    None => Err(err.into()),
                }
            }
            Err(err) => {
                tracing::error!("Failed to persist barcode {}: {}", barcode, err);
                Err(err.into())
            }
        }
    }
}

/// Trim and check a barcode, returning the trimmed form.
pub fn validate_barcode(barcode: &str) -> Result<&str, ResolveError> {
    let trimmed = barcode.trim();

    if trimmed.is_empty() {
        return Err(ResolveError::InvalidBarcode {
            reason: "barcode is empty".to_string(),
        });
    }
    if trimmed.len() > MAX_BARCODE_LEN {
        return Err(ResolveError::InvalidBarcode {
            reason: format!("barcode longer than {} characters", MAX_BARCODE_LEN),
        });
    }
    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ResolveError::InvalidBarcode {
            reason: "barcode may only contain letters, digits and '-'".to_string(),
        });
    }

    Ok(trimmed)
}
