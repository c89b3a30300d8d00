//! Regional Registry Provider Adapter
//!
//! Adapts the RegionalRegistryClient to implement the MedicineProvider trait

use async_trait::async_trait;
use serde_json::Value;

use crate::lookup::{
    normalize::{flag, text},
    provider::{MedicineProvider, ProviderKind, ProviderMetadata, ProviderResult},
    types::NormalizedMedicine,
};
use crate::services::regional::RegionalRegistryClient;

/// Adapter that implements MedicineProvider for a national registry
pub struct RegionalMedicineProvider {
    client: RegionalRegistryClient,
    metadata: ProviderMetadata,
}

impl RegionalMedicineProvider {
    /// `country` is the tag stamped on every result (e.g. `TR`).
    pub fn new(client: RegionalRegistryClient, country: impl Into<String>) -> Self {
        Self {
            client,
            metadata: ProviderMetadata {
                kind: ProviderKind::Regional,
                country: Some(country.into()),
            },
        }
    }
}

/// Map a registry record onto the common schema.
///
/// The registry publishes Turkish field names; English aliases are accepted
/// as fallbacks.
pub fn normalize_regional(barcode: &str, record: &Value, country: Option<&str>) -> NormalizedMedicine {
    NormalizedMedicine {
        barcode: text(record, &["barkod", "barcode"]).unwrap_or_else(|| barcode.to_string()),
        name: text(record, &["ilac_adi", "name"]),
        active_ingredient: text(record, &["etken_madde", "active_ingredient"]),
        manufacturer: text(record, &["uretici_firma", "manufacturer"]),
        dosage_form: text(record, &["dozaj_formu", "dosage_form"]),
        strength: text(record, &["guclu", "strength"]),
        package_size: text(record, &["paket_boyutu", "package_size"]),
        description: text(record, &["aciklama", "description"]),
        country: country.map(String::from),
        prescription_required: flag(record, &["recete_gerekli", "prescription_required"]),
    }
}

#[async_trait]
impl MedicineProvider for RegionalMedicineProvider {
    async fn lookup(&self, barcode: &str) -> ProviderResult<Option<NormalizedMedicine>> {
        let record = self.client.search(barcode).await?;

        Ok(record.map(|record| {
            normalize_regional(barcode, &record, self.metadata.country.as_deref())
        }))
    }

    fn provider_name(&self) -> &str {
        "regional"
    }

    fn get_metadata(&self) -> ProviderMetadata {
        self.metadata.clone()
    }
}
