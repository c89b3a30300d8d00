//! Core data types for medicine lookup

use serde::{Deserialize, Serialize};

/// Name persisted when no provider knew what the medicine is called.
pub const UNKNOWN_MEDICINE_NAME: &str = "Unknown medicine";

/// Provider output mapped onto one common schema.
///
/// Every optional field is `None` when the provider did not supply a
/// non-empty value; empty strings never leak through.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedMedicine {
    pub barcode: String,
    pub name: Option<String>,
    pub active_ingredient: Option<String>,
    pub manufacturer: Option<String>,
    pub dosage_form: Option<String>,
    pub strength: Option<String>,
    pub package_size: Option<String>,
    pub description: Option<String>,
    pub country: Option<String>,
    pub prescription_required: Option<bool>,
}

/// A successful provider answer, tagged with who gave it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderHit {
    pub provider: String,
    pub medicine: NormalizedMedicine,
}

/// Persisted medicine row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineRecord {
    pub id: i64,
    pub owner_id: i64,
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
    pub created_at: String,
}

/// Fields for a new medicine row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewMedicine {
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

impl NewMedicine {
    /// Build a row for `barcode` (the key that was looked up) from provider data.
    pub fn from_normalized(barcode: &str, medicine: &NormalizedMedicine) -> Self {
        Self {
            barcode: barcode.to_string(),
            name: medicine
                .name
                .clone()
                .unwrap_or_else(|| UNKNOWN_MEDICINE_NAME.to_string()),
            active_ingredient: medicine.active_ingredient.clone(),
            manufacturer: medicine.manufacturer.clone(),
            dosage_form: medicine.dosage_form.clone(),
            strength: medicine.strength.clone(),
            package_size: medicine.package_size.clone(),
            description: medicine.description.clone(),
            country: medicine.country.clone(),
            prescription_required: medicine.prescription_required,
        }
    }
}

/// Where a resolved record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupSource {
    Persisted,
    Cache,
    External,
}

impl LookupSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupSource::Persisted => "persisted",
            LookupSource::Cache => "cache",
            LookupSource::External => "external",
        }
    }
}

/// Provider details that are not part of the persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMeta {
    pub provider: String,
    pub country: Option<String>,
    pub prescription_required: Option<bool>,
}

impl From<&ProviderHit> for ProviderMeta {
    fn from(hit: &ProviderHit) -> Self {
        Self {
            provider: hit.provider.clone(),
            country: hit.medicine.country.clone(),
            prescription_required: hit.medicine.prescription_required,
        }
    }
}

/// What happened when one provider was asked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    NoMatch,
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderAttempt {
    pub provider: String,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

/// Result of walking the provider chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutcome {
    /// `attempts` lists the providers that were tried and missed first.
    Found {
        hit: ProviderHit,
        attempts: Vec<ProviderAttempt>,
    },
    NotFound {
        attempts: Vec<ProviderAttempt>,
    },
}

/// A medicine record with the path it was resolved through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMedicine {
    pub record: MedicineRecord,
    pub source: LookupSource,
    pub provider_meta: Option<ProviderMeta>,
}

/// Outcome of [`MedicineResolver::resolve`](crate::lookup::MedicineResolver::resolve).
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(ResolvedMedicine),
    NotFound { attempts: Vec<ProviderAttempt> },
}
