//! Medicine Data Provider Interface
//!
//! Provides abstraction layer for the external medicine registries

use async_trait::async_trait;

use crate::lookup::{error::ProviderError, types::NormalizedMedicine};

/// Which tier of the chain a provider belongs to. Tiers are tried in
/// declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProviderKind {
    /// National registry, consulted first.
    Regional,
    /// International fallback.
    Generic,
}

/// Trait for medicine data providers so the chain stays source independent
#[async_trait]
pub trait MedicineProvider {
    /// Look a barcode up. `Ok(None)` means the provider answered but does
    /// not know the barcode.
    async fn lookup(&self, barcode: &str) -> ProviderResult<Option<NormalizedMedicine>>;

    /// Get the name of this provider for logging and source tagging
    fn provider_name(&self) -> &str;

    /// Get provider-specific metadata
    fn get_metadata(&self) -> ProviderMetadata {
        ProviderMetadata::default()
    }
}

/// Metadata about a medicine data provider
#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    pub kind: ProviderKind,
    /// Country tag stamped on every result, if the provider is national.
    pub country: Option<String>,
}

impl Default for ProviderMetadata {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Generic,
            country: None,
        }
    }
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;
