//! Medicine Lookup Module
//!
//! Resolves a scanned barcode to a medicine record through persisted rows,
//! an in-process cache and an ordered chain of external registries.

pub mod advice;
pub mod chain;
pub mod error;
pub mod normalize;
pub mod openfda_adapter;
pub mod provider;
pub mod regional_adapter;
pub mod resolver;
pub mod store;
pub mod types;

pub use advice::MedicineAdvice;
pub use chain::ProviderChain;
pub use error::{ProviderError, ResolveError};
pub use openfda_adapter::OpenFdaMedicineProvider;
pub use provider::{MedicineProvider, ProviderKind, ProviderMetadata};
pub use regional_adapter::RegionalMedicineProvider;
pub use resolver::{MedicineResolver, SharedLookupCache};
pub use store::MedicineStore;
pub use types::*;
