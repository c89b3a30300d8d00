//! Data-access interface consumed by the medicine resolver.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::lookup::types::{MedicineRecord, NewMedicine};

/// Per-owner medicine catalogue.
///
/// `(owner_id, barcode)` is unique; a second insert for the same pair fails
/// with [`StoreError::Duplicate`].
#[async_trait]
pub trait MedicineStore {
    async fn find_medicine(
        &self,
        owner_id: i64,
        barcode: &str,
    ) -> Result<Option<MedicineRecord>, StoreError>;

    async fn insert_medicine(
        &self,
        owner_id: i64,
        medicine: &NewMedicine,
    ) -> Result<MedicineRecord, StoreError>;
}
