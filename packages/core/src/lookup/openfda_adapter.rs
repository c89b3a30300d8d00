//! openFDA Provider Adapter
//!
//! Adapts the OpenFdaClient to implement the MedicineProvider trait

use async_trait::async_trait;
use serde_json::Value;

use crate::lookup::{
    normalize::{flag, joined, text},
    provider::{MedicineProvider, ProviderKind, ProviderMetadata, ProviderResult},
    types::NormalizedMedicine,
};
use crate::services::openfda::OpenFdaClient;

pub struct OpenFdaMedicineProvider {
    client: OpenFdaClient,
}

impl OpenFdaMedicineProvider {
    pub fn new(client: OpenFdaClient) -> Self {
        Self { client }
    }
}

/// Map an openFDA NDC product onto the common schema.
pub fn normalize_openfda(barcode: &str, product: &Value) -> NormalizedMedicine {
    let first_package = product
        .get("packaging")
        .and_then(Value::as_array)
        .and_then(|packages| packages.first());

    NormalizedMedicine {
        barcode: text(product, &["product_ndc", "ndc"]).unwrap_or_else(|| barcode.to_string()),
        name: text(product, &["generic_name", "brand_name"]),
        active_ingredient: text(product, &["active_ingredient"])
            .or_else(|| joined(product, "active_ingredients", "name")),
        manufacturer: text(product, &["manufacturer_name", "labeler_name"]),
        dosage_form: text(product, &["dosage_form"]),
        strength: text(product, &["strength"])
            .or_else(|| joined(product, "active_ingredients", "strength")),
        package_size: first_package
            .and_then(|package| text(package, &["description"]))
            .or_else(|| text(product, &["package_ndc"])),
        description: text(product, &["description"]),
        country: Some("US".to_string()),
        prescription_required: flag(product, &["prescription_required"])
            .or_else(|| prescription_from_product_type(product)),
    }
}

/// `HUMAN PRESCRIPTION DRUG` → true, `HUMAN OTC DRUG` → false.
fn prescription_from_product_type(product: &Value) -> Option<bool> {
    let product_type = text(product, &["product_type"])?.to_uppercase();
    if product_type.contains("PRESCRIPTION") {
        Some(true)
    } else if product_type.contains("OTC") {
        Some(false)
    } else {
        None
    }
}

#[async_trait]
impl MedicineProvider for OpenFdaMedicineProvider {
    async fn lookup(&self, barcode: &str) -> ProviderResult<Option<NormalizedMedicine>> {
        let product = self.client.search_ndc(barcode).await?;
        Ok(product.map(|product| normalize_openfda(barcode, &product)))
    }

    fn provider_name(&self) -> &str {
        "openfda"
    }

    fn get_metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            kind: ProviderKind::Generic,
            country: Some("US".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ndc_product_is_mapped() {
        let product = json!({
            "product_ndc": "0573-0150",
            "generic_name": "Ibuprofen",
            "brand_name": "Advil",
            "labeler_name": "Haleon US Holdings LLC",
            "dosage_form": "TABLET, COATED",
            "product_type": "HUMAN OTC DRUG",
            "active_ingredients": [{ "name": "IBUPROFEN", "strength": "200 mg/1" }],
            "packaging": [{ "package_ndc": "0573-0150-20", "description": "20 TABLET in 1 BOTTLE" }]
        });

        let medicine = normalize_openfda("0573-0150", &product);

        assert_eq!(medicine.barcode, "0573-0150");
        assert_eq!(medicine.name.as_deref(), Some("Ibuprofen"));
        assert_eq!(medicine.active_ingredient.as_deref(), Some("IBUPROFEN"));
        assert_eq!(medicine.strength.as_deref(), Some("200 mg/1"));
        assert_eq!(medicine.manufacturer.as_deref(), Some("Haleon US Holdings LLC"));
        assert_eq!(medicine.package_size.as_deref(), Some("20 TABLET in 1 BOTTLE"));
        assert_eq!(medicine.country.as_deref(), Some("US"));
        assert_eq!(medicine.prescription_required, Some(false));
        assert_eq!(medicine.description, None);
    }

    #[test]
    fn brand_name_used_when_generic_missing() {
        let product = json!({
            "brand_name": "Zestril",
            "product_type": "HUMAN PRESCRIPTION DRUG"
        });

        let medicine = normalize_openfda("x", &product);

        assert_eq!(medicine.barcode, "x");
        assert_eq!(medicine.name.as_deref(), Some("Zestril"));
        assert_eq!(medicine.prescription_required, Some(true));
        assert_eq!(medicine.package_size, None);
    }
}
