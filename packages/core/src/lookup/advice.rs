//! Advisory text attached to detailed lookups.

use serde::Serialize;

pub const ROOM_TEMPERATURE: &str = "Store at room temperature";
pub const REFRIGERATE: &str = "Store in a refrigerator";
pub const PRESCRIPTION_USE: &str = "Prescription medicine: use under medical supervision";
pub const AFTER_MEALS: &str = "Take after meals";
pub const AS_ADVISED: &str = "Use as advised by your doctor";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicineAdvice {
    pub storage_conditions: Vec<&'static str>,
    pub usage_instructions: Vec<&'static str>,
}

impl MedicineAdvice {
    pub fn derive(dosage_form: Option<&str>, prescription_required: Option<bool>) -> Self {
        Self {
            storage_conditions: storage_conditions(dosage_form),
            usage_instructions: usage_instructions(dosage_form, prescription_required),
        }
    }
}

fn is_tablet(form: &str) -> bool {
    form.contains("tablet")
}

fn is_syrup(form: &str) -> bool {
    form.contains("syrup") || form.contains("şurup") || form.contains("surup")
}

pub fn storage_conditions(dosage_form: Option<&str>) -> Vec<&'static str> {
    let form = dosage_form.map(str::to_lowercase).unwrap_or_default();
    let mut conditions = Vec::new();

    if is_tablet(&form) {
        conditions.push(ROOM_TEMPERATURE);
    }
    if is_syrup(&form) {
        conditions.push(REFRIGERATE);
    }

    if conditions.is_empty() {
        conditions.push(ROOM_TEMPERATURE);
    }
    conditions
}

pub fn usage_instructions(
    dosage_form: Option<&str>,
    prescription_required: Option<bool>,
) -> Vec<&'static str> {
    let form = dosage_form.map(str::to_lowercase).unwrap_or_default();
    let mut instructions = Vec::new();

    if prescription_required == Some(true) {
        instructions.push(PRESCRIPTION_USE);
    }
    if is_tablet(&form) {
        instructions.push(AFTER_MEALS);
    }

    if instructions.is_empty() {
        instructions.push(AS_ADVISED);
    }
    instructions
}
