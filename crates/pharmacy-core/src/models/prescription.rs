//! Prescription models.

use serde::{Deserialize, Serialize};

use super::catalog::Drug;

/// Prescription lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrescriptionStatus {
    /// Persisted, nothing dispensed yet
    Created,
    /// Drugs dispensed and stock decremented
    Fulfilled,
    /// Modelled for completeness; no operation sets it
    Cancelled,
}

impl PrescriptionStatus {
    /// Stored/displayed form.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrescriptionStatus::Created => "CREATED",
            PrescriptionStatus::Fulfilled => "FULFILLED",
            PrescriptionStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(PrescriptionStatus::Created),
            "FULFILLED" => Some(PrescriptionStatus::Fulfilled),
            "CANCELLED" => Some(PrescriptionStatus::Cancelled),
            _ => None,
        }
    }
}

/// One requested line of a prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineRequest {
    pub drug_id: i64,
    pub quantity: u32,
    /// Free-text dosage instructions, copied verbatim
    pub dosage: String,
}

impl LineRequest {
    pub fn new(drug_id: i64, quantity: u32, dosage: impl Into<String>) -> Self {
        Self {
            drug_id,
            quantity,
            dosage: dosage.into(),
        }
    }
}

/// A persisted prescription line with its drug loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionLine {
    pub id: i64,
    pub drug: Drug,
    pub quantity: u32,
    pub dosage: String,
}

/// One dispensed drug with its quantity, as reported to callers and kept
/// in the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionDrugSummary {
    pub drug_id: i64,
    pub name: String,
    pub manufacturer: String,
    pub batch_number: String,
    pub quantity: u32,
}

impl From<&PrescriptionLine> for PrescriptionDrugSummary {
    fn from(line: &PrescriptionLine) -> Self {
        Self {
            drug_id: line.drug.id,
            name: line.drug.name.clone(),
            manufacturer: line.drug.manufacturer.clone(),
            batch_number: line.drug.batch_number.clone(),
            quantity: line.quantity,
        }
    }
}

/// A fully materialized prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    pub id: i64,
    pub pharmacy_id: i64,
    pub pharmacy_name: String,
    pub patient_id: i64,
    pub patient_name: String,
    pub created_at: String,
    pub status: PrescriptionStatus,
    /// Owned lines, deleted with the prescription
    pub lines: Vec<PrescriptionLine>,
}

impl Prescription {
    /// Only freshly created prescriptions may be fulfilled.
    pub fn is_fulfillable(&self) -> bool {
        self.status == PrescriptionStatus::Created
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            PrescriptionStatus::Created,
            PrescriptionStatus::Fulfilled,
            PrescriptionStatus::Cancelled,
        ] {
            assert_eq!(PrescriptionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PrescriptionStatus::parse("created"), None);
    }

    #[test]
    fn test_line_summary_carries_drug_details() {
        let drug = Drug {
            id: 4,
            name: "Amoxicillin".into(),
            manufacturer: "Acme".into(),
            batch_number: "AMX-7".into(),
            expiry_date: chrono::NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            stock: 40,
            created_at: "2026-01-01T00:00:00Z".into(),
        };
        let line = PrescriptionLine {
            id: 1,
            drug,
            quantity: 12,
            dosage: "daily".into(),
        };

        let summary = PrescriptionDrugSummary::from(&line);
        assert_eq!(summary.drug_id, 4);
        assert_eq!(summary.batch_number, "AMX-7");
        assert_eq!(summary.quantity, 12);
    }

    #[test]
    fn test_serde_uses_upper_case() {
        let json = serde_json::to_string(&PrescriptionStatus::Fulfilled).unwrap();
        assert_eq!(json, "\"FULFILLED\"");
    }
}
