//! External-facing result shapes.
//!
//! Pure mappings from loaded entities; no I/O and no failure modes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use crate::models::PrescriptionDrugSummary;
use crate::models::{Contract, Pharmacy, Prescription};

/// Pharmacy listing entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PharmacySummary {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub contracted_drugs: Vec<ContractedDrugSummary>,
}

/// A drug as seen through one pharmacy's contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractedDrugSummary {
    pub id: i64,
    pub name: String,
    pub manufacturer: String,
    pub batch_number: String,
    pub expiry_date: NaiveDate,
    pub stock: u32,
    pub allocated_amount: u32,
}

/// Prescription details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionSummary {
    pub id: i64,
    pub pharmacy_id: i64,
    pub pharmacy_name: String,
    pub patient_id: i64,
    pub patient_name: String,
    pub created_at: String,
    /// "CREATED", "FULFILLED" or "CANCELLED"
    pub status: String,
    pub drugs: Vec<PrescriptionDrugSummary>,
}

impl From<&Contract> for ContractedDrugSummary {
    fn from(contract: &Contract) -> Self {
        let drug = &contract.drug;
        Self {
            id: drug.id,
            name: drug.name.clone(),
            manufacturer: drug.manufacturer.clone(),
            batch_number: drug.batch_number.clone(),
            expiry_date: drug.expiry_date,
            stock: drug.stock,
            allocated_amount: contract.allocated_amount,
        }
    }
}

impl From<&Pharmacy> for PharmacySummary {
    fn from(pharmacy: &Pharmacy) -> Self {
        Self {
            id: pharmacy.id,
            name: pharmacy.name.clone(),
            address: pharmacy.address.clone(),
            contracted_drugs: pharmacy.contracts.iter().map(Into::into).collect(),
        }
    }
}

impl From<&Prescription> for PrescriptionSummary {
    fn from(prescription: &Prescription) -> Self {
        Self {
            id: prescription.id,
            pharmacy_id: prescription.pharmacy_id,
            pharmacy_name: prescription.pharmacy_name.clone(),
            patient_id: prescription.patient_id,
            patient_name: prescription.patient_name.clone(),
            created_at: prescription.created_at.clone(),
            status: prescription.status.as_str().to_string(),
            drugs: prescription.lines.iter().map(Into::into).collect(),
        }
    }
}
