//! Patient and pharmacy identity models.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::catalog::Contract;

/// A patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

/// Fields required to register a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPatient {
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

impl NewPatient {
    /// Create a registration request with required fields.
    pub fn new(name: impl Into<String>, date_of_birth: NaiveDate) -> Self {
        Self {
            name: name.into(),
            date_of_birth,
            phone_number: None,
            email: None,
        }
    }
}

/// A pharmacy together with its drug contracts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pharmacy {
    pub id: i64,
    pub name: String,
    pub address: String,
    /// At most one contract per drug
    pub contracts: Vec<Contract>,
}

impl Pharmacy {
    /// Snapshot of the contracts keyed by drug id.
    pub fn contracts_by_drug(&self) -> HashMap<i64, &Contract> {
        self.contracts
            .iter()
            .map(|contract| (contract.drug.id, contract))
            .collect()
    }
}

/// Fields required to register a pharmacy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPharmacy {
    pub name: String,
    pub address: String,
}

impl NewPharmacy {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}
