//! Drug catalog and pharmacy contract models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A drug batch held in inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Drug {
    /// Database identity
    pub id: i64,
    /// Drug name (e.g., "Amoxicillin 500mg")
    pub name: String,
    /// Manufacturer name
    pub manufacturer: String,
    /// Manufacturer batch number
    pub batch_number: String,
    /// Last day the batch may be dispensed
    pub expiry_date: NaiveDate,
    /// Units currently in stock, never negative
    pub stock: u32,
    /// Creation timestamp
    pub created_at: String,
}

impl Drug {
    /// A drug is expired once its expiry date is strictly before `today`.
    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }

    /// Check whether current stock covers the requested quantity.
    pub fn has_stock_for(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }
}

/// Fields required to register a drug batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDrug {
    pub name: String,
    pub manufacturer: String,
    pub batch_number: String,
    pub expiry_date: NaiveDate,
    pub stock: u32,
}

impl NewDrug {
    /// Create a registration request with required fields.
    pub fn new(
        name: impl Into<String>,
        manufacturer: impl Into<String>,
        batch_number: impl Into<String>,
        expiry_date: NaiveDate,
        stock: u32,
    ) -> Self {
        Self {
            name: name.into(),
            manufacturer: manufacturer.into(),
            batch_number: batch_number.into(),
            expiry_date,
            stock,
        }
    }
}

/// A pharmacy's permission to prescribe up to `allocated_amount` of one drug.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contract {
    /// Owning pharmacy
    pub pharmacy_id: i64,
    /// Contracted drug, fully loaded
    pub drug: Drug,
    /// Maximum quantity a single prescription line may request
    pub allocated_amount: u32,
}

impl Contract {
    /// Check whether a requested quantity fits within the allocation.
    pub fn permits(&self, quantity: u32) -> bool {
        quantity <= self.allocated_amount
    }
}
