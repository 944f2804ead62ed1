//! Prescription lifecycle engine.
//!
//! Lifecycle: Created → Fulfilled. Creation validates against the
//! pharmacy's contracts and current stock without reserving anything;
//! fulfillment re-checks expiry and stock under the write lock and
//! decrements stock.

mod create;
mod fulfill;
mod service;

pub use service::*;

use thiserror::Error;
use tracing::instrument;

use crate::db::{Database, DbError};
use crate::models::{FailureCategory, Pharmacy, Prescription};

/// Lifecycle errors.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BusinessRule(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl LifecycleError {
    /// Audit category for this error.
    pub fn category(&self) -> FailureCategory {
        match self {
            LifecycleError::NotFound(_) => FailureCategory::NotFound,
            LifecycleError::Validation(_) | LifecycleError::BusinessRule(_) => {
                FailureCategory::InvalidInput
            }
            LifecycleError::InvalidState(_) => FailureCategory::InvalidState,
            LifecycleError::Database(_) => FailureCategory::Unexpected,
        }
    }
}

impl From<rusqlite::Error> for LifecycleError {
    fn from(e: rusqlite::Error) -> Self {
        LifecycleError::Database(DbError::from(e))
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Creates and fulfills prescriptions against one database.
pub struct PrescriptionEngine<'a> {
    db: &'a Database,
}

impl<'a> PrescriptionEngine<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Load a prescription without taking any lock.
    #[instrument(skip(self))]
    pub fn get_prescription(&self, prescription_id: i64) -> LifecycleResult<Prescription> {
        self.db.get_prescription(prescription_id)?.ok_or_else(|| {
            LifecycleError::NotFound(format!(
                "Prescription not found with id: {}",
                prescription_id
            ))
        })
    }

    /// Every pharmacy with its contracts.
    pub fn list_pharmacies(&self) -> LifecycleResult<Vec<Pharmacy>> {
        Ok(self.db.list_pharmacies()?)
    }
}
