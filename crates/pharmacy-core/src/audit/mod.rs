//! Audit trail for prescription operations.
//!
//! Every create/fulfill attempt leaves exactly one record, success or
//! failure. Records are written after the audited transaction has ended,
//! in a transaction of their own, and a failed write never changes the
//! outcome of the audited call.

mod query;

pub use query::*;

use rusqlite::TransactionBehavior;
use thiserror::Error;
use tracing::{debug, error};

use crate::db::{Database, DbError};
use crate::lifecycle::LifecycleResult;
use crate::models::{AuditEntry, AuditRecord, LineRequest};
use crate::projection::PrescriptionSummary;

/// Audit errors.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("{0}")]
    Validation(String),
}

impl From<rusqlite::Error> for AuditError {
    fn from(e: rusqlite::Error) -> Self {
        AuditError::Database(DbError::from(e))
    }
}

/// Destination for finished audit records.
pub trait AuditSink {
    /// Durably append one record, returning its id.
    fn append(&self, record: &AuditRecord) -> Result<i64, AuditError>;
}

impl AuditSink for Database {
    fn append(&self, record: &AuditRecord) -> Result<i64, AuditError> {
        let tx = self.begin(TransactionBehavior::Immediate)?;
        let id = self.insert_audit_record(record)?;
        tx.commit()?;
        Ok(id)
    }
}

/// Wraps lifecycle operations and records their outcome.
pub struct AuditRecorder<'a, S: AuditSink> {
    sink: &'a S,
}

impl<'a, S: AuditSink> AuditRecorder<'a, S> {
    pub fn new(sink: &'a S) -> Self {
        Self { sink }
    }

    /// Record a creation attempt. The prescription id is only known on
    /// success.
    pub fn record_create<F>(
        &self,
        pharmacy_id: i64,
        patient_id: i64,
        lines: &[LineRequest],
        op: F,
    ) -> LifecycleResult<PrescriptionSummary>
    where
        F: FnOnce() -> LifecycleResult<PrescriptionSummary>,
    {
        let entry = AuditEntry {
            pharmacy_id: Some(pharmacy_id),
            patient_id: Some(patient_id),
            drugs_requested: lines.to_vec(),
            ..AuditEntry::new()
        };
        self.record(entry, op)
    }

    /// Record a fulfillment attempt. Party ids are only known on success.
    pub fn record_fulfill<F>(&self, prescription_id: i64, op: F) -> LifecycleResult<PrescriptionSummary>
    where
        F: FnOnce() -> LifecycleResult<PrescriptionSummary>,
    {
        let entry = AuditEntry {
            prescription_id: Some(prescription_id),
            ..AuditEntry::new()
        };
        self.record(entry, op)
    }

    fn record<F>(&self, mut entry: AuditEntry, op: F) -> LifecycleResult<PrescriptionSummary>
    where
        F: FnOnce() -> LifecycleResult<PrescriptionSummary>,
    {
        let result = op();

        let record = match &result {
            Ok(summary) => {
                entry.prescription_id = Some(summary.id);
                entry.pharmacy_id = Some(summary.pharmacy_id);
                entry.patient_id = Some(summary.patient_id);
                entry.drugs_dispensed = summary.drugs.clone();
                entry.into_success()
            }
            Err(err) => entry.into_failure(err.category(), &err.to_string()),
        };

        match self.sink.append(&record) {
            Ok(id) => debug!(audit_id = id, status = record.status.as_str(), "Audit record written"),
            Err(e) => error!(
                error = %e,
                prescription_id = record.prescription_id,
                "Failed to write audit record"
            ),
        }

        result
    }
}
