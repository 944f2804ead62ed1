//! Prescription fulfillment.

use chrono::{Local, NaiveDate};
use rusqlite::TransactionBehavior;
use tracing::{info, instrument, warn};

use super::{LifecycleError, LifecycleResult, PrescriptionEngine};
use crate::db::DbError;
use crate::models::{Prescription, PrescriptionStatus};

impl<'a> PrescriptionEngine<'a> {
    /// Dispense a created prescription, judging expiry against today's
    /// local date.
    pub fn fulfill_prescription(&self, prescription_id: i64) -> LifecycleResult<Prescription> {
        self.fulfill_prescription_on(prescription_id, Local::now().date_naive())
    }

    /// Dispense a created prescription as of `today`.
    ///
    /// Runs in its own immediate transaction so the write lock is held from
    /// the first read; a concurrent fulfill of the same prescription waits
    /// and then sees it already fulfilled. Any failing line aborts the
    /// whole fulfillment.
    #[instrument(skip(self))]
    pub fn fulfill_prescription_on(
        &self,
        prescription_id: i64,
        today: NaiveDate,
    ) -> LifecycleResult<Prescription> {
        let tx = self.db.begin(TransactionBehavior::Immediate)?;

        let prescription = self.db.get_prescription(prescription_id)?.ok_or_else(|| {
            LifecycleError::NotFound(format!(
                "Prescription not found with id: {}",
                prescription_id
            ))
        })?;

        if !prescription.is_fulfillable() {
            return Err(LifecycleError::InvalidState(
                "Prescription has already been fulfilled or cancelled".into(),
            ));
        }

        for line in &prescription.lines {
            if line.drug.is_expired_on(today) {
                return Err(LifecycleError::InvalidState(format!(
                    "Drug {} has expired",
                    line.drug.name
                )));
            }
            if !line.drug.has_stock_for(line.quantity) {
                return Err(LifecycleError::InvalidState(format!(
                    "Insufficient stock for drug: {}",
                    line.drug.name
                )));
            }
        }

        for line in &prescription.lines {
            // Lines sharing a drug can pass the per-line check yet
            // exhaust stock together.
            if !self.db.decrement_stock(line.drug.id, line.quantity)? {
                warn!(drug_id = line.drug.id, quantity = line.quantity, "Conditional decrement refused");
                return Err(LifecycleError::InvalidState(format!(
                    "Insufficient stock for drug: {}",
                    line.drug.name
                )));
            }
        }

        self.db
            .set_prescription_status(prescription_id, PrescriptionStatus::Fulfilled)?;

        let fulfilled = self.db.get_prescription(prescription_id)?.ok_or_else(|| {
            DbError::NotFound(format!("prescription {} vanished during fulfillment", prescription_id))
        })?;

        tx.commit().map_err(DbError::from)?;

        info!(prescription_id, lines = fulfilled.lines.len(), "Prescription fulfilled");
        Ok(fulfilled)
    }
}
