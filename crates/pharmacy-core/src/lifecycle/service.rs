//! Audited entry points for the lifecycle engine.

use super::{LifecycleResult, PrescriptionEngine};
use crate::audit::{AuditRecorder, AuditSink};
use crate::db::Database;
use crate::models::LineRequest;
use crate::projection::{PharmacySummary, PrescriptionSummary};

/// Lifecycle operations with audit recording and response projection.
pub struct PrescriptionService<'a, S: AuditSink = Database> {
    engine: PrescriptionEngine<'a>,
    recorder: AuditRecorder<'a, S>,
}

impl<'a> PrescriptionService<'a, Database> {
    /// Audit into the same database.
    pub fn new(db: &'a Database) -> Self {
        Self::with_sink(db, db)
    }
}

impl<'a, S: AuditSink> PrescriptionService<'a, S> {
    pub fn with_sink(db: &'a Database, sink: &'a S) -> Self {
        Self {
            engine: PrescriptionEngine::new(db),
            recorder: AuditRecorder::new(sink),
        }
    }

    pub fn create_prescription(
        &self,
        pharmacy_id: i64,
        patient_id: i64,
        lines: &[LineRequest],
    ) -> LifecycleResult<PrescriptionSummary> {
        self.recorder.record_create(pharmacy_id, patient_id, lines, || {
            self.engine
                .create_prescription(pharmacy_id, patient_id, lines)
                .map(|p| PrescriptionSummary::from(&p))
        })
    }

    pub fn fulfill_prescription(&self, prescription_id: i64) -> LifecycleResult<PrescriptionSummary> {
        self.recorder.record_fulfill(prescription_id, || {
            self.engine
                .fulfill_prescription(prescription_id)
                .map(|p| PrescriptionSummary::from(&p))
        })
    }

    /// Same as [`Self::fulfill_prescription`] with an explicit date.
    pub fn fulfill_prescription_on(
        &self,
        prescription_id: i64,
        today: chrono::NaiveDate,
    ) -> LifecycleResult<PrescriptionSummary> {
        self.recorder.record_fulfill(prescription_id, || {
            self.engine
                .fulfill_prescription_on(prescription_id, today)
                .map(|p| PrescriptionSummary::from(&p))
        })
    }

    /// Read-only; not audited.
    pub fn get_prescription(&self, prescription_id: i64) -> LifecycleResult<PrescriptionSummary> {
        let prescription = self.engine.get_prescription(prescription_id)?;
        Ok(PrescriptionSummary::from(&prescription))
    }

    pub fn list_pharmacies(&self) -> LifecycleResult<Vec<PharmacySummary>> {
        Ok(self
            .engine
            .list_pharmacies()?
            .iter()
            .map(PharmacySummary::from)
            .collect())
    }
}
