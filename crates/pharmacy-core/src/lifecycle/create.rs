//! Prescription creation.

use rusqlite::TransactionBehavior;
use tracing::{debug, info, instrument};

use super::{LifecycleError, LifecycleResult, PrescriptionEngine};
use crate::db::DbError;
use crate::models::{LineRequest, Pharmacy, Prescription, PrescriptionStatus};

impl<'a> PrescriptionEngine<'a> {
    /// Validate and persist a new prescription in status Created.
    ///
    /// Checks run in order and the first failure wins; nothing is written
    /// unless every line passes. Stock and allocation are not reserved.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub fn create_prescription(
        &self,
        pharmacy_id: i64,
        patient_id: i64,
        lines: &[LineRequest],
    ) -> LifecycleResult<Prescription> {
        check_request_shape(pharmacy_id, patient_id, lines)?;

        let tx = self.db.begin(TransactionBehavior::Immediate)?;

        let pharmacy = self.db.get_pharmacy(pharmacy_id)?.ok_or_else(|| {
            LifecycleError::NotFound(format!("Pharmacy not found with id: {}", pharmacy_id))
        })?;
        if self.db.get_patient(patient_id)?.is_none() {
            return Err(LifecycleError::NotFound(format!(
                "Patient not found with id: {}",
                patient_id
            )));
        }

        check_lines_against_contracts(&pharmacy, lines)?;

        let created_at = chrono::Utc::now().to_rfc3339();
        let prescription_id = self.db.insert_prescription(
            pharmacy_id,
            patient_id,
            PrescriptionStatus::Created,
            &created_at,
            lines,
        )?;
        let prescription = self.db.get_prescription(prescription_id)?.ok_or_else(|| {
            DbError::NotFound(format!("prescription {} vanished after insert", prescription_id))
        })?;

        tx.commit().map_err(DbError::from)?;

        info!(prescription_id, pharmacy_id, patient_id, "Prescription created");
        Ok(prescription)
    }
}

/// Reject malformed requests before touching the store.
fn check_request_shape(pharmacy_id: i64, patient_id: i64, lines: &[LineRequest]) -> LifecycleResult<()> {
    if pharmacy_id <= 0 {
        return Err(LifecycleError::Validation(
            "Pharmacy ID must be a positive number".into(),
        ));
    }
    if patient_id <= 0 {
        return Err(LifecycleError::Validation(
            "Patient ID must be a positive number".into(),
        ));
    }
    if lines.is_empty() {
        return Err(LifecycleError::Validation(
            "At least one drug is required".into(),
        ));
    }
    for line in lines {
        if line.drug_id <= 0 {
            return Err(LifecycleError::Validation(
                "Drug ID must be a positive number".into(),
            ));
        }
        if line.quantity == 0 {
            return Err(LifecycleError::Validation(
                "Quantity must be a positive number".into(),
            ));
        }
    }
    Ok(())
}

/// Contract, allocation and stock checks, per line in request order.
fn check_lines_against_contracts(pharmacy: &Pharmacy, lines: &[LineRequest]) -> LifecycleResult<()> {
    let contracts = pharmacy.contracts_by_drug();

    for line in lines {
        let contract = contracts.get(&line.drug_id).ok_or_else(|| {
            LifecycleError::BusinessRule(format!(
                "Drug with ID {} is not contracted with this pharmacy",
                line.drug_id
            ))
        })?;

        if !contract.permits(line.quantity) {
            return Err(LifecycleError::BusinessRule(format!(
                "Requested quantity exceeds pharmacy's allocation for drug: {}",
                contract.drug.name
            )));
        }

        if !contract.drug.has_stock_for(line.quantity) {
            return Err(LifecycleError::BusinessRule(format!(
                "Requested quantity exceeds available stock for drug: {}",
                contract.drug.name
            )));
        }

        debug!(drug_id = line.drug_id, quantity = line.quantity, "Line accepted");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{NewDrug, NewPatient, NewPharmacy};
    use chrono::NaiveDate;

    struct Fixture {
        db: Database,
        pharmacy_id: i64,
        patient_id: i64,
        drug_id: i64,
    }

    fn setup(stock: u32, allocation: u32) -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let pharmacy = db.insert_pharmacy(&NewPharmacy::new("Central", "1 Main St")).unwrap();
        let patient = db
            .insert_patient(&NewPatient::new("Jane", NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()))
            .unwrap();
        let drug = db
            .insert_drug(
                &NewDrug::new("Amoxicillin", "Acme", "AMX-1", NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(), stock),
                "now",
            )
            .unwrap();
        db.upsert_contract(pharmacy.id, drug.id, allocation).unwrap();
        Fixture {
            pharmacy_id: pharmacy.id,
            patient_id: patient.id,
            drug_id: drug.id,
            db,
        }
    }

    #[test]
    fn test_create_persists_lines_verbatim() {
        let f = setup(100, 80);
        let engine = PrescriptionEngine::new(&f.db);

        let prescription = engine
            .create_prescription(
                f.pharmacy_id,
                f.patient_id,
                &[LineRequest::new(f.drug_id, 20, "1 tablet every 8 hours")],
            )
            .unwrap();

        assert_eq!(prescription.status, PrescriptionStatus::Created);
        assert_eq!(prescription.pharmacy_name, "Central");
        assert_eq!(prescription.lines[0].quantity, 20);
        assert_eq!(prescription.lines[0].dosage, "1 tablet every 8 hours");
        // Creation never touches stock
        assert_eq!(f.db.get_drug(f.drug_id).unwrap().unwrap().stock, 100);
    }

    #[test]
    fn test_quantity_equal_to_allocation_and_stock_accepted() {
        let f = setup(50, 50);
        let engine = PrescriptionEngine::new(&f.db);
        let result = engine.create_prescription(
            f.pharmacy_id,
            f.patient_id,
            &[LineRequest::new(f.drug_id, 50, "")],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_pharmacy_checked_before_patient() {
        let f = setup(10, 10);
        let engine = PrescriptionEngine::new(&f.db);

        let err = engine
            .create_prescription(999, 998, &[LineRequest::new(f.drug_id, 1, "")])
            .unwrap_err();
        assert_eq!(err.to_string(), "Pharmacy not found with id: 999");

        let err = engine
            .create_prescription(f.pharmacy_id, 998, &[LineRequest::new(f.drug_id, 1, "")])
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound(_)));
        assert_eq!(err.to_string(), "Patient not found with id: 998");
    }

    #[test]
    fn test_first_failing_line_wins() {
        let f = setup(10, 10);
        let engine = PrescriptionEngine::new(&f.db);

        let err = engine
            .create_prescription(
                f.pharmacy_id,
                f.patient_id,
                &[
                    LineRequest::new(f.drug_id, 1, ""),
                    LineRequest::new(4242, 1, ""),
                    LineRequest::new(f.drug_id, 11, ""),
                ],
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Drug with ID 4242 is not contracted with this pharmacy"
        );
        assert_eq!(f.db.count_prescriptions().unwrap(), 0);
    }

    #[test]
    fn test_request_shape_rejected() {
        let f = setup(10, 10);
        let engine = PrescriptionEngine::new(&f.db);

        let err = engine.create_prescription(f.pharmacy_id, f.patient_id, &[]).unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));

        let err = engine
            .create_prescription(f.pharmacy_id, f.patient_id, &[LineRequest::new(f.drug_id, 0, "")])
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));

        let err = engine
            .create_prescription(0, f.patient_id, &[LineRequest::new(f.drug_id, 1, "")])
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
    }
}
