//! Prescription lifecycle integration tests.

use chrono::NaiveDate;
use pharmacy_core::audit::AuditQuery;
use pharmacy_core::db::{AuditFilter, Database};
use pharmacy_core::models::{AuditStatus, LineRequest, NewDrug, NewPatient, NewPharmacy, UNKNOWN_ID};
use pharmacy_core::{Inventory, LifecycleError, PrescriptionService};
use proptest::prelude::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2026, 3, 1)
}

struct World {
    db: Database,
    pharmacy_id: i64,
    patient_id: i64,
}

fn world() -> World {
    let db = Database::open_in_memory().unwrap();
    let inventory = Inventory::new(&db);
    let pharmacy = inventory
        .register_pharmacy(&NewPharmacy::new("Corner Pharmacy", "12 High St"))
        .unwrap();
    let patient = inventory
        .register_patient(&NewPatient::new("John Smith", date(1980, 7, 4)))
        .unwrap();
    World {
        pharmacy_id: pharmacy.id,
        patient_id: patient.id,
        db,
    }
}

fn contracted_drug(w: &World, name: &str, stock: u32, allocation: u32, expiry: NaiveDate) -> i64 {
    let inventory = Inventory::new(&w.db);
    let drug = inventory
        .register_drug_on(&NewDrug::new(name, "Acme Pharma", format!("{}-B1", name), expiry, stock), date(2026, 1, 1))
        .unwrap();
    inventory.assign_contract(w.pharmacy_id, drug.id, allocation).unwrap();
    drug.id
}

fn audit_count(db: &Database) -> u64 {
    db.count_audit_records(&AuditFilter::default()).unwrap()
}

#[test]
fn test_quantity_above_allocation_rejected() {
    let w = world();
    let drug_id = contracted_drug(&w, "Amoxicillin", 1_000, 80, date(2030, 1, 1));
    let service = PrescriptionService::new(&w.db);

    let err = service
        .create_prescription(w.pharmacy_id, w.patient_id, &[LineRequest::new(drug_id, 90, "daily")])
        .unwrap_err();

    assert!(matches!(err, LifecycleError::BusinessRule(_)));
    assert_eq!(
        err.to_string(),
        "Requested quantity exceeds pharmacy's allocation for drug: Amoxicillin"
    );
    assert_eq!(w.db.count_prescriptions().unwrap(), 0);
}

#[test]
fn test_quantity_above_stock_rejected() {
    let w = world();
    let drug_id = contracted_drug(&w, "Ibuprofen", 50, 60, date(2030, 1, 1));
    let service = PrescriptionService::new(&w.db);

    let err = service
        .create_prescription(w.pharmacy_id, w.patient_id, &[LineRequest::new(drug_id, 55, "")])
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Requested quantity exceeds available stock for drug: Ibuprofen"
    );
}

#[test]
fn test_allocation_not_reserved_across_prescriptions() {
    let w = world();
    let drug_id = contracted_drug(&w, "Cetirizine", 100, 10, date(2030, 1, 1));
    let service = PrescriptionService::new(&w.db);

    // Each line fits the allocation on its own; together they exceed it
    for _ in 0..2 {
        service
            .create_prescription(w.pharmacy_id, w.patient_id, &[LineRequest::new(drug_id, 7, "")])
            .unwrap();
    }

    assert_eq!(w.db.count_prescriptions().unwrap(), 2);
    assert_eq!(w.db.get_drug(drug_id).unwrap().unwrap().stock, 100);
}

#[test]
fn test_create_then_fulfill_then_refulfill() {
    let w = world();
    let drug_id = contracted_drug(&w, "Paracetamol", 100, 50, date(2030, 1, 1));
    let service = PrescriptionService::new(&w.db);

    let created = service
        .create_prescription(w.pharmacy_id, w.patient_id, &[LineRequest::new(drug_id, 10, "2x daily")])
        .unwrap();
    assert_eq!(created.status, "CREATED");
    assert_eq!(created.pharmacy_name, "Corner Pharmacy");
    assert_eq!(created.patient_name, "John Smith");
    assert_eq!(created.drugs[0].quantity, 10);
    assert_eq!(created.drugs[0].batch_number, "Paracetamol-B1");

    let fulfilled = service.fulfill_prescription_on(created.id, today()).unwrap();
    assert_eq!(fulfilled.status, "FULFILLED");
    assert_eq!(w.db.get_drug(drug_id).unwrap().unwrap().stock, 90);

    let err = service.fulfill_prescription_on(created.id, today()).unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidState(_)));
    assert_eq!(w.db.get_drug(drug_id).unwrap().unwrap().stock, 90);

    let view = service.get_prescription(created.id).unwrap();
    assert_eq!(view.status, "FULFILLED");
}

#[test]
fn test_uncontracted_drug_persists_nothing() {
    let w = world();
    let contracted = contracted_drug(&w, "A", 10, 10, date(2030, 1, 1));
    let stray = Inventory::new(&w.db)
        .register_drug_on(&NewDrug::new("Stray", "M", "S-1", date(2030, 1, 1), 10), date(2026, 1, 1))
        .unwrap();
    let service = PrescriptionService::new(&w.db);

    let err = service
        .create_prescription(
            w.pharmacy_id,
            w.patient_id,
            &[LineRequest::new(contracted, 1, ""), LineRequest::new(stray.id, 1, "")],
        )
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        format!("Drug with ID {} is not contracted with this pharmacy", stray.id)
    );
    assert_eq!(w.db.count_prescriptions().unwrap(), 0);
}

#[test]
fn test_expired_line_blocks_whole_fulfillment() {
    let w = world();
    let fresh = contracted_drug(&w, "Fresh", 10, 10, date(2030, 1, 1));
    let expiring = contracted_drug(&w, "Expiring", 10, 10, date(2026, 2, 1));
    let service = PrescriptionService::new(&w.db);

    let created = service
        .create_prescription(
            w.pharmacy_id,
            w.patient_id,
            &[LineRequest::new(fresh, 3, ""), LineRequest::new(expiring, 3, "")],
        )
        .unwrap();

    let err = service.fulfill_prescription_on(created.id, today()).unwrap_err();
    assert_eq!(err.to_string(), "Drug Expiring has expired");
    assert_eq!(w.db.get_drug(fresh).unwrap().unwrap().stock, 10);
    assert_eq!(w.db.get_drug(expiring).unwrap().unwrap().stock, 10);
    assert_eq!(service.get_prescription(created.id).unwrap().status, "CREATED");
}

#[test]
fn test_every_call_audited_once() {
    let w = world();
    let drug_id = contracted_drug(&w, "A", 100, 100, date(2030, 1, 1));
    let service = PrescriptionService::new(&w.db);

    let created = service
        .create_prescription(w.pharmacy_id, w.patient_id, &[LineRequest::new(drug_id, 5, "")])
        .unwrap();
    assert_eq!(audit_count(&w.db), 1);

    service.create_prescription(9_999, w.patient_id, &[LineRequest::new(drug_id, 5, "")]).unwrap_err();
    assert_eq!(audit_count(&w.db), 2);

    service.fulfill_prescription_on(created.id, today()).unwrap();
    assert_eq!(audit_count(&w.db), 3);

    service.fulfill_prescription_on(created.id, today()).unwrap_err();
    service.fulfill_prescription_on(424_242, today()).unwrap_err();
    assert_eq!(audit_count(&w.db), 5);

    // Reads are not audited
    service.get_prescription(created.id).unwrap();
    service.list_pharmacies().unwrap();
    assert_eq!(audit_count(&w.db), 5);
}

#[test]
fn test_audit_record_contents() {
    let w = world();
    let drug_id = contracted_drug(&w, "A", 100, 100, date(2030, 1, 1));
    let service = PrescriptionService::new(&w.db);

    let created = service
        .create_prescription(w.pharmacy_id, w.patient_id, &[LineRequest::new(drug_id, 5, "nightly")])
        .unwrap();
    service.fulfill_prescription_on(424_242, today()).unwrap_err();

    let page = AuditQuery::default().execute(&w.db).unwrap();
    assert_eq!(page.total_elements, 2);

    // Newest first
    let missing = &page.records[0];
    assert_eq!(missing.status, AuditStatus::Failure);
    assert_eq!(missing.prescription_id, 424_242);
    assert_eq!(missing.patient_id, UNKNOWN_ID);
    assert_eq!(missing.pharmacy_id, UNKNOWN_ID);
    assert_eq!(
        missing.failure_reason.as_deref(),
        Some("Resource not found: Prescription not found with id: 424242")
    );

    let create = &page.records[1];
    assert_eq!(create.status, AuditStatus::Success);
    assert_eq!(create.prescription_id, created.id);
    assert_eq!(create.drugs_requested, vec![LineRequest::new(drug_id, 5, "nightly")]);
    assert_eq!(create.drugs_dispensed.len(), 1);
    assert!(create.failure_reason.is_none());
}

#[test]
fn test_failed_create_audit_has_unknown_prescription() {
    let w = world();
    let drug_id = contracted_drug(&w, "A", 10, 10, date(2030, 1, 1));
    let service = PrescriptionService::new(&w.db);

    service
        .create_prescription(w.pharmacy_id, w.patient_id, &[LineRequest::new(drug_id, 11, "")])
        .unwrap_err();

    let page = AuditQuery {
        pharmacy_id: Some(w.pharmacy_id),
        status: Some("FAILURE".into()),
        ..AuditQuery::default()
    }
    .execute(&w.db)
    .unwrap();

    let record = &page.records[0];
    assert_eq!(record.prescription_id, UNKNOWN_ID);
    assert_eq!(record.patient_id, w.patient_id);
    assert!(record
        .failure_reason
        .as_deref()
        .unwrap()
        .starts_with("Invalid input: "));
}

#[test]
fn test_list_pharmacies_projection() {
    let w = world();
    contracted_drug(&w, "A", 10, 7, date(2030, 1, 1));
    let service = PrescriptionService::new(&w.db);

    let pharmacies = service.list_pharmacies().unwrap();
    assert_eq!(pharmacies.len(), 1);
    assert_eq!(pharmacies[0].address, "12 High St");
    assert_eq!(pharmacies[0].contracted_drugs[0].allocated_amount, 7);
    assert_eq!(pharmacies[0].contracted_drugs[0].stock, 10);
}

proptest! {
    #[test]
    fn prop_allocation_and_stock_gate_creation(
        allocation in 1u32..200,
        stock in 1u32..200,
        quantity in 1u32..250,
    ) {
        let w = world();
        let drug_id = contracted_drug(&w, "P", stock, allocation, date(2030, 1, 1));
        let service = PrescriptionService::new(&w.db);

        let result = service.create_prescription(
            w.pharmacy_id,
            w.patient_id,
            &[LineRequest::new(drug_id, quantity, "")],
        );

        if quantity > allocation || quantity > stock {
            prop_assert!(matches!(result, Err(LifecycleError::BusinessRule(_))));
            prop_assert_eq!(w.db.count_prescriptions().unwrap(), 0);
        } else {
            prop_assert!(result.is_ok());
        }

        // Creation never moves stock
        prop_assert_eq!(w.db.get_drug(drug_id).unwrap().unwrap().stock, stock);
        prop_assert_eq!(audit_count(&w.db), 1);
    }
}
