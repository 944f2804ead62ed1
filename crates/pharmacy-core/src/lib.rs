//! Pharmacy Core Library
//!
//! Prescription lifecycle engine for contracted pharmacies, with an
//! append-only audit trail of every create/fulfill attempt.
//!
//! # Architecture
//!
//! ```text
//!   create_prescription ──┐                 ┌── fulfill_prescription
//!                         ▼                 ▼
//!                 ┌──────────────────────────────────┐
//!                 │          AuditRecorder           │
//!                 │  capture ids → run op → record   │
//!                 └────────────────┬─────────────────┘
//!                                  │
//!                 ┌────────────────▼─────────────────┐
//!                 │        PrescriptionEngine        │
//!                 │  contract / allocation / stock   │
//!                 │  expiry / status, one tx per op  │
//!                 └────────────────┬─────────────────┘
//!                                  │
//!        ┌─────────────────────────┼─────────────────────────┐
//!        ▼                         ▼                         ▼
//!   drugs + contracts        prescriptions              audit_logs
//!                                                  (own tx, append-only)
//! ```
//!
//! # Core Principle
//!
//! **Every attempt is audited exactly once.** A failed audit write is
//! logged and never changes the result returned to the caller.
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (Drug, Pharmacy, Prescription, AuditRecord, etc.)
//! - [`lifecycle`]: Create/fulfill engine and the audited service
//! - [`audit`]: Audit recorder, sink and paged queries
//! - [`inventory`]: Drug, pharmacy, patient and contract registration
//! - [`projection`]: External result shapes
//! - [`config`]: Layered engine configuration

pub mod audit;
pub mod config;
pub mod db;
pub mod inventory;
pub mod lifecycle;
pub mod models;
pub mod projection;

// Re-export commonly used types
pub use audit::{AuditPage, AuditQuery, AuditRecorder, AuditSink};
pub use config::EngineConfig;
pub use db::Database;
pub use inventory::Inventory;
pub use lifecycle::{LifecycleError, PrescriptionEngine, PrescriptionService};
pub use models::{
    AuditRecord, AuditStatus, Contract, Drug, LineRequest, NewDrug, NewPatient, NewPharmacy,
    Patient, Pharmacy, Prescription, PrescriptionStatus, UNKNOWN_ID,
};
pub use projection::{PharmacySummary, PrescriptionDrugSummary, PrescriptionSummary};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PharmacyError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for PharmacyError {
    fn from(e: db::DbError) -> Self {
        PharmacyError::DatabaseError(e.to_string())
    }
}

impl From<LifecycleError> for PharmacyError {
    fn from(e: LifecycleError) -> Self {
        match e {
            LifecycleError::NotFound(msg) => PharmacyError::NotFound(msg),
            LifecycleError::Validation(msg) | LifecycleError::BusinessRule(msg) => {
                PharmacyError::InvalidInput(msg)
            }
            LifecycleError::InvalidState(msg) => PharmacyError::InvalidState(msg),
            LifecycleError::Database(e) => PharmacyError::DatabaseError(e.to_string()),
        }
    }
}

impl From<audit::AuditError> for PharmacyError {
    fn from(e: audit::AuditError) -> Self {
        match e {
            audit::AuditError::Validation(msg) => PharmacyError::InvalidInput(msg),
            other => PharmacyError::DatabaseError(other.to_string()),
        }
    }
}

impl From<config::EngineConfigError> for PharmacyError {
    fn from(e: config::EngineConfigError) -> Self {
        PharmacyError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for PharmacyError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PharmacyError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<PharmacyCore>, PharmacyError> {
    let config = EngineConfig {
        database_path: path,
        ..EngineConfig::default()
    };
    PharmacyCore::from_config(&config)
}

/// Open the database described by defaults, an optional config file and
/// `PHARMACY_*` environment variables.
#[uniffi::export]
pub fn open_configured_database(
    config_path: Option<String>,
) -> Result<Arc<PharmacyCore>, PharmacyError> {
    let config = EngineConfig::load_from(config_path.as_deref().map(Path::new))?;
    PharmacyCore::from_config(&config)
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<PharmacyCore>, PharmacyError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(PharmacyCore {
        db: Arc::new(Mutex::new(db)),
        default_page_size: config::DEFAULT_PAGE_SIZE,
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct PharmacyCore {
    db: Arc<Mutex<Database>>,
    default_page_size: u32,
}

impl PharmacyCore {
    fn from_config(config: &EngineConfig) -> Result<Arc<Self>, PharmacyError> {
        let db = Database::open_with_config(config)?;
        Ok(Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            default_page_size: config.default_page_size,
        }))
    }
}

#[uniffi::export]
impl PharmacyCore {
    // =========================================================================
    // Inventory Operations
    // =========================================================================

    /// Register a drug batch. `expiry_date` is `YYYY-MM-DD`.
    pub fn register_drug(&self, drug: FfiNewDrug) -> Result<FfiDrug, PharmacyError> {
        let db = self.db.lock()?;
        let new_drug = NewDrug::new(
            drug.name,
            drug.manufacturer,
            drug.batch_number,
            parse_date(&drug.expiry_date)?,
            drug.stock,
        );
        let created = Inventory::new(&db).register_drug(&new_drug)?;
        Ok(created.into())
    }

    pub fn get_drug(&self, drug_id: i64) -> Result<FfiDrug, PharmacyError> {
        let db = self.db.lock()?;
        Ok(Inventory::new(&db).get_drug(drug_id)?.into())
    }

    pub fn list_drugs(&self) -> Result<Vec<FfiDrug>, PharmacyError> {
        let db = self.db.lock()?;
        let drugs = Inventory::new(&db).list_drugs()?;
        Ok(drugs.into_iter().map(|d| d.into()).collect())
    }

    pub fn register_pharmacy(
        &self,
        name: String,
        address: String,
    ) -> Result<FfiPharmacy, PharmacyError> {
        let db = self.db.lock()?;
        let pharmacy = Inventory::new(&db).register_pharmacy(&NewPharmacy::new(name, address))?;
        Ok(PharmacySummary::from(&pharmacy).into())
    }

    /// Register a patient. `date_of_birth` is `YYYY-MM-DD`.
    pub fn register_patient(&self, patient: FfiNewPatient) -> Result<FfiPatient, PharmacyError> {
        let db = self.db.lock()?;
        let mut new_patient = NewPatient::new(patient.name, parse_date(&patient.date_of_birth)?);
        new_patient.phone_number = patient.phone_number;
        new_patient.email = patient.email;
        let created = Inventory::new(&db).register_patient(&new_patient)?;
        Ok(created.into())
    }

    /// Grant or replace a pharmacy's allocation for a drug.
    pub fn assign_contract(
        &self,
        pharmacy_id: i64,
        drug_id: i64,
        allocated_amount: u32,
    ) -> Result<FfiPharmacy, PharmacyError> {
        let db = self.db.lock()?;
        let pharmacy = Inventory::new(&db).assign_contract(pharmacy_id, drug_id, allocated_amount)?;
        Ok(PharmacySummary::from(&pharmacy).into())
    }

    // =========================================================================
    // Prescription Operations
    // =========================================================================

    pub fn list_pharmacies(&self) -> Result<Vec<FfiPharmacy>, PharmacyError> {
        let db = self.db.lock()?;
        let pharmacies = PrescriptionService::new(&db).list_pharmacies()?;
        Ok(pharmacies.into_iter().map(|p| p.into()).collect())
    }

    /// Create a prescription (audited).
    pub fn create_prescription(
        &self,
        pharmacy_id: i64,
        patient_id: i64,
        drugs: Vec<FfiLineRequest>,
    ) -> Result<FfiPrescription, PharmacyError> {
        let db = self.db.lock()?;
        let lines: Vec<LineRequest> = drugs.into_iter().map(|l| l.into()).collect();
        let summary = PrescriptionService::new(&db).create_prescription(pharmacy_id, patient_id, &lines)?;
        Ok(summary.into())
    }

    /// Fulfill a prescription (audited).
    pub fn fulfill_prescription(
        &self,
        prescription_id: i64,
    ) -> Result<FfiPrescription, PharmacyError> {
        let db = self.db.lock()?;
        let summary = PrescriptionService::new(&db).fulfill_prescription(prescription_id)?;
        Ok(summary.into())
    }

    pub fn get_prescription(&self, prescription_id: i64) -> Result<FfiPrescription, PharmacyError> {
        let db = self.db.lock()?;
        let summary = PrescriptionService::new(&db).get_prescription(prescription_id)?;
        Ok(summary.into())
    }

    // =========================================================================
    // Audit Operations
    // =========================================================================

    /// Page through audit records, newest first. `page` is zero-based.
    pub fn query_audit_records(
        &self,
        patient_id: Option<i64>,
        pharmacy_id: Option<i64>,
        status: Option<String>,
        page: u32,
        size: Option<u32>,
    ) -> Result<FfiAuditPage, PharmacyError> {
        let db = self.db.lock()?;
        let query = AuditQuery {
            patient_id,
            pharmacy_id,
            status,
            page,
            size: size.unwrap_or(self.default_page_size),
        };
        Ok(query.execute(&db)?.into())
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, PharmacyError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
        PharmacyError::InvalidInput(format!("Invalid date '{}': {}", value, e))
    })
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe drug registration request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewDrug {
    pub name: String,
    pub manufacturer: String,
    pub batch_number: String,
    pub expiry_date: String,
    pub stock: u32,
}

/// FFI-safe drug.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDrug {
    pub id: i64,
    pub name: String,
    pub manufacturer: String,
    pub batch_number: String,
    pub expiry_date: String,
    pub stock: u32,
    pub created_at: String,
}

impl From<Drug> for FfiDrug {
    fn from(drug: Drug) -> Self {
        Self {
            id: drug.id,
            name: drug.name,
            manufacturer: drug.manufacturer,
            batch_number: drug.batch_number,
            expiry_date: drug.expiry_date.to_string(),
            stock: drug.stock,
            created_at: drug.created_at,
        }
    }
}

/// FFI-safe patient registration request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewPatient {
    pub name: String,
    pub date_of_birth: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: i64,
    pub name: String,
    pub date_of_birth: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            date_of_birth: patient.date_of_birth.to_string(),
            phone_number: patient.phone_number,
            email: patient.email,
        }
    }
}

/// FFI-safe pharmacy with its contracted drugs.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPharmacy {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub contracted_drugs: Vec<FfiContractedDrug>,
}

impl From<PharmacySummary> for FfiPharmacy {
    fn from(pharmacy: PharmacySummary) -> Self {
        Self {
            id: pharmacy.id,
            name: pharmacy.name,
            address: pharmacy.address,
            contracted_drugs: pharmacy
                .contracted_drugs
                .into_iter()
                .map(|d| FfiContractedDrug {
                    id: d.id,
                    name: d.name,
                    manufacturer: d.manufacturer,
                    batch_number: d.batch_number,
                    expiry_date: d.expiry_date.to_string(),
                    stock: d.stock,
                    allocated_amount: d.allocated_amount,
                })
                .collect(),
        }
    }
}

/// FFI-safe contracted drug.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiContractedDrug {
    pub id: i64,
    pub name: String,
    pub manufacturer: String,
    pub batch_number: String,
    pub expiry_date: String,
    pub stock: u32,
    pub allocated_amount: u32,
}

/// FFI-safe prescription line request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLineRequest {
    pub drug_id: i64,
    pub quantity: u32,
    pub dosage: String,
}

impl From<FfiLineRequest> for LineRequest {
    fn from(line: FfiLineRequest) -> Self {
        LineRequest::new(line.drug_id, line.quantity, line.dosage)
    }
}

impl From<LineRequest> for FfiLineRequest {
    fn from(line: LineRequest) -> Self {
        Self {
            drug_id: line.drug_id,
            quantity: line.quantity,
            dosage: line.dosage,
        }
    }
}

/// FFI-safe prescribed drug.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescriptionDrug {
    pub drug_id: i64,
    pub name: String,
    pub manufacturer: String,
    pub batch_number: String,
    pub quantity: u32,
}

impl From<PrescriptionDrugSummary> for FfiPrescriptionDrug {
    fn from(drug: PrescriptionDrugSummary) -> Self {
        Self {
            drug_id: drug.drug_id,
            name: drug.name,
            manufacturer: drug.manufacturer,
            batch_number: drug.batch_number,
            quantity: drug.quantity,
        }
    }
}

/// FFI-safe prescription.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescription {
    pub id: i64,
    pub pharmacy_id: i64,
    pub pharmacy_name: String,
    pub patient_id: i64,
    pub patient_name: String,
    pub created_at: String,
    pub status: String,
    pub drugs: Vec<FfiPrescriptionDrug>,
}

impl From<PrescriptionSummary> for FfiPrescription {
    fn from(summary: PrescriptionSummary) -> Self {
        Self {
            id: summary.id,
            pharmacy_id: summary.pharmacy_id,
            pharmacy_name: summary.pharmacy_name,
            patient_id: summary.patient_id,
            patient_name: summary.patient_name,
            created_at: summary.created_at,
            status: summary.status,
            drugs: summary.drugs.into_iter().map(|d| d.into()).collect(),
        }
    }
}

/// FFI-safe audit record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAuditRecord {
    pub id: Option<i64>,
    pub prescription_id: i64,
    pub patient_id: i64,
    pub pharmacy_id: i64,
    pub drugs_requested: Vec<FfiLineRequest>,
    pub drugs_dispensed: Vec<FfiPrescriptionDrug>,
    pub status: String,
    pub failure_reason: Option<String>,
    pub created_at: String,
}

impl From<AuditRecord> for FfiAuditRecord {
    fn from(record: AuditRecord) -> Self {
        Self {
            id: record.id,
            prescription_id: record.prescription_id,
            patient_id: record.patient_id,
            pharmacy_id: record.pharmacy_id,
            drugs_requested: record.drugs_requested.into_iter().map(|l| l.into()).collect(),
            drugs_dispensed: record.drugs_dispensed.into_iter().map(|d| d.into()).collect(),
            status: record.status.as_str().to_string(),
            failure_reason: record.failure_reason,
            created_at: record.created_at,
        }
    }
}

/// FFI-safe audit page.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAuditPage {
    pub records: Vec<FfiAuditRecord>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl From<AuditPage> for FfiAuditPage {
    fn from(page: AuditPage) -> Self {
        Self {
            records: page.records.into_iter().map(|r| r.into()).collect(),
            page: page.page,
            size: page.size,
            total_elements: page.total_elements,
            total_pages: page.total_pages,
        }
    }
}
