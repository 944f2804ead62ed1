//! Drug inventory and party registration.

use chrono::{Local, NaiveDate};
use tracing::{info, instrument};

use crate::db::Database;
use crate::lifecycle::{LifecycleError, LifecycleResult};
use crate::models::{Drug, NewDrug, NewPatient, NewPharmacy, Patient, Pharmacy};

/// Registers drugs, pharmacies, patients and contracts.
pub struct Inventory<'a> {
    db: &'a Database,
}

impl<'a> Inventory<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Add a drug batch, rejecting batches already expired today.
    pub fn register_drug(&self, drug: &NewDrug) -> LifecycleResult<Drug> {
        self.register_drug_on(drug, Local::now().date_naive())
    }

    #[instrument(skip(self, drug), fields(name = %drug.name))]
    pub fn register_drug_on(&self, drug: &NewDrug, today: NaiveDate) -> LifecycleResult<Drug> {
        require_text(&drug.name, "Drug name is required")?;
        require_text(&drug.manufacturer, "Manufacturer name is required")?;
        require_text(&drug.batch_number, "Batch number is required")?;

        if drug.expiry_date < today {
            return Err(LifecycleError::Validation(format!(
                "Cannot add expired drugs to inventory. The drug has already expired on {}",
                drug.expiry_date
            )));
        }

        let created = self
            .db
            .insert_drug(drug, &chrono::Utc::now().to_rfc3339())?;
        info!(drug_id = created.id, stock = created.stock, "Drug registered");
        Ok(created)
    }

    pub fn get_drug(&self, id: i64) -> LifecycleResult<Drug> {
        if id <= 0 {
            return Err(LifecycleError::Validation(
                "Drug ID must be a positive number".into(),
            ));
        }
        self.db.get_drug(id)?.ok_or_else(|| {
            LifecycleError::NotFound(format!(
                "Drug with ID {} does not exist in the inventory",
                id
            ))
        })
    }

    pub fn list_drugs(&self) -> LifecycleResult<Vec<Drug>> {
        Ok(self.db.list_drugs()?)
    }

    pub fn register_pharmacy(&self, pharmacy: &NewPharmacy) -> LifecycleResult<Pharmacy> {
        require_text(&pharmacy.name, "Pharmacy name is required")?;
        require_text(&pharmacy.address, "Pharmacy address is required")?;
        Ok(self.db.insert_pharmacy(pharmacy)?)
    }

    pub fn register_patient(&self, patient: &NewPatient) -> LifecycleResult<Patient> {
        require_text(&patient.name, "Patient name is required")?;
        Ok(self.db.insert_patient(patient)?)
    }

    /// Grant or replace a pharmacy's allocation for one drug.
    #[instrument(skip(self))]
    pub fn assign_contract(
        &self,
        pharmacy_id: i64,
        drug_id: i64,
        allocated_amount: u32,
    ) -> LifecycleResult<Pharmacy> {
        if self.db.get_drug(drug_id)?.is_none() {
            return Err(LifecycleError::NotFound(format!(
                "Drug with ID {} does not exist in the inventory",
                drug_id
            )));
        }
        if self.db.get_pharmacy(pharmacy_id)?.is_none() {
            return Err(LifecycleError::NotFound(format!(
                "Pharmacy not found with id: {}",
                pharmacy_id
            )));
        }

        self.db.upsert_contract(pharmacy_id, drug_id, allocated_amount)?;

        self.db.get_pharmacy(pharmacy_id)?.ok_or_else(|| {
            LifecycleError::NotFound(format!("Pharmacy not found with id: {}", pharmacy_id))
        })
    }
}

fn require_text(value: &str, message: &str) -> LifecycleResult<()> {
    if value.trim().is_empty() {
        return Err(LifecycleError::Validation(message.to_string()));
    }
    Ok(())
}
