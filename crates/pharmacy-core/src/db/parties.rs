//! Pharmacy and patient database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult, DATE_FORMAT};
use crate::models::{NewPatient, NewPharmacy, Patient, Pharmacy};

impl Database {
    /// Insert a new pharmacy (without contracts).
    pub fn insert_pharmacy(&self, pharmacy: &NewPharmacy) -> DbResult<Pharmacy> {
        self.conn.execute(
            "INSERT INTO pharmacies (name, address) VALUES (?1, ?2)",
            params![pharmacy.name, pharmacy.address],
        )?;

        Ok(Pharmacy {
            id: self.conn.last_insert_rowid(),
            name: pharmacy.name.clone(),
            address: pharmacy.address.clone(),
            contracts: Vec::new(),
        })
    }

    /// Get a pharmacy by id, with its contracts loaded.
    pub fn get_pharmacy(&self, id: i64) -> DbResult<Option<Pharmacy>> {
        let header = self
            .conn
            .query_row(
                "SELECT id, name, address FROM pharmacies WHERE id = ?",
                [id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        match header {
            Some((id, name, address)) => Ok(Some(Pharmacy {
                id,
                name,
                address,
                contracts: self.list_contracts(id)?,
            })),
            None => Ok(None),
        }
    }

    /// List all pharmacies with their contracts.
    pub fn list_pharmacies(&self) -> DbResult<Vec<Pharmacy>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, address FROM pharmacies ORDER BY id")?;

        let headers = stmt
            .query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut pharmacies = Vec::with_capacity(headers.len());
        for (id, name, address) in headers {
            pharmacies.push(Pharmacy {
                id,
                name,
                address,
                contracts: self.list_contracts(id)?,
            });
        }
        Ok(pharmacies)
    }

    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &NewPatient) -> DbResult<Patient> {
        self.conn.execute(
            r#"
            INSERT INTO patients (name, date_of_birth, phone_number, email)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                patient.name,
                patient.date_of_birth.format(DATE_FORMAT).to_string(),
                patient.phone_number,
                patient.email,
            ],
        )?;

        Ok(Patient {
            id: self.conn.last_insert_rowid(),
            name: patient.name.clone(),
            date_of_birth: patient.date_of_birth,
            phone_number: patient.phone_number.clone(),
            email: patient.email.clone(),
        })
    }

    /// Get a patient by id.
    pub fn get_patient(&self, id: i64) -> DbResult<Option<Patient>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, name, date_of_birth, phone_number, email
                FROM patients
                WHERE id = ?
                "#,
                [id],
                |row| {
                    Ok(PatientRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        date_of_birth: row.get(2)?,
                        phone_number: row.get(3)?,
                        email: row.get(4)?,
                    })
                },
            )
            .optional()?;

        match row {
            Some(row) => Ok(Some(Patient {
                id: row.id,
                name: row.name,
                date_of_birth: NaiveDate::parse_from_str(&row.date_of_birth, DATE_FORMAT)?,
                phone_number: row.phone_number,
                email: row.email,
            })),
            None => Ok(None),
        }
    }
}

/// Intermediate row struct for database mapping.
struct PatientRow {
    id: i64,
    name: String,
    date_of_birth: String,
    phone_number: Option<String>,
    email: Option<String>,
}
