//! Prescription database operations.

use rusqlite::{params, OptionalExtension};

use super::catalog::{DrugRow, DRUG_COLUMNS};
use super::{Database, DbError, DbResult};
use crate::models::{LineRequest, Prescription, PrescriptionLine, PrescriptionStatus};

impl Database {
    /// Insert a prescription header and all of its lines.
    ///
    /// Callers wanting all-or-nothing persistence run this inside
    /// [`Database::begin`].
    pub fn insert_prescription(
        &self,
        pharmacy_id: i64,
        patient_id: i64,
        status: PrescriptionStatus,
        created_at: &str,
        lines: &[LineRequest],
    ) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO prescriptions (pharmacy_id, patient_id, status, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![pharmacy_id, patient_id, status.as_str(), created_at],
        )?;
        let prescription_id = self.conn.last_insert_rowid();

        let mut stmt = self.conn.prepare(
            r#"
            INSERT INTO prescription_items (prescription_id, drug_id, quantity, dosage)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )?;
        for line in lines {
            stmt.execute(params![prescription_id, line.drug_id, line.quantity, line.dosage])?;
        }

        Ok(prescription_id)
    }

    /// Get a fully materialized prescription.
    pub fn get_prescription(&self, id: i64) -> DbResult<Option<Prescription>> {
        let header = self
            .conn
            .query_row(
                r#"
                SELECT p.id, p.pharmacy_id, ph.name, p.patient_id, pt.name,
                       p.created_at, p.status
                FROM prescriptions p
                JOIN pharmacies ph ON ph.id = p.pharmacy_id
                JOIN patients pt ON pt.id = p.patient_id
                WHERE p.id = ?
                "#,
                [id],
                |row| {
                    Ok(HeaderRow {
                        id: row.get(0)?,
                        pharmacy_id: row.get(1)?,
                        pharmacy_name: row.get(2)?,
                        patient_id: row.get(3)?,
                        patient_name: row.get(4)?,
                        created_at: row.get(5)?,
                        status: row.get(6)?,
                    })
                },
            )
            .optional()?;

        let Some(header) = header else {
            return Ok(None);
        };

        let status = PrescriptionStatus::parse(&header.status).ok_or_else(|| {
            DbError::Constraint(format!("Unknown prescription status: {}", header.status))
        })?;

        Ok(Some(Prescription {
            id: header.id,
            pharmacy_id: header.pharmacy_id,
            pharmacy_name: header.pharmacy_name,
            patient_id: header.patient_id,
            patient_name: header.patient_name,
            created_at: header.created_at,
            status,
            lines: self.list_prescription_lines(header.id)?,
        }))
    }

    /// Set the status of a prescription.
    pub fn set_prescription_status(&self, id: i64, status: PrescriptionStatus) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE prescriptions SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Count stored prescriptions.
    pub fn count_prescriptions(&self) -> DbResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM prescriptions", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn list_prescription_lines(&self, prescription_id: i64) -> DbResult<Vec<PrescriptionLine>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT i.id, i.quantity, i.dosage, {}
            FROM prescription_items i
            JOIN drugs d ON d.id = i.drug_id
            WHERE i.prescription_id = ?
            ORDER BY i.id
            "#,
            DRUG_COLUMNS
        ))?;

        let rows = stmt.query_map([prescription_id], |row| {
            Ok(LineRow {
                id: row.get(0)?,
                quantity: row.get(1)?,
                dosage: row.get(2)?,
                drug: DrugRow::from_row(row, 3)?,
            })
        })?;

        let mut lines = Vec::new();
        for row in rows {
            let row = row?;
            lines.push(PrescriptionLine {
                id: row.id,
                quantity: row.quantity,
                dosage: row.dosage,
                drug: row.drug.try_into()?,
            });
        }
        Ok(lines)
    }
}

/// Intermediate row structs for database mapping.
struct HeaderRow {
    id: i64,
    pharmacy_id: i64,
    pharmacy_name: String,
    patient_id: i64,
    patient_name: String,
    created_at: String,
    status: String,
}

struct LineRow {
    id: i64,
    quantity: u32,
    dosage: String,
    drug: DrugRow,
}
