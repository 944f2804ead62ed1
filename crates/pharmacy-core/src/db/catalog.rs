//! Drug catalog and contract database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult, DATE_FORMAT};
use crate::models::{Contract, Drug, NewDrug};

/// Column list for `drugs`, in [`DrugRow::from_row`] order.
pub(crate) const DRUG_COLUMNS: &str =
    "d.id, d.name, d.manufacturer, d.batch_number, d.expiry_date, d.stock, d.created_at";

impl Database {
    /// Insert a new drug and return it with its assigned id.
    pub fn insert_drug(&self, drug: &NewDrug, created_at: &str) -> DbResult<Drug> {
        self.conn.execute(
            r#"
            INSERT INTO drugs (
                name, manufacturer, batch_number, expiry_date, stock, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                drug.name,
                drug.manufacturer,
                drug.batch_number,
                drug.expiry_date.format(DATE_FORMAT).to_string(),
                drug.stock,
                created_at,
            ],
        )?;

        Ok(Drug {
            id: self.conn.last_insert_rowid(),
            name: drug.name.clone(),
            manufacturer: drug.manufacturer.clone(),
            batch_number: drug.batch_number.clone(),
            expiry_date: drug.expiry_date,
            stock: drug.stock,
            created_at: created_at.to_string(),
        })
    }

    /// Get a drug by id.
    pub fn get_drug(&self, id: i64) -> DbResult<Option<Drug>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM drugs d WHERE d.id = ?", DRUG_COLUMNS),
                [id],
                |row| DrugRow::from_row(row, 0),
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all drugs ordered by name.
    pub fn list_drugs(&self) -> DbResult<Vec<Drug>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM drugs d ORDER BY d.name, d.id",
            DRUG_COLUMNS
        ))?;

        let rows = stmt.query_map([], |row| DrugRow::from_row(row, 0))?;

        let mut drugs = Vec::new();
        for row in rows {
            drugs.push(row?.try_into()?);
        }
        Ok(drugs)
    }

    /// Atomically take `quantity` units from stock.
    ///
    /// Returns `false` without touching the row when stock is insufficient.
    pub fn decrement_stock(&self, drug_id: i64, quantity: u32) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE drugs SET stock = stock - ?2 WHERE id = ?1 AND stock >= ?2",
            params![drug_id, quantity],
        )?;
        Ok(rows_affected > 0)
    }

    /// Insert or update the contract for a pharmacy/drug pair.
    pub fn upsert_contract(
        &self,
        pharmacy_id: i64,
        drug_id: i64,
        allocated_amount: u32,
    ) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO pharmacy_drugs (pharmacy_id, drug_id, allocated_amount)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(pharmacy_id, drug_id) DO UPDATE SET
                allocated_amount = excluded.allocated_amount
            "#,
            params![pharmacy_id, drug_id, allocated_amount],
        )?;
        Ok(())
    }

    /// Load every contract of a pharmacy with its drug.
    pub fn list_contracts(&self, pharmacy_id: i64) -> DbResult<Vec<Contract>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT pd.pharmacy_id, pd.allocated_amount, {}
            FROM pharmacy_drugs pd
            JOIN drugs d ON d.id = pd.drug_id
            WHERE pd.pharmacy_id = ?
            ORDER BY d.id
            "#,
            DRUG_COLUMNS
        ))?;

        let rows = stmt.query_map([pharmacy_id], |row| {
            Ok(ContractRow {
                pharmacy_id: row.get(0)?,
                allocated_amount: row.get(1)?,
                drug: DrugRow::from_row(row, 2)?,
            })
        })?;

        let mut contracts = Vec::new();
        for row in rows {
            let row = row?;
            contracts.push(Contract {
                pharmacy_id: row.pharmacy_id,
                allocated_amount: row.allocated_amount,
                drug: row.drug.try_into()?,
            });
        }
        Ok(contracts)
    }
}

/// Intermediate row struct for database mapping.
pub(crate) struct DrugRow {
    id: i64,
    name: String,
    manufacturer: String,
    batch_number: String,
    expiry_date: String,
    stock: u32,
    created_at: String,
}

impl DrugRow {
    /// Read [`DRUG_COLUMNS`] starting at column `start`.
    pub(crate) fn from_row(row: &Row<'_>, start: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(start)?,
            name: row.get(start + 1)?,
            manufacturer: row.get(start + 2)?,
            batch_number: row.get(start + 3)?,
            expiry_date: row.get(start + 4)?,
            stock: row.get(start + 5)?,
            created_at: row.get(start + 6)?,
        })
    }
}

impl TryFrom<DrugRow> for Drug {
    type Error = DbError;

    fn try_from(row: DrugRow) -> Result<Self, Self::Error> {
        Ok(Drug {
            id: row.id,
            name: row.name,
            manufacturer: row.manufacturer,
            batch_number: row.batch_number,
            expiry_date: NaiveDate::parse_from_str(&row.expiry_date, DATE_FORMAT)?,
            stock: row.stock,
            created_at: row.created_at,
        })
    }
}

struct ContractRow {
    pharmacy_id: i64,
    allocated_amount: u32,
    drug: DrugRow,
}
