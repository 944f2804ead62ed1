//! Audit log database operations.
//!
//! Rows are append-only; the schema rejects updates and deletes.

use rusqlite::{params, params_from_iter, types::Value};

use super::{Database, DbError, DbResult};
use crate::models::{AuditRecord, AuditStatus};

/// Optional equality filters for audit queries. `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditFilter {
    pub patient_id: Option<i64>,
    pub pharmacy_id: Option<i64>,
    pub status: Option<AuditStatus>,
}

impl AuditFilter {
    /// Build the WHERE clause and its positional parameters.
    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut conditions = Vec::new();
        let mut values = Vec::new();

        if let Some(patient_id) = self.patient_id {
            conditions.push("patient_id = ?");
            values.push(Value::Integer(patient_id));
        }
        if let Some(pharmacy_id) = self.pharmacy_id {
            conditions.push("pharmacy_id = ?");
            values.push(Value::Integer(pharmacy_id));
        }
        if let Some(status) = self.status {
            conditions.push("status = ?");
            values.push(Value::Text(status.as_str().to_string()));
        }

        if conditions.is_empty() {
            (String::new(), values)
        } else {
            (format!("WHERE {}", conditions.join(" AND ")), values)
        }
    }
}

impl Database {
    /// Append an audit record and return its id.
    pub fn insert_audit_record(&self, record: &AuditRecord) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO audit_logs (
                prescription_id, patient_id, pharmacy_id,
                drugs_requested, drugs_dispensed,
                status, failure_reason, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.prescription_id,
                record.patient_id,
                record.pharmacy_id,
                serde_json::to_string(&record.drugs_requested)?,
                serde_json::to_string(&record.drugs_dispensed)?,
                record.status.as_str(),
                record.failure_reason,
                record.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Query audit records, newest first.
    pub fn query_audit_records(
        &self,
        filter: &AuditFilter,
        limit: u32,
        offset: u64,
    ) -> DbResult<Vec<AuditRecord>> {
        let offset = i64::try_from(offset)
            .map_err(|_| DbError::Constraint(format!("Audit offset out of range: {}", offset)))?;
        let (where_clause, mut values) = filter.where_clause();
        values.push(Value::Integer(i64::from(limit)));
        values.push(Value::Integer(offset));

        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT id, prescription_id, patient_id, pharmacy_id,
                   drugs_requested, drugs_dispensed,
                   status, failure_reason, created_at
            FROM audit_logs
            {}
            ORDER BY id DESC
            LIMIT ? OFFSET ?
            "#,
            where_clause
        ))?;

        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok(AuditRow {
                id: row.get(0)?,
                prescription_id: row.get(1)?,
                patient_id: row.get(2)?,
                pharmacy_id: row.get(3)?,
                drugs_requested: row.get(4)?,
                drugs_dispensed: row.get(5)?,
                status: row.get(6)?,
                failure_reason: row.get(7)?,
                created_at: row.get(8)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }

    /// Count audit records matching a filter.
    pub fn count_audit_records(&self, filter: &AuditFilter) -> DbResult<u64> {
        let (where_clause, values) = filter.where_clause();
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM audit_logs {}", where_clause),
            params_from_iter(values),
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

/// Intermediate row struct for database mapping.
struct AuditRow {
    id: i64,
    prescription_id: i64,
    patient_id: i64,
    pharmacy_id: i64,
    drugs_requested: String,
    drugs_dispensed: String,
    status: String,
    failure_reason: Option<String>,
    created_at: String,
}

impl TryFrom<AuditRow> for AuditRecord {
    type Error = DbError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        let status = AuditStatus::parse(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("Unknown audit status: {}", row.status)))?;

        Ok(AuditRecord {
            id: Some(row.id),
            prescription_id: row.prescription_id,
            patient_id: row.patient_id,
            pharmacy_id: row.pharmacy_id,
            drugs_requested: serde_json::from_str(&row.drugs_requested)?,
            drugs_dispensed: serde_json::from_str(&row.drugs_dispensed)?,
            status,
            failure_reason: row.failure_reason,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditEntry, FailureCategory, LineRequest};

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn failure(patient_id: Option<i64>, pharmacy_id: Option<i64>) -> AuditRecord {
        AuditEntry {
            patient_id,
            pharmacy_id,
            drugs_requested: vec![LineRequest::new(1, 5, "daily")],
            ..AuditEntry::new()
        }
        .into_failure(FailureCategory::NotFound, "nope")
    }

    #[test]
    fn test_insert_and_query() {
        let db = setup_db();
        let id = db.insert_audit_record(&failure(Some(2), Some(1))).unwrap();

        let records = db
            .query_audit_records(&AuditFilter::default(), 10, 0)
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, Some(id));
        assert_eq!(records[0].prescription_id, -1);
        assert_eq!(records[0].drugs_requested[0].dosage, "daily");
        assert_eq!(
            records[0].failure_reason.as_deref(),
            Some("Resource not found: nope")
        );
    }

    #[test]
    fn test_filters_combine() {
        let db = setup_db();
        db.insert_audit_record(&failure(Some(1), Some(10))).unwrap();
        db.insert_audit_record(&failure(Some(1), Some(20))).unwrap();
        db.insert_audit_record(&failure(Some(2), Some(10))).unwrap();

        let by_patient = AuditFilter {
            patient_id: Some(1),
            ..AuditFilter::default()
        };
        assert_eq!(db.count_audit_records(&by_patient).unwrap(), 2);

        let both = AuditFilter {
            patient_id: Some(1),
            pharmacy_id: Some(10),
            ..AuditFilter::default()
        };
        assert_eq!(db.count_audit_records(&both).unwrap(), 1);

        let success = AuditFilter {
            status: Some(AuditStatus::Success),
            ..AuditFilter::default()
        };
        assert_eq!(db.count_audit_records(&success).unwrap(), 0);
    }

    #[test]
    fn test_newest_first_with_paging() {
        let db = setup_db();
        let ids: Vec<i64> = (0..5)
            .map(|_| db.insert_audit_record(&failure(None, None)).unwrap())
            .collect();

        let page = db
            .query_audit_records(&AuditFilter::default(), 2, 2)
            .unwrap();
        let got: Vec<i64> = page.iter().filter_map(|r| r.id).collect();
        assert_eq!(got, vec![ids[2], ids[1]]);
    }

    #[test]
    fn test_offset_beyond_i64_rejected() {
        let db = setup_db();
        db.insert_audit_record(&failure(None, None)).unwrap();

        let result = db.query_audit_records(&AuditFilter::default(), 10, u64::MAX);
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }
}
