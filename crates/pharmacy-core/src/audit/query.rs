//! Paged audit log queries.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::AuditError;
use crate::config::DEFAULT_PAGE_SIZE;
use crate::db::{AuditFilter, Database};
use crate::models::{AuditRecord, AuditStatus};

lazy_static! {
    /// Allowed shape of a status filter.
    static ref STATUS_REGEX: Regex = Regex::new(r"^[A-Z_]+$").unwrap();
}

/// One page of audit records, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditPage {
    pub records: Vec<AuditRecord>,
    /// Zero-based page index
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

/// Audit query parameters. Unset filters match everything.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditQuery {
    pub patient_id: Option<i64>,
    pub pharmacy_id: Option<i64>,
    pub status: Option<String>,
    pub page: u32,
    pub size: u32,
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            patient_id: None,
            pharmacy_id: None,
            status: None,
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AuditQuery {
    /// Validate parameters and fetch the requested page.
    pub fn execute(&self, db: &Database) -> Result<AuditPage, AuditError> {
        if self.size == 0 {
            return Err(AuditError::Validation(
                "Page size must be greater than zero".into(),
            ));
        }

        let status = match self.status.as_deref() {
            // An empty status means no status filter
            None | Some("") => None,
            Some(raw) => {
                if !STATUS_REGEX.is_match(raw) {
                    return Err(AuditError::Validation(
                        "Invalid status format. Status should be uppercase with underscores".into(),
                    ));
                }
                match AuditStatus::parse(raw) {
                    Some(status) => Some(status),
                    // Well-formed but unknown: nothing can match
                    None => return Ok(self.empty_page()),
                }
            }
        };

        let filter = AuditFilter {
            patient_id: self.patient_id,
            pharmacy_id: self.pharmacy_id,
            status,
        };

        let total_elements = db.count_audit_records(&filter)?;
        let offset = u64::from(self.page) * u64::from(self.size);
        let records = if offset >= total_elements {
            Vec::new()
        } else {
            db.query_audit_records(&filter, self.size, offset)?
        };

        Ok(AuditPage {
            records,
            page: self.page,
            size: self.size,
            total_elements,
            total_pages: total_elements.div_ceil(u64::from(self.size)),
        })
    }

    fn empty_page(&self) -> AuditPage {
        AuditPage {
            records: Vec::new(),
            page: self.page,
            size: self.size,
            total_elements: 0,
            total_pages: 0,
        }
    }
}
