//! Audit trail models.

use serde::{Deserialize, Serialize};

use super::prescription::{LineRequest, PrescriptionDrugSummary};

/// Identifier recorded when the real one was never learned.
pub const UNKNOWN_ID: i64 = -1;

/// Outcome of an audited attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Success,
    Failure,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "SUCCESS",
            AuditStatus::Failure => "FAILURE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SUCCESS" => Some(AuditStatus::Success),
            "FAILURE" => Some(AuditStatus::Failure),
            _ => None,
        }
    }
}

/// Coarse classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    NotFound,
    InvalidInput,
    InvalidState,
    Unexpected,
}

impl FailureCategory {
    /// Prefix written into the failure reason.
    pub fn label(&self) -> &'static str {
        match self {
            FailureCategory::NotFound => "Resource not found",
            FailureCategory::InvalidInput => "Invalid input",
            FailureCategory::InvalidState => "Invalid state",
            FailureCategory::Unexpected => "Unexpected error",
        }
    }
}

/// Immutable record of one create/fulfill attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    /// Assigned by the store; `None` until appended
    pub id: Option<i64>,
    pub prescription_id: i64,
    pub patient_id: i64,
    pub pharmacy_id: i64,
    pub drugs_requested: Vec<LineRequest>,
    pub drugs_dispensed: Vec<PrescriptionDrugSummary>,
    pub status: AuditStatus,
    pub failure_reason: Option<String>,
    pub created_at: String,
}

/// An audit record under construction while the audited call runs.
#[derive(Debug, Clone, Default)]
pub struct AuditEntry {
    pub prescription_id: Option<i64>,
    pub patient_id: Option<i64>,
    pub pharmacy_id: Option<i64>,
    pub drugs_requested: Vec<LineRequest>,
    pub drugs_dispensed: Vec<PrescriptionDrugSummary>,
}

impl AuditEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish as a successful attempt.
    pub fn into_success(self) -> AuditRecord {
        self.finish(AuditStatus::Success, None)
    }

    /// Finish as a failed attempt; unknown ids become [`UNKNOWN_ID`].
    pub fn into_failure(self, category: FailureCategory, message: &str) -> AuditRecord {
        let reason = format!("{}: {}", category.label(), message);
        self.finish(AuditStatus::Failure, Some(reason))
    }

    fn finish(self, status: AuditStatus, failure_reason: Option<String>) -> AuditRecord {
        AuditRecord {
            id: None,
            prescription_id: self.prescription_id.unwrap_or(UNKNOWN_ID),
            patient_id: self.patient_id.unwrap_or(UNKNOWN_ID),
            pharmacy_id: self.pharmacy_id.unwrap_or(UNKNOWN_ID),
            drugs_requested: self.drugs_requested,
            drugs_dispensed: self.drugs_dispensed,
            status,
            failure_reason,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_fills_sentinels() {
        let entry = AuditEntry {
            prescription_id: Some(42),
            ..AuditEntry::new()
        };
        let record = entry.into_failure(FailureCategory::InvalidState, "boom");

        assert_eq!(record.prescription_id, 42);
        assert_eq!(record.patient_id, UNKNOWN_ID);
        assert_eq!(record.pharmacy_id, UNKNOWN_ID);
        assert_eq!(record.status, AuditStatus::Failure);
        assert_eq!(record.failure_reason.as_deref(), Some("Invalid state: boom"));
    }

    #[test]
    fn test_success_has_no_reason() {
        let entry = AuditEntry {
            prescription_id: Some(1),
            patient_id: Some(2),
            pharmacy_id: Some(3),
            ..AuditEntry::new()
        };
        let record = entry.into_success();
        assert_eq!(record.status, AuditStatus::Success);
        assert!(record.failure_reason.is_none());
        assert_eq!(record.pharmacy_id, 3);
    }
}
