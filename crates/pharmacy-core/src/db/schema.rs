//! SQLite schema definition.

/// Complete database schema for the pharmacy core.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Drug Catalog
-- ============================================================================

CREATE TABLE IF NOT EXISTS drugs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    manufacturer TEXT NOT NULL,
    batch_number TEXT NOT NULL,
    expiry_date TEXT NOT NULL,                    -- YYYY-MM-DD
    stock INTEGER NOT NULL CHECK (stock >= 0),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_drugs_name ON drugs(name);

-- ============================================================================
-- Parties
-- ============================================================================

CREATE TABLE IF NOT EXISTS pharmacies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    address TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    date_of_birth TEXT NOT NULL,                  -- YYYY-MM-DD
    phone_number TEXT,
    email TEXT
);

-- One contract per (pharmacy, drug)
CREATE TABLE IF NOT EXISTS pharmacy_drugs (
    pharmacy_id INTEGER NOT NULL REFERENCES pharmacies(id),
    drug_id INTEGER NOT NULL REFERENCES drugs(id),
    allocated_amount INTEGER NOT NULL CHECK (allocated_amount >= 0),
    PRIMARY KEY (pharmacy_id, drug_id)
);

CREATE INDEX IF NOT EXISTS idx_pharmacy_drugs_drug ON pharmacy_drugs(drug_id);

-- ============================================================================
-- Prescriptions
-- ============================================================================

CREATE TABLE IF NOT EXISTS prescriptions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pharmacy_id INTEGER NOT NULL REFERENCES pharmacies(id),
    patient_id INTEGER NOT NULL REFERENCES patients(id),
    status TEXT NOT NULL DEFAULT 'CREATED'
        CHECK (status IN ('CREATED', 'FULFILLED', 'CANCELLED')),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_prescriptions_pharmacy ON prescriptions(pharmacy_id);
CREATE INDEX IF NOT EXISTS idx_prescriptions_patient ON prescriptions(patient_id);

CREATE TABLE IF NOT EXISTS prescription_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    prescription_id INTEGER NOT NULL REFERENCES prescriptions(id) ON DELETE CASCADE,
    drug_id INTEGER NOT NULL REFERENCES drugs(id),
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    dosage TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_prescription_items_prescription ON prescription_items(prescription_id);

-- ============================================================================
-- Audit Log (Append-Only - Immutable after creation)
-- ============================================================================

CREATE TABLE IF NOT EXISTS audit_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    prescription_id INTEGER NOT NULL,             -- -1 when unknown
    patient_id INTEGER NOT NULL,                  -- -1 when unknown
    pharmacy_id INTEGER NOT NULL,                 -- -1 when unknown
    drugs_requested TEXT NOT NULL DEFAULT '[]',   -- JSON array of LineRequest
    drugs_dispensed TEXT NOT NULL DEFAULT '[]',   -- JSON array of PrescriptionDrugSummary
    status TEXT NOT NULL CHECK (status IN ('SUCCESS', 'FAILURE')),
    failure_reason TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TRIGGER IF NOT EXISTS audit_logs_no_update BEFORE UPDATE ON audit_logs
BEGIN
    SELECT RAISE(ABORT, 'Audit records are append-only');
END;

CREATE TRIGGER IF NOT EXISTS audit_logs_no_delete BEFORE DELETE ON audit_logs
BEGIN
    SELECT RAISE(ABORT, 'Audit records are append-only');
END;

CREATE INDEX IF NOT EXISTS idx_audit_patient ON audit_logs(patient_id);
CREATE INDEX IF NOT EXISTS idx_audit_pharmacy ON audit_logs(pharmacy_id);
CREATE INDEX IF NOT EXISTS idx_audit_status ON audit_logs(status);
"#;
