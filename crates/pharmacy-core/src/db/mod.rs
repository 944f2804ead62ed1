//! Database layer for the pharmacy core.

mod schema;
mod catalog;
mod parties;
mod prescriptions;
mod audit;

pub use schema::*;
#[allow(unused_imports)]
pub use catalog::*;
#[allow(unused_imports)]
pub use parties::*;
#[allow(unused_imports)]
pub use prescriptions::*;
#[allow(unused_imports)]
pub use audit::*;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use thiserror::Error;

use crate::config::EngineConfig;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Date parse error: {0}")]
    Date(#[from] chrono::ParseError),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Stored date format for expiry dates and birth dates.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the configured database with the configured lock wait.
    pub fn open_with_config(config: &EngineConfig) -> DbResult<Self> {
        let conn = Connection::open(&config.database_path)?;
        conn.busy_timeout(config.busy_timeout())?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a fresh top-level transaction on this connection.
    ///
    /// Store methods called while the returned guard is alive run inside it.
    /// Dropping the guard without `commit` rolls back. Fails if a transaction
    /// is already open, so transactions are never nested.
    pub fn begin(&self, behavior: TransactionBehavior) -> DbResult<Transaction<'_>> {
        Ok(Transaction::new_unchecked(&self.conn, behavior)?)
    }
}
