// Turso/libsql embedded database client
//
// Owns the local SQLite file holding templates and macros. Query helpers
// map libsql errors into TursoError so callers never see the driver types.

mod schema;
mod shortcuts;

pub use schema::initialize_schema;

use std::path::{Path, PathBuf};

use libsql::params::IntoParams;
use libsql::{Builder, Connection, Database, Rows, Transaction};

/// Database file name inside the data directory
pub const DATABASE_FILE: &str = "assistive.db";

/// Error types for database operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TursoError {
    /// Could not open or connect to the database file
    #[error("Database connection failed: {0}")]
    Connection(String),
    /// A statement failed
    #[error("Query failed: {0}")]
    Query(String),
    /// A UNIQUE/NOT NULL/CHECK constraint rejected a write
    #[error("Constraint violation: {0}")]
    Constraint(String),
    /// Begin/commit/rollback failed
    #[error("Transaction failed: {0}")]
    Transaction(String),
}

impl TursoError {
    fn from_libsql(e: libsql::Error) -> Self {
        let message = e.to_string();
        if message.to_lowercase().contains("constraint") {
            TursoError::Constraint(message)
        } else {
            TursoError::Query(message)
        }
    }
}

/// Client for the embedded shortcut database
pub struct TursoClient {
    #[allow(dead_code)]
    database: Database,
    connection: Connection,
    db_path: PathBuf,
}

impl TursoClient {
    /// Open (or create) the database inside `data_dir`.
    pub async fn new(data_dir: PathBuf) -> Result<Self, TursoError> {
        std::fs::create_dir_all(&data_dir).map_err(|e| {
            TursoError::Connection(format!("Failed to create data dir {:?}: {}", data_dir, e))
        })?;
        let db_path = data_dir.join(DATABASE_FILE);

        let database = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| TursoError::Connection(e.to_string()))?;
        let connection = database
            .connect()
            .map_err(|e| TursoError::Connection(e.to_string()))?;

        crate::debug!("Opened shortcut database at {:?}", db_path);
        Ok(Self {
            database,
            connection,
            db_path,
        })
    }

    /// Path of the underlying SQLite file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Execute a statement, returning the number of affected rows.
    pub async fn execute(&self, sql: &str, params: impl IntoParams) -> Result<u64, TursoError> {
        self.connection
            .execute(sql, params)
            .await
            .map_err(TursoError::from_libsql)
    }

    /// Run a query and return its rows.
    pub async fn query(&self, sql: &str, params: impl IntoParams) -> Result<Rows, TursoError> {
        self.connection
            .query(sql, params)
            .await
            .map_err(TursoError::from_libsql)
    }

    /// Begin a deferred transaction on the shared connection.
    pub async fn transaction(&self) -> Result<Transaction, TursoError> {
        self.connection
            .transaction()
            .await
            .map_err(|e| TursoError::Transaction(e.to_string()))
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
