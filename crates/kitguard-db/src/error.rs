//! # Database Error Types
//!
//! ```text
//! sqlx::Error / MigrateError
//!        │
//!        ▼
//!     DbError ──► SourceError   (port adapters; the validator folds it
//!                                into a fail-closed verdict)
//! ```
//!
//! SQLite reports constraint failures only as message text, so the
//! `From<sqlx::Error>` impl classifies them by prefix.

use kitguard_core::SourceError;
use thiserror::Error;

const UNIQUE_PREFIX: &str = "UNIQUE constraint failed: ";
const FOREIGN_KEY_MESSAGE: &str = "FOREIGN KEY constraint failed";

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Unknown or inactive product, missing row.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A product id that already exists. `constraint` is `table.column`.
    #[error("Duplicate value for {constraint}")]
    UniqueViolation { constraint: String },

    /// A BOM line pointing at a product that does not exist.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Other SQL errors, including CHECK constraints
    /// (non-positive BOM quantity, kit listing itself).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A row or argument that cannot become a domain value.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "unknown"),
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                if let Some(constraint) = msg.strip_prefix(UNIQUE_PREFIX) {
                    DbError::UniqueViolation {
                        constraint: constraint.to_string(),
                    }
                } else if msg.contains(FOREIGN_KEY_MESSAGE) {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::InvalidData(format!("column {index}: {source}"))
            }
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// `NotFound` and `InvalidData` keep their meaning for the validator;
/// everything else is the source being unavailable.
impl From<DbError> for SourceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => SourceError::NotFound { entity, id },
            DbError::InvalidData(message) => SourceError::InvalidData(message),
            other => SourceError::Unavailable(other.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_source_not_found() {
        let err: SourceError = DbError::not_found("Product", "KIT-1").into();
        assert_eq!(err, SourceError::not_found("Product", "KIT-1"));
    }

    #[test]
    fn test_infrastructure_maps_to_unavailable() {
        let err: SourceError = DbError::PoolExhausted.into();
        assert!(matches!(err, SourceError::Unavailable(_)));
    }

    #[test]
    fn test_unique_violation_names_constraint() {
        let err = DbError::UniqueViolation {
            constraint: "products.id".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate value for products.id");
    }
}
