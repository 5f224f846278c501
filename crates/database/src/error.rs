//! Database error types.

use thiserror::Error;

/// Errors that can occur during database operations.
///
/// Lookup-style functions (`find_*`) report a missing row as `Ok(None)`;
/// [`NotFound`] is reserved for CRUD operations addressing a specific
/// record by id.
///
/// [`NotFound`]: DatabaseError::NotFound
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Query or connection failure.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Schema migration failure.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A CRUD operation addressed a record that does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// An insert collided with a unique column (bot uid, patient
    /// medical ID).
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },
}

impl DatabaseError {
    /// Error mapper for inserts into tables with a unique identity column:
    /// a unique-constraint violation becomes [`AlreadyExists`], anything
    /// else stays a plain query error.
    ///
    /// [`AlreadyExists`]: DatabaseError::AlreadyExists
    pub(crate) fn insert_conflict(
        entity: &'static str,
        id: String,
    ) -> impl FnOnce(sqlx::Error) -> Self {
        move |e| {
            if matches!(&e, sqlx::Error::Database(db_err) if db_err.is_unique_violation()) {
                DatabaseError::AlreadyExists { entity, id }
            } else {
                DatabaseError::Sqlx(e)
            }
        }
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
