use deadpool_postgres::{BuildError, PoolError};
use thiserror::Error;
use tokio_postgres::error::SqlState;

// DbError is the lowest level error type, wrapping errors from the database layer. It does not wrap
// any higher level errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Unique constraint violation
    #[error("unique violation")]
    UniqueViolation,

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Pg(tokio_postgres::Error),

    #[error(transparent)]
    Migrate(#[from] refinery::Error),

    #[error(transparent)]
    Build(#[from] BuildError),
}

impl From<tokio_postgres::Error> for DbError {
    fn from(e: tokio_postgres::Error) -> Self {
        if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
            return DbError::UniqueViolation;
        }
        DbError::Pg(e)
    }
}
