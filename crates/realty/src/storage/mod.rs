//! Persistence backends. `MemoryStore` backs tests and database-less runs; `PgStore` is production.

mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub use crate::accounts::repository::UserRepository;
pub use crate::favorites::repository::FavoriteRepository;
pub use crate::inquiries::repository::InquiryRepository;
pub use crate::listings::repository::ListingRepository;

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("stored record is malformed: {0}")]
    Corrupt(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(value: sqlx::Error) -> Self {
        match &value {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict,
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                RepositoryError::NotFound
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                RepositoryError::Corrupt(value.to_string())
            }
            _ => RepositoryError::Unavailable(value.to_string()),
        }
    }
}

/// Everything the HTTP surface needs from a backend.
pub trait Store:
    UserRepository + ListingRepository + FavoriteRepository + InquiryRepository + 'static
{
}

impl<T> Store for T where
    T: UserRepository + ListingRepository + FavoriteRepository + InquiryRepository + 'static
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_rows_are_not_found() {
        assert!(matches!(
            RepositoryError::from(sqlx::Error::RowNotFound),
            RepositoryError::NotFound
        ));
        assert!(matches!(
            RepositoryError::from(sqlx::Error::PoolClosed),
            RepositoryError::Unavailable(_)
        ));
    }
}
