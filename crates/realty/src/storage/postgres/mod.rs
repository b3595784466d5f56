//! Postgres-backed repositories built on `sqlx`.

mod favorites;
mod inquiries;
mod listings;
mod users;

use std::fmt;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::RepositoryError;
use crate::config::{ConfigError, DatabaseConfig};
use crate::error::AppError;

/// Store backed by a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool using the configured URL. Fails when no URL is configured.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let url = config
            .url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await?;
        tracing::info!(
            max_connections = config.max_connections,
            "connected to postgres"
        );
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn corrupt(err: impl fmt::Display) -> RepositoryError {
    RepositoryError::Corrupt(err.to_string())
}

/// Converts a `COUNT(*)` result into the unsigned total carried by pages.
fn total(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

fn like_pattern(needle: &str) -> String {
    format!("%{}%", needle.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_wraps_trimmed_needle() {
        assert_eq!(like_pattern(" lake "), "%lake%");
    }

    #[test]
    fn negative_counts_clamp_to_zero() {
        assert_eq!(total(-1), 0);
        assert_eq!(total(42), 42);
    }
}
