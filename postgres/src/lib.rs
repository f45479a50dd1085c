//! `PostgreSQL` storage for the exam reservation backend.
//!
//! [`PostgresStore`] implements every repository trait from
//! `exam_reservation_core::environment` on a single connection pool.
//!
//! Reservation writes that move the capacity ledger run in one transaction:
//! the reservation row and every affected exam row are locked with
//! `SELECT ... FOR UPDATE`, the stored status is compared with the expected
//! one, and the ledger arithmetic from `exam_reservation_core::ledger` is
//! applied before anything is written back.
//!
//! # Example
//!
//! ```no_run
//! use exam_reservation_postgres::PostgresStore;
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgres://localhost/exams").await?;
//! let store = PostgresStore::new(pool);
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

mod exams;
mod ledger;
mod members;
mod reservations;
mod rows;

use async_trait::async_trait;
use exam_reservation_core::environment::StorageHealth;
use exam_reservation_core::error::{ReservationError, Result};
use sqlx::PgPool;

/// `PostgreSQL`-backed store.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a store on an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::Storage` if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ReservationError::Storage(format!("Migration failed: {e}")))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl StorageHealth for PostgresStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(storage("ping"))?;
        Ok(())
    }
}

/// Maps a driver error to `ReservationError::Storage`, logging and counting it.
pub(crate) fn storage(operation: &'static str) -> impl FnOnce(sqlx::Error) -> ReservationError {
    move |err| {
        tracing::error!(operation, error = %err, "Database operation failed");
        metrics::counter!("storage_errors_total", "operation" => operation).increment(1);
        ReservationError::Storage(format!("{operation}: {err}"))
    }
}

/// Name of the constraint a database error violated, if any
pub(crate) fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint(),
        _ => None,
    }
}
