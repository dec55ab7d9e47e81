mod customers;
mod inventory;
mod invoices;
mod projects;

use sqlx::any::{AnyPoolOptions, install_default_drivers};
use sqlx::{Any, AnyPool, Transaction};

use crate::config::Config;
use crate::error::CrmResult;

/// Database connection pool
///
/// Backed by the sqlx `Any` driver so the same queries run against MySQL in
/// production and SQLite in tests. All statements use `?` placeholders.
#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
}

impl Database {
    /// Create a new Database instance with a connection pool
    pub async fn new(config: &Config) -> CrmResult<Self> {
        // Register the MySQL and SQLite drivers behind `Any`
        install_default_drivers();

        // Create connection pool
        let pool = AnyPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url())
            .await?;

        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &AnyPool {
        &self.pool
    }
}

/// Initialize the database connection pool
pub async fn init(config: &Config) -> CrmResult<Database> {
    let db = Database::new(config).await?;

    // Make sure the server actually answers
    sqlx::query("SELECT 1").execute(db.get_pool()).await?;
    tracing::info!("Database connection established");

    Ok(db)
}

/// Roll back a failed transaction and hand back the error that caused it.
///
/// A failing rollback is only logged; the caller still sees `error`.
pub(crate) async fn abort<E>(tx: Transaction<'_, Any>, error: E) -> E {
    if let Err(rollback) = tx.rollback().await {
        tracing::error!("Rollback failed: {:?}", rollback);
    }
    error
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CrmError;

    #[tokio::test]
    async fn test_abort_keeps_original_error_when_rollback_fails() {
        let db = testing::memory_db().await;
        let mut tx = db.get_pool().begin().await.unwrap();

        // End the transaction behind sqlx's back so its own ROLLBACK fails
        sqlx::query("ROLLBACK").execute(&mut *tx).await.unwrap();

        let error = abort(
            tx,
            CrmError::DeleteFailed {
                context: "Failed to delete customer",
                source: sqlx::Error::RowNotFound,
            },
        )
        .await;

        match error {
            CrmError::DeleteFailed { context, .. } => assert_eq!(context, "Failed to delete customer"),
            other => panic!("expected the delete failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_abort_discards_pending_writes() {
        let db = testing::memory_db().await;
        let mut tx = db.get_pool().begin().await.unwrap();
        sqlx::query("INSERT INTO customer (cname, cphone, location) VALUES ('Acme', '1', 'LA')")
            .execute(&mut *tx)
            .await
            .unwrap();

        let error = abort(tx, CrmError::Internal("boom".into())).await;

        assert!(matches!(error, CrmError::Internal(_)));
        assert_eq!(testing::count(&db, "customer").await, 0);
    }
}
