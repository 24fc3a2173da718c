//! # Payment Method Repository
//!
//! Cash, Pix, card... Methods are soft-deleted only: past payments keep
//! pointing at them.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use fomezero_core::PaymentMethod;

const METHOD_COLUMNS: &str = "id, name, is_active, created_at";

/// Repository for payment method database operations.
#[derive(Debug, Clone)]
pub struct PaymentMethodRepository {
    pool: SqlitePool,
}

impl PaymentMethodRepository {
    /// Creates a new PaymentMethodRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentMethodRepository { pool }
    }

    /// Inserts a payment method. Names are unique ignoring case.
    pub async fn insert(&self, method: &PaymentMethod) -> DbResult<()> {
        debug!(id = %method.id, name = %method.name, "Inserting payment method");

        sqlx::query(
            "INSERT INTO payment_methods (id, name, is_active, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&method.id)
        .bind(&method.name)
        .bind(method.is_active)
        .bind(method.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a payment method by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PaymentMethod>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_in(&mut conn, id).await
    }

    /// Finds a payment method by name, ignoring case.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<PaymentMethod>> {
        let sql =
            format!("SELECT {METHOD_COLUMNS} FROM payment_methods WHERE name = ?1 COLLATE NOCASE");
        let method = sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(method)
    }

    /// Lists active payment methods ordered by name.
    pub async fn list_active(&self) -> DbResult<Vec<PaymentMethod>> {
        let sql = format!(
            "SELECT {METHOD_COLUMNS} FROM payment_methods WHERE is_active = 1 ORDER BY name COLLATE NOCASE"
        );
        let methods = sqlx::query_as::<_, PaymentMethod>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(methods)
    }

    /// Activates or deactivates a payment method.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE payment_methods SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PaymentMethod", id));
        }
        Ok(())
    }

    /// Gets a payment method by ID on the given connection.
    pub async fn get_in(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<PaymentMethod>> {
        let sql = format!("SELECT {METHOD_COLUMNS} FROM payment_methods WHERE id = ?1");
        let method = sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::payment_method;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_and_find_by_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let pix = payment_method("Pix");
        db.payment_methods().insert(&pix).await.unwrap();

        let found = db.payment_methods().find_by_name("PIX").await.unwrap().unwrap();
        assert_eq!(found.id, pix.id);

        let err = db.payment_methods().insert(&payment_method("pix")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_inactive_method_still_loadable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let cash = payment_method("Dinheiro");
        db.payment_methods().insert(&cash).await.unwrap();
        db.payment_methods().set_active(&cash.id, false).await.unwrap();

        assert!(db.payment_methods().list_active().await.unwrap().is_empty());
        let loaded = db.payment_methods().get_by_id(&cash.id).await.unwrap().unwrap();
        assert!(!loaded.is_active);
    }
}
