//! # Snack Repository
//!
//! Catalog storage. Sale items snapshot the unit price, so editing or
//! deactivating a snack never changes an existing sale.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use fomezero_core::Snack;

const SNACK_COLUMNS: &str = "id, name, description, price_cents, is_active, created_at, updated_at";

/// Repository for snack database operations.
#[derive(Debug, Clone)]
pub struct SnackRepository {
    pool: SqlitePool,
}

impl SnackRepository {
    /// Creates a new SnackRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SnackRepository { pool }
    }

    /// Inserts a snack.
    pub async fn insert(&self, snack: &Snack) -> DbResult<()> {
        debug!(id = %snack.id, name = %snack.name, price = snack.price_cents, "Inserting snack");

        sqlx::query(
            r#"
            INSERT INTO snacks (id, name, description, price_cents, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&snack.id)
        .bind(&snack.name)
        .bind(&snack.description)
        .bind(snack.price_cents)
        .bind(snack.is_active)
        .bind(snack.created_at)
        .bind(snack.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a snack by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Snack>> {
        let sql = format!("SELECT {SNACK_COLUMNS} FROM snacks WHERE id = ?1");
        let snack = sqlx::query_as::<_, Snack>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(snack)
    }

    /// Lists active snacks ordered by name.
    pub async fn list_active(&self) -> DbResult<Vec<Snack>> {
        let sql = format!(
            "SELECT {SNACK_COLUMNS} FROM snacks WHERE is_active = 1 ORDER BY name COLLATE NOCASE"
        );
        let snacks = sqlx::query_as::<_, Snack>(&sql).fetch_all(&self.pool).await?;
        Ok(snacks)
    }

    /// Lists every snack, including inactive ones (needed to name sold items).
    pub async fn list_all(&self) -> DbResult<Vec<Snack>> {
        let sql = format!("SELECT {SNACK_COLUMNS} FROM snacks ORDER BY name COLLATE NOCASE");
        let snacks = sqlx::query_as::<_, Snack>(&sql).fetch_all(&self.pool).await?;
        Ok(snacks)
    }

    /// Changes the catalog price. Existing sales keep their snapshot.
    pub async fn update_price(&self, id: &str, price_cents: i64) -> DbResult<()> {
        debug!(id = %id, price = price_cents, "Updating snack price");

        let result = sqlx::query("UPDATE snacks SET price_cents = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(price_cents)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Snack", id));
        }
        Ok(())
    }

    /// Activates or deactivates a snack.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE snacks SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Snack", id));
        }
        Ok(())
    }

    /// Counts all snacks.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM snacks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::snack;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_get_and_price_update() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let coxinha = snack("Coxinha", 650);
        db.snacks().insert(&coxinha).await.unwrap();

        db.snacks().update_price(&coxinha.id, 700).await.unwrap();
        let loaded = db.snacks().get_by_id(&coxinha.id).await.unwrap().unwrap();
        assert_eq!(loaded.price_cents, 700);
        assert_eq!(db.snacks().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_negative_price_rejected_by_schema() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.snacks().insert(&snack("Broken", -1)).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_deactivated_snack_leaves_active_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let pastel = snack("Pastel", 800);
        db.snacks().insert(&pastel).await.unwrap();
        db.snacks().insert(&snack("Suco", 500)).await.unwrap();

        db.snacks().set_active(&pastel.id, false).await.unwrap();
        assert_eq!(db.snacks().list_active().await.unwrap().len(), 1);
        assert_eq!(db.snacks().list_all().await.unwrap().len(), 2);
    }
}
