//! # Credit Repository
//!
//! The append-only store credit ledger. A customer's balance is
//! `Σ credit − Σ debit` over their rows; nothing here is ever updated or
//! deleted.

use std::collections::HashMap;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use fomezero_core::{CustomerCredit, Money};

const CREDIT_COLUMNS: &str =
    "id, customer_id, amount_cents, credit_type, description, reference_date, created_at";

const SIGNED_SUM: &str =
    "COALESCE(SUM(CASE WHEN credit_type = 'credit' THEN amount_cents ELSE -amount_cents END), 0)";

/// Repository for the store credit ledger.
#[derive(Debug, Clone)]
pub struct CreditRepository {
    pool: SqlitePool,
}

impl CreditRepository {
    /// Creates a new CreditRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CreditRepository { pool }
    }

    /// Ledger balance of one customer.
    pub async fn balance(&self, customer_id: &str) -> DbResult<Money> {
        let mut conn = self.pool.acquire().await?;
        Self::balance_in(&mut conn, customer_id).await
    }

    /// Ledger balances of every customer that has at least one entry.
    ///
    /// Customers without entries are absent; callers default them to zero.
    pub async fn balances(&self) -> DbResult<HashMap<String, Money>> {
        let sql = format!(
            "SELECT customer_id, {SIGNED_SUM} FROM customer_credits GROUP BY customer_id"
        );
        let rows: Vec<(String, i64)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(id, cents)| (id, Money::from_cents(cents)))
            .collect())
    }

    /// A customer's ledger, newest first.
    pub async fn history(&self, customer_id: &str) -> DbResult<Vec<CustomerCredit>> {
        let sql = format!(
            r#"
            SELECT {CREDIT_COLUMNS}
            FROM customer_credits
            WHERE customer_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#
        );
        let entries = sqlx::query_as::<_, CustomerCredit>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }

    /// Every ledger entry, oldest first.
    pub async fn list_all(&self) -> DbResult<Vec<CustomerCredit>> {
        let sql = format!("SELECT {CREDIT_COLUMNS} FROM customer_credits ORDER BY rowid");
        let entries = sqlx::query_as::<_, CustomerCredit>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }

    /// `(customer_id, cached credit_cents, ledger balance)` for every customer.
    pub async fn cached_vs_ledger(&self) -> DbResult<Vec<(String, i64, i64)>> {
        let sql = format!(
            r#"
            SELECT c.id, c.credit_cents,
                   (SELECT {SIGNED_SUM} FROM customer_credits cc WHERE cc.customer_id = c.id)
            FROM customers c
            ORDER BY c.id
            "#
        );
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Ledger balance on the given connection.
    pub async fn balance_in(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<Money> {
        let sql = format!("SELECT {SIGNED_SUM} FROM customer_credits WHERE customer_id = ?1");
        let cents: i64 = sqlx::query_scalar(&sql)
            .bind(customer_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(Money::from_cents(cents))
    }

    /// Appends one ledger entry.
    pub async fn append_in(conn: &mut SqliteConnection, entry: &CustomerCredit) -> DbResult<()> {
        debug!(
            customer_id = %entry.customer_id,
            credit_type = ?entry.credit_type,
            amount = entry.amount_cents,
            description = %entry.description,
            "Appending ledger entry"
        );

        sqlx::query(
            r#"
            INSERT INTO customer_credits (
                id, customer_id, amount_cents, credit_type, description, reference_date, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.customer_id)
        .bind(entry.amount_cents)
        .bind(entry.credit_type)
        .bind(&entry.description)
        .bind(entry.reference_date)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ledger_entry, Fixture};
    use crate::{Database, DbConfig, DbError};
    use fomezero_core::CreditType;

    #[tokio::test]
    async fn test_balance_is_signed_sum() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fx = Fixture::seed(&db).await;
        let id = fx.customer.id.clone();

        assert_eq!(db.credits().balance(&id).await.unwrap(), Money::zero());

        let mut tx = db.begin().await.unwrap();
        for entry in [
            ledger_entry(&id, 1000, CreditType::Credit),
            ledger_entry(&id, 300, CreditType::Debit),
            ledger_entry(&id, 50, CreditType::Credit),
        ] {
            CreditRepository::append_in(&mut tx, &entry).await.unwrap();
        }
        assert_eq!(
            CreditRepository::balance_in(&mut tx, &id).await.unwrap(),
            Money::from_cents(750)
        );
        tx.commit().await.unwrap();

        let balances = db.credits().balances().await.unwrap();
        assert_eq!(balances.get(&id), Some(&Money::from_cents(750)));
        assert_eq!(db.credits().history(&id).await.unwrap().len(), 3);
        assert_eq!(db.credits().list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_history_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fx = Fixture::seed(&db).await;
        let id = fx.customer.id.clone();

        let first = ledger_entry(&id, 100, CreditType::Credit);
        let mut second = ledger_entry(&id, 40, CreditType::Debit);
        second.created_at = first.created_at + chrono::Duration::seconds(5);

        let mut tx = db.begin().await.unwrap();
        CreditRepository::append_in(&mut tx, &first).await.unwrap();
        CreditRepository::append_in(&mut tx, &second).await.unwrap();
        tx.commit().await.unwrap();

        let history = db.credits().history(&id).await.unwrap();
        assert_eq!(history[0].id, second.id);
        assert_eq!(history[0].credit_type, CreditType::Debit);
    }

    #[tokio::test]
    async fn test_cached_vs_ledger_reports_every_customer() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fx = Fixture::seed(&db).await;

        let mut tx = db.begin().await.unwrap();
        CreditRepository::append_in(&mut tx, &ledger_entry(&fx.customer.id, 200, CreditType::Credit))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let rows = db.credits().cached_vs_ledger().await.unwrap();
        assert_eq!(rows, vec![(fx.customer.id.clone(), 0, 200)]);
    }

    #[tokio::test]
    async fn test_zero_amount_entry_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fx = Fixture::seed(&db).await;

        let mut tx = db.begin().await.unwrap();
        let err = CreditRepository::append_in(
            &mut tx,
            &ledger_entry(&fx.customer.id, 0, CreditType::Credit),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
