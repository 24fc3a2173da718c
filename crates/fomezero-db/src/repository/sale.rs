//! # Sale Repository
//!
//! Sales are stored across three tables and always loaded whole:
//!
//! ```text
//! sales ──┬── sale_items     (rowid order = insertion order)
//!         └── sale_payments  (append-only, rowid order)
//! ```
//!
//! Every loader runs three queries sharing one WHERE clause and stitches
//! the rows together, so a list of N sales costs 3 queries, not 2N + 1.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use fomezero_core::{PaymentSource, Sale, SaleItem, SalePayment};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, FromRow)]
struct SaleRow {
    id: String,
    customer_id: String,
    sale_date: DateTime<Utc>,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct SalePaymentRow {
    id: String,
    sale_id: String,
    source: String,
    payment_method_id: Option<String>,
    amount_cents: i64,
    paid_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SalePaymentRow> for SalePayment {
    type Error = DbError;

    fn try_from(row: SalePaymentRow) -> Result<Self, Self::Error> {
        let source = PaymentSource::from_parts(&row.source, row.payment_method_id).ok_or_else(
            || DbError::CorruptRow {
                entity: "SalePayment".to_string(),
                id: row.id.clone(),
                reason: format!("bad source '{}'", row.source),
            },
        )?;

        Ok(SalePayment {
            id: row.id,
            sale_id: row.sale_id,
            source,
            amount_cents: row.amount_cents,
            paid_at: row.paid_at,
            created_at: row.created_at,
        })
    }
}

/// Which sales a loader returns. Each variant maps to a fixed WHERE clause
/// over the `s` (sales) alias.
#[derive(Debug, Clone, Copy)]
enum SaleFilter<'a> {
    Id(&'a str),
    Customer(&'a str),
    OpenForCustomer(&'a str),
    Open,
    All,
}

impl<'a> SaleFilter<'a> {
    fn clause(&self) -> &'static str {
        match self {
            SaleFilter::Id(_) => "s.id = ?1",
            SaleFilter::Customer(_) => "s.customer_id = ?1",
            SaleFilter::OpenForCustomer(_) => {
                "s.customer_id = ?1 AND s.is_active = 1 AND s.is_paid = 0"
            }
            SaleFilter::Open => "s.is_active = 1 AND s.is_paid = 0",
            SaleFilter::All => "1 = 1",
        }
    }

    fn param(&self) -> Option<&'a str> {
        match *self {
            SaleFilter::Id(v) | SaleFilter::Customer(v) | SaleFilter::OpenForCustomer(v) => {
                Some(v)
            }
            SaleFilter::Open | SaleFilter::All => None,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Pool operations
    // =========================================================================

    /// Inserts a sale with its items and payments in one transaction.
    pub async fn insert(&self, sale: &Sale) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_in(&mut tx, sale).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Gets a sale (any state) with items and payments.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_in(&mut conn, id).await
    }

    /// All sales of a customer, cancelled ones included, oldest first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<Sale>> {
        let mut conn = self.pool.acquire().await?;
        Self::load_in(&mut conn, SaleFilter::Customer(customer_id)).await
    }

    /// Active unpaid sales of a customer, oldest first.
    pub async fn open_for_customer(&self, customer_id: &str) -> DbResult<Vec<Sale>> {
        let mut conn = self.pool.acquire().await?;
        Self::open_for_customer_in(&mut conn, customer_id).await
    }

    /// Active unpaid sales of every customer, oldest first.
    pub async fn list_open(&self) -> DbResult<Vec<Sale>> {
        let mut conn = self.pool.acquire().await?;
        Self::load_in(&mut conn, SaleFilter::Open).await
    }

    /// Every sale ever recorded. Used by the dashboard and reconciliation.
    pub async fn list_all(&self) -> DbResult<Vec<Sale>> {
        let mut conn = self.pool.acquire().await?;
        Self::load_in(&mut conn, SaleFilter::All).await
    }

    // =========================================================================
    // Transactional steps
    // =========================================================================

    /// Takes the write lock on a sale row. Returns `false` if it doesn't exist.
    pub async fn lock_in(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE sales SET updated_at = updated_at WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Gets a sale with items and payments on the given connection.
    pub async fn get_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
        let mut sales = Self::load_in(conn, SaleFilter::Id(id)).await?;
        Ok(sales.pop())
    }

    /// Active unpaid sales of a customer on the given connection.
    pub async fn open_for_customer_in(
        conn: &mut SqliteConnection,
        customer_id: &str,
    ) -> DbResult<Vec<Sale>> {
        Self::load_in(conn, SaleFilter::OpenForCustomer(customer_id)).await
    }

    /// Inserts the sale row, then every item and payment it carries.
    pub async fn insert_in(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(
            id = %sale.id,
            customer_id = %sale.customer_id,
            items = sale.items.len(),
            payments = sale.payments.len(),
            "Inserting sale"
        );

        sqlx::query(
            r#"
            INSERT INTO sales (id, customer_id, sale_date, is_paid, paid_at, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_id)
        .bind(sale.sale_date)
        .bind(sale.is_paid)
        .bind(sale.paid_at)
        .bind(sale.is_active)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *conn)
        .await?;

        for item in &sale.items {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, snack_id, quantity, unit_price_cents,
                    discount_cents, total_amount_cents, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(&sale.id)
            .bind(&item.snack_id)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.discount_cents)
            .bind(item.total_amount_cents)
            .bind(item.created_at)
            .execute(&mut *conn)
            .await?;
        }

        for payment in &sale.payments {
            Self::insert_payment_in(conn, payment).await?;
        }

        Ok(())
    }

    /// Appends one payment to a sale.
    pub async fn insert_payment_in(
        conn: &mut SqliteConnection,
        payment: &SalePayment,
    ) -> DbResult<()> {
        debug!(
            sale_id = %payment.sale_id,
            source = payment.source.kind(),
            amount = payment.amount_cents,
            "Recording sale payment"
        );

        sqlx::query(
            r#"
            INSERT INTO sale_payments (id, sale_id, source, payment_method_id, amount_cents, paid_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.sale_id)
        .bind(payment.source.kind())
        .bind(payment.source.method_id())
        .bind(payment.amount_cents)
        .bind(payment.paid_at)
        .bind(payment.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Marks a sale paid.
    pub async fn mark_paid_in(
        conn: &mut SqliteConnection,
        id: &str,
        paid_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE sales SET is_paid = 1, paid_at = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(paid_at)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }
        Ok(())
    }

    /// Soft-deletes (cancels) a sale. Items and payments stay.
    pub async fn deactivate_in(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE sales SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }
        Ok(())
    }

    // =========================================================================
    // Loading
    // =========================================================================

    async fn load_in(conn: &mut SqliteConnection, filter: SaleFilter<'_>) -> DbResult<Vec<Sale>> {
        let clause = filter.clause();

        let sale_sql = format!(
            r#"
            SELECT s.id, s.customer_id, s.sale_date, s.is_paid, s.paid_at,
                   s.is_active, s.created_at, s.updated_at
            FROM sales s
            WHERE {clause}
            ORDER BY s.sale_date, s.id
            "#
        );
        let item_sql = format!(
            r#"
            SELECT si.id, si.sale_id, si.snack_id, si.quantity, si.unit_price_cents,
                   si.discount_cents, si.total_amount_cents, si.created_at
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE {clause}
            ORDER BY si.rowid
            "#
        );
        let payment_sql = format!(
            r#"
            SELECT sp.id, sp.sale_id, sp.source, sp.payment_method_id,
                   sp.amount_cents, sp.paid_at, sp.created_at
            FROM sale_payments sp
            JOIN sales s ON s.id = sp.sale_id
            WHERE {clause}
            ORDER BY sp.rowid
            "#
        );

        let mut sale_query = sqlx::query_as::<_, SaleRow>(&sale_sql);
        let mut item_query = sqlx::query_as::<_, SaleItem>(&item_sql);
        let mut payment_query = sqlx::query_as::<_, SalePaymentRow>(&payment_sql);
        if let Some(param) = filter.param() {
            sale_query = sale_query.bind(param);
            item_query = item_query.bind(param);
            payment_query = payment_query.bind(param);
        }

        let rows = sale_query.fetch_all(&mut *conn).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let items = item_query.fetch_all(&mut *conn).await?;
        let payments = payment_query.fetch_all(&mut *conn).await?;

        let mut items_by_sale: HashMap<String, Vec<SaleItem>> = HashMap::new();
        for item in items {
            items_by_sale.entry(item.sale_id.clone()).or_default().push(item);
        }

        let mut payments_by_sale: HashMap<String, Vec<SalePayment>> = HashMap::new();
        for row in payments {
            let payment = SalePayment::try_from(row)?;
            payments_by_sale
                .entry(payment.sale_id.clone())
                .or_default()
                .push(payment);
        }

        let sales = rows
            .into_iter()
            .map(|row| Sale {
                items: items_by_sale.remove(&row.id).unwrap_or_default(),
                payments: payments_by_sale.remove(&row.id).unwrap_or_default(),
                id: row.id,
                customer_id: row.customer_id,
                sale_date: row.sale_date,
                is_paid: row.is_paid,
                paid_at: row.paid_at,
                is_active: row.is_active,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect();

        Ok(sales)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sale, snack, Fixture};
    use crate::{Database, DbConfig};
    use chrono::{Duration, TimeZone};

    #[tokio::test]
    async fn test_insert_and_load_whole_sale() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fx = Fixture::seed(&db).await;

        let mut s = sale(&fx.customer.id, &fx.snack.id, &[(2, 650), (1, 500)], Utc::now());
        s.payments.push(fx.payment(&s.id, 300));
        db.sales().insert(&s).await.unwrap();

        let loaded = db.sales().get_by_id(&s.id).await.unwrap().unwrap();
        assert_eq!(loaded.items.len(), 2);
        assert_eq!(loaded.items[0].quantity, 2);
        assert_eq!(loaded.total_amount().cents(), 1800);
        assert_eq!(loaded.paid_amount().cents(), 300);
        assert_eq!(loaded.remaining_amount().cents(), 1500);
        assert_eq!(
            loaded.payments[0].source,
            PaymentSource::Method(fx.method.id.clone())
        );
    }

    #[tokio::test]
    async fn test_store_credit_payment_round_trips() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fx = Fixture::seed(&db).await;
        let s = sale(&fx.customer.id, &fx.snack.id, &[(1, 1000)], Utc::now());
        db.sales().insert(&s).await.unwrap();

        let mut payment = fx.payment(&s.id, 400);
        payment.source = PaymentSource::StoreCredit;
        let mut tx = db.begin().await.unwrap();
        SaleRepository::insert_payment_in(&mut tx, &payment).await.unwrap();
        tx.commit().await.unwrap();

        let loaded = db.sales().get_by_id(&s.id).await.unwrap().unwrap();
        assert_eq!(loaded.payments[0].source, PaymentSource::StoreCredit);
    }

    #[tokio::test]
    async fn test_open_sales_oldest_first_and_exclude_closed() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fx = Fixture::seed(&db).await;
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        let newer = sale(&fx.customer.id, &fx.snack.id, &[(1, 100)], base + Duration::days(2));
        let older = sale(&fx.customer.id, &fx.snack.id, &[(1, 100)], base);
        let paid = sale(&fx.customer.id, &fx.snack.id, &[(1, 100)], base);
        let cancelled = sale(&fx.customer.id, &fx.snack.id, &[(1, 100)], base);
        for s in [&newer, &older, &paid, &cancelled] {
            db.sales().insert(s).await.unwrap();
        }

        let mut tx = db.begin().await.unwrap();
        SaleRepository::mark_paid_in(&mut tx, &paid.id, base).await.unwrap();
        SaleRepository::deactivate_in(&mut tx, &cancelled.id).await.unwrap();
        tx.commit().await.unwrap();

        let open = db.sales().open_for_customer(&fx.customer.id).await.unwrap();
        let ids: Vec<_> = open.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![older.id.as_str(), newer.id.as_str()]);

        assert_eq!(db.sales().list_open().await.unwrap().len(), 2);
        assert_eq!(db.sales().list_for_customer(&fx.customer.id).await.unwrap().len(), 4);
        assert_eq!(db.sales().list_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_lock_missing_sale() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut tx = db.begin().await.unwrap();
        assert!(!SaleRepository::lock_in(&mut tx, "missing").await.unwrap());
        let err = SaleRepository::mark_paid_in(&mut tx, "missing", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_sale_for_unknown_customer_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let coxinha = snack("Coxinha", 650);
        db.snacks().insert(&coxinha).await.unwrap();

        let s = sale("nobody", &coxinha.id, &[(1, 650)], Utc::now());
        let err = db.sales().insert(&s).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert!(db.sales().get_by_id(&s.id).await.unwrap().is_none());
    }
}
