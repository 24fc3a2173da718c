//! # Customer Repository
//!
//! Database operations for customers.
//!
//! Besides plain CRUD this owns two things the receivables services rely on:
//! - `lock_in`: takes the write lock on a customer before a balance is read
//! - the `credit_cents` cache, only ever written next to a ledger entry

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use fomezero_core::validation::customer_name_key;
use fomezero_core::Customer;

const CUSTOMER_COLUMNS: &str =
    "id, name, phone, is_active, credit_cents, created_at, updated_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    // =========================================================================
    // Pool operations
    // =========================================================================

    /// Inserts a customer.
    ///
    /// ## Errors
    /// `UniqueViolation` when the name (case-insensitive) or phone is taken.
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, name_key, phone, is_active, credit_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(customer_name_key(&customer.name))
        .bind(&customer.phone)
        .bind(customer.is_active)
        .bind(customer.credit_cents)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_in(&mut conn, id).await
    }

    /// Finds a customer by name, ignoring case (accented letters included).
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE name_key = ?1");
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(customer_name_key(name))
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }

    /// Finds a customer by normalized (digits only) phone.
    pub async fn find_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE phone = ?1");
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }

    /// Lists active customers ordered by name.
    pub async fn list_active(&self) -> DbResult<Vec<Customer>> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE is_active = 1 ORDER BY name_key"
        );
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(customers)
    }

    /// Lists every customer, active or not.
    pub async fn list_all(&self) -> DbResult<Vec<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name_key");
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(customers)
    }

    /// Activates or deactivates (soft delete) a customer.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE customers SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }
        Ok(())
    }

    /// Counts all customers.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Transactional steps
    // =========================================================================

    /// Takes the write lock on a customer row.
    ///
    /// Returns `false` when the customer does not exist.
    pub async fn lock_in(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE customers SET updated_at = updated_at WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Gets a customer by ID on the given connection.
    pub async fn get_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(customer)
    }

    /// Moves the cached credit by `delta_cents`.
    pub async fn adjust_credit_cache_in(
        conn: &mut SqliteConnection,
        id: &str,
        delta_cents: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE customers SET credit_cents = credit_cents + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(delta_cents)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }
        Ok(())
    }

    /// Overwrites the cached credit (reconciliation).
    pub async fn set_credit_cache_in(
        conn: &mut SqliteConnection,
        id: &str,
        cents: i64,
    ) -> DbResult<()> {
        sqlx::query("UPDATE customers SET credit_cents = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(cents)
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
