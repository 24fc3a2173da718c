//! # fomezero-db: Database Layer for Fome Zero
//!
//! SQLite storage for customers, the snack catalog, payment methods, sales
//! and the store credit ledger, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Fome Zero Data Flow                              │
//! │                                                                         │
//! │  ReceivablesService::receive_bulk                                      │
//! │       │  opens a transaction, locks the customer                       │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   fomezero-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │   │   │
//! │  │   │               │    │ CustomerRepo   │   │              │   │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepo       │   │ 0001_initial │   │   │
//! │  │   │ Transactions  │    │ CreditRepo     │   │              │   │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fomezero_db::{Database, DbConfig, SaleRepository};
//!
//! let db = Database::new(DbConfig::new("fomezero.db")).await?;
//!
//! // Pool-level read
//! let open = db.sales().open_for_customer(&customer_id).await?;
//!
//! // Several steps, one commit
//! let mut tx = db.begin().await?;
//! SaleRepository::lock_in(&mut tx, &sale_id).await?;
//! SaleRepository::mark_paid_in(&mut tx, &sale_id, paid_at).await?;
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::credit::CreditRepository;
pub use repository::customer::CustomerRepository;
pub use repository::payment_method::PaymentMethodRepository;
pub use repository::sale::SaleRepository;
pub use repository::snack::SnackRepository;
