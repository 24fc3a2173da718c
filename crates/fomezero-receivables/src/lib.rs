//! # fomezero-receivables: Settlement Services for Fome Zero
//!
//! Every operation that moves money runs here as one SQLite transaction:
//! creating sales, applying payments, the FIFO collector, cancellations and
//! the store credit ledger. Reporting reads go through the same handle.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Service Call                                     │
//! │                                                                         │
//! │  operator.require(capability) ──► PermissionDenied (403)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                 │
//! │  UPDATE <row> SET updated_at = updated_at   ← write lock taken first   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  load sale / open sales / ledger balance    ← fresh, nobody else writes│
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  fomezero_core::settlement::plan_*          ← pure decision            │
//! │       │                                                                 │
//! │       ├── Err ──► ROLLBACK (drop), nothing persisted                   │
//! │       ▼                                                                 │
//! │  insert payments / ledger entries, flip is_paid                        │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQLite has a single writer, so the first write of a transaction
//! serializes it against every other mutating call. Two concurrent credit
//! uses for the same customer can never both see the old balance.
//!
//! ## Module Organization
//!
//! - [`config`] - TOML + environment configuration
//! - [`error`] - `ReceivablesError` and its 404/400/403/500 classification
//! - [`catalog`] - Customers, snacks and payment methods
//! - [`sales`] - Sale creation
//! - [`settlement`] - Applying a payment to one sale
//! - [`collector`] - Bulk receipts paid off oldest sale first
//! - [`cancellation`] - Cancelling a sale, refunding paid money as credit
//! - [`ledger`] - Store credit
//! - [`debts`] - Receivable queries
//! - [`dashboard`] - Reporting
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fomezero_receivables::{Receivables, ReceivablesConfig};
//! use fomezero_core::{Operator, PaymentRequest, PaymentLine};
//!
//! let config = ReceivablesConfig::load(None)?;
//! let receivables = Receivables::open(&config).await?;
//!
//! let cashier = Operator::administrator("cashier-1");
//! let sale = receivables
//!     .apply_payment(&cashier, &sale_id, PaymentRequest {
//!         payments: vec![PaymentLine::new(&pix_id, 1500)],
//!         ..Default::default()
//!     })
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cancellation;
pub mod catalog;
pub mod collector;
pub mod config;
pub mod dashboard;
pub mod debts;
pub mod error;
pub mod ledger;
pub mod sales;
pub mod settlement;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use cancellation::Cancellation;
pub use config::ReceivablesConfig;
pub use error::{ErrorKind, ReceivablesError, ReceivablesResult};

use tracing::info;

use fomezero_core::dashboard::DashboardPolicy;
use fomezero_db::Database;

// =============================================================================
// Service Handle
// =============================================================================

/// Entry point for every receivables operation.
///
/// Cheap to clone; holds no state besides the pool and the dashboard policy.
/// Operations live in the submodules as `impl Receivables` blocks.
#[derive(Debug, Clone)]
pub struct Receivables {
    db: Database,
    policy: DashboardPolicy,
}

impl Receivables {
    /// Wraps an open database with the default dashboard policy.
    pub fn new(db: Database) -> Self {
        Receivables {
            db,
            policy: DashboardPolicy::default(),
        }
    }

    /// Wraps an open database with a custom dashboard policy.
    pub fn with_policy(db: Database, policy: DashboardPolicy) -> Self {
        Receivables { db, policy }
    }

    /// Opens (and migrates) the configured database.
    pub async fn open(config: &ReceivablesConfig) -> ReceivablesResult<Self> {
        let policy = config.dashboard_policy()?;

        if let Some(dir) = config.database.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let db = Database::new(config.db_config()).await?;

        info!(
            path = %config.database.path.display(),
            utc_offset_minutes = config.dashboard.utc_offset_minutes,
            "Receivables service ready"
        );

        Ok(Receivables { db, policy })
    }

    /// The underlying database handle.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// The dashboard policy in effect.
    pub fn policy(&self) -> &DashboardPolicy {
        &self.policy
    }
}
