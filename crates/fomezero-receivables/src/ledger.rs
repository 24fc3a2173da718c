//! # Store Credit Ledger
//!
//! Grants and consumptions of store credit, balance reads, and the
//! cache reconciliation used by the `reconcile` binary.
//!
//! ## Source of Truth
//! ```text
//! customer_credits (append-only)  ──Σ signed──►  balance     ← decisions
//!          │
//!          └── same transaction ──► customers.credit_cents   ← display cache
//! ```
//!
//! Every entry is appended through [`append_entry_in`], which refreshes the
//! cache in the caller's transaction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ReceivablesResult;
use crate::Receivables;
use fomezero_core::ledger::{check_grant, check_use};
use fomezero_core::validation::validate_description;
use fomezero_core::{
    Capability, CoreError, CreditDrift, CreditType, CustomerCredit, Money, Operator,
};
use fomezero_db::{CreditRepository, CustomerRepository};

impl Receivables {
    /// Grants store credit to a customer.
    ///
    /// Needs `ManageCredit`. `reference_date` defaults to now.
    pub async fn add_credit(
        &self,
        operator: &Operator,
        customer_id: &str,
        amount: Money,
        description: &str,
        reference_date: Option<DateTime<Utc>>,
    ) -> ReceivablesResult<CustomerCredit> {
        operator.require(Capability::ManageCredit)?;
        check_grant(amount)?;
        let description = validate_description(description)?;

        let mut tx = self.db.begin().await?;
        lock_customer_in(&mut tx, customer_id).await?;

        let entry = append_entry_in(
            &mut tx,
            customer_id,
            CreditType::Credit,
            amount,
            &description,
            reference_date.unwrap_or_else(Utc::now),
        )
        .await?;
        tx.commit().await?;

        info!(
            customer_id = %customer_id,
            amount = amount.cents(),
            operator_id = %operator.id,
            "Store credit granted"
        );
        Ok(entry)
    }

    /// Consumes store credit.
    ///
    /// The balance is read after the customer row is locked, so two
    /// concurrent uses can never both spend the same money.
    ///
    /// ## Errors
    /// - `CustomerNotFound`
    /// - `InsufficientBalance` when `amount` exceeds the ledger balance
    pub async fn use_credit(
        &self,
        operator: &Operator,
        customer_id: &str,
        amount: Money,
        description: &str,
        reference_date: Option<DateTime<Utc>>,
    ) -> ReceivablesResult<CustomerCredit> {
        operator.require(Capability::ManageCredit)?;
        let description = validate_description(description)?;

        let mut tx = self.db.begin().await?;
        lock_customer_in(&mut tx, customer_id).await?;

        let balance = CreditRepository::balance_in(&mut tx, customer_id).await?;
        check_use(balance, amount)?;

        let entry = append_entry_in(
            &mut tx,
            customer_id,
            CreditType::Debit,
            amount,
            &description,
            reference_date.unwrap_or_else(Utc::now),
        )
        .await?;
        tx.commit().await?;

        info!(
            customer_id = %customer_id,
            amount = amount.cents(),
            balance_after = (balance - amount).cents(),
            operator_id = %operator.id,
            "Store credit used"
        );
        Ok(entry)
    }

    /// Ledger balance of one customer.
    pub async fn balance(&self, customer_id: &str) -> ReceivablesResult<Money> {
        if self.db.customers().get_by_id(customer_id).await?.is_none() {
            return Err(CoreError::CustomerNotFound(customer_id.to_string()).into());
        }
        Ok(self.db.credits().balance(customer_id).await?)
    }

    /// Ledger balances for several customers; unknown ids map to zero.
    pub async fn balances(&self, customer_ids: &[String]) -> ReceivablesResult<HashMap<String, Money>> {
        let all = self.db.credits().balances().await?;
        Ok(customer_ids
            .iter()
            .map(|id| (id.clone(), all.get(id).copied().unwrap_or_default()))
            .collect())
    }

    /// Ledger entries of a customer, newest first.
    pub async fn credit_history(&self, customer_id: &str) -> ReceivablesResult<Vec<CustomerCredit>> {
        Ok(self.db.credits().history(customer_id).await?)
    }

    /// Rewrites every drifted `credit_cents` cache from the ledger.
    ///
    /// Returns the customers that were out of sync.
    pub async fn reconcile_credit_counters(&self) -> ReceivablesResult<Vec<CreditDrift>> {
        let drifts: Vec<CreditDrift> = self
            .db
            .credits()
            .cached_vs_ledger()
            .await?
            .into_iter()
            .filter(|(_, cached, ledger)| cached != ledger)
            .map(|(customer_id, cached_cents, ledger_cents)| CreditDrift {
                customer_id,
                cached_cents,
                ledger_cents,
            })
            .collect();

        if drifts.is_empty() {
            debug!("Credit caches match the ledger");
            return Ok(drifts);
        }

        let mut tx = self.db.begin().await?;
        for drift in &drifts {
            warn!(
                customer_id = %drift.customer_id,
                cached = drift.cached_cents,
                ledger = drift.ledger_cents,
                "Credit cache drifted from ledger"
            );
            CustomerRepository::set_credit_cache_in(&mut tx, &drift.customer_id, drift.ledger_cents)
                .await?;
        }
        tx.commit().await?;

        info!(fixed = drifts.len(), "Credit caches reconciled");
        Ok(drifts)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Takes the write lock on a customer row, failing if it does not exist.
pub(crate) async fn lock_customer_in(
    conn: &mut SqliteConnection,
    customer_id: &str,
) -> ReceivablesResult<()> {
    if !CustomerRepository::lock_in(conn, customer_id).await? {
        return Err(CoreError::CustomerNotFound(customer_id.to_string()).into());
    }
    Ok(())
}

/// Appends a ledger entry and moves the customer's cached balance with it.
///
/// The caller holds the transaction and has done any balance check.
pub(crate) async fn append_entry_in(
    conn: &mut SqliteConnection,
    customer_id: &str,
    credit_type: CreditType,
    amount: Money,
    description: &str,
    reference_date: DateTime<Utc>,
) -> ReceivablesResult<CustomerCredit> {
    let entry = CustomerCredit {
        id: Uuid::new_v4().to_string(),
        customer_id: customer_id.to_string(),
        amount_cents: amount.cents(),
        credit_type,
        description: description.to_string(),
        reference_date,
        created_at: Utc::now(),
    };

    CreditRepository::append_in(conn, &entry).await?;
    CustomerRepository::adjust_credit_cache_in(conn, customer_id, entry.signed_amount().cents())
        .await?;

    debug!(
        entry_id = %entry.id,
        customer_id = %customer_id,
        signed = entry.signed_amount().cents(),
        "Ledger entry appended"
    );
    Ok(entry)
}

// =============================================================================
// Unit Tests
// =============================================================================
