//! # Store Credit Ledger
//!
//! Balance arithmetic over [`CustomerCredit`] entries.
//!
//! The ledger is append-only and authoritative:
//!
//! ```text
//! balance = Σ amount (Credit) − Σ amount (Debit)
//! ```
//!
//! `customers.credit_cents` is only a cache of this sum, refreshed in the same
//! transaction as every new entry.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::CustomerCredit;
use crate::validation::validate_amount;

/// Balance of a single customer's entries.
pub fn balance_of(entries: &[CustomerCredit]) -> Money {
    entries.iter().map(CustomerCredit::signed_amount).sum()
}

/// Balances per customer for a mixed set of entries.
///
/// Customers listed in `customer_ids` without entries map to zero.
pub fn balances_by_customer(
    entries: &[CustomerCredit],
    customer_ids: &[String],
) -> HashMap<String, Money> {
    let mut balances: HashMap<String, Money> = customer_ids
        .iter()
        .map(|id| (id.clone(), Money::zero()))
        .collect();
    for entry in entries {
        *balances.entry(entry.customer_id.clone()).or_default() += entry.signed_amount();
    }
    balances
}

/// Checks that `amount` can be consumed from `balance`.
///
/// ```rust
/// use fomezero_core::ledger::check_use;
/// use fomezero_core::money::Money;
///
/// assert!(check_use(Money::from_cents(5000), Money::from_cents(3000)).is_ok());
/// assert!(check_use(Money::from_cents(2000), Money::from_cents(3000)).is_err());
/// ```
pub fn check_use(balance: Money, amount: Money) -> CoreResult<()> {
    validate_amount("amount", amount)?;
    if balance < amount {
        return Err(CoreError::InsufficientBalance {
            available: balance,
            requested: amount,
        });
    }
    Ok(())
}

/// Checks a grant amount. Grants never fail beyond this.
pub fn check_grant(amount: Money) -> CoreResult<()> {
    validate_amount("amount", amount)?;
    Ok(())
}
