//! # Settlement Planning
//!
//! Decides what a payment does to a sale before anything is written. The
//! receivables services load fresh state inside a transaction, ask this module
//! for a plan, and persist exactly what the plan says.
//!
//! ## Single-Sale Payment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  plan_payment(remaining, lines, use_credit)                             │
//! │                                                                         │
//! │  no lines, no credit ───────────────────────► ManualOverride            │
//! │                                                                         │
//! │  submitted = Σ lines + credit                                           │
//! │  submitted > remaining + 0.01 ──────────────► Err(Overpayment)          │
//! │  submitted ≥ remaining − 0.01 ──────────────► Record { closes: true }   │
//! │  otherwise ─────────────────────────────────► Record { closes: false }  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Bulk Receipt (FIFO)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Received R$ 25.00       open sales, oldest first                       │
//! │                                                                         │
//! │  D1 R$ 10.00  ── 25.00 ≥ 10.00 ──► settle, 15.00 left                   │
//! │  D2 R$ 20.00  ── 15.00 < 20.00 ──► stop (D2 and D3 untouched)           │
//! │  D3 R$ 15.00                                                            │
//! │                                                                         │
//! │  nothing settled ──► whole receipt becomes "Advance payment" credit     │
//! │  something left  ──► leftover becomes "Change from settlement" credit   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! A sale is either fully covered by a bulk receipt or not touched at all.

use chrono::{DateTime, Utc};

use crate::allocation::{allocate, ResidualSlot};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, PAYMENT_TOLERANCE};
use crate::types::{PaymentLine, PaymentSource, Sale};
use crate::validation::{checked_total, validate_amount, validate_payment_lines};
use crate::{ADVANCE_PAYMENT_DESCRIPTION, SETTLEMENT_CHANGE_DESCRIPTION};

// =============================================================================
// Planned Writes
// =============================================================================

/// A sale payment row the service should insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPayment {
    pub source: PaymentSource,
    pub amount: Money,
}

impl PlannedPayment {
    pub fn method(payment_method_id: impl Into<String>, amount: Money) -> Self {
        PlannedPayment {
            source: PaymentSource::Method(payment_method_id.into()),
            amount,
        }
    }
}

/// Outcome of [`plan_payment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentPlan {
    /// No breakdown was given: mark the sale paid as-is.
    ManualOverride,
    /// Insert `payments`; flip the sale to paid when `closes_sale`.
    Record {
        payments: Vec<PlannedPayment>,
        submitted: Money,
        closes_sale: bool,
    },
}

// =============================================================================
// Single-Sale Payment
// =============================================================================

/// Plans a payment against one sale.
///
/// `remaining` must be the sale's freshly loaded remaining amount. Store
/// credit counts towards the submitted total; whether the customer actually
/// has that much credit is checked by [`crate::ledger::check_use`].
///
/// ```rust
/// use fomezero_core::money::Money;
/// use fomezero_core::settlement::{plan_payment, PaymentPlan};
/// use fomezero_core::types::PaymentLine;
///
/// let plan = plan_payment(
///     Money::from_cents(2500),
///     &[PaymentLine::new("pix", 1000)],
///     None,
/// )
/// .unwrap();
/// assert!(matches!(plan, PaymentPlan::Record { closes_sale: false, .. }));
/// ```
pub fn plan_payment(
    remaining: Money,
    lines: &[PaymentLine],
    use_credit: Option<Money>,
) -> CoreResult<PaymentPlan> {
    if lines.is_empty() && use_credit.is_none() {
        return Ok(PaymentPlan::ManualOverride);
    }

    let mut submitted = validate_payment_lines(lines)?;
    if let Some(credit) = use_credit {
        validate_amount("use_credit", credit)?;
        submitted = checked_total("payments", submitted, credit)?;
    }

    if submitted > remaining && submitted - remaining > PAYMENT_TOLERANCE {
        return Err(CoreError::Overpayment {
            remaining,
            submitted,
        });
    }

    let mut payments: Vec<PlannedPayment> = lines
        .iter()
        .map(|line| PlannedPayment::method(line.payment_method_id.clone(), line.amount()))
        .collect();
    if let Some(credit) = use_credit {
        payments.push(PlannedPayment {
            source: PaymentSource::StoreCredit,
            amount: credit,
        });
    }

    Ok(PaymentPlan::Record {
        payments,
        submitted,
        closes_sale: submitted >= remaining - PAYMENT_TOLERANCE,
    })
}

// =============================================================================
// Bulk Receipt (FIFO)
// =============================================================================

/// An unpaid sale as seen by the FIFO collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSale {
    pub sale_id: String,
    pub sale_date: DateTime<Utc>,
    pub remaining: Money,
}

impl From<&Sale> for OpenSale {
    fn from(sale: &Sale) -> Self {
        OpenSale {
            sale_id: sale.id.clone(),
            sale_date: sale.sale_date,
            remaining: sale.remaining_amount(),
        }
    }
}

/// One sale fully covered by a bulk receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleSettlement {
    pub sale_id: String,
    pub amount: Money,
    pub payments: Vec<PlannedPayment>,
}

/// Why a bulk receipt grants store credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditReason {
    /// No open sale could be fully covered.
    AdvancePayment,
    /// Left over after the covered sales.
    SettlementChange,
}

impl CreditReason {
    pub const fn description(&self) -> &'static str {
        match self {
            CreditReason::AdvancePayment => ADVANCE_PAYMENT_DESCRIPTION,
            CreditReason::SettlementChange => SETTLEMENT_CHANGE_DESCRIPTION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditGrant {
    pub amount: Money,
    pub reason: CreditReason,
}

/// Outcome of [`plan_bulk_receipt`].
///
/// `Σ settlements.amount + credit.amount == total_received`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkPlan {
    pub settlements: Vec<SaleSettlement>,
    pub credit: Option<CreditGrant>,
}

impl BulkPlan {
    pub fn settled_total(&self) -> Money {
        self.settlements.iter().map(|s| s.amount).sum()
    }

    pub fn credit_amount(&self) -> Money {
        self.credit.map_or(Money::zero(), |c| c.amount)
    }
}

/// Plans how a lump sum pays off a customer's open sales, oldest first.
///
/// ## Rules
/// 1. Sales are walked by `sale_date` ascending (sale id breaks ties).
/// 2. A sale is settled only if what is left covers its whole remaining
///    amount; the walk stops at the first sale that cannot be covered.
/// 3. Each settled sale's amount is split across `breakdown` proportionally
///    to the line amounts, rounding ties on the first line, zero shares
///    dropped.
/// 4. Nothing settled: the whole receipt is an advance-payment credit.
///    Otherwise any positive leftover is a settlement-change credit.
///
/// ## Errors
/// - non-positive total, empty or invalid breakdown
/// - breakdown not adding up to `total_received`
pub fn plan_bulk_receipt(
    total_received: Money,
    breakdown: &[PaymentLine],
    open_sales: &[OpenSale],
) -> CoreResult<BulkPlan> {
    validate_amount("total_received", total_received)?;
    if breakdown.is_empty() {
        return Err(ValidationError::Empty {
            field: "payments".to_string(),
        }
        .into());
    }
    let breakdown_total = validate_payment_lines(breakdown)?;
    if breakdown_total != total_received {
        return Err(ValidationError::Mismatch {
            field: "payments".to_string(),
            expected: total_received,
            actual: breakdown_total,
        }
        .into());
    }

    let mut ordered: Vec<&OpenSale> = open_sales.iter().collect();
    ordered.sort_by(|a, b| {
        a.sale_date
            .cmp(&b.sale_date)
            .then_with(|| a.sale_id.cmp(&b.sale_id))
    });

    let weights: Vec<i64> = breakdown.iter().map(|l| l.amount_cents).collect();
    let mut left = total_received;
    let mut settlements = Vec::new();

    for sale in ordered {
        if left < sale.remaining {
            break;
        }
        left -= sale.remaining;
        settlements.push(SaleSettlement {
            sale_id: sale.sale_id.clone(),
            amount: sale.remaining,
            payments: split_across_lines(sale.remaining, breakdown, &weights),
        });
    }

    let credit = if settlements.is_empty() {
        Some(CreditGrant {
            amount: total_received,
            reason: CreditReason::AdvancePayment,
        })
    } else if left.is_positive() {
        Some(CreditGrant {
            amount: left,
            reason: CreditReason::SettlementChange,
        })
    } else {
        None
    };

    Ok(BulkPlan {
        settlements,
        credit,
    })
}

fn split_across_lines(
    amount: Money,
    breakdown: &[PaymentLine],
    weights: &[i64],
) -> Vec<PlannedPayment> {
    allocate(amount, weights, ResidualSlot::First)
        .into_iter()
        .zip(breakdown)
        .filter(|(share, _)| share.is_positive())
        .map(|(share, line)| PlannedPayment::method(line.payment_method_id.clone(), share))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
