//! # Payment Settlement
//!
//! Applies a payment to a single sale.
//!
//! ```text
//! apply_payment(sale, lines, use_credit?)
//!      │
//!      ├── no lines, no credit ──► manual override (needs ManualSettlement)
//!      │                           sale marked paid as-is
//!      │
//!      └── plan_payment(remaining, lines, credit)
//!              │
//!              ├── submitted > remaining + 0.01 ──► Overpayment, nothing written
//!              │
//!              └── insert one SalePayment per line (+ one StoreCredit row)
//!                  submitted ≥ remaining − 0.01 ──► is_paid = true
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ReceivablesResult;
use crate::ledger::append_entry_in;
use crate::Receivables;
use fomezero_core::ledger::check_use;
use fomezero_core::settlement::{plan_payment, PaymentPlan, PlannedPayment};
use fomezero_core::{
    Capability, CoreError, CreditType, Money, Operator, PaymentLine, PaymentRequest, Sale,
    SalePayment,
};
use fomezero_db::{CreditRepository, PaymentMethodRepository, SaleRepository};

impl Receivables {
    /// Applies a payment to one sale.
    ///
    /// ## Arguments
    /// * `operator` - Needs `RecordPayment`; `ManualSettlement` too when the
    ///   request carries neither payment lines nor store credit
    /// * `sale_id` - The sale to pay
    /// * `request` - Payment lines, optional store credit, optional `paid_at`
    ///
    /// ## Returns
    /// The sale as stored after the payment.
    ///
    /// ## Errors
    /// - `SaleNotFound`, `PaymentMethodNotFound`
    /// - `SaleCancelled`, `PaymentMethodInactive`
    /// - `Overpayment` when the lines exceed the remaining amount by more
    ///   than a cent (sale left untouched)
    /// - `InsufficientBalance` when `use_credit_cents` exceeds the ledger
    pub async fn apply_payment(
        &self,
        operator: &Operator,
        sale_id: &str,
        request: PaymentRequest,
    ) -> ReceivablesResult<Sale> {
        operator.require(Capability::RecordPayment)?;

        let now = Utc::now();
        let paid_at = request.paid_at.unwrap_or(now);
        let use_credit = request.use_credit_cents.map(Money::from_cents);

        let mut tx = self.db.begin().await?;

        if !SaleRepository::lock_in(&mut tx, sale_id).await? {
            return Err(CoreError::SaleNotFound(sale_id.to_string()).into());
        }
        let sale = SaleRepository::get_in(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
        if !sale.is_active {
            return Err(CoreError::SaleCancelled(sale.id).into());
        }

        let remaining = sale.remaining_amount();

        match plan_payment(remaining, &request.payments, use_credit)? {
            PaymentPlan::ManualOverride => {
                operator.require(Capability::ManualSettlement)?;
                if remaining.is_positive() {
                    warn!(
                        sale_id = %sale.id,
                        operator_id = %operator.id,
                        remaining = remaining.cents(),
                        "Manual settlement of a sale with an open balance"
                    );
                }
                SaleRepository::mark_paid_in(&mut tx, &sale.id, paid_at).await?;
            }

            PaymentPlan::Record {
                payments,
                submitted,
                closes_sale,
            } => {
                ensure_methods_usable_in(&mut tx, &request.payments).await?;

                if let Some(credit) = use_credit {
                    let balance = CreditRepository::balance_in(&mut tx, &sale.customer_id).await?;
                    check_use(balance, credit)?;
                    append_entry_in(
                        &mut tx,
                        &sale.customer_id,
                        CreditType::Debit,
                        credit,
                        &format!("Payment of sale {}", sale.id),
                        paid_at,
                    )
                    .await?;
                }

                for planned in &payments {
                    let row = payment_row(&sale.id, planned, paid_at, now);
                    SaleRepository::insert_payment_in(&mut tx, &row).await?;
                }

                if closes_sale {
                    SaleRepository::mark_paid_in(&mut tx, &sale.id, paid_at).await?;
                }

                info!(
                    sale_id = %sale.id,
                    customer_id = %sale.customer_id,
                    submitted = submitted.cents(),
                    remaining = remaining.cents(),
                    closes_sale,
                    "Payment applied"
                );
            }
        }

        let updated = SaleRepository::get_in(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
        tx.commit().await?;

        Ok(updated)
    }
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Checks that every line names an existing, active payment method.
pub(crate) async fn ensure_methods_usable_in(
    conn: &mut SqliteConnection,
    lines: &[PaymentLine],
) -> ReceivablesResult<()> {
    for line in lines {
        let method = PaymentMethodRepository::get_in(conn, &line.payment_method_id)
            .await?
            .ok_or_else(|| CoreError::PaymentMethodNotFound(line.payment_method_id.clone()))?;
        if !method.is_active {
            return Err(CoreError::PaymentMethodInactive(method.name).into());
        }
    }
    Ok(())
}

/// Turns a planned payment into the row to insert.
pub(crate) fn payment_row(
    sale_id: &str,
    planned: &PlannedPayment,
    paid_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> SalePayment {
    SalePayment {
        id: Uuid::new_v4().to_string(),
        sale_id: sale_id.to_string(),
        source: planned.source.clone(),
        amount_cents: planned.amount.cents(),
        paid_at,
        created_at: now,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{cashier, days_ago, Shop};
    use crate::ErrorKind;
    use fomezero_core::PaymentSource;

    fn pay(lines: Vec<PaymentLine>) -> PaymentRequest {
        PaymentRequest {
            payments: lines,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_exact_payment_closes_sale() {
        let shop = Shop::open().await;
        let sale = shop.unpaid_sale(4000, days_ago(1)).await;

        let paid = shop
            .svc
            .apply_payment(
                &shop.admin,
                &sale.id,
                pay(vec![
                    PaymentLine::new(&shop.pix.id, 2500),
                    PaymentLine::new(&shop.cash.id, 1500),
                ]),
            )
            .await
            .unwrap();

        assert!(paid.is_paid);
        assert!(paid.paid_at.is_some());
        assert_eq!(paid.remaining_amount(), Money::zero());
        assert_eq!(paid.payments.len(), 2);
    }

    #[tokio::test]
    async fn test_partial_payment_keeps_sale_open() {
        let shop = Shop::open().await;
        let sale = shop.unpaid_sale(4000, days_ago(1)).await;

        let after = shop
            .svc
            .apply_payment(&shop.admin, &sale.id, pay(vec![PaymentLine::new(&shop.pix.id, 1500)]))
            .await
            .unwrap();

        assert!(!after.is_paid);
        assert_eq!(after.paid_at, None);
        assert_eq!(after.remaining_amount(), Money::from_cents(2500));
    }

    #[tokio::test]
    async fn test_one_cent_short_still_closes() {
        let shop = Shop::open().await;
        let sale = shop.unpaid_sale(1000, days_ago(1)).await;

        let after = shop
            .svc
            .apply_payment(&shop.admin, &sale.id, pay(vec![PaymentLine::new(&shop.pix.id, 999)]))
            .await
            .unwrap();
        assert!(after.is_paid);
    }

    #[tokio::test]
    async fn test_overpayment_rejected_and_sale_unchanged() {
        let shop = Shop::open().await;
        let sale = shop.unpaid_sale(4000, days_ago(1)).await;
        shop.svc
            .apply_payment(&shop.admin, &sale.id, pay(vec![PaymentLine::new(&shop.pix.id, 1500)]))
            .await
            .unwrap();

        let err = shop
            .svc
            .apply_payment(&shop.admin, &sale.id, pay(vec![PaymentLine::new(&shop.pix.id, 2502)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(
            err.to_string(),
            "payment exceeds remaining balance: remaining R$ 25.00, submitted R$ 25.02"
        );

        let stored = shop.svc.sale(&sale.id).await.unwrap();
        assert_eq!(stored.payments.len(), 1);
        assert_eq!(stored.remaining_amount(), Money::from_cents(2500));
        assert!(!stored.is_paid);
    }

    #[tokio::test]
    async fn test_unknown_sale_is_not_found() {
        let shop = Shop::open().await;
        let err = shop
            .svc
            .apply_payment(&shop.admin, "missing", pay(vec![PaymentLine::new(&shop.pix.id, 100)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_manual_override_requires_capability() {
        let shop = Shop::open().await;
        let sale = shop.unpaid_sale(4000, days_ago(1)).await;

        let err = shop
            .svc
            .apply_payment(&cashier(), &sale.id, PaymentRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert!(!shop.svc.sale(&sale.id).await.unwrap().is_paid);

        let forced = shop
            .svc
            .apply_payment(&shop.admin, &sale.id, PaymentRequest::default())
            .await
            .unwrap();
        assert!(forced.is_paid);
        assert!(forced.payments.is_empty());
    }

    #[tokio::test]
    async fn test_inactive_or_unknown_method_rejected() {
        let shop = Shop::open().await;
        let sale = shop.unpaid_sale(4000, days_ago(1)).await;

        let err = shop
            .svc
            .apply_payment(&shop.admin, &sale.id, pay(vec![PaymentLine::new("nope", 100)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        shop.svc.set_payment_method_active(&shop.cash.id, false).await.unwrap();
        let err = shop
            .svc
            .apply_payment(&shop.admin, &sale.id, pay(vec![PaymentLine::new(&shop.cash.id, 100)]))
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::PaymentMethodInactive(_))));
    }

    #[tokio::test]
    async fn test_paying_with_store_credit() {
        let shop = Shop::open().await;
        let sale = shop.unpaid_sale(4000, days_ago(1)).await;
        shop.svc
            .add_credit(&shop.admin, &shop.customer.id, Money::from_cents(1000), "Gift", None)
            .await
            .unwrap();

        let after = shop
            .svc
            .apply_payment(
                &shop.admin,
                &sale.id,
                PaymentRequest {
                    payments: vec![PaymentLine::new(&shop.pix.id, 3000)],
                    use_credit_cents: Some(1000),
                    paid_at: None,
                },
            )
            .await
            .unwrap();

        assert!(after.is_paid);
        assert!(after
            .payments
            .iter()
            .any(|p| p.source == PaymentSource::StoreCredit && p.amount_cents == 1000));
        assert_eq!(
            shop.svc.balance(&shop.customer.id).await.unwrap(),
            Money::zero()
        );
    }

    #[tokio::test]
    async fn test_store_credit_beyond_balance_rejected() {
        let shop = Shop::open().await;
        let sale = shop.unpaid_sale(4000, days_ago(1)).await;
        shop.svc
            .add_credit(&shop.admin, &shop.customer.id, Money::from_cents(500), "Gift", None)
            .await
            .unwrap();

        let err = shop
            .svc
            .apply_payment(
                &shop.admin,
                &sale.id,
                PaymentRequest {
                    use_credit_cents: Some(800),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_core(),
            Some(CoreError::InsufficientBalance { .. })
        ));
        assert!(shop.svc.sale(&sale.id).await.unwrap().payments.is_empty());
        assert_eq!(
            shop.svc.balance(&shop.customer.id).await.unwrap(),
            Money::from_cents(500)
        );
    }

    #[tokio::test]
    async fn test_cancelled_sale_rejects_payment() {
        let shop = Shop::open().await;
        let sale = shop.unpaid_sale(4000, days_ago(1)).await;
        shop.svc.cancel_sale(&shop.admin, &sale.id).await.unwrap();

        let err = shop
            .svc
            .apply_payment(&shop.admin, &sale.id, pay(vec![PaymentLine::new(&shop.pix.id, 100)]))
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::SaleCancelled(_))));
    }
}
