//! # Sale Cancellation
//!
//! ```text
//! cancel_sale(id)
//!      │
//!      ├── already cancelled ──► Ok, nothing written (already_cancelled)
//!      │
//!      ├── is_active = false        (items and payments kept for audit)
//!      │
//!      └── paid > 0 ──► Credit entry of exactly `paid`
//!                       "Reversal - sale cancellation", dated now
//! ```
//!
//! Cancelling twice is a no-op, so a retried request never refunds twice.

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::error::ReceivablesResult;
use crate::ledger::append_entry_in;
use crate::Receivables;
use fomezero_core::{
    Capability, CoreError, CreditType, CustomerCredit, Operator, Sale,
    CANCELLATION_REVERSAL_DESCRIPTION,
};
use fomezero_db::SaleRepository;

/// Outcome of [`Receivables::cancel_sale`].
#[derive(Debug, Clone, Serialize)]
pub struct Cancellation {
    /// The sale after cancellation.
    pub sale: Sale,
    /// Credit granted for what had been paid, if anything.
    pub reversal: Option<CustomerCredit>,
    /// The sale was already inactive; nothing changed.
    pub already_cancelled: bool,
}

impl Receivables {
    /// Cancels a sale, refunding what was paid as store credit.
    ///
    /// Needs `CancelSale`. Fails only with `SaleNotFound`.
    pub async fn cancel_sale(
        &self,
        operator: &Operator,
        sale_id: &str,
    ) -> ReceivablesResult<Cancellation> {
        operator.require(Capability::CancelSale)?;

        let mut tx = self.db.begin().await?;
        if !SaleRepository::lock_in(&mut tx, sale_id).await? {
            return Err(CoreError::SaleNotFound(sale_id.to_string()).into());
        }
        let sale = SaleRepository::get_in(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        if !sale.is_active {
            info!(sale_id = %sale_id, "Sale already cancelled");
            return Ok(Cancellation {
                sale,
                reversal: None,
                already_cancelled: true,
            });
        }

        SaleRepository::deactivate_in(&mut tx, sale_id).await?;

        let paid = sale.paid_amount();
        let reversal = if paid.is_positive() {
            Some(
                append_entry_in(
                    &mut tx,
                    &sale.customer_id,
                    CreditType::Credit,
                    paid,
                    CANCELLATION_REVERSAL_DESCRIPTION,
                    Utc::now(),
                )
                .await?,
            )
        } else {
            None
        };

        let sale = SaleRepository::get_in(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            customer_id = %sale.customer_id,
            refunded = paid.cents(),
            operator_id = %operator.id,
            "Sale cancelled"
        );

        Ok(Cancellation {
            sale,
            reversal,
            already_cancelled: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{cashier, days_ago, Shop};
    use crate::ErrorKind;
    use fomezero_core::{Money, PaymentLine, PaymentRequest};

    #[tokio::test]
    async fn test_partially_paid_sale_refunds_paid_amount() {
        let shop = Shop::open().await;
        let sale = shop.unpaid_sale(4000, days_ago(3)).await;
        shop.svc
            .apply_payment(
                &shop.admin,
                &sale.id,
                PaymentRequest {
                    payments: vec![PaymentLine::new(&shop.pix.id, 1500)],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let outcome = shop.svc.cancel_sale(&shop.admin, &sale.id).await.unwrap();

        assert!(!outcome.already_cancelled);
        assert!(!outcome.sale.is_active);
        let reversal = outcome.reversal.unwrap();
        assert_eq!(reversal.amount_cents, 1500);
        assert_eq!(reversal.credit_type, CreditType::Credit);
        assert_eq!(reversal.description, CANCELLATION_REVERSAL_DESCRIPTION);

        assert_eq!(
            shop.svc.balance(&shop.customer.id).await.unwrap(),
            Money::from_cents(1500)
        );
        let stored = shop.svc.sale(&sale.id).await.unwrap();
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.payments.len(), 1);
    }

    #[tokio::test]
    async fn test_unpaid_sale_creates_no_entry() {
        let shop = Shop::open().await;
        let sale = shop.unpaid_sale(4000, days_ago(3)).await;

        let outcome = shop.svc.cancel_sale(&shop.admin, &sale.id).await.unwrap();
        assert!(outcome.reversal.is_none());
        assert!(shop.svc.credit_history(&shop.customer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_cancel_is_a_no_op() {
        let shop = Shop::open().await;
        let sale = shop.unpaid_sale(2000, days_ago(3)).await;
        shop.svc
            .apply_payment(
                &shop.admin,
                &sale.id,
                PaymentRequest {
                    payments: vec![PaymentLine::new(&shop.cash.id, 2000)],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        shop.svc.cancel_sale(&shop.admin, &sale.id).await.unwrap();
        let again = shop.svc.cancel_sale(&shop.admin, &sale.id).await.unwrap();

        assert!(again.already_cancelled);
        assert!(again.reversal.is_none());
        assert_eq!(
            shop.svc.balance(&shop.customer.id).await.unwrap(),
            Money::from_cents(2000)
        );
    }

    #[tokio::test]
    async fn test_missing_sale_and_permission() {
        let shop = Shop::open().await;
        let err = shop.svc.cancel_sale(&shop.admin, "ghost").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "sale not found: ghost");

        let sale = shop.unpaid_sale(2000, days_ago(1)).await;
        let err = shop.svc.cancel_sale(&cashier(), &sale.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
}
