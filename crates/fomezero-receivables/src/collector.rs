//! # FIFO Debt Collector
//!
//! A customer hands over a lump sum meant to pay several open sales.
//!
//! ```text
//! open sales (oldest first):  D1 10.00   D2 20.00   D3 15.00
//! receipt 30.00 ──────────────► settle ──► settle   stop (nothing left)
//! receipt 25.00 ──────────────► settle     stop ──► 15.00 becomes credit
//! receipt 5.00  ──────────────► stop ───────────────► 5.00 advance payment
//! ```
//!
//! A sale is either paid in full by the receipt or left untouched. The whole
//! batch (every settled sale plus the credit grant) is one transaction.

use chrono::Utc;
use tracing::{debug, info};

use crate::error::ReceivablesResult;
use crate::ledger::{append_entry_in, lock_customer_in};
use crate::settlement::{ensure_methods_usable_in, payment_row};
use crate::Receivables;
use fomezero_core::settlement::{plan_bulk_receipt, OpenSale};
use fomezero_core::{
    BulkReceipt, BulkReceiptResult, Capability, CreditType, Money, Operator, SettledSale,
};
use fomezero_db::SaleRepository;

impl Receivables {
    /// Pays off a customer's open sales oldest first with one receipt.
    ///
    /// Needs `RecordPayment`. Anything the receipt cannot apply to a whole
    /// sale is granted as store credit.
    ///
    /// ## Errors
    /// - `CustomerNotFound`, `PaymentMethodNotFound`, `PaymentMethodInactive`
    /// - `Validation` when the total is not positive or the payment lines
    ///   do not add up to it
    pub async fn receive_bulk(
        &self,
        operator: &Operator,
        receipt: BulkReceipt,
    ) -> ReceivablesResult<BulkReceiptResult> {
        operator.require(Capability::RecordPayment)?;

        let now = Utc::now();
        let paid_at = receipt.paid_at.unwrap_or(now);
        let total = Money::from_cents(receipt.total_received_cents);

        let mut tx = self.db.begin().await?;
        lock_customer_in(&mut tx, &receipt.customer_id).await?;
        ensure_methods_usable_in(&mut tx, &receipt.payments).await?;

        let open = SaleRepository::open_for_customer_in(&mut tx, &receipt.customer_id).await?;
        let open: Vec<OpenSale> = open.iter().map(OpenSale::from).collect();
        let plan = plan_bulk_receipt(total, &receipt.payments, &open)?;

        let mut settled = Vec::with_capacity(plan.settlements.len());
        for settlement in &plan.settlements {
            for planned in &settlement.payments {
                let row = payment_row(&settlement.sale_id, planned, paid_at, now);
                SaleRepository::insert_payment_in(&mut tx, &row).await?;
            }
            SaleRepository::mark_paid_in(&mut tx, &settlement.sale_id, paid_at).await?;

            debug!(
                sale_id = %settlement.sale_id,
                amount = settlement.amount.cents(),
                lines = settlement.payments.len(),
                "Sale settled by bulk receipt"
            );
            settled.push(SettledSale {
                sale_id: settlement.sale_id.clone(),
                amount_cents: settlement.amount.cents(),
            });
        }

        let credit_entry = match plan.credit {
            Some(grant) => Some(
                append_entry_in(
                    &mut tx,
                    &receipt.customer_id,
                    CreditType::Credit,
                    grant.amount,
                    grant.reason.description(),
                    paid_at,
                )
                .await?,
            ),
            None => None,
        };

        tx.commit().await?;

        info!(
            customer_id = %receipt.customer_id,
            received = total.cents(),
            settled_sales = settled.len(),
            settled_total = plan.settled_total().cents(),
            credit = plan.credit_amount().cents(),
            "Bulk receipt applied"
        );

        Ok(BulkReceiptResult {
            customer_id: receipt.customer_id,
            settled,
            credit_granted_cents: plan.credit_amount().cents(),
            credit_entry,
        })
    }
}
