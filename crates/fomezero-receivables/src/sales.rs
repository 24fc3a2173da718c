//! # Sale Creation
//!
//! Item prices, discounts and totals arrive computed by the caller and are
//! stored as given; the catalog is never consulted for prices here.
//!
//! ```text
//! NewSale { items, is_paid, payments }
//!      │
//!      ├── is_paid = true  ──► payments stored verbatim, paid_at = sale_date
//!      │
//!      └── is_paid = false ──► payments (if any) go through plan_payment:
//!                              overpayment rejected, exact total closes it
//! ```

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ReceivablesResult;
use crate::ledger::lock_customer_in;
use crate::settlement::{ensure_methods_usable_in, payment_row};
use crate::Receivables;
use fomezero_core::settlement::{plan_payment, PaymentPlan, PlannedPayment};
use fomezero_core::validation::{validate_payment_lines, validate_sale_items};
use fomezero_core::{Capability, Money, NewSale, Operator, Sale, SaleItem};
use fomezero_db::SaleRepository;

impl Receivables {
    /// Creates a sale with its items and any initial payments.
    ///
    /// Needs `RecordPayment`. The sale, items and payments are written in
    /// one transaction.
    ///
    /// ## Errors
    /// - `Validation` when `items` is empty or an item has invalid numbers
    /// - `CustomerNotFound`, `PaymentMethodNotFound`, `PaymentMethodInactive`
    /// - `Overpayment` for an unpaid sale whose initial payments exceed it
    pub async fn create_sale(&self, operator: &Operator, request: NewSale) -> ReceivablesResult<Sale> {
        operator.require(Capability::RecordPayment)?;
        validate_sale_items(&request.items)?;

        let now = Utc::now();
        let sale_date = request.sale_date.unwrap_or(now);
        let sale_id = Uuid::new_v4().to_string();

        let items: Vec<SaleItem> = request
            .items
            .iter()
            .map(|item| SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                snack_id: item.snack_id.clone(),
                quantity: item.quantity,
                unit_price_cents: item.unit_price_cents,
                discount_cents: item.discount_cents,
                total_amount_cents: item.total_amount_cents,
                created_at: now,
            })
            .collect();
        let total: Money = items.iter().map(SaleItem::total_amount).sum();

        let (planned, is_paid) = if request.is_paid {
            let submitted = validate_payment_lines(&request.payments)?;
            if !request.payments.is_empty() && !submitted.approx_eq(total) {
                warn!(
                    customer_id = %request.customer_id,
                    total = total.cents(),
                    submitted = submitted.cents(),
                    "Paid sale created with payments that do not add up to its total"
                );
            }
            let planned: Vec<PlannedPayment> = request
                .payments
                .iter()
                .map(|line| PlannedPayment::method(line.payment_method_id.clone(), line.amount()))
                .collect();
            (planned, true)
        } else {
            match plan_payment(total, &request.payments, None)? {
                PaymentPlan::ManualOverride => (Vec::new(), false),
                PaymentPlan::Record {
                    payments,
                    closes_sale,
                    ..
                } => (payments, closes_sale),
            }
        };

        let sale = Sale {
            payments: planned
                .iter()
                .map(|p| payment_row(&sale_id, p, sale_date, now))
                .collect(),
            id: sale_id,
            customer_id: request.customer_id,
            sale_date,
            is_paid,
            paid_at: is_paid.then_some(sale_date),
            is_active: true,
            items,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.db.begin().await?;
        lock_customer_in(&mut tx, &sale.customer_id).await?;
        ensure_methods_usable_in(&mut tx, &request.payments).await?;
        SaleRepository::insert_in(&mut tx, &sale).await?;
        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            customer_id = %sale.customer_id,
            total = total.cents(),
            paid = sale.paid_amount().cents(),
            is_paid = sale.is_paid,
            "Sale created"
        );
        Ok(sale)
    }
}
