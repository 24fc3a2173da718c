//! # Receivable Queries
//!
//! Read-only views over what customers owe. Cancelled sales never count as
//! debt; they stay reachable through [`Receivables::sale`] only.

use std::collections::HashMap;

use fomezero_core::{CoreError, CustomerDebt, Money, Sale};

use crate::error::ReceivablesResult;
use crate::Receivables;

impl Receivables {
    /// A sale with its items and payments, cancelled or not.
    pub async fn sale(&self, sale_id: &str) -> ReceivablesResult<Sale> {
        self.db
            .sales()
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }

    /// Active sales of a customer, oldest first.
    pub async fn sales_for_customer(&self, customer_id: &str) -> ReceivablesResult<Vec<Sale>> {
        let sales = self.db.sales().list_for_customer(customer_id).await?;
        Ok(sales.into_iter().filter(|s| s.is_active).collect())
    }

    /// Every open sale, oldest first.
    pub async fn unpaid_sales(&self) -> ReceivablesResult<Vec<Sale>> {
        Ok(self.db.sales().list_open().await?)
    }

    /// Open sales of one customer, oldest first.
    pub async fn unpaid_sales_for_customer(&self, customer_id: &str) -> ReceivablesResult<Vec<Sale>> {
        Ok(self.db.sales().open_for_customer(customer_id).await?)
    }

    /// What one customer still owes.
    pub async fn customer_debt(&self, customer_id: &str) -> ReceivablesResult<Money> {
        let open = self.unpaid_sales_for_customer(customer_id).await?;
        Ok(open.iter().map(Sale::remaining_amount).sum())
    }

    /// Customers with open sales, largest debt first.
    ///
    /// A customer whose open sales are fully covered by partial payments
    /// (remaining zero) still shows up with a zero debt.
    pub async fn customers_with_debts(&self) -> ReceivablesResult<Vec<CustomerDebt>> {
        let open = self.unpaid_sales().await?;
        let customers: HashMap<String, _> = self
            .db
            .customers()
            .list_all()
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        let mut debts: HashMap<&str, CustomerDebt> = HashMap::new();
        for sale in &open {
            let debt = debts.entry(&sale.customer_id).or_insert_with(|| {
                let customer = customers.get(&sale.customer_id);
                CustomerDebt {
                    customer_id: sale.customer_id.clone(),
                    name: customer.map_or_else(|| "Unknown".to_string(), |c| c.name.clone()),
                    phone: customer.and_then(|c| c.formatted_phone()),
                    total_debt_cents: 0,
                    unpaid_count: 0,
                    oldest_sale_date: sale.sale_date,
                }
            });
            debt.total_debt_cents += sale.remaining_amount().cents();
            debt.unpaid_count += 1;
            debt.oldest_sale_date = debt.oldest_sale_date.min(sale.sale_date);
        }

        let mut debts: Vec<CustomerDebt> = debts.into_values().collect();
        debts.sort_by(|a, b| {
            b.total_debt_cents
                .cmp(&a.total_debt_cents)
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        });
        Ok(debts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{days_ago, Shop};
    use crate::ErrorKind;
    use fomezero_core::{PaymentLine, PaymentRequest};

    #[tokio::test]
    async fn test_debt_sums_remaining_amounts() {
        let shop = Shop::open().await;
        let first = shop.unpaid_sale(4000, days_ago(10)).await;
        shop.unpaid_sale(1500, days_ago(2)).await;
        shop.svc
            .apply_payment(
                &shop.admin,
                &first.id,
                PaymentRequest {
                    payments: vec![PaymentLine::new(&shop.pix.id, 1000)],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(
            shop.svc.customer_debt(&shop.customer.id).await.unwrap(),
            Money::from_cents(4500)
        );
    }

    #[tokio::test]
    async fn test_cancelled_sales_are_not_debt() {
        let shop = Shop::open().await;
        let sale = shop.unpaid_sale(4000, days_ago(10)).await;
        shop.svc.cancel_sale(&shop.admin, &sale.id).await.unwrap();

        assert!(shop.svc.unpaid_sales().await.unwrap().is_empty());
        assert!(shop.svc.sales_for_customer(&shop.customer.id).await.unwrap().is_empty());
        assert!(shop.svc.customers_with_debts().await.unwrap().is_empty());
        assert!(!shop.svc.sale(&sale.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_customers_ranked_by_debt() {
        let shop = Shop::open().await;
        let bia = shop.customer("Bia").await;
        shop.unpaid_sale(1000, days_ago(20)).await;
        shop.unpaid_sale(500, days_ago(5)).await;
        shop.unpaid_sale_for(&bia.id, 9000, days_ago(1)).await;

        let debts = shop.svc.customers_with_debts().await.unwrap();
        assert_eq!(debts.len(), 2);

        assert_eq!(debts[0].name, "Bia");
        assert_eq!(debts[0].total_debt_cents, 9000);
        assert_eq!(debts[0].phone, None);

        assert_eq!(debts[1].name, "Ana");
        assert_eq!(debts[1].total_debt_cents, 1500);
        assert_eq!(debts[1].unpaid_count, 2);
        assert_eq!(debts[1].phone.as_deref(), Some("(11) 98765-4321"));
        assert!(debts[1].oldest_sale_date < days_ago(19));
    }

    #[tokio::test]
    async fn test_missing_sale() {
        let shop = Shop::open().await;
        let err = shop.svc.sale("nope").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "sale not found: nope");
    }
}
