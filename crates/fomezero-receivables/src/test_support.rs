//! Fixtures shared by the service tests.

use chrono::{DateTime, Duration, Utc};

use crate::Receivables;
use fomezero_core::{
    Capability, Customer, NewCustomer, NewSale, NewSaleItem, NewSnack, Operator, PaymentMethod,
    Sale, Snack,
};
use fomezero_db::{Database, DbConfig};

/// A service over a fresh in-memory database.
pub async fn service() -> Receivables {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    Receivables::new(db)
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}

/// An operator who can record payments and nothing else.
pub fn cashier() -> Operator {
    Operator::new("cashier", [Capability::RecordPayment])
}

/// One customer, one snack and two payment methods.
pub struct Shop {
    pub svc: Receivables,
    pub admin: Operator,
    pub customer: Customer,
    pub snack: Snack,
    pub pix: PaymentMethod,
    pub cash: PaymentMethod,
}

impl Shop {
    pub async fn open() -> Shop {
        let svc = service().await;
        let customer = svc
            .register_customer(NewCustomer {
                name: "Ana".into(),
                phone: Some("11987654321".into()),
            })
            .await
            .unwrap();
        let snack = svc
            .add_snack(NewSnack {
                name: "Coxinha".into(),
                description: None,
                price_cents: 650,
            })
            .await
            .unwrap();
        let pix = svc.add_payment_method("Pix").await.unwrap();
        let cash = svc.add_payment_method("Dinheiro").await.unwrap();

        Shop {
            svc,
            admin: Operator::administrator("admin"),
            customer,
            snack,
            pix,
            cash,
        }
    }

    /// Registers another customer.
    pub async fn customer(&self, name: &str) -> Customer {
        self.svc
            .register_customer(NewCustomer {
                name: name.into(),
                phone: None,
            })
            .await
            .unwrap()
    }

    /// One unit priced at `total_cents`.
    pub fn item(&self, total_cents: i64) -> NewSaleItem {
        NewSaleItem {
            snack_id: self.snack.id.clone(),
            quantity: 1,
            unit_price_cents: total_cents,
            discount_cents: 0,
            total_amount_cents: total_cents,
        }
    }

    /// An unpaid sale of `total_cents` for the shop's customer.
    pub async fn unpaid_sale(&self, total_cents: i64, date: DateTime<Utc>) -> Sale {
        self.unpaid_sale_for(&self.customer.id, total_cents, date).await
    }

    pub async fn unpaid_sale_for(
        &self,
        customer_id: &str,
        total_cents: i64,
        date: DateTime<Utc>,
    ) -> Sale {
        self.svc
            .create_sale(
                &self.admin,
                NewSale {
                    customer_id: customer_id.to_string(),
                    items: vec![self.item(total_cents)],
                    sale_date: Some(date),
                    is_paid: false,
                    payments: Vec::new(),
                },
            )
            .await
            .unwrap()
    }
}
