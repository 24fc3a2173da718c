//! Row builders shared by the repository tests.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::Database;
use fomezero_core::{
    CreditType, Customer, CustomerCredit, PaymentMethod, PaymentSource, Sale, SaleItem,
    SalePayment, Snack,
};

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn customer(name: &str, phone: Option<&str>) -> Customer {
    let now = Utc::now();
    Customer {
        id: new_id(),
        name: name.to_string(),
        phone: phone.map(str::to_string),
        is_active: true,
        credit_cents: 0,
        created_at: now,
        updated_at: now,
    }
}

pub fn snack(name: &str, price_cents: i64) -> Snack {
    let now = Utc::now();
    Snack {
        id: new_id(),
        name: name.to_string(),
        description: None,
        price_cents,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn payment_method(name: &str) -> PaymentMethod {
    PaymentMethod {
        id: new_id(),
        name: name.to_string(),
        is_active: true,
        created_at: Utc::now(),
    }
}

/// An unpaid sale with one item per `(quantity, unit_price_cents)` pair.
pub fn sale(customer_id: &str, snack_id: &str, lines: &[(i64, i64)], date: DateTime<Utc>) -> Sale {
    let id = new_id();
    let now = Utc::now();
    let items = lines
        .iter()
        .map(|&(quantity, unit)| SaleItem {
            id: new_id(),
            sale_id: id.clone(),
            snack_id: snack_id.to_string(),
            quantity,
            unit_price_cents: unit,
            discount_cents: 0,
            total_amount_cents: quantity * unit,
            created_at: now,
        })
        .collect();

    Sale {
        id,
        customer_id: customer_id.to_string(),
        sale_date: date,
        is_paid: false,
        paid_at: None,
        is_active: true,
        items,
        payments: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

pub fn ledger_entry(customer_id: &str, amount_cents: i64, credit_type: CreditType) -> CustomerCredit {
    let now = Utc::now();
    CustomerCredit {
        id: new_id(),
        customer_id: customer_id.to_string(),
        amount_cents,
        credit_type,
        description: "test".to_string(),
        reference_date: now,
        created_at: now,
    }
}

/// One stored customer, snack and payment method.
pub struct Fixture {
    pub customer: Customer,
    pub snack: Snack,
    pub method: PaymentMethod,
}

impl Fixture {
    pub async fn seed(db: &Database) -> Fixture {
        let fx = Fixture {
            customer: customer("Ana", None),
            snack: snack("Coxinha", 650),
            method: payment_method("Pix"),
        };
        db.customers().insert(&fx.customer).await.unwrap();
        db.snacks().insert(&fx.snack).await.unwrap();
        db.payment_methods().insert(&fx.method).await.unwrap();
        fx
    }

    /// A payment through the fixture's method.
    pub fn payment(&self, sale_id: &str, amount_cents: i64) -> SalePayment {
        let now = Utc::now();
        SalePayment {
            id: new_id(),
            sale_id: sale_id.to_string(),
            source: PaymentSource::Method(self.method.id.clone()),
            amount_cents,
            paid_at: now,
            created_at: now,
        }
    }
}
