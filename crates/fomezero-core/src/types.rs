//! # Domain Types
//!
//! Core domain types for the Fome Zero receivables engine.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Model                                    │
//! │                                                                         │
//! │  ┌─────────────┐         ┌─────────────┐         ┌─────────────┐       │
//! │  │  Customer   │◄────────│    Sale     │────────►│  SaleItem   │       │
//! │  │             │   1:N   │             │   1:N   │             │       │
//! │  │ name        │         │ sale_date   │         │ snack_id    │       │
//! │  │ phone       │         │ is_paid     │         │ quantity    │       │
//! │  │ credit      │         │ is_active   │         │ unit_price  │       │
//! │  └──────┬──────┘         └──────┬──────┘         │ discount    │       │
//! │         │ 1:N                   │ 1:N            │ total       │       │
//! │         ▼                       ▼                └─────────────┘       │
//! │  ┌─────────────┐         ┌─────────────┐                               │
//! │  │CustomerCredit│        │ SalePayment │──► PaymentMethod | StoreCredit│
//! │  │ Credit/Debit │        │ amount      │                               │
//! │  └─────────────┘         └─────────────┘                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Derived, Never Stored
//! `Sale::total_amount`, `Sale::paid_amount` and `Sale::remaining_amount` are
//! computed from the items and payments every time. Only the line-level
//! amounts are persisted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::validation::format_phone;

// =============================================================================
// Customer
// =============================================================================

/// A customer who buys snacks, possibly on credit ("fiado").
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, unique case-insensitively.
    pub name: String,

    /// WhatsApp number, digits only.
    pub phone: Option<String>,

    /// Whether the customer is active (soft delete).
    pub is_active: bool,

    /// Cached store credit balance in cents.
    ///
    /// The ledger is authoritative; this mirrors it for listing screens.
    pub credit_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Returns the cached credit balance as Money.
    #[inline]
    pub fn cached_credit(&self) -> Money {
        Money::from_cents(self.credit_cents)
    }

    /// Phone rendered for display, e.g. `(11) 98765-4321`.
    pub fn formatted_phone(&self) -> Option<String> {
        self.phone.as_deref().map(format_phone)
    }
}

/// Input for registering a customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
}

// =============================================================================
// Snack
// =============================================================================

/// A catalog item.
///
/// Price changes never touch past sale items; those keep their own snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Snack {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Unit price in cents (>= 0).
    pub price_cents: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Snack {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// Input for adding a snack to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSnack {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
}

// =============================================================================
// Payment Method
// =============================================================================

/// A way of paying (cash, PIX, card, ...).
///
/// Inactive methods cannot be used for new payments but stay valid for the
/// payments already recorded with them.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PaymentMethod {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Payment Source
// =============================================================================

/// Where the money of a sale payment came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "payment_method_id", rename_all = "snake_case")]
pub enum PaymentSource {
    /// A registered payment method.
    Method(String),
    /// The customer's store credit balance.
    StoreCredit,
}

impl PaymentSource {
    /// Storage tag for the `source` column.
    pub const fn kind(&self) -> &'static str {
        match self {
            PaymentSource::Method(_) => "method",
            PaymentSource::StoreCredit => "store_credit",
        }
    }

    pub fn method_id(&self) -> Option<&str> {
        match self {
            PaymentSource::Method(id) => Some(id),
            PaymentSource::StoreCredit => None,
        }
    }

    /// Rebuilds a source from its stored tag and method id.
    pub fn from_parts(kind: &str, method_id: Option<String>) -> Option<PaymentSource> {
        match (kind, method_id) {
            ("method", Some(id)) => Some(PaymentSource::Method(id)),
            ("store_credit", None) => Some(PaymentSource::StoreCredit),
            _ => None,
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale to one customer with its items and payments.
///
/// ## Lifecycle
/// ```text
/// create_sale ──► unpaid ──apply_payment (partial)──► unpaid (less remaining)
///                   │                                      │
///                   └──apply_payment / receive_bulk──► is_paid = true
///
/// cancel_sale (any state) ──► is_active = false  (items/payments kept)
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub customer_id: String,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    pub is_paid: bool,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
    /// False once the sale is cancelled.
    pub is_active: bool,
    pub items: Vec<SaleItem>,
    pub payments: Vec<SalePayment>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Σ item `total_amount`.
    pub fn total_amount(&self) -> Money {
        self.items.iter().map(SaleItem::total_amount).sum()
    }

    /// Σ payment `amount`.
    pub fn paid_amount(&self) -> Money {
        self.payments.iter().map(SalePayment::amount).sum()
    }

    /// What is still owed, never negative.
    pub fn remaining_amount(&self) -> Money {
        (self.total_amount() - self.paid_amount()).non_negative()
    }

    /// Active and not yet paid: counts as receivable debt.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.is_active && !self.is_paid
    }
}

/// A line item in a sale.
///
/// `unit_price_cents`, `discount_cents` and `total_amount_cents` are supplied
/// by the caller at creation time and stored as given.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub snack_id: String,
    pub quantity: i64,
    /// Catalog price at the time of sale (frozen).
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    /// `unit_price × quantity − discount`.
    pub total_amount_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    /// Pre-discount line value.
    #[inline]
    pub fn gross_amount(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

/// A payment towards a sale. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalePayment {
    pub id: String,
    pub sale_id: String,
    pub source: PaymentSource,
    /// Amount paid in cents (> 0).
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SalePayment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Store Credit Ledger
// =============================================================================

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CreditType {
    /// Balance granted to the customer.
    Credit,
    /// Balance consumed by the customer.
    Debit,
}

/// One append-only entry of a customer's store credit ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CustomerCredit {
    pub id: String,
    pub customer_id: String,
    /// Positive magnitude in cents; the sign comes from `credit_type`.
    pub amount_cents: i64,
    pub credit_type: CreditType,
    pub description: String,
    #[ts(as = "String")]
    pub reference_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CustomerCredit {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Amount with the ledger sign applied (Credit +, Debit −).
    pub fn signed_amount(&self) -> Money {
        match self.credit_type {
            CreditType::Credit => self.amount(),
            CreditType::Debit => -self.amount(),
        }
    }
}

// =============================================================================
// Operation Inputs
// =============================================================================

/// One payment-method/amount pair submitted by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentLine {
    pub payment_method_id: String,
    pub amount_cents: i64,
}

impl PaymentLine {
    pub fn new(payment_method_id: impl Into<String>, amount_cents: i64) -> Self {
        PaymentLine {
            payment_method_id: payment_method_id.into(),
            amount_cents,
        }
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// An item of a sale being created.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSaleItem {
    pub snack_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub discount_cents: i64,
    pub total_amount_cents: i64,
}

/// Input of `create_sale`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub customer_id: String,
    pub items: Vec<NewSaleItem>,
    /// Defaults to now.
    #[ts(as = "Option<String>")]
    pub sale_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub payments: Vec<PaymentLine>,
}

/// Input of `apply_payment`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentRequest {
    /// Defaults to now.
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payments: Vec<PaymentLine>,
    /// Store credit to consume towards the sale, in cents.
    pub use_credit_cents: Option<i64>,
}

/// Input of `receive_bulk`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BulkReceipt {
    pub customer_id: String,
    /// Must equal the sum of `payments`.
    pub total_received_cents: i64,
    pub payments: Vec<PaymentLine>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
}

/// Inclusive calendar-date filter used by the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "Option<String>")]
    pub start: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateRange { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

// =============================================================================
// Operation Outputs
// =============================================================================

/// A sale closed by a bulk receipt.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettledSale {
    pub sale_id: String,
    pub amount_cents: i64,
}

/// Result of `receive_bulk`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BulkReceiptResult {
    pub customer_id: String,
    pub settled: Vec<SettledSale>,
    /// Store credit granted from the receipt (0 when everything was used).
    pub credit_granted_cents: i64,
    pub credit_entry: Option<CustomerCredit>,
}

/// Outstanding debt of one customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerDebt {
    pub customer_id: String,
    pub name: String,
    /// Formatted for display.
    pub phone: Option<String>,
    pub total_debt_cents: i64,
    pub unpaid_count: i64,
    #[ts(as = "String")]
    pub oldest_sale_date: DateTime<Utc>,
}

/// A customer whose cached credit disagreed with the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreditDrift {
    pub customer_id: String,
    pub cached_cents: i64,
    pub ledger_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
