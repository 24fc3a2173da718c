//! # fomezero-core: Pure Business Logic for Fome Zero
//!
//! This crate holds the receivables rules of the Fome Zero snack shop as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Fome Zero Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Admin SPA + CRUD controllers                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            fomezero-receivables (transactions, config)          │   │
//! │  │   create_sale, apply_payment, receive_bulk, cancel_sale, ...    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ fomezero-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌────────────┐ ┌────────────┐ ┌─────────────┐   │   │
//! │  │   │  money   │ │ allocation │ │ settlement │ │  dashboard  │   │   │
//! │  │   │  Money   │ │  residual  │ │ single/FIFO│ │  rollups    │   │   │
//! │  │   └──────────┘ └────────────┘ └────────────┘ └─────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 fomezero-db (Database Layer)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Customer, Sale, SalePayment, CustomerCredit, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`allocation`] - Proportional splits by largest remainder
//! - [`settlement`] - Single-sale payment plans and the FIFO debt collector
//! - [`ledger`] - Store credit balance arithmetic
//! - [`access`] - Operator capabilities
//! - [`dashboard`] - Read-only reporting
//!
//! ## Example Usage
//!
//! ```rust
//! use fomezero_core::money::Money;
//! use fomezero_core::settlement::{plan_payment, PaymentPlan};
//! use fomezero_core::types::PaymentLine;
//!
//! let remaining = Money::from_cents(4000);
//! let lines = vec![PaymentLine::new("pix", 4000)];
//!
//! match plan_payment(remaining, &lines, None).unwrap() {
//!     PaymentPlan::Record { closes_sale, .. } => assert!(closes_sale),
//!     PaymentPlan::ManualOverride => unreachable!(),
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod allocation;
pub mod dashboard;
pub mod error;
pub mod ledger;
pub mod money;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use access::{Capability, Operator};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Percent, PAYMENT_TOLERANCE};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Unpaid sales older than this many days show up as old debts.
pub const DEFAULT_OVERDUE_DAYS: i64 = 30;

/// A customer with at least this many unpaid sales is high risk.
pub const HIGH_RISK_UNPAID_COUNT: i64 = 3;

/// A customer owing at least this much (R$ 100.00) is high risk.
pub const HIGH_RISK_DEBT_CENTS: i64 = 10_000;

/// Months in the rolling sales history (current month included).
pub const HISTORY_MONTHS: u32 = 6;

/// Ledger description for an unmatched bulk receipt.
pub const ADVANCE_PAYMENT_DESCRIPTION: &str = "Advance payment";

/// Ledger description for what is left after a bulk receipt settles sales.
pub const SETTLEMENT_CHANGE_DESCRIPTION: &str = "Change from settlement";

/// Ledger description for the refund of a cancelled sale.
pub const CANCELLATION_REVERSAL_DESCRIPTION: &str = "Reversal - sale cancellation";
