//! # Repository Module
//!
//! Database repository implementations for Fome Zero.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two Ways In                                          │
//! │                                                                         │
//! │  Plain reads / single writes            Transactional steps            │
//! │  db.sales().get_by_id(id)               SaleRepository::get_in(        │
//! │       │                                     &mut *tx, id)              │
//! │       │ acquires its own connection          │ runs on the caller's    │
//! │       ▼                                      ▼ transaction             │
//! │  ┌──────────────────────────────────────────────────────────────┐      │
//! │  │        same SQL, written once in the `*_in` function         │      │
//! │  └──────────────────────────────────────────────────────────────┘      │
//! │                                                                         │
//! │  Services in fomezero-receivables open one transaction, call several   │
//! │  `*_in` functions on it, and commit once.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CustomerRepository`] - Customers, row locks, cached credit
//! - [`SnackRepository`] - Catalog
//! - [`PaymentMethodRepository`] - Payment methods
//! - [`SaleRepository`] - Sales with items and payments
//! - [`CreditRepository`] - Store credit ledger
//!
//! ## Locking
//! `lock_in` issues a no-op UPDATE on the row. SQLite grants its single
//! write lock to the first writer, so every read that follows in the same
//! transaction is fresh and a concurrent writer waits (busy timeout).

pub mod credit;
pub mod customer;
pub mod payment_method;
pub mod sale;
pub mod snack;

pub use credit::CreditRepository;
pub use customer::CustomerRepository;
pub use payment_method::PaymentMethodRepository;
pub use sale::SaleRepository;
pub use snack::SnackRepository;
