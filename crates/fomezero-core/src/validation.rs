//! # Validation Module
//!
//! Input validation for the receivables engine. Everything here runs before
//! any row is written.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Admin SPA                                                     │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: fomezero-receivables services                                │
//! │  └── THIS MODULE: shape of the request (names, amounts, items)         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (customer name, phone)                                     │
//! │  ├── CHECK (amount_cents > 0)                                          │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{NewSaleItem, PaymentLine};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

fn validate_name(field: &str, name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Validates a customer name and returns it trimmed.
///
/// ```rust
/// use fomezero_core::validation::validate_customer_name;
///
/// assert_eq!(validate_customer_name("  Maria ").unwrap(), "Maria");
/// assert!(validate_customer_name("   ").is_err());
/// ```
pub fn validate_customer_name(name: &str) -> ValidationResult<String> {
    validate_name("name", name)
}

/// Uniqueness key for a customer name: trimmed and lowercased with full
/// Unicode case folding, so "JOÃO" and "joão" collide.
///
/// ```rust
/// use fomezero_core::validation::customer_name_key;
///
/// assert_eq!(customer_name_key(" JOÃO "), customer_name_key("joão"));
/// ```
pub fn customer_name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Validates a snack name and returns it trimmed.
pub fn validate_snack_name(name: &str) -> ValidationResult<String> {
    validate_name("name", name)
}

/// Validates a payment method name and returns it trimmed.
pub fn validate_payment_method_name(name: &str) -> ValidationResult<String> {
    validate_name("name", name)
}

/// Validates a ledger description and returns it trimmed.
pub fn validate_description(description: &str) -> ValidationResult<String> {
    let description = description.trim();

    if description.is_empty() {
        return Err(ValidationError::Required {
            field: "description".to_string(),
        });
    }

    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }

    Ok(description.to_string())
}

/// Validates a UUID string.
pub fn validate_uuid(field: &str, value: &str) -> ValidationResult<()> {
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|e| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: e.to_string(),
        })
}

// =============================================================================
// Phone Numbers
// =============================================================================

/// Keeps only the digits of a phone number. Blank input means "no phone".
///
/// ```rust
/// use fomezero_core::validation::normalize_phone;
///
/// assert_eq!(normalize_phone("(11) 98765-4321"), Some("11987654321".to_string()));
/// assert_eq!(normalize_phone(" - "), None);
/// ```
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Renders a digits-only phone for display.
///
/// - 11 digits: `(XX) XXXXX-XXXX` (mobile)
/// - 10 digits: `(XX) XXXX-XXXX` (landline)
/// - anything else is returned as given
pub fn format_phone(digits: &str) -> String {
    let all_digits = digits.chars().all(|c| c.is_ascii_digit());
    match digits.len() {
        11 if all_digits => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
        10 if all_digits => format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..]),
        _ => digits.to_string(),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Quantity must be a positive integer.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Prices may be zero (free items) but never negative.
pub fn validate_price(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Payment and credit amounts are strictly positive.
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Adds `amount` to a running total, failing instead of overflowing.
pub fn checked_total(field: &str, total: Money, amount: Money) -> ValidationResult<Money> {
    total.checked_add(amount).ok_or_else(|| ValidationError::OutOfRange {
        field: field.to_string(),
    })
}

/// `unit_price × quantity`, failing instead of overflowing.
pub fn checked_subtotal(unit_price: Money, quantity: i64) -> ValidationResult<Money> {
    unit_price
        .checked_multiply_quantity(quantity)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "subtotal".to_string(),
        })
}

/// Validates the item list of a new sale.
///
/// ## Rules
/// - At least one item
/// - Each quantity positive, prices/discount/total non-negative
/// - Subtotals and the sale total fit in the cent range
///
/// The line totals themselves are caller-computed and stored as given.
pub fn validate_sale_items(items: &[NewSaleItem]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }

    let mut gross = Money::zero();
    let mut total = Money::zero();
    for item in items {
        if item.snack_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "snack_id".to_string(),
            });
        }
        validate_quantity(item.quantity)?;
        validate_price("unit_price", item.unit_price_cents)?;
        validate_price("discount", item.discount_cents)?;
        validate_price("total_amount", item.total_amount_cents)?;

        let subtotal = checked_subtotal(Money::from_cents(item.unit_price_cents), item.quantity)?;
        gross = checked_total("subtotal", gross, subtotal)?;
        total = checked_total("total_amount", total, Money::from_cents(item.total_amount_cents))?;
    }

    Ok(())
}

/// Validates submitted payment lines and returns their sum.
pub fn validate_payment_lines(lines: &[PaymentLine]) -> ValidationResult<Money> {
    let mut total = Money::zero();
    for line in lines {
        if line.payment_method_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "payment_method_id".to_string(),
            });
        }
        validate_amount("payment amount", line.amount())?;
        total = checked_total("payments", total, line.amount())?;
    }
    Ok(total)
}

// =============================================================================
// Unit Tests
// =============================================================================
