//! # Catalog
//!
//! Customers, snacks and payment methods: the collaborators the settlement
//! rules look things up in. Plain validated CRUD; nothing here touches money
//! already owed.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::ReceivablesResult;
use crate::Receivables;
use fomezero_core::validation::{
    normalize_phone, validate_customer_name, validate_description, validate_payment_method_name,
    validate_price, validate_snack_name,
};
use fomezero_core::{
    CoreError, Customer, NewCustomer, NewSnack, PaymentMethod, Snack, ValidationError,
};

impl Receivables {
    // =========================================================================
    // Customers
    // =========================================================================

    /// Registers a customer.
    ///
    /// The name is trimmed and must be unique ignoring case. The phone is
    /// reduced to its digits (blank means none) and must be unique too.
    pub async fn register_customer(&self, request: NewCustomer) -> ReceivablesResult<Customer> {
        let name = validate_customer_name(&request.name)?;
        let phone = request.phone.as_deref().and_then(normalize_phone);

        if self.db.customers().find_by_name(&name).await?.is_some() {
            return Err(ValidationError::Duplicate {
                field: "name".to_string(),
                value: name,
            }
            .into());
        }
        if let Some(ref digits) = phone {
            if self.db.customers().find_by_phone(digits).await?.is_some() {
                return Err(ValidationError::Duplicate {
                    field: "phone".to_string(),
                    value: digits.clone(),
                }
                .into());
            }
        }

        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name,
            phone,
            is_active: true,
            credit_cents: 0,
            created_at: now,
            updated_at: now,
        };
        self.db.customers().insert(&customer).await?;

        info!(customer_id = %customer.id, name = %customer.name, "Customer registered");
        Ok(customer)
    }

    /// Gets a customer, active or not.
    pub async fn customer(&self, customer_id: &str) -> ReceivablesResult<Customer> {
        self.db
            .customers()
            .get_by_id(customer_id)
            .await?
            .ok_or_else(|| CoreError::CustomerNotFound(customer_id.to_string()).into())
    }

    /// Active customers ordered by name.
    pub async fn active_customers(&self) -> ReceivablesResult<Vec<Customer>> {
        Ok(self.db.customers().list_active().await?)
    }

    /// Soft-deletes or restores a customer. Their sales and credit stay.
    pub async fn set_customer_active(&self, customer_id: &str, active: bool) -> ReceivablesResult<()> {
        self.db.customers().set_active(customer_id, active).await?;
        info!(customer_id = %customer_id, active, "Customer status changed");
        Ok(())
    }

    // =========================================================================
    // Snacks
    // =========================================================================

    /// Adds a snack to the catalog.
    pub async fn add_snack(&self, request: NewSnack) -> ReceivablesResult<Snack> {
        let name = validate_snack_name(&request.name)?;
        validate_price("price", request.price_cents)?;
        let description = match request.description.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Some(validate_description(text)?),
            _ => None,
        };

        let now = Utc::now();
        let snack = Snack {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            price_cents: request.price_cents,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.db.snacks().insert(&snack).await?;

        info!(snack_id = %snack.id, name = %snack.name, price = snack.price_cents, "Snack added");
        Ok(snack)
    }

    /// Active snacks ordered by name.
    pub async fn active_snacks(&self) -> ReceivablesResult<Vec<Snack>> {
        Ok(self.db.snacks().list_active().await?)
    }

    /// Changes a snack's catalog price. Past sale items keep theirs.
    pub async fn update_snack_price(&self, snack_id: &str, price_cents: i64) -> ReceivablesResult<()> {
        validate_price("price", price_cents)?;
        self.db.snacks().update_price(snack_id, price_cents).await?;
        Ok(())
    }

    pub async fn set_snack_active(&self, snack_id: &str, active: bool) -> ReceivablesResult<()> {
        self.db.snacks().set_active(snack_id, active).await?;
        Ok(())
    }

    // =========================================================================
    // Payment Methods
    // =========================================================================

    /// Adds a payment method. Names are unique ignoring case.
    pub async fn add_payment_method(&self, name: &str) -> ReceivablesResult<PaymentMethod> {
        let name = validate_payment_method_name(name)?;

        if self.db.payment_methods().find_by_name(&name).await?.is_some() {
            return Err(ValidationError::Duplicate {
                field: "name".to_string(),
                value: name,
            }
            .into());
        }

        let method = PaymentMethod {
            id: Uuid::new_v4().to_string(),
            name,
            is_active: true,
            created_at: Utc::now(),
        };
        self.db.payment_methods().insert(&method).await?;

        info!(payment_method_id = %method.id, name = %method.name, "Payment method added");
        Ok(method)
    }

    /// Methods offered for new payments.
    pub async fn active_payment_methods(&self) -> ReceivablesResult<Vec<PaymentMethod>> {
        Ok(self.db.payment_methods().list_active().await?)
    }

    /// Deactivated methods reject new payments; recorded ones stay valid.
    pub async fn set_payment_method_active(
        &self,
        payment_method_id: &str,
        active: bool,
    ) -> ReceivablesResult<()> {
        self.db
            .payment_methods()
            .set_active(payment_method_id, active)
            .await?;
        info!(payment_method_id = %payment_method_id, active, "Payment method status changed");
        Ok(())
    }
}
