//! # Operator Capabilities
//!
//! Every mutating receivables operation is performed on behalf of an
//! [`Operator`]. The operation names the [`Capability`] it needs and calls
//! [`Operator::require`] before touching any state.
//!
//! | Operation                         | Capability          |
//! |-----------------------------------|---------------------|
//! | create sale, apply payment, bulk  | `RecordPayment`     |
//! | mark paid with no payment lines   | `ManualSettlement`  |
//! | cancel sale                       | `CancelSale`        |
//! | add / use store credit            | `ManageCredit`      |

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// Something an operator is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Record sales and the payments made against them.
    RecordPayment,
    /// Mark a sale paid without any payment breakdown.
    ManualSettlement,
    /// Cancel a sale (refunding what was paid to store credit).
    CancelSale,
    /// Grant or consume store credit directly.
    ManageCredit,
}

impl Capability {
    /// Every capability, for administrator operators and seeding.
    pub const ALL: [Capability; 4] = [
        Capability::RecordPayment,
        Capability::ManualSettlement,
        Capability::CancelSale,
        Capability::ManageCredit,
    ];

    /// Permission code as stored by the admin user table.
    pub const fn code(&self) -> &'static str {
        match self {
            Capability::RecordPayment => "receivables.payment:record",
            Capability::ManualSettlement => "receivables.payment:override",
            Capability::CancelSale => "receivables.sale:cancel",
            Capability::ManageCredit => "receivables.credit:manage",
        }
    }

    /// Parses a permission code back into a capability.
    pub fn from_code(code: &str) -> Option<Capability> {
        Capability::ALL.into_iter().find(|c| c.code() == code)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::RecordPayment => "record_payment",
            Capability::ManualSettlement => "manual_settlement",
            Capability::CancelSale => "cancel_sale",
            Capability::ManageCredit => "manage_credit",
        };
        f.write_str(name)
    }
}

/// The authenticated caller of a receivables operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Operator {
    pub id: String,
    pub capabilities: Vec<Capability>,
}

impl Operator {
    pub fn new(id: impl Into<String>, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        let mut capabilities: Vec<Capability> = capabilities.into_iter().collect();
        capabilities.sort_by_key(|c| c.code());
        capabilities.dedup();
        Operator {
            id: id.into(),
            capabilities,
        }
    }

    /// An operator holding every capability.
    pub fn administrator(id: impl Into<String>) -> Self {
        Operator::new(id, Capability::ALL)
    }

    /// Builds an operator from stored permission codes, ignoring unknown ones.
    pub fn from_codes<'a>(id: impl Into<String>, codes: impl IntoIterator<Item = &'a str>) -> Self {
        Operator::new(id, codes.into_iter().filter_map(Capability::from_code))
    }

    #[inline]
    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Fails with `PermissionDenied` unless the operator holds `capability`.
    pub fn require(&self, capability: Capability) -> CoreResult<()> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(CoreError::PermissionDenied {
                operator_id: self.id.clone(),
                capability,
            })
        }
    }
}
