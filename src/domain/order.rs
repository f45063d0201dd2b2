use super::luhn;
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A Luhn-valid string of decimal digits identifying an order.
///
/// The only way to obtain one is through [`OrderNumber::parse`], so every value
/// that reaches the ledger has already passed the checksum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Returns `None` when `raw` is not a Luhn-valid digit string.
    pub fn parse(raw: &str) -> Option<Self> {
        luhn::is_valid(raw).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if luhn::is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(LedgerError::ValidationError(format!(
                "invalid order number: {value:?}"
            )))
        }
    }
}

impl From<OrderNumber> for String {
    fn from(number: OrderNumber) -> Self {
        number.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of the authenticated customer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//  NEW ──► PROCESSING ──► PROCESSED
//   │           │
//   └───────────┴──────► INVALID
//
// NEW may also jump straight to PROCESSED when the first verdict is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    New,
    Processing,
    Processed,
    Invalid,
}

impl OrderStatus {
    /// `PROCESSED` and `INVALID` are final: nothing moves an order out of them.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Processed | OrderStatus::Invalid)
    }
}

/// A status/accrual pair to be applied to an order by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub status: OrderStatus,
    pub accrual: Decimal,
}

impl Resolution {
    pub fn processing() -> Self {
        Self {
            status: OrderStatus::Processing,
            accrual: Decimal::ZERO,
        }
    }

    pub fn invalid() -> Self {
        Self {
            status: OrderStatus::Invalid,
            accrual: Decimal::ZERO,
        }
    }

    pub fn processed(accrual: Decimal) -> Self {
        Self {
            status: OrderStatus::Processed,
            accrual,
        }
    }
}

/// An order submitted for loyalty-point accrual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub number: OrderNumber,
    pub owner: CustomerId,
    pub status: OrderStatus,
    pub accrual: Decimal,
    pub uploaded_at: DateTime<Utc>,
}

impl Order {
    pub fn new(number: OrderNumber, owner: CustomerId, uploaded_at: DateTime<Utc>) -> Self {
        Self {
            number,
            owner,
            status: OrderStatus::New,
            accrual: Decimal::ZERO,
            uploaded_at,
        }
    }

    /// Applies a resolution, returning whether the order changed.
    ///
    /// Terminal orders are never touched, an order never goes back to `NEW`,
    /// and the accrual is only set together with `PROCESSED`.
    pub fn apply_resolution(&mut self, resolution: Resolution) -> bool {
        if self.status.is_terminal()
            || resolution.status == OrderStatus::New
            || resolution.status == self.status
        {
            return false;
        }

        self.status = resolution.status;
        self.accrual = if resolution.status == OrderStatus::Processed {
            resolution.accrual
        } else {
            Decimal::ZERO
        };
        true
    }
}

/// Result of an atomic insert-if-absent on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created,
    OwnedByCaller,
    OwnedByOther,
}
