use super::order::{CustomerId, OrderNumber};
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Represents a positive number of points to debit.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, LedgerError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// A committed debit of points against an order-like reference.
///
/// The reference only has to be a well-formed order number; it does not have to
/// name an order that was uploaded to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub order_reference: OrderNumber,
    pub owner: CustomerId,
    pub sum: Decimal,
    pub processed_at: DateTime<Utc>,
}

impl Withdrawal {
    pub fn new(
        owner: CustomerId,
        order_reference: OrderNumber,
        sum: Amount,
        processed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_reference,
            owner,
            sum: sum.value(),
            processed_at,
        }
    }
}

/// Result of an atomic balance-checked debit on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalOutcome {
    Committed,
    InsufficientBalance,
}
