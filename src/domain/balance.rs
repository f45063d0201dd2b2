use super::order::{Order, OrderStatus};
use super::withdrawal::Withdrawal;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A customer's point balance, always derived from the ledger records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balance {
    pub current: Decimal,
    pub withdrawn: Decimal,
}

impl Balance {
    pub const ZERO: Self = Self {
        current: Decimal::ZERO,
        withdrawn: Decimal::ZERO,
    };

    /// Sums the accrual of `PROCESSED` orders and the withdrawn points.
    ///
    /// Callers pass only the records owned by one customer. Empty inputs yield
    /// [`Balance::ZERO`].
    pub fn calculate<'a>(
        orders: impl IntoIterator<Item = &'a Order>,
        withdrawals: impl IntoIterator<Item = &'a Withdrawal>,
    ) -> Self {
        let accrued: Decimal = orders
            .into_iter()
            .filter(|order| order.status == OrderStatus::Processed)
            .map(|order| order.accrual)
            .sum();
        let withdrawn: Decimal = withdrawals.into_iter().map(|w| w.sum).sum();

        Self {
            current: accrued - withdrawn,
            withdrawn,
        }
    }

    pub fn covers(&self, sum: Decimal) -> bool {
        self.current >= sum
    }
}
