use super::balance::Balance;
use super::oracle::AccrualStatus;
use super::order::{CustomerId, InsertOutcome, Order, OrderNumber, Resolution};
use super::withdrawal::{Amount, Withdrawal, WithdrawalOutcome};
use crate::error::{OracleError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Durable record of orders and withdrawals.
///
/// Every mutating method is a single atomic unit; callers never combine a read
/// and a write to enforce an invariant.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Creates a `NEW` order unless one with the same number already exists.
    async fn insert_order_if_absent(
        &self,
        number: &OrderNumber,
        owner: &CustomerId,
    ) -> Result<InsertOutcome>;

    /// Orders owned by `owner`, oldest upload first.
    async fn list_orders(&self, owner: &CustomerId) -> Result<Vec<Order>>;

    async fn get_order(&self, number: &OrderNumber) -> Result<Option<Order>>;

    /// Numbers of all orders not yet `PROCESSED` or `INVALID`.
    async fn list_unresolved_orders(&self) -> Result<Vec<OrderNumber>>;

    /// Applies a resolution; returns `false` when the order was left as is
    /// (for example because it is already terminal).
    async fn apply_resolution(
        &self,
        number: &OrderNumber,
        resolution: Resolution,
    ) -> Result<bool>;

    /// Debits `sum` iff the owner's current balance covers it, checked and
    /// committed without any interleaving write for the same ledger.
    async fn record_withdrawal(
        &self,
        owner: &CustomerId,
        order_reference: &OrderNumber,
        sum: Amount,
    ) -> Result<WithdrawalOutcome>;

    /// Withdrawals made by `owner`, oldest first.
    async fn list_withdrawals(&self, owner: &CustomerId) -> Result<Vec<Withdrawal>>;

    async fn get_balance(&self, owner: &CustomerId) -> Result<Balance>;
}

/// The external scoring service deciding an order's accrual.
///
/// Implementations own their retry and timeout policy; the dispatcher only
/// retries on its next cycle.
#[async_trait]
pub trait AccrualOracle: Send + Sync {
    async fn resolve(
        &self,
        number: &OrderNumber,
    ) -> std::result::Result<AccrualStatus, OracleError>;
}

pub type LedgerStoreRef = Arc<dyn LedgerStore>;
pub type AccrualOracleRef = Arc<dyn AccrualOracle>;
