use crate::domain::balance::Balance;
use crate::domain::order::{CustomerId, InsertOutcome, Order, OrderNumber};
use crate::domain::ports::LedgerStoreRef;
use crate::domain::withdrawal::{Amount, Withdrawal, WithdrawalOutcome};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;

/// Outcome of [`LoyaltyService::upload_order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadOutcome {
    Accepted,
    AlreadyUploadedByCaller,
    ConflictOtherOwner,
    Invalid,
}

impl From<InsertOutcome> for UploadOutcome {
    fn from(outcome: InsertOutcome) -> Self {
        match outcome {
            InsertOutcome::Created => UploadOutcome::Accepted,
            InsertOutcome::OwnedByCaller => UploadOutcome::AlreadyUploadedByCaller,
            InsertOutcome::OwnedByOther => UploadOutcome::ConflictOtherOwner,
        }
    }
}

/// Outcome of [`LoyaltyService::withdraw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawOutcome {
    Committed,
    InsufficientBalance,
    /// The order reference failed the Luhn check or the sum was not positive.
    Invalid,
}

impl From<WithdrawalOutcome> for WithdrawOutcome {
    fn from(outcome: WithdrawalOutcome) -> Self {
        match outcome {
            WithdrawalOutcome::Committed => WithdrawOutcome::Committed,
            WithdrawalOutcome::InsufficientBalance => WithdrawOutcome::InsufficientBalance,
        }
    }
}

/// Entry point used by request handlers.
///
/// Validates raw input, then delegates to the shared [`LedgerStore`] which owns
/// all atomicity guarantees. Storage faults are propagated unchanged.
///
/// [`LedgerStore`]: crate::domain::ports::LedgerStore
#[derive(Clone)]
pub struct LoyaltyService {
    store: LedgerStoreRef,
}

impl LoyaltyService {
    pub fn new(store: LedgerStoreRef) -> Self {
        Self { store }
    }

    pub async fn upload_order(
        &self,
        owner: &CustomerId,
        raw_number: &str,
    ) -> Result<UploadOutcome> {
        let Some(number) = OrderNumber::parse(raw_number) else {
            tracing::debug!(%owner, number = raw_number, "rejected order number");
            return Ok(UploadOutcome::Invalid);
        };

        let outcome = self.store.insert_order_if_absent(&number, owner).await?;
        tracing::debug!(%owner, order = %number, ?outcome, "order upload");
        Ok(outcome.into())
    }

    pub async fn list_orders(&self, owner: &CustomerId) -> Result<Vec<Order>> {
        self.store.list_orders(owner).await
    }

    /// Looks an order up by its raw number; malformed numbers are never stored,
    /// so they yield `None` without touching the ledger.
    pub async fn get_order(&self, raw_number: &str) -> Result<Option<Order>> {
        match OrderNumber::parse(raw_number) {
            Some(number) => self.store.get_order(&number).await,
            None => Ok(None),
        }
    }

    pub async fn list_withdrawals(&self, owner: &CustomerId) -> Result<Vec<Withdrawal>> {
        self.store.list_withdrawals(owner).await
    }

    pub async fn get_balance(&self, owner: &CustomerId) -> Result<Balance> {
        self.store.get_balance(owner).await
    }

    pub async fn withdraw(
        &self,
        owner: &CustomerId,
        raw_reference: &str,
        sum: Decimal,
    ) -> Result<WithdrawOutcome> {
        let Some(reference) = OrderNumber::parse(raw_reference) else {
            return Ok(WithdrawOutcome::Invalid);
        };
        let Ok(sum) = Amount::new(sum) else {
            return Ok(WithdrawOutcome::Invalid);
        };

        let outcome = self.store.record_withdrawal(owner, &reference, sum).await?;
        tracing::info!(%owner, order = %reference, sum = %sum.value(), ?outcome, "withdrawal");
        Ok(outcome.into())
    }
}
