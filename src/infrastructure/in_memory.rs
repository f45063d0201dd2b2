use crate::domain::balance::Balance;
use crate::domain::order::{CustomerId, InsertOutcome, Order, OrderNumber, Resolution};
use crate::domain::ports::LedgerStore;
use crate::domain::withdrawal::{Amount, Withdrawal, WithdrawalOutcome};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Ledger {
    /// Orders in upload order.
    orders: Vec<Order>,
    index: HashMap<OrderNumber, usize>,
    withdrawals: Vec<Withdrawal>,
}

impl Ledger {
    fn balance(&self, owner: &CustomerId) -> Balance {
        Balance::calculate(
            self.orders.iter().filter(|o| &o.owner == owner),
            self.withdrawals.iter().filter(|w| &w.owner == owner),
        )
    }
}

/// A thread-safe in-memory ledger.
///
/// Orders and withdrawals live behind one `Arc<RwLock<_>>`, so every mutating
/// operation runs under a single write guard and is atomic with respect to all
/// other operations. Ideal for testing or for runs where persistence is not
/// required.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    ledger: Arc<RwLock<Ledger>>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_order_if_absent(
        &self,
        number: &OrderNumber,
        owner: &CustomerId,
    ) -> Result<InsertOutcome> {
        let mut ledger = self.ledger.write().await;

        if let Some(&position) = ledger.index.get(number) {
            return Ok(if &ledger.orders[position].owner == owner {
                InsertOutcome::OwnedByCaller
            } else {
                InsertOutcome::OwnedByOther
            });
        }

        let position = ledger.orders.len();
        ledger
            .orders
            .push(Order::new(number.clone(), owner.clone(), Utc::now()));
        ledger.index.insert(number.clone(), position);
        Ok(InsertOutcome::Created)
    }

    async fn list_orders(&self, owner: &CustomerId) -> Result<Vec<Order>> {
        let ledger = self.ledger.read().await;
        Ok(ledger
            .orders
            .iter()
            .filter(|o| &o.owner == owner)
            .cloned()
            .collect())
    }

    async fn get_order(&self, number: &OrderNumber) -> Result<Option<Order>> {
        let ledger = self.ledger.read().await;
        Ok(ledger
            .index
            .get(number)
            .map(|&position| ledger.orders[position].clone()))
    }

    async fn list_unresolved_orders(&self) -> Result<Vec<OrderNumber>> {
        let ledger = self.ledger.read().await;
        Ok(ledger
            .orders
            .iter()
            .filter(|o| !o.status.is_terminal())
            .map(|o| o.number.clone())
            .collect())
    }

    async fn apply_resolution(
        &self,
        number: &OrderNumber,
        resolution: Resolution,
    ) -> Result<bool> {
        let mut ledger = self.ledger.write().await;
        let position = *ledger
            .index
            .get(number)
            .ok_or_else(|| LedgerError::OrderNotFound(number.clone()))?;
        Ok(ledger.orders[position].apply_resolution(resolution))
    }

    async fn record_withdrawal(
        &self,
        owner: &CustomerId,
        order_reference: &OrderNumber,
        sum: Amount,
    ) -> Result<WithdrawalOutcome> {
        let mut ledger = self.ledger.write().await;

        if !ledger.balance(owner).covers(sum.value()) {
            return Ok(WithdrawalOutcome::InsufficientBalance);
        }

        ledger.withdrawals.push(Withdrawal::new(
            owner.clone(),
            order_reference.clone(),
            sum,
            Utc::now(),
        ));
        Ok(WithdrawalOutcome::Committed)
    }

    async fn list_withdrawals(&self, owner: &CustomerId) -> Result<Vec<Withdrawal>> {
        let ledger = self.ledger.read().await;
        Ok(ledger
            .withdrawals
            .iter()
            .filter(|w| &w.owner == owner)
            .cloned()
            .collect())
    }

    async fn get_balance(&self, owner: &CustomerId) -> Result<Balance> {
        let ledger = self.ledger.read().await;
        Ok(ledger.balance(owner))
    }
}
