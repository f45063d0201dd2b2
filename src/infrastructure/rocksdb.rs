use crate::domain::balance::Balance;
use crate::domain::order::{CustomerId, InsertOutcome, Order, OrderNumber, Resolution};
use crate::domain::ports::LedgerStore;
use crate::domain::withdrawal::{Amount, Withdrawal, WithdrawalOutcome};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Column Family for storing orders, keyed by order number.
pub const CF_ORDERS: &str = "orders";
/// Column Family for storing withdrawals, keyed by a big-endian sequence.
pub const CF_WITHDRAWALS: &str = "withdrawals";

/// A persistent ledger implementation using RocksDB.
///
/// Orders and withdrawals are kept in separate Column Families as JSON values.
/// RocksDB has no multi-key check-and-set, so every mutating operation is
/// serialized through `write_gate`; reads go straight to the database.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbLedgerStore {
    db: Arc<DB>,
    write_gate: Arc<Mutex<()>>,
    next_withdrawal: Arc<AtomicU64>,
}

impl RocksDbLedgerStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("orders" and "withdrawals")
    /// exist and resumes the withdrawal sequence after the last stored key.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_orders = ColumnFamilyDescriptor::new(CF_ORDERS, Options::default());
        let cf_withdrawals = ColumnFamilyDescriptor::new(CF_WITHDRAWALS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_orders, cf_withdrawals])?;

        let next_withdrawal = {
            let cf = Self::cf(&db, CF_WITHDRAWALS)?;
            match db.iterator_cf(cf, IteratorMode::End).next() {
                Some(item) => {
                    let (key, _) = item?;
                    decode_sequence(&key)? + 1
                }
                None => 0,
            }
        };

        Ok(Self {
            db: Arc::new(db),
            write_gate: Arc::new(Mutex::new(())),
            next_withdrawal: Arc::new(AtomicU64::new(next_withdrawal)),
        })
    }

    fn cf<'a>(db: &'a DB, name: &str) -> Result<&'a ColumnFamily> {
        db.cf_handle(name).ok_or_else(|| {
            LedgerError::StorageError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn put<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = Self::cf(&self.db, cf_name)?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(cf, key, bytes)?;
        Ok(())
    }

    fn get_order_record(&self, number: &OrderNumber) -> Result<Option<Order>> {
        let cf = Self::cf(&self.db, CF_ORDERS)?;
        match self.db.get_cf(cf, number.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = Self::cf(&self.db, cf_name)?;
        decode_all(self.db.iterator_cf(cf, IteratorMode::Start))
    }

    fn orders_of(&self, owner: &CustomerId) -> Result<Vec<Order>> {
        let mut orders = owned_by(self.scan::<Order>(CF_ORDERS)?, owner, |o| &o.owner);
        orders.sort_by_key(|o| o.uploaded_at);
        Ok(orders)
    }

    fn withdrawals_of(&self, owner: &CustomerId) -> Result<Vec<Withdrawal>> {
        // Sequence keys already iterate in commit order.
        Ok(owned_by(self.scan(CF_WITHDRAWALS)?, owner, |w| &w.owner))
    }

    /// Reads both column families from one snapshot so a concurrent
    /// resolution or withdrawal is seen either entirely or not at all.
    fn balance_of(&self, owner: &CustomerId) -> Result<Balance> {
        let snapshot = self.db.snapshot();
        let orders_cf = Self::cf(&self.db, CF_ORDERS)?;
        let withdrawals_cf = Self::cf(&self.db, CF_WITHDRAWALS)?;

        let orders: Vec<Order> = decode_all(snapshot.iterator_cf(orders_cf, IteratorMode::Start))?;
        let withdrawals: Vec<Withdrawal> =
            decode_all(snapshot.iterator_cf(withdrawals_cf, IteratorMode::Start))?;

        Ok(Balance::calculate(
            orders.iter().filter(|o| &o.owner == owner),
            withdrawals.iter().filter(|w| &w.owner == owner),
        ))
    }
}

type RawEntry = std::result::Result<(Box<[u8]>, Box<[u8]>), rocksdb::Error>;

fn decode_all<T: DeserializeOwned>(entries: impl Iterator<Item = RawEntry>) -> Result<Vec<T>> {
    let mut records = Vec::new();
    for item in entries {
        let (_key, value) = item?;
        records.push(serde_json::from_slice(&value)?);
    }
    Ok(records)
}

fn owned_by<T>(records: Vec<T>, owner: &CustomerId, key: impl Fn(&T) -> &CustomerId) -> Vec<T> {
    records.into_iter().filter(|r| key(r) == owner).collect()
}

fn decode_sequence(key: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = key.try_into().map_err(|_| {
        LedgerError::StorageError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("withdrawal key has {} bytes, expected 8", key.len()),
        )))
    })?;
    Ok(u64::from_be_bytes(bytes))
}

#[async_trait]
impl LedgerStore for RocksDbLedgerStore {
    async fn insert_order_if_absent(
        &self,
        number: &OrderNumber,
        owner: &CustomerId,
    ) -> Result<InsertOutcome> {
        let _guard = self.write_gate.lock().await;

        if let Some(existing) = self.get_order_record(number)? {
            return Ok(if &existing.owner == owner {
                InsertOutcome::OwnedByCaller
            } else {
                InsertOutcome::OwnedByOther
            });
        }

        let order = Order::new(number.clone(), owner.clone(), Utc::now());
        self.put(CF_ORDERS, number.as_str().as_bytes(), &order)?;
        Ok(InsertOutcome::Created)
    }

    async fn list_orders(&self, owner: &CustomerId) -> Result<Vec<Order>> {
        self.orders_of(owner)
    }

    async fn get_order(&self, number: &OrderNumber) -> Result<Option<Order>> {
        self.get_order_record(number)
    }

    async fn list_unresolved_orders(&self) -> Result<Vec<OrderNumber>> {
        Ok(self
            .scan::<Order>(CF_ORDERS)?
            .into_iter()
            .filter(|o| !o.status.is_terminal())
            .map(|o| o.number)
            .collect())
    }

    async fn apply_resolution(
        &self,
        number: &OrderNumber,
        resolution: Resolution,
    ) -> Result<bool> {
        let _guard = self.write_gate.lock().await;

        let mut order = self
            .get_order_record(number)?
            .ok_or_else(|| LedgerError::OrderNotFound(number.clone()))?;
        if !order.apply_resolution(resolution) {
            return Ok(false);
        }
        self.put(CF_ORDERS, number.as_str().as_bytes(), &order)?;
        Ok(true)
    }

    async fn record_withdrawal(
        &self,
        owner: &CustomerId,
        order_reference: &OrderNumber,
        sum: Amount,
    ) -> Result<WithdrawalOutcome> {
        let _guard = self.write_gate.lock().await;

        if !self.balance_of(owner)?.covers(sum.value()) {
            return Ok(WithdrawalOutcome::InsufficientBalance);
        }

        let withdrawal = Withdrawal::new(owner.clone(), order_reference.clone(), sum, Utc::now());
        let key = self.next_withdrawal.fetch_add(1, Ordering::SeqCst).to_be_bytes();
        self.put(CF_WITHDRAWALS, &key, &withdrawal)?;
        Ok(WithdrawalOutcome::Committed)
    }

    async fn list_withdrawals(&self, owner: &CustomerId) -> Result<Vec<Withdrawal>> {
        self.withdrawals_of(owner)
    }

    async fn get_balance(&self, owner: &CustomerId) -> Result<Balance> {
        self.balance_of(owner)
    }
}
