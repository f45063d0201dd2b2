use crate::domain::order::OrderNumber;
use std::time::Duration;
use thiserror::Error;

/// System faults raised by the ledger and its storage backends.
///
/// Business outcomes (conflicting owner, insufficient balance, malformed order
/// numbers) are not errors; see the outcome enums in the domain layer.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Order not found: {0}")]
    OrderNotFound(OrderNumber),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    StorageError(Box<dyn std::error::Error + Send + Sync>),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDbError(#[from] rocksdb::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Non-answers from the accrual oracle.
///
/// These never leave the reconciliation dispatcher: an order whose lookup
/// fails is simply retried on the next cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The oracle has no record of the order yet.
    #[error("order is not registered in the accrual system")]
    NotFound,
    #[error("accrual system is rate limiting requests (retry after {retry_after:?})")]
    RateLimited { retry_after: Duration },
    #[error("accrual system request failed: {0}")]
    Transient(String),
    #[error("malformed accrual system response: {0}")]
    Malformed(String),
}
