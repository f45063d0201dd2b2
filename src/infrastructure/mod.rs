//! Adapters implementing the domain ports.

pub mod accrual_http;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
