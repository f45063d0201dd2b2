//! Loyalty-point ledger with background reconciliation against an external
//! accrual oracle.
//!
//! - [`domain`]: orders, withdrawals, balances, the Luhn check and the
//!   `LedgerStore` / `AccrualOracle` ports.
//! - [`application`]: the `LoyaltyService` facade and the
//!   `ReconciliationDispatcher` background loop.
//! - [`infrastructure`]: in-memory and RocksDB ledgers, HTTP accrual client.
//! - [`interfaces`]: command-line surface.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
pub mod telemetry;
