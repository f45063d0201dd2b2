//! Application layer containing the core business logic orchestration.
//!
//! [`service::LoyaltyService`] is the facade request handlers call, and
//! [`dispatcher::ReconciliationDispatcher`] is the background task that
//! reconciles unresolved orders with the accrual oracle. Both are handed the
//! same shared ledger store by the process entry point.

pub mod dispatcher;
pub mod service;
