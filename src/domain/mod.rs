//! Domain layer: ledger records, their state machine and the ports the
//! application layer talks through.

pub mod balance;
pub mod luhn;
pub mod oracle;
pub mod order;
pub mod ports;
pub mod withdrawal;
