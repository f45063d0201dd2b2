#![allow(dead_code)]

use async_trait::async_trait;
use loyalty_ledger::domain::oracle::AccrualStatus;
use loyalty_ledger::domain::order::{CustomerId, OrderNumber, Resolution};
use loyalty_ledger::domain::ports::{AccrualOracle, LedgerStore};
use loyalty_ledger::error::OracleError;
use rand::Rng;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Oracle whose verdicts are set by the test; unknown orders are `NotFound`.
#[derive(Default)]
pub struct ScriptedOracle {
    verdicts: Mutex<HashMap<String, Result<AccrualStatus, OracleError>>>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, number: &str, verdict: Result<AccrualStatus, OracleError>) {
        self.verdicts
            .lock()
            .unwrap()
            .insert(number.to_string(), verdict);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccrualOracle for ScriptedOracle {
    async fn resolve(&self, number: &OrderNumber) -> Result<AccrualStatus, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdicts
            .lock()
            .unwrap()
            .get(number.as_str())
            .cloned()
            .unwrap_or(Err(OracleError::NotFound))
    }
}

/// Appends the Luhn check digit to `payload`.
pub fn with_check_digit(payload: &str) -> String {
    let sum: u32 = payload
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let mut d = u32::from(b - b'0');
            // The check digit will take position 0, so doubling starts at the
            // payload's rightmost digit.
            if i % 2 == 0 {
                d *= 2;
                if d > 9 {
                    d -= 9;
                }
            }
            d
        })
        .sum();
    format!("{payload}{}", (10 - sum % 10) % 10)
}

/// A random Luhn-valid number with `len` digits (including the check digit).
pub fn random_order_number(len: usize) -> String {
    let mut rng = rand::thread_rng();
    let payload: String = (0..len - 1)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect();
    with_check_digit(&payload)
}

pub fn number(raw: &str) -> OrderNumber {
    OrderNumber::parse(raw).expect("test order number must be Luhn-valid")
}

/// Uploads `raw` for `owner` and marks it `PROCESSED` with `accrual`.
pub async fn credit(store: &dyn LedgerStore, owner: &CustomerId, raw: &str, accrual: Decimal) {
    let n = number(raw);
    store.insert_order_if_absent(&n, owner).await.unwrap();
    store
        .apply_resolution(&n, Resolution::processed(accrual))
        .await
        .unwrap();
}
