use super::order::Resolution;
use rust_decimal::Decimal;

/// Status of an order as reported by the accrual oracle.
///
/// The accrued amount is carried by `Processed` only, so a verdict can never
/// have an amount without being final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualStatus {
    Registered,
    Processing,
    Invalid,
    Processed(Decimal),
}

impl From<AccrualStatus> for Resolution {
    fn from(status: AccrualStatus) -> Self {
        match status {
            AccrualStatus::Registered | AccrualStatus::Processing => Resolution::processing(),
            AccrualStatus::Invalid => Resolution::invalid(),
            AccrualStatus::Processed(accrual) => Resolution::processed(accrual),
        }
    }
}
