use crate::domain::oracle::AccrualStatus;
use crate::domain::order::OrderNumber;
use crate::domain::ports::AccrualOracle;
use crate::error::OracleError;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Body of a `200 OK` answer from the accrual system.
#[derive(Debug, Deserialize)]
struct OrderInfo {
    status: String,
    #[serde(default)]
    accrual: Option<Decimal>,
}

impl TryFrom<OrderInfo> for AccrualStatus {
    type Error = OracleError;

    fn try_from(info: OrderInfo) -> Result<Self, Self::Error> {
        match info.status.as_str() {
            "REGISTERED" => Ok(AccrualStatus::Registered),
            "PROCESSING" => Ok(AccrualStatus::Processing),
            "INVALID" => Ok(AccrualStatus::Invalid),
            "PROCESSED" => {
                let accrual = info.accrual.unwrap_or(Decimal::ZERO);
                if accrual < Decimal::ZERO {
                    return Err(OracleError::Malformed(format!(
                        "negative accrual {accrual}"
                    )));
                }
                Ok(AccrualStatus::Processed(accrual))
            }
            other => Err(OracleError::Malformed(format!("unknown status {other:?}"))),
        }
    }
}

/// Talks to the accrual system over HTTP (`GET /api/orders/{number}`).
///
/// `429 Too Many Requests` answers are retried here, honouring `Retry-After`,
/// up to `max_retries` times before giving up with
/// [`OracleError::RateLimited`]. Each wait is capped at `max_backoff`, which
/// defaults to the request timeout, so one lookup is bounded by roughly
/// `(max_retries + 1) * timeout + max_retries * max_backoff`.
#[derive(Clone)]
pub struct HttpAccrualOracle {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    max_backoff: Duration,
}

impl HttpAccrualOracle {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Transient(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries,
            max_backoff: timeout,
        })
    }

    /// Upper bound for a single `Retry-After` wait.
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    async fn fetch(&self, number: &OrderNumber) -> Result<AccrualStatus, OracleError> {
        let url = format!("{}/api/orders/{}", self.base_url, number);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| OracleError::Transient(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let info: OrderInfo = response
                    .json()
                    .await
                    .map_err(|e| OracleError::Malformed(e.to_string()))?;
                AccrualStatus::try_from(info)
            }
            StatusCode::NO_CONTENT => Err(OracleError::NotFound),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_RETRY_AFTER);
                Err(OracleError::RateLimited { retry_after })
            }
            status => Err(OracleError::Transient(format!(
                "unexpected status {status}"
            ))),
        }
    }
}

#[async_trait]
impl AccrualOracle for HttpAccrualOracle {
    async fn resolve(&self, number: &OrderNumber) -> Result<AccrualStatus, OracleError> {
        let mut attempt = 0;
        loop {
            match self.fetch(number).await {
                Err(OracleError::RateLimited { retry_after }) if attempt < self.max_retries => {
                    attempt += 1;
                    let backoff = retry_after.min(self.max_backoff);
                    tracing::debug!(
                        order = %number,
                        attempt,
                        ?retry_after,
                        ?backoff,
                        "accrual system rate limited, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                }
                result => return result,
            }
        }
    }
}
