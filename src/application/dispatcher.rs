use crate::domain::order::{OrderNumber, Resolution};
use crate::domain::ports::{AccrualOracleRef, LedgerStoreRef};
use crate::error::{OracleError, Result};
use futures::StreamExt;
use futures::stream;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(10);

/// Per-cycle counters returned by [`ReconciliationDispatcher::run_cycle`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Unresolved orders found at the start of the cycle.
    pub examined: usize,
    /// Orders whose status or accrual changed.
    pub applied: usize,
    /// Orders the oracle answered for without changing anything.
    pub unchanged: usize,
    /// Orders left for the next cycle because the oracle or the store failed.
    pub skipped: usize,
}

enum Reconciled {
    Applied,
    Unchanged,
    Skipped,
}

/// Background loop converging order statuses toward the oracle's verdicts.
///
/// Oracle calls run outside any store lock; only the following
/// `apply_resolution` write is atomic. Failures are contained per order and
/// retried on the next cycle.
pub struct ReconciliationDispatcher {
    store: LedgerStoreRef,
    oracle: AccrualOracleRef,
    period: Duration,
    concurrency: usize,
}

impl ReconciliationDispatcher {
    pub fn new(store: LedgerStoreRef, oracle: AccrualOracleRef) -> Self {
        Self {
            store,
            oracle,
            period: DEFAULT_PERIOD,
            concurrency: 1,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Maximum number of oracle lookups in flight within one cycle.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Runs cycles every `period` until `shutdown` is cancelled.
    ///
    /// Cancellation is only observed between cycles, so a cycle that has
    /// started always finishes.
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!(
            period = ?self.period,
            concurrency = self.concurrency,
            "reconciliation dispatcher started"
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    match self.run_cycle().await {
                        Ok(report) => tracing::debug!(?report, "reconciliation cycle finished"),
                        Err(e) => tracing::error!(error = %e, "reconciliation cycle failed"),
                    }
                }
            }
        }

        tracing::info!("reconciliation dispatcher stopped");
    }

    /// Performs one pass over every unresolved order.
    ///
    /// Only a failure to list the unresolved orders is returned; per-order
    /// failures are logged and counted as skipped.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let numbers = self.store.list_unresolved_orders().await?;
        let mut report = CycleReport {
            examined: numbers.len(),
            ..CycleReport::default()
        };

        let mut results = stream::iter(numbers)
            .map(|number| async move { self.reconcile(&number).await })
            .buffer_unordered(self.concurrency);

        while let Some(result) = results.next().await {
            match result {
                Reconciled::Applied => report.applied += 1,
                Reconciled::Unchanged => report.unchanged += 1,
                Reconciled::Skipped => report.skipped += 1,
            }
        }

        Ok(report)
    }

    async fn reconcile(&self, number: &OrderNumber) -> Reconciled {
        let status = match self.oracle.resolve(number).await {
            Ok(status) => status,
            Err(OracleError::NotFound) => {
                tracing::debug!(order = %number, "order not registered in accrual system yet");
                return Reconciled::Skipped;
            }
            Err(e) => {
                tracing::warn!(order = %number, error = %e, "accrual lookup failed");
                return Reconciled::Skipped;
            }
        };

        let resolution = Resolution::from(status);
        match self.store.apply_resolution(number, resolution).await {
            Ok(true) => {
                tracing::debug!(
                    order = %number,
                    status = ?resolution.status,
                    accrual = %resolution.accrual,
                    "order resolved"
                );
                Reconciled::Applied
            }
            Ok(false) => Reconciled::Unchanged,
            Err(e) => {
                tracing::warn!(order = %number, error = %e, "failed to apply resolution");
                Reconciled::Skipped
            }
        }
    }
}
