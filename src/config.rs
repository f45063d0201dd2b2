use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Process configuration; every option can also be set from the environment.
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "DATABASE_URI", global = true)]
    pub db_path: Option<PathBuf>,

    /// Base URL of the accrual system.
    #[arg(
        long,
        env = "ACCRUAL_SYSTEM_ADDRESS",
        default_value = "http://localhost:8081",
        global = true
    )]
    pub accrual_address: String,

    /// Seconds between two reconciliation cycles.
    #[arg(long, env = "DISPATCH_INTERVAL_SECS", default_value_t = 10, global = true)]
    pub dispatch_interval_secs: u64,

    /// Maximum concurrent accrual lookups within one cycle.
    #[arg(long, env = "DISPATCH_CONCURRENCY", default_value_t = 4, global = true)]
    pub dispatch_concurrency: usize,

    /// Timeout of a single accrual system request, in seconds.
    #[arg(long, env = "ORACLE_TIMEOUT_SECS", default_value_t = 5, global = true)]
    pub oracle_timeout_secs: u64,

    /// How many times a rate-limited accrual request is retried.
    #[arg(long, env = "ORACLE_MAX_RETRIES", default_value_t = 3, global = true)]
    pub oracle_max_retries: u32,

    /// Longest single wait on a `Retry-After` hint, in seconds.
    #[arg(long, env = "ORACLE_MAX_BACKOFF_SECS", default_value_t = 5, global = true)]
    pub oracle_max_backoff_secs: u64,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,
}

impl Config {
    pub fn dispatch_interval(&self) -> Duration {
        Duration::from_secs(self.dispatch_interval_secs.max(1))
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    pub fn oracle_max_backoff(&self) -> Duration {
        Duration::from_secs(self.oracle_max_backoff_secs)
    }
}
