use clap::{Parser, Subcommand};
use loyalty_ledger::application::dispatcher::ReconciliationDispatcher;
use loyalty_ledger::application::service::LoyaltyService;
use loyalty_ledger::config::Config;
use loyalty_ledger::domain::ports::LedgerStoreRef;
use loyalty_ledger::infrastructure::accrual_http::HttpAccrualOracle;
use loyalty_ledger::infrastructure::in_memory::InMemoryLedgerStore;
use loyalty_ledger::interfaces::cli::{self, LedgerCommand};
use loyalty_ledger::telemetry;
use miette::{IntoDiagnostic, Result};
use std::io;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile unresolved orders with the accrual system until interrupted.
    Run,
    #[command(flatten)]
    Ledger(LedgerCommand),
}

/// The ledger selected by the configuration, and whether it outlives the process.
struct OpenedStore {
    store: LedgerStoreRef,
    persistent: bool,
}

#[cfg(feature = "storage-rocksdb")]
fn open_store(config: &Config) -> Result<OpenedStore> {
    use loyalty_ledger::infrastructure::rocksdb::RocksDbLedgerStore;

    match &config.db_path {
        Some(path) => {
            let store = RocksDbLedgerStore::open(path).into_diagnostic()?;
            Ok(OpenedStore {
                store: Arc::new(store),
                persistent: true,
            })
        }
        None => Ok(OpenedStore {
            store: Arc::new(InMemoryLedgerStore::new()),
            persistent: false,
        }),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_store(config: &Config) -> Result<OpenedStore> {
    if config.db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(OpenedStore {
        store: Arc::new(InMemoryLedgerStore::new()),
        persistent: false,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(&cli.config.log_level);

    let OpenedStore { store, persistent } = open_store(&cli.config)?;

    match cli.command {
        Command::Run => {
            // Nothing else can write to a ledger that lives only in this process.
            if !persistent {
                return Err(miette::miette!(
                    help = "pass --db-path to a ledger built with the 'storage-rocksdb' feature",
                    "nothing to reconcile: `run` needs a persistent ledger"
                ));
            }

            let oracle = HttpAccrualOracle::new(
                cli.config.accrual_address.clone(),
                cli.config.oracle_timeout(),
                cli.config.oracle_max_retries,
            )
            .into_diagnostic()?
            .with_max_backoff(cli.config.oracle_max_backoff());

            let dispatcher = ReconciliationDispatcher::new(store, Arc::new(oracle))
                .with_period(cli.config.dispatch_interval())
                .with_concurrency(cli.config.dispatch_concurrency);

            let shutdown = CancellationToken::new();
            let signal = shutdown.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => tracing::info!("shutdown signal received"),
                    Err(e) => tracing::error!(error = %e, "cannot listen for shutdown signal"),
                }
                signal.cancel();
            });

            dispatcher.run(shutdown).await;
        }
        Command::Ledger(command) => {
            let service = LoyaltyService::new(store);
            cli::execute(&service, command, io::stdout().lock())
                .await
                .into_diagnostic()?;
        }
    }

    Ok(())
}
