use crate::application::service::LoyaltyService;
use crate::domain::order::CustomerId;
use crate::error::Result;
use clap::Subcommand;
use rust_decimal::Decimal;
use serde_json::json;
use std::io::Write;

/// One-shot operations against the ledger. Each prints a single JSON document.
#[derive(Subcommand, Debug, Clone)]
pub enum LedgerCommand {
    /// Submit an order number for accrual.
    Upload {
        #[arg(long)]
        user: String,
        number: String,
    },
    /// List a customer's orders, oldest first.
    Orders {
        #[arg(long)]
        user: String,
    },
    /// Show a single order.
    Order { number: String },
    /// Show a customer's current and withdrawn points.
    Balance {
        #[arg(long)]
        user: String,
    },
    /// Spend points against an order reference.
    Withdraw {
        #[arg(long)]
        user: String,
        #[arg(long)]
        order: String,
        #[arg(long)]
        sum: Decimal,
    },
    /// List a customer's withdrawals, oldest first.
    Withdrawals {
        #[arg(long)]
        user: String,
    },
}

/// Runs `command` against `service` and writes its JSON result to `out`.
pub async fn execute<W: Write>(
    service: &LoyaltyService,
    command: LedgerCommand,
    mut out: W,
) -> Result<()> {
    let document = match command {
        LedgerCommand::Upload { user, number } => {
            let outcome = service.upload_order(&CustomerId::new(user), &number).await?;
            json!({ "order": number, "outcome": outcome })
        }
        LedgerCommand::Orders { user } => {
            serde_json::to_value(service.list_orders(&CustomerId::new(user)).await?)?
        }
        LedgerCommand::Order { number } => serde_json::to_value(service.get_order(&number).await?)?,
        LedgerCommand::Balance { user } => {
            serde_json::to_value(service.get_balance(&CustomerId::new(user)).await?)?
        }
        LedgerCommand::Withdraw { user, order, sum } => {
            let outcome = service.withdraw(&CustomerId::new(user), &order, sum).await?;
            json!({ "order": order, "sum": sum, "outcome": outcome })
        }
        LedgerCommand::Withdrawals { user } => {
            serde_json::to_value(service.list_withdrawals(&CustomerId::new(user)).await?)?
        }
    };

    serde_json::to_writer(&mut out, &document)?;
    writeln!(out)?;
    Ok(())
}
