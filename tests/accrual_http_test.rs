mod common;

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use common::number;
use loyalty_ledger::application::dispatcher::ReconciliationDispatcher;
use loyalty_ledger::application::service::LoyaltyService;
use loyalty_ledger::domain::oracle::AccrualStatus;
use loyalty_ledger::domain::order::{CustomerId, OrderStatus};
use loyalty_ledger::domain::ports::AccrualOracle;
use loyalty_ledger::error::OracleError;
use loyalty_ledger::infrastructure::accrual_http::HttpAccrualOracle;
use loyalty_ledger::infrastructure::in_memory::InMemoryLedgerStore;
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Number of `429` answers the mock gives for "12345678903" before succeeding.
#[derive(Clone)]
struct MockAccrual {
    throttled: Arc<Mutex<usize>>,
}

async fn order_info(State(state): State<MockAccrual>, Path(number): Path<String>) -> Response {
    match number.as_str() {
        "79927398713" => {
            Json(json!({ "order": number, "status": "PROCESSED", "accrual": 729.98 })).into_response()
        }
        "4929972884676289" => Json(json!({ "order": number, "status": "REGISTERED" })).into_response(),
        "4532733309529845" => Json(json!({ "order": number, "status": "INVALID" })).into_response(),
        "12345678903" => {
            let mut throttled = state.throttled.lock().unwrap();
            if *throttled > 0 {
                *throttled -= 1;
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, "0")],
                    "No more than 10 requests per minute allowed",
                )
                    .into_response()
            } else {
                Json(json!({ "order": number, "status": "PROCESSED", "accrual": 10 })).into_response()
            }
        }
        "4111111111111111" => (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, "86400")],
            "Come back tomorrow",
        )
            .into_response(),
        "49927398716" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "1234567812345670" => Json(json!({ "order": number, "status": "SOMETHING" })).into_response(),
        _ => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn spawn_accrual(throttled: usize) -> String {
    let state = MockAccrual {
        throttled: Arc::new(Mutex::new(throttled)),
    };
    let app = Router::new()
        .route("/api/orders/{number}", get(order_info))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn oracle(base_url: &str, max_retries: u32) -> HttpAccrualOracle {
    HttpAccrualOracle::new(base_url, Duration::from_secs(2), max_retries).unwrap()
}

#[tokio::test]
async fn test_verdicts() {
    let base = spawn_accrual(0).await;
    let oracle = oracle(&base, 0);

    assert_eq!(
        oracle.resolve(&number("79927398713")).await,
        Ok(AccrualStatus::Processed(dec!(729.98)))
    );
    assert_eq!(
        oracle.resolve(&number("4929972884676289")).await,
        Ok(AccrualStatus::Registered)
    );
    assert_eq!(
        oracle.resolve(&number("4532733309529845")).await,
        Ok(AccrualStatus::Invalid)
    );
}

#[tokio::test]
async fn test_unregistered_order_is_not_found() {
    let base = spawn_accrual(0).await;
    assert_eq!(
        oracle(&base, 0).resolve(&number("2377225624")).await,
        Err(OracleError::NotFound)
    );
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let base = spawn_accrual(2).await;
    assert_eq!(
        oracle(&base, 3).resolve(&number("12345678903")).await,
        Ok(AccrualStatus::Processed(dec!(10)))
    );
}

#[tokio::test]
async fn test_rate_limit_gives_up() {
    let base = spawn_accrual(5).await;
    assert_eq!(
        oracle(&base, 1).resolve(&number("12345678903")).await,
        Err(OracleError::RateLimited {
            retry_after: Duration::ZERO
        })
    );
}

#[tokio::test]
async fn test_retry_after_wait_is_capped() {
    let base = spawn_accrual(0).await;
    let oracle = HttpAccrualOracle::new(base.as_str(), Duration::from_millis(200), 3)
        .unwrap()
        .with_max_backoff(Duration::from_millis(50));

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        oracle.resolve(&number("4111111111111111")),
    )
    .await
    .expect("rate-limited lookup exceeded its backoff bound");
    assert_eq!(
        result,
        Err(OracleError::RateLimited {
            retry_after: Duration::from_secs(86400)
        })
    );
}

#[tokio::test]
async fn test_dispatcher_stops_despite_long_retry_after() {
    let base = spawn_accrual(0).await;
    let store = Arc::new(InMemoryLedgerStore::new());
    LoyaltyService::new(store.clone())
        .upload_order(&CustomerId::new("alice"), "4111111111111111")
        .await
        .unwrap();

    let oracle = HttpAccrualOracle::new(base.as_str(), Duration::from_millis(200), 3).unwrap();
    let dispatcher = ReconciliationDispatcher::new(store, Arc::new(oracle))
        .with_period(Duration::from_millis(10));

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { dispatcher.run(shutdown).await }
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("dispatcher did not stop after cancellation")
        .unwrap();
}

#[tokio::test]
async fn test_failures_are_transient_or_malformed() {
    let base = spawn_accrual(0).await;
    let oracle = oracle(&base, 0);

    assert!(matches!(
        oracle.resolve(&number("49927398716")).await,
        Err(OracleError::Transient(_))
    ));
    assert!(matches!(
        oracle.resolve(&number("1234567812345670")).await,
        Err(OracleError::Malformed(_))
    ));
}

#[tokio::test]
async fn test_unreachable_accrual_system() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = oracle(&format!("http://{addr}"), 0)
        .resolve(&number("79927398713"))
        .await;
    assert!(matches!(result, Err(OracleError::Transient(_))));
}

#[tokio::test]
async fn test_dispatcher_against_http_oracle() {
    let base = spawn_accrual(1).await;
    let store = Arc::new(InMemoryLedgerStore::new());
    let service = LoyaltyService::new(store.clone());
    let alice = CustomerId::new("alice");
    for raw in ["79927398713", "4929972884676289", "12345678903", "2377225624"] {
        service.upload_order(&alice, raw).await.unwrap();
    }

    let dispatcher = ReconciliationDispatcher::new(store, Arc::new(oracle(&base, 2)))
        .with_concurrency(4);
    let report = dispatcher.run_cycle().await.unwrap();
    assert_eq!(report.examined, 4);
    assert_eq!(report.applied, 3);
    assert_eq!(report.skipped, 1);

    let orders = service.list_orders(&alice).await.unwrap();
    let statuses: Vec<_> = orders.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            OrderStatus::Processed,
            OrderStatus::Processing,
            OrderStatus::Processed,
            OrderStatus::New,
        ]
    );

    let balance = service.get_balance(&alice).await.unwrap();
    assert_eq!(balance.current, dec!(739.98));
}
