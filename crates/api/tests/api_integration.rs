//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use service::{InMemoryBroker, InMemoryNotifications, RetryPolicy};
use common::{BatchRef, Sku};
use domain::Product;
use store::{
    InMemoryProductStore, PendingSave, ProductStore, Revision, StoreError, StoredProduct,
};
use tower::ServiceExt;
use uuid::Uuid;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    notifications: InMemoryNotifications,
    broker: InMemoryBroker,
}

fn setup() -> TestApp {
    let notifications = InMemoryNotifications::new();
    let broker = InMemoryBroker::new();
    let config = service::Config {
        retry: RetryPolicy::immediate(3),
        ..service::Config::default()
    };
    let state = api::create_state(
        InMemoryProductStore::new(),
        &config,
        Arc::new(notifications.clone()),
        Arc::new(broker.clone()),
    )
    .unwrap();

    TestApp {
        app: api::create_app(state, get_metrics_handle()),
        notifications,
        broker,
    }
}

fn random_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_string()
}

fn random_sku(name: &str) -> String {
    format!("sku-{name}-{}", random_suffix())
}

fn random_batchref(name: &str) -> String {
    format!("batch-{name}-{}", random_suffix())
}

fn random_orderid(name: &str) -> String {
    format!("order-{name}-{}", random_suffix())
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn post_to_add_batch(app: &axum::Router, reference: &str, sku: &str, qty: u32, eta: Option<&str>) {
    let (status, _) = send(
        app,
        "POST",
        "/add_batch",
        Some(json!({"ref": reference, "sku": sku, "qty": qty, "eta": eta})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_health_check() {
    let test = setup();

    let (status, json) = send(&test.app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

/// Store that answers pings but fails every product read or write.
#[derive(Clone)]
struct PingOnlyStore {
    reachable: bool,
}

impl PingOnlyStore {
    fn unavailable() -> StoreError {
        StoreError::Unavailable("products are not readable".to_string())
    }
}

#[async_trait]
impl ProductStore for PingOnlyStore {
    async fn get(&self, _sku: &Sku) -> store::Result<Option<StoredProduct>> {
        Err(Self::unavailable())
    }

    async fn get_by_batchref(&self, _reference: &BatchRef) -> store::Result<Option<StoredProduct>> {
        Err(Self::unavailable())
    }

    async fn save(&self, _saves: Vec<PendingSave>) -> store::Result<Vec<Revision>> {
        Err(Self::unavailable())
    }

    async fn all(&self) -> store::Result<Vec<Product>> {
        Err(Self::unavailable())
    }

    async fn ping(&self) -> store::Result<()> {
        if self.reachable {
            Ok(())
        } else {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }
}

fn app_over(store: PingOnlyStore) -> axum::Router {
    let state = api::create_default_state(store, &service::Config::default()).unwrap();
    api::create_app(state, get_metrics_handle())
}

#[tokio::test]
async fn test_health_check_only_pings_store() {
    let app = app_over(PingOnlyStore { reachable: true });

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_health_check_reports_unreachable_store() {
    let app = app_over(PingOnlyStore { reachable: false });

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "unavailable");
}

#[tokio::test]
async fn test_happy_path_returns_201_and_allocated_batch() {
    let test = setup();
    let sku = random_sku("");
    let othersku = random_sku("other");
    let earlybatch = random_batchref("1");
    let laterbatch = random_batchref("2");
    let otherbatch = random_batchref("3");
    post_to_add_batch(&test.app, &laterbatch, &sku, 100, Some("2011-01-02")).await;
    post_to_add_batch(&test.app, &earlybatch, &sku, 100, Some("2011-01-01")).await;
    post_to_add_batch(&test.app, &otherbatch, &othersku, 100, None).await;

    let (status, json) = send(
        &test.app,
        "POST",
        "/allocate",
        Some(json!({"orderid": random_orderid(""), "sku": sku, "qty": 3})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["batchref"], earlybatch.as_str());
}

#[tokio::test]
async fn test_unhappy_path_returns_400_and_error_message() {
    let test = setup();
    let unknown_sku = random_sku("");
    let orderid = random_orderid("");

    let (status, json) = send(
        &test.app,
        "POST",
        "/allocate",
        Some(json!({"orderid": orderid, "sku": unknown_sku, "qty": 20})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], format!("Invalid sku {unknown_sku}"));
}

#[tokio::test]
async fn test_out_of_stock_returns_400() {
    let test = setup();
    let sku = random_sku("");
    post_to_add_batch(&test.app, &random_batchref("1"), &sku, 5, None).await;

    let (status, json) = send(
        &test.app,
        "POST",
        "/allocate",
        Some(json!({"orderid": random_orderid(""), "sku": sku, "qty": 10})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], format!("Out of stock for sku {sku}"));
}

#[tokio::test]
async fn test_allocations_view() {
    let test = setup();
    let sku = random_sku("");
    let batch = random_batchref("1");
    let orderid = random_orderid("");
    post_to_add_batch(&test.app, &batch, &sku, 10, None).await;
    send(
        &test.app,
        "POST",
        "/allocate",
        Some(json!({"orderid": orderid, "sku": sku, "qty": 2})),
    )
    .await;

    let (status, json) = send(&test.app, "GET", &format!("/allocations/{orderid}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!([{"sku": sku, "batchref": batch}]));
}

#[tokio::test]
async fn test_allocations_view_unknown_order_returns_404() {
    let test = setup();

    let (status, _) = send(
        &test.app,
        "GET",
        &format!("/allocations/{}", random_orderid("missing")),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_change_batch_quantity_leading_to_reallocation() {
    let test = setup();
    let orderid = random_orderid("");
    let sku = random_sku("");
    let earlier_batch = random_batchref("old");
    let later_batch = random_batchref("newer");
    post_to_add_batch(&test.app, &earlier_batch, &sku, 10, Some("2011-01-01")).await;
    post_to_add_batch(&test.app, &later_batch, &sku, 10, Some("2011-01-02")).await;

    let (_, json) = send(
        &test.app,
        "POST",
        "/allocate",
        Some(json!({"orderid": orderid, "sku": sku, "qty": 10})),
    )
    .await;
    assert_eq!(json["batchref"], earlier_batch.as_str());

    let (status, _) = send(
        &test.app,
        "POST",
        "/change_batch_quantity",
        Some(json!({"batchref": earlier_batch, "qty": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let messages = test.broker.messages("line_allocated");
    let last = messages.last().unwrap();
    assert_eq!(last["orderid"], orderid.as_str());
    assert_eq!(last["batchref"], later_batch.as_str());
}

#[tokio::test]
async fn test_reallocation_without_stock_notifies() {
    let test = setup();
    let sku = random_sku("");
    let batch = random_batchref("only");
    post_to_add_batch(&test.app, &batch, &sku, 10, None).await;
    send(
        &test.app,
        "POST",
        "/allocate",
        Some(json!({"orderid": random_orderid(""), "sku": sku, "qty": 8})),
    )
    .await;

    let (status, _) = send(
        &test.app,
        "POST",
        "/change_batch_quantity",
        Some(json!({"batchref": batch, "qty": 4})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        test.notifications.sent_to("stock@made.com"),
        vec![format!("Out of stock for {sku}")]
    );
}

#[tokio::test]
async fn test_malformed_change_batch_quantity_returns_400() {
    let test = setup();

    let (status, json) = send(
        &test.app,
        "POST",
        "/change_batch_quantity",
        Some(json!({"batchref": "b1"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("change_batch_quantity"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let test = setup();
    let sku = random_sku("");
    post_to_add_batch(&test.app, &random_batchref("1"), &sku, 10, None).await;

    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("messagebus_messages_total"));
}
