//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use store::{IngredientId, InMemoryCafeStore, Money, NewInventoryItem, NewMenuItem, RecipeLine};
use tower::ServiceExt;

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

/// Router over a store holding milk (20), coffee (1) and a $3.50 latte.
struct TestCafe {
    app: axum::Router,
    state: Arc<api::AppState<InMemoryCafeStore>>,
    milk: IngredientId,
}

async fn setup() -> TestCafe {
    let state = api::create_state(InMemoryCafeStore::new());

    let milk = seed_ingredient(&state, "milk", "20").await;
    let coffee = seed_ingredient(&state, "coffee", "1").await;
    state
        .catalog
        .create_menu_item(NewMenuItem {
            name: "latte".to_string(),
            description: "espresso with steamed milk".to_string(),
            price: Money::from_cents(350),
            tags: vec!["coffee".to_string()],
            recipe: vec![
                RecipeLine::new(milk, "0.2".parse().unwrap()),
                RecipeLine::new(coffee, "0.02".parse().unwrap()),
            ],
        })
        .await
        .unwrap();

    let app = api::create_app(state.clone(), get_metrics_handle(), Duration::from_secs(5));
    TestCafe { app, state, milk }
}

async fn seed_ingredient(
    state: &api::AppState<InMemoryCafeStore>,
    name: &str,
    stock: &str,
) -> IngredientId {
    state
        .catalog
        .create_inventory_item(NewInventoryItem {
            name: name.to_string(),
            stock_level: stock.parse::<Decimal>().unwrap(),
            reorder_level: Decimal::ONE,
        })
        .await
        .unwrap()
        .id
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn assert_num(value: &Value, expected: f64) {
    let actual = value.as_f64().unwrap_or_else(|| panic!("not a number: {value}"));
    assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
}

fn order_body(customer: &str, item: &str, quantity: u32) -> Value {
    json!({
        "customer_name": customer,
        "orders": [{"product_id": item, "quantity": quantity}]
    })
}

#[tokio::test]
async fn test_health_check() {
    let cafe = setup().await;

    let (status, json) = send(&cafe.app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_place_order() {
    let cafe = setup().await;

    let (status, json) = send(&cafe.app, "POST", "/orders", Some(order_body("ann", "latte", 20))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "Order placed successfully");
    assert!(json["order_id"].as_i64().is_some());
    assert_num(&json["total"], 70.0);

    let updates = json["inventory_updates"].as_array().unwrap();
    assert_eq!(updates.len(), 2);
    let milk = updates.iter().find(|u| u["name"] == "milk").unwrap();
    assert_num(&milk["quantity_used"], 4.0);
    assert_num(&milk["remaining"], 16.0);
    let coffee = updates.iter().find(|u| u["name"] == "coffee").unwrap();
    assert_num(&coffee["quantity_used"], 0.4);
    assert_num(&coffee["remaining"], 0.6);
}

#[tokio::test]
async fn test_place_and_get_order() {
    let cafe = setup().await;

    let (_, created) = send(&cafe.app, "POST", "/orders", Some(order_body("ann", "latte", 2))).await;
    let order_id = created["order_id"].as_i64().unwrap();

    let (status, order) = send(&cafe.app, "GET", &format!("/orders/{order_id}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["order_id"], order_id);
    assert_eq!(order["customer_name"], "ann");
    assert_eq!(order["status"], "active");
    assert_num(&order["total_amount"], 7.0);
    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "latte");
    assert_eq!(items[0]["quantity"], 2);
    assert_num(&items[0]["price_at_order_time"], 3.5);

    let (status, list) = send(&cafe.app, "GET", "/orders", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_insufficient_inventory_is_conflict() {
    let cafe = setup().await;

    // 51 lattes need 1.02 coffee against 1.0 in stock.
    let (status, json) = send(&cafe.app, "POST", "/orders", Some(order_body("ann", "latte", 51))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["status"], 409);
    assert!(json["message"].as_str().unwrap().contains("coffee"));

    let (_, inventory) = send(&cafe.app, "GET", &format!("/inventory/{}", cafe.milk), None).await;
    assert_num(&inventory["stock_level"], 20.0);
    assert_eq!(cafe.state.store.order_count().await, 0);
}

#[tokio::test]
async fn test_unknown_menu_item_is_not_found() {
    let cafe = setup().await;

    let (status, json) = send(&cafe.app, "POST", "/orders", Some(order_body("ann", "mocha", 1))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);
    assert!(json["message"].as_str().unwrap().contains("mocha"));
}

#[tokio::test]
async fn test_invalid_order_is_bad_request() {
    let cafe = setup().await;

    let (status, json) = send(
        &cafe.app,
        "POST",
        "/orders",
        Some(json!({"customer_name": "ann", "orders": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);

    let (status, _) = send(&cafe.app, "POST", "/orders", Some(order_body("  ", "latte", 1))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&cafe.app, "POST", "/orders", Some(order_body("ann", "latte", 0))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let cafe = setup().await;

    let response = cafe
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], 400);
    assert!(!json["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_path_id_is_bad_request() {
    let cafe = setup().await;

    let (status, json) = send(&cafe.app, "GET", "/orders/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);

    let (status, _) = send(&cafe.app, "GET", "/orders/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_batch_process() {
    let cafe = setup().await;

    let (status, json) = send(
        &cafe.app,
        "POST",
        "/orders/batch-process",
        Some(json!({
            "orders": [
                {"customer_name": "ann", "items": [{"product_name": "latte", "quantity": 10}]},
                {"customer_name": "bob", "items": [{"product_name": "mocha", "quantity": 1}]},
                {"customer_name": "cid", "items": [{"product_name": "latte", "quantity": 45}]},
                {"customer_name": "dee", "items": [{"product_name": "latte", "quantity": 5}]}
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);

    let processed = json["processed_orders"].as_array().unwrap();
    assert_eq!(processed.len(), 4);
    assert_eq!(processed[0]["status"], "accepted");
    assert_num(&processed[0]["total"], 35.0);
    assert_eq!(processed[1]["status"], "rejected");
    assert_eq!(processed[1]["reason"], "menu_item_not_found");
    assert!(processed[1].get("order_id").is_none());
    assert_eq!(processed[2]["status"], "rejected");
    assert_eq!(processed[2]["reason"], "insufficient_inventory");
    assert_eq!(processed[3]["status"], "accepted");

    let summary = &json["summary"];
    assert_eq!(summary["total_orders"], 4);
    assert_eq!(summary["accepted"], 2);
    assert_eq!(summary["rejected"], 2);
    assert_num(&summary["total_revenue"], 52.5);

    let coffee = summary["inventory_updates"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["name"] == "coffee")
        .unwrap();
    assert_num(&coffee["quantity_used"], 0.3);
    assert_num(&coffee["remaining"], 0.7);
}

#[tokio::test]
async fn test_close_order_and_history() {
    let cafe = setup().await;
    let (_, created) = send(&cafe.app, "POST", "/orders", Some(order_body("ann", "latte", 1))).await;
    let order_id = created["order_id"].as_i64().unwrap();

    let (status, json) = send(&cafe.app, "POST", &format!("/orders/{order_id}/close"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Order closed successfully");
    assert_eq!(json["status"], 200);

    let (_, order) = send(&cafe.app, "GET", &format!("/orders/{order_id}"), None).await;
    assert_eq!(order["status"], "closed");

    let (status, history) = send(&cafe.app, "GET", &format!("/orders/{order_id}/history"), None).await;
    assert_eq!(status, StatusCode::OK);
    let statuses: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["active", "closed"]);

    let (status, _) = send(&cafe.app, "POST", "/orders/999/close", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&cafe.app, "GET", "/orders/999/history", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_order_keeps_stock_consumed() {
    let cafe = setup().await;
    let (_, created) = send(&cafe.app, "POST", "/orders", Some(order_body("ann", "latte", 5))).await;
    let order_id = created["order_id"].as_i64().unwrap();

    let (status, json) = send(&cafe.app, "DELETE", &format!("/orders/{order_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Order deleted successfully");

    let (status, _) = send(&cafe.app, "GET", &format!("/orders/{order_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&cafe.app, "DELETE", &format!("/orders/{order_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, milk) = send(&cafe.app, "GET", &format!("/inventory/{}", cafe.milk), None).await;
    assert_num(&milk["stock_level"], 19.0);
}

#[tokio::test]
async fn test_replace_order() {
    let cafe = setup().await;
    let (_, created) = send(&cafe.app, "POST", "/orders", Some(order_body("ann", "latte", 1))).await;
    let order_id = created["order_id"].as_i64().unwrap();

    let (status, json) = send(
        &cafe.app,
        "PUT",
        &format!("/orders/{order_id}"),
        Some(order_body("ann", "latte", 3)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Order updated successfully");
    assert_eq!(json["order_id"], order_id);
    assert_num(&json["total"], 10.5);

    let (_, order) = send(&cafe.app, "GET", &format!("/orders/{order_id}"), None).await;
    assert_eq!(order["items"][0]["quantity"], 3);
    assert_num(&order["total_amount"], 10.5);

    // The first placement is not given back: 1 + 3 lattes worth of milk.
    let (_, milk) = send(&cafe.app, "GET", &format!("/inventory/{}", cafe.milk), None).await;
    assert_num(&milk["stock_level"], 19.2);

    let (status, _) = send(&cafe.app, "PUT", "/orders/999", Some(order_body("ann", "latte", 1))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_number_of_ordered_items() {
    let cafe = setup().await;
    send(&cafe.app, "POST", "/orders", Some(order_body("ann", "latte", 2))).await;
    send(&cafe.app, "POST", "/orders", Some(order_body("bob", "latte", 3))).await;

    let (status, json) = send(&cafe.app, "GET", "/orders/numberOfOrderedItems", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"latte": 5}));

    let (status, json) = send(
        &cafe.app,
        "GET",
        "/orders/numberOfOrderedItems?startDate=2999-01-01",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"latte": 0}));

    let (status, json) = send(
        &cafe.app,
        "GET",
        "/orders/numberOfOrderedItems?endDate=01-01-2024",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_menu_create_and_price_change() {
    let cafe = setup().await;

    let (status, created) = send(
        &cafe.app,
        "POST",
        "/menu",
        Some(json!({
            "name": "steamer",
            "description": "steamed milk",
            "price": 4.25,
            "tags": ["hot"],
            "ingredients": [{"ingredient_id": cafe.milk, "quantity": 0.3}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_num(&created["price"], 4.25);
    assert_num(&created["ingredients"][0]["quantity"], 0.3);
    let id = created["menu_item_id"].as_i64().unwrap();

    let (status, change) = send(&cafe.app, "PUT", &format!("/menu/{id}/price"), Some(json!({"price": 4.5}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_num(&change["old_price"], 4.25);
    assert_num(&change["new_price"], 4.5);

    let (status, history) = send(&cafe.app, "GET", &format!("/menu/{id}/price-history"), None).await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_num(&history[0]["old_price"], 4.25);
    assert_num(&history[0]["new_price"], 4.5);
    assert!(history[0]["changed_at"].as_str().is_some());

    let (_, menu) = send(&cafe.app, "GET", "/menu", None).await;
    assert_eq!(menu.as_array().unwrap().len(), 2);

    let (status, _) = send(&cafe.app, "PUT", "/menu/999/price", Some(json!({"price": 1}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_menu_rejects_unknown_ingredient_and_duplicate_name() {
    let cafe = setup().await;

    let (status, _) = send(
        &cafe.app,
        "POST",
        "/menu",
        Some(json!({"name": "mocha", "price": 4.0, "ingredients": [{"ingredient_id": 999, "quantity": 1}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&cafe.app, "POST", "/menu", Some(json!({"name": "latte", "price": 3.0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_inventory_create_restock_and_transactions() {
    let cafe = setup().await;

    let (status, created) = send(
        &cafe.app,
        "POST",
        "/inventory",
        Some(json!({"name": "oat milk", "stock_level": 5, "reorder_level": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "oat milk");
    assert_num(&created["stock_level"], 5.0);
    assert_eq!(created["needs_reorder"], false);
    let id = created["ingredient_id"].as_i64().unwrap();

    let (status, level) = send(
        &cafe.app,
        "POST",
        &format!("/inventory/{id}/restock"),
        Some(json!({"quantity": 2.5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_num(&level["stock_level"], 7.5);

    let (status, ledger) = send(&cafe.app, "GET", &format!("/inventory/{id}/transactions"), None).await;
    assert_eq!(status, StatusCode::OK);
    let ledger = ledger.as_array().unwrap();
    assert_num(&ledger.last().unwrap()["quantity"], 2.5);

    let (status, _) = send(
        &cafe.app,
        "POST",
        &format!("/inventory/{id}/restock"),
        Some(json!({"quantity": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&cafe.app, "POST", "/inventory/999/restock", Some(json!({"quantity": 1}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&cafe.app, "GET", "/inventory/999/transactions", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, inventory) = send(&cafe.app, "GET", "/inventory", None).await;
    assert_eq!(inventory.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let cafe = setup().await;
    send(&cafe.app, "POST", "/orders", Some(order_body("ann", "latte", 1))).await;

    let response = cafe
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
    assert!(text.contains("orders_placed_total"));
}

#[tokio::test]
async fn test_error_responses_are_counted() {
    let cafe = setup().await;
    let (status, _) = send(&cafe.app, "GET", "/orders/424242", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let response = cafe
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
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("api_errors_total{status=\"404\"}"));
}

#[tokio::test]
async fn test_order_total_overflow_is_bad_request() {
    let cafe = setup().await;
    cafe.state
        .catalog
        .create_menu_item(NewMenuItem {
            name: "gold".to_string(),
            description: "solid gold espresso".to_string(),
            price: Money::from_cents(9_999_999_999),
            tags: vec!["luxury".to_string()],
            recipe: vec![],
        })
        .await
        .unwrap();

    let (status, json) = send(
        &cafe.app,
        "POST",
        "/orders",
        Some(order_body("ann", "gold", u32::MAX)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);

    let (status, _) = send(&cafe.app, "POST", "/orders", Some(order_body("ann", "gold", 3))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        &cafe.app,
        "POST",
        "/orders/batch-process",
        Some(json!({
            "orders": [
                {"customer_name": "ann", "items": [{"product_name": "gold", "quantity": 4294967295u64}]},
                {"customer_name": "bob", "items": [{"product_name": "gold", "quantity": 1}]}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["processed_orders"][0]["reason"], "unknown_error");
    assert_eq!(json["processed_orders"][1]["status"], "accepted");
    assert_num(&json["summary"]["total_revenue"], 99_999_999.99);
}

#[tokio::test]
async fn test_batch_rejects_non_positive_quantity_per_order() {
    let cafe = setup().await;

    let (status, json) = send(
        &cafe.app,
        "POST",
        "/orders/batch-process",
        Some(json!({
            "orders": [
                {"customer_name": "ann", "items": [{"product_name": "latte", "quantity": 1}]},
                {"customer_name": "bob", "items": [{"product_name": "latte", "quantity": -1}]},
                {"customer_name": "cid", "items": [{"product_name": "latte", "quantity": 9_000_000_000i64}]}
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let processed = json["processed_orders"].as_array().unwrap();
    assert_eq!(processed[0]["customer_name"], "ann");
    assert_eq!(processed[0]["status"], "accepted");
    assert_eq!(processed[1]["customer_name"], "bob");
    assert_eq!(processed[1]["status"], "rejected");
    assert_eq!(processed[1]["reason"], "unknown_error");
    assert_eq!(processed[2]["reason"], "unknown_error");
    assert_eq!(json["summary"]["accepted"], 1);
    assert_eq!(json["summary"]["rejected"], 2);
}

#[tokio::test]
async fn test_menu_item_get_update_and_delete() {
    let cafe = setup().await;

    let (status, json) = send(&cafe.app, "GET", "/menu/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "latte");
    assert_eq!(json["ingredients"].as_array().unwrap().len(), 2);

    let (status, json) = send(
        &cafe.app,
        "PUT",
        "/menu/1",
        Some(json!({
            "name": "latte",
            "description": "more milk",
            "price": 4.0,
            "tags": ["coffee", "hot"],
            "ingredients": [{"ingredient_id": cafe.milk.as_i64(), "quantity": 0.3}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["description"], "more milk");
    assert_num(&json["price"], 4.0);
    assert_eq!(json["ingredients"].as_array().unwrap().len(), 1);

    let (_, history) = send(&cafe.app, "GET", "/menu/1/price-history", None).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_num(&history[0]["old_price"], 3.5);
    assert_num(&history[0]["new_price"], 4.0);

    let (status, _) = send(
        &cafe.app,
        "PUT",
        "/menu/77",
        Some(json!({"name": "x", "description": "y", "price": 1.0, "tags": ["t"]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&cafe.app, "POST", "/orders", Some(order_body("ann", "latte", 1))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&cafe.app, "DELETE", "/menu/1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        &cafe.app,
        "POST",
        "/menu",
        Some(json!({"name": "tea", "description": "leaves", "price": 2.0, "tags": ["hot"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let tea = json["menu_item_id"].as_i64().unwrap();

    let (status, json) = send(&cafe.app, "DELETE", &format!("/menu/{tea}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Menu item deleted successfully");
    let (status, _) = send(&cafe.app, "GET", &format!("/menu/{tea}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_inventory_update_and_delete() {
    let cafe = setup().await;
    let milk = cafe.milk.as_i64();

    let (status, json) = send(
        &cafe.app,
        "PUT",
        &format!("/inventory/{milk}"),
        Some(json!({"stock_level": 12.5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "milk");
    assert_num(&json["stock_level"], 12.5);

    let (_, ledger) = send(&cafe.app, "GET", &format!("/inventory/{milk}/transactions"), None).await;
    let deltas: Vec<f64> = ledger
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["quantity"].as_f64().unwrap())
        .collect();
    assert_eq!(deltas.len(), 2);
    assert!((deltas.iter().sum::<f64>() - 12.5).abs() < 1e-9);

    let (status, _) = send(
        &cafe.app,
        "PUT",
        &format!("/inventory/{milk}"),
        Some(json!({"stock_level": -1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&cafe.app, "DELETE", &format!("/inventory/{milk}"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let sugar = seed_ingredient(&cafe.state, "sugar", "4").await.as_i64();
    let (status, json) = send(&cafe.app, "DELETE", &format!("/inventory/{sugar}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Inventory item deleted successfully");
    let (status, _) = send(&cafe.app, "DELETE", &format!("/inventory/{sugar}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_leftovers() {
    let cafe = setup().await;
    seed_ingredient(&cafe.state, "sugar", "7").await;

    let (status, json) = send(&cafe.app, "GET", "/inventory/getLeftOvers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["currentPage"], 1);
    assert_eq!(json["pageSize"], 10);
    assert_eq!(json["totalPages"], 1);
    assert_eq!(json["hasNextPage"], false);
    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["coffee", "milk", "sugar"]);

    let (status, json) = send(
        &cafe.app,
        "GET",
        "/inventory/getLeftOvers?sortBy=quantity&page=1&pageSize=2",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["totalPages"], 2);
    assert_eq!(json["hasNextPage"], true);
    let data = json["data"].as_array().unwrap();
    assert_eq!(data[0]["name"], "milk");
    assert_num(&data[0]["quantity"], 20.0);
    assert_eq!(data[1]["name"], "sugar");

    let (_, json) = send(
        &cafe.app,
        "GET",
        "/inventory/getLeftOvers?sortBy=quantity&page=2&pageSize=2",
        None,
    )
    .await;
    assert_eq!(json["hasNextPage"], false);
    assert_eq!(json["data"][0]["name"], "coffee");
}
