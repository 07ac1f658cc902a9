//! Order placement, batch and lifecycle endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use domain::{
    BatchResult, InventoryUpdate, OrderLineRequest, OrderOutcome, PlaceOrder, PlacedOrder,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::{
    CafeStore, MenuItemId, Order, OrderId, OrderLine, OrderStatus, OrderedItemsQuery,
    StatusChange,
};

use crate::error::{ApiError, parse_id};
use crate::state::AppState;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub orders: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    /// Menu item name.
    pub product_id: String,
    pub quantity: u32,
}

impl From<CreateOrderRequest> for PlaceOrder {
    fn from(req: CreateOrderRequest) -> Self {
        PlaceOrder::new(
            req.customer_name,
            req.orders
                .into_iter()
                .map(|item| OrderLineRequest::new(item.product_id, item.quantity))
                .collect(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub orders: Vec<BatchOrderRequest>,
}

#[derive(Debug, Deserialize)]
pub struct BatchOrderRequest {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub items: Vec<BatchItemRequest>,
}

/// Quantities are read as signed integers so that an out-of-range value
/// rejects its own order instead of failing the whole batch.
#[derive(Debug, Deserialize)]
pub struct BatchItemRequest {
    pub product_name: String,
    pub quantity: i64,
}

/// Maps a batch quantity onto the line quantity range. Values outside it land
/// on a bound that order validation rejects.
fn line_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity.max(0)).unwrap_or(u32::MAX)
}

impl From<BatchOrderRequest> for PlaceOrder {
    fn from(req: BatchOrderRequest) -> Self {
        PlaceOrder::new(
            req.customer_name,
            req.items
                .into_iter()
                .map(|item| {
                    OrderLineRequest::new(item.product_name, line_quantity(item.quantity))
                })
                .collect(),
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedItemsParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct PlacedOrderResponse {
    pub message: String,
    pub order_id: OrderId,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub inventory_updates: Vec<InventoryUpdate>,
}

impl PlacedOrderResponse {
    fn new(message: &str, placed: PlacedOrder) -> Self {
        Self {
            message: message.to_string(),
            order_id: placed.order_id,
            total: placed.total.to_decimal(),
            inventory_updates: placed.inventory_updates,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    pub status: u16,
}

impl MessageResponse {
    pub(crate) fn ok(message: &str) -> Self {
        Self {
            message: message.to_string(),
            status: StatusCode::OK.as_u16(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderLineResponse {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_at_order_time: Decimal,
}

impl From<OrderLine> for OrderLineResponse {
    fn from(line: OrderLine) -> Self {
        Self {
            menu_item_id: line.menu_item_id,
            name: line.menu_item_name,
            quantity: line.quantity,
            price_at_order_time: line.price_at_order_time.to_decimal(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order_id: OrderId,
    pub customer_name: String,
    pub status: OrderStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderLineResponse>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.id,
            customer_name: order.customer_name,
            status: order.status,
            total_amount: order.total_amount.to_decimal(),
            created_at: order.created_at,
            items: order.lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProcessedOrderResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    pub customer_name: String,
    pub status: &'static str,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub total: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct BatchSummaryResponse {
    pub total_orders: usize,
    pub accepted: usize,
    pub rejected: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    pub inventory_updates: Vec<InventoryUpdate>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub processed_orders: Vec<ProcessedOrderResponse>,
    pub summary: BatchSummaryResponse,
}

impl From<BatchResult> for BatchResponse {
    fn from(result: BatchResult) -> Self {
        let processed_orders = result
            .processed_orders
            .into_iter()
            .map(|processed| match processed.outcome {
                OrderOutcome::Accepted { order_id, total } => ProcessedOrderResponse {
                    order_id: Some(order_id),
                    customer_name: processed.customer_name,
                    status: "accepted",
                    total: Some(total.to_decimal()),
                    reason: None,
                },
                OrderOutcome::Rejected { reason, .. } => ProcessedOrderResponse {
                    order_id: None,
                    customer_name: processed.customer_name,
                    status: "rejected",
                    total: None,
                    reason: Some(reason),
                },
            })
            .collect();

        let summary = result.summary;
        Self {
            processed_orders,
            summary: BatchSummaryResponse {
                total_orders: summary.total_orders,
                accepted: summary.accepted,
                rejected: summary.rejected,
                total_revenue: summary.total_revenue.to_decimal(),
                inventory_updates: summary.inventory_updates,
            },
        }
    }
}

fn parse_date(raw: Option<String>, name: &str) -> Result<Option<NaiveDate>, ApiError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                ApiError::BadRequest(format!("Invalid {name}: {value} (expected YYYY-MM-DD)"))
            }),
    }
}

// -- Handlers --

/// POST /orders: place a new order.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PlacedOrderResponse>), ApiError> {
    let Json(req) = payload?;
    let placed = state.placer.place_order(req.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(PlacedOrderResponse::new("Order placed successfully", placed)),
    ))
}

/// PUT /orders/{id}: rewrite an order from a new request.
#[tracing::instrument(skip(state, payload))]
pub async fn replace<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Json<PlacedOrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id, "order")?;
    let Json(req) = payload?;
    let placed = state.placer.replace_order(order_id, req.into()).await?;

    Ok(Json(PlacedOrderResponse::new(
        "Order updated successfully",
        placed,
    )))
}

/// POST /orders/{id}/close: close an order.
#[tracing::instrument(skip(state))]
pub async fn close<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id, "order")?;
    state.lifecycle.close_order(order_id).await?;
    Ok(Json(MessageResponse::ok("Order closed successfully")))
}

/// DELETE /orders/{id}: delete an order without restocking.
#[tracing::instrument(skip(state))]
pub async fn delete<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id, "order")?;
    state.lifecycle.delete_order(order_id).await?;
    Ok(Json(MessageResponse::ok("Order deleted successfully")))
}

/// POST /orders/batch-process: place many orders, one outcome each.
#[tracing::instrument(skip(state, payload))]
pub async fn batch_process<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResponse>, ApiError> {
    let Json(req) = payload?;
    let orders = req.orders.into_iter().map(Into::into).collect();
    let result = state.batch.process_batch(orders).await?;
    Ok(Json(result.into()))
}

/// GET /orders/numberOfOrderedItems: quantities ordered per menu item.
#[tracing::instrument(skip(state))]
pub async fn ordered_items<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<OrderedItemsParams>,
) -> Result<Json<BTreeMap<String, i64>>, ApiError> {
    let mut query = OrderedItemsQuery::new();
    if let Some(start) = parse_date(params.start_date, "startDate")? {
        query = query.start(start);
    }
    if let Some(end) = parse_date(params.end_date, "endDate")? {
        query = query.end(end);
    }

    let counts = state.store.ordered_item_counts(query).await?;
    Ok(Json(
        counts.into_iter().map(|c| (c.name, c.quantity)).collect(),
    ))
}

/// GET /orders: list all orders.
#[tracing::instrument(skip(state))]
pub async fn list<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.store.list_orders().await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /orders/{id}: load an order with its lines.
#[tracing::instrument(skip(state))]
pub async fn get<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id, "order")?;
    let order = state
        .store
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    Ok(Json(order.into()))
}

/// GET /orders/{id}/history: status transitions, oldest first.
#[tracing::instrument(skip(state))]
pub async fn history<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<StatusChange>>, ApiError> {
    let order_id: OrderId = parse_id(&id, "order")?;
    let history = state.store.status_history(order_id).await?;
    if history.is_empty() {
        return Err(ApiError::NotFound(format!("Order {id} not found")));
    }
    Ok(Json(history))
}
