//! Inventory endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use domain::InventoryItemChanges;
use store::{
    CafeStore, IngredientId, InventoryItem, InventoryTransaction, LeftoverSort, LeftoversPage,
    LeftoversQuery, NewInventoryItem,
};

use crate::error::{ApiError, parse_id};
use crate::routes::orders::MessageResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateInventoryItemRequest {
    #[serde(default)]
    pub name: String,
    pub stock_level: Decimal,
    pub reorder_level: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub quantity: Decimal,
}

/// Absent fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct UpdateInventoryItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub stock_level: Option<Decimal>,
    #[serde(default)]
    pub reorder_level: Option<Decimal>,
}

/// Query of the leftovers report. Missing or unparsable values fall back to
/// name order, page 1 and 10 rows per page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeftoversParams {
    pub sort_by: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl From<LeftoversParams> for LeftoversQuery {
    fn from(params: LeftoversParams) -> Self {
        let number = |raw: Option<String>| raw.and_then(|v| v.trim().parse::<u32>().ok());
        let mut query = LeftoversQuery::new().sort_by(
            params
                .sort_by
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(LeftoverSort::Name),
        );
        if let Some(page) = number(params.page) {
            query = query.page(page);
        }
        if let Some(page_size) = number(params.page_size) {
            query = query.page_size(page_size);
        }
        query
    }
}

#[derive(Debug, Serialize)]
pub struct InventoryItemResponse {
    pub ingredient_id: IngredientId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub stock_level: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub reorder_level: Decimal,
    pub needs_reorder: bool,
    pub last_updated: DateTime<Utc>,
}

impl From<InventoryItem> for InventoryItemResponse {
    fn from(item: InventoryItem) -> Self {
        Self {
            ingredient_id: item.id,
            needs_reorder: item.stock_level <= item.reorder_level,
            name: item.name,
            stock_level: item.stock_level,
            reorder_level: item.reorder_level,
            last_updated: item.last_updated,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StockLevelResponse {
    pub ingredient_id: IngredientId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub stock_level: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub transaction_id: i64,
    pub ingredient_id: IngredientId,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<InventoryTransaction> for TransactionResponse {
    fn from(tx: InventoryTransaction) -> Self {
        Self {
            transaction_id: tx.id,
            ingredient_id: tx.ingredient_id,
            quantity: tx.quantity,
            created_at: tx.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LeftoverResponse {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeftoversResponse {
    pub current_page: u32,
    pub has_next_page: bool,
    pub page_size: u32,
    pub total_pages: u64,
    pub data: Vec<LeftoverResponse>,
}

impl From<LeftoversPage> for LeftoversResponse {
    fn from(page: LeftoversPage) -> Self {
        Self {
            current_page: page.current_page,
            has_next_page: page.has_next_page,
            page_size: page.page_size,
            total_pages: page.total_pages,
            data: page
                .data
                .into_iter()
                .map(|row| LeftoverResponse {
                    name: row.name,
                    quantity: row.quantity,
                })
                .collect(),
        }
    }
}

/// GET /inventory: list ingredients with stock levels.
#[tracing::instrument(skip(state))]
pub async fn list<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<InventoryItemResponse>>, ApiError> {
    let items = state.store.list_inventory().await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// POST /inventory: add an ingredient with its opening stock.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateInventoryItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<InventoryItemResponse>), ApiError> {
    let Json(req) = payload?;
    let created = state
        .catalog
        .create_inventory_item(NewInventoryItem {
            name: req.name,
            stock_level: req.stock_level,
            reorder_level: req.reorder_level,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET /inventory/{id}: load one ingredient.
#[tracing::instrument(skip(state))]
pub async fn get<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<InventoryItemResponse>, ApiError> {
    let ingredient_id: IngredientId = parse_id(&id, "ingredient")?;
    let item = state
        .store
        .get_inventory_item(ingredient_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Ingredient {id} not found")))?;
    Ok(Json(item.into()))
}

/// POST /inventory/{id}/restock: add stock to an ingredient.
#[tracing::instrument(skip(state, payload))]
pub async fn restock<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<RestockRequest>, JsonRejection>,
) -> Result<Json<StockLevelResponse>, ApiError> {
    let ingredient_id: IngredientId = parse_id(&id, "ingredient")?;
    let Json(req) = payload?;
    let level = state.catalog.restock(ingredient_id, req.quantity).await?;

    Ok(Json(StockLevelResponse {
        ingredient_id: level.ingredient_id,
        name: level.name,
        stock_level: level.stock,
    }))
}

/// GET /inventory/{id}/transactions: ledger entries, oldest first.
#[tracing::instrument(skip(state))]
pub async fn transactions<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let ingredient_id: IngredientId = parse_id(&id, "ingredient")?;
    if state.store.get_inventory_item(ingredient_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Ingredient {id} not found")));
    }
    let ledger = state.store.inventory_transactions(ingredient_id).await?;
    Ok(Json(ledger.into_iter().map(Into::into).collect()))
}

/// PUT /inventory/{id}: change an ingredient's name, stock or reorder level.
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateInventoryItemRequest>, JsonRejection>,
) -> Result<Json<InventoryItemResponse>, ApiError> {
    let ingredient_id: IngredientId = parse_id(&id, "ingredient")?;
    let Json(req) = payload?;
    let updated = state
        .catalog
        .update_inventory_item(
            ingredient_id,
            InventoryItemChanges {
                name: req.name,
                stock_level: req.stock_level,
                reorder_level: req.reorder_level,
            },
        )
        .await?;
    Ok(Json(updated.into()))
}

/// DELETE /inventory/{id}: delete an ingredient no recipe uses.
#[tracing::instrument(skip(state))]
pub async fn delete<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let ingredient_id: IngredientId = parse_id(&id, "ingredient")?;
    state.catalog.delete_inventory_item(ingredient_id).await?;
    Ok(Json(MessageResponse::ok("Inventory item deleted successfully")))
}

/// GET /inventory/getLeftOvers: one page of stock left per ingredient.
#[tracing::instrument(skip(state))]
pub async fn leftovers<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<LeftoversParams>,
) -> Result<Json<LeftoversResponse>, ApiError> {
    let page = state.catalog.leftovers(params.into()).await?;
    Ok(Json(page.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(
        sort_by: Option<&str>,
        page: Option<&str>,
        page_size: Option<&str>,
    ) -> LeftoversParams {
        LeftoversParams {
            sort_by: sort_by.map(str::to_string),
            page: page.map(str::to_string),
            page_size: page_size.map(str::to_string),
        }
    }

    #[test]
    fn leftovers_params_fall_back_to_defaults() {
        let query: LeftoversQuery = params(None, None, None).into();
        assert_eq!(query, LeftoversQuery::new());

        let query: LeftoversQuery = params(Some("price"), Some("-2"), Some("abc")).into();
        assert_eq!(query, LeftoversQuery::new());

        let query: LeftoversQuery = params(Some("quantity"), Some("3"), Some("25")).into();
        assert_eq!(query.sort_by, LeftoverSort::Quantity);
        assert_eq!(query.page, 3);
        assert_eq!(query.page_size, 25);
    }
}
