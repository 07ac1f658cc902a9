//! Menu endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::{
    CafeStore, IngredientId, MenuItem, MenuItemId, Money, NewMenuItem, PriceChange, RecipeLine,
};

use crate::error::{ApiError, parse_id};
use crate::routes::orders::MessageResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IngredientRequest {
    pub ingredient_id: IngredientId,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateMenuItemRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientRequest>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePriceRequest {
    pub price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct IngredientResponse {
    pub ingredient_id: IngredientId,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
}

#[derive(Debug, Serialize)]
pub struct MenuItemResponse {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub tags: Vec<String>,
    pub ingredients: Vec<IngredientResponse>,
}

impl From<MenuItem> for MenuItemResponse {
    fn from(item: MenuItem) -> Self {
        Self {
            menu_item_id: item.id,
            name: item.name,
            description: item.description,
            price: item.price.to_decimal(),
            tags: item.tags,
            ingredients: item
                .recipe
                .into_iter()
                .map(|line| IngredientResponse {
                    ingredient_id: line.ingredient_id,
                    quantity: line.quantity_per_unit,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PriceChangeResponse {
    pub menu_item_id: MenuItemId,
    #[serde(with = "rust_decimal::serde::float")]
    pub old_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub new_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_at: Option<DateTime<Utc>>,
}

impl From<PriceChange> for PriceChangeResponse {
    fn from(change: PriceChange) -> Self {
        Self {
            menu_item_id: change.menu_item_id,
            old_price: change.old_price.to_decimal(),
            new_price: change.new_price.to_decimal(),
            changed_at: Some(change.changed_at),
        }
    }
}

fn money(amount: Decimal) -> Result<Money, ApiError> {
    Money::from_decimal(amount)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid price: {amount}")))
}

impl CreateMenuItemRequest {
    fn into_new_item(self) -> Result<NewMenuItem, ApiError> {
        Ok(NewMenuItem {
            name: self.name,
            description: self.description,
            price: money(self.price)?,
            tags: self.tags,
            recipe: self
                .ingredients
                .into_iter()
                .map(|i| RecipeLine::new(i.ingredient_id, i.quantity))
                .collect(),
        })
    }
}

/// GET /menu: list menu items with their recipes.
#[tracing::instrument(skip(state))]
pub async fn list<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<MenuItemResponse>>, ApiError> {
    let items = state.store.list_menu_items().await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// POST /menu: add a menu item.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateMenuItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MenuItemResponse>), ApiError> {
    let Json(req) = payload?;
    let created = state.catalog.create_menu_item(req.into_new_item()?).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET /menu/{id}: load one menu item.
#[tracing::instrument(skip(state))]
pub async fn get<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let menu_item_id: MenuItemId = parse_id(&id, "menu item")?;
    let item = state.catalog.get_menu_item(menu_item_id).await?;
    Ok(Json(item.into()))
}

/// PUT /menu/{id}: rewrite a menu item and its recipe.
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<CreateMenuItemRequest>, JsonRejection>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let menu_item_id: MenuItemId = parse_id(&id, "menu item")?;
    let Json(req) = payload?;
    let updated = state
        .catalog
        .update_menu_item(menu_item_id, req.into_new_item()?)
        .await?;
    Ok(Json(updated.into()))
}

/// DELETE /menu/{id}: delete a menu item that was never ordered.
#[tracing::instrument(skip(state))]
pub async fn delete<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let menu_item_id: MenuItemId = parse_id(&id, "menu item")?;
    state.catalog.delete_menu_item(menu_item_id).await?;
    Ok(Json(MessageResponse::ok("Menu item deleted successfully")))
}

/// PUT /menu/{id}/price: change a menu item's price.
#[tracing::instrument(skip(state, payload))]
pub async fn change_price<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<ChangePriceRequest>, JsonRejection>,
) -> Result<Json<PriceChangeResponse>, ApiError> {
    let menu_item_id: MenuItemId = parse_id(&id, "menu item")?;
    let Json(req) = payload?;

    let update = state
        .catalog
        .change_price(menu_item_id, money(req.price)?)
        .await?;

    Ok(Json(PriceChangeResponse {
        menu_item_id: update.menu_item_id,
        old_price: update.old_price.to_decimal(),
        new_price: update.new_price.to_decimal(),
        changed_at: None,
    }))
}

/// GET /menu/{id}/price-history: recorded price changes, oldest first.
#[tracing::instrument(skip(state))]
pub async fn price_history<S: CafeStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PriceChangeResponse>>, ApiError> {
    let menu_item_id: MenuItemId = parse_id(&id, "menu item")?;
    let history = state.store.price_history(menu_item_id).await?;
    Ok(Json(history.into_iter().map(Into::into).collect()))
}
