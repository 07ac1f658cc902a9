//! Rows and write models for menu, inventory and order tables.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{IngredientId, LeftoversQuery, MenuItemId, Money, OrderId};

/// One ingredient of a menu item's recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub ingredient_id: IngredientId,
    /// Amount of the ingredient consumed by one portion.
    pub quantity_per_unit: Decimal,
}

impl RecipeLine {
    pub fn new(ingredient_id: IngredientId, quantity_per_unit: Decimal) -> Self {
        Self {
            ingredient_id,
            quantity_per_unit,
        }
    }
}

/// A menu item together with its recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub tags: Vec<String>,
    /// Recipe lines in insertion order.
    pub recipe: Vec<RecipeLine>,
}

/// Data for inserting a menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMenuItem {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub tags: Vec<String>,
    pub recipe: Vec<RecipeLine>,
}

/// A recorded change of a menu item's price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceChange {
    pub menu_item_id: MenuItemId,
    pub old_price: Money,
    pub new_price: Money,
    pub changed_at: DateTime<Utc>,
}

/// An inventory ingredient row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: IngredientId,
    pub name: String,
    pub stock_level: Decimal,
    pub reorder_level: Decimal,
    pub last_updated: DateTime<Utc>,
}

/// Data for inserting an inventory ingredient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInventoryItem {
    pub name: String,
    pub stock_level: Decimal,
    pub reorder_level: Decimal,
}

/// One entry of the append-only stock ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryTransaction {
    pub id: i64,
    pub ingredient_id: IngredientId,
    /// Signed delta: negative for consumption, positive for stock added.
    pub quantity: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Stock level of one ingredient as seen inside a unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub ingredient_id: IngredientId,
    pub name: String,
    pub stock: Decimal,
}

/// One row of the leftovers report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leftover {
    pub name: String,
    pub quantity: Decimal,
}

/// A page of the leftovers report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeftoversPage {
    pub current_page: u32,
    pub has_next_page: bool,
    pub page_size: u32,
    pub total_pages: u64,
    pub data: Vec<Leftover>,
}

impl LeftoversPage {
    /// Builds the page metadata for `total` ingredients.
    pub fn new(query: &LeftoversQuery, total: u64, data: Vec<Leftover>) -> Self {
        let total_pages = query.total_pages(total);
        Self {
            current_page: query.page,
            has_next_page: u64::from(query.page) < total_pages,
            page_size: query.page_size,
            total_pages,
            data,
        }
    }
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Active,
    Closed,
}

impl OrderStatus {
    /// Returns the status as stored in the `status` columns.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Active => "active",
            OrderStatus::Closed => "closed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(OrderStatus::Active),
            "closed" => Ok(OrderStatus::Closed),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

/// A priced line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub menu_item_id: MenuItemId,
    pub menu_item_name: String,
    pub quantity: u32,
    /// Price snapshot taken when the line was written.
    pub price_at_order_time: Money,
}

impl OrderLine {
    /// Returns `price_at_order_time * quantity`.
    pub fn line_total(&self) -> Money {
        self.price_at_order_time.multiply(self.quantity)
    }
}

/// A placed order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

/// Header data for inserting an order. New orders always start `active`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_name: String,
    pub total_amount: Money,
}

/// Data for inserting an order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
    pub price_at_order_time: Money,
}

/// One row of the order status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub changed_at: DateTime<Utc>,
}

/// Total quantity ordered of one menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedItemCount {
    pub name: String,
    pub quantity: i64,
}
