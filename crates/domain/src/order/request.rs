//! Order requests and placement results.

use rust_decimal::Decimal;
use serde::Serialize;
use store::{IngredientId, Money, OrderId};

use crate::error::DomainError;

/// Largest quantity a single order line may carry; order lines are stored as
/// 32-bit signed integers.
pub const MAX_LINE_QUANTITY: u32 = i32::MAX as u32;

/// Largest total an order may reach; order totals are stored as
/// `NUMERIC(10, 2)`.
pub const MAX_ORDER_TOTAL: Money = Money::from_cents(9_999_999_999);

/// One requested line: a menu item by name and a quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineRequest {
    pub menu_item_name: String,
    pub quantity: u32,
}

impl OrderLineRequest {
    pub fn new(menu_item_name: impl Into<String>, quantity: u32) -> Self {
        Self {
            menu_item_name: menu_item_name.into(),
            quantity,
        }
    }
}

/// Request to place (or replace) an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrder {
    pub customer_name: String,
    pub lines: Vec<OrderLineRequest>,
}

impl PlaceOrder {
    /// Creates an order request for a customer.
    pub fn new(customer_name: impl Into<String>, lines: Vec<OrderLineRequest>) -> Self {
        Self {
            customer_name: customer_name.into(),
            lines,
        }
    }

    /// Adds a line to the request.
    pub fn with_line(mut self, menu_item_name: impl Into<String>, quantity: u32) -> Self {
        self.lines.push(OrderLineRequest::new(menu_item_name, quantity));
        self
    }

    /// Checks the request shape before any store access.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.customer_name.trim().is_empty() {
            return Err(DomainError::validation("customer name must not be empty"));
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation(
                "order must contain at least one item",
            ));
        }
        for line in &self.lines {
            if line.menu_item_name.trim().is_empty() {
                return Err(DomainError::validation("menu item name must not be empty"));
            }
            if line.quantity == 0 {
                return Err(DomainError::validation(format!(
                    "quantity for {} must be greater than zero",
                    line.menu_item_name
                )));
            }
            if line.quantity > MAX_LINE_QUANTITY {
                return Err(DomainError::validation(format!(
                    "quantity for {} must not exceed {MAX_LINE_QUANTITY}",
                    line.menu_item_name
                )));
            }
        }
        Ok(())
    }
}

/// Stock consumed from one ingredient by an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryUpdate {
    pub ingredient_id: IngredientId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity_used: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining: Decimal,
}

/// A successfully placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub total: Money,
    /// One entry per touched ingredient, in ingredient id order.
    pub inventory_updates: Vec<InventoryUpdate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_request() {
        let req = PlaceOrder::new("ann", vec![]).with_line("latte", 2);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn blank_customer_is_rejected() {
        let req = PlaceOrder::new("   ", vec![]).with_line("latte", 1);
        assert!(matches!(req.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn empty_order_is_rejected() {
        let req = PlaceOrder::new("ann", vec![]);
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("at least one item"));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let req = PlaceOrder::new("ann", vec![])
            .with_line("latte", 1)
            .with_line("mocha", 0);
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("mocha"));
    }

    #[test]
    fn oversized_quantity_is_rejected() {
        let at_limit = PlaceOrder::new("ann", vec![]).with_line("latte", MAX_LINE_QUANTITY);
        assert!(at_limit.validate().is_ok());

        let req = PlaceOrder::new("ann", vec![]).with_line("latte", u32::MAX);
        let err = req.validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref m) if m.contains("must not exceed")));
    }

    #[test]
    fn inventory_update_serializes_quantities_as_numbers() {
        let update = InventoryUpdate {
            ingredient_id: IngredientId::new(4),
            name: "milk".to_string(),
            quantity_used: Decimal::new(25, 2),
            remaining: Decimal::new(75, 2),
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["ingredient_id"], 4);
        assert_eq!(json["quantity_used"], 0.25);
        assert_eq!(json["remaining"], 0.75);
    }
}
