//! Menu and inventory maintenance.

use rust_decimal::Decimal;
use store::{
    CafeStore, IngredientId, InventoryItem, InventoryStore, LeftoversPage, LeftoversQuery,
    MenuCatalog, MenuItem, MenuItemId, Money, NewInventoryItem, NewMenuItem, StockLevel,
    StoreError, UnitOfWork,
};

use crate::error::DomainError;

/// Result of a price change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceUpdate {
    pub menu_item_id: MenuItemId,
    pub old_price: Money,
    pub new_price: Money,
}

impl PriceUpdate {
    /// Returns true if the price actually changed.
    pub fn changed(&self) -> bool {
        self.old_price != self.new_price
    }
}

/// Partial update of an inventory ingredient; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryItemChanges {
    pub name: Option<String>,
    /// New absolute stock level; the difference is written to the ledger.
    pub stock_level: Option<Decimal>,
    pub reorder_level: Option<Decimal>,
}

/// Maintains the menu and the inventory the order flow reads from.
#[derive(Clone)]
pub struct CatalogService<S: CafeStore> {
    store: S,
}

fn constraint_as_validation(e: StoreError) -> DomainError {
    match e {
        StoreError::Constraint(message) => DomainError::Validation(message),
        other => other.into(),
    }
}

impl<S: CafeStore> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Adds a menu item with its recipe.
    #[tracing::instrument(skip(self, item), fields(name = %item.name))]
    pub async fn create_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, DomainError> {
        validate_menu_item(&item)?;

        let mut tx = self.store.begin().await?;
        if tx.price_and_recipe(&item.name).await?.is_some() {
            return Err(DomainError::validation(format!(
                "menu item {} already exists",
                item.name
            )));
        }

        ensure_ingredients_exist(&mut tx, &item).await?;

        let created = tx
            .insert_menu_item(item)
            .await
            .map_err(constraint_as_validation)?;
        tx.commit().await?;

        tracing::info!(menu_item_id = %created.id, "menu item created");
        Ok(created)
    }

    /// Loads a menu item by id.
    pub async fn get_menu_item(&self, id: MenuItemId) -> Result<MenuItem, DomainError> {
        self.store
            .get_menu_item(id)
            .await?
            .ok_or_else(|| DomainError::MenuItemNotFound {
                name: id.to_string(),
            })
    }

    /// Rewrites a menu item and its recipe.
    ///
    /// A price history row is written when the price changes.
    #[tracing::instrument(skip(self, item), fields(name = %item.name))]
    pub async fn update_menu_item(
        &self,
        id: MenuItemId,
        item: NewMenuItem,
    ) -> Result<MenuItem, DomainError> {
        validate_menu_item(&item)?;

        let mut tx = self.store.begin().await?;
        let current = tx
            .lock_menu_item(id)
            .await?
            .ok_or_else(|| DomainError::MenuItemNotFound {
                name: id.to_string(),
            })?;
        ensure_ingredients_exist(&mut tx, &item).await?;

        let updated = tx
            .update_menu_item(id, item)
            .await
            .map_err(constraint_as_validation)?;
        if current.price != updated.price {
            tx.record_price_change(id, current.price, updated.price)
                .await?;
        }
        tx.commit().await?;

        tracing::info!(menu_item_id = %id, "menu item updated");
        Ok(updated)
    }

    /// Deletes a menu item that no order references.
    #[tracing::instrument(skip(self))]
    pub async fn delete_menu_item(&self, id: MenuItemId) -> Result<(), DomainError> {
        let mut tx = self.store.begin().await?;
        let deleted = tx
            .delete_menu_item(id)
            .await
            .map_err(constraint_as_validation)?;
        if !deleted {
            return Err(DomainError::MenuItemNotFound {
                name: id.to_string(),
            });
        }
        tx.commit().await?;

        tracing::info!(menu_item_id = %id, "menu item deleted");
        Ok(())
    }

    /// Sets a menu item's price.
    ///
    /// A price history row is written only if the price differs from the
    /// current one.
    #[tracing::instrument(skip(self))]
    pub async fn change_price(
        &self,
        id: MenuItemId,
        price: Money,
    ) -> Result<PriceUpdate, DomainError> {
        if price.is_negative() {
            return Err(DomainError::validation("price must not be negative"));
        }

        let mut tx = self.store.begin().await?;
        let old_price = tx
            .update_price(id, price)
            .await?
            .ok_or_else(|| DomainError::MenuItemNotFound {
                name: id.to_string(),
            })?;

        let update = PriceUpdate {
            menu_item_id: id,
            old_price,
            new_price: price,
        };
        if update.changed() {
            tx.record_price_change(id, old_price, price).await?;
        }
        tx.commit().await?;

        tracing::info!(old = %old_price, new = %price, "menu price updated");
        Ok(update)
    }

    /// Adds an inventory ingredient; its opening stock is recorded in the
    /// ledger.
    #[tracing::instrument(skip(self, item), fields(name = %item.name))]
    pub async fn create_inventory_item(
        &self,
        item: NewInventoryItem,
    ) -> Result<InventoryItem, DomainError> {
        if item.name.trim().is_empty() {
            return Err(DomainError::validation("ingredient name must not be empty"));
        }
        if item.stock_level <= Decimal::ZERO {
            return Err(DomainError::validation("stock level must be greater than zero"));
        }
        if item.reorder_level <= Decimal::ZERO {
            return Err(DomainError::validation(
                "reorder level must be greater than zero",
            ));
        }

        let mut tx = self.store.begin().await?;
        let created = tx
            .insert_inventory_item(item)
            .await
            .map_err(constraint_as_validation)?;
        tx.commit().await?;

        tracing::info!(ingredient_id = %created.id, "inventory item created");
        Ok(created)
    }

    /// Adds stock to an ingredient and returns the new level.
    #[tracing::instrument(skip(self))]
    pub async fn restock(
        &self,
        id: IngredientId,
        quantity: Decimal,
    ) -> Result<StockLevel, DomainError> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::validation(
                "restock quantity must be greater than zero",
            ));
        }

        let mut tx = self.store.begin().await?;
        let level = tx.restock(id, quantity).await?;
        tx.commit().await?;

        tracing::info!(stock = %level.stock, "ingredient restocked");
        Ok(level)
    }

    /// Applies a partial update to an ingredient.
    ///
    /// A new stock level is reached through a single ledger entry holding the
    /// difference, so the ledger still sums to the stock level.
    #[tracing::instrument(skip(self, changes))]
    pub async fn update_inventory_item(
        &self,
        id: IngredientId,
        changes: InventoryItemChanges,
    ) -> Result<InventoryItem, DomainError> {
        if let Some(name) = &changes.name
            && name.trim().is_empty()
        {
            return Err(DomainError::validation("ingredient name must not be empty"));
        }
        if let Some(stock) = changes.stock_level
            && stock < Decimal::ZERO
        {
            return Err(DomainError::validation("stock level must not be negative"));
        }
        if let Some(reorder) = changes.reorder_level
            && reorder <= Decimal::ZERO
        {
            return Err(DomainError::validation(
                "reorder level must be greater than zero",
            ));
        }

        let mut tx = self.store.begin().await?;
        let current = tx
            .lock_inventory_item(id)
            .await?
            .ok_or(DomainError::IngredientNotFound(id))?;

        if let Some(stock) = changes.stock_level {
            let delta = stock - current.stock_level;
            if delta > Decimal::ZERO {
                tx.restock(id, delta).await?;
            } else if delta < Decimal::ZERO {
                tx.decrement(id, -delta)
                    .await
                    .map_err(constraint_as_validation)?;
            }
        }

        let name = changes.name.unwrap_or(current.name);
        let reorder_level = changes.reorder_level.unwrap_or(current.reorder_level);
        let updated = tx
            .update_inventory_details(id, &name, reorder_level)
            .await
            .map_err(constraint_as_validation)?;
        tx.commit().await?;

        tracing::info!(stock = %updated.stock_level, "inventory item updated");
        Ok(updated)
    }

    /// Deletes an ingredient that no recipe uses, together with its ledger.
    #[tracing::instrument(skip(self))]
    pub async fn delete_inventory_item(&self, id: IngredientId) -> Result<(), DomainError> {
        let mut tx = self.store.begin().await?;
        let deleted = tx
            .delete_inventory_item(id)
            .await
            .map_err(constraint_as_validation)?;
        if !deleted {
            return Err(DomainError::IngredientNotFound(id));
        }
        tx.commit().await?;

        tracing::info!(ingredient_id = %id, "inventory item deleted");
        Ok(())
    }

    /// Reads one page of remaining stock per ingredient.
    pub async fn leftovers(&self, query: LeftoversQuery) -> Result<LeftoversPage, DomainError> {
        Ok(self.store.leftovers(query).await?)
    }
}

/// Fails with a validation error if a recipe line names a missing ingredient.
async fn ensure_ingredients_exist<T: UnitOfWork>(
    tx: &mut T,
    item: &NewMenuItem,
) -> Result<(), DomainError> {
    let mut ids: Vec<IngredientId> = item.recipe.iter().map(|l| l.ingredient_id).collect();
    ids.sort();
    ids.dedup();
    let found = tx.current_stock(&ids).await?;
    if let Some(missing) = ids
        .iter()
        .find(|id| !found.iter().any(|level| level.ingredient_id == **id))
    {
        return Err(DomainError::validation(format!(
            "recipe references unknown ingredient {missing}"
        )));
    }
    Ok(())
}

fn validate_menu_item(item: &NewMenuItem) -> Result<(), DomainError> {
    if item.name.trim().is_empty() {
        return Err(DomainError::validation("menu item name must not be empty"));
    }
    if item.description.trim().is_empty() {
        return Err(DomainError::validation("description must not be empty"));
    }
    if item.price.is_negative() {
        return Err(DomainError::validation("price must not be negative"));
    }
    if item.tags.is_empty() || item.tags.iter().any(|t| t.trim().is_empty()) {
        return Err(DomainError::validation("tags must not be empty"));
    }
    if let Some(line) = item
        .recipe
        .iter()
        .find(|l| l.quantity_per_unit <= Decimal::ZERO)
    {
        return Err(DomainError::validation(format!(
            "quantity for ingredient {} must be greater than zero",
            line.ingredient_id
        )));
    }
    Ok(())
}
