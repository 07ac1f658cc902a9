//! Batch order processing.

use std::collections::{BTreeSet, HashMap};

use store::{CafeStore, IngredientId, Money, OrderId};

use crate::error::DomainError;

use super::placer::OrderPlacer;
use super::request::{InventoryUpdate, PlaceOrder, PlacedOrder};

/// Outcome of one order in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    Accepted { order_id: OrderId, total: Money },
    Rejected { reason: &'static str, message: String },
}

impl OrderOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, OrderOutcome::Accepted { .. })
    }
}

/// A batch entry with its outcome, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedOrder {
    pub customer_name: String,
    pub outcome: OrderOutcome,
}

/// Aggregate figures over a processed batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total_orders: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Sum of accepted order totals.
    pub total_revenue: Money,
    /// Stock consumed by accepted orders, one entry per ingredient in the
    /// order ingredients were first touched.
    pub inventory_updates: Vec<InventoryUpdate>,
}

/// Result of [`BatchOrderProcessor::process_batch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub processed_orders: Vec<ProcessedOrder>,
    pub summary: BatchSummary,
}

/// Folds per-order inventory updates into one entry per ingredient.
#[derive(Debug, Default)]
struct UpdateFold {
    updates: Vec<InventoryUpdate>,
    index: HashMap<IngredientId, usize>,
}

impl UpdateFold {
    fn add(&mut self, update: InventoryUpdate) {
        match self.index.get(&update.ingredient_id) {
            Some(&i) => {
                let entry = &mut self.updates[i];
                entry.quantity_used += update.quantity_used;
                entry.remaining = update.remaining;
            }
            None => {
                self.index.insert(update.ingredient_id, self.updates.len());
                self.updates.push(update);
            }
        }
    }

    fn into_updates(self) -> Vec<InventoryUpdate> {
        self.updates
    }
}

/// Places a list of orders one by one, collecting a per-order outcome.
///
/// A rejected order never aborts the batch; each order is its own unit of
/// work.
pub struct BatchOrderProcessor<S: CafeStore> {
    placer: OrderPlacer<S>,
}

impl<S: CafeStore> BatchOrderProcessor<S> {
    /// Creates a new batch processor using the given placer.
    pub fn new(placer: OrderPlacer<S>) -> Self {
        Self { placer }
    }

    /// Processes the orders in input order.
    ///
    /// Per-order failures are reported as rejected outcomes. If the up-front
    /// price lookup fails, each accepted order keeps the total its own
    /// placement computed.
    #[tracing::instrument(skip(self, orders), fields(orders = orders.len()))]
    pub async fn process_batch(
        &self,
        orders: Vec<PlaceOrder>,
    ) -> Result<BatchResult, DomainError> {
        let names: Vec<String> = orders
            .iter()
            .flat_map(|order| order.lines.iter().map(|l| l.menu_item_name.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let prices = if names.is_empty() {
            HashMap::new()
        } else {
            match self.placer.store().price_map(&names).await {
                Ok(prices) => prices,
                Err(e) => {
                    tracing::warn!(error = %e, "batch price lookup failed, using placement totals");
                    HashMap::new()
                }
            }
        };

        let mut summary = BatchSummary {
            total_orders: orders.len(),
            ..BatchSummary::default()
        };
        let mut fold = UpdateFold::default();
        let mut processed_orders = Vec::with_capacity(orders.len());

        for order in orders {
            let customer_name = order.customer_name.clone();
            let priced = batch_total(&order, &prices);

            let outcome = match self.placer.place_order(order).await {
                Ok(PlacedOrder {
                    order_id,
                    total,
                    inventory_updates,
                }) => {
                    let total = priced.unwrap_or(total);
                    summary.accepted += 1;
                    summary.total_revenue += total;
                    for update in inventory_updates {
                        fold.add(update);
                    }
                    metrics::counter!("batch_orders_total", "status" => "accepted").increment(1);
                    OrderOutcome::Accepted { order_id, total }
                }
                Err(e) => {
                    summary.rejected += 1;
                    metrics::counter!("batch_orders_total", "status" => "rejected").increment(1);
                    OrderOutcome::Rejected {
                        reason: e.reason(),
                        message: e.to_string(),
                    }
                }
            };

            processed_orders.push(ProcessedOrder {
                customer_name,
                outcome,
            });
        }

        summary.inventory_updates = fold.into_updates();

        tracing::info!(
            accepted = summary.accepted,
            rejected = summary.rejected,
            revenue = %summary.total_revenue,
            "batch processed"
        );

        Ok(BatchResult {
            processed_orders,
            summary,
        })
    }
}

/// Prices an order from the batch price map; None if any name is missing or
/// the total does not fit.
fn batch_total(order: &PlaceOrder, prices: &HashMap<String, Money>) -> Option<Money> {
    order.lines.iter().try_fold(Money::zero(), |total, line| {
        let line_total = prices
            .get(&line.menu_item_name)?
            .checked_multiply(line.quantity)?;
        total.checked_add(line_total)
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn update(id: i64, used: i64, remaining: i64) -> InventoryUpdate {
        InventoryUpdate {
            ingredient_id: IngredientId::new(id),
            name: format!("ingredient-{id}"),
            quantity_used: Decimal::from(used),
            remaining: Decimal::from(remaining),
        }
    }

    #[test]
    fn fold_sums_usage_and_keeps_latest_remaining() {
        let mut fold = UpdateFold::default();
        fold.add(update(2, 1, 9));
        fold.add(update(1, 3, 7));
        fold.add(update(2, 2, 7));

        let updates = fold.into_updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].ingredient_id, IngredientId::new(2));
        assert_eq!(updates[0].quantity_used, Decimal::from(3));
        assert_eq!(updates[0].remaining, Decimal::from(7));
        assert_eq!(updates[1].ingredient_id, IngredientId::new(1));
    }

    #[test]
    fn batch_total_uses_price_map() {
        let prices = HashMap::from([
            ("latte".to_string(), Money::from_cents(450)),
            ("muffin".to_string(), Money::from_cents(300)),
        ]);
        let order = PlaceOrder::new("ann", vec![])
            .with_line("latte", 2)
            .with_line("muffin", 1);
        assert_eq!(batch_total(&order, &prices), Some(Money::from_cents(1200)));

        let unknown = PlaceOrder::new("ann", vec![]).with_line("ghost", 1);
        assert_eq!(batch_total(&unknown, &prices), None);
    }

    #[test]
    fn batch_total_is_none_when_total_overflows() {
        let prices = HashMap::from([("gold".to_string(), Money::from_cents(9_999_999_999))]);
        let order = PlaceOrder::new("ann", vec![]).with_line("gold", u32::MAX);
        assert_eq!(batch_total(&order, &prices), None);

        let order = PlaceOrder::new("ann", vec![])
            .with_line("gold", 900_000_000)
            .with_line("gold", 900_000_000);
        assert_eq!(batch_total(&order, &prices), None);
    }
}
