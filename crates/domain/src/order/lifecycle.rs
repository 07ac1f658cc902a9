//! Order status transitions and deletion.

use store::{CafeStore, OrderId, OrderStatus, OrderStore, UnitOfWork};

use crate::error::DomainError;

/// Moves orders through their lifecycle.
#[derive(Clone)]
pub struct OrderLifecycle<S: CafeStore> {
    store: S,
}

impl<S: CafeStore> OrderLifecycle<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Closes an order and appends a `closed` row to its status history.
    ///
    /// Closing an already closed order succeeds and appends another row.
    #[tracing::instrument(skip(self))]
    pub async fn close_order(&self, order_id: OrderId) -> Result<(), DomainError> {
        let mut tx = self.store.begin().await?;
        let previous = tx
            .lock_order(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))?;

        tx.set_status(order_id, OrderStatus::Closed).await?;
        tx.append_status(order_id, OrderStatus::Closed).await?;
        tx.commit().await?;

        metrics::counter!("orders_closed_total").increment(1);
        tracing::info!(%order_id, from = %previous, "order closed");
        Ok(())
    }

    /// Deletes an order together with its lines and status history.
    ///
    /// Stock consumed by the order is not returned to inventory.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, order_id: OrderId) -> Result<(), DomainError> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_order(order_id).await? {
            return Err(DomainError::OrderNotFound(order_id));
        }
        tx.commit().await?;

        tracing::info!(%order_id, "order deleted");
        Ok(())
    }
}
