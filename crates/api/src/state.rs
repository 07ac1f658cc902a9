//! Shared application state.

use domain::{BatchOrderProcessor, CatalogService, OrderLifecycle, OrderPlacer};
use store::CafeStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S: CafeStore> {
    pub store: S,
    pub placer: OrderPlacer<S>,
    pub batch: BatchOrderProcessor<S>,
    pub lifecycle: OrderLifecycle<S>,
    pub catalog: CatalogService<S>,
}

impl<S: CafeStore + Clone> AppState<S> {
    /// Wires every service to the same store.
    pub fn new(store: S) -> Self {
        let placer = OrderPlacer::new(store.clone());
        Self {
            batch: BatchOrderProcessor::new(placer.clone()),
            placer,
            lifecycle: OrderLifecycle::new(store.clone()),
            catalog: CatalogService::new(store.clone()),
            store,
        }
    }
}
