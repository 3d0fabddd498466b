//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::ShipmentStore;
use crate::services::ShipmentWorkflow;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    workflow: ShipmentWorkflow,
}

impl AppState {
    #[must_use]
    pub fn new(workflow: ShipmentWorkflow) -> Self {
        Self {
            inner: Arc::new(AppStateInner { workflow }),
        }
    }

    #[must_use]
    pub fn workflow(&self) -> &ShipmentWorkflow {
        &self.inner.workflow
    }

    /// The shipment store, for readiness checks.
    #[must_use]
    pub fn store(&self) -> &dyn ShipmentStore {
        self.inner.workflow.store()
    }
}
