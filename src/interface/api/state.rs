//! Shared handler state

use crate::domain::car::CarStore;
use crate::domain::dealer::DealerStore;
use std::sync::Arc;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Car store; in production this is the notifying decorator
    pub cars: Arc<dyn CarStore>,
    pub dealers: Arc<dyn DealerStore>,
}

impl AppState {
    pub fn new(cars: Arc<dyn CarStore>, dealers: Arc<dyn DealerStore>) -> Self {
        Self { cars, dealers }
    }
}
