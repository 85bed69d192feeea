//! Dealer store interface

use super::entity::{Dealer, NewDealer};
use crate::domain::shared::error::Result;
use async_trait::async_trait;

/// Dealer store trait
#[async_trait]
pub trait DealerStore: Send + Sync {
    /// List all dealers ordered by id
    async fn list(&self) -> Result<Vec<Dealer>>;

    /// Find dealer by ID
    async fn get(&self, id: i32) -> Result<Option<Dealer>>;

    /// Create a new dealer
    async fn create(&self, data: NewDealer) -> Result<Dealer>;

    /// Replace a dealer's attributes; `None` if the dealer does not exist
    async fn update(&self, id: i32, data: NewDealer) -> Result<Option<Dealer>>;

    /// Delete a dealer together with its cars; `false` if it did not exist
    async fn delete(&self, id: i32) -> Result<bool>;
}
