//! Car store interface

use super::entity::{Car, NewCar};
use crate::domain::shared::error::Result;
use async_trait::async_trait;

/// Car store trait
///
/// Implemented by the persistence backends and by the notifying decorator,
/// so callers never know whether a mutation fans out an event.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CarStore: Send + Sync {
    /// List all cars ordered by id
    async fn list(&self) -> Result<Vec<Car>>;

    /// Find car by ID
    async fn get(&self, id: i32) -> Result<Option<Car>>;

    /// Create a car; fails with `DependencyNotFound` if the dealer is missing
    async fn create(&self, data: NewCar) -> Result<Car>;

    /// Replace a car's attributes; `None` if the car does not exist
    async fn update(&self, id: i32, data: NewCar) -> Result<Option<Car>>;

    /// Delete a car; `false` if it did not exist
    async fn delete(&self, id: i32) -> Result<bool>;
}
