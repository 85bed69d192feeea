//! Domain layer - Core business types and ports
//!
//! This layer contains:
//! - Entities: Car and Dealer records
//! - Repository Interfaces: Ports for persistence (`CarStore`, `DealerStore`)
//! - Domain Events: Car mutation notifications and the publisher port

pub mod car;
pub mod dealer;
pub mod shared;

// Re-export commonly used types
pub use shared::{DomainError, Result};
