//! Application layer - Use cases and application services
//!
//! This layer orchestrates domain objects to fulfill use cases.
//! It's responsible for:
//! - Composing persistence with notification
//! - Publishing domain events after successful mutations

pub mod notifying_store;

pub use notifying_store::NotifyingCarStore;
