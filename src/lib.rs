//! Carlot - car and dealer inventory service
//!
//! CRUD over dealers and cars backed by PostgreSQL, with every successful
//! car mutation announced as a JSON event on a message broker. Event
//! delivery is best-effort: a broker outage never fails a store operation.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::DomainError;
pub use domain::shared::result::Result;
