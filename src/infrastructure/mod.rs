//! Infrastructure layer - Technical implementations
//!
//! This layer contains:
//! - Store implementations (PostgreSQL, in-memory)
//! - Message broker transports and the car event publisher

pub mod messaging;
pub mod persistence;
