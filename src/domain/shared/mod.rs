//! Shared kernel - Common types used across the car and dealer contexts

pub mod error;
pub mod result;

pub use error::DomainError;
pub use result::Result;
