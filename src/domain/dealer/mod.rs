//! Dealer domain

pub mod entity;
pub mod repository;

pub use entity::{Dealer, NewDealer};
pub use repository::DealerStore;
