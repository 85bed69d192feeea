//! Car domain

pub mod entity;
pub mod event;
pub mod repository;

pub use entity::{Car, NewCar};
pub use event::{CarEvent, CarEventPublisher, CarEventType, CarSnapshot};
pub use repository::CarStore;
