//! Car domain events

use super::entity::Car;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of car mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CarEventType {
    Create,
    Update,
    Delete,
}

impl CarEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarEventType::Create => "CREATE",
            CarEventType::Update => "UPDATE",
            CarEventType::Delete => "DELETE",
        }
    }
}

impl fmt::Display for CarEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Car attributes as they were when the event was raised
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarSnapshot {
    pub id: i32,
    pub firm: String,
    pub model: String,
    pub year: i32,
    pub power: i32,
    pub color: String,
    /// Always serialized; a missing price is `null`, never omitted
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
}

impl From<&Car> for CarSnapshot {
    fn from(car: &Car) -> Self {
        Self {
            id: car.id,
            firm: car.firm.clone(),
            model: car.model.clone(),
            year: car.year,
            power: car.power,
            color: car.color.clone(),
            price: car.price,
        }
    }
}

/// Notification of a car mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarEvent {
    #[serde(rename = "eventType")]
    event_type: CarEventType,
    car: CarSnapshot,
}

impl CarEvent {
    pub fn new(event_type: CarEventType, car: &Car) -> Self {
        Self {
            event_type,
            car: CarSnapshot::from(car),
        }
    }

    pub fn event_type(&self) -> CarEventType {
        self.event_type
    }

    pub fn car(&self) -> &CarSnapshot {
        &self.car
    }

    pub fn car_id(&self) -> i32 {
        self.car.id
    }

    /// UTF-8 JSON body as it goes on the wire
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Output port: deliver car events to whatever transport is wired in.
///
/// Implementations absorb every delivery failure; the call returns once the
/// single attempt has finished, successfully or not.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CarEventPublisher: Send + Sync {
    async fn publish(&self, event: CarEvent);
}
