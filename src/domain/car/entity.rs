//! Car entity

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Car entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Car {
    pub id: i32,
    pub firm: String,
    pub model: String,
    pub year: i32,
    pub power: i32,
    pub color: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub dealer_id: i32,
}

/// Car creation/replacement data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCar {
    pub firm: String,
    pub model: String,
    pub year: i32,
    pub power: i32,
    pub color: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub dealer_id: i32,
}

impl NewCar {
    /// Materialize the payload as a stored car with the given id
    pub fn into_car(self, id: i32) -> Car {
        Car {
            id,
            firm: self.firm,
            model: self.model,
            year: self.year,
            power: self.power,
            color: self.color,
            price: self.price,
            dealer_id: self.dealer_id,
        }
    }
}
