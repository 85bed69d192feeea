//! Car and dealer API DTOs (Data Transfer Objects)

use crate::domain::car::{Car, NewCar};
use crate::domain::dealer::{Dealer, NewDealer};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Create/replace car request. Every field is required; `price` may be null.
#[derive(Debug, Deserialize)]
pub struct CarRequest {
    pub firm: String,
    pub model: String,
    pub year: i32,
    pub power: i32,
    pub color: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub dealer_id: i32,
}

/// Car response DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarResponse {
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

/// Create/replace dealer request
#[derive(Debug, Deserialize)]
pub struct DealerRequest {
    pub name: String,
    pub city: String,
    pub address: String,
    pub area: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub rating: Decimal,
}

/// Dealer response DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealerResponse {
    pub id: i32,
    pub name: String,
    pub city: String,
    pub address: String,
    pub area: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub rating: Decimal,
}

/// Returned by create and update
#[derive(Debug, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: i32,
}

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

impl From<CarRequest> for NewCar {
    fn from(req: CarRequest) -> Self {
        Self {
            firm: req.firm,
            model: req.model,
            year: req.year,
            power: req.power,
            color: req.color,
            price: req.price,
            dealer_id: req.dealer_id,
        }
    }
}

impl From<Car> for CarResponse {
    fn from(car: Car) -> Self {
        Self {
            id: car.id,
            firm: car.firm,
            model: car.model,
            year: car.year,
            power: car.power,
            color: car.color,
            price: car.price,
            dealer_id: car.dealer_id,
        }
    }
}

impl From<DealerRequest> for NewDealer {
    fn from(req: DealerRequest) -> Self {
        Self {
            name: req.name,
            city: req.city,
            address: req.address,
            area: req.area,
            rating: req.rating,
        }
    }
}

impl From<Dealer> for DealerResponse {
    fn from(dealer: Dealer) -> Self {
        Self {
            id: dealer.id,
            name: dealer.name,
            city: dealer.city,
            address: dealer.address,
            area: dealer.area,
            rating: dealer.rating,
        }
    }
}
