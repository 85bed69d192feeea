//! Dealer entity

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Dealer entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Dealer {
    pub id: i32,
    pub name: String,
    pub city: String,
    pub address: String,
    pub area: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub rating: Decimal,
}

/// Dealer creation/replacement data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDealer {
    pub name: String,
    pub city: String,
    pub address: String,
    pub area: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub rating: Decimal,
}

impl NewDealer {
    pub fn into_dealer(self, id: i32) -> Dealer {
        Dealer {
            id,
            name: self.name,
            city: self.city,
            address: self.address,
            area: self.area,
            rating: self.rating,
        }
    }
}
