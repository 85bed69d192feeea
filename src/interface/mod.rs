//! Interface layer - HTTP API over the car and dealer stores

pub mod api;
